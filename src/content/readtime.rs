//! Reading time estimation

use super::post::ContentSection;

/// Words read per minute
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read the given sections, rounded up.
///
/// Empty content reads in zero minutes. A zero rate is treated as the default.
pub fn estimate_minutes(sections: &[ContentSection], words_per_minute: usize) -> usize {
    let rate = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };

    let words: usize = sections.iter().map(|s| s.body.word_count()).sum();
    words.div_ceil(rate)
}

/// Human readable reading time, e.g. `4 min`
pub fn format_read_time(minutes: usize) -> String {
    format!("{} min", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::richtext::{Block, RichText, TextBlock};

    fn section(words: usize) -> ContentSection {
        ContentSection {
            heading: Some("Heading words are not counted".to_string()),
            body: RichText::new(vec![Block::Paragraph(TextBlock::plain(
                vec!["lorem"; words].join(" "),
            ))]),
        }
    }

    fn read_time(sections: &[ContentSection]) -> String {
        format_read_time(estimate_minutes(sections, DEFAULT_WORDS_PER_MINUTE))
    }

    #[test]
    fn test_no_sections() {
        assert_eq!(read_time(&[]), "0 min");
    }

    #[test]
    fn test_zero_words() {
        assert_eq!(read_time(&[section(0)]), "0 min");
        let empty = ContentSection::default();
        assert_eq!(read_time(&[empty]), "0 min");
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(read_time(&[section(200)]), "1 min");
        assert_eq!(read_time(&[section(201)]), "2 min");
        assert_eq!(read_time(&[section(1)]), "1 min");
    }

    #[test]
    fn test_sums_across_sections() {
        assert_eq!(read_time(&[section(150), section(150)]), "2 min");
        assert_eq!(read_time(&[section(100), section(100)]), "1 min");
    }

    #[test]
    fn test_irregular_whitespace() {
        let body = RichText::new(vec![
            Block::Paragraph(TextBlock::plain("  um\tdois \n tres  ")),
            Block::ListItem(TextBlock::plain("quatro")),
        ]);
        let sections = [ContentSection {
            heading: None,
            body,
        }];
        assert_eq!(estimate_minutes(&sections, 4), 1);
        assert_eq!(estimate_minutes(&sections, 3), 2);
    }

    #[test]
    fn test_zero_rate_uses_default() {
        assert_eq!(estimate_minutes(&[section(201)], 0), 2);
    }
}
