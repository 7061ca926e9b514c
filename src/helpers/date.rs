//! Date helper functions
//!
//! Patterns use date-fns style tokens (`dd MMM yyyy`). Month and weekday
//! names come from fixed per-locale tables so output does not depend on the
//! host locale.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};

/// Rendered in place of a missing date
pub const DATE_FALLBACK: &str = "—";

const PT_BR_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];
const PT_BR_MONTHS_ABBR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];
const PT_BR_WEEKDAYS: [&str; 7] = [
    "domingo",
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
];
const PT_BR_WEEKDAYS_ABBR: [&str; 7] = ["dom", "seg", "ter", "qua", "qui", "sex", "sáb"];

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const EN_MONTHS_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const EN_WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const EN_WEEKDAYS_ABBR: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Locale used for month and weekday names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLocale {
    PtBr,
    En,
}

impl DateLocale {
    /// Pick a locale from a language tag; anything Portuguese maps to pt-BR
    pub fn from_language(language: &str) -> Self {
        let lang = language.to_ascii_lowercase();
        if lang == "pt" || lang.starts_with("pt-") || lang.starts_with("pt_") {
            DateLocale::PtBr
        } else {
            DateLocale::En
        }
    }

    fn month(self, month0: u32, abbreviated: bool) -> &'static str {
        let table = match (self, abbreviated) {
            (DateLocale::PtBr, true) => &PT_BR_MONTHS_ABBR,
            (DateLocale::PtBr, false) => &PT_BR_MONTHS,
            (DateLocale::En, true) => &EN_MONTHS_ABBR,
            (DateLocale::En, false) => &EN_MONTHS,
        };
        table[month0 as usize % 12]
    }

    fn weekday(self, from_sunday: u32, abbreviated: bool) -> &'static str {
        let table = match (self, abbreviated) {
            (DateLocale::PtBr, true) => &PT_BR_WEEKDAYS_ABBR,
            (DateLocale::PtBr, false) => &PT_BR_WEEKDAYS,
            (DateLocale::En, true) => &EN_WEEKDAYS_ABBR,
            (DateLocale::En, false) => &EN_WEEKDAYS,
        };
        table[from_sunday as usize % 7]
    }
}

/// Formats optional CMS timestamps with a fixed pattern, locale and timezone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    pattern: String,
    locale: DateLocale,
    timezone: Option<chrono_tz::Tz>,
}

impl DateFormatter {
    pub fn new(pattern: &str, locale: DateLocale) -> Self {
        Self {
            pattern: pattern.to_string(),
            locale,
            timezone: None,
        }
    }

    /// Convert instants into `tz` before formatting
    pub fn with_timezone(mut self, tz: Option<chrono_tz::Tz>) -> Self {
        self.timezone = tz;
        self
    }

    /// Format a date, or return [`DATE_FALLBACK`] when there is none
    pub fn format(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        match (date, self.timezone) {
            (None, _) => DATE_FALLBACK.to_string(),
            (Some(date), Some(tz)) => {
                format_date(&date.with_timezone(&tz), &self.pattern, self.locale)
            }
            (Some(date), None) => format_date(date, &self.pattern, self.locale),
        }
    }
}

/// Format a date using a date-fns compatible pattern
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", DateLocale::PtBr) // -> "15 mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, pattern: &str, locale: DateLocale) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // quoted literal; '' is an escaped quote
            let mut j = i + 1;
            if chars.get(j) == Some(&'\'') {
                out.push('\'');
                i = j + 1;
                continue;
            }
            while j < chars.len() {
                if chars[j] == '\'' {
                    if chars.get(j + 1) != Some(&'\'') {
                        break;
                    }
                    j += 1;
                }
                out.push(chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            out.push(c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        match (c, run) {
            ('d', 1) => out.push_str(&date.day().to_string()),
            ('d', _) => out.push_str(&format!("{:02}", date.day())),
            ('M', 1) => out.push_str(&date.month().to_string()),
            ('M', 2) => out.push_str(&format!("{:02}", date.month())),
            ('M', 3) => out.push_str(locale.month(date.month0(), true)),
            ('M', _) => out.push_str(locale.month(date.month0(), false)),
            ('y' | 'Y', 2) => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            ('y' | 'Y', _) => out.push_str(&format!("{:04}", date.year())),
            ('E', 1..=3) => {
                out.push_str(locale.weekday(date.weekday().num_days_from_sunday(), true))
            }
            ('E', _) => out.push_str(locale.weekday(date.weekday().num_days_from_sunday(), false)),
            ('H', 1) => out.push_str(&date.hour().to_string()),
            ('H', _) => out.push_str(&format!("{:02}", date.hour())),
            ('m', 1) => out.push_str(&date.minute().to_string()),
            ('m', _) => out.push_str(&format!("{:02}", date.minute())),
            ('s', 1) => out.push_str(&date.second().to_string()),
            ('s', _) => out.push_str(&format!("{:02}", date.second())),
            _ => out.extend(std::iter::repeat(c).take(run)),
        }

        i += run;
    }

    out
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
