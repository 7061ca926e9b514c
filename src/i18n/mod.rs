//! Internationalization (i18n) of interface strings
//!
//! Built-in `pt-BR` and `en` tables can be overridden or extended by
//! `<lang>.yml` / `<lang>.json` files in the site's language directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const FALLBACK_LANGUAGE: &str = "en";

const PT_BR: &[(&str, &str)] = &[
    ("load_more", "Carregar mais posts"),
    ("load_failed", "Não foi possível carregar mais posts."),
    ("retry", "Tentar novamente"),
    ("not_found.title", "Post não encontrado"),
    ("not_found.message", "O post que você procura não existe ou foi removido."),
    ("error.title", "Algo deu errado"),
    ("error.message", "Não foi possível falar com o servidor de conteúdo."),
    ("back_home", "Voltar para o início"),
    ("empty", "Nenhum post publicado ainda."),
];

const EN: &[(&str, &str)] = &[
    ("load_more", "Load more posts"),
    ("load_failed", "Could not load more posts."),
    ("retry", "Try again"),
    ("not_found.title", "Post not found"),
    ("not_found.message", "The post you are looking for does not exist or was removed."),
    ("error.title", "Something went wrong"),
    ("error.message", "The content service could not be reached."),
    ("back_home", "Back to home"),
    ("empty", "No posts published yet."),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// lang -> dotted key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in tables
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, table) in [("pt-BR", PT_BR), ("en", EN)] {
            let entries = table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            translations.insert(lang.to_string(), entries);
        }

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load language files from a directory; invalid files are skipped
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml" | "yaml" | "json")) {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            // JSON is valid YAML, one parser covers both
            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<serde_yaml::Value>(&content) {
                Ok(value) => {
                    let table = self.translations.entry(lang.to_string()).or_default();
                    flatten(&value, "", table);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => tracing::warn!("Failed to parse language file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Translate a dotted key, falling back to English, then to the key itself
    pub fn get(&self, key: &str) -> String {
        [self.language.as_str(), FALLBACK_LANGUAGE]
            .iter()
            .find_map(|lang| self.translations.get(*lang)?.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// All translations for the current language, English filling the gaps
    pub fn all(&self) -> HashMap<String, String> {
        let mut result = self
            .translations
            .get(FALLBACK_LANGUAGE)
            .cloned()
            .unwrap_or_default();
        if let Some(table) = self.translations.get(&self.language) {
            result.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

/// Flatten nested mappings into dotted keys
fn flatten(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    let leaf = match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, nested) in map {
                if let Some(key) = key.as_str() {
                    let full_key = if prefix.is_empty() {
                        key.to_string()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    flatten(nested, &full_key, out);
                }
            }
            return;
        }
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => return,
    };

    if !prefix.is_empty() {
        out.insert(prefix.to_string(), leaf);
    }
}
