//! Internationalization (i18n) support
//!
//! Built-in strings exist for `en` and `pt-BR`. YAML or JSON files named
//! after a language in the languages directory override them key by key.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN_EN: &str = r#"
load_more: Load more posts
loading: Loading...
not_found: Post not found
reading_time: "%d min"
months:
  short: [Jan, Feb, Mar, Apr, May, Jun, Jul, Aug, Sep, Oct, Nov, Dec]
  long: [January, February, March, April, May, June, July, August, September, October, November, December]
"#;

const BUILTIN_PT_BR: &str = r#"
load_more: Carregar mais posts
loading: Carregando...
not_found: Post não encontrado
reading_time: "%d min"
months:
  short: [jan, fev, mar, abr, mai, jun, jul, ago, set, out, nov, dez]
  long: [janeiro, fevereiro, março, abril, maio, junho, julho, agosto, setembro, outubro, novembro, dezembro]
"#;

type Translations = HashMap<String, serde_yaml::Value>;

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, Translations>,
}

impl I18n {
    /// Create a handler for `language` with the built-in strings loaded
    pub fn new(language: &str) -> Self {
        let mut i18n = Self {
            language: language.to_string(),
            translations: HashMap::new(),
        };
        i18n.load_builtin("en", BUILTIN_EN);
        i18n.load_builtin("pt-BR", BUILTIN_PT_BR);
        i18n
    }

    fn load_builtin(&mut self, lang: &str, source: &str) {
        match serde_yaml::from_str::<Translations>(source) {
            Ok(data) => {
                self.translations.insert(lang.to_string(), data);
            }
            Err(e) => tracing::warn!("Failed to parse built-in language {}: {}", lang, e),
        }
    }

    /// Load language files from a directory, overriding built-in keys
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yml") | Some("yaml") | Some("json")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            // JSON is a subset of YAML
            let data: Translations = match serde_yaml::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                    continue;
                }
            };

            self.translations
                .entry(lang.to_string())
                .or_default()
                .extend(data);
            tracing::debug!("Loaded language file: {:?}", path);
        }

        Ok(())
    }

    /// Get a translation by key, nested keys like "months.short" allowed
    pub fn get(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(value) => yaml_value_to_string(value),
            None => key.to_string(),
        }
    }

    /// Get a translation with `%d` replaced by `count`
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// Get a list of strings, e.g. month names
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        match self.lookup(key)? {
            serde_yaml::Value::Sequence(items) => {
                Some(items.iter().map(yaml_value_to_string).collect())
            }
            _ => None,
        }
    }

    /// Look up a key in the current language, then its base language
    /// ("pt" for "pt-BR"), then English
    fn lookup(&self, key: &str) -> Option<&serde_yaml::Value> {
        let base = self.language.split('-').next().unwrap_or_default();
        [self.language.as_str(), base, "en"]
            .into_iter()
            .filter_map(|lang| self.translations.get(lang))
            .find_map(|data| get_nested_value(data, key))
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(data: &'a Translations, key: &str) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?)?;

    for part in parts {
        match current {
            serde_yaml::Value::Mapping(map) => {
                current = map.get(serde_yaml::Value::String(part.to_string()))?;
            }
            _ => return None,
        }
    }

    Some(current)
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}
