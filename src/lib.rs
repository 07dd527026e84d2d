use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

pub mod language;
pub mod loader;
pub mod mt;
pub mod session;

pub use language::{Language, UnsupportedLanguage};
pub use loader::LoaderError;
pub use session::{DisplayedContent, LanguageSession, SessionSnapshot};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("valid placeholder regex"));

/// Dictionaries compiled into the binary, one per supported language
const BUILTIN_LOCALES: [(&str, &str); 3] = [
    ("en", include_str!("../locales/en.json")),
    ("ko", include_str!("../locales/ko.json")),
    ("zh", include_str!("../locales/zh.json")),
];

#[derive(Debug, Clone, Default)]
pub struct LocalizedMessages(pub HashMap<String, String>);
impl LocalizedMessages {
    pub fn new() -> Self {
        LocalizedMessages(HashMap::new())
    }
    pub fn with_message(&mut self, key: &str, message: &str) -> &mut Self {
        self.0.insert(key.to_owned(), message.to_owned());
        self
    }
    pub fn get_message(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }
    pub fn get_messages(&self) -> &HashMap<String, String> {
        &self.0
    }
    pub fn get(&self, key: &str) -> String {
        self.get_or_default(key, key)
    }
    pub fn get_or_default(&self, key: &str, default: &str) -> String {
        self.0
            .get(key)
            .map_or_else(|| default.to_string(), String::clone)
    }
}

#[derive(Debug, Clone)]
pub struct I18n {
    // Keyed by locale and then by message key
    // e.g. messages["en"]["nav.home"] = "Home"
    //      messages["ko"]["nav.home"] = "홈"
    messages: HashMap<String, LocalizedMessages>,
    default_locale: String,
}

impl Default for I18n {
    fn default() -> Self {
        Self::new()
    }
}

impl I18n {
    pub fn new() -> Self {
        I18n {
            messages: HashMap::new(),
            default_locale: Language::DEFAULT.code().to_string(),
        }
    }

    /// Dictionary preloaded with the bundled `en`, `ko` and `zh` messages
    pub fn with_builtin_messages() -> Result<Self, LoaderError> {
        let mut i18n = Self::new();
        for (locale, json) in BUILTIN_LOCALES {
            let messages = loader::load_messages_from_str(json, &format!("{}.json", locale))?;
            i18n.with_messages_for_locale(locale, messages);
        }
        Ok(i18n)
    }

    pub fn with_locale(&mut self, locale: &str) -> &mut Self {
        self.default_locale = locale.to_lowercase();
        self
    }

    pub fn get_default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn with_messages_for_locale(
        &mut self,
        locale: &str,
        messages: LocalizedMessages,
    ) -> &mut Self {
        self.messages.insert(locale.to_lowercase(), messages);
        self
    }

    /// Merge every dictionary in `dir` over the loaded ones
    pub fn load_dir(&mut self, dir: &std::path::Path) -> Result<&mut Self, LoaderError> {
        for (locale, loaded) in loader::load_all_messages_from_dir(dir)? {
            let messages = self
                .messages
                .entry(locale)
                .or_insert_with(LocalizedMessages::new);
            messages.0.extend(loaded.0);
        }
        Ok(self)
    }

    pub fn add_message(&mut self, locale: &str, key: &str, message: &str) {
        self.messages
            .entry(locale.to_lowercase())
            .or_insert_with(LocalizedMessages::new)
            .with_message(key, message);
    }

    /// Message for `key` in `locale`, or the key itself when missing
    pub fn get_message(&self, locale: &str, key: &str) -> String {
        self.messages
            .get(locale)
            .and_then(|messages| messages.get_message(key))
            .map_or_else(|| key.to_string(), String::clone)
    }

    /// Message with `$1`, `$2`... replaced by `values`; unmatched
    /// placeholders are left as they are.
    pub fn localize(&self, locale: &str, key: &str, values: &[String]) -> String {
        let message = self.get_message(locale, key);
        PLACEHOLDER
            .replace_all(&message, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| values.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }
}
