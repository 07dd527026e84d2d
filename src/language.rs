//! Supported site languages

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A language the site can be displayed in.
///
/// English is the authoring language; everything else is produced by
/// machine translation or the static dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Ko,
    Zh,
}

/// Returned when a language code is outside the supported set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported language code '{0}'")]
pub struct UnsupportedLanguage(pub String);

impl Language {
    /// The language content is authored in
    pub const DEFAULT: Language = Language::En;

    pub fn all() -> [Language; 3] {
        [Language::En, Language::Ko, Language::Zh]
    }

    /// ISO 639-1 code, also used as the provider-facing code
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
            Language::Zh => "zh",
        }
    }

    /// Name of the language in itself, for language switchers
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ko => "한국어",
            Language::Zh => "中文",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    /// Accepts bare codes and region-qualified ones (`ko-KR`, `zh-Hans`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::mt::translator::normalize_locale(s.trim()).as_str() {
            "en" => Ok(Language::En),
            "ko" => Ok(Language::Ko),
            "zh" => Ok(Language::Zh),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
