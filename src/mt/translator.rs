//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction.
//! The premium Google provider, the community providers and the mock used in
//! tests all implement it, so the orchestrator can walk them in order without
//! knowing anything about their wire formats.
//!
//! # Example
//!
//! ```ignore
//! use relay_i18n::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let result = provider.translate("Hello, world!", "en", "ko").await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// All methods are async to support I/O-bound operations like network requests.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    ///
    /// # Arguments
    ///
    /// * `text` - The text (plain or HTML) to translate
    /// * `source_locale` - Source language code, or `"auto"` to let the provider detect it
    /// * `target_locale` - Target language code (e.g., "ko", "zh")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text, guaranteed non-empty and different from `text`
    /// * `Err(MtError)` - If the request failed, the response was malformed,
    ///   or the provider echoed the input back
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Get the name of this translation provider
    ///
    /// Used for logging, status reports and `TranslationOutcome::method`.
    fn provider_name(&self) -> &str;

    /// Position in the fallback order; lower values are tried first.
    fn priority(&self) -> u32 {
        100
    }
}

/// Source locale value meaning "let the provider detect it"
pub const AUTO_LOCALE: &str = "auto";

/// Normalize a locale code by stripping region information
///
/// - `en-US` → `en`
/// - `zh-Hans` → `zh`
/// - `ko` → `ko` (unchanged)
pub fn normalize_locale(locale: &str) -> String {
    locale.split('-').next().unwrap_or(locale).to_lowercase()
}

/// Validate that a locale code is in acceptable format
///
/// Checks that the locale code contains only alphanumeric characters,
/// hyphens, and underscores.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

/// Reject provider output that is empty or just the input echoed back.
///
/// Several free providers answer 200 with the source text when they cannot
/// translate; treating that as a failure lets the caller move on.
pub fn ensure_translated(input: &str, output: String) -> MtResult<String> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == input.trim() {
        return Err(MtError::UnchangedText);
    }
    Ok(output)
}
