use std::time::Duration;
use thiserror::Error;

/// Error types for the Machine Translation module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Target language outside the supported set
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
    /// Malformed locale code in a request
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Missing or invalid configuration (API keys, settings files)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Transport-level failure talking to a provider
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Provider answered with a non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// Provider answered, but not in the shape we expect
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Provider echoed the input or returned nothing
    #[error("Provider returned the input unchanged")]
    UnchangedText,
    /// Provider did not answer within the configured time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// Generic provider-side translation failure
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Every configured provider failed or was skipped
    #[error("All translation providers failed ({attempts} attempted)")]
    AllProvidersExhausted { attempts: usize },
    /// A cache entry could not be decoded
    #[error("Corrupt cache entry '{key}': {reason}")]
    CacheCorruption { key: String, reason: String },
    /// Cache backend I/O failure
    #[error("Cache error: {0}")]
    CacheError(String),
}

impl MtError {
    /// Whether this error came from a single provider attempt, meaning the
    /// next provider should be tried.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            MtError::NetworkError(_)
                | MtError::HttpStatus { .. }
                | MtError::MalformedResponse(_)
                | MtError::UnchangedText
                | MtError::Timeout(_)
                | MtError::TranslationError(_)
                | MtError::InvalidLocale(_)
        )
    }
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MtError::MalformedResponse(err.to_string())
        } else {
            MtError::NetworkError(err.to_string())
        }
    }
}

impl From<crate::language::UnsupportedLanguage> for MtError {
    fn from(err: crate::language::UnsupportedLanguage) -> Self {
        MtError::UnsupportedLanguage(err.0)
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failures_are_classified() {
        assert!(MtError::UnchangedText.is_provider_failure());
        assert!(MtError::Timeout(Duration::from_secs(10)).is_provider_failure());
        assert!(
            MtError::HttpStatus {
                status: 503,
                body: "busy".to_string()
            }
            .is_provider_failure()
        );
        assert!(!MtError::AllProvidersExhausted { attempts: 5 }.is_provider_failure());
        assert!(!MtError::UnsupportedLanguage("fr".to_string()).is_provider_failure());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            MtError::UnsupportedLanguage("fr".to_string()).to_string(),
            "Unsupported language: fr"
        );
        assert_eq!(
            MtError::AllProvidersExhausted { attempts: 3 }.to_string(),
            "All translation providers failed (3 attempted)"
        );
    }
}
