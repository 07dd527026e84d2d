use crate::LocalizedMessages;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{origin}': {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Invalid JSON in '{0}': root must be an object")]
    NotAnObject(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Invalid filename: {0}")]
    InvalidFileName(PathBuf),
}

/// Parse a message dictionary from a JSON string
///
/// The JSON document should have the following structure:
/// ```json
/// {
///     "@metadata": { ... },  // Ignored
///     "nav.home": "Home",
///     "hero.title": "Future of Compute"
/// }
/// ```
///
/// `origin` names the document in error messages and warnings.
pub fn load_messages_from_str(json: &str, origin: &str) -> Result<LocalizedMessages, LoaderError> {
    let json: Value = serde_json::from_str(json).map_err(|source| LoaderError::Json {
        origin: origin.to_string(),
        source,
    })?;

    let obj = json
        .as_object()
        .ok_or_else(|| LoaderError::NotAnObject(origin.to_string()))?;

    let mut messages = LocalizedMessages::new();
    for (key, value) in obj {
        // Skip metadata
        if key.starts_with('@') {
            continue;
        }

        if let Some(message) = value.as_str() {
            messages.with_message(key, message);
        } else {
            warn!("Message '{}' in '{}' is not a string, skipping", key, origin);
        }
    }

    Ok(messages)
}

/// Load messages from a single JSON file
pub fn load_messages_from_file(path: &Path) -> Result<LocalizedMessages, LoaderError> {
    let content = fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_messages_from_str(&content, &path.display().to_string())
}

/// Load all messages from a directory of JSON files
///
/// The filename (without extension) is used as the locale code:
/// `ko.json` -> `"ko"`. Non-JSON files are ignored.
pub fn load_all_messages_from_dir(
    dir: &Path,
) -> Result<HashMap<String, LocalizedMessages>, LoaderError> {
    if !dir.is_dir() {
        return Err(LoaderError::DirectoryNotFound(dir.to_path_buf()));
    }

    let io_error = |source: std::io::Error| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut all_messages = HashMap::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();

        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let locale = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| LoaderError::InvalidFileName(path.clone()))?
            .to_lowercase();

        let messages = load_messages_from_file(&path)?;
        all_messages.insert(locale, messages);
    }

    if all_messages.is_empty() {
        warn!("No JSON files found in directory {}", dir.display());
    }

    Ok(all_messages)
}
