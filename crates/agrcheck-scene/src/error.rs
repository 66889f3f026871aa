//! Error types for loading and resolving scene snapshots.

use thiserror::Error;

/// Errors raised while building or decoding parts of the scene model.
///
/// These never abort a sweep on their own: the importer decides whether a
/// failure is fatal (no snapshot at all) or becomes a data fault recorded on
/// the relevant finding.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The snapshot document could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file backing part of the snapshot could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A PNG header or frame could not be decoded.
    #[error("failed to decode PNG '{file}': {message}")]
    Png { file: String, message: String },

    /// A geojson document did not have the expected feature layout.
    #[error("malformed geojson: {0}")]
    Geojson(String),

    /// A classifier table row could not be parsed.
    #[error("classifier line {line}: {message}")]
    Classifier { line: usize, message: String },

    /// A tier profile file could not be resolved.
    #[error("unknown tier profile '{0}'")]
    UnknownProfile(String),
}

impl SceneError {
    pub(crate) fn png(file: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SceneError::Png {
            file: file.into(),
            message: message.to_string(),
        }
    }
}
