use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;
use url::ParseError as UrlParseError;

use crate::event::NavigationResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum CanopyError {
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Invalid Command: {0}")]
    Command(String),
    /// The cache returned no parent data at all for a note expected to have
    /// some. Distinct from an empty parent set: this signals cache corruption
    /// and aborts the resolution attempt.
    #[error("No parent data found for note: {0}")]
    MissingParents(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    /// A non-root note whose current parent set is empty. Raised from the
    /// first-valid-path walk.
    #[error("No parents found for note: {0}")]
    Orphan(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Service API error: {0}")]
    Service(String),
    /// A note has no path to the root at all.
    #[error("No path to root for note: {0}")]
    Unreachable(String),
}

impl CanopyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CanopyError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanopyError::Command(_) => StatusCode::BAD_REQUEST,
            CanopyError::MissingParents(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanopyError::NotFound(_) => StatusCode::NOT_FOUND,
            CanopyError::Orphan(_) => StatusCode::NOT_FOUND,
            CanopyError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanopyError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanopyError::Unreachable(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<JsonError> for CanopyError {
    fn from(src: JsonError) -> CanopyError {
        CanopyError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<toml::de::Error> for CanopyError {
    fn from(src: toml::de::Error) -> CanopyError {
        CanopyError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for CanopyError {
    fn from(src: toml::ser::Error) -> CanopyError {
        CanopyError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<UrlParseError> for CanopyError {
    fn from(src: UrlParseError) -> CanopyError {
        CanopyError::Serialization(format!("Invalid URL: {src}"))
    }
}

impl From<TokioSendError<NavigationResult>> for CanopyError {
    fn from(x: TokioSendError<NavigationResult>) -> Self {
        CanopyError::Service(format!(
            "Channel send error, could not transmit navigation result {:?}",
            x.0
        ))
    }
}
