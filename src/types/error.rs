//! Error types for Herald

use hyper::StatusCode;

/// Main error type for Herald operations
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    /// Missing or invalid request fields. User-correctable; never reaches
    /// the store layer.
    #[error("{0}")]
    Validation(String),

    /// Topic lookup against the store failed. Distinct from an empty
    /// lookup result, which resolves to the slug itself.
    #[error("Failed to lookup topic: {0}")]
    Resolution(String),

    /// A create/read/update against the store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Local tone/notification rendering failed. Non-fatal: logged and
    /// swallowed, never surfaced over HTTP.
    #[error("Presentation error: {0}")]
    Presentation(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Resolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Presentation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for HeraldError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for HeraldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Http(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for HeraldError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for HeraldError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<reqwest::Error> for HeraldError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for HeraldError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Internal(format!("WebSocket error: {}", err))
    }
}

/// Result type alias for Herald operations
pub type Result<T> = std::result::Result<T, HeraldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err = HeraldError::Validation("title is required".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_and_resolution_map_to_500() {
        assert_eq!(
            HeraldError::Store("insert failed".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            HeraldError::Resolution("connection refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
