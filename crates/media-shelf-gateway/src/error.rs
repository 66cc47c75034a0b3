use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not authenticated with the remote store")]
    Unauthenticated,
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),
    #[error("unexpected response: {0}")]
    Protocol(String),
    /// A batched delete failed after earlier batches were committed.
    #[error("deleted {removed} documents before failing: {source}")]
    PartialDelete {
        removed: usize,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    pub fn status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return GatewayError::Unauthenticated;
        }
        GatewayError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

/// Reject ids that would escape their collection when used as a path segment.
pub fn check_segment(segment: &str) -> Result<(), GatewayError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') || segment.contains('\\') {
        return Err(GatewayError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}
