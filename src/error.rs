//! Error types for extraction and transport. Extraction errors are values
//! that end up cached inside `PreviewResult::Unavailable`, so they are Clone
//! and Serialize for the frontend.

/// Terminal failure of a single frame extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("metadata unavailable: {0}")]
    Metadata(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("extraction deadline elapsed")]
    Timeout,
}

impl serde::Serialize for ExtractError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Failure of a single candidate fetch. `Http` and `Network` mean the body
/// never decoded; only decoded bodies reach the shape classifier.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server returned status {status}")]
    Http { status: u16 },

    #[error("response body was not valid JSON: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_serializes_to_message() {
        let json = serde_json::to_string(&ExtractError::Timeout).unwrap();
        assert_eq!(json, "\"extraction deadline elapsed\"");
    }

    #[test]
    fn capture_error_carries_detail() {
        let e = ExtractError::Capture("bad surface".into());
        assert_eq!(e.to_string(), "frame capture failed: bad surface");
    }
}
