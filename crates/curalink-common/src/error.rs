use thiserror::Error;

#[derive(Debug, Error)]
pub enum CuraLinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network failure, timeout, or non-2xx from an upstream source.
    /// Distinguishes "upstream unreachable" from a legitimate zero-match
    /// response, which is a success with an empty record list.
    #[error("External source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),

    /// The whole response body could not be parsed. Item-level parse
    /// failures inside a batch are not errors; adapters skip and count them.
    /// The field is `origin`, not `source`: thiserror treats a field named
    /// `source` as the error's cause and requires it to be an error type.
    #[error("Malformed payload from {origin}: {message}")]
    MalformedPayload { origin: String, message: String },

    /// A directly-addressed resource (e.g. an ORCID iD) does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Domain not in allowlist for URL {0}")]
    DomainBlocked(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CuraLinkError {
    /// Whole-response source failures that the orchestrator degrades into an
    /// empty result set instead of failing the request.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            CuraLinkError::SourceUnavailable(_) | CuraLinkError::MalformedPayload { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CuraLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_payload_names_its_origin() {
        let err = CuraLinkError::MalformedPayload {
            origin: "pubmed".to_string(),
            message: "unexpected end of document".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed payload from pubmed: unexpected end of document"
        );
        // Whole-response parse failures are degradable source failures.
        assert!(err.is_source_failure());
        // The origin label is payload data, not an error cause.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_not_found_is_not_a_source_failure() {
        let err = CuraLinkError::NotFound("ORCID profile".to_string());
        assert!(!err.is_source_failure());
    }
}
