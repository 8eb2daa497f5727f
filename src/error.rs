//! Error types for calls against the record and profile service.

use thiserror::Error;

/// Result type for every remote operation.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors raised by the session provider, the record service and the
/// profile service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Credential or token acquisition failed. Fatal to the whole run.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// The service answered with a non-success status.
    #[error("{endpoint} failed with status {status}: {body}")]
    Transport {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The body did not match the expected shape.
    #[error("could not decode {what} response ({source}); body was: {body}")]
    Decode {
        what: &'static str,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Connection failure or timeout before a status arrived.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The session could not be encoded into an `Authorization` header.
    #[error("session cannot be sent as a header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl ApiError {
    /// Whether this failure came from the transport (status or network)
    /// and may be swallowed and reported by batch callers.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Network(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => Some(*status),
            ApiError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_carries_status_and_body() {
        let err = ApiError::Transport {
            endpoint: "DELETE /users/U-1/records/R-1".into(),
            status: 404,
            body: "not found".into(),
        };
        assert!(err.is_transport());
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "DELETE /users/U-1/records/R-1 failed with status 404: not found"
        );
    }

    #[test]
    fn decode_error_keeps_raw_body() {
        let source = serde_json::from_str::<Vec<u8>>("{oops").unwrap_err();
        let err = ApiError::Decode {
            what: "records",
            body: "{oops".into(),
            source,
        };
        assert!(!err.is_transport());
        assert!(err.to_string().contains("body was: {oops"));
    }

    #[test]
    fn auth_error_is_not_transport() {
        let err = ApiError::Auth {
            reason: "bad password".into(),
        };
        assert!(!err.is_transport());
        assert_eq!(err.status(), None);
    }
}
