//! Error types for the ONTAP fact gatherer
//!
//! Provides structured error types for session setup, the ZAPI transport,
//! response normalization, and the command-line front end.

use thiserror::Error;

/// Unified error type for the fact gatherer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Setup Errors
    // =========================================================================
    #[error("Session setup failed: {0}")]
    Setup(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Call Errors
    // =========================================================================
    #[error("Error calling API {call}: {source}")]
    ApiCall {
        call: String,
        #[source]
        source: Box<Error>,
    },

    #[error("ZAPI error {errno}: {reason}")]
    Zapi { errno: String, reason: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    // =========================================================================
    // Response Errors
    // =========================================================================
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Malformed ZAPI response: {0}")]
    MalformedResponse(String),

    #[error("Unexpected record in {call} response: expected <{expected}>, found <{found}>")]
    UnexpectedRecord {
        call: String,
        expected: String,
        found: String,
    },

    /// `index` is the zero-based position of the record in the reply
    #[error("Key field {field} missing from {call} record {index}")]
    MissingKeyField {
        call: String,
        field: String,
        index: usize,
    },

    // =========================================================================
    // Encoding Errors
    // =========================================================================
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Wrap an error with the name of the API call that produced it
    pub fn api_call(call: impl Into<String>, source: Error) -> Self {
        Error::ApiCall {
            call: call.into(),
            source: Box::new(source),
        }
    }

    /// Name of the failing API call, if this error carries one
    pub fn call(&self) -> Option<&str> {
        match self {
            Error::ApiCall { call, .. }
            | Error::UnexpectedRecord { call, .. }
            | Error::MissingKeyField { call, .. } => Some(call),
            _ => None,
        }
    }

    /// Check if the cluster answered with a ZAPI-level failure
    pub fn is_protocol(&self) -> bool {
        match self {
            Error::Zapi { .. } => true,
            Error::ApiCall { source, .. } => source.is_protocol(),
            _ => false,
        }
    }

    /// Check if the error happened before any call was attempted
    pub fn is_setup(&self) -> bool {
        matches!(self, Error::Setup(_) | Error::Configuration(_))
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        if self.is_setup() {
            2
        } else {
            1
        }
    }
}

/// Result type alias for the fact gatherer
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_call_message_names_call() {
        let err = Error::api_call(
            "volume-get-iter",
            Error::Zapi {
                errno: "13005".into(),
                reason: "Unable to find API".into(),
            },
        );

        assert_eq!(
            err.to_string(),
            "Error calling API volume-get-iter: ZAPI error 13005: Unable to find API"
        );
        assert_eq!(err.call(), Some("volume-get-iter"));
        assert!(err.is_protocol());
    }

    #[test]
    fn test_error_classification() {
        let setup = Error::Setup("hostname is required".into());
        assert!(setup.is_setup());
        assert_eq!(setup.exit_code(), 2);
        assert!(!setup.is_protocol());

        let status = Error::api_call(
            "aggr-get-iter",
            Error::HttpStatus {
                status: 401,
                reason: "Unauthorized".into(),
            },
        );
        assert!(!status.is_setup());
        assert!(!status.is_protocol());
        assert_eq!(status.exit_code(), 1);
    }
}
