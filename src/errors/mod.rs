//! # Error Handling
//!
//! Error types for the network-policy injection plugin, defined with `thiserror`.
//!
//! Only two kinds abort a listener build: [`Error::InvariantViolation`] and
//! [`Error::UnknownProtocol`]. Both point at a defect in an upstream listener
//! construction stage, so neither is ever retried.

/// Custom result type for plugin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the plugin
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The listener's filter chains and the parallel chain views diverged
    #[error(
        "expected same number of filter chains in listener '{listener}' ({listener_chains}) and views ({view_chains})"
    )]
    InvariantViolation { listener: String, listener_chains: usize, view_chains: usize },

    /// A chain carried a protocol tag outside the known enumeration
    #[error("unknown listener protocol tag: {value}")]
    UnknownProtocol { value: i32 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filter payload encoding/decoding errors
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invariant violation error
    pub fn invariant_violation<S: Into<String>>(
        listener: S,
        listener_chains: usize,
        view_chains: usize,
    ) -> Self {
        Self::InvariantViolation { listener: listener.into(), listener_chains, view_chains }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new encoding error
    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Check if the failed operation should be retried.
    ///
    /// Every error here is a logic error rather than a transient fault.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<prost::DecodeError> for Error {
    fn from(error: prost::DecodeError) -> Self {
        Self::Encoding(format!("failed to decode protobuf payload: {}", error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Encoding(format!("failed to map struct payload: {}", error))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Config(format!("failed to parse YAML: {}", error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}
