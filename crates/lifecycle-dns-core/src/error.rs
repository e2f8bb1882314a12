//! Error types for lifecycle DNS reconciliation
//!
//! Every failure is terminal for the current invocation. Nothing here is
//! retried; the triggering infrastructure decides whether to redeliver.

use thiserror::Error;

/// Result type alias for lifecycle DNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lifecycle DNS reconciliation
#[derive(Error, Debug)]
pub enum Error {
    /// The event carried a lifecycle state with no DNS action
    #[error("Unrecognized instance state: {0:?}")]
    UnrecognizedState(String),

    /// The event payload is missing required fields
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The instance directory has no such instance
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// An upsert was requested but the instance has no public address
    #[error("Instance {0} has no public address to publish")]
    AddressUnavailable(String),

    /// The instance carries no usable `hostname` tag
    #[error("Instance {0} has no hostname tag")]
    HostnameMissing(String),

    /// No placeholder record exists in the zone for the host name
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// The zone service rejected or failed a lookup or mutation
    #[error("Zone service error ({provider}): {message}")]
    ZoneService {
        /// Zone service name
        provider: String,
        /// Error message
        message: String,
    },

    /// The instance directory could not be queried
    #[error("Instance directory error: {0}")]
    InstanceDirectory(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an unrecognized state error
    pub fn unrecognized_state(state: impl Into<String>) -> Self {
        Self::UnrecognizedState(state.into())
    }

    /// Create an invalid event error
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent(msg.into())
    }

    /// Create an instance-not-found error
    pub fn instance_not_found(instance_id: impl Into<String>) -> Self {
        Self::InstanceNotFound(instance_id.into())
    }

    /// Create an address-unavailable error
    pub fn address_unavailable(instance_id: impl Into<String>) -> Self {
        Self::AddressUnavailable(instance_id.into())
    }

    /// Create a hostname-missing error
    pub fn hostname_missing(instance_id: impl Into<String>) -> Self {
        Self::HostnameMissing(instance_id.into())
    }

    /// Create a record-not-found error
    pub fn record_not_found(msg: impl Into<String>) -> Self {
        Self::RecordNotFound(msg.into())
    }

    /// Create a zone service error
    pub fn zone_service(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ZoneService {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an instance directory error
    pub fn instance_directory(msg: impl Into<String>) -> Self {
        Self::InstanceDirectory(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure was caused by the event itself rather than by a
    /// collaborator. Redelivering the same event cannot fix these.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnrecognizedState(_) | Self::InvalidEvent(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
