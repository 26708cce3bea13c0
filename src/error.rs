//! Error types for the host capability bridge.

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Policies use this to decide how to report a failure without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A request value could not be turned into bytes.
    Serialization,
    /// Host bytes did not parse into the expected shape.
    Decode,
    /// The host explicitly signaled failure.
    HostCall,
    /// A standard I/O descriptor failed.
    Io,
    /// Policy settings were rejected.
    Settings,
}

/// Errors that can occur in the bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Codec Errors
    // =========================================================================
    /// Serialization of a request value failed.
    #[error("cannot serialize {type_name}: {reason}")]
    Serialization { type_name: String, reason: String },

    /// Decoding of host bytes into a typed value failed.
    #[error("cannot decode {type_name}: {reason}")]
    Decode { type_name: String, reason: String },

    // =========================================================================
    // Host Call Errors
    // =========================================================================
    /// Host reported failure for a capability call.
    ///
    /// `message` is the host's reply decoded as UTF-8, unchanged.
    #[error("host call {capability} failed: {message}")]
    HostCall { capability: String, message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Policy Errors
    // =========================================================================
    /// Settings supplied to the policy are invalid.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl Error {
    /// Creates a serialization error for the named request type.
    pub fn serialization(type_name: &str, reason: impl ToString) -> Self {
        Self::Serialization {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a decode error for the named response type.
    pub fn decode(type_name: &str, reason: impl ToString) -> Self {
        Self::Decode {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::HostCall { .. } => ErrorKind::HostCall,
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidSettings(_) => ErrorKind::Settings,
        }
    }

    /// Returns the host's own message for a failed host call.
    #[must_use]
    pub fn host_message(&self) -> Option<&str> {
        match self {
            Self::HostCall { message, .. } => Some(message),
            _ => None,
        }
    }
}
