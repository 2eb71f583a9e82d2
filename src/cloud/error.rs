//! Error types for the cloud control-plane boundary
//!
//! Every remote call made by the provisioners surfaces one of these variants.
//! The provisioners only need to tell three situations apart: the resource is
//! missing, the resource already exists, or something else went wrong.

use std::time::Duration;
use thiserror::Error;

/// Error codes that mean "the thing you asked about does not exist"
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "NoSuchEntity",
    "NotFoundException",
];

/// Error codes that mean "the thing you tried to create already exists"
const CONFLICT_CODES: &[&str] = &[
    "ConflictException",
    "EntityAlreadyExists",
    "ResourceAlreadyExistsException",
];

/// Errors that can occur when calling the remote control plane
#[derive(Debug, Error)]
pub enum CloudError {
    /// The addressed resource does not exist
    #[error("{operation}: resource not found: {message}")]
    NotFound {
        /// Remote operation that failed
        operation: &'static str,
        /// Message returned by the service
        message: String,
    },

    /// The resource being created already exists
    #[error("{operation}: resource already exists: {message}")]
    Conflict {
        /// Remote operation that failed
        operation: &'static str,
        /// Message returned by the service
        message: String,
    },

    /// The service rejected the request
    #[error("{operation} failed ({code}): {message}")]
    Service {
        /// Remote operation that failed
        operation: &'static str,
        /// Service error code
        code: String,
        /// Message returned by the service
        message: String,
    },

    /// The request never produced a service response (network, credentials, timeout)
    #[error("{operation} request failed: {message}")]
    Transport {
        /// Remote operation that failed
        operation: &'static str,
        /// Description of the failure
        message: String,
    },

    /// The service answered but left out a field we depend on
    #[error("{operation} returned an incomplete response: {field} missing")]
    IncompleteResponse {
        /// Remote operation
        operation: &'static str,
        /// Name of the missing field
        field: &'static str,
    },

    /// A request could not be built locally
    #[error("invalid request for {operation}: {message}")]
    InvalidRequest {
        /// Remote operation
        operation: &'static str,
        /// Validation message
        message: String,
    },

    /// A readiness wait gave up
    #[error("timed out after {waited:?} waiting for {resource} to become {state}")]
    WaitTimeout {
        /// Resource being waited on
        resource: String,
        /// Desired state
        state: &'static str,
        /// How long we waited
        waited: Duration,
    },
}

impl CloudError {
    /// Build an error from a service error code and message.
    ///
    /// Known "not found" and "already exists" codes map to their dedicated
    /// variants; anything else keeps the raw code.
    pub fn from_code(operation: &'static str, code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some(code) if NOT_FOUND_CODES.contains(&code) => Self::NotFound { operation, message },
            Some(code) if CONFLICT_CODES.contains(&code) => Self::Conflict { operation, message },
            Some(code) => Self::Service {
                operation,
                code: code.to_string(),
                message,
            },
            None => Self::Transport { operation, message },
        }
    }

    /// Shorthand for a missing response field
    pub fn incomplete(operation: &'static str, field: &'static str) -> Self {
        Self::IncompleteResponse { operation, field }
    }

    /// Shorthand for a request that failed local validation
    pub fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            operation,
            message: message.into(),
        }
    }

    /// True when the service reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the failure means the resource already exists.
    ///
    /// Some services report this with a generic error code, so the message
    /// text is checked as well.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Service { message, .. } | Self::Transport { message, .. } => {
                message.to_ascii_lowercase().contains("already exists")
            }
            _ => false,
        }
    }
}

/// Result type alias for control-plane calls
pub type CloudResult<T> = std::result::Result<T, CloudError>;
