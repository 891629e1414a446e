//! Client-side error taxonomy.
//!
//! Propagation policy:
//! - `Validation` and `NotAuthenticated` are resolved locally and never
//!   contact the network.
//! - `Rejected` and `Network` surface to the caller as message strings and
//!   are never retried automatically.
//! - `PermissionDenied` for location skips the affected relay cycle only.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// Client-side precondition failed; the submit never left the device.
    #[error("{0}")]
    Validation(String),

    /// The server answered non-2xx with a structured (or fallback) message.
    #[error("{0}")]
    Rejected(String),

    /// Transport failure: no connectivity, timeout, malformed response.
    #[error("Network error: {0}")]
    Network(String),

    /// Location is unavailable or not permitted.
    #[error("Location unavailable")]
    PermissionDenied,

    /// The action requires a token that is absent.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Message string suitable for the UI state.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
