// ── Core error types ──
//
// User-facing errors from ipx800-core. Transport details from the hub
// client are folded into domain variants by `From<ipx800_api::Error>`.
// Problems with a single declared descriptor are not errors at this level;
// they are reported as `RejectedDescriptor` values.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Setup ────────────────────────────────────────────────────────
    /// The hub could not be reached. The host should retry setup later.
    #[error("IPX800 at {host} is not ready: {reason}")]
    NotReady { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    /// The hub answered with a topology that cannot be trusted.
    #[error("Invalid hub topology: {message}")]
    Topology { message: String },

    #[error("API error: {message}")]
    Api { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ipx800_api::Error> for CoreError {
    fn from(err: ipx800_api::Error) -> Self {
        match err {
            ipx800_api::Error::CannotConnect { host, reason } => CoreError::NotReady { host, reason },
            ipx800_api::Error::InvalidAuth => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            ipx800_api::Error::Malformed { message } => CoreError::Topology { message },
            ipx800_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
            },
            ipx800_api::Error::Io(e) => CoreError::Internal(format!("IO error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_hub_is_not_ready() {
        let err: CoreError = ipx800_api::Error::CannotConnect {
            host: "10.0.0.2".into(),
            reason: "timed out".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotReady { ref host, .. } if host == "10.0.0.2"));
    }

    #[test]
    fn malformed_data_is_a_topology_error() {
        let err: CoreError = ipx800_api::Error::Malformed {
            message: "extension without type".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Topology { .. }));
    }
}
