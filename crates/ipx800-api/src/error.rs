use thiserror::Error;

/// Top-level error type for the `ipx800-api` crate.
///
/// Covers every failure mode of the hub surface: reachability,
/// API key rejection, and malformed payloads.
/// `ipx800-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Reachability ────────────────────────────────────────────────
    /// The hub did not answer (connection refused, DNS failure, timeout).
    #[error("Cannot connect to IPX800 at {host}: {reason}")]
    CannotConnect { host: String, reason: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The hub rejected the API key.
    #[error("Invalid API key")]
    InvalidAuth,

    // ── Data ────────────────────────────────────────────────────────
    /// The hub answered, but the payload does not describe a topology.
    #[error("Malformed hub data: {message}")]
    Malformed { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Reading a local snapshot failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CannotConnect { .. })
    }

    /// Returns `true` if the hub rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::InvalidAuth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unreachable_is_transient() {
        let unreachable = Error::CannotConnect {
            host: "192.168.1.240".into(),
            reason: "connection refused".into(),
        };
        assert!(unreachable.is_transient());
        assert!(!Error::InvalidAuth.is_transient());
        assert!(Error::InvalidAuth.is_auth());
    }
}
