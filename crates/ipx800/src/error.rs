//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text and
//! stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use ipx800_config::ConfigError;
use ipx800_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Hub ──────────────────────────────────────────────────────────

    #[error("IPX800 at {host} is not reachable: {reason}")]
    #[diagnostic(
        code(ipx800::not_ready),
        help("Check that the hub is powered and reachable from this machine.")
    )]
    NotReady { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ipx800::auth_failed),
        help("Check the API key in the hub's web interface (System > API).")
    )]
    AuthFailed { message: String },

    #[error("No API key configured for hub '{hub}'")]
    #[diagnostic(
        code(ipx800::no_credentials),
        help(
            "Set `api_key` or `api_key_env` in the hub profile,\n\
             or store it in the system keyring under service 'ipx800', entry '{hub}/api-key'."
        )
    )]
    NoCredentials { hub: String },

    #[error("Invalid hub topology: {message}")]
    #[diagnostic(code(ipx800::topology))]
    Topology { message: String },

    // ── Snapshot ─────────────────────────────────────────────────────

    #[error("Snapshot not found: {path}")]
    #[diagnostic(code(ipx800::snapshot_not_found))]
    SnapshotNotFound { path: String },

    #[error("Invalid snapshot {path}: {message}")]
    #[diagnostic(
        code(ipx800::invalid_snapshot),
        help("A snapshot is a JSON object with `hub`, `system`, `extensions`, `objects` and `state`.")
    )]
    InvalidSnapshot { path: String, message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Hub '{name}' not found in configuration")]
    #[diagnostic(code(ipx800::hub_not_found), help("Configured hubs: {available}"))]
    HubNotFound { name: String, available: String },

    #[error("{count} declared device(s) are invalid")]
    #[diagnostic(
        code(ipx800::invalid_declarations),
        help("Fix or remove the listed entries; they are skipped at setup.")
    )]
    InvalidDeclarations { count: usize },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ipx800::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(ipx800::config))]
    Config(Box<ConfigError>),

    #[error("Internal error: {0}")]
    #[diagnostic(code(ipx800::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML output failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotReady { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::SnapshotNotFound { .. } | Self::HubNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { hub } => CliError::NoCredentials { hub },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownHub { name } => CliError::HubNotFound {
                name,
                available: "(see `ipx800 config show`)".into(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotReady { host, reason } => CliError::NotReady { host, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Topology { message } => CliError::Topology { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Api { message } | CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
