//! Configuration for IPX800 V5 tooling.
//!
//! TOML hub profiles, credential resolution (env + keyring + plaintext),
//! and translation to `ipx800_core::HubConfig`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ipx800_core::config::{DEFAULT_HUB_NAME, DEFAULT_PORT};
use ipx800_core::{HardwareKind, HubConfig, RawDescriptor, SetupSource};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "ipx800";

/// Environment prefix; nested keys use `__` (`IPX800_DEFAULTS__SCAN_INTERVAL`).
pub const ENV_PREFIX: &str = "IPX800_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for hub '{hub}'")]
    NoCredentials { hub: String },

    #[error("hub '{name}' is not configured")]
    UnknownHub { name: String },

    #[error("no hub configured")]
    NoHub,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Hub used when `--hub` is not given.
    pub default_hub: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub hubs: BTreeMap<String, HubProfile>,
}

impl Config {
    /// Pick a hub profile: the requested one, else `default_hub`, else the
    /// only configured hub.
    pub fn hub<'a>(&'a self, requested: Option<&'a str>) -> Result<(&'a str, &'a HubProfile), ConfigError> {
        let name = match requested.or(self.default_hub.as_deref()) {
            Some(name) => name,
            None => {
                let mut names = self.hubs.keys();
                match (names.next(), names.next()) {
                    (Some(only), None) => only.as_str(),
                    (None, _) => return Err(ConfigError::NoHub),
                    (Some(_), Some(_)) => {
                        return Err(ConfigError::Validation {
                            field: "default_hub".into(),
                            reason: "several hubs configured, pick one with --hub".into(),
                        });
                    }
                }
            }
        };
        self.hubs
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownHub { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Poll interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_scan_interval() -> u64 {
    15
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// One hub.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubProfile {
    /// Display name; also names the hub device group.
    pub name: Option<String>,

    /// Hub IP address or hostname.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// API key in plaintext; prefer the keyring or an env var.
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Password the hub sends with push calls, in plaintext; prefer the keyring.
    pub push_password: Option<String>,

    pub push_password_env: Option<String>,

    /// Override the poll interval, in seconds.
    pub scan_interval: Option<u64>,

    /// `import` discovers only `devices_auto`; `user` discovers everything.
    #[serde(default)]
    pub source: SetupSource,

    /// Type codes to auto-discover (`ipx`, `x8r`, `tempo`, ...).
    #[serde(default)]
    pub devices_auto: Vec<String>,

    /// Also create the hub diagnostic sensors.
    #[serde(default)]
    pub diag_sensors: bool,

    /// Declared devices.
    #[serde(default)]
    pub devices: Vec<RawDescriptor>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("fr", "gce", "ipx800").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ipx800");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn resolve_secret(
    env_name: Option<&str>,
    hub_name: &str,
    keyring_key: &str,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Named env var
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{hub_name}/{keyring_key}")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|s| SecretString::from(s.to_owned()))
}

/// Resolve the hub API key from the credential chain.
pub fn resolve_api_key(profile: &HubProfile, hub_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile.api_key_env.as_deref(),
        hub_name,
        "api-key",
        profile.api_key.as_deref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        hub: hub_name.into(),
    })
}

/// Resolve the push password. `None` disables push.
pub fn resolve_push_password(profile: &HubProfile, hub_name: &str) -> Option<SecretString> {
    resolve_secret(
        profile.push_password_env.as_deref(),
        hub_name,
        "push-password",
        profile.push_password.as_deref(),
    )
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse `devices_auto`. Unknown type codes are logged and ignored.
pub fn auto_types(profile: &HubProfile) -> BTreeSet<HardwareKind> {
    profile
        .devices_auto
        .iter()
        .filter_map(|code| match code.parse::<HardwareKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                warn!(type_code = %code, "unknown type in devices_auto, ignoring");
                None
            }
        })
        .collect()
}

/// Build a `HubConfig` from a profile.
pub fn profile_to_hub_config(
    profile: &HubProfile,
    hub_name: &str,
    defaults: &Defaults,
) -> Result<HubConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let scan_interval = profile.scan_interval.unwrap_or(defaults.scan_interval);
    if scan_interval == 0 {
        return Err(ConfigError::Validation {
            field: "scan_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let mut config = HubConfig::new(profile.host.clone(), resolve_api_key(profile, hub_name)?);
    config.name = profile.name.clone().unwrap_or_else(|| DEFAULT_HUB_NAME.into());
    config.port = profile.port;
    config.push_password = resolve_push_password(profile, hub_name);
    config.scan_interval = Duration::from_secs(scan_interval);
    config.source = profile.source;
    config.auto_types = auto_types(profile);
    config.diag_sensors = profile.diag_sensors;
    config.declared.clone_from(&profile.devices);
    Ok(config)
}
