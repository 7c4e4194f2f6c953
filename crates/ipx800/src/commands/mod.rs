//! Command handlers and the helpers they share.

pub mod config_cmd;
pub mod devices;
pub mod discover;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use ipx800_api::StaticHub;
use ipx800_config::{Config, ConfigError};
use ipx800_core::{DeviceDescriptor, HubConfig, SetupSource};
use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Config ──────────────────────────────────────────────────────────

pub(crate) fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(ipx800_config::config_path)
}

pub(crate) fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(ipx800_config::load_config_from(&config_file(global))?)
}

/// `--output`, else `defaults.output`, else table.
pub(crate) fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Build the hub configuration for the selected profile.
///
/// With no hub configured at all (and none requested) a snapshot can still
/// be inspected: everything is discovered and nothing is declared.
pub(crate) fn hub_config(global: &GlobalOpts, cfg: &Config) -> Result<HubConfig, CliError> {
    match cfg.hub(global.hub.as_deref()) {
        Ok((name, profile)) => Ok(ipx800_config::profile_to_hub_config(
            profile,
            name,
            &cfg.defaults,
        )?),
        Err(ConfigError::NoHub) => {
            tracing::debug!("no hub configured, discovering everything");
            let mut config = HubConfig::new("snapshot", SecretString::from(String::new()));
            config.source = SetupSource::User;
            Ok(config)
        }
        Err(ConfigError::UnknownHub { name }) => Err(unknown_hub(name, cfg)),
        Err(other) => Err(other.into()),
    }
}

pub(crate) fn unknown_hub(name: String, cfg: &Config) -> CliError {
    let available = if cfg.hubs.is_empty() {
        "(none)".to_owned()
    } else {
        cfg.hubs.keys().cloned().collect::<Vec<_>>().join(", ")
    };
    CliError::HubNotFound { name, available }
}

// ── Snapshot ────────────────────────────────────────────────────────

pub(crate) fn load_snapshot(path: &Path) -> Result<StaticHub, CliError> {
    StaticHub::from_path(path).map_err(|e| match e {
        ipx800_api::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            CliError::SnapshotNotFound {
                path: path.display().to_string(),
            }
        }
        ipx800_api::Error::Io(io) => CliError::Io(io),
        other => CliError::InvalidSnapshot {
            path: path.display().to_string(),
            message: other.to_string(),
        },
    })
}

// ── Device rows ─────────────────────────────────────────────────────

/// A descriptor as printed: its entity id and owning device included.
#[derive(Debug, Serialize)]
pub(crate) struct DeviceView {
    pub unique_id: String,
    pub device: String,
    pub model: String,
    #[serde(flatten)]
    pub descriptor: DeviceDescriptor,
}

impl DeviceView {
    pub fn new(descriptor: &DeviceDescriptor, mac: &str, hub_name: &str) -> Self {
        Self {
            unique_id: descriptor.unique_id(mac),
            device: descriptor.device_name(hub_name),
            model: descriptor.kind.model(),
            descriptor: descriptor.clone(),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct DeviceRow {
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "#")]
    ordinal: u32,
    #[tabled(rename = "Channel")]
    channel: String,
    #[tabled(rename = "Subtype")]
    subtype: String,
    #[tabled(rename = "Device")]
    device: String,
}

impl From<&DeviceView> for DeviceRow {
    fn from(v: &DeviceView) -> Self {
        let d = &v.descriptor;
        Self {
            platform: d.platform.to_string(),
            name: d.name.clone(),
            kind: d.kind.to_string(),
            ordinal: d.ordinal,
            channel: d.channel.to_string(),
            subtype: d.subtype.as_ref().map(ToString::to_string).unwrap_or_default(),
            device: v.device.clone(),
        }
    }
}
