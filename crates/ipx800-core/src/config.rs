// ── Runtime hub configuration ──
//
// Describes how to reach one hub and what to build for it. Built by
// `ipx800-config` from a profile, or directly by tests.

use std::collections::BTreeSet;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::discovery::DiscoveryFilter;
use crate::model::{HardwareKind, RawDescriptor};

pub const DEFAULT_HUB_NAME: &str = "IPX800 V5";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_REFRESH_DEBOUNCE: Duration = Duration::from_millis(500);
/// Intervals below this are accepted but logged.
pub const MIN_RECOMMENDED_SCAN_INTERVAL: Duration = Duration::from_secs(10);

/// How the hub entry was created.
///
/// Interactive setup discovers everything; an imported (file-based) entry
/// only discovers the kinds listed in `auto_types`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SetupSource {
    User,
    #[default]
    Import,
}

/// Configuration for one hub instance.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub display name, also used as the hub device group name.
    pub name: String,
    pub host: String,
    pub port: u16,
    pub api_key: SecretString,
    /// Password expected in push callbacks. Push is refused when unset.
    pub push_password: Option<SecretString>,
    pub scan_interval: Duration,
    pub refresh_debounce: Duration,
    pub source: SetupSource,
    pub auto_types: BTreeSet<HardwareKind>,
    pub diag_sensors: bool,
    /// Declared descriptors, as authored.
    pub declared: Vec<RawDescriptor>,
}

impl HubConfig {
    pub fn new(host: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            name: DEFAULT_HUB_NAME.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            api_key,
            push_password: None,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            refresh_debounce: DEFAULT_REFRESH_DEBOUNCE,
            source: SetupSource::default(),
            auto_types: BTreeSet::new(),
            diag_sensors: false,
            declared: Vec::new(),
        }
    }

    pub fn discovery_filter(&self) -> DiscoveryFilter {
        DiscoveryFilter {
            source: self.source,
            auto_types: self.auto_types.clone(),
            diag_sensors: self.diag_sensors,
        }
    }
}
