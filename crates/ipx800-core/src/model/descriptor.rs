// ── Device descriptors ──
//
// The unit of configuration and discovery. Declared descriptors come from
// the user (as `RawDescriptor`, validated into `DeviceDescriptor`);
// discovered ones are built from the hub topology.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::kind::{EntityCategory, HardwareKind, Platform, Subtype};
use crate::convert::slugify;

/// Integration domain, prefix of every entity unique id.
pub const DOMAIN: &str = "ipx800v5";

// ── ChannelRef ──────────────────────────────────────────────────────

/// How a descriptor addresses hub state. Exactly one addressing mode per
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRef {
    /// The whole instance (single-instance objects, displays, system buttons).
    Instance,
    /// One 1-based channel of the hub or an extension.
    Number(u32),
    /// An ordered channel group (RGB/RGBW lights, dual-relay climate).
    Numbers(Vec<u32>),
    /// A hub-level state key, bypassing extension addressing.
    Raw(u32),
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "-"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Numbers(v) => {
                let joined: Vec<String> = v.iter().map(u32::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
            Self::Raw(id) => write!(f, "#{id}"),
        }
    }
}

// ── Overrides ───────────────────────────────────────────────────────

/// Cosmetic pass-through fields. Never used for matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<EntityCategory>,
    /// Transition time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<f64>,
    /// Brightness applied on a plain "turn on", 0..=255.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_brightness: Option<u8>,
}

// ── DeviceDescriptor ────────────────────────────────────────────────

/// One entity-to-be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub platform: Platform,
    #[serde(rename = "extension_type")]
    pub kind: HardwareKind,
    #[serde(rename = "extension_ordinal")]
    pub ordinal: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    pub channel: ChannelRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Subtype>,
    #[serde(flatten)]
    pub overrides: Overrides,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, platform: Platform, kind: HardwareKind, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            platform,
            kind,
            ordinal,
            extension_name: None,
            channel: ChannelRef::Instance,
            subtype: None,
            overrides: Overrides::default(),
        }
    }

    pub fn with_channel(mut self, channel: ChannelRef) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn with_extension_name(mut self, name: impl Into<String>) -> Self {
        self.extension_name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: EntityCategory) -> Self {
        self.overrides.entity_category = Some(category);
        self
    }

    /// Platform bucket used for matching; see [`PlatformBucket`].
    pub fn bucket(&self) -> PlatformBucket {
        if self.kind.aliases_light_and_switch() && self.platform.is_switching() {
            PlatformBucket::Switching
        } else {
            PlatformBucket::Platform(self.platform)
        }
    }

    /// Matching identity: kind, ordinal, platform bucket, channel, subtype.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            kind: self.kind,
            ordinal: self.ordinal,
            bucket: self.bucket(),
            channel: self.channel.clone(),
            subtype: self.subtype,
        }
    }

    /// Name of the device group this entity belongs to.
    pub fn device_name(&self, hub_name: &str) -> String {
        if self.kind == HardwareKind::Ipx {
            return hub_name.to_owned();
        }
        self.extension_name.clone().unwrap_or_else(|| {
            format!("{} N°{}", self.kind.to_string().to_uppercase(), self.ordinal)
        })
    }

    /// Stable entity id: domain, hub MAC, position, platform and name slug.
    pub fn unique_id(&self, mac: &str) -> String {
        [
            DOMAIN.to_owned(),
            mac.to_owned(),
            self.kind.to_string(),
            self.ordinal.to_string(),
            self.platform.to_string(),
            slugify(&self.name),
        ]
        .join("_")
    }
}

// ── Identity ────────────────────────────────────────────────────────

/// Platform equivalence class for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformBucket {
    /// `light` or `switch` on relay hardware (hub relays, X-8R).
    Switching,
    Platform(Platform),
}

/// What makes two descriptors "the same physical channel".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub kind: HardwareKind,
    pub ordinal: u32,
    pub bucket: PlatformBucket,
    pub channel: ChannelRef,
    pub subtype: Option<Subtype>,
}

// ── RawDescriptor ───────────────────────────────────────────────────

/// A declared descriptor exactly as authored. Every field is optional so
/// that one bad entry can be reported and skipped instead of failing the
/// whole configuration.
///
/// The short key names used by older configurations (`component`,
/// `ext_type`, `ext_number`, `io_number`, ...) are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "component", skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, alias = "ext_type", skip_serializing_if = "Option::is_none")]
    pub extension_type: Option<String>,
    #[serde(default, alias = "ext_number", skip_serializing_if = "Option::is_none")]
    pub extension_ordinal: Option<u32>,
    #[serde(default, alias = "ext_name", skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    #[serde(default, alias = "io_number", skip_serializing_if = "Option::is_none")]
    pub channel_number: Option<u32>,
    #[serde(default, alias = "io_numbers", skip_serializing_if = "Option::is_none")]
    pub channel_numbers: Option<Vec<u32>>,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub raw_channel_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, alias = "unit_of_measurement", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_brightness: Option<u8>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn relay_light_and_switch_share_a_bucket() {
        let switch = DeviceDescriptor::new("r3", Platform::Switch, HardwareKind::Ipx, 0)
            .with_channel(ChannelRef::Number(3));
        let mut light = switch.clone();
        light.platform = Platform::Light;
        assert_eq!(switch.identity(), light.identity());
    }

    #[test]
    fn dimmer_light_is_not_aliased() {
        let light = DeviceDescriptor::new("d1", Platform::Light, HardwareKind::XDimmer, 0);
        assert_eq!(light.bucket(), PlatformBucket::Platform(Platform::Light));
    }

    #[test]
    fn device_name_falls_back_to_type_and_ordinal() {
        let d = DeviceDescriptor::new("VR 1", Platform::Cover, HardwareKind::X4vr, 2);
        assert_eq!(d.device_name("Maison"), "X4VR N°2");
        assert_eq!(d.with_extension_name("Volets").device_name("Maison"), "Volets");

        let hub = DeviceDescriptor::new("Reboot", Platform::Button, HardwareKind::Ipx, 0);
        assert_eq!(hub.device_name("Maison"), "Maison");
    }

    #[test]
    fn unique_id_is_positional() {
        let d = DeviceDescriptor::new("Cave Relais 2", Platform::Switch, HardwareKind::X8r, 1)
            .with_channel(ChannelRef::Number(2));
        assert_eq!(
            d.unique_id("00:04:a3:aa:bb:cc"),
            "ipx800v5_00:04:a3:aa:bb:cc_x8r_1_switch_cave_relais_2"
        );
    }

    #[test]
    fn raw_descriptor_accepts_short_keys() {
        let raw: RawDescriptor = serde_json::from_value(serde_json::json!({
            "name": "Salon",
            "component": "light",
            "ext_type": "ipx",
            "io_number": 3
        }))
        .unwrap();
        assert_eq!(raw.platform.as_deref(), Some("light"));
        assert_eq!(raw.extension_type.as_deref(), Some("ipx"));
        assert_eq!(raw.channel_number, Some(3));
    }

    #[test]
    fn channel_display() {
        assert_eq!(ChannelRef::Numbers(vec![1, 2, 3]).to_string(), "1,2,3");
        assert_eq!(ChannelRef::Raw(65).to_string(), "#65");
        assert_eq!(ChannelRef::Instance.to_string(), "-");
    }
}
