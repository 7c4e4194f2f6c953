// ── Closed type catalog ──
//
// Every tag the hub or a declaration can carry, as sum types. Parsing an
// unknown tag fails; callers decide whether that is fatal.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ── Platform ────────────────────────────────────────────────────────

/// Target entity platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Switch,
    Light,
    BinarySensor,
    Sensor,
    Cover,
    Climate,
    Number,
    Select,
    Button,
}

impl Platform {
    /// `light` and `switch` drive the same relay hardware.
    pub fn is_switching(self) -> bool {
        matches!(self, Self::Light | Self::Switch)
    }
}

// ── HardwareKind ────────────────────────────────────────────────────

/// Where a kind lives on the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// The hub's own I/O block.
    Hub,
    /// A physically attached expansion module.
    Extension,
    /// A firmware-hosted logical object.
    Object,
}

/// Extension or object type code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum HardwareKind {
    #[serde(rename = "ipx")]
    #[strum(serialize = "ipx")]
    Ipx,
    #[serde(rename = "x8r")]
    #[strum(serialize = "x8r")]
    X8r,
    #[serde(rename = "xdimmer")]
    #[strum(serialize = "xdimmer")]
    XDimmer,
    #[serde(rename = "xpwm")]
    #[strum(serialize = "xpwm")]
    XPwm,
    #[serde(rename = "x24d")]
    #[strum(serialize = "x24d")]
    X24d,
    #[serde(rename = "x8d")]
    #[strum(serialize = "x8d")]
    X8d,
    #[serde(rename = "x4fp")]
    #[strum(serialize = "x4fp")]
    X4fp,
    #[serde(rename = "x4vr")]
    #[strum(serialize = "x4vr")]
    X4vr,
    #[serde(rename = "xthl")]
    #[strum(serialize = "xthl")]
    XThl,
    #[serde(rename = "xdisplay")]
    #[strum(serialize = "xdisplay")]
    XDisplay,
    #[serde(rename = "x010v")]
    #[strum(serialize = "x010v")]
    X010v,
    #[serde(rename = "thermostat")]
    #[strum(serialize = "thermostat")]
    Thermostat,
    #[serde(rename = "counter")]
    #[strum(serialize = "counter")]
    Counter,
    #[serde(rename = "tempo")]
    #[strum(serialize = "tempo")]
    Tempo,
    #[serde(rename = "access_control")]
    #[strum(serialize = "access_control")]
    AccessControl,
}

impl HardwareKind {
    pub fn family(self) -> Family {
        match self {
            Self::Ipx => Family::Hub,
            Self::Thermostat | Self::Counter | Self::Tempo | Self::AccessControl => Family::Object,
            _ => Family::Extension,
        }
    }

    /// Kinds that occur once per ordinal and have no channel axis.
    pub fn is_single_instance(self) -> bool {
        matches!(
            self,
            Self::XThl | Self::Thermostat | Self::Counter | Self::Tempo | Self::AccessControl
        )
    }

    /// Kinds whose relay channels may be declared as either `light` or `switch`.
    pub fn aliases_light_and_switch(self) -> bool {
        matches!(self, Self::Ipx | Self::X8r)
    }

    /// Addressable channels on one instance. `0` for kinds without a channel axis.
    pub fn channel_count(self) -> u32 {
        match self {
            Self::X8r | Self::X8d => 8,
            Self::XDimmer | Self::X4fp | Self::X4vr | Self::X010v => 4,
            Self::XPwm => 12,
            Self::X24d => 24,
            _ => 0,
        }
    }

    /// Hardware model label, e.g. `X-8R`; hub and objects report the hub model.
    pub fn model(self) -> String {
        if self.family() == Family::Extension {
            let tag: &'static str = self.into();
            let (head, tail) = tag.split_at(1);
            format!("{head}-{tail}").to_uppercase()
        } else {
            "IPX800 V5".into()
        }
    }
}

// ── Subtype ─────────────────────────────────────────────────────────

/// Disambiguates flavors sharing one (kind, platform) pair.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum Subtype {
    #[serde(rename = "opto")]
    #[strum(serialize = "opto")]
    Opto,
    #[serde(rename = "opencoll")]
    #[strum(serialize = "opencoll")]
    OpenCollector,
    /// Bound straight to a hub digital channel id.
    #[serde(rename = "io")]
    #[strum(serialize = "io")]
    Io,
    /// Bound straight to a hub analog channel id.
    #[serde(rename = "ana")]
    #[strum(serialize = "ana")]
    Analog,
    #[serde(rename = "xpwm_rgb")]
    #[strum(serialize = "xpwm_rgb")]
    Rgb,
    #[serde(rename = "xpwm_rgbw")]
    #[strum(serialize = "xpwm_rgbw")]
    Rgbw,
}

impl Subtype {
    /// Composite colour groups spanning several PWM channels.
    pub fn is_color_group(self) -> bool {
        matches!(self, Self::Rgb | Self::Rgbw)
    }
}

// ── EntityCategory ──────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}
