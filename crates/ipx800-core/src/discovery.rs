// ── Auto-discovery ──
//
// Turns a parsed topology into the candidate descriptors the hardware
// supports. Pure: the same topology and filter always yield the same
// ordered output.
//
// Each kind maps to one expansion function through `expander`. Adding a
// hardware kind means one table entry and one function.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::SetupSource;
use crate::model::{
    ChannelRef, DeviceDescriptor, EntityCategory, HardwareKind, ModuleInstance, Platform, Subtype,
    Topology,
};

// ── Hub constants ───────────────────────────────────────────────────

pub const HUB_PREFIX: &str = "IPX800 V5";
pub const HUB_RELAYS: u32 = 8;
pub const HUB_OPEN_COLLECTORS: u32 = 4;
pub const HUB_DIGITAL_INPUTS: u32 = 8;
pub const HUB_ANALOG_INPUTS: u32 = 4;
pub const HUB_OPTO_INPUTS: u32 = 4;

/// System channel key of the mains power sensor.
pub const AC_POWER_KEY: &str = "ioACPower_id";

const DIAG_KEYS: [&str; 3] = ["anaHeapFree", "anaDeltaHeapFree", "anaMonitorConnections"];

// ── Filter ──────────────────────────────────────────────────────────

/// Which kinds get auto-discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryFilter {
    pub source: SetupSource,
    /// Kinds opted into discovery for imported setups.
    pub auto_types: BTreeSet<HardwareKind>,
    /// Also generate hub diagnostic sensors.
    pub diag_sensors: bool,
}

impl DiscoveryFilter {
    /// Discover everything, as an interactive setup does.
    pub fn interactive() -> Self {
        Self {
            source: SetupSource::User,
            ..Self::default()
        }
    }

    pub fn allows(&self, kind: HardwareKind) -> bool {
        self.source == SetupSource::User || self.auto_types.contains(&kind)
    }
}

// ── Candidate groups ────────────────────────────────────────────────

/// A descriptor derived from a primary, sharing its position and names.
///
/// Companions are materialized only after the primary is reconciled, so a
/// renamed primary renames its companions too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Companion {
    pub platform: Platform,
    pub channel: Option<u32>,
}

impl Companion {
    const fn instance(platform: Platform) -> Self {
        Self {
            platform,
            channel: None,
        }
    }

    pub fn derive(&self, primary: &DeviceDescriptor) -> DeviceDescriptor {
        let mut d = DeviceDescriptor::new(primary.name.clone(), self.platform, primary.kind, primary.ordinal);
        d.extension_name = primary.extension_name.clone();
        d.channel = self.channel.map_or(ChannelRef::Instance, ChannelRef::Number);
        d
    }
}

/// One candidate descriptor plus its companions.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGroup {
    pub primary: DeviceDescriptor,
    pub companions: Vec<Companion>,
}

impl CandidateGroup {
    fn single(primary: DeviceDescriptor) -> Self {
        Self {
            primary,
            companions: Vec::new(),
        }
    }

    fn with(primary: DeviceDescriptor, companions: Vec<Companion>) -> Self {
        Self { primary, companions }
    }

    /// Primary followed by its companions, without reconciliation.
    pub fn expand(&self) -> Vec<DeviceDescriptor> {
        let mut out = Vec::with_capacity(1 + self.companions.len());
        out.push(self.primary.clone());
        out.extend(self.companions.iter().map(|c| c.derive(&self.primary)));
        out
    }
}

// ── Entry points ────────────────────────────────────────────────────

/// Generate every candidate group for a topology.
///
/// Order: hub I/O block, hub system descriptors, extensions, objects.
pub fn discover(topology: &Topology, filter: &DiscoveryFilter) -> Vec<CandidateGroup> {
    let mut groups = Vec::new();

    if filter.allows(HardwareKind::Ipx) {
        debug!("building candidates for the hub I/O block");
        groups.extend(hub_io().into_iter().map(CandidateGroup::single));
    }

    groups.extend(
        hub_system(topology, filter.diag_sensors)
            .into_iter()
            .map(CandidateGroup::single),
    );

    for module in topology.extensions.iter().chain(&topology.objects) {
        if !filter.allows(module.kind) {
            continue;
        }
        debug!(kind = %module.kind, ordinal = module.ordinal, name = %module.name, "building candidates");
        groups.extend(expander(module.kind)(module));
    }

    groups
}

/// Flattened [`discover`] output, companions derived from unreconciled primaries.
pub fn descriptors(topology: &Topology, filter: &DiscoveryFilter) -> Vec<DeviceDescriptor> {
    discover(topology, filter)
        .iter()
        .flat_map(CandidateGroup::expand)
        .collect()
}

// ── Hub ─────────────────────────────────────────────────────────────

fn hub_channel(label: &str, platform: Platform, n: u32) -> DeviceDescriptor {
    DeviceDescriptor::new(format!("{HUB_PREFIX} {label} {n}"), platform, HardwareKind::Ipx, 0)
        .with_channel(ChannelRef::Number(n))
}

fn hub_io() -> Vec<DeviceDescriptor> {
    let mut out = Vec::new();
    out.extend((1..=HUB_RELAYS).map(|n| hub_channel("Relais", Platform::Switch, n)));
    out.extend((1..=HUB_OPEN_COLLECTORS).map(|n| {
        hub_channel("Open Collector", Platform::Switch, n).with_subtype(Subtype::OpenCollector)
    }));
    out.extend(
        (1..=HUB_DIGITAL_INPUTS).map(|n| hub_channel("Digital Input", Platform::BinarySensor, n)),
    );
    out.extend((1..=HUB_ANALOG_INPUTS).map(|n| hub_channel("Analog Input", Platform::Sensor, n)));
    out.extend((1..=HUB_OPTO_INPUTS).map(|n| {
        hub_channel("Opto Input", Platform::BinarySensor, n).with_subtype(Subtype::Opto)
    }));
    out
}

/// Reboot button, optional diagnostic sensors and the AC power sensor.
/// Generated whatever the filter says about the hub I/O block.
fn hub_system(topology: &Topology, diag_sensors: bool) -> Vec<DeviceDescriptor> {
    let mut out = vec![
        DeviceDescriptor::new(format!("{HUB_PREFIX} Reboot"), Platform::Button, HardwareKind::Ipx, 0)
            .with_category(EntityCategory::Diagnostic),
    ];

    if diag_sensors {
        for (key, id) in &topology.system {
            let key = key.strip_suffix("_id").unwrap_or(key);
            if !(key.starts_with("anaIPX") || DIAG_KEYS.contains(&key)) {
                continue;
            }
            let label = key.strip_prefix("ana").unwrap_or(key);
            out.push(
                DeviceDescriptor::new(format!("{HUB_PREFIX} {label}"), Platform::Sensor, HardwareKind::Ipx, 0)
                    .with_channel(ChannelRef::Raw(*id))
                    .with_subtype(Subtype::Analog)
                    .with_category(EntityCategory::Diagnostic),
            );
        }
    }

    if let Some(id) = topology.system.get(AC_POWER_KEY) {
        out.push(
            DeviceDescriptor::new(
                format!("{HUB_PREFIX} AC Power"),
                Platform::BinarySensor,
                HardwareKind::Ipx,
                0,
            )
            .with_channel(ChannelRef::Raw(*id))
            .with_subtype(Subtype::Io)
            .with_category(EntityCategory::Diagnostic),
        );
    }

    out
}

// ── Expansion table ─────────────────────────────────────────────────

type Expander = fn(&ModuleInstance) -> Vec<CandidateGroup>;

fn expander(kind: HardwareKind) -> Expander {
    match kind {
        HardwareKind::Ipx => |_| Vec::new(),
        HardwareKind::X8r => relay_bank,
        HardwareKind::XDimmer | HardwareKind::XPwm | HardwareKind::X010v => |m| per_channel(m, "Sortie", Platform::Light),
        HardwareKind::X24d | HardwareKind::X8d => |m| per_channel(m, "Digital Input", Platform::BinarySensor),
        HardwareKind::X4fp => |m| per_channel(m, "FP", Platform::Climate),
        HardwareKind::X4vr => |m| per_channel(m, "VR", Platform::Cover),
        HardwareKind::XThl => |m| vec![CandidateGroup::single(instance(m, Platform::Sensor))],
        HardwareKind::XDisplay => |m| {
            vec![CandidateGroup::with(
                instance(m, Platform::Select),
                vec![Companion::instance(Platform::Switch), Companion::instance(Platform::Sensor)],
            )]
        },
        HardwareKind::Thermostat => |m| {
            vec![CandidateGroup::with(
                instance(m, Platform::Climate),
                vec![Companion::instance(Platform::Number), Companion::instance(Platform::BinarySensor)],
            )]
        },
        HardwareKind::Counter => |m| vec![CandidateGroup::single(instance(m, Platform::Number))],
        HardwareKind::Tempo => |m| {
            vec![CandidateGroup::with(
                instance(m, Platform::BinarySensor),
                vec![Companion::instance(Platform::Number), Companion::instance(Platform::Switch)],
            )]
        },
        HardwareKind::AccessControl => |m| vec![CandidateGroup::single(instance(m, Platform::BinarySensor))],
    }
}

fn instance(m: &ModuleInstance, platform: Platform) -> DeviceDescriptor {
    DeviceDescriptor::new(m.name.clone(), platform, m.kind, m.ordinal).with_extension_name(m.name.clone())
}

fn channel(m: &ModuleInstance, label: &str, platform: Platform, n: u32) -> DeviceDescriptor {
    DeviceDescriptor::new(format!("{} {label} {n}", m.name), platform, m.kind, m.ordinal)
        .with_extension_name(m.name.clone())
        .with_channel(ChannelRef::Number(n))
}

fn per_channel(m: &ModuleInstance, label: &str, platform: Platform) -> Vec<CandidateGroup> {
    (1..=m.kind.channel_count())
        .map(|n| CandidateGroup::single(channel(m, label, platform, n)))
        .collect()
}

/// X-8R: each relay is a switch with a binary sensor reporting its state.
fn relay_bank(m: &ModuleInstance) -> Vec<CandidateGroup> {
    (1..=m.kind.channel_count())
        .map(|n| {
            CandidateGroup::with(
                channel(m, "Relais", Platform::Switch, n),
                vec![Companion {
                    platform: Platform::BinarySensor,
                    channel: Some(n),
                }],
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn module(kind: HardwareKind, ordinal: u32, name: &str) -> ModuleInstance {
        ModuleInstance {
            kind,
            ordinal,
            name: name.into(),
        }
    }

    #[test]
    fn hub_block_shape() {
        let io = hub_io();
        assert_eq!(io.len(), 28);
        assert_eq!(io[0].name, "IPX800 V5 Relais 1");
        assert_eq!(io[8].subtype, Some(Subtype::OpenCollector));
        assert_eq!(io[27].name, "IPX800 V5 Opto Input 4");
    }

    #[test]
    fn import_without_auto_types_only_builds_system() {
        let topo = Topology {
            extensions: vec![module(HardwareKind::X8r, 0, "Cave")],
            ..Topology::default()
        };
        let filter = DiscoveryFilter::default();
        let out = descriptors(&topo, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].platform, Platform::Button);
    }

    #[test]
    fn auto_types_opt_in_per_kind() {
        let topo = Topology {
            extensions: vec![module(HardwareKind::X8r, 0, "Cave"), module(HardwareKind::X4vr, 0, "Volets")],
            ..Topology::default()
        };
        let filter = DiscoveryFilter {
            auto_types: [HardwareKind::X4vr].into_iter().collect(),
            ..DiscoveryFilter::default()
        };
        let covers: Vec<_> = descriptors(&topo, &filter)
            .into_iter()
            .filter(|d| d.platform == Platform::Cover)
            .collect();
        assert_eq!(covers.len(), 4);
        assert_eq!(covers[3].name, "Volets VR 4");
        assert_eq!(covers[3].extension_name.as_deref(), Some("Volets"));
    }

    #[test]
    fn relay_bank_pairs_switch_and_binary_sensor() {
        let groups = relay_bank(&module(HardwareKind::X8r, 1, "Garage"));
        assert_eq!(groups.len(), 8);
        let pair = groups[2].expand();
        assert_eq!(pair[0].platform, Platform::Switch);
        assert_eq!(pair[1].platform, Platform::BinarySensor);
        assert_eq!(pair[1].channel, ChannelRef::Number(3));
        assert_eq!(pair[1].name, "Garage Relais 3");
        assert_eq!(pair[1].ordinal, 1);
    }

    #[test]
    fn diagnostic_sensors_follow_system_keys() {
        let system: BTreeMap<String, u32> = [
            ("anaIPXTemp_id", 70),
            ("anaHeapFree_id", 71),
            ("anaUptime_id", 72),
            ("ioACPower_id", 65),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
        let topo = Topology {
            system,
            ..Topology::default()
        };

        let without = hub_system(&topo, false);
        assert_eq!(without.len(), 2);
        assert_eq!(without[1].name, "IPX800 V5 AC Power");
        assert_eq!(without[1].channel, ChannelRef::Raw(65));

        let with: Vec<String> = hub_system(&topo, true).into_iter().map(|d| d.name).collect();
        assert_eq!(
            with,
            vec![
                "IPX800 V5 Reboot",
                "IPX800 V5 HeapFree",
                "IPX800 V5 IPXTemp",
                "IPX800 V5 AC Power",
            ]
        );
    }

    #[test]
    fn every_kind_has_an_expander() {
        use strum::IntoEnumIterator;
        for kind in HardwareKind::iter() {
            let groups = expander(kind)(&module(kind, 0, "M"));
            if kind == HardwareKind::Ipx {
                assert!(groups.is_empty());
            } else {
                assert!(!groups.is_empty(), "{kind} produced nothing");
            }
        }
    }
}
