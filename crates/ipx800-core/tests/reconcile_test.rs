#![allow(clippy::unwrap_used)]

// Reconciliation scenarios and properties over realistic hub topologies.

use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, Mutex};

use ipx800_api::{ModuleRecord, TopologyRecords};
use ipx800_core::discovery::{self, DiscoveryFilter};
use ipx800_core::reconcile::reconcile;
use ipx800_core::{
    ChannelRef, DeviceDescriptor, HardwareKind, IdentityKey, Platform, PlatformRouter,
    RawDescriptor, Topology,
};
use pretty_assertions::assert_eq;
use tracing_subscriber::fmt::MakeWriter;

// ── Helpers ─────────────────────────────────────────────────────────

fn topology(extensions: &[(&str, &str)], objects: &[(&str, &str)]) -> Topology {
    let records = TopologyRecords {
        extensions: extensions
            .iter()
            .map(|(t, n)| ModuleRecord::new(*t, *n))
            .collect(),
        objects: objects.iter().map(|(t, n)| ModuleRecord::new(*t, *n)).collect(),
        ..TopologyRecords::default()
    };
    Topology::from_records(records).unwrap()
}

fn hub_only() -> Topology {
    topology(&[], &[])
}

fn full_house() -> Topology {
    topology(
        &[
            ("x8r", "Cave"),
            ("xdimmer", "Salon"),
            ("x4vr", "Volets"),
            ("x8r", "Garage"),
            ("xthl", "Météo"),
            ("xdisplay", "Entrée"),
        ],
        &[
            ("tempo", "Arrosage"),
            ("thermostat", "Chauffage"),
            ("counter", "Compteur"),
            ("access_control", "Portail"),
        ],
    )
}

fn declare(name: &str, platform: &str, kind: &str) -> RawDescriptor {
    RawDescriptor {
        name: Some(name.into()),
        platform: Some(platform.into()),
        extension_type: Some(kind.into()),
        ..RawDescriptor::default()
    }
}

fn relay(name: &str, platform: &str, kind: &str, ordinal: u32, n: u32) -> RawDescriptor {
    RawDescriptor {
        extension_ordinal: Some(ordinal),
        channel_number: Some(n),
        ..declare(name, platform, kind)
    }
}

fn interactive() -> DiscoveryFilter {
    DiscoveryFilter::interactive()
}

fn plain_relays(router: &PlatformRouter, platform: Platform) -> Vec<&DeviceDescriptor> {
    router
        .devices_for(platform)
        .iter()
        .filter(|d| d.kind == HardwareKind::Ipx && d.subtype.is_none())
        .collect()
}

fn identities(devices: &[DeviceDescriptor]) -> BTreeSet<IdentityKey> {
    devices.iter().map(DeviceDescriptor::identity).collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn scenario_a_hub_relays_without_declarations() {
    let list = reconcile(&hub_only(), &interactive(), &[]);
    let router = PlatformRouter::new(list.devices);

    let relays = plain_relays(&router, Platform::Switch);
    assert_eq!(relays.len(), 8);
    assert!(relays.iter().all(|d| d.ordinal == 0));
    let channels: Vec<ChannelRef> = relays.iter().map(|d| d.channel.clone()).collect();
    let expected: Vec<ChannelRef> = (1..=8).map(ChannelRef::Number).collect();
    assert_eq!(channels, expected);
}

#[test]
fn scenario_b_relay_redeclared_as_light() {
    let declared = vec![relay("Lustre", "light", "ipx", 0, 3)];
    let list = reconcile(&hub_only(), &interactive(), &declared);
    let router = PlatformRouter::new(list.devices);

    let lights = router.devices_for(Platform::Light);
    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0].name, "Lustre");
    assert_eq!(lights[0].channel, ChannelRef::Number(3));

    let channels: Vec<ChannelRef> = plain_relays(&router, Platform::Switch)
        .iter()
        .map(|d| d.channel.clone())
        .collect();
    let expected: Vec<ChannelRef> = [1, 2, 4, 5, 6, 7, 8].into_iter().map(ChannelRef::Number).collect();
    assert_eq!(channels, expected);
}

#[test]
fn scenario_c_tempo_expands_to_three() {
    let topo = topology(&[], &[("tempo", "Arrosage")]);
    let list = reconcile(&topo, &interactive(), &[]);

    let tempo: Vec<&DeviceDescriptor> = list
        .devices
        .iter()
        .filter(|d| d.kind == HardwareKind::Tempo && d.ordinal == 0)
        .collect();
    let platforms: Vec<Platform> = tempo.iter().map(|d| d.platform).collect();
    assert_eq!(
        platforms,
        vec![Platform::BinarySensor, Platform::Number, Platform::Switch]
    );
    assert!(
        tempo
            .iter()
            .all(|d| d.extension_name.as_deref() == Some("Arrosage"))
    );
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn scenario_d_declaration_without_platform_is_skipped_and_logged_once() {
    let mut broken = relay("Pompe piscine", "switch", "ipx", 0, 5);
    broken.platform = None;
    let declared = vec![relay("Lustre", "light", "ipx", 0, 3), broken];

    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .finish();
    let list = tracing::subscriber::with_default(subscriber, || {
        reconcile(&hub_only(), &interactive(), &declared)
    });

    assert!(list.devices.iter().all(|d| d.name != "Pompe piscine"));
    assert_eq!(list.rejected.len(), 1);
    assert_eq!(list.rejected[0].name, "Pompe piscine");
    // Relay 5 is still there, as discovered.
    assert!(list.devices.iter().any(|d| d.name == "IPX800 V5 Relais 5"));

    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let lines: Vec<&str> = logs.lines().collect();
    assert_eq!(lines.len(), 1, "{logs}");
    assert!(lines[0].contains("Pompe piscine"));
}

// ── Properties ──────────────────────────────────────────────────────

#[test]
fn discovery_is_idempotent() {
    let topo = full_house();
    let filter = interactive();
    assert_eq!(
        discovery::descriptors(&topo, &filter),
        discovery::descriptors(&topo, &filter)
    );

    let declared = vec![relay("Lustre", "light", "ipx", 0, 3)];
    assert_eq!(
        reconcile(&topo, &filter, &declared),
        reconcile(&topo, &filter, &declared)
    );
}

#[test]
fn reordering_declarations_keeps_the_same_identities() {
    let topo = full_house();
    let declared = vec![
        relay("Lampe cave", "light", "x8r", 0, 2),
        relay("Spots", "light", "xdimmer", 0, 1),
        declare("Arrosage jardin", "binary_sensor", "tempo"),
        relay("Portail", "switch", "ipx", 0, 8),
    ];
    let mut reversed = declared.clone();
    reversed.reverse();

    let a = reconcile(&topo, &interactive(), &declared);
    let b = reconcile(&topo, &interactive(), &reversed);
    assert_eq!(identities(&a.devices), identities(&b.devices));
    assert_eq!(a.devices.len(), b.devices.len());
}

#[test]
fn colliding_declarations_first_in_order_wins() {
    let topo = topology(&[("x8r", "Cave")], &[]);
    let declared = vec![
        relay("Lampe", "light", "x8r", 0, 3),
        relay("Prise", "switch", "x8r", 0, 3),
    ];

    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let list = tracing::subscriber::with_default(subscriber, || {
        reconcile(&topo, &interactive(), &declared)
    });

    assert_eq!(list.devices[0].extension_name.as_deref(), Some("Cave"));
    assert_eq!(list.devices[1].extension_name, None);
    // The companion follows the winning declaration.
    let companion = list
        .devices
        .iter()
        .find(|d| {
            d.kind == HardwareKind::X8r
                && d.platform == Platform::BinarySensor
                && d.channel == ChannelRef::Number(3)
        })
        .unwrap();
    assert_eq!(companion.name, "Lampe");

    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let warnings: Vec<&str> = logs.lines().filter(|l| l.contains("WARN")).collect();
    assert_eq!(warnings.len(), 1, "{logs}");
    assert!(warnings[0].contains("Lampe"));
    assert!(warnings[0].contains("Prise"));

    // Both declarations stay in the list; only the first is merged.
    let mut reversed = declared;
    reversed.reverse();
    let list = reconcile(&topo, &interactive(), &reversed);
    assert_eq!(list.devices[0].name, "Prise");
    assert_eq!(list.devices[0].extension_name.as_deref(), Some("Cave"));
    assert_eq!(list.devices[1].name, "Lampe");
    assert_eq!(list.devices[1].extension_name, None);
}

#[test]
fn every_physical_channel_appears_exactly_once() {
    let topo = full_house();
    let declared = vec![
        relay("Lampe cave", "light", "x8r", 0, 2),
        relay("Garage 1", "switch", "x8r", 1, 1),
        relay("Spots", "light", "xdimmer", 0, 4),
        relay("Lustre", "light", "ipx", 0, 3),
        declare("Chaudière", "climate", "thermostat"),
    ];
    let list = reconcile(&topo, &interactive(), &declared);

    let keys: Vec<IdentityKey> = list.devices.iter().map(DeviceDescriptor::identity).collect();
    let unique: BTreeSet<IdentityKey> = keys.iter().cloned().collect();
    assert_eq!(keys.len(), unique.len(), "duplicate identity in final list");

    for candidate in discovery::descriptors(&topo, &interactive()) {
        assert!(
            unique.contains(&candidate.identity()),
            "{} missing from final list",
            candidate.name
        );
    }
}

#[test]
fn declared_override_keeps_icon_and_gains_extension_name() {
    let topo = topology(&[("x8r", "Cave")], &[]);
    let mut entry = relay("Lampe", "light", "x8r", 0, 2);
    entry.icon = Some("mdi:ceiling-light".into());

    let list = reconcile(&topo, &interactive(), &[entry]);
    let lamp = &list.devices[0];
    assert_eq!(lamp.name, "Lampe");
    assert_eq!(lamp.overrides.icon.as_deref(), Some("mdi:ceiling-light"));
    assert_eq!(lamp.extension_name.as_deref(), Some("Cave"));
}

#[test]
fn renamed_object_renames_its_companions() {
    let topo = topology(&[], &[("tempo", "Tempo 1")]);
    let declared = vec![declare("Arrosage", "binary_sensor", "tempo")];
    let list = reconcile(&topo, &interactive(), &declared);

    let tempo: Vec<&DeviceDescriptor> = list
        .devices
        .iter()
        .filter(|d| d.kind == HardwareKind::Tempo)
        .collect();
    assert_eq!(tempo.len(), 3);
    assert!(tempo.iter().all(|d| d.name == "Arrosage"));
    assert!(
        tempo
            .iter()
            .all(|d| d.extension_name.as_deref() == Some("Arrosage"))
    );
}

#[test]
fn imported_setup_only_discovers_opted_in_kinds() {
    let topo = full_house();
    let filter = DiscoveryFilter {
        auto_types: [HardwareKind::X4vr].into_iter().collect(),
        ..DiscoveryFilter::default()
    };
    let declared = vec![relay("Lustre", "light", "ipx", 0, 3)];
    let list = reconcile(&topo, &filter, &declared);

    let kinds: BTreeSet<HardwareKind> = list.devices.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, [HardwareKind::Ipx, HardwareKind::X4vr].into_iter().collect());
    // Declared hub relay plus the system reboot button, no hub I/O block.
    assert_eq!(
        list.devices
            .iter()
            .filter(|d| d.kind == HardwareKind::Ipx)
            .count(),
        2
    );
}
