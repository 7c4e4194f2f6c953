// ── Reconciliation ──
//
// Merges declared descriptors with auto-discovered candidates into the
// final device list:
//
// 1. `validate_declared` turns raw declarations into descriptors, skipping
//    (and logging) the ones that cannot be used.
// 2. Each candidate primary is looked up in the declared list with
//    `find_match`; a hit yields a merged descriptor, and companions are
//    derived from whichever primary won.
// 3. Discovered descriptors that a declaration already covers are dropped.
//
// Matching only ever reads the declared list, never the output being built.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::discovery::{self, DiscoveryFilter};
use crate::model::{
    ChannelRef, DeviceDescriptor, EntityCategory, Family, HardwareKind, Overrides, Platform,
    RawDescriptor, Subtype, Topology,
};

// ── Declared validation ─────────────────────────────────────────────

/// Why a declared descriptor was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("unknown {field} `{value}`")]
    UnknownTag { field: &'static str, value: String },

    #[error("{kind} devices must set `extension_ordinal`")]
    MissingOrdinal { kind: HardwareKind },

    #[error("RGB/RGBW lights and relay climates must set `channel_numbers`")]
    MissingChannelNumbers,

    #[error("only one of `channel_number`, `channel_numbers`, `raw_channel_id` may be set")]
    ConflictingChannels,
}

/// A declaration that did not make it into the device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedDescriptor {
    /// Declared name, or `#<index>` when the name itself is missing.
    pub name: String,
    pub reason: RejectReason,
}

/// Outcome of [`validate_declared`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredReport {
    pub accepted: Vec<DeviceDescriptor>,
    pub rejected: Vec<RejectedDescriptor>,
}

/// Validate raw declarations, in order.
///
/// Every rejection logs exactly one error naming the descriptor.
pub fn validate_declared(raw: &[RawDescriptor]) -> DeclaredReport {
    let mut report = DeclaredReport::default();

    for (index, entry) in raw.iter().enumerate() {
        let label = entry.name.clone().unwrap_or_else(|| format!("#{index}"));
        match validate_one(entry) {
            Ok(descriptor) => {
                info!(name = %descriptor.name, platform = %descriptor.platform, "declared device added");
                report.accepted.push(descriptor);
            }
            Err(reason) => {
                error!(name = %label, reason = %reason, "declared device skipped");
                report.rejected.push(RejectedDescriptor { name: label, reason });
            }
        }
    }

    report
}

fn validate_one(raw: &RawDescriptor) -> Result<DeviceDescriptor, RejectReason> {
    let name = raw
        .name
        .clone()
        .ok_or(RejectReason::MissingField { field: "name" })?;
    let platform: Platform = parse_required(raw.platform.as_deref(), "platform")?;
    let kind: HardwareKind = parse_required(raw.extension_type.as_deref(), "extension_type")?;
    let subtype: Option<Subtype> = parse_optional(raw.subtype.as_deref(), "subtype")?;
    let entity_category: Option<EntityCategory> =
        parse_optional(raw.entity_category.as_deref(), "entity_category")?;

    let ordinal = match (raw.extension_ordinal, kind.family()) {
        (Some(n), _) => n,
        (None, Family::Extension) => return Err(RejectReason::MissingOrdinal { kind }),
        (None, Family::Hub | Family::Object) => 0,
    };

    let channel = match (
        raw.channel_number,
        raw.channel_numbers.clone(),
        raw.raw_channel_id,
    ) {
        (None, None, None) => ChannelRef::Instance,
        (Some(n), None, None) => ChannelRef::Number(n),
        (None, Some(v), None) => ChannelRef::Numbers(v),
        (None, None, Some(id)) => ChannelRef::Raw(id),
        _ => return Err(RejectReason::ConflictingChannels),
    };

    let needs_group = subtype.is_some_and(Subtype::is_color_group)
        || (kind.aliases_light_and_switch() && platform == Platform::Climate);
    if needs_group && !matches!(channel, ChannelRef::Numbers(_)) {
        return Err(RejectReason::MissingChannelNumbers);
    }

    Ok(DeviceDescriptor {
        name,
        platform,
        kind,
        ordinal,
        extension_name: raw.extension_name.clone(),
        channel,
        subtype,
        overrides: Overrides {
            icon: raw.icon.clone(),
            unit: raw.unit.clone(),
            device_class: raw.device_class.clone(),
            entity_category,
            transition: raw.transition,
            default_brightness: raw.default_brightness,
        },
    })
}

fn parse_required<T: std::str::FromStr>(
    value: Option<&str>,
    field: &'static str,
) -> Result<T, RejectReason> {
    let value = value.ok_or(RejectReason::MissingField { field })?;
    value.parse().map_err(|_| RejectReason::UnknownTag {
        field,
        value: value.to_owned(),
    })
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<T>, RejectReason> {
    value.map(|v| parse_required(Some(v), field)).transpose()
}

// ── Matching ────────────────────────────────────────────────────────

/// Index of the declared descriptor describing the same physical channel
/// as `candidate`, if any.
///
/// Declared entries are narrowed on kind, ordinal, platform bucket and
/// subtype. A single-instance kind with exactly one survivor matches
/// outright; otherwise the channel must be equal. Ties go to the first
/// declaration and are logged.
pub fn find_match(declared: &[DeviceDescriptor], candidate: &DeviceDescriptor) -> Option<usize> {
    let hits = matching(declared, candidate);
    let (first, chosen) = *hits.first()?;
    let shadowed: Vec<&str> = hits.iter().skip(1).map(|(_, d)| d.name.as_str()).collect();
    if !shadowed.is_empty() {
        warn!(
            chosen = %chosen.name,
            shadowed = ?shadowed,
            candidate = %candidate.name,
            "several declared devices describe the same channel, keeping the first"
        );
    }
    Some(first)
}

/// Every declared entry describing `candidate`'s channel, in declaration order.
fn matching<'a>(
    declared: &'a [DeviceDescriptor],
    candidate: &DeviceDescriptor,
) -> Vec<(usize, &'a DeviceDescriptor)> {
    let bucket = candidate.bucket();
    let narrowed: Vec<(usize, &DeviceDescriptor)> = declared
        .iter()
        .enumerate()
        .filter(|(_, d)| {
            d.kind == candidate.kind
                && d.ordinal == candidate.ordinal
                && d.bucket() == bucket
                && d.subtype == candidate.subtype
        })
        .collect();

    if candidate.kind.is_single_instance() && narrowed.len() == 1 {
        return narrowed;
    }

    narrowed
        .into_iter()
        .filter(|(_, d)| d.channel == candidate.channel)
        .collect()
}

/// Declared fields win; `extension_name` is filled in only when absent.
///
/// Objects name their own device group, so a declared object without an
/// extension name takes its own name.
pub fn merge(declared: &DeviceDescriptor, candidate: &DeviceDescriptor) -> DeviceDescriptor {
    let mut merged = declared.clone();
    if merged.extension_name.is_none() {
        merged.extension_name = if declared.kind.family() == Family::Object {
            Some(declared.name.clone())
        } else {
            candidate
                .extension_name
                .clone()
                .or_else(|| Some(declared.name.clone()))
        };
    }
    merged
}

/// Result of resolving one candidate against the declared list.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A declaration covers the candidate.
    Declared {
        index: usize,
        merged: DeviceDescriptor,
    },
    /// Nothing declared; the candidate stands as discovered.
    Discovered(DeviceDescriptor),
}

pub fn resolve(declared: &[DeviceDescriptor], candidate: &DeviceDescriptor) -> Resolution {
    match find_match(declared, candidate).and_then(|i| declared.get(i).map(|d| (i, d))) {
        Some((index, d)) => {
            debug!(name = %d.name, "found declared config for discovered device");
            Resolution::Declared {
                index,
                merged: merge(d, candidate),
            }
        }
        None => Resolution::Discovered(candidate.clone()),
    }
}

// ── Final list ──────────────────────────────────────────────────────

/// Final device list for one setup pass, plus what was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceList {
    /// Declared devices first, in declaration order, then discovered ones.
    pub devices: Vec<DeviceDescriptor>,
    pub rejected: Vec<RejectedDescriptor>,
}

/// Build the final device list from a topology and raw declarations.
pub fn reconcile(
    topology: &Topology,
    filter: &DiscoveryFilter,
    declared: &[RawDescriptor],
) -> DeviceList {
    let DeclaredReport { accepted, rejected } = validate_declared(declared);
    let mut merged: Vec<Option<DeviceDescriptor>> = vec![None; accepted.len()];
    let mut discovered = Vec::new();

    for group in discovery::discover(topology, filter) {
        let primary = match resolve(&accepted, &group.primary) {
            Resolution::Declared { index, merged: m } => {
                if let Some(slot) = merged.get_mut(index) {
                    slot.get_or_insert_with(|| m.clone());
                }
                m
            }
            Resolution::Discovered(d) => d,
        };
        let companions: Vec<DeviceDescriptor> =
            group.companions.iter().map(|c| c.derive(&primary)).collect();
        discovered.push(primary);
        discovered.extend(companions);
    }

    let before = discovered.len();
    discovered.retain(|d| {
        let covered = !matching(&accepted, d).is_empty();
        if covered {
            debug!(name = %d.name, platform = %d.platform, "dropping discovered device covered by a declaration");
        }
        !covered
    });
    let kept = discovered.len();

    let mut devices: Vec<DeviceDescriptor> = accepted
        .into_iter()
        .zip(merged)
        .map(|(declared, merged)| merged.unwrap_or(declared))
        .collect();
    info!(
        declared = devices.len(),
        discovered = kept,
        deduplicated = before - kept,
        rejected = rejected.len(),
        "device list built"
    );
    devices.extend(discovered);

    DeviceList { devices, rejected }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(name: &str, platform: &str, kind: &str) -> RawDescriptor {
        RawDescriptor {
            name: Some(name.into()),
            platform: Some(platform.into()),
            extension_type: Some(kind.into()),
            ..RawDescriptor::default()
        }
    }

    #[test]
    fn extension_without_ordinal_is_rejected() {
        let report = validate_declared(&[raw("Cave 1", "switch", "x8r")]);
        assert!(report.accepted.is_empty());
        assert_eq!(
            report.rejected[0].reason,
            RejectReason::MissingOrdinal { kind: HardwareKind::X8r }
        );
    }

    #[test]
    fn objects_default_to_ordinal_zero() {
        let report = validate_declared(&[raw("Arrosage", "binary_sensor", "tempo")]);
        assert_eq!(report.accepted[0].ordinal, 0);
    }

    #[test]
    fn rgb_requires_channel_group() {
        let mut entry = raw("Ruban", "light", "xpwm");
        entry.extension_ordinal = Some(0);
        entry.subtype = Some("xpwm_rgb".into());
        entry.channel_number = Some(1);
        let report = validate_declared(&[entry.clone()]);
        assert_eq!(report.rejected[0].reason, RejectReason::MissingChannelNumbers);

        entry.channel_number = None;
        entry.channel_numbers = Some(vec![1, 2, 3]);
        let report = validate_declared(&[entry]);
        assert_eq!(report.accepted[0].channel, ChannelRef::Numbers(vec![1, 2, 3]));
    }

    #[test]
    fn relay_climate_requires_channel_group() {
        let mut entry = raw("Chauffage", "climate", "ipx");
        entry.channel_number = Some(1);
        let report = validate_declared(&[entry]);
        assert_eq!(report.rejected[0].reason, RejectReason::MissingChannelNumbers);
    }

    #[test]
    fn two_channel_fields_conflict() {
        let mut entry = raw("Double", "switch", "ipx");
        entry.channel_number = Some(1);
        entry.raw_channel_id = Some(42);
        let report = validate_declared(&[entry]);
        assert_eq!(report.rejected[0].reason, RejectReason::ConflictingChannels);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let report = validate_declared(&[raw("Fan", "fan", "ipx"), raw("X", "switch", "x16r")]);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(
            report.rejected[0].reason,
            RejectReason::UnknownTag {
                field: "platform",
                value: "fan".into()
            }
        );
    }

    #[test]
    fn unnamed_entries_are_labelled_by_position() {
        let mut entry = raw("", "switch", "ipx");
        entry.name = None;
        let report = validate_declared(&[raw("ok", "switch", "ipx"), entry]);
        assert_eq!(report.rejected[0].name, "#1");
    }

    #[test]
    fn single_instance_matches_without_channel() {
        let declared = vec![
            DeviceDescriptor::new("Chaudière", Platform::Climate, HardwareKind::Thermostat, 0)
                .with_channel(ChannelRef::Number(9)),
        ];
        let candidate =
            DeviceDescriptor::new("Thermostat 1", Platform::Climate, HardwareKind::Thermostat, 0);
        assert_eq!(find_match(&declared, &candidate), Some(0));
    }

    #[test]
    fn subtype_must_agree() {
        let declared = vec![
            DeviceDescriptor::new("Opto", Platform::BinarySensor, HardwareKind::Ipx, 0)
                .with_channel(ChannelRef::Number(1))
                .with_subtype(Subtype::Opto),
        ];
        let digital = DeviceDescriptor::new("DI 1", Platform::BinarySensor, HardwareKind::Ipx, 0)
            .with_channel(ChannelRef::Number(1));
        assert_eq!(find_match(&declared, &digital), None);
    }

    #[test]
    fn merge_keeps_declared_fields_and_backfills_extension_name() {
        let mut declared = DeviceDescriptor::new("Lampe", Platform::Light, HardwareKind::X8r, 0)
            .with_channel(ChannelRef::Number(2));
        declared.overrides.icon = Some("mdi:lamp".into());
        let candidate = DeviceDescriptor::new("Cave Relais 2", Platform::Switch, HardwareKind::X8r, 0)
            .with_channel(ChannelRef::Number(2))
            .with_extension_name("Cave");

        let merged = merge(&declared, &candidate);
        assert_eq!(merged.name, "Lampe");
        assert_eq!(merged.platform, Platform::Light);
        assert_eq!(merged.overrides.icon.as_deref(), Some("mdi:lamp"));
        assert_eq!(merged.extension_name.as_deref(), Some("Cave"));
        assert_eq!(declared.extension_name, None);
    }

    #[test]
    fn declared_objects_name_their_group() {
        let declared = DeviceDescriptor::new("Arrosage", Platform::BinarySensor, HardwareKind::Tempo, 0);
        let candidate = declared.clone().with_extension_name("Tempo 1");
        assert_eq!(merge(&declared, &candidate).extension_name.as_deref(), Some("Arrosage"));
    }
}
