// ── Typed topology ──
//
// The raw hub records, with type codes parsed into `HardwareKind` and
// ordinals assigned. Ordinals count per kind in enumeration order,
// starting at 0, so interleaving kinds never resets a counter.

use std::collections::BTreeMap;

use ipx800_api::{HubInfo, TopologyRecords};
use serde::Serialize;
use tracing::{debug, warn};

use super::kind::{Family, HardwareKind};
use crate::error::CoreError;

/// One extension or object instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInstance {
    pub kind: HardwareKind,
    pub ordinal: u32,
    /// Vendor display name.
    pub name: String,
}

/// Parsed hub shape, input of auto-discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub hub: HubInfo,
    /// System channel key -> state id.
    pub system: BTreeMap<String, u32>,
    pub extensions: Vec<ModuleInstance>,
    pub objects: Vec<ModuleInstance>,
}

impl Topology {
    /// Build from raw records.
    ///
    /// A record without a type code means the hub data is corrupt and
    /// fails the whole build. A type code we do not know, or a kind listed
    /// in the wrong section, is skipped with a warning.
    pub fn from_records(records: TopologyRecords) -> Result<Self, CoreError> {
        let extensions = number_section(&records.extensions, Family::Extension, "extension")?;
        let objects = number_section(&records.objects, Family::Object, "object")?;

        debug!(
            extensions = extensions.len(),
            objects = objects.len(),
            system_channels = records.system.len(),
            "topology parsed"
        );

        Ok(Self {
            hub: records.hub,
            system: records.system,
            extensions,
            objects,
        })
    }
}

fn number_section(
    records: &[ipx800_api::ModuleRecord],
    family: Family,
    section: &str,
) -> Result<Vec<ModuleInstance>, CoreError> {
    let mut counters: BTreeMap<HardwareKind, u32> = BTreeMap::new();
    let mut out = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.type_code.trim().is_empty() {
            return Err(CoreError::Topology {
                message: format!("{section} #{index} ({:?}) has no type code", record.name),
            });
        }

        let kind = match record.type_code.parse::<HardwareKind>() {
            Ok(kind) if kind.family() == family => kind,
            Ok(kind) => {
                warn!(name = %record.name, kind = %kind, section, "kind listed in the wrong section, skipping");
                continue;
            }
            Err(_) => {
                warn!(name = %record.name, type_code = %record.type_code, section, "unsupported type, skipping");
                continue;
            }
        };

        let counter = counters.entry(kind).or_insert(0);
        out.push(ModuleInstance {
            kind,
            ordinal: *counter,
            name: record.name.clone(),
        });
        *counter += 1;
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ipx800_api::ModuleRecord;

    fn records(extensions: Vec<ModuleRecord>, objects: Vec<ModuleRecord>) -> TopologyRecords {
        TopologyRecords {
            extensions,
            objects,
            ..TopologyRecords::default()
        }
    }

    #[test]
    fn ordinals_count_per_kind() {
        let topo = Topology::from_records(records(
            vec![
                ModuleRecord::new("x8r", "Cave"),
                ModuleRecord::new("x4vr", "Volets"),
                ModuleRecord::new("x8r", "Garage"),
            ],
            vec![],
        ))
        .unwrap();

        let ords: Vec<(HardwareKind, u32)> =
            topo.extensions.iter().map(|m| (m.kind, m.ordinal)).collect();
        assert_eq!(
            ords,
            vec![
                (HardwareKind::X8r, 0),
                (HardwareKind::X4vr, 0),
                (HardwareKind::X8r, 1),
            ]
        );
    }

    #[test]
    fn unknown_types_are_skipped_without_consuming_an_ordinal() {
        let topo = Topology::from_records(records(
            vec![],
            vec![
                ModuleRecord::new("tempo", "T0"),
                ModuleRecord::new("pushbutton", "??"),
                ModuleRecord::new("tempo", "T1"),
            ],
        ))
        .unwrap();
        assert_eq!(topo.objects.len(), 2);
        assert_eq!(topo.objects[1].ordinal, 1);
        assert_eq!(topo.objects[1].name, "T1");
    }

    #[test]
    fn wrong_section_is_skipped() {
        let topo = Topology::from_records(records(
            vec![ModuleRecord::new("tempo", "T0")],
            vec![ModuleRecord::new("x8r", "Cave")],
        ))
        .unwrap();
        assert!(topo.extensions.is_empty());
        assert!(topo.objects.is_empty());
    }

    #[test]
    fn missing_type_code_fails() {
        let err = Topology::from_records(records(vec![ModuleRecord::new("", "Cave")], vec![]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Topology { .. }));
    }
}
