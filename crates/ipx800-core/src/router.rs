// ── Platform router ──
//
// Partitions the final device list by platform. Relative order within a
// platform is preserved. The platform set is closed, so every descriptor
// lands somewhere.

use std::collections::BTreeMap;

use crate::model::{DeviceDescriptor, Platform};

#[derive(Debug, Clone, Default)]
pub struct PlatformRouter {
    by_platform: BTreeMap<Platform, Vec<DeviceDescriptor>>,
}

impl PlatformRouter {
    pub fn new(devices: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        let mut by_platform: BTreeMap<Platform, Vec<DeviceDescriptor>> = BTreeMap::new();
        for device in devices {
            by_platform.entry(device.platform).or_default().push(device);
        }
        Self { by_platform }
    }

    /// Descriptors for one platform, in final-list order.
    pub fn devices_for(&self, platform: Platform) -> &[DeviceDescriptor] {
        self.by_platform
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Platforms with at least one descriptor.
    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.by_platform.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_platform.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_platform.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChannelRef, HardwareKind};

    #[test]
    fn partitions_preserving_order() {
        let d = |name: &str, platform, n| {
            DeviceDescriptor::new(name, platform, HardwareKind::Ipx, 0).with_channel(ChannelRef::Number(n))
        };
        let router = PlatformRouter::new(vec![
            d("b", Platform::Switch, 2),
            d("light", Platform::Light, 3),
            d("a", Platform::Switch, 1),
        ]);

        let names: Vec<&str> = router
            .devices_for(Platform::Switch)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(router.devices_for(Platform::Cover).len(), 0);
        assert_eq!(router.len(), 3);
        assert_eq!(router.platforms().count(), 2);
    }
}
