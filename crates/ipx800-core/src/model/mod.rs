// ── Domain model ──
//
// Canonical types shared by discovery, reconciliation and routing.

pub mod descriptor;
pub mod kind;
pub mod topology;

pub use descriptor::{
    ChannelRef, DOMAIN, DeviceDescriptor, IdentityKey, Overrides, PlatformBucket, RawDescriptor,
};
pub use kind::{EntityCategory, Family, HardwareKind, Platform, Subtype};
pub use topology::{ModuleInstance, Topology};
