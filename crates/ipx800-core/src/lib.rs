//! Device discovery and reconciliation for GCE IPX800 V5 hubs.
//!
//! This crate sits between the hub client (`ipx800-api`) and whatever host
//! renders entities:
//!
//! - **Domain model** ([`model`]): [`DeviceDescriptor`], the closed
//!   [`HardwareKind`] / [`Platform`] / [`Subtype`] catalog, and the typed
//!   [`Topology`] built from raw hub records.
//!
//! - **Auto-discovery** ([`discovery`]): a pure expansion of the topology
//!   into candidate descriptors, one table entry per hardware kind.
//!
//! - **Reconciliation** ([`reconcile`]): validates declared descriptors,
//!   matches them against candidates, merges, and drops the discovered
//!   duplicates. [`PlatformRouter`] partitions the result per platform.
//!
//! - **[`Hub`]**: the per-instance context, with setup, teardown and reload, the
//!   polling [`StateCoordinator`] with debounced refresh, and the push
//!   [`PushGateway`].

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod hub;
pub mod model;
pub mod push;
pub mod reconcile;
pub mod router;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{HubConfig, SetupSource};
pub use coordinator::{StateCoordinator, StateView};
pub use discovery::{CandidateGroup, DiscoveryFilter};
pub use error::CoreError;
pub use hub::Hub;
pub use push::{PushAction, PushError, PushGateway, PushKind, PushRequest, StateUpdate};
pub use reconcile::{DeclaredReport, DeviceList, RejectReason, RejectedDescriptor};
pub use router::PlatformRouter;

pub use model::{
    ChannelRef, DeviceDescriptor, EntityCategory, Family, HardwareKind, IdentityKey, ModuleInstance,
    Overrides, Platform, PlatformBucket, RawDescriptor, Subtype, Topology,
};
