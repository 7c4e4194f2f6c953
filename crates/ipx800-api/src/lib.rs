// ipx800-api: wire-level records and client surface for the IPX800 V5 hub

pub mod client;
pub mod error;
pub mod records;
pub mod snapshot;

pub use client::HubClient;
pub use error::Error;
pub use records::{HubInfo, ModuleRecord, StateSnapshot, TopologyRecords};
pub use snapshot::{HubSnapshot, StaticHub};
