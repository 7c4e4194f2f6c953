// ── Hub client surface ──
//
// The vendor protocol itself is out of scope for this workspace; anything
// that can answer these three calls can drive discovery and polling.

use std::future::Future;

use crate::error::Error;
use crate::records::{StateSnapshot, TopologyRecords};

/// Read access to one IPX800 V5 hub.
///
/// Implementations must be cheap to share behind an `Arc`; the polling
/// coordinator calls [`state`](Self::state) from a background task.
pub trait HubClient: Send + Sync + 'static {
    /// Check reachability and credentials.
    fn ping(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Enumerate extensions, objects and system channels.
    fn topology(&self) -> impl Future<Output = Result<TopologyRecords, Error>> + Send;

    /// Fetch the full state snapshot.
    fn state(&self) -> impl Future<Output = Result<StateSnapshot, Error>> + Send;
}
