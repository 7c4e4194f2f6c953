// ── File-backed hub ──
//
// A captured hub (topology + state) replayed through the `HubClient`
// surface. Used by the CLI to reconcile offline and by tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;
use crate::records::{StateSnapshot, TopologyRecords};

/// On-disk snapshot format: the topology sections plus an optional `state` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubSnapshot {
    #[serde(flatten)]
    pub topology: TopologyRecords,
    #[serde(default)]
    pub state: StateSnapshot,
}

/// A [`HubClient`] answering from a [`HubSnapshot`].
pub struct StaticHub {
    snapshot: HubSnapshot,
    state_fetches: AtomicUsize,
}

impl StaticHub {
    pub fn new(snapshot: HubSnapshot) -> Self {
        Self {
            snapshot,
            state_fetches: AtomicUsize::new(0),
        }
    }

    /// Parse a JSON snapshot.
    pub fn from_json(body: &str) -> Result<Self, Error> {
        let snapshot = serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.to_owned(),
        })?;
        Ok(Self::new(snapshot))
    }

    /// Load a JSON snapshot from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading hub snapshot");
        let body = std::fs::read_to_string(path)?;
        Self::from_json(&body)
    }

    pub fn snapshot(&self) -> &HubSnapshot {
        &self.snapshot
    }

    /// How many times [`HubClient::state`] has been served.
    pub fn state_fetches(&self) -> usize {
        self.state_fetches.load(Ordering::SeqCst)
    }
}

impl HubClient for StaticHub {
    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn topology(&self) -> Result<TopologyRecords, Error> {
        Ok(self.snapshot.topology.clone())
    }

    async fn state(&self) -> Result<StateSnapshot, Error> {
        self.state_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.state.clone())
    }
}
