// ── Hub context ──
//
// Everything one hub instance owns between setup and teardown: its
// configuration, client, reconciled device list, state coordinator and
// push gateway. There is no process-wide registry; callers hold the `Hub`.

use std::sync::Arc;

use ipx800_api::{HubClient, HubInfo};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::HubConfig;
use crate::coordinator::StateCoordinator;
use crate::error::CoreError;
use crate::model::{DeviceDescriptor, Platform, Topology};
use crate::push::{PushAction, PushError, PushGateway, PushRequest};
use crate::reconcile::{self, RejectedDescriptor};
use crate::router::PlatformRouter;

pub struct Hub<C: HubClient> {
    config: HubConfig,
    client: Arc<C>,
    topology: Topology,
    devices: Vec<DeviceDescriptor>,
    rejected: Vec<RejectedDescriptor>,
    router: PlatformRouter,
    coordinator: StateCoordinator<C>,
    push: PushGateway,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<C: HubClient> Hub<C> {
    /// Connect, discover, reconcile and start polling.
    ///
    /// An unreachable hub yields [`CoreError::NotReady`] and a rejected key
    /// [`CoreError::AuthenticationFailed`]; both leave nothing running.
    /// Topology failures abort setup. A failed first state fetch only logs:
    /// the coordinator retries on its own schedule.
    pub async fn setup(config: HubConfig, client: Arc<C>) -> Result<Self, CoreError> {
        info!(host = %config.host, name = %config.name, "setting up hub");

        client.ping().await.map_err(|e| match e {
            ipx800_api::Error::CannotConnect { reason, .. } => CoreError::NotReady {
                host: config.host.clone(),
                reason,
            },
            other => CoreError::from(other),
        })?;

        let topology = Topology::from_records(client.topology().await?)?;
        let list = reconcile::reconcile(&topology, &config.discovery_filter(), &config.declared);
        let router = PlatformRouter::new(list.devices.iter().cloned());

        let coordinator = StateCoordinator::new(
            Arc::clone(&client),
            config.scan_interval,
            config.refresh_debounce,
        );
        if let Err(e) = coordinator.refresh_now().await {
            warn!(error = %e, "first state fetch failed, polling will retry");
        }

        let cancel = CancellationToken::new();
        let tasks = vec![coordinator.spawn(cancel.child_token())];
        let push = PushGateway::new(config.host.clone(), config.push_password.clone());

        info!(
            devices = list.devices.len(),
            rejected = list.rejected.len(),
            firmware = %topology.hub.firmware_version,
            "hub ready"
        );

        Ok(Self {
            config,
            client,
            topology,
            devices: list.devices,
            rejected: list.rejected,
            router,
            coordinator,
            push,
            cancel,
            tasks,
        })
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn teardown(mut self) {
        self.cancel.cancel();
        for handle in self.tasks.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "hub task ended abnormally");
            }
        }
        info!(host = %self.config.host, "hub torn down");
    }

    /// Replace this instance with a fresh one. The old coordinator is fully
    /// stopped before the new setup starts.
    pub async fn reload(self, config: HubConfig) -> Result<Self, CoreError> {
        let client = Arc::clone(&self.client);
        self.teardown().await;
        Self::setup(config, client).await
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn info(&self) -> &HubInfo {
        &self.topology.hub
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The final device list, declared devices first.
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn devices_for(&self, platform: Platform) -> &[DeviceDescriptor] {
        self.router.devices_for(platform)
    }

    pub fn rejected(&self) -> &[RejectedDescriptor] {
        &self.rejected
    }

    pub fn coordinator(&self) -> &StateCoordinator<C> {
        &self.coordinator
    }

    pub fn unique_id(&self, device: &DeviceDescriptor) -> String {
        device.unique_id(&self.topology.hub.mac_address)
    }

    pub fn device_name(&self, device: &DeviceDescriptor) -> String {
        device.device_name(&self.config.name)
    }

    /// Authorize a push call and act on it. Refresh pushes schedule a
    /// debounced refresh; state pushes are returned for the host to apply.
    pub fn push(&self, request: &PushRequest) -> Result<PushAction, PushError> {
        let action = self.push.handle(request)?;
        if action == PushAction::Refresh {
            self.coordinator.request_refresh();
        }
        Ok(action)
    }
}

impl<C: HubClient> Drop for Hub<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
