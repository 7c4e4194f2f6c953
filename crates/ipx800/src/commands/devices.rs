//! `ipx800 devices`: set a hub up against a snapshot and list the outcome.

use std::sync::Arc;

use ipx800_core::{Hub, RejectedDescriptor};
use tabled::Tabled;

use super::{DeviceRow, DeviceView};
use crate::cli::{DevicesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RejectedRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&RejectedDescriptor> for RejectedRow {
    fn from(r: &RejectedDescriptor) -> Self {
        Self {
            name: r.name.clone(),
            reason: r.reason.to_string(),
        }
    }
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = super::load_config(global)?;
    let format = super::output_format(global, &cfg);
    let hub_config = super::hub_config(global, &cfg)?;
    let client = Arc::new(super::load_snapshot(&args.snapshot)?);

    let hub = Hub::setup(hub_config, client).await?;

    let rendered = if args.rejected {
        output::render_list(format, hub.rejected(), |r| RejectedRow::from(r), |r| r.name.clone())
    } else {
        let devices = match args.platform {
            Some(platform) => hub.devices_for(platform),
            None => hub.devices(),
        };
        let mac = &hub.info().mac_address;
        let views: Vec<DeviceView> = devices
            .iter()
            .map(|d| DeviceView::new(d, mac, &hub.config().name))
            .collect();
        output::render_list(format, &views, |v| DeviceRow::from(v), |v| v.unique_id.clone())
    };

    hub.teardown().await;
    output::print_output(&rendered?, global.quiet);
    Ok(())
}
