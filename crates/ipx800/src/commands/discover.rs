//! `ipx800 discover`: what auto-discovery alone yields for a snapshot.

use ipx800_config::{Config, ConfigError};
use ipx800_core::config::DEFAULT_HUB_NAME;
use ipx800_core::{DiscoveryFilter, Topology, discovery};

use super::{DeviceRow, DeviceView};
use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// The profile's filter and display name, or discover-all for `--all` and
/// unconfigured setups. `--all` widens the kinds but keeps `diag_sensors`.
fn filter_for(
    args: &DiscoverArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(DiscoveryFilter, String), CliError> {
    let profile = match cfg.hub(global.hub.as_deref()) {
        Ok((_, profile)) => profile,
        Err(ConfigError::NoHub) => return Ok((DiscoveryFilter::interactive(), DEFAULT_HUB_NAME.into())),
        Err(ConfigError::UnknownHub { name }) => return Err(super::unknown_hub(name, cfg)),
        Err(other) => return Err(other.into()),
    };

    let hub_name = profile.name.clone().unwrap_or_else(|| DEFAULT_HUB_NAME.into());
    if args.all {
        let filter = DiscoveryFilter {
            diag_sensors: profile.diag_sensors,
            ..DiscoveryFilter::interactive()
        };
        return Ok((filter, hub_name));
    }
    let filter = DiscoveryFilter {
        source: profile.source,
        auto_types: ipx800_config::auto_types(profile),
        diag_sensors: profile.diag_sensors,
    };
    Ok((filter, hub_name))
}

pub fn handle(args: &DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = super::load_config(global)?;
    let format = super::output_format(global, &cfg);
    let (filter, hub_name) = filter_for(args, global, &cfg)?;

    let client = super::load_snapshot(&args.snapshot)?;
    let topology = Topology::from_records(client.snapshot().topology.clone())?;
    tracing::debug!(
        extensions = topology.extensions.len(),
        objects = topology.objects.len(),
        "topology loaded"
    );

    let views: Vec<DeviceView> = discovery::descriptors(&topology, &filter)
        .iter()
        .map(|d| DeviceView::new(d, &topology.hub.mac_address, &hub_name))
        .collect();

    let rendered = output::render_list(format, &views, |v| DeviceRow::from(v), |v| v.unique_id.clone())?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
