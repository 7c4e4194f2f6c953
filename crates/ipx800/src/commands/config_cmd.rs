//! Config subcommand handlers.

use ipx800_config::Config;
use ipx800_core::reconcile;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

/// One skipped declaration, tagged with its hub.
#[derive(Serialize)]
struct Finding {
    hub: String,
    name: String,
    reason: String,
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Hub")]
    hub: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&Finding> for FindingRow {
    fn from(f: &Finding) -> Self {
        Self {
            hub: f.hub.clone(),
            name: f.name.clone(),
            reason: f.reason.clone(),
        }
    }
}

fn masked(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.hubs.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
        if profile.push_password.is_some() {
            profile.push_password = Some(MASK.into());
        }
    }
    cfg
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&super::config_file(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = super::load_config(global)?;
            let format = super::output_format(global, &cfg);
            let rendered = output::render_single(format, &masked(&cfg), |c| {
                Ok(toml::to_string_pretty(c)?)
            })?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Validate => {
            let cfg = super::load_config(global)?;
            let format = super::output_format(global, &cfg);

            let hubs: Vec<_> = match global.hub.as_deref() {
                Some(name) => {
                    let profile = cfg
                        .hubs
                        .get(name)
                        .ok_or_else(|| super::unknown_hub(name.to_owned(), &cfg))?;
                    vec![(name, profile)]
                }
                None => cfg.hubs.iter().map(|(n, p)| (n.as_str(), p)).collect(),
            };

            let mut accepted = 0;
            let mut findings = Vec::new();
            for (hub, profile) in &hubs {
                let report = reconcile::validate_declared(&profile.devices);
                accepted += report.accepted.len();
                findings.extend(report.rejected.into_iter().map(|r| Finding {
                    hub: (*hub).to_owned(),
                    name: r.name,
                    reason: r.reason.to_string(),
                }));
            }

            if findings.is_empty() {
                output::print_output(
                    &format!("{accepted} declared device(s) valid across {} hub(s)", hubs.len()),
                    global.quiet,
                );
                return Ok(());
            }

            let rendered =
                output::render_list(format, &findings, |f| FindingRow::from(f), |f| format!("{}/{}", f.hub, f.name))?;
            output::print_output(&rendered, global.quiet);
            Err(CliError::InvalidDeclarations {
                count: findings.len(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let cfg: Config = toml::from_str(
            r#"
            [hubs.maison]
            host = "192.168.1.240"
            api_key = "hunter2"
            push_password = "pushpw"
            "#,
        )
        .unwrap();
        let shown = toml::to_string_pretty(&masked(&cfg)).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("pushpw"));
        assert!(shown.contains(MASK));
    }
}
