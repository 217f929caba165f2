//! Target listing command (kiln targets)

use crate::args::possible_targets;
use anyhow::Result;
use kiln_build::Platform;
use kiln_config::ConfigLoader;
use serde::Serialize;

/// Targets available on this host
#[derive(Debug, Serialize)]
pub struct TargetsReport {
    pub host: &'static str,
    pub targets: Vec<&'static str>,
}

impl TargetsReport {
    pub fn new(host: Platform, targets: &[Platform]) -> Self {
        Self {
            host: host.name(),
            targets: targets.iter().map(Platform::name).collect(),
        }
    }

    /// One target per line, the host marked as the default
    pub fn to_text(&self) -> String {
        self.targets
            .iter()
            .map(|target| {
                if *target == self.host {
                    format!("{} (default)\n", target)
                } else {
                    format!("{}\n", target)
                }
            })
            .collect()
    }
}

/// Run the targets command
pub fn run(json: bool) -> Result<()> {
    let config = ConfigLoader::new().load_from_directory(&std::env::current_dir()?)?;
    let host = Platform::host()?;
    let report = TargetsReport::new(host, &possible_targets(&config, host));
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
