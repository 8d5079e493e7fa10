//! `hubkit limits` command - Show the remaining API quota.

use anyhow::Result;
use chrono::Utc;
use hubkit::RateState;
use serde::Serialize;

use super::{Cli, utils};
use crate::output;
use crate::services::LookupService;

/// JSON output for limits command.
#[derive(Debug, Serialize)]
struct LimitsOutput {
    #[serde(flatten)]
    limits: RateState,
    latency_ms: u128,
}

/// Run the limits command.
pub fn run(cli: &Cli) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let client = utils::connect(cli, &rt)?;

    // Refresh the quota headers with a cheap request.
    let latency = rt.block_on(client.latency())?;
    let limits = rt.block_on(LookupService::new(&client).limits())?;

    if cli.json {
        return utils::output_json(&LimitsOutput {
            limits,
            latency_ms: latency.as_millis(),
        });
    }

    output::info(&format!("Remaining: {}", output::quota(limits.remaining, limits.total)));
    output::field("used", limits.used);
    if let Some(reset) = limits.reset_at {
        let wait = limits.wait_duration(Utc::now());
        output::field(
            "resets",
            Some(format!("{} (in {}m)", reset.format("%H:%M:%S"), wait.as_secs() / 60)),
        );
    }
    output::field("latency", Some(format!("{}ms", latency.as_millis())));
    if !client.has_auth() {
        output::warn("Anonymous requests - set GITHUB_USERNAME and GITHUB_TOKEN for a higher limit");
    }
    Ok(())
}
