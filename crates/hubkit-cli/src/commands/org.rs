//! `hubkit org` command - Show an organization.

use anyhow::Result;
use colored::Colorize;

use super::{Cli, utils};
use crate::output;
use crate::services::LookupService;

/// Run the org command.
pub fn run(cli: &Cli, name: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let client = utils::connect(cli, &rt)?;
    let service = LookupService::new(&client);

    let org = rt.block_on(service.org(name))?;

    if cli.json {
        return utils::output_json(&org);
    }

    if org.is_verified {
        output::info(&format!("{} {}", org.login.bold(), "verified".green()));
    } else {
        output::info(&org.login.bold().to_string());
    }
    output::field("description", org.description.as_deref());
    output::field("repos", org.public_repos);
    output::field("followers", org.followers);
    output::field("created", output::date(org.created_at));
    if let Some(url) = &org.html_url {
        output::essential(url);
    }
    Ok(())
}
