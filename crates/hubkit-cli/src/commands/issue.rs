//! `hubkit issue` command - Show an issue.

use anyhow::Result;
use colored::Colorize;

use super::{Cli, utils};
use crate::output;
use crate::services::LookupService;

/// Run the issue command.
pub fn run(cli: &Cli, spec: &str, number: u64) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let client = utils::connect(cli, &rt)?;
    let service = LookupService::new(&client);

    let issue = rt.block_on(service.issue(spec, number))?;

    if cli.json {
        return utils::output_json(&issue);
    }

    output::info(&format!(
        "{} {} {}",
        format!("#{}", issue.number).dimmed(),
        issue.title.bold(),
        output::issue_state(&issue.state)
    ));
    output::field("author", issue.user.as_ref().map(|u| &u.login));
    if !issue.labels.is_empty() {
        output::field("labels", Some(issue.labels.join(", ")));
    }
    output::field("opened", output::date(issue.created_at));
    output::field("closed by", issue.closed_by.as_ref().map(|u| &u.login));
    if let Some(url) = &issue.html_url {
        output::essential(url);
    }
    Ok(())
}
