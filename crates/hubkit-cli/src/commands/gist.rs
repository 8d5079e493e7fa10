//! `hubkit gist` command - Show a gist.

use anyhow::Result;
use colored::Colorize;

use super::{Cli, utils};
use crate::output;
use crate::services::LookupService;

/// Run the gist command.
pub fn run(cli: &Cli, id: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let client = utils::connect(cli, &rt)?;
    let service = LookupService::new(&client);

    let gist = rt.block_on(service.gist(id))?;

    if cli.json {
        return utils::output_json(&gist);
    }

    let visibility = if gist.public { "public" } else { "secret" };
    output::info(&format!("{} {}", gist.id.bold(), visibility.dimmed()));
    output::field("description", gist.description.as_deref());
    output::field("owner", gist.owner.as_ref().map(|o| &o.login));
    output::field("comments", gist.comments);
    output::field("created", output::date(gist.created_at));
    for (name, file) in &gist.files {
        let language = file.language.as_deref().unwrap_or("-");
        output::detail(&format!("  {name:<30} {}", language.dimmed()));
    }
    if gist.truncated {
        output::warn("File list is truncated");
    }
    if let Some(url) = &gist.html_url {
        output::essential(url);
    }
    Ok(())
}
