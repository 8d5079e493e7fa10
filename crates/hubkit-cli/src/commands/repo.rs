//! `hubkit repo` command - Show a repository.

use anyhow::Result;
use colored::Colorize;
use hubkit::Repository;

use super::{Cli, utils};
use crate::output;
use crate::services::LookupService;

/// Run the repo command.
pub fn run(cli: &Cli, spec: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let client = utils::connect(cli, &rt)?;
    let service = LookupService::new(&client);

    let repo = rt.block_on(service.repo(spec))?;

    if cli.json {
        return utils::output_json(&repo);
    }
    print_repo(&repo);
    Ok(())
}

fn print_repo(repo: &Repository) {
    let name = repo
        .full_name
        .clone()
        .unwrap_or_else(|| repo.key().to_string());
    let mut flags = Vec::new();
    if repo.fork {
        flags.push("fork");
    }
    if repo.archived {
        flags.push("archived");
    }
    if repo.disabled {
        flags.push("disabled");
    }
    if flags.is_empty() {
        output::info(&name.bold().to_string());
    } else {
        output::info(&format!("{} [{}]", name.bold(), flags.join(", ").yellow()));
    }

    output::field("description", repo.description.as_deref());
    output::field("language", repo.language.as_deref());
    output::field("license", repo.license.as_deref());
    output::field("branch", repo.default_branch.as_deref());
    output::field("stars", repo.stargazers_count);
    output::field("forks", repo.forks_count);
    output::field("issues", repo.open_issues_count);
    output::field("created", output::date(repo.created_at));
    output::field("updated", output::date(repo.updated_at));
    if let Some(url) = &repo.html_url {
        output::essential(url);
    }
}
