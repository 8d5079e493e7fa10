//! `hubkit user` command - Show a user's profile and collections.

use anyhow::Result;
use colored::Colorize;

use super::{Cli, utils};
use crate::output;
use crate::services::{Include, LookupService, UserReport};

/// Run the user command.
pub fn run(cli: &Cli, login: &str, include: Include) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let client = utils::connect(cli, &rt)?;
    let service = LookupService::new(&client);

    let report = rt.block_on(service.user(login, include))?;

    if cli.json {
        return utils::output_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &UserReport) {
    let user = &report.user;
    match &user.name {
        Some(name) => output::info(&format!("{} ({name})", user.login.bold())),
        None => output::info(&user.login.bold().to_string()),
    }
    output::field("bio", user.bio.as_deref());
    output::field("repos", user.public_repos);
    output::field("gists", user.public_gists);
    output::field("followers", user.followers);
    output::field("following", user.following);
    output::field("joined", output::date(user.created_at));
    if let Some(url) = &user.html_url {
        output::essential(url);
    }

    if let Some(repos) = &report.repos {
        output::hr();
        output::info(&format!("{} repositories", repos.len()));
        for repo in repos {
            let language = repo.language.as_deref().unwrap_or("-");
            output::detail(&format!("  {:<40} {}", repo.name, language.dimmed()));
        }
    }

    if let Some(gists) = &report.gists {
        output::hr();
        output::info(&format!("{} gists", gists.len()));
        for gist in gists {
            let description = gist.description.as_deref().unwrap_or_default();
            output::detail(&format!("  {:<34} {description}", gist.id));
        }
    }

    if let Some(orgs) = &report.orgs {
        output::hr();
        output::info(&format!("{} organizations", orgs.len()));
        for org in orgs {
            output::detail(&format!("  {}", org.login));
        }
    }
}
