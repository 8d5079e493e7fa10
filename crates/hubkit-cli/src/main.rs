//! hubkit CLI - look up GitHub users, repositories and rate limits.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod services;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hubkit=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::User {
            login,
            repos,
            gists,
            orgs,
        } => {
            let include = services::Include {
                repos: *repos,
                gists: *gists,
                orgs: *orgs,
            };
            commands::user::run(&cli, login, include)
        }
        Commands::Repo { repo } => commands::repo::run(&cli, repo),
        Commands::Issue { repo, number } => commands::issue::run(&cli, repo, *number),
        Commands::Org { name } => commands::org::run(&cli, name),
        Commands::Gist { id } => commands::gist::run(&cli, id),
        Commands::Limits => commands::limits::run(&cli),
        Commands::Completions { shell } => commands::completions::run(*shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
