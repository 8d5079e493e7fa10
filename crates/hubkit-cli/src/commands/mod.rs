//! Command definitions and shared command plumbing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod completions;
pub mod gist;
pub mod issue;
pub mod limits;
pub mod org;
pub mod repo;
pub mod user;
pub mod utils;

/// Look up GitHub users, repositories, issues, organizations and gists.
///
/// Credentials are read from `GITHUB_USERNAME` and `GITHUB_TOKEN`; without
/// them requests are anonymous and subject to the lower rate limit.
#[derive(Debug, Parser)]
#[command(name = "hubkit", version, about, long_about = None)]
pub struct Cli {
    /// Path to a hubkit.toml config file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a user's profile.
    User {
        /// Login name.
        login: String,

        /// Also list the user's public repositories.
        #[arg(long)]
        repos: bool,

        /// Also list the user's public gists.
        #[arg(long)]
        gists: bool,

        /// Also list the user's organizations.
        #[arg(long)]
        orgs: bool,
    },

    /// Show a repository.
    Repo {
        /// Repository as `owner/name`.
        repo: String,
    },

    /// Show an issue.
    Issue {
        /// Repository as `owner/name`.
        repo: String,

        /// Issue number.
        number: u64,
    },

    /// Show an organization.
    Org {
        /// Organization login.
        name: String,
    },

    /// Show a gist.
    Gist {
        /// Gist ID.
        id: String,
    },

    /// Show the remaining API quota.
    Limits,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}
