//! # hubkit
//!
//! A GitHub REST client that keeps an eye on the rate limit.
//!
//! - [`Client`] caches users and repositories in bounded LRU caches.
//! - Every response feeds a [`RateTracker`]; requests are refused once the
//!   quota is nearly exhausted, and multi-page fetches abort up front when
//!   they would run past it.
//! - Domain objects such as [`User`] fetch related collections lazily.
//!
//! ```no_run
//! # async fn run() -> hubkit::Result<()> {
//! let client = hubkit::Client::from_env(&hubkit::Config::default())?;
//! client.start().await?;
//! let user = client.get_user("octocat").await?;
//! let repos = user.repos().await?;
//! println!("{} has {} public repositories", user.login, repos.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Tokens are stored using `SecretString` which automatically zeroizes memory
//! when dropped, and are redacted from `Debug` output.

mod auth;
mod cache;
mod client;
mod config;
mod error;
mod http;
mod objects;
mod paginate;
mod rate;
pub mod traits;
mod types;

pub use auth::{Credentials, TOKEN_ENV, USERNAME_ENV};
pub use cache::{DEFAULT_CEILING, LruCache};
pub use client::{Client, REPO_CACHE_CEILING, USER_CACHE_CEILING};
pub use config::{ApiConfig, CacheConfig, Config, DEFAULT_API_URL, RateLimitConfig, RateLimitPolicy};
pub use error::{Error, ErrorCategory, Result};
pub use http::{DEFAULT_USER_AGENT, HttpCore, HttpHandle};
pub use objects::{
    Attach, Gist, GistFile, Issue, Organization, PartialUser, RepoKey, Repository, User,
};
pub use paginate::{PageLinks, Paginator, parse_link_header};
pub use rate::{RateState, RateTracker};
// Re-export SecretString for Client::update_auth
pub use secrecy::SecretString;
pub use traits::GitHubApi;
pub use types::{AddFile, CreateGist, CreateRepository, File};
