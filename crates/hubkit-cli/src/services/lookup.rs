//! Lookup service backing the read-only commands.
//!
//! Commands hand it any [`GitHubApi`] implementation, so the report building
//! can be tested against a mock.

use anyhow::{Result, bail};
use hubkit::{Gist, GitHubApi, Issue, Organization, RateState, Repository, User};
use serde::Serialize;

/// Which collections to fetch alongside a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub repos: bool,
    pub gists: bool,
    pub orgs: bool,
}

/// A user together with the requested collections.
#[derive(Debug, Serialize)]
pub struct UserReport {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos: Option<Vec<Repository>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gists: Option<Vec<Gist>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orgs: Option<Vec<Organization>>,
}

/// Split `owner/name` into its parts.
pub fn parse_repo_spec(spec: &str) -> Result<(&str, &str)> {
    match spec.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => bail!("Expected a repository as owner/name, got '{spec}'"),
    }
}

/// Service for read-only lookups with a trait-based client.
pub struct LookupService<'a, H: GitHubApi> {
    client: &'a H,
}

impl<'a, H: GitHubApi> LookupService<'a, H> {
    /// Create a new lookup service.
    #[must_use]
    pub const fn new(client: &'a H) -> Self {
        Self { client }
    }

    /// A user and, optionally, their collections.
    pub async fn user(&self, login: &str, include: Include) -> Result<UserReport> {
        let user = self.client.get_user(login).await?;

        let repos = if include.repos {
            Some(self.client.user_repos(login).await?)
        } else {
            None
        };
        let gists = if include.gists {
            Some(self.client.user_gists(login).await?)
        } else {
            None
        };
        let orgs = if include.orgs {
            Some(self.client.user_orgs(login).await?)
        } else {
            None
        };

        Ok(UserReport {
            user: User::clone(&user),
            repos,
            gists,
            orgs,
        })
    }

    /// A repository given as `owner/name`.
    pub async fn repo(&self, spec: &str) -> Result<Repository> {
        let (owner, name) = parse_repo_spec(spec)?;
        let repo = self.client.get_repo(owner, name).await?;
        Ok(Repository::clone(&repo))
    }

    /// An issue in a repository given as `owner/name`.
    pub async fn issue(&self, spec: &str, number: u64) -> Result<Issue> {
        let (owner, name) = parse_repo_spec(spec)?;
        Ok(self.client.get_issue(owner, name, number).await?)
    }

    /// An organization.
    pub async fn org(&self, name: &str) -> Result<Organization> {
        Ok(self.client.get_org(name).await?)
    }

    /// A gist.
    pub async fn gist(&self, id: &str) -> Result<Gist> {
        Ok(self.client.get_gist(id).await?)
    }

    /// The current quota.
    pub async fn limits(&self) -> Result<RateState> {
        Ok(RateState::clone(&*self.client.check_limits().await?))
    }
}
