//! Domain objects built from GitHub API responses.
//!
//! Each object maps a fixed set of JSON fields; anything else in the payload
//! is ignored. Timestamps become [`DateTime<Utc>`]. Objects carry an
//! [`HttpHandle`] back to the HTTP core that produced them so related
//! collections can be fetched lazily. The handle does not keep the core
//! alive.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::http::HttpHandle;
use crate::types::AddFile;

/// Objects holding a back-reference to the HTTP core.
pub trait Attach {
    /// Point this object (and any nested objects) at `handle`.
    fn attach(&mut self, handle: &HttpHandle);
}

impl<T: Attach> Attach for Vec<T> {
    fn attach(&mut self, handle: &HttpHandle) {
        for item in self {
            item.attach(handle);
        }
    }
}

impl<T: Attach> Attach for Option<T> {
    fn attach(&mut self, handle: &HttpHandle) {
        if let Some(item) = self {
            item.attach(handle);
        }
    }
}

// === Users ===

/// A GitHub user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Login name.
    pub login: String,
    /// Numeric ID.
    pub id: u64,
    /// Display name.
    pub name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Profile page URL.
    pub html_url: Option<String>,
    /// Biography.
    pub bio: Option<String>,
    /// Number of public repositories.
    pub public_repos: Option<u64>,
    /// Number of public gists.
    pub public_gists: Option<u64>,
    /// Follower count.
    pub followers: Option<u64>,
    /// Following count.
    pub following: Option<u64>,
    /// Account creation time.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    http: HttpHandle,
}

impl User {
    /// Public repositories owned by this user, across all pages.
    ///
    /// # Errors
    /// Returns error if the session is gone or the request fails.
    pub async fn repos(&self) -> Result<Vec<Repository>> {
        self.http.upgrade()?.get_user_repos(&self.login).await
    }

    /// Public gists owned by this user, across all pages.
    ///
    /// # Errors
    /// Returns error if the session is gone or the request fails.
    pub async fn gists(&self) -> Result<Vec<Gist>> {
        self.http.upgrade()?.get_user_gists(&self.login).await
    }

    /// Public organizations this user belongs to, across all pages.
    ///
    /// # Errors
    /// Returns error if the session is gone or the request fails.
    pub async fn orgs(&self) -> Result<Vec<Organization>> {
        self.http.upgrade()?.get_user_orgs(&self.login).await
    }
}

impl Attach for User {
    fn attach(&mut self, handle: &HttpHandle) {
        self.http = handle.clone();
    }
}

/// The abbreviated user embedded in repositories, issues and gists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialUser {
    /// Login name.
    pub login: String,
    /// Numeric ID.
    pub id: u64,
    /// Whether the user is a site administrator.
    #[serde(default)]
    pub site_admin: bool,
    /// Profile page URL.
    pub html_url: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    #[serde(skip)]
    http: HttpHandle,
}

impl PartialUser {
    /// Fetch the full user record.
    ///
    /// # Errors
    /// Returns error if the session is gone or the user no longer exists.
    pub async fn upgrade(&self) -> Result<User> {
        self.http.upgrade()?.get_user(&self.login).await
    }
}

impl Attach for PartialUser {
    fn attach(&mut self, handle: &HttpHandle) {
        self.http = handle.clone();
    }
}

// === Repositories ===

/// A GitHub repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Numeric ID.
    pub id: u64,
    /// Repository name without the owner.
    pub name: String,
    /// `owner/name`.
    pub full_name: Option<String>,
    /// Owner of the repository.
    pub owner: PartialUser,
    /// Description.
    pub description: Option<String>,
    /// Whether this repository is a fork.
    #[serde(default)]
    pub fork: bool,
    /// Primary language.
    pub language: Option<String>,
    /// API URL.
    pub url: Option<String>,
    /// Web URL.
    pub html_url: Option<String>,
    /// HTTPS clone URL.
    pub clone_url: Option<String>,
    /// Default branch name.
    pub default_branch: Option<String>,
    /// Whether the repository is archived.
    #[serde(default)]
    pub archived: bool,
    /// Whether the repository is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Repository size in kilobytes.
    pub size: Option<u64>,
    /// Open issue count.
    pub open_issues_count: Option<u64>,
    /// Fork count.
    pub forks_count: Option<u64>,
    /// Star count.
    pub stargazers_count: Option<u64>,
    /// Watcher count.
    pub watchers_count: Option<u64>,
    /// License name, if any.
    #[serde(default, deserialize_with = "license_name")]
    pub license: Option<String>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    http: HttpHandle,
}

impl Repository {
    /// The `owner/name` pair identifying this repository.
    #[must_use]
    pub fn key(&self) -> RepoKey {
        RepoKey::new(&self.owner.login, &self.name)
    }

    /// Delete this repository. Requires authentication.
    ///
    /// # Errors
    /// Returns error if the session is gone or deletion fails.
    pub async fn delete(&self) -> Result<()> {
        self.http
            .upgrade()?
            .delete_repo(&self.owner.login, &self.name)
            .await
    }

    /// Add a file to this repository, on the default branch unless
    /// `file.branch` is set. Requires authentication.
    ///
    /// # Errors
    /// Returns error if the session is gone or the file already exists.
    pub async fn add_file(&self, mut file: AddFile) -> Result<()> {
        if file.branch.is_none() {
            file.branch.clone_from(&self.default_branch);
        }
        self.http
            .upgrade()?
            .add_file(&self.owner.login, &self.name, &file)
            .await
    }
}

impl Attach for Repository {
    fn attach(&mut self, handle: &HttpHandle) {
        self.http = handle.clone();
        self.owner.attach(handle);
    }
}

/// Natural cache key for a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoKey {
    /// Owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoKey {
    /// Create a key from an owner and repository name.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// === Issues ===

/// A GitHub issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Numeric ID.
    pub id: u64,
    /// Issue number within the repository.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Author.
    pub user: Option<PartialUser>,
    /// Label names.
    #[serde(default, deserialize_with = "label_names")]
    pub labels: Vec<String>,
    /// `open` or `closed`.
    pub state: String,
    /// Web URL.
    pub html_url: Option<String>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Who closed the issue.
    pub closed_by: Option<PartialUser>,
}

impl Attach for Issue {
    fn attach(&mut self, handle: &HttpHandle) {
        self.user.attach(handle);
        self.closed_by.attach(handle);
    }
}

// === Gists ===

/// A GitHub gist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gist {
    /// Gist ID.
    pub id: String,
    /// Node ID.
    pub node_id: Option<String>,
    /// Web URL.
    pub html_url: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Whether the gist is public.
    #[serde(default)]
    pub public: bool,
    /// Owner, absent for anonymous gists.
    pub owner: Option<PartialUser>,
    /// Files keyed by file name.
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    /// Comment count.
    pub comments: Option<u64>,
    /// Whether the file list was truncated.
    #[serde(default)]
    pub truncated: bool,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    http: HttpHandle,
}

impl Gist {
    /// Delete this gist. Requires authentication.
    ///
    /// # Errors
    /// Returns error if the session is gone or deletion fails.
    pub async fn delete(&self) -> Result<()> {
        self.http.upgrade()?.delete_gist(&self.id).await
    }
}

impl Attach for Gist {
    fn attach(&mut self, handle: &HttpHandle) {
        self.http = handle.clone();
        self.owner.attach(handle);
    }
}

/// A file inside a gist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistFile {
    /// File name.
    pub filename: String,
    /// Detected language.
    pub language: Option<String>,
    /// Raw download URL.
    pub raw_url: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Content, present when fetching a single gist.
    pub content: Option<String>,
}

// === Organizations ===

/// A GitHub organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Login name.
    pub login: String,
    /// Numeric ID.
    pub id: u64,
    /// Description.
    pub description: Option<String>,
    /// Web URL.
    pub html_url: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Whether the organization is verified.
    #[serde(default)]
    pub is_verified: bool,
    /// Number of public repositories.
    pub public_repos: Option<u64>,
    /// Number of public gists.
    pub public_gists: Option<u64>,
    /// Follower count.
    pub followers: Option<u64>,
    /// Following count.
    pub following: Option<u64>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl Attach for Organization {
    fn attach(&mut self, _handle: &HttpHandle) {}
}

// === Field normalization ===

#[derive(Deserialize)]
struct Named {
    name: String,
}

/// `license: {"key": "mit", "name": "MIT License", ...}` → `Some("MIT License")`.
fn license_name<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Named>::deserialize(deserializer)?.map(|license| license.name))
}

/// `labels: [{"name": "bug", ...}]` → `["bug"]`.
fn label_names<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Vec::<Named>::deserialize(deserializer)?
        .into_iter()
        .map(|label| label.name)
        .collect())
}
