//! Trait abstractions for read-only GitHub lookups.
//!
//! This module defines the `GitHubApi` trait which abstracts the lookups the
//! command-line front end needs, enabling dependency injection and
//! testability.

use std::future::Future;
use std::sync::Arc;

use crate::{Gist, Issue, Organization, RateState, Repository, Result, User};

/// Trait for GitHub lookups.
///
/// Implemented by [`Client`](crate::Client); commands are generic over it so
/// they can run against a mock.
pub trait GitHubApi: Send + Sync {
    // === Users ===

    /// Get a user by login.
    fn get_user(&self, login: &str) -> impl Future<Output = Result<Arc<User>>> + Send;

    /// Every public repository of a user.
    fn user_repos(&self, login: &str) -> impl Future<Output = Result<Vec<Repository>>> + Send;

    /// Every public gist of a user.
    fn user_gists(&self, login: &str) -> impl Future<Output = Result<Vec<Gist>>> + Send;

    /// Every public organization of a user.
    fn user_orgs(&self, login: &str) -> impl Future<Output = Result<Vec<Organization>>> + Send;

    // === Repositories ===

    /// Get a repository by owner and name.
    fn get_repo(
        &self,
        owner: &str,
        name: &str,
    ) -> impl Future<Output = Result<Arc<Repository>>> + Send;

    /// Get an issue by number.
    fn get_issue(
        &self,
        owner: &str,
        name: &str,
        number: u64,
    ) -> impl Future<Output = Result<Issue>> + Send;

    // === Organizations and gists ===

    /// Get an organization by login.
    fn get_org(&self, name: &str) -> impl Future<Output = Result<Organization>> + Send;

    /// Get a gist by ID.
    fn get_gist(&self, id: &str) -> impl Future<Output = Result<Gist>> + Send;

    // === Rate limit ===

    /// The latest rate-limit snapshot.
    fn check_limits(&self) -> impl Future<Output = Result<Arc<RateState>>> + Send;
}
