//! Mock implementation of `GitHubApi` for testing services.
//!
//! Domain objects are built from JSON the same way the real client builds
//! them, so the mock only keeps the fixtures and a call log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hubkit::{
    Error, Gist, GitHubApi, Issue, Organization, RateState, Repository, Result, User,
};

/// Mock implementation of `GitHubApi` for testing.
#[derive(Default)]
pub struct MockGitHub {
    users: HashMap<String, Arc<User>>,
    repos: HashMap<(String, String), Arc<Repository>>,
    remaining: Option<u32>,
    calls: Mutex<Vec<String>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, login: &str) -> Self {
        let user: User =
            serde_json::from_value(serde_json::json!({ "login": login, "id": 1 })).unwrap();
        self.users.insert(login.to_string(), Arc::new(user));
        self
    }

    pub fn with_repo(mut self, owner: &str, name: &str) -> Self {
        let repo: Repository = serde_json::from_value(serde_json::json!({
            "id": self.repos.len() + 1,
            "name": name,
            "full_name": format!("{owner}/{name}"),
            "owner": { "login": owner, "id": 1 }
        }))
        .unwrap();
        self.repos
            .insert((owner.to_string(), name.to_string()), Arc::new(repo));
        self
    }

    pub const fn with_remaining(mut self, remaining: u32) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Calls made so far, as `method:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl GitHubApi for MockGitHub {
    async fn get_user(&self, login: &str) -> Result<Arc<User>> {
        self.record(format!("get_user:{login}"));
        self.users
            .get(login)
            .cloned()
            .ok_or_else(|| Error::UserNotFound(login.to_string()))
    }

    async fn user_repos(&self, login: &str) -> Result<Vec<Repository>> {
        self.record(format!("user_repos:{login}"));
        let mut repos: Vec<Repository> = self
            .repos
            .iter()
            .filter(|((owner, _), _)| owner == login)
            .map(|(_, repo)| Repository::clone(repo))
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    async fn user_gists(&self, login: &str) -> Result<Vec<Gist>> {
        self.record(format!("user_gists:{login}"));
        Ok(Vec::new())
    }

    async fn user_orgs(&self, login: &str) -> Result<Vec<Organization>> {
        self.record(format!("user_orgs:{login}"));
        Ok(Vec::new())
    }

    async fn get_repo(&self, owner: &str, name: &str) -> Result<Arc<Repository>> {
        self.record(format!("get_repo:{owner}/{name}"));
        self.repos
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::RepositoryNotFound(format!("{owner}/{name}")))
    }

    async fn get_issue(&self, owner: &str, name: &str, number: u64) -> Result<Issue> {
        self.record(format!("get_issue:{owner}/{name}#{number}"));
        Err(Error::IssueNotFound {
            repo: format!("{owner}/{name}"),
            number,
        })
    }

    async fn get_org(&self, name: &str) -> Result<Organization> {
        self.record(format!("get_org:{name}"));
        Err(Error::OrganizationNotFound(name.to_string()))
    }

    async fn get_gist(&self, id: &str) -> Result<Gist> {
        self.record(format!("get_gist:{id}"));
        Err(Error::GistNotFound(id.to_string()))
    }

    async fn check_limits(&self) -> Result<Arc<RateState>> {
        self.record("check_limits".to_string());
        Ok(Arc::new(RateState {
            remaining: self.remaining,
            ..RateState::default()
        }))
    }
}
