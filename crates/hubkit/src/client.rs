//! The client facade: lifecycle, caching and the public operations.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, instrument};

use crate::auth::Credentials;
use crate::cache::LruCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::HttpCore;
use crate::objects::{Gist, Issue, Organization, RepoKey, Repository, User};
use crate::rate::RateState;
use crate::traits::GitHubApi;
use crate::types::{AddFile, CreateGist, CreateRepository};

/// Most users a client will cache.
pub const USER_CACHE_CEILING: usize = 30;

/// Most repositories a client will cache.
pub const REPO_CACHE_CEILING: usize = 50;

/// GitHub API client.
///
/// Call [`start`](Self::start) before anything else. Users and repositories
/// are cached by login and `owner/name`; repeated lookups return the same
/// [`Arc`] without touching the network.
///
/// Two concurrent lookups of the same uncached key may both reach GitHub;
/// the later result wins the cache slot.
pub struct Client {
    http: Arc<HttpCore>,
    user_cache: Mutex<LruCache<String, Arc<User>>>,
    repo_cache: Mutex<LruCache<RepoKey, Arc<Repository>>>,
    /// Login GitHub reported for the credentials, which may differ in case
    /// from the configured username.
    self_login: Mutex<Option<String>>,
    started: AtomicBool,
}

impl Client {
    /// Create a client. Pass `None` for anonymous access.
    ///
    /// # Errors
    /// Returns error if a configured header is invalid.
    pub fn new(config: &Config, credentials: Option<Credentials>) -> Result<Self> {
        let http = HttpCore::new(&config.api, config.rate_limit.policy, credentials)?;
        Ok(Self {
            http,
            user_cache: Mutex::new(LruCache::with_ceiling(
                config.cache.user_cache_size,
                USER_CACHE_CEILING,
            )),
            repo_cache: Mutex::new(LruCache::with_ceiling(
                config.cache.repo_cache_size,
                REPO_CACHE_CEILING,
            )),
            self_login: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// Create a client with credentials from `GITHUB_USERNAME` and
    /// `GITHUB_TOKEN`, anonymous if neither is set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAuthCombination`] if only one is set.
    pub fn from_env(config: &Config) -> Result<Self> {
        Self::new(config, Credentials::from_env()?)
    }

    // === Lifecycle ===

    /// Open the session and, with credentials, validate them.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyStarted`] on a second call. A rejected
    /// credential returns [`Error::InvalidToken`] and leaves the client
    /// not started.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        if self.is_started() {
            return Err(Error::AlreadyStarted);
        }
        self.http.start()?;

        if self.http.has_auth() {
            match self.http.get_self().await {
                Ok(user) => self.remember_self(&Arc::new(user)),
                Err(e) => {
                    self.http.abort_start();
                    return Err(e);
                }
            }
        }

        self.started.store(true, Ordering::Release);
        debug!(auth = self.http.has_auth(), "client started");
        Ok(())
    }

    /// Close the session and drop the caches.
    pub fn close(&self) {
        self.http.close();
        *lock(&self.self_login) = None;
        lock(&self.user_cache).clear();
        lock(&self.repo_cache).clear();
    }

    /// Whether [`start`](Self::start) succeeded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Whether credentials are configured.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.http.has_auth()
    }

    fn ensure_started(&self) -> Result<()> {
        if !self.is_started() {
            return Err(Error::NotStarted);
        }
        self.http.ensure_open()
    }

    /// Replace the credentials and validate them against `/user`. On failure
    /// the previous credentials are restored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] if GitHub rejects the new token.
    #[instrument(skip(self, token))]
    pub async fn update_auth(&self, username: &str, token: SecretString) -> Result<Arc<User>> {
        self.ensure_started()?;
        let previous = self.http.credentials();
        self.http
            .update_auth(Some(Credentials::new(username, token)))?;

        match self.http.get_self().await {
            Ok(user) => {
                let user = Arc::new(user);
                self.remember_self(&user);
                Ok(user)
            }
            Err(e) => {
                self.http.update_auth(previous)?;
                Err(e)
            }
        }
    }

    // === Cached lookups ===

    async fn cached<K, V, F>(cache: &Mutex<LruCache<K, Arc<V>>>, key: K, fetch: F) -> Result<Arc<V>>
    where
        K: Eq + Hash + Clone,
        F: Future<Output = Result<V>>,
    {
        let hit = lock(cache).get(&key).cloned();
        if let Some(value) = hit {
            return Ok(value);
        }

        let value = Arc::new(fetch.await?);
        lock(cache).put(key, Arc::clone(&value));
        Ok(value)
    }

    fn remember_self(&self, user: &Arc<User>) {
        *lock(&self.self_login) = Some(user.login.clone());
        lock(&self.user_cache).put(user.login.clone(), Arc::clone(user));
    }

    /// The authenticated user, cached under the login GitHub returned.
    ///
    /// # Errors
    /// Returns [`Error::NoAuthProvided`] without credentials.
    pub async fn get_self(&self) -> Result<Arc<User>> {
        self.ensure_started()?;
        if !self.http.has_auth() {
            return Err(Error::NoAuthProvided);
        }

        let login = lock(&self.self_login).clone();
        let hit = login.and_then(|login| lock(&self.user_cache).get(&login).cloned());
        if let Some(user) = hit {
            return Ok(user);
        }

        let user = Arc::new(self.http.get_self().await?);
        self.remember_self(&user);
        Ok(user)
    }

    /// A user by login.
    ///
    /// # Errors
    /// Returns [`Error::UserNotFound`] if the user doesn't exist.
    pub async fn get_user(&self, login: &str) -> Result<Arc<User>> {
        self.ensure_started()?;
        Self::cached(&self.user_cache, login.to_string(), self.http.get_user(login)).await
    }

    /// A repository by owner and name.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryNotFound`] if it is private or missing.
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<Arc<Repository>> {
        self.ensure_started()?;
        Self::cached(
            &self.repo_cache,
            RepoKey::new(owner, name),
            self.http.get_repo(owner, name),
        )
        .await
    }

    // === Uncached operations ===

    /// An issue by number.
    ///
    /// # Errors
    /// Returns [`Error::IssueNotFound`] if it doesn't exist.
    pub async fn get_issue(&self, owner: &str, name: &str, number: u64) -> Result<Issue> {
        self.ensure_started()?;
        self.http.get_repo_issue(owner, name, number).await
    }

    /// An organization by login.
    ///
    /// # Errors
    /// Returns [`Error::OrganizationNotFound`] if it doesn't exist.
    pub async fn get_org(&self, name: &str) -> Result<Organization> {
        self.ensure_started()?;
        self.http.get_org(name).await
    }

    /// A gist by ID.
    ///
    /// # Errors
    /// Returns [`Error::GistNotFound`] if it doesn't exist.
    pub async fn get_gist(&self, id: &str) -> Result<Gist> {
        self.ensure_started()?;
        self.http.get_gist(id).await
    }

    /// Create a repository for the authenticated user.
    ///
    /// # Errors
    /// Returns [`Error::NoAuthProvided`] or [`Error::RepositoryAlreadyExists`].
    pub async fn create_repo(&self, repo: &CreateRepository) -> Result<Repository> {
        self.ensure_started()?;
        self.http.create_repo(repo).await
    }

    /// Delete a repository and evict it from the cache.
    ///
    /// # Errors
    /// Returns [`Error::MissingPermissions`] or [`Error::RepositoryNotFound`].
    pub async fn delete_repo(&self, owner: &str, name: &str) -> Result<()> {
        self.ensure_started()?;
        self.http.delete_repo(owner, name).await?;
        lock(&self.repo_cache).remove(&RepoKey::new(owner, name));
        Ok(())
    }

    /// Create a gist.
    ///
    /// # Errors
    /// Returns [`Error::NoAuthProvided`] or [`Error::InvalidToken`].
    pub async fn create_gist(&self, gist: &CreateGist) -> Result<Gist> {
        self.ensure_started()?;
        self.http.create_gist(gist).await
    }

    /// Delete a gist.
    ///
    /// # Errors
    /// Returns [`Error::MissingPermissions`] or [`Error::GistNotFound`].
    pub async fn delete_gist(&self, id: &str) -> Result<()> {
        self.ensure_started()?;
        self.http.delete_gist(id).await
    }

    /// Add a file to a repository.
    ///
    /// # Errors
    /// Returns [`Error::FileAlreadyExists`] or [`Error::RepositoryNotFound`].
    pub async fn add_file(&self, owner: &str, repo: &str, file: &AddFile) -> Result<()> {
        self.ensure_started()?;
        self.http.add_file(owner, repo, file).await
    }

    // === Diagnostics ===

    /// The latest rate-limit snapshot.
    ///
    /// # Errors
    /// Returns [`Error::NotStarted`] before `start`.
    pub fn check_limits(&self) -> Result<Arc<RateState>> {
        self.ensure_started()?;
        Ok(self.http.rates().snapshot())
    }

    /// Round-trip time to the API root.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn latency(&self) -> Result<Duration> {
        self.ensure_started()?;
        self.http.latency().await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("http", &self.http)
            .field("started", &self.is_started())
            .field("cached_users", &lock(&self.user_cache).len())
            .field("cached_repos", &lock(&self.repo_cache).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// === Trait Implementation ===

impl GitHubApi for Client {
    async fn get_user(&self, login: &str) -> Result<Arc<User>> {
        self.get_user(login).await
    }

    async fn user_repos(&self, login: &str) -> Result<Vec<Repository>> {
        self.get_user(login).await?.repos().await
    }

    async fn user_gists(&self, login: &str) -> Result<Vec<Gist>> {
        self.get_user(login).await?.gists().await
    }

    async fn user_orgs(&self, login: &str) -> Result<Vec<Organization>> {
        self.get_user(login).await?.orgs().await
    }

    async fn get_repo(&self, owner: &str, name: &str) -> Result<Arc<Repository>> {
        self.get_repo(owner, name).await
    }

    async fn get_issue(&self, owner: &str, name: &str, number: u64) -> Result<Issue> {
        self.get_issue(owner, name, number).await
    }

    async fn get_org(&self, name: &str) -> Result<Organization> {
        self.get_org(name).await
    }

    async fn get_gist(&self, id: &str) -> Result<Gist> {
        self.get_gist(id).await
    }

    async fn check_limits(&self) -> Result<Arc<RateState>> {
        self.check_limits()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, CacheConfig};
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> Config {
        Config {
            api: ApiConfig {
                base_url: base_url.to_string(),
                ..ApiConfig::default()
            },
            ..Config::default()
        }
    }

    /// Create a started anonymous client pointing to the mock server.
    async fn test_client(base_url: &str) -> Client {
        let client = Client::new(&test_config(base_url), None).unwrap();
        client.start().await.unwrap();
        client
    }

    fn octocat() -> Option<Credentials> {
        Some(Credentials::new("octocat", "test-token"))
    }

    fn user_json(login: &str) -> serde_json::Value {
        serde_json::json!({ "login": login, "id": 1 })
    }

    fn repo_json(owner: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "name": name,
            "owner": { "login": owner, "id": 1 },
            "license": { "key": "mit", "name": "MIT License" }
        })
    }

    // === Lifecycle ===

    #[tokio::test]
    async fn test_operations_require_start() {
        let client = Client::new(&test_config("http://localhost:1"), None).unwrap();

        assert!(!client.is_started());
        assert!(matches!(client.get_user("octocat").await, Err(Error::NotStarted)));
        assert!(matches!(client.check_limits(), Err(Error::NotStarted)));
    }

    #[tokio::test]
    async fn test_start_twice_is_error() {
        let client = test_client("http://localhost:1").await;
        assert!(matches!(client.start().await, Err(Error::AlreadyStarted)));
        assert!(client.is_started());
    }

    #[tokio::test]
    async fn test_start_validates_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::new(&test_config(&mock_server.uri()), octocat()).unwrap();
        client.start().await.unwrap();

        assert!(client.has_auth());
        // get_self is served from the cache filled during start.
        let me = client.get_self().await.unwrap();
        assert_eq!(me.login, "octocat");
    }

    #[tokio::test]
    async fn test_get_self_uses_login_returned_by_github() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let credentials = Some(Credentials::new("OctoCat", "test-token"));
        let client = Client::new(&test_config(&mock_server.uri()), credentials).unwrap();
        client.start().await.unwrap();

        let me = client.get_self().await.unwrap();
        let again = client.get_self().await.unwrap();
        let by_login = client.get_user("octocat").await.unwrap();

        assert_eq!(me.login, "octocat");
        assert!(Arc::ptr_eq(&me, &again));
        assert!(Arc::ptr_eq(&me, &by_login));
    }

    #[tokio::test]
    async fn test_invalid_token_leaves_client_stopped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = Client::new(&test_config(&mock_server.uri()), octocat()).unwrap();

        assert!(matches!(client.start().await, Err(Error::InvalidToken)));
        assert!(!client.is_started());
        assert!(matches!(client.get_user("octocat").await, Err(Error::NotStarted)));

        // The session was released, so start can be retried.
        assert!(matches!(client.start().await, Err(Error::InvalidToken)));
    }

    #[tokio::test]
    async fn test_close_rejects_further_calls() {
        let client = test_client("http://localhost:1").await;
        client.close();

        assert!(matches!(client.get_org("github").await, Err(Error::SessionClosed)));
    }

    #[tokio::test]
    async fn test_get_self_without_auth() {
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri()).await;
        assert!(matches!(client.get_self().await, Err(Error::NoAuthProvided)));
        assert!(matches!(client.delete_repo("o", "r").await, Err(Error::NoAuthProvided)));
    }

    // === Caching ===

    #[tokio::test]
    async fn test_get_user_is_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri()).await;
        let first = client.get_user("octocat").await.unwrap();
        let second = client.get_user("octocat").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_get_repo_is_cached_by_owner_and_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("octocat", "hello")))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/hubber/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("hubber", "hello")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri()).await;
        let a = client.get_repo("octocat", "hello").await.unwrap();
        let b = client.get_repo("hubber", "hello").await.unwrap();
        let a_again = client.get_repo("octocat", "hello").await.unwrap();

        assert!(Arc::ptr_eq(&a, &a_again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.license.as_deref(), Some("MIT License"));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri()).await;
        assert!(client.get_user("ghost").await.is_err());
        assert!(client.get_user("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_cache_size_zero_disables_caching() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = Config {
            cache: CacheConfig {
                user_cache_size: 0,
                repo_cache_size: 0,
            },
            ..test_config(&mock_server.uri())
        };
        let client = Client::new(&config, None).unwrap();
        client.start().await.unwrap();

        client.get_user("octocat").await.unwrap();
        client.get_user("octocat").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_repo_evicts_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("octocat", "hello")))
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/octocat/hello"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::new(&test_config(&mock_server.uri()), octocat()).unwrap();
        client.start().await.unwrap();

        client.get_repo("octocat", "hello").await.unwrap();
        client.delete_repo("octocat", "hello").await.unwrap();
        client.get_repo("octocat", "hello").await.unwrap();
    }

    // === Auth updates ===

    #[tokio::test]
    async fn test_update_auth_restores_on_failure() {
        let mock_server = MockServer::start().await;

        // octocat:test-token
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(wiremock::matchers::header(
                "authorization",
                "Basic b2N0b2NhdDp0ZXN0LXRva2Vu",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = Client::new(&test_config(&mock_server.uri()), octocat()).unwrap();
        client.start().await.unwrap();

        let result = client
            .update_auth("hubber", SecretString::from("bad-token"))
            .await;
        assert!(matches!(result, Err(Error::InvalidToken)));
        assert_eq!(client.http.credentials().unwrap().username(), "octocat");
    }

    #[tokio::test]
    async fn test_update_auth_requires_start() {
        let client = Client::new(&test_config("http://localhost:1"), None).unwrap();
        let result = client.update_auth("octocat", SecretString::from("t")).await;
        assert!(matches!(result, Err(Error::NotStarted)));
    }

    // === Diagnostics ===

    #[tokio::test]
    async fn test_check_limits_reflects_last_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orgs/github"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-remaining", "4321")
                    .insert_header("x-ratelimit-limit", "5000")
                    .set_body_json(serde_json::json!({ "login": "github", "id": 9919 })),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri()).await;
        assert_eq!(*client.check_limits().unwrap(), RateState::default());

        client.get_org("github").await.unwrap();
        let limits = client.check_limits().unwrap();
        assert_eq!(limits.remaining, Some(4321));
        assert_eq!(limits.total, Some(5000));
    }

    #[tokio::test]
    async fn test_user_repos_through_trait() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("octocat")))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([repo_json("octocat", "hello")])),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri()).await;
        let repos = GitHubApi::user_repos(&client, "octocat").await.unwrap();

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "hello");
    }
}
