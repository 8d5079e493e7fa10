//! HTTP core: transport session, rate-limit hooks and resource operations.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::auth::Credentials;
use crate::config::{ApiConfig, RateLimitPolicy};
use crate::error::{Error, Result};
use crate::objects::{Attach, Gist, Issue, Organization, Repository, User};
use crate::paginate::Paginator;
use crate::rate::RateTracker;
use crate::types::{AddFile, CreateGist, CreateRepository};

/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("hubkit/", env!("CARGO_PKG_VERSION"));

const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

enum Session {
    NotStarted,
    Started(reqwest::Client),
    Closed,
}

/// Everything the transport is rebuilt from.
struct SessionSettings {
    headers: HeaderMap,
    credentials: Option<Credentials>,
}

/// Owns the transport session and the rate tracker.
///
/// Lives behind an [`Arc`]; domain objects reach it through an
/// [`HttpHandle`]. Every response passes through the same hooks:
/// the before-request guard checks the quota, the after-request hook records
/// the rate-limit headers.
pub struct HttpCore {
    me: Weak<Self>,
    base_url: String,
    timeout: Option<Duration>,
    policy: RateLimitPolicy,
    settings: RwLock<SessionSettings>,
    session: RwLock<Session>,
    rates: RateTracker,
}

impl HttpCore {
    /// Create a core in the `NotStarted` state.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHeader`] if a configured header is unusable.
    pub fn new(
        config: &ApiConfig,
        policy: RateLimitPolicy,
        credentials: Option<Credentials>,
    ) -> Result<Arc<Self>> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }
        if let Some(agent) = config.user_agent.as_deref()
            && !agent.trim().is_empty()
        {
            headers.insert(USER_AGENT, header_value(agent)?);
        }

        Ok(Arc::new_cyclic(|me| Self {
            me: me.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            policy,
            settings: RwLock::new(SessionSettings {
                headers,
                credentials,
            }),
            session: RwLock::new(Session::NotStarted),
            rates: RateTracker::new(),
        }))
    }

    // === Lifecycle ===

    /// Open the transport session.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyStarted`] on a second call and
    /// [`Error::SessionClosed`] after [`close`](Self::close).
    pub fn start(&self) -> Result<()> {
        let settings = read(&self.settings);
        let mut session = write(&self.session);
        match *session {
            Session::Started(_) => Err(Error::AlreadyStarted),
            Session::Closed => Err(Error::SessionClosed),
            Session::NotStarted => {
                *session = Session::Started(build_client(&settings, self.timeout)?);
                debug!(base_url = %self.base_url, "session started");
                Ok(())
            }
        }
    }

    /// Release the transport session. Later calls fail with
    /// [`Error::SessionClosed`].
    pub fn close(&self) {
        *write(&self.session) = Session::Closed;
        debug!("session closed");
    }

    /// Drop a started session so `start` can be retried.
    pub(crate) fn abort_start(&self) {
        let mut session = write(&self.session);
        if matches!(*session, Session::Started(_)) {
            *session = Session::NotStarted;
        }
    }

    /// Fail unless the session is started and open.
    ///
    /// # Errors
    /// Returns [`Error::NotStarted`] or [`Error::SessionClosed`].
    pub fn ensure_open(&self) -> Result<()> {
        self.client().map(|_| ())
    }

    /// Whether the session is started and open.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.ensure_open().is_ok()
    }

    fn client(&self) -> Result<reqwest::Client> {
        match &*read(&self.session) {
            Session::Started(client) => Ok(client.clone()),
            Session::NotStarted => Err(Error::NotStarted),
            Session::Closed => Err(Error::SessionClosed),
        }
    }

    // === Settings ===

    /// Replace the credentials, rebuilding a started transport. Headers and
    /// the rate-limit policy carry over. The new credentials are not
    /// validated here.
    ///
    /// # Errors
    /// Returns error if the transport can't be rebuilt.
    pub fn update_auth(&self, credentials: Option<Credentials>) -> Result<()> {
        let mut settings = write(&self.settings);
        settings.credentials = credentials;
        self.rebuild(&settings)
    }

    /// Merge `headers` into the extra headers, or replace them when `flush`
    /// is set, and rebuild a started transport.
    ///
    /// # Errors
    /// Returns error if the transport can't be rebuilt.
    pub fn update_headers(&self, headers: HeaderMap, flush: bool) -> Result<()> {
        let mut settings = write(&self.settings);
        if flush {
            settings.headers = headers;
        } else {
            settings.headers.extend(headers);
        }
        self.rebuild(&settings)
    }

    fn rebuild(&self, settings: &SessionSettings) -> Result<()> {
        let mut session = write(&self.session);
        if let Session::Started(client) = &mut *session {
            *client = build_client(settings, self.timeout)?;
            debug!("session rebuilt");
        }
        Ok(())
    }

    /// Whether credentials are configured.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        read(&self.settings).credentials.is_some()
    }

    /// The configured credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        read(&self.settings).credentials.clone()
    }

    fn require_auth(&self) -> Result<()> {
        if self.has_auth() {
            Ok(())
        } else {
            Err(Error::NoAuthProvided)
        }
    }

    /// The rate tracker fed by this core's responses.
    #[must_use]
    pub const fn rates(&self) -> &RateTracker {
        &self.rates
    }

    /// A non-owning handle to this core.
    #[must_use]
    pub fn handle(&self) -> HttpHandle {
        HttpHandle(self.me.clone())
    }

    // === Request plumbing ===

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        self.request_url(method, &format!("{}{}", self.base_url, path))
    }

    pub(crate) fn request_url(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        Ok(self.client()?.request(method, url))
    }

    /// Send a request through the rate-limit hooks.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.before_request().await?;
        self.send_budgeted(request).await
    }

    /// Send a request whose quota the caller already checked up front.
    ///
    /// Skips the near-limit guard but still records the rate headers.
    pub(crate) async fn send_budgeted(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        self.rates.record(response.headers());
        debug!(status = %response.status(), url = %response.url(), "response received");

        if response.status() == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|v| v == "0")
        {
            return Err(Error::Ratelimited {
                reset_at: self.rates.snapshot().reset_at,
            });
        }

        Ok(response)
    }

    async fn before_request(&self) -> Result<()> {
        let state = self.rates.snapshot();
        if !state.is_near_limit() {
            return Ok(());
        }

        let wait = state.wait_duration(Utc::now());
        if wait.is_zero() {
            return Ok(());
        }

        match self.policy {
            RateLimitPolicy::Fail => Err(Error::Ratelimited {
                reset_at: state.reset_at,
            }),
            RateLimitPolicy::Wait => {
                info!(
                    seconds = wait.as_secs(),
                    "rate limit nearly exhausted, sleeping until reset"
                );
                tokio::time::sleep(wait).await;
                Ok(())
            }
        }
    }

    /// Decode a response body and attach this core's handle.
    pub(crate) async fn parse<T: DeserializeOwned + Attach>(
        &self,
        response: Response,
    ) -> Result<T> {
        let bytes = response.bytes().await?;
        let mut value: T = serde_json::from_slice(&bytes)?;
        value.attach(&self.handle());
        Ok(value)
    }

    async fn get(&self, path: &str) -> Result<Response> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn with_body<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        self.send(self.request(method, path)?.json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Response> {
        self.send(self.request(Method::DELETE, path)?).await
    }

    async fn paginate<T>(
        &self,
        path: &str,
        failure: impl Fn() -> Error + Send + Sync,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Attach + Send,
    {
        let response = self.get(path).await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), path, "collection fetch failed");
            return Err(failure());
        }
        Paginator::new(self, response, failure)?.exhaust().await
    }

    // === Users ===

    /// The authenticated user.
    ///
    /// # Errors
    /// Returns [`Error::NoAuthProvided`] without credentials and
    /// [`Error::InvalidToken`] if they are rejected.
    #[instrument(skip(self))]
    pub async fn get_self(&self) -> Result<User> {
        self.require_auth()?;
        let response = self.get("/user").await?;
        if !response.status().is_success() {
            return Err(Error::InvalidToken);
        }
        self.parse(response).await
    }

    /// A user by login.
    ///
    /// # Errors
    /// Returns [`Error::UserNotFound`] on any non-2xx response.
    #[instrument(skip(self))]
    pub async fn get_user(&self, login: &str) -> Result<User> {
        let response = self.get(&format!("/users/{login}")).await?;
        if !response.status().is_success() {
            return Err(Error::UserNotFound(login.to_string()));
        }
        self.parse(response).await
    }

    /// Every public repository of a user.
    ///
    /// # Errors
    /// Returns [`Error::UserNotFound`], [`Error::WillExceedRatelimit`] or
    /// [`Error::MalformedLinkHeader`].
    #[instrument(skip(self))]
    pub async fn get_user_repos(&self, login: &str) -> Result<Vec<Repository>> {
        self.paginate(&format!("/users/{login}/repos"), || {
            Error::UserNotFound(login.to_string())
        })
        .await
    }

    /// Every public gist of a user.
    ///
    /// # Errors
    /// Same as [`get_user_repos`](Self::get_user_repos).
    #[instrument(skip(self))]
    pub async fn get_user_gists(&self, login: &str) -> Result<Vec<Gist>> {
        self.paginate(&format!("/users/{login}/gists"), || {
            Error::UserNotFound(login.to_string())
        })
        .await
    }

    /// Every public organization membership of a user.
    ///
    /// # Errors
    /// Same as [`get_user_repos`](Self::get_user_repos).
    #[instrument(skip(self))]
    pub async fn get_user_orgs(&self, login: &str) -> Result<Vec<Organization>> {
        self.paginate(&format!("/users/{login}/orgs"), || {
            Error::UserNotFound(login.to_string())
        })
        .await
    }

    // === Repositories ===

    /// A repository by owner and name.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryNotFound`] on any non-2xx response.
    #[instrument(skip(self))]
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<Repository> {
        let response = self.get(&format!("/repos/{owner}/{name}")).await?;
        if !response.status().is_success() {
            return Err(Error::RepositoryNotFound(format!("{owner}/{name}")));
        }
        self.parse(response).await
    }

    /// An issue by number.
    ///
    /// # Errors
    /// Returns [`Error::IssueNotFound`] on any non-2xx response.
    #[instrument(skip(self))]
    pub async fn get_repo_issue(&self, owner: &str, name: &str, number: u64) -> Result<Issue> {
        let response = self
            .get(&format!("/repos/{owner}/{name}/issues/{number}"))
            .await?;
        if !response.status().is_success() {
            return Err(Error::IssueNotFound {
                repo: format!("{owner}/{name}"),
                number,
            });
        }
        self.parse(response).await
    }

    /// Create a repository for the authenticated user.
    ///
    /// # Errors
    /// Returns [`Error::NoAuthProvided`] on 401 or without credentials,
    /// [`Error::RepositoryAlreadyExists`] otherwise.
    #[instrument(skip(self, repo), fields(name = %repo.name))]
    pub async fn create_repo(&self, repo: &CreateRepository) -> Result<Repository> {
        self.require_auth()?;
        let response = self.with_body(Method::POST, "/user/repos", repo).await?;
        match response.status() {
            s if s.is_success() => self.parse(response).await,
            StatusCode::UNAUTHORIZED => Err(Error::NoAuthProvided),
            _ => Err(Error::RepositoryAlreadyExists(repo.name.clone())),
        }
    }

    /// Delete a repository.
    ///
    /// # Errors
    /// Returns [`Error::MissingPermissions`] on 403,
    /// [`Error::RepositoryNotFound`] otherwise.
    #[instrument(skip(self))]
    pub async fn delete_repo(&self, owner: &str, name: &str) -> Result<()> {
        self.require_auth()?;
        let response = self.delete(&format!("/repos/{owner}/{name}")).await?;
        match response.status().as_u16() {
            204..=299 => Ok(()),
            403 => Err(Error::MissingPermissions),
            _ => Err(Error::RepositoryNotFound(format!("{owner}/{name}"))),
        }
    }

    /// Add a file to a repository.
    ///
    /// # Errors
    /// Returns [`Error::NoAuthProvided`] on 401, [`Error::FileAlreadyExists`]
    /// on 409 or 422 and [`Error::RepositoryNotFound`] otherwise.
    #[instrument(skip(self, file), fields(path = %file.path))]
    pub async fn add_file(&self, owner: &str, repo: &str, file: &AddFile) -> Result<()> {
        self.require_auth()?;
        let path = format!("/repos/{owner}/{repo}/contents/{}", file.path.trim_start_matches('/'));
        let response = self.with_body(Method::PUT, &path, &file.body()).await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(Error::NoAuthProvided),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(Error::FileAlreadyExists(file.path.clone()))
            }
            _ => Err(Error::RepositoryNotFound(format!("{owner}/{repo}"))),
        }
    }

    // === Gists ===

    /// A gist by ID.
    ///
    /// # Errors
    /// Returns [`Error::GistNotFound`] on any non-2xx response.
    #[instrument(skip(self))]
    pub async fn get_gist(&self, id: &str) -> Result<Gist> {
        let response = self.get(&format!("/gists/{id}")).await?;
        if !response.status().is_success() {
            return Err(Error::GistNotFound(id.to_string()));
        }
        self.parse(response).await
    }

    /// Create a gist.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] unless GitHub answers 201.
    #[instrument(skip(self, gist), fields(files = gist.files.len()))]
    pub async fn create_gist(&self, gist: &CreateGist) -> Result<Gist> {
        self.require_auth()?;
        let response = self.with_body(Method::POST, "/gists", &gist.body()).await?;
        if response.status() != StatusCode::CREATED {
            return Err(Error::InvalidToken);
        }
        self.parse(response).await
    }

    /// Delete a gist.
    ///
    /// # Errors
    /// Returns [`Error::MissingPermissions`] on 403, [`Error::GistNotFound`]
    /// on anything other than 204.
    #[instrument(skip(self))]
    pub async fn delete_gist(&self, id: &str) -> Result<()> {
        self.require_auth()?;
        let response = self.delete(&format!("/gists/{id}")).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::FORBIDDEN => Err(Error::MissingPermissions),
            _ => Err(Error::GistNotFound(id.to_string())),
        }
    }

    // === Organizations ===

    /// An organization by login.
    ///
    /// # Errors
    /// Returns [`Error::OrganizationNotFound`] on any non-2xx response.
    #[instrument(skip(self))]
    pub async fn get_org(&self, name: &str) -> Result<Organization> {
        let response = self.get(&format!("/orgs/{name}")).await?;
        if !response.status().is_success() {
            return Err(Error::OrganizationNotFound(name.to_string()));
        }
        self.parse(response).await
    }

    // === Diagnostics ===

    /// Round-trip time of a request to the API root.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn latency(&self) -> Result<Duration> {
        let request = self.request(Method::GET, "/")?;
        let started = Instant::now();
        self.send(request).await?;
        Ok(started.elapsed())
    }
}

impl std::fmt::Debug for HttpCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*read(&self.session) {
            Session::NotStarted => "not started",
            Session::Started(_) => "started",
            Session::Closed => "closed",
        };
        f.debug_struct("HttpCore")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .field("session", &state)
            .field("credentials", &read(&self.settings).credentials)
            .finish_non_exhaustive()
    }
}

/// Non-owning back-reference from a domain object to the [`HttpCore`].
#[derive(Clone, Default)]
pub struct HttpHandle(Weak<HttpCore>);

impl HttpHandle {
    /// The core, if its owner is still alive.
    ///
    /// # Errors
    /// Returns [`Error::SessionClosed`] once the core is dropped.
    pub fn upgrade(&self) -> Result<Arc<HttpCore>> {
        self.0.upgrade().ok_or(Error::SessionClosed)
    }
}

impl std::fmt::Debug for HttpHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HttpHandle")
            .field(&if self.0.strong_count() > 0 { "live" } else { "detached" })
            .finish()
    }
}

fn build_client(settings: &SessionSettings, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    headers.extend(settings.headers.clone());
    ensure_user_agent(&mut headers);

    if let Some(credentials) = &settings.credentials {
        let encoded = BASE64.encode(format!("{}:{}", credentials.username(), credentials.token()));
        let mut value = header_value(&format!("Basic {encoded}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn ensure_user_agent(headers: &mut HeaderMap) {
    let missing = headers
        .get(USER_AGENT)
        .is_none_or(|agent| agent.as_bytes().iter().all(u8::is_ascii_whitespace));
    if missing {
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(e.to_string()))
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
