//! Multi-page collection retrieval driven by the `Link` header.
//!
//! GitHub Link headers look like:
//! `<https://api.github.com/user/583231/repos?page=2>; rel="next", <https://api.github.com/user/583231/repos?page=5>; rel="last"`
//!
//! The page count comes from the `last` relation. Pages are then requested
//! one after another in ascending order so the quota stays accurate between
//! requests.

use std::marker::PhantomData;

use reqwest::header::LINK;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::HttpCore;
use crate::objects::Attach;

/// URLs of the relations found in a `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// `rel="first"`.
    pub first: Option<String>,
    /// `rel="prev"`.
    pub prev: Option<String>,
    /// `rel="next"`.
    pub next: Option<String>,
    /// `rel="last"`.
    pub last: Option<String>,
}

/// Parse a `Link` header into its relations. Unknown relations are ignored.
///
/// # Errors
/// Returns [`Error::MalformedLinkHeader`] if an entry has no `<url>` or no
/// `rel` parameter.
pub fn parse_link_header(link_header: &str) -> Result<PageLinks> {
    let mut links = PageLinks::default();

    for part in link_header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';').map(str::trim) {
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            }
        }

        let (Some(url), Some(rel)) = (url, rel) else {
            return Err(Error::MalformedLinkHeader(link_header.to_string()));
        };

        let slot = match rel {
            "first" => &mut links.first,
            "prev" => &mut links.prev,
            "next" => &mut links.next,
            "last" => &mut links.last,
            _ => continue,
        };
        *slot = Some(url.to_string());
    }

    Ok(links)
}

/// A page URL with the page number cut out.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageTemplate {
    prefix: String,
    suffix: String,
}

impl PageTemplate {
    /// Split `url` around its `page` query value.
    fn parse(url: &str) -> Option<(Self, u32)> {
        let query_start = url.find('?')? + 1;
        let mut offset = query_start;

        for param in url[query_start..].split('&') {
            if let Some(value) = param.strip_prefix("page=") {
                let start = offset + "page=".len();
                let end = start + value.find('#').unwrap_or(value.len());
                let page = url[start..end].parse().ok()?;
                let template = Self {
                    prefix: url[..start].to_string(),
                    suffix: url[end..].to_string(),
                };
                return Some((template, page));
            }
            offset += param.len() + 1;
        }

        None
    }

    fn url(&self, page: u32) -> String {
        format!("{}{page}{}", self.prefix, self.suffix)
    }
}

#[derive(Debug, Clone)]
struct PagePlan {
    template: PageTemplate,
    max_page: u32,
}

impl PagePlan {
    fn from_links(link_header: &str) -> Result<Self> {
        let malformed = || Error::MalformedLinkHeader(link_header.to_string());
        let links = parse_link_header(link_header)?;

        let last = links.last.as_deref().ok_or_else(malformed)?;
        let (last_template, max_page) = PageTemplate::parse(last).ok_or_else(malformed)?;

        let template = match links.first.as_deref().or(links.next.as_deref()) {
            Some(url) => PageTemplate::parse(url).ok_or_else(malformed)?.0,
            None => last_template,
        };

        Ok(Self { template, max_page })
    }
}

/// Collects every item of a paginated collection into `Vec<T>`.
pub struct Paginator<'a, T> {
    http: &'a HttpCore,
    first: Option<Response>,
    plan: Option<PagePlan>,
    failure: Box<dyn Fn() -> Error + Send + Sync + 'a>,
    exhausted: bool,
    _items: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned + Attach + Send> Paginator<'a, T> {
    /// Build a paginator from the response to the first request.
    ///
    /// `failure` produces the error reported when a page answers non-2xx.
    ///
    /// # Errors
    /// Returns [`Error::MalformedLinkHeader`] if the `Link` header has no
    /// usable `last` relation.
    pub fn new(
        http: &'a HttpCore,
        first: Response,
        failure: impl Fn() -> Error + Send + Sync + 'a,
    ) -> Result<Self> {
        let plan = match first.headers().get(LINK) {
            Some(value) => {
                let header = value
                    .to_str()
                    .map_err(|e| Error::MalformedLinkHeader(e.to_string()))?;
                Some(PagePlan::from_links(header)?)
            }
            None => None,
        };

        Ok(Self {
            http,
            first: Some(first),
            plan,
            failure: Box::new(failure),
            exhausted: false,
            _items: PhantomData,
        })
    }

    /// Whether the collection spans several pages.
    #[must_use]
    pub const fn should_paginate(&self) -> bool {
        self.plan.is_some()
    }

    /// Number of pages, `1` for a single-page collection.
    #[must_use]
    pub fn max_page(&self) -> u32 {
        self.plan.as_ref().map_or(1, |plan| plan.max_page)
    }

    /// Whether [`exhaust`](Self::exhaust) already ran to completion.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetch and parse every item. Returns an empty list once exhausted.
    ///
    /// # Errors
    /// Returns [`Error::WillExceedRatelimit`] before any request if the
    /// remaining quota is smaller than the page count, the `failure` error
    /// for a non-2xx page, or a transport/parse error.
    pub async fn exhaust(&mut self) -> Result<Vec<T>> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let Some(PagePlan { template, max_page }) = self.plan.clone() else {
            self.exhausted = true;
            return match self.first.take() {
                Some(response) => self.http.parse(response).await,
                None => Ok(Vec::new()),
            };
        };
        self.first = None;

        let rates = self.http.rates().snapshot();
        if rates.will_exceed(max_page) {
            return Err(Error::WillExceedRatelimit {
                required: max_page,
                remaining: rates.remaining.unwrap_or_default(),
            });
        }

        let mut items = Vec::new();
        for page in 1..=max_page {
            debug!(page, max_page, "fetching page");
            let request = self.http.request_url(Method::GET, &template.url(page))?;
            // The whole batch was budgeted above.
            let response = self.http.send_budgeted(request).await?;
            if !response.status().is_success() {
                return Err((self.failure)());
            }
            let mut batch: Vec<T> = self.http.parse(response).await?;
            items.append(&mut batch);
        }

        self.exhausted = true;
        Ok(items)
    }
}

impl<T> std::fmt::Debug for Paginator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("plan", &self.plan)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
