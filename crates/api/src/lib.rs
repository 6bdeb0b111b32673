pub mod error;
pub mod issues;
pub mod models;

pub use error::{ApiError, Result};
pub use issues::IssuesApi;
pub use models::{Identified, Issue, IssueState, IssueType, Label, User};

use std::future::Future;

use gitlab_issues_config::Config;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Whether a request carries the configured bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Authenticated,
    Anonymous,
}

impl AuthMode {
    pub fn is_authenticated(self) -> bool {
        matches!(self, AuthMode::Authenticated)
    }
}

/// Single-shot HTTP dispatcher. Every call is one request with no retries;
/// every failure comes back as [`ApiError::Request`] tagged with the method.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(ApiError::InvalidUrl)?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(url.to_string()));
        }

        let client = Client::builder()
            .user_agent(format!("gitlab-issues/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: url,
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::new(&config.base_url)?;
        Ok(match &config.private_token {
            Some(token) => client.with_bearer_token(token.clone()),
            None => client,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL extended with the given path segments.
    pub fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url, auth: AuthMode) -> Result<T> {
        self.request(Method::GET, url, Option::<&()>::None, None, auth)
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: Option<&B>,
        auth: AuthMode,
    ) -> Result<T> {
        self.request(Method::POST, url, body, None, auth).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: Option<&B>,
        auth: AuthMode,
    ) -> Result<T> {
        self.request(Method::PUT, url, body, None, auth).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: Url, auth: AuthMode) -> Result<T> {
        self.request(Method::DELETE, url, Option::<&()>::None, None, auth)
            .await
    }

    /// Perform one request and decode the body as `T`.
    ///
    /// Caller headers are sent as given, except that an authenticated request
    /// always overwrites `Authorization` with the configured bearer token.
    /// An empty success body decodes as JSON `null`.
    pub async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        headers: Option<&HeaderMap>,
        auth: AuthMode,
    ) -> Result<T> {
        debug!(method = %method, url = %url, auth = ?auth, "Sending request");

        let headers = self.merge_headers(&method, headers, auth)?;
        let mut req = self.client.request(method.clone(), url).headers(headers);

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|err| {
            warn!(method = %method, error = %err, "Request could not be sent");
            ApiError::request(&method, err)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(method = %method, status = status.as_u16(), "Request rejected by remote");
            return Err(ApiError::status(&method, status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::request(&method, err))?;

        let decoded = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice(b"null")
        } else {
            serde_json::from_slice(&bytes)
        };

        decoded.map_err(|err| {
            warn!(method = %method, error = %err, "Failed to parse JSON response");
            ApiError::request(&method, err)
        })
    }

    fn merge_headers(
        &self,
        method: &Method,
        extra: Option<&HeaderMap>,
        auth: AuthMode,
    ) -> Result<HeaderMap> {
        let mut headers = extra.cloned().unwrap_or_default();

        if auth.is_authenticated() {
            match &self.token {
                Some(token) => {
                    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                        .map_err(|err| ApiError::request(method, err))?;
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                None => warn!("No private token configured, sending request without credentials"),
            }
        }

        Ok(headers)
    }
}

/// Fetch a collection and return the entry whose id matches.
///
/// Linear scan over whatever `fetch` returns; a miss is
/// [`ApiError::Lookup`], never a request error.
pub async fn read_by_id<T, F, Fut>(fetch: F, id: u64) -> Result<T>
where
    T: Identified,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let items = fetch().await?;
    debug!(id, candidates = items.len(), "Searching fetched collection");

    items
        .into_iter()
        .find(|item| item.id() == id)
        .ok_or(ApiError::Lookup { id })
}
