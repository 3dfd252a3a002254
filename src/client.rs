//! Airtable client and low-level request layer.

use crate::error::{Error, Result};
use crate::mapper::Record;
use crate::query::QueryEncoder;
use crate::table::Table;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const DEFAULT_ROOT_URL: &str = "https://api.airtable.com";
const DEFAULT_VERSION: &str = "v0";
const DEFAULT_RATE_LIMIT: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SDK_USER_AGENT: &str = concat!("airtable-rs/", env!("CARGO_PKG_VERSION"));

/// Rate limiter shared by every request of a client.
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Builder for constructing a [`Client`].
pub struct ClientBuilder {
    api_key: String,
    base_id: String,
    root_url: String,
    version: String,
    http_client: Option<reqwest::Client>,
    rate_limit: u32,
    rate_limit_enabled: bool,
    rate_limiter: Option<Arc<Limiter>>,
    user_agent_suffix: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_id: String::new(),
            root_url: DEFAULT_ROOT_URL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            http_client: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_limit_enabled: true,
            rate_limiter: None,
            user_agent_suffix: None,
        }
    }

    /// Load settings from the environment, reading a `.env` file if present.
    ///
    /// Reads:
    /// - `AIRTABLE_API_KEY` and `AIRTABLE_BASE_ID`
    /// - `AIRTABLE_ROOT_URL` and `AIRTABLE_VERSION` (optional)
    /// - `AIRTABLE_TIMEOUT_SECS` (optional, default 30): timeout of the HTTP client
    /// - `AIRTABLE_NO_LIMIT` (optional): any non-empty value disables rate limiting
    ///
    /// Missing credentials are not an error here; requests report them.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Self::new(env::var("AIRTABLE_API_KEY").unwrap_or_default())
            .base_id(env::var("AIRTABLE_BASE_ID").unwrap_or_default());

        if let Ok(root_url) = env::var("AIRTABLE_ROOT_URL") {
            builder = builder.root_url(root_url);
        }
        if let Ok(version) = env::var("AIRTABLE_VERSION") {
            builder = builder.version(version);
        }

        let timeout_secs: u64 = env::var("AIRTABLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| Error::Setup("invalid AIRTABLE_TIMEOUT_SECS".into()))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let no_limit = env::var("AIRTABLE_NO_LIMIT").is_ok_and(|v| !v.is_empty());

        Ok(builder
            .http_client(http_client)
            .rate_limit_enabled(!no_limit))
    }

    /// Set the base id, e.g. `appXXXXXXXXXXXXXX`.
    pub fn base_id(mut self, base_id: impl Into<String>) -> Self {
        self.base_id = base_id.into();
        self
    }

    /// Set the API root URL.
    pub fn root_url(mut self, url: impl Into<String>) -> Self {
        self.root_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API version path segment.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the HTTP client used for requests. Timeouts are configured on it.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the number of requests allowed per second.
    ///
    /// Zero disables rate limiting, unless a shared limiter is set.
    pub fn rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit = per_second;
        self
    }

    /// Enable or disable rate limiting.
    pub fn rate_limit_enabled(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    /// Share an existing rate limiter, e.g. across clients of the same account.
    pub fn rate_limiter(mut self, limiter: Arc<Limiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Append `suffix` to the `airtable-rs/<version>` User-Agent.
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Build the client.
    ///
    /// Required settings are checked when a request is made.
    pub fn build(self) -> Client {
        if !self.root_url.starts_with("https://") {
            warn!(
                root_url = %self.root_url,
                "API root URL is not using HTTPS. This is insecure."
            );
        }

        let limiter = match (
            self.rate_limit_enabled,
            self.rate_limiter,
            NonZeroU32::new(self.rate_limit),
        ) {
            (false, _, _) => None,
            (true, Some(shared), _) => Some(shared),
            (true, None, Some(per_second)) => {
                Some(Arc::new(RateLimiter::direct(Quota::per_second(per_second))))
            }
            (true, None, None) => None,
        };

        let version = if self.version.is_empty() {
            DEFAULT_VERSION.to_string()
        } else {
            self.version
        };
        let root_url = if self.root_url.is_empty() {
            DEFAULT_ROOT_URL.to_string()
        } else {
            self.root_url
        };

        let user_agent = match self.user_agent_suffix {
            Some(suffix) => format!("{SDK_USER_AGENT} {suffix}"),
            None => SDK_USER_AGENT.to_string(),
        };

        Client {
            api_key: self.api_key,
            base_id: self.base_id,
            root_url,
            version,
            http_client: self.http_client,
            limiter,
            user_agent,
        }
    }
}

/// Client for one Airtable base.
///
/// Cloning is cheap and clones share the rate limiter, so every table derived
/// from a client counts against the same request budget.
///
/// # Example
///
/// ```rust,no_run
/// use airtable::{record, Client};
///
/// record! {
///     #[derive(Debug)]
///     pub struct Task {
///         pub name: String => "Name",
///         pub done: bool => "Done",
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), airtable::Error> {
///     let client = Client::builder("your-api-key")
///         .base_id("appXXXXXXXXXXXXXX")
///         .http_client(reqwest::Client::new())
///         .build();
///
///     let task = client.table::<Task>("Tasks").get("recXXXXXXXXXXXXXX").await?;
///     println!("{:?}", task.fields);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    api_key: String,
    base_id: String,
    root_url: String,
    version: String,
    http_client: Option<reqwest::Client>,
    limiter: Option<Arc<Limiter>>,
    user_agent: String,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Bind a table name to a record type.
    pub fn table<R: Record>(&self, name: impl Into<String>) -> Table<R> {
        Table::new(self.clone(), name)
    }

    /// The base id requests are sent to.
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Returns `true` if requests wait for the rate limiter.
    pub fn is_rate_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Send a GET request for `endpoint` and return the raw response body.
    ///
    /// `endpoint` is relative to the base, e.g. `Tasks` or `Tasks/recXXX`.
    /// An API error envelope is returned as [`Error::Request`], which still
    /// carries the body.
    #[instrument(skip(self, options))]
    pub async fn request_bytes(
        &self,
        endpoint: &str,
        options: Option<&(dyn QueryEncoder + Sync)>,
    ) -> Result<Vec<u8>> {
        let http_client = self.check_setup()?;
        let url = self.make_url(endpoint, options)?;
        let headers = self.headers()?;

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!(url = %url, "sending request");
        let response = http_client.get(url).headers(headers).send().await?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(status = %status, bytes = body.len(), "received response");

        if let Some(err) = Error::from_body(&body) {
            return Err(err);
        }

        if !status.is_success() {
            warn!(status = %status, "non-success status without an error envelope");
        }

        Ok(body)
    }

    fn check_setup(&self) -> Result<&reqwest::Client> {
        if self.base_id.is_empty() {
            return Err(Error::Setup("client missing base id".into()));
        }
        if self.api_key.is_empty() {
            return Err(Error::Setup("client missing API key".into()));
        }
        self.http_client
            .as_ref()
            .ok_or_else(|| Error::Setup("client missing HTTP client".into()))
    }

    fn make_url(
        &self,
        endpoint: &str,
        options: Option<&(dyn QueryEncoder + Sync)>,
    ) -> Result<Url> {
        let mut url = Url::parse(&self.root_url)
            .map_err(|e| Error::Setup(format!("invalid root URL '{}': {e}", self.root_url)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Setup(format!("root URL '{}' cannot be a base", self.root_url)))?
            .pop_if_empty()
            .push(&self.version)
            .push(&self.base_id)
            .extend(endpoint.split('/').filter(|segment| !segment.is_empty()));

        let query = options.map(|o| o.encode()).unwrap_or_default();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::Setup("API key contains invalid header characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, agent);
        }
        Ok(headers)
    }
}
