//! Blocking web agent for the SHODAN search pages.

use crate::config::{user_agent_for_alias, ProxyConfig, DEFAULT_USER_AGENT_ALIAS};
use crate::query::Query;
use reqwest::blocking::Client as HttpClient;
use shodan_core::{Result, ShodanError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// The SHODAN search URL
pub const DEFAULT_BASE_URL: &str = "http://shodan.surtri.com/";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Web agent that fetches SHODAN result pages
#[derive(Debug, Clone)]
pub struct ShodanClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: HttpClient,
    base_url: Url,
    user_agent: String,
    timeout: Duration,
}

impl ShodanClient {
    /// Create a new client using default settings
    pub fn new() -> Result<Self> {
        ShodanClientBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> ShodanClientBuilder {
        ShodanClientBuilder::new()
    }

    /// Start a new, empty query using this client
    #[must_use]
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    /// The search URL queries are built on
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The User-Agent sent with every request
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    /// Fetch `url` and return the response body as text
    pub(crate) fn get_html(&self, url: &Url) -> Result<String> {
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .http
            .get(url.as_str())
            .send()
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();

        if status.is_success() {
            return response.text().map_err(|e| self.transport_error(&e));
        }

        warn!(url = %url, status = status.as_u16(), "search page request failed");

        let body = response.text().unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            body
        };

        Err(ShodanError::Api {
            code: status.as_u16(),
            message,
        })
    }

    fn transport_error(&self, e: &reqwest::Error) -> ShodanError {
        if e.is_timeout() {
            ShodanError::Timeout(self.inner.timeout.as_secs())
        } else if e.is_connect() {
            ShodanError::Connection(e.to_string())
        } else {
            ShodanError::Http(e.to_string())
        }
    }
}

/// Builder for configuring a [`ShodanClient`]
#[derive(Debug, Clone)]
pub struct ShodanClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    user_agent_alias: Option<String>,
    proxy: ProxyConfig,
}

impl Default for ShodanClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShodanClientBuilder {
    /// Create a new builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            user_agent_alias: None,
            proxy: ProxyConfig::default(),
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the User-Agent header from a browser alias.
    ///
    /// Takes precedence over [`user_agent`](Self::user_agent).
    #[must_use]
    pub fn user_agent_alias(mut self, alias: impl Into<String>) -> Self {
        self.user_agent_alias = Some(alias.into());
        self
    }

    /// Route requests through an HTTP proxy
    #[must_use]
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ShodanClient> {
        let user_agent = self.resolve_user_agent()?;

        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ShodanError::InvalidUrl(format!("{}: {e}", self.base_url)))?;

        let mut http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(user_agent.as_str())
            .gzip(true);

        if let Some(proxy_url) = self.proxy.proxy_uri()? {
            debug!(proxy = %proxy_url, "using HTTP proxy");
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| ShodanError::Config(format!("invalid proxy: {e}")))?;
            http = http.proxy(proxy);
        }

        let http = http
            .build()
            .map_err(|e| ShodanError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(ShodanClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                user_agent,
                timeout: self.timeout,
            }),
        })
    }

    fn resolve_user_agent(&self) -> Result<String> {
        if let Some(alias) = self.user_agent_alias.as_deref() {
            return user_agent_for_alias(alias)
                .map(String::from)
                .ok_or_else(|| ShodanError::Config(format!("unknown User-Agent alias: {alias}")));
        }

        Ok(self.user_agent.clone().unwrap_or_else(|| {
            user_agent_for_alias(DEFAULT_USER_AGENT_ALIAS)
                .unwrap_or_default()
                .to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_windows_ie_agent() {
        let client = ShodanClient::new().unwrap();

        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.user_agent(), user_agent_for_alias("Windows IE 6").unwrap());
    }

    #[test]
    fn alias_takes_precedence_over_agent() {
        let client = ShodanClient::builder()
            .user_agent("Google Bot")
            .user_agent_alias("Linux Mozilla")
            .build()
            .unwrap();

        assert_eq!(client.user_agent(), user_agent_for_alias("Linux Mozilla").unwrap());

        let custom = ShodanClient::builder().user_agent("Google Bot").build().unwrap();
        assert_eq!(custom.user_agent(), "Google Bot");
    }

    #[test]
    fn rejects_unknown_alias() {
        let err = ShodanClient::builder()
            .user_agent_alias("Lynx")
            .build()
            .unwrap_err();
        assert!(matches!(err, ShodanError::Config(_)));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = ShodanClient::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, ShodanError::InvalidUrl(_)));
    }

    #[test]
    fn accepts_proxy() {
        let client = ShodanClient::builder()
            .proxy(ProxyConfig::new().host("127.0.0.1").port(3128))
            .build();
        assert!(client.is_ok());
    }
}
