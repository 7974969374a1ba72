//! Search queries and their paginated results.

use crate::client::ShodanClient;
use crate::parse::parse_page;
use shodan_core::{HasPages, Page, PageCache, Result, ShodanError};
use std::num::NonZeroUsize;
use tracing::debug;
use url::Url;

/// Hosts listed on each result page
pub const RESULTS_PER_PAGE: usize = 20;

/// A SHODAN search.
///
/// Criteria are combined into a single query expression. Result pages are
/// fetched lazily through [`HasPages`] and cached until the criteria change.
///
/// # Example
///
/// ```rust,ignore
/// use shodan_client::ShodanClient;
/// use shodan_core::HasPages;
///
/// let client = ShodanClient::new()?;
/// let query = client.query().query("login").port(21).port(23);
///
/// for host in query.iter_hosts().take(5) {
///     println!("{}", host?.ip());
/// }
/// ```
#[derive(Debug)]
pub struct Query {
    client: ShodanClient,
    text: Option<String>,
    countries: Vec<String>,
    hostnames: Vec<String>,
    networks: Vec<String>,
    ports: Vec<u16>,
    cache: PageCache,
}

impl Query {
    /// Create an empty query
    #[must_use]
    pub fn new(client: ShodanClient) -> Self {
        Self {
            client,
            text: None,
            countries: Vec::new(),
            hostnames: Vec::new(),
            networks: Vec::new(),
            ports: Vec::new(),
            cache: PageCache::new(),
        }
    }

    /// Rebuild a query from a search URL such as
    /// `http://shodan.surtri.com/?q=login+port%3A21`
    pub fn from_url(client: ShodanClient, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ShodanError::InvalidUrl(format!("{url}: {e}")))?;

        let text = url
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| ShodanError::InvalidUrl(format!("{url} has no q parameter")))?;

        Ok(Self::new(client).query(text))
    }

    /// Set the free-text part of the query
    #[must_use]
    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self.invalidated()
    }

    /// Restrict results to a country, by ISO 3166-1 alpha-2 code
    pub fn country(mut self, code: &str) -> Result<Self> {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ShodanError::InvalidQuery(format!(
                "country code must be two letters: {code:?}"
            )));
        }

        self.countries.push(code.to_ascii_uppercase());
        Ok(self.invalidated())
    }

    /// Restrict results to several countries
    pub fn countries<I, S>(self, codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes
            .into_iter()
            .try_fold(self, |query, code| query.country(code.as_ref()))
    }

    /// Search for a host name
    #[must_use]
    pub fn hostname(mut self, name: impl Into<String>) -> Self {
        self.hostnames.push(name.into());
        self.invalidated()
    }

    /// Search for several host names
    #[must_use]
    pub fn hostnames<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostnames.extend(names.into_iter().map(Into::into));
        self.invalidated()
    }

    /// Restrict results to a CIDR network block
    #[must_use]
    pub fn network(mut self, cidr: impl Into<String>) -> Self {
        self.networks.push(cidr.into());
        self.invalidated()
    }

    /// Restrict results to several network blocks
    #[must_use]
    pub fn networks<I, S>(mut self, cidrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.networks.extend(cidrs.into_iter().map(Into::into));
        self.invalidated()
    }

    /// Search for a port
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.ports.push(port);
        self.invalidated()
    }

    /// Search for several ports
    #[must_use]
    pub fn ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports.extend(ports);
        self.invalidated()
    }

    /// Drop pages fetched for the previous criteria.
    fn invalidated(mut self) -> Self {
        if !self.cache.is_empty() {
            debug!(pages = self.cache.len(), "query changed, dropping cached pages");
            self.cache = PageCache::new();
        }
        self
    }

    /// The free-text part of the query
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Country codes searched within
    #[must_use]
    pub fn country_codes(&self) -> &[String] {
        &self.countries
    }

    /// Host names searched for
    #[must_use]
    pub fn host_names(&self) -> &[String] {
        &self.hostnames
    }

    /// Network blocks searched within
    #[must_use]
    pub fn network_blocks(&self) -> &[String] {
        &self.networks
    }

    /// Ports searched for
    #[must_use]
    pub fn port_numbers(&self) -> &[u16] {
        &self.ports
    }

    /// The full query expression, e.g. `ssh country:MX port:22`
    #[must_use]
    pub fn expression(&self) -> String {
        let mut terms: Vec<String> = self.text.iter().cloned().collect();

        terms.extend(self.countries.iter().map(|code| format!("country:{code}")));
        terms.extend(self.hostnames.iter().map(|host| format!("hostname:{host}")));
        terms.extend(self.networks.iter().map(|net| format!("net:{net}")));
        terms.extend(self.ports.iter().map(|port| format!("port:{port}")));

        terms.join(" ")
    }

    /// The search URL for the first page
    #[must_use]
    pub fn search_url(&self) -> Url {
        let mut url = self.client.base_url().clone();
        url.query_pairs_mut().append_pair("q", &self.expression());
        url
    }

    /// The search URL for the page at `index`
    #[must_use]
    pub fn page_url(&self, index: usize) -> Url {
        let mut url = self.search_url();

        if index != 1 {
            url.query_pairs_mut().append_pair("page", &index.to_string());
        }

        url
    }
}

impl HasPages for Query {
    fn results_per_page(&self) -> NonZeroUsize {
        NonZeroUsize::new(RESULTS_PER_PAGE).unwrap_or(NonZeroUsize::MIN)
    }

    fn fetch_page(&self, index: usize) -> Result<Page> {
        let html = self.client.get_html(&self.page_url(index))?;
        let page = parse_page(&html)?;

        debug!(index, hosts = page.len(), "parsed results page");
        Ok(page)
    }

    fn page_cache(&self) -> &PageCache {
        &self.cache
    }
}
