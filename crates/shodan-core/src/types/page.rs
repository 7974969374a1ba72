use super::Host;
use crate::error::{Result, ShodanError};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a host field is matched against when filtering a page
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Plain substring match
    Substring(String),
    /// Regular expression match
    Regex(Regex),
}

impl Pattern {
    /// Compile a regular expression pattern
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| ShodanError::InvalidPattern(e.to_string()))
    }

    /// Returns true if `text` matches this pattern
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text.contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(text),
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self::Substring(s.to_string())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::Substring(s)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

/// One page of search results, in the order the hosts appeared.
///
/// Pages are immutable once built. Filtering always produces a new page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page {
    hosts: Vec<Host>,
}

/// Appends hosts to a page while it is being built by [`Page::build`]
#[derive(Debug)]
pub struct PageBuilder {
    hosts: Vec<Host>,
}

impl PageBuilder {
    /// Append a host to the page under construction
    pub fn push(&mut self, host: Host) {
        self.hosts.push(host);
    }

    /// Number of hosts appended so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns true if nothing has been appended yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Extend<Host> for PageBuilder {
    fn extend<I: IntoIterator<Item = Host>>(&mut self, iter: I) {
        self.hosts.extend(iter);
    }
}

impl Page {
    /// Create a page holding the given hosts
    #[must_use]
    pub const fn new(hosts: Vec<Host>) -> Self {
        Self { hosts }
    }

    /// Create a page from `hosts`, letting `populate` append more before
    /// the page is sealed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shodan_core::{Host, Page};
    ///
    /// let page = Page::build(Vec::new(), |page| {
    ///     page.push(Host::new("127.0.0.1", "16.11.2009", "SSH-2.0", None)?);
    ///     Ok(())
    /// })
    /// .unwrap();
    /// assert_eq!(page.len(), 1);
    /// ```
    pub fn build<F>(hosts: Vec<Host>, populate: F) -> Result<Self>
    where
        F: FnOnce(&mut PageBuilder) -> Result<()>,
    {
        let mut builder = PageBuilder { hosts };
        populate(&mut builder)?;
        Ok(Self::new(builder.hosts))
    }

    /// Returns the number of hosts on this page
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns true if the page holds no hosts.
    ///
    /// An empty page marks the end of the results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// The host at the 0-based `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Host> {
        self.hosts.get(index)
    }

    /// The first host on the page
    #[must_use]
    pub fn first(&self) -> Option<&Host> {
        self.hosts.first()
    }

    /// The hosts on the page as a slice
    #[must_use]
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// Iterate over the hosts on the page
    pub fn iter(&self) -> std::slice::Iter<'_, Host> {
        self.hosts.iter()
    }

    /// Select the hosts matching `predicate` into a new page
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&Host) -> bool,
    {
        self.hosts.iter().filter(|host| predicate(host)).cloned().collect()
    }

    /// Project one value out of every host, preserving order
    pub fn map_field<'a, T, F>(&'a self, extract: F) -> Vec<T>
    where
        F: FnMut(&'a Host) -> T,
    {
        self.hosts.iter().map(extract).collect()
    }

    /// Hosts whose address matches `pattern`
    #[must_use]
    pub fn filter_by_address(&self, pattern: impl Into<Pattern>) -> Self {
        let pattern = pattern.into();
        self.filter(|host| pattern.is_match(host.ip()))
    }

    /// Hosts with a host name matching `pattern`
    #[must_use]
    pub fn filter_by_hostname(&self, pattern: impl Into<Pattern>) -> Self {
        let pattern = pattern.into();
        self.filter(|host| host.hostname().is_some_and(|name| pattern.is_match(name)))
    }

    /// Hosts whose raw response matches `pattern`
    #[must_use]
    pub fn filter_by_response(&self, pattern: impl Into<Pattern>) -> Self {
        let pattern = pattern.into();
        self.filter(|host| pattern.is_match(host.response()))
    }

    /// Addresses of every host, in page order
    pub fn ips(&self) -> Vec<&str> {
        self.map_field(Host::ip)
    }

    /// Host names of the hosts that have one
    pub fn hostnames(&self) -> Vec<&str> {
        self.hosts.iter().filter_map(Host::hostname).collect()
    }

    /// Dates each host was added
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.map_field(Host::date)
    }

    /// Raw service banners
    pub fn responses(&self) -> Vec<&str> {
        self.map_field(Host::response)
    }

    /// HTTP protocol versions, `None` for non-HTTP hosts
    pub fn http_versions(&self) -> Vec<Option<&str>> {
        self.map_field(Host::http_version)
    }

    /// HTTP status codes
    pub fn http_codes(&self) -> Vec<Option<u32>> {
        self.map_field(Host::http_code)
    }

    /// HTTP reason phrases
    pub fn http_statuses(&self) -> Vec<Option<&str>> {
        self.map_field(Host::http_status)
    }

    /// HTTP headers of every host; empty for non-HTTP hosts
    pub fn headers(&self) -> Vec<&HashMap<String, String>> {
        self.map_field(Host::http_headers)
    }
}

impl From<Vec<Host>> for Page {
    fn from(hosts: Vec<Host>) -> Self {
        Self::new(hosts)
    }
}

impl FromIterator<Host> for Page {
    fn from_iter<I: IntoIterator<Item = Host>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Host;
    type IntoIter = std::slice::Iter<'a, Host>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}
