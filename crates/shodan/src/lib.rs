//! Rust interface to SHODAN, a computer search engine.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use shodan::{HasPages, ShodanClient};
//!
//! fn main() -> shodan::Result<()> {
//!     let client = ShodanClient::new()?;
//!
//!     // Search for FTP logins in Mexico
//!     let query = shodan::query(&client)
//!         .query("login")
//!         .port(21)
//!         .country("MX")?;
//!
//!     // Walk every host on every page
//!     query.for_each_host(|host| {
//!         println!("{} {:?}", host.ip(), host.hostname());
//!     })?;
//!
//!     // Or address a single result by its rank
//!     let host = query.host_at(42)?;
//!     println!("#42: {} ({:?})", host.ip(), host.server_name());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/shodan/0.2.0")]

// Re-export core types
pub use shodan_core::*;

// Re-export client
pub use shodan_client::{
    parse_page, user_agent_for_alias, ProxyConfig, Query, ShodanClient, ShodanClientBuilder,
    COMMON_PROXY_PORT, DEFAULT_BASE_URL, DEFAULT_USER_AGENT_ALIAS, RESULTS_PER_PAGE,
    USER_AGENT_ALIASES,
};

/// Start a new query on `client`
#[must_use]
pub fn query(client: &ShodanClient) -> Query {
    client.query()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_starts_empty() {
        let client = ShodanClient::new().unwrap();
        let query = query(&client);

        assert_eq!(query.expression(), "");
        assert!(query.page_cache().is_empty());
        assert_eq!(query.results_per_page().get(), RESULTS_PER_PAGE);
    }
}
