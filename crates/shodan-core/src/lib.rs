//! Core types and traits for the SHODAN search client.
//!
//! This crate provides the foundational pieces used across the library:
//!
//! - **Types**: [`Host`] records parsed from search results and the ordered
//!   [`Page`] collection they arrive in
//! - **Pagination**: the [`HasPages`] capability and its memoizing [`PageCache`]
//! - **Errors**: Comprehensive error handling with [`ShodanError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use shodan_core::{HasPages, Result};
//!
//! fn print_servers(query: &impl HasPages) -> Result<()> {
//!     query.for_each_host(|host| {
//!         println!("{} {:?}", host.ip(), host.server_name());
//!     })
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/shodan-core/0.2.0")]

mod error;
pub mod pages;
pub mod types;

pub use error::{Result, ShodanError};
pub use pages::{HasPages, PageCache};
pub use types::*;
