//! Blocking web client for the SHODAN computer search engine.
//!
//! This crate provides the [`ShodanClient`] web agent and the [`Query`]
//! builder whose result pages are walked through [`shodan_core::HasPages`].

#![doc(html_root_url = "https://docs.rs/shodan-client/0.2.0")]

mod client;
mod config;
mod parse;
mod query;

pub use client::{ShodanClient, ShodanClientBuilder, DEFAULT_BASE_URL};
pub use config::*;
pub use parse::parse_page;
pub use query::{Query, RESULTS_PER_PAGE};
pub use shodan_core::{Result, ShodanError};
