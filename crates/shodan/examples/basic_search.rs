//! Basic example walking SHODAN search results.
//!
//! Run with: cargo run --example basic_search -- "<query>"
//!
//! Set RUST_LOG=shodan_core=debug to watch pages being fetched and cached.

use shodan::{HasPages, Result, ShodanClient};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let text = std::env::args().nth(1).unwrap_or_else(|| "ssh".to_string());

    let client = ShodanClient::new()?;
    let query = shodan::query(&client).query(text);

    println!("=== {} ===", query.search_url());

    let page = query.first_page()?;
    println!("First page: {} hosts", page.len());
    for host in page.iter() {
        println!("  {:<15} {}", host.ip(), host.date());
    }
    println!();

    println!("=== Web servers on page 1 ===");
    for host in page.filter(shodan::Host::is_http).iter() {
        println!(
            "  {:<15} {:?} {:?}",
            host.ip(),
            host.http_code(),
            host.server_name()
        );
    }
    println!();

    // Reuses the cached first page
    match query.host_at(3) {
        Ok(host) => println!("Third result: {}", host.ip()),
        Err(e) => eprintln!("No third result: {e}"),
    }

    Ok(())
}
