//! Extraction of hosts from SHODAN result pages.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use shodan_core::{Host, Page, Result, ShodanError};
use std::sync::OnceLock;

static ADDED_ON: OnceLock<Regex> = OnceLock::new();

fn added_on() -> &'static Regex {
    ADDED_ON.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("hardcoded regex pattern is valid"))
}

struct Selectors {
    result: Selector,
    header: Selector,
    anchor: Selector,
    span: Selector,
    paragraph: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            result: selector("#search > div.result")?,
            header: selector("div")?,
            anchor: selector("a")?,
            span: selector("span")?,
            paragraph: selector("p")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ShodanError::Parse(format!("invalid selector {css:?}: {e}")))
}

/// Parse one page of search results.
///
/// A document without any results yields an empty page, which marks the
/// end of the result set.
pub fn parse_page(html: &str) -> Result<Page> {
    let document = Html::parse_document(html);
    let selectors = Selectors::new()?;

    Page::build(Vec::new(), |page| {
        for result in document.select(&selectors.result) {
            page.push(parse_result(result, &selectors)?);
        }
        Ok(())
    })
}

fn parse_result(result: ElementRef<'_>, selectors: &Selectors) -> Result<Host> {
    let header = result
        .select(&selectors.header)
        .next()
        .ok_or_else(|| ShodanError::Parse("result is missing its header".to_string()))?;

    let anchors: Vec<ElementRef<'_>> = header.select(&selectors.anchor).collect();

    // Unlinked addresses are the header's leading text.
    let ip = match anchors.first() {
        Some(anchor) => text_of(*anchor),
        None => header
            .children()
            .next()
            .map(|child| match child.value() {
                Node::Text(text) => text.text.trim().to_string(),
                _ => ElementRef::wrap(child).map(text_of).unwrap_or_default(),
            })
            .unwrap_or_default(),
    };

    let hostname = anchors
        .get(1..)
        .and_then(<[_]>::last)
        .map(|anchor| text_of(*anchor))
        .filter(|name| !name.is_empty());

    let added = header
        .select(&selectors.span)
        .next()
        .map(text_of)
        .ok_or_else(|| ShodanError::Parse(format!("result for {ip} has no date")))?;

    let date = added_on()
        .find(&added)
        .ok_or_else(|| ShodanError::Parse(format!("no date in {added:?}")))?;

    let response = result
        .select(&selectors.paragraph)
        .next()
        .map(text_of)
        .unwrap_or_default();

    Host::new(ip, date.as_str(), response, hostname)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS: &str = r#"
<html><body>
<div id="search">
  <div class="result">
    <div><a href="/host/127.0.0.1">127.0.0.1</a> <span>Added on 16.11.2009</span></div>
    <p>SSH-2.0-OpenSSH_4.2</p>
  </div>
  <div class="result">
    <div><a href="/host/192.168.1.1">192.168.1.1</a> <span>Added on 06.11.2009</span> <a href="http://lol.cats.net/">lol.cats.net</a></div>
    <p>
HTTP/1.0 200 OK
Server: nginx/0.8.24

&lt;HTML&gt;&lt;/HTML&gt;
    </p>
  </div>
  <div class="result">
    <div>10.1.1.1 <span>Added on 01.12.2009</span></div>
    <p>220 FTP server ready</p>
  </div>
</div>
</body></html>
"#;

    #[test]
    fn parses_results_in_order() {
        let page = parse_page(RESULTS).unwrap();

        assert_eq!(page.ips(), ["127.0.0.1", "192.168.1.1", "10.1.1.1"]);
        assert_eq!(page.hostnames(), ["lol.cats.net"]);
        let dates: Vec<String> = page.dates().iter().map(ToString::to_string).collect();
        assert_eq!(dates, ["2009-11-16", "2009-11-06", "2009-12-01"]);
    }

    #[test]
    fn parses_http_banners() {
        let page = parse_page(RESULTS).unwrap();
        let web = page.get(1).unwrap();

        assert_eq!(web.http_code(), Some(200));
        assert_eq!(web.server_name(), Some("nginx"));
        assert_eq!(web.http_body(), Some("<HTML></HTML>"));
        assert_eq!(page.get(2).unwrap().response(), "220 FTP server ready");
    }

    #[test]
    fn page_without_results_is_empty() {
        let page = parse_page(r#"<html><body><div id="search"></div></body></html>"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn result_without_date_is_a_parse_error() {
        let html = r#"<div id="search"><div class="result"><div><a>10.0.0.1</a></div><p>x</p></div></div>"#;
        let err = parse_page(html).unwrap_err();
        assert!(matches!(err, ShodanError::Parse(_)));
        assert!(err.is_fetch_failure());
    }
}
