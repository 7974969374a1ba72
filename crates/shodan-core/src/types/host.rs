use crate::error::{Result, ShodanError};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Date layouts accepted for the "added on" field, tried in order.
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d", "%d %b %Y", "%b %d, %Y"];

static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static HEADER_SEPARATOR: OnceLock<Regex> = OnceLock::new();

fn line_break() -> &'static Regex {
    LINE_BREAK.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("hardcoded regex pattern is valid"))
}

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("hardcoded regex pattern is valid"))
}

fn header_separator() -> &'static Regex {
    HEADER_SEPARATOR.get_or_init(|| Regex::new(r":\s+").expect("hardcoded regex pattern is valid"))
}

/// A single search result: one network host and the banner it returned.
///
/// When the banner is an HTTP response, the status line, headers and body
/// are parsed out at construction time. A host never changes after it is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    ip: String,
    date: NaiveDate,
    response: String,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    http_version: Option<String>,
    #[serde(default)]
    http_code: Option<u32>,
    #[serde(default)]
    http_status: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
    #[serde(default)]
    http_body: Option<String>,
}

impl Host {
    /// Build a host from the fields of a search result.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shodan_core::Host;
    ///
    /// let host = Host::new("127.0.0.1", "16.11.2009", "SSH-2.0-OpenSSH_4.2", None).unwrap();
    /// assert_eq!(host.http_code(), None);
    /// ```
    pub fn new(
        ip: impl Into<String>,
        date: &str,
        response: impl Into<String>,
        hostname: Option<String>,
    ) -> Result<Self> {
        let mut host = Self {
            ip: ip.into(),
            date: parse_date(date)?,
            response: response.into(),
            hostname,
            http_version: None,
            http_code: None,
            http_status: None,
            http_headers: HashMap::new(),
            http_body: None,
        };

        if looks_like_http(&host.response) {
            host.parse_http();
        }

        Ok(host)
    }

    /// The network address of the host
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// The date the host was added to the index
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The raw response preview returned by the host
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The host name, if the result listed one
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Returns true if the response was parsed as HTTP
    #[must_use]
    pub const fn is_http(&self) -> bool {
        self.http_body.is_some()
    }

    /// The HTTP version from the status line, e.g. `"1.0"`
    #[must_use]
    pub fn http_version(&self) -> Option<&str> {
        self.http_version.as_deref()
    }

    /// The numeric HTTP status code
    #[must_use]
    pub const fn http_code(&self) -> Option<u32> {
        self.http_code
    }

    /// The HTTP status text, e.g. `"OK"`
    #[must_use]
    pub fn http_status(&self) -> Option<&str> {
        self.http_status.as_deref()
    }

    /// The HTTP response headers, keyed as they appeared in the banner
    #[must_use]
    pub const fn http_headers(&self) -> &HashMap<String, String> {
        &self.http_headers
    }

    /// The HTTP response body.
    ///
    /// `None` for non-HTTP responses; an empty string when the response is
    /// HTTP but no blank line separated the headers from a body.
    #[must_use]
    pub fn http_body(&self) -> Option<&str> {
        self.http_body.as_deref()
    }

    /// Look up a header by name, falling back to an ASCII case-insensitive match
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.http_headers
            .get(name)
            .or_else(|| {
                self.http_headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Look up a header by a field-style name such as `content_type`.
    ///
    /// The first underscore becomes a hyphen and the result is capitalized
    /// (`content_type` -> `Content-type`) before an exact lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ShodanError::UnknownHeader`] if no such header exists.
    pub fn header_field(&self, field: &str) -> Result<&str> {
        let name = header_name_for(field);

        self.http_headers
            .get(&name)
            .map(String::as_str)
            .ok_or_else(|| ShodanError::UnknownHeader(field.to_string()))
    }

    /// The server software name from the `Server` header
    #[must_use]
    pub fn server_name(&self) -> Option<&str> {
        self.server().map(|(name, _)| name)
    }

    /// The server software version from the `Server` header
    #[must_use]
    pub fn server_version(&self) -> Option<&str> {
        self.server().and_then(|(_, version)| version)
    }

    fn server(&self) -> Option<(&str, Option<&str>)> {
        let server = self.http_headers.get("Server")?;

        Some(match server.split_once('/') {
            Some((name, version)) => (name, Some(version)),
            None => (server.as_str(), None),
        })
    }

    fn parse_http(&mut self) {
        let lines = split_lines(&self.response);
        let Some((status_line, rest)) = lines.split_first() else {
            return;
        };

        let mut tokens = whitespace().splitn(status_line, 3);

        if let Some(protocol) = tokens.next() {
            self.http_version = protocol
                .rsplit_once('/')
                .map(|(_, version)| version.to_string());
        }
        self.http_code = tokens.next().map(parse_leading_digits);
        self.http_status = tokens.next().map(String::from);

        let mut body = String::new();

        for (index, line) in rest.iter().enumerate() {
            if line.is_empty() {
                body = rest[index + 1..].join("\n");
                break;
            }

            let (name, value) = header_separator()
                .find(line)
                .map_or((*line, ""), |sep| (&line[..sep.start()], &line[sep.end()..]));

            self.http_headers.insert(name.to_string(), value.to_string());
        }

        self.http_body = Some(body);
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ShodanError::MalformedDate {
            input: input.to_string(),
        })
}

fn looks_like_http(response: &str) -> bool {
    response
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("HTTP"))
}

/// Split on any line break, dropping trailing empty lines.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = line_break().split(text).collect();

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines
}

/// Leading decimal digits of `token`, or 0 when there are none.
fn parse_leading_digits(token: &str) -> u32 {
    token
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u32, |acc, digit| acc.saturating_mul(10).saturating_add(digit))
}

fn header_name_for(field: &str) -> String {
    let hyphenated = field.replacen('_', "-", 1);
    let mut chars = hyphenated.chars();

    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
