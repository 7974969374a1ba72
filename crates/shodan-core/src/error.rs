use thiserror::Error;

/// Result type alias for SHODAN operations
pub type Result<T> = std::result::Result<T, ShodanError>;

/// Errors that can occur when querying SHODAN or walking its results
#[derive(Error, Debug)]
pub enum ShodanError {
    /// The date a host was added could not be parsed
    #[error("malformed date: {input:?}")]
    MalformedDate {
        /// The raw date text
        input: String,
    },

    /// A derived header name matched no header in the response
    #[error("no such header attribute: {0}")]
    UnknownHeader(String),

    /// A rank addressed a position past the hosts present on its page
    #[error("rank {rank} is out of range: page {page} has {len} hosts, wanted offset {offset}")]
    IndexOutOfRange {
        /// The 1-based global rank requested
        rank: usize,
        /// The 1-based page index the rank maps to
        page: usize,
        /// The 0-based offset within that page
        offset: usize,
        /// Number of hosts actually on the page
        len: usize,
    },

    /// Page indices and ranks are 1-based
    #[error("invalid index {0}: pages and ranks start at 1")]
    InvalidIndex(usize),

    /// Server returned a non-success response
    #[error("server error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// A result page could not be parsed
    #[error("failed to parse results page: {0}")]
    Parse(String),

    /// Invalid query criteria
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid filter pattern
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ShodanError {
    /// Returns true if the error came from fetching or parsing a page
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Api { .. }
                | Self::Http(_)
                | Self::Timeout(_)
                | Self::Connection(_)
                | Self::Parse(_)
        )
    }

    /// Returns the HTTP status code if the server answered with an error
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failures_are_classified() {
        assert!(ShodanError::Timeout(30).is_fetch_failure());
        assert!(ShodanError::Parse("no results".into()).is_fetch_failure());
        assert!(!ShodanError::UnknownHeader("Lol".into()).is_fetch_failure());
        assert!(!ShodanError::InvalidIndex(0).is_fetch_failure());
    }

    #[test]
    fn status_code_only_for_api_errors() {
        let err = ShodanError::Api {
            code: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(ShodanError::Http("reset".into()).status_code(), None);
    }
}
