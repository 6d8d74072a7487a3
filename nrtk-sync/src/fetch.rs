//! Remote fetcher: one authenticated GET per sync cycle.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use nrtk_core::RawResponse;

use crate::error::FetchError;

/// Upper bound on a single fetch, connect to last byte.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Where a sync cycle gets its remote document from.
///
/// Any HTTP status counts as a response; status checks belong to validation.
pub trait ContentSource {
    fn fetch(&self) -> Result<RawResponse, FetchError>;
}

impl<F> ContentSource for F
where
    F: Fn() -> Result<RawResponse, FetchError>,
{
    fn fetch(&self) -> Result<RawResponse, FetchError> {
        self()
    }
}

/// Content API over HTTP(S), authenticated with `Authorization: Token <token>`.
pub struct HttpSource {
    url: String,
    token: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_timeout(url, token, FETCH_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        HttpSource {
            url: url.into(),
            token: token.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ContentSource for HttpSource {
    fn fetch(&self) -> Result<RawResponse, FetchError> {
        let result = self
            .agent
            .get(&self.url)
            .set("Authorization", &format!("Token {}", self.token))
            .call();

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                tracing::error!(status = code, url = %self.url, "HTTP error");
                response
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url: self.url.clone(),
                    message: transport.to_string(),
                })
            }
        };

        let status = response.status();
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|source| FetchError::Body {
                url: self.url.clone(),
                source,
            })?;
        let body = String::from_utf8(bytes).map_err(|source| FetchError::Encoding {
            url: self.url.clone(),
            source,
        })?;
        Ok(RawResponse { status, body })
    }
}
