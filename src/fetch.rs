//! HTTP retrieval of image bytes.
//!
//! The [`Fetch`] trait is the seam between the migration driver and the
//! network, so pipeline logic is testable without sockets. The production
//! implementation is [`HttpFetcher`] — a blocking reqwest client with a
//! realistic browser user-agent (several origins reject unidentified
//! clients) and a fixed 30-second timeout.
//!
//! A fetcher performs no retries and recovers nothing: any non-200 status,
//! transport error, or timeout is returned as a typed [`FetchError`]. The
//! driver owns the fallback policy.

use std::time::Duration;
use thiserror::Error;

/// Request timeout for a single download.
const TIMEOUT: Duration = Duration::from_secs(30);

/// User-agent presented to origins.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("request timed out")]
    TimedOut,
    #[error("transport error: {0}")]
    Transport(String),
}

/// A successfully downloaded asset.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// `Content-Type` response header, when the origin sent one.
    pub content_type: Option<String>,
}

/// Retrieval of raw bytes for a URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;
}

/// Blocking HTTP client fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::TimedOut
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::TimedOut
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?
            .to_vec();

        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock fetcher serving canned responses and counting requests.
    #[derive(Default)]
    pub struct MockFetcher {
        responses: HashMap<String, Result<Fetched, u16>>,
        pub requested: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(mut self, url: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
            self.responses.insert(
                url.to_string(),
                Ok(Fetched {
                    bytes,
                    content_type: content_type.map(str::to_string),
                }),
            );
            self
        }

        pub fn fail(mut self, url: &str, status: u16) -> Self {
            self.responses.insert(url.to_string(), Err(status));
            self
        }

        pub fn request_count(&self) -> usize {
            self.requested.lock().unwrap().len()
        }
    }

    impl Fetch for MockFetcher {
        fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some(Ok(fetched)) => Ok(fetched.clone()),
                Some(Err(status)) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Transport(format!("no route to {url}"))),
            }
        }
    }

    #[test]
    fn mock_serves_and_records() {
        let fetcher = MockFetcher::new().serve("https://a.b/x.jpg", vec![1, 2, 3], Some("image/jpeg"));

        let got = fetcher.fetch("https://a.b/x.jpg").unwrap();
        assert_eq!(got.bytes, vec![1, 2, 3]);
        assert_eq!(got.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn mock_reports_status_failures() {
        let fetcher = MockFetcher::new().fail("https://a.b/gone.jpg", 404);
        let err = fetcher.fetch("https://a.b/gone.jpg").unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[test]
    fn unknown_url_is_a_transport_error() {
        let fetcher = MockFetcher::new();
        let err = fetcher.fetch("https://a.b/missing.jpg").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
