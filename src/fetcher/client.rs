//! HTTP retrieval of listing and article pages.

use async_trait::async_trait;
use reqwest::{cookie::Jar, header};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::TARGET_WEB_REQUEST;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Something that can hand back the markup behind a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpPageSource {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpPageSource {
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .cookie_provider(Arc::new(Jar::default()))
            .gzip(true)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::default())
            .build()?;

        Ok(HttpPageSource {
            client,
            request_timeout,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!(target: TARGET_WEB_REQUEST, "GET {}", url);
        let request = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send();

        let response = match timeout(self.request_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) if err.is_timeout() => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.request_timeout,
                })
            }
            Ok(Err(err)) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    source: err,
                })
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.request_timeout,
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.request_timeout,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    source: err,
                }
            }
        })?;
        debug!(target: TARGET_WEB_REQUEST, "{} returned {} bytes", url, body.len());

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let source = HttpPageSource::new(Duration::from_secs(1)).unwrap();
        let err = source.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let source = HttpPageSource::new(Duration::from_millis(200)).unwrap();
        let err = source
            .fetch_page(&format!("http://{}/news/a", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "{:?}", err);

        server.abort();
    }
}
