use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::Config;

/// Failures while downloading a remote playlist
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid playlist URL: {0}")]
    InvalidUrl(String),
    #[error("Playlist download timed out after {0}ms")]
    Timeout(u64),
    #[error("Playlist too large (limit {limit_mb}MB)")]
    TooLarge { limit_mb: usize },
    #[error("{0}")]
    Status(String),
    #[error("Failed to download playlist: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Downloads M3U text with a timeout, a byte cap and retries on 429/network errors
#[derive(Clone)]
pub struct PlaylistFetcher {
    client: Client,
    timeout_ms: u64,
    max_retries: u32,
    max_m3u_size_mb: usize,
}

impl PlaylistFetcher {
    pub fn new(
        user_agent: &str,
        timeout_ms: u64,
        max_retries: u32,
        max_m3u_size_mb: usize,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .gzip(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            timeout_ms,
            max_retries,
            max_m3u_size_mb,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            &config.user_agent,
            config.fetch_timeout_ms,
            config.max_retries,
            config.max_m3u_size_mb,
        )
    }

    fn max_bytes(&self) -> u64 {
        (self.max_m3u_size_mb as u64) * 1024 * 1024
    }

    /// Fetch the playlist body as text. Invalid UTF-8 is replaced, not rejected.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let response = self.fetch_with_retry(parsed.as_str()).await?;
        let max_bytes = self.max_bytes();

        let mut body: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.classify(e))?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(FetchError::TooLarge {
                    limit_mb: self.max_m3u_size_mb,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Downloaded playlist: {} bytes", body.len());
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Response, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        if let Some(len) = resp.content_length() {
                            if len > self.max_bytes() {
                                return Err(FetchError::TooLarge {
                                    limit_mb: self.max_m3u_size_mb,
                                });
                            }
                        }
                        return Ok(resp);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                        let backoff_ms = backoff_ms(attempt);
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "429", "backoff_ms" = backoff_ms);
                        sleep(Duration::from_millis(backoff_ms)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(FetchError::Status(friendly_status(status)));
                }
                Err(err) => {
                    if err.is_timeout() || attempt >= self.max_retries {
                        return Err(self.classify(err));
                    }
                    let backoff_ms = backoff_ms(attempt);
                    tracing::warn!("fetch_retry" = attempt + 1, "reason" = "network", "backoff_ms" = backoff_ms);
                    sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_ms)
        } else {
            FetchError::Network(err)
        }
    }
}

/// Exponential backoff: 500ms, 1s, 2s, ... capped at 10s
fn backoff_ms(attempt: u32) -> u64 {
    (1u64 << attempt.min(16)).saturating_mul(500).min(10_000)
}

fn friendly_status(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "Playlist not found (404). Check the URL.".to_string(),
        StatusCode::FORBIDDEN => "Access denied (403). The playlist may require authentication.".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Too many requests (429). The playlist server is rate limiting.".to_string(),
        _ => {
            let reason = status.canonical_reason().unwrap_or("Error");
            format!("HTTP {}: {}", status.as_u16(), reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout_ms: u64, max_mb: usize) -> PlaylistFetcher {
        PlaylistFetcher::new("test-agent", timeout_ms, 1, max_mb).unwrap()
    }

    #[test]
    fn test_backoff() {
        assert_eq!(backoff_ms(0), 500);
        assert_eq!(backoff_ms(1), 1000);
        assert_eq!(backoff_ms(5), 10_000);
        assert_eq!(backoff_ms(40), 10_000);
    }

    #[tokio::test]
    async fn test_fetch_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.m3u"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let text = fetcher(5_000, 1)
            .fetch_text(&format!("{}/list.m3u", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "#EXTM3U\n");
    }

    #[tokio::test]
    async fn test_fetch_text_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher(5_000, 1)
            .fetch_text(&format!("{}/missing.m3u", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(ref msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_fetch_text_too_large() {
        let server = MockServer::start().await;
        let body = "#".repeat(1024 * 1024 + 1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let err = fetcher(5_000, 1)
            .fetch_text(&format!("{}/big.m3u", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit_mb: 1 }));
    }

    #[tokio::test]
    async fn test_fetch_text_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("#EXTM3U\n")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = fetcher(100, 1)
            .fetch_text(&format!("{}/slow.m3u", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(100)));
    }

    #[tokio::test]
    async fn test_fetch_text_retries_after_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\nok"))
            .mount(&server)
            .await;

        let text = fetcher(5_000, 1)
            .fetch_text(&format!("{}/busy.m3u", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "#EXTM3U\nok");
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_invalid_url() {
        let err = fetcher(5_000, 1).fetch_text("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));

        let err = fetcher(5_000, 1).fetch_text("ftp://host/list.m3u").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
