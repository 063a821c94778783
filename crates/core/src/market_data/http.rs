use crate::market_data::error::ProviderError;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Thin JSON-over-HTTP client shared by the provider adapters.
#[derive(Debug, Clone)]
pub struct HttpJsonClient {
    http: reqwest::Client,
    provider: &'static str,
    base_url: String,
    retries: u32,
}

impl HttpJsonClient {
    pub fn new(
        provider: &'static str,
        base_url: &str,
        timeout_secs: u64,
        retries: u32,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .with_context(|| format!("failed to build {provider} http client"))?;

        Ok(Self {
            http,
            provider,
            base_url: base_url.to_string(),
            retries: retries.max(1),
        })
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET `path` and decode the body as JSON, retrying transport errors,
    /// 429/5xx responses and unparseable bodies with exponential backoff.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let res = self.http.get(&url).query(query).send().await;
            let res = match res {
                Ok(r) => r,
                Err(err) => {
                    // The query string carries the API key; keep it out of logs.
                    let err = err.without_url();
                    if attempt >= self.retries {
                        return Err(err)
                            .with_context(|| format!("{} request to {path} failed", self.provider));
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(
                        provider = self.provider,
                        path,
                        attempt,
                        ?backoff,
                        error = %err,
                        "market data request failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = res.status();
            let text = res
                .text()
                .await
                .map_err(reqwest::Error::without_url)
                .with_context(|| format!("failed to read {} response", self.provider))?;

            if !status.is_success() {
                if is_retryable(status) && attempt < self.retries {
                    let backoff = backoff_for(attempt);
                    tracing::warn!(
                        provider = self.provider,
                        path,
                        attempt,
                        ?backoff,
                        http_status = %status,
                        "market data HTTP error; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return Err(ProviderError::new(
                    self.provider,
                    "http",
                    format!("{path} returned HTTP {status}: {}", truncate(&text, 200)),
                )
                .into());
            }

            match serde_json::from_str::<Value>(&text) {
                Ok(body) => return Ok(body),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err).with_context(|| {
                            format!("{} response from {path} is not valid JSON", self.provider)
                        });
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(
                        provider = self.provider,
                        path,
                        attempt,
                        ?backoff,
                        error = %err,
                        "market data response parse failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_for(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
