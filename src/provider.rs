//! HTTP fetcher for the provider's published IP ranges.
//!
//! Cloudflare publishes its edge ranges at a single JSON endpoint; this
//! module downloads and parses that payload into a [`DesiredState`]. A
//! malformed payload is a hard error — reconciling against a guessed
//! desired state could plan the removal of every rule.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::CfsyncError;
use crate::model::{AddressFamily, DesiredState};

/// Cloudflare's published edge IP ranges.
pub const CLOUDFLARE_IPS_URL: &str = "https://api.cloudflare.com/client/v4/ips";

const TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 2000;

/// Maximum response size (1 MB). The real payload is a few KB, so this
/// provides ample margin while bounding memory on a misbehaving endpoint.
const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

#[derive(Deserialize)]
struct IpsResponse {
    result: Option<IpsResult>,
}

#[derive(Deserialize)]
struct IpsResult {
    ipv4_cidrs: Option<Vec<String>>,
    ipv6_cidrs: Option<Vec<String>>,
}

/// HTTP client for fetching the desired ranges.
pub struct ProviderFetcher {
    client: Client,
    url: String,
}

impl ProviderFetcher {
    /// Create a new fetcher for the given endpoint.
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("cfsync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Fetch the provider's published ranges for both families.
    pub async fn fetch_desired(&self) -> Result<DesiredState> {
        let content = self
            .fetch_with_retry()
            .await
            .with_context(|| format!("Failed to fetch provider ranges from {}", self.url))?;

        let desired = parse_provider_response(&content)?;
        for family in AddressFamily::ALL {
            info!(
                "Provider publishes {} {} ranges",
                desired.get(family).len(),
                family
            );
        }
        Ok(desired)
    }

    /// Fetch content with retry logic and size validation.
    async fn fetch_with_retry(&self) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_DELAY_MS * (1 << (attempt - 1));
                debug!("Retry {} after {}ms for {}", attempt, delay, self.url);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.client.get(&self.url).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        if let Some(content_length) = response.content_length() {
                            if content_length as usize > MAX_RESPONSE_SIZE {
                                return Err(anyhow::anyhow!(
                                    "Response too large: {} bytes (max: {} bytes)",
                                    content_length,
                                    MAX_RESPONSE_SIZE
                                ));
                            }
                        }

                        let body = response
                            .text()
                            .await
                            .context("Failed to read response body")?;

                        if body.len() > MAX_RESPONSE_SIZE {
                            return Err(anyhow::anyhow!(
                                "Downloaded content too large: {} bytes (max: {} bytes)",
                                body.len(),
                                MAX_RESPONSE_SIZE
                            ));
                        }

                        return Ok(body);
                    }
                    last_error = Some(anyhow::anyhow!("HTTP {}", response.status()));
                }
                Err(e) => {
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }
}

/// Parse the provider payload into per-family CIDR sets.
///
/// Missing expected fields are an upstream data error, never an empty range
/// set. The CIDR strings are kept verbatim as opaque tokens.
pub fn parse_provider_response(content: &str) -> Result<DesiredState> {
    let response: IpsResponse = serde_json::from_str(content)
        .map_err(|e| CfsyncError::Provider(format!("invalid JSON payload: {}", e)))?;

    let result = response
        .result
        .ok_or_else(|| CfsyncError::Provider("response is missing 'result'".to_string()))?;
    let ipv4 = result
        .ipv4_cidrs
        .ok_or_else(|| CfsyncError::Provider("response is missing 'ipv4_cidrs'".to_string()))?;
    let ipv6 = result
        .ipv6_cidrs
        .ok_or_else(|| CfsyncError::Provider("response is missing 'ipv6_cidrs'".to_string()))?;

    Ok(DesiredState {
        ipv4: ipv4.into_iter().collect(),
        ipv6: ipv6.into_iter().collect(),
    })
}
