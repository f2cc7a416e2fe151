//! Bing Custom Search v7 backend

use super::{SearchEngine, SearchResponse};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

pub struct BingSearch {
    client: Client,
    endpoint: String,
    subscription_key: String,
    custom_config_id: String,
}

impl BingSearch {
    pub fn new(
        client: Client,
        endpoint: String,
        subscription_key: String,
        custom_config_id: String,
    ) -> Self {
        Self {
            client,
            endpoint,
            subscription_key,
            custom_config_id,
        }
    }
}

#[async_trait]
impl SearchEngine for BingSearch {
    async fn search(&self, query: &str, count: u32, market: &str) -> Result<SearchResponse> {
        let started = Instant::now();
        let count = count.to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .query(&[
                ("q", query),
                ("customconfig", self.custom_config_id.as_str()),
                ("mkt", market),
                ("count", count.as_str()),
            ])
            .send()
            .await
            .context("Bing search request failed")?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!("Bing search error ({}): {}", status, body));
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).context("Bing returned an unreadable response")?;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            pages = parsed.pages().len(),
            "bing search finished"
        );

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "bing"
    }
}
