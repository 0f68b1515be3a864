//! HTTP client for the dashboard endpoints of the Vitrine API.

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vitrine_core::image_slots::{
    ImageUrlPool, PopulateMode, PopulateOutcome, PopulateRequest, SlotReport,
};

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL from VITRINE_API_URL (or API_URL), defaulting to a local server.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("VITRINE_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.build_url(path))
            .send()
            .await
            .context("Failed to send request")?;
        parse_json(response).await
    }

    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.build_url(path))
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        parse_json(response).await
    }

    pub async fn image_url_pool(&self) -> Result<ImageUrlPool> {
        self.get("/dashboard/image-urls").await
    }

    pub async fn image_slot_report(&self) -> Result<SlotReport> {
        self.get("/dashboard/image-urls/report").await
    }

    pub async fn populate_image_urls(
        &self,
        mode: PopulateMode,
        dry_run: bool,
    ) -> Result<PopulateOutcome> {
        self.post_json(
            "/dashboard/image-urls/populate",
            &PopulateRequest { mode, dry_run },
        )
        .await
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow::anyhow!(
            "API request failed with status {}: {}",
            status,
            error_text
        ));
    }

    response
        .json()
        .await
        .context("Failed to parse response as JSON")
}
