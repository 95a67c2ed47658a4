use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::Serialize;

use url::Url;

/// Client for the external form-processing endpoint that verified adoption
/// inquiries are forwarded to
#[derive(Debug, Clone)]
pub struct FormRelayClient {
    client: Client,
    endpoint_url: Url,
}

impl FormRelayClient {
    pub fn new(api_timeout: Duration, endpoint_url: Url) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        Ok(Self {
            client,
            endpoint_url,
        })
    }

    pub async fn forward(&self, payload: &impl Serialize) -> anyhow::Result<()> {
        self.client
            .post(self.endpoint_url.clone())
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
