use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::WitConfig;

/// Raw payload from the intent classifier. Every field defaults so a partial
/// or empty document deserializes instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierResponse {
    #[serde(default)]
    pub intents: Vec<DetectedIntent>,
    #[serde(default)]
    pub entities: HashMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedIntent {
    pub name: String,
    pub confidence: f64,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<ClassifierResponse>;
}

/// Wit.ai `/message` client.
pub struct WitClient {
    http: reqwest::Client,
    config: WitConfig,
}

impl WitClient {
    pub fn new(config: WitConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build wit.ai http client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl IntentClassifier for WitClient {
    async fn classify(&self, text: &str) -> anyhow::Result<ClassifierResponse> {
        let response = self
            .http
            .get(&self.config.api_url)
            .bearer_auth(&self.config.token)
            .query(&[("q", text), ("v", self.config.api_version.as_str())])
            .send()
            .await
            .context("wit.ai request")?
            .error_for_status()
            .context("wit.ai status")?;
        let parsed = response.json().await.context("wit.ai payload")?;
        Ok(parsed)
    }
}
