use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Provider;
use crate::errors::ShellError;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Messages wire format: top-level `system`, one user message, reply at
/// `content[0].text`.
pub struct Anthropic {
    model: String,
    api_key: String,
    api_base: String,
    timeout: Duration,
    client: Client,
}

impl Anthropic {
    pub fn new(model: String, api_key: String, api_base: String, timeout: Duration) -> Self {
        Self { model, api_key, api_base, timeout, client: Client::new() }
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Msg<'a>; 1],
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: Option<String>,
}

pub(crate) fn extract_text(text: &str) -> Result<String> {
    let parsed: MsgResponse = serde_json::from_str(text)
        .map_err(|e| anyhow!("anthropic response parse error: {e}"))?;
    parsed
        .content
        .into_iter()
        .next()
        .and_then(|b| b.text)
        .ok_or_else(|| anyhow!("anthropic: empty content"))
}

#[async_trait]
impl Provider for Anthropic {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: system_prompt,
            messages: [Msg { role: "user", content: prompt }],
        };

        tracing::debug!(%url, model = %self.model, "anthropic: POST");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("anthropic request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("anthropic read body failed")?;
        tracing::debug!(%status, bytes = text.len(), "anthropic: response");

        if !status.is_success() {
            return Err(ShellError::Provider(format!("Anthropic API error ({status}): {text}")).into());
        }
        extract_text(&text)
    }
}
