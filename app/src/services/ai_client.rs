// app/src/services/ai_client.rs

//! Minimal clients for OpenAI-compatible chat and image endpoints.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

#[async_trait]
pub trait TextModel: Send + Sync {
  async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ImageModel: Send + Sync {
  /// Returns encoded image bytes (PNG or JPEG, whatever the provider sends).
  async fn generate(&self, prompt: &str) -> anyhow::Result<Vec<u8>>;
}

pub fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(Duration::from_secs(timeout_secs))
    .build()
    .context("Failed to build HTTP client")
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
  content: Option<String>,
}

pub struct OpenAiTextModel {
  http: reqwest::Client,
  base_url: String,
  api_key: String,
  model: String,
}

impl OpenAiTextModel {
  pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
    Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key: api_key.to_string(),
      model: model.to_string(),
    }
  }
}

#[async_trait]
impl TextModel for OpenAiTextModel {
  #[instrument(name = "ai::chat_completion", skip_all, fields(model = %self.model))]
  async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
    let body = json!({
      "model": self.model,
      "messages": [
        { "role": "system", "content": system_prompt },
        { "role": "user", "content": user_prompt },
      ],
      "temperature": 0.8,
    });

    let response = self
      .http
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .context("Chat completion request failed")?
      .error_for_status()
      .context("Chat completion returned an error status")?;

    let parsed: ChatResponse = response.json().await.context("Malformed chat completion response")?;
    let text = parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .map(|c| c.trim().to_string())
      .filter(|c| !c.is_empty())
      .ok_or_else(|| anyhow!("Chat completion contained no text"))?;

    debug!(chars = text.len(), "Chat completion received.");
    Ok(text)
  }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
  data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
  b64_json: Option<String>,
  url: Option<String>,
}

pub struct OpenAiImageModel {
  http: reqwest::Client,
  base_url: String,
  api_key: String,
  model: String,
}

impl OpenAiImageModel {
  pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
    Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key: api_key.to_string(),
      model: model.to_string(),
    }
  }
}

#[async_trait]
impl ImageModel for OpenAiImageModel {
  #[instrument(name = "ai::image_generation", skip_all, fields(model = %self.model))]
  async fn generate(&self, prompt: &str) -> anyhow::Result<Vec<u8>> {
    let body = json!({
      "model": self.model,
      "prompt": prompt,
      "n": 1,
      "size": "1024x1024",
      "response_format": "b64_json",
    });

    let response = self
      .http
      .post(format!("{}/images/generations", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .context("Image generation request failed")?
      .error_for_status()
      .context("Image generation returned an error status")?;

    let parsed: ImagesResponse = response.json().await.context("Malformed image generation response")?;
    let datum = parsed
      .data
      .into_iter()
      .next()
      .ok_or_else(|| anyhow!("Image generation returned no images"))?;

    let bytes = match (datum.b64_json, datum.url) {
      (Some(b64), _) => STANDARD.decode(b64.as_bytes()).context("Image payload is not valid base64")?,
      (None, Some(url)) => self
        .http
        .get(&url)
        .send()
        .await
        .context("Image download failed")?
        .error_for_status()?
        .bytes()
        .await?
        .to_vec(),
      (None, None) => bail!("Image generation returned neither data nor a URL"),
    };

    if bytes.is_empty() {
      bail!("Image generation returned an empty image");
    }
    Ok(bytes)
  }
}
