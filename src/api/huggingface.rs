use super::{CaptionBackend, TextBackend};
use crate::config::GenerationParams;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Hugging Face 兼容的推理服务客户端，同时提供图片描述和文本生成
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ModelStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HuggingFaceClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    fn status_url(&self, model: &str) -> String {
        format!("{}/status/{}", self.base_url, model)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// 查询模型状态，服务拒绝或模型过大都算加载失败
    async fn check_status(&self, model: &str) -> Result<()> {
        let url = self.status_url(model);
        debug!("Probing model status: {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(VideoError::Api(format!(
                "model {} unavailable (HTTP {}): {}",
                model, status, body
            )));
        }

        let model_status: ModelStatus = serde_json::from_str(&body)?;
        if let Some(error) = model_status.error {
            return Err(VideoError::Api(format!("model {}: {}", model, error)));
        }
        if model_status.state.as_deref() == Some("TooBig") {
            return Err(VideoError::Api(format!(
                "model {} is too big for the inference service",
                model
            )));
        }

        Ok(())
    }

    async fn post_inference(&self, model: &str, request: reqwest::RequestBuilder) -> Result<String> {
        let response = self
            .authorize(request)
            .header("x-wait-for-model", "true")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(VideoError::Api(format!(
                "Inference API error for {} (HTTP {}): {}",
                model, status, error_text
            )));
        }

        let response_json: serde_json::Value = response.json().await?;
        parse_generated_text(&response_json)
    }
}

#[async_trait]
impl CaptionBackend for HuggingFaceClient {
    async fn load(&self, model: &str) -> Result<()> {
        self.check_status(model).await
    }

    async fn caption(&self, model: &str, image_path: &Path) -> Result<String> {
        let image_data = tokio::fs::read(image_path).await?;
        let request = self
            .client
            .post(self.model_url(model))
            .header("Content-Type", image_mime(image_path))
            .body(image_data);

        let caption = self.post_inference(model, request).await?;
        Ok(caption.trim().to_string())
    }
}

#[async_trait]
impl TextBackend for HuggingFaceClient {
    async fn load(&self, model: &str) -> Result<()> {
        self.check_status(model).await
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String> {
        info!("Generating text with {} ({} prompt characters)", model, prompt.len());

        let request = self.client.post(self.model_url(model)).json(&request_body(prompt, params));
        self.post_inference(model, request).await
    }
}

/// 文本生成请求体
fn request_body(prompt: &str, params: &GenerationParams) -> serde_json::Value {
    json!({
        "inputs": prompt,
        "parameters": {
            "max_new_tokens": params.max_new_tokens,
            "no_repeat_ngram_size": params.no_repeat_ngram_size,
            "temperature": params.temperature,
            "num_return_sequences": params.num_return_sequences,
            "do_sample": params.do_sample,
            "return_full_text": params.return_full_text
        },
        "options": {
            "use_cache": false
        }
    })
}

/// 取出 `[{"generated_text": ...}]` 或 `{"generated_text": ...}` 中的文本
fn parse_generated_text(value: &serde_json::Value) -> Result<String> {
    let first = match value {
        serde_json::Value::Array(items) => items.first(),
        other => Some(other),
    };

    first
        .and_then(|item| item["generated_text"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            VideoError::Api(format!("Failed to extract generated text from {}", value))
        })
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
