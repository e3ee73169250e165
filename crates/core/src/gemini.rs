use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::{
    client::{GenerationClient, GenerationError, GenerationRequest, build_request_body, extract_text},
    media::video_mime_type,
    provider::GeminiConfig,
    retry::with_retries,
};

const UPLOAD_POLL_LIMIT: u32 = 150;

/// Gemini REST client (`generateContent` + Files API upload).
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate_once(&self, body: &Value) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status.as_u16(), text));
        }

        let response = response.json::<Value>().await?;
        tracing::debug!(response = %response, "generateContent response");
        extract_text(&response)
    }

    /// Upload a local video with the resumable Files API and wait until it is
    /// usable. Returns the file URI.
    pub async fn upload_file(&self, path: &Path) -> Result<String, GenerationError> {
        let bytes = fs::read(path).await?;
        let mime_type = video_mime_type(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        tracing::info!(path = %path.display(), size = bytes.len(), mime_type, "Uploading video");

        let start = self
            .http
            .post(&self.config.upload_url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;

        let status = start.status();
        if !status.is_success() {
            let text = start.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status.as_u16(), text));
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Permanent {
                status: None,
                reason: "upload session did not return an upload URL".to_string(),
            })?;

        let finished = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        let status = finished.status();
        if !status.is_success() {
            let text = finished.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status.as_u16(), text));
        }

        let file = finished.json::<Value>().await?;
        let name = file["file"]["name"]
            .as_str()
            .ok_or_else(|| GenerationError::Permanent {
                status: None,
                reason: format!("Invalid upload response: {file}"),
            })?
            .to_string();

        let uri = self.wait_until_active(&name).await?;
        tracing::info!(%uri, "Video uploaded");
        Ok(uri)
    }

    async fn wait_until_active(&self, name: &str) -> Result<String, GenerationError> {
        for _ in 0..UPLOAD_POLL_LIMIT {
            let response = self
                .http
                .get(self.config.file_url(name))
                .header("x-goog-api-key", &self.config.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(GenerationError::from_status(status.as_u16(), text));
            }

            let file = response.json::<Value>().await?;
            match file["state"].as_str() {
                Some("ACTIVE") => {
                    return file["uri"]
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| GenerationError::Permanent {
                            status: None,
                            reason: format!("Active file has no uri: {file}"),
                        });
                }
                Some("FAILED") => {
                    return Err(GenerationError::Permanent {
                        status: None,
                        reason: format!("Processing failed for {name}: {}", file["error"]),
                    });
                }
                state => {
                    tracing::debug!(name, ?state, "Waiting for uploaded file");
                    tokio::time::sleep(self.config.upload_poll_interval).await;
                }
            }
        }

        Err(GenerationError::Transient {
            status: None,
            reason: format!("{name} did not become active in time"),
        })
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        let body = build_request_body(&request);
        tracing::debug!(
            prompt_chars = request.prompt.len(),
            media = request.media.unwrap_or("-"),
            "Calling generateContent"
        );

        with_retries(self.config.retry, GenerationError::is_transient, |_| {
            self.generate_once(&body)
        })
        .await
    }
}
