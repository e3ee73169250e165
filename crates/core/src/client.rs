use async_trait::async_trait;
use serde_json::Value;

use crate::{config::GenerationOptions, types::TimeWindow};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Transient generation failure{}: {reason}", status_suffix(.status))]
    Transient { status: Option<u16>, reason: String },

    #[error("Generation failed{}: {reason}", status_suffix(.status))]
    Permanent { status: Option<u16>, reason: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl GenerationError {
    /// Build an error from a non-success HTTP status; 429 and 5xx are transient.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 || (500..600).contains(&status) {
            GenerationError::Transient {
                status: Some(status),
                reason: body,
            }
        } else {
            GenerationError::Permanent {
                status: Some(status),
                reason: body,
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Transient { .. } => true,
            GenerationError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// One call to the generative model.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Media reference (URL or uploaded file URI); `None` for text-only calls
    pub media: Option<&'a str>,
    /// Restricts the model to part of the media
    pub window: Option<TimeWindow>,
    pub prompt: &'a str,
    pub system_instruction: Option<&'a str>,
    pub options: GenerationOptions,
}

impl<'a> GenerationRequest<'a> {
    pub fn text(prompt: &'a str, options: GenerationOptions) -> Self {
        Self {
            media: None,
            window: None,
            prompt,
            system_instruction: None,
            options,
        }
    }

    pub fn with_media(mut self, media: &'a str) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_system_instruction(mut self, instruction: &'a str) -> Self {
        self.system_instruction = Some(instruction);
        self
    }
}

/// Text + media in, text out. Implementations own their retry policy.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError>;
}

/// Builds a `generateContent` request body.
pub fn build_request_body(request: &GenerationRequest<'_>) -> Value {
    let mut parts = Vec::new();
    if let Some(uri) = request.media {
        let mut part = serde_json::json!({
            "fileData": { "fileUri": uri },
        });
        if let Some(window) = request.window {
            part["videoMetadata"] = serde_json::json!({
                "startOffset": window.start_offset(),
                "endOffset": window.end_offset(),
            });
        }
        parts.push(part);
    }
    parts.push(serde_json::json!({ "text": request.prompt }));

    let mut body = serde_json::json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "maxOutputTokens": request.options.max_output_tokens,
            "temperature": request.options.temperature,
        },
    });
    if let Some(instruction) = request.system_instruction {
        body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": instruction }] });
    }
    body
}

/// Concatenates the text parts of the first candidate.
pub fn extract_text(response: &Value) -> Result<String, GenerationError> {
    if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
        return Err(GenerationError::Permanent {
            status: None,
            reason: format!("prompt blocked: {reason}"),
        });
    }

    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or(GenerationError::EmptyResponse)?;

    let text = parts
        .iter()
        .filter(|part| part["thought"].as_bool() != Some(true))
        .filter_map(|part| part["text"].as_str())
        .collect::<String>();

    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text.to_string())
}
