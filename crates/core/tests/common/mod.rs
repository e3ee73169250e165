#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use storyline_core::{GenerationClient, GenerationError, GenerationRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub media: Option<String>,
    pub window: Option<(String, String)>,
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub temperature: f32,
}

type Responder = Box<dyn Fn(usize, &RecordedCall) -> Result<String, GenerationError> + Send + Sync>;

/// In-memory [`GenerationClient`] that records every request and answers
/// through a closure keyed on the 0-based call number.
pub struct ScriptedClient {
    calls: Mutex<Vec<RecordedCall>>,
    responder: Responder,
}

impl ScriptedClient {
    pub fn new(
        responder: impl Fn(usize, &RecordedCall) -> Result<String, GenerationError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Answers `description #N`.
    pub fn numbered() -> Self {
        Self::new(|n, _| Ok(format!("description #{n}")))
    }

    /// Same as [`ScriptedClient::numbered`] but fails the `fail_at` call.
    pub fn failing_at(fail_at: usize) -> Self {
        Self::new(move |n, _| {
            if n == fail_at {
                Err(GenerationError::Permanent {
                    status: Some(400),
                    reason: "scripted failure".to_string(),
                })
            } else {
                Ok(format!("description #{n}"))
            }
        })
    }

    /// Answers with the given texts in order, repeating the last one.
    pub fn replies(replies: Vec<&'static str>) -> Self {
        Self::new(move |n, _| {
            let reply = replies.get(n).or(replies.last()).copied().unwrap_or_default();
            Ok(reply.to_string())
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        let call = RecordedCall {
            media: request.media.map(str::to_string),
            window: request
                .window
                .map(|w| (w.start_offset(), w.end_offset())),
            prompt: request.prompt.to_string(),
            system_instruction: request.system_instruction.map(str::to_string),
            temperature: request.options.temperature,
        };
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call.clone());
            calls.len() - 1
        };
        (self.responder)(index, &call)
    }
}
