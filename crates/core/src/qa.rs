//! Question-answer pairs generated from video descriptions.
//!
//! Generation is best effort: malformed model output is retried a few times
//! and then gives up with an empty list instead of failing the batch.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    client::{GenerationClient, GenerationError, GenerationRequest},
    config::GenerationOptions,
    error::ReportError,
    report::AnalysisReport,
    retry::{RetryPolicy, with_retries},
    types::Level,
};

pub const DEFAULT_TASK_DEFINITIONS: &str = r#"1. Scene: where and when the video takes place.
   Example: {"Dimension": "Scene", "Question": "Where does the conversation happen?", "Answer": "In a small kitchen at night."}
2. Character: who appears and what distinguishes them.
   Example: {"Dimension": "Character", "Question": "What is the man in the red jacket carrying?", "Answer": "A wooden toolbox."}
3. Action: what the people or objects do.
   Example: {"Dimension": "Action", "Question": "What does the girl do after opening the door?", "Answer": "She switches on the light and looks around."}
4. Temporal order: the sequence in which events happen.
   Example: {"Dimension": "Temporal order", "Question": "What happens right before the car stops?", "Answer": "A dog runs across the road."}
5. Causality: why something happens or what it leads to.
   Example: {"Dimension": "Causality", "Question": "Why does the crowd start cheering?", "Answer": "Because the runner crosses the finish line first."}
6. Counting: how many people, objects or repetitions appear.
   Example: {"Dimension": "Counting", "Question": "How many candles are on the cake?", "Answer": "Five."}
7. Emotion: the mood of the characters or of the video.
   Example: {"Dimension": "Emotion", "Question": "How does the boy react to the gift?", "Answer": "He is surprised and then laughs."}
8. Summary: the overall point or story of the video.
   Example: {"Dimension": "Summary", "Question": "What is the video mainly about?", "Answer": "A family preparing a surprise party."}
"#;

const OUTPUT_RULES: &str = r#"### Output format requirements:
1. Your output MUST be ONLY a valid JSON array with no additional text.
2. Do not include any explanation, preamble, or conclusion.
3. Do not wrap the JSON in code blocks or markdown.
4. Each object in the array must have exactly these three keys: "Dimension", "Question", "Answer".
5. All JSON syntax must be strictly valid with proper quotes, commas, and brackets.
6. Escape quotes inside strings.
7. Do not use line breaks inside string values.

Expected JSON structure:
[
  {"Dimension": "<dimension-1>", "Question": "<question-1>", "Answer": "<answer-1>"},
  {"Dimension": "<dimension-2>", "Question": "<question-2>", "Answer": "<answer-2>"}
]"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QaPair {
    #[serde(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Answer")]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelQa {
    pub level: u8,
    pub qa_pairs: Vec<QaPair>,
}

#[derive(Debug, thiserror::Error)]
pub enum QaParseError {
    #[error("Response does not contain a JSON array")]
    NoJsonArray,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("QA pair {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

#[derive(Debug, thiserror::Error)]
enum QaAttemptError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Parse(#[from] QaParseError),
}

/// Extracts the JSON array between the first `[` and the last `]` and checks
/// that every entry has exactly the string fields `Dimension`, `Question` and
/// `Answer`.
pub fn parse_qa_pairs(text: &str) -> Result<Vec<QaPair>, QaParseError> {
    let text = text.trim();
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Err(QaParseError::NoJsonArray);
    };
    if start > end {
        return Err(QaParseError::NoJsonArray);
    }

    let entries: Vec<serde_json::Value> = serde_json::from_str(&text[start..=end])?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<QaPair>(entry).map_err(|e| QaParseError::InvalidEntry {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

pub struct QaGenerator {
    client: Arc<dyn GenerationClient>,
    task_definitions: String,
    options: GenerationOptions,
    retry: RetryPolicy,
}

impl QaGenerator {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            task_definitions: DEFAULT_TASK_DEFINITIONS.to_string(),
            options: GenerationOptions {
                max_output_tokens: 8192,
                temperature: 0.5,
            },
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_task_definitions(mut self, task_definitions: impl Into<String>) -> Self {
        self.task_definitions = task_definitions.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn system_instruction(&self) -> String {
        format!(
            r#"### Task:
Given a detailed description that summarizes the content of a video, generate question-answer pairs based on the description to help humans better understand the video. The question-answer pairs should be faithful to the content of the video description and developed from different dimensions to promote comprehensive understanding of the video.

Here are the question dimensions with explanations and example question-answer pairs for reference:
{}

### Guidelines:
- Read the description carefully, paying attention to the scene, the main characters and their behaviors, and how the events develop.
- Generate question-answer pairs that stay faithful to the description and cover as many dimensions as possible.
- Generate 1 question-answer pair for each dimension that fits the video content.
- Aim for diverse, non-trivial questions.

{}"#,
            self.task_definitions.trim_end(),
            OUTPUT_RULES
        )
    }

    pub fn user_message(description: &str) -> String {
        format!(
            "Please generate question-answer pairs for the following video description:\n\nDescription: {description}\n\nIMPORTANT: Your response MUST be a valid JSON array containing ONLY the question-answer pairs. No explanations, no code blocks, no additional text - just the JSON array."
        )
    }

    /// QA pairs for one description; empty when every attempt failed.
    pub async fn generate_qa_pairs(&self, description: &str) -> Vec<QaPair> {
        let system = self.system_instruction();
        let user = Self::user_message(description);

        let result = with_retries(self.retry, |_| true, |attempt| {
            self.attempt(attempt, &system, &user)
        })
        .await;

        match result {
            Ok(pairs) => {
                tracing::info!(count = pairs.len(), "Generated QA pairs");
                pairs
            }
            Err(e) => {
                tracing::warn!(
                    attempts = self.retry.max_attempts,
                    "Giving up on QA generation: {e}"
                );
                Vec::new()
            }
        }
    }

    async fn attempt(
        &self,
        attempt: u32,
        system: &str,
        user: &str,
    ) -> Result<Vec<QaPair>, QaAttemptError> {
        tracing::info!(attempt, "Generating QA pairs");
        let request = GenerationRequest::text(user, self.options).with_system_instruction(system);
        let text = self.client.generate(request).await?;
        tracing::debug!(raw = %text, "QA response");
        Ok(parse_qa_pairs(&text)?)
    }

    /// Generates QA pairs for the requested levels of a report. Levels with
    /// no descriptions are skipped.
    pub async fn process_report(&self, report: &AnalysisReport, levels: &[Level]) -> Vec<LevelQa> {
        let mut results = Vec::new();
        for &level in levels {
            let Some(text) = level_description_text(report, level) else {
                tracing::warn!(%level, "No descriptions found");
                continue;
            };
            tracing::info!(%level, chars = text.len(), "Processing descriptions");
            results.push(LevelQa {
                level: level.number(),
                qa_pairs: self.generate_qa_pairs(&text).await,
            });
        }
        results
    }
}

/// Text fed to the QA model for one level of a report.
///
/// Level-1 and level-2 entries are labelled with the window they cover;
/// the overview is passed as is.
pub fn level_description_text(report: &AnalysisReport, level: Level) -> Option<String> {
    let spans = report.spans(level);
    if level == Level::Overview {
        return spans
            .first()
            .map(|overview| overview.content.to_string())
            .filter(|content| !content.trim().is_empty());
    }
    if spans.is_empty() {
        return None;
    }

    let lines = spans
        .iter()
        .map(|span| format!("From {:.1}s to {:.1}s: {}", span.start, span.end, span.content))
        .collect::<Vec<_>>();
    Some(lines.join("\n"))
}

pub async fn load_qa_results(path: &Path) -> Result<Vec<LevelQa>, ReportError> {
    let json_content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json_content)?)
}

pub async fn save_qa_results(results: &[LevelQa], path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, serde_json::to_string_pretty(results)?).await?;
    Ok(())
}
