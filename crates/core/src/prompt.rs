//! Prompt templates for the three description levels.
//!
//! Every function here is pure: identical inputs render byte-identical text,
//! which is what lets the engine be tested against a scripted model.

use std::fmt::Write;

use crate::types::{Description, VideoSegment};

/// Template generation to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Rich checklist for level 1, longer summaries
    #[default]
    Detailed,
    /// Short checklist, shorter summaries
    Concise,
}

impl PromptStyle {
    fn sentences(self) -> (&'static str, &'static str, &'static str) {
        match self {
            PromptStyle::Detailed => ("3-5", "5-7", "7-10"),
            PromptStyle::Concise => ("2-3", "3-5", "4-6"),
        }
    }
}

/// Context fed into a level-1 prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Level1Context<'a> {
    pub previous_level1: Option<&'a str>,
    pub latest_level2: Option<&'a str>,
}

const DETAILED_LEVEL1_FOCUS: &str = r#"Primary elements:
- Actions: all human and object movements, gestures and interactions
- Scene composition: spatial relationships, camera angles and framing changes
- Temporal progression: the sequence of events and their causal relationships

Secondary elements:
- Visual details: colors, lighting, textures and environmental context
- Audio-visual sync: dialogue, sound effects, music and how they relate to the visuals
- Narrative significance: plot advancement, character development or thematic elements

Write a flowing narrative that captures both the literal events and their meaning within the broader video. Prefer clarity and specificity over brevity.
"#;

const CONCISE_LEVEL1_FOCUS: &str = r#"Focus on:
- Actions and movements of people and objects
- Visual changes and transitions
- Details that advance the plot or narrative
- Dialogue or audio cues if relevant
"#;

const LEVEL3_FOCUS: &str = r#"Analyze the entire video and capture:
- The complete narrative arc
- Key themes and messages
- Main characters and their roles
- Important visual or audio elements
- Overall tone and style
"#;

/// Renders level-1 prompts (one segment), level-2 prompts (running plot
/// summary) and level-3 prompts (whole-video overview).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptFactory {
    style: PromptStyle,
}

impl PromptFactory {
    pub fn new(style: PromptStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn level1_prompt(&self, segment: &VideoSegment, context: &Level1Context<'_>) -> String {
        let (sentences, _, _) = self.style.sentences();
        let mut prompt = format!(
            "You are analyzing the video segment from {:.1}s to {:.1}s. Describe only the events inside this window.\n\n",
            segment.start_time, segment.end_time
        );
        prompt.push_str(match self.style {
            PromptStyle::Detailed => DETAILED_LEVEL1_FOCUS,
            PromptStyle::Concise => CONCISE_LEVEL1_FOCUS,
        });
        prompt.push('\n');

        if let Some(previous) = context.previous_level1 {
            let _ = write!(prompt, "Previous segment description: {}\n\n", previous);
        }
        if let Some(plot) = context.latest_level2 {
            let _ = write!(prompt, "Overall plot summary so far: {}\n\n", plot);
        }

        let _ = write!(
            prompt,
            "Describe what happens in the current segment in {} sentences:",
            sentences
        );
        prompt
    }

    pub fn level2_prompt(
        &self,
        recent_level1: &[Description],
        latest_level2: Option<&Description>,
        current_time: f64,
    ) -> String {
        let (_, sentences, _) = self.style.sentences();
        let mut prompt = format!(
            "You are creating a plot summary for a video up to {:.1} seconds.\n\n",
            current_time
        );

        if let Some(previous) = latest_level2 {
            let _ = write!(prompt, "Previous plot summary: {}\n\n", previous.content);
        }

        prompt.push_str("Recent events:\n");
        push_events(&mut prompt, recent_level1);

        let _ = write!(
            prompt,
            "\nProvide an updated plot summary that incorporates these recent events. Keep it concise but comprehensive ({} sentences):",
            sentences
        );
        prompt
    }

    pub fn level3_prompt(
        &self,
        unsummarized_level1: &[Description],
        latest_level2: Option<&Description>,
        total_duration: f64,
    ) -> String {
        let (_, _, sentences) = self.style.sentences();
        let mut prompt = format!(
            "You are creating a complete overview of this {:.1}-second video.\n\n",
            total_duration
        );
        prompt.push_str(LEVEL3_FOCUS);
        prompt.push('\n');

        if let Some(plot) = latest_level2 {
            let _ = write!(
                prompt,
                "Main plot summary from earlier analysis: {}\n\n",
                plot.content
            );
        }

        if !unsummarized_level1.is_empty() {
            prompt.push_str("Final events not yet summarized:\n");
            push_events(&mut prompt, unsummarized_level1);
            prompt.push('\n');
        }

        let _ = write!(
            prompt,
            "Provide a comprehensive description of the entire video that would serve as a standalone summary ({} sentences):",
            sentences
        );
        prompt
    }
}

fn push_events(prompt: &mut String, events: &[Description]) {
    for desc in events {
        let _ = writeln!(prompt, "- At {:.1}s: {}", desc.timestamp, desc.content);
    }
}
