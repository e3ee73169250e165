//! Hierarchical description engine.
//!
//! A run walks the segments of a video in order. Every segment gets a level-1
//! description; every `level2_interval` seconds (and after the final segment)
//! the recent level-1 descriptions are folded into a level-2 plot summary; the
//! run ends with one level-3 overview of the whole video. Each call is fed
//! the output of the calls before it, so calls never overlap.
//!
//! Dropping the future returned by [`HierarchicalDescriptionEngine::process`]
//! abandons the run; the next call to `process` starts from a clean state.

use std::sync::Arc;

use crate::{
    client::{GenerationClient, GenerationError, GenerationRequest},
    config::{ConfigError, EngineConfig},
    prompt::{Level1Context, PromptFactory},
    report::{AnalysisReport, assemble},
    segment::SegmentPlanner,
    types::{Description, Level, VideoSegment},
};

/// Number of latest level-1 descriptions fed into a level-2 prompt.
pub const RECENT_LEVEL1_WINDOW: usize = 3;

/// A final segment ending this close to the total duration always gets a
/// level-2 summary.
pub const END_SLACK_SECS: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid video duration: {0}")]
    InvalidDuration(f64),

    #[error("{level} generation failed at {at_seconds:.1}s{}: {source}", segment_suffix(.segment_index))]
    Generation {
        level: Level,
        at_seconds: f64,
        segment_index: Option<usize>,
        source: GenerationError,
    },
}

fn segment_suffix(segment_index: &Option<usize>) -> String {
    segment_index
        .map(|i| format!(" (segment {i})"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Descriptions accumulated during one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    level1: Vec<Description>,
    level2: Vec<Description>,
    level3: Option<Description>,
}

impl EngineState {
    pub fn level1(&self) -> &[Description] {
        &self.level1
    }

    pub fn level2(&self) -> &[Description] {
        &self.level2
    }

    pub fn level3(&self) -> Option<&Description> {
        self.level3.as_ref()
    }

    pub fn latest_level2(&self) -> Option<&Description> {
        self.level2.last()
    }

    /// The last `count` level-1 descriptions, oldest first.
    pub fn recent_level1(&self, count: usize) -> &[Description] {
        let start = self.level1.len().saturating_sub(count);
        &self.level1[start..]
    }

    /// Level-1 descriptions newer than the latest level-2 summary.
    pub fn unsummarized_level1(&self) -> &[Description] {
        unsummarized(&self.level1, self.latest_level2())
    }

    pub fn level1_context(&self) -> Level1Context<'_> {
        Level1Context {
            previous_level1: self.level1.last().map(|d| d.content.as_str()),
            latest_level2: self.latest_level2().map(|d| d.content.as_str()),
        }
    }

    fn clear(&mut self) {
        self.level1.clear();
        self.level2.clear();
        self.level3 = None;
    }

    fn push(&mut self, description: Description) {
        match description.level {
            Level::Segment => self.level1.push(description),
            Level::Plot => self.level2.push(description),
            Level::Overview => self.level3 = Some(description),
        }
    }
}

/// Entries with `timestamp > latest_level2.timestamp`; all of them without a
/// level-2 summary. Relies on `level1` being in temporal order.
pub fn unsummarized<'a>(
    level1: &'a [Description],
    latest_level2: Option<&Description>,
) -> &'a [Description] {
    match latest_level2 {
        Some(latest) => {
            let start = level1.partition_point(|d| d.timestamp <= latest.timestamp);
            &level1[start..]
        }
        None => level1,
    }
}

/// Whether a level-2 summary follows `segment`.
///
/// Interval boundaries are checked on whole interval counts instead of float
/// modulo. The final segment always qualifies once it ends within
/// [`END_SLACK_SECS`] of the total duration.
pub fn should_emit_level2(
    segment: &VideoSegment,
    is_final: bool,
    level1_interval: u32,
    level2_interval: u32,
    total_duration: f64,
) -> bool {
    let elapsed_secs = (segment.segment_index as u64 + 1) * u64::from(level1_interval);
    let full_width = segment.end_time == elapsed_secs as f64;
    let on_boundary = full_width && elapsed_secs % u64::from(level2_interval) == 0;
    let at_end = is_final && segment.end_time >= total_duration - END_SLACK_SECS;
    on_boundary || at_end
}

type DescriptionObserver = Box<dyn Fn(&Description) + Send + Sync>;

pub struct HierarchicalDescriptionEngine {
    client: Arc<dyn GenerationClient>,
    config: EngineConfig,
    planner: SegmentPlanner,
    prompts: PromptFactory,
    state: EngineState,
    status: EngineStatus,
    observer: Option<DescriptionObserver>,
}

impl HierarchicalDescriptionEngine {
    pub fn new(client: Arc<dyn GenerationClient>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let planner = SegmentPlanner::new(f64::from(config.level1_interval))?;
        Ok(Self {
            client,
            prompts: PromptFactory::new(config.style),
            config,
            planner,
            state: EngineState::default(),
            status: EngineStatus::Idle,
            observer: None,
        })
    }

    /// Called after every stored description.
    pub fn on_description(mut self, observer: impl Fn(&Description) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Describe `media` (a reference the client understands) of
    /// `total_duration` seconds.
    ///
    /// On failure the partial descriptions are dropped and the error names
    /// the level and time that failed.
    pub async fn process(
        &mut self,
        media: &str,
        total_duration: f64,
    ) -> Result<AnalysisReport, EngineError> {
        self.state.clear();

        if !total_duration.is_finite() {
            self.status = EngineStatus::Failed;
            return Err(EngineError::InvalidDuration(total_duration));
        }

        self.status = EngineStatus::Running;
        tracing::info!(
            media,
            total_duration,
            level1_interval = self.config.level1_interval,
            level2_interval = self.config.level2_interval,
            "Starting hierarchical description"
        );

        match self.run(media, total_duration).await {
            Ok(()) => {
                self.status = EngineStatus::Completed;
                tracing::info!(
                    level1 = self.state.level1.len(),
                    level2 = self.state.level2.len(),
                    "Video processing completed"
                );
                Ok(assemble(media, total_duration, &self.state, &self.config))
            }
            Err(e) => {
                tracing::error!("Video processing failed: {e}");
                self.state.clear();
                self.status = EngineStatus::Failed;
                Err(e)
            }
        }
    }

    async fn run(&mut self, media: &str, total_duration: f64) -> Result<(), EngineError> {
        let mut segments = self.planner.plan(total_duration).peekable();

        while let Some(segment) = segments.next() {
            let is_final = segments.peek().is_none();
            self.describe_segment(media, &segment).await?;

            if should_emit_level2(
                &segment,
                is_final,
                self.config.level1_interval,
                self.config.level2_interval,
                total_duration,
            ) {
                self.summarize_plot(segment.end_time).await?;
            }
        }

        self.describe_overview(media, total_duration).await
    }

    async fn describe_segment(&mut self, media: &str, segment: &VideoSegment) -> Result<(), EngineError> {
        let prompt = self
            .prompts
            .level1_prompt(segment, &self.state.level1_context());
        let request = GenerationRequest::text(&prompt, self.config.options)
            .with_media(media)
            .with_window(segment.window());

        let content = self
            .call(request, Level::Segment, segment.start_time, Some(segment.segment_index))
            .await?;

        self.store(Description {
            level: Level::Segment,
            timestamp: segment.start_time,
            content,
            segment_index: segment.segment_index,
        });
        Ok(())
    }

    async fn summarize_plot(&mut self, current_time: f64) -> Result<(), EngineError> {
        let prompt = self.prompts.level2_prompt(
            self.state.recent_level1(RECENT_LEVEL1_WINDOW),
            self.state.latest_level2(),
            current_time,
        );
        // plot summaries work from the level-1 text alone
        let request = GenerationRequest::text(&prompt, self.config.options);

        let content = self.call(request, Level::Plot, current_time, None).await?;

        let segment_index = self.state.level2.len();
        self.store(Description {
            level: Level::Plot,
            timestamp: current_time,
            content,
            segment_index,
        });
        Ok(())
    }

    async fn describe_overview(&mut self, media: &str, total_duration: f64) -> Result<(), EngineError> {
        let prompt = self.prompts.level3_prompt(
            self.state.unsummarized_level1(),
            self.state.latest_level2(),
            total_duration,
        );
        let request = GenerationRequest::text(&prompt, self.config.options).with_media(media);

        let content = self.call(request, Level::Overview, total_duration, None).await?;

        self.store(Description {
            level: Level::Overview,
            timestamp: total_duration,
            content,
            segment_index: 0,
        });
        Ok(())
    }

    async fn call(
        &self,
        request: GenerationRequest<'_>,
        level: Level,
        at_seconds: f64,
        segment_index: Option<usize>,
    ) -> Result<String, EngineError> {
        tracing::debug!(%level, at_seconds, prompt_chars = request.prompt.len(), "Requesting description");

        let failed = |source| EngineError::Generation {
            level,
            at_seconds,
            segment_index,
            source,
        };

        let content = self.client.generate(request).await.map_err(failed)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(failed(GenerationError::EmptyResponse));
        }
        Ok(content.to_string())
    }

    fn store(&mut self, description: Description) {
        tracing::info!(
            level = %description.level,
            index = description.segment_index,
            timestamp = description.timestamp,
            "Generated description"
        );
        if let Some(observer) = &self.observer {
            observer(&description);
        }
        self.state.push(description);
    }
}
