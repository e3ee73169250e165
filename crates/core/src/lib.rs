pub mod cache;
pub mod client;
pub mod config;
pub mod duration;
pub mod engine;
pub mod error;
pub mod format;
pub mod gemini;
pub mod media;
pub mod prompt;
pub mod provider;
pub mod qa;
pub mod report;
pub mod retry;
pub mod segment;
pub mod types;

pub use cache::{get_analysis_path, get_cache_dir, get_qa_path, get_root_cache_dir};
pub use client::{GenerationClient, GenerationError, GenerationRequest};
pub use config::{ConfigError, EngineConfig, GenerationOptions};
pub use duration::{DurationProbe, DurationResolver, FixedDuration};
pub use engine::{EngineError, EngineState, EngineStatus, HierarchicalDescriptionEngine};
pub use error::ReportError;
pub use format::{format_qa_readable, format_report_readable, format_timestamp};
pub use gemini::GeminiClient;
pub use media::MediaSource;
pub use prompt::{PromptFactory, PromptStyle};
pub use provider::{DEFAULT_MODEL, GeminiConfig};
pub use qa::{LevelQa, QaGenerator, QaPair, load_qa_results, save_qa_results};
pub use report::{AnalysisReport, load_report, save_report};
pub use retry::RetryPolicy;
pub use segment::{SegmentPlanner, plan_segments};
pub use types::{Description, Level, TimeWindow, VideoSegment};
