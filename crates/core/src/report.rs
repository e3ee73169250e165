use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    config::EngineConfig,
    engine::EngineState,
    error::ReportError,
    types::{Description, Level},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionEntry {
    pub timestamp: f64,
    pub content: String,
    pub segment_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewEntry {
    pub timestamp: f64,
    pub content: String,
}

/// Exported record of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Reference handed to the model (URL or uploaded file URI)
    pub media_ref: String,
    /// What the user passed in, when it differs from `media_ref` (local files)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub duration: f64,
    #[serde(default = "default_level1_interval")]
    pub level1_interval: u32,
    #[serde(default = "default_level2_interval")]
    pub level2_interval: u32,
    pub processing_timestamp: String,
    pub level1_descriptions: Vec<DescriptionEntry>,
    pub level2_descriptions: Vec<DescriptionEntry>,
    pub level3_description: Option<OverviewEntry>,
}

/// Part of the video one exported description covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<'a> {
    pub start: f64,
    pub end: f64,
    pub content: &'a str,
}

impl AnalysisReport {
    /// Time ranges of the descriptions of one level, from their timestamps.
    ///
    /// A level-1 entry starts at its timestamp and runs one interval (clamped
    /// to the duration); a level-2 summary covers everything since the
    /// previous summary; the overview covers the whole video.
    pub fn spans(&self, level: Level) -> Vec<Span<'_>> {
        match level {
            Level::Segment => self
                .level1_descriptions
                .iter()
                .map(|entry| Span {
                    start: entry.timestamp,
                    end: (entry.timestamp + f64::from(self.level1_interval)).min(self.duration),
                    content: &entry.content,
                })
                .collect(),
            Level::Plot => {
                let mut previous = 0.0;
                self.level2_descriptions
                    .iter()
                    .map(|entry| {
                        let span = Span {
                            start: previous,
                            end: entry.timestamp,
                            content: &entry.content,
                        };
                        previous = entry.timestamp;
                        span
                    })
                    .collect()
            }
            Level::Overview => self
                .level3_description
                .iter()
                .map(|overview| Span {
                    start: 0.0,
                    end: overview.timestamp,
                    content: &overview.content,
                })
                .collect(),
        }
    }
}

fn default_level1_interval() -> u32 {
    10
}

fn default_level2_interval() -> u32 {
    30
}

fn entries(descriptions: &[Description]) -> Vec<DescriptionEntry> {
    descriptions
        .iter()
        .map(|d| DescriptionEntry {
            timestamp: d.timestamp,
            content: d.content.clone(),
            segment_index: d.segment_index,
        })
        .collect()
}

/// Builds the exported record from the state of a run.
pub fn assemble(
    media_ref: &str,
    duration: f64,
    state: &EngineState,
    config: &EngineConfig,
) -> AnalysisReport {
    AnalysisReport {
        media_ref: media_ref.to_string(),
        source: None,
        model: None,
        duration,
        level1_interval: config.level1_interval,
        level2_interval: config.level2_interval,
        processing_timestamp: chrono::Local::now().to_rfc3339(),
        level1_descriptions: entries(state.level1()),
        level2_descriptions: entries(state.level2()),
        level3_description: state.level3().map(|d| OverviewEntry {
            timestamp: d.timestamp,
            content: d.content.clone(),
        }),
    }
}

/// Load a report from a file
pub async fn load_report(path: &Path) -> Result<AnalysisReport, ReportError> {
    let json_content = fs::read_to_string(path).await?;
    let report: AnalysisReport = serde_json::from_str(&json_content)?;
    Ok(report)
}

/// Save a report to a file
pub async fn save_report(report: &AnalysisReport, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(report)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_exports_null_overview() {
        let report = assemble("files/abc", 0.0, &EngineState::default(), &EngineConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["level3_description"].is_null());
        assert_eq!(json["level1_descriptions"], serde_json::json!([]));
        assert_eq!(json["media_ref"], "files/abc");
        assert!(json.get("source").is_none());
        assert!(
            chrono::DateTime::parse_from_rfc3339(json["processing_timestamp"].as_str().unwrap())
                .is_ok()
        );
    }

    #[test]
    fn reads_records_without_interval_fields() {
        let json = r#"{
            "media_ref": "https://www.youtube.com/watch?v=x",
            "duration": 20.0,
            "processing_timestamp": "2025-06-01T10:00:00+00:00",
            "level1_descriptions": [
                {"timestamp": 0.0, "content": "a", "segment_index": 0},
                {"timestamp": 10.0, "content": "b", "segment_index": 1}
            ],
            "level2_descriptions": [],
            "level3_description": {"timestamp": 20.0, "content": "all"}
        }"#;
        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.level1_interval, 10);
        assert_eq!(report.level2_interval, 30);
        assert_eq!(report.model, None);
        assert_eq!(report.level3_description.unwrap().content, "all");
    }

    fn entry(timestamp: f64, segment_index: usize) -> DescriptionEntry {
        DescriptionEntry {
            timestamp,
            content: format!("at {timestamp}"),
            segment_index,
        }
    }

    #[test]
    fn spans_follow_timestamps() {
        let mut report = assemble("files/abc", 60.0, &EngineState::default(), &EngineConfig::default());
        report.level2_interval = 25;
        report.level1_descriptions = (0..6).map(|i| entry(i as f64 * 10.0, i)).collect();
        report.level2_descriptions = vec![entry(50.0, 0), entry(60.0, 1)];
        report.level3_description = Some(OverviewEntry {
            timestamp: 60.0,
            content: "all".to_string(),
        });

        let plot: Vec<_> = report
            .spans(Level::Plot)
            .iter()
            .map(|s| (s.start, s.end))
            .collect();
        assert_eq!(plot, vec![(0.0, 50.0), (50.0, 60.0)]);

        let segments = report.spans(Level::Segment);
        assert_eq!((segments[5].start, segments[5].end), (50.0, 60.0));
        assert_eq!(segments[2].content, "at 20");

        let overview = report.spans(Level::Overview);
        assert_eq!((overview[0].start, overview[0].end), (0.0, 60.0));
    }

    #[test]
    fn trailing_segment_span_is_clamped() {
        let mut report = assemble("files/abc", 65.0, &EngineState::default(), &EngineConfig::default());
        report.level1_descriptions = vec![entry(60.0, 6)];
        let spans = report.spans(Level::Segment);
        assert_eq!((spans[0].start, spans[0].end), (60.0, 65.0));
    }

    #[tokio::test]
    async fn load_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_report(&missing).await,
            Err(ReportError::IoError(_))
        ));

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(
            load_report(&corrupt).await,
            Err(ReportError::JsonError(_))
        ));
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("analysis.json");
        let mut report = assemble("files/abc", 12.5, &EngineState::default(), &EngineConfig::default());
        report.model = Some("models/gemini-2.5-flash".to_string());

        save_report(&report, &path).await.unwrap();
        let loaded = load_report(&path).await.unwrap();
        assert_eq!(loaded, report);
    }
}
