//! Video duration lookup.
//!
//! Strategies are tried in order; the first positive, finite answer wins. If
//! every strategy fails the resolver falls back to a fixed duration so that
//! segment planning can still go ahead.

use async_trait::async_trait;
use tokio::process::Command;

use crate::media::MediaSource;

pub const DEFAULT_FALLBACK_DURATION: f64 = 300.0;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{probe} cannot handle {source_kind}")]
    Unsupported {
        probe: &'static str,
        source_kind: &'static str,
    },

    #[error("{probe} failed: {reason}")]
    Failed { probe: &'static str, reason: String },

    #[error("Unhandled io error. {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait DurationProbe: Send + Sync {
    fn name(&self) -> &'static str;
    async fn probe(&self, source: &MediaSource) -> Result<f64, ProbeError>;
}

/// Always answers with a known duration (e.g. `--duration` on the command line).
pub struct FixedDuration(pub f64);

#[async_trait]
impl DurationProbe for FixedDuration {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn probe(&self, _source: &MediaSource) -> Result<f64, ProbeError> {
        Ok(self.0)
    }
}

/// Asks yt-dlp for the duration of a remote video without downloading it.
pub struct YtDlpProbe;

#[async_trait]
impl DurationProbe for YtDlpProbe {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, source: &MediaSource) -> Result<f64, ProbeError> {
        let MediaSource::Remote(url) = source else {
            return Err(ProbeError::Unsupported {
                probe: self.name(),
                source_kind: "local files",
            });
        };
        if !source.is_http() {
            return Err(ProbeError::Unsupported {
                probe: self.name(),
                source_kind: "non-http references",
            });
        }

        let output = Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--print")
            .arg("duration")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                probe: self.name(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_seconds(self.name(), &String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads the container duration with ffprobe (local files and plain http URLs).
pub struct FfprobeProbe;

#[async_trait]
impl DurationProbe for FfprobeProbe {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, source: &MediaSource) -> Result<f64, ProbeError> {
        let target = match source {
            MediaSource::Local(path) => path.to_string_lossy().to_string(),
            MediaSource::Remote(url) if source.is_http() && !source.is_youtube() => url.clone(),
            MediaSource::Remote(_) => {
                return Err(ProbeError::Unsupported {
                    probe: self.name(),
                    source_kind: "this remote reference",
                });
            }
        };

        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(&target)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                probe: self.name(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_seconds(self.name(), &String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses the first line of tool output as seconds.
pub fn parse_seconds(probe: &'static str, output: &str) -> Result<f64, ProbeError> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    line.parse::<f64>().map_err(|_| ProbeError::Failed {
        probe,
        reason: format!("unexpected output {line:?}"),
    })
}

pub struct DurationResolver {
    probes: Vec<Box<dyn DurationProbe>>,
    fallback: f64,
}

impl Default for DurationResolver {
    fn default() -> Self {
        Self::new(vec![Box::new(YtDlpProbe), Box::new(FfprobeProbe)])
    }
}

impl DurationResolver {
    pub fn new(probes: Vec<Box<dyn DurationProbe>>) -> Self {
        Self {
            probes,
            fallback: DEFAULT_FALLBACK_DURATION,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        if fallback.is_finite() && fallback > 0.0 {
            self.fallback = fallback;
        }
        self
    }

    /// Put a probe in front of the others.
    pub fn prepend(mut self, probe: Box<dyn DurationProbe>) -> Self {
        self.probes.insert(0, probe);
        self
    }

    /// Never fails: returns the fallback when no probe produces a usable value.
    pub async fn resolve(&self, source: &MediaSource) -> f64 {
        for probe in &self.probes {
            match probe.probe(source).await {
                Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
                    tracing::info!(probe = probe.name(), seconds, "Resolved video duration");
                    return seconds;
                }
                Ok(seconds) => {
                    tracing::warn!(probe = probe.name(), seconds, "Ignoring unusable duration");
                }
                Err(e @ ProbeError::Unsupported { .. }) => {
                    tracing::debug!("{e}");
                }
                Err(e) => {
                    tracing::warn!("Duration probe failed: {e}");
                }
            }
        }

        tracing::warn!(
            %source,
            fallback = self.fallback,
            "Could not determine video duration, using fallback"
        );
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl DurationProbe for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn probe(&self, _source: &MediaSource) -> Result<f64, ProbeError> {
            Err(ProbeError::Failed {
                probe: "broken",
                reason: "no such tool".to_string(),
            })
        }
    }

    fn source() -> MediaSource {
        MediaSource::parse("files/abc")
    }

    #[tokio::test]
    async fn first_usable_answer_wins() {
        let resolver = DurationResolver::new(vec![
            Box::new(Broken),
            Box::new(FixedDuration(-3.0)),
            Box::new(FixedDuration(f64::NAN)),
            Box::new(FixedDuration(95.5)),
            Box::new(FixedDuration(10.0)),
        ]);
        assert_eq!(resolver.resolve(&source()).await, 95.5);
    }

    #[tokio::test]
    async fn falls_back_when_everything_fails() {
        let resolver = DurationResolver::new(vec![Box::new(Broken)]);
        assert_eq!(resolver.resolve(&source()).await, DEFAULT_FALLBACK_DURATION);

        let resolver = DurationResolver::new(vec![]).with_fallback(120.0);
        assert_eq!(resolver.resolve(&source()).await, 120.0);
    }

    #[tokio::test]
    async fn invalid_fallback_is_ignored() {
        let resolver = DurationResolver::new(vec![]).with_fallback(0.0);
        assert_eq!(resolver.resolve(&source()).await, DEFAULT_FALLBACK_DURATION);
    }

    #[tokio::test]
    async fn prepended_probe_runs_first() {
        let resolver = DurationResolver::new(vec![Box::new(FixedDuration(10.0))])
            .prepend(Box::new(FixedDuration(42.0)));
        assert_eq!(resolver.resolve(&source()).await, 42.0);
    }

    #[tokio::test]
    async fn tool_probes_skip_unsupported_sources() {
        let local = MediaSource::parse("clip.mp4");
        assert!(matches!(
            YtDlpProbe.probe(&local).await,
            Err(ProbeError::Unsupported { .. })
        ));
        assert!(matches!(
            FfprobeProbe.probe(&source()).await,
            Err(ProbeError::Unsupported { .. })
        ));
    }

    #[test]
    fn parses_tool_output() {
        assert_eq!(parse_seconds("t", "125.48\n").unwrap(), 125.48);
        assert_eq!(parse_seconds("t", "\n 300 \n").unwrap(), 300.0);
        assert!(parse_seconds("t", "N/A").is_err());
        assert!(parse_seconds("t", "").is_err());
    }
}
