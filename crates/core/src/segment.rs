use crate::{config::ConfigError, types::VideoSegment};

/// Splits a duration into fixed-width, non-overlapping segments.
#[derive(Debug, Clone, Copy)]
pub struct SegmentPlanner {
    interval: f64,
}

impl SegmentPlanner {
    pub fn new(interval: f64) -> Result<Self, ConfigError> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(ConfigError::InvalidInterval {
                name: "segment interval",
                value: interval,
            });
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Lazily yields the segments tiling `[0, duration)`.
    ///
    /// Non-positive or non-finite durations yield nothing. The returned
    /// iterator is `Clone`, so the plan can be replayed.
    pub fn plan(&self, duration: f64) -> Segments {
        Segments {
            interval: self.interval,
            duration: if duration.is_finite() { duration } else { 0.0 },
            next_index: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Segments {
    interval: f64,
    duration: f64,
    next_index: usize,
}

impl Iterator for Segments {
    type Item = VideoSegment;

    fn next(&mut self) -> Option<Self::Item> {
        // boundaries are index * interval so consecutive segments share an
        // exact boundary and nothing accumulates
        let start_time = self.next_index as f64 * self.interval;
        if start_time >= self.duration {
            return None;
        }
        let end_time = ((self.next_index + 1) as f64 * self.interval).min(self.duration);
        let segment = VideoSegment {
            start_time,
            end_time,
            segment_index: self.next_index,
        };
        self.next_index += 1;
        Some(segment)
    }
}

/// Convenience wrapper returning the whole plan at once.
pub fn plan_segments(duration: f64, interval: f64) -> Result<Vec<VideoSegment>, ConfigError> {
    Ok(SegmentPlanner::new(interval)?.plan(duration).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(segments: &[VideoSegment], duration: f64, interval: f64) {
        if duration <= 0.0 {
            assert!(segments.is_empty());
            return;
        }
        assert_eq!(segments[0].start_time, 0.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
            assert_eq!(pair[0].segment_index + 1, pair[1].segment_index);
        }
        assert_eq!(segments.last().unwrap().end_time, duration);
        for s in segments {
            assert!(s.end_time > s.start_time, "empty segment {s:?}");
            assert!(s.width() <= interval + 1e-9, "segment wider than interval {s:?}");
        }
    }

    #[test]
    fn tiles_duration_for_many_inputs() {
        for &interval in &[0.1, 1.0, 3.0, 7.5, 10.0, 30.0] {
            for &duration in &[0.0, 0.05, 1.0, 9.99, 10.0, 29.0, 65.0, 95.0, 300.0, 301.7] {
                let segments = plan_segments(duration, interval).unwrap();
                assert_tiles(&segments, duration, interval);
            }
        }
    }

    #[test]
    fn exact_multiple_gives_full_width_segments() {
        let segments = plan_segments(60.0, 10.0).unwrap();
        assert_eq!(segments.len(), 6);
        assert!(segments.iter().all(|s| s.width() == 10.0));
    }

    #[test]
    fn short_duration_gives_one_shorter_segment() {
        let segments = plan_segments(4.2, 10.0).unwrap();
        assert_eq!(
            segments,
            vec![VideoSegment {
                start_time: 0.0,
                end_time: 4.2,
                segment_index: 0
            }]
        );
    }

    #[test]
    fn trailing_segment_is_clamped() {
        let segments = plan_segments(65.0, 10.0).unwrap();
        assert_eq!(segments.len(), 7);
        let last = segments.last().unwrap();
        assert_eq!((last.start_time, last.end_time), (60.0, 65.0));
    }

    #[test]
    fn non_positive_or_non_finite_duration_is_empty() {
        assert!(plan_segments(0.0, 10.0).unwrap().is_empty());
        assert!(plan_segments(-5.0, 10.0).unwrap().is_empty());
        assert!(plan_segments(f64::NAN, 10.0).unwrap().is_empty());
        assert!(plan_segments(f64::INFINITY, 10.0).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_interval() {
        assert!(SegmentPlanner::new(0.0).is_err());
        assert!(SegmentPlanner::new(-1.0).is_err());
        assert!(SegmentPlanner::new(f64::NAN).is_err());
    }

    #[test]
    fn plan_is_restartable_and_deterministic() {
        let planner = SegmentPlanner::new(10.0).unwrap();
        let plan = planner.plan(95.0);
        let first: Vec<_> = plan.clone().collect();
        let second: Vec<_> = plan.collect();
        assert_eq!(first, second);
        assert_eq!(first, planner.plan(95.0).collect::<Vec<_>>());
    }
}
