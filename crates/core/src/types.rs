use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open time window `[start_time, end_time)` of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub segment_index: usize,
}

impl VideoSegment {
    pub fn width(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Fine-grained events of one segment
    Segment,
    /// Running plot summary
    Plot,
    /// Whole-video overview
    Overview,
}

impl Level {
    pub fn number(self) -> u8 {
        match self {
            Level::Segment => 1,
            Level::Plot => 2,
            Level::Overview => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Level::Segment),
            2 => Some(Level::Plot),
            3 => Some(Level::Overview),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level-{}", self.number())
    }
}

/// One generated description.
///
/// `timestamp` is the segment start for level 1, the elapsed time for level 2
/// and the total duration for level 3. `segment_index` is the position within
/// its own level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub level: Level,
    pub timestamp: f64,
    pub content: String,
    pub segment_index: usize,
}

/// Time window sent to the model. Offsets go over the wire as whole seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Start offset, floored to whole seconds, e.g. `"60s"`
    pub fn start_offset(&self) -> String {
        format!("{}s", self.start.max(0.0).floor() as u64)
    }

    /// End offset, ceiled so the window still covers the segment tail
    pub fn end_offset(&self) -> String {
        format!("{}s", self.end.max(0.0).ceil() as u64)
    }
}
