//! Progress bar layout for a workout being played.
//!
//! [`render_progress`] is a pure function of the intervals and the playback
//! position; calling it twice with the same inputs gives the same view, so a
//! UI can re-render at any rate without drifting.

use crate::playback::{Phase, PlaybackState};
use crate::workout::{total_duration, Interval, WorkoutPlan};

/// Bar height used for rest segments (percent)
pub const REST_INTENSITY: u8 = 10;

/// One bar of the progress view: a single active or rest phase of one set
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: Phase,
    pub interval_index: usize,
    /// 0-based set within the interval
    pub set_index: u32,
    /// Offset of the segment from the workout start (seconds)
    pub start: u32,
    /// End offset, exclusive (seconds)
    pub end: u32,
    /// Share of the total duration, in `[0, 1]`
    pub width: f64,
    pub intensity: u8,
    /// The playhead is inside this segment and it matches the running phase
    pub is_current: bool,
    /// Current while playing
    pub is_highlighted: bool,
}

impl Segment {
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.end - self.start
    }
}

/// What the player is doing right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentActivity {
    pub label: String,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub segments: Vec<Segment>,
    /// Playhead position as a fraction of the total duration
    pub playhead: f64,
    /// Total used for the layout (seconds)
    pub total_secs: u32,
    pub current_activity: Option<CurrentActivity>,
}

impl ProgressView {
    #[must_use]
    pub fn current_segment(&self) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.is_current)
    }
}

fn fraction(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(total)
    }
}

/// Lay out every active and rest phase of the workout.
///
/// A `total` of zero means "not known yet" and is recomputed from the
/// intervals. Zero-length phases produce no segment.
#[must_use]
pub fn render_progress(
    intervals: &[Interval],
    phase: Phase,
    current_interval_index: usize,
    elapsed: u32,
    total: u32,
    is_playing: bool,
) -> ProgressView {
    let total_secs = if total == 0 {
        total_duration(intervals)
    } else {
        total
    };

    let mut segments = Vec::new();
    let mut cursor = 0_u32;

    for (interval_index, interval) in intervals.iter().enumerate() {
        let phases = [
            (Phase::Active, interval.active_secs(), interval.intensity),
            (Phase::Rest, interval.rest_secs(), REST_INTENSITY),
        ];

        for set_index in 0..interval.sets {
            for (kind, length, intensity) in phases {
                if length == 0 {
                    continue;
                }

                let start = cursor;
                let end = start.saturating_add(length);
                let is_current = (start..end).contains(&elapsed)
                    && interval_index == current_interval_index
                    && kind == phase;

                segments.push(Segment {
                    kind,
                    interval_index,
                    set_index,
                    start,
                    end,
                    width: fraction(length, total_secs),
                    intensity,
                    is_current,
                    is_highlighted: is_current && is_playing,
                });
                cursor = end;
            }
        }
    }

    let current_activity = intervals
        .get(current_interval_index.min(intervals.len().saturating_sub(1)))
        .map(|interval| match phase {
            Phase::Rest => CurrentActivity {
                label: "Rest".to_string(),
                intensity: REST_INTENSITY,
            },
            Phase::Active => CurrentActivity {
                label: interval.kind.to_string(),
                intensity: interval.intensity,
            },
        });

    ProgressView {
        segments,
        playhead: fraction(elapsed, total_secs).min(1.0),
        total_secs,
        current_activity,
    }
}

/// Render the view for a plan at the given playback state.
#[must_use]
pub fn render(plan: &WorkoutPlan, state: &PlaybackState) -> ProgressView {
    render_progress(
        plan.intervals(),
        state.phase,
        state.current_interval_index,
        state.elapsed_time,
        plan.total_secs(),
        state.is_playing,
    )
}
