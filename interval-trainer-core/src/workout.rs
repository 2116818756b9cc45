//! Workout definitions as stored on disk and consumed by the player.

use crate::error::{CoreError, Result};
use crate::time::format_summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default intensity for work and cooldown intervals (percent)
pub const DEFAULT_INTENSITY: u8 = 75;

/// Default intensity for warm-up intervals (percent)
pub const DEFAULT_WARMUP_INTENSITY: u8 = 60;

/// A minutes/seconds pair as entered in the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpec {
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

impl TimeSpec {
    #[must_use]
    pub const fn new(minutes: u32, seconds: u32) -> Self {
        Self { minutes, seconds }
    }

    /// Build a time spec from a number of seconds.
    #[must_use]
    pub const fn from_secs(total: u32) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    /// Total length in whole seconds.
    #[must_use]
    pub const fn total_seconds(&self) -> u32 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

/// What an interval is for. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum IntervalKind {
    Warmup,
    #[default]
    Work,
    Cooldown,
    Other(String),
}

impl IntervalKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warmup => "warmup",
            Self::Work => "work",
            Self::Cooldown => "cooldown",
            Self::Other(label) => label,
        }
    }

    /// Intensity a freshly added interval of this kind starts with.
    #[must_use]
    pub const fn default_intensity(&self) -> u8 {
        match self {
            Self::Warmup => DEFAULT_WARMUP_INTENSITY,
            _ => DEFAULT_INTENSITY,
        }
    }
}

impl From<String> for IntervalKind {
    fn from(value: String) -> Self {
        let known = match value.trim() {
            "warmup" => Some(Self::Warmup),
            "work" | "" => Some(Self::Work),
            "cooldown" => Some(Self::Cooldown),
            _ => None,
        };
        known.unwrap_or(Self::Other(value))
    }
}

impl From<IntervalKind> for String {
    fn from(kind: IntervalKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn default_sets() -> u32 {
    1
}

const fn default_intensity() -> u8 {
    DEFAULT_INTENSITY
}

/// One repeatable unit: an active phase followed by a rest phase, `sets` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    #[serde(default = "default_sets")]
    pub sets: u32,
    #[serde(default)]
    pub active_time: TimeSpec,
    #[serde(default)]
    pub rest_time: TimeSpec,
    #[serde(rename = "type", default)]
    pub kind: IntervalKind,
    #[serde(default = "default_intensity")]
    pub intensity: u8,
}

impl Interval {
    #[must_use]
    pub fn new(kind: IntervalKind, sets: u32, active_time: TimeSpec, rest_time: TimeSpec) -> Self {
        let intensity = kind.default_intensity();
        Self {
            sets,
            active_time,
            rest_time,
            kind,
            intensity,
        }
    }

    #[must_use]
    pub const fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }

    #[must_use]
    pub const fn active_secs(&self) -> u32 {
        self.active_time.total_seconds()
    }

    #[must_use]
    pub const fn rest_secs(&self) -> u32 {
        self.rest_time.total_seconds()
    }

    /// Length of all sets, counting the rest after every set (including the last).
    #[must_use]
    pub const fn total_secs(&self) -> u32 {
        self.sets
            .saturating_mul(self.active_secs().saturating_add(self.rest_secs()))
    }
}

/// Sum of `sets * (active + rest)` over all intervals.
#[must_use]
pub fn total_duration(intervals: &[Interval]) -> u32 {
    intervals
        .iter()
        .fold(0_u32, |total, interval| total.saturating_add(interval.total_secs()))
}

/// A workout as produced by the builder, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkout {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub intervals: Vec<Interval>,
}

/// A stored workout record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub intervals: Vec<Interval>,
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    #[must_use]
    pub fn total_secs(&self) -> u32 {
        total_duration(&self.intervals)
    }

    #[must_use]
    pub fn summary(&self) -> WorkoutSummary {
        WorkoutSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            interval_count: self.intervals.len(),
            total_secs: self.total_secs(),
        }
    }
}

/// Dashboard line for a stored workout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSummary {
    pub id: String,
    pub name: String,
    pub interval_count: usize,
    pub total_secs: u32,
}

impl fmt::Display for WorkoutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.interval_count == 1 { "" } else { "s" };
        write!(
            f,
            "{} - {} interval{plural} \u{2022} {}",
            self.name,
            self.interval_count,
            format_summary(self.total_secs)
        )
    }
}

/// A validated workout ready for playback.
///
/// Holds at least one interval and every interval has at least one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutPlan {
    name: String,
    intervals: Vec<Interval>,
    total_secs: u32,
}

impl WorkoutPlan {
    /// Normalize and validate intervals for playback.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidWorkout`] when there are no intervals.
    pub fn new(name: impl Into<String>, intervals: Vec<Interval>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(CoreError::InvalidWorkout {
                reason: "workout has no intervals".into(),
            });
        }

        let intervals: Vec<Interval> = intervals
            .into_iter()
            .map(|mut interval| {
                interval.sets = interval.sets.max(1);
                interval.intensity = interval.intensity.min(100);
                interval
            })
            .collect();
        let total_secs = total_duration(&intervals);

        Ok(Self {
            name: name.into(),
            intervals,
            total_secs,
        })
    }

    /// Build a plan from a stored workout.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidWorkout`] when the workout has no intervals.
    pub fn from_workout(workout: &Workout) -> Result<Self> {
        Self::new(&workout.name, workout.intervals.clone())
    }

    /// Parse a plan from a JSON workout record.
    ///
    /// Anything that is not a workout with intervals is reported as
    /// [`CoreError::InvalidWorkout`] so the caller can offer a way back.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidWorkout`] for malformed or empty data.
    pub fn from_json(json: &str) -> Result<Self> {
        let workout: NewWorkout =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidWorkout {
                reason: e.to_string(),
            })?;
        Self::new(workout.name, workout.intervals)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Interval at `index`, clamped to the last interval.
    #[must_use]
    pub fn interval(&self, index: usize) -> &Interval {
        let last = self.intervals.len() - 1;
        &self.intervals[index.min(last)]
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.intervals.len() - 1
    }

    /// Total workout duration in seconds.
    #[must_use]
    pub const fn total_secs(&self) -> u32 {
        self.total_secs
    }
}

impl TryFrom<&Workout> for WorkoutPlan {
    type Error = CoreError;

    fn try_from(workout: &Workout) -> Result<Self> {
        Self::from_workout(workout)
    }
}
