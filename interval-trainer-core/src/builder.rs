//! Editable workout draft backing the "create workout" form.
//!
//! Field setters accept raw text as typed by the user and apply the same
//! fallbacks the form shows: unparsable set counts become 1, unparsable times
//! become 0, seconds above 59 are refused and intensities are clamped to a
//! percentage.

use crate::error::{CoreError, Result};
use crate::playback::Phase;
use crate::workout::{Interval, IntervalKind, NewWorkout, TimeSpec};

/// Which half of a [`TimeSpec`] is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Minutes,
    Seconds,
}

const DEFAULT_ACTIVE: TimeSpec = TimeSpec::new(0, 30);
const DEFAULT_REST: TimeSpec = TimeSpec::new(0, 15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutDraft {
    name: String,
    intervals: Vec<Interval>,
}

impl Default for WorkoutDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutDraft {
    /// A draft with a single warm-up interval.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            intervals: vec![Interval::new(
                IntervalKind::Warmup,
                1,
                DEFAULT_ACTIVE,
                DEFAULT_REST,
            )],
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a work interval with default timings.
    pub fn add_interval(&mut self) -> usize {
        self.intervals.push(Interval::new(
            IntervalKind::Work,
            1,
            DEFAULT_ACTIVE,
            DEFAULT_REST,
        ));
        self.intervals.len() - 1
    }

    /// Remove an interval. The last remaining interval cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or only one interval is left.
    pub fn remove_interval(&mut self, index: usize) -> Result<Interval> {
        self.check_index(index)?;
        if self.intervals.len() <= 1 {
            return Err(CoreError::LastInterval);
        }
        Ok(self.intervals.remove(index))
    }

    /// Change the interval kind.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn set_kind(&mut self, index: usize, kind: impl Into<String>) -> Result<()> {
        self.interval_mut(index)?.kind = IntervalKind::from(kind.into());
        Ok(())
    }

    /// Set the number of sets from user input; unparsable input means 1.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn set_sets(&mut self, index: usize, input: &str) -> Result<u32> {
        let sets = input.trim().parse::<u32>().unwrap_or(1).max(1);
        self.interval_mut(index)?.sets = sets;
        Ok(sets)
    }

    /// Set minutes or seconds of the active or rest time from user input.
    ///
    /// Unparsable input means 0. Seconds above 59 are refused and leave the
    /// interval unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or seconds exceed 59.
    pub fn set_time(
        &mut self,
        index: usize,
        phase: Phase,
        field: TimeField,
        input: &str,
    ) -> Result<TimeSpec> {
        let value = input.trim().parse::<u32>().unwrap_or(0);
        if field == TimeField::Seconds && value > 59 {
            return Err(CoreError::SecondsOutOfRange { value });
        }

        let interval = self.interval_mut(index)?;
        let time = match phase {
            Phase::Active => &mut interval.active_time,
            Phase::Rest => &mut interval.rest_time,
        };
        match field {
            TimeField::Minutes => time.minutes = value,
            TimeField::Seconds => time.seconds = value,
        }
        Ok(*time)
    }

    /// Set the intensity percentage from user input.
    ///
    /// Unparsable input falls back to the default for the interval kind;
    /// values are clamped to `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn set_intensity(&mut self, index: usize, input: &str) -> Result<u8> {
        let interval = self.interval_mut(index)?;
        let intensity = input.trim().parse::<i64>().map_or_else(
            |_| interval.kind.default_intensity(),
            |value| u8::try_from(value.clamp(0, 100)).unwrap_or(100),
        );
        interval.intensity = intensity;
        Ok(intensity)
    }

    /// Length of one interval including every set's rest (seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn interval_total(&self, index: usize) -> Result<u32> {
        self.check_index(index)?;
        Ok(self.intervals[index].total_secs())
    }

    /// Length of the whole draft (seconds).
    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        crate::workout::total_duration(&self.intervals)
    }

    /// Turn the draft into a workout ready to be saved.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingName`] if the name is blank.
    pub fn finish(&self) -> Result<NewWorkout> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::MissingName);
        }
        if self.intervals.is_empty() {
            return Err(CoreError::LastInterval);
        }

        Ok(NewWorkout {
            name: name.to_string(),
            intervals: self.intervals.clone(),
        })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.intervals.len() {
            Ok(())
        } else {
            Err(CoreError::IntervalOutOfRange { index })
        }
    }

    fn interval_mut(&mut self, index: usize) -> Result<&mut Interval> {
        self.intervals
            .get_mut(index)
            .ok_or(CoreError::IntervalOutOfRange { index })
    }
}
