//! Workout playback state machine.
//!
//! All state changes go through [`transition`], which maps the current
//! [`PlaybackState`] and a [`PlaybackEvent`] to the next state for a given
//! [`WorkoutPlan`]. [`PlaybackMachine`] bundles a plan with its state and
//! exposes the same events as methods.

use crate::time::DurationExt;
use crate::workout::{Interval, WorkoutPlan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Which half of a set is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Active,
    Rest,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Rest => "rest",
        }
    }

    /// Label shown on the countdown
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "WORK",
            Self::Rest => "REST",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current position of a workout being played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Active or rest half of the current set
    pub phase: Phase,
    /// Index of the running interval
    pub current_interval_index: usize,
    /// 1-based set number within the running interval
    pub current_set: u32,
    /// Seconds left in the current phase
    pub time_left_in_phase: u32,
    /// Seconds left in the whole workout
    pub total_time_remaining: u32,
    /// Seconds played so far
    pub elapsed_time: u32,
    /// Whether the countdown is running
    pub is_playing: bool,
    /// Set once the last phase of the last set has run out
    pub is_complete: bool,
    /// Tick reference; whole seconds are counted from here
    pub last_update: Instant,
}

impl PlaybackState {
    /// State at the first active phase of the first interval, paused.
    #[must_use]
    pub fn initial(plan: &WorkoutPlan, now: Instant) -> Self {
        Self {
            phase: Phase::Active,
            current_interval_index: 0,
            current_set: 1,
            time_left_in_phase: plan.interval(0).active_secs(),
            total_time_remaining: plan.total_secs(),
            elapsed_time: 0,
            is_playing: false,
            is_complete: false,
            last_update: now,
        }
    }

    /// Fraction of the workout played, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, plan: &WorkoutPlan) -> f64 {
        if plan.total_secs() == 0 {
            return 0.0;
        }
        (f64::from(self.elapsed_time) / f64::from(plan.total_secs())).min(1.0)
    }

    #[must_use]
    pub fn is_last_set(&self, plan: &WorkoutPlan) -> bool {
        self.current_set >= plan.interval(self.current_interval_index).sets
    }

    #[must_use]
    pub fn is_last_interval(&self, plan: &WorkoutPlan) -> bool {
        self.current_interval_index >= plan.last_index()
    }

    /// Check if the phase, set or interval differs from `other`
    #[must_use]
    pub fn position_changed(&self, other: &Self) -> bool {
        self.phase != other.phase
            || self.current_set != other.current_set
            || self.current_interval_index != other.current_interval_index
    }

    /// Check if any counter differs from `other`
    #[must_use]
    pub fn counters_changed(&self, other: &Self) -> bool {
        self.time_left_in_phase != other.time_left_in_phase
            || self.total_time_remaining != other.total_time_remaining
            || self.elapsed_time != other.elapsed_time
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Begin or resume the countdown
    Start { at: Instant },
    /// Stop the countdown, keeping the position
    Pause,
    /// Wall-clock tick
    Tick { now: Instant },
    /// Rewind to the first interval, keeping the play/pause status
    Restart { at: Instant },
}

/// Compute the state that follows `state` after `event`.
#[must_use]
pub fn transition(plan: &WorkoutPlan, state: PlaybackState, event: PlaybackEvent) -> PlaybackState {
    match event {
        PlaybackEvent::Start { at } => {
            let state = if state.is_complete {
                PlaybackState::initial(plan, at)
            } else {
                state
            };
            exhaust_phases(
                plan,
                PlaybackState {
                    is_playing: true,
                    last_update: at,
                    ..state
                },
            )
        }
        PlaybackEvent::Pause => PlaybackState {
            is_playing: false,
            ..state
        },
        PlaybackEvent::Tick { now } => tick(plan, state, now),
        PlaybackEvent::Restart { at } => exhaust_phases(
            plan,
            PlaybackState {
                is_playing: state.is_playing,
                ..PlaybackState::initial(plan, at)
            },
        ),
    }
}

fn tick(plan: &WorkoutPlan, state: PlaybackState, now: Instant) -> PlaybackState {
    if !state.is_playing {
        return state;
    }

    let delta = now.saturating_duration_since(state.last_update).as_secs_u32();
    if delta == 0 {
        return state;
    }

    // Only whole seconds move the reference, so the sub-second remainder
    // carries into the next tick. Time past the end of the workout is not
    // counted.
    let counted = delta.min(state.total_time_remaining);
    let next = PlaybackState {
        total_time_remaining: state.total_time_remaining - counted,
        elapsed_time: state.elapsed_time.saturating_add(counted),
        last_update: state.last_update + Duration::from_secs(u64::from(delta)),
        ..state
    };

    consume_seconds(plan, next, counted)
}

/// Advance past every exhausted phase.
fn exhaust_phases(plan: &WorkoutPlan, state: PlaybackState) -> PlaybackState {
    consume_seconds(plan, state, 0)
}

/// Take `seconds` off the current phase, spilling whatever is left into the
/// phases that follow.
///
/// Each step either completes the workout or moves strictly forward through
/// the (interval, set, phase) sequence, so zero-length phases are skipped and
/// the loop ends after at most two steps per set.
fn consume_seconds(plan: &WorkoutPlan, mut state: PlaybackState, mut seconds: u32) -> PlaybackState {
    loop {
        let spent = seconds.min(state.time_left_in_phase);
        state.time_left_in_phase -= spent;
        seconds -= spent;

        if !state.is_playing || state.is_complete || state.time_left_in_phase > 0 {
            return state;
        }
        state = next_phase(plan, state);
    }
}

fn next_phase(plan: &WorkoutPlan, state: PlaybackState) -> PlaybackState {
    let interval = plan.interval(state.current_interval_index);

    match state.phase {
        Phase::Active if interval.rest_secs() > 0 => PlaybackState {
            phase: Phase::Rest,
            time_left_in_phase: interval.rest_secs(),
            ..state
        },
        Phase::Active | Phase::Rest => next_set(plan, state),
    }
}

fn next_set(plan: &WorkoutPlan, state: PlaybackState) -> PlaybackState {
    let is_last_set = state.is_last_set(plan);

    if is_last_set && state.is_last_interval(plan) {
        return PlaybackState {
            is_playing: false,
            is_complete: true,
            ..state
        };
    }

    let (index, set) = if is_last_set {
        (state.current_interval_index + 1, 1)
    } else {
        (state.current_interval_index, state.current_set + 1)
    };

    PlaybackState {
        phase: Phase::Active,
        current_interval_index: index,
        current_set: set,
        time_left_in_phase: plan.interval(index).active_secs(),
        ..state
    }
}

/// A workout plan together with its playback state.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    plan: WorkoutPlan,
    state: PlaybackState,
}

impl PlaybackMachine {
    #[must_use]
    pub fn new(plan: WorkoutPlan) -> Self {
        Self::new_at(plan, Instant::now())
    }

    /// Create a machine with an explicit initial tick reference.
    #[must_use]
    pub fn new_at(plan: WorkoutPlan, now: Instant) -> Self {
        let state = PlaybackState::initial(&plan, now);
        Self { plan, state }
    }

    #[must_use]
    pub const fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Interval the state currently points at
    #[must_use]
    pub fn current_interval(&self) -> &Interval {
        self.plan.interval(self.state.current_interval_index)
    }

    /// Replace the workout and rewind to its start, paused.
    pub fn load(&mut self, plan: WorkoutPlan, now: Instant) {
        self.state = PlaybackState::initial(&plan, now);
        self.plan = plan;
    }

    /// Feed one event through [`transition`].
    pub fn apply(&mut self, event: PlaybackEvent) -> &PlaybackState {
        self.state = transition(&self.plan, self.state, event);
        &self.state
    }

    pub fn start(&mut self, now: Instant) -> &PlaybackState {
        self.apply(PlaybackEvent::Start { at: now })
    }

    pub fn pause(&mut self) -> &PlaybackState {
        self.apply(PlaybackEvent::Pause)
    }

    pub fn tick(&mut self, now: Instant) -> &PlaybackState {
        self.apply(PlaybackEvent::Tick { now })
    }

    pub fn restart(&mut self, now: Instant) -> &PlaybackState {
        self.apply(PlaybackEvent::Restart { at: now })
    }

    /// Move past an exhausted phase without waiting for the next tick.
    pub fn check_phase_exhaustion(&mut self) -> &PlaybackState {
        self.state = exhaust_phases(&self.plan, self.state);
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{IntervalKind, TimeSpec};

    fn interval(sets: u32, active: u32, rest: u32) -> Interval {
        Interval::new(
            IntervalKind::Work,
            sets,
            TimeSpec::from_secs(active),
            TimeSpec::from_secs(rest),
        )
    }

    fn plan(intervals: Vec<Interval>) -> WorkoutPlan {
        WorkoutPlan::new("Test", intervals).unwrap()
    }

    fn secs(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    fn millis(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_initial_state() {
        let plan = plan(vec![interval(2, 3, 2)]);
        let machine = PlaybackMachine::new(plan);
        let state = machine.state();

        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.current_interval_index, 0);
        assert_eq!(state.current_set, 1);
        assert_eq!(state.time_left_in_phase, 3);
        assert_eq!(state.total_time_remaining, 10);
        assert_eq!(state.elapsed_time, 0);
        assert!(!state.is_playing);
        assert!(!state.is_complete);
    }

    #[test]
    fn test_full_run_single_interval() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(2, 3, 2)]), t0);
        machine.start(t0);

        let mut trace = Vec::new();
        for second in 1..=10 {
            let state = *machine.tick(secs(t0, second));
            trace.push((state.phase, state.current_set, state.time_left_in_phase));
            assert_eq!(state.elapsed_time, u32::try_from(second).unwrap());
            assert_eq!(state.total_time_remaining + state.elapsed_time, 10);
        }

        assert_eq!(
            trace,
            vec![
                (Phase::Active, 1, 2),
                (Phase::Active, 1, 1),
                (Phase::Rest, 1, 2),
                (Phase::Rest, 1, 1),
                (Phase::Active, 2, 3),
                (Phase::Active, 2, 2),
                (Phase::Active, 2, 1),
                (Phase::Rest, 2, 2),
                (Phase::Rest, 2, 1),
                (Phase::Rest, 2, 0),
            ]
        );

        let state = machine.state();
        assert!(state.is_complete);
        assert!(!state.is_playing);
        assert_eq!(state.total_time_remaining, 0);
        assert_eq!(state.elapsed_time, 10);
    }

    #[test]
    fn test_tick_is_noop_when_paused() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 10, 0)]), t0);
        let before = *machine.state();

        machine.tick(secs(t0, 5));
        assert_eq!(*machine.state(), before);
    }

    #[test]
    fn test_sub_second_ticks_do_not_double_count() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 10, 0)]), t0);
        machine.start(t0);

        machine.tick(millis(t0, 400));
        machine.tick(millis(t0, 800));
        assert_eq!(machine.state().elapsed_time, 0);
        assert_eq!(machine.state().time_left_in_phase, 10);

        machine.tick(millis(t0, 1200));
        assert_eq!(machine.state().elapsed_time, 1);

        machine.tick(millis(t0, 1900));
        assert_eq!(machine.state().elapsed_time, 1);
    }

    #[test]
    fn test_many_small_ticks_match_one_large_tick() {
        let t0 = Instant::now();
        let workout = plan(vec![interval(3, 4, 3), interval(2, 5, 0)]);

        let mut small = PlaybackMachine::new_at(workout.clone(), t0);
        small.start(t0);
        for step in 1..=137 {
            small.tick(millis(t0, step * 100 + 7));
        }

        let mut large = PlaybackMachine::new_at(workout, t0);
        large.start(t0);
        large.tick(millis(t0, 13_707));

        assert_eq!(small.state().elapsed_time, 13);
        assert_eq!(small.state().elapsed_time, large.state().elapsed_time);
        assert_eq!(
            small.state().total_time_remaining,
            large.state().total_time_remaining
        );
        assert_eq!(small.state().last_update, large.state().last_update);
        assert_eq!(small.state(), large.state());
    }

    #[test]
    fn test_large_tick_carries_into_following_phases() {
        let t0 = Instant::now();
        let workout = plan(vec![interval(2, 3, 2)]);
        let total = workout.total_secs();
        let mut machine = PlaybackMachine::new_at(workout, t0);
        machine.start(t0);

        // 3s of work and 2s of rest in one step
        let state = *machine.tick(secs(t0, 5));
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.current_set, 2);
        assert_eq!(state.time_left_in_phase, 3);
        assert_eq!(state.total_time_remaining, 5);
        assert_eq!(state.elapsed_time, 5);

        let mut second = 5;
        while !machine.state().is_complete {
            second += 1;
            let state = *machine.tick(secs(t0, second));
            assert_eq!(state.total_time_remaining + state.elapsed_time, total);
        }
        assert_eq!(second, 10);
        assert_eq!(machine.state().elapsed_time, total);
    }

    #[test]
    fn test_large_tick_skips_whole_sets() {
        let t0 = Instant::now();
        let mut machine =
            PlaybackMachine::new_at(plan(vec![interval(3, 4, 1), interval(1, 6, 0)]), t0);
        machine.start(t0);

        let state = *machine.tick(secs(t0, 12));
        assert_eq!(state.current_interval_index, 0);
        assert_eq!(state.current_set, 3);
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.time_left_in_phase, 2);
        assert_eq!(state.total_time_remaining, 9);
        assert_eq!(state.elapsed_time, 12);
    }

    #[test]
    fn test_tick_before_reference_is_noop() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 10, 0)]), secs(t0, 5));
        machine.start(secs(t0, 5));
        machine.tick(t0);
        assert_eq!(machine.state().elapsed_time, 0);
    }

    #[test]
    fn test_pause_and_resume_keeps_elapsed_time() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 30, 0)]), t0);
        machine.start(t0);
        machine.tick(millis(t0, 2500));
        assert_eq!(machine.state().elapsed_time, 2);

        let paused = *machine.pause();
        assert!(!paused.is_playing);
        assert_eq!(paused.elapsed_time, 2);

        // Wall time passing while paused is not counted
        machine.tick(secs(t0, 20));
        assert_eq!(machine.state().elapsed_time, 2);

        machine.start(secs(t0, 60));
        machine.tick(millis(t0, 60_500));
        assert_eq!(machine.state().elapsed_time, 2);
        machine.tick(secs(t0, 63));
        assert_eq!(machine.state().elapsed_time, 5);
        assert_eq!(machine.state().time_left_in_phase, 25);
    }

    #[test]
    fn test_active_without_rest_moves_to_next_set() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(2, 2, 0)]), t0);
        machine.start(t0);

        let state = *machine.tick(secs(t0, 2));
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.current_set, 2);
        assert_eq!(state.time_left_in_phase, 2);
    }

    #[test]
    fn test_last_active_without_rest_completes() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 2, 0)]), t0);
        machine.start(t0);

        let state = *machine.tick(secs(t0, 2));
        assert!(state.is_complete);
        assert!(!state.is_playing);
        assert_eq!(state.total_time_remaining, 0);
    }

    #[test]
    fn test_rest_moves_to_next_interval() {
        let t0 = Instant::now();
        let mut machine =
            PlaybackMachine::new_at(plan(vec![interval(1, 1, 1), interval(2, 4, 0)]), t0);
        machine.start(t0);

        machine.tick(secs(t0, 1));
        assert_eq!(machine.state().phase, Phase::Rest);

        let state = *machine.tick(secs(t0, 2));
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.current_interval_index, 1);
        assert_eq!(state.current_set, 1);
        assert_eq!(state.time_left_in_phase, 4);
    }

    #[test]
    fn test_zero_length_intervals_are_skipped() {
        let t0 = Instant::now();
        let mut machine =
            PlaybackMachine::new_at(plan(vec![interval(3, 0, 0), interval(1, 5, 0)]), t0);

        let state = *machine.start(t0);
        assert!(state.is_playing);
        assert_eq!(state.current_interval_index, 1);
        assert_eq!(state.current_set, 1);
        assert_eq!(state.time_left_in_phase, 5);
    }

    #[test]
    fn test_all_zero_workout_completes_immediately() {
        let t0 = Instant::now();
        let mut machine =
            PlaybackMachine::new_at(plan(vec![interval(5, 0, 0), interval(2, 0, 0)]), t0);

        let state = *machine.start(t0);
        assert!(state.is_complete);
        assert!(!state.is_playing);
        assert_eq!(state.current_interval_index, 1);
        assert_eq!(state.current_set, 2);
    }

    #[test]
    fn test_start_after_complete_resets() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 2, 1)]), t0);
        machine.start(t0);
        machine.tick(secs(t0, 2));
        machine.tick(secs(t0, 3));
        assert!(machine.state().is_complete);

        let state = *machine.start(secs(t0, 10));
        assert!(state.is_playing);
        assert!(!state.is_complete);
        assert_eq!(state.elapsed_time, 0);
        assert_eq!(state.time_left_in_phase, 2);
        assert_eq!(state.total_time_remaining, 3);
        assert_eq!(state.last_update, secs(t0, 10));
    }

    #[test]
    fn test_restart_keeps_play_status() {
        let t0 = Instant::now();
        let mut machine =
            PlaybackMachine::new_at(plan(vec![interval(2, 5, 5), interval(1, 10, 0)]), t0);
        machine.start(t0);
        for second in 1..=22 {
            machine.tick(secs(t0, second));
        }
        assert_eq!(machine.state().current_interval_index, 1);
        assert_eq!(machine.state().time_left_in_phase, 8);

        let state = *machine.restart(secs(t0, 25));
        assert!(state.is_playing);
        assert_eq!(state.elapsed_time, 0);
        assert_eq!(state.current_interval_index, 0);
        assert_eq!(state.current_set, 1);
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.time_left_in_phase, 5);
        assert_eq!(state.total_time_remaining, 30);

        machine.pause();
        let state = *machine.restart(secs(t0, 30));
        assert!(!state.is_playing);
    }

    #[test]
    fn test_restart_clears_completion() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 1, 0)]), t0);
        machine.start(t0);
        machine.tick(secs(t0, 1));
        assert!(machine.state().is_complete);

        let state = *machine.restart(secs(t0, 2));
        assert!(!state.is_complete);
        assert!(!state.is_playing);
        assert_eq!(state.time_left_in_phase, 1);
    }

    #[test]
    fn test_large_tick_floors_at_zero() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 3, 0)]), t0);
        machine.start(t0);

        let state = *machine.tick(secs(t0, 100));
        assert_eq!(state.time_left_in_phase, 0);
        assert_eq!(state.total_time_remaining, 0);
        assert_eq!(state.elapsed_time, 3);
        assert!(state.is_complete);
    }

    #[test]
    fn test_invariants_hold_through_mixed_workout() {
        let t0 = Instant::now();
        let workout = plan(vec![
            interval(2, 30, 15),
            interval(4, 20, 10),
            interval(1, 0, 0),
            interval(1, 60, 0),
        ]);
        let total = workout.total_secs();
        let mut machine = PlaybackMachine::new_at(workout, t0);
        machine.start(t0);

        let mut second = 0;
        while !machine.state().is_complete {
            second += 1;
            let state = *machine.tick(secs(t0, second));
            let interval = machine.current_interval();

            assert!(state.current_set >= 1);
            assert!(state.current_set <= interval.sets);
            assert!(state.current_interval_index <= machine.plan().last_index());
            assert_eq!(state.total_time_remaining + state.elapsed_time, total);
        }

        assert_eq!(machine.state().elapsed_time, total);
    }

    #[test]
    fn test_check_phase_exhaustion_requires_playing() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 0, 5)]), t0);

        let state = *machine.check_phase_exhaustion();
        assert_eq!(state.phase, Phase::Active);

        machine.start(t0);
        assert_eq!(machine.state().phase, Phase::Rest);
        assert_eq!(machine.state().time_left_in_phase, 5);
    }

    #[test]
    fn test_load_resets_state() {
        let t0 = Instant::now();
        let mut machine = PlaybackMachine::new_at(plan(vec![interval(1, 10, 0)]), t0);
        machine.start(t0);
        machine.tick(secs(t0, 4));

        machine.load(plan(vec![interval(3, 7, 3)]), secs(t0, 5));
        let state = machine.state();
        assert!(!state.is_playing);
        assert_eq!(state.elapsed_time, 0);
        assert_eq!(state.time_left_in_phase, 7);
        assert_eq!(state.total_time_remaining, 30);
    }

    #[test]
    fn test_progress_fraction() {
        let t0 = Instant::now();
        let workout = plan(vec![interval(1, 8, 2)]);
        let mut machine = PlaybackMachine::new_at(workout.clone(), t0);
        machine.start(t0);
        machine.tick(secs(t0, 5));

        assert!((machine.state().progress(&workout) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transition_is_pure() {
        let t0 = Instant::now();
        let workout = plan(vec![interval(2, 3, 2)]);
        let state = PlaybackState::initial(&workout, t0);
        let started = transition(&workout, state, PlaybackEvent::Start { at: t0 });

        let a = transition(&workout, started, PlaybackEvent::Tick { now: secs(t0, 4) });
        let b = transition(&workout, started, PlaybackEvent::Tick { now: secs(t0, 4) });
        assert_eq!(a, b);
        assert!(!state.is_playing);
    }
}
