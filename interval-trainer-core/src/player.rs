//! Background runtime that drives a [`PlaybackMachine`] in real time.
//!
//! A [`WorkoutPlayer`] owns at most one tick task. The task is spawned on
//! play, holds only a weak reference to the player, and is cancelled through a
//! [`CancellationToken`] whenever playback pauses, stops, the workout changes
//! or the player is dropped.

use crate::config::PlayerConfig;
use crate::playback::{PlaybackMachine, PlaybackState};
use crate::progress::{render, ProgressView};
use crate::time::DurationExt;
use crate::workout::WorkoutPlan;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "interval_trainer::player";

/// Default period of the tick task
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Events emitted by the player
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A new workout replaced the current one
    WorkoutLoaded { name: String, total_secs: u32 },
    /// Playback started or resumed
    Started { state: PlaybackState },
    /// Playback was paused or stopped
    Paused { state: PlaybackState },
    /// Playback rewound to the first interval
    Restarted { state: PlaybackState },
    /// One or more whole seconds were counted
    Ticked { state: PlaybackState },
    /// Phase, set or interval changed
    PhaseChanged { state: PlaybackState },
    /// The last phase of the last set ran out
    Completed { elapsed: u32 },
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

/// Handle to a running tick task
struct Ticker {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled() && !self.handle.is_finished()
    }

    /// Cancel the task and wait for it to exit.
    async fn shutdown(mut self) {
        self.cancel_token.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!(target: LOG_TARGET, "Tick task ended abnormally: {}", e);
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Plays a workout in real time and broadcasts what happens
pub struct WorkoutPlayer {
    machine: RwLock<PlaybackMachine>,
    ticker: Mutex<Option<Ticker>>,
    tick_interval: Duration,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl WorkoutPlayer {
    /// Create a paused player for `plan`.
    #[must_use]
    pub fn new(plan: WorkoutPlan, tick_interval: Duration) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(64);
        let tick_interval = if tick_interval.is_zero() {
            DEFAULT_TICK_INTERVAL
        } else {
            tick_interval
        };

        Arc::new(Self {
            machine: RwLock::new(PlaybackMachine::new_at(plan, now())),
            ticker: Mutex::new(None),
            tick_interval,
            event_tx,
        })
    }

    /// Create a paused player ticking at the configured interval.
    #[must_use]
    pub fn with_config(plan: WorkoutPlan, config: &PlayerConfig) -> Arc<Self> {
        Self::new(plan, config.tick_interval())
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Get the current playback state
    pub async fn snapshot(&self) -> PlaybackState {
        *self.machine.read().await.state()
    }

    /// Get the workout being played
    pub async fn plan(&self) -> WorkoutPlan {
        self.machine.read().await.plan().clone()
    }

    /// Render the progress view for the current state
    pub async fn progress(&self) -> ProgressView {
        let machine = self.machine.read().await;
        render(machine.plan(), machine.state())
    }

    /// Check whether a tick task is currently scheduled
    pub async fn is_ticking(&self) -> bool {
        self.ticker.lock().await.as_ref().is_some_and(Ticker::is_running)
    }

    /// Start or resume playback.
    ///
    /// Any previously scheduled tick task is cancelled before a new one is
    /// spawned. Playing a completed workout starts it over.
    pub async fn play(self: &Arc<Self>) -> PlaybackState {
        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.shutdown().await;
        }

        let state = *self.machine.write().await.start(now());
        self.begin(&mut ticker, state);
        state
    }

    /// Pause playback, keeping the position.
    pub async fn pause(&self) -> PlaybackState {
        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.shutdown().await;
        }

        let state = *self.machine.write().await.pause();
        info!(target: LOG_TARGET, "Paused at {}s", state.elapsed_time);
        let _ = self.event_tx.send(PlayerEvent::Paused { state });
        state
    }

    /// Play when paused, pause when playing.
    pub async fn toggle(self: &Arc<Self>) -> PlaybackState {
        if self.snapshot().await.is_playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Rewind to the first interval.
    ///
    /// Playback keeps its play/pause status, and starts when `autoplay` is set.
    pub async fn restart(self: &Arc<Self>, autoplay: bool) -> PlaybackState {
        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.shutdown().await;
        }

        let state = {
            let mut machine = self.machine.write().await;
            let at = now();
            machine.restart(at);
            if autoplay {
                machine.start(at);
            }
            *machine.state()
        };

        info!(target: LOG_TARGET, "Restarted workout (playing: {})", state.is_playing);
        let _ = self.event_tx.send(PlayerEvent::Restarted { state });
        if state.is_playing || state.is_complete {
            self.begin(&mut ticker, state);
        }
        state
    }

    /// Tear down the tick task and leave the player paused.
    pub async fn stop(&self) {
        let had_ticker = {
            let mut ticker = self.ticker.lock().await;
            match ticker.take() {
                Some(old) => {
                    old.shutdown().await;
                    true
                }
                None => false,
            }
        };

        let state = *self.machine.write().await.pause();
        if had_ticker {
            debug!(target: LOG_TARGET, "Stopped tick task at {}s", state.elapsed_time);
        }
    }

    /// Replace the workout and rewind, paused.
    pub async fn load(&self, plan: WorkoutPlan) {
        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.shutdown().await;
        }

        let name = plan.name().to_string();
        let total_secs = plan.total_secs();
        self.machine.write().await.load(plan, now());

        info!(target: LOG_TARGET, "Loaded workout '{}' ({}s)", name, total_secs);
        let _ = self.event_tx.send(PlayerEvent::WorkoutLoaded { name, total_secs });
    }

    /// Announce a state reached by starting and spawn the tick task if needed.
    fn begin(self: &Arc<Self>, ticker: &mut Option<Ticker>, state: PlaybackState) {
        if state.is_complete {
            // Nothing left to count, e.g. every phase has zero length
            info!(target: LOG_TARGET, "Workout complete after {}s", state.elapsed_time);
            let _ = self.event_tx.send(PlayerEvent::Completed {
                elapsed: state.elapsed_time,
            });
            return;
        }

        info!(
            target: LOG_TARGET,
            "Playing from {}s (tick every {}ms)",
            state.elapsed_time,
            self.tick_interval.as_millis_u64()
        );
        let _ = self.event_tx.send(PlayerEvent::Started { state });

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_ticker(
            Arc::downgrade(self),
            cancel_token.clone(),
            self.tick_interval,
        ));
        *ticker = Some(Ticker {
            cancel_token,
            handle,
        });
    }

    /// Apply one tick and emit events. Returns `false` once playback ended.
    async fn on_tick(&self) -> bool {
        let (before, after) = {
            let mut machine = self.machine.write().await;
            let before = *machine.state();
            let after = *machine.tick(now());
            (before, after)
        };

        if after.counters_changed(&before) {
            debug!(
                target: LOG_TARGET,
                "{} {}s left, {}s remaining",
                after.phase,
                after.time_left_in_phase,
                after.total_time_remaining
            );
            let _ = self.event_tx.send(PlayerEvent::Ticked { state: after });
        }

        if after.position_changed(&before) {
            debug!(
                target: LOG_TARGET,
                "Now {} of interval {} set {}",
                after.phase,
                after.current_interval_index,
                after.current_set
            );
            let _ = self.event_tx.send(PlayerEvent::PhaseChanged { state: after });
        }

        if after.is_complete {
            info!(target: LOG_TARGET, "Workout complete after {}s", after.elapsed_time);
            let _ = self.event_tx.send(PlayerEvent::Completed {
                elapsed: after.elapsed_time,
            });
            return false;
        }

        after.is_playing
    }
}

async fn run_ticker(player: Weak<WorkoutPlayer>, cancel_token: CancellationToken, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                debug!(target: LOG_TARGET, "Tick task cancelled");
                break;
            }
            _ = interval.tick() => {
                let Some(player) = player.upgrade() else {
                    break;
                };
                if !player.on_tick().await {
                    break;
                }
            }
        }
    }
}
