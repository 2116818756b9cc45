//! Saved workout persistence.
//!
//! Workouts live under a single key as a JSON array, newest first, capped at
//! [`MAX_SAVED_WORKOUTS`]. The in-memory list is authoritative: read and write
//! failures are logged and never surface to callers.

use crate::config::StorageConfig;
use crate::error::{CoreError, Result};
use crate::workout::{NewWorkout, Workout, WorkoutPlan, WorkoutSummary};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "interval_trainer::store";

/// Key under which the workout list is stored
pub const WORKOUTS_KEY: &str = "workouts";

/// Number of workouts kept; older ones are dropped on save
pub const MAX_SAVED_WORKOUTS: usize = 10;

/// Minimal key-value storage
pub trait StorageBackend: Send + Sync {
    /// Read the value for `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` in a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CoreError::Storage {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let storage_error = |source| CoreError::Storage {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(storage_error)?;
        fs::write(self.path_for(key), value).map_err(storage_error)
    }
}

/// Keeps values in memory only
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The saved workout list
pub struct WorkoutStore<B: StorageBackend> {
    backend: B,
    workouts: Vec<Workout>,
}

impl<B: StorageBackend> WorkoutStore<B> {
    /// Load saved workouts. Missing or unreadable data gives an empty list, and
    /// records that do not parse are skipped.
    #[must_use]
    pub fn open(backend: B) -> Self {
        let workouts = match backend.read(WORKOUTS_KEY) {
            Ok(Some(content)) => {
                let mut workouts = parse_workouts(&content);
                workouts.truncate(MAX_SAVED_WORKOUTS);
                info!(target: LOG_TARGET, "Loaded {} saved workout(s)", workouts.len());
                workouts
            }
            Ok(None) => {
                debug!(target: LOG_TARGET, "No saved workouts yet");
                Vec::new()
            }
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to read saved workouts: {}", e);
                Vec::new()
            }
        };

        Self { backend, workouts }
    }

    /// Saved workouts, newest first
    #[must_use]
    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Dashboard rows for every saved workout
    #[must_use]
    pub fn summaries(&self) -> Vec<WorkoutSummary> {
        self.workouts.iter().map(Workout::summary).collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|workout| workout.id == id)
    }

    /// The stored version of `workout` if it still exists, else `workout` itself.
    #[must_use]
    pub fn resolve<'a>(&'a self, workout: &'a Workout) -> &'a Workout {
        self.get(&workout.id).unwrap_or(workout)
    }

    /// Build a playable plan from the most recent version of `workout`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidWorkout`] if the workout has no intervals.
    pub fn plan_for(&self, workout: &Workout) -> Result<WorkoutPlan> {
        WorkoutPlan::from_workout(self.resolve(workout))
    }

    /// Save a new workout as the newest entry.
    pub fn save(&mut self, workout: NewWorkout) -> Workout {
        self.save_at(workout, Utc::now())
    }

    /// Save a new workout using `now` for its id and creation time.
    pub fn save_at(&mut self, workout: NewWorkout, now: DateTime<Utc>) -> Workout {
        let mut millis = now.timestamp_millis();
        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }

        let saved = Workout {
            name: workout.name,
            intervals: workout.intervals,
            id: millis.to_string(),
            created_at: now,
        };

        self.workouts.insert(0, saved.clone());
        self.workouts.truncate(MAX_SAVED_WORKOUTS);
        info!(target: LOG_TARGET, "Saved workout '{}' ({})", saved.name, saved.id);
        self.persist();
        saved
    }

    /// Delete a workout. Returns `false` if no workout has that id.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.workouts.len();
        self.workouts.retain(|workout| workout.id != id);
        if self.workouts.len() == before {
            debug!(target: LOG_TARGET, "No saved workout with id {}", id);
            return false;
        }

        info!(target: LOG_TARGET, "Deleted workout {}", id);
        self.persist();
        true
    }

    fn persist(&self) {
        match serde_json::to_string(&self.workouts) {
            Ok(content) => {
                if let Err(e) = self.backend.write(WORKOUTS_KEY, &content) {
                    warn!(target: LOG_TARGET, "Failed to write saved workouts: {}", e);
                }
            }
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to serialize saved workouts: {}", e);
            }
        }
    }
}

/// Parse the stored list one record at a time.
fn parse_workouts(content: &str) -> Vec<Workout> {
    let records = match serde_json::from_str::<Vec<serde_json::Value>>(content) {
        Ok(records) => records,
        Err(e) => {
            warn!(target: LOG_TARGET, "Failed to parse saved workouts: {}", e);
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Workout>(record) {
            Ok(workout) => Some(workout),
            Err(e) => {
                warn!(target: LOG_TARGET, "Skipping saved workout #{}: {}", index, e);
                None
            }
        })
        .collect()
}

impl WorkoutStore<FileBackend> {
    /// Open the store in the configured data directory.
    #[must_use]
    pub fn open_configured(config: &StorageConfig) -> Self {
        Self::open(FileBackend::new(config.data_dir()))
    }
}
