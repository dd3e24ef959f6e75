//! Per-mode session bookkeeping: score, progress, timing and persisted records.

use bevy::log::{debug, info};

use crate::host::{PersistentStore, ResultsView};
use crate::state::GameMode;

pub const HIGH_SCORE_KEY: &str = "HighScore";
pub const BEST_TIME_KEY: &str = "BestTime";
const PLATFORM_PREFIX: &str = "PlatformGame.";

/// Record keys for a mode. Object search keeps the historical bare keys.
pub fn record_keys(mode: GameMode) -> (String, String) {
    match mode {
        GameMode::PlatformGame => (
            format!("{PLATFORM_PREFIX}{HIGH_SCORE_KEY}"),
            format!("{PLATFORM_PREFIX}{BEST_TIME_KEY}"),
        ),
        _ => (HIGH_SCORE_KEY.to_owned(), BEST_TIME_KEY.to_owned()),
    }
}

pub fn high_score(store: &dyn PersistentStore, mode: GameMode) -> u32 {
    let (key, _) = record_keys(mode);
    store.get_int(&key).map_or(0, |score| score.max(0) as u32)
}

/// Best completion time in seconds; `f32::INFINITY` when none has been recorded.
pub fn best_time(store: &dyn PersistentStore, mode: GameMode) -> f32 {
    let (_, key) = record_keys(mode);
    store.get_float(&key).unwrap_or(f32::INFINITY)
}

/// `mm:ss`, truncating partial seconds.
pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn format_best_time(seconds: f32) -> String {
    if seconds.is_finite() {
        format_time(seconds)
    } else {
        "--:--".to_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Inactive,
    WrongMode { session: GameMode, current: GameMode },
    /// The entity was destroyed, already collected, or never collectible.
    NotInteractable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    Ignored(IgnoreReason),
    Recorded { score: u32, found: u32 },
    /// The collection that reached `items_required`. Reported once per session.
    Completed { score: u32, found: u32 },
}

impl CollectionOutcome {
    pub fn counted(&self) -> bool {
        !matches!(self, CollectionOutcome::Ignored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordOutcome {
    pub score: u32,
    pub time: f32,
    pub high_score: u32,
    pub best_time: f32,
    pub new_high_score: bool,
    pub new_best_time: bool,
}

impl RecordOutcome {
    pub fn view(&self) -> ResultsView {
        ResultsView {
            score: self.score.to_string(),
            high_score: self.high_score.to_string(),
            time: format_time(self.time),
            best_time: format_best_time(self.best_time),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    mode: GameMode,
    score: u32,
    items_found: u32,
    items_required: u32,
    started_at: f32,
    elapsed: f32,
    active: bool,
    completed: bool,
    records: Option<RecordOutcome>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle()
    }
}

impl SessionState {
    pub fn idle() -> Self {
        Self {
            mode: GameMode::Idle,
            score: 0,
            items_found: 0,
            items_required: 0,
            started_at: 0.0,
            elapsed: 0.0,
            active: false,
            completed: false,
            records: None,
        }
    }

    /// Clears counters and starts the clock at `now`.
    pub fn start(&mut self, mode: GameMode, items_required: u32, now: f32) {
        *self = Self {
            mode,
            items_required,
            started_at: now,
            active: true,
            ..Self::idle()
        };
    }

    /// Stops the clock. Further collections are ignored.
    pub fn freeze(&mut self, now: f32) {
        if self.active {
            self.elapsed = (now - self.started_at).max(0.0);
            self.active = false;
        }
    }

    pub fn record_collection(&mut self, points: u32, current: GameMode, now: f32) -> CollectionOutcome {
        if !self.active {
            debug!("Ignoring collection for inactive {:?} session", self.mode);
            return CollectionOutcome::Ignored(IgnoreReason::Inactive);
        }
        if self.mode != current {
            debug!(
                "Ignoring stale collection: session is {:?}, controller is in {:?}",
                self.mode, current
            );
            return CollectionOutcome::Ignored(IgnoreReason::WrongMode {
                session: self.mode,
                current,
            });
        }

        self.score = self.score.saturating_add(points);
        self.items_found = self.items_found.saturating_add(1);

        if self.items_found >= self.items_required {
            self.completed = true;
            self.freeze(now);
            info!(
                "{:?} complete: score {} in {}",
                self.mode,
                self.score,
                format_time(self.elapsed)
            );
            return CollectionOutcome::Completed {
                score: self.score,
                found: self.items_found,
            };
        }

        CollectionOutcome::Recorded {
            score: self.score,
            found: self.items_found,
        }
    }

    /// Completes a session that started with nothing to collect. Returns `true` the one time it fires.
    pub fn complete_if_empty(&mut self, now: f32) -> bool {
        if !self.active || self.items_required > 0 {
            return false;
        }
        self.completed = true;
        self.freeze(now);
        true
    }

    pub fn elapsed(&self, now: f32) -> f32 {
        if self.active {
            (now - self.started_at).max(0.0)
        } else {
            self.elapsed
        }
    }

    /// Compares the finished session against persisted bests, writing only strict improvements.
    /// Runs once per session; later calls return the first outcome.
    pub fn check_records(&mut self, store: &mut dyn PersistentStore, now: f32) -> RecordOutcome {
        if let Some(outcome) = self.records {
            return outcome;
        }

        let time = self.elapsed(now);
        let (score_key, time_key) = record_keys(self.mode);
        let previous_score = high_score(store, self.mode);
        let previous_time = best_time(store, self.mode);

        let new_high_score = self.score > previous_score;
        if new_high_score {
            store.set_int(&score_key, self.score.min(i32::MAX as u32) as i32);
        }
        let new_best_time = time < previous_time;
        if new_best_time {
            store.set_float(&time_key, time);
        }

        let outcome = RecordOutcome {
            score: self.score,
            time,
            high_score: previous_score.max(self.score),
            best_time: previous_time.min(time),
            new_high_score,
            new_best_time,
        };
        self.records = Some(outcome);
        outcome
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn items_found(&self) -> u32 {
        self.items_found
    }

    pub fn items_required(&self) -> u32 {
        self.items_required
    }

    pub fn remaining(&self) -> u32 {
        self.items_required.saturating_sub(self.items_found)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn records(&self) -> Option<&RecordOutcome> {
        self.records.as_ref()
    }

    pub fn score_text(&self) -> String {
        format!(
            "Score: {}\nFound: {}/{}",
            self.score, self.items_found, self.items_required
        )
    }
}
