use crate::core::state::CharacterProfile;
use crate::services::merge::merge;
use crate::services::progress::{ProgressSnapshot, ProgressTracker, RunPhase};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// Everything a consumer sees of the current generation.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSnapshot {
    pub generation: u64,
    pub phase: RunPhase,
    pub characters_map: BTreeMap<String, CharacterProfile>,
    /// Same profiles, ordered by display name.
    pub characters: Vec<CharacterProfile>,
    pub is_loading: bool,
    pub processed: usize,
    pub total: usize,
    pub progress_pct: u8,
}

#[derive(Debug, Default)]
struct AggregateState {
    generation: u64,
    phase: RunPhase,
    characters: BTreeMap<String, CharacterProfile>,
    progress: ProgressTracker,
}

impl AggregateState {
    fn accepts(&self, generation: u64) -> bool {
        self.generation == generation && self.phase == RunPhase::Running
    }

    fn progress_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            generation: self.generation,
            phase: self.phase,
            is_loading: self.phase == RunPhase::Running,
            processed: self.progress.processed(),
            total: self.progress.total(),
            progress_pct: self.progress.percent(),
        }
    }
}

/// Owner of the character table and progress counters.
///
/// Every mutation takes the lock, checks that its generation is still the
/// running one, applies the change to the latest state and publishes the new
/// progress. The lock is never held across an await.
#[derive(Debug)]
pub struct AggregateStore {
    state: Mutex<AggregateState>,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl Default for AggregateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateStore {
    pub fn new() -> Self {
        let (progress_tx, _) = watch::channel(ProgressSnapshot::default());
        Self {
            state: Mutex::new(AggregateState::default()),
            progress_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregateState> {
        // Poisoning only means a writer panicked; keep serving the last state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &AggregateState) {
        self.progress_tx.send_replace(state.progress_snapshot());
    }

    /// Replaces the table wholesale for a new generation. With no jobs the
    /// generation stays idle.
    pub fn begin(&self, generation: u64, total: usize) {
        let mut state = self.lock();
        *state = AggregateState {
            generation,
            phase: if total > 0 {
                RunPhase::Running
            } else {
                RunPhase::Idle
            },
            characters: BTreeMap::new(),
            progress: ProgressTracker::new(total),
        };
        self.publish(&state);
    }

    /// Merges `profile` into the latest entry for its key.
    pub fn commit_character(&self, generation: u64, profile: CharacterProfile) -> bool {
        let mut state = self.lock();
        if !state.accepts(generation) {
            debug!(
                "Dropping {} from stale generation {} (current {})",
                profile.id, generation, state.generation
            );
            return false;
        }

        let key = profile.id.clone();
        let existing = state.characters.remove(&key);
        state.characters.insert(key, merge(existing, profile));
        self.publish(&state);
        true
    }

    /// Counts one settled job.
    pub fn advance(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if !state.accepts(generation) {
            debug!("Ignoring progress from stale generation {}", generation);
            return false;
        }
        state.progress.advance();
        self.publish(&state);
        true
    }

    /// Marks the generation completed once all lanes have drained.
    pub fn finish(&self, generation: u64) -> bool {
        self.settle(generation, RunPhase::Completed)
    }

    /// Marks the generation cancelled. Later writes from it are refused.
    pub fn cancel(&self, generation: u64) -> bool {
        self.settle(generation, RunPhase::Cancelled)
    }

    fn settle(&self, generation: u64, phase: RunPhase) -> bool {
        let mut state = self.lock();
        if !state.accepts(generation) {
            return false;
        }
        state.phase = phase;
        self.publish(&state);
        true
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.lock().progress_snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        let state = self.lock();
        let progress = state.progress_snapshot();

        let mut characters: Vec<CharacterProfile> = state.characters.values().cloned().collect();
        characters.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        AggregateSnapshot {
            generation: progress.generation,
            phase: progress.phase,
            characters_map: state.characters.clone(),
            characters,
            is_loading: progress.is_loading,
            processed: progress.processed,
            total: progress.total,
            progress_pct: progress.progress_pct,
        }
    }
}
