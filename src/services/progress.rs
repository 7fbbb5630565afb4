use serde::Serialize;

/// Lifecycle of one generation.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Processed/total counters for one generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    processed: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self { processed: 0, total }
    }

    /// Counts one settled job. Saturates at `total`.
    pub fn advance(&mut self) {
        if self.processed < self.total {
            self.processed += 1;
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percent(&self) -> u8 {
        percent(self.processed, self.total)
    }
}

pub fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (processed.saturating_mul(100) / total).min(100) as u8
}

/// What the engine publishes to subscribers after every committed change.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub generation: u64,
    pub phase: RunPhase,
    pub is_loading: bool,
    pub processed: usize,
    pub total: usize,
    pub progress_pct: u8,
}
