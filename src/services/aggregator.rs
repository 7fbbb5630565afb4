use crate::core::config::Config;
use crate::core::state::SceneUnit;
use crate::services::analysis::{to_profile, SceneAnalyzer, SceneRequest};
use crate::services::cancel::{CancellationContext, GenerationController};
use crate::services::jobs::{build_jobs, Job};
use crate::services::pool::run_lanes;
use crate::services::progress::ProgressSnapshot;
use crate::services::store::{AggregateSnapshot, AggregateStore};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What the caller wants aggregated.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatorInput {
    pub scenes: Vec<SceneUnit>,
    pub user_email: String,
    pub project_id: String,
    pub enabled: bool,
    pub concurrency: usize,
    pub force: bool,
}

impl Default for AggregatorInput {
    fn default() -> Self {
        Self {
            scenes: Vec::new(),
            user_email: String::new(),
            project_id: String::new(),
            enabled: true,
            concurrency: 1,
            force: false,
        }
    }
}

impl AggregatorInput {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scenes: config.project.scenes.clone(),
            user_email: config.project.user_email.clone(),
            project_id: config.project.project_id.clone(),
            enabled: true,
            concurrency: config.aggregation.concurrency,
            force: config.aggregation.force,
        }
    }
}

// Inputs whose change starts a new generation. `force` is deliberately absent.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RunKey {
    enabled: bool,
    scene_ids: Vec<String>,
    scene_count: usize,
    user_email: String,
    project_id: String,
    concurrency: usize,
}

impl From<&AggregatorInput> for RunKey {
    fn from(input: &AggregatorInput) -> Self {
        Self {
            enabled: input.enabled,
            scene_ids: input.scenes.iter().map(|s| s.id.clone()).collect(),
            scene_count: input.scenes.len(),
            user_email: input.user_email.clone(),
            project_id: input.project_id.clone(),
            concurrency: input.concurrency,
        }
    }
}

/// One generation's worth of work.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub user_email: String,
    pub project_id: String,
    pub force: bool,
    pub concurrency: usize,
    pub jobs: Vec<Job>,
}

struct JobScope<'a> {
    analyzer: &'a dyn SceneAnalyzer,
    store: &'a AggregateStore,
    ctx: &'a CancellationContext,
    user_email: &'a str,
    project_id: &'a str,
    force: bool,
}

impl JobScope<'_> {
    async fn process(&self, lane: usize, job: Job) {
        let generation = self.ctx.generation();

        if job.is_resolvable() {
            let request = SceneRequest {
                user_email: self.user_email.to_string(),
                project_id: self.project_id.to_string(),
                scene_id: job.id.clone(),
                force: self.force,
            };

            match self.analyzer.analyze(&request, self.ctx.token()).await {
                Ok(items) => {
                    let found = items.len();
                    for profile in items.into_iter().filter_map(|item| to_profile(item, job.ordinal)) {
                        if !self.store.commit_character(generation, profile) {
                            break;
                        }
                    }
                    debug!(
                        "Lane {}: scene {} (#{}) returned {} characters",
                        lane, job.id, job.ordinal, found
                    );
                }
                Err(e) if self.ctx.is_cancelled() => {
                    debug!("Lane {}: scene {} abandoned: {:#}", lane, job.id, e);
                }
                Err(e) => {
                    warn!(
                        "Lane {}: scene {} (#{}) skipped: {:#}",
                        lane, job.id, job.ordinal, e
                    );
                }
            }
        } else {
            debug!("Lane {}: scene #{} has no id, skipping", lane, job.ordinal);
        }

        self.store.advance(generation);
    }
}

/// Runs one generation to completion against `store`.
///
/// Every write is tagged with the context's generation, so a run that has been
/// superseded can finish its in-flight calls without touching newer state.
pub async fn run_generation(
    analyzer: Arc<dyn SceneAnalyzer>,
    store: Arc<AggregateStore>,
    ctx: CancellationContext,
    request: RunRequest,
) {
    let generation = ctx.generation();
    let RunRequest {
        user_email,
        project_id,
        force,
        concurrency,
        jobs,
    } = request;
    let total = jobs.len();

    let scope = JobScope {
        analyzer: analyzer.as_ref(),
        store: store.as_ref(),
        ctx: &ctx,
        user_email: &user_email,
        project_id: &project_id,
        force,
    };
    let scope = &scope;

    run_lanes(jobs, concurrency, &ctx, move |lane, job| scope.process(lane, job)).await;

    if store.finish(generation) {
        let snapshot = store.progress();
        info!(
            "Generation {} complete: {}/{} scenes processed",
            generation, snapshot.processed, total
        );
    } else {
        debug!("Generation {} settled after being superseded", generation);
    }
}

/// The character aggregation engine.
///
/// Call [`configure`](Self::configure) whenever the inputs may have changed;
/// a new generation starts only when something that matters did. Dropping the
/// aggregator cancels whatever is in flight.
pub struct CharacterAggregator {
    analyzer: Arc<dyn SceneAnalyzer>,
    store: Arc<AggregateStore>,
    controller: GenerationController,
    last_key: Option<RunKey>,
    task: Option<JoinHandle<()>>,
}

impl CharacterAggregator {
    pub fn new(analyzer: Arc<dyn SceneAnalyzer>) -> Self {
        Self {
            analyzer,
            store: Arc::new(AggregateStore::new()),
            controller: GenerationController::new(),
            last_key: None,
            task: None,
        }
    }

    /// Applies new inputs. Returns `true` if a new generation was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn configure(&mut self, input: AggregatorInput) -> bool {
        let key = RunKey::from(&input);
        if self.last_key.as_ref() == Some(&key) {
            return false;
        }
        self.last_key = Some(key);
        self.retire_current();

        if !input.enabled {
            debug!("Aggregation disabled, keeping last results");
            return false;
        }

        let ctx = self.controller.begin();
        let jobs = build_jobs(&input.scenes);
        self.store.begin(ctx.generation(), jobs.len());

        if jobs.is_empty() {
            info!("Generation {}: no scenes to analyse", ctx.generation());
            self.task = None;
            return true;
        }

        info!(
            "Generation {}: analysing {} scenes of project {} with {} lane(s)",
            ctx.generation(),
            jobs.len(),
            input.project_id,
            input.concurrency.max(1)
        );

        let request = RunRequest {
            user_email: input.user_email,
            project_id: input.project_id,
            force: input.force,
            concurrency: input.concurrency,
            jobs,
        };
        self.task = Some(tokio::spawn(run_generation(
            self.analyzer.clone(),
            self.store.clone(),
            ctx,
            request,
        )));
        true
    }

    /// Cancels the current generation. The next `configure` starts afresh
    /// even with unchanged inputs.
    pub fn detach(&mut self) {
        self.retire_current();
        self.last_key = None;
    }

    /// Waits for the current generation's lanes to settle.
    pub async fn settle(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Aggregation task ended abnormally: {}", e);
            }
        }
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        self.store.snapshot()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.store.progress()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.store.subscribe()
    }

    fn retire_current(&mut self) {
        if let Some(generation) = self.controller.cancel() {
            if self.store.cancel(generation) {
                info!("Generation {} cancelled", generation);
            }
        }
    }
}

impl Drop for CharacterAggregator {
    fn drop(&mut self) {
        self.retire_current();
    }
}
