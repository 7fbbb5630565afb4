use crate::services::cancel::CancellationContext;
use crate::services::jobs::Job;
use futures_util::future::join_all;
use log::debug;
use std::future::Future;

/// Splits jobs into lanes by `index % concurrency`, keeping order inside a lane.
pub fn partition(jobs: Vec<Job>, concurrency: usize) -> Vec<Vec<Job>> {
    let lanes = concurrency.max(1).min(jobs.len().max(1));
    let mut partitions: Vec<Vec<Job>> = (0..lanes).map(|_| Vec::new()).collect();
    for (i, job) in jobs.into_iter().enumerate() {
        partitions[i % lanes].push(job);
    }
    partitions
}

/// Drives every lane to completion.
///
/// Each lane awaits `worker` for one job at a time; lanes interleave with each
/// other at those await points. A lane stops taking new jobs once `ctx` is
/// cancelled.
pub async fn run_lanes<F, Fut>(jobs: Vec<Job>, concurrency: usize, ctx: &CancellationContext, worker: F)
where
    F: Fn(usize, Job) -> Fut,
    Fut: Future<Output = ()>,
{
    let worker = &worker;
    let lanes = partition(jobs, concurrency)
        .into_iter()
        .enumerate()
        .map(|(lane, jobs)| async move {
            for job in jobs {
                if ctx.is_cancelled() {
                    debug!(
                        "Lane {} of generation {} stopping early",
                        lane,
                        ctx.generation()
                    );
                    break;
                }
                worker(lane, job).await;
            }
        });

    join_all(lanes).await;
}
