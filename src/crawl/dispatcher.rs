// src/crawl/dispatcher.rs
// =============================================================================
// Bounded pool of page workers with a completion barrier.
//
// How it works:
// 1. start(n) creates a semaphore with n permits: at most n tasks do work
//    at the same time, the rest wait for a permit
// 2. submit() spawns the task into a JoinSet and bumps the outstanding count
// 3. await_all_complete() joins every task, bounded by a timeout
// 4. stop() aborts whatever is left (only after a timeout) and is idempotent
//
// Joining the tasks is the barrier: once await_all_complete() returns
// Completed, every write a task made (library increments) is visible to the
// caller. There is no sleeping and no polling of the counter.
//
// Rust concepts:
// - JoinSet: a set of spawned tasks you can await one by one
// - Semaphore + OwnedSemaphorePermit: the permit is released when dropped
// - Drop guards: code in Drop runs however the task ends (return, panic,
//   abort), so the outstanding count can't drift
// =============================================================================

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::CrawlError;

/// Outcome of waiting for the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Every submitted task finished
    Completed,
    /// The timeout elapsed first; results are a partial snapshot
    TimedOut,
}

pub struct Dispatcher {
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    outstanding: Arc<AtomicUsize>,
    submitted: usize,
    stopped: bool,
}

// Decrements the outstanding count when the task ends, whichever way
struct OutstandingGuard(Arc<AtomicUsize>);

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Dispatcher {
    /// Creates a pool running at most `concurrency` tasks at once.
    pub fn start(concurrency: usize) -> Result<Self, CrawlError> {
        // A pool of zero workers would never finish anything
        if concurrency == 0 {
            return Err(CrawlError::InvalidConcurrency(concurrency));
        }

        debug!(concurrency, "starting dispatcher");
        Ok(Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            tasks: JoinSet::new(),
            outstanding: Arc::new(AtomicUsize::new(0)),
            submitted: 0,
            stopped: false,
        })
    }

    /// Queues one independent task. Must be called from inside a tokio runtime.
    pub fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.stopped {
            warn!("task submitted to a stopped dispatcher, ignoring it");
            return;
        }

        // Count the task before it exists, so it is never "done" too early
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.submitted += 1;

        // The guard travels with the task and decrements when it is dropped
        let guard = OutstandingGuard(Arc::clone(&self.outstanding));
        let permits = Arc::clone(&self.permits);

        self.tasks.spawn(async move {
            let _guard = guard;
            // Wait for a free slot in the pool
            // Fails only once stop() closed the pool
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            // The permit is held until the task is done
            task.await;
        });
    }

    /// Tasks submitted and not finished yet
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Blocks until every submitted task has finished or `timeout` elapses.
    pub async fn await_all_complete(&mut self, timeout: Duration) -> Completion {
        // Join every task one by one; join_next() yields None when the set
        // is empty
        let tasks = &mut self.tasks;
        let join_all = async {
            while let Some(joined) = tasks.join_next().await {
                // A panic is logged; the task still counts as finished
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!("page worker panicked: {}", e);
                    }
                }
            }
        };

        // Bound the whole join by one deadline, not one per task
        let joined = tokio::time::timeout(timeout, join_all).await;
        match joined {
            Ok(()) => {
                debug!(submitted = self.submitted, "all page workers finished");
                Completion::Completed
            }
            Err(_) => {
                warn!(
                    outstanding = self.outstanding(),
                    timeout_secs = timeout.as_secs_f64(),
                    "page workers still running at timeout"
                );
                Completion::TimedOut
            }
        }
    }

    /// Releases the pool. Tasks still running are aborted and logged.
    pub fn stop(&mut self) {
        // Second and later calls do nothing
        if self.stopped {
            return;
        }
        self.stopped = true;

        // Anything left here was not joined: say so before aborting it
        if !self.tasks.is_empty() {
            warn!(
                abandoned = self.tasks.len(),
                "stopping dispatcher with unfinished page workers"
            );
        }
        self.tasks.abort_all();
        // Tasks still waiting for a permit give up instead of starting
        self.permits.close();
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a JoinSet and not tokio::spawn + a Vec of handles?
//    - JoinSet owns the handles and aborts them all when dropped
//    - join_next() hands back results as tasks finish, in any order
//
// 2. Why a semaphore instead of spawning only n tasks?
//    - Every task is spawned right away and waits for a permit
//    - The orchestrator never blocks while submitting
//
// 3. What does the outstanding counter add?
//    - It is what the timeout log reports ("how many are still running")
//    - The barrier itself is the join, not the counter
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert_eq!(
            Dispatcher::start(0).err(),
            Some(CrawlError::InvalidConcurrency(0))
        );
    }

    #[tokio::test]
    async fn test_empty_dispatcher_completes() {
        let mut dispatcher = Dispatcher::start(2).unwrap();
        let completion = dispatcher.await_all_complete(Duration::from_millis(50)).await;
        assert_eq!(completion, Completion::Completed);
        assert_eq!(dispatcher.submitted(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_tasks_finish_before_completed() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::start(3).unwrap();

        for i in 0..20u64 {
            let done = Arc::clone(&done);
            dispatcher.submit(async move {
                tokio::time::sleep(Duration::from_millis(i % 5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(dispatcher.submitted(), 20);

        let completion = dispatcher.await_all_complete(Duration::from_secs(10)).await;
        assert_eq!(completion, Completion::Completed);
        assert_eq!(done.load(Ordering::SeqCst), 20);
        assert_eq!(dispatcher.outstanding(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::start(2).unwrap();

        for _ in 0..10 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            dispatcher.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            });
        }

        let completion = dispatcher.await_all_complete(Duration::from_secs(10)).await;
        assert_eq!(completion, Completion::Completed);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_task_still_counts_as_finished() {
        let mut dispatcher = Dispatcher::start(1).unwrap();
        dispatcher.submit(async { panic!("boom") });
        dispatcher.submit(async {});

        let completion = dispatcher.await_all_complete(Duration::from_secs(5)).await;
        assert_eq!(completion, Completion::Completed);
        assert_eq!(dispatcher.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_timeout_then_stop() {
        let mut dispatcher = Dispatcher::start(1).unwrap();
        dispatcher.submit(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let completion = dispatcher.await_all_complete(Duration::from_millis(20)).await;
        assert_eq!(completion, Completion::TimedOut);
        assert_eq!(dispatcher.outstanding(), 1);

        dispatcher.stop();
        dispatcher.stop();
        // Aborted tasks drop their guard once the runtime polls them again
        let completion = dispatcher.await_all_complete(Duration::from_secs(5)).await;
        assert_eq!(completion, Completion::Completed);
        assert_eq!(dispatcher.outstanding(), 0);
    }
}
