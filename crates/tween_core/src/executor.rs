//! Notification delivery
//!
//! Update and completion notifications are packaged as [`Job`]s. An operation
//! without an execution context runs its jobs inline on the ticking thread;
//! otherwise jobs are submitted to the context and the engine moves on without
//! waiting for them.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A boxed notification ready to run
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An executor that notifications can be offloaded to
pub trait ExecutionContext: Send + Sync {
    /// Hand a job over; must not block on the job's completion
    fn submit(&self, job: Job);
}

impl<F> ExecutionContext for F
where
    F: Fn(Job) + Send + Sync,
{
    fn submit(&self, job: Job) {
        self(job)
    }
}

/// Runs every job immediately on the submitting thread
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn submit(&self, job: Job) {
        job();
    }
}

/// Buffers jobs until the owner drains them
///
/// Useful for hosts that must run callbacks on a specific thread (a UI main
/// thread, a game loop): the tick thread enqueues, the owner calls
/// [`run_pending`](JobQueue::run_pending) at a convenient point.
#[derive(Clone, Default)]
pub struct JobQueue {
    jobs: Arc<Mutex<VecDeque<Job>>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting to run
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Run every queued job, including ones queued by the jobs themselves
    ///
    /// Returns how many jobs ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop under the lock, run outside it so jobs can enqueue more work
            let next = self.jobs.lock().pop_front();
            match next {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl ExecutionContext for JobQueue {
    fn submit(&self, job: Job) {
        self.jobs.lock().push_back(job);
    }
}

/// A job bound to where it should run
pub(crate) struct Dispatch {
    job: Job,
    context: Option<Arc<dyn ExecutionContext>>,
}

impl Dispatch {
    pub(crate) fn new(job: Job, context: Option<Arc<dyn ExecutionContext>>) -> Self {
        Self { job, context }
    }

    /// Run inline, or submit and return immediately
    pub(crate) fn deliver(self) {
        match self.context {
            Some(context) => context.submit(self.job),
            None => (self.job)(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inline_runs_immediately() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        InlineContext.submit(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_queue_defers_until_drained() {
        let queue = JobQueue::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let c = count.clone();
            queue.submit(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_runs_jobs_enqueued_while_draining() {
        let queue = JobQueue::new();
        let inner = queue.clone();
        queue.submit(Box::new(move || {
            inner.submit(Box::new(|| {}));
        }));
        assert_eq!(queue.run_pending(), 2);
    }

    #[test]
    fn test_dispatch_uses_context_when_present() {
        let queue = JobQueue::new();
        let context: Arc<dyn ExecutionContext> = Arc::new(queue.clone());
        Dispatch::new(Box::new(|| {}), Some(context)).deliver();
        assert_eq!(queue.len(), 1);

        let ran = Arc::new(AtomicUsize::new(0));
        let r = ran.clone();
        Dispatch::new(
            Box::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            }),
            None,
        )
        .deliver();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
