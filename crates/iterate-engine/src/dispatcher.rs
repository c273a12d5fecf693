//! Concurrent dispatcher
//!
//! [`ConcurrentIterator::iterate`] spawns one job per URI. Jobs wait on a
//! shared semaphore so at most `max_procs` of them walk at a time, run each
//! record through the [`PathFilter`] and hand survivors to the consumer over
//! a single-slot channel. The consumer pulls from the returned [`Iteration`].
//!
//! ```text
//! iterate(uris) ─┬─ job(uri 1) ─┐
//!                ├─ job(uri 2) ─┼─► events (capacity 1) ─► Iteration::next
//!                └─ job(uri n) ─┘
//! ```
//!
//! The first error ends the iteration: every outstanding job is cancelled
//! and any record still in flight is dropped, which closes it.

use crate::filter::PathFilter;
use crate::options::{IteratorOptions, RetryPolicy};
use crate::record::Record;
use crate::source::Source;
use futures::StreamExt;
use iterate_common::{IterateError, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Message from a job to the consumer
enum Event {
    Record(Record),
    Error(IterateError),
    Done,
}

/// Walks many URIs from one source concurrently
pub struct ConcurrentIterator {
    source: Arc<dyn Source>,
    options: IteratorOptions,
    seen: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
}

impl ConcurrentIterator {
    pub fn new(source: Arc<dyn Source>, options: IteratorOptions) -> Self {
        Self {
            source,
            options,
            seen: Arc::new(AtomicU64::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Build around `source` with options read from `uri`
    pub fn from_uri(uri: &str, source: Arc<dyn Source>) -> Result<Self> {
        Ok(Self::new(source, IteratorOptions::from_uri(uri)?))
    }

    pub fn options(&self) -> &IteratorOptions {
        &self.options
    }

    /// Records delivered to consumers, across every iteration so far
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::SeqCst)
    }

    /// Whether any iteration started by this iterator is still running
    pub fn is_iterating(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Start walking `uris`
    ///
    /// Records arrive in no particular order across URIs. Cancelling
    /// `cancel` ends the iteration without an error. Must be called from
    /// within a Tokio runtime.
    pub fn iterate<I>(&self, cancel: &CancellationToken, uris: I) -> Iteration
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let uris: Vec<String> = uris.into_iter().map(Into::into).collect();
        let cancel = cancel.child_token();
        let throttle = Arc::new(Semaphore::new(self.options.max_procs.max(1)));
        let filter = Arc::new(self.options.path_filter());
        let (events, receiver) = mpsc::channel(1);

        debug!(
            uris = uris.len(),
            max_procs = self.options.max_procs,
            "Dispatching URIs"
        );

        let mut jobs = JoinSet::new();
        for uri in &uris {
            let job = Job {
                uri: uri.clone(),
                source: Arc::clone(&self.source),
                filter: Arc::clone(&filter),
                retry: self.options.retry,
                throttle: Arc::clone(&throttle),
                events: events.clone(),
                cancel: cancel.clone(),
            };
            jobs.spawn(job.run());
        }

        Iteration {
            receiver,
            jobs,
            throttle,
            cancel,
            current: None,
            pending: uris.len(),
            uris: uris.len(),
            seen: Arc::clone(&self.seen),
            active: Some(ActiveGuard::new(&self.active)),
            started: Instant::now(),
        }
    }
}

impl std::fmt::Debug for ConcurrentIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentIterator")
            .field("options", &self.options)
            .field("seen", &self.seen())
            .field("is_iterating", &self.is_iterating())
            .finish_non_exhaustive()
    }
}

/// Keeps an iterator's active count raised while an iteration runs
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One run of [`ConcurrentIterator::iterate`]
///
/// Pull records with [`Iteration::next`]. The record handed out by `next`
/// is closed by the following call to `next`, by [`Iteration::shutdown`] or
/// when the iteration is dropped; consumers never close records themselves.
/// Dropping an unfinished iteration cancels its outstanding jobs.
pub struct Iteration {
    receiver: mpsc::Receiver<Event>,
    jobs: JoinSet<()>,
    throttle: Arc<Semaphore>,
    cancel: CancellationToken,
    current: Option<Record>,
    pending: usize,
    uris: usize,
    seen: Arc<AtomicU64>,
    active: Option<ActiveGuard>,
    started: Instant,
}

impl Iteration {
    /// Next record, or the error that ended the iteration
    ///
    /// Returns `None` once every URI is walked or the iteration was
    /// cancelled. After an error every following call returns `None`.
    pub async fn next(&mut self) -> Option<Result<&mut Record>> {
        self.release_current();

        if self.is_finished() {
            return None;
        }

        while self.pending > 0 {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                event = self.receiver.recv() => event,
            };

            match event {
                Some(Event::Record(record)) => {
                    self.seen.fetch_add(1, Ordering::SeqCst);
                    return Some(Ok(self.current.insert(record)));
                }
                Some(Event::Error(err)) => {
                    self.finish();
                    return Some(Err(err));
                }
                Some(Event::Done) => self.pending -= 1,
                None => break,
            }
        }

        self.finish();
        None
    }

    /// Whether the iteration has ended
    pub fn is_finished(&self) -> bool {
        self.active.is_none()
    }

    /// End the iteration and wait for every job to exit
    pub async fn shutdown(mut self) {
        self.release_current();
        self.finish();

        while let Some(joined) = self.jobs.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() {
                    warn!(error = %err, "Iteration job panicked");
                }
            }
        }
    }

    fn release_current(&mut self) {
        if let Some(record) = self.current.take() {
            trace!(path = record.path(), "Closing record");
        }
    }

    fn finish(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.cancel.cancel();
        self.throttle.close();

        // Records buffered in the channel are closed here, not on drop
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}

        debug!(
            uris = self.uris,
            seen = self.seen.load(Ordering::SeqCst),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Time to process URIs"
        );

        drop(active);
    }
}

impl Drop for Iteration {
    fn drop(&mut self) {
        self.release_current();
        self.finish();
        // Dropping `jobs` aborts whatever has not yet observed cancellation
    }
}

impl std::fmt::Debug for Iteration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iteration")
            .field("pending", &self.pending)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

enum WalkOutcome {
    Completed,
    Cancelled,
    Failed(IterateError),
}

/// Walks one URI on behalf of an iteration
struct Job {
    uri: String,
    source: Arc<dyn Source>,
    filter: Arc<PathFilter>,
    retry: RetryPolicy,
    throttle: Arc<Semaphore>,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl Job {
    async fn run(self) {
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = Arc::clone(&self.throttle).acquire_owned() => permit.ok(),
        };

        if let Some(permit) = permit {
            let started = Instant::now();
            self.walk_with_retry().await;
            drop(permit);

            debug!(
                uri = %self.uri,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Time to walk URI"
            );
        }

        self.send(Event::Done).await;
    }

    async fn walk_with_retry(&self) {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        let mut consumed = 0;

        loop {
            attempt += 1;

            let err = match self.walk_once(&mut consumed).await {
                WalkOutcome::Completed | WalkOutcome::Cancelled => return,
                WalkOutcome::Failed(err) => err,
            };

            if attempt >= max_attempts {
                let err = if self.retry.is_enabled() {
                    IterateError::retries_exhausted(&self.uri, attempt, err)
                } else {
                    err
                };
                self.send(Event::Error(err)).await;
                return;
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                uri = %self.uri,
                attempt,
                max_attempts,
                delay_secs = delay.as_secs(),
                error = %err,
                "Failed to walk URI, retrying"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Walk the URI once, skipping the first `consumed` records
    ///
    /// `consumed` counts records an earlier attempt already ran through the
    /// filter, delivered or not. A source yields one URI's records in a
    /// stable order, so a retry resumes where the failed attempt stopped.
    async fn walk_once(&self, consumed: &mut u64) -> WalkOutcome {
        let mut records = self.source.walk(&self.uri, self.cancel.clone());
        let mut position = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WalkOutcome::Cancelled,
                next = records.next() => next,
            };

            let record = match next {
                None => return WalkOutcome::Completed,
                Some(Err(err)) => return WalkOutcome::Failed(err),
                Some(Ok(record)) => record,
            };

            position += 1;
            if position <= *consumed {
                trace!(path = record.path(), "Skipping record seen by an earlier attempt");
                continue;
            }
            *consumed = position;

            match self.filter.should_yield(record.path()) {
                Ok(true) => {
                    if !self.send(Event::Record(record)).await {
                        return WalkOutcome::Cancelled;
                    }
                }
                Ok(false) => trace!(path = record.path(), "Skipping record"),
                Err(err) => {
                    drop(record);
                    if !self.send(Event::Error(err)).await {
                        return WalkOutcome::Cancelled;
                    }
                }
            }
        }
    }

    /// Deliver `event`, returning false if the iteration is over
    async fn send(&self, event: Event) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }
}
