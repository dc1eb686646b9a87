//! Job runtime: owns the queue, registry, event channel, cache and workers.
//!
//! One `JobRuntime` is constructed at startup and passed to the API layer as
//! a [`JobApi`]. It has no global state; tests build as many as they like.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backoff::RetryPolicy;
use super::cache::{CachedResult, ResultCache};
use super::dispatch::Dispatcher;
use super::events::EventChannel;
use super::processor::Processors;
use super::queue::JobQueue;
use super::registry::JobRegistry;
use super::worker::{WorkerContext, WorkerPool};
use crate::domain::{Fingerprint, JobId, JobPayload, JobRecord, JobStatus};
use crate::error::{Error, Result};
use crate::port::inbound::{JobApi, JobHandle, JobSubscription, RuntimeStats};
use crate::port::outbound::{PositionChange, PositionStore};

/// Tunables of a runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub workers: usize,
    pub queue_capacity: usize,
    pub job_timeout: Duration,
    pub retry: RetryPolicy,
    pub cache_ttl: Duration,
    /// How long terminal jobs stay queryable.
    pub retention: Duration,
    pub sweep_interval: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            queue_capacity: 10_000,
            job_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            cache_ttl: Duration::from_secs(60),
            retention: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

/// Counts from one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub jobs: usize,
    pub topics: usize,
    pub cache_entries: usize,
}

#[derive(Default)]
struct Tasks {
    pool: Option<WorkerPool>,
    background: Vec<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

pub struct JobRuntime {
    settings: RuntimeSettings,
    dispatcher: Dispatcher,
    registry: Arc<JobRegistry>,
    queue: Arc<JobQueue>,
    events: Arc<EventChannel>,
    cache: Arc<ResultCache>,
    context: Arc<WorkerContext>,
    positions: Arc<dyn PositionStore>,
    accepting: Arc<AtomicBool>,
    tasks: Mutex<Tasks>,
}

impl JobRuntime {
    #[must_use]
    pub fn new(
        settings: RuntimeSettings,
        processors: Processors,
        positions: Arc<dyn PositionStore>,
    ) -> Self {
        let events = Arc::new(EventChannel::new());
        let registry = Arc::new(JobRegistry::new(Arc::clone(&events)));
        let queue = Arc::new(JobQueue::new(settings.queue_capacity));
        let cache = Arc::new(ResultCache::new(settings.cache_ttl));
        let accepting = Arc::new(AtomicBool::new(false));

        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&queue),
            Arc::clone(&cache),
            Arc::clone(&positions),
            Arc::clone(&accepting),
            settings.retry.max_attempts(),
            settings.job_timeout,
        );
        let context = Arc::new(WorkerContext {
            registry: Arc::clone(&registry),
            queue: Arc::clone(&queue),
            cache: Arc::clone(&cache),
            processors: Arc::new(processors),
            retry: settings.retry,
        });

        Self {
            settings,
            dispatcher,
            registry,
            queue,
            events,
            cache,
            context,
            positions,
            accepting,
            tasks: Mutex::new(Tasks::default()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Spawn workers and background tasks and start accepting submissions.
    ///
    /// Must be called inside a Tokio runtime. Calling it again while
    /// running is a no-op.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if tasks.pool.is_some() {
            warn!("Runtime already started");
            return;
        }
        if self.queue.is_closed() {
            warn!("Runtime was shut down and cannot be restarted");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tasks.pool = Some(WorkerPool::spawn(
            self.settings.workers,
            Arc::clone(&self.context),
        ));
        tasks.background.push(self.spawn_sweeper(shutdown_rx.clone()));
        tasks
            .background
            .push(self.spawn_invalidation(self.positions.subscribe(), shutdown_rx));
        tasks.shutdown = Some(shutdown_tx);
        self.accepting.store(true, Ordering::SeqCst);

        info!(
            workers = self.settings.workers.max(1),
            queue_capacity = self.settings.queue_capacity,
            max_attempts = self.settings.retry.max_attempts(),
            "Job runtime started"
        );
    }

    /// Stop accepting work, cancel queued jobs, let active attempts finish,
    /// then close every notification stream.
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);

        let leftover = self.queue.close();
        let ids: Vec<JobId> = leftover.iter().map(|j| j.job_id).collect();
        let cancelled = self.registry.cancel_abandoned(&ids);

        let (pool, background, shutdown) = {
            let mut tasks = self.tasks.lock();
            (
                tasks.pool.take(),
                std::mem::take(&mut tasks.background),
                tasks.shutdown.take(),
            )
        };
        if let Some(pool) = pool {
            pool.join().await;
        }
        if let Some(tx) = shutdown {
            let _ = tx.send(true);
        }
        for handle in background {
            if let Err(err) = handle.await {
                warn!(error = %err, "Background task ended abnormally");
            }
        }

        self.events.close();
        info!(cancelled, "Job runtime stopped");
    }

    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Still-valid cached outcome for a fingerprint, successful or failed.
    #[must_use]
    pub fn cached(&self, fingerprint: &Fingerprint) -> Option<CachedResult> {
        self.cache.get(fingerprint)
    }

    /// Drop cached snapshots of `owner` computed before `version`.
    pub fn invalidate_owner(&self, owner: Address, version: u64) -> usize {
        self.cache.invalidate_owner(owner, version)
    }

    /// Evict terminal jobs and topics past retention and expired cache
    /// entries.
    pub fn sweep(&self) -> SweepReport {
        sweep(&self.registry, &self.events, &self.cache, self.settings.retention)
    }

    fn spawn_sweeper(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let events = Arc::clone(&self.events);
        let cache = Arc::clone(&self.cache);
        let retention = self.settings.retention;
        let period = self.settings.sweep_interval.max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let report = sweep(&registry, &events, &cache, retention);
                        if report != SweepReport::default() {
                            debug!(
                                jobs = report.jobs,
                                topics = report.topics,
                                cache_entries = report.cache_entries,
                                "Retention sweep"
                            );
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    fn spawn_invalidation(
        &self,
        mut changes: broadcast::Receiver<PositionChange>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    change = changes.recv() => match change {
                        Ok(change) => {
                            cache.invalidate_owner(change.owner, change.version);
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            let dropped = cache.invalidate_dependent();
                            warn!(
                                missed,
                                dropped,
                                "Position feed lagged; dropped all cached snapshots"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        })
    }
}

fn sweep(
    registry: &JobRegistry,
    events: &EventChannel,
    cache: &ResultCache,
    retention: Duration,
) -> SweepReport {
    let cutoff = chrono::Duration::from_std(retention)
        .ok()
        .and_then(|r| Utc::now().checked_sub_signed(r));
    let jobs = cutoff.map_or(0, |cutoff| registry.evict_terminal(cutoff).len());
    SweepReport {
        jobs,
        topics: events.evict_terminal(retention),
        cache_entries: cache.evict_expired(),
    }
}

impl JobApi for JobRuntime {
    fn submit(&self, payload: JobPayload) -> Result<JobHandle> {
        self.dispatcher.submit(payload)
    }

    fn subscribe(&self, job_id: JobId) -> Result<JobSubscription> {
        self.events
            .subscribe(job_id)
            .ok_or(Error::UnknownJob(job_id))
    }

    fn cancel(&self, job_id: JobId) -> Result<JobStatus> {
        self.registry.cancel(job_id, &self.queue)
    }

    fn job(&self, job_id: JobId) -> Option<JobRecord> {
        self.registry.get(job_id)
    }

    fn stats(&self) -> RuntimeStats {
        let workers = self.tasks.lock().pool.as_ref().map_or(0, WorkerPool::len);
        RuntimeStats {
            accepting: self.is_accepting(),
            queued: self.queue.len(),
            delayed: self.queue.delayed_len(),
            in_flight: self.registry.in_flight_count(),
            tracked_jobs: self.registry.len(),
            cached_results: self.cache.len(),
            workers,
        }
    }
}
