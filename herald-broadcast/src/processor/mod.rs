//! Broadcast run orchestration

mod progress;
mod scheduler;
mod worker;

use std::{sync::Arc, time::Duration};

use herald_common::{Signal, internal};
use herald_tracing::traced;
use serde::{Deserialize, Serialize};
use tokio::{sync::broadcast, task::JoinSet, time::Instant};

use crate::{
    error::BroadcastError,
    policy::RetryPolicy,
    queue::{DelayQueue, WorkQueue},
    rate_gate::RateGate,
    service::{BlockedSink, ProgressSink, Transport},
    stats::{RunLedger, RunStats},
    types::{DeliveryUnit, Payload, RecipientId},
};

/// Upper bound for `window_ms` and `progress_interval_ms`
const MAX_PERIOD_MS: u64 = 60 * 60 * 1000;

const fn default_workers() -> usize {
    5
}

const fn default_max_rate() -> usize {
    35
}

const fn default_window_ms() -> u64 {
    1000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_progress_interval_ms() -> u64 {
    2000
}

/// Tunables for a broadcast run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Number of concurrent senders
    ///
    /// Default: 5
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum send calls admitted per window, across all workers
    ///
    /// Default: 35
    #[serde(default = "default_max_rate")]
    pub max_rate: usize,

    /// Length of the sliding rate window (in milliseconds)
    ///
    /// Default: 1000
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum send attempts per recipient when the API keeps rate limiting
    ///
    /// Default: 3
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How often progress is reported (in milliseconds)
    ///
    /// Default: 2000
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_rate: default_max_rate(),
            window_ms: default_window_ms(),
            max_attempts: default_max_attempts(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl BroadcastConfig {
    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::Configuration`] naming the first bad value.
    pub fn validate(&self) -> Result<(), BroadcastError> {
        let invalid = |field: &str| {
            Err(BroadcastError::Configuration(format!(
                "{field} must be at least 1"
            )))
        };
        let too_long = |field: &str| {
            Err(BroadcastError::Configuration(format!(
                "{field} must be at most {MAX_PERIOD_MS}"
            )))
        };

        if self.workers == 0 {
            return invalid("workers");
        }
        if self.max_rate == 0 {
            return invalid("max_rate");
        }
        if self.window_ms == 0 {
            return invalid("window_ms");
        }
        if self.window_ms > MAX_PERIOD_MS {
            return too_long("window_ms");
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts");
        }
        if self.progress_interval_ms == 0 {
            return invalid("progress_interval_ms");
        }
        if self.progress_interval_ms > MAX_PERIOD_MS {
            return too_long("progress_interval_ms");
        }

        Ok(())
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
    }
}

/// Per-run overrides; unset values fall back to the [`BroadcastConfig`]
#[derive(Default, Clone)]
pub struct RunOptions {
    workers: Option<usize>,
    progress_interval: Option<Duration>,
    on_progress: Option<Arc<dyn ProgressSink>>,
}

impl RunOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub const fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.on_progress = Some(sink);
        self
    }
}

/// Fans one payload out to many recipients.
///
/// Holds no per-run state: every call to [`Broadcaster::broadcast`] builds its
/// own rate gate, queues and counters, so concurrent runs never share a
/// throughput budget.
pub struct Broadcaster {
    config: BroadcastConfig,
    transport: Arc<dyn Transport>,
    blocked_sink: Option<Arc<dyn BlockedSink>>,
}

impl Broadcaster {
    #[must_use]
    pub fn new(config: BroadcastConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            blocked_sink: None,
        }
    }

    /// Persist blocked recipients through `sink` at the end of each run
    #[must_use]
    pub fn with_blocked_sink(mut self, sink: Arc<dyn BlockedSink>) -> Self {
        self.blocked_sink = Some(sink);
        self
    }

    /// Send `payload` to every recipient and wait for all of them to settle.
    ///
    /// Duplicate recipients are delivered independently. Individual failures
    /// never abort the run; they are counted in the returned [`RunStats`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or overrides are invalid, or if
    /// a worker task panicked.
    #[traced(instrument(level = "debug", skip_all, err), timing(precision = "s"))]
    pub async fn broadcast(
        &self,
        recipients: Vec<RecipientId>,
        payload: Payload,
        options: RunOptions,
    ) -> Result<RunStats, BroadcastError> {
        let config = BroadcastConfig {
            workers: options.workers.unwrap_or(self.config.workers),
            progress_interval_ms: options.progress_interval.map_or(
                self.config.progress_interval_ms,
                |interval| u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            ),
            ..self.config.clone()
        };
        config.validate()?;

        let total = recipients.len();
        if total == 0 {
            internal!(level = INFO, "Broadcast requested with no recipients");
            return Ok(RunStats::empty());
        }

        let started = Instant::now();
        let payload = Arc::new(payload);
        let ledger = Arc::new(RunLedger::new(total));
        let work = Arc::new(WorkQueue::seeded(
            recipients
                .into_iter()
                .map(|recipient| DeliveryUnit::new(recipient, Arc::clone(&payload))),
        ));
        let delayed = Arc::new(DelayQueue::new());
        let context = Arc::new(worker::WorkerContext {
            transport: Arc::clone(&self.transport),
            gate: Arc::new(RateGate::new(config.max_rate, config.window())),
            work: Arc::clone(&work),
            delayed: Arc::clone(&delayed),
            ledger: Arc::clone(&ledger),
            policy: config.retry_policy(),
        });

        let (shutdown, _) = broadcast::channel(4);

        tracing::info!(
            recipients = total,
            workers = config.workers,
            max_rate = config.max_rate,
            "Broadcast started"
        );

        let reporter = options.on_progress.as_ref().map(|sink| {
            tokio::spawn(progress::run_reporter(
                Arc::clone(&ledger),
                Arc::clone(sink),
                config.progress_interval(),
                shutdown.subscribe(),
            ))
        });

        let mut workers = JoinSet::new();
        for id in 0..config.workers {
            workers.spawn(worker::run_worker(
                id,
                Arc::clone(&context),
                shutdown.subscribe(),
            ));
        }

        let scheduler = tokio::spawn(scheduler::run_scheduler(
            Arc::clone(&delayed),
            Arc::clone(&work),
            shutdown.subscribe(),
        ));

        if let Err(e) = Self::wait_for_drain(&ledger, &mut workers).await {
            if shutdown.send(Signal::Shutdown).is_err() {
                tracing::debug!("No running tasks to signal");
            }
            workers.abort_all();
            scheduler.abort();
            if let Some(reporter) = reporter {
                reporter.abort();
            }
            self.flush_blocked(&ledger).await;
            return Err(e);
        }

        debug_assert!(work.is_empty() && delayed.is_empty());
        internal!("All units settled, stopping workers");

        if shutdown.send(Signal::Shutdown).is_err() {
            tracing::debug!("No running tasks to signal");
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Worker did not stop cleanly");
            }
        }
        if let Err(e) = scheduler.await {
            tracing::warn!(error = %e, "Delay scheduler did not stop cleanly");
        }

        if let (Some(reporter), Some(sink)) = (reporter, options.on_progress.as_ref()) {
            if let Err(e) = reporter.await {
                tracing::warn!(error = %e, "Progress reporter did not stop cleanly");
            }
            progress::emit(sink.as_ref(), ledger.snapshot()).await;
        }

        self.flush_blocked(&ledger).await;

        let stats = ledger.finish(started.elapsed());
        tracing::info!(
            sent = stats.total_sent,
            total = stats.total_messages,
            failed = stats.failed_count,
            blocked = stats.blocked_count,
            avg_speed = stats.avg_speed,
            duration_secs = stats.duration_seconds,
            "Broadcast finished"
        );

        Ok(stats)
    }

    /// Wait until every unit settled, watching for workers that died.
    ///
    /// Workers only return after a shutdown signal, so any completion before
    /// the drain is a panic.
    async fn wait_for_drain(
        ledger: &RunLedger,
        workers: &mut JoinSet<()>,
    ) -> Result<(), BroadcastError> {
        let drained = ledger.drained();
        tokio::pin!(drained);

        loop {
            tokio::select! {
                () = &mut drained => return Ok(()),
                Some(joined) = workers.join_next() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Broadcast worker failed");
                        return Err(BroadcastError::WorkerFailed(e.to_string()));
                    }
                }
            }
        }
    }

    async fn flush_blocked(&self, ledger: &RunLedger) {
        let blocked = ledger.blocked();
        if blocked.is_empty() {
            return;
        }

        let Some(sink) = &self.blocked_sink else {
            tracing::debug!(
                blocked = blocked.len(),
                "No blocked-recipient sink configured"
            );
            return;
        };

        match sink.persist_blocked(&blocked).await {
            Ok(()) => internal!(level = INFO, "Persisted {} blocked recipients", blocked.len()),
            Err(e) => tracing::error!(
                blocked = blocked.len(),
                error = %e,
                "Failed to persist blocked recipients"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BroadcastConfig::default();
        assert_eq!(config.workers, 5);
        assert_eq!(config.max_rate, 35);
        assert_eq!(config.window(), Duration::from_secs(1));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.progress_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_values() {
        for config in [
            BroadcastConfig {
                workers: 0,
                ..BroadcastConfig::default()
            },
            BroadcastConfig {
                max_rate: 0,
                ..BroadcastConfig::default()
            },
            BroadcastConfig {
                window_ms: 0,
                ..BroadcastConfig::default()
            },
            BroadcastConfig {
                max_attempts: 0,
                ..BroadcastConfig::default()
            },
            BroadcastConfig {
                progress_interval_ms: 0,
                ..BroadcastConfig::default()
            },
        ] {
            let err = config.validate().unwrap_err();
            assert!(err.is_configuration(), "{config:?} accepted");
        }
    }

    #[test]
    fn test_config_rejects_unbounded_periods() {
        for config in [
            BroadcastConfig {
                window_ms: u64::MAX,
                ..BroadcastConfig::default()
            },
            BroadcastConfig {
                progress_interval_ms: MAX_PERIOD_MS + 1,
                ..BroadcastConfig::default()
            },
        ] {
            let err = config.validate().unwrap_err();
            assert!(err.is_configuration(), "{config:?} accepted");
        }

        let longest = BroadcastConfig {
            window_ms: MAX_PERIOD_MS,
            progress_interval_ms: MAX_PERIOD_MS,
            ..BroadcastConfig::default()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_config_partial_ron() {
        let config: BroadcastConfig = ron::from_str("(workers: 20, max_rate: 25)").unwrap();
        assert_eq!(config.workers, 20);
        assert_eq!(config.max_rate, 25);
        assert_eq!(config.window_ms, 1000);
        assert_eq!(config.max_attempts, 3);
    }
}
