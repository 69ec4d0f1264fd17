//! Sliding-window rate limiting per endpoint and caller.
//!
//! Each key maps to the log of admitted request timestamps (epoch ms). A check
//! prunes the log to the trailing window, then admits only while the pruned
//! count is below the quota. There are no fixed buckets, so bursts at bucket
//! edges cannot double the effective rate.
//!
//! State is process-local. A fresh process starts with empty logs and
//! separate instances do not share counts.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::clock::now_millis;
use crate::config::EndpointQuota;
use crate::observability::metrics;

/// Compose the limiter key for a caller of an endpoint.
pub fn limiter_key(endpoint: &str, caller_key: &str) -> String {
    format!("{}:{}", endpoint, caller_key)
}

/// Timestamp log for one key. Kept with the window it was last checked
/// against so a global sweep can prune without knowing the endpoint.
#[derive(Debug, Clone)]
struct RequestLog {
    timestamps: Vec<u64>,
    window_ms: u64,
}

impl RequestLog {
    fn prune(&mut self, now_ms: u64) {
        let window_start = now_ms.saturating_sub(self.window_ms);
        self.timestamps.retain(|&t| t > window_start);
    }
}

/// In-memory sliding-window limiter.
///
/// The map is sharded; a decision holds the shard lock for its key from the
/// read of the log to the write of the new timestamp.
pub struct SlidingWindowLimiter {
    logs: DashMap<String, RequestLog>,
    sweep_probability: f64,
}

impl SlidingWindowLimiter {
    pub const DEFAULT_SWEEP_PROBABILITY: f64 = 0.01;

    pub fn new() -> Self {
        Self::with_sweep_probability(Self::DEFAULT_SWEEP_PROBABILITY)
    }

    #[must_use]
    pub fn with_sweep_probability(sweep_probability: f64) -> Self {
        Self {
            logs: DashMap::new(),
            sweep_probability: sweep_probability.clamp(0.0, 1.0),
        }
    }

    pub fn sweep_probability(&self) -> f64 {
        self.sweep_probability
    }

    /// Admit or reject a request for `key` at the current wall-clock time.
    #[must_use]
    pub fn check(&self, key: &str, quota: &EndpointQuota) -> bool {
        self.check_at(key, quota, now_millis())
    }

    /// Admit or reject a request for `key` as of `now_ms`.
    ///
    /// Admission appends `now_ms`; rejection stores only the pruned log.
    #[must_use]
    pub fn check_at(&self, key: &str, quota: &EndpointQuota, now_ms: u64) -> bool {
        let admitted = {
            let mut log = self
                .logs
                .entry(key.to_string())
                .or_insert_with(|| RequestLog {
                    timestamps: Vec::new(),
                    window_ms: quota.window_ms,
                });

            log.window_ms = quota.window_ms;
            log.prune(now_ms);

            if log.timestamps.len() < quota.max as usize {
                log.timestamps.push(now_ms);
                true
            } else {
                false
            }
        };

        if self.sweep_probability > 0.0 && fastrand::f64() < self.sweep_probability {
            self.sweep(now_ms);
        }

        admitted
    }

    /// Prune every log and drop keys left without timestamps.
    /// Returns the number of keys removed.
    pub fn sweep(&self, now_ms: u64) -> usize {
        let before = self.logs.len();

        self.logs.retain(|_, log| {
            log.prune(now_ms);
            !log.timestamps.is_empty()
        });

        let removed = before.saturating_sub(self.logs.len());
        metrics::record_limiter_sweep(removed, self.logs.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.logs.len(), "Rate limiter sweep");
        }
        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    /// Stored timestamps for `key`, if tracked.
    pub fn history_len(&self, key: &str) -> Option<usize> {
        self.logs.get(key).map(|log| log.timestamps.len())
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically sweep the limiter until shutdown.
pub async fn run_sweeper(
    limiter: Arc<SlidingWindowLimiter>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Rate limiter sweeper starting");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                limiter.sweep(now_millis());
            }
            _ = shutdown.recv() => {
                tracing::info!("Rate limiter sweeper received shutdown signal");
                break;
            }
        }
    }
}
