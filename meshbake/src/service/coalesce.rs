//! Request coalescing for job conversions.
//!
//! When several callers ask for the same job while its conversion is
//! running, only the first one does the work. The others subscribe to a
//! broadcast channel and receive the same result.
//!
//! ```text
//! request A ─┐
//!            │                          fetch + pipeline
//! request B ─┼──► RequestCoalescer ───► (request A only)
//!            │          │                     │
//! request C ─┘          ▼                     ▼
//!               B and C wait on the ◄──── complete()
//!               broadcast channel
//! ```
//!
//! The leader holds an [`InFlight`] guard. Dropping the guard without
//! completing it (the leader's future was cancelled, or it panicked)
//! removes the entry and closes the channel so waiters do not hang.

use super::{AssetArtifact, ServiceError};
use crate::job::JobKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// What waiters receive. Errors are flattened to their message since
/// [`ServiceError`] is not `Clone`.
pub(crate) type SharedResult = Result<AssetArtifact, String>;

/// Tracks in-flight conversions by job key.
pub struct RequestCoalescer {
    in_flight: Mutex<HashMap<JobKey, broadcast::Sender<SharedResult>>>,
    stats: Mutex<CoalescerStats>,
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Total requests received
    pub total_requests: u64,
    /// Requests that waited for an existing conversion
    pub coalesced_requests: u64,
    /// Requests that started a conversion
    pub new_requests: u64,
}

impl CoalescerStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Outcome of [`RequestCoalescer::register`].
pub(crate) enum Registration<'a> {
    /// First request for the key: run the conversion, then call
    /// [`InFlight::complete`].
    Leader(InFlight<'a>),
    /// Another request is running: wait on the receiver.
    Follower(broadcast::Receiver<SharedResult>),
}

/// Guard held by the request doing the work.
pub(crate) struct InFlight<'a> {
    coalescer: &'a RequestCoalescer,
    key: JobKey,
    completed: bool,
}

impl InFlight<'_> {
    /// Broadcasts the result to every waiter and clears the entry.
    pub(crate) fn complete(mut self, result: &Result<AssetArtifact, ServiceError>) {
        self.completed = true;
        let shared = match result {
            Ok(artifact) => Ok(artifact.clone()),
            Err(e) => Err(e.to_string()),
        };
        self.coalescer.finish(&self.key, Some(shared));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            debug!(job = %self.key, "Conversion abandoned, releasing waiters");
            self.coalescer.finish(&self.key, None);
        }
    }
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            stats: Mutex::new(CoalescerStats::default()),
        }
    }

    pub(crate) fn register(&self, key: &JobKey) -> Registration<'_> {
        let mut in_flight = self.in_flight.lock();
        let mut stats = self.stats.lock();
        stats.total_requests += 1;

        if let Some(tx) = in_flight.get(key) {
            stats.coalesced_requests += 1;
            debug!(
                job = %key,
                coalesced = stats.coalesced_requests,
                "Coalescing request - waiting for in-flight conversion"
            );
            Registration::Follower(tx.subscribe())
        } else {
            // Only one message is ever sent per channel.
            let (tx, _rx) = broadcast::channel(1);
            in_flight.insert(key.clone(), tx);
            stats.new_requests += 1;
            debug!(
                job = %key,
                in_flight_count = in_flight.len(),
                "New request - starting conversion"
            );
            Registration::Leader(InFlight {
                coalescer: self,
                key: key.clone(),
                completed: false,
            })
        }
    }

    fn finish(&self, key: &JobKey, result: Option<SharedResult>) {
        let Some(tx) = self.in_flight.lock().remove(key) else {
            return;
        };
        if let Some(result) = result {
            let waiters = tx.receiver_count();
            // No receivers is fine: nobody else asked.
            let _ = tx.send(result);
            if waiters > 0 {
                debug!(job = %key, waiters, "Broadcast result to coalesced waiters");
            }
        }
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CoalescerStats {
        *self.stats.lock()
    }

    /// Returns the number of conversions currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            total_requests = stats.total_requests,
            coalesced = stats.coalesced_requests,
            new_requests = stats.new_requests,
            in_flight = self.in_flight_count(),
            coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
            "Request coalescing statistics"
        );
    }
}

impl Default for RequestCoalescer {
    fn default() -> Self {
        Self::new()
    }
}
