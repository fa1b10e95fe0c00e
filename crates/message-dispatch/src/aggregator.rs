//! Outcome aggregation.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::sink::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Succeeded,
    Failed,
}

/// Result of sending one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// 1-based iteration index, equal to the rendered `{count}`.
    pub index: u64,
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransportError>,
}

impl DispatchOutcome {
    pub fn succeeded(index: u64) -> Self {
        Self {
            index,
            status: DispatchStatus::Succeeded,
            error: None,
        }
    }

    pub fn failed(index: u64, error: TransportError) -> Self {
        Self {
            index,
            status: DispatchStatus::Failed,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Succeeded
    }
}

/// Summary of a finished batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// Number of messages the request asked for.
    pub requested: u64,
    pub succeeded_count: u64,
    pub failed_count: u64,
    /// Iterations never started because the batch was cancelled.
    pub cancelled: u64,
    /// Outcomes ordered by index.
    pub outcomes: Vec<DispatchOutcome>,
    #[serde(skip)]
    pub duration: Duration,
}

impl BatchResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed_count == 0 && self.cancelled == 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Calculate messages per second.
    pub fn messages_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.succeeded_count as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Human readable summary, e.g. `3 of 5 succeeded`.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} of {} succeeded", self.succeeded_count, self.requested);
        if self.failed_count > 0 {
            summary.push_str(&format!(", {} failed", self.failed_count));
        }
        if self.cancelled > 0 {
            summary.push_str(&format!(", {} cancelled", self.cancelled));
        }
        summary
    }
}

#[derive(Debug, Default)]
struct Tally {
    succeeded: u64,
    failed: u64,
    outcomes: Vec<DispatchOutcome>,
}

/// Concurrency-safe accumulator of [`DispatchOutcome`]s.
///
/// Outcomes may be recorded from several tasks and in any order.
#[derive(Debug)]
pub struct Aggregator {
    requested: u64,
    tally: Mutex<Tally>,
}

impl Aggregator {
    pub fn new(requested: u64) -> Self {
        Self {
            requested,
            tally: Mutex::new(Tally {
                outcomes: Vec::with_capacity(requested.min(1 << 16) as usize),
                ..Tally::default()
            }),
        }
    }

    pub fn record(&self, outcome: DispatchOutcome) {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome.status {
            DispatchStatus::Succeeded => tally.succeeded += 1,
            DispatchStatus::Failed => tally.failed += 1,
        }
        tally.outcomes.push(outcome);
    }

    /// Number of outcomes recorded so far.
    pub fn recorded(&self) -> u64 {
        let tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        tally.succeeded + tally.failed
    }

    /// Build the batch result once every started iteration has reported.
    ///
    /// Repeated calls return the same result apart from `duration`.
    pub(crate) fn finalize(&self, duration: Duration) -> BatchResult {
        let tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        let recorded = tally.succeeded + tally.failed;
        debug_assert!(recorded <= self.requested);

        let mut outcomes = tally.outcomes.clone();
        outcomes.sort_by_key(|o| o.index);

        BatchResult {
            requested: self.requested,
            succeeded_count: tally.succeeded,
            failed_count: tally.failed,
            cancelled: self.requested.saturating_sub(recorded),
            outcomes,
            duration,
        }
    }
}
