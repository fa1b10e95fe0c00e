//! Per-iteration placeholder resolution.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::FormatError;
use crate::format::{FormatDirective, PlaceholderValue};
use crate::parser::{PlaceholderName, PlaceholderToken};

/// Source of the instant used for `{timestamp}`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests and previews.
///
/// Returns `start` on the first read and advances by `step` on every read.
#[derive(Debug)]
pub struct FixedClock {
    start: DateTime<Utc>,
    step_millis: i64,
    reads: AtomicI64,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self::stepping(instant, Duration::zero())
    }

    pub fn stepping(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step_millis: step.num_milliseconds(),
            reads: AtomicI64::new(0),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::milliseconds(read.saturating_mul(self.step_millis))
    }
}

/// Resolution state for one generated message.
///
/// `{count}` and `{timestamp}` are fixed for the lifetime of the context;
/// `{uuid}` is drawn fresh for every occurrence.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    iteration_index: u64,
    instant: DateTime<Utc>,
    issued_uuids: Option<HashSet<Uuid>>,
}

impl ResolutionContext {
    /// Create a context for the 1-based `iteration_index`.
    pub fn new(iteration_index: u64, instant: DateTime<Utc>) -> Self {
        Self {
            iteration_index,
            instant,
            issued_uuids: None,
        }
    }

    /// Record every UUID handed out through this context.
    pub fn tracking_uuids(mut self) -> Self {
        self.issued_uuids = Some(HashSet::new());
        self
    }

    pub fn iteration_index(&self) -> u64 {
        self.iteration_index
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// UUIDs issued so far, when tracking is enabled.
    pub fn issued_uuids(&self) -> Option<&HashSet<Uuid>> {
        self.issued_uuids.as_ref()
    }

    fn next_uuid(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        if let Some(issued) = self.issued_uuids.as_mut() {
            issued.insert(id);
        }
        id
    }
}

/// Supplies placeholder source values and renders them.
#[derive(Clone)]
pub struct Resolver {
    clock: Arc<dyn Clock>,
    track_uuids: bool,
}

impl Resolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            track_uuids: false,
        }
    }

    /// Resolver backed by the system clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Make every context created by [`Resolver::context`] track UUIDs.
    pub fn with_uuid_tracking(mut self, enabled: bool) -> Self {
        self.track_uuids = enabled;
        self
    }

    /// Build the context for one iteration, reading the clock once.
    pub fn context(&self, iteration_index: u64) -> ResolutionContext {
        let context = ResolutionContext::new(iteration_index, self.clock.now());
        if self.track_uuids {
            context.tracking_uuids()
        } else {
            context
        }
    }

    /// Resolve one token occurrence to its rendered text.
    pub fn resolve(
        &self,
        context: &mut ResolutionContext,
        token: &PlaceholderToken,
    ) -> Result<String, FormatError> {
        let directive = FormatDirective::for_token(token)?;
        Ok(self.resolve_with(context, token.name, &directive))
    }

    /// Resolve one occurrence using an already classified directive.
    pub fn resolve_with(
        &self,
        context: &mut ResolutionContext,
        name: PlaceholderName,
        directive: &FormatDirective,
    ) -> String {
        let value = match name {
            PlaceholderName::Uuid => PlaceholderValue::Uuid(context.next_uuid()),
            PlaceholderName::Count => PlaceholderValue::Count(context.iteration_index),
            PlaceholderName::Timestamp => PlaceholderValue::Timestamp(context.instant),
        };
        directive.apply(&value)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("track_uuids", &self.track_uuids)
            .finish_non_exhaustive()
    }
}
