//! Batch dispatcher.
//!
//! Iteration indices are assigned in order by a single stream, before any
//! send is issued. With `concurrency = 1` (the default) sends happen strictly
//! in index order; larger values keep up to that many sends in flight.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use message_template::{materialize, ParsedTemplate, ResolvedMessage, Resolver, TemplateError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, BatchResult, DispatchOutcome};
use crate::error::DispatchError;
use crate::request::DispatchRequest;
use crate::sink::MessageSink;

/// Capacity of the event channel used by [`Dispatcher::spawn_with_events`].
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Maximum number of sends in flight. 1 means sequential.
    pub concurrency: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Progress notifications for a running batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Started { count: u64 },
    Outcome(DispatchOutcome),
    Finished(BatchResult),
}

enum Step {
    Sent(DispatchOutcome),
    Skipped,
    Aborted(TemplateError),
}

/// Drives a batch: materializes every iteration and sends it through the sink.
pub struct Dispatcher<S: ?Sized> {
    sink: Arc<S>,
    resolver: Resolver,
    options: DispatchOptions,
    cancel: CancellationToken,
}

impl<S: ?Sized> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            resolver: self.resolver.clone(),
            options: self.options.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<S: MessageSink + ?Sized + 'static> Dispatcher<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            resolver: Resolver::system(),
            options: DispatchOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Use an externally owned token; cancelling it stops the batch before
    /// the next send.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the batch to completion.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<BatchResult, DispatchError> {
        self.run(request, None).await
    }

    /// Run the batch on a background task, streaming progress events.
    ///
    /// The stream ends after [`DispatchEvent::Finished`], or without it when
    /// the batch fails before sending.
    pub fn spawn_with_events(
        &self,
        request: DispatchRequest,
    ) -> (
        JoinHandle<Result<BatchResult, DispatchError>>,
        ReceiverStream<DispatchEvent>,
    ) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let dispatcher = self.clone();
        let handle = tokio::spawn(async move { dispatcher.run(&request, Some(tx)).await });
        (handle, ReceiverStream::new(rx))
    }

    async fn run(
        &self,
        request: &DispatchRequest,
        events: Option<mpsc::Sender<DispatchEvent>>,
    ) -> Result<BatchResult, DispatchError> {
        request.validate()?;

        // Parse once; nothing is sent if the template is invalid
        let parsed = ParsedTemplate::parse(&request.template)?;
        parsed.validate()?;

        let concurrency = self.options.concurrency.max(1);
        info!(
            server_id = %request.server_id,
            topic = %request.topic,
            count = request.count,
            concurrency,
            placeholders = parsed.placeholder_count(),
            "Dispatching message batch"
        );

        emit(&events, DispatchEvent::Started {
            count: request.count,
        })
        .await;

        let start_time = Instant::now();
        let aggregator = Aggregator::new(request.count);

        let cancel = &self.cancel;
        let parsed = &parsed;
        let indices = (1..=request.count).take_while(|_| !cancel.is_cancelled());
        let steps = stream::iter(indices)
            .map(|index| {
                let mut context = self.resolver.context(index);
                let message = materialize(parsed, &self.resolver, &mut context);
                (index, message)
            })
            .map(|(index, message)| self.send_one(request, index, message))
            .buffer_unordered(concurrency);
        tokio::pin!(steps);

        while let Some(step) = steps.next().await {
            match step {
                Step::Sent(outcome) => {
                    aggregator.record(outcome.clone());
                    emit(&events, DispatchEvent::Outcome(outcome)).await;
                }
                Step::Skipped => {}
                Step::Aborted(err) => return Err(err.into()),
            }
        }

        let result = aggregator.finalize(start_time.elapsed());

        if result.is_cancelled() {
            warn!(
                topic = %request.topic,
                cancelled = result.cancelled,
                "Batch cancelled before all iterations were started"
            );
        }
        info!(
            topic = %request.topic,
            succeeded = result.succeeded_count,
            failed = result.failed_count,
            duration = ?result.duration,
            "Batch complete: {} ({:.2} msg/sec)",
            result.summary(),
            result.messages_per_second()
        );

        emit(&events, DispatchEvent::Finished(result.clone())).await;
        Ok(result)
    }

    async fn send_one(
        &self,
        request: &DispatchRequest,
        index: u64,
        message: Result<ResolvedMessage, TemplateError>,
    ) -> Step {
        let message = match message {
            Ok(message) => message,
            Err(err) => return Step::Aborted(err),
        };

        if self.cancel.is_cancelled() {
            debug!(index, "Skipping send after cancellation");
            return Step::Skipped;
        }

        match self
            .sink
            .send(&request.server_id, &request.topic, &message)
            .await
        {
            Ok(()) => {
                debug!(index, topic = %request.topic, "Message sent");
                Step::Sent(DispatchOutcome::succeeded(index))
            }
            Err(err) => {
                warn!(index, topic = %request.topic, error = %err, "Message send failed");
                Step::Sent(DispatchOutcome::failed(index, err))
            }
        }
    }
}

async fn emit(events: &Option<mpsc::Sender<DispatchEvent>>, event: DispatchEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening
        let _ = tx.send(event).await;
    }
}
