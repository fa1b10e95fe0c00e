//! Command-line interface for kafka-send
//!
//! # Usage Examples
//!
//! ## Send
//! ```bash
//! # Send 5 messages through the cluster configured in kafka-send.toml
//! kafka-send send --config kafka-send.toml \
//!   --server prod_eu --topic orders \
//!   --template order.yaml --count 5
//!
//! # Ad-hoc broker, 8 sends in flight, create the topic first
//! kafka-send send --bootstrap-servers localhost:9092 \
//!   --server localhost_9092 --topic orders \
//!   --template order.yaml --count 10000 --concurrency 8 --create-topic
//! ```
//!
//! ## Preview
//! ```bash
//! kafka-send preview --template order.yaml --count 3
//! ```
//!
//! ## Template Format
//! ```yaml
//! key: "order-{count:06d}"
//! value: '{"id":"{uuid}","at":"{timestamp}"}'
//! headers:
//!   - key: trace-id
//!     value: "{uuid}"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use kafka_send::{ClusterOpts, PreviewSink};
use kafka_sink::KafkaSink;
use message_dispatch::{
    BatchResult, CancellationToken, DispatchEvent, DispatchOptions, DispatchRequest, Dispatcher,
    MessageSink,
};
use message_template::MessageTemplate;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "kafka-send")]
#[command(about = "Send batches of templated messages to Kafka")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Materialize a template `count` times and send every message
    Send {
        /// Cluster id (sanitized bootstrap server or cluster name)
        #[arg(long)]
        server: String,

        /// Target topic
        #[arg(long)]
        topic: String,

        /// Template file (YAML, JSON or TOML)
        #[arg(long)]
        template: PathBuf,

        /// Number of messages to send
        #[arg(long, default_value = "1")]
        count: u64,

        /// Maximum number of sends in flight (1 = sequential)
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Create the topic before sending if it doesn't exist
        #[arg(long)]
        create_topic: bool,

        /// Partitions for --create-topic
        #[arg(long, default_value = "1")]
        partitions: i32,

        /// Replication factor for --create-topic
        #[arg(long, default_value = "1")]
        replication_factor: i32,

        /// Print messages as JSON lines instead of sending them
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        cluster: ClusterOpts,
    },

    /// Print materialized messages as JSON lines without a broker
    Preview {
        /// Template file (YAML, JSON or TOML)
        #[arg(long)]
        template: PathBuf,

        /// Number of messages to print
        #[arg(long, default_value = "1")]
        count: u64,
    },

    /// List the configured cluster ids
    Clusters {
        #[command(flatten)]
        cluster: ClusterOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Logs go to stderr so JSON lines on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            server,
            topic,
            template,
            count,
            concurrency,
            create_topic,
            partitions,
            replication_factor,
            dry_run,
            cluster,
        } => {
            let template = load_template(&template)?;
            let request = DispatchRequest::new(server, topic, template, count);
            let options = DispatchOptions { concurrency };

            let result = if dry_run {
                let sink = Arc::new(PreviewSink::new(std::io::stdout()));
                run_dispatch(sink, request, options).await?
            } else {
                let (registry, settings) = cluster.load()?;
                registry
                    .get(&request.server_id)
                    .with_context(|| format!("Cannot send to server '{}'", request.server_id))?;

                let sink = Arc::new(KafkaSink::new(registry, settings));
                if create_topic {
                    sink.create_topic(
                        &request.server_id,
                        &request.topic,
                        partitions,
                        replication_factor,
                    )
                    .await
                    .with_context(|| format!("Failed to create topic '{}'", request.topic))?;
                }
                run_dispatch(sink, request, options).await?
            };

            println!("{}", result.summary());
            if result.failed_count > 0 {
                anyhow::bail!("{} of {} messages failed", result.failed_count, result.requested);
            }
            if result.is_cancelled() {
                anyhow::bail!("Batch cancelled, {} messages not sent", result.cancelled);
            }
        }
        Commands::Preview { template, count } => {
            let template = load_template(&template)?;
            let request = DispatchRequest::new("preview", "preview", template, count);
            let sink = Arc::new(PreviewSink::new(std::io::stdout()));
            run_dispatch(sink, request, DispatchOptions::default()).await?;
        }
        Commands::Clusters { cluster } => {
            let (registry, _) = cluster.load()?;
            if registry.is_empty() {
                warn!("No clusters configured, pass --config or --bootstrap-servers");
            }
            for (id, cluster) in registry.iter() {
                println!("{id}\t{}", cluster.bootstrap_servers());
            }
        }
    }

    Ok(())
}

fn load_template(path: &Path) -> anyhow::Result<MessageTemplate> {
    MessageTemplate::from_file(path)
        .with_context(|| format!("Failed to load message template from {path:?}"))
}

/// Run one batch, cancelling it on Ctrl+C and reporting failed iterations.
async fn run_dispatch<S: MessageSink + 'static>(
    sink: Arc<S>,
    request: DispatchRequest,
    options: DispatchOptions,
) -> anyhow::Result<BatchResult> {
    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(sink)
        .with_options(options)
        .with_cancellation(cancel.clone());

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal (Ctrl+C), stopping after in-flight messages");
            cancel.cancel();
        }
    });

    let (handle, mut events) = dispatcher.spawn_with_events(request);
    while let Some(event) = events.next().await {
        if let DispatchEvent::Outcome(outcome) = event {
            if let Some(error) = &outcome.error {
                eprintln!("Message {} failed: {error}", outcome.index);
            }
        }
    }

    let joined = handle.await;
    interrupt.abort();
    let result = joined.context("Dispatch task failed")??;
    Ok(result)
}
