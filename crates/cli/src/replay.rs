use crate::{env::EnvManager, error::CliError, output, shutdown::ShutdownCoordinator};
use engine_core::{
    connectors::{memory::MemorySource, retrying::RetryingSource},
    metrics::MetricsSnapshot,
};
use engine_runtime::scroll::{ChannelSubscriber, ScrollPublisher, Signal};
use model::query::ScrollQuery;
use serde_json::Value;
use std::{io::Write, path::PathBuf};
use tracing::{info, warn};

pub struct ReplayArgs {
    pub pages: PathBuf,
    pub request: u64,
    pub max_items: Option<u64>,
    pub index: String,
    pub env_file: Option<PathBuf>,
}

/// Serves the recorded pages through the adapter, writing each item as a JSON
/// line to `out`. Items are requested `args.request` at a time.
pub async fn run(
    args: ReplayArgs,
    shutdown: &ShutdownCoordinator,
    out: &mut impl Write,
) -> Result<MetricsSnapshot, CliError> {
    let mut env = EnvManager::from_process();
    if let Some(path) = &args.env_file {
        env.load_from_file(path)?;
    }
    let settings = env.scroll_settings(args.max_items)?;

    let raw = tokio::fs::read_to_string(&args.pages).await?;
    let pages = parse_pages(&raw)?;
    info!(
        file = %args.pages.display(),
        pages = pages.len(),
        items = pages.iter().map(Vec::len).sum::<usize>(),
        "Loaded recorded scroll"
    );

    let source = RetryingSource::new(MemorySource::new(pages), settings.retry().clone());
    let publisher = ScrollPublisher::new(source, settings);

    let (subscriber, mut signals) = ChannelSubscriber::channel();
    let subscription = publisher
        .subscribe(ScrollQuery::new(args.index), subscriber)
        .await?;

    let batch = args.request.max(1);
    let cancelled = shutdown.cancel_token();
    let mut received = 0u64;
    subscription.request(batch).await;

    let outcome = loop {
        tokio::select! {
            biased;

            _ = cancelled.cancelled() => {
                subscription.cancel().await;
                break Err(CliError::ShutdownRequested);
            }
            signal = signals.recv() => match signal {
                Some(Signal::Next(item)) => {
                    output::print_item(out, &item)?;
                    received += 1;
                    if received % batch == 0 {
                        subscription.request(batch).await;
                    }
                }
                Some(Signal::Complete) => break Ok(()),
                Some(Signal::Error(e)) => break Err(CliError::Scroll(e)),
                None => {
                    break Err(CliError::Unexpected(
                        "scroll ended without a terminal signal".into(),
                    ));
                }
            },
        }
    };

    let metrics = subscription.shutdown().await?;
    match &outcome {
        Ok(()) => info!(items = received, "Replay finished"),
        Err(e) => warn!(items = received, error = %e, "Replay stopped early"),
    }
    outcome.map(|()| metrics)
}

/// Parses a JSON array of pages, each an array of items.
pub fn parse_pages(raw: &str) -> Result<Vec<Vec<Value>>, CliError> {
    Ok(serde_json::from_str(raw)?)
}
