//! Fixed-interval progress polling that lives exactly as long as the request
//! it reports on.

use crate::client::ProgressSource;
use crate::models::{CrawlProgress, ProgressState};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

pub const DEFAULT_PROGRESS_MESSAGE: &str = "Crawling...";

/// Completion percentage clamped to `0..=100`; a zero total reads as 0%.
pub fn percentage(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = completed as f64 / total as f64 * 100.0;
    ratio.round().min(100.0) as u8
}

/// Display side of the poller.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, percent: u8, message: &str);
}

impl ProgressSink for watch::Sender<CrawlProgress> {
    fn publish(&self, percent: u8, message: &str) {
        self.send_modify(|view| {
            view.percent = percent;
            view.message = message.to_string();
        });
    }
}

pub struct ProgressPoller {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressPoller {
    /// Spawns the polling task. The first tick fires one `period` after start.
    pub fn start<S, K>(source: Arc<S>, sink: Arc<K>, period: Duration) -> Self
    where
        S: ProgressSource + ?Sized + 'static,
        K: ProgressSink + ?Sized + 'static,
    {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {}
                }
                // a tick that has started runs to completion even if stop arrives meanwhile
                poll_once(source.as_ref(), sink.as_ref()).await;
            }
            debug!("progress poller stopped");
        });
        Self { stop, handle }
    }

    /// Prevents further ticks. An in-flight tick still finishes; the returned
    /// handle resolves once it has.
    pub fn stop(self) -> JoinHandle<()> {
        let _ = self.stop.send(());
        self.handle
    }
}

async fn poll_once<S, K>(source: &S, sink: &K)
where
    S: ProgressSource + ?Sized,
    K: ProgressSink + ?Sized,
{
    match source.fetch_progress().await {
        Ok(state) => publish_state(sink, &state),
        Err(err) => warn!("failed to fetch crawl progress: {err}"),
    }
}

fn publish_state<K: ProgressSink + ?Sized>(sink: &K, state: &ProgressState) {
    let percent = percentage(state.completed, state.total);
    let message = state
        .message
        .as_deref()
        .filter(|message| !message.is_empty())
        .unwrap_or(DEFAULT_PROGRESS_MESSAGE);
    debug!(percent, status = ?state.status, "crawl progress");
    sink.publish(percent, message);
}

/// Awaits `foreground` while polling `source` every `period`. Polling stops
/// when `foreground` settles, whatever the polled status says.
pub async fn run_with_progress<S, K, F>(
    source: Arc<S>,
    sink: Arc<K>,
    period: Duration,
    foreground: F,
) -> F::Output
where
    S: ProgressSource + ?Sized + 'static,
    K: ProgressSink + ?Sized + 'static,
    F: Future,
{
    let poller = ProgressPoller::start(source, sink, period);
    let output = foreground.await;
    drop(poller.stop());
    output
}
