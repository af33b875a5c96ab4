use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, MissedTickBehavior};

use super::queue::FrameQueue;
use super::readings::{AcquireStats, TestReadings};

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Periodic consumer-side drain of the frame queue.
///
/// Each tick takes at most one frame and publishes its semantic mapping
/// on a watch channel; an empty queue leaves the previous snapshot in
/// place. A backlog drains one frame per tick until the bounded queue
/// starts dropping, which caps total staleness.
pub struct FramePoller {
    stop_tx: mpsc::Sender<()>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl FramePoller {
    pub fn spawn(
        queue: Arc<FrameQueue>,
        stats: Arc<AcquireStats>,
        readings_tx: watch::Sender<TestReadings>,
        poll_interval: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel(1);

        let task_handle = tokio::spawn(async move {
            run_poll_loop(queue, stats, readings_tx, poll_interval, stop_rx).await;
        });

        Self {
            stop_tx,
            task_handle: Some(task_handle),
        }
    }

    /// Stop the poll loop and wait for it to land.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(()).await;
        if let Some(handle) = self.task_handle.take() {
            let _ = timeout(STOP_JOIN_TIMEOUT, handle).await;
        }
    }
}

async fn run_poll_loop(
    queue: Arc<FrameQueue>,
    stats: Arc<AcquireStats>,
    readings_tx: watch::Sender<TestReadings>,
    poll_interval: Duration,
    mut stop_rx: mpsc::Receiver<()>,
) {
    log::info!("Frame poller started with {:?} tick", poll_interval);

    let mut ticker = interval(poll_interval);
    // One pop per tick interval even after a stall; no burst catch-up
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                log::info!("Frame poller received stop signal");
                break;
            }
            _ = ticker.tick() => {
                if let Some(frame) = queue.try_pop() {
                    stats.record_poll();
                    let _ = readings_tx.send(TestReadings::from_frame(&frame));
                }
            }
        }
    }

    log::info!("Frame poller stopped");
}
