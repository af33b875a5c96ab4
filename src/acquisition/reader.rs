use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use super::frame::{Frame, FRAME_BYTES};
use super::queue::FrameQueue;
use super::readings::AcquireStats;
use crate::serial::{DataLink, SerialError};

/// Bound on waiting for the read loop to land after a stop. The loop
/// observes a closed link within one read slice, so this has plenty of
/// slack.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle of the background read loop, published on a watch channel
/// so the consumer can observe how a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderStatus {
    Running,
    Stopped,
    Faulted(String),
}

/// Background frame reader.
///
/// Runs the blocking read loop on the runtime's blocking pool: read one
/// wire frame, decode, push to the queue. Stopping is two-phase behind
/// the single [`FrameReader::stop`] contract: raise the cooperative
/// flag, then close the link so an in-flight blocking read unblocks.
pub struct FrameReader {
    link: Arc<dyn DataLink>,
    stop_flag: Arc<AtomicBool>,
    status_rx: watch::Receiver<ReaderStatus>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl FrameReader {
    /// Spawn the read loop. The link must already be configured, with
    /// the configuration packet written and the input buffer cleared.
    pub fn spawn(
        link: Arc<dyn DataLink>,
        queue: Arc<FrameQueue>,
        stats: Arc<AcquireStats>,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (status_tx, status_rx) = watch::channel(ReaderStatus::Running);

        let loop_link = Arc::clone(&link);
        let loop_stop = Arc::clone(&stop_flag);
        let task_handle = tokio::task::spawn_blocking(move || {
            run_read_loop(loop_link, queue, stats, loop_stop, status_tx);
        });

        Self {
            link,
            stop_flag,
            status_rx,
            task_handle: Some(task_handle),
        }
    }

    /// Subscribe to the loop status. The receiver always holds the most
    /// recent state, including the fault that ended a run.
    pub fn status(&self) -> watch::Receiver<ReaderStatus> {
        self.status_rx.clone()
    }

    /// Most recent loop status.
    pub fn current_status(&self) -> ReaderStatus {
        self.status_rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.current_status() == ReaderStatus::Running
    }

    /// Stop the loop: raise the flag, close the link to unblock any
    /// pending read, then join.
    pub async fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Release);
        self.link.close();

        if let Some(handle) = self.task_handle.take() {
            if timeout(STOP_JOIN_TIMEOUT, handle).await.is_err() {
                log::warn!("Frame reader did not stop within {:?}", STOP_JOIN_TIMEOUT);
            }
        }
    }
}

fn run_read_loop(
    link: Arc<dyn DataLink>,
    queue: Arc<FrameQueue>,
    stats: Arc<AcquireStats>,
    stop_flag: Arc<AtomicBool>,
    status_tx: watch::Sender<ReaderStatus>,
) {
    log::info!("Frame reader started");
    let mut buf = [0u8; FRAME_BYTES];

    let exit_status = loop {
        if stop_flag.load(Ordering::Acquire) {
            break ReaderStatus::Stopped;
        }

        match link.read_exact(&mut buf) {
            Ok(()) => {
                // A stop raised mid-read must not push the frame it
                // interrupted.
                if stop_flag.load(Ordering::Acquire) {
                    break ReaderStatus::Stopped;
                }
                let frame = Frame::decode(&buf);
                stats.record_frame();
                if let Some(evicted) = queue.push(frame) {
                    stats.record_drop();
                    log::trace!(
                        "Evicted frame at {} ms, consumer lagging",
                        evicted.elapsed_ms()
                    );
                }
            }
            Err(SerialError::ShortRead { wanted, got }) => {
                stats.record_sync_error();
                log::warn!(
                    "Discarding desynchronized read ({} of {} bytes)",
                    got,
                    wanted
                );
            }
            Err(e) => {
                if stop_flag.load(Ordering::Acquire) {
                    break ReaderStatus::Stopped;
                }
                log::error!("Frame reader terminating: {}", e);
                break ReaderStatus::Faulted(e.to_string());
            }
        }
    };

    log::info!("Frame reader exited: {:?}", exit_status);
    let _ = status_tx.send(exit_status);
}
