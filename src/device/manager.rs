use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use super::{AcquireSettings, DeviceError, Result, TestRunInfo, TestState};
use crate::acquisition::{
    AcquireStats, FramePoller, FrameQueue, FrameReader, ReaderStatus, StatsSnapshot, TestReadings,
};
use crate::config::{encode_config_packet, TestSetup, CONFIG_PACKET_LEN};
use crate::serial::{DataLink, SerialLink};

/// Delay between opening the port and writing the configuration
/// packet; the instrument needs it to finish its own serial setup
/// before it will accept the bytes.
pub const DEVICE_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Test lifecycle controller: the single owner of the link, queue,
/// reader and poller for the active run.
///
/// Channel and gate settings are read exactly once, at
/// [`TestManager::start_test`]; edits made while a test runs affect
/// only the next run.
pub struct TestManager {
    active: Mutex<Option<ActiveTest>>,
}

struct ActiveTest {
    info: TestRunInfo,
    setup: TestSetup,
    link: Arc<dyn DataLink>,
    reader: FrameReader,
    poller: FramePoller,
    stats: Arc<AcquireStats>,
    readings_rx: watch::Receiver<TestReadings>,
}

impl TestManager {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    /// Start a test run.
    ///
    /// The configuration packet is validated and encoded before the
    /// port is touched; any connection or timeout failure here aborts
    /// the start and leaves the manager idle.
    pub async fn start_test(
        &self,
        settings: &AcquireSettings,
        setup: &TestSetup,
    ) -> Result<TestRunInfo> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(DeviceError::TestAlreadyRunning);
        }

        let packet = encode_config_packet(setup)?;
        let link = Arc::new(SerialLink::open(&settings.link)?) as Arc<dyn DataLink>;

        Self::begin_run(&mut *active, link, settings, setup, packet).await
    }

    /// Start a test run over an already-opened link.
    ///
    /// [`TestManager::start_test`] opens the serial port and delegates
    /// here; the seam also lets tests drive the full
    /// configure-then-stream sequence over a scripted link.
    pub async fn start_test_on_link(
        &self,
        link: Arc<dyn DataLink>,
        settings: &AcquireSettings,
        setup: &TestSetup,
    ) -> Result<TestRunInfo> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(DeviceError::TestAlreadyRunning);
        }

        let packet = encode_config_packet(setup)?;

        Self::begin_run(&mut *active, link, settings, setup, packet).await
    }

    /// Settle, configure, reset the input buffer, then spawn the
    /// reader and poller. The caller has already checked that no test
    /// is active and holds the slot locked.
    async fn begin_run(
        active: &mut Option<ActiveTest>,
        link: Arc<dyn DataLink>,
        settings: &AcquireSettings,
        setup: &TestSetup,
        packet: [u8; CONFIG_PACKET_LEN],
    ) -> Result<TestRunInfo> {
        tokio::time::sleep(DEVICE_SETTLE_DELAY).await;

        if let Err(e) = link.write_all(&packet).and_then(|_| link.clear_input()) {
            link.close();
            return Err(e.into());
        }
        log::debug!("Configuration packet sent: {}", hex::encode(packet));

        let queue = Arc::new(FrameQueue::new(settings.queue_capacity));
        let stats = Arc::new(AcquireStats::default());
        let (readings_tx, readings_rx) = watch::channel(TestReadings::default());

        let reader = FrameReader::spawn(
            Arc::clone(&link),
            Arc::clone(&queue),
            Arc::clone(&stats),
        );
        let poller = FramePoller::spawn(
            queue,
            Arc::clone(&stats),
            readings_tx,
            settings.poll_interval,
        );

        let info = TestRunInfo {
            run_id: Uuid::new_v4(),
            port_name: settings.link.port_name.clone(),
            started_at: Utc::now(),
        };
        log::info!("Test run {} started on {}", info.run_id, info.port_name);

        *active = Some(ActiveTest {
            info: info.clone(),
            setup: setup.clone(),
            link,
            reader,
            poller,
            stats,
            readings_rx,
        });

        Ok(info)
    }

    /// Stop the active run: reader first (stop flag, link close, join),
    /// then the poller. Existing readings subscribers keep the last
    /// published snapshot.
    pub async fn stop_test(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        let test = active.take().ok_or(DeviceError::NoTestRunning)?;

        test.reader.stop().await;
        test.poller.stop().await;
        test.link.close();

        log::info!("Test run {} stopped", test.info.run_id);
        Ok(())
    }

    /// Current pipeline state. A faulted run stays observable here
    /// until [`TestManager::stop_test`] resets the manager to idle, so
    /// the caller can see why the stream ended and restart.
    pub async fn state(&self) -> TestState {
        let active = self.active.lock().await;
        match active.as_ref() {
            None => TestState::Idle,
            Some(test) => match test.reader.current_status() {
                ReaderStatus::Running => TestState::Running,
                ReaderStatus::Stopped => TestState::Idle,
                ReaderStatus::Faulted(msg) => TestState::Faulted(msg),
            },
        }
    }

    pub async fn is_running(&self) -> bool {
        matches!(self.state().await, TestState::Running)
    }

    /// Subscribe to the per-tick readings snapshots of the active run.
    pub async fn subscribe_readings(&self) -> Option<watch::Receiver<TestReadings>> {
        let active = self.active.lock().await;
        active.as_ref().map(|t| t.readings_rx.clone())
    }

    /// Latest readings of the active run without subscribing.
    pub async fn current_readings(&self) -> Option<TestReadings> {
        let active = self.active.lock().await;
        active.as_ref().map(|t| t.readings_rx.borrow().clone())
    }

    /// Subscribe to reader status, the channel faults are published on.
    pub async fn subscribe_status(&self) -> Option<watch::Receiver<ReaderStatus>> {
        let active = self.active.lock().await;
        active.as_ref().map(|t| t.reader.status())
    }

    pub async fn run_info(&self) -> Option<TestRunInfo> {
        let active = self.active.lock().await;
        active.as_ref().map(|t| t.info.clone())
    }

    /// Setup snapshot frozen when the active run started.
    pub async fn active_setup(&self) -> Option<TestSetup> {
        let active = self.active.lock().await;
        active.as_ref().map(|t| t.setup.clone())
    }

    pub async fn stats(&self) -> Option<StatsSnapshot> {
        let active = self.active.lock().await;
        active.as_ref().map(|t| t.stats.snapshot())
    }
}

impl Default for TestManager {
    fn default() -> Self {
        Self::new()
    }
}
