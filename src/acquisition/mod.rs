pub mod frame;
pub mod poller;
pub mod queue;
pub mod reader;
pub mod readings;

pub use frame::{Frame, FRAME_BYTES, FRAME_WORDS};
pub use poller::FramePoller;
pub use queue::{FrameQueue, DEFAULT_QUEUE_CAPACITY};
pub use reader::{FrameReader, ReaderStatus};
pub use readings::{AcquireStats, AnalogReading, StatsSnapshot, TestReadings};

use std::time::Duration;

/// Consumer poll cadence. Must stay shorter than the instrument's
/// frame production interval so the displayed readings never visibly
/// lag behind the stream.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
