use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frame::Frame;
use crate::config::{ANALOG_CHANNEL_COUNT, DISCRETE_CHANNEL_COUNT};

/// Events and current level for one analog channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogReading {
    pub events: u32,
    /// Raw ADC counts in [0, 1023]; engineering-unit conversion is the
    /// consumer's call via `AnalogMode::raw_to_units`.
    pub level: u32,
}

/// Semantic snapshot of the most recent frame, the per-tick hand-off
/// to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReadings {
    pub elapsed_ms: u32,
    pub discrete_events: [u32; DISCRETE_CHANNEL_COUNT],
    pub analog: [AnalogReading; ANALOG_CHANNEL_COUNT],
    /// Wall-clock receipt time of the mapped frame; `None` until the
    /// first frame of a run arrives.
    pub updated_at: Option<DateTime<Utc>>,
}

impl TestReadings {
    /// Map a decoded frame to channel readings per the frame word
    /// layout.
    pub fn from_frame(frame: &Frame) -> Self {
        let words = frame.words();

        Self {
            elapsed_ms: words[0],
            discrete_events: std::array::from_fn(|i| words[i + 1]),
            analog: std::array::from_fn(|i| AnalogReading {
                events: words[i * 2 + 9],
                level: words[i * 2 + 10],
            }),
            updated_at: Some(Utc::now()),
        }
    }
}

impl Default for TestReadings {
    fn default() -> Self {
        Self {
            elapsed_ms: 0,
            discrete_events: [0; DISCRETE_CHANNEL_COUNT],
            analog: [AnalogReading::default(); ANALOG_CHANNEL_COUNT],
            updated_at: None,
        }
    }
}

/// Counters shared across the reader, queue and poller. Relaxed
/// ordering is enough, the values are diagnostic.
#[derive(Debug, Default)]
pub struct AcquireStats {
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    sync_errors: AtomicU64,
    frames_polled: AtomicU64,
}

impl AcquireStats {
    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_error(&self) {
        self.sync_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll(&self) {
        self.frames_polled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            sync_errors: self.sync_errors.load(Ordering::Relaxed),
            frames_polled: self.frames_polled.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the acquisition counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub sync_errors: u64,
    pub frames_polled: u64,
}
