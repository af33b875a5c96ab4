use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::acquisition::{DEFAULT_QUEUE_CAPACITY, POLL_INTERVAL};
use crate::serial::LinkSettings;

/// Pipeline lifecycle as seen by the consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TestState {
    Idle,
    Running,
    Faulted(String),
}

/// Metadata for a started test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRunInfo {
    pub run_id: Uuid,
    pub port_name: String,
    pub started_at: DateTime<Utc>,
}

/// Acquisition settings with the defaults the instrument firmware
/// expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireSettings {
    pub link: LinkSettings,
    pub queue_capacity: usize,
    pub poll_interval: Duration,
}

impl AcquireSettings {
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            link: LinkSettings::for_port(port_name),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: POLL_INTERVAL,
        }
    }
}
