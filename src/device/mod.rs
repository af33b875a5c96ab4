pub mod manager;
pub mod models;

pub use manager::{TestManager, DEVICE_SETTLE_DELAY};
pub use models::*;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("A test is already running")]
    TestAlreadyRunning,

    #[error("No test is running")]
    NoTestRunning,

    #[error("Invalid test configuration: {0}")]
    InvalidConfiguration(#[from] crate::config::ConfigError),

    #[error("Serial communication error: {0}")]
    SerialError(#[from] crate::serial::SerialError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
