//! Acquisition core for the ShockVibe shock/vibration test instrument.
//!
//! The instrument streams fixed-layout binary frames over a
//! point-to-point serial link once it has been configured for a test.
//! This crate owns that pipeline end to end: encoding the one-shot
//! configuration packet, the blocking frame read loop, the bounded
//! hand-off queue bridging producer and consumer, and the periodic
//! poller that turns frames into per-channel readings for a
//! presentation layer to display.
//!
//! [`device::TestManager`] ties the pieces together. It reads the
//! channel and gate configuration once at test start, drives the
//! configure-then-stream protocol, and publishes readings and faults
//! on watch channels that a UI can consume at its own pace.
//!
//! # Example
//!
//! ```rust,no_run
//! use shockvibe_core::config::{AnalogMode, TestSetup};
//! use shockvibe_core::device::{AcquireSettings, TestManager};
//!
//! # async fn run() -> Result<(), shockvibe_core::device::DeviceError> {
//! let mut setup = TestSetup::default();
//! setup.analog[0].mode = AnalogMode::Voltage;
//! setup.gate.increment();
//!
//! let manager = TestManager::new();
//! let settings = AcquireSettings::for_port("/dev/ttyACM0");
//! let run = manager.start_test(&settings, &setup).await?;
//! println!("test run {} started on {}", run.run_id, run.port_name);
//!
//! if let Some(mut readings) = manager.subscribe_readings().await {
//!     readings.changed().await.ok();
//!     let snapshot = readings.borrow().clone();
//!     println!("elapsed: {} ms", snapshot.elapsed_ms);
//! }
//!
//! manager.stop_test().await?;
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod config;
pub mod device;
pub mod serial;

pub use acquisition::{Frame, FramePoller, FrameQueue, FrameReader, TestReadings};
pub use config::{encode_config_packet, GateThreshold, TestSetup};
pub use device::{AcquireSettings, TestManager, TestState};
pub use serial::{LinkSettings, SerialLink};
