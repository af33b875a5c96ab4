use std::io::Read;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serialport::{ClearBuffer, SerialPort};

use super::{Result, SerialError};

pub const BAUD_RATE: u32 = 115200;
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Native timeout set on the port handle. Reads run in slices of this
/// length with the lock released between slices, so a cross-context
/// `close()` takes effect within one slice.
pub const READ_SLICE_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub io_timeout: Duration,
}

impl LinkSettings {
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: BAUD_RATE,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

/// Blocking byte transport for the configure-then-stream sequence:
/// the manager writes the configuration packet and resets the input
/// buffer through it, then the frame read loop drives `read_exact`.
///
/// `SerialLink` is the production implementation; tests substitute
/// scripted in-memory links.
pub trait DataLink: Send + Sync {
    /// Write all bytes and flush them to the device.
    fn write_all(&self, data: &[u8]) -> Result<()>;

    /// Read exactly `buf.len()` bytes or fail.
    fn read_exact(&self, buf: &mut [u8]) -> Result<()>;

    /// Discard any bytes buffered on the input side.
    fn clear_input(&self) -> Result<()>;

    /// Close the link, unblocking any in-flight read. Idempotent.
    fn close(&self);

    fn is_open(&self) -> bool;
}

/// Exclusive owner of the instrument connection.
///
/// The handle lives in a mutexed slot so that `close()` may be called
/// from a context other than the one blocked in `read_exact`; the
/// emptied slot is what unblocks that read.
pub struct SerialLink {
    port: Mutex<Option<Box<dyn SerialPort>>>,
    port_name: String,
    io_timeout: Duration,
}

impl SerialLink {
    /// Open the configured port exclusively.
    pub fn open(settings: &LinkSettings) -> Result<Self> {
        let port = serialport::new(&settings.port_name, settings.baud_rate)
            .timeout(READ_SLICE_TIMEOUT)
            .open()
            .map_err(|e| match e.kind {
                serialport::ErrorKind::NoDevice => {
                    SerialError::PortNotFound(settings.port_name.clone())
                }
                _ => SerialError::ConnectionFailed(e.to_string()),
            })?;

        log::info!(
            "Opened {} at {} baud",
            settings.port_name,
            settings.baud_rate
        );

        Ok(Self {
            port: Mutex::new(Some(port)),
            port_name: settings.port_name.clone(),
            io_timeout: settings.io_timeout,
        })
    }

    /// Write all bytes and flush them to the device.
    pub fn write_all(&self, data: &[u8]) -> Result<()> {
        let mut guard = self.lock_port();
        let port = guard.as_mut().ok_or(SerialError::Closed)?;

        match port.write_all(data).and_then(|_| port.flush()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(SerialError::Timeout),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    /// Read exactly `buf.len()` bytes.
    ///
    /// Bytes are accumulated slice by slice against a deadline of the
    /// configured I/O timeout. Nothing at all by the deadline is a
    /// `Timeout`; a partial fill is a `ShortRead` (desynchronized
    /// stream); a slot emptied by `close()` is `Closed`.
    pub fn read_exact(&self, buf: &mut [u8]) -> Result<()> {
        let deadline = Instant::now() + self.io_timeout;
        let mut filled = 0;

        while filled < buf.len() {
            {
                let mut guard = self.lock_port();
                let port = guard.as_mut().ok_or(SerialError::Closed)?;

                match port.read(&mut buf[filled..]) {
                    Ok(0) => {
                        return Err(SerialError::ConnectionFailed(
                            "serial stream ended".to_string(),
                        ))
                    }
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => return Err(SerialError::IoError(e)),
                }
            }

            if filled < buf.len() && Instant::now() >= deadline {
                return if filled == 0 {
                    Err(SerialError::Timeout)
                } else {
                    Err(SerialError::ShortRead {
                        wanted: buf.len(),
                        got: filled,
                    })
                };
            }
        }

        Ok(())
    }

    /// Discard any bytes sitting in the OS input buffer.
    pub fn clear_input(&self) -> Result<()> {
        let guard = self.lock_port();
        let port = guard.as_ref().ok_or(SerialError::Closed)?;
        port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    /// Release the handle. Idempotent, and safe while a read is in
    /// flight on another context.
    pub fn close(&self) {
        let mut guard = self.lock_port();
        if guard.take().is_some() {
            log::info!("Closed {}", self.port_name);
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock_port().is_some()
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn lock_port(&self) -> MutexGuard<'_, Option<Box<dyn SerialPort>>> {
        self.port.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataLink for SerialLink {
    fn write_all(&self, data: &[u8]) -> Result<()> {
        SerialLink::write_all(self, data)
    }

    fn read_exact(&self, buf: &mut [u8]) -> Result<()> {
        SerialLink::read_exact(self, buf)
    }

    fn clear_input(&self) -> Result<()> {
        SerialLink::clear_input(self)
    }

    fn close(&self) {
        SerialLink::close(self)
    }

    fn is_open(&self) -> bool {
        SerialLink::is_open(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_settings_defaults() {
        let settings = LinkSettings::for_port("/dev/ttyACM0");
        assert_eq!(settings.port_name, "/dev/ttyACM0");
        assert_eq!(settings.baud_rate, BAUD_RATE);
        assert_eq!(settings.io_timeout, DEFAULT_IO_TIMEOUT);
    }

    #[test]
    fn link_settings_roundtrip_serde() {
        let settings = LinkSettings::for_port("COM5");
        let json = serde_json::to_string(&settings).unwrap();
        let back: LinkSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.port_name, settings.port_name);
        assert_eq!(back.io_timeout, settings.io_timeout);
    }
}
