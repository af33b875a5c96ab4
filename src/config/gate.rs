use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Minimum duration an event must persist before the instrument counts
/// it. Stored in microseconds; the consumer UI works in 0.25 ms steps
/// and displays milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateThreshold {
    micros: u32,
}

impl GateThreshold {
    /// One UI step, 0.25 ms.
    pub const STEP_MICROS: u32 = 250;

    pub const DEFAULT_MICROS: u32 = 1000;

    pub fn from_micros(micros: u32) -> Self {
        Self { micros }
    }

    pub fn micros(self) -> u32 {
        self.micros
    }

    pub fn millis(self) -> f64 {
        f64::from(self.micros) / 1000.0
    }

    /// Step up by 0.25 ms, unbounded above.
    pub fn increment(&mut self) {
        self.micros = self.micros.saturating_add(Self::STEP_MICROS);
    }

    /// Step down by 0.25 ms. Values below one step stay put; the
    /// threshold never goes negative.
    pub fn decrement(&mut self) {
        if self.micros >= Self::STEP_MICROS {
            self.micros -= Self::STEP_MICROS;
        }
    }

    /// Apply a manually entered millisecond value.
    ///
    /// On any invalid entry (unparseable, negative, non-finite, or too
    /// large for the 32-bit microsecond field) the stored value is left
    /// unchanged. The returned error is advisory; callers that ignore
    /// it get the silent no-op the entry popup expects.
    pub fn set_from_text(&mut self, text: &str) -> Result<()> {
        let millis: f64 = text
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidThresholdEntry(text.to_string()))?;

        if !millis.is_finite() || millis < 0.0 {
            return Err(ConfigError::InvalidThresholdEntry(text.to_string()));
        }

        let micros = millis * 1000.0;
        if micros > f64::from(u32::MAX) {
            return Err(ConfigError::InvalidThresholdEntry(text.to_string()));
        }

        self.micros = micros as u32;
        Ok(())
    }
}

impl Default for GateThreshold {
    fn default() -> Self {
        Self {
            micros: Self::DEFAULT_MICROS,
        }
    }
}

impl fmt::Display for GateThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ms", self.millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_steps_up_a_quarter_millisecond() {
        let mut gate = GateThreshold::default();
        assert_eq!(gate.micros(), 1000);
        gate.increment();
        assert_eq!(gate.micros(), 1250);
        assert!((gate.millis() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn decrement_floors_at_zero() {
        let mut gate = GateThreshold::from_micros(GateThreshold::STEP_MICROS);
        gate.decrement();
        assert_eq!(gate.micros(), 0);
        gate.decrement();
        assert_eq!(gate.micros(), 0);
        assert!((gate.millis() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn manual_entry_applies_valid_millis() {
        let mut gate = GateThreshold::default();
        gate.set_from_text("2.5").unwrap();
        assert_eq!(gate.micros(), 2500);
        gate.set_from_text(" 0.25 ").unwrap();
        assert_eq!(gate.micros(), 250);
    }

    #[test]
    fn manual_entry_keeps_value_on_garbage() {
        let mut gate = GateThreshold::from_micros(1250);
        let err = gate.set_from_text("fast").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholdEntry(_)));
        assert_eq!(gate.micros(), 1250);
    }

    #[test]
    fn manual_entry_rejects_values_beyond_the_microsecond_field() {
        let mut gate = GateThreshold::from_micros(1000);
        assert!(gate.set_from_text("5e7").is_err());
        assert_eq!(gate.micros(), 1000);

        // Large but still representable in 32-bit microseconds
        gate.set_from_text("4000000").unwrap();
        assert_eq!(gate.micros(), 4_000_000_000);
    }

    #[test]
    fn manual_entry_rejects_negative_values() {
        let mut gate = GateThreshold::from_micros(1000);
        assert!(gate.set_from_text("-0.5").is_err());
        assert!(gate.set_from_text("NaN").is_err());
        assert_eq!(gate.micros(), 1000);
    }

    #[test]
    fn displays_two_decimal_millis() {
        assert_eq!(GateThreshold::from_micros(1250).to_string(), "1.25 ms");
        assert_eq!(GateThreshold::from_micros(0).to_string(), "0.00 ms");
    }
}
