//! Validated tone parameters.
//!
//! Every downstream component (scheduler, renderers, preview) takes a
//! `ToneParameters` and assumes its ranges hold, so construction is the one
//! place where input is checked.

use crate::constants::*;
use thiserror::Error;

/// A rejected parameter together with the offending value.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ParamError {
    #[error("duration must be greater than 0 s (got {0})")]
    Duration(f64),
    #[error("on duration must be greater than 0 s (got {0})")]
    OnDuration(f64),
    #[error("off duration must be 0 s or more (got {0})")]
    OffDuration(f64),
    #[error("frequency must be within {min}..={max} Hz (got {0})", min = FREQUENCY_MIN_HZ, max = FREQUENCY_MAX_HZ)]
    Frequency(f64),
    #[error("gain must be within 0..=1 (got {0})")]
    Gain(f64),
    #[error("pan must be within -1..=1 (got {0})")]
    Pan(f64),
}

/// Immutable description of one gated tone.
///
/// - `duration`: total length in seconds
/// - `on_duration` / `off_duration`: gate open / closed time per cycle;
///   an off duration of 0 means the gate never closes
/// - `frequency`: sine frequency in Hz
/// - `gain`: linear amplitude of the open gate
/// - `pan`: -1 full left, 0 centre, +1 full right
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneParameters {
    duration: f64,
    on_duration: f64,
    off_duration: f64,
    frequency: f64,
    gain: f64,
    pan: f64,
}

impl ToneParameters {
    pub fn new(
        duration: f64,
        on_duration: f64,
        off_duration: f64,
        frequency: f64,
        gain: f64,
        pan: f64,
    ) -> Result<Self, ParamError> {
        // Comparisons are written so that NaN fails every check.
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(ParamError::Duration(duration));
        }
        if !(on_duration > 0.0) || !on_duration.is_finite() {
            return Err(ParamError::OnDuration(on_duration));
        }
        if !(off_duration >= 0.0) || !off_duration.is_finite() {
            return Err(ParamError::OffDuration(off_duration));
        }
        if !(FREQUENCY_MIN_HZ..=FREQUENCY_MAX_HZ).contains(&frequency) {
            return Err(ParamError::Frequency(frequency));
        }
        if !(0.0..=1.0).contains(&gain) {
            return Err(ParamError::Gain(gain));
        }
        if !(-1.0..=1.0).contains(&pan) {
            return Err(ParamError::Pan(pan));
        }
        Ok(Self {
            duration,
            on_duration,
            off_duration,
            frequency,
            gain,
            pan,
        })
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }
    #[inline]
    pub fn on_duration(&self) -> f64 {
        self.on_duration
    }
    #[inline]
    pub fn off_duration(&self) -> f64 {
        self.off_duration
    }
    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }
    #[inline]
    pub fn gain(&self) -> f64 {
        self.gain
    }
    #[inline]
    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// One full on/off cycle in seconds.
    #[inline]
    pub fn period(&self) -> f64 {
        self.on_duration + self.off_duration
    }

    /// Whether the gate ever closes.
    #[inline]
    pub fn is_continuous(&self) -> bool {
        self.off_duration <= 0.0
    }
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_SEC,
            on_duration: DEFAULT_ON_DURATION_SEC,
            off_duration: DEFAULT_OFF_DURATION_SEC,
            frequency: DEFAULT_FREQUENCY_HZ,
            gain: DEFAULT_GAIN,
            pan: DEFAULT_PAN,
        }
    }
}
