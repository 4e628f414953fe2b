//! Cheap waveform preview for plotting.
//!
//! Independent of the gate scheduler: the gate is evaluated directly as
//! `t mod period < on_duration`, which is all a redraw per keystroke needs.

use crate::constants::{PREVIEW_MAX_CYCLES, PREVIEW_MIN_CYCLES, PREVIEW_PERIOD_FALLBACK_SEC};
use crate::params::ToneParameters;
use std::f64::consts::TAU;

/// One plotted point: pixel column and amplitude in [-1, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewPoint {
    pub x: u32,
    pub y: f64,
}

/// Number of on/off cycles the preview window spans.
pub fn preview_cycles(duration: f64, period: f64) -> u32 {
    let period = if period > 0.0 {
        period
    } else {
        PREVIEW_PERIOD_FALLBACK_SEC
    };
    let needed = (duration / period).ceil();
    if needed.is_nan() {
        return PREVIEW_MIN_CYCLES;
    }
    needed.clamp(PREVIEW_MIN_CYCLES as f64, PREVIEW_MAX_CYCLES as f64) as u32
}

/// Restartable sequence of `pixel_width + 1` preview points.
///
/// Cloning yields an independent iterator from the same position, so the
/// sampler can be replayed without recomputing the window.
#[derive(Clone, Debug)]
pub struct PreviewSampler {
    frequency: f64,
    gain: f64,
    on_duration: f64,
    period: f64,
    time_range: f64,
    width: u32,
    next_x: u32,
    remaining: u32,
}

impl PreviewSampler {
    /// Widths above `u32::MAX - 1` are clamped so the point count fits in a `u32`.
    pub fn new(params: &ToneParameters, pixel_width: u32) -> Self {
        let pixel_width = pixel_width.min(u32::MAX - 1);
        let raw_period = params.period();
        let period = if raw_period > 0.0 {
            raw_period
        } else {
            PREVIEW_PERIOD_FALLBACK_SEC
        };
        let cycles = preview_cycles(params.duration(), period);
        let time_range = period * cycles as f64;
        // A zero-width canvas or window has nothing to draw.
        let remaining = if pixel_width == 0 || !(time_range > 0.0) {
            0
        } else {
            pixel_width + 1
        };
        Self {
            frequency: params.frequency(),
            gain: params.gain(),
            on_duration: params.on_duration(),
            period,
            time_range,
            width: pixel_width,
            next_x: 0,
            remaining,
        }
    }

    /// Seconds covered by the full plot width.
    pub fn time_range(&self) -> f64 {
        self.time_range
    }

    fn point_at(&self, x: u32) -> PreviewPoint {
        let t = (x as f64 / self.width as f64) * self.time_range;
        let gate = if t % self.period < self.on_duration {
            self.gain
        } else {
            0.0
        };
        PreviewPoint {
            x,
            y: gate * (TAU * self.frequency * t).sin(),
        }
    }
}

impl Iterator for PreviewSampler {
    type Item = PreviewPoint;

    fn next(&mut self) -> Option<PreviewPoint> {
        if self.remaining == 0 {
            return None;
        }
        let p = self.point_at(self.next_x);
        self.next_x += 1;
        self.remaining -= 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for PreviewSampler {}

/// Preview points for `params` across `pixel_width` columns.
pub fn sample_preview(params: &ToneParameters, pixel_width: u32) -> PreviewSampler {
    PreviewSampler::new(params, pixel_width)
}
