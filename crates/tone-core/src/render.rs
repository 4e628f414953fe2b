//! Offline rendering of a gated tone into an in-memory stereo buffer.

use crate::gate::schedule_for;
use crate::pan::pan_gains;
use crate::params::ToneParameters;
use std::f64::consts::TAU;

/// Two equal-length channels of samples in [-1, 1] at `sample_rate`.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Returns `None` when the channels differ in length.
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Option<Self> {
        if left.len() != right.len() {
            return None;
        }
        Some(Self {
            left,
            right,
            sample_rate,
        })
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }
    pub fn right(&self) -> &[f32] {
        &self.right
    }
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Interleaved `(left, right)` pairs in frame order.
    pub fn frame_iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.left.iter().copied().zip(self.right.iter().copied())
    }
}

/// Frame count for `duration` seconds: `floor(sample_rate * duration)`.
#[inline]
pub fn frame_count(sample_rate: u32, duration: f64) -> usize {
    (sample_rate as f64 * duration).floor().max(0.0) as usize
}

/// Render the whole tone deterministically.
///
/// Each frame `i` sits at `t = i / sample_rate`; its value is
/// `gate_gain(t) * sin(2π f t)` split across the channels by the pan law.
/// Gate edges are instantaneous.
pub fn render(params: &ToneParameters, sample_rate: u32) -> SampleBuffer {
    let frames = frame_count(sample_rate, params.duration());
    let schedule = schedule_for(params);
    let pan = pan_gains(params.pan());
    let sr = sample_rate as f64;
    let omega = TAU * params.frequency();

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    let mut cursor = schedule.cursor();
    for i in 0..frames {
        let t = i as f64 / sr;
        let gain = cursor.advance_to(t);
        let sample = gain * (omega * t).sin();
        left.push((sample * pan.left) as f32);
        right.push((sample * pan.right) as f32);
    }
    log::debug!(
        "rendered {frames} frames at {sample_rate} Hz ({} gate breakpoints)",
        schedule.len()
    );

    SampleBuffer {
        left,
        right,
        sample_rate,
    }
}
