// Host-side tests for offline rendering.

use tone_core::*;

fn params(duration: f64, on: f64, off: f64, freq: f64, gain: f64, pan: f64) -> ToneParameters {
    ToneParameters::new(duration, on, off, freq, gain, pan).unwrap()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
}

#[test]
fn frame_count_is_floor_of_rate_times_duration() {
    for &d in &[1.0, 0.5, 0.123_456, 2.000_01, 1e-5] {
        let buf = render(&params(d, 0.1, 0.1, 440.0, 0.5, 0.0), SAMPLE_RATE);
        let expected = (SAMPLE_RATE as f64 * d).floor() as usize;
        assert_eq!(buf.frames(), expected, "duration {d}");
        assert_eq!(buf.left().len(), buf.right().len());
        assert_eq!(buf.sample_rate(), SAMPLE_RATE);
    }
}

#[test]
fn gate_opens_and_closes_on_schedule() {
    // full left so the left channel carries the raw gated sine
    let buf = render(&params(5.0, 1.0, 1.0, 440.0, 0.8, -1.0), SAMPLE_RATE);
    let sr = SAMPLE_RATE as usize;
    let left = buf.left();
    assert!(peak(&left[0..sr]) > 0.79);
    assert!(peak(&left[0..sr]) <= 0.8 + 1e-6);
    assert_eq!(peak(&left[sr..2 * sr]), 0.0);
    assert!(peak(&left[2 * sr..3 * sr]) > 0.79);
    assert_eq!(peak(&left[3 * sr..4 * sr]), 0.0);
    assert!(peak(&left[4 * sr..5 * sr]) > 0.79);
    // nothing leaks into the right channel
    assert!(peak(buf.right()) < 1e-6);
}

#[test]
fn samples_follow_gated_sine_formula() {
    let p = params(0.5, 0.1, 0.05, 1000.0, 0.7, 0.3);
    let buf = render(&p, SAMPLE_RATE);
    let sched = schedule_for(&p);
    let pan = pan_gains(p.pan());
    for i in (0..buf.frames()).step_by(97) {
        let t = i as f64 / SAMPLE_RATE as f64;
        let s = sched.gain_at(t) * (std::f64::consts::TAU * 1000.0 * t).sin();
        assert_eq!(buf.left()[i], (s * pan.left) as f32, "frame {i}");
        assert_eq!(buf.right()[i], (s * pan.right) as f32, "frame {i}");
    }
}

#[test]
fn continuous_tone_never_drops_out() {
    let buf = render(&params(1.0, 0.2, 0.0, 440.0, 0.5, 0.0), SAMPLE_RATE);
    let sr = SAMPLE_RATE as usize;
    for chunk in buf.left()[..sr].chunks(sr / 20) {
        assert!(peak(chunk) > 0.3);
    }
}

#[test]
fn centre_pan_splits_equally() {
    let buf = render(&params(0.1, 1.0, 0.0, 440.0, 1.0, 0.0), SAMPLE_RATE);
    for (l, r) in buf.frame_iter() {
        assert!((l - r).abs() < 1e-6);
    }
    let expected = std::f64::consts::SQRT_2 / 2.0;
    assert!((peak(buf.left()) as f64 - expected).abs() < 1e-3);
}

#[test]
fn rendering_is_idempotent() {
    let p = params(1.3, 0.07, 0.11, 1234.5, 0.9, -0.4);
    let a = render(&p, SAMPLE_RATE);
    let b = render(&p, SAMPLE_RATE);
    assert_eq!(a, b);
}

#[test]
fn buffer_from_channels_rejects_mismatch() {
    assert!(SampleBuffer::from_channels(vec![0.0; 3], vec![0.0; 2], 44_100).is_none());
    let buf = SampleBuffer::from_channels(vec![0.1, 0.2], vec![0.3, 0.4], 8_000).unwrap();
    let frames: Vec<(f32, f32)> = buf.frame_iter().collect();
    assert_eq!(frames, vec![(0.1, 0.3), (0.2, 0.4)]);
}
