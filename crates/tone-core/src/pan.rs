use std::f64::consts::FRAC_PI_2;

/// Left/right channel gains for one pan position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanGains {
    pub left: f64,
    pub right: f64,
}

/// Equal-power pan law: `left² + right² == 1` across the whole range.
///
/// `pan` is -1 (full left) .. 1 (full right); centre gives √2/2 on both sides.
pub fn pan_gains(pan: f64) -> PanGains {
    let x = (pan + 1.0) / 2.0; // -1..1 -> 0..1
    let angle = x * FRAC_PI_2;
    PanGains {
        left: angle.cos(),
        right: angle.sin(),
    }
}
