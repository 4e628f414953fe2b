//! Gate scheduling: the on/off breakpoint list behind every render path.

/// A point where the gate switches to `gain`, `time` seconds after the start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateBreakpoint {
    pub time: f64,
    pub gain: f64,
}

/// Ordered breakpoints starting at t=0 and covering at least the whole
/// duration. Gains alternate between the open gain and 0; the last cycle may
/// run past the duration, so consumers clip to `[0, duration)`.
#[derive(Clone, Debug, PartialEq)]
pub struct GateSchedule {
    breakpoints: Vec<GateBreakpoint>,
}

impl GateSchedule {
    pub fn breakpoints(&self) -> &[GateBreakpoint] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Gate gain at `t` seconds: the gain of the last breakpoint at or before
    /// `t`, or 0 before the first one.
    pub fn gain_at(&self, t: f64) -> f64 {
        // Breakpoint times never decrease, so the partition point is the
        // number of breakpoints already reached.
        let reached = self.breakpoints.partition_point(|bp| bp.time <= t);
        match reached {
            0 => 0.0,
            n => self.breakpoints[n - 1].gain,
        }
    }

    /// Sequential lookup for monotonically increasing times.
    pub fn cursor(&self) -> GateCursor<'_> {
        GateCursor {
            breakpoints: &self.breakpoints,
            next: 0,
            gain: 0.0,
        }
    }
}

/// Walks a schedule forward in time with amortized O(1) cost per lookup.
#[derive(Clone, Debug)]
pub struct GateCursor<'a> {
    breakpoints: &'a [GateBreakpoint],
    next: usize,
    gain: f64,
}

impl GateCursor<'_> {
    /// Gain at `t`. Successive calls must not go back in time.
    #[inline]
    pub fn advance_to(&mut self, t: f64) -> f64 {
        while let Some(bp) = self.breakpoints.get(self.next) {
            if bp.time > t {
                break;
            }
            self.gain = bp.gain;
            self.next += 1;
        }
        self.gain
    }
}

// Upper bound on the capacity hint; longer schedules grow as they go.
const MAX_PREALLOC: usize = 1 << 16;

/// Build the gate schedule for a tone.
///
/// With `off_duration <= 0` the gate is open for the whole tone and the
/// schedule is the single breakpoint `(0, gain)`. Otherwise on/off pairs are
/// emitted by plain accumulation of the two durations until the running time
/// reaches `duration`.
pub fn schedule(duration: f64, on_duration: f64, off_duration: f64, gain: f64) -> GateSchedule {
    // A non-positive on duration would never advance `t` either.
    if off_duration <= 0.0 || !(on_duration > 0.0) {
        return GateSchedule {
            breakpoints: vec![GateBreakpoint { time: 0.0, gain }],
        };
    }

    let cycles = (duration / (on_duration + off_duration)).ceil().max(1.0);
    let mut breakpoints = Vec::with_capacity((cycles as usize).saturating_mul(2).min(MAX_PREALLOC));
    let mut t = 0.0_f64;
    while t < duration {
        breakpoints.push(GateBreakpoint { time: t, gain });
        t += on_duration;
        breakpoints.push(GateBreakpoint { time: t, gain: 0.0 });
        t += off_duration;
    }
    log::debug!(
        "gate schedule: {} breakpoints for {duration}s ({on_duration}s on / {off_duration}s off)",
        breakpoints.len()
    );
    GateSchedule { breakpoints }
}

/// Schedule for a validated parameter set.
pub fn schedule_for(params: &crate::ToneParameters) -> GateSchedule {
    schedule(
        params.duration(),
        params.on_duration(),
        params.off_duration(),
        params.gain(),
    )
}
