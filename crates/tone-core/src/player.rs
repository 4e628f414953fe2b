//! Realtime playback contract.
//!
//! The core does not own an audio device. A back end implements
//! [`ToneOutput`] (a clock plus a way to build one oscillator -> gain -> pan
//! chain) and [`ToneVoice`] (absolute-time gain events, start/stop). [`play`]
//! lays the gate schedule onto that voice and hands back a
//! [`PlaybackSession`] the caller keeps for cancellation.

use crate::gate::schedule_for;
use crate::params::ToneParameters;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Single-shot completion latch shared between a session and its back end.
///
/// Back ends call [`Completion::fire`] from the one path that runs both on
/// natural end and after [`ToneVoice::stop`]; only the first call counts.
#[derive(Clone, Default)]
pub struct Completion {
    inner: Arc<CompletionInner>,
}

#[derive(Default)]
struct CompletionInner {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark playback as finished. Returns `true` only for the first call.
    pub fn fire(&self) -> bool {
        let mut fired = self
            .inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *fired {
            return false;
        }
        *fired = true;
        self.inner.cond.notify_all();
        true
    }

    pub fn is_fired(&self) -> bool {
        *self
            .inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until fired. Not for use on a browser main thread.
    pub fn wait(&self) {
        let mut fired = self
            .inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*fired {
            fired = self
                .inner
                .cond
                .wait(fired)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block for at most `timeout`; returns whether the latch has fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let fired = self
            .inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (fired, _) = self
            .inner
            .cond
            .wait_timeout_while(fired, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// An audio facility with a monotonically increasing clock.
pub trait ToneOutput {
    type Voice: ToneVoice<Error = Self::Error>;
    type Error;

    /// Current clock time in seconds.
    fn current_time(&self) -> f64;

    /// Build a sine oscillator at `frequency` routed through a gain stage
    /// (initially 0) and an equal-power panner at `pan`. The voice must fire
    /// `completion` once its output has ended and the chain is released.
    fn create_voice(
        &self,
        frequency: f64,
        pan: f64,
        completion: Completion,
    ) -> Result<Self::Voice, Self::Error>;
}

/// One scheduled oscillator chain.
pub trait ToneVoice {
    type Error;

    /// Jump the gain stage to `gain` at absolute clock time `when`.
    fn set_gain_at_time(&self, gain: f64, when: f64);

    /// Start output at `when` and end it automatically at `stop_at`.
    fn start(&self, when: f64, stop_at: f64) -> Result<(), Self::Error>;

    /// Silence now and run the same ended path as a natural stop.
    fn stop(&self);
}

/// A gain change on the output clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainEvent {
    pub at: f64,
    pub gain: f64,
}

/// Absolute-time gate events for a tone starting at `start`.
///
/// Begins with gain 0 at `start`, followed by every breakpoint that lands
/// before `start + duration`.
pub fn gain_timeline(params: &ToneParameters, start: f64) -> Vec<GainEvent> {
    let end = start + params.duration();
    let schedule = schedule_for(params);
    let mut events = Vec::with_capacity(schedule.len() + 1);
    events.push(GainEvent {
        at: start,
        gain: 0.0,
    });
    events.extend(
        schedule
            .breakpoints()
            .iter()
            .map(|bp| GainEvent {
                at: start + bp.time,
                gain: bp.gain,
            })
            .take_while(|ev| ev.at < end),
    );
    events
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Handle to one running tone. Dropping it does not stop playback.
pub struct PlaybackSession<V: ToneVoice> {
    voice: V,
    completion: Completion,
    start_time: f64,
    end_time: f64,
}

impl<V: ToneVoice> PlaybackSession<V> {
    /// Request cancellation. Completion fires through the voice's ended path.
    pub fn stop(&self) {
        if self.completion.is_fired() {
            return;
        }
        log::info!("stopping playback");
        self.voice.stop();
    }

    pub fn state(&self) -> PlaybackState {
        if self.completion.is_fired() {
            PlaybackState::Idle
        } else {
            PlaybackState::Playing
        }
    }

    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }
}

/// Schedule `params` on `output`, starting now.
///
/// If the voice refuses to start, its ended path runs before the error is
/// returned, so the completion still fires exactly once.
///
/// Callers are expected to hold at most one session at a time; nothing here
/// prevents overlapping sessions on the same output.
pub fn play<O: ToneOutput>(
    output: &O,
    params: &ToneParameters,
) -> Result<PlaybackSession<O::Voice>, O::Error> {
    let completion = Completion::new();
    let voice = output.create_voice(params.frequency(), params.pan(), completion.clone())?;

    let start = output.current_time();
    let end = start + params.duration();
    let events = gain_timeline(params, start);
    for ev in &events {
        voice.set_gain_at_time(ev.gain, ev.at);
    }
    if let Err(e) = voice.start(start, end) {
        // nothing will end on its own, so release the chain here
        log::warn!("voice failed to start");
        voice.stop();
        return Err(e);
    }
    log::info!(
        "playing {} Hz for {}s ({} gain events)",
        params.frequency(),
        params.duration(),
        events.len()
    );

    Ok(PlaybackSession {
        voice,
        completion,
        start_time: start,
        end_time: end,
    })
}
