// Host-side tests for realtime playback scheduling, driven by a fake output
// that records every call and advances a manual clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tone_core::*;

#[derive(Default)]
struct VoiceLog {
    frequency: f64,
    pan: f64,
    gains: Vec<(f64, f64)>,
    started: Option<(f64, f64)>,
    audible: bool,
    ended_calls: u32,
    refuse_start: bool,
}

struct FakeOutput {
    now: Cell<f64>,
    log: Rc<RefCell<VoiceLog>>,
}

impl FakeOutput {
    fn at(now: f64) -> Self {
        Self {
            now: Cell::new(now),
            log: Rc::new(RefCell::new(VoiceLog::default())),
        }
    }
}

struct FakeVoice {
    log: Rc<RefCell<VoiceLog>>,
    completion: Completion,
}

impl FakeVoice {
    // Shared by natural end and stop, as a real back end would do.
    fn ended(&self) {
        let mut log = self.log.borrow_mut();
        log.audible = false;
        log.ended_calls += 1;
        drop(log);
        self.completion.fire();
    }
}

impl ToneOutput for FakeOutput {
    type Voice = FakeVoice;
    type Error = String;

    fn current_time(&self) -> f64 {
        self.now.get()
    }

    fn create_voice(
        &self,
        frequency: f64,
        pan: f64,
        completion: Completion,
    ) -> Result<FakeVoice, String> {
        if frequency <= 0.0 {
            return Err("bad frequency".into());
        }
        {
            let mut log = self.log.borrow_mut();
            log.frequency = frequency;
            log.pan = pan;
        }
        Ok(FakeVoice {
            log: Rc::clone(&self.log),
            completion,
        })
    }
}

impl ToneVoice for FakeVoice {
    type Error = String;

    fn set_gain_at_time(&self, gain: f64, when: f64) {
        self.log.borrow_mut().gains.push((when, gain));
    }

    fn start(&self, when: f64, stop_at: f64) -> Result<(), String> {
        let mut log = self.log.borrow_mut();
        if log.refuse_start {
            return Err("start refused".into());
        }
        log.started = Some((when, stop_at));
        log.audible = true;
        Ok(())
    }

    fn stop(&self) {
        self.ended();
    }
}

fn pulsed() -> ToneParameters {
    ToneParameters::new(5.0, 1.0, 1.0, 440.0, 0.8, -0.5).unwrap()
}

#[test]
fn timeline_is_offset_by_start_and_clipped_to_duration() {
    let events = gain_timeline(&pulsed(), 10.0);
    let pairs: Vec<(f64, f64)> = events.iter().map(|e| (e.at, e.gain)).collect();
    assert_eq!(
        pairs,
        vec![
            (10.0, 0.0),
            (10.0, 0.8),
            (11.0, 0.0),
            (12.0, 0.8),
            (13.0, 0.0),
            (14.0, 0.8),
        ]
    );
}

#[test]
fn continuous_timeline_opens_once() {
    let p = ToneParameters::new(3.0, 1.0, 0.0, 440.0, 0.4, 0.0).unwrap();
    let events = gain_timeline(&p, 2.5);
    assert_eq!(
        events,
        vec![
            GainEvent { at: 2.5, gain: 0.0 },
            GainEvent { at: 2.5, gain: 0.4 },
        ]
    );
}

#[test]
fn play_schedules_voice_from_current_clock() {
    let output = FakeOutput::at(3.25);
    let session = play(&output, &pulsed()).unwrap();

    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.start_time(), 3.25);
    assert_eq!(session.end_time(), 8.25);

    let log = output.log.borrow();
    assert_eq!(log.frequency, 440.0);
    assert_eq!(log.pan, -0.5);
    assert_eq!(log.started, Some((3.25, 8.25)));
    let expected: Vec<(f64, f64)> = gain_timeline(&pulsed(), 3.25)
        .iter()
        .map(|e| (e.at, e.gain))
        .collect();
    assert_eq!(log.gains, expected);
}

#[test]
fn stop_fires_completion_exactly_once() {
    let output = FakeOutput::at(0.0);
    let session = play(&output, &pulsed()).unwrap();
    let completion = session.completion();
    assert!(!completion.is_fired());

    output.now.set(1.7);
    session.stop();
    assert!(completion.is_fired());
    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(!output.log.borrow().audible);

    // a second stop is a no-op and the latch does not re-fire
    session.stop();
    assert_eq!(output.log.borrow().ended_calls, 1);
    assert!(!completion.fire());
}

#[test]
fn natural_end_then_stop_does_not_refire() {
    let output = FakeOutput::at(0.0);
    let session = play(&output, &pulsed()).unwrap();
    session.voice().ended();
    assert_eq!(session.state(), PlaybackState::Idle);
    session.stop();
    assert_eq!(output.log.borrow().ended_calls, 1);
}

#[test]
fn output_errors_propagate() {
    struct Broken;
    impl ToneOutput for Broken {
        type Voice = FakeVoice;
        type Error = String;
        fn current_time(&self) -> f64 {
            0.0
        }
        fn create_voice(&self, _: f64, _: f64, _: Completion) -> Result<FakeVoice, String> {
            Err("no device".into())
        }
    }
    assert_eq!(play(&Broken, &pulsed()).err(), Some("no device".to_string()));
}

#[test]
fn failed_start_still_runs_the_ended_path_once() {
    let output = FakeOutput::at(2.0);
    output.log.borrow_mut().refuse_start = true;
    assert_eq!(play(&output, &pulsed()).err(), Some("start refused".to_string()));

    let log = output.log.borrow();
    assert_eq!(log.ended_calls, 1);
    assert!(log.started.is_none());
    assert!(!log.audible);
}

#[test]
fn completion_wakes_waiters_on_other_threads() {
    let completion = Completion::new();
    let waiter = {
        let c = completion.clone();
        thread::spawn(move || c.wait_timeout(Duration::from_secs(5)))
    };
    thread::sleep(Duration::from_millis(20));
    assert!(completion.fire());
    assert!(waiter.join().unwrap());
    completion.wait();
}

#[test]
fn completion_wait_times_out_when_not_fired() {
    let completion = Completion::new();
    assert!(!completion.wait_timeout(Duration::from_millis(10)));
}
