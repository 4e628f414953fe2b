// ---------------- Native audio (cpal) ----------------
//
// One output stream is opened on first use and kept for the life of the
// process. Its callback pulls frames from a shared mixer whose frame counter
// is the playback clock, so gate events land on exact sample boundaries.

use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::f64::consts::TAU;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tone_core::{pan_gains, Completion, GainEvent, ToneOutput, ToneVoice, SAMPLE_RATE};

struct ActiveTone {
    id: u64,
    frequency: f64,
    left_gain: f64,
    right_gain: f64,
    events: Vec<GainEvent>,
    cursor: usize,
    gain: f64,
    start_at: Option<f64>,
    stop_at: f64,
    completion: Completion,
}

struct Mixer {
    sample_rate: f64,
    frames_rendered: u64,
    next_id: u64,
    tone: Option<ActiveTone>,
}

impl Mixer {
    fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            frames_rendered: 0,
            next_id: 0,
            tone: None,
        }
    }

    fn now(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate
    }

    // Silent until the voice is started; replaces any tone still playing.
    fn add_tone(&mut self, frequency: f64, pan: f64, completion: Completion) -> u64 {
        if self.tone.is_some() {
            log::warn!("replacing a tone that is still playing");
            self.finish();
        }
        let id = self.next_id;
        self.next_id += 1;
        let gains = pan_gains(pan);
        self.tone = Some(ActiveTone {
            id,
            frequency,
            left_gain: gains.left,
            right_gain: gains.right,
            events: Vec::new(),
            cursor: 0,
            gain: 0.0,
            start_at: None,
            stop_at: f64::INFINITY,
            completion,
        });
        id
    }

    // Drop the chain first, then notify.
    fn finish(&mut self) {
        if let Some(tone) = self.tone.take() {
            log::debug!("tone {} ended at {:.3}s", tone.id, self.now());
            tone.completion.fire();
        }
    }

    fn next_frame(&mut self) -> (f32, f32) {
        let now = self.now();
        self.frames_rendered += 1;

        let ended = match self.tone.as_ref() {
            Some(tone) => tone.start_at.is_some() && now >= tone.stop_at,
            None => return (0.0, 0.0),
        };
        if ended {
            self.finish();
            return (0.0, 0.0);
        }

        let Some(tone) = self.tone.as_mut() else {
            return (0.0, 0.0);
        };
        let start = match tone.start_at {
            Some(start) if now >= start => start,
            _ => return (0.0, 0.0),
        };
        while let Some(ev) = tone.events.get(tone.cursor) {
            if ev.at > now {
                break;
            }
            tone.gain = ev.gain;
            tone.cursor += 1;
        }
        let s = tone.gain * (TAU * tone.frequency * (now - start)).sin();
        ((s * tone.left_gain) as f32, (s * tone.right_gain) as f32)
    }
}

fn lock(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the tone currently owned by the mixer.
pub struct NativeVoice {
    mixer: Arc<Mutex<Mixer>>,
    id: u64,
}

impl NativeVoice {
    fn with_tone(&self, f: impl FnOnce(&mut ActiveTone)) {
        let mut mixer = lock(&self.mixer);
        if let Some(tone) = mixer.tone.as_mut().filter(|t| t.id == self.id) {
            f(tone);
        }
    }
}

impl ToneVoice for NativeVoice {
    type Error = anyhow::Error;

    fn set_gain_at_time(&self, gain: f64, when: f64) {
        self.with_tone(|tone| {
            // after any event at the same instant, like AudioParam
            let at = tone.events.partition_point(|ev| ev.at <= when);
            tone.events.insert(at, GainEvent { at: when, gain });
        });
    }

    fn start(&self, when: f64, stop_at: f64) -> anyhow::Result<()> {
        self.with_tone(|tone| {
            tone.start_at = Some(when);
            tone.stop_at = stop_at;
        });
        Ok(())
    }

    fn stop(&self) {
        let mut mixer = lock(&self.mixer);
        if mixer.tone.as_ref().map(|t| t.id) == Some(self.id) {
            mixer.finish();
        }
    }
}

/// An open output stream plus the mixer feeding it.
pub struct OutputDevice {
    _stream: cpal::Stream,
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
    channels: usize,
}

impl OutputDevice {
    fn open() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no output device available"))?;
        let supported = device
            .default_output_config()
            .context("querying default output config")?;
        let sample_format = supported.sample_format();
        let mut config: cpal::StreamConfig = supported.into();

        // Prefer the engine rate when the device offers it.
        if config.sample_rate.0 != SAMPLE_RATE {
            let matching = device.supported_output_configs().ok().and_then(|mut ranges| {
                ranges.find(|r| {
                    r.channels() == config.channels
                        && r.sample_format() == sample_format
                        && r.min_sample_rate().0 <= SAMPLE_RATE
                        && SAMPLE_RATE <= r.max_sample_rate().0
                })
            });
            match matching {
                Some(range) => {
                    config = range.with_sample_rate(cpal::SampleRate(SAMPLE_RATE)).config();
                }
                None => log::warn!(
                    "{SAMPLE_RATE} Hz not supported, using {} Hz",
                    config.sample_rate.0
                ),
            }
        }

        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;
        let mixer = Arc::new(Mutex::new(Mixer::new(sample_rate)));
        let err_fn = |err: cpal::StreamError| log::error!("audio stream error: {err}");

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, channels, Arc::clone(&mixer), err_fn)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, channels, Arc::clone(&mixer), err_fn)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, channels, Arc::clone(&mixer), err_fn)
            }
            other => return Err(anyhow!("unsupported sample format {other:?}")),
        }
        .context("building output stream")?;
        stream.play().context("starting output stream")?;

        log::info!(
            "opened output device {:?}: {sample_rate} Hz, {channels} ch, {sample_format:?}",
            device.name().unwrap_or_default()
        );
        Ok(Self {
            _stream: stream,
            mixer,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl ToneOutput for OutputDevice {
    type Voice = NativeVoice;
    type Error = anyhow::Error;

    fn current_time(&self) -> f64 {
        lock(&self.mixer).now()
    }

    fn create_voice(
        &self,
        frequency: f64,
        pan: f64,
        completion: Completion,
    ) -> anyhow::Result<NativeVoice> {
        let id = lock(&self.mixer).add_tone(frequency, pan, completion);
        Ok(NativeVoice {
            mixer: Arc::clone(&self.mixer),
            id,
        })
    }
}

/// Lazily opened, reused output device.
#[derive(Default)]
pub struct NativeAudio {
    device: Option<OutputDevice>,
}

impl NativeAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&mut self) -> anyhow::Result<&OutputDevice> {
        if self.device.is_none() {
            self.device = Some(OutputDevice::open()?);
        }
        self.device
            .as_ref()
            .ok_or_else(|| anyhow!("output device unavailable"))
    }

    /// Close the stream; the next `output()` opens a fresh one.
    pub fn reset(&mut self) {
        self.device = None;
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    mixer: Arc<Mutex<Mixer>>,
    err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut mixer = lock(&mixer);
            for frame in data.chunks_mut(channels.max(1)) {
                let (l, r) = mixer.next_frame();
                write_frame(frame, l, r);
            }
        },
        err_fn,
        None,
    )
}

fn write_frame<T>(frame: &mut [T], left: f32, right: f32)
where
    T: Sample + FromSample<f32>,
{
    match frame {
        [] => {}
        [mono] => *mono = T::from_sample(0.5 * (left + right)),
        [l, r, rest @ ..] => {
            *l = T::from_sample(left);
            *r = T::from_sample(right);
            for s in rest {
                *s = T::EQUILIBRIUM;
            }
        }
    }
}
