#![cfg(target_arch = "wasm32")]
mod audio;

use audio::{WebAudio, WebVoice};
use tone_core::{
    encode, play, render, sample_preview, suggested_filename, PlaybackSession, PlaybackState,
    ToneParameters, SAMPLE_RATE,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("tone-web starting");
    Ok(())
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Validated tone settings shared by export, preview and playback.
#[wasm_bindgen]
pub struct Tone {
    params: ToneParameters,
}

#[wasm_bindgen]
impl Tone {
    #[wasm_bindgen(constructor)]
    pub fn new(
        duration: f64,
        on_duration: f64,
        off_duration: f64,
        frequency: f64,
        gain: f64,
        pan: f64,
    ) -> Result<Tone, JsValue> {
        let params =
            ToneParameters::new(duration, on_duration, off_duration, frequency, gain, pan)
                .map_err(js_err)?;
        Ok(Tone { params })
    }

    /// The form's initial values.
    pub fn defaults() -> Tone {
        Tone {
            params: ToneParameters::default(),
        }
    }

    /// Complete 16-bit stereo WAV file at 44.1 kHz.
    #[wasm_bindgen(js_name = renderWav)]
    pub fn render_wav(&self) -> Result<Vec<u8>, JsValue> {
        let buffer = render(&self.params, SAMPLE_RATE);
        let wav = encode(&buffer).map_err(js_err)?;
        log::info!("rendered {} frames ({} bytes)", buffer.frames(), wav.len());
        Ok(wav.into_vec())
    }

    #[wasm_bindgen(js_name = fileName)]
    pub fn file_name(&self) -> String {
        suggested_filename(&self.params)
    }

    /// Preview polyline flattened as `[x0, y0, x1, y1, ...]`.
    pub fn preview(&self, pixel_width: u32) -> Vec<f64> {
        sample_preview(&self.params, pixel_width)
            .flat_map(|p| [f64::from(p.x), p.y])
            .collect()
    }
}

/// Realtime player owning the page's audio context and at most one session.
#[wasm_bindgen]
#[derive(Default)]
pub struct TonePlayer {
    audio: WebAudio,
    session: Option<PlaybackSession<WebVoice>>,
}

#[wasm_bindgen]
impl TonePlayer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> TonePlayer {
        TonePlayer::default()
    }

    /// Start `tone` now. The returned promise resolves when playback ends,
    /// whether it ran to completion or was stopped.
    pub fn play(&mut self, tone: &Tone) -> Result<js_sys::Promise, JsValue> {
        self.stop();
        let output = self.audio.output()?;
        let session = play(output, &tone.params)?;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            session.voice().set_on_ended(resolve);
        });
        self.session = Some(session);
        Ok(promise)
    }

    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.state() == PlaybackState::Playing)
    }
}
