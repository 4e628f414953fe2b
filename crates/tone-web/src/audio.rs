use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tone_core::{Completion, ToneOutput, ToneVoice};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

fn create_gain(audio_ctx: &web::AudioContext, value: f32, label: &str) -> Result<web::GainNode, JsValue> {
    match web::GainNode::new(audio_ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Ok(g)
        }
        Err(e) => {
            log::error!("{} GainNode error: {:?}", label, e);
            Err(e)
        }
    }
}

// oscillator -> gate gain -> panner -> destination
struct VoiceNodes {
    osc: web::OscillatorNode,
    gate: web::GainNode,
    panner: web::StereoPannerNode,
    completion: Completion,
    released: Cell<bool>,
    on_ended: RefCell<Option<js_sys::Function>>,
}

impl VoiceNodes {
    // Runs from `onended` and from `stop`, whichever comes first.
    fn ended(&self) {
        if self.released.replace(true) {
            return;
        }
        let _ = self.osc.disconnect();
        let _ = self.gate.disconnect();
        let _ = self.panner.disconnect();
        self.completion.fire();
        if let Some(cb) = self.on_ended.borrow_mut().take() {
            if let Err(e) = cb.call0(&JsValue::NULL) {
                log::warn!("ended callback error: {:?}", e);
            }
        }
        log::debug!("voice released");
    }
}

/// One WebAudio oscillator chain.
pub struct WebVoice {
    nodes: Rc<VoiceNodes>,
}

impl WebVoice {
    /// Call `cb` once the voice has ended; immediately if it already has.
    pub fn set_on_ended(&self, cb: js_sys::Function) {
        if self.nodes.released.get() {
            if let Err(e) = cb.call0(&JsValue::NULL) {
                log::warn!("ended callback error: {:?}", e);
            }
        } else {
            *self.nodes.on_ended.borrow_mut() = Some(cb);
        }
    }
}

impl ToneVoice for WebVoice {
    type Error = JsValue;

    fn set_gain_at_time(&self, gain: f64, when: f64) {
        if let Err(e) = self.nodes.gate.gain().set_value_at_time(gain as f32, when) {
            log::warn!("setValueAtTime({gain}, {when}) failed: {:?}", e);
        }
    }

    fn start(&self, when: f64, stop_at: f64) -> Result<(), JsValue> {
        self.nodes.osc.start_with_when(when).map_err(|e| {
            log::warn!("oscillator start({when}) failed: {:?}", e);
            e
        })?;
        if let Err(e) = self.nodes.osc.stop_with_when(stop_at) {
            // still audible; the session's stop() remains the way out
            log::warn!("oscillator stop({stop_at}) failed: {:?}", e);
        }
        Ok(())
    }

    fn stop(&self) {
        let _ = self.nodes.osc.stop();
        self.nodes.ended();
    }
}

/// A live `AudioContext`.
pub struct WebOutput {
    ctx: web::AudioContext,
}

impl WebOutput {
    fn open() -> Result<Self, JsValue> {
        let ctx = web::AudioContext::new().map_err(|e| {
            log::error!("AudioContext error: {:?}", e);
            e
        })?;
        log::info!("AudioContext created ({} Hz)", ctx.sample_rate());
        Ok(Self { ctx })
    }

    fn is_closed(&self) -> bool {
        self.ctx.state() == web::AudioContextState::Closed
    }

    // Browsers may create the context suspended until a user gesture.
    fn resume_if_suspended(&self) -> Result<(), JsValue> {
        if self.ctx.state() == web::AudioContextState::Suspended {
            let promise = self.ctx.resume()?;
            spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("AudioContext resume failed: {:?}", e);
                }
            });
        }
        Ok(())
    }
}

impl ToneOutput for WebOutput {
    type Voice = WebVoice;
    type Error = JsValue;

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn create_voice(&self, frequency: f64, pan: f64, completion: Completion) -> Result<WebVoice, JsValue> {
        let osc = web::OscillatorNode::new(&self.ctx)?;
        osc.set_type(web::OscillatorType::Sine);
        osc.frequency().set_value(frequency as f32);
        let gate = create_gain(&self.ctx, 0.0, "gate")?;
        let panner = web::StereoPannerNode::new(&self.ctx)?;
        panner.pan().set_value(pan as f32);

        osc.connect_with_audio_node(&gate)?;
        gate.connect_with_audio_node(&panner)?;
        panner.connect_with_audio_node(&self.ctx.destination())?;

        let nodes = Rc::new(VoiceNodes {
            osc,
            gate,
            panner,
            completion,
            released: Cell::new(false),
            on_ended: RefCell::new(None),
        });
        let onended = {
            let nodes = Rc::clone(&nodes);
            Closure::once_into_js(move || nodes.ended())
        };
        nodes.osc.set_onended(Some(onended.unchecked_ref()));
        Ok(WebVoice { nodes })
    }
}

/// Lazily created `AudioContext`, reused across plays and recreated if closed.
#[derive(Default)]
pub struct WebAudio {
    output: Option<WebOutput>,
}

impl WebAudio {
    pub fn output(&mut self) -> Result<&WebOutput, JsValue> {
        if self.output.as_ref().map_or(false, WebOutput::is_closed) {
            log::info!("AudioContext was closed, recreating");
            self.output = None;
        }
        let output = match self.output.take() {
            Some(output) => output,
            None => WebOutput::open()?,
        };
        output.resume_if_suspended()?;
        Ok(self.output.insert(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tone_core::{play, ToneParameters};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn counter(name: &str) -> f64 {
        js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    #[wasm_bindgen_test]
    fn rejected_start_leaves_stop_able_to_release() {
        let mut audio = WebAudio::default();
        let output = audio.output().unwrap();
        let completion = Completion::new();
        let voice = output.create_voice(440.0, 0.0, completion.clone()).unwrap();

        // negative start times are a RangeError in WebAudio
        assert!(voice.start(-1.0, 1.0).is_err());
        assert!(!completion.is_fired());
        voice.stop();
        assert!(completion.is_fired());
    }

    #[wasm_bindgen_test]
    fn late_ended_callback_runs_once_and_errors_are_contained() {
        let mut audio = WebAudio::default();
        let output = audio.output().unwrap();
        let params = ToneParameters::new(5.0, 1.0, 1.0, 440.0, 0.5, 0.0).unwrap();
        let session = play(output, &params).unwrap();
        session.stop();
        assert!(session.completion().is_fired());

        let bump = js_sys::Function::new_no_args(
            "globalThis.toneEndedCalls = (globalThis.toneEndedCalls || 0) + 1",
        );
        session.voice().set_on_ended(bump);
        assert_eq!(counter("toneEndedCalls"), 1.0);

        let throwing = js_sys::Function::new_no_args("throw new Error('ended handler failed')");
        session.voice().set_on_ended(throwing);
    }
}
