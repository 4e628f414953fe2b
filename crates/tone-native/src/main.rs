mod audio;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tone_core::*;

use audio::NativeAudio;

/// Generate a gated (pulsed) stereo sine tone
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the tone to a 16-bit stereo WAV file
    Render {
        #[command(flatten)]
        tone: ToneArgs,

        /// Output path (default: a name encoding every parameter)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Play the tone on the default output device; press Enter to stop
    Play {
        #[command(flatten)]
        tone: ToneArgs,
    },
    /// Print preview plot points as `x<TAB>y` lines
    Preview {
        #[command(flatten)]
        tone: ToneArgs,

        /// Plot width in pixels
        #[arg(short = 'w', long = "width", default_value_t = 80)]
        width: u32,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ToneArgs {
    /// Total length in seconds
    #[arg(short = 'd', long = "duration", default_value_t = DEFAULT_DURATION_SEC)]
    duration: f64,

    /// Seconds the gate stays open per cycle
    #[arg(long = "on", default_value_t = DEFAULT_ON_DURATION_SEC)]
    on_duration: f64,

    /// Seconds the gate stays closed per cycle (0 = continuous tone)
    #[arg(long = "off", default_value_t = DEFAULT_OFF_DURATION_SEC)]
    off_duration: f64,

    /// Sine frequency in Hz (20-99999)
    #[arg(short = 'f', long = "frequency", default_value_t = DEFAULT_FREQUENCY_HZ)]
    frequency: f64,

    /// Linear gain of the open gate (0-1)
    #[arg(short = 'g', long = "gain", default_value_t = DEFAULT_GAIN)]
    gain: f64,

    /// Stereo position, -1 left .. 1 right
    #[arg(short = 'p', long = "pan", default_value_t = DEFAULT_PAN, allow_negative_numbers = true)]
    pan: f64,
}

impl ToneArgs {
    fn to_params(self) -> Result<ToneParameters, ParamError> {
        ToneParameters::new(
            self.duration,
            self.on_duration,
            self.off_duration,
            self.frequency,
            self.gain,
            self.pan,
        )
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render { tone, output } => {
            let params = tone.to_params()?;
            let path = output.unwrap_or_else(|| PathBuf::from(suggested_filename(&params)));
            render_to_file(&params, &path)
        }
        Command::Play { tone } => {
            let params = tone.to_params()?;
            let mut audio = NativeAudio::new();
            play_until_done(&mut audio, &params)
        }
        Command::Preview { tone, width } => {
            let params = tone.to_params()?;
            for p in sample_preview(&params, width) {
                println!("{}\t{:.6}", p.x, p.y);
            }
            Ok(())
        }
    }
}

fn render_to_file(params: &ToneParameters, path: &Path) -> anyhow::Result<()> {
    let started = Instant::now();
    let buffer = render(params, SAMPLE_RATE);
    let wav = encode(&buffer)?;
    std::fs::write(path, wav.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "wrote {} ({} frames, {} bytes) in {:.2?}",
        path.display(),
        buffer.frames(),
        wav.len(),
        started.elapsed()
    );
    Ok(())
}

fn play_until_done(audio: &mut NativeAudio, params: &ToneParameters) -> anyhow::Result<()> {
    let output = audio.output()?;
    log::debug!(
        "output clock {} Hz, {} channels",
        output.sample_rate(),
        output.channels()
    );
    let session = Arc::new(play(output, params)?);
    let completion = session.completion();

    // Enter on stdin cancels; the thread is left blocked if playback ends first.
    {
        let session = Arc::clone(&session);
        thread::Builder::new()
            .name("stdin-stop".into())
            .spawn(move || {
                let mut line = String::new();
                if std::io::stdin().lock().read_line(&mut line).is_ok() {
                    session.stop();
                }
            })
            .context("spawning stdin watcher")?;
    }

    log::info!("press Enter to stop");
    completion.wait();
    log::info!("playback finished");
    audio.reset();
    Ok(())
}
