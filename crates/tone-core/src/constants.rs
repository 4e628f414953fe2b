// Engine-wide constants shared by the offline, realtime and preview paths.

// Output format
pub const SAMPLE_RATE: u32 = 44_100; // Hz, fixed for every render
pub const CHANNELS: u16 = 2; // interleaved L/R
pub const BITS_PER_SAMPLE: u16 = 16; // signed PCM
pub const WAV_HEADER_LEN: usize = 44; // canonical RIFF/WAVE header

// Accepted parameter ranges
pub const FREQUENCY_MIN_HZ: f64 = 20.0;
pub const FREQUENCY_MAX_HZ: f64 = 99_999.0;

// Defaults used when a front end has nothing better
pub const DEFAULT_DURATION_SEC: f64 = 30.0;
pub const DEFAULT_ON_DURATION_SEC: f64 = 1.0;
pub const DEFAULT_OFF_DURATION_SEC: f64 = 1.0;
pub const DEFAULT_FREQUENCY_HZ: f64 = 440.0;
pub const DEFAULT_GAIN: f64 = 0.5;
pub const DEFAULT_PAN: f64 = 0.0;

// Preview window policy
pub const PREVIEW_MIN_CYCLES: u32 = 2;
pub const PREVIEW_MAX_CYCLES: u32 = 10;
pub const PREVIEW_PERIOD_FALLBACK_SEC: f64 = 1e-3; // substituted when on+off <= 0
