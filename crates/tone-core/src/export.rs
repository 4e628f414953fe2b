use crate::params::ToneParameters;

/// Two-decimal label with the separator dropped: 0.5 -> "050", 1.0 -> "100".
fn hundredths_label(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    format!("{}{:02}", cents / 100, cents % 100)
}

/// Integer label, rounding halves away from zero.
fn whole_label(value: f64) -> String {
    format!("{}", value.round() as i64)
}

/// `C` for centre, else `L`/`R` followed by |pan| in hundredths.
pub fn pan_label(pan: f64) -> String {
    if pan == 0.0 {
        "C".to_string()
    } else if pan < 0.0 {
        format!("L{}", hundredths_label(pan))
    } else {
        format!("R{}", hundredths_label(pan))
    }
}

/// File name that records every parameter of an exported tone, e.g.
/// `Dur30_ON1_OFF1_Freq440_Gain050_PanC.wav`.
pub fn suggested_filename(params: &ToneParameters) -> String {
    format!(
        "Dur{}_ON{}_OFF{}_Freq{}_Gain{}_Pan{}.wav",
        whole_label(params.duration()),
        whole_label(params.on_duration()),
        whole_label(params.off_duration()),
        whole_label(params.frequency()),
        hundredths_label(params.gain()),
        pan_label(params.pan()),
    )
}
