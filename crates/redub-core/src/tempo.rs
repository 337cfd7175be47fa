//! Tempo-cascade math for duration reconciliation.
//!
//! ffmpeg's `atempo` filter only accepts factors in `[0.5, 2.0]`, so any
//! factor outside that range is expressed as a cascade of boundary stages
//! followed by one residual stage. The product of the stages equals the
//! requested factor.

use crate::error::DubError;

/// Smallest bound of a single `atempo` stage.
pub const MIN_STAGE: f64 = 0.5;
/// Largest bound of a single `atempo` stage.
pub const MAX_STAGE: f64 = 2.0;

/// Relative mismatch below which tempo adjustment is skipped entirely.
pub const SKIP_TOLERANCE: f64 = 0.005;

/// True when `factor` is close enough to 1.0 that re-encoding the audio
/// would cost more quality than the timing it buys.
pub fn is_negligible(factor: f64) -> bool {
    (factor - 1.0).abs() <= SKIP_TOLERANCE
}

/// Decompose `factor` into a sequence of `atempo` stages, each within
/// `[0.5, 2.0]`, whose product is `factor`.
pub fn tempo_stages(factor: f64) -> Result<Vec<f64>, DubError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(DubError::Processing(format!(
            "invalid tempo factor {factor}"
        )));
    }
    let mut stages = Vec::new();
    let mut remaining = factor;
    while remaining > MAX_STAGE {
        stages.push(MAX_STAGE);
        remaining /= MAX_STAGE;
    }
    while remaining < MIN_STAGE {
        stages.push(MIN_STAGE);
        remaining /= MIN_STAGE;
    }
    stages.push(remaining);
    Ok(stages)
}

/// Render stages as an ffmpeg audio filter expression,
/// e.g. `atempo=2.000000,atempo=1.250000`.
pub fn stages_filter(stages: &[f64]) -> String {
    stages
        .iter()
        .map(|s| format!("atempo={s:.6}"))
        .collect::<Vec<_>>()
        .join(",")
}
