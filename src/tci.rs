use std::fmt;

/// Estimating both truncation error proxies requires at least three modes
pub const MIN_ESTIMATE_ORDER: usize = 3;

/// The expansion is too short to read a truncation error off its top modes.
/// Recovered by forcing a refinement decision instead of evaluating the
/// hysteresis rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsufficientResolutionError {
    pub order: usize,
}

impl fmt::Display for InsufficientResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Order ({}) is below the minimum ({}) needed to estimate truncation error!",
            self.order, MIN_ESTIMATE_ORDER
        )
    }
}

impl std::error::Error for InsufficientResolutionError {}

/// Truncation error proxies along one dimension, read off the power monitors
/// of the current solution. Ephemeral; recomputed every AMR cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TruncationErrorEstimate {
    /// Magnitude of the highest retained spectral coefficient; the primary
    /// truncation error proxy
    pub e_n: f64,
    /// Magnitude of the next-highest coefficient; gates coarsening only
    pub e_n_minus_1: f64,
    /// Whether the spectral series is converging per [persson_tci]
    pub converging: bool,
}

/// Compute both truncation error proxies and the convergence flag from one
/// dimension's power monitors.
pub fn truncation_error_estimate(
    monitors: &[f64],
    persson_exponent: f64,
    persson_alpha: f64,
) -> Result<TruncationErrorEstimate, InsufficientResolutionError> {
    let order = monitors.len();
    if order < MIN_ESTIMATE_ORDER {
        return Err(InsufficientResolutionError { order });
    }

    Ok(TruncationErrorEstimate {
        e_n: monitors[order - 1],
        e_n_minus_1: monitors[order - 2],
        converging: persson_tci(monitors, persson_exponent, persson_alpha)?,
    })
}

/// Persson-type smoothness indicator: the series counts as converging when
/// the top mode's power has fallen at least as fast as the reference decay
/// `alpha * order^-exponent` relative to the strongest mode. A slower falloff
/// signals a non-smooth solution that p-refinement cannot help.
pub fn persson_tci(
    monitors: &[f64],
    exponent: f64,
    alpha: f64,
) -> Result<bool, InsufficientResolutionError> {
    let order = monitors.len();
    if order < MIN_ESTIMATE_ORDER {
        return Err(InsufficientResolutionError { order });
    }

    let top = monitors[order - 1];
    let peak = monitors.iter().cloned().fold(0.0, f64::max);

    // identically zero data is trivially resolved
    if peak == 0.0 {
        return Ok(true);
    }

    Ok(top <= alpha * (order as f64).powf(-exponent) * peak)
}
