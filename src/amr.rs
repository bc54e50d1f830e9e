use crate::basis::{ConfigurationError, MIN_SUPPORTED_ORDER};
use crate::tci::TruncationErrorEstimate;

use std::fmt;

/// Per-element, per-axis outcome of one AMR cycle. Transient; consumed by the
/// mesh-update step that produces the next generation of Elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmrDecision {
    IncreaseOrder,
    DecreaseOrder,
    Hold,
    Split,
    Join,
}

impl fmt::Display for AmrDecision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::IncreaseOrder => write!(f, "IncreaseOrder"),
            Self::DecreaseOrder => write!(f, "DecreaseOrder"),
            Self::Hold => write!(f, "Hold"),
            Self::Split => write!(f, "Split"),
            Self::Join => write!(f, "Join"),
        }
    }
}

/// Which rule gates coarsening
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoarseningPolicy {
    /// Coarsen when the two-modes-down error E_{N-1} already sits below the
    /// target, so dropping a mode cannot push the error past it
    TwoModesDown,
    /// Coarsen when E_N is at least this factor below the target
    TargetFraction(f64),
}

/// Immutable AMR control parameters, threaded explicitly through each cycle.
/// This is the engine's entire external contract surface.
#[derive(Clone, Debug, PartialEq)]
pub struct AmrConfig {
    pub target_truncation_error: f64,
    pub min_order: usize,
    pub max_order: usize,
    pub max_level: u32,
    pub persson_exponent: f64,
    pub persson_alpha: f64,
    pub coarsening_policy: CoarseningPolicy,
    /// Simulation-time spacing between AMR cycles; see [AmrConfig::due]
    pub cycle_interval: f64,
}

impl Default for AmrConfig {
    fn default() -> Self {
        Self {
            target_truncation_error: 1e-6,
            min_order: MIN_SUPPORTED_ORDER,
            max_order: 12,
            max_level: 8,
            persson_exponent: 4.0,
            persson_alpha: 5.0,
            coarsening_policy: CoarseningPolicy::TwoModesDown,
            cycle_interval: 1.0,
        }
    }
}

impl AmrConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_order < MIN_SUPPORTED_ORDER || self.min_order > self.max_order {
            return Err(ConfigurationError::InvalidOrderBounds {
                min_order: self.min_order,
                max_order: self.max_order,
            });
        }
        if !(self.target_truncation_error > 0.0) {
            return Err(ConfigurationError::NonPositiveTarget(
                self.target_truncation_error,
            ));
        }
        if !(self.persson_exponent > 0.0) || !(self.persson_alpha > 0.0) {
            return Err(ConfigurationError::InvalidPerssonParameters {
                exponent: self.persson_exponent,
                alpha: self.persson_alpha,
            });
        }
        if let CoarseningPolicy::TargetFraction(fraction) = self.coarsening_policy {
            if !(fraction > 1.0) {
                return Err(ConfigurationError::InvalidCoarseningFraction(fraction));
            }
        }
        if !(self.cycle_interval > 0.0) {
            return Err(ConfigurationError::NonPositiveCycleInterval(
                self.cycle_interval,
            ));
        }
        Ok(())
    }

    /// Whether an AMR cycle is due at simulation time `now`, given when the
    /// previous cycle ran. The engine itself never tracks time; the caller's
    /// control loop polls this at the cadence of its own time steps.
    pub fn due(&self, now: f64, last_cycle: f64) -> bool {
        now - last_cycle >= self.cycle_interval
    }
}

/// Hysteresis rule for one Element along one refinement axis.
///
/// Refine when E_N exceeds the target; coarsen when the coarsening gate says
/// dropping resolution is safe; otherwise hold. The band between the two
/// thresholds is what prevents refine/coarsen flip-flopping: an Element
/// sitting exactly at the boundary never alternates. Returns the decision and
/// whether the target is unattainable within the configured bounds.
pub fn decide_axis(
    estimate: &TruncationErrorEstimate,
    order: usize,
    level: u32,
    config: &AmrConfig,
) -> (AmrDecision, bool) {
    let target = config.target_truncation_error;

    if estimate.e_n > target {
        // p-refinement cannot help a non-smooth solution, so a stalled series
        // splits before raising the order
        let (first, second) = if estimate.converging {
            (try_increase_order(order, config), try_split(level, config))
        } else {
            (try_split(level, config), try_increase_order(order, config))
        };

        return match first.or(second) {
            Some(decision) => (decision, false),
            None => (AmrDecision::Hold, true),
        };
    }

    let coarsen = match config.coarsening_policy {
        CoarseningPolicy::TwoModesDown => estimate.e_n_minus_1 < target,
        CoarseningPolicy::TargetFraction(fraction) => estimate.e_n < target / fraction,
    };

    if coarsen {
        if order > config.min_order {
            return (AmrDecision::DecreaseOrder, false);
        }
        if level > 0 {
            return (AmrDecision::Join, false);
        }
    }

    (AmrDecision::Hold, false)
}

fn try_increase_order(order: usize, config: &AmrConfig) -> Option<AmrDecision> {
    (order < config.max_order).then(|| AmrDecision::IncreaseOrder)
}

fn try_split(level: u32, config: &AmrConfig) -> Option<AmrDecision> {
    (level < config.max_level).then(|| AmrDecision::Split)
}
