mod quadrature;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// Smallest representable expansion: two collocation points (a linear polynomial).
pub const MIN_SUPPORTED_ORDER: usize = 2;

/// Family of orthogonal polynomials used to represent the solution along one dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Basis {
    Legendre,
    Chebyshev,
}

/// Placement rule for the collocation points along one dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quadrature {
    /// All points strictly interior to (-1, 1)
    Gauss,
    /// First and last point exactly at ∓1
    GaussLobatto,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Legendre => write!(f, "Legendre"),
            Self::Chebyshev => write!(f, "Chebyshev"),
        }
    }
}

impl fmt::Display for Quadrature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Gauss => write!(f, "Gauss"),
            Self::GaussLobatto => write!(f, "GaussLobatto"),
        }
    }
}

/// Invalid setup parameters (basis/quadrature/order combinations or AMR control
/// bounds). Fatal at construction time; never recovered mid-cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigurationError {
    OrderTooLow(usize),
    InvalidOrderBounds { min_order: usize, max_order: usize },
    NonPositiveTarget(f64),
    InvalidPerssonParameters { exponent: f64, alpha: f64 },
    InvalidCoarseningFraction(f64),
    NonPositiveCycleInterval(f64),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OrderTooLow(order) => write!(
                f,
                "Order ({}) is below the minimum supported order ({}); cannot construct collocation grid!",
                order, MIN_SUPPORTED_ORDER
            ),
            Self::InvalidOrderBounds { min_order, max_order } => write!(
                f,
                "Order bounds [{}, {}] must satisfy {} <= min_order <= max_order!",
                min_order, max_order, MIN_SUPPORTED_ORDER
            ),
            Self::NonPositiveTarget(target) => {
                write!(f, "Target truncation error ({}) must be positive!", target)
            }
            Self::InvalidPerssonParameters { exponent, alpha } => write!(
                f,
                "Persson indicator parameters (exponent: {}, alpha: {}) must be positive!",
                exponent, alpha
            ),
            Self::InvalidCoarseningFraction(fraction) => write!(
                f,
                "Coarsening fraction ({}) must be greater than 1 to sit below the refinement threshold!",
                fraction
            ),
            Self::NonPositiveCycleInterval(interval) => {
                write!(f, "AMR cycle interval ({}) must be positive!", interval)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Collocation points and matching quadrature weights on [-1, 1]
#[derive(Debug)]
pub(crate) struct Grid {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

type GridKey = (usize, Basis, Quadrature);

static GRID_CACHE: OnceLock<Mutex<BTreeMap<GridKey, Arc<Grid>>>> = OnceLock::new();

/// Fetch (computing and caching on first use) the grid for a supported
/// (order, basis, quadrature) triple. Grids are pure functions of their key.
pub(crate) fn cached_grid(
    order: usize,
    basis: Basis,
    quadrature: Quadrature,
) -> Result<Arc<Grid>, ConfigurationError> {
    if order < MIN_SUPPORTED_ORDER {
        return Err(ConfigurationError::OrderTooLow(order));
    }

    let cache = GRID_CACHE.get_or_init(|| Mutex::new(BTreeMap::new()));
    let mut map = match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    Ok(map
        .entry((order, basis, quadrature))
        .or_insert_with(|| {
            let (points, weights) = match (basis, quadrature) {
                (Basis::Legendre, Quadrature::Gauss) => quadrature::gauss_legendre(order),
                (Basis::Legendre, Quadrature::GaussLobatto) => {
                    quadrature::gauss_lobatto_legendre(order)
                }
                (Basis::Chebyshev, Quadrature::Gauss) => quadrature::chebyshev_gauss(order),
                (Basis::Chebyshev, Quadrature::GaussLobatto) => {
                    quadrature::chebyshev_gauss_lobatto(order)
                }
            };
            Arc::new(Grid { points, weights })
        })
        .clone())
}

/// The `order` collocation points on [-1, 1] for the requested basis and
/// quadrature; strictly increasing and symmetric about 0
pub fn collocation_points(
    order: usize,
    basis: Basis,
    quadrature: Quadrature,
) -> Result<Vec<f64>, ConfigurationError> {
    Ok(cached_grid(order, basis, quadrature)?.points.clone())
}

/// The matching quadrature weights; positive, summing to the measure of [-1, 1]
pub fn quadrature_weights(
    order: usize,
    basis: Basis,
    quadrature: Quadrature,
) -> Result<Vec<f64>, ConfigurationError> {
    Ok(cached_grid(order, basis, quadrature)?.weights.clone())
}

/// Evaluate the `mode`-th basis polynomial at `x`
pub(crate) fn basis_polynomial(basis: Basis, mode: usize, x: f64) -> f64 {
    match basis {
        Basis::Legendre => quadrature::legendre(mode, x),
        Basis::Chebyshev => quadrature::chebyshev(mode, x),
    }
}
