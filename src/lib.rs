//! An adaptive mesh refinement decision engine for discontinuous-Galerkin
//! spectral element discretizations.
//!
//! Elements carry tensor-product expansions of their solution data; each AMR
//! cycle measures the spectral power in every Element's top modes, estimates
//! the local truncation error, and decides per refinement axis whether to
//! raise or lower the expansion order, split the Element in two, or join it
//! back with its sibling.
//!
//! ```rust
//! use dg_amr::{AmrConfig, Basis, Domain, Element, ElementId, Mesh, Quadrature, Solution};
//!
//! // a single unrefined element sampling a smooth field
//! let mut domain = Domain::single_block(1);
//! let mesh = Mesh::new_1d(8, Basis::Legendre, Quadrature::GaussLobatto)?;
//! let values = mesh
//!     .dim(0)
//!     .collocation_points()
//!     .iter()
//!     .map(|x| (2.0 * x + 1.83).sin() + x)
//!     .collect();
//! let id = ElementId::root(0, 1);
//! let solution = Solution::scalar(values, &mesh);
//! domain.insert(Element::new(id, mesh, solution));
//!
//! // one plan/apply cycle against a target truncation error
//! let config = AmrConfig {
//!     target_truncation_error: 1e-7,
//!     ..AmrConfig::default()
//! };
//! let plan = domain.plan_cycle(&config)?;
//! domain.apply(&plan)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// The AMR decision rule and its configuration
pub mod amr;
/// Basis/quadrature catalog: collocation points, quadrature weights, and the
/// cache behind them
pub mod basis;
/// Blocks, Elements, and the plan/apply refinement cycle over a Domain
pub mod domain;
/// Lagrange interpolation between grids
pub mod interpolation;
/// Tensor-product mesh descriptions
pub mod mesh;
/// Nodal/modal transforms and spectral power monitors
pub mod spectral;
/// Truncation error and smoothness indicators
pub mod tci;

pub use amr::{decide_axis, AmrConfig, AmrDecision, CoarseningPolicy};
pub use basis::{collocation_points, quadrature_weights, Basis, ConfigurationError, Quadrature};
pub use domain::{
    block_to_element, element_to_block, AmrNote, AmrPlan, Block, Domain, Element, ElementId,
    ElementPlan, InvalidRefinementError, Solution,
};
pub use interpolation::{DomainError, IrregularInterpolator, RegularGridInterpolator};
pub use mesh::{Mesh, MeshDim};
pub use spectral::{modal_to_nodal, nodal_to_modal, power_monitors};
pub use tci::{
    persson_tci, truncation_error_estimate, InsufficientResolutionError, TruncationErrorEstimate,
    MIN_ESTIMATE_ORDER,
};
