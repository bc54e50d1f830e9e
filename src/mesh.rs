use crate::basis::{cached_grid, Basis, ConfigurationError, Grid, Quadrature};
use smallvec::SmallVec;

use std::fmt;
use std::sync::Arc;

/// Number of dimensions a [Mesh] can hold inline before spilling to the heap
pub(crate) const EXPECTED_NUM_DIMS: usize = 3;

/// Expansion along a single logical dimension: how many collocation points it
/// carries, which polynomial family represents it, and where the points sit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshDim {
    order: usize,
    basis: Basis,
    quadrature: Quadrature,
}

impl MeshDim {
    pub fn new(order: usize, basis: Basis, quadrature: Quadrature) -> Result<Self, ConfigurationError> {
        // also rejects orders below the supported minimum
        cached_grid(order, basis, quadrature)?;
        Ok(Self {
            order,
            basis,
            quadrature,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn quadrature(&self) -> Quadrature {
        self.quadrature
    }

    /// Same basis and placement, different number of collocation points
    pub fn with_order(&self, order: usize) -> Result<Self, ConfigurationError> {
        Self::new(order, self.basis, self.quadrature)
    }

    /// Collocation points on [-1, 1] for this dimension
    pub fn collocation_points(&self) -> Vec<f64> {
        self.grid().points.clone()
    }

    /// Quadrature weights matching [Self::collocation_points]
    pub fn quadrature_weights(&self) -> Vec<f64> {
        self.grid().weights.clone()
    }

    pub(crate) fn grid(&self) -> Arc<Grid> {
        cached_grid(self.order, self.basis, self.quadrature)
            .expect("MeshDim parameters were validated at construction")
    }
}

impl fmt::Display for MeshDim {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({}, {})", self.order, self.basis, self.quadrature)
    }
}

/// Immutable description of an Element's tensor-product expansion, one
/// [MeshDim] per logical dimension. Equality is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mesh {
    dims: SmallVec<[MeshDim; EXPECTED_NUM_DIMS]>,
}

impl Mesh {
    pub fn new(dims: impl IntoIterator<Item = MeshDim>) -> Self {
        let dims: SmallVec<[MeshDim; EXPECTED_NUM_DIMS]> = dims.into_iter().collect();
        assert!(!dims.is_empty(), "A Mesh must have at least one dimension!");
        Self { dims }
    }

    /// Convenience constructor for a 1-D Mesh
    pub fn new_1d(order: usize, basis: Basis, quadrature: Quadrature) -> Result<Self, ConfigurationError> {
        Ok(Self::new([MeshDim::new(order, basis, quadrature)?]))
    }

    /// The same expansion along every dimension
    pub fn uniform(num_dims: usize, dim: MeshDim) -> Self {
        Self::new(std::iter::repeat(dim).take(num_dims))
    }

    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    pub fn dim(&self, axis: usize) -> &MeshDim {
        &self.dims[axis]
    }

    pub fn dims(&self) -> impl Iterator<Item = &MeshDim> + '_ {
        self.dims.iter()
    }

    /// Per-dimension collocation point counts, in storage order (dimension 0
    /// varies fastest in nodal value arrays)
    pub fn extents(&self) -> SmallVec<[usize; EXPECTED_NUM_DIMS]> {
        self.dims.iter().map(|d| d.order()).collect()
    }

    /// Total number of collocation points in the tensor-product grid
    pub fn num_points(&self) -> usize {
        self.dims.iter().map(|d| d.order()).product()
    }

    /// Replace the expansion order along one axis
    pub fn with_order_on_axis(&self, axis: usize, order: usize) -> Result<Self, ConfigurationError> {
        let mut dims = self.dims.clone();
        dims[axis] = dims[axis].with_order(order)?;
        Ok(Self { dims })
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (axis, dim) in self.dims.iter().enumerate() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, "]")
    }
}
