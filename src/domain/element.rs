use crate::mesh::{Mesh, EXPECTED_NUM_DIMS};
use smallvec::SmallVec;

use std::fmt;

pub type LevelVector = SmallVec<[u32; EXPECTED_NUM_DIMS]>;
pub type SegmentVector = SmallVec<[u64; EXPECTED_NUM_DIMS]>;

/// Identifier of an Element within the refinement hierarchy: the Block it
/// subdivides, a refinement level per dimension, and a segment index per
/// dimension with `segment[i] < 2^level[i]`.
///
/// Ids order lexicographically by (block, levels, segments), which gives the
/// Domain arena a deterministic iteration order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId {
    block: usize,
    levels: LevelVector,
    segments: SegmentVector,
}

impl ElementId {
    pub fn new(
        block: usize,
        levels: impl IntoIterator<Item = u32>,
        segments: impl IntoIterator<Item = u64>,
    ) -> Self {
        let levels: LevelVector = levels.into_iter().collect();
        let segments: SegmentVector = segments.into_iter().collect();

        assert!(
            !levels.is_empty(),
            "An ElementId must have at least one dimension!"
        );
        assert_eq!(
            levels.len(),
            segments.len(),
            "Level and segment vectors must have one entry per dimension!"
        );
        for (axis, (level, segment)) in levels.iter().zip(segments.iter()).enumerate() {
            assert!(
                *level < 63 && *segment < (1u64 << *level),
                "Segment index ({}) on axis {} must be in [0, 2^{})!",
                segment,
                axis,
                level
            );
        }

        Self {
            block,
            levels,
            segments,
        }
    }

    /// The unrefined Element covering a whole Block
    pub fn root(block: usize, num_dims: usize) -> Self {
        Self::new(block, vec![0; num_dims], vec![0; num_dims])
    }

    pub fn block(&self) -> usize {
        self.block
    }

    pub fn num_dims(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, axis: usize) -> u32 {
        self.levels[axis]
    }

    pub fn segment(&self, axis: usize) -> u64 {
        self.segments[axis]
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub(crate) fn with_axis(&self, axis: usize, level: u32, segment: u64) -> Self {
        let mut levels = self.levels.clone();
        let mut segments = self.segments.clone();
        levels[axis] = level;
        segments[axis] = segment;
        Self::new(self.block, levels, segments)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "B{}:(", self.block)?;
        for axis in 0..self.levels.len() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "L{}S{}", self.levels[axis], self.segments[axis])?;
        }
        write!(f, ")")
    }
}

/// Nodal solution data for one Element: one value array per tensor component,
/// each with one entry per collocation point (dimension 0 varying fastest).
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    components: Vec<Vec<f64>>,
}

impl Solution {
    pub fn new(components: Vec<Vec<f64>>, mesh: &Mesh) -> Self {
        assert!(
            !components.is_empty(),
            "A Solution must have at least one tensor component!"
        );
        for (c, component) in components.iter().enumerate() {
            assert_eq!(
                component.len(),
                mesh.num_points(),
                "Component ({}) must have one value per collocation point!",
                c
            );
        }
        Self { components }
    }

    /// Single-component convenience constructor
    pub fn scalar(values: Vec<f64>, mesh: &Mesh) -> Self {
        Self::new(vec![values], mesh)
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, c: usize) -> &[f64] {
        &self.components[c]
    }

    pub fn components(&self) -> impl Iterator<Item = &Vec<f64>> + '_ {
        self.components.iter()
    }
}

/// A leaf subdivision of a Block, exclusively owning its expansion ([Mesh])
/// and nodal data ([Solution]). Created at domain construction or by a split;
/// destroyed when siblings join; replaced by the AMR mesh-update step.
#[derive(Clone, Debug)]
pub struct Element {
    pub id: ElementId,
    pub mesh: Mesh,
    pub solution: Solution,
}

impl Element {
    pub fn new(id: ElementId, mesh: Mesh, solution: Solution) -> Self {
        assert_eq!(
            id.num_dims(),
            mesh.num_dims(),
            "Element {} must have a Mesh with one dim per refinement axis!",
            id
        );
        Self { id, mesh, solution }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{Basis, Quadrature};

    #[test]
    fn ids_order_deterministically() {
        let a = ElementId::new(0, [1], [0]);
        let b = ElementId::new(0, [1], [1]);
        let c = ElementId::new(1, [0], [0]);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, ElementId::new(0, [1], [0]));
    }

    #[test]
    #[should_panic(expected = "Segment index")]
    fn segment_outside_the_level_range_is_rejected() {
        ElementId::new(0, [2], [4]);
    }

    #[test]
    #[should_panic(expected = "one value per collocation point")]
    fn solution_length_must_match_the_mesh() {
        let mesh = Mesh::new_1d(5, Basis::Legendre, Quadrature::GaussLobatto).unwrap();
        Solution::scalar(vec![0.0; 4], &mesh);
    }

    #[test]
    fn root_id_covers_the_block() {
        let root = ElementId::root(3, 2);
        assert_eq!(root.block(), 3);
        assert_eq!(root.levels(), &[0, 0]);
        assert_eq!(root.segments(), &[0, 0]);
    }
}
