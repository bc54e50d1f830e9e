use super::element::ElementId;

use std::fmt;

/// A split or join request that the refinement hierarchy cannot honor.
/// Recovered by holding the offending Element at its current resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum InvalidRefinementError {
    SplitBeyondMaxLevel {
        id: ElementId,
        axis: usize,
        max_level: u32,
    },
    JoinAtRootLevel {
        id: ElementId,
        axis: usize,
    },
    JoinWithoutSibling {
        id: ElementId,
        axis: usize,
    },
    JoinMeshMismatch {
        id: ElementId,
        sibling: ElementId,
    },
    ElementDoesntExist(ElementId),
}

impl fmt::Display for InvalidRefinementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SplitBeyondMaxLevel { id, axis, max_level } => write!(
                f,
                "Splitting Element {} along axis {} would exceed the maximum refinement level ({})!",
                id, axis, max_level
            ),
            Self::JoinAtRootLevel { id, axis } => write!(
                f,
                "Element {} is unrefined along axis {}; cannot join!",
                id, axis
            ),
            Self::JoinWithoutSibling { id, axis } => write!(
                f,
                "Element {} has no live sibling along axis {}; cannot join!",
                id, axis
            ),
            Self::JoinMeshMismatch { id, sibling } => write!(
                f,
                "Elements {} and {} carry different Meshes; cannot join!",
                id, sibling
            ),
            Self::ElementDoesntExist(id) => {
                write!(f, "Element {} does not exist in the Domain!", id)
            }
        }
    }
}

impl std::error::Error for InvalidRefinementError {}

impl ElementId {
    /// Ids of the two children produced by splitting along `axis`: segments
    /// `2I` and `2I + 1` at `level + 1`
    pub fn child_ids(
        &self,
        axis: usize,
        max_level: u32,
    ) -> Result<[ElementId; 2], InvalidRefinementError> {
        let level = self.level(axis);
        if level >= max_level {
            return Err(InvalidRefinementError::SplitBeyondMaxLevel {
                id: self.clone(),
                axis,
                max_level,
            });
        }

        let segment = self.segment(axis);
        Ok([
            self.with_axis(axis, level + 1, 2 * segment),
            self.with_axis(axis, level + 1, 2 * segment + 1),
        ])
    }

    /// Id of the parent this Element and its sibling would join back into
    pub fn parent_id(&self, axis: usize) -> Result<ElementId, InvalidRefinementError> {
        let level = self.level(axis);
        if level == 0 {
            return Err(InvalidRefinementError::JoinAtRootLevel {
                id: self.clone(),
                axis,
            });
        }
        Ok(self.with_axis(axis, level - 1, self.segment(axis) / 2))
    }

    /// Id of the sibling produced by the same prior split, or None at level 0
    pub fn sibling_id(&self, axis: usize) -> Option<ElementId> {
        if self.level(axis) == 0 {
            return None;
        }
        Some(self.with_axis(axis, self.level(axis), self.segment(axis) ^ 1))
    }

    /// Whether this Element is the lower-segment child of its parent on `axis`
    pub fn is_lower_sibling(&self, axis: usize) -> bool {
        self.segment(axis) % 2 == 0
    }
}

/// Affine map from element-logical coordinates in [-1, 1]^d to block-logical
/// coordinates: `Xi_i = h_i xi_i + b_i - 1` with `h_i = 2^-level_i` and
/// `b_i = h_i (2 segment_i + 1)`. Orientation-preserving and invertible; the
/// images over all segments at a fixed level tile [-1, 1]^d.
pub fn element_to_block(xi: &[f64], id: &ElementId) -> Vec<f64> {
    assert_eq!(
        xi.len(),
        id.num_dims(),
        "Coordinate must have one entry per dimension of Element {}!",
        id
    );

    xi.iter()
        .enumerate()
        .map(|(axis, x)| {
            let h = 2.0_f64.powi(-(id.level(axis) as i32));
            let b = h * (2.0 * id.segment(axis) as f64 + 1.0);
            h * x + b - 1.0
        })
        .collect()
}

/// Inverse of [element_to_block]; round-trips to floating-point precision
pub fn block_to_element(xi_block: &[f64], id: &ElementId) -> Vec<f64> {
    assert_eq!(
        xi_block.len(),
        id.num_dims(),
        "Coordinate must have one entry per dimension of Element {}!",
        id
    );

    xi_block
        .iter()
        .enumerate()
        .map(|(axis, x)| {
            let h = 2.0_f64.powi(-(id.level(axis) as i32));
            let b = h * (2.0 * id.segment(axis) as f64 + 1.0);
            (x + 1.0 - b) / h
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_ACCURACY: f64 = 1e-14;

    #[test]
    fn round_trip_is_the_identity_for_all_valid_ids() {
        for level in 0..6u32 {
            for segment in 0..(1u64 << level) {
                let id = ElementId::new(0, [level], [segment]);
                for xi in [-1.0, -0.62, -1.0 / 3.0, 0.0, 0.25, 0.9, 1.0] {
                    let xi_block = element_to_block(&[xi], &id);
                    let xi_round = block_to_element(&xi_block, &id);
                    assert!((xi_round[0] - xi).abs() < MAP_ACCURACY);
                }
            }
        }
    }

    #[test]
    fn segments_at_a_fixed_level_tile_the_block_without_gaps() {
        for level in 0..7u32 {
            let mut previous_upper = -1.0;
            for segment in 0..(1u64 << level) {
                let id = ElementId::new(0, [level], [segment]);
                let lower = element_to_block(&[-1.0], &id)[0];
                let upper = element_to_block(&[1.0], &id)[0];

                assert!(lower < upper);
                // dyadic endpoints are exact in binary floating point
                assert_eq!(lower, previous_upper);
                previous_upper = upper;
            }
            assert_eq!(previous_upper, 1.0);
        }
    }

    #[test]
    fn two_dimensional_images_are_sub_cubes() {
        let id = ElementId::new(0, [2, 1], [3, 0]);

        let lower = element_to_block(&[-1.0, -1.0], &id);
        let upper = element_to_block(&[1.0, 1.0], &id);

        assert_eq!(lower, vec![0.5, -1.0]);
        assert_eq!(upper, vec![1.0, 0.0]);
    }

    #[test]
    fn children_tile_their_parent() {
        let parent = ElementId::new(0, [1], [1]);
        let [lower_child, upper_child] = parent.child_ids(0, 8).unwrap();

        assert_eq!(lower_child, ElementId::new(0, [2], [2]));
        assert_eq!(upper_child, ElementId::new(0, [2], [3]));

        let parent_lower = element_to_block(&[-1.0], &parent)[0];
        let parent_mid = element_to_block(&[0.0], &parent)[0];
        let parent_upper = element_to_block(&[1.0], &parent)[0];

        assert_eq!(element_to_block(&[-1.0], &lower_child)[0], parent_lower);
        assert_eq!(element_to_block(&[1.0], &lower_child)[0], parent_mid);
        assert_eq!(element_to_block(&[-1.0], &upper_child)[0], parent_mid);
        assert_eq!(element_to_block(&[1.0], &upper_child)[0], parent_upper);
    }

    #[test]
    fn join_is_the_exact_inverse_of_split() {
        let parent = ElementId::new(0, [3], [5]);
        let [lower_child, upper_child] = parent.child_ids(0, 8).unwrap();

        assert_eq!(lower_child.parent_id(0).unwrap(), parent);
        assert_eq!(upper_child.parent_id(0).unwrap(), parent);
        assert_eq!(lower_child.sibling_id(0).unwrap(), upper_child);
        assert_eq!(upper_child.sibling_id(0).unwrap(), lower_child);
        assert!(lower_child.is_lower_sibling(0));
        assert!(!upper_child.is_lower_sibling(0));
    }

    #[test]
    fn refinement_bounds_are_enforced() {
        let at_max = ElementId::new(0, [4], [9]);
        assert_eq!(
            at_max.child_ids(0, 4),
            Err(InvalidRefinementError::SplitBeyondMaxLevel {
                id: at_max.clone(),
                axis: 0,
                max_level: 4
            })
        );

        let root = ElementId::root(0, 1);
        assert_eq!(
            root.parent_id(0),
            Err(InvalidRefinementError::JoinAtRootLevel {
                id: root.clone(),
                axis: 0
            })
        );
        assert_eq!(root.sibling_id(0), None);
    }
}
