mod element;
mod h_refinement;

pub use element::{Element, ElementId, LevelVector, SegmentVector, Solution};
pub use h_refinement::{block_to_element, element_to_block, InvalidRefinementError};

use crate::amr::{decide_axis, AmrConfig, AmrDecision};
use crate::basis::ConfigurationError;
use crate::interpolation::{IrregularInterpolator, RegularGridInterpolator};
use crate::mesh::EXPECTED_NUM_DIMS;
use crate::spectral::{apply_along_axis, power_monitors};
use crate::tci::{truncation_error_estimate, TruncationErrorEstimate};

use log::{debug, warn};
use rayon::prelude::*;
use smallvec::SmallVec;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Coarsest subdivision of the computational domain. Owns the (affine,
/// stand-in) map from block-logical coordinates to physical coordinates and
/// is never refined as a whole; only the Elements within it are.
#[derive(Clone, Debug)]
pub struct Block {
    pub id: usize,
    pub lower: SmallVec<[f64; EXPECTED_NUM_DIMS]>,
    pub size: SmallVec<[f64; EXPECTED_NUM_DIMS]>,
}

impl Block {
    pub fn new(
        id: usize,
        lower: impl IntoIterator<Item = f64>,
        size: impl IntoIterator<Item = f64>,
    ) -> Self {
        let lower: SmallVec<[f64; EXPECTED_NUM_DIMS]> = lower.into_iter().collect();
        let size: SmallVec<[f64; EXPECTED_NUM_DIMS]> = size.into_iter().collect();
        assert_eq!(
            lower.len(),
            size.len(),
            "Block ({}) must have one extent per dimension!",
            id
        );
        assert!(
            size.iter().all(|s| *s > 0.0),
            "Block ({}) must have positive extents!",
            id
        );
        Self { id, lower, size }
    }

    pub fn num_dims(&self) -> usize {
        self.lower.len()
    }

    /// Map a block-logical coordinate in [-1, 1]^d to physical coordinates
    pub fn block_to_physical(&self, xi_block: &[f64]) -> Vec<f64> {
        assert_eq!(
            xi_block.len(),
            self.num_dims(),
            "Coordinate must have one entry per dimension of Block ({})!",
            self.id
        );
        xi_block
            .iter()
            .zip(self.lower.iter().zip(self.size.iter()))
            .map(|(xi, (lower, size))| lower + size * (xi + 1.0) / 2.0)
            .collect()
    }
}

/// Per-element diagnostic recorded on an [AmrPlan]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AmrNote {
    /// The target truncation error cannot be met within the configured order
    /// and level bounds; the Element holds at its current resolution
    AccuracyUnattainable { axis: usize },
    /// The expansion was too short to estimate truncation error, so the
    /// hysteresis rule was bypassed in favor of a refinement
    ForcedRefinement { axis: usize },
}

/// One Element's decisions (one per refinement axis) plus diagnostics
#[derive(Clone, Debug)]
pub struct ElementPlan {
    pub decisions: SmallVec<[AmrDecision; EXPECTED_NUM_DIMS]>,
    pub notes: Vec<AmrNote>,
}

/// The outcome of one AMR cycle over the whole Domain: a decision set
/// computed from a single time-slice of nodal data, to be committed
/// atomically by [Domain::apply]. Dropping a plan without applying it aborts
/// the cycle and leaves the Domain unchanged.
pub struct AmrPlan {
    config: AmrConfig,
    decisions: BTreeMap<ElementId, ElementPlan>,
}

impl AmrPlan {
    pub fn decision(&self, id: &ElementId) -> Option<&ElementPlan> {
        self.decisions.get(id)
    }

    pub fn decisions(&self) -> impl Iterator<Item = (&ElementId, &ElementPlan)> + '_ {
        self.decisions.iter()
    }

    /// Child ids a Split decision will materialize on `axis`
    pub fn split_products(
        &self,
        id: &ElementId,
        axis: usize,
    ) -> Result<[ElementId; 2], InvalidRefinementError> {
        id.child_ids(axis, self.config.max_level)
    }
}

/// Arena of Elements keyed by their refinement-hierarchy id, plus the Blocks
/// they subdivide. Split and join are arena insert/remove operations, so no
/// dangling parent/child references can survive a mesh update.
pub struct Domain {
    blocks: Vec<Block>,
    elements: BTreeMap<ElementId, Element>,
    /// Elements already warned about unattainable accuracy (one warning per
    /// Element for the lifetime of the Domain, not one per cycle)
    warned: Mutex<BTreeSet<ElementId>>,
}

impl Domain {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            elements: BTreeMap::new(),
            warned: Mutex::new(BTreeSet::new()),
        }
    }

    /// A Domain with one unit Block, for tests and 1-block problems
    pub fn single_block(num_dims: usize) -> Self {
        Self::new(vec![Block::new(
            0,
            vec![0.0; num_dims],
            vec![1.0; num_dims],
        )])
    }

    pub fn insert(&mut self, element: Element) {
        let block = element.id.block();
        assert!(
            block < self.blocks.len(),
            "Element {} references Block ({}) which does not exist!",
            element.id,
            block
        );
        assert_eq!(
            element.id.num_dims(),
            self.blocks[block].num_dims(),
            "Element {} must match the dimensionality of Block ({})!",
            element.id,
            block
        );
        assert!(
            !self.elements.contains_key(&element.id),
            "Element {} already exists in the Domain!",
            element.id
        );
        self.elements.insert(element.id.clone(), element);
    }

    pub fn block(&self, id: usize) -> &Block {
        &self.blocks[id]
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.elements.values()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.elements.keys()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Compute this cycle's decision for every Element from the current
    /// nodal data. Pure with respect to the mesh: nothing changes until the
    /// returned plan is passed to [Domain::apply].
    ///
    /// Decisions for distinct Elements are independent and are computed in
    /// parallel; only the sibling join-agreement pass runs serially over the
    /// collected decision set.
    pub fn plan_cycle(&self, config: &AmrConfig) -> Result<AmrPlan, ConfigurationError> {
        config.validate()?;

        let mut decisions: BTreeMap<ElementId, ElementPlan> = self
            .elements
            .par_iter()
            .map(|(id, element)| (id.clone(), plan_element(element, config)))
            .collect();

        reconcile_joins(&mut decisions, &self.elements);

        self.emit_diagnostics(&decisions);

        Ok(AmrPlan {
            config: config.clone(),
            decisions,
        })
    }

    /// Commit a plan: replace the current generation of Elements with the
    /// next one, projecting each Element's solution onto its new mesh. The
    /// update is transactional; on error the Domain is left unchanged.
    pub fn apply(&mut self, plan: &AmrPlan) -> Result<(), InvalidRefinementError> {
        for id in plan.decisions.keys() {
            if !self.elements.contains_key(id) {
                return Err(InvalidRefinementError::ElementDoesntExist(id.clone()));
            }
        }

        let mut next: BTreeMap<ElementId, Element> = BTreeMap::new();
        let mut consumed: BTreeSet<ElementId> = BTreeSet::new();

        for (id, element) in &self.elements {
            if consumed.contains(id) {
                continue;
            }

            let element_plan = match plan.decisions.get(id) {
                Some(element_plan) => element_plan,
                None => {
                    next.insert(id.clone(), element.clone());
                    continue;
                }
            };

            let split_axis = first_axis(element_plan, AmrDecision::Split);
            let join_axis = first_axis(element_plan, AmrDecision::Join);

            if let Some(axis) = split_axis {
                let [lower_id, upper_id] = id.child_ids(axis, plan.config.max_level)?;
                let (lower, upper) = split_element(element, axis, lower_id, upper_id);
                next.insert(lower.id.clone(), lower);
                next.insert(upper.id.clone(), upper);
            } else if let Some(axis) = join_axis {
                // siblings sort adjacently, lower first, so the lower side
                // executes the join and consumes its sibling
                let sibling_id = id
                    .sibling_id(axis)
                    .ok_or_else(|| InvalidRefinementError::JoinAtRootLevel {
                        id: id.clone(),
                        axis,
                    })?;
                if !id.is_lower_sibling(axis) {
                    return Err(InvalidRefinementError::JoinWithoutSibling {
                        id: id.clone(),
                        axis,
                    });
                }
                let sibling = self.elements.get(&sibling_id).ok_or_else(|| {
                    InvalidRefinementError::JoinWithoutSibling {
                        id: id.clone(),
                        axis,
                    }
                })?;
                if sibling.mesh != element.mesh {
                    return Err(InvalidRefinementError::JoinMeshMismatch {
                        id: id.clone(),
                        sibling: sibling_id.clone(),
                    });
                }

                let parent_id = id.parent_id(axis)?;
                let parent = join_elements(element, sibling, axis, parent_id);
                consumed.insert(sibling_id);
                next.insert(parent.id.clone(), parent);
            } else {
                let mut updated = element.clone();
                for (axis, decision) in element_plan.decisions.iter().enumerate() {
                    match decision {
                        AmrDecision::IncreaseOrder => {
                            let order = updated.mesh.dim(axis).order();
                            updated = p_project(&updated, axis, order + 1);
                        }
                        AmrDecision::DecreaseOrder => {
                            let order = updated.mesh.dim(axis).order();
                            updated = p_project(&updated, axis, order - 1);
                        }
                        AmrDecision::Hold | AmrDecision::Split | AmrDecision::Join => {}
                    }
                }
                next.insert(id.clone(), updated);
            }
        }

        self.elements = next;
        Ok(())
    }

    fn emit_diagnostics(&self, decisions: &BTreeMap<ElementId, ElementPlan>) {
        let mut warned = match self.warned.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (id, element_plan) in decisions {
            let unattainable = element_plan
                .notes
                .iter()
                .any(|note| matches!(note, AmrNote::AccuracyUnattainable { .. }));
            if unattainable && warned.insert(id.clone()) {
                warn!(
                    "Element {} cannot reach the target truncation error within the configured order/level bounds",
                    id
                );
            }
        }

        debug!(
            "AMR cycle planned: {} elements, {} refining, {} coarsening",
            decisions.len(),
            decisions
                .values()
                .flat_map(|p| p.decisions.iter())
                .filter(|d| matches!(d, AmrDecision::IncreaseOrder | AmrDecision::Split))
                .count(),
            decisions
                .values()
                .flat_map(|p| p.decisions.iter())
                .filter(|d| matches!(d, AmrDecision::DecreaseOrder | AmrDecision::Join))
                .count(),
        );
    }
}

fn first_axis(element_plan: &ElementPlan, decision: AmrDecision) -> Option<usize> {
    element_plan.decisions.iter().position(|d| *d == decision)
}

/// Decide one Element's refinement per axis from its own nodal data. Errors
/// local to the Element degrade its decision rather than aborting the cycle:
/// an unestimable expansion forces a refinement.
fn plan_element(element: &Element, config: &AmrConfig) -> ElementPlan {
    let component_monitors: Vec<Vec<Vec<f64>>> = element
        .solution
        .components()
        .map(|values| power_monitors(values, &element.mesh))
        .collect();

    let mut decisions = SmallVec::new();
    let mut notes = Vec::new();

    for axis in 0..element.mesh.num_dims() {
        let order = element.mesh.dim(axis).order();
        let level = element.id.level(axis);

        // aggregate across tensor components: worst error, unanimous convergence
        let mut aggregate = TruncationErrorEstimate {
            e_n: 0.0,
            e_n_minus_1: 0.0,
            converging: true,
        };
        let mut estimable = true;
        for monitors in component_monitors.iter() {
            match truncation_error_estimate(
                &monitors[axis],
                config.persson_exponent,
                config.persson_alpha,
            ) {
                Ok(estimate) => {
                    aggregate.e_n = aggregate.e_n.max(estimate.e_n);
                    aggregate.e_n_minus_1 = aggregate.e_n_minus_1.max(estimate.e_n_minus_1);
                    aggregate.converging &= estimate.converging;
                }
                Err(_) => {
                    estimable = false;
                    break;
                }
            }
        }

        if !estimable {
            notes.push(AmrNote::ForcedRefinement { axis });
            if order < config.max_order {
                decisions.push(AmrDecision::IncreaseOrder);
            } else if level < config.max_level {
                decisions.push(AmrDecision::Split);
            } else {
                notes.push(AmrNote::AccuracyUnattainable { axis });
                decisions.push(AmrDecision::Hold);
            }
            continue;
        }

        let (decision, unattainable) = decide_axis(&aggregate, order, level, config);
        if unattainable {
            notes.push(AmrNote::AccuracyUnattainable { axis });
        }
        decisions.push(decision);
    }

    ElementPlan { decisions, notes }
}

/// Enforce the join-agreement rule: a Join survives only if the sibling from
/// the same prior split is live, carries the same Mesh, and emits Join on the
/// same axis in the same cycle. Everything else demotes to Hold, so no
/// Element ever joins asymmetrically. One structural change per Element per
/// cycle: a Split anywhere cancels that Element's Joins, and only the first
/// confirmed Join axis survives.
fn reconcile_joins(
    decisions: &mut BTreeMap<ElementId, ElementPlan>,
    elements: &BTreeMap<ElementId, Element>,
) {
    let mut confirmed: BTreeSet<(ElementId, usize)> = BTreeSet::new();
    for (id, element_plan) in decisions.iter() {
        if element_plan.decisions.contains(&AmrDecision::Split) {
            continue;
        }
        for (axis, _) in element_plan
            .decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == AmrDecision::Join)
        {
            let sibling_id = match id.sibling_id(axis) {
                Some(sibling_id) => sibling_id,
                None => continue,
            };
            let sibling_joins = decisions.get(&sibling_id).map_or(false, |sibling_plan| {
                sibling_plan.decisions.get(axis) == Some(&AmrDecision::Join)
                    && !sibling_plan.decisions.contains(&AmrDecision::Split)
            });
            let meshes_match = match (elements.get(id), elements.get(&sibling_id)) {
                (Some(element), Some(sibling)) => element.mesh == sibling.mesh,
                _ => false,
            };
            if sibling_joins && meshes_match {
                confirmed.insert((id.clone(), axis));
            }
        }
    }

    for (id, element_plan) in decisions.iter_mut() {
        let splits = element_plan.decisions.contains(&AmrDecision::Split);
        let mut join_seen = false;
        for (axis, decision) in element_plan.decisions.iter_mut().enumerate() {
            if *decision == AmrDecision::Join {
                let keep = !splits && !join_seen && confirmed.contains(&(id.clone(), axis));
                if keep {
                    join_seen = true;
                } else {
                    *decision = AmrDecision::Hold;
                }
            }
        }
    }
}

/// Project an Element onto a new expansion order along one axis
fn p_project(element: &Element, axis: usize, new_order: usize) -> Element {
    let source_dim = element.mesh.dim(axis);
    let target_dim = source_dim
        .with_order(new_order)
        .expect("order bounds were validated with the AMR config");

    let interpolator = RegularGridInterpolator::new(source_dim, &target_dim);
    let extents = element.mesh.extents();

    let components = element
        .solution
        .components()
        .map(|values| apply_along_axis(values, &extents, axis, interpolator.matrix()))
        .collect();

    let mesh = element
        .mesh
        .with_order_on_axis(axis, new_order)
        .expect("order bounds were validated with the AMR config");
    let solution = Solution::new(components, &mesh);
    Element::new(element.id.clone(), mesh, solution)
}

/// Split an Element along one axis. Each child keeps the parent's Mesh and
/// samples the parent's interpolant at its own collocation points mapped into
/// the parent's logical frame.
fn split_element(
    parent: &Element,
    axis: usize,
    lower_id: ElementId,
    upper_id: ElementId,
) -> (Element, Element) {
    let dim = parent.mesh.dim(axis);
    let points = dim.collocation_points();
    let extents = parent.mesh.extents();

    let child = |id: ElementId, offset: f64| {
        let targets: Vec<f64> = points.iter().map(|x| 0.5 * x + offset).collect();
        let interpolator = IrregularInterpolator::new(dim, &targets)
            .expect("child collocation points stay inside the parent");

        let components = parent
            .solution
            .components()
            .map(|values| apply_along_axis(values, &extents, axis, interpolator.matrix()))
            .collect();

        let mesh = parent.mesh.clone();
        let solution = Solution::new(components, &mesh);
        Element::new(id, mesh, solution)
    };

    (child(lower_id, -0.5), child(upper_id, 0.5))
}

/// Join two siblings back into their parent. The parent keeps the (shared)
/// child Mesh and samples whichever child covers each parent collocation
/// point.
fn join_elements(lower: &Element, upper: &Element, axis: usize, parent_id: ElementId) -> Element {
    let mesh = lower.mesh.clone();
    let dim = mesh.dim(axis);
    let points = dim.collocation_points();
    let extents = mesh.extents();

    // parent points at or below the midline sample the lower child
    let pivot = points.partition_point(|x| *x <= 0.0);
    let lower_targets: Vec<f64> = points[..pivot].iter().map(|x| 2.0 * x + 1.0).collect();
    let upper_targets: Vec<f64> = points[pivot..].iter().map(|x| 2.0 * x - 1.0).collect();

    let lower_interp = IrregularInterpolator::new(dim, &lower_targets)
        .expect("parent collocation points stay inside the lower child");
    let upper_interp = IrregularInterpolator::new(dim, &upper_targets)
        .expect("parent collocation points stay inside the upper child");

    let components = lower
        .solution
        .components()
        .zip(upper.solution.components())
        .map(|(lower_values, upper_values)| {
            let from_lower = apply_along_axis(lower_values, &extents, axis, lower_interp.matrix());
            let from_upper = apply_along_axis(upper_values, &extents, axis, upper_interp.matrix());
            concat_along_axis(&from_lower, &from_upper, &extents, axis, pivot)
        })
        .collect();

    let solution = Solution::new(components, &mesh);
    Element::new(parent_id, mesh, solution)
}

/// Concatenate two arrays along `axis`; `a` contributes the first `pivot`
/// entries of the joint extent `extents[axis]`, `b` the rest. Both share
/// `extents` on every other axis.
fn concat_along_axis(
    a: &[f64],
    b: &[f64],
    extents: &[usize],
    axis: usize,
    pivot: usize,
) -> Vec<f64> {
    let n = extents[axis];
    let n_a = pivot;
    let n_b = n - pivot;
    let stride: usize = extents[..axis].iter().product();
    let outer: usize = extents[axis + 1..].iter().product();

    let mut out = vec![0.0; stride * n * outer];
    for o in 0..outer {
        for r in 0..n_a {
            for s in 0..stride {
                out[o * stride * n + r * stride + s] = a[o * stride * n_a + r * stride + s];
            }
        }
        for r in 0..n_b {
            for s in 0..stride {
                out[o * stride * n + (n_a + r) * stride + s] = b[o * stride * n_b + r * stride + s];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{Basis, Quadrature};
    use crate::mesh::Mesh;

    const PROJECTION_ACCURACY: f64 = 1e-10;

    fn scalar_element(id: ElementId, order: usize, f: impl Fn(f64) -> f64) -> Element {
        let mesh = Mesh::new_1d(order, Basis::Legendre, Quadrature::GaussLobatto).unwrap();
        let values = mesh
            .dim(0)
            .collocation_points()
            .iter()
            .map(|x| f(*x))
            .collect();
        let solution = Solution::scalar(values, &mesh);
        Element::new(id, mesh, solution)
    }

    /// An element whose data samples a field defined in block coordinates
    fn block_sampled_element(id: ElementId, order: usize, f: impl Fn(f64) -> f64) -> Element {
        let mesh = Mesh::new_1d(order, Basis::Legendre, Quadrature::GaussLobatto).unwrap();
        let values = mesh
            .dim(0)
            .collocation_points()
            .iter()
            .map(|x| f(element_to_block(&[*x], &id)[0]))
            .collect();
        let solution = Solution::scalar(values, &mesh);
        Element::new(id, mesh, solution)
    }

    fn config(target: f64) -> AmrConfig {
        AmrConfig {
            target_truncation_error: target,
            min_order: 3,
            max_order: 12,
            max_level: 6,
            ..AmrConfig::default()
        }
    }

    #[test]
    fn an_under_resolved_element_gains_an_order_and_keeps_its_data() {
        let mut domain = Domain::single_block(1);
        // x plus a small P_5 contribution: smooth by the Persson test, with
        // E_N = |a_5| = 1e-6 far above this target
        let smooth =
            |x: f64| x + 1e-6 * 0.125 * (63.0 * x.powi(5) - 70.0 * x.powi(3) + 15.0 * x);
        domain.insert(scalar_element(ElementId::root(0, 1), 6, smooth));

        let plan = domain.plan_cycle(&config(1e-12)).unwrap();
        let root = ElementId::root(0, 1);
        assert_eq!(
            plan.decision(&root).unwrap().decisions.as_slice(),
            &[AmrDecision::IncreaseOrder]
        );

        domain.apply(&plan).unwrap();

        let refined = domain.element(&root).unwrap();
        assert_eq!(refined.mesh.dim(0).order(), 7);
        // p-projection of a resolved polynomial is exact
        for (x, value) in refined
            .mesh
            .dim(0)
            .collocation_points()
            .iter()
            .zip(refined.solution.component(0).iter())
        {
            assert!((smooth(*x) - value).abs() < PROJECTION_ACCURACY);
        }
    }

    #[test]
    fn a_non_smooth_element_splits_and_its_children_tile_it() {
        let mut domain = Domain::single_block(1);
        let steep = |x: f64| (20.0 * x).tanh();
        let root = ElementId::root(0, 1);
        domain.insert(scalar_element(root.clone(), 6, steep));

        let plan = domain.plan_cycle(&config(1e-3)).unwrap();
        assert_eq!(
            plan.decision(&root).unwrap().decisions.as_slice(),
            &[AmrDecision::Split]
        );
        let [lower_id, upper_id] = plan.split_products(&root, 0).unwrap();

        domain.apply(&plan).unwrap();
        assert_eq!(domain.num_elements(), 2);
        assert!(domain.element(&root).is_none());

        // each child's data is the parent interpolant sampled at the child's
        // points mapped into the parent frame
        let parent = scalar_element(ElementId::root(0, 1), 6, steep);
        let dim = parent.mesh.dim(0);
        for (child_id, offset) in [(lower_id, -0.5), (upper_id, 0.5)] {
            let child = domain.element(&child_id).unwrap();
            let targets: Vec<f64> = dim
                .collocation_points()
                .iter()
                .map(|x| 0.5 * x + offset)
                .collect();
            let expected = IrregularInterpolator::new(dim, &targets)
                .unwrap()
                .interpolate(parent.solution.component(0));
            for (e, v) in expected.iter().zip(child.solution.component(0).iter()) {
                assert!((e - v).abs() < PROJECTION_ACCURACY);
            }
        }
    }

    #[test]
    fn unanimous_siblings_join_back_into_their_parent() {
        let mut domain = Domain::single_block(1);
        let parent_id = ElementId::root(0, 1);
        let [lower_id, upper_id] = parent_id.child_ids(0, 6).unwrap();

        // a near-constant solution is over-resolved: E_N and E_{N-1} both sit
        // far below the target, and with order already at min_order both
        // children emit Join
        let flat = |x_block: f64| 2.0 + 1e-9 * x_block;
        for id in [&lower_id, &upper_id] {
            domain.insert(block_sampled_element(id.clone(), 3, flat));
        }

        let plan = domain.plan_cycle(&config(1e-5)).unwrap();
        assert_eq!(
            plan.decision(&lower_id).unwrap().decisions.as_slice(),
            &[AmrDecision::Join]
        );
        assert_eq!(
            plan.decision(&upper_id).unwrap().decisions.as_slice(),
            &[AmrDecision::Join]
        );

        domain.apply(&plan).unwrap();
        assert_eq!(domain.num_elements(), 1);

        let parent = domain.element(&parent_id).unwrap();
        assert_eq!(parent.id, parent_id);
        // joining exactly reproduces the (affine) field on the parent's points
        for (x, value) in parent
            .mesh
            .dim(0)
            .collocation_points()
            .iter()
            .zip(parent.solution.component(0).iter())
        {
            let x_block = element_to_block(&[*x], &parent_id)[0];
            assert!((flat(x_block) - value).abs() < PROJECTION_ACCURACY);
        }
    }

    #[test]
    fn a_join_without_agreement_is_demoted_to_hold() {
        let mut domain = Domain::single_block(1);
        let parent_id = ElementId::root(0, 1);
        let [lower_id, upper_id] = parent_id.child_ids(0, 6).unwrap();

        // lower child wants to coarsen; upper child is under-resolved
        domain.insert(scalar_element(lower_id.clone(), 3, |x| 2.0 + 1e-9 * x));
        domain.insert(scalar_element(upper_id.clone(), 6, |x| {
            (2.0 * x + 1.83).sin() + x
        }));

        let plan = domain.plan_cycle(&config(1e-8)).unwrap();
        assert_eq!(
            plan.decision(&lower_id).unwrap().decisions.as_slice(),
            &[AmrDecision::Hold]
        );

        domain.apply(&plan).unwrap();
        assert!(domain.element(&parent_id).is_none());
        assert!(domain.element(&lower_id).is_some());
    }

    #[test]
    fn a_dropped_plan_leaves_the_domain_unchanged() {
        let mut domain = Domain::single_block(1);
        let root = ElementId::root(0, 1);
        domain.insert(scalar_element(root.clone(), 4, |x| x * x));

        let before: Vec<ElementId> = domain.element_ids().cloned().collect();
        {
            let _plan = domain.plan_cycle(&config(1e-12)).unwrap();
            // plan dropped without apply: the cycle is aborted
        }
        let after: Vec<ElementId> = domain.element_ids().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(domain.element(&root).unwrap().mesh.dim(0).order(), 4);
    }

    #[test]
    fn an_unestimable_expansion_forces_a_refinement() {
        let mut domain = Domain::single_block(1);
        let root = ElementId::root(0, 1);
        domain.insert(scalar_element(root.clone(), 2, |x| x));

        let plan = domain.plan_cycle(&config(1e-5)).unwrap();
        let element_plan = plan.decision(&root).unwrap();
        assert_eq!(
            element_plan.decisions.as_slice(),
            &[AmrDecision::IncreaseOrder]
        );
        assert!(element_plan
            .notes
            .contains(&AmrNote::ForcedRefinement { axis: 0 }));
    }

    #[test]
    fn an_element_at_both_bounds_reports_unattainable_accuracy() {
        let mut domain = Domain::single_block(1);
        let id = ElementId::new(0, [2], [1]);
        domain.insert(scalar_element(id.clone(), 6, |x| (20.0 * x).tanh()));

        let mut cfg = config(1e-12);
        cfg.max_order = 6;
        cfg.max_level = 2;

        let plan = domain.plan_cycle(&cfg).unwrap();
        let element_plan = plan.decision(&id).unwrap();
        assert_eq!(element_plan.decisions.as_slice(), &[AmrDecision::Hold]);
        assert!(element_plan
            .notes
            .contains(&AmrNote::AccuracyUnattainable { axis: 0 }));
    }

    #[test]
    fn block_coordinates_map_to_physical_space() {
        let block = Block::new(0, [2.0], [4.0]);
        assert_eq!(block.block_to_physical(&[-1.0]), vec![2.0]);
        assert_eq!(block.block_to_physical(&[0.0]), vec![4.0]);
        assert_eq!(block.block_to_physical(&[1.0]), vec![6.0]);
    }
}
