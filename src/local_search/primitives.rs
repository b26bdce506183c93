//! Shared building blocks for move evaluation.
//!
//! Moves are priced by building the proposed visit sequence and running it
//! through the same totals pass as `Route::update`, so the reported delta is
//! exactly the post-move cost minus the pre-move cost.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;
use crate::route_stats::compute_route_stats;
use smallvec::SmallVec;

use super::route::Route;

/// Scratch buffer for proposed visit sequences; spills to the heap only for
/// very long routes.
pub(crate) type Proposal = SmallVec<[usize; 64]>;

/// Penalised cost of a route visiting `locs` with the given vehicle type, or
/// `None` when the sequence is not a legal route shape (unauthorised reload
/// depot, too many trips).
pub(crate) fn sequence_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    veh_type: usize,
    locs: &[usize],
) -> Option<Cost> {
    compute_route_stats(data, veh_type, locs)
        .ok()
        .map(|stats| cost_evaluator.penalised_route_cost(data, veh_type, &stats))
}

/// Current penalised cost of a working route, from its caches.
pub(crate) fn route_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &Route,
) -> Cost {
    cost_evaluator.penalised_route_cost(data, route.vehicle_type(), route.stats())
}

/// Delta cost of a single-route proposal against the current route. Returns
/// zero (no improvement) for illegal shapes.
pub(crate) fn proposal_delta(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &Route,
    proposal: &[usize],
) -> Cost {
    match sequence_cost(data, cost_evaluator, route.vehicle_type(), proposal) {
        Some(cost) => cost - route_cost(data, cost_evaluator, route),
        None => Cost::ZERO,
    }
}

/// Delta cost of a two-route proposal. Returns zero for illegal shapes.
pub(crate) fn two_route_delta(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route_u: &Route,
    proposal_u: &[usize],
    route_v: &Route,
    proposal_v: &[usize],
) -> Cost {
    let cost_u = sequence_cost(data, cost_evaluator, route_u.vehicle_type(), proposal_u);
    let cost_v = sequence_cost(data, cost_evaluator, route_v.vehicle_type(), proposal_v);

    match (cost_u, cost_v) {
        (Some(cost_u), Some(cost_v)) => {
            cost_u + cost_v
                - route_cost(data, cost_evaluator, route_u)
                - route_cost(data, cost_evaluator, route_v)
        }
        _ => Cost::ZERO,
    }
}

/// Cost delta of inserting `location` directly after position `after_pos`.
pub(crate) fn insert_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &Route,
    after_pos: usize,
    location: usize,
) -> Cost {
    debug_assert!(after_pos < route.len() - 1);

    let locs = route.locations();
    let mut proposal = Proposal::new();
    proposal.extend_from_slice(&locs[..=after_pos]);
    proposal.push(location);
    proposal.extend_from_slice(&locs[after_pos + 1..]);

    match sequence_cost(data, cost_evaluator, route.vehicle_type(), &proposal) {
        Some(cost) => cost - route_cost(data, cost_evaluator, route),
        None => Cost::MAX,
    }
}

/// Cost delta of removing the node at `pos`.
pub(crate) fn remove_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &Route,
    pos: usize,
) -> Cost {
    debug_assert!(pos >= 1 && pos < route.len() - 1);

    let locs = route.locations();
    let mut proposal = Proposal::new();
    proposal.extend_from_slice(&locs[..pos]);
    proposal.extend_from_slice(&locs[pos + 1..]);

    proposal_delta(data, cost_evaluator, route, &proposal)
}

/// Cost delta of replacing the client at `pos` with `location`.
pub(crate) fn inplace_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &Route,
    pos: usize,
    location: usize,
) -> Cost {
    debug_assert!(pos >= 1 && pos < route.len() - 1);

    let locs = route.locations();
    let mut proposal = Proposal::new();
    proposal.extend_from_slice(&locs[..pos]);
    proposal.push(location);
    proposal.extend_from_slice(&locs[pos + 1..]);

    proposal_delta(data, cost_evaluator, route, &proposal)
}
