//! SWAP* : exchange two clients between routes, each re-inserted at its best
//! position in the other route.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;
use smallvec::SmallVec;
use std::collections::HashMap;

use super::operator::OperatorStatistics;
use super::primitives::{insert_cost, remove_cost, two_route_delta, Proposal};
use super::route::Route;
use super::solution::WorkingSolution;

/// Best insertion anchors of one client in one route, cheapest first.
type TopAnchors = SmallVec<[(usize, Cost); 3]>;

#[derive(Debug, Clone, Copy)]
struct PlannedSwap {
    route_u: usize,
    pos_u: usize,
    route_v: usize,
    pos_v: usize,
    anchor_u_in_v: usize,
    anchor_v_in_u: usize,
}

/// The SWAP* neighbourhood of Vidal et al., with polar-sector pruning and a
/// per-route memo of the three best insertion anchors per client.
#[derive(Debug)]
pub(crate) struct SwapStar {
    overlap_tolerance: f64,
    stats: OperatorStatistics,
    route_version: Vec<u64>,
    cache: HashMap<(usize, usize), (u64, TopAnchors)>,
    planned: Option<PlannedSwap>,
}

impl SwapStar {
    pub(crate) fn new(overlap_tolerance: f64) -> Self {
        SwapStar {
            overlap_tolerance,
            stats: OperatorStatistics::default(),
            route_version: vec![],
            cache: HashMap::new(),
            planned: None,
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        self.stats
    }

    pub(crate) fn init(&mut self, num_routes: usize) {
        self.route_version = vec![0; num_routes];
        self.cache.clear();
        self.planned = None;
    }

    /// Drop memoised anchors for a route that was modified.
    pub(crate) fn invalidate(&mut self, route_idx: usize) {
        if let Some(version) = self.route_version.get_mut(route_idx) {
            *version += 1;
        }
    }

    fn top_anchors(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        route: &Route,
        location: usize,
    ) -> TopAnchors {
        let key = (location, route.idx());
        let version = self.route_version[route.idx()];

        if let Some((cached_version, anchors)) = self.cache.get(&key) {
            if *cached_version == version {
                return anchors.clone();
            }
        }

        let mut anchors = TopAnchors::new();
        for anchor in 0..route.len() - 1 {
            let cost = insert_cost(data, cost_evaluator, route, anchor, location);

            let at = anchors.partition_point(|&(_, c)| c <= cost);
            if at < 3 {
                anchors.insert(at, (anchor, cost));
                anchors.truncate(3);
            }
        }

        self.cache.insert(key, (version, anchors.clone()));
        anchors
    }

    pub(crate) fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        solution: &WorkingSolution,
        route_u: usize,
        route_v: usize,
    ) -> Cost {
        self.stats.num_evaluations += 1;
        self.planned = None;

        let ru = solution.route(route_u);
        let rv = solution.route(route_v);

        if !ru.overlaps_with(rv, self.overlap_tolerance) {
            return Cost::ZERO;
        }

        // Pick the most promising pair by an anchor-based estimate, then
        // price that single candidate exactly.
        let mut best_estimate = Cost::ZERO;
        let mut candidate: Option<PlannedSwap> = None;

        for pos_u in 1..ru.len() - 1 {
            if ru.is_depot_at(data, pos_u) {
                continue;
            }

            let u_loc = ru.location_at(pos_u);
            let removal_u = remove_cost(data, cost_evaluator, ru, pos_u);
            let anchors_u = self.top_anchors(data, cost_evaluator, rv, u_loc);

            for pos_v in 1..rv.len() - 1 {
                if rv.is_depot_at(data, pos_v) {
                    continue;
                }

                let v_loc = rv.location_at(pos_v);
                let removal_v = remove_cost(data, cost_evaluator, rv, pos_v);
                let anchors_v = self.top_anchors(data, cost_evaluator, ru, v_loc);

                // Insertion anchors for `u` in `rv`: the memoised best three,
                // plus taking over `v`'s spot.
                let best_u = anchors_u
                    .iter()
                    .copied()
                    .chain(std::iter::once((
                        pos_v,
                        insert_cost(data, cost_evaluator, rv, pos_v, u_loc),
                    )))
                    .min_by_key(|&(_, cost)| cost);

                let best_v = anchors_v
                    .iter()
                    .copied()
                    .chain(std::iter::once((
                        pos_u,
                        insert_cost(data, cost_evaluator, ru, pos_u, v_loc),
                    )))
                    .min_by_key(|&(_, cost)| cost);

                let (Some((anchor_u, cost_u)), Some((anchor_v, cost_v))) = (best_u, best_v)
                else {
                    continue;
                };

                let estimate = removal_u + removal_v + cost_u + cost_v;
                if estimate < best_estimate {
                    best_estimate = estimate;
                    candidate = Some(PlannedSwap {
                        route_u,
                        pos_u,
                        route_v,
                        pos_v,
                        anchor_u_in_v: anchor_u,
                        anchor_v_in_u: anchor_v,
                    });
                }
            }
        }

        let Some(plan) = candidate else {
            return Cost::ZERO;
        };

        let (proposal_u, proposal_v) =
            Self::proposals(ru.locations(), rv.locations(), &plan, |route, pos| {
                let which = if route == 0 { ru } else { rv };
                which.location_at(pos)
            });

        let delta = two_route_delta(data, cost_evaluator, ru, &proposal_u, rv, &proposal_v);
        if delta < Cost::ZERO {
            self.planned = Some(plan);
        }

        delta
    }

    /// Build both proposed sequences for the planned swap. `item` resolves a
    /// (route tag, position) to the element to move, so the same shape works
    /// for locations and node ids.
    fn proposals(
        seq_u: &[usize],
        seq_v: &[usize],
        plan: &PlannedSwap,
        item: impl Fn(usize, usize) -> usize,
    ) -> (Proposal, Proposal) {
        let moved_u = item(0, plan.pos_u);
        let moved_v = item(1, plan.pos_v);

        // `u` leaves its route and `v` takes the planned anchor in it.
        let mut out_u = Proposal::new();
        for (idx, &elem) in seq_u.iter().enumerate() {
            if idx != plan.pos_u {
                out_u.push(elem);
            }
            if idx == plan.anchor_v_in_u && plan.anchor_v_in_u != plan.pos_u {
                out_u.push(moved_v);
            }
        }
        if plan.anchor_v_in_u == plan.pos_u {
            // Taking over the removed client's spot directly.
            out_u.insert(plan.pos_u, moved_v);
        }

        let mut out_v = Proposal::new();
        for (idx, &elem) in seq_v.iter().enumerate() {
            if idx != plan.pos_v {
                out_v.push(elem);
            }
            if idx == plan.anchor_u_in_v && plan.anchor_u_in_v != plan.pos_v {
                out_v.push(moved_u);
            }
        }
        if plan.anchor_u_in_v == plan.pos_v {
            out_v.insert(plan.pos_v, moved_u);
        }

        (out_u, out_v)
    }

    pub(crate) fn apply(
        &mut self,
        _data: &ProblemData,
        solution: &mut WorkingSolution,
        route_u: usize,
        route_v: usize,
    ) {
        self.stats.num_applications += 1;

        let plan = self.planned.take().expect("apply follows an improving evaluation");
        debug_assert_eq!(plan.route_u, route_u);
        debug_assert_eq!(plan.route_v, route_v);

        let seq_u = solution.route(route_u).nodes().to_vec();
        let seq_v = solution.route(route_v).nodes().to_vec();

        let (new_u, new_v) = Self::proposals(&seq_u, &seq_v, &plan, |route, pos| {
            if route == 0 {
                seq_u[pos]
            } else {
                seq_v[pos]
            }
        });

        solution.rebuild_two_routes(
            route_u,
            &new_u[1..new_u.len() - 1],
            route_v,
            &new_v[1..new_v.len() - 1],
        );
    }
}
