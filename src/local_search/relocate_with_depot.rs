//! Relocate a client together with a fresh reload depot.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;

use super::operator::OperatorStatistics;
use super::primitives::{proposal_delta, two_route_delta, Proposal};
use super::route::NodeId;
use super::solution::WorkingSolution;

/// Moves client `U` to directly after `V`, inserting a new trip delimiter
/// either just before or just after `U`. Worthwhile when a route has spare
/// trips but no spare capacity in the trip around `V`.
#[derive(Debug)]
pub(crate) struct RelocateWithDepot {
    stats: OperatorStatistics,
    /// Whether the depot goes before the client in the planned move.
    depot_first: bool,
}

impl RelocateWithDepot {
    pub(crate) fn new() -> Self {
        RelocateWithDepot {
            stats: OperatorStatistics::default(),
            depot_first: true,
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        self.stats
    }

    fn guard(
        &self,
        data: &ProblemData,
        solution: &WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) -> Option<(usize, usize, usize, usize, usize)> {
        if u == v {
            return None;
        }

        let nu = solution.node(u);
        let nv = solution.node(v);
        let route_u = nu.route()?;
        let route_v = nv.route()?;

        if data.is_depot(nu.location()) {
            return None;
        }

        let rv = solution.route(route_v);
        let veh = data.vehicle_type(rv.vehicle_type());
        let depot_loc = *veh.reload_depots.first()?;

        if rv.num_trips() >= veh.max_trips() {
            return None;
        }

        let pu = nu.idx();
        let pv = nv.idx();

        if pv >= rv.len() - 1 {
            return None; // cannot insert after the end depot
        }

        Some((route_u, pu, route_v, pv, depot_loc))
    }

    fn proposals(
        seq_u: &[usize],
        pu: usize,
        seq_v: &[usize],
        pv: usize,
        moved: usize,
        depot: usize,
        depot_first: bool,
        same_route: bool,
    ) -> (Proposal, Proposal) {
        let pair = if depot_first {
            [depot, moved]
        } else {
            [moved, depot]
        };

        if same_route {
            let mut out = Proposal::new();
            for (idx, &item) in seq_u.iter().enumerate() {
                if idx != pu {
                    out.push(item);
                }
                if idx == pv {
                    out.extend_from_slice(&pair);
                }
            }
            (out, Proposal::new())
        } else {
            let mut out_u = Proposal::new();
            out_u.extend_from_slice(&seq_u[..pu]);
            out_u.extend_from_slice(&seq_u[pu + 1..]);

            let mut out_v = Proposal::new();
            out_v.extend_from_slice(&seq_v[..=pv]);
            out_v.extend_from_slice(&pair);
            out_v.extend_from_slice(&seq_v[pv + 1..]);

            (out_u, out_v)
        }
    }

    pub(crate) fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        solution: &WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) -> Cost {
        self.stats.num_evaluations += 1;

        let Some((route_u, pu, route_v, pv, depot_loc)) = self.guard(data, solution, u, v) else {
            return Cost::ZERO;
        };

        let ru = solution.route(route_u);
        let rv = solution.route(route_v);
        let u_loc = solution.node(u).location();
        let same_route = route_u == route_v;

        if same_route && pv == pu {
            return Cost::ZERO;
        }

        let mut best = Cost::ZERO;

        for depot_first in [true, false] {
            let (proposal_u, proposal_v) = Self::proposals(
                ru.locations(),
                pu,
                rv.locations(),
                pv,
                u_loc,
                depot_loc,
                depot_first,
                same_route,
            );

            let delta = if same_route {
                proposal_delta(data, cost_evaluator, ru, &proposal_u)
            } else {
                two_route_delta(data, cost_evaluator, ru, &proposal_u, rv, &proposal_v)
            };

            if delta < best {
                best = delta;
                self.depot_first = depot_first;
            }
        }

        best
    }

    pub(crate) fn apply(
        &mut self,
        data: &ProblemData,
        solution: &mut WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) {
        self.stats.num_applications += 1;

        let (route_u, pu, route_v, pv, depot_loc) = self
            .guard(data, solution, u, v)
            .expect("apply mirrors a successful evaluation");

        let depot = solution.alloc_reload_node(depot_loc);
        let same_route = route_u == route_v;

        let seq_u = solution.route(route_u).nodes().to_vec();
        let seq_v = solution.route(route_v).nodes().to_vec();

        let (new_u, new_v) = Self::proposals(
            &seq_u,
            pu,
            &seq_v,
            pv,
            u,
            depot,
            self.depot_first,
            same_route,
        );

        if same_route {
            solution.rebuild_route(route_u, &new_u[1..new_u.len() - 1]);
        } else {
            solution.rebuild_two_routes(
                route_u,
                &new_u[1..new_u.len() - 1],
                route_v,
                &new_v[1..new_v.len() - 1],
            );
        }
    }
}
