//! Swap the full client sequences of two routes.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;

use super::operator::OperatorStatistics;
use super::primitives::{two_route_delta, Proposal};
use super::solution::WorkingSolution;

/// Exchanges the entire visit sequences of two routes while the vehicles stay
/// put. Only pays off with heterogeneous fleets, where another vehicle may
/// serve the same sequence more cheaply.
#[derive(Debug)]
pub(crate) struct SwapRoutes {
    stats: OperatorStatistics,
}

impl SwapRoutes {
    pub(crate) fn new() -> Self {
        SwapRoutes {
            stats: OperatorStatistics::default(),
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        self.stats
    }

    fn proposals(seq_u: &[usize], seq_v: &[usize]) -> (Proposal, Proposal) {
        let mut out_u = Proposal::new();
        out_u.push(seq_u[0]);
        out_u.extend_from_slice(&seq_v[1..seq_v.len() - 1]);
        out_u.push(seq_u[seq_u.len() - 1]);

        let mut out_v = Proposal::new();
        out_v.push(seq_v[0]);
        out_v.extend_from_slice(&seq_u[1..seq_u.len() - 1]);
        out_v.push(seq_v[seq_v.len() - 1]);

        (out_u, out_v)
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

        let ru = solution.route(route_u);
        let rv = solution.route(route_v);

        // Identical vehicles make this a no-op.
        if ru.vehicle_type() == rv.vehicle_type() {
            return Cost::ZERO;
        }

        let (proposal_u, proposal_v) = Self::proposals(ru.locations(), rv.locations());
        two_route_delta(data, cost_evaluator, ru, &proposal_u, rv, &proposal_v)
    }

    pub(crate) fn apply(
        &mut self,
        _data: &ProblemData,
        solution: &mut WorkingSolution,
        route_u: usize,
        route_v: usize,
    ) {
        self.stats.num_applications += 1;

        let seq_u = solution.route(route_u).nodes().to_vec();
        let seq_v = solution.route(route_v).nodes().to_vec();

        let (new_u, new_v) = Self::proposals(&seq_u, &seq_v);
        solution.rebuild_two_routes(
            route_u,
            &new_u[1..new_u.len() - 1],
            route_v,
            &new_v[1..new_v.len() - 1],
        );
    }
}
