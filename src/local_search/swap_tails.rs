//! Swap the suffixes of two routes.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;

use super::operator::OperatorStatistics;
use super::primitives::{two_route_delta, Proposal};
use super::route::NodeId;
use super::solution::WorkingSolution;

/// Given `U` and `V` in different routes, moves everything after `U` to
/// follow `V` and vice versa. The end depots stay with their own routes.
#[derive(Debug)]
pub(crate) struct SwapTails {
    stats: OperatorStatistics,
}

impl SwapTails {
    pub(crate) fn new() -> Self {
        SwapTails {
            stats: OperatorStatistics::default(),
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        self.stats
    }

    fn guard(
        &self,
        solution: &WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) -> Option<(usize, usize, usize, usize)> {
        let nu = solution.node(u);
        let nv = solution.node(v);
        let route_u = nu.route()?;
        let route_v = nv.route()?;

        if route_u == route_v {
            return None;
        }

        let pu = nu.idx();
        let pv = nv.idx();

        // Anything after the ends would be an empty-for-empty swap.
        if pu >= solution.route(route_u).len() - 1 || pv >= solution.route(route_v).len() - 1 {
            return None;
        }

        let tail_u = solution.route(route_u).len() - 1 - (pu + 1);
        let tail_v = solution.route(route_v).len() - 1 - (pv + 1);
        if tail_u == 0 && tail_v == 0 {
            return None;
        }

        Some((route_u, pu, route_v, pv))
    }

    fn proposals(
        seq_u: &[usize],
        pu: usize,
        seq_v: &[usize],
        pv: usize,
    ) -> (Proposal, Proposal) {
        let mut out_u = Proposal::new();
        out_u.extend_from_slice(&seq_u[..=pu]);
        out_u.extend_from_slice(&seq_v[pv + 1..seq_v.len() - 1]);
        out_u.push(seq_u[seq_u.len() - 1]);

        let mut out_v = Proposal::new();
        out_v.extend_from_slice(&seq_v[..=pv]);
        out_v.extend_from_slice(&seq_u[pu + 1..seq_u.len() - 1]);
        out_v.push(seq_v[seq_v.len() - 1]);

        (out_u, out_v)
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

        let Some((route_u, pu, route_v, pv)) = self.guard(solution, u, v) else {
            return Cost::ZERO;
        };

        let ru = solution.route(route_u);
        let rv = solution.route(route_v);

        let (proposal_u, proposal_v) = Self::proposals(ru.locations(), pu, rv.locations(), pv);
        two_route_delta(data, cost_evaluator, ru, &proposal_u, rv, &proposal_v)
    }

    pub(crate) fn apply(
        &mut self,
        _data: &ProblemData,
        solution: &mut WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) {
        self.stats.num_applications += 1;

        let (route_u, pu, route_v, pv) = self
            .guard(solution, u, v)
            .expect("apply mirrors a successful evaluation");

        let seq_u = solution.route(route_u).nodes().to_vec();
        let seq_v = solution.route(route_v).nodes().to_vec();

        let (new_u, new_v) = Self::proposals(&seq_u, pu, &seq_v, pv);
        solution.rebuild_two_routes(
            route_u,
            &new_u[1..new_u.len() - 1],
            route_v,
            &new_v[1..new_v.len() - 1],
        );
    }
}
