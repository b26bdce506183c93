//! The `Exchange` family: relocate or swap short client segments.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;

use super::operator::{NodeOperatorKind, OperatorStatistics};
use super::primitives::{proposal_delta, two_route_delta, Proposal};
use super::route::NodeId;
use super::solution::WorkingSolution;

/// Moves a segment of `n` consecutive clients starting at `U`. With `m == 0`
/// the segment is relocated to directly after `V`; otherwise it is swapped
/// with the `m`-client segment starting at `V`.
#[derive(Debug)]
pub(crate) struct Exchange {
    n: usize,
    m: usize,
    stats: OperatorStatistics,
}

impl Exchange {
    pub(crate) fn new(n: usize, m: usize) -> Self {
        debug_assert!(n >= 1 && n >= m);
        Exchange {
            n,
            m,
            stats: OperatorStatistics::default(),
        }
    }

    pub(crate) fn kind(&self) -> NodeOperatorKind {
        use NodeOperatorKind::*;
        match (self.n, self.m) {
            (1, 0) => Exchange10,
            (2, 0) => Exchange20,
            (1, 1) => Exchange11,
            (2, 1) => Exchange21,
            (2, 2) => Exchange22,
            (3, 0) => Exchange30,
            (3, 1) => Exchange31,
            (3, 2) => Exchange32,
            (3, 3) => Exchange33,
            _ => unreachable!("unsupported exchange size"),
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        self.stats
    }

    /// Whether the move applies at all, from the nodes' current positions.
    fn guard(
        &self,
        data: &ProblemData,
        solution: &WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) -> Option<(usize, usize, usize, usize)> {
        let nu = solution.node(u);
        let nv = solution.node(v);
        let route_u = nu.route()?;
        let route_v = nv.route()?;

        let ru = solution.route(route_u);
        let rv = solution.route(route_v);
        let pu = nu.idx();
        let pv = nv.idx();

        // The moved segment must consist of clients only.
        if pu == 0 || pu + self.n > ru.len() - 1 {
            return None;
        }

        for pos in pu..pu + self.n {
            if ru.is_depot_at(data, pos) {
                return None;
            }
        }

        if self.m == 0 {
            // `V` anchors the insertion and may be any node but the end depot.
            if pv >= rv.len() - 1 {
                return None;
            }

            // Same route: skip no-ops and anchors inside the moved segment.
            if route_u == route_v && pv + 1 >= pu && pv < pu + self.n {
                return None;
            }
        } else {
            if pv == 0 || pv + self.m > rv.len() - 1 {
                return None;
            }

            for pos in pv..pv + self.m {
                if rv.is_depot_at(data, pos) {
                    return None;
                }
            }

            if route_u == route_v {
                // Segments must not overlap; equal positions are a no-op.
                let disjoint = pu + self.n <= pv || pv + self.m <= pu;
                if !disjoint {
                    return None;
                }
            }
        }

        Some((route_u, pu, route_v, pv))
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

        let Some((route_u, pu, route_v, pv)) = self.guard(data, solution, u, v) else {
            return Cost::ZERO;
        };

        let ru = solution.route(route_u);
        let rv = solution.route(route_v);

        if route_u == route_v {
            let seq = ru.locations();
            let proposal = if self.m == 0 {
                relocate_within(seq, pu, self.n, pv)
            } else {
                swap_within(seq, pu, self.n, pv, self.m)
            };

            proposal_delta(data, cost_evaluator, ru, &proposal)
        } else {
            let seq_u = ru.locations();
            let seq_v = rv.locations();

            let (proposal_u, proposal_v) = if self.m == 0 {
                (
                    without_range(seq_u, pu, self.n),
                    with_insertion(seq_v, pv, &seq_u[pu..pu + self.n]),
                )
            } else {
                (
                    with_replacement(seq_u, pu, self.n, &seq_v[pv..pv + self.m]),
                    with_replacement(seq_v, pv, self.m, &seq_u[pu..pu + self.n]),
                )
            };

            two_route_delta(data, cost_evaluator, ru, &proposal_u, rv, &proposal_v)
        }
    }

    pub(crate) fn apply(
        &mut self,
        data: &ProblemData,
        solution: &mut WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) {
        self.stats.num_applications += 1;

        let (route_u, pu, route_v, pv) = self
            .guard(data, solution, u, v)
            .expect("apply mirrors a successful evaluation");

        if route_u == route_v {
            let seq = solution.route(route_u).nodes().to_vec();
            let new = if self.m == 0 {
                relocate_within(&seq, pu, self.n, pv)
            } else {
                swap_within(&seq, pu, self.n, pv, self.m)
            };

            solution.rebuild_route(route_u, &new[1..new.len() - 1]);
        } else {
            let seq_u = solution.route(route_u).nodes().to_vec();
            let seq_v = solution.route(route_v).nodes().to_vec();

            let (new_u, new_v) = if self.m == 0 {
                (
                    without_range(&seq_u, pu, self.n),
                    with_insertion(&seq_v, pv, &seq_u[pu..pu + self.n]),
                )
            } else {
                (
                    with_replacement(&seq_u, pu, self.n, &seq_v[pv..pv + self.m]),
                    with_replacement(&seq_v, pv, self.m, &seq_u[pu..pu + self.n]),
                )
            };

            solution.rebuild_two_routes(
                route_u,
                &new_u[1..new_u.len() - 1],
                route_v,
                &new_v[1..new_v.len() - 1],
            );
        }
    }
}

/// `seq` with the `count` elements at `start` moved to directly after the
/// element at `anchor`. The anchor must lie outside the moved range.
pub(crate) fn relocate_within(
    seq: &[usize],
    start: usize,
    count: usize,
    anchor: usize,
) -> Proposal {
    debug_assert!(anchor < start || anchor >= start + count);

    let mut out = Proposal::new();
    for (idx, &item) in seq.iter().enumerate() {
        if idx >= start && idx < start + count {
            continue;
        }

        out.push(item);

        if idx == anchor {
            out.extend_from_slice(&seq[start..start + count]);
        }
    }

    out
}

/// `seq` with the disjoint ranges `[pu, pu + n)` and `[pv, pv + m)` swapped.
pub(crate) fn swap_within(seq: &[usize], pu: usize, n: usize, pv: usize, m: usize) -> Proposal {
    let (first, first_len, second, second_len) = if pu < pv {
        (pu, n, pv, m)
    } else {
        (pv, m, pu, n)
    };
    debug_assert!(first + first_len <= second);

    let mut out = Proposal::new();
    out.extend_from_slice(&seq[..first]);
    out.extend_from_slice(&seq[second..second + second_len]);
    out.extend_from_slice(&seq[first + first_len..second]);
    out.extend_from_slice(&seq[first..first + first_len]);
    out.extend_from_slice(&seq[second + second_len..]);
    out
}

/// `seq` without the `count` elements at `start`.
pub(crate) fn without_range(seq: &[usize], start: usize, count: usize) -> Proposal {
    let mut out = Proposal::new();
    out.extend_from_slice(&seq[..start]);
    out.extend_from_slice(&seq[start + count..]);
    out
}

/// `seq` with `items` inserted directly after position `anchor`.
pub(crate) fn with_insertion(seq: &[usize], anchor: usize, items: &[usize]) -> Proposal {
    let mut out = Proposal::new();
    out.extend_from_slice(&seq[..=anchor]);
    out.extend_from_slice(items);
    out.extend_from_slice(&seq[anchor + 1..]);
    out
}

/// `seq` with the `count` elements at `start` replaced by `items`.
pub(crate) fn with_replacement(
    seq: &[usize],
    start: usize,
    count: usize,
    items: &[usize],
) -> Proposal {
    let mut out = Proposal::new();
    out.extend_from_slice(&seq[..start]);
    out.extend_from_slice(items);
    out.extend_from_slice(&seq[start + count..]);
    out
}
