//! Operator kinds, statistics, and internal dispatch.

use crate::cost::CostEvaluator;
use crate::measure::Cost;
use crate::problem::ProblemData;
use serde::{Deserialize, Serialize};

use super::exchange::Exchange;
use super::relocate_with_depot::RelocateWithDepot;
use super::route::NodeId;
use super::solution::WorkingSolution;
use super::swap_routes::SwapRoutes;
use super::swap_star::SwapStar;
use super::swap_tails::SwapTails;

/// Counters kept per operator instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatistics {
    pub num_evaluations: usize,
    pub num_applications: usize,
}

/// The node operators the driver can be equipped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeOperatorKind {
    Exchange10,
    Exchange20,
    Exchange11,
    Exchange21,
    Exchange22,
    Exchange30,
    Exchange31,
    Exchange32,
    Exchange33,
    SwapTails,
    RelocateWithDepot,
}

impl NodeOperatorKind {
    /// All kinds, in the order they are usually registered.
    pub fn all() -> &'static [NodeOperatorKind] {
        use NodeOperatorKind::*;
        &[
            Exchange10, Exchange20, Exchange11, Exchange21, Exchange22, Exchange30, Exchange31,
            Exchange32, Exchange33, SwapTails, RelocateWithDepot,
        ]
    }

    /// Whether this operator's preconditions hold for the given instance.
    pub fn supports(&self, data: &ProblemData) -> bool {
        match self {
            NodeOperatorKind::SwapTails => data.num_vehicles() > 1,
            NodeOperatorKind::RelocateWithDepot => data
                .vehicle_types()
                .iter()
                .any(|veh| !veh.reload_depots.is_empty()),
            _ => true,
        }
    }
}

/// The route operators the driver can be equipped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteOperatorKind {
    SwapStar,
    SwapRoutes,
}

impl RouteOperatorKind {
    pub fn all() -> &'static [RouteOperatorKind] {
        &[RouteOperatorKind::SwapStar, RouteOperatorKind::SwapRoutes]
    }

    pub fn supports(&self, data: &ProblemData) -> bool {
        data.num_vehicles() > 1
    }
}

/// Internal tagged sum over node operator implementations.
#[derive(Debug)]
pub(crate) enum NodeOp {
    Exchange(Exchange),
    SwapTails(SwapTails),
    RelocateWithDepot(RelocateWithDepot),
}

impl NodeOp {
    pub(crate) fn new(kind: NodeOperatorKind) -> Self {
        match kind {
            NodeOperatorKind::Exchange10 => NodeOp::Exchange(Exchange::new(1, 0)),
            NodeOperatorKind::Exchange20 => NodeOp::Exchange(Exchange::new(2, 0)),
            NodeOperatorKind::Exchange11 => NodeOp::Exchange(Exchange::new(1, 1)),
            NodeOperatorKind::Exchange21 => NodeOp::Exchange(Exchange::new(2, 1)),
            NodeOperatorKind::Exchange22 => NodeOp::Exchange(Exchange::new(2, 2)),
            NodeOperatorKind::Exchange30 => NodeOp::Exchange(Exchange::new(3, 0)),
            NodeOperatorKind::Exchange31 => NodeOp::Exchange(Exchange::new(3, 1)),
            NodeOperatorKind::Exchange32 => NodeOp::Exchange(Exchange::new(3, 2)),
            NodeOperatorKind::Exchange33 => NodeOp::Exchange(Exchange::new(3, 3)),
            NodeOperatorKind::SwapTails => NodeOp::SwapTails(SwapTails::new()),
            NodeOperatorKind::RelocateWithDepot => {
                NodeOp::RelocateWithDepot(RelocateWithDepot::new())
            }
        }
    }

    pub(crate) fn kind(&self) -> NodeOperatorKind {
        match self {
            NodeOp::Exchange(op) => op.kind(),
            NodeOp::SwapTails(_) => NodeOperatorKind::SwapTails,
            NodeOp::RelocateWithDepot(_) => NodeOperatorKind::RelocateWithDepot,
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
        match self {
            NodeOp::Exchange(op) => op.evaluate(data, cost_evaluator, solution, u, v),
            NodeOp::SwapTails(op) => op.evaluate(data, cost_evaluator, solution, u, v),
            NodeOp::RelocateWithDepot(op) => op.evaluate(data, cost_evaluator, solution, u, v),
        }
    }

    pub(crate) fn apply(
        &mut self,
        data: &ProblemData,
        solution: &mut WorkingSolution,
        u: NodeId,
        v: NodeId,
    ) {
        match self {
            NodeOp::Exchange(op) => op.apply(data, solution, u, v),
            NodeOp::SwapTails(op) => op.apply(data, solution, u, v),
            NodeOp::RelocateWithDepot(op) => op.apply(data, solution, u, v),
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        match self {
            NodeOp::Exchange(op) => op.statistics(),
            NodeOp::SwapTails(op) => op.statistics(),
            NodeOp::RelocateWithDepot(op) => op.statistics(),
        }
    }
}

/// Internal tagged sum over route operator implementations.
#[derive(Debug)]
pub(crate) enum RouteOp {
    SwapStar(SwapStar),
    SwapRoutes(SwapRoutes),
}

impl RouteOp {
    pub(crate) fn new(kind: RouteOperatorKind) -> Self {
        match kind {
            RouteOperatorKind::SwapStar => RouteOp::SwapStar(SwapStar::new(0.0)),
            RouteOperatorKind::SwapRoutes => RouteOp::SwapRoutes(SwapRoutes::new()),
        }
    }

    pub(crate) fn kind(&self) -> RouteOperatorKind {
        match self {
            RouteOp::SwapStar(_) => RouteOperatorKind::SwapStar,
            RouteOp::SwapRoutes(_) => RouteOperatorKind::SwapRoutes,
        }
    }

    /// Called when the driver loads a new solution.
    pub(crate) fn init(&mut self, num_routes: usize) {
        match self {
            RouteOp::SwapStar(op) => op.init(num_routes),
            RouteOp::SwapRoutes(_) => {}
        }
    }

    /// Called whenever the given route was modified and updated.
    pub(crate) fn update(&mut self, route_idx: usize) {
        match self {
            RouteOp::SwapStar(op) => op.invalidate(route_idx),
            RouteOp::SwapRoutes(_) => {}
        }
    }

    pub(crate) fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        solution: &WorkingSolution,
        route_u: usize,
        route_v: usize,
    ) -> Cost {
        match self {
            RouteOp::SwapStar(op) => op.evaluate(data, cost_evaluator, solution, route_u, route_v),
            RouteOp::SwapRoutes(op) => {
                op.evaluate(data, cost_evaluator, solution, route_u, route_v)
            }
        }
    }

    pub(crate) fn apply(
        &mut self,
        data: &ProblemData,
        solution: &mut WorkingSolution,
        route_u: usize,
        route_v: usize,
    ) {
        match self {
            RouteOp::SwapStar(op) => op.apply(data, solution, route_u, route_v),
            RouteOp::SwapRoutes(op) => op.apply(data, solution, route_u, route_v),
        }
    }

    pub(crate) fn statistics(&self) -> OperatorStatistics {
        match self {
            RouteOp::SwapStar(op) => op.statistics(),
            RouteOp::SwapRoutes(op) => op.statistics(),
        }
    }
}
