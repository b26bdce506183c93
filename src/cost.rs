//! Penalised and exact cost evaluation.

use crate::error::{Error, Result};
use crate::measure::{Cost, Load};
use crate::problem::ProblemData;
use crate::route_stats::RouteStats;
use crate::solution::Solution;
use serde::{Deserialize, Serialize};

/// Turns route state into a comparable scalar. Infeasibilities (excess load,
/// time warp, excess distance) are penalised at the configured rates so the
/// search can wander through infeasible space while being pulled back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEvaluator {
    load_penalties: Vec<Cost>,
    tw_penalty: Cost,
    dist_penalty: Cost,
}

impl CostEvaluator {
    /// Create an evaluator with the given penalty rates. All rates must be
    /// non-negative.
    pub fn new(load_penalties: Vec<Cost>, tw_penalty: Cost, dist_penalty: Cost) -> Result<Self> {
        if load_penalties.iter().any(|&pen| pen < Cost::ZERO) {
            return Err(Error::InvalidPenalty("negative load penalty".into()));
        }

        if tw_penalty < Cost::ZERO {
            return Err(Error::InvalidPenalty("negative time warp penalty".into()));
        }

        if dist_penalty < Cost::ZERO {
            return Err(Error::InvalidPenalty("negative distance penalty".into()));
        }

        Ok(CostEvaluator {
            load_penalties,
            tw_penalty,
            dist_penalty,
        })
    }

    pub fn load_penalties(&self) -> &[Cost] {
        &self.load_penalties
    }

    pub fn tw_penalty(&self) -> Cost {
        self.tw_penalty
    }

    pub fn dist_penalty(&self) -> Cost {
        self.dist_penalty
    }

    /// The penalty incurred by the given excess load, per dimension.
    pub fn load_penalty(&self, dim: usize, excess: Load) -> Cost {
        excess.cost(self.load_penalties.get(dim).copied().unwrap_or(Cost::ZERO))
    }

    /// Penalised cost of a route with the given totals, for a vehicle of the
    /// given type. Empty routes cost nothing.
    pub fn penalised_route_cost(
        &self,
        data: &ProblemData,
        veh_type: usize,
        stats: &RouteStats,
    ) -> Cost {
        if stats.num_clients == 0 {
            return Cost::ZERO;
        }

        let veh = data.vehicle_type(veh_type);

        let mut cost = veh.fixed_cost
            + stats.distance.cost(veh.unit_distance_cost)
            + stats.duration.cost(veh.unit_duration_cost)
            + stats.overtime.cost(veh.unit_overtime_cost)
            + stats.time_warp.cost(self.tw_penalty)
            + stats.excess_distance.cost(self.dist_penalty)
            + stats.reload_costs
            - stats.prizes;

        for (dim, &excess) in stats.excess_load.iter().enumerate() {
            cost += self.load_penalty(dim, excess);
        }

        cost
    }

    /// Penalised cost of a complete solution; always finite.
    pub fn penalised_cost(&self, data: &ProblemData, solution: &Solution) -> Cost {
        solution
            .routes()
            .iter()
            .map(|route| self.penalised_route_cost(data, route.vehicle_type(), route.stats()))
            .sum()
    }

    /// Exact cost of a feasible, complete solution; `Cost::MAX` otherwise.
    pub fn cost(&self, data: &ProblemData, solution: &Solution) -> Cost {
        if solution.is_feasible() && solution.is_complete(data) {
            self.penalised_cost(data, solution)
        } else {
            Cost::MAX
        }
    }
}
