//! Randomised perturbation between improvement passes.

use crate::cost::CostEvaluator;
use crate::problem::ProblemData;
use crate::rng::RandomNumberGenerator;
use serde::{Deserialize, Serialize};

use super::solution::WorkingSolution;
use super::space::SearchSpace;

/// Bounds on the number of random moves applied per perturbation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerturbationParams {
    pub min_perturbations: usize,
    pub max_perturbations: usize,
}

impl Default for PerturbationParams {
    fn default() -> Self {
        PerturbationParams {
            min_perturbations: 1,
            max_perturbations: 25,
        }
    }
}

/// Applies random destroy and insert moves to escape local optima. The moves
/// need not improve; the subsequent search pass cleans up.
#[derive(Debug)]
pub struct PerturbationManager {
    params: PerturbationParams,
    num_perturbations: usize,
}

impl PerturbationManager {
    pub fn new(params: PerturbationParams) -> Self {
        PerturbationManager {
            num_perturbations: params.min_perturbations,
            params,
        }
    }

    /// Draw the number of moves for the next `perturb` call.
    pub fn shuffle(&mut self, rng: &mut RandomNumberGenerator) {
        let span = self.params.max_perturbations - self.params.min_perturbations + 1;
        self.num_perturbations =
            self.params.min_perturbations + rng.randint(span as u32) as usize;
    }

    /// Apply the drawn number of random moves to the working solution. Each
    /// move either removes a random routed client or inserts a random
    /// unassigned one at its best position. Touched clients are marked
    /// promising so the next pass revisits them.
    pub(crate) fn perturb(
        &self,
        data: &ProblemData,
        solution: &mut WorkingSolution,
        space: &mut SearchSpace,
        cost_evaluator: &CostEvaluator,
        rng: &mut RandomNumberGenerator,
    ) {
        let num_clients = data.num_clients();
        if num_clients == 0 {
            return;
        }

        tracing::debug!(moves = self.num_perturbations, "perturbing solution");

        for _ in 0..self.num_perturbations {
            let client = data.num_depots() + rng.randint(num_clients as u32) as usize;
            let node = solution.location_node(client);

            if let Some(route_idx) = solution.node(node).route() {
                let pos = solution.node(node).idx();
                let (route, nodes) = solution.route_and_nodes_mut(route_idx);
                route.remove(pos, nodes);
                solution.update_route(data, route_idx);
                space.mark_promising(client);
            } else {
                // Members of mutually-exclusive groups are left to the
                // dedicated group moves.
                if data.client(client).group.is_some() {
                    continue;
                }

                if solution.insert(data, space, cost_evaluator, node, true) {
                    let route_idx = solution
                        .node(node)
                        .route()
                        .expect("insert placed the node");
                    solution.update_route(data, route_idx);
                    space.mark_promising(client);
                }
            }
        }
    }
}
