//! The local search engine: a driver orchestrating node operators, route
//! operators, and perturbation over a working solution.

pub mod operator;
pub mod perturb;
pub mod route;
pub mod solution;
pub mod space;

mod exchange;
mod primitives;
mod relocate_with_depot;
mod swap_routes;
mod swap_star;
mod swap_tails;

use crate::cost::CostEvaluator;
use crate::error::{Error, Result};
use crate::measure::Cost;
use crate::problem::ProblemData;
use crate::rng::RandomNumberGenerator;
use crate::solution::Solution;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use operator::{NodeOp, NodeOperatorKind, OperatorStatistics, RouteOp, RouteOperatorKind};
use perturb::{PerturbationManager, PerturbationParams};
use primitives::{inplace_cost, remove_cost};
use route::NodeId;
use solution::WorkingSolution;
use space::{Neighbours, SearchSpace};

/// Aggregated move counters of one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Total operator evaluations.
    pub num_moves: usize,
    /// Evaluations that turned into an applied improving move.
    pub num_improving: usize,
    /// Route updates, including non-operator moves such as insertions.
    pub num_updates: usize,
    pub node_operators: Vec<(NodeOperatorKind, OperatorStatistics)>,
    pub route_operators: Vec<(RouteOperatorKind, OperatorStatistics)>,
}

/// The local search driver.
///
/// Holds the working solution, the search space, the operators, and the run's
/// random number generator. A driver must not be shared between concurrent
/// calls; parallel searches each get their own driver over the same
/// [`ProblemData`].
pub struct LocalSearch<'a> {
    data: &'a ProblemData,
    solution: WorkingSolution,
    space: SearchSpace,
    perturbation: PerturbationManager,
    node_ops: Vec<NodeOp>,
    route_ops: Vec<RouteOp>,
    rng: RandomNumberGenerator,
    last_tested_nodes: Vec<i64>,
    last_tested_routes: Vec<i64>,
    last_updated: Vec<i64>,
    num_updates: i64,
    search_completed: bool,
    client_to_same_vehicle: Vec<Vec<usize>>,
    deadline: Option<Instant>,
}

impl<'a> LocalSearch<'a> {
    pub fn new(
        data: &'a ProblemData,
        neighbours: Neighbours,
        params: PerturbationParams,
        seed: u32,
    ) -> Self {
        let mut client_to_same_vehicle = vec![vec![]; data.num_locations()];
        for (group_idx, group) in data.same_vehicle_groups().iter().enumerate() {
            for &client in &group.clients {
                client_to_same_vehicle[client].push(group_idx);
            }
        }

        LocalSearch {
            data,
            solution: WorkingSolution::new(data),
            space: SearchSpace::new(data, neighbours),
            perturbation: PerturbationManager::new(params),
            node_ops: vec![],
            route_ops: vec![],
            rng: RandomNumberGenerator::new(seed),
            last_tested_nodes: vec![-1; data.num_locations()],
            last_tested_routes: vec![-1; data.num_vehicles()],
            last_updated: vec![0; data.num_vehicles()],
            num_updates: 0,
            search_completed: false,
            client_to_same_vehicle,
            deadline: None,
        }
    }

    /// Register a node operator. Fails when the operator's preconditions do
    /// not hold for this instance.
    pub fn add_node_operator(&mut self, kind: NodeOperatorKind) -> Result<()> {
        if !kind.supports(self.data) {
            return Err(Error::UnsupportedOperator(format!("{:?}", kind)));
        }

        self.node_ops.push(NodeOp::new(kind));
        Ok(())
    }

    /// Register a route operator. Fails when the operator's preconditions do
    /// not hold for this instance.
    pub fn add_route_operator(&mut self, kind: RouteOperatorKind) -> Result<()> {
        if !kind.supports(self.data) {
            return Err(Error::UnsupportedOperator(format!("{:?}", kind)));
        }

        self.route_ops.push(RouteOp::new(kind));
        Ok(())
    }

    /// Register every operator whose preconditions hold.
    pub fn add_default_operators(&mut self) {
        for &kind in NodeOperatorKind::all() {
            if kind.supports(self.data) {
                self.node_ops.push(NodeOp::new(kind));
            }
        }

        for &kind in RouteOperatorKind::all() {
            if kind.supports(self.data) {
                self.route_ops.push(RouteOp::new(kind));
            }
        }
    }

    pub fn neighbours(&self) -> &Neighbours {
        self.space.neighbours()
    }

    /// Deadline for cooperative cancellation, checked between passes. On
    /// expiry the best solution found so far is returned.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Reshuffle operator order, perturbation count, and search-space
    /// orderings using the driver's own generator.
    pub fn shuffle(&mut self) {
        self.perturbation.shuffle(&mut self.rng);
        self.space.shuffle(&mut self.rng);
        self.node_ops.shuffle(&mut self.rng);
        self.route_ops.shuffle(&mut self.rng);
    }

    pub fn statistics(&self) -> SearchStatistics {
        let node_operators: Vec<_> = self
            .node_ops
            .iter()
            .map(|op| (op.kind(), op.statistics()))
            .collect();
        let route_operators: Vec<_> = self
            .route_ops
            .iter()
            .map(|op| (op.kind(), op.statistics()))
            .collect();

        let all = node_operators
            .iter()
            .map(|(_, stats)| stats)
            .chain(route_operators.iter().map(|(_, stats)| stats));

        SearchStatistics {
            num_moves: all.clone().map(|stats| stats.num_evaluations).sum(),
            num_improving: all.map(|stats| stats.num_applications).sum(),
            num_updates: self.num_updates as usize,
            node_operators,
            route_operators,
        }
    }

    /// Node-operator pass only; used for initial construction.
    pub fn search(&mut self, solution: &Solution, cost_evaluator: &CostEvaluator) -> Solution {
        self.load_solution(solution);
        self.node_search(cost_evaluator);
        self.solution.unload(self.data)
    }

    /// Route-operator pass only.
    pub fn intensify(&mut self, solution: &Solution, cost_evaluator: &CostEvaluator) -> Solution {
        self.load_solution(solution);
        self.route_intensify(cost_evaluator);
        self.solution.unload(self.data)
    }

    /// Perturb (unless `exhaustive`), then alternate node search and
    /// intensification until a full intensify pass finds no further update.
    pub fn run(
        &mut self,
        solution: &Solution,
        cost_evaluator: &CostEvaluator,
        exhaustive: bool,
    ) -> Solution {
        self.load_solution(solution);

        if !exhaustive {
            self.perturbation.perturb(
                self.data,
                &mut self.solution,
                &mut self.space,
                cost_evaluator,
                &mut self.rng,
            );
        }

        loop {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    tracing::debug!("deadline reached, returning current solution");
                    break;
                }
            }

            self.node_search(cost_evaluator);
            let num_updates = self.num_updates;

            self.route_intensify(cost_evaluator);
            if self.num_updates == num_updates {
                // Intensification found nothing more: locally optimal.
                break;
            }
        }

        tracing::debug!(updates = self.num_updates, "local search converged");
        self.solution.unload(self.data)
    }

    // -- passes ------------------------------------------------------------

    fn load_solution(&mut self, solution: &Solution) {
        self.last_tested_nodes.fill(-1);
        self.last_tested_routes.fill(-1);
        self.last_updated.fill(0);
        self.space.mark_all_promising();
        self.num_updates = 0;

        self.solution.load(self.data, solution);

        let num_routes = self.solution.num_routes();
        for op in &mut self.route_ops {
            op.init(num_routes);
        }
    }

    fn node_search(&mut self, cost_evaluator: &CostEvaluator) {
        if self.node_ops.is_empty() {
            return;
        }

        self.mark_required_missing_promising();

        self.search_completed = false;
        let mut step = 0;
        while !self.search_completed {
            self.search_completed = true;

            // Consume the promising set for this pass; marks made while
            // applying moves accumulate for the next pass.
            let promising = self.space.take_promising();

            for order_idx in 0..self.space.client_order().len() {
                let u_loc = self.space.client_order()[order_idx];
                if !promising.contains(u_loc) {
                    continue;
                }

                let u = self.solution.location_node(u_loc);

                let last_tested = self.last_tested_nodes[u_loc];
                self.last_tested_nodes[u_loc] = self.num_updates;

                // Removal and insertion are only worth retrying when the
                // situation changed since the last test; this also prevents
                // insert/remove oscillation.
                let mut should_test = last_tested == -1;
                if !should_test {
                    if let Some(route_idx) = self.solution.node(u).route() {
                        should_test = self.last_updated[route_idx] > last_tested;
                    }
                }

                if should_test {
                    self.apply_optional_client_moves(u, cost_evaluator);
                }

                self.apply_group_moves(u, cost_evaluator);

                if self.solution.node(u).route().is_none() {
                    continue; // insertion was already evaluated above
                }

                // Collapse reload depots around `u` that no longer pay off.
                if let Some(prev) = self.solution.prev_node(u) {
                    self.apply_depot_removal_move(prev, cost_evaluator);
                }
                if let Some(next) = self.solution.next_node(u) {
                    self.apply_depot_removal_move(next, cost_evaluator);
                }

                let neighbours: Vec<usize> = self.space.neighbours_of(u_loc).to_vec();
                for v_loc in neighbours {
                    let v = self.solution.location_node(v_loc);
                    if self.solution.node(v).route().is_none() {
                        continue;
                    }

                    let Some(route_u) = self.solution.node(u).route() else {
                        break;
                    };
                    let route_v = self.solution.node(v).route().expect("checked above");

                    if self.last_updated[route_u] > last_tested
                        || self.last_updated[route_v] > last_tested
                    {
                        if self.apply_node_ops(u, v, cost_evaluator) {
                            continue;
                        }

                        // Also try against the start depot preceding `v`.
                        if let Some(prev) = self.solution.prev_node(v) {
                            if self.solution.node(prev).idx() == 0
                                && self.apply_node_ops(u, prev, cost_evaluator)
                            {
                                continue;
                            }
                        }
                    }
                }

                // Moves into empty routes cost fixed vehicle cost and are
                // kept out of the first step to avoid opening too many
                // routes.
                if step > 0 && self.solution.node(u).route().is_some() {
                    self.apply_empty_route_moves(u, cost_evaluator);
                }
            }

            step += 1;
        }
    }

    fn route_intensify(&mut self, cost_evaluator: &CostEvaluator) {
        if self.route_ops.is_empty() {
            return;
        }

        self.search_completed = false;
        while !self.search_completed {
            self.search_completed = true;

            for order_idx in 0..self.space.route_order().len() {
                let route_u = self.space.route_order()[order_idx];
                if self.solution.route(route_u).is_empty() {
                    continue;
                }

                let last_tested = self.last_tested_routes[route_u];
                self.last_tested_routes[route_u] = self.num_updates;

                for route_v in route_u + 1..self.solution.num_routes() {
                    if self.solution.route(route_v).is_empty() {
                        continue;
                    }

                    if self.last_updated[route_u] > last_tested
                        || self.last_updated[route_v] > last_tested
                    {
                        self.apply_route_ops(route_u, route_v, cost_evaluator);
                    }
                }
            }
        }
    }

    // -- move application --------------------------------------------------

    fn pair_cost(&self, cost_evaluator: &CostEvaluator, route_u: usize, route_v: usize) -> Cost {
        let cost = primitives::route_cost(self.data, cost_evaluator, self.solution.route(route_u));
        if route_u != route_v {
            cost + primitives::route_cost(self.data, cost_evaluator, self.solution.route(route_v))
        } else {
            cost
        }
    }

    fn apply_node_ops(&mut self, u: NodeId, v: NodeId, cost_evaluator: &CostEvaluator) -> bool {
        let (Some(route_u), Some(route_v)) =
            (self.solution.node(u).route(), self.solution.node(v).route())
        else {
            return false;
        };

        if route_u != route_v
            && (self.would_violate_same_vehicle(u, Some(route_v))
                || self.would_violate_same_vehicle(v, Some(route_u)))
        {
            return false;
        }

        for which in 0..self.node_ops.len() {
            let delta =
                self.node_ops[which].evaluate(self.data, cost_evaluator, &self.solution, u, v);

            if delta < Cost::ZERO {
                #[cfg(debug_assertions)]
                let cost_before = self.pair_cost(cost_evaluator, route_u, route_v);

                self.space.mark_promising(self.solution.node(u).location());
                self.space.mark_promising(self.solution.node(v).location());

                self.node_ops[which].apply(self.data, &mut self.solution, u, v);
                self.update_routes(route_u, route_v);

                // Improving deltas must be exact: this is the safety net for
                // operator implementations.
                #[cfg(debug_assertions)]
                debug_assert_eq!(
                    self.pair_cost(cost_evaluator, route_u, route_v),
                    cost_before + delta
                );

                return true;
            }
        }

        false
    }

    fn apply_route_ops(
        &mut self,
        route_u: usize,
        route_v: usize,
        cost_evaluator: &CostEvaluator,
    ) -> bool {
        for which in 0..self.route_ops.len() {
            let delta = self.route_ops[which].evaluate(
                self.data,
                cost_evaluator,
                &self.solution,
                route_u,
                route_v,
            );

            if delta < Cost::ZERO {
                #[cfg(debug_assertions)]
                let cost_before = self.pair_cost(cost_evaluator, route_u, route_v);

                self.route_ops[which].apply(self.data, &mut self.solution, route_u, route_v);
                self.update_routes(route_u, route_v);

                #[cfg(debug_assertions)]
                debug_assert_eq!(
                    self.pair_cost(cost_evaluator, route_u, route_v),
                    cost_before + delta
                );

                return true;
            }
        }

        false
    }

    fn update_routes(&mut self, route_u: usize, route_v: usize) {
        self.num_updates += 1;
        self.search_completed = false;

        self.solution.update_route(self.data, route_u);
        self.last_updated[route_u] = self.num_updates;

        for op in &mut self.route_ops {
            op.update(route_u);
        }

        if route_u != route_v {
            self.solution.update_route(self.data, route_v);
            self.last_updated[route_v] = self.num_updates;

            for op in &mut self.route_ops {
                op.update(route_v);
            }
        }
    }

    /// Whether moving `u` out of its route towards `target_route` would
    /// strand a same-vehicle group member.
    fn would_violate_same_vehicle(&self, u: NodeId, target_route: Option<usize>) -> bool {
        let u_loc = self.solution.node(u).location();
        let groups = &self.client_to_same_vehicle[u_loc];
        if groups.is_empty() {
            return false;
        }

        let Some(current) = self.solution.node(u).route() else {
            return false;
        };

        if target_route == Some(current) {
            return false;
        }

        // Routes sharing a non-empty vehicle name are shifts of the same
        // physical vehicle, so moving between them is fine.
        if let Some(target) = target_route {
            let current_name = self
                .data
                .vehicle_type(self.solution.route(current).vehicle_type())
                .name
                .as_str();
            let target_name = self
                .data
                .vehicle_type(self.solution.route(target).vehicle_type())
                .name
                .as_str();

            if !current_name.is_empty() && current_name == target_name {
                return false;
            }
        }

        for &group_idx in groups {
            let group = self.data.same_vehicle_group(group_idx);

            for &other in &group.clients {
                if other == u_loc {
                    continue;
                }

                if self.solution.node(other).route() == Some(current) {
                    return true; // would leave a group member behind
                }
            }
        }

        false
    }

    fn apply_depot_removal_move(&mut self, node: NodeId, cost_evaluator: &CostEvaluator) {
        let state = self.solution.node(node);
        let Some(route_idx) = state.route() else {
            return;
        };
        let pos = state.idx();

        if !self
            .solution
            .route(route_idx)
            .is_reload_depot_at(self.data, pos)
        {
            return;
        }

        // Remove when better or neutral; a depot visited back-to-back is
        // neutral but unnecessary.
        let delta = remove_cost(
            self.data,
            cost_evaluator,
            self.solution.route(route_idx),
            pos,
        );

        if delta <= Cost::ZERO {
            self.space.mark_promising(self.solution.node(node).location());

            let (route, nodes) = self.solution.route_and_nodes_mut(route_idx);
            route.remove(pos, nodes);
            self.solution.release_node(node);
            self.update_routes(route_idx, route_idx);
        }
    }

    fn apply_empty_route_moves(&mut self, u: NodeId, cost_evaluator: &CostEvaluator) {
        // Empty routes are tried in the randomised vehicle-type order: a
        // greedy order would over-prioritise low fixed costs over variable
        // costs.
        let order: Vec<(usize, usize)> = self.space.veh_type_order().to_vec();

        for (veh_type, offset) in order {
            let num_available = self.data.vehicle_type(veh_type).num_available;
            let empty = (offset..offset + num_available)
                .find(|&idx| self.solution.route(idx).is_empty());

            if let Some(route_idx) = empty {
                let start = self.solution.route(route_idx).start_node();
                if self.apply_node_ops(u, start, cost_evaluator) {
                    break;
                }
            }
        }
    }

    fn apply_optional_client_moves(&mut self, u: NodeId, cost_evaluator: &CostEvaluator) {
        let u_loc = self.solution.node(u).location();
        let client = self.data.client(u_loc);

        if client.required && self.solution.node(u).route().is_none() {
            // Required clients must be in the solution.
            if self
                .solution
                .insert(self.data, &self.space, cost_evaluator, u, true)
            {
                let route_idx = self.solution.node(u).route().expect("just inserted");
                self.update_routes(route_idx, route_idx);
                self.space.mark_promising(u_loc);
            }
        }

        // Group members are handled by the group moves instead.
        if client.required || client.group.is_some() {
            return;
        }

        if let Some(route_idx) = self.solution.node(u).route() {
            if !self.would_violate_same_vehicle(u, None) {
                let pos = self.solution.node(u).idx();
                let delta = remove_cost(
                    self.data,
                    cost_evaluator,
                    self.solution.route(route_idx),
                    pos,
                );

                if delta < Cost::ZERO {
                    self.space.mark_promising(u_loc);
                    let (route, nodes) = self.solution.route_and_nodes_mut(route_idx);
                    route.remove(pos, nodes);
                    self.update_routes(route_idx, route_idx);
                }
            }
        }

        if self.solution.node(u).route().is_some() {
            return;
        }

        // Try inserting at the best position found over neighbouring and
        // empty routes.
        if self
            .solution
            .insert(self.data, &self.space, cost_evaluator, u, false)
        {
            let route_idx = self.solution.node(u).route().expect("just inserted");
            self.update_routes(route_idx, route_idx);
            self.space.mark_promising(u_loc);
            return;
        }

        // Failing that, try replacing a nearby optional client in place.
        let neighbours: Vec<usize> = self.space.neighbours_of(u_loc).to_vec();
        for v_loc in neighbours {
            let v = self.solution.location_node(v_loc);
            let Some(route_idx) = self.solution.node(v).route() else {
                continue;
            };

            let v_client = self.data.client(v_loc);
            if v_client.required || self.would_violate_same_vehicle(v, None) {
                continue;
            }

            let pos = self.solution.node(v).idx();
            let delta = inplace_cost(
                self.data,
                cost_evaluator,
                self.solution.route(route_idx),
                pos,
                u_loc,
            );

            if delta < Cost::ZERO {
                self.space.mark_promising(v_loc);

                let (route, nodes) = self.solution.route_and_nodes_mut(route_idx);
                route.remove(pos, nodes);
                route.insert(pos, u, nodes);
                self.update_routes(route_idx, route_idx);

                self.space.mark_promising(u_loc);
                return;
            }
        }
    }

    fn apply_group_moves(&mut self, u: NodeId, cost_evaluator: &CostEvaluator) {
        let u_loc = self.solution.node(u).location();
        let Some(group_idx) = self.data.client(u_loc).group else {
            return;
        };

        let group = self.data.group(group_idx);
        debug_assert!(group.mutually_exclusive);

        let in_solution: Vec<usize> = group
            .clients
            .iter()
            .copied()
            .filter(|&client| self.solution.node(client).route().is_some())
            .collect();

        if in_solution.is_empty() {
            if self
                .solution
                .insert(self.data, &self.space, cost_evaluator, u, group.required)
            {
                let route_idx = self.solution.node(u).route().expect("just inserted");
                self.update_routes(route_idx, route_idx);
                self.space.mark_promising(u_loc);
            }

            return;
        }

        // Remove members in order of increasing removal delta (biggest
        // improvement first), keeping the one whose removal is least
        // valuable, then consider swapping `u` with the kept member.
        let mut removals: Vec<(Cost, usize)> = in_solution
            .iter()
            .map(|&client| {
                let state = self.solution.node(client);
                let route = self.solution.route(state.route().expect("filtered above"));
                let delta = remove_cost(self.data, cost_evaluator, route, state.idx());
                (delta, client)
            })
            .collect();
        removals.sort();

        for &(_, client) in &removals[..removals.len() - 1] {
            let state = self.solution.node(client);
            let route_idx = state.route().expect("still routed");
            let pos = state.idx();

            self.space.mark_promising(client);
            let (route, nodes) = self.solution.route_and_nodes_mut(route_idx);
            route.remove(pos, nodes);
            self.update_routes(route_idx, route_idx);
        }

        let kept = removals[removals.len() - 1].1;
        let kept_node = self.solution.location_node(kept);

        if u != kept_node {
            let state = self.solution.node(kept_node);
            let route_idx = state.route().expect("kept member is routed");
            let pos = state.idx();

            let delta = inplace_cost(
                self.data,
                cost_evaluator,
                self.solution.route(route_idx),
                pos,
                u_loc,
            );

            if delta < Cost::ZERO {
                let (route, nodes) = self.solution.route_and_nodes_mut(route_idx);
                route.remove(pos, nodes);
                route.insert(pos, u, nodes);
                self.update_routes(route_idx, route_idx);
                self.space.mark_promising(u_loc);
            }
        }
    }

    fn mark_required_missing_promising(&mut self) {
        for client in self.data.num_depots()..self.data.num_locations() {
            if self.solution.node(client).route().is_some() {
                continue;
            }

            let client_data = self.data.client(client);
            if client_data.required {
                self.space.mark_promising(client);
                continue;
            }

            // For required groups, the first member carries the flag so the
            // group gets inserted at all.
            if let Some(group_idx) = client_data.group {
                let group = self.data.group(group_idx);
                if group.required && group.clients.first() == Some(&client) {
                    self.space.mark_promising(client);
                }
            }
        }
    }
}
