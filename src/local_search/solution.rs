//! The mutable solution the search operates on.
//!
//! Nodes live in an arena: one permanent node per location, two depot
//! sentinels per route, and a free list of ephemeral nodes for reload depots
//! inserted and removed as trip delimiters.

use crate::cost::CostEvaluator;
use crate::measure::{Cost, Duration};
use crate::problem::ProblemData;
use crate::solution::{Route as SolutionRoute, Solution, Trip};

use super::primitives::{insert_cost, route_cost};
use super::route::{Node, NodeId, Route};
use super::space::SearchSpace;

/// Working counterpart of an immutable [`Solution`], owning the node arena
/// and one route per vehicle slot. Routes of the same vehicle type occupy
/// contiguous slots.
#[derive(Debug)]
pub struct WorkingSolution {
    nodes: Vec<Node>,
    routes: Vec<Route>,
    num_locations: usize,
    ephemeral_base: usize,
    free: Vec<NodeId>,
}

impl WorkingSolution {
    pub fn new(data: &ProblemData) -> Self {
        let num_locations = data.num_locations();

        let mut nodes: Vec<Node> = (0..num_locations).map(Node::new).collect();
        let mut routes = Vec::with_capacity(data.num_vehicles());

        for (veh_type, veh) in data.vehicle_types().iter().enumerate() {
            for _ in 0..veh.num_available {
                let start = nodes.len();
                nodes.push(Node::new(veh.start_depot));
                let end = nodes.len();
                nodes.push(Node::new(veh.end_depot));

                let idx = routes.len();
                routes.push(Route::new(data, idx, veh_type, start, end, &mut nodes));
            }
        }

        let ephemeral_base = nodes.len();

        WorkingSolution {
            nodes,
            routes,
            num_locations,
            ephemeral_base,
            free: vec![],
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node]
    }

    /// The permanent node of a location. For clients this is the node moved
    /// around by the operators.
    pub fn location_node(&self, location: usize) -> NodeId {
        debug_assert!(location < self.num_locations);
        location
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, idx: usize) -> &Route {
        &self.routes[idx]
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Predecessor of the given routed node.
    pub fn prev_node(&self, node: NodeId) -> Option<NodeId> {
        let state = &self.nodes[node];
        let route = &self.routes[state.route()?];
        (state.idx() > 0).then(|| route.node_at(state.idx() - 1))
    }

    /// Successor of the given routed node.
    pub fn next_node(&self, node: NodeId) -> Option<NodeId> {
        let state = &self.nodes[node];
        let route = &self.routes[state.route()?];
        (state.idx() + 1 < route.len()).then(|| route.node_at(state.idx() + 1))
    }

    pub fn route_and_nodes_mut(&mut self, idx: usize) -> (&mut Route, &mut [Node]) {
        (&mut self.routes[idx], &mut self.nodes)
    }

    /// Allocate an ephemeral node for a reload depot visit.
    pub fn alloc_reload_node(&mut self, location: usize) -> NodeId {
        debug_assert!(location < self.num_locations);

        if let Some(node) = self.free.pop() {
            self.nodes[node] = Node::new(location);
            node
        } else {
            self.nodes.push(Node::new(location));
            self.nodes.len() - 1
        }
    }

    /// Return an ephemeral node to the free list once it left its route.
    pub fn release_node(&mut self, node: NodeId) {
        if node >= self.ephemeral_base {
            debug_assert!(self.nodes[node].route().is_none());
            self.free.push(node);
        }
    }

    /// Recompute the caches of one route.
    pub fn update_route(&mut self, data: &ProblemData, idx: usize) {
        let (route, nodes) = self.route_and_nodes_mut(idx);
        route.update(data, nodes);
    }

    /// Replace the interior of one route by the given node sequence. The
    /// nodes must currently be either interior to this route or unrouted.
    pub(crate) fn rebuild_route(&mut self, route_idx: usize, interior: &[NodeId]) {
        let (route, nodes) = (&mut self.routes[route_idx], &mut self.nodes);
        let removed = route.clear(nodes);

        for &node in interior {
            route.push_back(node, nodes);
        }

        for node in removed {
            if self.nodes[node].route().is_none() {
                self.release_node(node);
            }
        }
    }

    /// Replace the interiors of two routes at once, as cross-route operators
    /// do. Nodes may move from either route to the other.
    pub(crate) fn rebuild_two_routes(
        &mut self,
        route_u: usize,
        interior_u: &[NodeId],
        route_v: usize,
        interior_v: &[NodeId],
    ) {
        debug_assert_ne!(route_u, route_v);

        let mut removed = self.routes[route_u].clear(&mut self.nodes);
        removed.extend(self.routes[route_v].clear(&mut self.nodes));

        for &node in interior_u {
            self.routes[route_u].push_back(node, &mut self.nodes);
        }

        for &node in interior_v {
            self.routes[route_v].push_back(node, &mut self.nodes);
        }

        for node in removed {
            if self.nodes[node].route().is_none() {
                self.release_node(node);
            }
        }
    }

    /// Swap two nodes, possibly across routes, in constant time.
    pub fn swap_nodes(&mut self, u: NodeId, v: NodeId) {
        let (ru, pu) = (self.nodes[u].route(), self.nodes[u].idx());
        let (rv, pv) = (self.nodes[v].route(), self.nodes[v].idx());

        let (ru, rv) = (
            ru.expect("swap operands must be routed"),
            rv.expect("swap operands must be routed"),
        );

        self.routes[ru].replace_node(pu, v);
        self.routes[rv].replace_node(pv, u);

        // Trip numbers are refreshed by the routes' next update.
        self.nodes[u].assign(rv, pv);
        self.nodes[v].assign(ru, pu);
    }

    // -- load / unload -----------------------------------------------------

    /// Diff the given immutable solution into the working routes, reusing
    /// any route whose sequence already matches.
    pub fn load(&mut self, data: &ProblemData, solution: &Solution) {
        let mut offsets = vec![0usize; data.num_vehicle_types()];
        for veh_type in 1..data.num_vehicle_types() {
            offsets[veh_type] =
                offsets[veh_type - 1] + data.vehicle_type(veh_type - 1).num_available;
        }

        let mut loaded = vec![false; self.routes.len()];

        for sol_route in solution.routes() {
            let idx = offsets[sol_route.vehicle_type()];
            offsets[sol_route.vehicle_type()] += 1;
            loaded[idx] = true;

            let target = sol_route.locations(data);
            if !self.routes[idx].needs_update() && self.routes[idx].locations() == &target[..] {
                continue;
            }

            self.clear_route(idx);

            for (trip_idx, trip) in sol_route.trips().iter().enumerate() {
                if trip_idx != 0 {
                    let depot = self.alloc_reload_node(trip.start_depot);
                    let (route, nodes) = (&mut self.routes[idx], &mut self.nodes);
                    route.push_back(depot, nodes);
                }

                for &visit in &trip.visits {
                    let (route, nodes) = (&mut self.routes[idx], &mut self.nodes);
                    route.push_back(visit, nodes);
                }
            }

            self.update_route(data, idx);
        }

        for idx in 0..self.routes.len() {
            if !loaded[idx] && !self.routes[idx].is_empty() {
                self.clear_route(idx);
                self.update_route(data, idx);
            }
        }
    }

    fn clear_route(&mut self, idx: usize) {
        let removed = self.routes[idx].clear(&mut self.nodes);
        for node in removed {
            self.release_node(node);
        }
    }

    /// Rebuild an immutable solution from the working state, splitting each
    /// route into trips at its reload depots.
    pub fn unload(&self, data: &ProblemData) -> Solution {
        let mut sol_routes = Vec::with_capacity(self.routes.len());

        for route in &self.routes {
            if route.is_empty() {
                continue;
            }

            let locs = route.locations();
            let mut trips = Vec::with_capacity(route.num_trips());
            let mut visits = Vec::new();
            let mut start_depot = locs[0];

            for (pos, &loc) in locs.iter().enumerate().skip(1) {
                if data.is_depot(loc) && pos == locs.len() - 1 {
                    trips.push(Trip {
                        start_depot,
                        end_depot: loc,
                        visits: std::mem::take(&mut visits),
                    });
                } else if data.is_depot(loc) {
                    trips.push(Trip {
                        start_depot,
                        end_depot: loc,
                        visits: std::mem::take(&mut visits),
                    });
                    start_depot = loc;
                } else {
                    visits.push(loc);
                }
            }

            let sol_route = SolutionRoute::new(data, trips, route.vehicle_type())
                .expect("working routes unload to valid solution routes");
            sol_routes.push(sol_route);
        }

        Solution::new(data, sol_routes).expect("working state holds each client at most once")
    }

    // -- best insertion ----------------------------------------------------

    /// Insert client node `u` at its best position, honouring same-vehicle
    /// groups and multi-trip opportunities. Commits when the client is
    /// `required` or the best move improves the objective; returns whether an
    /// insertion was made.
    pub fn insert(
        &mut self,
        data: &ProblemData,
        space: &SearchSpace,
        cost_evaluator: &CostEvaluator,
        u: NodeId,
        required: bool,
    ) -> bool {
        debug_assert!(self.nodes[u].route().is_none());

        let u_loc = self.nodes[u].location();
        debug_assert!(!data.is_depot(u_loc));

        // Same-vehicle groups pin the client to the route (or named vehicle)
        // of any member that is already placed.
        let mut required_route = None;
        let mut required_name: &str = "";

        'groups: for group in data.same_vehicle_groups() {
            if !group.clients.contains(&u_loc) {
                continue;
            }

            for &other in &group.clients {
                if other == u_loc {
                    continue;
                }

                if let Some(route_idx) = self.nodes[other].route() {
                    required_route = Some(route_idx);
                    required_name = data
                        .vehicle_type(self.routes[route_idx].vehicle_type())
                        .name
                        .as_str();
                    break 'groups;
                }
            }
        }

        let compatible = |route: &Route| -> bool {
            match required_route {
                None => true,
                Some(req) if route.idx() == req => true,
                Some(_) => {
                    let name = data.vehicle_type(route.vehicle_type()).name.as_str();
                    !required_name.is_empty() && name == required_name
                }
            }
        };

        // Seed with insertion after the first compatible route's start depot.
        let mut best: Option<(usize, usize)> = None; // (route, after position)
        let mut best_cost = Cost::MAX;

        for route in &self.routes {
            if compatible(route) {
                best = Some((route.idx(), 0));
                best_cost = insert_cost(data, cost_evaluator, route, 0, u_loc);
                break;
            }
        }

        if best.is_none() {
            return false;
        }

        // Try after each routed neighbour of `u`.
        for &v_loc in space.neighbours_of(u_loc) {
            let v_state = &self.nodes[v_loc];
            let Some(route_idx) = v_state.route() else {
                continue;
            };

            let route = &self.routes[route_idx];
            if !compatible(route) {
                continue;
            }

            let cost = insert_cost(data, cost_evaluator, route, v_state.idx(), u_loc);
            if cost < best_cost {
                best_cost = cost;
                best = Some((route_idx, v_state.idx()));
            }
        }

        // Consider all routes in randomised vehicle-type order, inserting
        // after the start depot. For empty routes, the first improving one of
        // a type suffices.
        for &(veh_type, offset) in space.veh_type_order() {
            let num_available = data.vehicle_type(veh_type).num_available;

            for idx in offset..offset + num_available {
                let route = &self.routes[idx];
                if !compatible(route) {
                    continue;
                }

                if !route.is_empty() && best.map(|(r, _)| r) == Some(idx) {
                    continue; // the neighbourhood pass already covered it
                }

                let cost = insert_cost(data, cost_evaluator, route, 0, u_loc);
                if cost < best_cost {
                    best_cost = cost;
                    best = Some((idx, 0));

                    if route.is_empty() {
                        break;
                    }
                }
            }
        }

        // Multi-trip candidate: when the standard insertion does not pay off,
        // a prized client may still be worth a fresh trip via a reload depot.
        let mut new_trip: Option<usize> = None;
        let client = data.client(u_loc);

        if client.prize > Cost::ZERO && best_cost >= Cost::ZERO {
            for route in &self.routes {
                if route.is_empty() || !compatible(route) || !route.is_feasible() {
                    continue;
                }

                let veh = data.vehicle_type(route.vehicle_type());
                if veh.reload_depots.is_empty() || route.num_trips() >= veh.max_trips() {
                    continue;
                }

                // The client must fit a trip of its own.
                let fits = (0..data.num_load_dimensions()).all(|dim| {
                    let demand = client.delivery[dim].max(client.pickup[dim]);
                    demand <= veh.capacity[dim]
                });

                if !fits {
                    continue;
                }

                let depot_loc = veh.reload_depots[0];
                let depot = data.depot(depot_loc);
                let dist = data.distance_matrix(veh.profile);
                let durs = data.duration_matrix(veh.profile);

                // The fresh trip must also be workable within the client's
                // and the vehicle's time windows. Committing a trip that can
                // only be served with time warp would just hand the next pass
                // a removal, and the insert would come straight back.
                let arrival_early = veh.tw_early.max(client.release_time)
                    + depot.service_duration
                    + durs.get(depot_loc, u_loc);

                if arrival_early > client.tw_late {
                    continue;
                }

                let return_early = arrival_early.max(client.tw_early)
                    + client.service_duration
                    + durs.get(u_loc, depot_loc);

                if return_early > veh.tw_late {
                    continue;
                }

                // Rough shift-duration check before committing to the exact
                // evaluation below.
                if veh.shift_duration != Duration::MAX {
                    let extra = durs.get(depot_loc, u_loc)
                        + durs.get(u_loc, depot_loc)
                        + client.service_duration
                        + depot.service_duration;

                    if route.duration() + extra > veh.shift_duration {
                        continue;
                    }
                }

                let travel = dist.get(depot_loc, u_loc) + dist.get(u_loc, depot_loc);
                let trip_cost =
                    travel.cost(veh.unit_distance_cost) + depot.reload_cost - client.prize;

                if trip_cost < best_cost {
                    best_cost = trip_cost;
                    new_trip = Some(route.idx());
                }
            }
        }

        if !required && best_cost >= Cost::ZERO {
            return false;
        }

        if let Some(route_idx) = new_trip {
            let veh = data.vehicle_type(self.routes[route_idx].vehicle_type());
            let depot = self.alloc_reload_node(veh.reload_depots[0]);

            let (route, nodes) = (&mut self.routes[route_idx], &mut self.nodes);
            let pos = route.len() - 1;
            route.insert(pos, depot, nodes);
            route.insert(pos + 1, u, nodes);
            return true;
        }

        let (route_idx, after_pos) = best.expect("a compatible route was found above");

        // When the current trip cannot take the client's load and another
        // trip is still allowed, split the trip with a reload depot first.
        let veh = data.vehicle_type(self.routes[route_idx].vehicle_type());
        let mut reload_first = false;

        if !veh.reload_depots.is_empty()
            && self.routes[route_idx].num_trips() < veh.max_trips()
            && !self.routes[route_idx].is_empty()
        {
            let route = &self.routes[route_idx];
            reload_first = (0..data.num_load_dimensions()).any(|dim| {
                let on_board = route.load_before(after_pos, dim).load();
                let demand = client.delivery[dim].max(client.pickup[dim]);
                on_board + demand > veh.capacity[dim]
            });
        }

        if reload_first {
            let depot = self.alloc_reload_node(veh.reload_depots[0]);
            let (route, nodes) = (&mut self.routes[route_idx], &mut self.nodes);
            route.insert(after_pos + 1, depot, nodes);
            route.insert(after_pos + 2, u, nodes);
        } else {
            let (route, nodes) = (&mut self.routes[route_idx], &mut self.nodes);
            route.insert(after_pos + 1, u, nodes);
        }

        true
    }

    /// Penalised cost of the whole working solution.
    pub fn penalised_cost(&self, data: &ProblemData, cost_evaluator: &CostEvaluator) -> Cost {
        self.routes
            .iter()
            .map(|route| route_cost(data, cost_evaluator, route))
            .sum()
    }
}
