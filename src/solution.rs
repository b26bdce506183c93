//! Immutable solution representation: routes made of depot-bounded trips,
//! plus the implied set of unassigned clients.

use crate::error::{Error, Result};
use crate::measure::{Distance, Duration};
use crate::problem::ProblemData;
use crate::rng::RandomNumberGenerator;
use crate::route_stats::{compute_route_stats, RouteStats};
use serde::{Deserialize, Serialize};

/// A maximal depot-bounded sub-sequence of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub start_depot: usize,
    pub end_depot: usize,
    /// Client locations visited, in order.
    pub visits: Vec<usize>,
}

/// A vehicle's ordered visit sequence between its start and end depot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    vehicle_type: usize,
    trips: Vec<Trip>,
    stats: RouteStats,
}

impl Route {
    /// Create a route from its trips. The trips must chain: each trip ends at
    /// the depot where the next one starts, the first starts at the vehicle's
    /// start depot, and the last ends at its end depot.
    pub fn new(data: &ProblemData, trips: Vec<Trip>, vehicle_type: usize) -> Result<Self> {
        if vehicle_type >= data.num_vehicle_types() {
            return Err(Error::InvalidSolution("unknown vehicle type".into()));
        }

        let veh = data.vehicle_type(vehicle_type);

        if let Some(first) = trips.first() {
            if first.start_depot != veh.start_depot {
                return Err(Error::InvalidSolution(
                    "route does not start at the vehicle's start depot".into(),
                ));
            }
        }

        if let Some(last) = trips.last() {
            if last.end_depot != veh.end_depot {
                return Err(Error::InvalidSolution(
                    "route does not end at the vehicle's end depot".into(),
                ));
            }
        }

        for pair in trips.windows(2) {
            if pair[0].end_depot != pair[1].start_depot {
                return Err(Error::InvalidSolution(
                    "consecutive trips do not share a reload depot".into(),
                ));
            }
        }

        for trip in &trips {
            for &visit in &trip.visits {
                if visit < data.num_depots() || visit >= data.num_locations() {
                    return Err(Error::InvalidSolution(format!(
                        "route visits unknown client {}",
                        visit
                    )));
                }
            }
        }

        let locs = locations_of(&trips, veh.start_depot, veh.end_depot);
        let stats = match compute_route_stats(data, vehicle_type, &locs) {
            Ok(stats) => stats,
            Err(Error::RouteShape(msg)) => return Err(Error::InvalidSolution(msg)),
            Err(err) => return Err(err),
        };

        Ok(Route {
            vehicle_type,
            trips,
            stats,
        })
    }

    /// Create a single-trip route from a list of client visits.
    pub fn from_visits(data: &ProblemData, visits: Vec<usize>, vehicle_type: usize) -> Result<Self> {
        if vehicle_type >= data.num_vehicle_types() {
            return Err(Error::InvalidSolution("unknown vehicle type".into()));
        }

        let veh = data.vehicle_type(vehicle_type);
        let trip = Trip {
            start_depot: veh.start_depot,
            end_depot: veh.end_depot,
            visits,
        };

        Route::new(data, vec![trip], vehicle_type)
    }

    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn num_trips(&self) -> usize {
        self.stats.num_trips
    }

    pub fn num_clients(&self) -> usize {
        self.stats.num_clients
    }

    pub fn is_empty(&self) -> bool {
        self.stats.num_clients == 0
    }

    /// Client locations visited, in order, without depots.
    pub fn visits(&self) -> impl Iterator<Item = usize> + '_ {
        self.trips.iter().flat_map(|trip| trip.visits.iter().copied())
    }

    /// The full location sequence, including the start/end depots and any
    /// reload depots.
    pub(crate) fn locations(&self, data: &ProblemData) -> Vec<usize> {
        let veh = data.vehicle_type(self.vehicle_type);
        locations_of(&self.trips, veh.start_depot, veh.end_depot)
    }

    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }

    pub fn distance(&self) -> Distance {
        self.stats.distance
    }

    pub fn duration(&self) -> Duration {
        self.stats.duration
    }

    pub fn time_warp(&self) -> Duration {
        self.stats.time_warp
    }

    pub fn is_feasible(&self) -> bool {
        self.stats.is_feasible()
    }
}

fn locations_of(trips: &[Trip], start_depot: usize, end_depot: usize) -> Vec<usize> {
    let num_visits: usize = trips.iter().map(|trip| trip.visits.len()).sum();
    let mut locs = Vec::with_capacity(num_visits + trips.len() + 1);

    locs.push(start_depot);
    for (idx, trip) in trips.iter().enumerate() {
        if idx != 0 {
            locs.push(trip.start_depot);
        }
        locs.extend_from_slice(&trip.visits);
    }
    locs.push(end_depot);

    locs
}

/// A set of routes plus the implied set of unassigned clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    routes: Vec<Route>,
    unassigned: Vec<usize>,
}

impl Solution {
    /// Create a solution from routes, validating that no client is visited
    /// twice and that no vehicle type is used more often than available.
    pub fn new(data: &ProblemData, routes: Vec<Route>) -> Result<Self> {
        let mut used = vec![0usize; data.num_vehicle_types()];
        let mut visited = vec![false; data.num_locations()];

        for route in &routes {
            used[route.vehicle_type()] += 1;

            if used[route.vehicle_type()] > data.vehicle_type(route.vehicle_type()).num_available {
                return Err(Error::InvalidSolution(format!(
                    "too many routes of vehicle type {}",
                    route.vehicle_type()
                )));
            }

            for visit in route.visits() {
                if visited[visit] {
                    return Err(Error::InvalidSolution(format!(
                        "client {} is visited more than once",
                        visit
                    )));
                }

                visited[visit] = true;
            }
        }

        let unassigned = (data.num_depots()..data.num_locations())
            .filter(|&loc| !visited[loc])
            .collect();

        Ok(Solution { routes, unassigned })
    }

    /// Create a solution from raw visit lists. Route `i` is assigned the
    /// vehicle type of the `i`-th vehicle slot.
    pub fn from_routes(data: &ProblemData, routes: Vec<Vec<usize>>) -> Result<Self> {
        if routes.len() > data.num_vehicles() {
            return Err(Error::InvalidSolution(
                "more routes than available vehicles".into(),
            ));
        }

        let mut slot_types = Vec::with_capacity(data.num_vehicles());
        for (veh_type, veh) in data.vehicle_types().iter().enumerate() {
            slot_types.extend(std::iter::repeat(veh_type).take(veh.num_available));
        }

        let routes = routes
            .into_iter()
            .zip(slot_types)
            .filter(|(visits, _)| !visits.is_empty())
            .map(|(visits, veh_type)| Route::from_visits(data, visits, veh_type))
            .collect::<Result<Vec<_>>>()?;

        Solution::new(data, routes)
    }

    /// Create a random solution: clients are assigned to uniformly drawn
    /// vehicle slots, in shuffled order.
    pub fn random(data: &ProblemData, rng: &mut RandomNumberGenerator) -> Self {
        let mut clients: Vec<usize> = (data.num_depots()..data.num_locations()).collect();

        // Fisher-Yates against the engine's own generator.
        for idx in (1..clients.len()).rev() {
            let other = rng.randint(idx as u32 + 1) as usize;
            clients.swap(idx, other);
        }

        let mut slots: Vec<Vec<usize>> = vec![vec![]; data.num_vehicles()];
        for client in clients {
            let slot = rng.randint(data.num_vehicles() as u32) as usize;
            slots[slot].push(client);
        }

        let mut slot_types = Vec::with_capacity(data.num_vehicles());
        for (veh_type, veh) in data.vehicle_types().iter().enumerate() {
            slot_types.extend(std::iter::repeat(veh_type).take(veh.num_available));
        }

        let routes = slots
            .into_iter()
            .zip(slot_types)
            .filter(|(visits, _)| !visits.is_empty())
            .map(|(visits, veh_type)| {
                Route::from_visits(data, visits, veh_type)
                    .expect("random routes reference valid clients")
            })
            .collect();

        Solution {
            routes,
            unassigned: vec![],
        }
        .with_unassigned(data)
    }

    fn with_unassigned(mut self, data: &ProblemData) -> Self {
        let mut visited = vec![false; data.num_locations()];
        for route in &self.routes {
            for visit in route.visits() {
                visited[visit] = true;
            }
        }

        self.unassigned = (data.num_depots()..data.num_locations())
            .filter(|&loc| !visited[loc])
            .collect();
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn num_clients(&self) -> usize {
        self.routes.iter().map(Route::num_clients).sum()
    }

    /// Client locations not visited by any route.
    pub fn unassigned(&self) -> &[usize] {
        &self.unassigned
    }

    pub fn distance(&self) -> Distance {
        self.routes.iter().map(Route::distance).sum()
    }

    pub fn duration(&self) -> Duration {
        self.routes.iter().map(Route::duration).sum()
    }

    pub fn time_warp(&self) -> Duration {
        self.routes.iter().map(Route::time_warp).sum()
    }

    pub fn is_feasible(&self) -> bool {
        self.routes.iter().all(Route::is_feasible)
    }

    /// Whether at most one member of every mutually-exclusive group is
    /// routed.
    pub fn is_group_feasible(&self, data: &ProblemData) -> bool {
        let mut routed = vec![false; data.num_locations()];
        for route in &self.routes {
            for visit in route.visits() {
                routed[visit] = true;
            }
        }

        data.groups()
            .iter()
            .filter(|group| group.mutually_exclusive)
            .all(|group| group.clients.iter().filter(|&&c| routed[c]).count() <= 1)
    }

    /// Whether all required clients and at least one member of every required
    /// group are routed.
    pub fn is_complete(&self, data: &ProblemData) -> bool {
        let mut routed = vec![false; data.num_locations()];
        for route in &self.routes {
            for visit in route.visits() {
                routed[visit] = true;
            }
        }

        let clients_ok = (data.num_depots()..data.num_locations())
            .all(|loc| routed[loc] || !data.client(loc).required || data.client(loc).group.is_some());

        let groups_ok = data
            .groups()
            .iter()
            .filter(|group| group.required)
            .all(|group| group.clients.iter().any(|&c| routed[c]));

        clients_ok && groups_ok
    }
}
