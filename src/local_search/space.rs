//! Neighbour lists, randomised orderings, and the promising-client bitset.

use crate::problem::ProblemData;
use crate::rng::RandomNumberGenerator;
use fixedbitset::FixedBitSet;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Per-client candidate partner lists, indexed by location. Depot entries are
/// empty.
pub type Neighbours = Vec<Vec<usize>>;

/// Parameters of the proximity-based neighbourhood construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighbourhoodParams {
    pub num_neighbours: usize,
    pub weight_wait_time: f64,
    pub weight_time_warp: f64,
    pub symmetric: bool,
}

impl Default for NeighbourhoodParams {
    fn default() -> Self {
        NeighbourhoodParams {
            num_neighbours: 60,
            weight_wait_time: 0.2,
            weight_time_warp: 1.0,
            symmetric: true,
        }
    }
}

/// Compute proximity-based neighbour lists.
///
/// Proximity follows Vidal et al. (2013): the cheapest way any vehicle can
/// traverse the edge, minus the prize of the target, plus weighted estimates
/// of the waiting time and time warp the edge forces between the two time
/// windows.
pub fn compute_neighbours(data: &ProblemData, params: NeighbourhoodParams) -> Neighbours {
    let num_locs = data.num_locations();
    let num_depots = data.num_depots();
    let num_clients = data.num_clients();

    if num_clients == 0 {
        return vec![vec![]; num_locs];
    }

    // Distinct (unit distance cost, unit duration cost, profile) triples.
    let mut cost_profiles: Vec<(i64, i64, usize)> = data
        .vehicle_types()
        .iter()
        .map(|veh| {
            (
                veh.unit_distance_cost.get(),
                veh.unit_duration_cost.get(),
                veh.profile,
            )
        })
        .collect();
    cost_profiles.sort_unstable();
    cost_profiles.dedup();

    // Cheapest edge cost over all vehicle types.
    let mut proximity = vec![0.0f64; num_locs * num_locs];
    for (which, &(unit_dist, unit_dur, profile)) in cost_profiles.iter().enumerate() {
        let dist_mat = data.distance_matrix(profile);
        let dur_mat = data.duration_matrix(profile);

        for i in 0..num_locs {
            for j in 0..num_locs {
                let cost = unit_dist as f64 * dist_mat.get(i, j).get() as f64
                    + unit_dur as f64 * dur_mat.get(i, j).get() as f64;
                let entry = &mut proximity[i * num_locs + j];

                if which == 0 {
                    *entry = cost;
                } else {
                    *entry = entry.min(cost);
                }
            }
        }
    }

    // Fastest traversal over all profiles, for the time window terms.
    let mut min_duration = vec![0.0f64; num_locs * num_locs];
    for i in 0..num_locs {
        for j in 0..num_locs {
            let mut best = data.duration_matrix(0).get(i, j).get() as f64;
            for profile in 1..data.num_profiles() {
                best = best.min(data.duration_matrix(profile).get(i, j).get() as f64);
            }
            min_duration[i * num_locs + j] = best;
        }
    }

    let early: Vec<f64> = (0..num_locs)
        .map(|loc| {
            if data.is_depot(loc) {
                0.0
            } else {
                data.client(loc).tw_early.get() as f64
            }
        })
        .collect();
    let late: Vec<f64> = (0..num_locs)
        .map(|loc| {
            if data.is_depot(loc) {
                0.0
            } else {
                data.client(loc).tw_late.get() as f64
            }
        })
        .collect();
    let service: Vec<f64> = (0..num_locs)
        .map(|loc| {
            if data.is_depot(loc) {
                0.0
            } else {
                data.client(loc).service_duration.get() as f64
            }
        })
        .collect();

    for i in 0..num_locs {
        for j in 0..num_locs {
            let entry = &mut proximity[i * num_locs + j];

            if !data.is_depot(j) {
                *entry -= data.client(j).prize.get() as f64;
            }

            let min_wait = early[j] - min_duration[i * num_locs + j] - service[i] - late[i];
            if min_wait > 0.0 {
                *entry += params.weight_wait_time * min_wait;
            }

            let min_warp = early[i] + service[i] + min_duration[i * num_locs + j] - late[j];
            if min_warp > 0.0 {
                *entry += params.weight_time_warp * min_warp;
            }
        }
    }

    if params.symmetric {
        for i in 0..num_locs {
            for j in i + 1..num_locs {
                let forward = proximity[i * num_locs + j];
                let backward = proximity[j * num_locs + i];
                let both = forward.min(backward);
                proximity[i * num_locs + j] = both;
                proximity[j * num_locs + i] = both;
            }
        }
    }

    // Members of a mutually-exclusive group never appear in each other's
    // neighbour lists: at most one of them is in the solution anyway. Kept
    // finite so they still order before depots.
    for group in data.groups() {
        if group.mutually_exclusive {
            for &a in &group.clients {
                for &b in &group.clients {
                    if a != b {
                        proximity[a * num_locs + b] = f64::MAX;
                    }
                }
            }
        }
    }

    for loc in 0..num_locs {
        proximity[loc * num_locs + loc] = f64::INFINITY;
    }
    for depot in 0..num_depots {
        for loc in 0..num_locs {
            proximity[depot * num_locs + loc] = f64::INFINITY;
            proximity[loc * num_locs + depot] = f64::INFINITY;
        }
    }

    let k = params.num_neighbours.min(num_clients - 1);
    let mut neighbours = vec![vec![]; num_locs];

    for i in num_depots..num_locs {
        let mut candidates: Vec<(f64, usize)> = (num_depots..num_locs)
            .filter(|&j| j != i)
            .map(|j| (proximity[i * num_locs + j], j))
            .collect();

        let k = k.min(candidates.len());
        if k == 0 {
            continue;
        }

        candidates.select_nth_unstable_by(k - 1, |a, b| a.partial_cmp(b).unwrap());
        candidates.truncate(k);
        candidates.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());

        neighbours[i] = candidates.into_iter().map(|(_, j)| j).collect();
    }

    neighbours
}

/// Owns the orderings and bookkeeping that drive operator evaluation.
#[derive(Debug)]
pub struct SearchSpace {
    neighbours: Neighbours,
    client_order: Vec<usize>,
    route_order: Vec<usize>,
    veh_type_order: Vec<(usize, usize)>,
    promising: FixedBitSet,
}

impl SearchSpace {
    pub fn new(data: &ProblemData, neighbours: Neighbours) -> Self {
        debug_assert_eq!(neighbours.len(), data.num_locations());

        let client_order: Vec<usize> = (data.num_depots()..data.num_locations()).collect();
        let route_order: Vec<usize> = (0..data.num_vehicles()).collect();

        let mut veh_type_order = Vec::with_capacity(data.num_vehicle_types());
        let mut offset = 0;
        for (veh_type, veh) in data.vehicle_types().iter().enumerate() {
            veh_type_order.push((veh_type, offset));
            offset += veh.num_available;
        }

        SearchSpace {
            neighbours,
            client_order,
            route_order,
            veh_type_order,
            promising: FixedBitSet::with_capacity(data.num_locations()),
        }
    }

    pub fn neighbours(&self) -> &Neighbours {
        &self.neighbours
    }

    pub fn neighbours_of(&self, location: usize) -> &[usize] {
        &self.neighbours[location]
    }

    /// Client locations in the current evaluation order.
    pub fn client_order(&self) -> &[usize] {
        &self.client_order
    }

    /// Route indices in the current evaluation order.
    pub fn route_order(&self) -> &[usize] {
        &self.route_order
    }

    /// `(vehicle type, first slot index)` pairs in the current order.
    pub fn veh_type_order(&self) -> &[(usize, usize)] {
        &self.veh_type_order
    }

    /// Draw new random orderings.
    pub fn shuffle(&mut self, rng: &mut RandomNumberGenerator) {
        self.client_order.shuffle(rng);
        self.route_order.shuffle(rng);
        self.veh_type_order.shuffle(rng);
    }

    /// Mark a client and everything around it as worth revisiting.
    pub fn mark_promising(&mut self, location: usize) {
        if location >= self.promising.len() {
            return; // depot sentinels have no neighbourhood
        }

        self.promising.insert(location);
        for &other in &self.neighbours[location] {
            self.promising.insert(other);
        }
    }

    pub fn mark_all_promising(&mut self) {
        self.promising.insert_range(..);
    }

    pub fn is_promising(&self, location: usize) -> bool {
        self.promising.contains(location)
    }

    /// Take the current promising set, leaving an empty one behind. The
    /// driver consumes one set per pass while marks made during the pass
    /// accumulate for the next.
    pub fn take_promising(&mut self) -> FixedBitSet {
        let empty = FixedBitSet::with_capacity(self.promising.len());
        std::mem::replace(&mut self.promising, empty)
    }
}
