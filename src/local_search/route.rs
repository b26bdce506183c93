//! The mutable route representation used during search.
//!
//! A route is a sequence of node ids into the working solution's node arena,
//! always starting and ending with a depot sentinel. After any mutation the
//! caches are stale until `update` is called; the query methods assert this
//! in debug builds.

use crate::measure::{Cost, Distance, Duration, Load};
use crate::problem::ProblemData;
use crate::route_stats::{
    compute_route_stats, end_segment, start_segment, visit_segment, RouteStats,
};
use crate::segment::{DurationSegment, LoadSegment};

/// Index into the working solution's node arena.
pub type NodeId = usize;

/// Per-node working state: where the node currently sits.
#[derive(Debug, Clone)]
pub struct Node {
    location: usize,
    route: Option<usize>,
    idx: usize,
    trip: usize,
}

impl Node {
    pub fn new(location: usize) -> Self {
        Node {
            location,
            route: None,
            idx: 0,
            trip: 0,
        }
    }

    pub fn location(&self) -> usize {
        self.location
    }

    /// Index of the route this node is currently in, if any.
    pub fn route(&self) -> Option<usize> {
        self.route
    }

    /// Position within the owning route.
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Zero-based trip number within the owning route.
    pub fn trip(&self) -> usize {
        self.trip
    }

    pub(crate) fn assign(&mut self, route: usize, idx: usize) {
        self.route = Some(route);
        self.idx = idx;
    }
}

/// A vehicle's working route with incrementally maintained prefix and suffix
/// caches.
#[derive(Debug, Clone)]
pub struct Route {
    idx: usize,
    vehicle_type: usize,
    nodes: Vec<NodeId>,
    locs: Vec<usize>,
    cum_dist: Vec<Distance>,
    cum_prize: Vec<Cost>,
    dur_at: Vec<DurationSegment>,
    dur_before: Vec<DurationSegment>,
    dur_after: Vec<DurationSegment>,
    load_before: Vec<Vec<LoadSegment>>,
    load_after: Vec<Vec<LoadSegment>>,
    stats: RouteStats,
    centroid: (f64, f64),
    angle_min: f64,
    angle_max: f64,
    dirty: bool,
}

impl Route {
    /// Create an empty route owning the two given depot sentinel nodes.
    pub fn new(
        data: &ProblemData,
        idx: usize,
        vehicle_type: usize,
        start: NodeId,
        end: NodeId,
        nodes: &mut [Node],
    ) -> Self {
        nodes[start].route = Some(idx);
        nodes[start].idx = 0;
        nodes[end].route = Some(idx);
        nodes[end].idx = 1;

        let mut route = Route {
            idx,
            vehicle_type,
            nodes: vec![start, end],
            locs: vec![],
            cum_dist: vec![],
            cum_prize: vec![],
            dur_at: vec![],
            dur_before: vec![],
            dur_after: vec![],
            load_before: vec![vec![]; data.num_load_dimensions()],
            load_after: vec![vec![]; data.num_load_dimensions()],
            stats: RouteStats::default(),
            centroid: (0.0, 0.0),
            angle_min: 0.0,
            angle_max: 0.0,
            dirty: true,
        };

        route.update(data, nodes);
        route
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    /// Total number of nodes, including the start and end depots.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 2
    }

    pub fn node_at(&self, pos: usize) -> NodeId {
        self.nodes[pos]
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The route's start depot sentinel.
    pub fn start_node(&self) -> NodeId {
        self.nodes[0]
    }

    /// The route's end depot sentinel.
    pub fn end_node(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Whether the node at `pos` is a depot visit (start, end, or reload).
    pub fn is_depot_at(&self, data: &ProblemData, pos: usize) -> bool {
        data.is_depot(self.location_at(pos))
    }

    /// Whether the node at `pos` is a reload depot (an interior depot visit).
    pub fn is_reload_depot_at(&self, data: &ProblemData, pos: usize) -> bool {
        pos != 0 && pos != self.nodes.len() - 1 && self.is_depot_at(data, pos)
    }

    pub fn location_at(&self, pos: usize) -> usize {
        debug_assert!(!self.dirty);
        self.locs[pos]
    }

    /// The full location sequence, including depots.
    pub fn locations(&self) -> &[usize] {
        debug_assert!(!self.dirty);
        &self.locs
    }

    // -- mutations ---------------------------------------------------------

    /// Append a node just before the end depot.
    pub fn push_back(&mut self, node: NodeId, nodes: &mut [Node]) {
        let pos = self.nodes.len() - 1;
        self.insert(pos, node, nodes);
    }

    /// Insert a node at the given position. The start and end depots cannot
    /// be displaced.
    pub fn insert(&mut self, pos: usize, node: NodeId, nodes: &mut [Node]) {
        debug_assert!(pos >= 1 && pos < self.nodes.len());
        debug_assert!(nodes[node].route.is_none());

        self.nodes.insert(pos, node);
        nodes[node].route = Some(self.idx);
        nodes[node].idx = pos;

        for &shifted in &self.nodes[pos + 1..] {
            nodes[shifted].idx += 1;
        }

        self.dirty = true;
    }

    /// Remove and return the node at the given position. The start and end
    /// depots cannot be removed.
    pub fn remove(&mut self, pos: usize, nodes: &mut [Node]) -> NodeId {
        debug_assert!(pos >= 1 && pos < self.nodes.len() - 1);

        let node = self.nodes.remove(pos);
        nodes[node].route = None;
        nodes[node].idx = 0;
        nodes[node].trip = 0;

        for &shifted in &self.nodes[pos..] {
            nodes[shifted].idx -= 1;
        }

        self.dirty = true;
        node
    }

    /// Overwrite the node id at a position without touching node states; used
    /// by the constant-time node swap.
    pub(crate) fn replace_node(&mut self, pos: usize, node: NodeId) {
        debug_assert!(pos >= 1 && pos < self.nodes.len() - 1);
        self.nodes[pos] = node;
        self.dirty = true;
    }

    /// Remove all interior nodes. The removed ids are returned so the caller
    /// can recycle ephemeral depot nodes.
    pub fn clear(&mut self, nodes: &mut [Node]) -> Vec<NodeId> {
        let interior: Vec<NodeId> = self.nodes[1..self.nodes.len() - 1].to_vec();

        for &node in &interior {
            nodes[node].route = None;
            nodes[node].idx = 0;
            nodes[node].trip = 0;
        }

        let end = self.end_node();
        self.nodes.truncate(1);
        self.nodes.push(end);
        nodes[end].idx = 1;

        self.dirty = true;
        interior
    }

    // -- cache rebuild -----------------------------------------------------

    /// Recompute all caches and totals. Must be called after mutations and
    /// before any cache-backed query.
    pub fn update(&mut self, data: &ProblemData, nodes: &mut [Node]) {
        let veh = data.vehicle_type(self.vehicle_type);
        let dist_mat = data.distance_matrix(veh.profile);
        let dur_mat = data.duration_matrix(veh.profile);
        let num_dims = data.num_load_dimensions();
        let len = self.nodes.len();

        self.locs.clear();
        self.locs
            .extend(self.nodes.iter().map(|&node| nodes[node].location));

        // Node back-pointers and trip numbers.
        let mut trip = 0;
        for (pos, &node) in self.nodes.iter().enumerate() {
            if pos != 0 && pos != len - 1 && data.is_depot(self.locs[pos]) {
                trip += 1;
            }

            nodes[node].route = Some(self.idx);
            nodes[node].idx = pos;
            nodes[node].trip = trip;
        }

        self.stats = compute_route_stats(data, self.vehicle_type, &self.locs)
            .expect("working routes only hold legal visit sequences");

        // Cumulative distance and prize.
        self.cum_dist.clear();
        self.cum_dist.push(Distance::ZERO);
        self.cum_prize.clear();
        self.cum_prize.push(Cost::ZERO);
        for pos in 1..len {
            let edge = dist_mat.get(self.locs[pos - 1], self.locs[pos]);
            self.cum_dist.push(self.cum_dist[pos - 1] + edge);

            let prize = if data.is_depot(self.locs[pos]) {
                Cost::ZERO
            } else {
                data.client(self.locs[pos]).prize
            };
            self.cum_prize.push(self.cum_prize[pos - 1] + prize);
        }

        // Per-visit duration segments, with the vehicle shift at both ends.
        self.dur_at.clear();
        for pos in 0..len {
            let seg = if pos == 0 {
                start_segment(data, self.vehicle_type)
            } else if pos == len - 1 {
                end_segment(data, self.vehicle_type)
            } else {
                visit_segment(data, self.locs[pos])
            };
            self.dur_at.push(seg);
        }

        // Prefix schedule; reload depots close the running trip.
        self.dur_before.clear();
        self.dur_before.push(self.dur_at[0]);
        for pos in 1..len {
            let edge = dur_mat.get(self.locs[pos - 1], self.locs[pos]);
            let mut acc = DurationSegment::merge(edge, &self.dur_before[pos - 1], &self.dur_at[pos]);

            if pos != len - 1 && data.is_depot(self.locs[pos]) {
                acc = acc.finalise_back();
            }

            self.dur_before.push(acc);
        }

        // Suffix schedule, mirrored.
        self.dur_after.clear();
        self.dur_after.resize(len, DurationSegment::default());
        self.dur_after[len - 1] = self.dur_at[len - 1];
        for pos in (0..len - 1).rev() {
            let edge = dur_mat.get(self.locs[pos], self.locs[pos + 1]);

            self.dur_after[pos] = if pos != 0 && data.is_depot(self.locs[pos]) {
                self.dur_after[pos + 1]
                    .finalise_front(edge, data.depot(self.locs[pos]).service_duration)
            } else {
                DurationSegment::merge(edge, &self.dur_at[pos], &self.dur_after[pos + 1])
            };
        }

        // In-trip load prefixes and suffixes, per dimension.
        for dim in 0..num_dims {
            let before = &mut self.load_before[dim];
            before.clear();

            let mut acc = veh
                .initial_load
                .get(dim)
                .map(|&load| LoadSegment::initial(load))
                .unwrap_or_default();
            before.push(acc);

            for pos in 1..len {
                if pos != len - 1 && data.is_depot(self.locs[pos]) {
                    acc = LoadSegment::default();
                } else if !data.is_depot(self.locs[pos]) {
                    let client = data.client(self.locs[pos]);
                    let visit = LoadSegment::client(client.delivery[dim], client.pickup[dim]);
                    acc = LoadSegment::merge(&acc, &visit);
                }
                before.push(acc);
            }

            let after = &mut self.load_after[dim];
            after.clear();
            after.resize(len, LoadSegment::default());

            let mut acc = LoadSegment::default();
            for pos in (0..len).rev() {
                if data.is_depot(self.locs[pos]) {
                    acc = LoadSegment::default();
                } else {
                    let client = data.client(self.locs[pos]);
                    let visit = LoadSegment::client(client.delivery[dim], client.pickup[dim]);
                    acc = LoadSegment::merge(&visit, &acc);
                }
                after[pos] = acc;
            }
        }

        self.update_geometry(data);
        self.dirty = false;
    }

    fn update_geometry(&mut self, data: &ProblemData) {
        let (cx, cy) = data.centroid();
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0usize;

        let mut angle_min = f64::INFINITY;
        let mut angle_max = f64::NEG_INFINITY;

        for &loc in self.locs.iter().skip(1).take(self.locs.len().saturating_sub(2)) {
            if data.is_depot(loc) {
                continue;
            }

            let (x, y) = data.location_xy(loc);
            sum_x += x.get() as f64;
            sum_y += y.get() as f64;
            count += 1;

            let angle = (y.get() as f64 - cy).atan2(x.get() as f64 - cx);
            let angle = if angle < 0.0 {
                angle + 2.0 * std::f64::consts::PI
            } else {
                angle
            };

            angle_min = angle_min.min(angle);
            angle_max = angle_max.max(angle);
        }

        if count == 0 {
            self.centroid = (0.0, 0.0);
            self.angle_min = 0.0;
            self.angle_max = 0.0;
            return;
        }

        self.centroid = (sum_x / count as f64, sum_y / count as f64);

        // Sectors spanning more than half the circle wrap around zero.
        if angle_max - angle_min > std::f64::consts::PI {
            std::mem::swap(&mut angle_min, &mut angle_max);
            angle_max += 2.0 * std::f64::consts::PI;
        }

        self.angle_min = angle_min;
        self.angle_max = angle_max;
    }

    // -- cache-backed queries ----------------------------------------------

    pub fn stats(&self) -> &RouteStats {
        debug_assert!(!self.dirty);
        &self.stats
    }

    pub fn num_clients(&self) -> usize {
        debug_assert!(!self.dirty);
        self.stats.num_clients
    }

    pub fn num_trips(&self) -> usize {
        debug_assert!(!self.dirty);
        self.stats.num_trips
    }

    pub fn max_trips(&self, data: &ProblemData) -> usize {
        data.vehicle_type(self.vehicle_type).max_trips()
    }

    pub fn distance(&self) -> Distance {
        debug_assert!(!self.dirty);
        self.stats.distance
    }

    pub fn excess_distance(&self) -> Distance {
        debug_assert!(!self.dirty);
        self.stats.excess_distance
    }

    pub fn duration(&self) -> Duration {
        debug_assert!(!self.dirty);
        self.stats.duration
    }

    pub fn time_warp(&self) -> Duration {
        debug_assert!(!self.dirty);
        self.stats.time_warp
    }

    pub fn overtime(&self) -> Duration {
        debug_assert!(!self.dirty);
        self.stats.overtime
    }

    pub fn excess_load(&self) -> &[Load] {
        debug_assert!(!self.dirty);
        &self.stats.excess_load
    }

    /// Maximum load carried during the given trip, per dimension.
    pub fn trip_load(&self, dim: usize, trip: usize) -> Load {
        debug_assert!(!self.dirty);
        self.stats.trip_loads[dim][trip]
    }

    pub fn capacity<'a>(&self, data: &'a ProblemData) -> &'a [Load] {
        &data.vehicle_type(self.vehicle_type).capacity
    }

    pub fn prizes(&self) -> Cost {
        debug_assert!(!self.dirty);
        self.stats.prizes
    }

    pub fn is_feasible(&self) -> bool {
        debug_assert!(!self.dirty);
        self.stats.is_feasible()
    }

    /// Distance travelled between positions `from` and `to`.
    pub fn distance_between(&self, from: usize, to: usize) -> Distance {
        debug_assert!(!self.dirty);
        debug_assert!(from <= to);
        self.cum_dist[to] - self.cum_dist[from]
    }

    /// Prizes collected between positions `from` and `to`, inclusive.
    pub fn prizes_between(&self, from: usize, to: usize) -> Cost {
        debug_assert!(!self.dirty);
        debug_assert!(from <= to);
        self.cum_prize[to] - self.cum_prize[from]
    }

    /// Schedule aggregate of the prefix ending at `pos`, inclusive.
    pub fn dur_before(&self, pos: usize) -> &DurationSegment {
        debug_assert!(!self.dirty);
        &self.dur_before[pos]
    }

    /// Schedule aggregate of the suffix starting at `pos`, inclusive.
    pub fn dur_after(&self, pos: usize) -> &DurationSegment {
        debug_assert!(!self.dirty);
        &self.dur_after[pos]
    }

    pub fn dur_at(&self, pos: usize) -> &DurationSegment {
        debug_assert!(!self.dirty);
        &self.dur_at[pos]
    }

    /// Schedule aggregate of positions `from..=to`, merged on demand.
    pub fn dur_between(&self, data: &ProblemData, from: usize, to: usize) -> DurationSegment {
        debug_assert!(!self.dirty);
        debug_assert!(from <= to);

        let veh = data.vehicle_type(self.vehicle_type);
        let dur_mat = data.duration_matrix(veh.profile);

        let mut acc = self.dur_at[from];
        for pos in from + 1..=to {
            let edge = dur_mat.get(self.locs[pos - 1], self.locs[pos]);
            acc = DurationSegment::merge(edge, &acc, &self.dur_at[pos]);

            if pos != self.locs.len() - 1 && data.is_depot(self.locs[pos]) {
                acc = acc.finalise_back();
            }
        }

        acc
    }

    /// In-trip load aggregate of the prefix ending at `pos`, inclusive.
    pub fn load_before(&self, pos: usize, dim: usize) -> &LoadSegment {
        debug_assert!(!self.dirty);
        &self.load_before[dim][pos]
    }

    /// In-trip load aggregate of the suffix starting at `pos`, inclusive.
    pub fn load_after(&self, pos: usize, dim: usize) -> &LoadSegment {
        debug_assert!(!self.dirty);
        &self.load_after[dim][pos]
    }

    /// Centre of gravity of the route's clients.
    pub fn centroid(&self) -> (f64, f64) {
        debug_assert!(!self.dirty);
        self.centroid
    }

    /// Geometric pruning test for route-pair operators: whether the polar
    /// sectors of the two routes, widened by `tolerance` radians, intersect.
    pub fn overlaps_with(&self, other: &Route, tolerance: f64) -> bool {
        debug_assert!(!self.dirty);
        debug_assert!(!other.dirty);

        if self.is_empty() || other.is_empty() {
            return false;
        }

        !(self.angle_max + tolerance < other.angle_min
            || other.angle_max + tolerance < self.angle_min)
    }

    /// Whether the caches are stale.
    pub fn needs_update(&self) -> bool {
        self.dirty
    }
}
