//! Route totals computed from a visit sequence.
//!
//! This is the single source of truth for route statistics: the immutable
//! solution model, the working route caches, and operator move evaluation all
//! derive their numbers from the same pass, so delta costs are exact by
//! construction.

use crate::error::{Error, Result};
use crate::measure::{Cost, Distance, Duration, Load};
use crate::problem::ProblemData;
use crate::segment::{DurationSegment, LoadSegment};
use serde::{Deserialize, Serialize};

/// Aggregated totals of one route. All fields are derived from the visit
/// sequence; `excess_*` and `time_warp` are zero iff the route is feasible.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStats {
    pub distance: Distance,
    pub excess_distance: Distance,
    pub duration: Duration,
    pub time_warp: Duration,
    pub overtime: Duration,
    pub travel_duration: Duration,
    pub service_duration: Duration,
    pub wait_duration: Duration,
    pub excess_load: Vec<Load>,
    pub trip_loads: Vec<Vec<Load>>,
    pub prizes: Cost,
    pub reload_costs: Cost,
    pub num_trips: usize,
    pub num_clients: usize,
}

impl RouteStats {
    pub fn is_feasible(&self) -> bool {
        self.time_warp == Duration::ZERO
            && self.excess_distance == Distance::ZERO
            && self.excess_load.iter().all(|&load| load == Load::ZERO)
    }
}

/// The visit segment for a client or reload-depot stop. The start and end
/// depots of a route are windowed by the vehicle shift instead; see
/// [`start_segment`] and [`end_segment`].
pub(crate) fn visit_segment(
    data: &ProblemData,
    location: usize,
) -> DurationSegment {
    if data.is_depot(location) {
        let depot = data.depot(location);
        DurationSegment::visit(
            depot.service_duration,
            depot.tw_early,
            depot.tw_late,
            Duration::ZERO,
        )
    } else {
        let client = data.client(location);
        DurationSegment::visit(
            client.service_duration,
            client.tw_early,
            client.tw_late,
            client.release_time,
        )
    }
}

/// Departure segment at the start depot: constrained by the vehicle shift,
/// not the depot.
pub(crate) fn start_segment(data: &ProblemData, veh_type: usize) -> DurationSegment {
    let veh = data.vehicle_type(veh_type);
    DurationSegment::visit(
        Duration::ZERO,
        veh.tw_early,
        veh.latest_start(),
        Duration::ZERO,
    )
}

/// Return segment at the end depot: the vehicle must be back within its
/// shift window.
pub(crate) fn end_segment(data: &ProblemData, veh_type: usize) -> DurationSegment {
    let veh = data.vehicle_type(veh_type);
    DurationSegment::visit(Duration::ZERO, veh.tw_early, veh.tw_late, Duration::ZERO)
}

/// Compute the totals of a route visiting `locs` in order. The sequence must
/// start at the vehicle's start depot and end at its end depot; interior
/// depots are reload stops. Empty trips are tolerated: they arise transiently
/// during search and are priced like any other reload visit.
///
/// Fails with `RouteShape` when the vehicle may not reload at an interior
/// depot, or when the trip count exceeds the vehicle's limit.
pub(crate) fn compute_route_stats(
    data: &ProblemData,
    veh_type: usize,
    locs: &[usize],
) -> Result<RouteStats> {
    debug_assert!(locs.len() >= 2, "route must at least contain its depots");

    let veh = data.vehicle_type(veh_type);
    let num_dims = data.num_load_dimensions();

    let mut stats = RouteStats {
        excess_load: vec![Load::ZERO; num_dims],
        trip_loads: vec![vec![]; num_dims],
        num_trips: 1,
        ..RouteStats::default()
    };

    if locs.len() == 2 {
        // An empty route incurs nothing.
        stats.num_trips = 0;
        return Ok(stats);
    }

    for &loc in locs.iter().skip(1).take(locs.len() - 2) {
        if data.is_depot(loc) {
            if !veh.reload_depots.contains(&loc) {
                return Err(Error::RouteShape(
                    "vehicle may not reload at this depot".into(),
                ));
            }

            stats.num_trips += 1;
        }
    }

    if stats.num_trips > veh.max_trips() {
        return Err(Error::RouteShape("too many trips for this vehicle".into()));
    }

    let dist_mat = data.distance_matrix(veh.profile);
    let dur_mat = data.duration_matrix(veh.profile);

    // Per-dimension load, reset at every reload depot. The first trip starts
    // with the vehicle's initial load on board.
    let mut trip_load = vec![LoadSegment::default(); num_dims];
    for (dim, seg) in trip_load.iter_mut().enumerate() {
        if let Some(&initial) = veh.initial_load.get(dim) {
            *seg = LoadSegment::initial(initial);
        }
    }

    let close_trip = |stats: &mut RouteStats, trip_load: &mut [LoadSegment]| {
        for (dim, seg) in trip_load.iter_mut().enumerate() {
            let capacity = veh.capacity[dim];
            stats.excess_load[dim] += seg.finalise(capacity).excess_load();
            stats.trip_loads[dim].push(seg.load());
            *seg = LoadSegment::default();
        }
    };

    let mut schedule = start_segment(data, veh_type);

    for (idx, &loc) in locs.iter().enumerate().skip(1) {
        let prev = locs[idx - 1];
        let edge = dur_mat.get(prev, loc);

        stats.distance += dist_mat.get(prev, loc);
        stats.travel_duration += edge;

        let visit = if idx == locs.len() - 1 {
            end_segment(data, veh_type)
        } else {
            visit_segment(data, loc)
        };
        schedule = DurationSegment::merge(edge, &schedule, &visit);

        if data.is_depot(loc) {
            if idx != locs.len() - 1 {
                // A reload stop closes the running trip.
                stats.service_duration += data.depot(loc).service_duration;
                stats.reload_costs += data.depot(loc).reload_cost;
                schedule = schedule.finalise_back();
                close_trip(&mut stats, &mut trip_load);
            }
        } else {
            let client = data.client(loc);
            stats.service_duration += client.service_duration;
            stats.prizes += client.prize;
            stats.num_clients += 1;

            for dim in 0..num_dims {
                let visit = LoadSegment::client(client.delivery[dim], client.pickup[dim]);
                trip_load[dim] = LoadSegment::merge(&trip_load[dim], &visit);
            }
        }
    }

    let finished = schedule.finalise_back();
    close_trip(&mut stats, &mut trip_load);

    stats.duration = finished.cum_duration();
    stats.time_warp = finished.cum_time_warp();

    // Work past the shift length is overtime up to the allowed maximum, and
    // time warp beyond that.
    let over_shift = (stats.duration - veh.shift_duration).non_negative();
    stats.overtime = over_shift.min(veh.max_overtime);
    stats.time_warp += over_shift - stats.overtime;

    stats.excess_distance = (stats.distance - veh.max_distance).non_negative();
    stats.wait_duration =
        (stats.duration - stats.travel_duration - stats.service_duration).non_negative();

    Ok(stats)
}
