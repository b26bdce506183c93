//! Tests for the working route: mutations, cache rebuilds, and the
//! segment-backed queries.

use vrp_search::local_search::solution::WorkingSolution;
use vrp_search::measure::{Cost, Distance, Duration, Load};
use vrp_search::segment::DurationSegment;
use vrp_search::{Client, Depot, Matrix, ProblemData, VehicleType};

fn grid_distances(coords: &[(i64, i64)]) -> Vec<i64> {
    let n = coords.len();
    let mut out = Vec::with_capacity(n * n);
    for &(x1, y1) in coords {
        for &(x2, y2) in coords {
            let dx = (x1 - x2) as f64;
            let dy = (y1 - y2) as f64;
            out.push((dx * dx + dy * dy).sqrt().round() as i64);
        }
    }
    out
}

/// One depot at the origin and clients at the given coordinates, one vehicle
/// with the given capacity.
fn coord_instance(coords: &[(i64, i64)], demands: &[i64], capacity: i64) -> ProblemData {
    let mut all = vec![(0, 0)];
    all.extend_from_slice(coords);

    let clients = coords
        .iter()
        .zip(demands)
        .map(|(&(x, y), &demand)| Client {
            x: x.into(),
            y: y.into(),
            delivery: vec![Load::new(demand)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let distances = grid_distances(&all);
    let size = all.len();
    let dist = Matrix::from_data(size, distances.iter().map(|&d| Distance::new(d)).collect());
    let dur = Matrix::from_data(size, distances.iter().map(|&d| Duration::new(d)).collect());

    let vehicle = VehicleType {
        num_available: 2,
        capacity: vec![Load::new(capacity)],
        reload_depots: vec![0],
        max_reloads: 3,
        ..VehicleType::default()
    };

    ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![vehicle],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap()
}

#[test]
fn push_back_and_update_recompute_totals() {
    let data = coord_instance(&[(3, 0), (3, 4)], &[1, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
        route.push_back(2, nodes);
    }
    sol.update_route(&data, 0);

    let route = sol.route(0);
    // depot -> (3,0) -> (3,4) -> depot: 3 + 4 + 5.
    assert_eq!(route.distance(), Distance::new(12));
    assert_eq!(route.duration(), Duration::new(12));
    assert_eq!(route.num_clients(), 2);
    assert_eq!(route.num_trips(), 1);
    assert!(route.is_feasible());

    assert_eq!(sol.node(1).route(), Some(0));
    assert_eq!(sol.node(1).idx(), 1);
    assert_eq!(sol.node(2).idx(), 2);
}

#[test]
fn insert_and_remove_adjust_positions() {
    let data = coord_instance(&[(3, 0), (3, 4), (0, 4)], &[1, 1, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
        route.push_back(3, nodes);
        route.insert(2, 2, nodes);
    }
    sol.update_route(&data, 0);

    assert_eq!(sol.route(0).locations(), &[0, 1, 2, 3, 0]);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        let removed = route.remove(1, nodes);
        assert_eq!(removed, 1);
    }
    sol.update_route(&data, 0);

    assert_eq!(sol.route(0).locations(), &[0, 2, 3, 0]);
    assert_eq!(sol.node(1).route(), None);
    assert_eq!(sol.node(2).idx(), 1);
}

#[test]
fn reload_depot_starts_a_new_trip() {
    let data = coord_instance(&[(1, 0), (2, 0)], &[6, 6], 10);
    let mut sol = WorkingSolution::new(&data);

    let depot = sol.alloc_reload_node(0);
    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
        route.push_back(depot, nodes);
        route.push_back(2, nodes);
    }
    sol.update_route(&data, 0);

    let route = sol.route(0);
    assert_eq!(route.num_trips(), 2);
    assert_eq!(route.num_clients(), 2);

    // Each trip carries a single client, so capacity holds per trip.
    assert_eq!(route.trip_load(0, 0), Load::new(6));
    assert_eq!(route.trip_load(0, 1), Load::new(6));
    assert!(route.is_feasible());

    assert_eq!(sol.node(1).trip(), 0);
    assert_eq!(sol.node(2).trip(), 1);

    // Back and forth to (1,0), then to (2,0) and home.
    assert_eq!(route.distance(), Distance::new(1 + 1 + 2 + 2));
}

#[test]
fn overloaded_single_trip_has_excess_load() {
    let data = coord_instance(&[(1, 0), (2, 0)], &[6, 6], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
        route.push_back(2, nodes);
    }
    sol.update_route(&data, 0);

    assert_eq!(sol.route(0).excess_load(), &[Load::new(2)]);
    assert!(!sol.route(0).is_feasible());
}

#[test]
fn swap_nodes_moves_nodes_between_routes() {
    let data = coord_instance(&[(1, 0), (2, 0)], &[1, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
    }
    {
        let (route, nodes) = sol.route_and_nodes_mut(1);
        route.push_back(2, nodes);
    }

    sol.swap_nodes(1, 2);
    sol.update_route(&data, 0);
    sol.update_route(&data, 1);

    assert_eq!(sol.route(0).locations(), &[0, 2, 0]);
    assert_eq!(sol.route(1).locations(), &[0, 1, 0]);
    assert_eq!(sol.node(1).route(), Some(1));
    assert_eq!(sol.node(2).route(), Some(0));
}

#[test]
fn prefix_suffix_and_between_segments_agree() {
    let data = coord_instance(&[(1, 0), (2, 0), (3, 0)], &[1, 1, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        for client in [1, 2, 3] {
            route.push_back(client, nodes);
        }
    }
    sol.update_route(&data, 0);

    let route = sol.route(0);
    let dur_mat = data.duration_matrix(0);

    // Assembling the prefix from any split point gives the same aggregate.
    for split in 0..route.len() - 1 {
        let edge = dur_mat.get(route.location_at(split), route.location_at(split + 1));
        let merged = DurationSegment::merge(
            edge,
            route.dur_before(split),
            &route.dur_between(&data, split + 1, route.len() - 1),
        );
        assert_eq!(&merged, route.dur_before(route.len() - 1));
    }

    // The full prefix and the full suffix describe the same route.
    let full_prefix = route.dur_before(route.len() - 1);
    let full_suffix = route.dur_after(0);
    assert_eq!(full_prefix.total_duration(), full_suffix.total_duration());
    assert_eq!(full_prefix.total_time_warp(), full_suffix.total_time_warp());
    assert_eq!(full_prefix.total_duration(), route.duration());
}

#[test]
fn distance_and_prize_between_use_cumulative_caches() {
    let data = coord_instance(&[(1, 0), (2, 0), (3, 0)], &[1, 1, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        for client in [1, 2, 3] {
            route.push_back(client, nodes);
        }
    }
    sol.update_route(&data, 0);

    let route = sol.route(0);
    assert_eq!(route.distance_between(0, route.len() - 1), route.distance());
    assert_eq!(route.distance_between(1, 2), Distance::new(1));
    assert_eq!(route.prizes_between(0, route.len() - 1), Cost::new(0));
}

#[test]
fn load_and_unload_round_trip() {
    let data = coord_instance(&[(1, 0), (2, 0), (3, 0)], &[6, 6, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    // Multi-trip route plus a second single-visit route.
    let depot = sol.alloc_reload_node(0);
    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
        route.push_back(depot, nodes);
        route.push_back(2, nodes);
    }
    {
        let (route, nodes) = sol.route_and_nodes_mut(1);
        route.push_back(3, nodes);
    }
    sol.update_route(&data, 0);
    sol.update_route(&data, 1);

    let unloaded = sol.unload(&data);
    assert_eq!(unloaded.num_routes(), 2);
    assert_eq!(unloaded.routes()[0].num_trips(), 2);

    let mut reloaded = WorkingSolution::new(&data);
    reloaded.load(&data, &unloaded);

    assert_eq!(reloaded.route(0).locations(), sol.route(0).locations());
    assert_eq!(reloaded.route(1).locations(), sol.route(1).locations());
    assert_eq!(reloaded.unload(&data), unloaded);
}

#[test]
fn centroid_sectors_detect_overlap() {
    // Two routes on opposite sides of the centroid do not overlap; two
    // routes on the same side do.
    let data = coord_instance(&[(10, 1), (10, -1), (-10, 1), (-10, -1)], &[1, 1, 1, 1], 10);
    let mut sol = WorkingSolution::new(&data);

    {
        let (route, nodes) = sol.route_and_nodes_mut(0);
        route.push_back(1, nodes);
        route.push_back(2, nodes);
    }
    {
        let (route, nodes) = sol.route_and_nodes_mut(1);
        route.push_back(3, nodes);
        route.push_back(4, nodes);
    }
    sol.update_route(&data, 0);
    sol.update_route(&data, 1);

    assert!(!sol.route(0).overlaps_with(sol.route(1), 0.0));
    assert!(sol.route(0).overlaps_with(sol.route(0), 0.0));
    assert!(sol.route(0).overlaps_with(sol.route(1), 2.0 * std::f64::consts::PI));
}
