//! End-to-end scenarios covering the main problem variants.

use vrp_search::local_search::perturb::PerturbationParams;
use vrp_search::local_search::space::{compute_neighbours, NeighbourhoodParams};
use vrp_search::local_search::LocalSearch;
use vrp_search::measure::{Cost, Distance, Duration, Load};
use vrp_search::{
    Client, ClientGroup, CostEvaluator, Depot, Matrix, ProblemData, RandomNumberGenerator,
    Solution, VehicleType,
};

fn euclidean_matrices(coords: &[(i64, i64)]) -> (Matrix<Distance>, Matrix<Duration>) {
    let n = coords.len();
    let mut raw = Vec::with_capacity(n * n);
    for &(x1, y1) in coords {
        for &(x2, y2) in coords {
            let dx = (x1 - x2) as f64;
            let dy = (y1 - y2) as f64;
            raw.push((dx * dx + dy * dy).sqrt().round() as i64);
        }
    }

    (
        Matrix::from_data(n, raw.iter().map(|&d| Distance::new(d)).collect()),
        Matrix::from_data(n, raw.iter().map(|&d| Duration::new(d)).collect()),
    )
}

fn make_search<'a>(data: &'a ProblemData, seed: u32) -> LocalSearch<'a> {
    let neighbours = compute_neighbours(data, NeighbourhoodParams::default());
    let mut search = LocalSearch::new(data, neighbours, PerturbationParams::default(), seed);
    search.add_default_operators();
    search
}

fn default_evaluator() -> CostEvaluator {
    CostEvaluator::new(vec![Cost::new(20)], Cost::new(10), Cost::new(10)).unwrap()
}

/// Trivial CVRP: four unit-demand clients around the depot, one vehicle.
#[test]
fn trivial_cvrp_collapses_to_one_route() {
    let coords = [(0, 0), (1, 0), (0, 1), (-1, 0), (0, -1)];
    let (dist, dur) = euclidean_matrices(&coords);

    let clients = coords[1..]
        .iter()
        .map(|&(x, y)| Client {
            x: x.into(),
            y: y.into(),
            delivery: vec![Load::new(1)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let data = ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 1,
            capacity: vec![Load::new(4)],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let mut rng = RandomNumberGenerator::new(1);
    let initial = Solution::random(&data, &mut rng);

    let mut search = make_search(&data, 1);
    let improved = search.run(&initial, &default_evaluator(), true);

    assert!(improved.is_feasible());
    assert_eq!(improved.num_routes(), 1);
    assert_eq!(improved.routes()[0].num_clients(), 4);

    // A cyclic order over the ring: two unit depot legs plus three unit
    // hops between adjacent clients (round(sqrt 2) = 1).
    assert_eq!(improved.distance(), Distance::new(5));
}

/// Time-window infeasibility: the late client must be dropped to make the
/// route feasible.
#[test]
fn infeasible_time_window_client_is_dropped() {
    let coords = [(0, 0), (1, 0), (2, 0)];
    let (dist, dur) = euclidean_matrices(&coords);

    // No load dimensions in this instance: both clients and the vehicle
    // carry empty load vectors.
    let early_client = Client {
        x: 1.into(),
        tw_early: Duration::new(0),
        tw_late: Duration::new(10),
        delivery: vec![],
        pickup: vec![],
        ..Client::default()
    };
    let late_client = Client {
        x: 2.into(),
        tw_early: Duration::new(100),
        tw_late: Duration::new(110),
        required: false,
        prize: Cost::new(1),
        delivery: vec![],
        pickup: vec![],
        ..Client::default()
    };

    let data = ProblemData::new(
        vec![early_client, late_client],
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 1,
            capacity: vec![],
            tw_early: Duration::new(0),
            tw_late: Duration::new(50),
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let initial = Solution::from_routes(&data, vec![vec![1, 2]]).unwrap();
    assert!(initial.time_warp() > Duration::new(0));

    let mut search = make_search(&data, 7);
    let improved = search.run(&initial, &default_evaluator(), true);

    assert!(improved.is_feasible());
    assert_eq!(improved.unassigned(), &[2]);
    assert_eq!(improved.num_clients(), 1);
}

/// Prize collecting: only the client whose prize outweighs its detour is
/// served.
#[test]
fn prize_collecting_serves_profitable_clients_only() {
    // Explicit matrices: visiting client 1 costs 10 round trip, clients 2
    // and 3 cost 50 each.
    #[rustfmt::skip]
    let raw = vec![
        0, 5, 25, 25,
        5, 0, 25, 25,
        25, 25, 0, 25,
        25, 25, 25, 0,
    ];
    let dist = Matrix::from_data(4, raw.iter().map(|&d| Distance::new(d)).collect());
    let dur = Matrix::from_data(4, raw.iter().map(|&d| Duration::new(d)).collect());

    let prizes = [100, 1, 1];
    let clients = prizes
        .iter()
        .map(|&prize| Client {
            required: false,
            prize: Cost::new(prize),
            delivery: vec![],
            pickup: vec![],
            ..Client::default()
        })
        .collect();

    let data = ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 1,
            capacity: vec![],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let initial = Solution::from_routes(&data, vec![]).unwrap();

    let mut search = make_search(&data, 3);
    let cost_evaluator = default_evaluator();
    let improved = search.search(&initial, &cost_evaluator);

    assert_eq!(improved.num_clients(), 1);
    assert!(improved.routes()[0].visits().eq([1usize]));
    assert_eq!(cost_evaluator.cost(&data, &improved), Cost::new(10 - 100));
}

/// Mutually-exclusive group: of three routed members, exactly one survives.
#[test]
fn mutually_exclusive_group_keeps_one_member() {
    let coords = [(0, 0), (1, 1), (2, 2), (3, 3)];
    let (dist, dur) = euclidean_matrices(&coords);

    let clients = (0..3)
        .map(|idx| Client {
            x: (idx as i64 + 1).into(),
            y: (idx as i64 + 1).into(),
            required: false,
            group: Some(0),
            delivery: vec![Load::new(1)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let group = ClientGroup {
        clients: vec![1, 2, 3],
        required: true,
        mutually_exclusive: true,
        name: String::new(),
    };

    let data = ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 2,
            capacity: vec![Load::new(10)],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![group],
        vec![],
    )
    .unwrap();

    let initial = Solution::from_routes(&data, vec![vec![1, 2, 3]]).unwrap();
    assert!(!initial.is_group_feasible(&data));

    let mut search = make_search(&data, 11);
    let improved = search.search(&initial, &default_evaluator());

    assert!(improved.is_group_feasible(&data));
    assert_eq!(improved.num_clients(), 1);
}

/// Multi-trip: three bulky prized clients force at least one reload.
#[test]
fn multi_trip_route_reloads_at_the_depot() {
    let coords = [(0, 0), (1, 0), (0, 1), (-1, 0)];
    let (dist, dur) = euclidean_matrices(&coords);

    let clients = coords[1..]
        .iter()
        .map(|&(x, y)| Client {
            x: x.into(),
            y: y.into(),
            required: false,
            prize: Cost::new(1_000),
            delivery: vec![Load::new(6)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let data = ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 1,
            capacity: vec![Load::new(10)],
            reload_depots: vec![0],
            max_reloads: 4,
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let initial = Solution::from_routes(&data, vec![]).unwrap();

    let mut search = make_search(&data, 5);
    let improved = search.search(&initial, &default_evaluator());

    assert_eq!(improved.num_clients(), 3);
    assert!(improved.is_feasible());
    assert!(improved.routes().iter().any(|route| route.num_trips() >= 2));
}

/// A fresh trip is only considered when the client's and the vehicle's time
/// windows can actually be met; otherwise the prize must not buy an
/// immediately infeasible trip.
#[test]
fn new_trip_respects_client_and_vehicle_windows() {
    let coords = [(0, 0), (1, 0), (2, 0)];
    let (dist, dur) = euclidean_matrices(&coords);

    // The nearby client is worth serving; the far one opens for business
    // only long after the vehicle's shift has ended.
    let reachable = Client {
        x: 1.into(),
        required: false,
        prize: Cost::new(50),
        delivery: vec![Load::new(6)],
        pickup: vec![Load::new(0)],
        ..Client::default()
    };
    let unreachable = Client {
        x: 2.into(),
        required: false,
        prize: Cost::new(30),
        tw_early: Duration::new(100),
        tw_late: Duration::new(110),
        delivery: vec![Load::new(6)],
        pickup: vec![Load::new(0)],
        ..Client::default()
    };

    let data = ProblemData::new(
        vec![reachable, unreachable],
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 1,
            capacity: vec![Load::new(10)],
            tw_early: Duration::new(0),
            tw_late: Duration::new(50),
            reload_depots: vec![0],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let initial = Solution::from_routes(&data, vec![]).unwrap();

    let evaluator =
        CostEvaluator::new(vec![Cost::new(20)], Cost::new(100), Cost::new(10)).unwrap();

    let mut search = make_search(&data, 13);
    let improved = search.search(&initial, &evaluator);

    // The prized-but-unreachable client must stay out: a reload trip for it
    // could only be served with time warp.
    assert_eq!(improved.num_clients(), 1);
    assert_eq!(improved.unassigned(), &[2]);
    assert!(improved.is_feasible());
}

/// Determinism: identical seeds and inputs give identical results.
#[test]
fn fixed_seed_runs_are_identical() {
    let coords = [(0, 0), (4, 3), (-2, 5), (6, -1), (-3, -4), (1, 7)];
    let (dist, dur) = euclidean_matrices(&coords);

    let clients: Vec<Client> = coords[1..]
        .iter()
        .map(|&(x, y)| Client {
            x: x.into(),
            y: y.into(),
            delivery: vec![Load::new(2)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let data = ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 3,
            capacity: vec![Load::new(5)],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let run = || {
        let mut rng = RandomNumberGenerator::new(42);
        let initial = Solution::random(&data, &mut rng);

        let mut search = make_search(&data, 42);
        search.shuffle();
        let improved = search.run(&initial, &default_evaluator(), false);
        (improved, search.statistics())
    };

    let (first_solution, first_stats) = run();
    let (second_solution, second_stats) = run();

    assert_eq!(first_solution, second_solution);
    assert_eq!(first_stats, second_stats);
}

/// Exhaustive mode is idempotent: a second pass changes nothing.
#[test]
fn exhaustive_runs_reach_a_fixpoint() {
    let coords = [(0, 0), (4, 3), (-2, 5), (6, -1), (-3, -4)];
    let (dist, dur) = euclidean_matrices(&coords);

    let clients: Vec<Client> = coords[1..]
        .iter()
        .map(|&(x, y)| Client {
            x: x.into(),
            y: y.into(),
            delivery: vec![Load::new(2)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let data = ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 2,
            capacity: vec![Load::new(5)],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let mut rng = RandomNumberGenerator::new(9);
    let initial = Solution::random(&data, &mut rng);

    let mut search = make_search(&data, 9);
    let once = search.run(&initial, &default_evaluator(), true);
    let twice = search.run(&once, &default_evaluator(), true);

    assert_eq!(once, twice);
}
