//! Tests for problem data validation, the immutable solution model, and the
//! cost evaluator.

use vrp_search::{
    Client, ClientGroup, CostEvaluator, Depot, Error, Matrix, ProblemData,
    RandomNumberGenerator, Solution, VehicleType,
};
use vrp_search::measure::{Cost, Distance, Duration, Load};

/// Build an instance from explicit distance entries; durations mirror the
/// distances.
fn instance(
    clients: Vec<Client>,
    vehicle: VehicleType,
    distances: Vec<i64>,
) -> ProblemData {
    let size = clients.len() + 1;
    assert_eq!(distances.len(), size * size);

    let dist = Matrix::from_data(size, distances.iter().map(|&d| Distance::new(d)).collect());
    let dur = Matrix::from_data(size, distances.iter().map(|&d| Duration::new(d)).collect());

    ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![vehicle],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .expect("valid test instance")
}

fn unit_client(delivery: i64) -> Client {
    Client {
        delivery: vec![Load::new(delivery)],
        pickup: vec![Load::new(0)],
        ..Client::default()
    }
}

fn unit_vehicle(capacity: i64, num_available: usize) -> VehicleType {
    VehicleType {
        num_available,
        capacity: vec![Load::new(capacity)],
        ..VehicleType::default()
    }
}

#[rustfmt::skip]
fn square_distances() -> Vec<i64> {
    // depot, then two clients on a line: d(0,1) = 2, d(1,2) = 3, d(0,2) = 5.
    vec![
        0, 2, 5,
        2, 0, 3,
        5, 3, 0,
    ]
}

#[test]
fn problem_data_rejects_inverted_time_windows() {
    let mut client = unit_client(1);
    client.tw_early = Duration::new(10);
    client.tw_late = Duration::new(5);

    let size = 2;
    let dist = Matrix::from_data(size, vec![Distance::new(0); size * size]);
    let dur = Matrix::from_data(size, vec![Duration::new(0); size * size]);

    let result = ProblemData::new(
        vec![client],
        vec![Depot::default()],
        vec![unit_vehicle(10, 1)],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    );

    assert!(matches!(result, Err(Error::InvalidInstance(_))));
}

#[test]
fn problem_data_rejects_nonzero_diagonal() {
    let size = 2;
    let dist = Matrix::from_data(size, vec![Distance::new(1); size * size]);
    let dur = Matrix::from_data(size, vec![Duration::new(0); size * size]);

    let result = ProblemData::new(
        vec![unit_client(1)],
        vec![Depot::default()],
        vec![unit_vehicle(10, 1)],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    );

    assert!(matches!(result, Err(Error::InvalidInstance(_))));
}

#[test]
fn problem_data_rejects_restricted_depot_windows() {
    let size = 2;
    let dist = Matrix::from_data(size, vec![Distance::new(0); size * size]);
    let dur = Matrix::from_data(size, vec![Duration::new(0); size * size]);

    let depot = Depot {
        tw_late: Duration::new(100),
        ..Depot::default()
    };

    let result = ProblemData::new(
        vec![unit_client(1)],
        vec![depot],
        vec![unit_vehicle(10, 1)],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    );

    assert!(matches!(result, Err(Error::InvalidInstance(_))));
}

#[test]
fn problem_data_rejects_depot_group_members() {
    let size = 2;
    let dist = Matrix::from_data(size, vec![Distance::new(0); size * size]);
    let dur = Matrix::from_data(size, vec![Duration::new(0); size * size]);

    let group = ClientGroup {
        clients: vec![0], // a depot, not a client
        required: false,
        mutually_exclusive: true,
        name: String::new(),
    };

    let result = ProblemData::new(
        vec![unit_client(1)],
        vec![Depot::default()],
        vec![unit_vehicle(10, 1)],
        vec![dist],
        vec![dur],
        vec![group],
        vec![],
    );

    assert!(matches!(result, Err(Error::InvalidInstance(_))));
}

#[test]
fn cost_evaluator_rejects_negative_penalties() {
    let result = CostEvaluator::new(vec![Cost::new(-1)], Cost::new(0), Cost::new(0));
    assert!(matches!(result, Err(Error::InvalidPenalty(_))));

    let result = CostEvaluator::new(vec![], Cost::new(-3), Cost::new(0));
    assert!(matches!(result, Err(Error::InvalidPenalty(_))));
}

#[test]
fn from_routes_rejects_duplicate_clients() {
    let data = instance(
        vec![unit_client(1), unit_client(1)],
        unit_vehicle(10, 2),
        square_distances(),
    );

    let result = Solution::from_routes(&data, vec![vec![1], vec![1]]);
    assert!(matches!(result, Err(Error::InvalidSolution(_))));
}

#[test]
fn from_routes_rejects_too_many_routes() {
    let data = instance(
        vec![unit_client(1), unit_client(1)],
        unit_vehicle(10, 1),
        square_distances(),
    );

    let result = Solution::from_routes(&data, vec![vec![1], vec![2]]);
    assert!(matches!(result, Err(Error::InvalidSolution(_))));
}

#[test]
fn route_stats_match_hand_computation() {
    let data = instance(
        vec![unit_client(1), unit_client(2)],
        unit_vehicle(10, 1),
        square_distances(),
    );

    let solution = Solution::from_routes(&data, vec![vec![1, 2]]).unwrap();
    let route = &solution.routes()[0];

    // depot -> 1 -> 2 -> depot
    assert_eq!(route.distance(), Distance::new(2 + 3 + 5));
    assert_eq!(route.duration(), Duration::new(2 + 3 + 5));
    assert_eq!(route.time_warp(), Duration::new(0));
    assert!(route.is_feasible());
    assert_eq!(route.num_trips(), 1);
    assert_eq!(route.num_clients(), 2);
}

#[test]
fn overloaded_route_is_infeasible_but_priced() {
    let data = instance(
        vec![unit_client(8), unit_client(7)],
        unit_vehicle(10, 1),
        square_distances(),
    );

    let solution = Solution::from_routes(&data, vec![vec![1, 2]]).unwrap();
    assert!(!solution.is_feasible());

    let evaluator = CostEvaluator::new(vec![Cost::new(100)], Cost::new(0), Cost::new(0)).unwrap();

    // Distance 10, plus 5 units of excess load at penalty 100.
    assert_eq!(
        evaluator.penalised_cost(&data, &solution),
        Cost::new(10 + 5 * 100)
    );
    assert_eq!(evaluator.cost(&data, &solution), Cost::MAX);
}

#[test]
fn random_solution_routes_every_client() {
    let data = instance(
        vec![unit_client(1), unit_client(1)],
        unit_vehicle(10, 2),
        square_distances(),
    );

    let mut rng = RandomNumberGenerator::new(7);
    let solution = Solution::random(&data, &mut rng);

    assert!(solution.unassigned().is_empty());
    assert_eq!(solution.num_clients(), 2);
    assert!(solution.is_complete(&data));
}

#[test]
fn solution_equality_is_structural() {
    let data = instance(
        vec![unit_client(1), unit_client(1)],
        unit_vehicle(10, 2),
        square_distances(),
    );

    let first = Solution::from_routes(&data, vec![vec![1, 2]]).unwrap();
    let second = Solution::from_routes(&data, vec![vec![1, 2]]).unwrap();
    let different = Solution::from_routes(&data, vec![vec![2, 1]]).unwrap();

    assert_eq!(first, second);
    assert_ne!(first, different);
}
