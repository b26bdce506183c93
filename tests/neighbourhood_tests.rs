//! Tests for the proximity-based neighbourhood construction.

use vrp_search::local_search::space::{compute_neighbours, NeighbourhoodParams};
use vrp_search::measure::{Cost, Distance, Duration, Load};
use vrp_search::{Client, ClientGroup, Depot, Matrix, ProblemData, VehicleType};

fn line_instance(num_clients: usize, groups: Vec<ClientGroup>) -> ProblemData {
    // Depot at 0, clients at 1, 2, ..., n on a line.
    let size = num_clients + 1;
    let mut distances = Vec::with_capacity(size * size);
    for i in 0..size as i64 {
        for j in 0..size as i64 {
            distances.push((i - j).abs());
        }
    }

    let clients = (0..num_clients)
        .map(|idx| Client {
            x: (idx as i64 + 1).into(),
            group: groups
                .iter()
                .position(|group| group.clients.contains(&(idx + 1)))
                .filter(|_| !groups.is_empty()),
            required: false,
            ..Client::default()
        })
        .collect();

    let dist = Matrix::from_data(size, distances.iter().map(|&d| Distance::new(d)).collect());
    let dur = Matrix::from_data(size, distances.iter().map(|&d| Duration::new(d)).collect());

    ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![VehicleType {
            num_available: 2,
            capacity: vec![Load::new(100)],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        groups,
        vec![],
    )
    .unwrap()
}

fn client_defaults() -> Client {
    Client {
        delivery: vec![Load::new(0)],
        pickup: vec![Load::new(0)],
        ..Client::default()
    }
}

#[test]
fn neighbour_lists_cover_clients_only() {
    let data = line_instance(5, vec![]);
    let neighbours = compute_neighbours(&data, NeighbourhoodParams::default());

    assert!(neighbours[0].is_empty(), "depots have no neighbours");

    for loc in 1..=5 {
        assert_eq!(neighbours[loc].len(), 4); // min(60, n - 1)
        assert!(!neighbours[loc].contains(&0));
        assert!(!neighbours[loc].contains(&loc));
    }
}

#[test]
fn k_limits_the_list_length() {
    let data = line_instance(5, vec![]);
    let params = NeighbourhoodParams {
        num_neighbours: 2,
        ..NeighbourhoodParams::default()
    };
    let neighbours = compute_neighbours(&data, params);

    for loc in 1..=5 {
        assert_eq!(neighbours[loc].len(), 2);
    }

    // The two nearest on the line are the adjacent clients.
    assert!(neighbours[3].contains(&2));
    assert!(neighbours[3].contains(&4));
}

#[test]
fn symmetric_lists_mirror_each_other() {
    let data = line_instance(6, vec![]);
    let params = NeighbourhoodParams {
        num_neighbours: 5, // full lists, so the cut cannot break symmetry
        ..NeighbourhoodParams::default()
    };
    let neighbours = compute_neighbours(&data, params);

    for i in 1..=6 {
        for &j in &neighbours[i] {
            assert!(
                neighbours[j].contains(&i),
                "{} in neighbours[{}] but not vice versa",
                j,
                i
            );
        }
    }
}

#[test]
fn mutually_exclusive_group_members_are_not_neighbours() {
    let group = ClientGroup {
        clients: vec![1, 2],
        required: false,
        mutually_exclusive: true,
        name: String::new(),
    };
    let data = line_instance(5, vec![group]);

    let params = NeighbourhoodParams {
        num_neighbours: 3,
        ..NeighbourhoodParams::default()
    };
    let neighbours = compute_neighbours(&data, params);

    // Clients 1 and 2 are adjacent on the line, yet never neighbours.
    assert!(!neighbours[1].contains(&2));
    assert!(!neighbours[2].contains(&1));
}

#[test]
fn prizes_pull_clients_into_lists() {
    // Client 5 is far from client 1, but a big prize makes it attractive.
    let mut data_clients: Vec<Client> = (0..5)
        .map(|idx| Client {
            x: ((idx as i64 + 1) * 10).into(),
            required: false,
            ..client_defaults()
        })
        .collect();
    data_clients[4].prize = Cost::new(1_000);

    let size = 6;
    let mut distances = Vec::with_capacity(size * size);
    for i in 0..size as i64 {
        for j in 0..size as i64 {
            distances.push((i - j).abs() * 10);
        }
    }

    let dist = Matrix::from_data(size, distances.iter().map(|&d| Distance::new(d)).collect());
    let dur = Matrix::from_data(size, distances.iter().map(|&d| Duration::new(d)).collect());

    let data = ProblemData::new(
        data_clients,
        vec![Depot::default()],
        vec![VehicleType {
            capacity: vec![Load::new(100)],
            ..VehicleType::default()
        }],
        vec![dist],
        vec![dur],
        vec![],
        vec![],
    )
    .unwrap();

    let params = NeighbourhoodParams {
        num_neighbours: 1,
        symmetric: false,
        ..NeighbourhoodParams::default()
    };
    let neighbours = compute_neighbours(&data, params);

    // Without the prize the single neighbour of client 1 would be client 2.
    assert_eq!(neighbours[1], vec![5]);
}
