//! Basic example: improve a random solution for a synthetic instance.

use vrp_search::local_search::perturb::PerturbationParams;
use vrp_search::local_search::space::{compute_neighbours, NeighbourhoodParams};
use vrp_search::local_search::LocalSearch;
use vrp_search::measure::{Cost, Distance, Duration, Load};
use vrp_search::{
    Client, CostEvaluator, Depot, Matrix, ProblemData, RandomNumberGenerator, Solution,
    VehicleType,
};

/// Build a clustered instance: `num_clusters` groups of clients around the
/// depot, rounded Euclidean distances.
fn synthetic_instance(num_clusters: usize, per_cluster: usize) -> ProblemData {
    let mut coords = vec![(0i64, 0i64)];
    for cluster in 0..num_clusters {
        let angle = cluster as f64 / num_clusters as f64 * std::f64::consts::TAU;
        let (cx, cy) = (angle.cos() * 100.0, angle.sin() * 100.0);

        for spread in 0..per_cluster {
            let offset = spread as i64 - per_cluster as i64 / 2;
            coords.push((cx as i64 + offset * 3, cy as i64 + offset));
        }
    }

    let size = coords.len();
    let mut raw = Vec::with_capacity(size * size);
    for &(x1, y1) in &coords {
        for &(x2, y2) in &coords {
            let dx = (x1 - x2) as f64;
            let dy = (y1 - y2) as f64;
            raw.push((dx * dx + dy * dy).sqrt().round() as i64);
        }
    }

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

    let vehicle = VehicleType {
        num_available: num_clusters,
        capacity: vec![Load::new(per_cluster as i64 + 2)],
        ..VehicleType::default()
    };

    ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![vehicle],
        vec![Matrix::from_data(
            size,
            raw.iter().map(|&d| Distance::new(d)).collect(),
        )],
        vec![Matrix::from_data(
            size,
            raw.iter().map(|&d| Duration::new(d)).collect(),
        )],
        vec![],
        vec![],
    )
    .expect("synthetic instance is valid")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data = synthetic_instance(6, 8);
    println!(
        "instance: {} clients, {} vehicles",
        data.num_clients(),
        data.num_vehicles()
    );

    let neighbours = compute_neighbours(&data, NeighbourhoodParams::default());
    let mut search = LocalSearch::new(&data, neighbours, PerturbationParams::default(), 42);
    search.add_default_operators();

    let cost_evaluator = CostEvaluator::new(vec![Cost::new(20)], Cost::new(6), Cost::new(6))?;

    let mut rng = RandomNumberGenerator::new(42);
    let mut best = Solution::random(&data, &mut rng);
    println!(
        "initial distance: {}",
        cost_evaluator.penalised_cost(&data, &best)
    );

    // A handful of perturbed restarts around the incumbent.
    for iteration in 0..20 {
        search.shuffle();
        let candidate = search.run(&best, &cost_evaluator, false);

        if cost_evaluator.penalised_cost(&data, &candidate)
            < cost_evaluator.penalised_cost(&data, &best)
        {
            println!(
                "iteration {}: improved to {}",
                iteration,
                cost_evaluator.penalised_cost(&data, &candidate)
            );
            best = candidate;
        }
    }

    println!();
    println!("final distance: {}", best.distance());
    println!("feasible: {}", best.is_feasible());
    println!("routes: {}", best.num_routes());

    for (idx, route) in best.routes().iter().enumerate() {
        let visits: Vec<usize> = route.visits().collect();
        println!("route #{}: {:?}", idx + 1, visits);
    }

    let stats = search.statistics();
    println!();
    println!(
        "evaluated {} moves, applied {}",
        stats.num_moves, stats.num_improving
    );

    Ok(())
}
