//! # vrp_search
//!
//! A local-search engine for the vehicle routing problem and its rich
//! variants: capacitated, time-windowed, prize-collecting, multi-depot,
//! multi-trip with reload depots, heterogeneous fleets, client groups, and
//! same-vehicle constraints.
//!
//! Given a problem instance and an initial (possibly empty) solution, the
//! engine repeatedly applies improving moves from a library of intra- and
//! inter-route operators, interleaved with randomised perturbation, until a
//! local optimum is reached. It is typically embedded as the improvement
//! step of a metaheuristic such as hybrid genetic search.
//!
//! ```no_run
//! use vrp_search::local_search::operator::{NodeOperatorKind, RouteOperatorKind};
//! use vrp_search::local_search::perturb::PerturbationParams;
//! use vrp_search::local_search::space::{compute_neighbours, NeighbourhoodParams};
//! use vrp_search::local_search::LocalSearch;
//! use vrp_search::{CostEvaluator, ProblemData, RandomNumberGenerator, Solution};
//!
//! # fn example(data: ProblemData) -> Result<(), vrp_search::Error> {
//! let neighbours = compute_neighbours(&data, NeighbourhoodParams::default());
//! let mut search = LocalSearch::new(&data, neighbours, PerturbationParams::default(), 42);
//! search.add_node_operator(NodeOperatorKind::Exchange10)?;
//! search.add_route_operator(RouteOperatorKind::SwapStar)?;
//!
//! let cost_evaluator = CostEvaluator::new(vec![20.into()], 6.into(), 6.into())?;
//! let mut rng = RandomNumberGenerator::new(42);
//! let initial = Solution::random(&data, &mut rng);
//!
//! search.shuffle();
//! let improved = search.run(&initial, &cost_evaluator, false);
//! # let _ = improved;
//! # Ok(())
//! # }
//! ```

pub mod cost;
pub mod error;
pub mod local_search;
pub mod matrix;
pub mod measure;
pub mod problem;
pub mod rng;
pub mod route_stats;
pub mod segment;
pub mod solution;

pub use cost::CostEvaluator;
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use measure::{Coordinate, Cost, Distance, Duration, Load};
pub use problem::{Client, ClientGroup, Depot, ProblemData, SameVehicleGroup, VehicleType};
pub use rng::RandomNumberGenerator;
pub use route_stats::RouteStats;
pub use segment::{DurationSegment, LoadSegment};
pub use solution::{Route, Solution, Trip};
