//! Problem instance definition: clients, depots, vehicle types, travel
//! matrices, and client groups. Instances are immutable after construction
//! and validated up front.

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::measure::{Coordinate, Cost, Distance, Duration, Load};
use serde::{Deserialize, Serialize};

/// A location that may be visited, with demand, time window, and optional
/// prize. Unrequired clients may be left out of a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub x: Coordinate,
    pub y: Coordinate,
    pub delivery: Vec<Load>,
    pub pickup: Vec<Load>,
    pub service_duration: Duration,
    pub tw_early: Duration,
    pub tw_late: Duration,
    pub release_time: Duration,
    pub prize: Cost,
    pub required: bool,
    /// Index of the mutually-exclusive group this client belongs to, if any.
    pub group: Option<usize>,
    pub name: String,
}

impl Default for Client {
    fn default() -> Self {
        Client {
            x: Coordinate::ZERO,
            y: Coordinate::ZERO,
            delivery: vec![Load::ZERO],
            pickup: vec![Load::ZERO],
            service_duration: Duration::ZERO,
            tw_early: Duration::ZERO,
            tw_late: Duration::MAX,
            release_time: Duration::ZERO,
            prize: Cost::ZERO,
            required: true,
            group: None,
            name: String::new(),
        }
    }
}

impl Client {
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        Client {
            x,
            y,
            ..Client::default()
        }
    }
}

/// A location where vehicles start, end, or reload mid-route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depot {
    pub x: Coordinate,
    pub y: Coordinate,
    pub tw_early: Duration,
    pub tw_late: Duration,
    pub service_duration: Duration,
    /// Charged each time the depot is visited as a reload stop.
    pub reload_cost: Cost,
}

impl Default for Depot {
    fn default() -> Self {
        Depot {
            x: Coordinate::ZERO,
            y: Coordinate::ZERO,
            tw_early: Duration::ZERO,
            tw_late: Duration::MAX,
            service_duration: Duration::ZERO,
            reload_cost: Cost::ZERO,
        }
    }
}

impl Depot {
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        Depot {
            x,
            y,
            ..Depot::default()
        }
    }
}

/// A class of identical vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleType {
    pub num_available: usize,
    pub capacity: Vec<Load>,
    pub start_depot: usize,
    pub end_depot: usize,
    pub fixed_cost: Cost,
    pub tw_early: Duration,
    pub tw_late: Duration,
    pub shift_duration: Duration,
    pub max_distance: Distance,
    pub unit_distance_cost: Cost,
    pub unit_duration_cost: Cost,
    pub profile: usize,
    /// Latest allowed departure from the start depot, if tighter than
    /// `tw_late`.
    pub start_late: Option<Duration>,
    /// Load already on board at the start of the first trip.
    pub initial_load: Vec<Load>,
    /// Depots where vehicles of this type may reload mid-route. Empty means
    /// single-trip routes only.
    pub reload_depots: Vec<usize>,
    pub max_reloads: usize,
    pub max_overtime: Duration,
    pub unit_overtime_cost: Cost,
    /// Vehicles sharing a non-empty name are treated as the same physical
    /// vehicle on different shifts.
    pub name: String,
}

impl Default for VehicleType {
    fn default() -> Self {
        VehicleType {
            num_available: 1,
            capacity: vec![],
            start_depot: 0,
            end_depot: 0,
            fixed_cost: Cost::ZERO,
            tw_early: Duration::ZERO,
            tw_late: Duration::MAX,
            shift_duration: Duration::MAX,
            max_distance: Distance::MAX,
            unit_distance_cost: Cost::new(1),
            unit_duration_cost: Cost::ZERO,
            profile: 0,
            start_late: None,
            initial_load: vec![],
            reload_depots: vec![],
            max_reloads: usize::MAX,
            max_overtime: Duration::ZERO,
            unit_overtime_cost: Cost::ZERO,
            name: String::new(),
        }
    }
}

impl VehicleType {
    /// Maximum number of trips a route of this type may consist of.
    pub fn max_trips(&self) -> usize {
        if self.reload_depots.is_empty() {
            1
        } else {
            self.max_reloads.saturating_add(1)
        }
    }

    /// Latest allowed departure from the start depot.
    pub fn latest_start(&self) -> Duration {
        self.start_late.unwrap_or(self.tw_late).min(self.tw_late)
    }
}

/// A group of clients of which at most one (when mutually exclusive) or at
/// least one (when required) must be visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientGroup {
    pub clients: Vec<usize>,
    pub required: bool,
    pub mutually_exclusive: bool,
    pub name: String,
}

/// A group of clients that must all be served by the same vehicle, possibly
/// across shifts of routes sharing a vehicle name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SameVehicleGroup {
    pub clients: Vec<usize>,
    pub name: String,
}

/// An immutable problem instance. Locations are indexed depots first, then
/// clients: location `num_depots + c` is client `c`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemData {
    clients: Vec<Client>,
    depots: Vec<Depot>,
    vehicle_types: Vec<VehicleType>,
    distance_matrices: Vec<Matrix<Distance>>,
    duration_matrices: Vec<Matrix<Duration>>,
    groups: Vec<ClientGroup>,
    same_vehicle_groups: Vec<SameVehicleGroup>,
    num_vehicles: usize,
    num_load_dimensions: usize,
    centroid: (f64, f64),
    has_time_windows: bool,
}

impl ProblemData {
    pub fn new(
        clients: Vec<Client>,
        depots: Vec<Depot>,
        vehicle_types: Vec<VehicleType>,
        distance_matrices: Vec<Matrix<Distance>>,
        duration_matrices: Vec<Matrix<Duration>>,
        groups: Vec<ClientGroup>,
        same_vehicle_groups: Vec<SameVehicleGroup>,
    ) -> Result<Self> {
        let num_depots = depots.len();
        let num_locations = num_depots + clients.len();

        if num_depots == 0 {
            return Err(Error::InvalidInstance("at least one depot required".into()));
        }

        for (idx, depot) in depots.iter().enumerate() {
            // Depot windows are fixed at [0, MAX]: vehicles may pass through
            // at any time, and shift limits live on the vehicle types. The
            // schedule algebra feeds these fields into every reload visit, so
            // anything else would silently change multi-trip feasibility.
            if depot.tw_early != Duration::ZERO || depot.tw_late != Duration::MAX {
                return Err(Error::InvalidInstance(format!(
                    "depot {} must have an unrestricted time window",
                    idx
                )));
            }
        }

        if vehicle_types.is_empty() {
            return Err(Error::InvalidInstance(
                "at least one vehicle type required".into(),
            ));
        }

        if distance_matrices.is_empty() || distance_matrices.len() != duration_matrices.len() {
            return Err(Error::InvalidInstance(
                "need equally many distance and duration matrices, at least one pair".into(),
            ));
        }

        for matrix in &distance_matrices {
            if matrix.size() != num_locations {
                return Err(Error::InvalidInstance(
                    "distance matrix does not cover all locations".into(),
                ));
            }

            for loc in 0..num_locations {
                if matrix.get(loc, loc) != Distance::ZERO {
                    return Err(Error::InvalidInstance(
                        "distance matrix diagonal must be zero".into(),
                    ));
                }
            }
        }

        for matrix in &duration_matrices {
            if matrix.size() != num_locations {
                return Err(Error::InvalidInstance(
                    "duration matrix does not cover all locations".into(),
                ));
            }

            for loc in 0..num_locations {
                if matrix.get(loc, loc) != Duration::ZERO {
                    return Err(Error::InvalidInstance(
                        "duration matrix diagonal must be zero".into(),
                    ));
                }
            }
        }

        let num_load_dimensions = vehicle_types
            .first()
            .map(|veh| veh.capacity.len())
            .unwrap_or_default();

        for (idx, client) in clients.iter().enumerate() {
            if client.tw_early > client.tw_late {
                return Err(Error::InvalidInstance(format!(
                    "client {} has an inverted time window",
                    idx
                )));
            }

            if client.delivery.len() != num_load_dimensions
                || client.pickup.len() != num_load_dimensions
            {
                return Err(Error::InvalidInstance(format!(
                    "client {} does not have {} load dimensions",
                    idx, num_load_dimensions
                )));
            }

            if let Some(group) = client.group {
                let in_group = groups
                    .get(group)
                    .map(|g| g.clients.contains(&(num_depots + idx)))
                    .unwrap_or(false);

                if !in_group {
                    return Err(Error::InvalidInstance(format!(
                        "client {} references a group it is not a member of",
                        idx
                    )));
                }
            }
        }

        for (idx, veh) in vehicle_types.iter().enumerate() {
            if veh.num_available == 0 {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} has no vehicles",
                    idx
                )));
            }

            if veh.tw_early > veh.tw_late {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} has an inverted shift window",
                    idx
                )));
            }

            if veh.start_depot >= num_depots || veh.end_depot >= num_depots {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} starts or ends at an unknown depot",
                    idx
                )));
            }

            if veh.profile >= distance_matrices.len() {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} uses an unknown profile",
                    idx
                )));
            }

            if veh.capacity.len() != num_load_dimensions {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} does not have {} load dimensions",
                    idx, num_load_dimensions
                )));
            }

            if !veh.initial_load.is_empty() && veh.initial_load.len() != num_load_dimensions {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} has a malformed initial load",
                    idx
                )));
            }

            if veh.reload_depots.iter().any(|&depot| depot >= num_depots) {
                return Err(Error::InvalidInstance(format!(
                    "vehicle type {} reloads at an unknown depot",
                    idx
                )));
            }
        }

        for (idx, group) in groups.iter().enumerate() {
            if group.clients.is_empty() {
                return Err(Error::InvalidInstance(format!("group {} is empty", idx)));
            }

            for &member in &group.clients {
                if member < num_depots || member >= num_locations {
                    return Err(Error::InvalidInstance(format!(
                        "group {} member {} is not a client",
                        idx, member
                    )));
                }
            }
        }

        for (idx, group) in same_vehicle_groups.iter().enumerate() {
            for &member in &group.clients {
                if member < num_depots || member >= num_locations {
                    return Err(Error::InvalidInstance(format!(
                        "same-vehicle group {} member {} is not a client",
                        idx, member
                    )));
                }
            }
        }

        let num_vehicles = vehicle_types.iter().map(|veh| veh.num_available).sum();

        let centroid = if clients.is_empty() {
            (0.0, 0.0)
        } else {
            let sum_x: i64 = clients.iter().map(|c| c.x.get()).sum();
            let sum_y: i64 = clients.iter().map(|c| c.y.get()).sum();
            (
                sum_x as f64 / clients.len() as f64,
                sum_y as f64 / clients.len() as f64,
            )
        };

        let has_time_windows = clients
            .iter()
            .any(|c| c.tw_early != Duration::ZERO || c.tw_late != Duration::MAX)
            || vehicle_types
                .iter()
                .any(|v| v.tw_early != Duration::ZERO || v.tw_late != Duration::MAX);

        Ok(ProblemData {
            clients,
            depots,
            vehicle_types,
            distance_matrices,
            duration_matrices,
            groups,
            same_vehicle_groups,
            num_vehicles,
            num_load_dimensions,
            centroid,
            has_time_windows,
        })
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    pub fn vehicle_type(&self, veh_type: usize) -> &VehicleType {
        &self.vehicle_types[veh_type]
    }

    pub fn num_depots(&self) -> usize {
        self.depots.len()
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn num_locations(&self) -> usize {
        self.depots.len() + self.clients.len()
    }

    pub fn num_vehicle_types(&self) -> usize {
        self.vehicle_types.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn num_profiles(&self) -> usize {
        self.distance_matrices.len()
    }

    pub fn num_load_dimensions(&self) -> usize {
        self.num_load_dimensions
    }

    /// Whether the given location index refers to a depot.
    pub fn is_depot(&self, location: usize) -> bool {
        location < self.depots.len()
    }

    /// The client at the given location index. The location must not be a
    /// depot.
    pub fn client(&self, location: usize) -> &Client {
        debug_assert!(!self.is_depot(location));
        &self.clients[location - self.depots.len()]
    }

    /// The depot at the given location index.
    pub fn depot(&self, location: usize) -> &Depot {
        debug_assert!(self.is_depot(location));
        &self.depots[location]
    }

    /// Planar coordinates of the given location.
    pub fn location_xy(&self, location: usize) -> (Coordinate, Coordinate) {
        if self.is_depot(location) {
            let depot = &self.depots[location];
            (depot.x, depot.y)
        } else {
            let client = self.client(location);
            (client.x, client.y)
        }
    }

    pub fn distance_matrix(&self, profile: usize) -> &Matrix<Distance> {
        &self.distance_matrices[profile]
    }

    pub fn duration_matrix(&self, profile: usize) -> &Matrix<Duration> {
        &self.duration_matrices[profile]
    }

    pub fn groups(&self) -> &[ClientGroup] {
        &self.groups
    }

    pub fn group(&self, group: usize) -> &ClientGroup {
        &self.groups[group]
    }

    pub fn same_vehicle_groups(&self) -> &[SameVehicleGroup] {
        &self.same_vehicle_groups
    }

    pub fn same_vehicle_group(&self, group: usize) -> &SameVehicleGroup {
        &self.same_vehicle_groups[group]
    }

    /// Centre of gravity of all client locations.
    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    /// Whether any client or vehicle shift has a restrictive time window.
    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }
}
