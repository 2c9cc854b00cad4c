//! Simulation configuration
//!
//! All tunable numbers live in [`SimConfig`], which is built once and handed
//! to [`SimWorld::new`](super::SimWorld::new). Nothing in the simulation reads
//! global state, so tests can pin down every threshold they depend on.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::CommandParseError;

/// Named vehicle classes in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    Car,
    Bus,
    Truck,
    Motorcycle,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 4] = [
        VehicleKind::Car,
        VehicleKind::Bus,
        VehicleKind::Truck,
        VehicleKind::Motorcycle,
    ];
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleKind::Car => "Car",
            VehicleKind::Bus => "Bus",
            VehicleKind::Truck => "Truck",
            VehicleKind::Motorcycle => "Motorcycle",
        };
        f.write_str(name)
    }
}

impl FromStr for VehicleKind {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleKind::Car),
            "bus" => Ok(VehicleKind::Bus),
            "truck" => Ok(VehicleKind::Truck),
            "motorcycle" | "motorbike" => Ok(VehicleKind::Motorcycle),
            _ => Err(CommandParseError::UnknownVehicleClass(s.to_string())),
        }
    }
}

/// Physical properties shared by every vehicle of one kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleClass {
    pub length: f32,
    pub width: f32,
    /// Cruise speed in world units per second
    pub speed: f32,
    /// Display colour (RGB)
    pub color: (u8, u8, u8),
}

/// Traffic light timing bounds, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    pub min_green: f32,
    pub max_green: f32,
    pub yellow: f32,
    /// Number of clearance ratios kept per light
    pub history_len: usize,
}

impl TimingConfig {
    pub fn clamp_green(&self, seconds: f32) -> f32 {
        seconds.max(self.min_green).min(self.max_green)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_green: 10.0,
            max_green: 45.0,
            yellow: 3.0,
            history_len: 5,
        }
    }
}

/// Parameters of the two-junction East-West coordination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorConfig {
    /// Look-ahead distance for counting vehicles approaching a junction
    pub approach_distance: f32,
    /// Upstream East-West yields while the downstream junction holds more than this
    pub downstream_yield_threshold: usize,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            approach_distance: 200.0,
            downstream_yield_threshold: 3,
        }
    }
}

/// Which road layout and axis arbitration to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Two junctions on one East-West road, coordinated
    Corridor,
    /// One junction with density- and incident-aware arbitration
    SingleJunction,
}

/// Which green-time sizing strategy the lights use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreenStrategyKind {
    /// Density plus approach bonus plus clearance feedback
    Adaptive,
    /// Minimum plus the green range scaled by side density
    DensityScaled,
    /// Base plus a fixed amount per queued vehicle
    Linear,
}

/// Complete, immutable configuration for one simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub topology: Topology,
    pub green_strategy: GreenStrategyKind,

    pub world_width: f32,
    pub world_height: f32,
    /// Vehicles are dropped this far past the world edge
    pub off_bounds_margin: f32,
    /// Distance of a spawn point from the end of its road
    pub spawn_inset: f32,
    pub lane_width: f32,
    pub intersection_size: f32,
    /// Minimum gap kept between consecutive vehicles, beyond vehicle length
    pub vehicle_spacing: f32,

    pub incident_size: f32,
    /// Default incident distance from the lane reference point
    pub incident_offset: f32,
    pub incident_flash_interval: f32,
    /// Radius for clearing the incident nearest to a point
    pub incident_pick_radius: f32,

    /// Default tick length (60 Hz)
    pub tick_dt: f32,

    pub timing: TimingConfig,
    pub corridor: CorridorConfig,
    pub vehicle_classes: HashMap<VehicleKind, VehicleClass>,
}

impl SimConfig {
    /// Two coordinated junctions with adaptive light timing
    pub fn corridor() -> Self {
        Self {
            topology: Topology::Corridor,
            green_strategy: GreenStrategyKind::Adaptive,
            world_width: 1024.0,
            world_height: 768.0,
            off_bounds_margin: 100.0,
            spawn_inset: 100.0,
            lane_width: 30.0,
            intersection_size: 100.0,
            vehicle_spacing: 5.0,
            incident_size: 50.0,
            incident_offset: 100.0,
            incident_flash_interval: 0.5,
            incident_pick_radius: 30.0,
            tick_dt: 1.0 / 60.0,
            timing: TimingConfig::default(),
            corridor: CorridorConfig::default(),
            vehicle_classes: default_vehicle_classes(),
        }
    }

    /// One junction with incident-aware density arbitration
    pub fn single_junction() -> Self {
        Self {
            topology: Topology::SingleJunction,
            green_strategy: GreenStrategyKind::DensityScaled,
            timing: TimingConfig {
                max_green: 30.0,
                ..TimingConfig::default()
            },
            ..Self::corridor()
        }
    }

    pub fn vehicle_class(&self, kind: VehicleKind) -> Option<&VehicleClass> {
        self.vehicle_classes.get(&kind)
    }

    /// Junction centres for the configured topology, west to east
    pub fn junction_positions(&self) -> Vec<(f32, f32)> {
        let y = self.world_height / 2.0;
        match self.topology {
            Topology::Corridor => vec![
                ((self.world_width / 3.0).floor(), y),
                ((2.0 * self.world_width / 3.0).floor(), y),
            ],
            Topology::SingleJunction => vec![(self.world_width / 2.0, y)],
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::corridor()
    }
}

fn default_vehicle_classes() -> HashMap<VehicleKind, VehicleClass> {
    HashMap::from([
        (
            VehicleKind::Car,
            VehicleClass {
                length: 40.0,
                width: 20.0,
                speed: 180.0,
                color: (255, 0, 0),
            },
        ),
        (
            VehicleKind::Bus,
            VehicleClass {
                length: 60.0,
                width: 25.0,
                speed: 120.0,
                color: (0, 0, 255),
            },
        ),
        (
            VehicleKind::Truck,
            VehicleClass {
                length: 70.0,
                width: 25.0,
                speed: 120.0,
                color: (128, 0, 128),
            },
        ),
        (
            VehicleKind::Motorcycle,
            VehicleClass {
                length: 30.0,
                width: 15.0,
                speed: 240.0,
                color: (255, 165, 0),
            },
        ),
    ])
}
