//! Standalone junction simulation module
//!
//! This module contains all the traffic-signal simulation logic: vehicles
//! and lanes, adaptive light phases, per-junction axis arbitration and the
//! two-junction corridor coordination. It has no display dependencies and
//! can be driven from the console or from tests.

mod analytics;
mod command;
mod config;
mod corridor;
mod error;
mod incident;
mod intersection;
mod lane;
mod layout;
mod signal;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
pub use analytics::{JunctionTiming, SimStats, TimingReport};
pub use command::Command;
pub use config::{
    CorridorConfig, GreenStrategyKind, SimConfig, TimingConfig, Topology, VehicleClass,
    VehicleKind,
};
pub use corridor::{CorridorArbitration, CorridorContext, CorridorCoordinator, CorridorRole};
pub use error::{CommandError, CommandParseError, IncidentError, PlacementError};
pub use incident::Incident;
pub use intersection::{
    AxisArbitration, AxisDecision, DensityArbitration, Intersection, JunctionSnapshot,
    PhaseCommand,
};
pub use lane::{Lane, LaneParams};
pub use layout::{
    build_lanes, exit_limit, junction_positions, lane_reference, spawn_point, LANES_PER_SIDE,
};
pub use signal::{
    clearance_ratio, strategy_for, AdaptiveGreenTime, DensityScaledGreenTime, GreenTimeContext,
    GreenTimeStrategy, LinearGreenTime, PerformanceHistory, SignalPhase,
};
pub use types::{
    Axis, Direction, JunctionId, LaneId, LightState, Position, Side, SideMap, SimId, VehicleId,
};
pub use vehicle::Vehicle;
pub use world::SimWorld;
