//! Derived read-only views for diagnostics
//!
//! Nothing here feeds back into the simulation; these are snapshots taken
//! for display and for the end-of-run statistics.

use std::fmt;

use log::info;

use super::corridor::CorridorContext;
use super::intersection::Intersection;
use super::types::{Axis, JunctionId, LightState, Side, SideMap};

/// Timing analysis of one junction
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionTiming {
    pub junction: JunctionId,
    pub east_west_count: usize,
    pub approaching_count: usize,
    pub north_south_count: usize,
    /// Green the East-West lights would choose if they turned green now
    pub expected_east_west_green: f32,
    pub expected_north_south_green: f32,
    pub east_west_state: LightState,
    pub north_south_state: LightState,
    pub densities: SideMap<f32>,
}

impl JunctionTiming {
    pub fn measure(intersection: &Intersection, corridor: Option<CorridorContext>) -> Self {
        let approaching_count = corridor.map_or(0, |context| context.approaching);

        let mut east_west = intersection
            .axis_context(Axis::EastWest)
            .with_approaching(approaching_count);
        if corridor.is_some() {
            east_west = east_west.inter_junction();
        }
        let north_south = intersection.axis_context(Axis::NorthSouth);

        Self {
            junction: intersection.id,
            east_west_count: east_west.vehicle_count,
            approaching_count,
            north_south_count: north_south.vehicle_count,
            expected_east_west_green: intersection.expected_green_time(&east_west),
            expected_north_south_green: intersection.expected_green_time(&north_south),
            east_west_state: intersection.light_state(Side::East),
            north_south_state: intersection.light_state(Side::North),
            densities: intersection.snapshot(corridor).densities(),
        }
    }
}

/// Timing analysis of every junction, west to east
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimingReport {
    pub junctions: Vec<JunctionTiming>,
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for timing in &self.junctions {
            writeln!(f, "Junction {}:", timing.junction.0)?;
            writeln!(
                f,
                "  East-West: {} vehicles, {} approaching, expected green {:.1}s, light {}",
                timing.east_west_count,
                timing.approaching_count,
                timing.expected_east_west_green,
                timing.east_west_state
            )?;
            writeln!(
                f,
                "  North-South: {} vehicles, expected green {:.1}s, light {}",
                timing.north_south_count, timing.expected_north_south_green, timing.north_south_state
            )?;
            let densities: Vec<String> = Side::ALL
                .iter()
                .map(|side| format!("{}={:.2}", side.letter(), timing.densities.get(*side)))
                .collect();
            writeln!(f, "  Density: {}", densities.join(" "))?;
        }
        Ok(())
    }
}

/// Running totals kept by the world
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimStats {
    pub vehicles_placed: usize,
    /// Vehicles that drove off the world
    pub vehicles_cleared: usize,
    pub active_vehicles: usize,
    pub incidents_placed: usize,
    pub incidents_cleared: usize,
    /// Simulated seconds while running
    pub elapsed_time: f32,
}

impl SimStats {
    /// Percentage of placed vehicles that have left the world
    pub fn clearance_rate(&self) -> f32 {
        if self.vehicles_placed == 0 {
            0.0
        } else {
            self.vehicles_cleared as f32 / self.vehicles_placed as f32 * 100.0
        }
    }

    pub fn log_final(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {:.2}s", self.elapsed_time);
        info!("Vehicles placed: {}", self.vehicles_placed);
        info!("Vehicles cleared: {}", self.vehicles_cleared);
        info!("Active vehicles: {}", self.active_vehicles);
        info!("Incidents placed: {}", self.incidents_placed);
        info!("Incidents cleared: {}", self.incidents_cleared);
        info!("Clearance rate: {:.1}%", self.clearance_rate());
    }
}
