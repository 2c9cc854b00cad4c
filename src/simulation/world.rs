//! Main simulation world that ties everything together
//!
//! [`SimWorld`] owns the junctions, applies commands from the control
//! surface and advances time. Each tick runs in a fixed order: queued
//! commands, corridor assessment, light decisions for every junction, then
//! vehicle movement for every junction.

use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use super::analytics::{JunctionTiming, SimStats, TimingReport};
use super::command::Command;
use super::config::{SimConfig, Topology, VehicleKind};
use super::corridor::{CorridorArbitration, CorridorContext, CorridorCoordinator};
use super::error::{CommandError, IncidentError, PlacementError};
use super::intersection::{AxisArbitration, DensityArbitration, Intersection};
use super::lane::Lane;
use super::layout;
use super::signal::{strategy_for, GreenTimeStrategy};
use super::types::{JunctionId, LaneId, Position, Side, SimId, VehicleId};

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,

    /// Junctions, west to east
    intersections: Vec<Intersection>,

    /// Present for the two-junction corridor
    coordinator: Option<CorridorCoordinator>,

    green_time: Rc<dyn GreenTimeStrategy>,
    arbitration: Rc<dyn AxisArbitration>,

    running: bool,

    /// Commands waiting for the next tick
    pending: VecDeque<Command>,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time
    pub time: f32,

    stats: SimStats,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimWorld {
    /// Build a stopped world with the strategies the configuration selects
    pub fn new(config: SimConfig) -> Self {
        let green_time = strategy_for(config.green_strategy);
        let arbitration: Rc<dyn AxisArbitration> = match config.topology {
            Topology::Corridor => Rc::new(CorridorArbitration::new(config.corridor)),
            Topology::SingleJunction => Rc::new(DensityArbitration),
        };
        Self::with_strategies(config, green_time, arbitration)
    }

    /// Build a stopped world with explicit green-time and arbitration strategies
    pub fn with_strategies(
        config: SimConfig,
        green_time: Rc<dyn GreenTimeStrategy>,
        arbitration: Rc<dyn AxisArbitration>,
    ) -> Self {
        let coordinator = match config.topology {
            Topology::Corridor => Some(CorridorCoordinator::new(config.corridor)),
            Topology::SingleJunction => None,
        };
        let intersections = build_intersections(&config, &green_time, &arbitration);
        Self {
            config,
            intersections,
            coordinator,
            green_time,
            arbitration,
            running: false,
            pending: VecDeque::new(),
            next_id: 0,
            time: 0.0,
            stats: SimStats::default(),
        }
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    pub fn intersection(&self, id: JunctionId) -> Option<&Intersection> {
        self.intersections.get(id.0)
    }

    pub fn lane(&self, junction: JunctionId, side: Side, lane: usize) -> Option<&Lane> {
        self.intersection(junction)
            .and_then(|intersection| intersection.lane(side, lane))
    }

    fn lane_mut(&mut self, junction: JunctionId, side: Side, lane: usize) -> Option<&mut Lane> {
        self.intersections
            .get_mut(junction.0)
            .and_then(|intersection| intersection.lane_mut(side, lane))
    }

    /// Vehicles currently on any lane
    pub fn vehicle_count(&self) -> usize {
        self.intersections
            .iter()
            .map(Intersection::total_vehicles)
            .sum()
    }

    pub fn stats(&self) -> SimStats {
        SimStats {
            active_vehicles: self.vehicle_count(),
            ..self.stats.clone()
        }
    }

    /// Queue a vehicle on a lane's entry point
    pub fn place_vehicle(
        &mut self,
        junction: JunctionId,
        side: Side,
        lane: usize,
        kind: VehicleKind,
    ) -> Result<VehicleId, PlacementError> {
        let class = *self
            .config
            .vehicle_class(kind)
            .ok_or_else(|| PlacementError::UnknownVehicleClass(kind.to_string()))?;
        let unknown = PlacementError::UnknownLane {
            junction: junction.0,
            side,
            lane,
        };
        let target = self.lane(junction, side, lane).ok_or(unknown)?;
        if !target.is_entry_lane() {
            return Err(PlacementError::WrongLane { side, lane });
        }

        let id = VehicleId(self.next_sim_id());
        let placed = self
            .lane_mut(junction, side, lane)
            .ok_or(PlacementError::UnknownLane {
                junction: junction.0,
                side,
                lane,
            })?
            .place_vehicle(id, kind, class)?;

        self.stats.vehicles_placed += 1;
        self.rearbitrate();
        Ok(placed)
    }

    /// Same as [`place_vehicle`](Self::place_vehicle) with the class given by name
    pub fn place_vehicle_named(
        &mut self,
        junction: JunctionId,
        side: Side,
        lane: usize,
        class: &str,
    ) -> Result<VehicleId, PlacementError> {
        let kind = class
            .parse::<VehicleKind>()
            .map_err(|_| PlacementError::UnknownVehicleClass(class.to_string()))?;
        self.place_vehicle(junction, side, lane, kind)
    }

    pub fn place_incident(
        &mut self,
        junction: JunctionId,
        side: Side,
        lane: usize,
        position: Option<Position>,
    ) -> Result<(), IncidentError> {
        self.lane_mut(junction, side, lane)
            .ok_or(IncidentError::UnknownLane {
                junction: junction.0,
                side,
                lane,
            })?
            .place_incident(position)?;

        self.stats.incidents_placed += 1;
        self.rearbitrate();
        Ok(())
    }

    pub fn clear_incident(
        &mut self,
        junction: JunctionId,
        side: Side,
        lane: usize,
    ) -> Result<(), IncidentError> {
        self.lane_mut(junction, side, lane)
            .ok_or(IncidentError::UnknownLane {
                junction: junction.0,
                side,
                lane,
            })?
            .clear_incident()?;

        self.stats.incidents_cleared += 1;
        self.rearbitrate();
        Ok(())
    }

    /// Clear the active incident closest to `point`, if one lies within the
    /// pick radius; returns the lane it was on
    pub fn clear_incident_near(&mut self, point: Position) -> Result<LaneId, IncidentError> {
        let radius = self.config.incident_pick_radius;
        let nearest = self
            .intersections
            .iter()
            .flat_map(|intersection| intersection.all_lanes())
            .filter_map(|lane| {
                lane.incident()
                    .filter(|incident| incident.active)
                    .map(|incident| (lane.id, incident.position.distance(&point)))
            })
            .filter(|(_, distance)| *distance < radius)
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
            .map(|(id, _)| id)
            .ok_or(IncidentError::NoIncidentNear {
                x: point.x,
                y: point.y,
            })?;

        self.clear_incident(nearest.junction, nearest.side, nearest.index)?;
        Ok(nearest)
    }

    /// Begin a fresh light cycle; every light restarts from red
    pub fn start(&mut self) {
        for intersection in self.intersections.iter_mut() {
            intersection.reset_signals();
        }
        self.running = true;
        info!(
            "Simulation started with {} junction(s), {} vehicle(s) queued",
            self.intersections.len(),
            self.vehicle_count()
        );
        self.rearbitrate();
    }

    /// Freeze everything in place
    pub fn stop(&mut self) {
        self.running = false;
        info!("Simulation stopped at {:.2}s", self.time);
    }

    /// Discard all vehicles and incidents and rebuild the junctions, stopped
    pub fn reset(&mut self) {
        self.intersections = build_intersections(&self.config, &self.green_time, &self.arbitration);
        self.running = false;
        self.pending.clear();
        self.time = 0.0;
        self.stats = SimStats::default();
        info!("Simulation reset");
    }

    /// Queue a command for the start of the next tick
    pub fn submit(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Execute a command now; rejected commands leave the world unchanged
    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        let result = match command {
            Command::PlaceVehicle {
                junction,
                side,
                lane,
                kind,
            } => self
                .place_vehicle(JunctionId(junction), side, lane, kind)
                .map(|_| ())
                .map_err(CommandError::from),
            Command::PlaceIncident {
                junction,
                side,
                lane,
                position,
            } => self
                .place_incident(JunctionId(junction), side, lane, position)
                .map_err(CommandError::from),
            Command::ClearIncident {
                junction,
                side,
                lane,
            } => self
                .clear_incident(JunctionId(junction), side, lane)
                .map_err(CommandError::from),
            Command::ClearIncidentNear(point) => self
                .clear_incident_near(point)
                .map(|_| ())
                .map_err(CommandError::from),
            Command::Start => {
                self.start();
                Ok(())
            }
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
        };

        if let Err(err) = &result {
            warn!("Rejected {:?}: {}", command, err);
        }
        result
    }

    /// Corridor inputs for each junction, `None` outside the corridor
    fn corridor_contexts(&self) -> Vec<Option<CorridorContext>> {
        match &self.coordinator {
            Some(coordinator) => coordinator.assess(&self.intersections),
            None => vec![None; self.intersections.len()],
        }
    }

    /// Re-run axis arbitration after a state change, without advancing time
    fn rearbitrate(&mut self) {
        if !self.running {
            return;
        }
        let contexts = self.corridor_contexts();
        for (intersection, context) in self.intersections.iter_mut().zip(contexts) {
            intersection.arbitrate(context);
        }
    }

    /// Advance the simulation by one step
    ///
    /// Queued commands are applied first, even while stopped; time only
    /// moves while running.
    pub fn tick(&mut self, delta_secs: f32) {
        // Taken up front so a queued reset cannot drop the commands after it
        let queued = std::mem::take(&mut self.pending);
        for command in queued {
            let _ = self.apply(command);
        }

        if !self.running {
            return;
        }

        self.time += delta_secs;
        self.stats.elapsed_time += delta_secs;

        // Every light is decided from the same pre-tick state
        let contexts = self.corridor_contexts();
        for (intersection, context) in self.intersections.iter_mut().zip(contexts) {
            intersection.update_signals(delta_secs, context);
        }

        let mut cleared = 0;
        for intersection in self.intersections.iter_mut() {
            cleared += intersection.update_lanes(delta_secs);
        }
        if cleared > 0 {
            debug!("{} vehicle(s) left the world at {:.2}s", cleared, self.time);
        }
        self.stats.vehicles_cleared += cleared;
    }

    /// Timing analysis for every junction as things stand
    pub fn timing_report(&self) -> TimingReport {
        let contexts = self.corridor_contexts();
        TimingReport {
            junctions: self
                .intersections
                .iter()
                .zip(contexts)
                .map(|(intersection, context)| JunctionTiming::measure(intersection, context))
                .collect(),
        }
    }

    pub fn log_final_stats(&self) {
        self.stats().log_final();
    }

    pub fn print_summary(&self) {
        println!("=== Junction Simulation Summary ===");
        println!(
            "Time: {:.2}s ({})",
            self.time,
            if self.running { "running" } else { "stopped" }
        );
        println!("Vehicles: {}", self.vehicle_count());
        println!();

        for intersection in &self.intersections {
            println!(
                "--- Junction {} at ({:.0}, {:.0}), priority {} ---",
                intersection.id.0,
                intersection.position.x,
                intersection.position.y,
                intersection
                    .dominant_axis()
                    .map_or_else(|| "none".to_string(), |axis| axis.to_string())
            );
            for side in Side::ALL {
                let phase = intersection.phase(side);
                println!(
                    "  {:<5} light={:<6} timer={:.1}s{}",
                    side,
                    phase.state(),
                    phase.timer(),
                    if phase.countdown_active() {
                        " (counting down)"
                    } else {
                        ""
                    }
                );
                for lane in intersection.lanes(side) {
                    if lane.vehicle_count() == 0 && lane.incident().is_none() {
                        continue;
                    }
                    println!(
                        "    Lane {}: {} vehicle(s)",
                        lane.id.index + 1,
                        lane.vehicle_count()
                    );
                    for vehicle in lane.vehicles() {
                        println!(
                            "      {} {:?}: position=({:.1}, {:.1}), heading {:?} at {:.0}/s",
                            vehicle.kind,
                            vehicle.id.0,
                            vehicle.position.x,
                            vehicle.position.y,
                            vehicle.direction,
                            vehicle.speed()
                        );
                    }
                    if let Some(incident) = lane.incident() {
                        println!(
                            "      Incident at ({:.0}, {:.0}): {}",
                            incident.position.x,
                            incident.position.y,
                            if incident.active { "active" } else { "cleared" }
                        );
                    }
                }
            }
        }

        println!("--- Timing Analysis ---");
        print!("{}", self.timing_report());
    }
}

fn build_intersections(
    config: &SimConfig,
    green_time: &Rc<dyn GreenTimeStrategy>,
    arbitration: &Rc<dyn AxisArbitration>,
) -> Vec<Intersection> {
    let junctions = layout::junction_positions(config);
    junctions
        .iter()
        .enumerate()
        .map(|(index, position)| {
            Intersection::new(
                JunctionId(index),
                *position,
                layout::build_lanes(config, &junctions, index),
                config.timing,
                Rc::clone(green_time),
                Rc::clone(arbitration),
            )
        })
        .collect()
}
