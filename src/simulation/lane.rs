//! Lane queues
//!
//! A lane owns an ordered queue of vehicles and at most one incident. Index 0
//! of the queue is the lead vehicle; vehicles are only appended at the tail
//! and only removed from the head, so queue order always equals physical
//! order and each vehicle only has to look at the one directly ahead.

use std::collections::VecDeque;

use log::debug;

use super::config::{VehicleClass, VehicleKind};
use super::error::{IncidentError, PlacementError};
use super::incident::Incident;
use super::types::{Direction, LaneId, LightState, Position, VehicleId};
use super::vehicle::Vehicle;

/// Per-lane constants copied out of the configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneParams {
    pub spacing: f32,
    /// Progress along the travel direction past which vehicles are dropped
    pub exit_limit: f32,
    pub incident_size: f32,
    pub incident_offset: f32,
    pub flash_interval: f32,
}

#[derive(Debug, Clone)]
pub struct Lane {
    pub id: LaneId,
    pub direction: Direction,
    /// Reference point next to the junction
    pub position: Position,
    pub spawn_point: Position,
    vehicles: VecDeque<Vehicle>,
    incident: Option<Incident>,
    flow_rate: f32,
    params: LaneParams,
}

impl Lane {
    pub fn new(id: LaneId, position: Position, spawn_point: Position, params: LaneParams) -> Self {
        Self {
            id,
            direction: id.side.travel_direction(),
            position,
            spawn_point,
            vehicles: VecDeque::new(),
            incident: None,
            flow_rate: 1.0,
            params,
        }
    }

    pub fn is_entry_lane(&self) -> bool {
        self.id.index == self.id.side.entry_lane()
    }

    pub fn vehicles(&self) -> &VecDeque<Vehicle> {
        &self.vehicles
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn incident(&self) -> Option<&Incident> {
        self.incident.as_ref()
    }

    pub fn has_active_incident(&self) -> bool {
        self.active_incident().is_some()
    }

    fn active_incident(&self) -> Option<&Incident> {
        self.incident.as_ref().filter(|incident| incident.active)
    }

    /// 1.0 normally, 0.0 while an incident blocks the lane
    pub fn flow_rate(&self) -> f32 {
        self.flow_rate
    }

    pub fn params(&self) -> &LaneParams {
        &self.params
    }

    /// Queue a new vehicle behind the last one
    ///
    /// The new vehicle starts at the spawn point, pushed back upstream by the
    /// combined length and spacing of everything already queued.
    pub fn place_vehicle(
        &mut self,
        id: VehicleId,
        kind: VehicleKind,
        class: VehicleClass,
    ) -> Result<VehicleId, PlacementError> {
        if !self.is_entry_lane() {
            return Err(PlacementError::WrongLane {
                side: self.id.side,
                lane: self.id.index,
            });
        }

        let queued: f32 = self
            .vehicles
            .iter()
            .map(|v| v.class.length + self.params.spacing)
            .sum();
        let position = self.spawn_point.offset(self.direction, -queued);

        self.vehicles
            .push_back(Vehicle::new(id, kind, class, position, self.direction));
        debug!(
            "Placed {} {:?} on {} at ({:.0}, {:.0}), queue length {}",
            kind,
            id.0,
            self.id,
            position.x,
            position.y,
            self.vehicles.len()
        );
        Ok(id)
    }

    /// Block the lane with an incident; defaults to a fixed distance past the
    /// reference point along the direction of travel
    pub fn place_incident(&mut self, position: Option<Position>) -> Result<(), IncidentError> {
        if self.has_active_incident() {
            return Err(IncidentError::AlreadyActive(self.id));
        }

        let position = position.unwrap_or_else(|| {
            self.position
                .offset(self.direction, self.params.incident_offset)
        });
        self.incident = Some(Incident::new(
            position,
            self.id,
            self.params.incident_size,
            self.params.flash_interval,
        ));
        self.flow_rate = 0.0;
        debug!(
            "Incident on {} at ({:.0}, {:.0})",
            self.id, position.x, position.y
        );
        Ok(())
    }

    pub fn clear_incident(&mut self) -> Result<(), IncidentError> {
        match self.incident.as_mut().filter(|incident| incident.active) {
            Some(incident) => {
                incident.clear();
                self.flow_rate = 1.0;
                debug!("Incident cleared on {}", self.id);
                Ok(())
            }
            None => Err(IncidentError::NoActiveIncident(self.id)),
        }
    }

    /// Vehicles moving toward `target` and within `look_ahead` of it
    pub fn count_approaching(&self, target: &Position, look_ahead: f32) -> usize {
        let target_progress = self.direction.progress(target);
        self.vehicles
            .iter()
            .filter(|vehicle| {
                let remaining = target_progress - vehicle.progress();
                remaining > 0.0 && remaining < look_ahead
            })
            .count()
    }

    /// Advance every vehicle that may move under `light`, then drop the
    /// vehicles that have left the world
    ///
    /// Returns the number of vehicles dropped.
    pub fn update(&mut self, delta_secs: f32, light: LightState) -> usize {
        if let Some(incident) = self.incident.as_mut() {
            incident.update(delta_secs);
        }

        let green = light == LightState::Green;
        let spacing = self.params.spacing;
        let flow_rate = self.flow_rate;
        let obstruction = self
            .active_incident()
            .map(|incident| (self.direction.progress(&incident.position), incident.half_size()));

        // Progress of the vehicle directly ahead
        let mut ahead: Option<f32> = None;
        for vehicle in self.vehicles.iter_mut() {
            let step = vehicle.step_length(delta_secs, flow_rate);
            let progress = vehicle.progress();
            let mut can_move_forward = true;

            if let Some((incident_progress, half_size)) = obstruction {
                // Only incidents still in front of the vehicle block it
                let clearance = vehicle.class.length + spacing + half_size;
                if progress < incident_progress && incident_progress - progress < step + clearance
                {
                    can_move_forward = false;
                }
            }

            // Each vehicle keeps its own length plus spacing behind the one ahead
            if let Some(ahead_progress) = ahead {
                if ahead_progress - progress < step + vehicle.class.length + spacing {
                    can_move_forward = false;
                }
            }

            vehicle.update(delta_secs, green && can_move_forward, flow_rate);
            ahead = Some(vehicle.progress());
        }

        let mut removed = 0;
        while self
            .vehicles
            .front()
            .is_some_and(|vehicle| vehicle.is_past(self.params.exit_limit))
        {
            self.vehicles.pop_front();
            removed += 1;
        }
        removed
    }
}
