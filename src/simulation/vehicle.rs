//! Vehicle kinematics
//!
//! A vehicle only ever moves along the axis of its travel direction, at its
//! class's cruise speed scaled by the lane's flow rate.

use super::config::{VehicleClass, VehicleKind};
use super::types::{Direction, Position, VehicleId};

/// A vehicle queued on, or driving away from, one lane
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub class: VehicleClass,
    pub position: Position,
    pub direction: Direction,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        kind: VehicleKind,
        class: VehicleClass,
        position: Position,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            kind,
            class,
            position,
            direction,
        }
    }

    pub fn speed(&self) -> f32 {
        self.class.speed
    }

    /// Distance this vehicle would cover in `delta_secs` at `flow_rate`
    pub fn step_length(&self, delta_secs: f32, flow_rate: f32) -> f32 {
        self.class.speed * flow_rate * delta_secs
    }

    /// Signed position along the direction of travel
    pub fn progress(&self) -> f32 {
        self.direction.progress(&self.position)
    }

    /// Advance along the travel axis if allowed
    /// Returns the distance actually moved
    pub fn update(&mut self, delta_secs: f32, can_move: bool, flow_rate: f32) -> f32 {
        if !can_move {
            return 0.0;
        }
        let step = self.step_length(delta_secs, flow_rate);
        self.position = self.position.offset(self.direction, step);
        step
    }

    /// True once the vehicle has driven past `limit` along its direction
    pub fn is_past(&self, limit: f32) -> bool {
        self.progress() > limit
    }
}
