//! Road incidents
//!
//! An incident blocks one lane until it is explicitly cleared. Its flashing
//! visibility is advanced by the simulation tick so the display stays
//! deterministic.

use super::types::{LaneId, Position};

#[derive(Debug, Clone)]
pub struct Incident {
    pub position: Position,
    pub lane: LaneId,
    pub active: bool,
    /// Footprint length along the lane
    pub size: f32,
    /// Whether the warning is currently drawn
    pub visible: bool,
    flash_timer: f32,
    flash_interval: f32,
}

impl Incident {
    pub fn new(position: Position, lane: LaneId, size: f32, flash_interval: f32) -> Self {
        Self {
            position,
            lane,
            active: true,
            size,
            visible: true,
            flash_timer: 0.0,
            flash_interval,
        }
    }

    /// Advance the flash timer; toggles visibility every interval
    pub fn update(&mut self, delta_secs: f32) {
        if !self.active {
            return;
        }
        self.flash_timer += delta_secs;
        if self.flash_timer >= self.flash_interval {
            self.visible = !self.visible;
            self.flash_timer = 0.0;
        }
    }

    pub fn clear(&mut self) {
        self.active = false;
    }

    /// Half the footprint; the blocking edge sits this far before the centre
    pub fn half_size(&self) -> f32 {
        self.size / 2.0
    }
}
