//! Junction state and axis arbitration
//!
//! An [`Intersection`] owns the lanes and lights of its four sides. Each tick
//! an [`AxisArbitration`] strategy looks at a [`JunctionSnapshot`] and returns
//! an [`AxisDecision`]; the intersection applies it so that at most one axis
//! is ever green.

use std::fmt;
use std::rc::Rc;

use log::debug;

use super::config::TimingConfig;
use super::corridor::CorridorContext;
use super::lane::Lane;
use super::signal::{GreenTimeContext, GreenTimeStrategy, SignalPhase};
use super::types::{Axis, JunctionId, LightState, Position, Side, SideMap};

/// Read-only view of the inputs an arbitration strategy may use
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionSnapshot {
    pub junction: JunctionId,
    pub counts: SideMap<usize>,
    pub incidents: SideMap<bool>,
    /// Present only when the junction is part of a coordinated corridor
    pub corridor: Option<CorridorContext>,
}

impl JunctionSnapshot {
    pub fn total(&self) -> usize {
        self.counts.total()
    }

    pub fn axis_count(&self, axis: Axis) -> usize {
        self.counts.axis_total(axis)
    }

    /// Share of all vehicles on each side; all zero on an empty junction
    pub fn densities(&self) -> SideMap<f32> {
        let total = self.total();
        SideMap::from_fn(|side| {
            if total == 0 {
                0.0
            } else {
                self.counts.get(side) as f32 / total as f32
            }
        })
    }
}

/// What one light should do after an arbitration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseCommand {
    /// Run green, sized from this context if a new phase has to start
    Green(GreenTimeContext),
    Red,
}

/// Outcome of arbitration for one junction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDecision {
    /// The axis that won, even if one of its sides is held red by an incident
    pub axis: Option<Axis>,
    commands: [PhaseCommand; 4],
}

impl AxisDecision {
    pub fn all_red() -> Self {
        Self {
            axis: None,
            commands: [PhaseCommand::Red; 4],
        }
    }

    /// Green for both sides of `axis` and red for the other axis
    ///
    /// A side listed in `incidents` stays red on its own even though its
    /// axis won.
    pub fn grant(axis: Axis, context: GreenTimeContext, incidents: Option<&SideMap<bool>>) -> Self {
        let mut decision = Self::all_red();
        decision.axis = Some(axis);
        for side in axis.sides() {
            let blocked = incidents.is_some_and(|incidents| incidents.get(side));
            if !blocked {
                decision.commands[side.index()] = PhaseCommand::Green(context.for_side(side));
            }
        }
        decision
    }

    pub fn command(&self, side: Side) -> &PhaseCommand {
        &self.commands[side.index()]
    }

    pub fn grants_green(&self, side: Side) -> bool {
        matches!(self.command(side), PhaseCommand::Green(_))
    }
}

/// Chooses which axis may run green at one junction
pub trait AxisArbitration: fmt::Debug {
    fn decide(&self, snapshot: &JunctionSnapshot) -> AxisDecision;
}

/// Single-junction arbitration: the densest side without an incident wins
/// its axis, sized by that side's density
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DensityArbitration;

impl AxisArbitration for DensityArbitration {
    fn decide(&self, snapshot: &JunctionSnapshot) -> AxisDecision {
        let densities = snapshot.densities();

        // Strictly greater keeps the first side in N, S, E, W order on ties
        let mut best: Option<(Side, f32)> = None;
        for side in Side::ALL {
            let density = densities.get(side);
            if snapshot.incidents.get(side) {
                continue;
            }
            if density > best.map_or(0.0, |(_, best_density)| best_density) {
                best = Some((side, density));
            }
        }

        match best {
            Some((side, density)) => {
                let axis = side.axis();
                let context =
                    GreenTimeContext::new(side, snapshot.axis_count(axis)).with_density(density);
                AxisDecision::grant(axis, context, Some(&snapshot.incidents))
            }
            None => AxisDecision::all_red(),
        }
    }
}

/// One junction: four sides of lanes, one light per side
#[derive(Debug, Clone)]
pub struct Intersection {
    pub id: JunctionId,
    pub position: Position,
    lanes: [Vec<Lane>; 4],
    phases: [SignalPhase; 4],
    dominant_axis: Option<Axis>,
    arbitration: Rc<dyn AxisArbitration>,
}

impl Intersection {
    pub fn new(
        id: JunctionId,
        position: Position,
        lanes: [Vec<Lane>; 4],
        timing: TimingConfig,
        green_time: Rc<dyn GreenTimeStrategy>,
        arbitration: Rc<dyn AxisArbitration>,
    ) -> Self {
        let phases = Side::ALL.map(|side| SignalPhase::new(id, side, timing, green_time.clone()));
        Self {
            id,
            position,
            lanes,
            phases,
            dominant_axis: None,
            arbitration,
        }
    }

    pub fn lanes(&self, side: Side) -> &[Lane] {
        &self.lanes[side.index()]
    }

    pub fn lane(&self, side: Side, index: usize) -> Option<&Lane> {
        self.lanes[side.index()].get(index)
    }

    pub fn lane_mut(&mut self, side: Side, index: usize) -> Option<&mut Lane> {
        self.lanes[side.index()].get_mut(index)
    }

    pub fn all_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.iter().flatten()
    }

    pub fn all_lanes_mut(&mut self) -> impl Iterator<Item = &mut Lane> {
        self.lanes.iter_mut().flatten()
    }

    pub fn phase(&self, side: Side) -> &SignalPhase {
        &self.phases[side.index()]
    }

    pub fn light_state(&self, side: Side) -> LightState {
        self.phase(side).state()
    }

    /// Winner of the most recent arbitration
    pub fn dominant_axis(&self) -> Option<Axis> {
        self.dominant_axis
    }

    pub fn vehicle_count(&self, side: Side) -> usize {
        self.lanes(side).iter().map(Lane::vehicle_count).sum()
    }

    pub fn has_incident(&self, side: Side) -> bool {
        self.lanes(side).iter().any(Lane::has_active_incident)
    }

    pub fn vehicle_counts(&self) -> SideMap<usize> {
        SideMap::from_fn(|side| self.vehicle_count(side))
    }

    pub fn incidents(&self) -> SideMap<bool> {
        SideMap::from_fn(|side| self.has_incident(side))
    }

    pub fn axis_count(&self, axis: Axis) -> usize {
        self.vehicle_counts().axis_total(axis)
    }

    pub fn total_vehicles(&self) -> usize {
        self.vehicle_counts().total()
    }

    pub fn snapshot(&self, corridor: Option<CorridorContext>) -> JunctionSnapshot {
        JunctionSnapshot {
            junction: self.id,
            counts: self.vehicle_counts(),
            incidents: self.incidents(),
            corridor,
        }
    }

    /// Vehicles on this junction's `axis` lanes within `look_ahead` of `target`
    pub fn count_approaching(&self, axis: Axis, target: &Position, look_ahead: f32) -> usize {
        axis.sides()
            .iter()
            .flat_map(|side| self.lanes(*side))
            .map(|lane| lane.count_approaching(target, look_ahead))
            .sum()
    }

    /// Sizing inputs for `axis` as things stand, before any corridor bonus
    pub fn axis_context(&self, axis: Axis) -> GreenTimeContext {
        let densities = self.snapshot(None).densities();
        let [first, second] = axis.sides();
        let density = densities.get(first).max(densities.get(second));
        GreenTimeContext::new(first, self.axis_count(axis)).with_density(density)
    }

    /// Green duration the light for `context.side` would choose now
    pub fn expected_green_time(&self, context: &GreenTimeContext) -> f32 {
        self.phase(context.side).calculate_green_time(context)
    }

    /// Decide and apply axis priority without advancing time
    pub fn arbitrate(&mut self, corridor: Option<CorridorContext>) -> AxisDecision {
        let snapshot = self.snapshot(corridor);
        let decision = self.arbitration.decide(&snapshot);
        self.apply(&decision);
        decision
    }

    /// Bring every light in line with `decision`
    ///
    /// Red is applied first so the losing axis is already red when the
    /// winner turns green. A light that is already green or yellow keeps
    /// its running countdown.
    pub fn apply(&mut self, decision: &AxisDecision) {
        for phase in self.phases.iter_mut() {
            if *decision.command(phase.side) == PhaseCommand::Red
                && phase.state() != LightState::Red
            {
                phase.force_red();
            }
        }
        for phase in self.phases.iter_mut() {
            if let PhaseCommand::Green(context) = decision.command(phase.side) {
                if phase.state() == LightState::Red {
                    phase.start_cycle(context);
                }
            }
        }

        if decision.axis != self.dominant_axis {
            debug!(
                "Junction {} priority {:?} -> {:?}",
                self.id.0, self.dominant_axis, decision.axis
            );
            self.dominant_axis = decision.axis;
        }
    }

    /// Arbitrate, then run every light's countdown for `delta_secs`
    pub fn update_signals(
        &mut self,
        delta_secs: f32,
        corridor: Option<CorridorContext>,
    ) -> AxisDecision {
        let decision = self.arbitrate(corridor);
        let counts = self.vehicle_counts();
        let incidents = self.incidents();

        for phase in self.phases.iter_mut() {
            let axis_count = counts.axis_total(phase.side.axis());
            let present = axis_count > 0 || decision.grants_green(phase.side);
            phase.tick(delta_secs, present, axis_count, incidents.get(phase.side));
        }
        decision
    }

    /// Move vehicles under the current lights; returns how many left the world
    pub fn update_lanes(&mut self, delta_secs: f32) -> usize {
        let mut removed = 0;
        for side in Side::ALL {
            let light = self.phases[side.index()].state();
            for lane in self.lanes[side.index()].iter_mut() {
                removed += lane.update(delta_secs, light);
            }
        }
        removed
    }

    /// Every light back to an idle red
    pub fn reset_signals(&mut self) {
        for phase in self.phases.iter_mut() {
            phase.reset();
        }
        self.dominant_axis = None;
    }
}
