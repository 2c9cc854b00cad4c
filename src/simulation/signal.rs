//! Traffic light phases and green-time sizing
//!
//! Each side of a junction has one [`SignalPhase`] cycling
//! red → green → yellow → red. How long green lasts is decided by a
//! [`GreenTimeStrategy`] chosen when the junction is built.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use log::debug;

use super::config::{GreenStrategyKind, TimingConfig};
use super::types::{Axis, JunctionId, LightState, Side};

/// Inputs available when sizing a green phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreenTimeContext {
    pub side: Side,
    /// Vehicles queued on the side's axis
    pub vehicle_count: usize,
    /// Vehicles from the neighbouring junction heading this way
    pub approaching_count: usize,
    /// Share of the junction's vehicles on the deciding side, 0..=1
    pub density: f32,
    /// The axis carries through-traffic between two junctions
    pub inter_junction: bool,
}

impl GreenTimeContext {
    pub fn new(side: Side, vehicle_count: usize) -> Self {
        Self {
            side,
            vehicle_count,
            approaching_count: 0,
            density: 0.0,
            inter_junction: false,
        }
    }

    pub fn with_approaching(mut self, approaching_count: usize) -> Self {
        self.approaching_count = approaching_count;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn inter_junction(mut self) -> Self {
        self.inter_junction = true;
        self
    }

    /// Same context, re-targeted at another side
    pub fn for_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// Computes an unclamped green duration in seconds
///
/// The owning [`SignalPhase`] clamps the result to `[min_green, max_green]`.
pub trait GreenTimeStrategy: fmt::Debug {
    fn green_time(
        &self,
        context: &GreenTimeContext,
        history: &PerformanceHistory,
        timing: &TimingConfig,
    ) -> f32;
}

/// Build the strategy selected in the configuration
pub fn strategy_for(kind: GreenStrategyKind) -> Rc<dyn GreenTimeStrategy> {
    match kind {
        GreenStrategyKind::Adaptive => Rc::new(AdaptiveGreenTime::default()),
        GreenStrategyKind::DensityScaled => Rc::new(DensityScaledGreenTime),
        GreenStrategyKind::Linear => Rc::new(LinearGreenTime::default()),
    }
}

/// Closed-loop sizing: queue length, approach bonus and clearance feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveGreenTime {
    pub per_vehicle: f32,
    pub density_cap: f32,
    pub per_approaching: f32,
    pub approach_cap: f32,
    /// Average clearance below this extends green
    pub poor_clearance: f32,
    /// Average clearance above this shortens green
    pub good_clearance: f32,
    pub poor_bonus: f32,
    pub good_penalty: f32,
}

impl Default for AdaptiveGreenTime {
    fn default() -> Self {
        Self {
            per_vehicle: 3.0,
            density_cap: 20.0,
            per_approaching: 2.0,
            approach_cap: 10.0,
            poor_clearance: 0.7,
            good_clearance: 0.9,
            poor_bonus: 5.0,
            good_penalty: 3.0,
        }
    }
}

impl AdaptiveGreenTime {
    pub fn performance_adjustment(&self, average: f32) -> f32 {
        if average < self.poor_clearance {
            self.poor_bonus
        } else if average > self.good_clearance {
            -self.good_penalty
        } else {
            0.0
        }
    }
}

impl GreenTimeStrategy for AdaptiveGreenTime {
    fn green_time(
        &self,
        context: &GreenTimeContext,
        history: &PerformanceHistory,
        timing: &TimingConfig,
    ) -> f32 {
        let density_factor = (context.vehicle_count as f32 * self.per_vehicle).min(self.density_cap);
        // Only East-West traffic arrives from a neighbouring junction
        let approach_factor = if context.side.axis() == Axis::EastWest {
            (context.approaching_count as f32 * self.per_approaching).min(self.approach_cap)
        } else {
            0.0
        };
        timing.min_green
            + density_factor
            + approach_factor
            + self.performance_adjustment(history.average())
    }
}

/// Minimum green plus the green range scaled by the deciding side's density
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DensityScaledGreenTime;

impl GreenTimeStrategy for DensityScaledGreenTime {
    fn green_time(
        &self,
        context: &GreenTimeContext,
        _history: &PerformanceHistory,
        timing: &TimingConfig,
    ) -> f32 {
        timing.min_green + (timing.max_green - timing.min_green) * context.density
    }
}

/// Flat base plus a fixed amount per queued vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGreenTime {
    pub base: f32,
    pub per_vehicle: f32,
    pub inter_junction_base: f32,
    pub inter_junction_per_vehicle: f32,
}

impl Default for LinearGreenTime {
    fn default() -> Self {
        Self {
            base: 10.0,
            per_vehicle: 2.0,
            inter_junction_base: 15.0,
            inter_junction_per_vehicle: 3.0,
        }
    }
}

impl GreenTimeStrategy for LinearGreenTime {
    fn green_time(
        &self,
        context: &GreenTimeContext,
        _history: &PerformanceHistory,
        timing: &TimingConfig,
    ) -> f32 {
        let (base, per_vehicle) = if context.inter_junction {
            (self.inter_junction_base, self.inter_junction_per_vehicle)
        } else {
            (self.base, self.per_vehicle)
        };
        (base + context.vehicle_count as f32 * per_vehicle).min(timing.max_green)
    }
}

/// Fraction of the vehicles present at the start of a green phase that left
/// before it ended; 0 when none were present
pub fn clearance_ratio(cleared: usize, present: usize) -> f32 {
    if present == 0 {
        0.0
    } else {
        cleared as f32 / present as f32
    }
}

/// Bounded record of recent clearance ratios, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceHistory {
    ratios: VecDeque<f32>,
    capacity: usize,
}

impl PerformanceHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ratios: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, ratio: f32) {
        self.ratios.push_back(ratio);
        while self.ratios.len() > self.capacity {
            self.ratios.pop_front();
        }
    }

    /// Mean of the kept ratios; 1.0 with no history yet
    pub fn average(&self) -> f32 {
        if self.ratios.is_empty() {
            return 1.0;
        }
        self.ratios.iter().sum::<f32>() / self.ratios.len() as f32
    }

    pub fn ratios(&self) -> impl Iterator<Item = f32> + '_ {
        self.ratios.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}

/// Clearance bookkeeping for the green phase in progress
#[derive(Debug, Clone, Copy, PartialEq)]
struct CycleRecord {
    present_at_start: usize,
    cleared: usize,
}

/// The traffic light on one side of a junction
#[derive(Debug, Clone)]
pub struct SignalPhase {
    pub junction: JunctionId,
    pub side: Side,
    state: LightState,
    timer: f32,
    countdown_active: bool,
    current_cycle_time: f32,
    timing: TimingConfig,
    strategy: Rc<dyn GreenTimeStrategy>,
    history: PerformanceHistory,
    cycle: Option<CycleRecord>,
}

impl SignalPhase {
    pub fn new(
        junction: JunctionId,
        side: Side,
        timing: TimingConfig,
        strategy: Rc<dyn GreenTimeStrategy>,
    ) -> Self {
        Self {
            junction,
            side,
            state: LightState::Red,
            timer: 0.0,
            countdown_active: false,
            current_cycle_time: timing.min_green,
            timing,
            strategy,
            history: PerformanceHistory::new(timing.history_len),
            cycle: None,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn is_green(&self) -> bool {
        self.state == LightState::Green
    }

    /// Seconds left in the current green or yellow
    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown_active
    }

    /// Duration chosen for the most recent green phase
    pub fn current_cycle_time(&self) -> f32 {
        self.current_cycle_time
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn performance_history(&self) -> &PerformanceHistory {
        &self.history
    }

    pub fn average_performance(&self) -> f32 {
        self.history.average()
    }

    /// Green duration this light would choose right now, in `[min_green, max_green]`
    pub fn calculate_green_time(&self, context: &GreenTimeContext) -> f32 {
        let raw = self
            .strategy
            .green_time(context, &self.history, &self.timing);
        self.timing.clamp_green(raw)
    }

    /// Turn green for a freshly sized phase and start the countdown
    pub fn start_cycle(&mut self, context: &GreenTimeContext) -> f32 {
        self.close_cycle();
        let duration = self.calculate_green_time(context);
        self.current_cycle_time = duration;
        self.timer = duration;
        self.countdown_active = true;
        self.cycle = Some(CycleRecord {
            present_at_start: context.vehicle_count,
            cleared: 0,
        });
        self.set_state(LightState::Green);
        duration
    }

    /// Drop to red immediately, closing any green phase in progress
    pub fn force_red(&mut self) {
        self.close_cycle();
        self.timer = 0.0;
        self.countdown_active = false;
        self.set_state(LightState::Red);
    }

    /// Back to an idle red without recording the interrupted phase
    pub fn reset(&mut self) {
        self.cycle = None;
        self.timer = 0.0;
        self.countdown_active = false;
        self.set_state(LightState::Red);
    }

    /// Add one clearance result to the history
    ///
    /// Phases that started with nothing queued carry no information and are
    /// skipped.
    pub fn record_performance(&mut self, cleared: usize, total: usize) {
        if total > 0 {
            self.history.push(clearance_ratio(cleared, total));
        }
    }

    /// Advance the countdown by `delta_secs`
    ///
    /// `current_vehicle_count` must be measured the same way as the count the
    /// phase was started with, so the cleared tally is meaningful.
    pub fn tick(
        &mut self,
        delta_secs: f32,
        vehicles_present: bool,
        current_vehicle_count: usize,
        incident: bool,
    ) {
        if incident && self.state == LightState::Green {
            self.force_red();
            return;
        }

        if !vehicles_present && self.state != LightState::Red {
            self.force_red();
            return;
        }

        if !self.countdown_active || self.timer <= 0.0 {
            return;
        }

        self.timer -= delta_secs;

        if self.state == LightState::Green {
            if let Some(cycle) = self.cycle.as_mut() {
                let cleared = cycle.present_at_start.saturating_sub(current_vehicle_count);
                cycle.cleared = cycle.cleared.max(cleared);
            }
        }

        if self.timer <= 0.0 {
            match self.state {
                LightState::Green => {
                    self.timer = self.timing.yellow;
                    self.set_state(LightState::Yellow);
                }
                LightState::Yellow => {
                    self.close_cycle();
                    self.timer = 0.0;
                    self.countdown_active = false;
                    self.set_state(LightState::Red);
                }
                LightState::Red => {}
            }
        }
    }

    fn close_cycle(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            self.record_performance(cycle.cleared, cycle.present_at_start);
        }
    }

    fn set_state(&mut self, state: LightState) {
        if self.state != state {
            debug!(
                "Junction {} {} light {} -> {} ({:.1}s)",
                self.junction.0, self.side, self.state, state, self.timer
            );
            self.state = state;
        }
    }
}
