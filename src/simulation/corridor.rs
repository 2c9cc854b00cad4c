//! Two-junction corridor coordination
//!
//! Both junctions sit on one East-West road. Every tick the
//! [`CorridorCoordinator`] measures East-West demand at each junction and how
//! much traffic is heading from one junction toward the other, and hands each
//! junction a [`CorridorContext`]. [`CorridorArbitration`] turns that context
//! into an axis decision: East-West has priority, the upstream junction holds
//! East-West while the downstream one is congested, and North-South runs
//! only when the road is empty. A side with an active incident is held red
//! on its own.

use super::config::CorridorConfig;
use super::intersection::{AxisArbitration, AxisDecision, Intersection, JunctionSnapshot};
use super::signal::GreenTimeContext;
use super::types::{Axis, JunctionId, Side};

/// Position of a junction along the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorridorRole {
    /// First junction; holds East-West for the downstream junction
    Upstream,
    /// Second junction; sizes East-West by local plus incoming traffic
    #[default]
    Downstream,
}

/// Corridor inputs for one junction's arbitration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorridorContext {
    pub role: CorridorRole,
    /// Vehicles on the neighbour's East-West lanes closing in on this junction
    pub approaching: usize,
    /// Vehicles queued on the neighbour's East-West lanes
    pub neighbour_east_west: usize,
}

/// Measures corridor demand between the two junctions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorridorCoordinator {
    config: CorridorConfig,
}

impl CorridorCoordinator {
    pub fn new(config: CorridorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorridorConfig {
        &self.config
    }

    /// The junction on the other end of the corridor
    pub fn next_junction(&self, id: JunctionId, junction_count: usize) -> Option<JunctionId> {
        if junction_count < 2 {
            return None;
        }
        Some(JunctionId((id.0 + 1) % junction_count))
    }

    /// Vehicles on `from`'s East-West lanes within look-ahead of `to`
    pub fn approaching_count(&self, from: &Intersection, to: &Intersection) -> usize {
        from.count_approaching(Axis::EastWest, &to.position, self.config.approach_distance)
    }

    /// Context for every junction, in the same order; `None` everywhere when
    /// there is no neighbour to coordinate with
    pub fn assess(&self, intersections: &[Intersection]) -> Vec<Option<CorridorContext>> {
        let count = intersections.len();
        intersections
            .iter()
            .enumerate()
            .map(|(index, junction)| {
                let neighbour = self
                    .next_junction(JunctionId(index), count)
                    .and_then(|id| intersections.get(id.0))?;
                Some(CorridorContext {
                    role: if index == 0 {
                        CorridorRole::Upstream
                    } else {
                        CorridorRole::Downstream
                    },
                    approaching: self.approaching_count(neighbour, junction),
                    neighbour_east_west: neighbour.axis_count(Axis::EastWest),
                })
            })
            .collect()
    }
}

/// East-West-first arbitration for a junction on the corridor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorridorArbitration {
    config: CorridorConfig,
}

impl CorridorArbitration {
    pub fn new(config: CorridorConfig) -> Self {
        Self { config }
    }
}

impl AxisArbitration for CorridorArbitration {
    fn decide(&self, snapshot: &JunctionSnapshot) -> AxisDecision {
        let corridor = snapshot.corridor.unwrap_or_default();
        let east_west = snapshot.axis_count(Axis::EastWest);
        let north_south = snapshot.axis_count(Axis::NorthSouth);

        if east_west + corridor.approaching > 0 {
            let context = GreenTimeContext::new(Side::East, east_west).inter_junction();
            return match corridor.role {
                CorridorRole::Upstream
                    if corridor.neighbour_east_west > self.config.downstream_yield_threshold =>
                {
                    AxisDecision::all_red()
                }
                CorridorRole::Upstream => {
                    AxisDecision::grant(Axis::EastWest, context, Some(&snapshot.incidents))
                }
                CorridorRole::Downstream => AxisDecision::grant(
                    Axis::EastWest,
                    context.with_approaching(corridor.approaching),
                    Some(&snapshot.incidents),
                ),
            };
        }

        if north_south > 0 {
            AxisDecision::grant(
                Axis::NorthSouth,
                GreenTimeContext::new(Side::North, north_south),
                Some(&snapshot.incidents),
            )
        } else {
            AxisDecision::all_red()
        }
    }
}
