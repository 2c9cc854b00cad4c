//! Road geometry
//!
//! Where junctions sit, where each lane's reference and spawn points are,
//! and how far a vehicle may drive before it leaves the world.

use super::config::SimConfig;
use super::lane::{Lane, LaneParams};
use super::types::{Axis, Direction, JunctionId, LaneId, Position, Side};

/// Lanes on every approach
pub const LANES_PER_SIDE: usize = 2;

/// Junction centres, west to east
pub fn junction_positions(config: &SimConfig) -> Vec<Position> {
    config
        .junction_positions()
        .into_iter()
        .map(|(x, y)| Position::new(x, y))
        .collect()
}

/// Marker point of a lane just outside the junction box
pub fn lane_reference(config: &SimConfig, centre: Position, side: Side, index: usize) -> Position {
    let reach = config.intersection_size / 2.0 * 1.5;
    let across = config.lane_width * (index as f32 - (LANES_PER_SIDE as f32 - 1.0) / 2.0);
    let (ox, oy) = side.outward();
    match side.axis() {
        Axis::NorthSouth => Position::new(centre.x + across, centre.y + oy * reach),
        Axis::EastWest => Position::new(centre.x + ox * reach, centre.y + across),
    }
}

/// Where the first vehicle of a lane is placed
///
/// North/South lanes start near the top/bottom edge. East/West lanes start
/// near the end of their road segment: the world edge, or the neighbouring
/// junction when there is one.
pub fn spawn_point(
    config: &SimConfig,
    junctions: &[Position],
    junction_index: usize,
    side: Side,
    reference: Position,
) -> Position {
    let inset = config.spawn_inset;
    match side {
        Side::North => Position::new(reference.x, inset),
        Side::South => Position::new(reference.x, config.world_height - inset),
        Side::West => {
            let x = junction_index
                .checked_sub(1)
                .and_then(|previous| junctions.get(previous))
                .map_or(inset, |previous| previous.x + inset);
            Position::new(x, reference.y)
        }
        Side::East => {
            let x = junctions
                .get(junction_index + 1)
                .map_or(config.world_width - inset, |next| next.x - inset);
            Position::new(x, reference.y)
        }
    }
}

/// Progress along `direction` past which a vehicle is off the world
pub fn exit_limit(config: &SimConfig, direction: Direction) -> f32 {
    let margin = config.off_bounds_margin;
    match direction {
        Direction::East => config.world_width + margin,
        Direction::South => config.world_height + margin,
        Direction::West | Direction::North => margin,
    }
}

/// All lanes of one junction, grouped by side in [`Side::index`] order
pub fn build_lanes(
    config: &SimConfig,
    junctions: &[Position],
    junction_index: usize,
) -> [Vec<Lane>; 4] {
    let centre = junctions
        .get(junction_index)
        .copied()
        .unwrap_or_default();
    Side::ALL.map(|side| {
        (0..LANES_PER_SIDE)
            .map(|index| {
                let id = LaneId::new(JunctionId(junction_index), side, index);
                let reference = lane_reference(config, centre, side, index);
                let spawn = spawn_point(config, junctions, junction_index, side, reference);
                let params = LaneParams {
                    spacing: config.vehicle_spacing,
                    exit_limit: exit_limit(config, side.travel_direction()),
                    incident_size: config.incident_size,
                    incident_offset: config.incident_offset,
                    flash_interval: config.incident_flash_interval,
                };
                Lane::new(id, reference, spawn, params)
            })
            .collect()
    })
}
