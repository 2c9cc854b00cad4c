//! Core types for the junction simulation
//!
//! Compass sides, travel directions, axes and light states shared by every
//! other module. None of these carry behaviour beyond simple geometry.

use std::fmt;
use std::str::FromStr;

use super::error::CommandParseError;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for junction IDs (index into the world's junction list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(pub usize);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub SimId);

/// Identity of one lane: junction, approach side and lane index (0 or 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneId {
    pub junction: JunctionId,
    pub side: Side,
    pub index: usize,
}

impl LaneId {
    pub fn new(junction: JunctionId, side: Side, index: usize) -> Self {
        Self {
            junction,
            side,
            index,
        }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "junction {} {} lane {}",
            self.junction.0,
            self.side,
            self.index + 1
        )
    }
}

/// A 2D position in world units (x grows east, y grows south)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move this position `amount` units toward `direction`
    pub fn offset(&self, direction: Direction, amount: f32) -> Position {
        let (dx, dy) = direction.unit();
        Position {
            x: self.x + dx * amount,
            y: self.y + dy * amount,
        }
    }
}

/// One of the four approaches to a junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    /// Fixed evaluation order; ties in density go to the earlier side
    pub const ALL: [Side; 4] = [Side::North, Side::South, Side::East, Side::West];

    pub fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::South => 1,
            Side::East => 2,
            Side::West => 3,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Side::North | Side::South => Axis::NorthSouth,
            Side::East | Side::West => Axis::EastWest,
        }
    }

    /// Vehicles queued on a side drive away from it, across the junction
    pub fn travel_direction(self) -> Direction {
        match self {
            Side::North => Direction::South,
            Side::South => Direction::North,
            Side::East => Direction::West,
            Side::West => Direction::East,
        }
    }

    /// The only lane index that accepts newly placed vehicles
    pub fn entry_lane(self) -> usize {
        match self {
            Side::North | Side::West => 0,
            Side::South | Side::East => 1,
        }
    }

    /// Unit offset of the side's approach from the junction centre
    pub fn outward(self) -> (f32, f32) {
        match self {
            Side::North => (0.0, -1.0),
            Side::South => (0.0, 1.0),
            Side::East => (1.0, 0.0),
            Side::West => (-1.0, 0.0),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Side::North => 'N',
            Side::South => 'S',
            Side::East => 'E',
            Side::West => 'W',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::North => "North",
            Side::South => "South",
            Side::East => "East",
            Side::West => "West",
        };
        f.pad(name)
    }
}

impl FromStr for Side {
    type Err = CommandParseError;

    /// Accepts `N`/`North` style names, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Side::North),
            "s" | "south" => Ok(Side::South),
            "e" | "east" => Ok(Side::East),
            "w" | "west" => Ok(Side::West),
            _ => Err(CommandParseError::UnknownSide(s.to_string())),
        }
    }
}

/// Compass direction a vehicle is moving toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::East => (1.0, 0.0),
            Direction::West => (-1.0, 0.0),
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }

    /// Signed distance travelled along this direction; larger is further ahead
    pub fn progress(self, position: &Position) -> f32 {
        match self {
            Direction::East => position.x,
            Direction::West => -position.x,
            Direction::South => position.y,
            Direction::North => -position.y,
        }
    }
}

/// A pair of opposite sides sharing right-of-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    pub fn sides(self) -> [Side; 2] {
        match self {
            Axis::NorthSouth => [Side::North, Side::South],
            Axis::EastWest => [Side::East, Side::West],
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest => Axis::NorthSouth,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::NorthSouth => f.write_str("North-South"),
            Axis::EastWest => f.write_str("East-West"),
        }
    }
}

/// State of a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightState {
    #[default]
    Red,
    Green,
    Yellow,
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Red => f.pad("RED"),
            LightState::Green => f.pad("GREEN"),
            LightState::Yellow => f.pad("YELLOW"),
        }
    }
}

/// Fixed-size per-side storage indexed by [`Side::index`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SideMap<T>(pub [T; 4]);

impl<T: Copy> SideMap<T> {
    pub fn from_fn(f: impl FnMut(Side) -> T) -> Self {
        SideMap(Side::ALL.map(f))
    }

    pub fn get(&self, side: Side) -> T {
        self.0[side.index()]
    }

    pub fn set(&mut self, side: Side, value: T) {
        self.0[side.index()] = value;
    }
}

impl SideMap<usize> {
    pub fn axis_total(&self, axis: Axis) -> usize {
        axis.sides().iter().map(|side| self.get(*side)).sum()
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

impl SideMap<bool> {
    pub fn any_on(&self, axis: Axis) -> bool {
        axis.sides().iter().any(|side| self.get(*side))
    }
}
