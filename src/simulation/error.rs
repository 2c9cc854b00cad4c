//! Error types for commands issued to the simulation
//!
//! Every error here is value-returned and non-fatal: the rejected command
//! leaves the simulation untouched and the caller decides what to report.

use std::fmt;

use super::types::{LaneId, Side};

/// Why a vehicle could not be placed
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementError {
    /// The lane exists but is not the entry lane for its side
    WrongLane { side: Side, lane: usize },
    /// The requested class is not in the vehicle catalog
    UnknownVehicleClass(String),
    /// No such junction or lane index
    UnknownLane { junction: usize, side: Side, lane: usize },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::WrongLane { side, lane } => write!(
                f,
                "{side} lane {} does not accept new vehicles, use lane {}",
                lane + 1,
                side.entry_lane() + 1
            ),
            PlacementError::UnknownVehicleClass(name) => {
                write!(f, "Unknown vehicle class: {name}")
            }
            PlacementError::UnknownLane {
                junction,
                side,
                lane,
            } => write!(f, "No lane {} on {side} side of junction {junction}", lane + 1),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Why an incident command was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum IncidentError {
    /// The lane already holds an active incident
    AlreadyActive(LaneId),
    /// Nothing to clear on the lane
    NoActiveIncident(LaneId),
    /// No such junction or lane index
    UnknownLane { junction: usize, side: Side, lane: usize },
    /// No active incident within the pick radius of a point
    NoIncidentNear { x: f32, y: f32 },
}

impl fmt::Display for IncidentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentError::AlreadyActive(lane) => {
                write!(f, "Incident already active on {lane}")
            }
            IncidentError::NoActiveIncident(lane) => write!(f, "No active incident on {lane}"),
            IncidentError::UnknownLane {
                junction,
                side,
                lane,
            } => write!(f, "No lane {} on {side} side of junction {junction}", lane + 1),
            IncidentError::NoIncidentNear { x, y } => {
                write!(f, "No incident found near ({x:.0}, {y:.0})")
            }
        }
    }
}

impl std::error::Error for IncidentError {}

/// Malformed textual command (as typed on the command line)
#[derive(Debug, Clone, PartialEq)]
pub enum CommandParseError {
    /// Wrong number of `:`-separated fields
    Malformed(String),
    UnknownSide(String),
    UnknownVehicleClass(String),
    /// A numeric field did not parse
    InvalidNumber(String),
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandParseError::Malformed(input) => write!(f, "Malformed command: {input}"),
            CommandParseError::UnknownSide(input) => write!(f, "Unknown side: {input}"),
            CommandParseError::UnknownVehicleClass(input) => {
                write!(f, "Unknown vehicle class: {input}")
            }
            CommandParseError::InvalidNumber(input) => write!(f, "Invalid number: {input}"),
        }
    }
}

impl std::error::Error for CommandParseError {}

/// A rejected [`Command`](super::Command)
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    Placement(PlacementError),
    Incident(IncidentError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Placement(err) => err.fmt(f),
            CommandError::Incident(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Placement(err) => Some(err),
            CommandError::Incident(err) => Some(err),
        }
    }
}

impl From<PlacementError> for CommandError {
    fn from(err: PlacementError) -> Self {
        CommandError::Placement(err)
    }
}

impl From<IncidentError> for CommandError {
    fn from(err: IncidentError) -> Self {
        CommandError::Incident(err)
    }
}
