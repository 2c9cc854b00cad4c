//! Discrete commands from the control surface
//!
//! Commands are either applied immediately with
//! [`SimWorld::apply`](super::SimWorld::apply) or queued with
//! [`SimWorld::submit`](super::SimWorld::submit) and run at the start of the
//! next tick.
//!
//! Textual form, used by the command line:
//!
//! ```text
//! vehicle 0:W:1:car        junction 0, West side, lane 1, a Car
//! incident 1:E:2           default position
//! incident 1:E:2@700,390   explicit position
//! clear 1:E:2
//! clear-at 700,390
//! start | stop | reset
//! ```
//!
//! Junctions count from 0 and lanes from 1, as they are displayed.

use std::str::FromStr;

use super::config::VehicleKind;
use super::error::CommandParseError;
use super::types::{Position, Side};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    PlaceVehicle {
        junction: usize,
        side: Side,
        /// Zero-based lane index
        lane: usize,
        kind: VehicleKind,
    },
    PlaceIncident {
        junction: usize,
        side: Side,
        lane: usize,
        position: Option<Position>,
    },
    ClearIncident {
        junction: usize,
        side: Side,
        lane: usize,
    },
    ClearIncidentNear(Position),
    Start,
    Stop,
    Reset,
}

impl Command {
    /// `J:SIDE:LANE:CLASS`
    pub fn parse_vehicle(input: &str) -> Result<Self, CommandParseError> {
        let (address, class) = input
            .rsplit_once(':')
            .ok_or_else(|| CommandParseError::Malformed(input.to_string()))?;
        let (junction, side, lane) = parse_lane_address(address)?;
        Ok(Command::PlaceVehicle {
            junction,
            side,
            lane,
            kind: class.parse()?,
        })
    }

    /// `J:SIDE:LANE` optionally followed by `@X,Y`
    pub fn parse_incident(input: &str) -> Result<Self, CommandParseError> {
        let (address, position) = match input.split_once('@') {
            Some((address, point)) => (address, Some(parse_point(point)?)),
            None => (input, None),
        };
        let (junction, side, lane) = parse_lane_address(address)?;
        Ok(Command::PlaceIncident {
            junction,
            side,
            lane,
            position,
        })
    }

    /// `J:SIDE:LANE`
    pub fn parse_clear(input: &str) -> Result<Self, CommandParseError> {
        let (junction, side, lane) = parse_lane_address(input)?;
        Ok(Command::ClearIncident {
            junction,
            side,
            lane,
        })
    }

    /// `X,Y`
    pub fn parse_clear_at(input: &str) -> Result<Self, CommandParseError> {
        Ok(Command::ClearIncidentNear(parse_point(input)?))
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let rest = rest.trim();
        match verb.to_ascii_lowercase().as_str() {
            "vehicle" => Command::parse_vehicle(rest),
            "incident" => Command::parse_incident(rest),
            "clear" => Command::parse_clear(rest),
            "clear-at" => Command::parse_clear_at(rest),
            "start" if rest.is_empty() => Ok(Command::Start),
            "stop" if rest.is_empty() => Ok(Command::Stop),
            "reset" if rest.is_empty() => Ok(Command::Reset),
            _ => Err(CommandParseError::Malformed(s.to_string())),
        }
    }
}

/// `J:SIDE:LANE` into a junction index, side and zero-based lane index
fn parse_lane_address(input: &str) -> Result<(usize, Side, usize), CommandParseError> {
    let fields: Vec<&str> = input.split(':').collect();
    let [junction, side, lane] = fields.as_slice() else {
        return Err(CommandParseError::Malformed(input.to_string()));
    };
    let junction = parse_number::<usize>(junction)?;
    let side = side.parse::<Side>()?;
    let lane = parse_number::<usize>(lane)?
        .checked_sub(1)
        .ok_or_else(|| CommandParseError::InvalidNumber(lane.to_string()))?;
    Ok((junction, side, lane))
}

fn parse_point(input: &str) -> Result<Position, CommandParseError> {
    let (x, y) = input
        .split_once(',')
        .ok_or_else(|| CommandParseError::Malformed(input.to_string()))?;
    Ok(Position::new(parse_number(x)?, parse_number(y)?))
}

fn parse_number<T: FromStr>(input: &str) -> Result<T, CommandParseError> {
    input
        .trim()
        .parse()
        .map_err(|_| CommandParseError::InvalidNumber(input.trim().to_string()))
}
