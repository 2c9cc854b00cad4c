//! World lifecycle, commands and end-to-end clearing

use assert_approx_eq::assert_approx_eq;
use junction_sim::simulation::{
    Command, CommandError, CommandParseError, IncidentError, JunctionId, LaneId, LightState,
    PlacementError, Position, Side, SimConfig, SimWorld, VehicleKind,
};

const DT: f32 = 1.0 / 60.0;
const J0: JunctionId = JunctionId(0);
const J1: JunctionId = JunctionId(1);

fn positions(world: &SimWorld, junction: JunctionId, side: Side, lane: usize) -> Vec<Position> {
    world
        .lane(junction, side, lane)
        .unwrap()
        .vehicles()
        .iter()
        .map(|vehicle| vehicle.position)
        .collect()
}

#[test]
fn test_three_cars_clear_the_corridor() {
    let mut world = SimWorld::new(SimConfig::corridor());
    for _ in 0..3 {
        world
            .place_vehicle(J0, Side::West, 0, VehicleKind::Car)
            .unwrap();
    }
    assert_eq!(world.vehicle_count(), 3);

    world.start();
    for _ in 0..1200 {
        world.tick(DT);
    }

    assert_eq!(world.vehicle_count(), 0);
    let stats = world.stats();
    assert_eq!(stats.vehicles_placed, 3);
    assert_eq!(stats.vehicles_cleared, 3);
    assert_eq!(stats.active_vehicles, 0);
    assert_approx_eq!(stats.clearance_rate(), 100.0);
    assert_approx_eq!(stats.elapsed_time, 20.0, 1e-2);
}

#[test]
fn test_duplicate_incident_leaves_lane_blocked() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world.place_incident(J0, Side::East, 1, None).unwrap();

    let second = world.place_incident(J0, Side::East, 1, None);
    assert_eq!(
        second,
        Err(IncidentError::AlreadyActive(LaneId::new(J0, Side::East, 1)))
    );
    let lane = world.lane(J0, Side::East, 1).unwrap();
    assert_approx_eq!(lane.flow_rate(), 0.0);
    assert_eq!(world.stats().incidents_placed, 1);
}

#[test]
fn test_placement_errors_leave_world_unchanged() {
    let mut config = SimConfig::corridor();
    config.vehicle_classes.remove(&VehicleKind::Bus);
    let mut world = SimWorld::new(config);

    assert_eq!(
        world.place_vehicle(J0, Side::North, 1, VehicleKind::Car),
        Err(PlacementError::WrongLane {
            side: Side::North,
            lane: 1
        })
    );
    assert_eq!(
        world.place_vehicle(JunctionId(5), Side::North, 0, VehicleKind::Car),
        Err(PlacementError::UnknownLane {
            junction: 5,
            side: Side::North,
            lane: 0
        })
    );
    assert_eq!(
        world.place_vehicle(J0, Side::North, 0, VehicleKind::Bus),
        Err(PlacementError::UnknownVehicleClass("Bus".to_string()))
    );
    assert_eq!(
        world.place_vehicle_named(J0, Side::North, 0, "spaceship"),
        Err(PlacementError::UnknownVehicleClass("spaceship".to_string()))
    );

    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.stats().vehicles_placed, 0);

    assert!(world
        .place_vehicle_named(J0, Side::North, 0, "Motorcycle")
        .is_ok());
}

#[test]
fn test_incident_errors() {
    let mut world = SimWorld::new(SimConfig::single_junction());
    assert_eq!(
        world.clear_incident(J0, Side::South, 1),
        Err(IncidentError::NoActiveIncident(LaneId::new(
            J0,
            Side::South,
            1
        )))
    );
    assert_eq!(
        world.place_incident(J1, Side::South, 1, None),
        Err(IncidentError::UnknownLane {
            junction: 1,
            side: Side::South,
            lane: 1
        })
    );
}

#[test]
fn test_tick_is_noop_while_stopped() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world
        .place_vehicle(J0, Side::West, 0, VehicleKind::Car)
        .unwrap();
    let before = positions(&world, J0, Side::West, 0);

    for _ in 0..100 {
        world.tick(DT);
    }
    assert!(!world.is_running());
    assert_eq!(positions(&world, J0, Side::West, 0), before);
    assert_approx_eq!(world.time, 0.0);
}

#[test]
fn test_stop_freezes_and_start_restarts_cycle() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world
        .place_vehicle(J1, Side::West, 0, VehicleKind::Car)
        .unwrap();
    world.start();
    assert!(world.is_running());

    for _ in 0..30 {
        world.tick(DT);
    }
    world.stop();
    let frozen = positions(&world, J1, Side::West, 0);
    let phase = world.intersection(J1).unwrap().phase(Side::West);
    let frozen_timer = phase.timer();
    assert!(frozen_timer < phase.current_cycle_time());

    for _ in 0..30 {
        world.tick(DT);
    }
    assert_eq!(positions(&world, J1, Side::West, 0), frozen);
    assert_approx_eq!(
        world.intersection(J1).unwrap().phase(Side::West).timer(),
        frozen_timer
    );

    // Restart sizes a fresh green rather than resuming the frozen countdown
    world.start();
    let phase = world.intersection(J1).unwrap().phase(Side::West);
    assert_eq!(phase.state(), LightState::Green);
    assert_approx_eq!(phase.timer(), phase.current_cycle_time());
}

#[test]
fn test_reset_discards_everything() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world
        .place_vehicle(J0, Side::South, 1, VehicleKind::Truck)
        .unwrap();
    world.place_incident(J1, Side::North, 0, None).unwrap();
    world.start();
    for _ in 0..10 {
        world.tick(DT);
    }

    world.reset();
    assert!(!world.is_running());
    assert_eq!(world.vehicle_count(), 0);
    assert_approx_eq!(world.time, 0.0);
    assert_eq!(world.intersections().len(), 2);
    for intersection in world.intersections() {
        assert!(intersection.all_lanes().all(|lane| lane.incident().is_none()));
        for side in Side::ALL {
            assert_eq!(intersection.light_state(side), LightState::Red);
        }
    }
}

#[test]
fn test_clear_incident_nearest_to_point() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world.place_incident(J1, Side::East, 1, None).unwrap();
    let incident = world
        .lane(J1, Side::East, 1)
        .unwrap()
        .incident()
        .unwrap()
        .position;

    let far = Position::new(incident.x + 100.0, incident.y);
    assert_eq!(
        world.clear_incident_near(far),
        Err(IncidentError::NoIncidentNear {
            x: far.x,
            y: far.y
        })
    );

    let near = Position::new(incident.x + 10.0, incident.y - 5.0);
    assert_eq!(
        world.clear_incident_near(near),
        Ok(LaneId::new(J1, Side::East, 1))
    );
    assert!(!world.lane(J1, Side::East, 1).unwrap().has_active_incident());
    assert!(world.clear_incident_near(near).is_err());
    assert_eq!(world.stats().incidents_cleared, 1);
}

#[test]
fn test_submitted_commands_run_on_next_tick() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world.submit(Command::PlaceVehicle {
        junction: 0,
        side: Side::West,
        lane: 0,
        kind: VehicleKind::Bus,
    });
    world.submit(Command::PlaceIncident {
        junction: 1,
        side: Side::North,
        lane: 0,
        position: None,
    });
    // Rejected when drained, without affecting the others
    world.submit(Command::PlaceIncident {
        junction: 1,
        side: Side::North,
        lane: 0,
        position: None,
    });
    world.submit(Command::Start);
    assert_eq!(world.pending_commands(), 4);
    assert_eq!(world.vehicle_count(), 0);

    world.tick(DT);
    assert_eq!(world.pending_commands(), 0);
    assert_eq!(world.vehicle_count(), 1);
    assert_eq!(world.stats().incidents_placed, 1);
    assert!(world.is_running());
    assert_approx_eq!(world.time, DT);
}

#[test]
fn test_queued_reset_keeps_later_commands() {
    let mut world = SimWorld::new(SimConfig::corridor());
    world
        .place_vehicle(J1, Side::North, 0, VehicleKind::Truck)
        .unwrap();

    world.submit(Command::Reset);
    world.submit(Command::PlaceVehicle {
        junction: 0,
        side: Side::West,
        lane: 0,
        kind: VehicleKind::Car,
    });
    world.submit(Command::Start);
    world.tick(DT);

    assert_eq!(world.pending_commands(), 0);
    assert!(world.is_running());
    assert_eq!(world.vehicle_count(), 1);
    assert_eq!(world.lane(J0, Side::West, 0).unwrap().vehicle_count(), 1);
    assert_eq!(world.lane(J1, Side::North, 0).unwrap().vehicle_count(), 0);
    assert_eq!(world.stats().vehicles_placed, 1);
}

#[test]
fn test_apply_reports_rejections() {
    let mut world = SimWorld::new(SimConfig::corridor());
    let result = world.apply(Command::PlaceVehicle {
        junction: 0,
        side: Side::East,
        lane: 0,
        kind: VehicleKind::Car,
    });
    assert_eq!(
        result,
        Err(CommandError::Placement(PlacementError::WrongLane {
            side: Side::East,
            lane: 0
        }))
    );
    assert!(world.apply(Command::Reset).is_ok());
}

#[test]
fn test_command_text_parsing() {
    assert_eq!(
        "vehicle 0:W:1:car".parse::<Command>(),
        Ok(Command::PlaceVehicle {
            junction: 0,
            side: Side::West,
            lane: 0,
            kind: VehicleKind::Car
        })
    );
    assert_eq!(
        "incident 1:east:2@700,390".parse::<Command>(),
        Ok(Command::PlaceIncident {
            junction: 1,
            side: Side::East,
            lane: 1,
            position: Some(Position::new(700.0, 390.0))
        })
    );
    assert_eq!(
        "clear 1:E:2".parse::<Command>(),
        Ok(Command::ClearIncident {
            junction: 1,
            side: Side::East,
            lane: 1
        })
    );
    assert_eq!(
        "clear-at 10,20".parse::<Command>(),
        Ok(Command::ClearIncidentNear(Position::new(10.0, 20.0)))
    );
    assert_eq!("start".parse::<Command>(), Ok(Command::Start));
    assert_eq!(" Stop ".parse::<Command>(), Ok(Command::Stop));
    assert_eq!("reset".parse::<Command>(), Ok(Command::Reset));

    assert!(matches!(
        "vehicle 0:W:car".parse::<Command>(),
        Err(CommandParseError::Malformed(_))
    ));
    assert_eq!(
        "vehicle 0:Q:1:car".parse::<Command>(),
        Err(CommandParseError::UnknownSide("Q".to_string()))
    );
    assert_eq!(
        "vehicle 0:W:0:car".parse::<Command>(),
        Err(CommandParseError::InvalidNumber("0".to_string()))
    );
    assert_eq!(
        "vehicle 0:W:1:plane".parse::<Command>(),
        Err(CommandParseError::UnknownVehicleClass("plane".to_string()))
    );
    assert!(matches!(
        "fly away".parse::<Command>(),
        Err(CommandParseError::Malformed(_))
    ));
}
