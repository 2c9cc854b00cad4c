use std::process::{Command, Output};

fn run_simulation(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_junction_sim"))
        .args(args)
        .env("RUST_LOG", "warn,junction_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Extract the number after `label` on the first stderr line containing it
fn stat(stderr: &str, label: &str) -> f32 {
    let line = stderr
        .lines()
        .find(|line| line.contains(label))
        .unwrap_or_else(|| panic!("Missing '{label}' statistic. stderr: {stderr}"));
    let parts: Vec<&str> = line.split(label).collect();
    parts
        .get(1)
        .map(|s| s.trim().trim_end_matches('%').trim_end_matches('s'))
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("Could not parse '{label}' from line: {line}"))
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_simulation(&["--ticks", "120"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that simulation statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_simulation(&["--ticks", "60", "--topology", "single"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for label in [
        "Elapsed time:",
        "Vehicles placed:",
        "Vehicles cleared:",
        "Active vehicles:",
        "Incidents placed:",
        "Clearance rate:",
    ] {
        assert!(stderr.contains(label), "Missing '{label}' statistic");
    }
}

/// Test that scripted vehicles drive through and leave the world
#[test]
fn test_scripted_vehicles_clear() {
    let output = run_simulation(&[
        "--ticks",
        "2400",
        "--vehicle",
        "0:W:1:car",
        "--vehicle",
        "0:W:1:bus",
        "--vehicle",
        "1:N:1:truck",
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stat(&stderr, "Vehicles placed:"), 3.0);
    assert_eq!(stat(&stderr, "Vehicles cleared:"), 3.0);
    assert_eq!(stat(&stderr, "Active vehicles:"), 0.0);
    assert_eq!(stat(&stderr, "Clearance rate:"), 100.0);
}

/// Test that an incident holds its lane until it is cleared by position
#[test]
fn test_incident_cleared_by_position() {
    let output = run_simulation(&[
        "--ticks",
        "1800",
        "--vehicle",
        "1:E:2:car",
        "--incident",
        "1:E:2",
        "--clear-at",
        "657,399",
        "--clear-after",
        "5",
    ]);
    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stat(&stderr, "Incidents placed:"), 1.0);
    assert_eq!(stat(&stderr, "Incidents cleared:"), 1.0);
    assert_eq!(stat(&stderr, "Vehicles cleared:"), 1.0);
}

/// Test that random placement is reproducible with a seed
#[test]
fn test_seeded_random_placement() {
    let args = ["--topology", "single", "--random", "12", "--seed", "7", "--ticks", "600"];
    let first = run_simulation(&args);
    let second = run_simulation(&args);
    assert!(first.status.success() && second.status.success());

    let first = String::from_utf8_lossy(&first.stderr);
    let second = String::from_utf8_lossy(&second.stderr);
    assert_eq!(stat(&first, "Vehicles placed:"), 12.0);
    assert_eq!(
        stat(&first, "Vehicles cleared:"),
        stat(&second, "Vehicles cleared:")
    );
}

/// Test that an illegal scripted placement is reported as a failure
#[test]
fn test_wrong_lane_is_rejected() {
    let output = run_simulation(&["--vehicle", "0:N:2:car"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Could not place vehicle"),
        "Missing placement error. stderr: {}",
        stderr
    );
}
