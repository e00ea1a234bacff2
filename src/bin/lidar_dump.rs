//! LiDAR diagnostic: print the beam count and the first few readings of one
//! sweep, then make sure the rover is stopped.
//!
//! Usage: lidar_dump [config.toml]

use std::path::Path;

use rover_navigation::{NavResult, NavigatorConfig, Rover, SimulatedRover, WheelCommand};

const SAMPLE_BEAMS: usize = 10;

fn main() -> NavResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => NavigatorConfig::load(Path::new(&path))?,
        None => NavigatorConfig::default(),
    };

    let mut rover = SimulatedRover::from_config(&config.simulation);
    let scan = rover.laser_scan();

    println!("Number of beams in the LiDAR array: {}", scan.len());
    println!(
        "Sample LiDAR distances (first {} beams):",
        SAMPLE_BEAMS.min(scan.len())
    );
    for (i, distance) in scan.raw().iter().take(SAMPLE_BEAMS).enumerate() {
        println!(
            "Beam {} ({} deg): {} meters",
            i + 1,
            scan.angle_min() + i as i32,
            distance
        );
    }

    rover.send_command(WheelCommand::zero());
    println!("Rover stopped.");
    Ok(())
}
