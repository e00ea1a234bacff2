//! Obstacle course demo
//!
//! Runs the same simulated course once per avoidance strategy and plots the
//! trajectories.
//!
//! Run with: cargo run --example obstacle_course

use rover_navigation::navigation::{AvoidanceStrategy, CycleTiming};
use rover_navigation::utils::MissionPlot;
use rover_navigation::{CircleObstacle, ControlLoop, NavigatorConfig, Rover, SimulatedRover};

fn course() -> NavigatorConfig {
    let mut config = NavigatorConfig::default();
    config.timing.cycle = CycleTiming::Fixed { interval_secs: 0.2 };
    config.timing.settle_secs = 0.0;
    config.timing.max_cycles = Some(3000);
    config.simulation.noise_std = 0.02;
    config.simulation.obstacles = vec![
        CircleObstacle::new(6.0, 5.0, 1.0),
        CircleObstacle::new(11.0, 12.0, 1.5),
        CircleObstacle::new(16.0, 15.0, 0.8),
    ];
    config
}

fn main() {
    tracing_subscriber::fmt().init();

    for (strategy, file) in [
        (AvoidanceStrategy::HardOverride, "img/obstacle_course_hard_override.png"),
        (AvoidanceStrategy::AdditiveBias, "img/obstacle_course_additive_bias.png"),
    ]
    .iter()
    {
        let mut config = course();
        config.obstacles.strategy = *strategy;

        let mut rover = SimulatedRover::from_config(&config.simulation);
        let mut control = ControlLoop::new(&config).unwrap();

        match control.run(&mut rover) {
            Ok(report) => println!(
                "{:?}: {:?} after {} cycles ({} emergency turns)",
                strategy, report.outcome, report.cycles, report.emergency_cycles
            ),
            Err(e) => println!("{:?}: {}", strategy, e),
        }

        std::fs::create_dir_all("img").unwrap();
        MissionPlot::new(&format!("Obstacle course ({:?})", strategy))
            .trajectory(rover.trajectory())
            .obstacles(rover.obstacles())
            .start(config.start_pose().position())
            .goal(config.goal_point(), config.goal.tolerance)
            .rover(rover.pose())
            .save_png(file, 800, 800)
            .unwrap();
        println!("Plot saved to: {}", file);
    }
}
