//! Drive the rover to the configured goal.
//!
//! Usage: rover_nav [config.toml] [--plot out.png|out.svg]
//!
//! Without a config argument, `rover_nav.toml` in the working directory is
//! used if present, otherwise the built-in defaults. The mission runs against
//! the simulated rover described by the `[simulation]` section.

use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rover_navigation::utils::{setup_ctrl_c_handler, MissionPlot};
use rover_navigation::{ControlLoop, NavResult, NavigatorConfig, Rover, SimulatedRover};

fn main() -> NavResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rover_navigation=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();

    let config = if args.len() > 1 && !args[1].starts_with("--") {
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        NavigatorConfig::load(config_path)?
    } else if Path::new("rover_nav.toml").exists() {
        info!("Loading configuration from rover_nav.toml");
        NavigatorConfig::load(Path::new("rover_nav.toml"))?
    } else {
        info!("Using default configuration");
        NavigatorConfig::default()
    };

    let plot_path = args
        .iter()
        .position(|a| a == "--plot")
        .and_then(|i| args.get(i + 1))
        .cloned();

    info!("rover_nav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Goal ({:.2}, {:.2}), tolerance {:.2} m, strategy {:?}",
        config.goal.x, config.goal.y, config.goal.tolerance, config.obstacles.strategy
    );

    let running = setup_ctrl_c_handler()?;
    let mut rover = SimulatedRover::from_config(&config.simulation);
    let mut control = ControlLoop::new(&config)?.with_running_flag(running);

    let result = control.run(&mut rover);

    if let Some(path) = plot_path {
        let plot = MissionPlot::new("Rover navigation")
            .trajectory(rover.trajectory())
            .obstacles(rover.obstacles())
            .start(config.start_pose().position())
            .goal(config.goal_point(), config.goal.tolerance)
            .rover(rover.pose());
        let saved = if path.ends_with(".svg") {
            plot.save_svg(&path)
        } else {
            plot.save_png(&path, 800, 800)
        };
        // The mission result takes precedence over a plotting failure
        match saved {
            Ok(()) => info!("Plot saved to: {}", path),
            Err(e) => warn!("Could not save plot to {}: {}", path, e),
        }
    }

    let report = result?;
    info!(
        "Finished at ({:.2}, {:.2}), path length {:.2} m",
        report.final_pose.x,
        report.final_pose.y,
        rover.trajectory().total_length()
    );
    info!("Cleanup complete, program terminated gracefully.");
    Ok(())
}
