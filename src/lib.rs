//! rover_navigation - reactive navigation controller for a differential-drive rover
//!
//! Drives a rover toward a goal while steering around obstacles seen by a
//! LiDAR: a potential field target, two-tier obstacle avoidance with
//! per-side memory, an initial in-place heading alignment and a fixed-gain
//! differential drive control law, run by a single-threaded control loop.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Navigation and simulation
pub mod navigation;
pub mod sim;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Path2D, WheelCommand, RangeReading, AngleSector, ObstacleMemory};
pub use common::Rover;
pub use common::{NavError, NavResult};
pub use config::NavigatorConfig;
pub use navigation::{ControlLoop, MissionOutcome, MissionReport};
pub use sim::{CircleObstacle, SimulatedRover, SimulationParams};
