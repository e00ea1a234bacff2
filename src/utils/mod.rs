//! Utility modules for rover_navigation

pub mod angle;
pub mod signal;
pub mod visualization;

pub use angle::{heading_delta, wrap_angle};
pub use signal::setup_ctrl_c_handler;
pub use visualization::{colors, MissionPlot};
