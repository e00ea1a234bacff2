//! Reactive navigation: obstacle assessment, potential field target,
//! heading alignment, control law and the loop tying them together

pub mod obstacle_field;
pub mod potential_field;
pub mod heading_aligner;
pub mod motion_controller;
pub mod control_loop;

pub use obstacle_field::*;
pub use potential_field::*;
pub use heading_aligner::*;
pub use motion_controller::*;
pub use control_loop::*;
