//! Simulated rover standing in for the hardware driver

pub mod simulated_rover;

pub use simulated_rover::*;
