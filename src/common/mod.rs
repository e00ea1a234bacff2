//! Common types, traits, and error definitions for rover_navigation
//!
//! This module provides the foundational building blocks shared by the
//! navigation core, the simulator and the binaries.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
