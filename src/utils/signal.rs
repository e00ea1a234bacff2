//! Signal handling for graceful shutdown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::common::NavResult;

/// Install a Ctrl-C handler that clears the returned running flag.
///
/// The control loop checks the flag between cycles and stops the rover.
pub fn setup_ctrl_c_handler() -> NavResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Rover stopped by user, exiting...");
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
