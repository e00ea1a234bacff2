//! Collaborator interfaces the navigation core is written against

use std::time::Duration;

use crate::common::types::*;

/// Sensor and actuator boundary of a differential-drive rover.
///
/// Implemented by the hardware driver, or by
/// [`SimulatedRover`](crate::sim::SimulatedRover) in tests and demos.
pub trait Rover {
    /// Latest pose estimate (heading in degrees)
    fn pose(&self) -> Pose2D;

    /// Latest LiDAR sweep
    fn laser_scan(&self) -> RangeReading;

    /// Fire-and-forget wheel speed command
    fn send_command(&mut self, command: WheelCommand);

    /// Block until the next control tick.
    ///
    /// Hardware drivers keep publishing while the caller sleeps; simulated
    /// rovers advance their model by `duration` instead.
    fn wait(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<R: Rover + ?Sized> Rover for &mut R {
    fn pose(&self) -> Pose2D {
        (**self).pose()
    }

    fn laser_scan(&self) -> RangeReading {
        (**self).laser_scan()
    }

    fn send_command(&mut self, command: WheelCommand) {
        (**self).send_command(command)
    }

    fn wait(&mut self, duration: Duration) {
        (**self).wait(duration)
    }
}
