//! Simulated differential-drive rover
//!
//! Integrates wheel commands with a unicycle model while the control loop
//! waits, and produces LiDAR sweeps by ray casting against circular
//! obstacles. Used in place of the hardware driver by tests, the binaries and
//! the demo.

use std::time::Duration;

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

use crate::common::{Path2D, Point2D, Pose2D, RangeReading, Rover, WheelCommand};
use crate::config::SimulationConfig;
use crate::utils::wrap_angle;

/// Round obstacle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CircleObstacle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl CircleObstacle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        CircleObstacle { x, y, radius }
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.distance(&Point2D::new(self.x, self.y)) < self.radius
    }

    /// Distance along the unit ray `dir` from `origin` to the circle edge
    pub fn ray_distance(&self, origin: &Vector2<f64>, dir: &Vector2<f64>) -> Option<f64> {
        let m = origin - Vector2::new(self.x, self.y);
        let b = m.dot(dir);
        let c = m.dot(&m) - self.radius.powi(2);
        if c > 0.0 && b > 0.0 {
            return None;
        }
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        Some((-b - disc.sqrt()).max(0.0))
    }
}

/// Physical and sensor parameters of the simulated rover
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Distance between the wheels [m]
    pub track_width: f64,
    pub scan_min: i32,
    pub scan_max: i32,
    /// Beams that hit nothing within this range report no reading [m]
    pub lidar_range: f64,
    /// Gaussian range noise standard deviation [m]
    pub noise_std: f64,
    pub seed: u64,
    /// Integration step [s]
    pub step_secs: f64,
    pub obstacles: Vec<CircleObstacle>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for SimulationParams {
    fn from(config: &SimulationConfig) -> Self {
        SimulationParams {
            track_width: config.track_width,
            scan_min: config.scan_min,
            scan_max: config.scan_max,
            lidar_range: config.lidar_range,
            noise_std: config.noise_std,
            seed: config.seed,
            step_secs: config.step_secs,
            obstacles: config.obstacles.clone(),
        }
    }
}

pub struct SimulatedRover {
    pose: Pose2D,
    params: SimulationParams,
    command: WheelCommand,
    commands: Vec<WheelCommand>,
    trajectory: Path2D,
    scan: RangeReading,
    noise: Option<Normal<f64>>,
    rng: StdRng,
    sim_time: f64,
    blocked_steps: usize,
}

impl SimulatedRover {
    pub fn new(start: Pose2D, params: SimulationParams) -> Self {
        let noise = if params.noise_std > 0.0 {
            Normal::new(0.0, params.noise_std).ok()
        } else {
            None
        };
        let rng = StdRng::seed_from_u64(params.seed);
        let mut rover = SimulatedRover {
            pose: start,
            command: WheelCommand::zero(),
            commands: Vec::new(),
            trajectory: Path2D::from_points(vec![start.position()]),
            scan: RangeReading::empty(),
            noise,
            rng,
            sim_time: 0.0,
            blocked_steps: 0,
            params,
        };
        rover.refresh_scan();
        rover
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        let start = Pose2D::new(config.start_x, config.start_y, config.start_heading);
        Self::new(start, SimulationParams::from(config))
    }

    /// Every command received, in order
    pub fn commands(&self) -> &[WheelCommand] {
        &self.commands
    }

    pub fn trajectory(&self) -> &Path2D {
        &self.trajectory
    }

    pub fn obstacles(&self) -> &[CircleObstacle] {
        &self.params.obstacles
    }

    /// Simulated seconds elapsed
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Integration steps where an obstacle stopped the rover
    pub fn blocked_steps(&self) -> usize {
        self.blocked_steps
    }

    /// Advance the model by `dt` seconds under the current command
    pub fn advance(&mut self, dt: f64) {
        let steps = (dt / self.params.step_secs).ceil().max(1.0) as usize;
        let h = dt / steps as f64;
        for _ in 0..steps {
            self.integrate(h);
        }
        self.sim_time += dt;
        self.refresh_scan();
    }

    fn integrate(&mut self, dt: f64) {
        let v = (self.command.left + self.command.right) / 2.0;
        let omega = (self.command.right - self.command.left) / self.params.track_width;

        let yaw = wrap_angle(self.pose.heading_rad() + omega * dt);
        let next = Point2D::new(self.pose.x + v * yaw.cos() * dt, self.pose.y + v * yaw.sin() * dt);

        self.pose.heading = yaw.to_degrees();
        if self.params.obstacles.iter().any(|o| o.contains(&next)) {
            self.blocked_steps += 1;
            return;
        }
        self.pose.x = next.x;
        self.pose.y = next.y;
        self.trajectory.push(next);
    }

    fn refresh_scan(&mut self) {
        let origin = self.pose.position().to_vector();
        let heading = self.pose.heading_rad();
        let beams = (self.params.scan_max - self.params.scan_min + 1).max(0) as usize;
        let mut ranges = Vec::with_capacity(beams);

        for angle in self.params.scan_min..=self.params.scan_max {
            // Positive scan angles sweep clockwise (to the right)
            let bearing = heading - (angle as f64).to_radians();
            let dir = Vector2::new(bearing.cos(), bearing.sin());
            let hit = self
                .params
                .obstacles
                .iter()
                .filter_map(|o| o.ray_distance(&origin, &dir))
                .filter(|&d| d <= self.params.lidar_range)
                .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))));

            let distance = match (hit, &self.noise) {
                (Some(d), Some(noise)) => (d + noise.sample(&mut self.rng)).max(0.01),
                (Some(d), None) => d,
                (None, _) => 0.0,
            };
            ranges.push(distance);
        }

        self.scan = RangeReading::new(self.params.scan_min, ranges);
    }
}

impl Rover for SimulatedRover {
    fn pose(&self) -> Pose2D {
        self.pose
    }

    fn laser_scan(&self) -> RangeReading {
        self.scan.clone()
    }

    fn send_command(&mut self, command: WheelCommand) {
        self.command = command;
        self.commands.push(command);
    }

    fn wait(&mut self, duration: Duration) {
        self.advance(duration.as_secs_f64());
    }
}
