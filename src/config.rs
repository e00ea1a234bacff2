//! Configuration loading for the rover navigator
//!
//! Every value is fixed at startup. Missing TOML keys fall back to the
//! defaults the rover was tuned with.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::common::{AngleSector, NavError, NavResult, Point2D, Pose2D};
use crate::navigation::{AvoidanceStrategy, CycleTiming};
use crate::sim::CircleObstacle;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavigatorConfig {
    #[serde(default)]
    pub gains: GainConfig,
    #[serde(default)]
    pub velocity: VelocityConfig,
    #[serde(default)]
    pub goal: GoalConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub obstacles: ObstacleConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Control law gains
#[derive(Clone, Debug, Deserialize)]
pub struct GainConfig {
    /// Wheel speed per radian of heading error
    #[serde(default = "default_turn_gain")]
    pub turn_gain: f64,

    /// Forward speed per meter of distance to target
    #[serde(default = "default_forward_gain")]
    pub forward_gain: f64,

    /// Forward speed removed per radian of heading error
    #[serde(default = "default_angular_linear_weight")]
    pub angular_linear_weight: f64,
}

/// Forward velocity band
#[derive(Clone, Debug, Deserialize)]
pub struct VelocityConfig {
    #[serde(default = "default_min_fwd_vel")]
    pub min_fwd_vel: f64,

    #[serde(default = "default_max_fwd_vel")]
    pub max_fwd_vel: f64,
}

/// Goal position and arrival radius
#[derive(Clone, Debug, Deserialize)]
pub struct GoalConfig {
    #[serde(default = "default_goal_x")]
    pub x: f64,

    #[serde(default = "default_goal_y")]
    pub y: f64,

    /// Arrival radius in meters, compared against the plain distance
    #[serde(default = "default_goal_tolerance")]
    pub tolerance: f64,
}

/// Potential field parameters
#[derive(Clone, Debug, Deserialize)]
pub struct FieldConfig {
    /// Repulsion constant
    #[serde(default = "default_k")]
    pub k: f64,

    /// Readings at or beyond this range (meters) are ignored
    #[serde(default = "default_max_range")]
    pub max_range: f64,
}

/// Obstacle detection thresholds and scan sectors
#[derive(Clone, Debug, Deserialize)]
pub struct ObstacleConfig {
    /// Emergency turn / memory threshold (meters)
    #[serde(default = "default_critical_distance")]
    pub critical_distance: f64,

    /// Soft heading bias threshold (meters)
    #[serde(default = "default_non_critical_distance")]
    pub non_critical_distance: f64,

    #[serde(default)]
    pub strategy: AvoidanceStrategy,

    #[serde(default = "default_front_sector")]
    pub front: AngleSector,

    #[serde(default = "default_left_sector")]
    pub left: AngleSector,

    #[serde(default = "default_right_sector")]
    pub right: AngleSector,
}

/// Initial in-place heading alignment
#[derive(Clone, Debug, Deserialize)]
pub struct AlignmentConfig {
    /// Acceptable heading error (radians)
    #[serde(default = "default_heading_threshold")]
    pub heading_threshold: f64,

    /// Wait between rotation commands (seconds)
    #[serde(default = "default_align_tick")]
    pub tick_secs: f64,

    /// Rotation commands issued before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

/// Control loop pacing
#[derive(Clone, Debug, Deserialize)]
pub struct TimingConfig {
    #[serde(default)]
    pub cycle: CycleTiming,

    /// Wait for the driver to publish before the first read (seconds)
    #[serde(default = "default_settle")]
    pub settle_secs: f64,

    /// Abort the travel phase after this many cycles
    #[serde(default)]
    pub max_cycles: Option<usize>,
}

/// Simulated rover used by the binaries and tests
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub start_x: f64,

    #[serde(default)]
    pub start_y: f64,

    /// Degrees
    #[serde(default)]
    pub start_heading: f64,

    /// Distance between wheels (meters)
    #[serde(default = "default_track_width")]
    pub track_width: f64,

    #[serde(default = "default_scan_min")]
    pub scan_min: i32,

    #[serde(default = "default_scan_max")]
    pub scan_max: i32,

    #[serde(default = "default_lidar_range")]
    pub lidar_range: f64,

    /// Standard deviation of range noise (meters)
    #[serde(default)]
    pub noise_std: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Integration step (seconds)
    #[serde(default = "default_sim_step")]
    pub step_secs: f64,

    #[serde(default)]
    pub obstacles: Vec<CircleObstacle>,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            turn_gain: default_turn_gain(),
            forward_gain: default_forward_gain(),
            angular_linear_weight: default_angular_linear_weight(),
        }
    }
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            min_fwd_vel: default_min_fwd_vel(),
            max_fwd_vel: default_max_fwd_vel(),
        }
    }
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            x: default_goal_x(),
            y: default_goal_y(),
            tolerance: default_goal_tolerance(),
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_range: default_max_range(),
        }
    }
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            critical_distance: default_critical_distance(),
            non_critical_distance: default_non_critical_distance(),
            strategy: AvoidanceStrategy::default(),
            front: default_front_sector(),
            left: default_left_sector(),
            right: default_right_sector(),
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            heading_threshold: default_heading_threshold(),
            tick_secs: default_align_tick(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl AlignmentConfig {
    /// Wait between rotation commands
    pub fn tick(&self) -> NavResult<Duration> {
        seconds("alignment.tick_secs", self.tick_secs)
    }
}

impl TimingConfig {
    /// Wait before the first read
    pub fn settle(&self) -> NavResult<Duration> {
        seconds("timing.settle_secs", self.settle_secs)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cycle: CycleTiming::default(),
            settle_secs: default_settle(),
            max_cycles: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            start_y: 0.0,
            start_heading: 0.0,
            track_width: default_track_width(),
            scan_min: default_scan_min(),
            scan_max: default_scan_max(),
            lidar_range: default_lidar_range(),
            noise_std: 0.0,
            seed: default_seed(),
            step_secs: default_sim_step(),
            obstacles: Vec::new(),
        }
    }
}

// Default value functions
fn default_turn_gain() -> f64 {
    0.5
}
fn default_forward_gain() -> f64 {
    0.1
}
fn default_angular_linear_weight() -> f64 {
    8.0
}
fn default_min_fwd_vel() -> f64 {
    0.4
}
fn default_max_fwd_vel() -> f64 {
    2.0
}
fn default_goal_x() -> f64 {
    20.0
}
fn default_goal_y() -> f64 {
    20.0
}
fn default_goal_tolerance() -> f64 {
    0.5
}
fn default_k() -> f64 {
    185.0
}
fn default_max_range() -> f64 {
    15.0
}
fn default_critical_distance() -> f64 {
    0.9
}
fn default_non_critical_distance() -> f64 {
    1.5
}
fn default_front_sector() -> AngleSector {
    AngleSector::new(-15, 15)
}
fn default_left_sector() -> AngleSector {
    AngleSector::new(-60, -16)
}
fn default_right_sector() -> AngleSector {
    AngleSector::new(16, 59)
}
fn default_heading_threshold() -> f64 {
    0.1
}
fn default_align_tick() -> f64 {
    0.1
}
fn default_max_iterations() -> usize {
    500
}
fn default_settle() -> f64 {
    1.0
}

// Simulation defaults
fn default_track_width() -> f64 {
    1.5
}
fn default_scan_min() -> i32 {
    -90
}
fn default_scan_max() -> i32 {
    90
}
fn default_lidar_range() -> f64 {
    30.0
}
fn default_seed() -> u64 {
    42
}
fn default_sim_step() -> f64 {
    0.02
}

/// Convert a configured number of seconds, rejecting negative, non-finite
/// and out-of-range values.
pub fn seconds(name: &str, secs: f64) -> NavResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        NavError::InvalidParameter(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, secs
        ))
    })
}

impl NavigatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> NavResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> NavResult<Self> {
        let config: NavigatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn goal_point(&self) -> Point2D {
        Point2D::new(self.goal.x, self.goal.y)
    }

    pub fn start_pose(&self) -> Pose2D {
        Pose2D::new(
            self.simulation.start_x,
            self.simulation.start_y,
            self.simulation.start_heading,
        )
    }

    /// Reject values the control law cannot work with
    pub fn validate(&self) -> NavResult<()> {
        let v = &self.velocity;
        if v.min_fwd_vel > v.max_fwd_vel {
            return Err(NavError::InvalidParameter(format!(
                "min_fwd_vel ({}) exceeds max_fwd_vel ({})",
                v.min_fwd_vel, v.max_fwd_vel
            )));
        }

        let positive = [
            ("goal.tolerance", self.goal.tolerance),
            ("field.max_range", self.field.max_range),
            ("obstacles.critical_distance", self.obstacles.critical_distance),
            ("obstacles.non_critical_distance", self.obstacles.non_critical_distance),
            ("alignment.heading_threshold", self.alignment.heading_threshold),
            ("alignment.tick_secs", self.alignment.tick_secs),
            ("simulation.track_width", self.simulation.track_width),
            ("simulation.step_secs", self.simulation.step_secs),
        ];
        for (name, value) in positive.iter() {
            if !(*value > 0.0) {
                return Err(NavError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.simulation.noise_std < 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "simulation.noise_std must not be negative, got {}",
                self.simulation.noise_std
            )));
        }

        self.alignment.tick()?;
        self.timing.settle()?;

        if self.alignment.max_iterations == 0 {
            return Err(NavError::InvalidParameter(
                "alignment.max_iterations must be at least 1".to_string(),
            ));
        }

        for (name, sector) in [
            ("front", self.obstacles.front),
            ("left", self.obstacles.left),
            ("right", self.obstacles.right),
        ]
        .iter()
        {
            if sector.from > sector.to {
                return Err(NavError::InvalidParameter(format!(
                    "{} sector is empty ({}..={})",
                    name, sector.from, sector.to
                )));
            }
        }

        if self.simulation.scan_min > self.simulation.scan_max {
            return Err(NavError::InvalidParameter(format!(
                "simulation scan range is empty ({}..={})",
                self.simulation.scan_min, self.simulation.scan_max
            )));
        }

        self.timing.cycle.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavigatorConfig::default();
        assert!((config.gains.turn_gain - 0.5).abs() < 1e-10);
        assert!((config.gains.angular_linear_weight - 8.0).abs() < 1e-10);
        assert!((config.field.k - 185.0).abs() < 1e-10);
        assert!((config.obstacles.critical_distance - 0.9).abs() < 1e-10);
        assert_eq!(config.obstacles.front, AngleSector::new(-15, 15));
        assert_eq!(config.obstacles.strategy, AvoidanceStrategy::HardOverride);
        assert_eq!(config.goal_point(), Point2D::new(20.0, 20.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = NavigatorConfig::from_toml("").unwrap();
        assert!((config.velocity.max_fwd_vel - 2.0).abs() < 1e-10);
        assert_eq!(config.timing.max_cycles, None);
    }

    #[test]
    fn test_partial_toml() {
        let content = r#"
            [goal]
            x = 23.0
            y = 23.0

            [obstacles]
            strategy = "additive_bias"
            front = { from = -10, to = 10 }

            [timing]
            max_cycles = 300

            [timing.cycle]
            mode = "fixed"
            interval_secs = 0.2

            [[simulation.obstacles]]
            x = 5.0
            y = 5.0
            radius = 1.0
        "#;
        let config = NavigatorConfig::from_toml(content).unwrap();
        assert_eq!(config.goal_point(), Point2D::new(23.0, 23.0));
        assert!((config.goal.tolerance - 0.5).abs() < 1e-10);
        assert_eq!(config.obstacles.strategy, AvoidanceStrategy::AdditiveBias);
        assert_eq!(config.obstacles.front, AngleSector::new(-10, 10));
        assert_eq!(config.obstacles.left, AngleSector::new(-60, -16));
        assert_eq!(config.timing.max_cycles, Some(300));
        assert_eq!(config.timing.cycle, CycleTiming::Fixed { interval_secs: 0.2 });
        assert_eq!(config.simulation.obstacles.len(), 1);
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = NavigatorConfig::from_toml(include_str!("../rover_nav.toml")).unwrap();
        assert_eq!(config.timing.cycle, CycleTiming::default());
        assert_eq!(config.simulation.obstacles.len(), 1);
        assert_eq!(config.start_pose(), Pose2D::origin());
    }

    #[test]
    fn test_rejects_inverted_velocity_band() {
        let content = r#"
            [velocity]
            min_fwd_vel = 3.0
            max_fwd_vel = 2.0
        "#;
        let err = NavigatorConfig::from_toml(content).unwrap_err();
        assert!(matches!(err, NavError::InvalidParameter(_)));
    }

    #[test]
    fn test_rejects_unrepresentable_durations() {
        for content in [
            "[alignment]\ntick_secs = inf",
            "[alignment]\ntick_secs = 1e30",
            "[timing]\nsettle_secs = 1e30",
            "[timing.cycle]\nmode = \"adaptive\"\nquiet_secs = inf",
        ]
        .iter()
        {
            let err = NavigatorConfig::from_toml(content).unwrap_err();
            assert!(matches!(err, NavError::InvalidParameter(_)), "{}", content);
        }
    }

    #[test]
    fn test_seconds_conversion() {
        assert_eq!(seconds("t", 0.25).unwrap(), Duration::from_millis(250));
        assert!(seconds("t", -1.0).is_err());
        assert!(seconds("t", f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_non_positive_tolerance() {
        let mut config = NavigatorConfig::default();
        config.goal.tolerance = 0.0;
        assert!(matches!(config.validate(), Err(NavError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = NavigatorConfig::from_toml("[goal\nx = 1").unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = NavigatorConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }
}
