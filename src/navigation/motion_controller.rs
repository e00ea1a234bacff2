//! Per-cycle differential drive control law
//!
//! Heading error and distance to the aiming vector are turned into a
//! (left, right) wheel pair. The forward component shrinks as the heading
//! error grows, so the rover slows sharply while turning, and is clamped to
//! the configured velocity band.

use std::f64::consts::FRAC_PI_4;

use nalgebra::Vector2;
use serde::Deserialize;

use crate::common::{ObstacleMemory, Pose2D, WheelCommand};
use crate::config::{GainConfig, VelocityConfig};
use crate::navigation::obstacle_field::ObstacleAssessment;
use crate::utils::heading_delta;

/// How obstacle signals enter the control law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvoidanceStrategy {
    /// A critical front obstacle replaces steering with a sharp turn for the
    /// cycle; otherwise obstacle memory biases the heading by pi/4 per side.
    HardOverride,
    /// No override; the soft heading bias is added to the heading error, and
    /// a critical front obstacle adds a full-rate turn toward the more open
    /// flank.
    AdditiveBias,
}

impl Default for AvoidanceStrategy {
    fn default() -> Self {
        AvoidanceStrategy::HardOverride
    }
}

/// Which branch of the control law produced the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Emergency,
    Steering,
    Arrived,
}

/// Output of one control step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlDecision {
    pub command: WheelCommand,
    pub done: bool,
    pub mode: ControlMode,
    /// Heading error after obstacle bias (radians), zero for emergency turns
    pub delta_heading: f64,
    /// Length of the aiming vector
    pub distance: f64,
}

/// Configuration for the motion controller
#[derive(Debug, Clone)]
pub struct MotionConfig {
    pub turn_gain: f64,
    pub forward_gain: f64,
    pub angular_linear_weight: f64,
    pub min_fwd_vel: f64,
    pub max_fwd_vel: f64,
    /// Arrival radius (meters)
    pub goal_tolerance: f64,
    pub strategy: AvoidanceStrategy,
}

impl MotionConfig {
    pub fn new(
        gains: &GainConfig,
        velocity: &VelocityConfig,
        goal_tolerance: f64,
        strategy: AvoidanceStrategy,
    ) -> Self {
        Self {
            turn_gain: gains.turn_gain,
            forward_gain: gains.forward_gain,
            angular_linear_weight: gains.angular_linear_weight,
            min_fwd_vel: velocity.min_fwd_vel,
            max_fwd_vel: velocity.max_fwd_vel,
            goal_tolerance,
            strategy,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::new(
            &GainConfig::default(),
            &VelocityConfig::default(),
            0.5,
            AvoidanceStrategy::default(),
        )
    }
}

pub struct MotionController {
    config: MotionConfig,
}

impl MotionController {
    pub fn new(config: MotionConfig) -> Self {
        MotionController { config }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Compute the wheel command for one cycle.
    ///
    /// `target` is the aiming vector relative to the rover position.
    pub fn compute(
        &self,
        pose: &Pose2D,
        target: &Vector2<f64>,
        memory: &ObstacleMemory,
        assessment: &ObstacleAssessment,
    ) -> ControlDecision {
        let distance = target.norm();

        if self.config.strategy == AvoidanceStrategy::HardOverride && assessment.critical_front {
            return ControlDecision {
                command: self.emergency_turn(),
                done: false,
                mode: ControlMode::Emergency,
                delta_heading: 0.0,
                distance,
            };
        }

        let mut delta = heading_delta(target.y.atan2(target.x), pose.heading_rad());
        match self.config.strategy {
            AvoidanceStrategy::HardOverride => {
                if memory.left {
                    delta -= FRAC_PI_4;
                }
                if memory.right {
                    delta += FRAC_PI_4;
                }
            }
            AvoidanceStrategy::AdditiveBias => {
                delta += assessment.heading_bias;
                if assessment.critical_front {
                    delta += assessment.escape_sign() * self.escape_term();
                }
            }
        }

        // Linear comparison against the arrival radius
        if distance < self.config.goal_tolerance {
            return ControlDecision {
                command: WheelCommand::zero(),
                done: true,
                mode: ControlMode::Arrived,
                delta_heading: delta,
                distance,
            };
        }

        let turn = delta * self.config.turn_gain;
        let fwd = self.forward_speed(distance, delta);
        ControlDecision {
            command: WheelCommand::new(fwd - turn, fwd + turn),
            done: false,
            mode: ControlMode::Steering,
            delta_heading: delta,
            distance,
        }
    }

    /// Forward component, clamped to `[min_fwd_vel, max_fwd_vel]`
    pub fn forward_speed(&self, distance: f64, delta: f64) -> f64 {
        let raw = distance * self.config.forward_gain
            - self.config.angular_linear_weight * delta.abs();
        raw.max(self.config.min_fwd_vel).min(self.config.max_fwd_vel)
    }

    /// Heading offset whose turn component matches the emergency spin rate
    fn escape_term(&self) -> f64 {
        self.config.max_fwd_vel / self.config.turn_gain
    }

    /// Spin in place counter-clockwise at full speed
    pub fn emergency_turn(&self) -> WheelCommand {
        WheelCommand::rotate(self.config.max_fwd_vel)
    }
}
