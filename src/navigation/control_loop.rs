//! Navigation control loop
//!
//! `Aligning -> Traveling -> Done`. Every travel cycle reads a fresh pose and
//! scan, refreshes the obstacle memory, computes the potential field target
//! and sends one wheel command. The rover is always left with a zero command,
//! whichever way the loop exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::common::{NavError, NavResult, ObstacleMemory, Point2D, Pose2D, Rover, WheelCommand};
use crate::config::{seconds, NavigatorConfig};
use crate::navigation::heading_aligner::{AlignmentOutcome, HeadingAligner};
use crate::navigation::motion_controller::{
    ControlDecision, ControlMode, MotionConfig, MotionController,
};
use crate::navigation::obstacle_field::ObstacleField;
use crate::navigation::potential_field::PotentialField;

/// Delay between travel cycles
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CycleTiming {
    /// Same delay every cycle
    Fixed {
        #[serde(default = "default_interval")]
        interval_secs: f64,
    },
    /// Short delay right after an emergency turn, longer once the way has
    /// been clear for `quiet_after_secs`
    Adaptive {
        #[serde(default = "default_interval")]
        initial_secs: f64,
        #[serde(default = "default_obstacle_interval")]
        obstacle_secs: f64,
        #[serde(default = "default_quiet_interval")]
        quiet_secs: f64,
        #[serde(default = "default_quiet_after")]
        quiet_after_secs: f64,
    },
}

fn default_interval() -> f64 {
    1.0
}
fn default_obstacle_interval() -> f64 {
    0.5
}
fn default_quiet_interval() -> f64 {
    1.5
}
fn default_quiet_after() -> f64 {
    5.0
}

impl Default for CycleTiming {
    fn default() -> Self {
        CycleTiming::Adaptive {
            initial_secs: default_interval(),
            obstacle_secs: default_obstacle_interval(),
            quiet_secs: default_quiet_interval(),
            quiet_after_secs: default_quiet_after(),
        }
    }
}

impl CycleTiming {
    pub fn validate(&self) -> NavResult<()> {
        CyclePacer::new(*self).map(|_| ())
    }
}

/// Intervals used only by adaptive pacing
#[derive(Debug, Clone, Copy)]
struct AdaptiveIntervals {
    obstacle: Duration,
    quiet: Duration,
    quiet_after: f64,
}

/// Picks the delay after each travel cycle and keeps mission time
#[derive(Debug, Clone)]
pub struct CyclePacer {
    current: Duration,
    adaptive: Option<AdaptiveIntervals>,
    last_obstacle: f64,
    elapsed: f64,
}

impl CyclePacer {
    /// Fails if any interval is not a usable number of seconds.
    pub fn new(timing: CycleTiming) -> NavResult<Self> {
        let (current, adaptive) = match timing {
            CycleTiming::Fixed { interval_secs } => {
                (seconds("timing.cycle.interval_secs", interval_secs)?, None)
            }
            CycleTiming::Adaptive {
                initial_secs,
                obstacle_secs,
                quiet_secs,
                quiet_after_secs,
            } => (
                seconds("timing.cycle.initial_secs", initial_secs)?,
                Some(AdaptiveIntervals {
                    obstacle: seconds("timing.cycle.obstacle_secs", obstacle_secs)?,
                    quiet: seconds("timing.cycle.quiet_secs", quiet_secs)?,
                    quiet_after: seconds("timing.cycle.quiet_after_secs", quiet_after_secs)?
                        .as_secs_f64(),
                }),
            ),
        };
        Ok(CyclePacer {
            current,
            adaptive,
            last_obstacle: 0.0,
            elapsed: 0.0,
        })
    }

    /// Delay to apply after a cycle that ran in `mode`
    pub fn next_interval(&mut self, mode: ControlMode) -> Duration {
        if let Some(adaptive) = self.adaptive {
            if mode == ControlMode::Emergency {
                self.last_obstacle = self.elapsed;
                self.current = adaptive.obstacle;
            } else if self.elapsed - self.last_obstacle > adaptive.quiet_after {
                self.current = adaptive.quiet;
            }
        }
        self.current
    }

    /// Record time spent waiting
    pub fn advance(&mut self, waited: Duration) {
        self.elapsed += waited.as_secs_f64();
    }

    /// Seconds of mission time so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// Phase of the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Aligning,
    Traveling,
    Done,
}

/// How a mission ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    Reached,
    Cancelled,
}

/// Summary of one run of the control loop
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    pub outcome: MissionOutcome,
    pub alignment_iterations: usize,
    pub cycles: usize,
    pub emergency_cycles: usize,
    /// Seconds spent waiting between travel cycles
    pub mission_time: f64,
    pub final_pose: Pose2D,
}

pub struct ControlLoop {
    goal: Point2D,
    obstacle_field: ObstacleField,
    potential_field: PotentialField,
    aligner: HeadingAligner,
    controller: MotionController,
    pacer: CyclePacer,
    settle: Duration,
    max_cycles: Option<usize>,
    running: Arc<AtomicBool>,
    state: LoopState,
}

impl ControlLoop {
    /// Build the loop from a configuration, rejecting invalid values.
    pub fn new(config: &NavigatorConfig) -> NavResult<Self> {
        config.validate()?;
        let goal = config.goal_point();
        Ok(ControlLoop {
            goal,
            obstacle_field: ObstacleField::new(&config.obstacles, config.gains.turn_gain),
            potential_field: PotentialField::new(goal, &config.field),
            aligner: HeadingAligner::new(&config.alignment, config.gains.turn_gain)?,
            controller: MotionController::new(MotionConfig::new(
                &config.gains,
                &config.velocity,
                config.goal.tolerance,
                config.obstacles.strategy,
            )),
            pacer: CyclePacer::new(config.timing.cycle)?,
            settle: config.timing.settle()?,
            max_cycles: config.timing.max_cycles,
            running: Arc::new(AtomicBool::new(true)),
            state: LoopState::Idle,
        })
    }

    /// Share an externally owned running flag (e.g. set up by a Ctrl-C handler)
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Clearing this flag stops the loop at the next cycle boundary
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn goal(&self) -> Point2D {
        self.goal
    }

    /// Compute one travel cycle from the rover's current pose and scan.
    ///
    /// Refreshes `memory` but does not send anything.
    pub fn step<R: Rover>(&self, rover: &R, memory: &mut ObstacleMemory) -> ControlDecision {
        let pose = rover.pose();
        let scan = rover.laser_scan();

        let assessment = self.obstacle_field.assess(&scan, memory);
        let target = self.potential_field.target(&scan, &pose);
        let decision = self.controller.compute(&pose, &target, memory, &assessment);

        debug!(
            "pose = ({:.2}, {:.2}, {:.1} deg), target = ({:.2}, {:.2}), mode = {:?}, cmd = ({:.2}, {:.2})",
            pose.x,
            pose.y,
            pose.heading,
            target.x,
            target.y,
            decision.mode,
            decision.command.left,
            decision.command.right
        );
        decision
    }

    /// Drive the rover to the goal.
    ///
    /// A zero command is sent on every exit path, including errors.
    pub fn run<R: Rover>(&mut self, rover: &mut R) -> NavResult<MissionReport> {
        let result = self.run_phases(rover);
        rover.send_command(WheelCommand::zero());
        self.transition(LoopState::Done);

        match &result {
            Ok(report) => info!(
                "Mission {:?}: {} cycles ({} emergency), {:.1} s mission time",
                report.outcome, report.cycles, report.emergency_cycles, report.mission_time
            ),
            Err(e) => error!("Mission aborted: {}", e),
        }
        result
    }

    fn run_phases<R: Rover>(&mut self, rover: &mut R) -> NavResult<MissionReport> {
        if self.settle > Duration::from_secs(0) {
            rover.wait(self.settle);
        }

        self.transition(LoopState::Aligning);
        let alignment_iterations = match self.aligner.align(rover, self.goal, &self.running)? {
            AlignmentOutcome::Aligned { iterations } => iterations,
            AlignmentOutcome::Cancelled => {
                info!("Stopped by user during alignment");
                return Ok(MissionReport {
                    outcome: MissionOutcome::Cancelled,
                    alignment_iterations: 0,
                    cycles: 0,
                    emergency_cycles: 0,
                    mission_time: 0.0,
                    final_pose: rover.pose(),
                });
            }
        };

        self.transition(LoopState::Traveling);
        let mut memory = ObstacleMemory::new();
        let mut pacer = self.pacer.clone();
        let mut cycles = 0;
        let mut emergency_cycles = 0;

        let outcome = loop {
            if !self.running.load(Ordering::SeqCst) {
                info!("Stopped by user after {} cycles", cycles);
                break MissionOutcome::Cancelled;
            }
            if let Some(max_cycles) = self.max_cycles {
                if cycles >= max_cycles {
                    return Err(NavError::CycleLimitExceeded { cycles: max_cycles });
                }
            }

            let decision = self.step(rover, &mut memory);
            rover.send_command(decision.command);
            cycles += 1;

            if decision.mode == ControlMode::Emergency {
                emergency_cycles += 1;
                warn!("Obstacle ahead, turning in place");
            }
            if decision.done {
                info!("Goal reached ({:.2} m from target)", decision.distance);
                break MissionOutcome::Reached;
            }

            let interval = pacer.next_interval(decision.mode);
            rover.wait(interval);
            pacer.advance(interval);
        };

        Ok(MissionReport {
            outcome,
            alignment_iterations,
            cycles,
            emergency_cycles,
            mission_time: pacer.elapsed(),
            final_pose: rover.pose(),
        })
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            info!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RangeReading;
    use crate::navigation::motion_controller::AvoidanceStrategy;
    use crate::sim::{CircleObstacle, SimulatedRover, SimulationParams};

    fn fast_config(goal: (f64, f64)) -> NavigatorConfig {
        let mut config = NavigatorConfig::default();
        config.goal.x = goal.0;
        config.goal.y = goal.1;
        config.timing.cycle = CycleTiming::Fixed { interval_secs: 0.2 };
        config.timing.settle_secs = 0.0;
        config.timing.max_cycles = Some(2000);
        config
    }

    /// Rover that never moves and records every command
    struct ScriptedRover {
        pose: Pose2D,
        scan: RangeReading,
        commands: Vec<WheelCommand>,
        waits: Vec<Duration>,
    }

    impl ScriptedRover {
        fn new(pose: Pose2D, scan: RangeReading) -> Self {
            ScriptedRover {
                pose,
                scan,
                commands: Vec::new(),
                waits: Vec::new(),
            }
        }
    }

    impl Rover for ScriptedRover {
        fn pose(&self) -> Pose2D {
            self.pose
        }

        fn laser_scan(&self) -> RangeReading {
            self.scan.clone()
        }

        fn send_command(&mut self, command: WheelCommand) {
            self.commands.push(command);
        }

        fn wait(&mut self, duration: Duration) {
            self.waits.push(duration);
        }
    }

    #[test]
    fn test_step_far_from_goal() {
        let control = ControlLoop::new(&fast_config((23.0, 23.0))).unwrap();
        let rover = ScriptedRover::new(Pose2D::origin(), RangeReading::empty());
        let mut memory = ObstacleMemory::new();
        let decision = control.step(&rover, &mut memory);
        assert!(!decision.done);
        assert!((decision.delta_heading - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
        assert!((decision.distance - 32.5269).abs() < 1e-3);
    }

    #[test]
    fn test_step_near_goal_is_done() {
        let control = ControlLoop::new(&fast_config((23.0, 23.0))).unwrap();
        let rover = ScriptedRover::new(Pose2D::new(22.8, 22.8, 45.0), RangeReading::empty());
        let mut memory = ObstacleMemory::new();
        let decision = control.step(&rover, &mut memory);
        assert!(decision.done);
        assert_eq!(decision.command, WheelCommand::zero());
    }

    #[test]
    fn test_step_critical_front_turns() {
        let control = ControlLoop::new(&fast_config((23.0, 23.0))).unwrap();
        let mut scan = RangeReading::uniform(-90, 90, 15.0);
        scan.set(0, 0.5);
        let rover = ScriptedRover::new(Pose2D::new(0.0, 0.0, 45.0), scan);
        let mut memory = ObstacleMemory::new();
        let decision = control.step(&rover, &mut memory);
        assert_eq!(decision.mode, ControlMode::Emergency);
        assert_eq!(decision.command, WheelCommand::new(-2.0, 2.0));
    }

    #[test]
    fn test_run_already_at_goal() {
        let mut control = ControlLoop::new(&fast_config((1.0, 1.0))).unwrap();
        let mut rover = ScriptedRover::new(Pose2D::new(0.9, 0.9, 45.0), RangeReading::empty());
        let report = control.run(&mut rover).unwrap();
        assert_eq!(report.outcome, MissionOutcome::Reached);
        assert_eq!(report.cycles, 1);
        assert_eq!(report.alignment_iterations, 0);
        assert_eq!(control.state(), LoopState::Done);
        assert_eq!(*rover.commands.last().unwrap(), WheelCommand::zero());
        assert!(rover.waits.is_empty());
    }

    #[test]
    fn test_run_reaches_goal_in_open_field() {
        let mut control = ControlLoop::new(&fast_config((20.0, 20.0))).unwrap();
        let mut rover = SimulatedRover::new(Pose2D::origin(), SimulationParams::default());
        let report = control.run(&mut rover).unwrap();

        assert_eq!(report.outcome, MissionOutcome::Reached);
        assert!(report.alignment_iterations > 0);
        assert_eq!(report.emergency_cycles, 0);
        assert!(report.final_pose.position().distance(&Point2D::new(20.0, 20.0)) < 0.5);
        assert_eq!(*rover.commands().last().unwrap(), WheelCommand::zero());
        assert!(rover.trajectory().total_length() > 25.0);
    }

    fn obstacle_on_route(
        strategy: AvoidanceStrategy,
    ) -> (NavResult<MissionReport>, SimulatedRover) {
        let mut config = fast_config((20.0, 20.0));
        config.obstacles.strategy = strategy;
        let mut control = ControlLoop::new(&config).unwrap();
        assert_eq!(control.goal(), Point2D::new(20.0, 20.0));
        let params = SimulationParams {
            obstacles: vec![CircleObstacle::new(10.0, 10.0, 1.0)],
            ..SimulationParams::default()
        };
        let mut rover = SimulatedRover::new(Pose2D::origin(), params);
        (control.run(&mut rover), rover)
    }

    #[test]
    fn test_hard_override_drives_around_obstacle() {
        let (result, rover) = obstacle_on_route(AvoidanceStrategy::HardOverride);
        let report = result.unwrap();
        assert_eq!(report.outcome, MissionOutcome::Reached);
        assert!(report.emergency_cycles > 0);
        assert!(report.final_pose.position().distance(&Point2D::new(20.0, 20.0)) < 0.5);
        assert!(rover.commands().last().unwrap().is_zero());
    }

    #[test]
    fn test_additive_bias_drives_around_obstacle() {
        let (result, rover) = obstacle_on_route(AvoidanceStrategy::AdditiveBias);
        let report = result.unwrap();
        assert_eq!(report.outcome, MissionOutcome::Reached);
        // No override in this mode, the escape turn goes through the heading error
        assert_eq!(report.emergency_cycles, 0);
        assert!(report.final_pose.position().distance(&Point2D::new(20.0, 20.0)) < 0.5);
        assert!(rover.blocked_steps() < 100);
        assert!(rover.commands().last().unwrap().is_zero());
    }

    #[test]
    fn test_new_rejects_unrepresentable_cycle_interval() {
        let mut config = fast_config((20.0, 20.0));
        config.timing.cycle = CycleTiming::Fixed { interval_secs: f64::INFINITY };
        assert!(matches!(ControlLoop::new(&config), Err(NavError::InvalidParameter(_))));

        config.timing.cycle = CycleTiming::default();
        config.alignment.tick_secs = 1e30;
        assert!(matches!(ControlLoop::new(&config), Err(NavError::InvalidParameter(_))));
    }

    #[test]
    fn test_run_cancelled_sends_zero() {
        let mut control = ControlLoop::new(&fast_config((20.0, 20.0))).unwrap();
        control.running_flag().store(false, Ordering::SeqCst);
        let mut rover = ScriptedRover::new(Pose2D::origin(), RangeReading::empty());
        let report = control.run(&mut rover).unwrap();
        assert_eq!(report.outcome, MissionOutcome::Cancelled);
        assert_eq!(rover.commands, vec![WheelCommand::zero()]);
    }

    #[test]
    fn test_run_alignment_divergence_sends_zero() {
        let mut config = fast_config((0.0, 10.0));
        config.alignment.max_iterations = 5;
        let mut control = ControlLoop::new(&config).unwrap();
        // Pose never updates, so the rotation never takes effect
        let mut rover = ScriptedRover::new(Pose2D::origin(), RangeReading::empty());
        let err = control.run(&mut rover).unwrap_err();
        assert!(matches!(err, NavError::AlignmentDiverged { iterations: 5, .. }));
        assert_eq!(rover.commands.len(), 6);
        assert_eq!(*rover.commands.last().unwrap(), WheelCommand::zero());
        assert_eq!(control.state(), LoopState::Done);
    }

    #[test]
    fn test_run_cycle_limit() {
        let mut config = fast_config((10.0, 0.0));
        config.timing.max_cycles = Some(3);
        let mut control = ControlLoop::new(&config).unwrap();
        let mut rover = ScriptedRover::new(Pose2D::origin(), RangeReading::empty());
        let err = control.run(&mut rover).unwrap_err();
        assert!(matches!(err, NavError::CycleLimitExceeded { cycles: 3 }));
        // zero from alignment, three travel commands, final zero
        assert_eq!(rover.commands.len(), 5);
        assert_eq!(*rover.commands.last().unwrap(), WheelCommand::zero());
        assert_eq!(rover.waits, vec![Duration::from_secs_f64(0.2); 3]);
    }

    #[test]
    fn test_run_blocked_rover_keeps_turning() {
        let mut config = fast_config((10.0, 0.0));
        config.timing.max_cycles = Some(4);
        let mut control = ControlLoop::new(&config).unwrap();
        let mut scan = RangeReading::uniform(-90, 90, 15.0);
        scan.set(0, 0.4);
        let mut rover = ScriptedRover::new(Pose2D::origin(), scan);
        assert!(control.run(&mut rover).is_err());
        let turns = rover
            .commands
            .iter()
            .filter(|c| **c == WheelCommand::new(-2.0, 2.0))
            .count();
        assert_eq!(turns, 4);
    }

    #[test]
    fn test_simulated_obstacle_triggers_emergency() {
        let mut config = fast_config((20.0, 0.0));
        config.timing.max_cycles = Some(5);
        let control = ControlLoop::new(&config).unwrap();
        let params = SimulationParams {
            obstacles: vec![CircleObstacle::new(1.0, 0.0, 0.3)],
            ..SimulationParams::default()
        };
        let rover = SimulatedRover::new(Pose2D::origin(), params);
        let mut memory = ObstacleMemory::new();
        let decision = control.step(&rover, &mut memory);
        assert_eq!(decision.mode, ControlMode::Emergency);
    }

    #[test]
    fn test_adaptive_pacer() {
        let mut pacer = CyclePacer::new(CycleTiming::default()).unwrap();
        assert_eq!(pacer.next_interval(ControlMode::Steering), Duration::from_secs_f64(1.0));
        pacer.advance(Duration::from_secs(1));

        assert_eq!(pacer.next_interval(ControlMode::Emergency), Duration::from_secs_f64(0.5));
        pacer.advance(Duration::from_secs_f64(0.5));

        // Still inside the quiet window, stays short
        assert_eq!(pacer.next_interval(ControlMode::Steering), Duration::from_secs_f64(0.5));
        pacer.advance(Duration::from_secs(6));

        assert_eq!(pacer.next_interval(ControlMode::Steering), Duration::from_secs_f64(1.5));
        assert!((pacer.elapsed() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_pacer_ignores_mode() {
        let mut pacer = CyclePacer::new(CycleTiming::Fixed { interval_secs: 0.2 }).unwrap();
        assert_eq!(pacer.next_interval(ControlMode::Emergency), Duration::from_secs_f64(0.2));
        pacer.advance(Duration::from_secs(10));
        assert_eq!(pacer.next_interval(ControlMode::Steering), Duration::from_secs_f64(0.2));
    }

    #[test]
    fn test_cycle_timing_validation() {
        assert!(CycleTiming::default().validate().is_ok());
        assert!(CycleTiming::Fixed { interval_secs: -1.0 }.validate().is_err());
        assert!(CycleTiming::Fixed { interval_secs: f64::NAN }.validate().is_err());
    }
}
