//! Reactive potential field target
//!
//! Each control cycle the goal attraction is combined with a contribution
//! from every LiDAR return closer than `max_range`, giving a transient aiming
//! vector for the motion controller.

use nalgebra::Vector2;

use crate::common::{Point2D, Pose2D, RangeReading};
use crate::config::FieldConfig;

pub struct PotentialField {
    goal: Point2D,
    k: f64,
    max_range: f64,
}

impl PotentialField {
    pub fn new(goal: Point2D, config: &FieldConfig) -> Self {
        PotentialField {
            goal,
            k: config.k,
            max_range: config.max_range,
        }
    }

    pub fn goal(&self) -> Point2D {
        self.goal
    }

    /// Aiming vector relative to the rover's current position.
    ///
    /// With no usable readings this is exactly `goal - position`.
    pub fn target(&self, scan: &RangeReading, pose: &Pose2D) -> Vector2<f64> {
        let attraction = self.goal.to_vector() - pose.position().to_vector();
        attraction + self.repulsion(scan, pose)
    }

    /// Sum of obstacle contributions.
    ///
    /// Obstacle bearings are taken in the sensor frame and rotated by the
    /// heading, while the attraction is world aligned.
    pub fn repulsion(&self, scan: &RangeReading, pose: &Pose2D) -> Vector2<f64> {
        let heading = pose.heading_rad();
        self.obstacle_offsets(scan)
            .map(|(ox, oy)| {
                let magnitude = self.k / (ox.powi(2) + oy.powi(2));
                let direction = oy.atan2(ox) - heading;
                Vector2::new(magnitude * direction.cos(), magnitude * direction.sin())
            })
            .fold(Vector2::zeros(), |acc, v| acc + v)
    }

    /// Body-frame `(ox, oy)` offsets of every reading inside `max_range`
    pub fn obstacle_offsets<'a>(
        &self,
        scan: &'a RangeReading,
    ) -> impl Iterator<Item = (f64, f64)> + 'a {
        let max_range = self.max_range;
        scan.valid()
            .filter(move |&(_, d)| d < max_range)
            .map(|(angle, d)| {
                let theta = angle as f64 * std::f64::consts::PI / 180.0;
                (d * theta.sin(), d * theta.cos())
            })
    }
}
