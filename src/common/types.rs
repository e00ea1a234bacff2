//! Common types used throughout rover_navigation

use itertools::Itertools;
use nalgebra::Vector2;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D rover pose as reported by the driver.
///
/// `heading` is in degrees, counter-clockwise from the world +x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, heading: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn heading_rad(&self) -> f64 {
        self.heading.to_radians()
    }
}

/// Differential drive command: left and right wheel speeds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelCommand {
    pub left: f64,
    pub right: f64,
}

impl WheelCommand {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Pure rotation; positive `rate` turns counter-clockwise.
    pub fn rotate(rate: f64) -> Self {
        Self { left: -rate, right: rate }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// One LiDAR sweep indexed by integer angle in degrees.
///
/// `ranges[i]` holds the distance measured at `angle_min + i`. Angle 0 points
/// forward, negative angles sweep the left side and positive angles the right
/// side. A distance that is zero, negative or not finite is "no reading".
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReading {
    angle_min: i32,
    ranges: Vec<f64>,
}

impl RangeReading {
    pub fn new(angle_min: i32, ranges: Vec<f64>) -> Self {
        Self { angle_min, ranges }
    }

    /// A scan with no beams at all
    pub fn empty() -> Self {
        Self { angle_min: 0, ranges: Vec::new() }
    }

    /// Same distance on every angle of `angle_min..=angle_max`
    pub fn uniform(angle_min: i32, angle_max: i32, distance: f64) -> Self {
        Self::from_fn(angle_min, angle_max, |_| distance)
    }

    pub fn from_fn<F>(angle_min: i32, angle_max: i32, f: F) -> Self
    where
        F: Fn(i32) -> f64,
    {
        let ranges = (angle_min..=angle_max).map(f).collect();
        Self { angle_min, ranges }
    }

    pub fn angle_min(&self) -> i32 {
        self.angle_min
    }

    pub fn angle_max(&self) -> i32 {
        self.angle_min + self.ranges.len() as i32 - 1
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Raw distances, invalid entries included
    pub fn raw(&self) -> &[f64] {
        &self.ranges
    }

    /// Overwrite the distance at `angle`; ignored outside the scan domain.
    pub fn set(&mut self, angle: i32, distance: f64) {
        if let Some(slot) = self.index_of(angle).and_then(|i| self.ranges.get_mut(i)) {
            *slot = distance;
        }
    }

    /// Valid distance at `angle`, if any
    pub fn get(&self, angle: i32) -> Option<f64> {
        self.index_of(angle)
            .and_then(|i| self.ranges.get(i).copied())
            .filter(|&d| Self::is_valid(d))
    }

    /// Iterate `(angle, distance)` over valid readings only
    pub fn valid(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        let angle_min = self.angle_min;
        self.ranges
            .iter()
            .enumerate()
            .map(move |(i, &d)| (angle_min + i as i32, d))
            .filter(|&(_, d)| Self::is_valid(d))
    }

    /// Valid readings whose angle lies in `sector`
    pub fn in_sector(&self, sector: AngleSector) -> impl Iterator<Item = f64> + '_ {
        self.valid()
            .filter(move |&(angle, _)| sector.contains(angle))
            .map(|(_, d)| d)
    }

    fn index_of(&self, angle: i32) -> Option<usize> {
        let offset = angle - self.angle_min;
        if offset < 0 {
            None
        } else {
            Some(offset as usize)
        }
    }

    fn is_valid(distance: f64) -> bool {
        distance.is_finite() && distance > 0.0
    }
}

impl Default for RangeReading {
    fn default() -> Self {
        Self::empty()
    }
}

/// Inclusive range of scan angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct AngleSector {
    pub from: i32,
    pub to: i32,
}

impl AngleSector {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, angle: i32) -> bool {
        angle >= self.from && angle <= self.to
    }
}

/// Which flanks had an obstacle inside the critical distance on the latest scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObstacleMemory {
    pub left: bool,
    pub right: bool,
}

impl ObstacleMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn total_length(&self) -> f64 {
        self.points
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.distance(b))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}
