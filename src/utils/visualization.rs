//! Visualization utilities for rover_navigation
//!
//! Plots a mission (trajectory, obstacles, start, goal) using gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{NavError, NavResult, Path2D, Point2D, Pose2D};
use crate::sim::CircleObstacle;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const TRAJECTORY: &str = RED;
    pub const ROVER: &str = CYAN;
    pub const TOLERANCE: &str = GRAY;
}

const CIRCLE_SEGMENTS: usize = 36;

/// Everything needed to draw one mission
#[derive(Debug, Clone)]
pub struct MissionPlot {
    title: String,
    trajectory: Path2D,
    obstacles: Vec<CircleObstacle>,
    start: Option<Point2D>,
    goal: Option<(Point2D, f64)>,
    rover: Option<Pose2D>,
}

impl MissionPlot {
    pub fn new(title: &str) -> Self {
        MissionPlot {
            title: title.to_string(),
            trajectory: Path2D::new(),
            obstacles: Vec::new(),
            start: None,
            goal: None,
            rover: None,
        }
    }

    pub fn trajectory(mut self, path: &Path2D) -> Self {
        self.trajectory = path.clone();
        self
    }

    pub fn obstacles(mut self, obstacles: &[CircleObstacle]) -> Self {
        self.obstacles = obstacles.to_vec();
        self
    }

    pub fn start(mut self, start: Point2D) -> Self {
        self.start = Some(start);
        self
    }

    /// Goal with its arrival radius
    pub fn goal(mut self, goal: Point2D, tolerance: f64) -> Self {
        self.goal = Some((goal, tolerance));
        self
    }

    /// Final rover pose, drawn with a heading tick
    pub fn rover(mut self, pose: Pose2D) -> Self {
        self.rover = Some(pose);
        self
    }

    /// Build the gnuplot figure
    pub fn render(&self) -> Figure {
        let mut fg = Figure::new();
        {
            let axes = fg.axes2d();

            for (i, o) in self.obstacles.iter().enumerate() {
                let (x, y) = circle_outline(o.x, o.y, o.radius);
                let caption = if i == 0 { "Obstacles" } else { "" };
                axes.lines(&x, &y, &[Caption(caption), Color(colors::OBSTACLE), LineWidth(2.0)]);
            }

            if !self.trajectory.is_empty() {
                axes.lines(
                    &self.trajectory.x_coords(),
                    &self.trajectory.y_coords(),
                    &[Caption("Trajectory"), Color(colors::TRAJECTORY), LineWidth(2.0)],
                );
            }

            if let Some(s) = self.start {
                let style = [Caption("Start"), Color(colors::START), PointSymbol('O'), PointSize(1.5)];
                axes.points(&[s.x], &[s.y], &style);
            }

            if let Some((g, tolerance)) = self.goal {
                let style = [Caption("Goal"), Color(colors::GOAL), PointSymbol('O'), PointSize(1.5)];
                axes.points(&[g.x], &[g.y], &style);
                let (x, y) = circle_outline(g.x, g.y, tolerance);
                axes.lines(&x, &y, &[Color(colors::TOLERANCE)]);
            }

            if let Some(pose) = self.rover {
                let (x, y) = heading_tick(&pose, 0.8);
                let style = [Caption("Rover"), Color(colors::ROVER), PointSymbol('O')];
                axes.points(&[pose.x], &[pose.y], &style);
                axes.lines(&x, &y, &[Color(colors::ROVER), LineWidth(2.0)]);
            }

            axes.set_title(&self.title, &[])
                .set_x_label("X [m]", &[])
                .set_y_label("Y [m]", &[])
                .set_aspect_ratio(AutoOption::Fix(1.0));
        }
        fg
    }

    /// Save plot to PNG file
    pub fn save_png(&self, path: &str, width: u32, height: u32) -> NavResult<()> {
        self.render()
            .save_to_png(path, width, height)
            .map_err(|e| NavError::Visualization(e.to_string()))
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> NavResult<()> {
        self.render()
            .save_to_svg(path, 800, 600)
            .map_err(|e| NavError::Visualization(e.to_string()))
    }
}

/// Closed polygon approximating a circle
pub fn circle_outline(cx: f64, cy: f64, radius: f64) -> (Vec<f64>, Vec<f64>) {
    (0..=CIRCLE_SEGMENTS)
        .map(|i| {
            let a = 2.0 * std::f64::consts::PI * i as f64 / CIRCLE_SEGMENTS as f64;
            (cx + radius * a.cos(), cy + radius * a.sin())
        })
        .unzip()
}

fn heading_tick(pose: &Pose2D, length: f64) -> (Vec<f64>, Vec<f64>) {
    let yaw = pose.heading_rad();
    (
        vec![pose.x, pose.x + length * yaw.cos()],
        vec![pose.y, pose.y + length * yaw.sin()],
    )
}
