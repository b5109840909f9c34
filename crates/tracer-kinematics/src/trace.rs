//! Read-only transforms over a recorded trajectory.
//!
//! Nothing in this module holds engine state. Every function takes a pose
//! slice (usually [`KinematicEngine::trajectory`](crate::KinematicEngine::trajectory))
//! and derives something a renderer or an analysis step can use.

use alloc::vec::Vec;
use core::f64::consts::PI;

use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Pose;

/// Vertex offset of the two rear corners of the robot marker.
const MARKER_REAR_ANGLE: f64 = 2.0 * PI / 3.0;

/// An RGBA color with components in `[0, 1]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Rgba {
    /// Construct a color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba { r, g, b, a }
    }
}

/// Linear color ramp from the first pose of a trajectory to the last.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressGradient {
    /// Color at progress `0.0`.
    pub start: Rgba,
    /// Color at progress `1.0`.
    pub end: Rgba,
}

impl Default for ProgressGradient {
    fn default() -> Self {
        ProgressGradient {
            start: Rgba::new(0.55, 0.75, 1.0, 1.0),
            end: Rgba::new(0.0, 0.15, 0.6, 1.0),
        }
    }
}

impl ProgressGradient {
    /// Construct a gradient.
    pub const fn new(start: Rgba, end: Rgba) -> Self {
        ProgressGradient { start, end }
    }

    /// Color at progress `t`, clamped to `[0, 1]`. NaN maps to the start color.
    pub fn color_at(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } as f32;
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        Rgba::new(
            lerp(self.start.r, self.end.r),
            lerp(self.start.g, self.end.g),
            lerp(self.start.b, self.end.b),
            lerp(self.start.a, self.end.a),
        )
    }

    /// One color per pose of a trajectory of `len` poses.
    pub fn colors(&self, len: usize) -> Vec<Rgba> {
        (0..len).map(|i| self.color_at(progress(i, len))).collect()
    }
}

/// Fraction of the way through a trajectory of `len` poses that `index` sits.
///
/// The first pose maps to `0.0` and the last to `1.0`; a single-pose
/// trajectory maps to `1.0`.
pub fn progress(index: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    (index.min(len - 1)) as f64 / (len - 1) as f64
}

/// Positions of every pose, in order, as `[x, y]` points.
pub fn polyline(poses: &[Pose]) -> Vec<[f64; 2]> {
    poses.iter().map(|p| [p.x, p.y]).collect()
}

/// Triangle marker for a pose: the nose points along the heading and the two
/// rear corners sit at `θ ± 2π/3`, all `size` meters from the position.
pub fn marker_triangle(pose: &Pose, size: f64) -> [[f64; 2]; 3] {
    let vertex = |angle: f64| [pose.x + size * cos(angle), pose.y + size * sin(angle)];
    [
        vertex(pose.theta),
        vertex(pose.theta + MARKER_REAR_ANGLE),
        vertex(pose.theta - MARKER_REAR_ANGLE),
    ]
}

/// Summary figures for a recorded trajectory.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrajectoryStats {
    /// Number of integration steps (poses minus one).
    pub steps: usize,
    /// Sum of the straight-line distances between consecutive poses (m).
    pub path_length: f64,
    /// Distance from the first position to the last (m).
    pub net_displacement: f64,
    /// Signed heading change from the first pose to the last (rad), unwrapped.
    pub total_rotation: f64,
}

impl TrajectoryStats {
    /// Compute statistics over `poses`. An empty slice yields all zeros.
    pub fn from_poses(poses: &[Pose]) -> Self {
        let (Some(first), Some(last)) = (poses.first(), poses.last()) else {
            return TrajectoryStats::default();
        };

        let path_length = poses.windows(2).map(|w| w[0].distance_to(&w[1])).sum();

        TrajectoryStats {
            steps: poses.len() - 1,
            path_length,
            net_displacement: first.distance_to(last),
            total_rotation: last.theta - first.theta,
        }
    }

    /// Bring statistics computed over `poses[..previous_len]` up to date with
    /// the whole of `poses`, visiting only the poses appended since.
    ///
    /// Falls back to [`TrajectoryStats::from_poses`] when `previous_len` is zero
    /// or larger than `poses`, i.e. when the history was replaced.
    pub fn extend(&mut self, poses: &[Pose], previous_len: usize) {
        if previous_len == 0 || previous_len > poses.len() {
            *self = TrajectoryStats::from_poses(poses);
            return;
        }
        let first = poses[0];
        let last = poses[poses.len() - 1];
        self.path_length += poses[previous_len - 1..]
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum::<f64>();
        self.steps = poses.len() - 1;
        self.net_displacement = first.distance_to(&last);
        self.total_rotation = last.theta - first.theta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KinematicEngine, TurnDirection};
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_progress_endpoints() {
        assert_eq!(progress(0, 5), 0.0);
        assert_eq!(progress(4, 5), 1.0);
        assert_eq!(progress(2, 5), 0.5);
        assert_eq!(progress(0, 1), 1.0);
        assert_eq!(progress(9, 5), 1.0);
    }

    #[test]
    fn test_gradient_interpolates_and_clamps() {
        let gradient = ProgressGradient::new(
            Rgba::new(0.0, 0.0, 0.0, 1.0),
            Rgba::new(1.0, 0.5, 0.0, 1.0),
        );
        let mid = gradient.color_at(0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.g - 0.25).abs() < 1e-6);
        assert_eq!(gradient.color_at(-3.0), gradient.start);
        assert_eq!(gradient.color_at(7.0), gradient.end);
        assert_eq!(gradient.color_at(f64::NAN), gradient.start);

        let colors = gradient.colors(3);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], gradient.start);
        assert_eq!(colors[2], gradient.end);
    }

    #[test]
    fn test_polyline_follows_trajectory() {
        let mut engine = KinematicEngine::new(0.5, 0.1).unwrap();
        engine.synthesize_straight_line(0.3, 1.0).unwrap();
        let points = polyline(engine.trajectory());
        assert_eq!(points.len(), engine.len());
        assert_eq!(points[0], [0.0, 0.0]);
        assert!((points[3][0] - 0.3).abs() < EPSILON);
    }

    #[test]
    fn test_marker_triangle_nose_points_along_heading() {
        let pose = Pose::new(1.0, 2.0, PI / 2.0);
        let [nose, left_rear, right_rear] = marker_triangle(&pose, 0.5);
        assert!((nose[0] - 1.0).abs() < EPSILON);
        assert!((nose[1] - 2.5).abs() < EPSILON);
        // rear corners are mirror images across the heading axis
        assert!((left_rear[1] - right_rear[1]).abs() < EPSILON);
        assert!((left_rear[0] + right_rear[0] - 2.0).abs() < EPSILON);
        assert!(left_rear[1] < 2.0);
    }

    #[test]
    fn test_stats_for_closed_circle() {
        let mut engine = KinematicEngine::new(0.5, 0.1).unwrap();
        engine
            .synthesize_circular_arc(5.0, 1.0, TurnDirection::Left, 1.0)
            .unwrap();
        let stats = TrajectoryStats::from_poses(engine.trajectory());
        assert_eq!(stats.steps, 314);
        // 314 steps of 0.1 m each
        assert!((stats.path_length - 31.4).abs() < 1e-6);
        assert!(stats.net_displacement < 0.05);
        assert!((stats.total_rotation - 6.28).abs() < 1e-6);
    }

    #[test]
    fn test_stats_extend_matches_full_recompute() {
        let mut engine = KinematicEngine::new(0.5, 0.1).unwrap();
        engine.synthesize_straight_line(1.0, 1.0).unwrap();
        let mut stats = TrajectoryStats::from_poses(engine.trajectory());
        let previous_len = engine.len();

        engine
            .synthesize_circular_arc(1.0, 0.5, TurnDirection::Right, 0.25)
            .unwrap();
        stats.extend(engine.trajectory(), previous_len);
        let full = TrajectoryStats::from_poses(engine.trajectory());
        assert_eq!(stats.steps, full.steps);
        assert!((stats.path_length - full.path_length).abs() < EPSILON);
        assert!((stats.net_displacement - full.net_displacement).abs() < EPSILON);
        assert!((stats.total_rotation - full.total_rotation).abs() < EPSILON);
    }

    #[test]
    fn test_stats_extend_after_reset_recomputes() {
        let mut engine = KinematicEngine::new(0.5, 0.1).unwrap();
        engine.synthesize_straight_line(2.0, 1.0).unwrap();
        let mut stats = TrajectoryStats::from_poses(engine.trajectory());
        let previous_len = engine.len();

        engine.reset();
        engine.step(1.0, 1.0);
        stats.extend(engine.trajectory(), previous_len);
        assert_eq!(stats, TrajectoryStats::from_poses(engine.trajectory()));
        assert_eq!(stats.steps, 1);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(TrajectoryStats::from_poses(&[]), TrajectoryStats::default());
    }
}
