#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` trajectory engine for 2D differential-drive robots."]
#![doc = ""]
#![doc = "This crate integrates robot pose from wheel-velocity samples using midpoint"]
#![doc = "integration, synthesizes straight-line and circular-arc velocity profiles,"]
#![doc = "and provides read-only transforms over the recorded trajectory."]

extern crate alloc;

use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod engine;
pub mod error;
pub mod profile;
pub mod trace;

pub use engine::KinematicEngine;
pub use error::KinematicsError;
pub use profile::{VelocityProfile, circular_arc_profile, straight_line_profile};

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the world frame).
///
/// The heading is never wrapped by the engine; a robot that completes two
/// left turns reports `θ ≈ 4π`. Use [`Pose::wrapped_heading`] when a bounded
/// angle is needed.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (rad), unbounded.
    pub theta: f64,
}

impl Pose {
    /// The origin pose every trajectory starts from.
    pub const ORIGIN: Pose = Pose::new(0.0, 0.0, 0.0);

    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    /// * `theta`: Heading in radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Normalize an angle to be within `[-PI, PI)`.
    ///
    /// Angles at `PI` will be normalized to `-PI`.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle in radians to normalize.
    ///
    /// # Returns
    ///
    /// The normalized angle in radians.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % (2.0 * PI);
        if a >= PI {
            a - 2.0 * PI
        } else if a < -PI {
            a + 2.0 * PI
        } else {
            a
        }
    }

    /// Heading wrapped to `[-PI, PI)`.
    pub fn wrapped_heading(&self) -> f64 {
        Pose::normalize_angle(self.theta)
    }

    /// Euclidean distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        libm::hypot(other.x - self.x, other.y - self.y)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// Right and left wheel ground velocities held for one time step.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelVelocityPair {
    /// Right wheel velocity (m/s). Negative drives the wheel in reverse.
    pub v_right: f64,
    /// Left wheel velocity (m/s). Negative drives the wheel in reverse.
    pub v_left: f64,
}

impl WheelVelocityPair {
    /// Construct a wheel-velocity pair.
    ///
    /// # Arguments
    ///
    /// * `v_right`: Right wheel velocity (m/s).
    /// * `v_left`: Left wheel velocity (m/s).
    pub const fn new(v_right: f64, v_left: f64) -> Self {
        WheelVelocityPair { v_right, v_left }
    }
}

impl fmt::Display for WheelVelocityPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(vR: {:.2} m/s, vL: {:.2} m/s)", self.v_right, self.v_left)
    }
}

/// Linear and angular chassis velocities.
/// These represent the overall motion of the robot's chassis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Linear speed of the chassis center (m/s).
    pub v: f64,
    /// Angular speed of the chassis (rad/s).
    pub omega: f64,
}

impl ChassisSpeeds {
    /// Construct chassis speeds.
    ///
    /// # Arguments
    ///
    /// * `v`: Linear speed of the chassis center (m/s).
    /// * `omega`: Angular speed of the chassis (rad/s).
    pub const fn new(v: f64, omega: f64) -> Self {
        ChassisSpeeds { v, omega }
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.2} m/s, ω: {:.2} rad/s)", self.v, self.omega)
    }
}

/// Which way a circular arc bends, seen from above with the robot driving forward.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    /// Counter-clockwise; the left wheel is the inner, slower wheel.
    #[cfg_attr(feature = "serde", serde(alias = "Left", alias = "LEFT"))]
    Left,
    /// Clockwise; the right wheel is the inner, slower wheel.
    #[cfg_attr(feature = "serde", serde(alias = "Right", alias = "RIGHT"))]
    Right,
}

impl FromStr for TurnDirection {
    type Err = KinematicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("left") {
            Ok(TurnDirection::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(TurnDirection::Right)
        } else {
            Err(KinematicsError::InvalidArcParameters(
                "direction must be \"left\" or \"right\"",
            ))
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => f.write_str("left"),
            TurnDirection::Right => f.write_str("right"),
        }
    }
}

/// Immutable robot geometry and integration interval.
///
/// Owns the per-step kinematic model: [`RobotGeometry::advance`] is the only
/// place poses are integrated.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotGeometry {
    /// Distance between the wheel contact points (m).
    wheel_separation: f64,
    /// Integration interval (s).
    time_step: f64,
}

impl RobotGeometry {
    /// Construct a validated geometry.
    ///
    /// # Arguments
    ///
    /// * `wheel_separation`: Distance between the wheel contact points in meters.
    /// * `time_step`: Integration interval in seconds.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidGeometry)` if either value is not finite or not
    /// strictly positive.
    pub fn new(wheel_separation: f64, time_step: f64) -> Result<Self, KinematicsError> {
        if !wheel_separation.is_finite() || wheel_separation <= 0.0 {
            return Err(KinematicsError::InvalidGeometry(
                "wheel separation must be finite and positive",
            ));
        }
        if !time_step.is_finite() || time_step <= 0.0 {
            return Err(KinematicsError::InvalidGeometry(
                "time step must be finite and positive",
            ));
        }
        Ok(RobotGeometry {
            wheel_separation,
            time_step,
        })
    }

    /// Returns the wheel separation.
    pub fn wheel_separation(&self) -> f64 {
        self.wheel_separation
    }

    /// Returns the time step.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Chassis speeds implied by a wheel-velocity pair under the engine's model.
    ///
    /// `v = (vR + vL) / 2`, `ω = (vR - vL) / (2L)`.
    pub fn forward_kinematics(&self, wheels: WheelVelocityPair) -> ChassisSpeeds {
        let v = (wheels.v_right + wheels.v_left) / 2.0;
        let omega = (wheels.v_right - wheels.v_left) / (2.0 * self.wheel_separation);
        ChassisSpeeds::new(v, omega)
    }

    /// Wheel velocities that produce the given chassis speeds.
    /// Exact inverse of [`RobotGeometry::forward_kinematics`].
    pub fn inverse_kinematics(&self, chassis: ChassisSpeeds) -> WheelVelocityPair {
        let half_difference = chassis.omega * self.wheel_separation;
        WheelVelocityPair::new(chassis.v + half_difference, chassis.v - half_difference)
    }

    /// Integrates one time step from `pose` with the wheels held at `wheels`.
    ///
    /// The displacement is applied along the midpoint heading `θ + Δθ/2`,
    /// which follows the arc driven during the step far more closely than the
    /// heading at either end. The heading is left unwrapped. Non-finite inputs
    /// propagate into the result.
    pub fn advance(&self, pose: Pose, wheels: WheelVelocityPair) -> Pose {
        let dt = self.time_step;
        let delta_s = (wheels.v_right + wheels.v_left) / 2.0 * dt;
        let delta_theta = (wheels.v_right - wheels.v_left) / (2.0 * self.wheel_separation) * dt;
        let heading = pose.theta + delta_theta / 2.0;

        Pose {
            x: pose.x + delta_s * cos(heading),
            y: pose.y + delta_s * sin(heading),
            theta: pose.theta + delta_theta,
        }
    }
}

impl fmt::Display for RobotGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RobotGeometry (L: {:.2} m, dt: {:.3} s)",
            self.wheel_separation, self.time_step
        )
    }
}
