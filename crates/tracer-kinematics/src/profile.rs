//! Wheel-velocity profile synthesis for straight segments and circular arcs.
//!
//! A profile is a single [`WheelVelocityPair`] held for a whole number of time
//! steps. Synthesis is pure: nothing here touches a trajectory, so the engine
//! can validate a request completely before it records anything.

use core::f64::consts::TAU;
use core::iter::{Repeat, Take, repeat};

use libm::{fabs, round};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{KinematicsError, RobotGeometry, TurnDirection, WheelVelocityPair};

/// A piecewise-constant velocity profile: one wheel pair held for `steps` steps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityProfile {
    pair: WheelVelocityPair,
    steps: usize,
}

impl VelocityProfile {
    /// Hold `pair` for `steps` time steps.
    pub const fn hold(pair: WheelVelocityPair, steps: usize) -> Self {
        VelocityProfile { pair, steps }
    }

    /// The wheel pair applied at every step.
    pub fn pair(&self) -> WheelVelocityPair {
        self.pair
    }

    /// Number of time steps the pair is held for.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether the profile holds for zero steps.
    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    /// Wall-clock duration of the profile for a given time step.
    pub fn duration(&self, time_step: f64) -> f64 {
        self.steps as f64 * time_step
    }

    /// Iterate the profile one sample per time step.
    pub fn samples(&self) -> Take<Repeat<WheelVelocityPair>> {
        repeat(self.pair).take(self.steps)
    }
}

impl IntoIterator for VelocityProfile {
    type Item = WheelVelocityPair;
    type IntoIter = Take<Repeat<WheelVelocityPair>>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples()
    }
}

/// Converts a real-valued step count to a whole number of steps.
///
/// Rounds to nearest; the float-to-int cast saturates, and the engine rejects
/// counts it cannot store.
fn whole_steps(exact: f64) -> usize {
    round(exact) as usize
}

/// Profile that drives both wheels at `speed` until `distance` is covered.
///
/// The step count is `round(distance / |speed| / dt)`; a negative speed drives
/// the same distance in reverse.
///
/// # Errors
///
/// Returns `Err(KinematicsError::InvalidSegmentParameters)` if `speed` is zero,
/// `distance` is negative, or either value is not finite.
pub fn straight_line_profile(
    geometry: &RobotGeometry,
    distance: f64,
    speed: f64,
) -> Result<VelocityProfile, KinematicsError> {
    if !distance.is_finite() || !speed.is_finite() {
        return Err(KinematicsError::InvalidSegmentParameters(
            "distance and speed must be finite",
        ));
    }
    if speed == 0.0 {
        return Err(KinematicsError::InvalidSegmentParameters(
            "speed must be non-zero",
        ));
    }
    if distance < 0.0 {
        return Err(KinematicsError::InvalidSegmentParameters(
            "distance must be non-negative",
        ));
    }

    let steps = whole_steps(distance / fabs(speed) / geometry.time_step());
    Ok(VelocityProfile::hold(WheelVelocityPair::new(speed, speed), steps))
}

/// Profile that drives the robot around a circle of `radius` for `turns` turns.
///
/// The chassis turns at `ω = linear_velocity / radius`. The outer wheel runs at
/// `linear_velocity * (radius + L) / radius` and the inner wheel at
/// `linear_velocity * (radius - L) / radius`, which is the pair the engine's
/// step model (`Δθ = (vR - vL) / (2L) * dt`) maps back to exactly that `ω`.
/// `direction` picks the inner wheel: the left wheel for a left turn, the
/// right wheel for a right turn. The pair is held for
/// `round(turns * 2π / |ω| / dt)` steps.
///
/// # Errors
///
/// Returns `Err(KinematicsError::InvalidArcParameters)` if `radius` is not
/// positive, `linear_velocity` is zero, `turns` is not positive, or any of them
/// is not finite.
pub fn circular_arc_profile(
    geometry: &RobotGeometry,
    radius: f64,
    linear_velocity: f64,
    direction: TurnDirection,
    turns: f64,
) -> Result<VelocityProfile, KinematicsError> {
    if !radius.is_finite() || !linear_velocity.is_finite() || !turns.is_finite() {
        return Err(KinematicsError::InvalidArcParameters(
            "radius, linear velocity and turns must be finite",
        ));
    }
    if radius <= 0.0 {
        return Err(KinematicsError::InvalidArcParameters(
            "radius must be positive",
        ));
    }
    if linear_velocity == 0.0 {
        return Err(KinematicsError::InvalidArcParameters(
            "linear velocity must be non-zero",
        ));
    }
    if turns <= 0.0 {
        return Err(KinematicsError::InvalidArcParameters(
            "turns must be positive",
        ));
    }

    let l = geometry.wheel_separation();
    let omega = linear_velocity / radius;
    let v_outer = linear_velocity * (radius + l) / radius;
    let v_inner = linear_velocity * (radius - l) / radius;

    let pair = match direction {
        TurnDirection::Left => WheelVelocityPair::new(v_outer, v_inner),
        TurnDirection::Right => WheelVelocityPair::new(v_inner, v_outer),
    };
    let steps = whole_steps(turns * TAU / fabs(omega) / geometry.time_step());

    Ok(VelocityProfile::hold(pair, steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn geometry() -> RobotGeometry {
        RobotGeometry::new(0.5, 0.1).unwrap()
    }

    #[test]
    fn test_straight_profile_step_count() {
        // 10 m at 1 m/s with dt = 0.1 s -> 100 steps
        let profile = straight_line_profile(&geometry(), 10.0, 1.0).unwrap();
        assert_eq!(profile.steps(), 100);
        assert_eq!(profile.pair(), WheelVelocityPair::new(1.0, 1.0));
        assert!((profile.duration(0.1) - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_straight_profile_rounds_to_nearest() {
        // 1.26 / 1.0 / 0.1 = 12.6 -> 13
        assert_eq!(straight_line_profile(&geometry(), 1.26, 1.0).unwrap().steps(), 13);
        // 1.24 / 1.0 / 0.1 = 12.4 -> 12
        assert_eq!(straight_line_profile(&geometry(), 1.24, 1.0).unwrap().steps(), 12);
    }

    #[test]
    fn test_straight_profile_reverse_speed() {
        let profile = straight_line_profile(&geometry(), 2.0, -0.5).unwrap();
        assert_eq!(profile.steps(), 40);
        assert_eq!(profile.pair(), WheelVelocityPair::new(-0.5, -0.5));
    }

    #[test]
    fn test_straight_profile_zero_distance_is_empty() {
        assert!(straight_line_profile(&geometry(), 0.0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_straight_profile_rejections() {
        for (distance, speed) in [(1.0, 0.0), (-1.0, 1.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            assert!(
                matches!(
                    straight_line_profile(&geometry(), distance, speed),
                    Err(KinematicsError::InvalidSegmentParameters(_))
                ),
                "distance={distance}, speed={speed} should be rejected"
            );
        }
    }

    #[test]
    fn test_arc_profile_left_turn_right_wheel_is_outer() {
        // omega = 1 / 5 = 0.2 rad/s
        // v_outer = 1 * (5 + 0.5) / 5 = 1.1, v_inner = 1 * (5 - 0.5) / 5 = 0.9
        let profile = circular_arc_profile(&geometry(), 5.0, 1.0, TurnDirection::Left, 1.0).unwrap();
        assert!((profile.pair().v_right - 1.1).abs() < EPSILON);
        assert!((profile.pair().v_left - 0.9).abs() < EPSILON);
        // 2π / 0.2 / 0.1 = 314.159... -> 314
        assert_eq!(profile.steps(), 314);
    }

    #[test]
    fn test_arc_profile_right_turn_mirrors_left() {
        let left = circular_arc_profile(&geometry(), 2.0, 0.8, TurnDirection::Left, 0.5).unwrap();
        let right = circular_arc_profile(&geometry(), 2.0, 0.8, TurnDirection::Right, 0.5).unwrap();
        assert_eq!(left.steps(), right.steps());
        assert_eq!(left.pair().v_right, right.pair().v_left);
        assert_eq!(left.pair().v_left, right.pair().v_right);
    }

    #[test]
    fn test_arc_profile_matches_requested_chassis_speeds() {
        let geometry = geometry();
        let profile = circular_arc_profile(&geometry, 3.0, 0.6, TurnDirection::Right, 1.0).unwrap();
        let chassis = geometry.forward_kinematics(profile.pair());
        assert!((chassis.v - 0.6).abs() < EPSILON);
        assert!((chassis.omega - (-0.2)).abs() < EPSILON);
    }

    #[test]
    fn test_arc_profile_rejections() {
        let g = geometry();
        let d = TurnDirection::Left;
        assert!(matches!(
            circular_arc_profile(&g, 0.0, 1.0, d, 1.0),
            Err(KinematicsError::InvalidArcParameters("radius must be positive"))
        ));
        assert!(matches!(
            circular_arc_profile(&g, -1.0, 1.0, d, 1.0),
            Err(KinematicsError::InvalidArcParameters("radius must be positive"))
        ));
        assert!(matches!(
            circular_arc_profile(&g, 1.0, 0.0, d, 1.0),
            Err(KinematicsError::InvalidArcParameters("linear velocity must be non-zero"))
        ));
        assert!(matches!(
            circular_arc_profile(&g, 1.0, 1.0, d, 0.0),
            Err(KinematicsError::InvalidArcParameters("turns must be positive"))
        ));
        assert!(matches!(
            circular_arc_profile(&g, 1.0, f64::NAN, d, 1.0),
            Err(KinematicsError::InvalidArcParameters(_))
        ));
    }

    #[test]
    fn test_profile_iterates_held_pair() {
        let pair = WheelVelocityPair::new(0.3, 0.2);
        let samples: Vec<_> = VelocityProfile::hold(pair, 3).into_iter().collect();
        assert_eq!(samples, vec![pair; 3]);
    }
}
