//! Motion commands: the user-facing vocabulary for queuing robot motion.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracer_kinematics::{
    KinematicEngine, KinematicsError, RobotGeometry, TurnDirection, VelocityProfile,
    circular_arc_profile, straight_line_profile,
};

/// A single high-level motion primitive.
///
/// Parameters are forwarded verbatim to the engine's synthesizers; no
/// defaults are filled in and nothing is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionCommand {
    /// Drive `distance` meters with both wheels at `speed` m/s.
    Straight {
        /// Distance to cover (m), non-negative.
        distance: f64,
        /// Wheel speed (m/s), non-zero. Negative drives in reverse.
        speed: f64,
    },
    /// Drive `turns` laps of a circle of `radius` meters.
    Circular {
        /// Circle radius (m), positive.
        radius: f64,
        /// Chassis speed (m/s), non-zero.
        linear_velocity: f64,
        /// Which way the circle bends.
        direction: TurnDirection,
        /// Number of laps, positive. Fractions drive partial arcs.
        turns: f64,
    },
}

impl MotionCommand {
    /// Derives the wheel-velocity profile this command drives under `geometry`.
    ///
    /// # Errors
    ///
    /// Returns the engine's `InvalidSegmentParameters` / `InvalidArcParameters`
    /// error for malformed parameters.
    pub fn profile(&self, geometry: &RobotGeometry) -> Result<VelocityProfile, KinematicsError> {
        match *self {
            MotionCommand::Straight { distance, speed } => {
                straight_line_profile(geometry, distance, speed)
            }
            MotionCommand::Circular {
                radius,
                linear_velocity,
                direction,
                turns,
            } => circular_arc_profile(geometry, radius, linear_velocity, direction, turns),
        }
    }

    /// Runs the whole command on `engine` in one call.
    pub fn execute(&self, engine: &mut KinematicEngine) -> Result<VelocityProfile, KinematicsError> {
        match *self {
            MotionCommand::Straight { distance, speed } => {
                engine.synthesize_straight_line(distance, speed)
            }
            MotionCommand::Circular {
                radius,
                linear_velocity,
                direction,
                turns,
            } => engine.synthesize_circular_arc(radius, linear_velocity, direction, turns),
        }
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::Straight { distance, speed } => {
                write!(f, "straight {:.2} m at {:.2} m/s", distance, speed)
            }
            MotionCommand::Circular {
                radius,
                linear_velocity,
                direction,
                turns,
            } => write!(
                f,
                "circular {} r={:.2} m at {:.2} m/s for {:.2} turns",
                direction, radius, linear_velocity, turns
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_commands() {
        let json = r#"[
            {"kind": "straight", "distance": 2.0, "speed": 0.5},
            {"kind": "circular", "radius": 1.5, "linear_velocity": 1.0, "direction": "right", "turns": 0.5}
        ]"#;
        let commands: Vec<MotionCommand> = serde_json::from_str(json).unwrap();
        assert_eq!(
            commands,
            vec![
                MotionCommand::Straight {
                    distance: 2.0,
                    speed: 0.5
                },
                MotionCommand::Circular {
                    radius: 1.5,
                    linear_velocity: 1.0,
                    direction: TurnDirection::Right,
                    turns: 0.5
                },
            ]
        );
    }

    #[test]
    fn test_direction_accepts_any_case_like_from_str() {
        for (text, expected) in [
            ("left", TurnDirection::Left),
            ("Left", TurnDirection::Left),
            ("LEFT", TurnDirection::Left),
            ("Right", TurnDirection::Right),
        ] {
            let json = format!(
                r#"{{"kind": "circular", "radius": 1.0, "linear_velocity": 1.0, "direction": "{}", "turns": 1.0}}"#,
                text
            );
            let command: MotionCommand = serde_json::from_str(&json).unwrap();
            assert!(matches!(command, MotionCommand::Circular { direction, .. } if direction == expected));
            assert_eq!(text.parse::<TurnDirection>().unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{"kind": "spiral", "radius": 1.0}"#;
        assert!(serde_json::from_str::<MotionCommand>(json).is_err());
    }

    #[test]
    fn test_execute_matches_profile() {
        let mut engine = KinematicEngine::new(0.5, 0.1).unwrap();
        let command = MotionCommand::Circular {
            radius: 2.0,
            linear_velocity: 1.0,
            direction: TurnDirection::Left,
            turns: 0.5,
        };
        let expected = command.profile(engine.geometry()).unwrap();
        let applied = command.execute(&mut engine).unwrap();
        assert_eq!(applied, expected);
        assert_eq!(engine.len(), 1 + expected.steps());
    }

    #[test]
    fn test_execute_rejects_without_mutation() {
        let mut engine = KinematicEngine::new(0.5, 0.1).unwrap();
        let command = MotionCommand::Straight {
            distance: -1.0,
            speed: 1.0,
        };
        assert!(matches!(
            command.execute(&mut engine),
            Err(KinematicsError::InvalidSegmentParameters(_))
        ));
        assert_eq!(engine.len(), 1);
    }
}
