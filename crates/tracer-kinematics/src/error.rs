//! Error types for the trajectory engine.
//!
//! Every variant is raised before the engine touches its trajectory, so a
//! rejected call leaves the recorded history exactly as it was.

use core::fmt;

/// Errors that can occur when configuring the engine or synthesizing motion.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for invalid robot geometry.
    /// Returned when the wheel separation or time step is not finite and strictly positive.
    InvalidGeometry(&'static str),
    /// Error for malformed circular-arc parameters.
    /// Returned for a non-positive radius, a zero linear velocity or non-positive turns.
    InvalidArcParameters(&'static str),
    /// Error for malformed straight-line parameters.
    /// Returned for a zero speed or a negative distance.
    InvalidSegmentParameters(&'static str),
    /// Error for a profile whose step count cannot be stored in the trajectory.
    ProfileTooLong(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidGeometry(msg) => write!(f, "Invalid robot geometry: {}", msg),
            KinematicsError::InvalidArcParameters(msg) => {
                write!(f, "Invalid circular arc parameters: {}", msg)
            }
            KinematicsError::InvalidSegmentParameters(msg) => {
                write!(f, "Invalid straight segment parameters: {}", msg)
            }
            KinematicsError::ProfileTooLong(msg) => write!(f, "Velocity profile too long: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
