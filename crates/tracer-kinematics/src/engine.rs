//! The kinematic trajectory engine.
//!
//! [`KinematicEngine`] owns a robot geometry and the full, append-only pose
//! history of one simulated robot. Every operation is a synchronous
//! computation over in-memory state; callers that share an engine across
//! threads must serialize access themselves.

use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::profile::{VelocityProfile, circular_arc_profile, straight_line_profile};
use crate::{KinematicsError, Pose, RobotGeometry, TurnDirection, WheelVelocityPair};

/// Differential-drive trajectory engine.
///
/// The trajectory always holds at least the origin pose, and poses are only
/// ever appended. [`KinematicEngine::reset`] is the single way to discard
/// history.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicEngine {
    geometry: RobotGeometry,
    poses: Vec<Pose>,
}

impl KinematicEngine {
    /// Construct an engine at the origin.
    ///
    /// # Arguments
    ///
    /// * `wheel_separation`: Distance between the wheel contact points in meters.
    /// * `time_step`: Integration interval in seconds.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidGeometry)` if either argument is not finite
    /// and strictly positive.
    pub fn new(wheel_separation: f64, time_step: f64) -> Result<Self, KinematicsError> {
        let geometry = RobotGeometry::new(wheel_separation, time_step)?;
        Ok(Self::from_geometry(geometry))
    }

    /// Construct an engine at the origin from an already validated geometry.
    pub fn from_geometry(geometry: RobotGeometry) -> Self {
        KinematicEngine {
            geometry,
            poses: vec![Pose::ORIGIN],
        }
    }

    /// Returns the robot geometry.
    pub fn geometry(&self) -> &RobotGeometry {
        &self.geometry
    }

    /// The recorded poses, oldest first. `trajectory()[0]` is the origin.
    pub fn trajectory(&self) -> &[Pose] {
        &self.poses
    }

    /// The most recent pose.
    pub fn current_pose(&self) -> Pose {
        // never empty: construction and reset both seed the origin
        self.poses[self.poses.len() - 1]
    }

    /// Number of recorded poses, including the origin.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Always `false`; kept for parity with [`KinematicEngine::len`].
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Advances the robot by exactly one time step and returns the new pose.
    ///
    /// # Arguments
    ///
    /// * `v_right`: Right wheel velocity (m/s).
    /// * `v_left`: Left wheel velocity (m/s).
    ///
    /// Non-finite velocities are not rejected; they propagate into the recorded pose.
    pub fn step(&mut self, v_right: f64, v_left: f64) -> Pose {
        let next = self
            .geometry
            .advance(self.current_pose(), WheelVelocityPair::new(v_right, v_left));
        self.poses.push(next);
        next
    }

    /// Applies one [`KinematicEngine::step`] per sample, in order.
    ///
    /// Capacity for the whole batch is reserved up front when the iterator
    /// reports its length. An empty batch is a no-op.
    pub fn integrate<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = WheelVelocityPair>,
    {
        let samples = samples.into_iter();
        let (lower, _) = samples.size_hint();
        self.poses.reserve(lower);

        let mut pose = self.current_pose();
        for wheels in samples {
            pose = self.geometry.advance(pose, wheels);
            self.poses.push(pose);
        }
        trace!(len = self.poses.len(), "integrated wheel samples");
    }

    /// Drives the robot around a circular arc.
    ///
    /// Derives the profile with [`circular_arc_profile`] and integrates it.
    /// Returns the profile that was applied.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidArcParameters)` for a non-positive radius,
    /// a zero linear velocity or non-positive turns, and
    /// `Err(KinematicsError::ProfileTooLong)` if the steps cannot be stored.
    /// The trajectory is unchanged on error.
    pub fn synthesize_circular_arc(
        &mut self,
        radius: f64,
        linear_velocity: f64,
        direction: TurnDirection,
        turns: f64,
    ) -> Result<VelocityProfile, KinematicsError> {
        let profile =
            circular_arc_profile(&self.geometry, radius, linear_velocity, direction, turns)?;
        self.apply_profile(profile)?;
        debug!(
            radius,
            linear_velocity,
            %direction,
            turns,
            steps = profile.steps(),
            "synthesized circular arc"
        );
        Ok(profile)
    }

    /// Drives the robot straight ahead (or back, for a negative speed).
    ///
    /// Derives the profile with [`straight_line_profile`] and integrates it.
    /// Returns the profile that was applied.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidSegmentParameters)` for a zero speed or a
    /// negative distance, and `Err(KinematicsError::ProfileTooLong)` if the steps
    /// cannot be stored. The trajectory is unchanged on error.
    pub fn synthesize_straight_line(
        &mut self,
        distance: f64,
        speed: f64,
    ) -> Result<VelocityProfile, KinematicsError> {
        let profile = straight_line_profile(&self.geometry, distance, speed)?;
        self.apply_profile(profile)?;
        debug!(distance, speed, steps = profile.steps(), "synthesized straight line");
        Ok(profile)
    }

    /// Integrates a whole profile, or nothing if its steps cannot be stored.
    pub fn apply_profile(&mut self, profile: VelocityProfile) -> Result<(), KinematicsError> {
        self.poses
            .try_reserve(profile.steps())
            .map_err(|_| KinematicsError::ProfileTooLong("cannot reserve a pose for every step"))?;
        self.integrate(profile);
        Ok(())
    }

    /// Discards the trajectory and restarts at the origin. The geometry is kept.
    pub fn reset(&mut self) {
        debug!(discarded = self.poses.len(), "resetting trajectory");
        self.poses.clear();
        self.poses.push(Pose::ORIGIN);
    }
}
