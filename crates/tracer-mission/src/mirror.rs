//! Receiver-side copy of the trajectory, rebuilt from incremental snapshots.

use tracer_kinematics::Pose;
use tracer_kinematics::trace::TrajectoryStats;

use crate::TrajectorySnapshot;

/// Result of feeding one snapshot to a [`TrajectoryMirror`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorUpdate {
    /// The mirror now matches the publisher up to the snapshot's last pose.
    Applied,
    /// Poses between the mirror's end and the snapshot's first pose were
    /// missed; the mirror is unchanged and needs a full snapshot.
    Gap,
}

/// Local trajectory history kept in step with a playback task.
///
/// Appending a snapshot costs time proportional to the poses it carries,
/// statistics included, never to the length of the history.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryMirror {
    poses: Vec<Pose>,
    stats: TrajectoryStats,
}

impl TrajectoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `snapshot` into the mirror.
    ///
    /// A full snapshot replaces the history. A delta is appended, skipping any
    /// poses the mirror already holds.
    pub fn apply(&mut self, snapshot: &TrajectorySnapshot) -> MirrorUpdate {
        if snapshot.is_full() {
            self.poses.clear();
            self.poses.extend_from_slice(&snapshot.poses);
            self.stats = TrajectoryStats::from_poses(&self.poses);
            return MirrorUpdate::Applied;
        }

        let held = self.poses.len();
        if snapshot.first_index > held {
            return MirrorUpdate::Gap;
        }
        let fresh = &snapshot.poses[(held - snapshot.first_index).min(snapshot.poses.len())..];
        if !fresh.is_empty() {
            self.poses.extend_from_slice(fresh);
            self.stats.extend(&self.poses, held);
        }
        MirrorUpdate::Applied
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn stats(&self) -> &TrajectoryStats {
        &self.stats
    }

    /// Latest pose, or the origin before the first snapshot.
    pub fn current_pose(&self) -> Pose {
        self.poses.last().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}
