pub mod command;
pub mod mirror;
pub mod playback;

pub use command::MotionCommand;
pub use mirror::{MirrorUpdate, TrajectoryMirror};
pub use playback::{Playback, PlaybackStatus};

use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use tracer_kinematics::{KinematicEngine, Pose};

/// Slowest playback speed accepted by [`run_playback_task`].
pub const MIN_TIME_FACTOR: f64 = 0.1;
/// Fastest playback speed accepted by [`run_playback_task`].
pub const MAX_TIME_FACTOR: f64 = 10.0;

/// Requests the playback task accepts from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackControl {
    Play,
    Pause,
    /// Restart the engine at the origin and drop every queued command.
    Reset,
    SetTimeFactor(f64),
    Enqueue(MotionCommand),
    /// Ask for a full snapshot, e.g. after a receiver lagged.
    Resync,
}

/// Startup parameters of the playback task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// Playback speed multiplier; one sample is driven every `dt / time_factor` seconds.
    pub time_factor: f64,
    /// Start playing immediately instead of waiting for [`PlaybackControl::Play`].
    pub autoplay: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        PlaybackSettings {
            time_factor: 1.0,
            autoplay: false,
        }
    }
}

/// Playback state plus the poses recorded since the previous snapshot.
///
/// A snapshot with `first_index == 0` carries the whole trajectory; any other
/// snapshot is a delta to append. [`TrajectoryMirror`] reassembles the history.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySnapshot {
    /// Trajectory index of `poses[0]`.
    pub first_index: usize,
    pub poses: Vec<Pose>,
    pub status: PlaybackStatus,
    pub playing: bool,
    pub time_factor: f64,
}

impl TrajectorySnapshot {
    pub fn is_full(&self) -> bool {
        self.first_index == 0
    }

    /// Trajectory length once this snapshot is applied.
    pub fn end_index(&self) -> usize {
        self.first_index + self.poses.len()
    }
}

/// Clamps a requested time factor to `[MIN_TIME_FACTOR, MAX_TIME_FACTOR]`.
/// Non-finite requests fall back to real time.
pub fn clamp_time_factor(time_factor: f64) -> f64 {
    if time_factor.is_finite() {
        time_factor.clamp(MIN_TIME_FACTOR, MAX_TIME_FACTOR)
    } else {
        1.0
    }
}

fn playback_interval(time_step: f64, time_factor: f64) -> Interval {
    let period = Duration::from_secs_f64(time_step / time_factor).max(Duration::from_micros(1));
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Publishes snapshots, remembering how much of the trajectory is already out.
struct SnapshotPublisher {
    tx: broadcast::Sender<Arc<TrajectorySnapshot>>,
    published: usize,
}

impl SnapshotPublisher {
    fn new(tx: broadcast::Sender<Arc<TrajectorySnapshot>>) -> Self {
        SnapshotPublisher { tx, published: 0 }
    }

    /// Sends the poses appended since the last send, or the whole trajectory
    /// when `full` is set or the engine was reset in between.
    fn publish(
        &mut self,
        engine: &KinematicEngine,
        playback: &Playback,
        playing: bool,
        time_factor: f64,
        full: bool,
    ) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let poses = engine.trajectory();
        let first_index = if full || poses.len() < self.published {
            0
        } else {
            self.published
        };
        let snapshot = TrajectorySnapshot {
            first_index,
            poses: poses[first_index..].to_vec(),
            status: playback.status(),
            playing,
            time_factor,
        };
        match self.tx.send(Arc::new(snapshot)) {
            Ok(_) => self.published = poses.len(),
            Err(e) => warn!("Failed to publish trajectory snapshot: {}", e),
        }
    }
}

/// Drives `playback` on `engine` in simulated real time.
///
/// While playing, every tick of a `dt / time_factor` interval feeds one
/// wheel-velocity sample to the engine and publishes a [`TrajectorySnapshot`]
/// holding the new pose. A snapshot is also published after every control
/// message. The first snapshot, and those following `Reset` or `Resync`,
/// carry the whole trajectory. Playback pauses by itself once the queue runs dry.
///
/// # Arguments
/// * `engine` - Engine owned by this task for its whole lifetime.
/// * `playback` - Commands to drive; more can arrive via [`PlaybackControl::Enqueue`].
/// * `settings` - Initial time factor and autoplay flag.
/// * `control_rx` - Broadcast receiver for UI requests.
/// * `snapshot_tx` - Broadcast sender for trajectory snapshots.
///
/// Returns the engine once every control sender has been dropped.
pub async fn run_playback_task(
    mut engine: KinematicEngine,
    mut playback: Playback,
    settings: PlaybackSettings,
    mut control_rx: broadcast::Receiver<Arc<PlaybackControl>>,
    snapshot_tx: broadcast::Sender<Arc<TrajectorySnapshot>>,
) -> anyhow::Result<KinematicEngine> {
    let time_step = engine.geometry().time_step();
    let mut time_factor = clamp_time_factor(settings.time_factor);
    let mut playing = settings.autoplay;
    let mut ticker = playback_interval(time_step, time_factor);
    let mut publisher = SnapshotPublisher::new(snapshot_tx);

    info!(
        geometry = %engine.geometry(),
        time_factor,
        queued = playback.status().total,
        "Playback task started."
    );
    publisher.publish(&engine, &playback, playing, time_factor, true);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if playing {
                    let status = playback.advance(&mut engine, 1);
                    if status.finished {
                        info!(completed = status.completed, poses = engine.len(), "Mission complete.");
                        playing = false;
                    }
                    publisher.publish(&engine, &playback, playing, time_factor, false);
                }
            }
            result = control_rx.recv() => {
                match result {
                    Ok(control) => {
                        debug!(?control, "Playback control received");
                        let mut full = false;
                        match &*control {
                            PlaybackControl::Play => {
                                if playback.status().finished {
                                    info!("Nothing queued; ignoring play request.");
                                } else {
                                    playing = true;
                                }
                            }
                            PlaybackControl::Pause => playing = false,
                            PlaybackControl::Reset => {
                                engine.reset();
                                playback.clear();
                                playing = false;
                                full = true;
                                info!("Simulation reset.");
                            }
                            PlaybackControl::SetTimeFactor(requested) => {
                                time_factor = clamp_time_factor(*requested);
                                ticker = playback_interval(time_step, time_factor);
                                info!(time_factor, "Time factor changed.");
                            }
                            PlaybackControl::Enqueue(command) => {
                                if let Err(e) = playback.enqueue(*command) {
                                    warn!(%command, error = %e, "Rejected motion command.");
                                }
                            }
                            PlaybackControl::Resync => full = true,
                        }
                        publisher.publish(&engine, &playback, playing, time_factor, full);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Control receiver lagged by {} messages in playback task.", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Control channel closed. Playback task stopping.");
                        return Ok(engine);
                    }
                }
            }
        }
    }
}
