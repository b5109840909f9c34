//! Sample-by-sample playback of a queue of motion commands.
//!
//! Commands are validated when they are queued and then fed to the engine one
//! wheel-velocity sample at a time, so a caller can pause between any two
//! steps of a long arc.

use std::collections::VecDeque;

use tracing::{debug, info};
use tracer_kinematics::{
    KinematicEngine, KinematicsError, RobotGeometry, VelocityProfile, WheelVelocityPair,
};

use crate::MotionCommand;

/// Progress through the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    /// Commands driven to completion since the last clear.
    pub completed: usize,
    /// Completed, in-flight and pending commands.
    pub total: usize,
    /// No command is in flight and none is pending.
    pub finished: bool,
}

#[derive(Debug, Clone, Copy)]
struct ActiveCommand {
    command: MotionCommand,
    pair: WheelVelocityPair,
    remaining: usize,
}

impl ActiveCommand {
    fn start(command: MotionCommand, profile: VelocityProfile) -> Self {
        ActiveCommand {
            command,
            pair: profile.pair(),
            remaining: profile.steps(),
        }
    }
}

/// FIFO of validated commands plus the one currently being driven.
#[derive(Debug, Clone)]
pub struct Playback {
    geometry: RobotGeometry,
    queue: VecDeque<(MotionCommand, VelocityProfile)>,
    active: Option<ActiveCommand>,
    completed: usize,
}

impl Playback {
    /// An empty playback for a robot with `geometry`.
    pub fn new(geometry: RobotGeometry) -> Self {
        Playback {
            geometry,
            queue: VecDeque::new(),
            active: None,
            completed: 0,
        }
    }

    /// Validates `command` and appends it to the queue.
    ///
    /// # Errors
    ///
    /// Returns the engine's validation error; nothing is queued in that case.
    pub fn enqueue(&mut self, command: MotionCommand) -> Result<VelocityProfile, KinematicsError> {
        let profile = command.profile(&self.geometry)?;
        debug!(%command, steps = profile.steps(), "queued command");
        self.queue.push_back((command, profile));
        Ok(profile)
    }

    /// Drops every pending and in-flight command and zeroes the progress count.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = None;
        self.completed = 0;
    }

    /// Current progress.
    pub fn status(&self) -> PlaybackStatus {
        let in_flight = usize::from(self.active.is_some());
        PlaybackStatus {
            completed: self.completed,
            total: self.completed + in_flight + self.queue.len(),
            finished: self.active.is_none() && self.queue.is_empty(),
        }
    }

    /// The command currently being driven, if any.
    pub fn active_command(&self) -> Option<MotionCommand> {
        self.active.map(|a| a.command)
    }

    /// Feeds up to `max_samples` samples to `engine`, crossing command
    /// boundaries as needed. Zero-length commands complete without using any
    /// of `max_samples`.
    pub fn advance(&mut self, engine: &mut KinematicEngine, max_samples: usize) -> PlaybackStatus {
        let mut samples_left = max_samples;
        loop {
            match self.active.as_mut() {
                Some(active) if active.remaining == 0 => {
                    debug!(command = %active.command, "command finished");
                    self.active = None;
                    self.completed += 1;
                }
                Some(active) => {
                    if samples_left == 0 {
                        break;
                    }
                    engine.step(active.pair.v_right, active.pair.v_left);
                    active.remaining -= 1;
                    samples_left -= 1;
                }
                None => match self.queue.pop_front() {
                    Some((command, profile)) => {
                        info!(
                            %command,
                            steps = profile.steps(),
                            index = self.completed,
                            "starting command"
                        );
                        self.active = Some(ActiveCommand::start(command, profile));
                    }
                    None => break,
                },
            }
        }
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracer_kinematics::TurnDirection;

    fn setup() -> (KinematicEngine, Playback) {
        let engine = KinematicEngine::new(0.5, 0.1).unwrap();
        let playback = Playback::new(*engine.geometry());
        (engine, playback)
    }

    fn straight(distance: f64) -> MotionCommand {
        MotionCommand::Straight {
            distance,
            speed: 1.0,
        }
    }

    #[test]
    fn test_empty_playback_is_finished() {
        let (mut engine, mut playback) = setup();
        let status = playback.advance(&mut engine, 10);
        assert!(status.finished);
        assert_eq!(status.total, 0);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_enqueue_rejects_invalid_command() {
        let (_, mut playback) = setup();
        let result = playback.enqueue(MotionCommand::Circular {
            radius: 0.0,
            linear_velocity: 1.0,
            direction: TurnDirection::Left,
            turns: 1.0,
        });
        assert!(matches!(result, Err(KinematicsError::InvalidArcParameters(_))));
        assert_eq!(playback.status().total, 0);
    }

    #[test]
    fn test_advance_one_sample_at_a_time() {
        let (mut engine, mut playback) = setup();
        playback.enqueue(straight(0.3)).unwrap(); // 3 steps
        playback.enqueue(straight(0.2)).unwrap(); // 2 steps

        let status = playback.advance(&mut engine, 1);
        assert_eq!(engine.len(), 2);
        assert_eq!(status, PlaybackStatus { completed: 0, total: 2, finished: false });
        assert_eq!(playback.active_command(), Some(straight(0.3)));

        let status = playback.advance(&mut engine, 2);
        assert_eq!(engine.len(), 4);
        assert_eq!(status.completed, 1);
        // the next command is picked up as soon as the first one ends
        assert_eq!(playback.active_command(), Some(straight(0.2)));

        let status = playback.advance(&mut engine, 100);
        assert_eq!(engine.len(), 6);
        assert_eq!(status, PlaybackStatus { completed: 2, total: 2, finished: true });
    }

    #[test]
    fn test_chunked_playback_matches_one_shot_execution() {
        let commands = [
            straight(1.0),
            MotionCommand::Circular {
                radius: 1.0,
                linear_velocity: 0.5,
                direction: TurnDirection::Right,
                turns: 0.75,
            },
            straight(0.5),
        ];

        let (mut chunked, mut playback) = setup();
        for c in commands {
            playback.enqueue(c).unwrap();
        }
        while !playback.advance(&mut chunked, 7).finished {}

        let (mut one_shot, _) = setup();
        for c in commands {
            c.execute(&mut one_shot).unwrap();
        }
        assert_eq!(chunked.trajectory(), one_shot.trajectory());
    }

    #[test]
    fn test_zero_length_command_completes_without_samples() {
        let (mut engine, mut playback) = setup();
        playback.enqueue(straight(0.0)).unwrap();
        let status = playback.advance(&mut engine, 0);
        assert!(status.finished);
        assert_eq!(status.completed, 1);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_clear_drops_queue_and_progress() {
        let (mut engine, mut playback) = setup();
        playback.enqueue(straight(1.0)).unwrap();
        playback.enqueue(straight(1.0)).unwrap();
        playback.advance(&mut engine, 15);
        playback.clear();
        assert_eq!(playback.status(), PlaybackStatus { completed: 0, total: 0, finished: true });
        assert!(playback.active_command().is_none());
    }
}
