mod blackboard; // shared UI state
mod bus; // broadcast topics between the UI thread and the runtime
mod config;
mod graphics;

use blackboard::{Blackboard, new_blackboard, raise_fault, set_time_factor, snapshot};
use bus::Topic;
use config::{DEFAULT_CONFIG_PATH, PREFERENCES_PATH, RobotType, SimConfig};
use graphics::window_conf;

use tracer_kinematics::KinematicEngine;
use tracer_kinematics::trace::TrajectoryStats;
use tracer_mission::{
    Playback, PlaybackControl, PlaybackSettings, TrajectorySnapshot, run_playback_task,
};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Tracer simulator started.");

    if let Err(e) = run().await {
        error!("Simulator failed: {:?}", e);
    }
}

/// Queues every configured command, recording rejected ones as faults.
fn queue_mission(playback: &mut Playback, config: &SimConfig, bb: &Blackboard) {
    for command in &config.mission {
        if let Err(e) = playback.enqueue(*command) {
            warn!(%command, error = %e, "Skipping invalid mission command.");
            raise_fault(bb, &format!("rejected '{}': {}", command, e));
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = config::load_config(DEFAULT_CONFIG_PATH)?;
    let preferences = config::load_preferences(PREFERENCES_PATH);
    let bb = new_blackboard(preferences);
    let time_factor = set_time_factor(&bb, preferences.time_factor);

    if preferences.robot_type == RobotType::Car {
        warn!("Car-like kinematics are not supported; simulating a differential drive.");
        raise_fault(&bb, "car-like robot not supported, using differential drive");
    }

    let engine = KinematicEngine::new(config.robot.wheel_separation, config.robot.time_step)?;
    let mut playback = Playback::new(*engine.geometry());
    queue_mission(&mut playback, &config, &bb);

    let control_topic: Topic<PlaybackControl> = Topic::new(64);
    let snapshot_topic: Topic<TrajectorySnapshot> = Topic::new(16);
    let snapshot_rx = snapshot_topic.subscribe();

    let tokio_rt = tokio::runtime::Runtime::new()?;
    let playback_task = tokio_rt.spawn(run_playback_task(
        engine,
        playback,
        PlaybackSettings {
            time_factor,
            autoplay: false,
        },
        control_topic.subscribe(),
        snapshot_topic.sender(),
    ));

    graphics::run_visualization_loop(
        bb.clone(),
        &control_topic,
        snapshot_rx,
        config.view,
        &config.mission,
    )
    .await;

    // Dropping the last control sender stops the playback task.
    drop(control_topic);
    match tokio_rt.block_on(playback_task)? {
        Ok(engine) => {
            let stats = TrajectoryStats::from_poses(engine.trajectory());
            info!(
                steps = stats.steps,
                path_length = stats.path_length,
                final_pose = %engine.current_pose(),
                "Playback task finished."
            );
        }
        Err(e) => error!("Playback task failed: {:?}", e),
    }

    config::save_preferences(PREFERENCES_PATH, &snapshot(&bb).preferences)?;
    Ok(())
}
