use macroquad::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use tracer_kinematics::trace::{self, ProgressGradient, Rgba};
use tracer_mission::{
    MirrorUpdate, MotionCommand, PlaybackControl, TrajectoryMirror, TrajectorySnapshot,
};

use crate::blackboard::{Blackboard, set_time_factor, snapshot};
use crate::bus::Topic;
use crate::config::ViewConfig;

/// Multiplier applied to the time factor by the `Up` / `Down` keys.
const TIME_FACTOR_STEP: f64 = 1.25;
const GRID_SPACING: f32 = 1.0; // meters
const TRACE_THICKNESS: f32 = 2.0;
const HUD_FONT: f32 = 20.0;

pub fn window_conf() -> Conf {
    Conf {
        window_title: "Tracer Trajectory Simulator".to_string(),
        window_width: 800,
        window_height: 600,
        high_dpi: true,
        ..Default::default()
    }
}

/// Maps a world point (meters, y up) to screen pixels (y down) around `center`.
pub fn world_to_screen(center: Vec2, scale: f32, point: [f64; 2]) -> Vec2 {
    vec2(
        center.x + point[0] as f32 * scale,
        center.y - point[1] as f32 * scale,
    )
}

fn to_color(c: Rgba) -> Color {
    Color::new(c.r, c.g, c.b, c.a)
}

fn draw_grid(center: Vec2, scale: f32) {
    let step = GRID_SPACING * scale;
    if step < 4.0 {
        return;
    }
    let (w, h) = (screen_width(), screen_height());
    let first_x = center.x - (center.x / step).floor() * step;
    let mut x = first_x;
    while x <= w {
        draw_line(x, 0.0, x, h, 1.0, Color::new(0.0, 0.0, 0.0, 0.08));
        x += step;
    }
    let first_y = center.y - (center.y / step).floor() * step;
    let mut y = first_y;
    while y <= h {
        draw_line(0.0, y, w, y, 1.0, Color::new(0.0, 0.0, 0.0, 0.08));
        y += step;
    }
    draw_line(center.x, 0.0, center.x, h, 1.0, GRAY);
    draw_line(0.0, center.y, w, center.y, 1.0, GRAY);
}

fn draw_trajectory(mirror: &TrajectoryMirror, center: Vec2, view: &ViewConfig, gradient: &ProgressGradient) {
    let points = trace::polyline(mirror.poses());
    let colors = gradient.colors(points.len());
    for (i, pair) in points.windows(2).enumerate() {
        let a = world_to_screen(center, view.scale, pair[0]);
        let b = world_to_screen(center, view.scale, pair[1]);
        draw_line(a.x, a.y, b.x, b.y, TRACE_THICKNESS, to_color(colors[i + 1]));
    }

    let pose = mirror.current_pose();
    let [tip, left, right] = trace::marker_triangle(&pose, view.marker_size)
        .map(|p| world_to_screen(center, view.scale, p));
    draw_triangle(tip, left, right, BLUE);
    let robot = world_to_screen(center, view.scale, [pose.x, pose.y]);
    draw_line(robot.x, robot.y, tip.x, tip.y, 2.0, DARKBLUE);
}

fn draw_hud(snap: &TrajectorySnapshot, mirror: &TrajectoryMirror, faults: &[String]) {
    let pose = mirror.current_pose();
    let stats = mirror.stats();
    let state = if snap.playing {
        "playing"
    } else if snap.status.finished {
        "idle"
    } else {
        "paused"
    };
    let lines = [
        format!(
            "Robot: x={:.2} y={:.2} th={:.2} (wrapped {:.2})",
            pose.x,
            pose.y,
            pose.theta,
            pose.wrapped_heading()
        ),
        format!(
            "Mission: {}/{} commands, {} | time factor {:.2}",
            snap.status.completed, snap.status.total, state, snap.time_factor
        ),
        format!(
            "Steps: {} | path {:.2} m | rotation {:.2} rad",
            stats.steps, stats.path_length, stats.total_rotation
        ),
        "Space play/pause  R reset  M queue mission  Up/Down speed  Esc quit".to_string(),
    ];
    let mut y = 20.0;
    for line in &lines {
        draw_text(line, 10.0, y, HUD_FONT, BLACK);
        y += HUD_FONT;
    }
    for fault in faults {
        draw_text(fault, 10.0, y, HUD_FONT, RED);
        y += HUD_FONT;
    }
}

fn handle_keys(bb: &Blackboard, control: &Topic<PlaybackControl>, playing: bool, mission: &[MotionCommand]) {
    if is_key_pressed(KeyCode::Space) {
        control.publish(if playing {
            PlaybackControl::Pause
        } else {
            PlaybackControl::Play
        });
    }
    if is_key_pressed(KeyCode::R) {
        control.publish(PlaybackControl::Reset);
    }
    if is_key_pressed(KeyCode::M) {
        info!(commands = mission.len(), "Queueing configured mission.");
        for command in mission {
            control.publish(PlaybackControl::Enqueue(*command));
        }
    }

    let factor = snapshot(bb).preferences.time_factor;
    let requested = if is_key_pressed(KeyCode::Up) {
        Some(factor * TIME_FACTOR_STEP)
    } else if is_key_pressed(KeyCode::Down) {
        Some(factor / TIME_FACTOR_STEP)
    } else {
        None
    };
    if let Some(requested) = requested {
        let applied = set_time_factor(bb, requested);
        control.publish(PlaybackControl::SetTimeFactor(applied));
    }
}

/// Renders snapshots until the window is closed or the snapshot channel goes away.
pub async fn run_visualization_loop(
    bb: Blackboard,
    control: &Topic<PlaybackControl>,
    mut snapshot_rx: broadcast::Receiver<Arc<TrajectorySnapshot>>,
    view: ViewConfig,
    mission: &[MotionCommand],
) {
    let gradient = ProgressGradient::default();
    let mut latest: Option<Arc<TrajectorySnapshot>> = None;
    let mut mirror = TrajectoryMirror::new();

    prevent_quit();
    info!("Visualization loop starting...");

    loop {
        let mut resync = false;
        loop {
            match snapshot_rx.try_recv() {
                Ok(snap) => {
                    if mirror.apply(&snap) == MirrorUpdate::Gap {
                        resync = true;
                    }
                    latest = Some(snap);
                }
                Err(broadcast::error::TryRecvError::Empty) => break,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Visualization snapshot receiver lagged by {} messages.", n);
                    resync = true;
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    error!("Snapshot channel closed. Exiting visualization loop.");
                    return;
                }
            }
        }
        if resync {
            control.publish(PlaybackControl::Resync);
        }

        if is_quit_requested() || is_key_pressed(KeyCode::Escape) {
            info!("Window close requested.");
            return;
        }

        let playing = latest.as_ref().is_some_and(|s| s.playing);
        handle_keys(&bb, control, playing, mission);

        clear_background(LIGHTGRAY);
        let center = vec2(screen_width() / 2.0, screen_height() / 2.0);
        draw_grid(center, view.scale);

        if let Some(snap) = &latest {
            draw_trajectory(&mirror, center, &view, &gradient);
            draw_hud(snap, &mirror, &snapshot(&bb).faults);
        }

        next_frame().await
    }
}
