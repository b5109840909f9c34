use std::path::Path;

use anyhow::Context;
use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracer_mission::MotionCommand;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const PREFERENCES_PATH: &str = "start.json";

/// Robot geometry as written in the config file; validated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RobotConfig {
    pub wheel_separation: f64,
    pub time_step: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            wheel_separation: 0.5,
            time_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Pixels per meter.
    pub scale: f32,
    /// Distance from the robot position to each marker vertex (m).
    pub marker_size: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            scale: 40.0,
            marker_size: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub view: ViewConfig,
    /// Commands queued at startup and re-queued with the `M` key.
    #[serde(default)]
    pub mission: Vec<MotionCommand>,
}

/// Robot model selected in the preferences file, written as `"Differential"` or `"Car"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RobotType {
    #[default]
    #[serde(alias = "differential")]
    Differential,
    /// Car-like steering; accepted in the preferences file but not simulated.
    #[serde(alias = "car")]
    Car,
}

/// UI preferences persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub robot_type: RobotType,
    pub time_factor: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            robot_type: RobotType::Differential,
            time_factor: 1.0,
        }
    }
}

pub fn load_config(path: &str) -> Result<SimConfig, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .build()
        .and_then(|c| c.try_deserialize::<SimConfig>());

    match settings {
        Ok(config) => {
            info!(
                wheel_separation = config.robot.wheel_separation,
                time_step = config.robot.time_step,
                mission_len = config.mission.len(),
                "Successfully loaded configuration"
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

/// Reads preferences, falling back to defaults when the file is missing or malformed.
pub fn load_preferences(path: &str) -> Preferences {
    let preferences = Config::builder()
        .add_source(File::new(path, FileFormat::Json).required(false))
        .build()
        .and_then(|c| c.try_deserialize::<Preferences>());

    match preferences {
        Ok(preferences) => {
            info!(?preferences, "Loaded preferences from {}", path);
            preferences
        }
        Err(e) => {
            warn!("Ignoring unreadable preferences file {}: {}", path, e);
            Preferences::default()
        }
    }
}

pub fn save_preferences(path: impl AsRef<Path>, preferences: &Preferences) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(preferences)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing preferences to {}", path.display()))?;
    info!(?preferences, "Saved preferences to {}", path.display());
    Ok(())
}
