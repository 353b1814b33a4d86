use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{DioramaError, DioramaResult};
use crate::time::Duration;

/// Platform-screen door row and its open/close cycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DoorConfig {
    /// Number of doors along the platform edge.
    pub count: usize,
    /// Full width of one door unit (both leaves).
    pub length: f64,
    /// X position of the first door, relative to its platform.
    pub first_x: f64,
    /// Distance between neighbouring doors.
    pub spacing: f64,
    pub period: Duration,
    /// Delay before the first cycle begins.
    pub initial_delay: Duration,
    pub open_at: Duration,
    pub close_at: Duration,
    /// Duration of one open or close motion.
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            count: 5,
            length: 5.0,
            first_x: -25.0,
            spacing: 12.0,
            period: Duration::from_seconds(10.0),
            initial_delay: Duration::zero(),
            open_at: Duration::from_seconds(3.0),
            close_at: Duration::from_seconds(6.0),
            duration: Duration::from_seconds(1.5),
            easing: Easing::CubicInOut,
        }
    }
}

/// One stop of the elevator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FloorConfig {
    pub number: u8,
    /// Height of the car's centre when parked at this floor.
    pub height: f64,
}

/// Elevator car and its floor cycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ElevatorConfig {
    pub period: Duration,
    pub initial_delay: Duration,
    /// Offset at which the car is sent to `upper_floor`.
    pub up_at: Duration,
    /// Offset at which the car is sent to `ground_floor`.
    pub down_at: Duration,
    pub duration: Duration,
    pub easing: Easing,
    pub ground_floor: u8,
    pub upper_floor: u8,
    pub floors: Vec<FloorConfig>,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_seconds(10.0),
            initial_delay: Duration::zero(),
            up_at: Duration::zero(),
            down_at: Duration::from_seconds(5.0),
            duration: Duration::from_seconds(3.0),
            easing: Easing::QuintInOut,
            ground_floor: 1,
            upper_floor: 2,
            floors: vec![
                FloorConfig {
                    number: 1,
                    height: 2.5,
                },
                FloorConfig {
                    number: 2,
                    height: 12.5,
                },
            ],
        }
    }
}

impl ElevatorConfig {
    /// Height for a floor number, if the floor exists.
    pub fn floor_height(&self, floor: u8) -> Option<f64> {
        self.floors
            .iter()
            .find(|f| f.number == floor)
            .map(|f| f.height)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl RenderConfig {
    /// Time between two frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_seconds(1.0 / self.fps.max(1) as f64)
    }
}

/// Top-level configuration, usually loaded from `diorama.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DioramaConfig {
    #[serde(default)]
    pub doors: DoorConfig,
    #[serde(default)]
    pub elevator: ElevatorConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl DioramaConfig {
    /// Load and validate a config file.
    pub fn load_from_file(path: &std::path::Path) -> DioramaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> DioramaResult<Self> {
        let config: DioramaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> DioramaResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check the values serde cannot: positive periods, known floors, sane geometry.
    pub fn validate(&self) -> DioramaResult<()> {
        let doors = &self.doors;
        if doors.count == 0 {
            return Err(config_err("doors.count must be at least 1"));
        }
        if !(doors.length.is_finite() && doors.length > 0.0) {
            return Err(config_err("doors.length must be a positive number"));
        }
        if !doors.first_x.is_finite() || !doors.spacing.is_finite() {
            return Err(config_err("doors.first_x and doors.spacing must be finite"));
        }
        if doors.period.is_zero() {
            return Err(config_err("doors.period must be greater than zero"));
        }

        let elevator = &self.elevator;
        if elevator.period.is_zero() {
            return Err(config_err("elevator.period must be greater than zero"));
        }
        if elevator.floors.is_empty() {
            return Err(config_err("elevator.floors must not be empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for floor in &elevator.floors {
            if !seen.insert(floor.number) {
                return Err(config_err(format!(
                    "elevator floor {} is defined twice",
                    floor.number
                )));
            }
            if !floor.height.is_finite() {
                return Err(config_err(format!(
                    "elevator floor {} has a non-finite height",
                    floor.number
                )));
            }
        }
        for floor in [elevator.ground_floor, elevator.upper_floor] {
            if elevator.floor_height(floor).is_none() {
                return Err(config_err(format!(
                    "elevator schedule uses floor {} which is not in elevator.floors",
                    floor
                )));
            }
        }

        if self.render.fps == 0 {
            return Err(config_err("render.fps must be greater than zero"));
        }
        Ok(())
    }
}

fn config_err(message: impl Into<String>) -> DioramaError {
    DioramaError::Config(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DioramaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.doors.count, 5);
        assert_eq!(config.elevator.floor_height(1), Some(2.5));
        assert_eq!(config.elevator.floor_height(2), Some(12.5));
        assert_eq!(config.elevator.floor_height(3), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = DioramaConfig::from_toml_str(
            r#"
            [doors]
            count = 2
            easing = "power2.inOut"

            [render]
            fps = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.doors.count, 2);
        assert_eq!(config.doors.easing, Easing::CubicInOut);
        assert!((config.doors.period.as_seconds() - 10.0).abs() < 1e-9);
        assert_eq!(config.elevator.easing, Easing::QuintInOut);
        assert_eq!(config.render.fps, 30);
    }

    #[test]
    fn test_floor_table_from_toml() {
        let config = DioramaConfig::from_toml_str(
            r#"
            [elevator]
            upper_floor = 3

            [[elevator.floors]]
            number = 1
            height = 2.5

            [[elevator.floors]]
            number = 3
            height = 22.5
            "#,
        )
        .unwrap();
        assert_eq!(config.elevator.floor_height(3), Some(22.5));
        assert_eq!(config.elevator.floor_height(2), None);
    }

    #[test]
    fn test_rejects_negative_duration() {
        let result = DioramaConfig::from_toml_str("[doors]\nopen_at = -1.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_period() {
        let mut config = DioramaConfig::default();
        config.elevator.period = Duration::zero();
        assert!(matches!(config.validate(), Err(DioramaError::Config(_))));
    }

    #[test]
    fn test_rejects_schedule_floor_missing_from_table() {
        let mut config = DioramaConfig::default();
        config.elevator.upper_floor = 7;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("floor 7"));
    }

    #[test]
    fn test_rejects_unknown_easing() {
        let result = DioramaConfig::from_toml_str("[doors]\neasing = \"elastic.out\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("diorama_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("diorama.toml");

        let mut config = DioramaConfig::default();
        config.doors.count = 3;
        config.save_to_file(&path).unwrap();

        let loaded = DioramaConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.doors.count, 3);
        assert_eq!(loaded.elevator.floors, config.elevator.floors);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
