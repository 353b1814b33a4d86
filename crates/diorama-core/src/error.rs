//! Core error types for the diorama.

/// A specialized Result type for diorama operations.
pub type DioramaResult<T> = Result<T, DioramaError>;

/// Top-level error type encompassing all diorama subsystems.
///
/// None of these are transient: each one is a programming or configuration
/// mistake and is reported as soon as it is detected.
#[derive(Debug, thiserror::Error)]
pub enum DioramaError {
    #[error("actor '{actor}' has no floor {floor}")]
    InvalidFloor { actor: String, floor: u8 },

    #[error("invalid tween parameters: {0}")]
    InvalidTweenParameters(String),

    #[error("actor '{actor}' does not support action '{action}'")]
    UnsupportedAction { actor: String, action: String },

    #[error("unknown actor: {0}")]
    UnknownActor(String),

    #[error("unknown schedule: {0}")]
    UnknownSchedule(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("scene validation error: {0}")]
    SceneValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl DioramaError {
    /// Create an invalid-floor error.
    pub fn invalid_floor(actor: impl Into<String>, floor: u8) -> Self {
        DioramaError::InvalidFloor {
            actor: actor.into(),
            floor,
        }
    }

    /// Create an unsupported-action error.
    pub fn unsupported(actor: impl Into<String>, action: impl Into<String>) -> Self {
        DioramaError::UnsupportedAction {
            actor: actor.into(),
            action: action.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_floor_display() {
        let err = DioramaError::invalid_floor("elevator", 3);
        assert_eq!(err.to_string(), "actor 'elevator' has no floor 3");
    }

    #[test]
    fn test_unsupported_action_display() {
        let err = DioramaError::unsupported("door-0", "go_to_floor(2)");
        assert!(err.to_string().contains("door-0"));
        assert!(err.to_string().contains("go_to_floor(2)"));
    }
}
