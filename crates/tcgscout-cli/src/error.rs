use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tcgscout_core::ValidationError),

    #[error(transparent)]
    Config(#[from] tcgscout_core::ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcgscout_core::ConfigError;

    #[test]
    fn argument_and_config_problems_exit_with_two() {
        let missing = CliError::from(ConfigError::MissingKey {
            key: "GEMINI_API_KEY",
        });
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(
            missing.to_string(),
            "environment variable GEMINI_API_KEY is required for this command"
        );

        let empty = CliError::from(tcgscout_core::ValidationError::EmptyLookup);
        assert_eq!(empty.exit_code(), 2);
    }
}
