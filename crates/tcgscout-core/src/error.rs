use thiserror::Error;

/// Validation and contract errors exposed by `tcgscout-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid game '{value}', expected one of pokemon, onepiece, yugioh, other")]
    InvalidGame { value: String },
    #[error("invalid confidence '{value}', expected one of high, medium, low, manual")]
    InvalidConfidence { value: String },
    #[error("invalid source '{value}', expected one of pokemon_tcg, tcgplayer, justtcg, optcg")]
    InvalidSource { value: String },
    #[error("a manual lookup needs a card name or a card number")]
    EmptyLookup,
}

/// Errors raised while reading runtime configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {key} is required for this command")]
    MissingKey { key: &'static str },
    #[error("environment variable {key} has invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures of the image recognition call, other than quota exhaustion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisionError {
    #[error("could not download card image: {message}")]
    ImageDownload { message: String },
    #[error("recognition request failed: {message}")]
    Transport { message: String },
    #[error("recognition service returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },
    #[error("recognition reply could not be read: {message}")]
    Malformed { message: String },
}
