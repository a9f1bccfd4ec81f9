//! Runtime configuration read from the environment.
//!
//! | Setting | Primary env var | Fallback env var | Default |
//! |---------|-----------------|------------------|---------|
//! | Gemini API key | `TCGSCOUT_GEMINI_API_KEY` | `GEMINI_API_KEY` | none |
//! | Gemini model | `TCGSCOUT_GEMINI_MODEL` | `GEMINI_MODEL` | `gemini-2.5-flash-lite` |
//! | TCGPlayer client id | `TCGSCOUT_TCGPLAYER_CLIENT_ID` | `TCGPLAYER_CLIENT_ID` | none |
//! | TCGPlayer client secret | `TCGSCOUT_TCGPLAYER_CLIENT_SECRET` | `TCGPLAYER_CLIENT_SECRET` | none |
//! | JustTCG API key | `TCGSCOUT_JUSTTCG_API_KEY` | `JUSTTCG_API_KEY` | none |
//! | Per-source timeout | `TCGSCOUT_SOURCE_TIMEOUT_MS` | - | `8000` |
//! | Failure threshold | `TCGSCOUT_FAILURE_THRESHOLD` | - | `3` |
//! | Probe cooldown | `TCGSCOUT_PROBE_COOLDOWN_SECS` | - | `60` |
//! | Market info lookup | `TCGSCOUT_ENABLE_WEB_SEARCH` | `ENABLE_WEB_SEARCH` | `false` |
//!
//! Blank values count as unset.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::TcgplayerCredentials;
use crate::health::HealthPolicy;
use crate::ConfigError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_millis(8_000);

const GEMINI_API_KEY: &[&str] = &["TCGSCOUT_GEMINI_API_KEY", "GEMINI_API_KEY"];
const GEMINI_MODEL: &[&str] = &["TCGSCOUT_GEMINI_MODEL", "GEMINI_MODEL"];
const TCGPLAYER_CLIENT_ID: &[&str] = &["TCGSCOUT_TCGPLAYER_CLIENT_ID", "TCGPLAYER_CLIENT_ID"];
const TCGPLAYER_CLIENT_SECRET: &[&str] =
    &["TCGSCOUT_TCGPLAYER_CLIENT_SECRET", "TCGPLAYER_CLIENT_SECRET"];
const JUSTTCG_API_KEY: &[&str] = &["TCGSCOUT_JUSTTCG_API_KEY", "JUSTTCG_API_KEY"];
const SOURCE_TIMEOUT_MS: &str = "TCGSCOUT_SOURCE_TIMEOUT_MS";
const FAILURE_THRESHOLD: &str = "TCGSCOUT_FAILURE_THRESHOLD";
const PROBE_COOLDOWN_SECS: &str = "TCGSCOUT_PROBE_COOLDOWN_SECS";
const ENABLE_WEB_SEARCH: &[&str] = &["TCGSCOUT_ENABLE_WEB_SEARCH", "ENABLE_WEB_SEARCH"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub tcgplayer: Option<TcgplayerCredentials>,
    pub justtcg_api_key: Option<String>,
    pub source_timeout: Duration,
    pub health: HealthPolicy,
    pub enable_web_search: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: String::from(DEFAULT_GEMINI_MODEL),
            tcgplayer: None,
            justtcg_api_key: None,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            health: HealthPolicy::default(),
            enable_web_search: false,
        }
    }
}

impl BotConfig {
    /// Reads the process environment. Call `dotenv` first to honour `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; tests pass a map instead of the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.update_from(&lookup)?;
        Ok(config)
    }

    fn update_from<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|key| non_blank(lookup(key)));

        self.gemini_api_key = first(GEMINI_API_KEY);
        if let Some(model) = first(GEMINI_MODEL) {
            self.gemini_model = model;
        }

        self.tcgplayer = match (first(TCGPLAYER_CLIENT_ID), first(TCGPLAYER_CLIENT_SECRET)) {
            (Some(client_id), Some(client_secret)) => Some(TcgplayerCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        self.justtcg_api_key = first(JUSTTCG_API_KEY);

        if let Some(value) = non_blank(lookup(SOURCE_TIMEOUT_MS)) {
            let millis: u64 = parse(SOURCE_TIMEOUT_MS, &value)?;
            if millis == 0 {
                return Err(ConfigError::InvalidValue {
                    key: SOURCE_TIMEOUT_MS,
                    value,
                    reason: String::from("must be greater than zero"),
                });
            }
            self.source_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = non_blank(lookup(FAILURE_THRESHOLD)) {
            let threshold: u32 = parse(FAILURE_THRESHOLD, &value)?;
            if threshold == 0 {
                return Err(ConfigError::InvalidValue {
                    key: FAILURE_THRESHOLD,
                    value,
                    reason: String::from("must be at least 1"),
                });
            }
            self.health.failure_threshold = threshold;
        }
        if let Some(value) = non_blank(lookup(PROBE_COOLDOWN_SECS)) {
            self.health.probe_cooldown = Duration::from_secs(parse(PROBE_COOLDOWN_SECS, &value)?);
        }
        if let Some(value) = ENABLE_WEB_SEARCH
            .iter()
            .find_map(|key| non_blank(lookup(key)))
        {
            self.enable_web_search = value.eq_ignore_ascii_case("true") || value == "1";
        }

        Ok(())
    }

    /// The Gemini key, or the error a command needing image recognition reports.
    pub fn require_gemini_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::MissingKey {
                key: GEMINI_API_KEY[1],
            })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|error: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_owned(),
        reason: error.to_string(),
    })
}
