//! Simulator configuration, read from environment variables.
//!
//! | Variable                     | Default  |
//! |------------------------------|----------|
//! | `ROOMCHAIN_PLAYERS`          | `2`      |
//! | `ROOMCHAIN_GRACE_DELAY_MS`   | `3000`   |
//! | `ROOMCHAIN_POPUP_SECS`       | `3`      |
//! | `ROOMCHAIN_SPAWN_LATENCY_MS` | `250`    |
//! | `ROOMCHAIN_SPAWN_OFFSET`     | `0,0,50` |
//! | `ROOMCHAIN_FAILING_ASSETS`   | empty    |

use std::str::FromStr;
use std::time::Duration;

use roomchain_core::handles::AssetRef;
use roomchain_core::math::Vec3;
use roomchain_rooms::application::manager::{DEFAULT_GRACE_DELAY, DEFAULT_POPUP_DURATION};
use roomchain_rooms::domain::aggregates::DEFAULT_SPAWN_OFFSET;

use crate::error::SimError;

/// Settings for one simulated walkthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of players walked through the house together.
    pub players: usize,
    /// Delay before a vacated room is despawned.
    pub grace_delay: Duration,
    /// Popup display time.
    pub popup_duration: Duration,
    /// Simulated duration of every spawn and delete.
    pub spawn_latency: Duration,
    /// Distance between consecutive rooms.
    pub spawn_offset: Vec3,
    /// Assets the simulated world refuses to spawn.
    pub failing_assets: Vec<AssetRef>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 2,
            grace_delay: DEFAULT_GRACE_DELAY,
            popup_duration: DEFAULT_POPUP_DURATION,
            spawn_latency: Duration::from_millis(250),
            spawn_offset: DEFAULT_SPAWN_OFFSET,
            failing_assets: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, SimError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset keys.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SimError> {
        let defaults = Self::default();

        let players = parse_or(&lookup, "ROOMCHAIN_PLAYERS", defaults.players)?;
        if players == 0 {
            return Err(SimError::Config(
                "ROOMCHAIN_PLAYERS must be at least 1".to_owned(),
            ));
        }

        let grace_delay = lookup("ROOMCHAIN_GRACE_DELAY_MS")
            .map(|raw| parse::<u64>("ROOMCHAIN_GRACE_DELAY_MS", &raw).map(Duration::from_millis))
            .transpose()?
            .unwrap_or(defaults.grace_delay);
        let popup_duration = lookup("ROOMCHAIN_POPUP_SECS")
            .map(|raw| parse::<u64>("ROOMCHAIN_POPUP_SECS", &raw).map(Duration::from_secs))
            .transpose()?
            .unwrap_or(defaults.popup_duration);
        let spawn_latency = lookup("ROOMCHAIN_SPAWN_LATENCY_MS")
            .map(|raw| parse::<u64>("ROOMCHAIN_SPAWN_LATENCY_MS", &raw).map(Duration::from_millis))
            .transpose()?
            .unwrap_or(defaults.spawn_latency);
        let spawn_offset = lookup("ROOMCHAIN_SPAWN_OFFSET")
            .map(|raw| parse_vec3("ROOMCHAIN_SPAWN_OFFSET", &raw))
            .transpose()?
            .unwrap_or(defaults.spawn_offset);
        let failing_assets = lookup("ROOMCHAIN_FAILING_ASSETS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|asset| !asset.is_empty())
                    .map(AssetRef::new)
                    .collect()
            })
            .unwrap_or(defaults.failing_assets);

        Ok(Self {
            players,
            grace_delay,
            popup_duration,
            spawn_latency,
            spawn_offset,
            failing_assets,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, SimError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| SimError::Config(format!("{key} must be a valid number: {e}")))
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, SimError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| parse(key, &raw))
}

fn parse_vec3(key: &str, raw: &str) -> Result<Vec3, SimError> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(SimError::Config(format!(
            "{key} must have three comma-separated components, got {raw:?}"
        )));
    };
    Ok(Vec3::new(parse(key, x)?, parse(key, y)?, parse(key, z)?))
}
