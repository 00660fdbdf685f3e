use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::notif::{self, RawNotification, ValidationError};

/// Environment variables read by `hdn send`, one per notification field.
pub const ENV_SUMMARY:     &str = "HDN_SUMMARY";
pub const ENV_BODY:        &str = "HDN_BODY";
pub const ENV_URGENCY:     &str = "HDN_URGENCY";
pub const ENV_OBJECT_PATH: &str = "HDN_OBJECT_PATH";
pub const ENV_BUS_NAME:    &str = "HDN_BUS_NAME";
pub const ENV_INTERFACE:   &str = "HDN_INTERFACE";
pub const ENV_MESSAGE_BUS: &str = "HDN_MESSAGE_BUS";
pub const ENV_ICON:        &str = "HDN_ICON";
pub const ENV_EXPIRE:      &str = "HDN_EXPIRE";

const CONFIG_FILE_NAME:   &str = "hdn.toml";
const SYSTEM_CONFIG_FILE: &str = "/etc/hdn.toml";

/// A notification where any field may still be unknown. Flags, environment,
/// the defaults file and JSON documents all produce one of these; they are
/// layered with [`PartialNotification::or`] and finished with
/// [`PartialNotification::complete`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialNotification {
    pub summary:     Option<String>,
    pub body:        Option<String>,
    pub urgency:     Option<String>,
    pub object_path: Option<String>,
    pub bus_name:    Option<String>,
    pub interface:   Option<String>,
    pub message_bus: Option<String>,
    pub icon:        Option<String>,
    pub expire:      Option<u64>,
}

impl PartialNotification {
    /// Fields missing here are taken from `lower`.
    pub fn or(self, lower: PartialNotification) -> PartialNotification {
        PartialNotification {
            summary:     self.summary.or(lower.summary),
            body:        self.body.or(lower.body),
            urgency:     self.urgency.or(lower.urgency),
            object_path: self.object_path.or(lower.object_path),
            bus_name:    self.bus_name.or(lower.bus_name),
            interface:   self.interface.or(lower.interface),
            message_bus: self.message_bus.or(lower.message_bus),
            icon:        self.icon.or(lower.icon),
            expire:      self.expire.or(lower.expire),
        }
    }

    /// Fills the fields that are still missing from the `HDN_*` variables.
    /// A variable is only looked at (and `HDN_EXPIRE` only parsed) when the
    /// field is unset. A variable set to the empty string counts as unset.
    pub fn or_env<E>(self, lookup: E) -> Result<PartialNotification, ValidationError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let expire = match self.expire {
            Some(expire) => Some(expire),
            None         => env(ENV_EXPIRE).map(|value| parse_expire(&value)).transpose()?,
        };

        Ok(PartialNotification {
            summary:     self.summary.or_else(|| env(ENV_SUMMARY)),
            body:        self.body.or_else(|| env(ENV_BODY)),
            urgency:     self.urgency.or_else(|| env(ENV_URGENCY)),
            object_path: self.object_path.or_else(|| env(ENV_OBJECT_PATH)),
            bus_name:    self.bus_name.or_else(|| env(ENV_BUS_NAME)),
            interface:   self.interface.or_else(|| env(ENV_INTERFACE)),
            message_bus: self.message_bus.or_else(|| env(ENV_MESSAGE_BUS)),
            icon:        self.icon.or_else(|| env(ENV_ICON)),
            expire,
        })
    }

    /// Backfills built-in defaults. Summary and body have none.
    pub fn complete(self) -> Result<RawNotification, ValidationError> {
        let summary = self.summary.ok_or(ValidationError::MissingOption("summary"))?;
        let body    = self.body.ok_or(ValidationError::MissingOption("body"))?;
        let default = |value: Option<String>, fallback: &str| value.unwrap_or_else(|| fallback.to_owned());

        Ok(RawNotification {
            summary,
            body,
            urgency:     default(self.urgency, notif::DEFAULT_URGENCY),
            object_path: default(self.object_path, notif::DEFAULT_OBJECT_PATH),
            bus_name:    default(self.bus_name, notif::DEFAULT_BUS_NAME),
            interface:   default(self.interface, notif::DEFAULT_INTERFACE),
            message_bus: default(self.message_bus, notif::DEFAULT_MESSAGE_BUS),
            icon:        default(self.icon, notif::DEFAULT_ICON),
            expire:      self.expire.unwrap_or(notif::DEFAULT_EXPIRE),
        })
    }
}

/// Expiration as given on the command line or in `HDN_EXPIRE`.
pub fn parse_expire(value: &str) -> Result<u64, ValidationError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidExpiration(value.to_owned()))
}

/// Lookup used outside of tests.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// User defaults read from a TOML file with the same keys as a JSON document.
#[derive(Debug, Default, PartialEq)]
pub struct Config {
    pub defaults: PartialNotification,
}

impl Config {
    /// `explicit` must be readable. Without it the user config dir and then
    /// /etc are tried, and a missing file just means built-in defaults.
    pub fn new(explicit: Option<&Path>) -> Result<Config, failure::Error> {
        if let Some(path) = explicit {
            let contents = fs::read_to_string(path)
                .map_err(|e| failure::format_err!("could not read {}: {}", path.display(), e))?;
            return Config::from_toml(&contents, path);
        }

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(mut user_config) = dirs::config_dir() {
            user_config.push(CONFIG_FILE_NAME);
            candidates.push(user_config);
        }
        candidates.push(PathBuf::from(SYSTEM_CONFIG_FILE));

        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                return Config::from_toml(&contents, path);
            }
        }

        debug!("no defaults file found, using built-in defaults");
        Ok(Config::default())
    }

    fn from_toml(contents: &str, path: &Path) -> Result<Config, failure::Error> {
        debug!("reading defaults from {}", path.display());
        let defaults = toml::from_str(contents)
            .map_err(|e| failure::format_err!("invalid defaults file {}: {}", path.display(), e))?;
        Ok(Config { defaults })
    }

    /// Named-option path: flag > environment > defaults file > built-in.
    pub fn resolve<E>(&self, flags: PartialNotification, env: E) -> Result<RawNotification, ValidationError>
    where
        E: Fn(&str) -> Option<String>,
    {
        flags.or_env(env)?.or(self.defaults.clone()).complete()
    }
}
