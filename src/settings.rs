use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::probe::{DEFAULT_CHECK_COMMAND, DEFAULT_COMMUNITY};

pub const DEFAULT_CONFIG_FILE: &str = "ups-status.toml";

// Environment variables override the config file, e.g. `UPS_STATUS_HOST`.
const ENV_PREFIX: &str = "UPS_STATUS_";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub command: String,
    pub community: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            command: DEFAULT_CHECK_COMMAND.to_string(),
            community: DEFAULT_COMMUNITY.to_string(),
            host: None,
        }
    }
}

impl Settings {
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Settings, figment::Error> {
        Settings::figment(path).extract()
    }
}
