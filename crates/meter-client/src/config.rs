//! Client configuration.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    client: ClientSettings,
}

/// Settings consumed by the field client binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Ingestion server URL, e.g. `http://localhost:50051`.
    pub server_url: String,
    /// Customer the generated readings are attributed to.
    pub customer_id: i32,
    /// Pause between submission cycles, in milliseconds.
    pub delay_interval_ms: u64,
    /// Username presented when requesting a token.
    pub username: String,
    /// Password presented when requesting a token.
    pub password: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:50051".to_string(),
            customer_id: 1,
            delay_interval_ms: 2_000,
            username: "meteruser".to_string(),
            password: "reading-rocks".to_string(),
        }
    }
}

impl ClientSettings {
    /// Load settings from defaults, `METER_`-prefixed environment variables,
    /// and the optional `config/meter.toml` file.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = PathBuf::from("config/meter.toml");
        let mut figment = Figment::from(Serialized::defaults(ConfigFile::default()))
            .merge(Env::prefixed("METER_").split("__"));

        if config_path.exists() {
            figment = figment.merge(Toml::file(&config_path));
        }

        let settings: ConfigFile = figment.extract()?;
        Ok(settings.client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_server() {
        let settings = ClientSettings::default();
        assert_eq!(settings.server_url, "http://localhost:50051");
        assert!(settings.delay_interval_ms > 0);
    }
}
