//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerSettings,
}

/// Settings consumed by the ingestion server binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the gRPC listener binds to.
    pub bind_address: IpAddr,
    /// Port the gRPC listener binds to.
    pub port: u16,
    /// HS256 signing secret for issued bearer tokens.
    pub jwt_secret: String,
    /// How long issued tokens stay valid.
    pub token_lifetime_secs: i64,
    /// Username accepted by the static credential verifier.
    pub username: String,
    /// Password accepted by the static credential verifier.
    pub password: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 50051,
            jwt_secret: "development-secret-change-me".to_string(),
            token_lifetime_secs: 3600,
            username: "meteruser".to_string(),
            password: "reading-rocks".to_string(),
        }
    }
}

impl ServerSettings {
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
        Ok(settings.server)
    }

    /// Socket address the server listens on.
    pub fn bind_socket(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind_socket_is_local() {
        let settings = ServerSettings::default();
        let socket = settings.bind_socket();
        assert!(socket.ip().is_loopback());
        assert_eq!(socket.port(), 50051);
    }
}
