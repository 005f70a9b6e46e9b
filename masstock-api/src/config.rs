use std::net::{IpAddr, SocketAddr};

/// HTTP server settings. `Default` suits local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the environment.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `MASSTOCK_HOST`                 | `0.0.0.0`               |
    /// | `MASSTOCK_PORT`                 | `8080`                  |
    /// | `MASSTOCK_CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `MASSTOCK_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MASSTOCK_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("MASSTOCK_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                var: "MASSTOCK_PORT",
                value: port.clone(),
            })?;
        }
        if let Ok(origins) = std::env::var("MASSTOCK_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(secs) = std::env::var("MASSTOCK_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs.parse().map_err(|_| ConfigError::Invalid {
                var: "MASSTOCK_REQUEST_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            var: "MASSTOCK_HOST",
            value: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
