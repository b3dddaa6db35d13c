use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Whether to install the recorder and serve `/metrics`
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Metrics server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Metrics server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9090
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or_else(|_| default_enabled()),
            host: std::env::var("METRICS_HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_port),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
