use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Reconciliation policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Allowed line variance before a discrepancy is flagged, in percent
    pub tolerance_pct: BigDecimal,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            policy: PolicyConfig {
                tolerance_pct: BigDecimal::from(5),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            policy: PolicyConfig {
                tolerance_pct: std::env::var("MATCH_TOLERANCE_PCT")
                    .ok()
                    .and_then(|v| BigDecimal::from_str(&v).ok())
                    .unwrap_or_else(|| BigDecimal::from(5)),
            },
        }
    }
}
