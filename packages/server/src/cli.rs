//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::dashboard::DashboardConfig;
use crate::network::{NetworkConfig, DEFAULT_PORT};

/// Shelter dashboard server.
#[derive(Debug, Clone, Parser)]
#[command(name = "shelter-server", version, about)]
pub struct ServerArgs {
    /// Address to bind.
    #[arg(long, env = "SHELTER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "SHELTER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// CSV file imported into the collection before serving.
    #[arg(long, env = "SHELTER_SEED_CSV")]
    pub seed_csv: Option<PathBuf>,

    /// Maximum records fetched per dashboard query (0 for no limit).
    #[arg(long, env = "SHELTER_FETCH_LIMIT", default_value_t = 2000)]
    pub fetch_limit: usize,

    /// Seconds a dashboard session may sit idle before it is dropped.
    #[arg(long, env = "SHELTER_SESSION_IDLE_SECS", default_value_t = 1800)]
    pub session_idle_secs: u64,

    /// Maximum open dashboard sessions.
    #[arg(long, env = "SHELTER_MAX_SESSIONS", default_value_t = 1024)]
    pub max_sessions: usize,

    /// Name of the animal collection.
    #[arg(long, env = "SHELTER_COLLECTION", default_value = "animals")]
    pub collection: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SHELTER_LOG_JSON")]
    pub log_json: bool,
}

impl ServerArgs {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            ..NetworkConfig::default()
        }
    }

    #[must_use]
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            fetch_limit: self.fetch_limit,
            session_idle_timeout: Duration::from_secs(self.session_idle_secs),
            max_sessions: self.max_sessions,
            ..DashboardConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = ServerArgs::try_parse_from(["shelter-server"]).unwrap();
        assert_eq!(args.port, 8060);
        assert_eq!(args.fetch_limit, 2000);
        assert_eq!(args.collection, "animals");
        assert!(args.seed_csv.is_none());
        assert!(!args.log_json);
        assert_eq!(args.network_config().port, 8060);
        assert_eq!(args.dashboard_config().fetch_limit, 2000);
        assert_eq!(args.dashboard_config(), DashboardConfig::default());
    }

    #[test]
    fn session_limits_are_configurable() {
        let args = ServerArgs::try_parse_from([
            "shelter-server",
            "--session-idle-secs",
            "60",
            "--max-sessions",
            "8",
        ])
        .unwrap();
        let config = args.dashboard_config();
        assert_eq!(config.session_idle_timeout, Duration::from_secs(60));
        assert_eq!(config.max_sessions, 8);
    }

    #[test]
    fn flags_override_defaults() {
        let args = ServerArgs::try_parse_from([
            "shelter-server",
            "--host",
            "127.0.0.1",
            "--port",
            "0",
            "--seed-csv",
            "data/aac_shelter_outcomes.csv",
            "--fetch-limit",
            "50",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(args.network_config().host, "127.0.0.1");
        assert_eq!(args.port, 0);
        assert_eq!(
            args.seed_csv.as_deref(),
            Some(std::path::Path::new("data/aac_shelter_outcomes.csv"))
        );
        assert_eq!(args.dashboard_config().fetch_limit, 50);
        assert!(args.log_json);
    }

    #[test]
    fn zero_fetch_limit_reaches_the_dashboard_as_unlimited() {
        let args = ServerArgs::try_parse_from(["shelter-server", "--fetch-limit", "0"]).unwrap();
        assert_eq!(args.dashboard_config().fetch_limit, 0);
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(ServerArgs::try_parse_from(["shelter-server", "--port", "http"]).is_err());
    }
}
