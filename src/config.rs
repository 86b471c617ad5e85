// ⚙️ Gateway configuration - environment driven, with defaults for everything

use crate::catalog::StockCatalog;
use crate::classifier::TopicClassifier;
use crate::proxy::ForwarderConfig;
use crate::rules::RuleSet;
use anyhow::{Context as AnyhowContext, Result};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Interface to bind the HTTP server to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,

    /// JSON rule table replacing the built-in one
    pub rules_path: Option<PathBuf>,

    /// CSV catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,

    pub forwarder: ForwarderConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        dotenv().ok();

        let port = env::var("GATEWAY_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(3000);

        GatewayConfig {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rules_path: non_empty_path("STOCK_RULES_PATH"),
            catalog_path: non_empty_path("STOCK_CATALOG_PATH"),
            forwarder: ForwarderConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the classifier from the configured data assets, falling back to
    /// the embedded rule table and catalog.
    pub fn build_classifier(&self) -> Result<TopicClassifier> {
        let rules = match &self.rules_path {
            Some(path) => RuleSet::from_file(path)?,
            None => RuleSet::builtin()?,
        };

        let catalog = match &self.catalog_path {
            Some(path) => StockCatalog::from_file(path)?,
            None => StockCatalog::builtin()?,
        };

        TopicClassifier::new(rules, catalog).context("Failed to build topic classifier")
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` wins when set; otherwise `log_level` applies to everything.
    /// Output goes to stderr so CLI `--json` output stays clean.
    pub fn init_logging(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.log_level.to_lowercase()))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            rules_path: None,
            catalog_path: None,
            forwarder: ForwarderConfig::default(),
        }
    }
}

fn non_empty_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}
