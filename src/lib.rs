// Autopost Gateway - Core Library
// Stock-tag classification for trending topics and the backend reverse proxy,
// shared by the CLI, the HTTP server, and tests

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod proxy;
pub mod rules;
pub mod tags;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use catalog::{StockCatalog, StockEntry};
pub use classifier::{SelectionMode, TopicClassifier};
pub use config::GatewayConfig;
pub use proxy::{
    ErrorEnvelope, Forwarder, ForwarderConfig, ProxyError, ProxyRequest, ProxyResponse,
    DEFAULT_UPSTREAM_ORIGIN,
};
pub use rules::{KeywordRule, RuleKind, RuleSet};
pub use tags::{StockTag, TagOrigin};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
