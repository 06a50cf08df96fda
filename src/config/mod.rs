//! # Configuration Management
//!
//! Configuration for the injection plugin and its logging. Filter names, the
//! access log socket and the attachment policy are deployment choices, so they
//! live here instead of in constants baked into the builders.

mod settings;

pub use settings::{ListenerFilterPolicy, ObservabilityConfig, PluginConfig};

/// Default listener filter name expected by the policy engine
pub const DEFAULT_LISTENER_FILTER_NAME: &str = "cilium.bpf_metadata";

/// Default HTTP filter name expected by the policy engine
pub const DEFAULT_HTTP_FILTER_NAME: &str = "cilium.l7policy";

/// Default access log socket the HTTP filter reports to
pub const DEFAULT_ACCESS_LOG_PATH: &str = "/var/run/cilium/access_log.sock";

/// Environment variable prefix for all plugin settings
pub const ENV_PREFIX: &str = "NETPOLICY_";
