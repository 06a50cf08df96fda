//! # netpolicy-injector
//!
//! Listener plugin for an Envoy service-mesh control plane. While listeners
//! are being built for a proxy, it injects the two filters a companion
//! network-policy engine reads:
//!
//! - a connection-metadata listener filter (`cilium.bpf_metadata`)
//! - an L7 policy HTTP filter (`cilium.l7policy`) on every qualifying chain
//!
//! ## Architecture
//!
//! ```text
//! Eligibility Gate → Consistency Check → Protocol Dispatcher → Filter Builders → Encoding Adapter
//! ```
//!
//! Each listener build is synchronous and self-contained; the plugin only
//! holds immutable configuration and can be shared across worker threads.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netpolicy_injector::domain::ProxyDescriptor;
//! use netpolicy_injector::{ListenerPlugin, MutableListener, NetworkPolicyPlugin, PluginConfig};
//!
//! fn build(mut mutable: MutableListener) -> netpolicy_injector::Result<()> {
//!     let plugin = NetworkPolicyPlugin::new(PluginConfig::from_env()?)?;
//!     let proxy = ProxyDescriptor::sidecar("sidecar~10.0.0.1~web.default");
//!     plugin.on_inbound_listener(&proxy, &mut mutable)?;
//!     let _listener = mutable.into_listener()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod xds;

// Re-export commonly used types and traits
pub use config::{ListenerFilterPolicy, ObservabilityConfig, PluginConfig};
pub use errors::{Error, Result};
pub use observability::init_logging;
pub use xds::filters::injection::{
    configure_listener, FilterChainView, InjectionOutcome, ListenerPlugin, MutableListener,
    NetworkPolicyPlugin,
};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
