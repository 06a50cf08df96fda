//! Network-policy filter injection into listeners under construction.
//!
//! # Architecture
//!
//! A listener build flows through four steps, all inside
//! [`configure_listener`]:
//!
//! - eligibility gate on the proxy role
//! - consistency check between listener chains and chain views
//! - per-chain decision ([`dispatch::decide`]) over the effective protocol
//! - attachment of the prebuilt filters
//!
//! The host control plane drives this through the [`ListenerPlugin`] hooks,
//! implemented by [`NetworkPolicyPlugin`].
//!
//! # Example
//!
//! ```rust,ignore
//! use netpolicy_injector::xds::filters::injection::{ListenerPlugin, NetworkPolicyPlugin};
//!
//! let plugin = NetworkPolicyPlugin::new(PluginConfig::default())?;
//! let outcome = plugin.on_inbound_listener(&proxy, &mut mutable)?;
//! let listener = mutable.into_listener()?;
//! ```

pub mod dispatch;
mod listener;
mod mutable;

pub use dispatch::{decide, plan, ChainAction, EffectiveProtocol};
pub use listener::{configure_listener, is_eligible, InjectionOutcome};
pub use mutable::{FilterChainView, MutableListener};

use crate::config::PluginConfig;
use crate::domain::{ListenerDirection, ProxyDescriptor};
use crate::Result;
use std::sync::Arc;

/// Hook points the host control plane calls while building listeners.
pub trait ListenerPlugin: Send + Sync {
    /// A listener accepting traffic for the workload was built
    fn on_inbound_listener(
        &self,
        proxy: &ProxyDescriptor,
        mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome>;

    /// A listener carrying traffic out of the workload was built
    fn on_outbound_listener(
        &self,
        proxy: &ProxyDescriptor,
        mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome>;

    /// A virtual (capture-all) listener was built
    fn on_virtual_listener(
        &self,
        proxy: &ProxyDescriptor,
        mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome>;

    /// The inbound passthrough listener was built
    fn on_inbound_passthrough(
        &self,
        _proxy: &ProxyDescriptor,
        _mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome> {
        Ok(InjectionOutcome::unchanged())
    }

    /// An outbound passthrough filter chain was built
    fn on_outbound_passthrough_filter_chain(
        &self,
        _proxy: &ProxyDescriptor,
        _mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome> {
        Ok(InjectionOutcome::unchanged())
    }
}

/// Injects the connection-metadata and policy filters the network-policy
/// engine reads.
///
/// Holds only immutable configuration, so one instance can serve every
/// listener build concurrently.
#[derive(Debug, Clone)]
pub struct NetworkPolicyPlugin {
    config: Arc<PluginConfig>,
}

impl NetworkPolicyPlugin {
    /// Create a plugin after validating its configuration
    pub fn new(config: PluginConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config: Arc::new(config) })
    }

    /// Create a plugin from a shared configuration, validating it first
    pub fn from_shared(config: Arc<PluginConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }
}

impl ListenerPlugin for NetworkPolicyPlugin {
    fn on_inbound_listener(
        &self,
        proxy: &ProxyDescriptor,
        mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome> {
        configure_listener(&self.config, ListenerDirection::Inbound, proxy, mutable)
    }

    fn on_outbound_listener(
        &self,
        proxy: &ProxyDescriptor,
        mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome> {
        configure_listener(&self.config, ListenerDirection::Outbound, proxy, mutable)
    }

    // Virtual listeners capture outbound traffic, even "virtualInbound"
    fn on_virtual_listener(
        &self,
        proxy: &ProxyDescriptor,
        mutable: &mut MutableListener,
    ) -> Result<InjectionOutcome> {
        configure_listener(&self.config, ListenerDirection::Outbound, proxy, mutable)
    }
}
