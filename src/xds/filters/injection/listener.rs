//! Listener-level policy filter injection.
//!
//! One call handles one listener build: gate on the proxy role, check the
//! chain views against the listener, decide every chain, then attach the
//! prebuilt filters. Nothing is mutated until every fallible step has passed.

use super::dispatch::{plan, ChainAction};
use super::mutable::MutableListener;
use crate::config::{ListenerFilterPolicy, PluginConfig};
use crate::domain::{ListenerDirection, ProxyDescriptor, ProxyRole};
use crate::xds::filters::network_policy::PolicyFilters;
use crate::xds::helpers::ListenerModifier;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What a single listener build changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionOutcome {
    /// Chains that received the policy HTTP filter
    pub chains_injected: usize,
    /// Whether the connection-metadata listener filter was newly attached
    pub listener_filter_attached: bool,
}

impl InjectionOutcome {
    /// Nothing was touched
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_unchanged(&self) -> bool {
        self.chains_injected == 0 && !self.listener_filter_attached
    }
}

/// Whether a proxy takes part in injection at all.
pub fn is_eligible(role: ProxyRole, config: &PluginConfig) -> bool {
    match role {
        ProxyRole::Sidecar => true,
        ProxyRole::Router => config.gateway_injection,
        ProxyRole::Other => false,
    }
}

/// Inject the policy filters into one listener.
///
/// Ineligible proxies and listeners with no qualifying chains are silent
/// no-ops. A chain count mismatch or an unknown protocol tag fails the build
/// with the listener untouched.
pub fn configure_listener(
    config: &PluginConfig,
    direction: ListenerDirection,
    proxy: &ProxyDescriptor,
    mutable: &mut MutableListener,
) -> Result<InjectionOutcome> {
    let span = crate::injection_span!(mutable.name(), proxy.id, direction, role = %proxy.role);
    let _enter = span.enter();

    if !is_eligible(proxy.role, config) {
        debug!("Proxy role not eligible for policy injection, skipping");
        return Ok(InjectionOutcome::unchanged());
    }

    if let Err(e) = mutable.check_consistency() {
        error!(error = %e, "Filter chain views diverged from listener filter chains");
        return Err(e);
    }

    let decisions = plan(proxy.role, direction, &mutable.filter_chains)?;

    let attach_always = proxy.role == ProxyRole::Sidecar
        && config.listener_filter_policy == ListenerFilterPolicy::AlwaysForSidecar;
    let wants_http = decisions.iter().any(|(_, action)| *action == ChainAction::InjectPolicy);
    if !wants_http && !attach_always {
        debug!(chains = decisions.len(), "No chain qualifies for policy injection");
        return Ok(InjectionOutcome::unchanged());
    }

    let encoding = config.effective_encoding(proxy.encoding);
    let filters = PolicyFilters::build(config, direction, encoding)?;

    let mut outcome = InjectionOutcome::unchanged();
    for (chain_index, (view, (protocol, action))) in
        mutable.filter_chains.iter_mut().zip(decisions).enumerate()
    {
        if action != ChainAction::InjectPolicy {
            debug!(chain_index, %protocol, "Leaving chain without policy filter");
            continue;
        }

        if view.http_filters.iter().any(|f| f.name == filters.http_filter.name) {
            debug!(chain_index, %protocol, filter = %filters.http_filter.name, "Policy filter already present");
            continue;
        }

        view.http_filters.push(Arc::clone(&filters.http_filter));
        outcome.chains_injected += 1;
        debug!(chain_index, %protocol, filter = %filters.http_filter.name, "Injected policy filter");
    }

    if outcome.chains_injected > 0 || attach_always {
        let mut modifier = ListenerModifier::new(std::mem::take(&mut mutable.listener));
        outcome.listener_filter_attached =
            modifier.add_listener_filter(filters.listener_filter, true);
        mutable.listener = modifier.into_inner();
    }

    info!(
        chains_injected = outcome.chains_injected,
        listener_filter_attached = outcome.listener_filter_attached,
        %encoding,
        "Network policy filters injected"
    );

    Ok(outcome)
}
