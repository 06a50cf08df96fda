//! Mutable listener state handed to the plugin by the listener builder.

use crate::domain::ListenerProtocol;
use crate::xds::helpers::ListenerModifier;
use crate::Result;
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::HttpFilter;
use std::sync::Arc;
use tracing::debug;

/// Plugin-side view of one physical filter chain.
#[derive(Debug, Clone, Default)]
pub struct FilterChainView {
    /// Raw protocol tag from the upstream protocol detection stage
    pub listener_protocol: i32,
    /// Chain-level detection found HTTP inside a TCP (TLS-terminated) stream
    pub tls_terminated_http: bool,
    /// HTTP filters to add to this chain's connection manager, in order
    pub http_filters: Vec<Arc<HttpFilter>>,
}

impl FilterChainView {
    pub fn new(protocol: ListenerProtocol) -> Self {
        Self::from_raw_tag(protocol.tag())
    }

    /// Create a view from an upstream tag that may be outside the enumeration
    pub fn from_raw_tag(tag: i32) -> Self {
        Self { listener_protocol: tag, tls_terminated_http: false, http_filters: Vec::new() }
    }

    pub fn with_tls_terminated_http(mut self, tls_terminated_http: bool) -> Self {
        self.tls_terminated_http = tls_terminated_http;
        self
    }

    /// Decode the protocol tag
    pub fn protocol(&self) -> Result<ListenerProtocol> {
        ListenerProtocol::try_from(self.listener_protocol)
    }
}

/// A listener under construction together with its per-chain views.
///
/// `listener.filter_chains` and `filter_chains` are two parallel views of the
/// same chains and must have the same length.
#[derive(Debug, Clone)]
pub struct MutableListener {
    pub listener: Listener,
    pub filter_chains: Vec<FilterChainView>,
}

impl MutableListener {
    pub fn new(listener: Listener, filter_chains: Vec<FilterChainView>) -> Self {
        Self { listener, filter_chains }
    }

    pub fn name(&self) -> &str {
        &self.listener.name
    }

    /// Verify the listener chains and the views line up.
    pub fn check_consistency(&self) -> Result<()> {
        let listener_chains = self.listener.filter_chains.len();
        let view_chains = self.filter_chains.len();

        if listener_chains != view_chains {
            return Err(crate::Error::invariant_violation(
                self.name(),
                listener_chains,
                view_chains,
            ));
        }

        Ok(())
    }

    /// Materialize the per-chain HTTP filters into the listener.
    ///
    /// Each view's filters go into the connection manager of the chain at the
    /// same index, ahead of the router. A view holding filters for a chain
    /// without a connection manager is an error.
    pub fn into_listener(self) -> Result<Listener> {
        self.check_consistency()?;

        let mut modifier = ListenerModifier::new(self.listener);
        for (idx, view) in self.filter_chains.iter().enumerate() {
            if view.http_filters.is_empty() {
                continue;
            }
            if !modifier.chain_has_hcm(idx) {
                return Err(crate::Error::internal(format!(
                    "listener '{}' chain {} has HTTP filters but no HTTP connection manager",
                    modifier.name(),
                    idx
                )));
            }

            let filters: Vec<HttpFilter> =
                view.http_filters.iter().map(|f| (**f).clone()).collect();
            modifier.insert_http_filters(idx, &filters)?;
        }

        debug!(
            listener = %modifier.name(),
            modified = modifier.is_modified(),
            "Finalized listener filter chains"
        );
        Ok(modifier.into_inner())
    }
}
