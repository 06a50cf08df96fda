//! Common test utilities for all integration tests.
//!
//! Builds listeners with parallel chain views and reads back what the
//! injection left on them.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use envoy_types::pb::envoy::config::listener::v3::{filter, Filter, FilterChain, Listener};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    HttpConnectionManager, HttpFilter,
};
use netpolicy_injector::domain::ListenerProtocol;
use netpolicy_injector::xds::filters::any_from_message;
use netpolicy_injector::xds::helpers::{
    ListenerModifier, HTTP_CONNECTION_MANAGER_FILTER_NAME, ROUTER_FILTER_NAME,
};
use netpolicy_injector::{FilterChainView, MutableListener};

pub const HCM_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";

pub fn http_chain() -> FilterChain {
    let hcm = HttpConnectionManager {
        stat_prefix: "inbound_http".to_string(),
        http_filters: vec![HttpFilter {
            name: ROUTER_FILTER_NAME.to_string(),
            config_type: None,
            is_optional: false,
            disabled: false,
        }],
        ..Default::default()
    };

    FilterChain {
        filters: vec![Filter {
            name: HTTP_CONNECTION_MANAGER_FILTER_NAME.to_string(),
            config_type: Some(filter::ConfigType::TypedConfig(any_from_message(
                HCM_TYPE_URL,
                &hcm,
            ))),
        }],
        ..Default::default()
    }
}

pub fn tcp_chain() -> FilterChain {
    FilterChain {
        filters: vec![Filter {
            name: "envoy.filters.network.tcp_proxy".to_string(),
            config_type: None,
        }],
        ..Default::default()
    }
}

/// A listener whose physical chains match the given views one to one.
pub fn listener_for(name: &str, views: Vec<FilterChainView>) -> MutableListener {
    let filter_chains = views
        .iter()
        .map(|view| match view.protocol() {
            Ok(protocol) if protocol.is_http_capable() || view.tls_terminated_http => {
                http_chain()
            }
            _ => tcp_chain(),
        })
        .collect();

    let listener = Listener { name: name.to_string(), filter_chains, ..Default::default() };
    MutableListener::new(listener, views)
}

/// Shorthand for views built from known protocols
pub fn views(protocols: &[ListenerProtocol]) -> Vec<FilterChainView> {
    protocols.iter().map(|p| FilterChainView::new(*p)).collect()
}

/// HTTP filter names in the HCM of one finalized chain
pub fn hcm_filter_names(listener: &Listener, chain_idx: usize) -> Vec<String> {
    ListenerModifier::new(listener.clone())
        .chain_http_filters(chain_idx)
        .expect("decode chain HCM")
        .into_iter()
        .map(|f| f.name)
        .collect()
}
