//! `render` command: run one listener build offline and report what was
//! injected.
//!
//! The input document describes the proxy, the hook being invoked and the
//! listener's filter chains:
//!
//! ```yaml
//! proxy:
//!   role: sidecar
//!   id: sidecar~10.0.0.1~web.default
//!   encoding: legacy_struct
//! hook: inbound
//! listener: virtualInbound
//! chains:
//!   - protocol: http
//!   - protocol: tcp
//!     tls_terminated_http: true
//!   - protocol: 7        # raw upstream tag
//! ```

use crate::config::PluginConfig;
use crate::domain::{EncodingCapability, ListenerProtocol, ProxyDescriptor};
use crate::xds::filters::encoding::detect_encoding;
use crate::xds::filters::injection::{
    FilterChainView, InjectionOutcome, ListenerPlugin, MutableListener, NetworkPolicyPlugin,
};
use crate::xds::filters::network_policy::{ConnectionMetadataConfig, L7PolicyConfig};
use crate::xds::filters::{any_from_message, TypedConfig};
use crate::xds::helpers::{
    ListenerModifier, HTTP_CONNECTION_MANAGER_FILTER_NAME, ROUTER_FILTER_NAME,
};
use crate::{Error, Result};
use envoy_types::pb::envoy::config::listener::v3::{
    filter, listener_filter, Filter, FilterChain, Listener,
};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_filter, HttpConnectionManager, HttpFilter,
};
use envoy_types::pb::google::protobuf::Any;
use serde::{Deserialize, Serialize};
use std::fmt;

const HCM_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
const TCP_PROXY_FILTER_NAME: &str = "envoy.filters.network.tcp_proxy";

/// Plugin hook to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    Inbound,
    #[default]
    Outbound,
    Virtual,
    InboundPassthrough,
    OutboundPassthrough,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Inbound => write!(f, "inbound"),
            Hook::Outbound => write!(f, "outbound"),
            Hook::Virtual => write!(f, "virtual"),
            Hook::InboundPassthrough => write!(f, "inbound_passthrough"),
            Hook::OutboundPassthrough => write!(f, "outbound_passthrough"),
        }
    }
}

/// Chain protocol as written in the input: a name or a raw tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProtocolSpec {
    Tag(i32),
    Name(String),
}

impl ProtocolSpec {
    /// Raw tag carried on the chain view
    pub fn tag(&self) -> Result<i32> {
        match self {
            ProtocolSpec::Tag(tag) => Ok(*tag),
            ProtocolSpec::Name(name) => Ok(name.parse::<ListenerProtocol>()?.tag()),
        }
    }
}

/// One filter chain of the input listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub protocol: ProtocolSpec,

    /// HTTP detected inside the TLS-terminated TCP stream
    #[serde(default)]
    pub tls_terminated_http: bool,

    /// Whether the physical chain carries an HTTP connection manager.
    /// Defaults to true for HTTP-capable and TLS-terminated HTTP chains.
    #[serde(default)]
    pub hcm: Option<bool>,
}

/// A complete render request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub proxy: ProxyDescriptor,
    #[serde(default)]
    pub hook: Hook,
    pub listener: String,
    #[serde(default)]
    pub chains: Vec<ChainSpec>,
}

impl RenderRequest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Build the listener and its parallel chain views
    pub fn to_mutable_listener(&self) -> Result<MutableListener> {
        let mut physical = Vec::with_capacity(self.chains.len());
        let mut views = Vec::with_capacity(self.chains.len());

        for chain in &self.chains {
            let tag = chain.protocol.tag()?;
            let http_capable =
                ListenerProtocol::try_from(tag).map(ListenerProtocol::is_http_capable);
            let with_hcm = chain
                .hcm
                .unwrap_or(chain.tls_terminated_http || matches!(http_capable, Ok(true)));

            physical.push(if with_hcm { hcm_chain(&self.listener) } else { tcp_chain() });
            views.push(
                FilterChainView::from_raw_tag(tag)
                    .with_tls_terminated_http(chain.tls_terminated_http),
            );
        }

        let listener =
            Listener { name: self.listener.clone(), filter_chains: physical, ..Default::default() };
        Ok(MutableListener::new(listener, views))
    }
}

fn hcm_chain(stat_prefix: &str) -> FilterChain {
    let hcm = HttpConnectionManager {
        stat_prefix: stat_prefix.to_string(),
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

fn tcp_chain() -> FilterChain {
    FilterChain {
        filters: vec![Filter { name: TCP_PROXY_FILTER_NAME.to_string(), config_type: None }],
        ..Default::default()
    }
}

/// One filter as it ended up on the listener
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<EncodingCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typed_config: Option<TypedConfig>,
    /// Logical payload for the policy filters this plugin owns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<serde_json::Value>,
}

impl FilterSummary {
    fn new(name: &str, any: Option<&Any>) -> Self {
        Self {
            name: name.to_string(),
            encoding: any.and_then(detect_encoding),
            typed_config: any.map(TypedConfig::from),
            decoded: None,
        }
    }
}

/// HTTP filters of one chain after finalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    pub index: usize,
    pub protocol: i32,
    pub http_filters: Vec<FilterSummary>,
}

/// Full result of a render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub listener: String,
    pub hook: Hook,
    pub chains_injected: usize,
    pub listener_filter_attached: bool,
    pub listener_filters: Vec<FilterSummary>,
    pub chains: Vec<ChainSummary>,
}

/// Run the plugin hook for a request and describe the finalized listener.
pub fn render(plugin: &NetworkPolicyPlugin, request: &RenderRequest) -> Result<RenderReport> {
    let mut mutable = request.to_mutable_listener()?;
    let outcome = invoke(plugin, request.hook, &request.proxy, &mut mutable)?;

    let protocols: Vec<i32> = mutable.filter_chains.iter().map(|v| v.listener_protocol).collect();
    let listener = mutable.into_listener()?;

    summarize(plugin.config(), request.hook, outcome, &protocols, listener)
}

fn invoke(
    plugin: &NetworkPolicyPlugin,
    hook: Hook,
    proxy: &ProxyDescriptor,
    mutable: &mut MutableListener,
) -> Result<InjectionOutcome> {
    match hook {
        Hook::Inbound => plugin.on_inbound_listener(proxy, mutable),
        Hook::Outbound => plugin.on_outbound_listener(proxy, mutable),
        Hook::Virtual => plugin.on_virtual_listener(proxy, mutable),
        Hook::InboundPassthrough => plugin.on_inbound_passthrough(proxy, mutable),
        Hook::OutboundPassthrough => plugin.on_outbound_passthrough_filter_chain(proxy, mutable),
    }
}

fn summarize(
    config: &PluginConfig,
    hook: Hook,
    outcome: InjectionOutcome,
    protocols: &[i32],
    listener: Listener,
) -> Result<RenderReport> {
    let listener_filters = listener
        .listener_filters
        .iter()
        .map(|filter| -> Result<FilterSummary> {
            let any = match &filter.config_type {
                Some(listener_filter::ConfigType::TypedConfig(any)) => Some(any),
                _ => None,
            };
            let mut summary = FilterSummary::new(&filter.name, any);
            if filter.name == config.listener_filter_name {
                let payload = ConnectionMetadataConfig::from_listener_filter(filter)?;
                summary.decoded = Some(serde_json::to_value(payload)?);
            }
            Ok(summary)
        })
        .collect::<Result<Vec<_>>>()?;

    let modifier = ListenerModifier::new(listener);
    let mut chains = Vec::with_capacity(protocols.len());
    for (index, protocol) in protocols.iter().enumerate() {
        let http_filters = modifier
            .chain_http_filters(index)?
            .iter()
            .map(|filter| -> Result<FilterSummary> {
                let any = match &filter.config_type {
                    Some(http_filter::ConfigType::TypedConfig(any)) => Some(any),
                    _ => None,
                };
                let mut summary = FilterSummary::new(&filter.name, any);
                if filter.name == config.http_filter_name {
                    let payload = L7PolicyConfig::from_http_filter(filter)?;
                    summary.decoded = Some(serde_json::to_value(payload)?);
                }
                Ok(summary)
            })
            .collect::<Result<Vec<_>>>()?;

        chains.push(ChainSummary { index, protocol: *protocol, http_filters });
    }

    Ok(RenderReport {
        listener: modifier.name().to_string(),
        hook,
        chains_injected: outcome.chains_injected,
        listener_filter_attached: outcome.listener_filter_attached,
        listener_filters,
        chains,
    })
}

/// Reject requests without a listener name or without chains.
pub fn validate_request(request: &RenderRequest) -> Result<()> {
    if request.listener.trim().is_empty() {
        return Err(Error::config("Render request needs a listener name"));
    }
    if request.chains.is_empty() {
        return Err(Error::config(format!(
            "Render request for listener '{}' has no filter chains",
            request.listener
        )));
    }
    Ok(())
}
