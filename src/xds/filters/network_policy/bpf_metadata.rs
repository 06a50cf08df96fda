//! Connection-metadata listener filter.
//!
//! Runs before filter chain selection and tags each connection with the
//! metadata the policy engine needs. One instance per listener.

use crate::domain::{EncodingCapability, ListenerDirection};
use crate::xds::filters::encoding::{decode_payload, encode_payload, FilterPayload};
use crate::xds::filters::invalid_config;
use envoy_types::pb::envoy::config::listener::v3::{listener_filter, ListenerFilter};
use envoy_types::pb::google::protobuf::Any as EnvoyAny;
use prost::Message;
use serde::{Deserialize, Serialize};

pub const BPF_METADATA_TYPE_URL: &str = "type.googleapis.com/cilium.BpfMetadata";

/// Wire form of `cilium.BpfMetadata`.
#[derive(Clone, PartialEq, Message)]
pub struct BpfMetadata {
    #[prost(string, tag = "1")]
    pub bpf_root: String,
    #[prost(bool, tag = "2")]
    pub is_ingress: bool,
}

/// Payload of the connection-metadata listener filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionMetadataConfig {
    /// bpffs mount the filter reads maps from; empty means the proxy default
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bpf_root: String,
    /// Whether the listener handles ingress traffic
    #[serde(default)]
    pub is_ingress: bool,
}

impl ConnectionMetadataConfig {
    pub fn for_direction(direction: ListenerDirection) -> Self {
        Self { bpf_root: String::new(), is_ingress: direction.is_ingress() }
    }

    /// Encode for a proxy with the given capability
    pub fn encode(&self, encoding: EncodingCapability) -> Result<EnvoyAny, crate::Error> {
        encode_payload(self, encoding)
    }

    /// Convert to Envoy Any payload
    pub fn to_any(&self) -> Result<EnvoyAny, crate::Error> {
        self.encode(EncodingCapability::TypedAny)
    }

    /// Build configuration from either payload encoding
    pub fn from_any(any: &EnvoyAny) -> Result<Self, crate::Error> {
        decode_payload(any)
    }

    /// Extract and decode the payload of a listener filter
    pub fn from_listener_filter(filter: &ListenerFilter) -> Result<Self, crate::Error> {
        match &filter.config_type {
            Some(listener_filter::ConfigType::TypedConfig(any)) => Self::from_any(any),
            _ => Err(invalid_config(format!(
                "listener filter '{}' carries no typed config",
                filter.name
            ))),
        }
    }
}

impl FilterPayload for ConnectionMetadataConfig {
    const TYPE_URL: &'static str = BPF_METADATA_TYPE_URL;
    type Proto = BpfMetadata;

    fn to_proto(&self) -> BpfMetadata {
        BpfMetadata { bpf_root: self.bpf_root.clone(), is_ingress: self.is_ingress }
    }

    fn from_proto(proto: BpfMetadata) -> Self {
        Self { bpf_root: proto.bpf_root, is_ingress: proto.is_ingress }
    }
}

/// Build the connection-metadata listener filter for one listener
pub fn build_listener_filter(
    name: &str,
    direction: ListenerDirection,
    encoding: EncodingCapability,
) -> Result<ListenerFilter, crate::Error> {
    let any = ConnectionMetadataConfig::for_direction(direction).encode(encoding)?;

    Ok(ListenerFilter {
        name: name.to_string(),
        config_type: Some(listener_filter::ConfigType::TypedConfig(any)),
        ..Default::default()
    })
}
