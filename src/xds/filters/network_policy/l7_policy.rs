//! L7 policy HTTP filter configuration helpers
//!
//! The policy engine enforces HTTP-level rules through this filter and
//! receives access log records on the configured socket.

use crate::domain::{EncodingCapability, ListenerDirection};
use crate::xds::filters::encoding::{decode_payload, encode_payload, FilterPayload};
use crate::xds::filters::invalid_config;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_filter, HttpFilter,
};
use envoy_types::pb::google::protobuf::Any as EnvoyAny;
use prost::Message;
use serde::{Deserialize, Serialize};

pub const L7_POLICY_TYPE_URL: &str = "type.googleapis.com/cilium.L7Policy";

/// Wire form of `cilium.L7Policy`.
#[derive(Clone, PartialEq, Message)]
pub struct L7Policy {
    #[prost(string, tag = "1")]
    pub access_log_path: String,
    #[prost(string, tag = "2")]
    pub policy_name: String,
    #[prost(bool, tag = "4")]
    pub is_ingress: bool,
}

/// Configuration for the L7 policy filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L7PolicyConfig {
    /// Unix socket access log records are written to
    pub access_log_path: String,
    /// Policy to enforce; the engine resolves it from the connection when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    /// Whether the listener handles ingress traffic
    #[serde(default)]
    pub is_ingress: bool,
}

impl L7PolicyConfig {
    pub fn new(access_log_path: impl Into<String>, is_ingress: bool) -> Self {
        Self { access_log_path: access_log_path.into(), policy_name: None, is_ingress }
    }

    pub fn with_policy_name(mut self, policy_name: Option<String>) -> Self {
        self.policy_name = policy_name;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.access_log_path.trim().is_empty() {
            return Err(invalid_config("L7Policy access_log_path cannot be empty"));
        }

        if matches!(self.policy_name.as_deref(), Some(name) if name.is_empty()) {
            return Err(invalid_config("L7Policy policy_name cannot be empty when set"));
        }

        Ok(())
    }

    /// Encode for a proxy with the given capability
    pub fn encode(&self, encoding: EncodingCapability) -> Result<EnvoyAny, crate::Error> {
        self.validate()?;
        encode_payload(self, encoding)
    }

    /// Convert to Envoy Any payload
    pub fn to_any(&self) -> Result<EnvoyAny, crate::Error> {
        self.encode(EncodingCapability::TypedAny)
    }

    /// Build configuration from either payload encoding
    pub fn from_any(any: &EnvoyAny) -> Result<Self, crate::Error> {
        let config: Self = decode_payload(any)?;
        config.validate()?;
        Ok(config)
    }

    /// Extract and decode the payload of an HTTP filter
    pub fn from_http_filter(filter: &HttpFilter) -> Result<Self, crate::Error> {
        match &filter.config_type {
            Some(http_filter::ConfigType::TypedConfig(any)) => Self::from_any(any),
            _ => Err(invalid_config(format!(
                "HTTP filter '{}' carries no typed config",
                filter.name
            ))),
        }
    }
}

impl FilterPayload for L7PolicyConfig {
    const TYPE_URL: &'static str = L7_POLICY_TYPE_URL;
    type Proto = L7Policy;

    fn to_proto(&self) -> L7Policy {
        L7Policy {
            access_log_path: self.access_log_path.clone(),
            policy_name: self.policy_name.clone().unwrap_or_default(),
            is_ingress: self.is_ingress,
        }
    }

    fn from_proto(proto: L7Policy) -> Self {
        Self {
            access_log_path: proto.access_log_path,
            policy_name: Some(proto.policy_name).filter(|name| !name.is_empty()),
            is_ingress: proto.is_ingress,
        }
    }
}

/// Build the L7 policy HTTP filter for one listener
pub fn build_http_filter(
    name: &str,
    config: &L7PolicyConfig,
    encoding: EncodingCapability,
) -> Result<HttpFilter, crate::Error> {
    Ok(HttpFilter {
        name: name.to_string(),
        config_type: Some(http_filter::ConfigType::TypedConfig(config.encode(encoding)?)),
        is_optional: false,
        disabled: false,
    })
}

/// Policy config for a listener direction with the given log socket
pub fn policy_for_direction(
    access_log_path: &str,
    policy_name: Option<&str>,
    direction: ListenerDirection,
) -> L7PolicyConfig {
    L7PolicyConfig::new(access_log_path, direction.is_ingress())
        .with_policy_name(policy_name.map(str::to_string))
}
