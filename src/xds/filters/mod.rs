//! Filter configuration utilities for the network-policy filters.
//!
//! This module provides the payload types injected into listeners and the
//! machinery that turns them into Envoy protobuf messages.
//!
//! # Architecture
//!
//! - `network_policy`: the connection-metadata listener filter and the L7
//!   policy HTTP filter, with their builders
//! - `encoding`: the adapter that serializes a payload either as a typed `Any`
//!   or as a generic `Struct` for older proxies
//! - `struct_conversion`: JSON <-> `google.protobuf.Struct` mapping used by the
//!   legacy encoding
//! - `injection`: the per-listener decision pipeline and plugin hooks
//!
//! # Example
//!
//! ```rust,ignore
//! use netpolicy_injector::xds::filters::network_policy::L7PolicyConfig;
//! use netpolicy_injector::domain::EncodingCapability;
//!
//! let config = L7PolicyConfig::new("/var/run/cilium/access_log.sock", true);
//! let any = config.to_any()?;
//! let legacy = config.encode(EncodingCapability::LegacyStruct)?;
//! ```

pub mod encoding;
pub mod injection;
pub mod network_policy;
pub mod struct_conversion;

use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use envoy_types::pb::google::protobuf::Any;
use prost::Message;
use serde::{Deserialize, Serialize};

/// Wrapper for binary protobuf payloads serialized as base64 in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Base64Bytes(pub Vec<u8>);

impl Serialize for Base64Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&BASE64_ENGINE.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64_ENGINE
            .decode(encoded.as_bytes())
            .map(Base64Bytes)
            .map_err(|err| serde::de::Error::custom(err.to_string()))
    }
}

/// JSON-friendly view of a `google.protobuf.Any` payload.
///
/// Used when rendering injected filters for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedConfig {
    pub type_url: String,
    #[serde(default)]
    pub value: Base64Bytes,
}

impl TypedConfig {
    /// Creates a typed config from a prost message.
    pub fn from_message<M: Message>(type_url: impl Into<String>, msg: &M) -> Self {
        Self { type_url: type_url.into(), value: Base64Bytes(msg.encode_to_vec()) }
    }

    /// Converts to Envoy `Any` structure for xDS protocol.
    pub fn to_any(&self) -> Any {
        Any { type_url: self.type_url.clone(), value: self.value.0.clone() }
    }
}

impl From<&Any> for TypedConfig {
    fn from(any: &Any) -> Self {
        Self { type_url: any.type_url.clone(), value: Base64Bytes(any.value.clone()) }
    }
}

/// Build an Envoy `Any` from a prost message.
pub fn any_from_message<M: Message>(type_url: impl Into<String>, msg: &M) -> Any {
    TypedConfig::from_message(type_url, msg).to_any()
}

/// Error helper for invalid filter configuration.
pub fn invalid_config(msg: impl Into<String>) -> crate::Error {
    crate::Error::config(msg.into())
}
