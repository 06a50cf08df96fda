//! Proxy domain types
//!
//! Describes the proxy a listener is being built for. The plugin only reads
//! these values.

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Role of the proxy within the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyRole {
    /// Workload sidecar
    Sidecar,

    /// Ingress/egress gateway or router
    Router,

    /// Anything else the control plane serves
    Other,
}

impl fmt::Display for ProxyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyRole::Sidecar => write!(f, "sidecar"),
            ProxyRole::Router => write!(f, "router"),
            ProxyRole::Other => write!(f, "other"),
        }
    }
}

/// Payload encoding a proxy accepts for filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingCapability {
    /// Strongly typed `google.protobuf.Any` payloads
    #[default]
    TypedAny,

    /// Generic key/value `Struct` payloads for older proxies
    LegacyStruct,
}

impl fmt::Display for EncodingCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingCapability::TypedAny => write!(f, "typed_any"),
            EncodingCapability::LegacyStruct => write!(f, "legacy_struct"),
        }
    }
}

impl FromStr for EncodingCapability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "typed_any" | "typed" | "any" => Ok(EncodingCapability::TypedAny),
            "legacy_struct" | "struct" => Ok(EncodingCapability::LegacyStruct),
            _ => Err(Error::config(format!("unrecognized payload encoding '{}'", s))),
        }
    }
}

/// The proxy a listener is being generated for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyDescriptor {
    /// Role of the proxy
    pub role: ProxyRole,

    /// Node identifier
    #[serde(default)]
    pub id: String,

    /// Workload addresses
    #[serde(default)]
    pub ip_addresses: Vec<String>,

    /// Workload labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Payload encoding negotiated with this proxy
    #[serde(default)]
    pub encoding: EncodingCapability,
}

impl ProxyDescriptor {
    /// Create a descriptor with the given role and id and default encoding
    pub fn new(role: ProxyRole, id: impl Into<String>) -> Self {
        Self {
            role,
            id: id.into(),
            ip_addresses: Vec::new(),
            labels: BTreeMap::new(),
            encoding: EncodingCapability::default(),
        }
    }

    /// Shorthand for a sidecar descriptor
    pub fn sidecar(id: impl Into<String>) -> Self {
        Self::new(ProxyRole::Sidecar, id)
    }

    /// Shorthand for a router/gateway descriptor
    pub fn router(id: impl Into<String>) -> Self {
        Self::new(ProxyRole::Router, id)
    }

    /// Override the negotiated payload encoding
    pub fn with_encoding(mut self, encoding: EncodingCapability) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn is_sidecar(&self) -> bool {
        self.role == ProxyRole::Sidecar
    }
}
