//! Listener domain types
//!
//! Direction and protocol classification for the listeners handed to the
//! injection plugin. Protocol detection happens upstream; these types only
//! carry its verdict.

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Traffic direction of a listener relative to the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerDirection {
    /// Ingress: traffic arriving at the workload
    Inbound,

    /// Egress: traffic leaving the workload
    Outbound,
}

impl ListenerDirection {
    /// Whether this direction is ingress
    pub fn is_ingress(self) -> bool {
        matches!(self, ListenerDirection::Inbound)
    }
}

impl fmt::Display for ListenerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerDirection::Inbound => write!(f, "inbound"),
            ListenerDirection::Outbound => write!(f, "outbound"),
        }
    }
}

/// Protocol detected for a filter chain by the upstream listener builder.
///
/// Discriminants follow the upstream tag values; `0` is reserved for
/// "unknown" and never decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i32)]
pub enum ListenerProtocol {
    /// Raw TCP proxying
    Tcp = 1,

    /// HTTP connection manager
    Http = 2,

    /// Protocol sniffed at connection time; may carry HTTP
    Auto = 3,
}

impl ListenerProtocol {
    /// Raw tag value as carried on a filter chain
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Check if chains of this protocol can carry HTTP filters
    pub fn is_http_capable(self) -> bool {
        matches!(self, ListenerProtocol::Http | ListenerProtocol::Auto)
    }
}

impl TryFrom<i32> for ListenerProtocol {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ListenerProtocol::Tcp),
            2 => Ok(ListenerProtocol::Http),
            3 => Ok(ListenerProtocol::Auto),
            other => Err(Error::UnknownProtocol { value: other }),
        }
    }
}

impl From<ListenerProtocol> for i32 {
    fn from(protocol: ListenerProtocol) -> Self {
        protocol.tag()
    }
}

impl FromStr for ListenerProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TCP" => Ok(ListenerProtocol::Tcp),
            "HTTP" => Ok(ListenerProtocol::Http),
            "AUTO" => Ok(ListenerProtocol::Auto),
            _ => Err(Error::config(format!("unrecognized listener protocol name '{}'", s))),
        }
    }
}

impl fmt::Display for ListenerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerProtocol::Tcp => write!(f, "TCP"),
            ListenerProtocol::Http => write!(f, "HTTP"),
            ListenerProtocol::Auto => write!(f, "AUTO"),
        }
    }
}
