//! Per-chain injection decisions.
//!
//! Each chain is first reduced to an [`EffectiveProtocol`], then looked up in
//! a single decision table keyed by proxy role, effective protocol and
//! listener direction.

use super::mutable::FilterChainView;
use crate::domain::{ListenerDirection, ListenerProtocol, ProxyRole};
use crate::Result;
use std::fmt;

/// Protocol a chain actually carries, as far as injection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveProtocol {
    Http,
    Tcp,
    Auto,
    /// Declared TCP at the listener level, HTTP once TLS is terminated
    TlsTerminatedHttp,
}

impl EffectiveProtocol {
    /// Classify one chain; unknown tags are fatal.
    pub fn classify(view: &FilterChainView) -> Result<Self> {
        Ok(match view.protocol()? {
            ListenerProtocol::Http => EffectiveProtocol::Http,
            ListenerProtocol::Auto => EffectiveProtocol::Auto,
            ListenerProtocol::Tcp if view.tls_terminated_http => {
                EffectiveProtocol::TlsTerminatedHttp
            }
            ListenerProtocol::Tcp => EffectiveProtocol::Tcp,
        })
    }
}

impl fmt::Display for EffectiveProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveProtocol::Http => write!(f, "http"),
            EffectiveProtocol::Tcp => write!(f, "tcp"),
            EffectiveProtocol::Auto => write!(f, "auto"),
            EffectiveProtocol::TlsTerminatedHttp => write!(f, "tls_terminated_http"),
        }
    }
}

/// What to do with one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAction {
    /// Append the policy HTTP filter to this chain
    InjectPolicy,
    /// Leave the chain alone
    Skip,
}

/// The injection decision table.
pub fn decide(
    role: ProxyRole,
    protocol: EffectiveProtocol,
    direction: ListenerDirection,
) -> ChainAction {
    use EffectiveProtocol::*;

    match (role, protocol, direction) {
        (ProxyRole::Sidecar, Http | Auto, _) => ChainAction::InjectPolicy,
        (ProxyRole::Sidecar, Tcp | TlsTerminatedHttp, _) => ChainAction::Skip,
        (ProxyRole::Router, TlsTerminatedHttp, ListenerDirection::Outbound) => {
            ChainAction::InjectPolicy
        }
        (ProxyRole::Router, _, _) => ChainAction::Skip,
        (ProxyRole::Other, _, _) => ChainAction::Skip,
    }
}

/// Decide every chain of a listener.
///
/// All chains are classified before any decision is returned, so an unknown
/// tag anywhere aborts the build before the caller mutates anything.
pub fn plan(
    role: ProxyRole,
    direction: ListenerDirection,
    chains: &[FilterChainView],
) -> Result<Vec<(EffectiveProtocol, ChainAction)>> {
    chains
        .iter()
        .map(|view| {
            let protocol = EffectiveProtocol::classify(view)?;
            Ok((protocol, decide(role, protocol, direction)))
        })
        .collect()
}
