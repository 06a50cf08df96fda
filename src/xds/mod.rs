//! Envoy xDS resource manipulation
//!
//! - `filters`: filter payloads, encodings and listener injection
//! - `helpers`: protobuf navigation for listeners

pub mod filters;
pub mod helpers;

pub use filters::injection::{
    configure_listener, FilterChainView, InjectionOutcome, ListenerPlugin, MutableListener,
    NetworkPolicyPlugin,
};
pub use filters::network_policy::PolicyFilters;
