//! Helper utilities for xDS resource manipulation.
//!
//! Reusable protobuf navigation and modification for listeners.

mod listener_modifier;

pub use listener_modifier::{
    ListenerModifier, HTTP_CONNECTION_MANAGER_FILTER_NAME, ROUTER_FILTER_NAME,
};

#[cfg(test)]
pub(crate) use listener_modifier::tests as fixtures;
