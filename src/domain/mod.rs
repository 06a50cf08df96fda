//! Domain layer
//!
//! Pure descriptions of the proxy and listener being built, with no Envoy
//! protobuf dependencies.
//!
//! ## Module Organization
//!
//! - `proxy`: proxy role, identity and negotiated payload encoding
//! - `listener`: listener direction and per-chain protocol classification

pub mod listener;
pub mod proxy;

pub use listener::{ListenerDirection, ListenerProtocol};
pub use proxy::{EncodingCapability, ProxyDescriptor, ProxyRole};
