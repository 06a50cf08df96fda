//! Filters consumed by the network-policy engine.
//!
//! - `bpf_metadata`: connection-metadata listener filter
//! - `l7_policy`: application-policy HTTP filter
//!
//! [`PolicyFilters`] builds both once per listener build. The HTTP filter is
//! held in an `Arc` so every chain that needs it shares the same instance.

pub mod bpf_metadata;
pub mod l7_policy;

pub use bpf_metadata::{
    build_listener_filter, BpfMetadata, ConnectionMetadataConfig, BPF_METADATA_TYPE_URL,
};
pub use l7_policy::{
    build_http_filter, policy_for_direction, L7Policy, L7PolicyConfig, L7_POLICY_TYPE_URL,
};

use crate::config::PluginConfig;
use crate::domain::{EncodingCapability, ListenerDirection};
use crate::Result;
use envoy_types::pb::envoy::config::listener::v3::ListenerFilter;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::HttpFilter;
use std::sync::Arc;

/// The pair of filters injected into one listener.
#[derive(Debug, Clone)]
pub struct PolicyFilters {
    pub listener_filter: ListenerFilter,
    pub http_filter: Arc<HttpFilter>,
}

impl PolicyFilters {
    /// Build both filters for a listener direction.
    ///
    /// Pure function of its inputs; no I/O and no shared state.
    pub fn build(
        config: &PluginConfig,
        direction: ListenerDirection,
        encoding: EncodingCapability,
    ) -> Result<Self> {
        let listener_filter =
            build_listener_filter(&config.listener_filter_name, direction, encoding)?;

        let policy =
            policy_for_direction(&config.access_log_path, config.policy_name.as_deref(), direction);
        let http_filter = build_http_filter(&config.http_filter_name, &policy, encoding)?;

        Ok(Self { listener_filter, http_filter: Arc::new(http_filter) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filters_with_configured_names() {
        let config = PluginConfig {
            listener_filter_name: "connmeta".into(),
            http_filter_name: "policy".into(),
            policy_name: Some("default/web".into()),
            ..Default::default()
        };

        let filters =
            PolicyFilters::build(&config, ListenerDirection::Inbound, EncodingCapability::TypedAny)
                .expect("build");

        assert_eq!(filters.listener_filter.name, "connmeta");
        assert_eq!(filters.http_filter.name, "policy");

        let policy = L7PolicyConfig::from_http_filter(&filters.http_filter).expect("decode");
        assert!(policy.is_ingress);
        assert_eq!(policy.access_log_path, config.access_log_path);
        assert_eq!(policy.policy_name.as_deref(), Some("default/web"));

        let meta = ConnectionMetadataConfig::from_listener_filter(&filters.listener_filter)
            .expect("decode");
        assert!(meta.is_ingress);
    }

    #[test]
    fn build_is_deterministic() {
        let config = PluginConfig::default();
        let a = PolicyFilters::build(
            &config,
            ListenerDirection::Outbound,
            EncodingCapability::LegacyStruct,
        )
        .unwrap();
        let b = PolicyFilters::build(
            &config,
            ListenerDirection::Outbound,
            EncodingCapability::LegacyStruct,
        )
        .unwrap();

        assert_eq!(a.listener_filter, b.listener_filter);
        assert_eq!(*a.http_filter, *b.http_filter);
        assert!(!Arc::ptr_eq(&a.http_filter, &b.http_filter));
    }
}
