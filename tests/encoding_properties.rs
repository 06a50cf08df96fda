//! Property tests for the payload encodings and the ineligible-proxy no-op.

mod common;

use common::listener_for;
use netpolicy_injector::domain::{
    EncodingCapability, ListenerDirection, ProxyDescriptor, ProxyRole,
};
use netpolicy_injector::xds::filters::network_policy::{
    ConnectionMetadataConfig, L7PolicyConfig, PolicyFilters,
};
use netpolicy_injector::{FilterChainView, ListenerPlugin, NetworkPolicyPlugin, PluginConfig};
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = ListenerDirection> {
    prop_oneof![Just(ListenerDirection::Inbound), Just(ListenerDirection::Outbound)]
}

proptest! {
    #[test]
    fn policy_encodings_decode_identically(
        path in "/[a-z0-9_/.]{1,48}",
        policy in proptest::option::of("[a-z0-9-]{1,16}/[a-z0-9-]{1,16}"),
        is_ingress in any::<bool>(),
    ) {
        let config = L7PolicyConfig::new(path, is_ingress).with_policy_name(policy);

        let typed = config.encode(EncodingCapability::TypedAny).unwrap();
        let legacy = config.encode(EncodingCapability::LegacyStruct).unwrap();
        prop_assert_ne!(&typed.type_url, &legacy.type_url);

        let from_typed = L7PolicyConfig::from_any(&typed).unwrap();
        let from_legacy = L7PolicyConfig::from_any(&legacy).unwrap();
        prop_assert_eq!(&from_typed, &from_legacy);
        prop_assert_eq!(from_typed, config);
    }

    #[test]
    fn metadata_encodings_decode_identically(direction in direction()) {
        let config = ConnectionMetadataConfig::for_direction(direction);

        let typed = config.encode(EncodingCapability::TypedAny).unwrap();
        let legacy = config.encode(EncodingCapability::LegacyStruct).unwrap();

        let from_typed = ConnectionMetadataConfig::from_any(&typed).unwrap();
        let from_legacy = ConnectionMetadataConfig::from_any(&legacy).unwrap();
        prop_assert_eq!(&from_typed, &from_legacy);
        prop_assert_eq!(from_typed.is_ingress, direction.is_ingress());
    }

    #[test]
    fn built_filters_agree_across_encodings(
        direction in direction(),
        policy in proptest::option::of("[a-z]{1,12}"),
    ) {
        let config = PluginConfig { policy_name: policy, ..Default::default() };

        let typed = PolicyFilters::build(&config, direction, EncodingCapability::TypedAny).unwrap();
        let legacy =
            PolicyFilters::build(&config, direction, EncodingCapability::LegacyStruct).unwrap();

        prop_assert_eq!(
            L7PolicyConfig::from_http_filter(&typed.http_filter).unwrap(),
            L7PolicyConfig::from_http_filter(&legacy.http_filter).unwrap()
        );
        prop_assert_eq!(
            ConnectionMetadataConfig::from_listener_filter(&typed.listener_filter).unwrap(),
            ConnectionMetadataConfig::from_listener_filter(&legacy.listener_filter).unwrap()
        );
    }

    #[test]
    fn other_role_is_always_a_noop(
        tags in proptest::collection::vec(-4i32..8, 0..6),
        tls in any::<bool>(),
        inbound in any::<bool>(),
    ) {
        let views: Vec<_> = tags
            .iter()
            .map(|tag| FilterChainView::from_raw_tag(*tag).with_tls_terminated_http(tls))
            .collect();
        let mut mutable = listener_for("virtualOutbound", views);
        let before = mutable.clone();

        let plugin = NetworkPolicyPlugin::new(PluginConfig::default()).unwrap();
        let proxy = ProxyDescriptor::new(ProxyRole::Other, "node");
        let outcome = if inbound {
            plugin.on_inbound_listener(&proxy, &mut mutable)
        } else {
            plugin.on_outbound_listener(&proxy, &mut mutable)
        }
        .unwrap();

        prop_assert!(outcome.is_unchanged());
        prop_assert_eq!(&mutable.listener, &before.listener);
        prop_assert!(mutable.filter_chains.iter().all(|v| v.http_filters.is_empty()));
    }
}
