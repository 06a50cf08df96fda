//! Helper for modifying Envoy Listener protobuf resources.
//!
//! Wraps a decoded `Listener` and tracks whether anything changed, so the
//! injection code does not repeat the HCM decode/modify/encode dance.

use crate::Result;
use envoy_types::pb::envoy::config::listener::v3::filter::ConfigType;
use envoy_types::pb::envoy::config::listener::v3::{Listener, ListenerFilter};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    HttpConnectionManager, HttpFilter,
};
use prost::Message;

pub const HTTP_CONNECTION_MANAGER_FILTER_NAME: &str =
    "envoy.filters.network.http_connection_manager";
pub const ROUTER_FILTER_NAME: &str = "envoy.filters.http.router";

/// Helper for modifying Envoy Listener protobuf resources.
///
/// # Example
///
/// ```rust,ignore
/// let mut modifier = ListenerModifier::new(listener);
/// modifier.add_listener_filter(bpf_metadata, true);
/// modifier.insert_http_filters(0, &[l7_policy])?;
/// let listener = modifier.into_inner();
/// ```
pub struct ListenerModifier {
    listener: Listener,
    modified: bool,
}

impl ListenerModifier {
    pub fn new(listener: Listener) -> Self {
        Self { listener, modified: false }
    }

    /// Get the listener name.
    pub fn name(&self) -> &str {
        &self.listener.name
    }

    /// Get the number of filter chains in the listener.
    #[cfg(test)]
    pub(crate) fn filter_chain_count(&self) -> usize {
        self.listener.filter_chains.len()
    }

    /// Check if the listener was modified.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Check whether a filter chain carries an HTTP connection manager.
    pub fn chain_has_hcm(&self, chain_idx: usize) -> bool {
        self.listener.filter_chains.get(chain_idx).is_some_and(|chain| {
            chain.filters.iter().any(|f| f.name == HTTP_CONNECTION_MANAGER_FILTER_NAME)
        })
    }

    /// Check whether a listener filter with this name is already attached.
    pub fn has_listener_filter(&self, name: &str) -> bool {
        self.listener.listener_filters.iter().any(|f| f.name == name)
    }

    /// Append a listener filter.
    ///
    /// Returns `false` without touching the listener when `skip_if_exists` is
    /// set and a filter of the same name is present.
    pub fn add_listener_filter(&mut self, filter: ListenerFilter, skip_if_exists: bool) -> bool {
        if skip_if_exists && self.has_listener_filter(&filter.name) {
            return false;
        }

        self.listener.listener_filters.push(filter);
        self.modified = true;
        true
    }

    /// Apply a modification to the HTTP connection managers of one filter chain.
    ///
    /// The callback should return `Ok(true)` if it changed the HCM; only then
    /// is the HCM re-encoded. Chains without an HCM are a no-op.
    pub fn modify_chain_hcm<F>(&mut self, chain_idx: usize, mut f: F) -> Result<bool>
    where
        F: FnMut(&mut HttpConnectionManager) -> Result<bool>,
    {
        let name = self.listener.name.clone();
        let chain = self.listener.filter_chains.get_mut(chain_idx).ok_or_else(|| {
            crate::Error::internal(format!(
                "listener '{}' has no filter chain at index {}",
                name, chain_idx
            ))
        })?;

        let mut changed = false;
        for filter in chain.filters.iter_mut() {
            if filter.name != HTTP_CONNECTION_MANAGER_FILTER_NAME {
                continue;
            }
            if let Some(ConfigType::TypedConfig(typed_config)) = &mut filter.config_type {
                let mut hcm = HttpConnectionManager::decode(typed_config.value.as_slice())
                    .map_err(|e| {
                        crate::Error::internal(format!(
                            "Failed to decode HCM for listener '{}': {}",
                            name, e
                        ))
                    })?;

                if f(&mut hcm)? {
                    typed_config.value = hcm.encode_to_vec();
                    changed = true;
                }
            }
        }

        self.modified |= changed;
        Ok(changed)
    }

    /// Insert HTTP filters before the router filter of one chain's HCM.
    ///
    /// Filters keep their relative order. A filter whose name is already in
    /// the HCM is skipped. Without a router the filters are appended.
    pub fn insert_http_filters(&mut self, chain_idx: usize, filters: &[HttpFilter]) -> Result<bool> {
        if filters.is_empty() {
            return Ok(false);
        }

        self.modify_chain_hcm(chain_idx, |hcm| {
            let mut router_pos = hcm
                .http_filters
                .iter()
                .position(|f| f.name == ROUTER_FILTER_NAME)
                .unwrap_or(hcm.http_filters.len());

            let mut inserted = false;
            for filter in filters {
                if hcm.http_filters.iter().any(|existing| existing.name == filter.name) {
                    continue;
                }
                hcm.http_filters.insert(router_pos, filter.clone());
                router_pos += 1;
                inserted = true;
            }
            Ok(inserted)
        })
    }

    /// HTTP filters of every connection manager in one chain, in order.
    ///
    /// Chains without an HCM yield an empty list.
    pub fn chain_http_filters(&self, chain_idx: usize) -> Result<Vec<HttpFilter>> {
        let chain = self.listener.filter_chains.get(chain_idx).ok_or_else(|| {
            crate::Error::internal(format!(
                "listener '{}' has no filter chain at index {}",
                self.listener.name, chain_idx
            ))
        })?;

        let mut filters = Vec::new();
        for filter in &chain.filters {
            if filter.name != HTTP_CONNECTION_MANAGER_FILTER_NAME {
                continue;
            }
            if let Some(ConfigType::TypedConfig(typed_config)) = &filter.config_type {
                let hcm = HttpConnectionManager::decode(typed_config.value.as_slice())?;
                filters.extend(hcm.http_filters);
            }
        }
        Ok(filters)
    }

    /// Get a reference to the underlying Listener.
    #[cfg(test)]
    pub(crate) fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Finish modifications and return the listener.
    pub fn into_inner(self) -> Listener {
        self.listener
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use envoy_types::pb::envoy::config::listener::v3::{Filter, FilterChain};
    use envoy_types::pb::google::protobuf::Any;

    pub(crate) fn router_filter() -> HttpFilter {
        HttpFilter {
            name: ROUTER_FILTER_NAME.to_string(),
            config_type: None,
            is_optional: false,
            disabled: false,
        }
    }

    pub(crate) fn http_chain() -> FilterChain {
        let hcm = HttpConnectionManager {
            stat_prefix: "test".to_string(),
            http_filters: vec![router_filter()],
            ..Default::default()
        };

        let hcm_any = Any {
            type_url: "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager".to_string(),
            value: hcm.encode_to_vec(),
        };

        FilterChain {
            filters: vec![Filter {
                name: HTTP_CONNECTION_MANAGER_FILTER_NAME.to_string(),
                config_type: Some(ConfigType::TypedConfig(hcm_any)),
            }],
            ..Default::default()
        }
    }

    pub(crate) fn tcp_chain() -> FilterChain {
        FilterChain {
            filters: vec![Filter {
                name: "envoy.filters.network.tcp_proxy".to_string(),
                config_type: None,
            }],
            ..Default::default()
        }
    }

    pub(crate) fn hcm_filter_names(listener: &Listener, chain_idx: usize) -> Vec<String> {
        let filter = &listener.filter_chains[chain_idx].filters[0];
        match &filter.config_type {
            Some(ConfigType::TypedConfig(typed_config)) => {
                HttpConnectionManager::decode(typed_config.value.as_slice())
                    .unwrap()
                    .http_filters
                    .into_iter()
                    .map(|f| f.name)
                    .collect()
            }
            _ => panic!("Expected TypedConfig"),
        }
    }

    fn named_filter(name: &str) -> HttpFilter {
        HttpFilter { name: name.to_string(), ..router_filter() }
    }

    fn test_listener() -> Listener {
        Listener {
            name: "test-listener".to_string(),
            filter_chains: vec![tcp_chain(), http_chain()],
            ..Default::default()
        }
    }

    #[test]
    fn test_new_modifier() {
        let modifier = ListenerModifier::new(test_listener());

        assert_eq!(modifier.name(), "test-listener");
        assert_eq!(modifier.filter_chain_count(), 2);
        assert!(!modifier.is_modified());
    }

    #[test]
    fn test_insert_http_filters_before_router() {
        let mut modifier = ListenerModifier::new(test_listener());

        let inserted = modifier
            .insert_http_filters(1, &[named_filter("cilium.l7policy"), named_filter("extra")])
            .unwrap();
        assert!(inserted);
        assert!(modifier.is_modified());

        let listener = modifier.into_inner();
        assert_eq!(
            hcm_filter_names(&listener, 1),
            vec!["cilium.l7policy", "extra", ROUTER_FILTER_NAME]
        );
    }

    #[test]
    fn test_insert_skips_existing_names() {
        let mut modifier = ListenerModifier::new(test_listener());
        let filter = named_filter("cilium.l7policy");

        assert!(modifier.insert_http_filters(1, std::slice::from_ref(&filter)).unwrap());
        assert!(!modifier.insert_http_filters(1, &[filter]).unwrap());

        assert_eq!(hcm_filter_names(modifier.listener(), 1).len(), 2);
    }

    #[test]
    fn test_insert_into_chain_without_hcm_is_noop() {
        let mut modifier = ListenerModifier::new(test_listener());

        let inserted = modifier.insert_http_filters(0, &[named_filter("cilium.l7policy")]).unwrap();
        assert!(!inserted);
        assert!(!modifier.is_modified());
    }

    #[test]
    fn test_insert_out_of_range_chain() {
        let mut modifier = ListenerModifier::new(test_listener());
        assert!(modifier.insert_http_filters(5, &[named_filter("x")]).is_err());
    }

    #[test]
    fn test_chain_has_hcm() {
        let modifier = ListenerModifier::new(test_listener());

        assert!(!modifier.chain_has_hcm(0));
        assert!(modifier.chain_has_hcm(1));
        assert!(!modifier.chain_has_hcm(2));
    }

    #[test]
    fn test_chain_http_filters() {
        let modifier = ListenerModifier::new(test_listener());

        assert!(modifier.chain_http_filters(0).unwrap().is_empty());
        let filters = modifier.chain_http_filters(1).unwrap();
        assert_eq!(filters, vec![router_filter()]);
        assert!(modifier.chain_http_filters(2).is_err());
    }

    #[test]
    fn test_add_listener_filter_once() {
        let mut modifier = ListenerModifier::new(test_listener());
        let filter =
            ListenerFilter { name: "cilium.bpf_metadata".to_string(), ..Default::default() };

        assert!(modifier.add_listener_filter(filter.clone(), true));
        assert!(!modifier.add_listener_filter(filter, true));
        assert!(modifier.has_listener_filter("cilium.bpf_metadata"));
        assert_eq!(modifier.listener().listener_filters.len(), 1);
    }
}
