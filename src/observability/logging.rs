//! # Structured Logging
//!
//! Span macros and startup logging helpers built on the tracing ecosystem.

/// Create a tracing span for one listener build.
///
/// ```rust,ignore
/// let span = injection_span!("virtualInbound", "sidecar~10.0.0.1", ListenerDirection::Outbound);
/// let _enter = span.enter();
/// ```
#[macro_export]
macro_rules! injection_span {
    ($listener:expr, $proxy_id:expr, $direction:expr) => {
        tracing::debug_span!(
            "listener_injection",
            listener = %$listener,
            proxy_id = %$proxy_id,
            direction = %$direction
        )
    };
    ($listener:expr, $proxy_id:expr, $direction:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "listener_injection",
            listener = %$listener,
            proxy_id = %$proxy_id,
            direction = %$direction,
            $($field)*
        )
    };
}

/// Log plugin configuration at startup
pub fn log_config_info(config: &crate::config::PluginConfig) {
    tracing::info!(
        listener_filter = %config.listener_filter_name,
        http_filter = %config.http_filter_name,
        access_log_path = %config.access_log_path,
        listener_filter_policy = %config.listener_filter_policy,
        gateway_injection = config.gateway_injection,
        encoding_override = ?config.encoding_override,
        "Network policy injection configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListenerDirection;

    #[test]
    fn test_macros_compile() {
        let _span = injection_span!("virtualInbound", "node-1", ListenerDirection::Outbound);
        let _span =
            injection_span!("0.0.0.0_8080", "node-1", ListenerDirection::Inbound, chains = 2);
    }

    #[test]
    fn test_log_config_info() {
        let config = crate::config::PluginConfig::default();

        // This should not panic
        log_config_info(&config);
    }
}
