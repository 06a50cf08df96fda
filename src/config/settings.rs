//! # Configuration Settings
//!
//! Defines the configuration structures for the injection plugin.

use super::{
    DEFAULT_ACCESS_LOG_PATH, DEFAULT_HTTP_FILTER_NAME, DEFAULT_LISTENER_FILTER_NAME, ENV_PREFIX,
};
use crate::domain::EncodingCapability;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// When the connection-metadata listener filter is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerFilterPolicy {
    /// Attach only if at least one chain received the policy HTTP filter
    #[default]
    WhenHttpInjected,

    /// Attach to every sidecar listener, HTTP or not
    AlwaysForSidecar,
}

impl FromStr for ListenerFilterPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "when_http_injected" => Ok(ListenerFilterPolicy::WhenHttpInjected),
            "always_for_sidecar" => Ok(ListenerFilterPolicy::AlwaysForSidecar),
            _ => Err(Error::config(format!("unrecognized listener filter policy '{}'", s))),
        }
    }
}

impl fmt::Display for ListenerFilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerFilterPolicy::WhenHttpInjected => write!(f, "when_http_injected"),
            ListenerFilterPolicy::AlwaysForSidecar => write!(f, "always_for_sidecar"),
        }
    }
}

/// Injection plugin configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PluginConfig {
    /// Name of the connection-metadata listener filter
    #[validate(length(min = 1, message = "Listener filter name cannot be empty"))]
    pub listener_filter_name: String,

    /// Name of the policy HTTP filter
    #[validate(length(min = 1, message = "HTTP filter name cannot be empty"))]
    pub http_filter_name: String,

    /// Socket the policy filter writes access logs to
    #[validate(length(min = 1, message = "Access log path cannot be empty"))]
    pub access_log_path: String,

    /// Optional policy identifier passed to the HTTP filter
    pub policy_name: Option<String>,

    /// When to attach the listener filter
    pub listener_filter_policy: ListenerFilterPolicy,

    /// Inject into TLS-terminated HTTP chains on router proxies
    pub gateway_injection: bool,

    /// Force a payload encoding regardless of what the proxy negotiated
    pub encoding_override: Option<EncodingCapability>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            listener_filter_name: DEFAULT_LISTENER_FILTER_NAME.to_string(),
            http_filter_name: DEFAULT_HTTP_FILTER_NAME.to_string(),
            access_log_path: DEFAULT_ACCESS_LOG_PATH.to_string(),
            policy_name: None,
            listener_filter_policy: ListenerFilterPolicy::default(),
            gateway_injection: true,
            encoding_override: None,
        }
    }
}

impl PluginConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.listener_filter_name == self.http_filter_name {
            return Err(Error::config("Listener and HTTP filter names cannot be the same"));
        }

        if !self.access_log_path.starts_with('/') {
            return Err(Error::config("Access log path must be an absolute socket path"));
        }

        if matches!(self.policy_name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(Error::config("Policy name cannot be blank when set"));
        }

        Ok(())
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// Unset variables keep their defaults. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(name) = var("LISTENER_FILTER_NAME") {
            config.listener_filter_name = name;
        }
        if let Some(name) = var("HTTP_FILTER_NAME") {
            config.http_filter_name = name;
        }
        if let Some(path) = var("ACCESS_LOG_PATH") {
            config.access_log_path = path;
        }
        if let Some(policy) = var("POLICY_NAME") {
            config.policy_name = Some(policy);
        }
        if let Some(policy) = var("LISTENER_FILTER_POLICY") {
            config.listener_filter_policy = policy.parse()?;
        }
        if let Some(flag) = var("GATEWAY_INJECTION") {
            config.gateway_injection = flag.parse().map_err(|e| {
                Error::config(format!("Invalid {}GATEWAY_INJECTION: {}", ENV_PREFIX, e))
            })?;
        }
        if let Some(encoding) = var("ENCODING") {
            config.encoding_override = Some(encoding.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document and validate it
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Encoding to use for a proxy, honoring the override
    pub fn effective_encoding(&self, negotiated: EncodingCapability) -> EncodingCapability {
        self.encoding_override.unwrap_or(negotiated)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Tracing service name
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(format!("{}{}", ENV_PREFIX, name)).ok();

        Self {
            service_name: var("SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: var("LOG_LEVEL")
                .or_else(|| std::env::var("RUST_LOG").ok())
                .unwrap_or(defaults.log_level),
            json_logging: var("JSON_LOGGING")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.json_logging),
        }
    }
}
