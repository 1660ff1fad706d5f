//! Session configuration.
//!
//! Grounded on the teacher's `SessionConfig`/`ConfigValue`/
//! `ConfigChangeListener` property-bag architecture, generalized from
//! 5250 display preferences to the protocol-level inputs a TN3270E
//! session actually needs: host/port, terminal type, TLS intent,
//! negotiation/read timeouts, preferred TN3270E functions, and LU name.

use crate::error::{ConfigError, ConfigResult};
use crate::telnet::negotiation::{Tn3270EDeviceType, Tn3270EFunction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    pub property_name: String,
    pub old_value: Option<ConfigValue>,
    pub new_value: ConfigValue,
}

pub trait ConfigChangeListener: Send + Sync {
    fn on_config_changed(&mut self, event: &ConfigChangeEvent);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    StringArray(Vec<String>),
}

impl ConfigValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}
impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_string())
    }
}
impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Integer(v)
    }
}
impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Boolean(v)
    }
}

const KEY_HOST: &str = "connection.host";
const KEY_PORT: &str = "connection.port";
const KEY_TERMINAL_TYPE: &str = "connection.terminalType";
const KEY_USE_TLS: &str = "connection.useTls";
const KEY_NEGOTIATION_TIMEOUT_MS: &str = "connection.negotiationTimeoutMs";
const KEY_READ_TIMEOUT_MS: &str = "connection.readTimeoutMs";
const KEY_PREFERRED_FUNCTIONS: &str = "connection.preferredFunctions";
const KEY_LU_NAME: &str = "connection.luName";
const KEY_USE_TN3270E_HEADER: &str = "connection.useTn3270eHeader";

/// Property-bag session configuration, mirroring the teacher's
/// `SessionConfig` but scoped to protocol-level connection inputs.
pub struct SessionConfig {
    properties: HashMap<String, ConfigValue>,
    listeners: Vec<Box<dyn ConfigChangeListener>>,
}

impl SessionConfig {
    pub fn new(host: String, port: u16) -> Self {
        let mut config = SessionConfig {
            properties: HashMap::new(),
            listeners: Vec::new(),
        };
        config.set_defaults();
        config.properties.insert(KEY_HOST.to_string(), ConfigValue::String(host));
        config.properties.insert(KEY_PORT.to_string(), ConfigValue::Integer(port as i64));
        config
    }

    fn set_defaults(&mut self) {
        self.properties.insert(KEY_TERMINAL_TYPE.to_string(), "IBM-3278-2".into());
        self.properties.insert(KEY_USE_TLS.to_string(), false.into());
        self.properties.insert(KEY_NEGOTIATION_TIMEOUT_MS.to_string(), (5_000i64).into());
        self.properties.insert(KEY_READ_TIMEOUT_MS.to_string(), (30_000i64).into());
        self.properties.insert(
            KEY_PREFERRED_FUNCTIONS.to_string(),
            ConfigValue::StringArray(vec!["BIND".to_string(), "DATA-STREAM-CTL".to_string()]),
        );
        self.properties.insert(KEY_USE_TN3270E_HEADER.to_string(), true.into());
    }

    pub fn add_listener(&mut self, listener: Box<dyn ConfigChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        let old_value = self.properties.insert(key.to_string(), value.clone());
        let event = ConfigChangeEvent {
            property_name: key.to_string(),
            old_value,
            new_value: value,
        };
        for listener in &mut self.listeners {
            listener.on_config_changed(&event);
        }
    }

    fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.properties.get(key)
    }

    pub fn host(&self) -> &str {
        self.get(KEY_HOST).and_then(ConfigValue::as_string).unwrap_or("")
    }

    pub fn port(&self) -> u16 {
        self.get(KEY_PORT).and_then(ConfigValue::as_integer).unwrap_or(23) as u16
    }

    pub fn terminal_type(&self) -> &str {
        self.get(KEY_TERMINAL_TYPE).and_then(ConfigValue::as_string).unwrap_or("IBM-3278-2")
    }

    pub fn use_tls(&self) -> bool {
        self.get(KEY_USE_TLS).and_then(ConfigValue::as_boolean).unwrap_or(false)
    }

    pub fn negotiation_timeout_ms(&self) -> u64 {
        self.get(KEY_NEGOTIATION_TIMEOUT_MS).and_then(ConfigValue::as_integer).unwrap_or(5_000) as u64
    }

    pub fn read_timeout_ms(&self) -> u64 {
        self.get(KEY_READ_TIMEOUT_MS).and_then(ConfigValue::as_integer).unwrap_or(30_000) as u64
    }

    pub fn lu_name(&self) -> Option<&str> {
        self.get(KEY_LU_NAME).and_then(ConfigValue::as_string)
    }

    pub fn uses_tn3270e_header(&self) -> bool {
        self.get(KEY_USE_TN3270E_HEADER).and_then(ConfigValue::as_boolean).unwrap_or(true)
    }

    pub fn preferred_functions(&self) -> Vec<Tn3270EFunction> {
        let names = self
            .get(KEY_PREFERRED_FUNCTIONS)
            .and_then(ConfigValue::as_string_array)
            .unwrap_or(&[]);
        names
            .iter()
            .filter_map(|n| match n.as_str() {
                "BIND" => Some(Tn3270EFunction::Bind),
                "DATA-STREAM-CTL" => Some(Tn3270EFunction::DataStreamCtl),
                "RESPONSES" => Some(Tn3270EFunction::ResponseMode),
                "SCS-CTL-CODES" => Some(Tn3270EFunction::Scs),
                "SYSREQ" => Some(Tn3270EFunction::Sysreq),
                _ => None,
            })
            .collect()
    }

    /// Resolve the configured terminal type string to a device type enum,
    /// used to drive TN3270E DEVICE-TYPE negotiation.
    pub fn device_type(&self) -> ConfigResult<Tn3270EDeviceType> {
        match self.terminal_type() {
            "IBM-3278-2" | "IBM-3279-2" => Ok(Tn3270EDeviceType::Model2),
            "IBM-3278-3" | "IBM-3279-3" => Ok(Tn3270EDeviceType::Model3),
            "IBM-3278-4" | "IBM-3279-4" => Ok(Tn3270EDeviceType::Model4),
            "IBM-3278-5" | "IBM-3279-5" => Ok(Tn3270EDeviceType::Model5),
            other => Err(ConfigError::InvalidParameter {
                parameter: KEY_TERMINAL_TYPE.to_string(),
                value: other.to_string(),
                reason: "unrecognized TN3270E terminal type".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let config = SessionConfig::new("host.example".to_string(), 23);
        assert_eq!(config.host(), "host.example");
        assert_eq!(config.port(), 23);
        assert_eq!(config.terminal_type(), "IBM-3278-2");
        assert!(!config.use_tls());
    }

    #[test]
    fn device_type_resolves_from_terminal_type() {
        let config = SessionConfig::new("h".to_string(), 23);
        assert_eq!(config.device_type().unwrap(), Tn3270EDeviceType::Model2);
    }

    #[test]
    fn unknown_terminal_type_is_a_config_error() {
        let mut config = SessionConfig::new("h".to_string(), 23);
        config.set("connection.terminalType", "bogus".into());
        assert!(config.device_type().is_err());
    }

    #[test]
    fn set_notifies_listeners() {
        struct Counter(std::sync::Arc<std::sync::atomic::AtomicUsize>);
        impl ConfigChangeListener for Counter {
            fn on_config_changed(&mut self, _event: &ConfigChangeEvent) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let counter = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut config = SessionConfig::new("h".to_string(), 23);
        config.add_listener(Box::new(Counter(counter.clone())));
        config.set("connection.port", (992i64).into());
        assert_eq!(counter.load(std::sync::Ordering::SeqCst), 1);
    }
}
