//! Runtime and demo configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::Catalog;

/// Limits applied by the reactive runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum effect runs in one flush before it is abandoned.
    ///
    /// Bounds feedback loops where an effect writes a cell it also reads.
    pub max_flush_iterations: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_FLUSH_ITERATIONS: usize = 10_000;
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_iterations: Self::DEFAULT_MAX_FLUSH_ITERATIONS,
        }
    }
}

/// Settings for the demo components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Period of the counter timer.
    #[serde(with = "millis")]
    pub tick_interval: Duration,

    /// Products the cart picks from.
    pub catalog: Catalog,

    /// Limits installed on the reactive runtime before the demos start.
    pub runtime: RuntimeConfig,
}

impl DemoConfig {
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            catalog: Catalog::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis())
            .map_err(|_| S::Error::custom(format!("interval {value:?} does not fit in u64 millis")))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_config_fills_missing_fields() {
        let config: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());

        let config: RuntimeConfig =
            serde_json::from_str(r#"{ "max_flush_iterations": 5 }"#).unwrap();
        assert_eq!(config.max_flush_iterations, 5);
    }

    #[test]
    fn demo_config_reads_interval_in_millis() {
        let config: DemoConfig = serde_json::from_str(r#"{ "tick_interval": 250 }"#).unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.catalog, Catalog::default());
        assert_eq!(config.runtime, RuntimeConfig::default());
    }

    #[test]
    fn demo_config_reads_runtime_limits() {
        let config: DemoConfig =
            serde_json::from_str(r#"{ "runtime": { "max_flush_iterations": 64 } }"#).unwrap();
        assert_eq!(config.runtime.max_flush_iterations, 64);
        assert_eq!(config.tick_interval, DemoConfig::DEFAULT_TICK_INTERVAL);
    }

    #[test]
    fn oversized_interval_fails_to_serialize() {
        let config = DemoConfig {
            tick_interval: Duration::MAX,
            ..DemoConfig::default()
        };
        assert!(serde_json::to_string(&config).is_err());

        let json = serde_json::to_string(&DemoConfig::default()).unwrap();
        assert!(json.contains(r#""tick_interval":1000"#));
    }
}
