use crate::error::RouterError;
use crate::network::InterfaceId;
use crate::types::Metric;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_NUM_NICS: usize = 4;
pub const DEFAULT_METRIC_UNREACHABLE: Metric = Metric::MAX;

/// Static router parameters, fixed for the lifetime of a router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of network interfaces; valid interface ids are `0..num_nics`.
    pub num_nics: usize,
    /// Metric value meaning "unreachable". Every usable cost is below it.
    pub metric_unreachable: Metric,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            num_nics: DEFAULT_NUM_NICS,
            metric_unreachable: DEFAULT_METRIC_UNREACHABLE,
        }
    }
}

impl RouterConfig {
    pub fn new(num_nics: usize, metric_unreachable: Metric) -> Self {
        Self {
            num_nics,
            metric_unreachable,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: RouterConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        debug!("Loaded router config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        if self.num_nics == 0 {
            return Err(RouterError::InvalidConfig(
                "router needs at least one interface".to_string(),
            ));
        }
        if self.metric_unreachable < 1 {
            return Err(RouterError::InvalidConfig(
                "unreachable metric must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interface(&self, index: usize) -> Result<InterfaceId, RouterError> {
        InterfaceId::checked(index, self.num_nics)
    }

    /// Cost of a route announced with `metric` by a neighbor one hop away.
    /// Saturates at the unreachable sentinel instead of wrapping.
    pub fn cost(&self, metric: Metric) -> Metric {
        metric.saturating_add(1).min(self.metric_unreachable)
    }

    pub fn is_unreachable(&self, metric: Metric) -> bool {
        metric >= self.metric_unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sim-router-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = RouterConfig::default();
        assert_eq!(config.num_nics, DEFAULT_NUM_NICS);
        assert_eq!(config.metric_unreachable, u32::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            RouterConfig::new(0, 16).validate(),
            Err(RouterError::InvalidConfig(_))
        ));
        assert!(matches!(
            RouterConfig::new(2, 0).validate(),
            Err(RouterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cost_saturates() {
        let config = RouterConfig::default();
        assert_eq!(config.cost(0), 1);
        assert_eq!(config.cost(41), 42);
        assert_eq!(config.cost(u32::MAX - 1), u32::MAX);
        assert_eq!(config.cost(u32::MAX), u32::MAX);
        assert!(config.is_unreachable(config.cost(u32::MAX - 1)));
        assert!(!config.is_unreachable(config.cost(u32::MAX - 2)));

        let rip = RouterConfig::new(4, 16);
        assert_eq!(rip.cost(14), 15);
        assert_eq!(rip.cost(15), 16);
        assert_eq!(rip.cost(200), 16);
        assert!(rip.is_unreachable(rip.cost(15)));
    }

    #[test]
    fn test_interface_range() {
        let config = RouterConfig::new(2, 16);
        assert_eq!(config.interface(1), Ok(InterfaceId(1)));
        assert!(config.interface(2).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save-load");
        let config = RouterConfig::new(8, 16);
        config.save(&path).unwrap();
        let loaded = RouterConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_and_invalid() {
        let path = temp_path("partial");
        fs::write(&path, r#"{ "num_nics": 6 }"#).unwrap();
        let loaded = RouterConfig::load(&path).unwrap();
        assert_eq!(loaded, RouterConfig::new(6, DEFAULT_METRIC_UNREACHABLE));

        fs::write(&path, r#"{ "num_nics": 0 }"#).unwrap();
        assert!(RouterConfig::load(&path).is_err());
        fs::remove_file(&path).unwrap();
    }
}
