//! Dashboard configuration: a JSON file, then command-line overrides.

use anyhow::Context;
use jdn_cache::DEFAULT_CAPACITY;
use jdn_core::error::{GardenError, Result};
use jdn_data::aggregation::{YearRange, DEFAULT_YEAR_MAX, DEFAULT_YEAR_MIN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every option has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// First harvest year aggregated
    pub year_min: i32,
    /// Last harvest year aggregated
    pub year_max: i32,
    /// Gardens kept in the cache before the oldest is evicted
    pub cache_capacity: usize,
    /// Varieties ranked in the summary view
    pub top_summary: usize,
    /// Varieties ranked in the detail view
    pub top_detail: usize,
    /// Directory holding `stats_<garden_key>.csv` and the GeoJSON datasets
    pub data_dir: PathBuf,
    /// When set, data is fetched over HTTP from here instead of `data_dir`
    pub base_url: Option<String>,
    pub preferences_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            year_min: DEFAULT_YEAR_MIN,
            year_max: DEFAULT_YEAR_MAX,
            cache_capacity: DEFAULT_CAPACITY,
            top_summary: 3,
            top_detail: 10,
            data_dir: PathBuf::from("data"),
            base_url: None,
            preferences_path: PathBuf::from("preferences.json"),
        }
    }
}

impl DashboardConfig {
    /// Read a configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&body)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Configuration file if any, then the `--data-dir` override.
    pub fn resolve(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(data_dir) = data_dir {
            config.data_dir = data_dir;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.year_range()?;
        if self.cache_capacity == 0 {
            return Err(GardenError::InvalidConfig(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn year_range(&self) -> Result<YearRange> {
        YearRange::new(self.year_min, self.year_max)
    }
}
