//! The dashboard session: configuration, cache, data source, layers,
//! event dispatch and preferences owned by one value.
//!
//! # Architecture
//!
//! - [`DashboardState::init`] builds everything from a [`DashboardConfig`]
//! - [`DashboardState::select_garden`] is the one path from a garden name
//!   to its statistics, always through the cache
//! - [`DashboardState::shutdown`] empties the cache and saves preferences
//!   changed during the session

use crate::config::DashboardConfig;
use crate::events::{DashboardEvent, EventDispatcher};
use crate::layers::LayerRegistry;
use crate::preferences::Preferences;
use chrono::{DateTime, Utc};
use jdn_cache::{CacheEntry, GardenCache};
use jdn_core::error::{GardenError, Result};
use jdn_core::garden_key::GardenKey;
use jdn_core::source::{DirectorySource, GardenSource, HttpSource};
use jdn_data::aggregation::YearRange;
use jdn_data::statistics::{top_n, DerivedStats, VarietyValue};
use jdn_export::{export_file_name, ExportReport, ReportInput, ReportSink};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// What the sidebar and charts show for one garden.
#[derive(Debug, Clone)]
pub struct GardenView {
    pub name: String,
    pub entry: Arc<CacheEntry>,
    pub derived: DerivedStats,
    /// Largest varieties for the summary panel
    pub top_summary: Vec<VarietyValue>,
    /// Largest varieties for the detail chart
    pub top_detail: Vec<VarietyValue>,
}

impl GardenView {
    pub fn key(&self) -> &GardenKey {
        &self.entry.key
    }
}

pub struct DashboardState {
    config: DashboardConfig,
    range: YearRange,
    cache: GardenCache,
    source: Arc<dyn GardenSource>,
    layers: LayerRegistry,
    events: EventDispatcher,
    preferences: Preferences,
    /// Preferences as loaded, to tell whether the session changed them
    loaded_preferences: Preferences,
}

impl DashboardState {
    /// Build a session reading from `base_url` when configured, from
    /// `data_dir` otherwise.
    pub fn init(config: DashboardConfig) -> Result<DashboardState> {
        let source: Arc<dyn GardenSource> = match &config.base_url {
            Some(base_url) => {
                info!("session: fetching garden data from {}", base_url);
                Arc::new(HttpSource::new(reqwest::Client::new(), base_url.as_str()))
            }
            None => {
                info!("session: reading garden data from {}", config.data_dir.display());
                Arc::new(DirectorySource::new(config.data_dir.clone()))
            }
        };
        Self::with_source(config, source)
    }

    pub fn with_source(
        config: DashboardConfig,
        source: Arc<dyn GardenSource>,
    ) -> Result<DashboardState> {
        config.validate()?;
        let range = config.year_range()?;
        let preferences = Preferences::load(&config.preferences_path);
        Ok(DashboardState {
            cache: GardenCache::new(config.cache_capacity),
            range,
            source,
            layers: LayerRegistry::default(),
            events: EventDispatcher::new(),
            loaded_preferences: preferences.clone(),
            preferences,
            config,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &GardenCache {
        &self.cache
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventDispatcher {
        &mut self.events
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    /// Load every geographic layer, replacing any previously loaded ones.
    pub async fn load_layers(&mut self) -> &LayerRegistry {
        self.layers = LayerRegistry::load_all(self.source.as_ref()).await;
        for layer in self.layers.iter() {
            self.events.dispatch(&DashboardEvent::LayerLoaded {
                kind: layer.kind,
                features: layer.len(),
            });
        }
        for (kind, error) in self.layers.failures() {
            self.events.dispatch(&DashboardEvent::LayerFailed {
                kind: *kind,
                message: error.to_string(),
            });
        }
        &self.layers
    }

    /// Statistics for the garden called `name`, loaded at most once while cached.
    pub async fn select_garden(&self, name: &str) -> Result<GardenView> {
        let key = GardenKey::from_name(name);
        self.events.dispatch(&DashboardEvent::GardenSelected { key: key.clone() });

        let source = Arc::clone(&self.source);
        let range = self.range;
        let loader_key = key.clone();
        let loaded = self
            .cache
            .get_or_load(&key, move || async move {
                let sheet = source.fetch_garden_rows(&loader_key).await?;
                Ok(CacheEntry::from_sheet(loader_key, sheet, range))
            })
            .await;

        let entry = match loaded {
            Ok(entry) => entry,
            Err(e) => {
                warn!("session: {} not loaded: {}", key, e);
                self.events.dispatch(&DashboardEvent::LoadFailed {
                    key,
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
                return Err(e);
            }
        };
        self.events.dispatch(&DashboardEvent::StatisticsLoaded {
            key,
            total_grams: entry.variety_totals.total(),
            varieties: entry.variety_totals.len(),
        });

        Ok(GardenView {
            name: name.trim().to_string(),
            derived: entry.derived(),
            top_summary: top_n(&entry.variety_totals, self.config.top_summary),
            top_detail: top_n(&entry.variety_totals, self.config.top_detail),
            entry,
        })
    }

    /// Build the export report of the garden called `name`.
    pub async fn garden_report(
        &self,
        name: &str,
        exported_at: DateTime<Utc>,
    ) -> Result<ExportReport> {
        let view = self.select_garden(name).await?;
        let input = ReportInput {
            garden_name: &view.name,
            sheet: &view.entry.sheet,
            variety_totals: &view.entry.variety_totals,
            year_totals: &view.entry.year_totals,
            derived: &view.derived,
        };
        Ok(ExportReport::build(input, exported_at))
    }

    /// Export the garden called `name` through `sink`. A failed write can
    /// be retried by exporting again.
    pub async fn export_garden(
        &self,
        name: &str,
        sink: &dyn ReportSink,
        exported_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let report = self.garden_report(name, exported_at).await?;
        let file_name = export_file_name(
            &report.summary.garden_name,
            exported_at.date_naive(),
            sink.extension(),
        );
        let path = sink.write_report(&report, &file_name)?;
        self.events.dispatch(&DashboardEvent::ExportWritten {
            key: GardenKey::from_name(name),
            path: path.clone(),
        });
        Ok(path)
    }

    /// Drop every cached garden. Preferences changed during the session
    /// are saved with the visit time; unchanged ones are not written.
    pub fn shutdown(mut self) -> Result<()> {
        let saved = if self.preferences != self.loaded_preferences {
            self.preferences.touch(Utc::now());
            self.preferences.save(&self.config.preferences_path)
        } else {
            Ok(())
        };
        let stats = self.cache.stats();
        self.cache.clear();
        info!(
            "session: closed after {} loads, {} hits, {} misses",
            stats.loads, stats.hits, stats.misses
        );
        saved
    }
}

impl std::fmt::Debug for DashboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardState")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .field("layers", &self.layers.len())
            .field("events", &self.events)
            .finish()
    }
}

/// Reject a garden name that cannot produce a key.
pub fn require_garden_name(name: &str) -> Result<&str> {
    if GardenKey::from_name(name).as_str().is_empty() {
        return Err(GardenError::InvalidConfig("garden name is empty".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jdn_core::harvest::HarvestSheet;
    use jdn_core::source::MemorySource;
    use jdn_export::{CsvReportSink, JsonReportSink};
    use std::sync::Mutex;

    const ROSES: &str = "\
Variétés,2020,2021,2022,2023,2024
Tomate,1000,1000,1000,1000,1500
Courgette,300,300,300,300,600
Ail,50,,,,
";

    struct Fixture {
        state: DashboardState,
        source: Arc<MemorySource>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            year_min: 2020,
            year_max: 2024,
            top_summary: 2,
            preferences_path: dir.path().join("preferences.json"),
            ..DashboardConfig::default()
        };
        let sheet = HarvestSheet::parse_csv("stats_jardin_des_roses.csv", ROSES).unwrap();
        let source = Arc::new(MemorySource::new().with_sheet("Jardin des Roses", sheet));
        let state = DashboardState::with_source(config, source.clone()).unwrap();
        Fixture {
            state,
            source,
            _dir: dir,
        }
    }

    fn record_events(state: &mut DashboardState) -> Arc<Mutex<Vec<&'static str>>> {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        state.events_mut().register("test", move |event: &DashboardEvent| {
            sink.lock().unwrap().push(event.name())
        });
        names
    }

    #[tokio::test]
    async fn test_select_garden() {
        let mut fixture = fixture();
        let events = record_events(&mut fixture.state);

        let view = fixture.state.select_garden("Jardin  des Roses").await.unwrap();
        assert_eq!(view.key().as_str(), "Jardin_des_Roses");
        assert_eq!(view.entry.variety_totals.get("Tomate"), Some(5500.0));
        assert_eq!(view.entry.year_totals.get(2024), 2100.0);
        assert_eq!(view.derived.trend.direction, jdn_data::TrendDirection::Growing);
        let top: Vec<&str> = view.top_summary.iter().map(|v| v.variety.as_str()).collect();
        assert_eq!(top, vec!["Tomate", "Courgette"]);
        assert_eq!(view.top_detail.len(), 3);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["garden_selected", "statistics_loaded"]
        );
    }

    #[tokio::test]
    async fn test_second_selection_is_served_from_cache() {
        let fixture = fixture();
        let first = fixture.state.select_garden("Jardin des Roses").await.unwrap();
        let second = fixture.state.select_garden("Jardin des Roses").await.unwrap();
        assert!(Arc::ptr_eq(&first.entry, &second.entry));
        assert_eq!(fixture.source.fetch_count(), 1);
        assert_eq!(fixture.state.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_concurrent_selections_fetch_once() {
        let fixture = fixture();
        let (a, b) = tokio::join!(
            fixture.state.select_garden("Jardin des Roses"),
            fixture.state.select_garden("Jardin des Roses"),
        );
        assert!(Arc::ptr_eq(&a.unwrap().entry, &b.unwrap().entry));
        assert_eq!(fixture.source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_garden_is_not_cached() {
        let mut fixture = fixture();
        let events = record_events(&mut fixture.state);

        let err = fixture.state.select_garden("Jardin Inconnu").await.unwrap_err();
        assert!(matches!(err, GardenError::NotFound(_)));
        assert!(fixture.state.select_garden("Jardin Inconnu").await.is_err());
        assert_eq!(fixture.source.fetch_count(), 2);
        assert!(fixture.state.cache().is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec!["garden_selected", "load_failed", "garden_selected", "load_failed"]
        );
    }

    #[tokio::test]
    async fn test_export_garden() {
        let mut fixture = fixture();
        let events = record_events(&mut fixture.state);
        let out = tempfile::tempdir().unwrap();
        let exported_at = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();

        let path = fixture
            .state
            .export_garden("Jardin des Roses", &CsvReportSink::new(out.path()), exported_at)
            .await
            .unwrap();
        assert_eq!(
            path,
            out.path().join("export_jardin_Jardin_des_Roses_2026-10-18.csv")
        );
        assert!(path.exists());

        let json = fixture
            .state
            .export_garden("Jardin des Roses", &JsonReportSink::new(out.path()), exported_at)
            .await
            .unwrap();
        assert_eq!(json.extension().unwrap(), "json");
        assert_eq!(fixture.source.fetch_count(), 1);
        assert_eq!(events.lock().unwrap().last(), Some(&"export_written"));
    }

    #[tokio::test]
    async fn test_garden_report_for_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            preferences_path: dir.path().join("preferences.json"),
            ..DashboardConfig::default()
        };
        let source =
            Arc::new(MemorySource::new().with_sheet("Jardin Vide", HarvestSheet::default()));
        let state = DashboardState::with_source(config, source).unwrap();

        let report = state.garden_report("Jardin Vide", Utc::now()).await.unwrap();
        assert_eq!(report.summary.total_grams, 0.0);
        assert_eq!(report.per_year.len(), 7);
    }

    #[tokio::test]
    async fn test_shutdown_saves_preferences_and_clears_cache() {
        let mut fixture = fixture();
        let path = fixture.state.config().preferences_path.clone();
        fixture.state.preferences_mut().tutorial_shown = true;
        fixture.state.select_garden("Jardin des Roses").await.unwrap();
        let cache = fixture.state.cache().clone();
        assert_eq!(cache.len(), 1);

        fixture.state.shutdown().unwrap();
        assert!(cache.is_empty());
        let saved = Preferences::load(&path);
        assert!(saved.tutorial_shown);
        assert!(saved.last_visit.is_some());
    }

    #[tokio::test]
    async fn test_shutdown_without_changes_writes_nothing() {
        let fixture = fixture();
        let path = fixture.state.config().preferences_path.clone();
        fixture.state.select_garden("Jardin des Roses").await.unwrap();

        fixture.state.shutdown().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DashboardConfig {
            year_min: 2030,
            ..DashboardConfig::default()
        };
        let err = DashboardState::with_source(config, Arc::new(MemorySource::new())).unwrap_err();
        assert!(matches!(err, GardenError::InvalidConfig(_)));
    }

    #[test]
    fn test_require_garden_name() {
        assert!(require_garden_name("Jardin Nord").is_ok());
        assert!(require_garden_name("   ").is_err());
    }
}
