//! Ingestion adapters: where harvest sheets and layer datasets come from.
//!
//! Adapters never retry on their own. A failed fetch is reported to the
//! caller, which retries on the next user interaction.

use crate::error::{GardenError, Result};
use crate::garden_key::GardenKey;
use crate::harvest::HarvestSheet;
use crate::layer::{GardenLayer, LayerKind};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fetches and parses garden data.
#[async_trait]
pub trait GardenSource: Send + Sync {
    /// Fetch the harvest sheet of one garden.
    ///
    /// Fails with [`GardenError::NotFound`] when the garden has no sheet and
    /// [`GardenError::Parse`] when the sheet cannot be read at all.
    async fn fetch_garden_rows(&self, key: &GardenKey) -> Result<HarvestSheet>;

    /// Fetch one geographic dataset.
    async fn fetch_layer(&self, kind: LayerKind) -> Result<GardenLayer>;
}

/// Reads `stats_<key>.csv` sheets and GeoJSON datasets from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read(&self, file_name: &str) -> Result<String> {
        let path = self.root.join(file_name);
        debug!("source: reading {}", path.display());
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => GardenError::NotFound(file_name.to_string()),
            ErrorKind::InvalidData => GardenError::parse(file_name, e),
            _ => GardenError::Io {
                origin: path.display().to_string(),
                message: e.to_string(),
            },
        })
    }
}

#[async_trait]
impl GardenSource for DirectorySource {
    async fn fetch_garden_rows(&self, key: &GardenKey) -> Result<HarvestSheet> {
        let file_name = key.sheet_file_name();
        let body = self.read(&file_name).await?;
        HarvestSheet::parse_csv(&file_name, &body)
    }

    async fn fetch_layer(&self, kind: LayerKind) -> Result<GardenLayer> {
        let body = self.read(&kind.file_name()).await?;
        GardenLayer::parse_geojson(kind, &body)
    }
}

/// Fetches sheets and datasets relative to a base URL.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "api")]
impl HttpSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, file_name: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, file_name);
        debug!("source: fetching {}", url);
        let transient = |message: String| GardenError::TransientNetwork {
            origin: url.clone(),
            message,
        };
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transient(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GardenError::NotFound(file_name.to_string()));
        }
        if !response.status().is_success() {
            return Err(transient(format!("bad response status {}", response.status())));
        }
        response.text().await.map_err(|e| transient(e.to_string()))
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl GardenSource for HttpSource {
    async fn fetch_garden_rows(&self, key: &GardenKey) -> Result<HarvestSheet> {
        let file_name = key.sheet_file_name();
        let body = self.get(&file_name).await?;
        HarvestSheet::parse_csv(&file_name, &body)
    }

    async fn fetch_layer(&self, kind: LayerKind) -> Result<GardenLayer> {
        let body = self.get(&kind.file_name()).await?;
        GardenLayer::parse_geojson(kind, &body)
    }
}

/// In-memory source holding pre-parsed data, counting garden fetches.
///
/// Used to embed the dashboard without files and to exercise the cache.
#[derive(Debug, Default)]
pub struct MemorySource {
    sheets: HashMap<GardenKey, HarvestSheet>,
    layers: HashMap<LayerKind, GardenLayer>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, garden_name: &str, sheet: HarvestSheet) -> Self {
        self.sheets.insert(GardenKey::from_name(garden_name), sheet);
        self
    }

    pub fn with_layer(mut self, layer: GardenLayer) -> Self {
        self.layers.insert(layer.kind, layer);
        self
    }

    /// Number of `fetch_garden_rows` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GardenSource for MemorySource {
    async fn fetch_garden_rows(&self, key: &GardenKey) -> Result<HarvestSheet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.sheets
            .get(key)
            .cloned()
            .ok_or_else(|| GardenError::NotFound(key.sheet_file_name()))
    }

    async fn fetch_layer(&self, kind: LayerKind) -> Result<GardenLayer> {
        self.layers
            .get(&kind)
            .cloned()
            .ok_or_else(|| GardenError::NotFound(kind.file_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_source_reads_sheet() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("stats_Jardin_Sainte-Helene.csv"),
            "Variétés,2020,2021\nTomate,1200,1500\n",
        )
        .unwrap();
        let source = DirectorySource::new(dir.path());
        let sheet = source
            .fetch_garden_rows(&GardenKey::from_name("Jardin Sainte-Hélène"))
            .await
            .unwrap();
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rows[0].quantity(2021), 1500.0);
    }

    #[tokio::test]
    async fn test_directory_source_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        let result = source
            .fetch_garden_rows(&GardenKey::from_name("Jardin inconnu"))
            .await;
        assert_eq!(
            result,
            Err(GardenError::NotFound("stats_Jardin_inconnu.csv".to_string()))
        );
    }

    #[tokio::test]
    async fn test_directory_source_reads_layer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("jardins_familiaux_1956_4326.geojson"),
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{"nom":"A"}}]}"#,
        )
        .unwrap();
        let source = DirectorySource::new(dir.path());
        let layer = source.fetch_layer(LayerKind::FamilySnapshot(1956)).await.unwrap();
        assert_eq!(layer.names(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_memory_source_counts_fetches() {
        let source = MemorySource::new().with_sheet("Jardin X", HarvestSheet::default());
        let key = GardenKey::from_name("Jardin X");
        assert!(source.fetch_garden_rows(&key).await.is_ok());
        assert!(source
            .fetch_garden_rows(&GardenKey::from_name("Jardin Y"))
            .await
            .is_err());
        assert_eq!(source.fetch_count(), 2);
    }
}
