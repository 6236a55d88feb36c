//! Geographic layers and the overview figures shown on the home panel.

use futures::future::join_all;
use jdn_core::error::GardenError;
use jdn_core::layer::{GardenLayer, LayerKind};
use jdn_core::source::GardenSource;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Every layer that loaded, plus the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: BTreeMap<LayerKind, GardenLayer>,
    failures: Vec<(LayerKind, GardenError)>,
}

impl LayerRegistry {
    /// Fetch every dataset concurrently. A dataset that fails is logged and
    /// left out; the others still load.
    pub async fn load_all(source: &dyn GardenSource) -> LayerRegistry {
        let kinds = LayerKind::all();
        let results = join_all(kinds.iter().map(|kind| source.fetch_layer(*kind))).await;

        let mut registry = LayerRegistry::default();
        for (kind, result) in kinds.into_iter().zip(results) {
            match result {
                Ok(layer) => {
                    registry.layers.insert(kind, layer);
                }
                Err(e) => {
                    warn!("layers: {} unavailable: {}", kind, e);
                    registry.failures.push((kind, e));
                }
            }
        }
        info!(
            "layers: {} loaded, {} failed",
            registry.layers.len(),
            registry.failures.len()
        );
        registry
    }

    pub fn get(&self, kind: LayerKind) -> Option<&GardenLayer> {
        self.layers.get(&kind)
    }

    /// Loaded layers in [`LayerKind`] order.
    pub fn iter(&self) -> impl Iterator<Item = &GardenLayer> {
        self.layers.values()
    }

    pub fn failures(&self) -> &[(LayerKind, GardenError)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn overview(&self) -> OverviewStats {
        let count = |kind: LayerKind| self.get(kind).map_or(0, GardenLayer::len);
        let private_gardens = count(LayerKind::PrivateGardens);
        let shared_gardens = count(LayerKind::SharedGardens);

        let evolution: Vec<SnapshotCount> = self
            .layers
            .values()
            .filter_map(|layer| match layer.kind {
                LayerKind::FamilySnapshot(year) => Some(SnapshotCount {
                    year,
                    count: layer.len(),
                }),
                _ => None,
            })
            .collect();
        let family_gardens = if evolution.is_empty() {
            0
        } else {
            let sum: usize = evolution.iter().map(|snapshot| snapshot.count).sum();
            (sum as f64 / evolution.len() as f64).round() as usize
        };

        let area = |kind: LayerKind| self.get(kind).map_or(0.0, GardenLayer::total_area_m2);
        let total_area_m2 = area(LayerKind::PrivateGardens) + area(LayerKind::SharedGardens);

        let private_garden_names = self
            .get(LayerKind::PrivateGardens)
            .map(|layer| layer.names().into_iter().map(String::from).collect())
            .unwrap_or_default();

        OverviewStats {
            private_gardens,
            shared_gardens,
            total_gardens: private_gardens + shared_gardens,
            total_area_m2,
            family_gardens,
            evolution,
            private_garden_names,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub private_gardens: usize,
    pub shared_gardens: usize,
    /// Private plus shared
    pub total_gardens: usize,
    /// Known area of the private and shared gardens, in square metres
    pub total_area_m2: f64,
    /// Mean family garden count across the loaded snapshots, rounded
    pub family_gardens: usize,
    /// Family garden count per snapshot, ascending by year
    pub evolution: Vec<SnapshotCount>,
    /// Private gardens that have a name, hence possibly a harvest sheet
    pub private_garden_names: Vec<String>,
}
