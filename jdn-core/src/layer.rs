use crate::error::{GardenError, Result};
use crate::properties::GardenProperties;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Years of the historical family-garden surveys.
pub const SNAPSHOT_YEARS: [i32; 4] = [1956, 1978, 2018, 2024];

/// Colour for snapshot years outside [`SNAPSHOT_YEARS`].
const NEUTRAL_COLOUR: &str = "#6b7280";

/// The geographic datasets layered over the basemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerKind {
    /// Administrative boundaries of the metropolitan area
    Boundaries,
    SharedGardens,
    /// Private gardens, the only ones with harvest statistics
    PrivateGardens,
    /// Family gardens as surveyed in the given year
    FamilySnapshot(i32),
}

impl LayerKind {
    /// Every dataset the dashboard loads, snapshots in ascending year order.
    pub fn all() -> Vec<LayerKind> {
        let mut kinds = vec![
            LayerKind::Boundaries,
            LayerKind::SharedGardens,
            LayerKind::PrivateGardens,
        ];
        kinds.extend(SNAPSHOT_YEARS.iter().map(|year| LayerKind::FamilySnapshot(*year)));
        kinds
    }

    /// GeoJSON file name of the dataset (WGS 84 coordinates).
    pub fn file_name(&self) -> String {
        match self {
            LayerKind::Boundaries => "limites_ems_4326.geojson".to_string(),
            LayerKind::SharedGardens => "jardins_partages_4326.geojson".to_string(),
            LayerKind::PrivateGardens => "jardins_prives_4326.geojson".to_string(),
            LayerKind::FamilySnapshot(year) => format!("jardins_familiaux_{year}_4326.geojson"),
        }
    }

    pub fn colour(&self) -> &'static str {
        match self {
            LayerKind::Boundaries => NEUTRAL_COLOUR,
            LayerKind::SharedGardens => "#10b981",
            LayerKind::PrivateGardens => "#f59e0b",
            LayerKind::FamilySnapshot(year) => snapshot_colour(*year),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Boundaries => write!(f, "Boundaries"),
            LayerKind::SharedGardens => write!(f, "Shared gardens"),
            LayerKind::PrivateGardens => write!(f, "Private gardens"),
            LayerKind::FamilySnapshot(year) => write!(f, "Family gardens ({year})"),
        }
    }
}

pub fn snapshot_colour(year: i32) -> &'static str {
    match year {
        1956 => "#ef4444",
        1978 => "#f97316",
        2018 => "#22c55e",
        2024 => "#3b82f6",
        _ => NEUTRAL_COLOUR,
    }
}

/// One feature of a layer: canonical properties plus untouched geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GardenFeature {
    pub properties: GardenProperties,
    pub geometry: Option<Value>,
}

/// A loaded geographic dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GardenLayer {
    pub kind: LayerKind,
    pub features: Vec<GardenFeature>,
}

#[derive(Deserialize)]
struct RawFeatureCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

impl GardenLayer {
    /// Parse a GeoJSON FeatureCollection, normalizing every feature's
    /// properties to [`GardenProperties`].
    pub fn parse_geojson(kind: LayerKind, geojson: &str) -> Result<GardenLayer> {
        let collection: RawFeatureCollection = serde_json::from_str(geojson)
            .map_err(|e| GardenError::parse(kind.file_name(), e))?;
        let features = collection
            .features
            .into_iter()
            .map(|raw| GardenFeature {
                properties: raw
                    .properties
                    .as_ref()
                    .map(GardenProperties::from_json)
                    .unwrap_or_default(),
                geometry: raw.geometry,
            })
            .collect::<Vec<_>>();
        log::info!("layer: loaded {} features for {}", features.len(), kind);
        Ok(GardenLayer { kind, features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Names of the named features, in dataset order.
    pub fn names(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter_map(|feature| feature.properties.name.as_deref())
            .collect()
    }

    /// Sum of the known feature areas, in square metres.
    pub fn total_area_m2(&self) -> f64 {
        self.features
            .iter()
            .filter_map(|feature| feature.properties.area_m2)
            .sum()
    }
}
