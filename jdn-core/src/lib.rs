//! Core types for the garden harvest dashboard.
//!
//! Everything that crosses the ingestion boundary is normalized here:
//! garden names become [`garden_key::GardenKey`]s, harvest spreadsheets
//! become [`harvest::HarvestSheet`]s with canonical column names, and
//! GeoJSON feature properties become [`properties::GardenProperties`].

pub mod error;
pub mod garden_key;
pub mod harvest;
pub mod layer;
pub mod properties;
pub mod source;

pub use error::{GardenError, Result};
pub use garden_key::GardenKey;
pub use harvest::{HarvestRow, HarvestSheet};
pub use layer::{GardenLayer, LayerKind};
