//! Canonical schema for GeoJSON feature properties.
//!
//! The garden datasets were produced by different people over several
//! decades, so the same attribute shows up as `Superficie`, `superficie`,
//! `SUPERFICIE`, `Superficie(m²)`, `SURFACE_M2`... Every spelling is folded
//! (diacritics stripped, lowercased, non-alphanumerics dropped) and looked
//! up once in [`canonical_property`].

use crate::garden_key::strip_diacritics;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Square metres per hectare.
const M2_PER_HECTARE: f64 = 10_000.0;

/// Normalized properties of one garden feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GardenProperties {
    pub name: Option<String>,
    /// Area in square metres
    pub area_m2: Option<f64>,
    /// Perimeter in metres
    pub perimeter_m: Option<f64>,
    /// Garden type, as recorded by the 2024 survey
    pub kind: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanonicalProperty {
    Name,
    AreaSquareMetres,
    AreaHectares,
    Perimeter,
    Kind,
    Address,
    Description,
}

fn canonical_property(key: &str) -> Option<CanonicalProperty> {
    let folded: String = strip_diacritics(key)
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    match folded.as_str() {
        "nom" | "name" => Some(CanonicalProperty::Name),
        "superficie" | "superficiem" | "superficiem2" | "surface" | "surfacem2" => {
            Some(CanonicalProperty::AreaSquareMetres)
        }
        "surfaceha" | "superficieha" => Some(CanonicalProperty::AreaHectares),
        "perimetre" | "perimeter" => Some(CanonicalProperty::Perimeter),
        "tpe" | "type" => Some(CanonicalProperty::Kind),
        "adresse" | "address" => Some(CanonicalProperty::Address),
        "description" => Some(CanonicalProperty::Description),
        _ => None,
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers, or numeric strings written either way (`1.5`, `1,5`, `12 000`).
fn number_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .replace(',', ".")
            .replace([' ', '\u{a0}', '\u{202f}'], "")
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

impl GardenProperties {
    /// Read the canonical properties out of a raw GeoJSON properties object.
    ///
    /// When several spellings of the same attribute are present the first
    /// usable one wins. A hectare area is only used when no square-metre
    /// area was found.
    pub fn from_json(raw: &Map<String, Value>) -> Self {
        let mut properties = GardenProperties::default();
        let mut hectares = None;
        for (key, value) in raw {
            let Some(canonical) = canonical_property(key) else {
                continue;
            };
            match canonical {
                CanonicalProperty::Name => {
                    properties.name = properties.name.take().or_else(|| text_value(value))
                }
                CanonicalProperty::AreaSquareMetres => {
                    properties.area_m2 = properties.area_m2.or_else(|| number_value(value))
                }
                CanonicalProperty::AreaHectares => {
                    hectares = hectares.or_else(|| number_value(value))
                }
                CanonicalProperty::Perimeter => {
                    properties.perimeter_m = properties.perimeter_m.or_else(|| number_value(value))
                }
                CanonicalProperty::Kind => {
                    properties.kind = properties.kind.take().or_else(|| text_value(value))
                }
                CanonicalProperty::Address => {
                    properties.address = properties.address.take().or_else(|| text_value(value))
                }
                CanonicalProperty::Description => {
                    properties.description =
                        properties.description.take().or_else(|| text_value(value))
                }
            }
        }
        if properties.area_m2.is_none() {
            properties.area_m2 = hectares.map(|ha| ha * M2_PER_HECTARE);
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::GardenProperties;
    use serde_json::json;

    fn props(value: serde_json::Value) -> GardenProperties {
        GardenProperties::from_json(value.as_object().unwrap())
    }

    #[test]
    fn test_area_spellings() {
        for key in ["Superficie", "superficie", "SUPERFICIE", "surface", "Surface", "Superficie(m²)", "SURFACE_M2", "SUPERFICIE_M2"] {
            let mut raw = serde_json::Map::new();
            raw.insert(key.to_string(), json!(250));
            let p = GardenProperties::from_json(&raw);
            assert_eq!(p.area_m2, Some(250.0), "key {key}");
        }
    }

    #[test]
    fn test_hectares_with_decimal_comma() {
        let p = props(json!({ "SURFACE_HA": "1,5" }));
        assert_eq!(p.area_m2, Some(15_000.0));
    }

    #[test]
    fn test_square_metres_preferred_over_hectares() {
        let p = props(json!({ "SURFACE_HA": 2, "SURFACE_M2": "19 850" }));
        assert_eq!(p.area_m2, Some(19_850.0));
    }

    #[test]
    fn test_historical_snapshot_properties() {
        let p = props(json!({
            "NOM": "Jardins familiaux du Heyritz",
            "TPE": "Jardin familial",
            "PERIMETRE": 412.5,
            "adresse": "Rue de la Klebsau"
        }));
        assert_eq!(p.name.as_deref(), Some("Jardins familiaux du Heyritz"));
        assert_eq!(p.kind.as_deref(), Some("Jardin familial"));
        assert_eq!(p.perimeter_m, Some(412.5));
        assert_eq!(p.address.as_deref(), Some("Rue de la Klebsau"));
        assert_eq!(p.area_m2, None);
    }

    #[test]
    fn test_blank_and_unknown_properties_ignored() {
        let p = props(json!({ "nom": "  ", "OBJECTID": 17, "superficie": "inconnue" }));
        assert_eq!(p, GardenProperties::default());
    }
}
