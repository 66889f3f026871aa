//! Site metadata parsed from the geojson descriptor shipped with each
//! building archive.

use crate::error::SceneError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Properties every building descriptor must declare.
pub const REQUIRED_PROPERTIES: &[&str] = &[
    "address",
    "okrug",
    "rajon",
    "name",
    "developer",
    "designer",
    "cadNum",
    "FNO_code",
    "FNO_name",
    "ZU_area",
    "h_relief",
    "h_otn",
    "h_abs",
    "s_obsh",
    "s_naz",
    "s_podz",
    "spp_gns",
    "act_AGR",
    "imageBase64",
];

/// Numeric properties a reviewer may cross-check against the approval
/// documents.
pub const COMPARABLE_PROPERTIES: &[&str] =
    &["ZU_area", "h_relief", "s_obsh", "s_naz", "s_podz", "spp_gns"];

/// Parses a decimal written with either a comma or a dot separator.
/// Whitespace is ignored.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Physical parameters of one glazing material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlassParams {
    #[serde(rename = "color_RGB")]
    pub color_rgb: BTreeMap<String, String>,
    pub metallicity: String,
    pub roughness: String,
    pub refraction: String,
    pub transparency: String,
}

impl GlassParams {
    /// Colour normalised to `[0, 1]`, `None` when a component is missing or
    /// unparseable.
    pub fn rgb(&self) -> Option<[f64; 3]> {
        let get = |key: &str| {
            self.color_rgb
                .get(key)
                .and_then(|v| parse_decimal(v))
                .map(|v| v / 255.0)
        };
        Some([get("Red")?, get("Green")?, get("Blue")?])
    }
}

/// Parsed site descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoMetadata {
    /// `features[0].properties` as written.
    pub properties: Map<String, Value>,
    /// Glazing parameters keyed by material name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub glasses: BTreeMap<String, GlassParams>,
}

/// A reviewer-entered value that differs from the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub property: String,
    pub expected: String,
    pub actual: Option<String>,
}

impl GeoMetadata {
    /// Reads the first feature of a geojson document.
    pub fn from_geojson(text: &str) -> Result<Self, SceneError> {
        let doc: Value = serde_json::from_str(text)?;
        let feature = doc
            .get("features")
            .and_then(|f| f.get(0))
            .ok_or_else(|| SceneError::Geojson("no features".to_string()))?;
        let properties = feature
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| SceneError::Geojson("first feature has no properties".to_string()))?;

        let glasses = match feature.get("Glasses").and_then(|g| g.get(0)) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            properties,
            glasses,
        })
    }

    /// Property rendered as text; numbers keep their JSON spelling.
    pub fn property(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn decimal(&self, key: &str) -> Option<f64> {
        parse_decimal(&self.property(key)?)
    }

    pub fn address(&self) -> Option<String> {
        self.property("address")
    }

    pub fn fno_code(&self) -> Option<String> {
        self.property("FNO_code")
    }

    pub fn fno_name(&self) -> Option<String> {
        self.property("FNO_name")
    }

    /// Required properties absent from the descriptor, in declaration order.
    pub fn missing_properties(&self) -> Vec<&'static str> {
        REQUIRED_PROPERTIES
            .iter()
            .copied()
            .filter(|p| !self.properties.contains_key(*p))
            .collect()
    }

    pub fn glass(&self, material: &str) -> Option<&GlassParams> {
        self.glasses.get(material)
    }

    /// Compares expected numeric values with the descriptor. Unknown keys
    /// are ignored; values that do not parse are compared as text.
    pub fn compare_fields(&self, expected: &BTreeMap<String, String>) -> Vec<FieldMismatch> {
        let mut mismatches = Vec::new();
        for key in COMPARABLE_PROPERTIES {
            let Some(want) = expected.get(*key) else {
                continue;
            };
            let actual = self.property(key);
            let equal = match (parse_decimal(want), actual.as_deref().and_then(parse_decimal)) {
                (Some(a), Some(b)) => a == b,
                _ => actual.as_deref() == Some(want.as_str()),
            };
            if !equal {
                mismatches.push(FieldMismatch {
                    property: key.to_string(),
                    expected: want.clone(),
                    actual,
                });
            }
        }
        mismatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {
                "address": "Lenina 12",
                "FNO_code": "02 001",
                "FNO_name": "Residential",
                "ZU_area": "1234,5",
                "h_relief": 143.2
            },
            "Glasses": [{
                "M_Lenina12_MainGlass_1": {
                    "color_RGB": {"Red": "255", "Green": "127,5", "Blue": "0"},
                    "metallicity": "0,6",
                    "roughness": "0",
                    "refraction": "1,45",
                    "transparency": "0,4"
                }
            }]
        }]
    }"#;

    #[test]
    fn test_decimal_separators() {
        assert_eq!(parse_decimal("1234,5"), Some(1234.5));
        assert_eq!(parse_decimal(" 12.25 "), Some(12.25));
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_parse_properties_and_glasses() {
        let meta = GeoMetadata::from_geojson(SAMPLE).unwrap();
        assert_eq!(meta.address().as_deref(), Some("Lenina 12"));
        assert_eq!(meta.fno_code().as_deref(), Some("02 001"));
        assert_eq!(meta.decimal("ZU_area"), Some(1234.5));
        assert_eq!(meta.decimal("h_relief"), Some(143.2));
        let glass = meta.glass("M_Lenina12_MainGlass_1").unwrap();
        assert_eq!(glass.rgb(), Some([1.0, 0.5, 0.0]));
    }

    #[test]
    fn test_missing_properties_listed_in_order() {
        let meta = GeoMetadata::from_geojson(SAMPLE).unwrap();
        let missing = meta.missing_properties();
        assert_eq!(missing.first(), Some(&"okrug"));
        assert!(!missing.contains(&"address"));
        assert_eq!(missing.len(), REQUIRED_PROPERTIES.len() - 5);
    }

    #[test]
    fn test_no_features_is_error() {
        let err = GeoMetadata::from_geojson(r#"{"features": []}"#).unwrap_err();
        assert!(matches!(err, SceneError::Geojson(_)));
    }

    #[test]
    fn test_compare_fields() {
        let meta = GeoMetadata::from_geojson(SAMPLE).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("ZU_area".to_string(), "1234.5".to_string());
        expected.insert("h_relief".to_string(), "140".to_string());
        expected.insert("s_obsh".to_string(), "10".to_string());
        let mismatches = meta.compare_fields(&expected);
        assert_eq!(
            mismatches,
            vec![
                FieldMismatch {
                    property: "h_relief".to_string(),
                    expected: "140".to_string(),
                    actual: Some("143.2".to_string()),
                },
                FieldMismatch {
                    property: "s_obsh".to_string(),
                    expected: "10".to_string(),
                    actual: None,
                },
            ]
        );
    }
}
