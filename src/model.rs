use crate::coordinate::Coordinate;
use geojson::feature::Id;
use geojson::{Bbox, JsonObject};
use serde::{Serialize, Serializer};
use std::fmt;

/// A road-network link as read from the streets dataset.
///
/// Geometry order is not trusted; the engine rebuilds it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Link {
    pub id: String,
    pub geometry: Vec<Coordinate>,
    pub urban: Option<String>,
    pub functional_class: Option<String>,
    pub street_name: Option<String>,
    pub multi_digit: Option<String>,
}

/// A point of interest claiming a position along one link.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Poi {
    pub poi_id: Option<String>,
    /// `None` when the source geometry was missing or malformed.
    pub position: Option<Coordinate>,
    pub link_id: Option<String>,
    /// Raw PERCFRREF text on the 0-100 scale, validated at classification time.
    pub perc_from_ref: Option<String>,
    pub street_name: Option<String>,
    pub multi_digit: Option<String>,
    /// Every attribute of the source feature, untouched.
    pub properties: JsonObject,
    /// Source feature members outside `properties`, written back on output.
    pub feature_id: Option<Id>,
    pub bbox: Option<Bbox>,
    pub foreign_members: Option<JsonObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scenario {
    Unprocessable = 1,
    OffsetExceeded = 2,
    NameMismatch = 3,
    Valid = 4,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Unprocessable,
        Scenario::OffsetExceeded,
        Scenario::NameMismatch,
        Scenario::Valid,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scenario_{}", self.code())
    }
}

impl Serialize for Scenario {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DebugInfo {
    pub expected: Option<Coordinate>,
    #[serde(rename = "distance")]
    pub distance_m: Option<f64>,
    #[serde(rename = "threshold")]
    pub threshold_m: Option<f64>,
    #[serde(rename = "multiDigitMismatch")]
    pub multi_digit_mismatch: Option<bool>,
    #[serde(rename = "isUrban")]
    pub is_urban: bool,
    #[serde(rename = "isHighway")]
    pub is_highway: bool,
}

/// Outcome for one POI. Built once per POI and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub poi: Poi,
    pub scenario: Scenario,
    pub reason: String,
    pub debug: DebugInfo,
}

impl ClassificationResult {
    pub fn new(poi: &Poi, scenario: Scenario, reason: impl Into<String>, debug: DebugInfo) -> Self {
        Self {
            poi: poi.clone(),
            scenario,
            reason: reason.into(),
            debug,
        }
    }

    pub fn unprocessable(poi: &Poi, reason: impl Into<String>, debug: DebugInfo) -> Self {
        Self::new(poi, Scenario::Unprocessable, reason, debug)
    }

    /// The original attributes with `_scenario`, `_reason` and `_debug` appended.
    pub fn annotated_properties(&self) -> JsonObject {
        let mut properties = self.poi.properties.clone();
        properties.insert("_scenario".to_string(), self.scenario.code().into());
        properties.insert("_reason".to_string(), self.reason.clone().into());
        if let Ok(debug) = serde_json::to_value(&self.debug) {
            properties.insert("_debug".to_string(), debug);
        }
        properties
    }
}
