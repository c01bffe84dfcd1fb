//! Reading POI and link feature collections, and writing annotated POIs back out.

use crate::batch::{BatchClassifier, ScenarioSummary};
use crate::coordinate::Coordinate;
use crate::geometry::GeometryService;
use crate::model::{ClassificationResult, Link, Poi};
use crate::path_order::PathOrderer;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use std::path::Path;
use thiserror::Error;
use tracing::{error, warn};

pub mod keys {
    pub const POI_ID: &str = "POI_ID";
    pub const POI_LINK_ID: &str = "LINK_ID";
    pub const PERCFRREF: &str = "PERCFRREF";
    pub const ST_NAME: &str = "ST_NAME";
    pub const MULTIDIGIT: &str = "MULTIDIGIT";
    pub const LINK_ID: &str = "link_id";
    pub const URBAN: &str = "URBAN";
    pub const FUNC_CLASS: &str = "FUNC_CLASS";
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' is not valid GeoJSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: geojson::Error,
    },
}

pub fn read_geojson(path: &Path) -> Result<GeoJson, LoadError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    text.parse::<GeoJson>().map_err(|source| LoadError::Parse {
        path: display,
        source,
    })
}

/// Stringifies a scalar attribute. Integral numbers print without a
/// fractional part so `1` and `1.0` both read as `"1"`; null reads as absent.
pub fn property_string(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        other => Some(other.to_string()),
    }
}

fn positions(value: &Value) -> Vec<Coordinate> {
    let raw: Vec<&Vec<f64>> = match value {
        Value::Point(p) => vec![p],
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().collect(),
        Value::MultiLineString(lines) => lines.iter().flatten().collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .filter_map(|p| Coordinate::from_position(p))
        .collect()
}

pub fn poi_from_feature(feature: &Feature) -> Poi {
    let properties = feature.properties.clone().unwrap_or_default();

    let position = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(p)) => Coordinate::from_position(p),
        _ => None,
    };

    Poi {
        poi_id: property_string(&properties, keys::POI_ID),
        position,
        link_id: property_string(&properties, keys::POI_LINK_ID),
        perc_from_ref: property_string(&properties, keys::PERCFRREF),
        street_name: property_string(&properties, keys::ST_NAME),
        multi_digit: property_string(&properties, keys::MULTIDIGIT),
        properties,
        feature_id: feature.id.clone(),
        bbox: feature.bbox.clone(),
        foreign_members: feature.foreign_members.clone(),
    }
}

/// `None` when the feature has no `link_id`, since it could never be matched.
pub fn link_from_feature(feature: &Feature) -> Option<Link> {
    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);

    let id = property_string(properties, keys::LINK_ID)?;
    let geometry = feature
        .geometry
        .as_ref()
        .map(|g| positions(&g.value))
        .unwrap_or_default();

    Some(Link {
        id,
        geometry,
        urban: property_string(properties, keys::URBAN),
        functional_class: property_string(properties, keys::FUNC_CLASS),
        street_name: property_string(properties, keys::ST_NAME),
        multi_digit: property_string(properties, keys::MULTIDIGIT),
    })
}

pub fn pois_from_collection(collection: &FeatureCollection) -> Vec<Poi> {
    collection.features.iter().map(poi_from_feature).collect()
}

pub fn links_from_collection(collection: &FeatureCollection) -> Vec<Link> {
    let links: Vec<Link> = collection
        .features
        .iter()
        .filter_map(link_from_feature)
        .collect();

    let skipped = collection.features.len() - links.len();
    if skipped > 0 {
        warn!("{} link features without {} skipped", skipped, keys::LINK_ID);
    }

    links
}

/// Classifies two raw GeoJSON documents.
///
/// A POI document that is not a feature collection yields no results; a link
/// document that is missing or not a feature collection marks every POI
/// unprocessable.
pub fn classify_geojson<G: GeometryService, O: PathOrderer>(
    batch: &BatchClassifier<G, O>,
    pois: &GeoJson,
    links: Option<&GeoJson>,
) -> Vec<ClassificationResult> {
    let GeoJson::FeatureCollection(poi_collection) = pois else {
        error!("POI input must be a FeatureCollection");
        return Vec::new();
    };
    let pois = pois_from_collection(poi_collection);

    match links {
        Some(GeoJson::FeatureCollection(link_collection)) => {
            let links = links_from_collection(link_collection);
            batch.classify_all(&pois, Some(&links[..]))
        }
        Some(_) => {
            error!("link input must be a FeatureCollection");
            batch.classify_all(&pois, None)
        }
        None => {
            error!("no link input");
            batch.classify_all(&pois, None)
        }
    }
}

/// The source POI feature with the annotations added to its properties.
pub fn result_to_feature(result: &ClassificationResult) -> Feature {
    let poi = &result.poi;
    Feature {
        bbox: poi.bbox.clone(),
        geometry: poi
            .position
            .map(|p| Geometry::new(Value::Point(p.to_position()))),
        id: poi.feature_id.clone(),
        properties: Some(result.annotated_properties()),
        foreign_members: poi.foreign_members.clone(),
    }
}

pub fn results_to_feature_collection<'a, I>(results: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a ClassificationResult>,
{
    FeatureCollection {
        bbox: None,
        features: results.into_iter().map(result_to_feature).collect(),
        foreign_members: None,
    }
}

/// One collection per scenario that has results, named `Scenario_<code>`.
pub fn scenario_collections(summary: &ScenarioSummary<'_>) -> Vec<(String, FeatureCollection)> {
    summary
        .groups()
        .map(|(scenario, group)| {
            (
                scenario.to_string(),
                results_to_feature_collection(group.iter().copied()),
            )
        })
        .collect()
}
