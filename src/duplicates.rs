//! Repeated POI records: same POI_ID at exactly the same coordinate.

use crate::geojson_io::property_string;
use crate::model::Poi;
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::io::Write;

type DuplicateKey<'a> = (Option<&'a str>, OrderedFloat<f64>, OrderedFloat<f64>);

/// Groups of two or more POIs sharing an id and coordinate, in first-seen order.
/// POIs without a usable coordinate are never grouped.
pub fn find_duplicates(pois: &[Poi]) -> Vec<Vec<&Poi>> {
    let mut slot_by_key: AHashMap<DuplicateKey, usize> = AHashMap::new();
    let mut groups: Vec<Vec<&Poi>> = Vec::new();

    for poi in pois {
        let Some(position) = poi.position else {
            continue;
        };

        let key = (
            poi.poi_id.as_deref(),
            OrderedFloat(position.lon),
            OrderedFloat(position.lat),
        );

        match slot_by_key.entry(key) {
            Entry::Occupied(slot) => groups[*slot.get()].push(poi),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push(vec![poi]);
            }
        }
    }

    groups.retain(|g| g.len() > 1);
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateRow {
    #[serde(rename = "POI_ID")]
    pub poi_id: String,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "SEQ_NUM")]
    pub seq_num: String,
    #[serde(rename = "POI_NAME")]
    pub poi_name: String,
    #[serde(rename = "LINK_ID")]
    pub link_id: String,
}

impl DuplicateRow {
    pub fn from_poi(poi: &Poi) -> Option<Self> {
        let position = poi.position?;
        Some(Self {
            poi_id: poi.poi_id.clone().unwrap_or_default(),
            longitude: position.lon,
            latitude: position.lat,
            seq_num: property_string(&poi.properties, "SEQ_NUM").unwrap_or_default(),
            poi_name: property_string(&poi.properties, "POI_NAME").unwrap_or_default(),
            link_id: poi.link_id.clone().unwrap_or_default(),
        })
    }
}

pub fn write_duplicates_csv<W: Write>(writer: W, groups: &[Vec<&Poi>]) -> csv::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;

    for poi in groups.iter().flatten() {
        if let Some(row) = DuplicateRow::from_poi(poi) {
            csv_writer.serialize(row)?;
            written += 1;
        }
    }

    csv_writer.flush()?;
    Ok(written)
}
