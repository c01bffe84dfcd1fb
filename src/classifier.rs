//! Turns an observed-vs-expected offset and attribute comparisons into a scenario.
//!
//! Checks run in a fixed order and the first failing check decides:
//!
//! 1. the POI's link id has no match,
//! 2. PERCFRREF is not a number in 0..=100,
//! 3. no expected position could be interpolated,
//! 4. the POI's own coordinate is missing or malformed,
//!
//! all of which give [`Scenario::Unprocessable`]. Otherwise the offset is
//! compared against the link's threshold ([`Scenario::OffsetExceeded`]),
//! then street names ([`Scenario::NameMismatch`]), else [`Scenario::Valid`].
//!
//! A MULTIDIGIT disagreement is reported in the debug bundle only.

use crate::config::{AuditConfig, ThresholdPolicy};
use crate::coordinate::Coordinate;
use crate::geometry::{GeometryError, GeometryService};
use crate::interpolate::PositionInterpolator;
use crate::model::{ClassificationResult, DebugInfo, Link, Poi, Scenario};
use crate::path_order::{GreedyNearestNeighbour, PathOrderer};
use tracing::debug;

pub const REASON_NO_LINK: &str = "No matching link found";
pub const REASON_NO_INTERPOLATION: &str = "Could not interpolate along line";
pub const REASON_BAD_POI_COORDINATES: &str = "Invalid POI coordinates";
pub const REASON_VALID: &str = "Valid position and attributes";

/// Reads the longest numeric prefix of `s`, so `"50%"` reads as 50.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// exponent only when digits follow it. `None` when no digit is found.
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let mut seen_digit = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if seen_digit || frac_end > end + 1 {
            seen_digit |= frac_end > end + 1;
            end = frac_end;
        }
    }

    if !seen_digit {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Converts a 0-100 PERCFRREF value to a fraction in `[0, 1]`.
///
/// Trailing text after the number is ignored (`"50%"` is 0.5). The error is
/// the human-readable reason that ends up on the result.
pub fn validate_percentage(raw: Option<&str>) -> Result<f64, String> {
    let invalid = || format!("Invalid PERCFRREF: {}", raw.unwrap_or("<missing>"));

    let value = raw.and_then(leading_float).ok_or_else(invalid)?;

    let fraction = value / 100.0;
    if fraction.is_nan() || !(0.0..=1.0).contains(&fraction) {
        return Err(invalid());
    }

    Ok(fraction)
}

impl ThresholdPolicy {
    pub fn is_highway(&self, link: &Link) -> bool {
        link.functional_class
            .as_deref()
            .is_some_and(|class| self.highway_classes.iter().any(|h| h == class))
    }

    pub fn is_urban(&self, link: &Link) -> bool {
        link.urban
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("Y"))
    }

    /// Highway wins over urban.
    pub fn threshold_for(&self, link: &Link) -> f64 {
        if self.is_highway(link) {
            self.highway_m
        } else if self.is_urban(link) {
            self.urban_m
        } else {
            self.default_m
        }
    }
}

fn normalized(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

/// Both names present and non-blank, and different after trim/lowercase.
pub fn names_mismatch(link_name: Option<&str>, poi_name: Option<&str>) -> bool {
    let link_name = normalized(link_name);
    let poi_name = normalized(poi_name);
    !link_name.is_empty() && !poi_name.is_empty() && link_name != poi_name
}

/// Both flags present and different after trim/lowercase.
pub fn multi_digit_mismatch(link_flag: Option<&str>, poi_flag: Option<&str>) -> bool {
    match (link_flag, poi_flag) {
        (Some(l), Some(p)) => normalized(Some(l)) != normalized(Some(p)),
        _ => false,
    }
}

pub struct PositionalClassifier<G, O = GreedyNearestNeighbour> {
    interpolator: PositionInterpolator<G, O>,
    thresholds: ThresholdPolicy,
}

impl<G: GeometryService> PositionalClassifier<G, GreedyNearestNeighbour> {
    pub fn new(geometry: G) -> Self {
        Self::from_config(geometry, &AuditConfig::default())
    }

    pub fn from_config(geometry: G, config: &AuditConfig) -> Self {
        Self::with_orderer(geometry, GreedyNearestNeighbour, config)
    }
}

impl<G: GeometryService, O: PathOrderer> PositionalClassifier<G, O> {
    pub fn with_orderer(geometry: G, orderer: O, config: &AuditConfig) -> Self {
        Self {
            interpolator: PositionInterpolator::with_orderer(geometry, orderer)
                .spread_tolerance(config.spread_tolerance),
            thresholds: config.thresholds.clone(),
        }
    }

    /// Never fails; every problem becomes a [`Scenario::Unprocessable`] result.
    pub fn classify(&self, poi: &Poi, link: Option<&Link>) -> ClassificationResult {
        let Some(link) = link else {
            return ClassificationResult::unprocessable(poi, REASON_NO_LINK, DebugInfo::default());
        };

        let mut debug = DebugInfo {
            is_urban: self.thresholds.is_urban(link),
            is_highway: self.thresholds.is_highway(link),
            ..Default::default()
        };

        let fraction = match validate_percentage(poi.perc_from_ref.as_deref()) {
            Ok(fraction) => fraction,
            Err(reason) => return ClassificationResult::unprocessable(poi, reason, debug),
        };

        let Some(expected) = self.interpolator.interpolate(&link.geometry, fraction) else {
            return ClassificationResult::unprocessable(poi, REASON_NO_INTERPOLATION, debug);
        };
        debug.expected = Some(expected);

        let Some(position) = poi.position else {
            return ClassificationResult::unprocessable(poi, REASON_BAD_POI_COORDINATES, debug);
        };

        match self.decide(poi, link, &position, &expected, &mut debug) {
            Ok((scenario, reason)) => ClassificationResult::new(poi, scenario, reason, debug),
            Err(e) => {
                debug!("POI {:?} failed during comparison: {}", poi.poi_id, e);
                ClassificationResult::unprocessable(poi, format!("Processing error: {}", e), debug)
            }
        }
    }

    fn decide(
        &self,
        poi: &Poi,
        link: &Link,
        position: &Coordinate,
        expected: &Coordinate,
        debug: &mut DebugInfo,
    ) -> Result<(Scenario, String), GeometryError> {
        let distance = self
            .interpolator
            .geometry()
            .geodesic_distance(position, expected)?;
        let threshold = self.thresholds.threshold_for(link);

        debug.distance_m = Some(distance);
        debug.threshold_m = Some(threshold);
        debug.multi_digit_mismatch = Some(multi_digit_mismatch(
            link.multi_digit.as_deref(),
            poi.multi_digit.as_deref(),
        ));

        if distance > threshold {
            return Ok((
                Scenario::OffsetExceeded,
                format!("Offset {:.1}m > {}m threshold", distance, threshold),
            ));
        }

        if names_mismatch(link.street_name.as_deref(), poi.street_name.as_deref()) {
            return Ok((
                Scenario::NameMismatch,
                format!(
                    "Name mismatch (link: \"{}\", POI: \"{}\")",
                    link.street_name.as_deref().unwrap_or_default(),
                    poi.street_name.as_deref().unwrap_or_default()
                ),
            ));
        }

        Ok((Scenario::Valid, REASON_VALID.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::planar::{BrokenGeometry, PlanarGeometry};

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    // 1000 m north-south link in planar metres
    fn link(func_class: &str, urban: &str, name: &str) -> Link {
        Link {
            id: "1001".to_string(),
            geometry: vec![c(0.0, 1000.0), c(0.0, 0.0), c(0.0, 500.0)],
            urban: Some(urban.to_string()),
            functional_class: Some(func_class.to_string()),
            street_name: Some(name.to_string()),
            multi_digit: Some("N".to_string()),
        }
    }

    fn poi(position: Option<Coordinate>, perc: &str, name: &str) -> Poi {
        Poi {
            poi_id: Some("77".to_string()),
            position,
            link_id: Some("1001".to_string()),
            perc_from_ref: Some(perc.to_string()),
            street_name: Some(name.to_string()),
            multi_digit: Some("N".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_percentage_bounds() {
        assert_eq!(validate_percentage(Some("0")), Ok(0.0));
        assert_eq!(validate_percentage(Some("100")), Ok(1.0));
        assert_eq!(validate_percentage(Some(" 25 ")), Ok(0.25));
        assert_eq!(
            validate_percentage(Some("101")),
            Err("Invalid PERCFRREF: 101".to_string())
        );
        assert_eq!(
            validate_percentage(Some("-5")),
            Err("Invalid PERCFRREF: -5".to_string())
        );
        assert!(validate_percentage(Some("NaN")).is_err());
        assert_eq!(
            validate_percentage(None),
            Err("Invalid PERCFRREF: <missing>".to_string())
        );
    }

    #[test]
    fn test_validate_percentage_reads_numeric_prefix() {
        assert_eq!(validate_percentage(Some("50%")), Ok(0.5));
        assert_eq!(validate_percentage(Some("50abc")), Ok(0.5));
        assert_eq!(validate_percentage(Some("  12.5 m")), Ok(0.125));
        assert_eq!(validate_percentage(Some(".5")), Ok(0.005));
        assert_eq!(validate_percentage(Some("5e1x")), Ok(0.5));
        // an exponent marker without digits is not part of the number
        assert_eq!(validate_percentage(Some("50e")), Ok(0.5));
        assert_eq!(validate_percentage(Some("+75.")), Ok(0.75));

        assert_eq!(
            validate_percentage(Some("abc")),
            Err("Invalid PERCFRREF: abc".to_string())
        );
        assert!(validate_percentage(Some("%50")).is_err());
        assert!(validate_percentage(Some("-")).is_err());
        assert!(validate_percentage(Some(".")).is_err());
        assert!(validate_percentage(Some("")).is_err());
        assert_eq!(
            validate_percentage(Some("150%")),
            Err("Invalid PERCFRREF: 150%".to_string())
        );
    }

    #[test]
    fn test_percent_suffix_classifies_like_plain_number() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "N", "Main St");
        let plain = classifier.classify(&poi(Some(c(0.0, 502.0)), "50", "Main St"), Some(&l));
        let suffixed = classifier.classify(&poi(Some(c(0.0, 502.0)), "50%", "Main St"), Some(&l));
        assert_eq!(suffixed.scenario, Scenario::Valid);
        assert_eq!(suffixed.debug, plain.debug);
    }

    #[test]
    fn test_threshold_policy() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.threshold_for(&link("1", "Y", "a")), 70.0);
        assert_eq!(policy.threshold_for(&link("2", "N", "a")), 70.0);
        assert_eq!(policy.threshold_for(&link("4", "y", "a")), 10.0);
        assert_eq!(policy.threshold_for(&link("4", "N", "a")), 40.0);

        let unset = Link::default();
        assert_eq!(policy.threshold_for(&unset), 40.0);
    }

    #[test]
    fn test_name_and_multi_digit_comparisons() {
        assert!(names_mismatch(Some("Main St"), Some("Main Street")));
        assert!(!names_mismatch(Some(" MAIN ST "), Some("main st")));
        assert!(!names_mismatch(Some("Main St"), Some("   ")));
        assert!(!names_mismatch(None, Some("Main St")));

        assert!(multi_digit_mismatch(Some("Y"), Some("N")));
        assert!(!multi_digit_mismatch(Some(" y"), Some("Y ")));
        assert!(!multi_digit_mismatch(None, Some("Y")));
    }

    #[test]
    fn test_missing_link_is_scenario_one() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let result = classifier.classify(&poi(Some(c(0.0, 0.0)), "50", "x"), None);
        assert_eq!(result.scenario, Scenario::Unprocessable);
        assert_eq!(result.reason, REASON_NO_LINK);
        assert_eq!(result.debug, DebugInfo::default());
    }

    #[test]
    fn test_invalid_percentage_quotes_raw_value() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "N", "Main St");
        let result = classifier.classify(&poi(Some(c(0.0, 0.0)), "101", "Main St"), Some(&l));
        assert_eq!(result.scenario, Scenario::Unprocessable);
        assert_eq!(result.reason, "Invalid PERCFRREF: 101");
    }

    #[test]
    fn test_link_without_geometry_cannot_interpolate() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let mut l = link("4", "N", "Main St");
        l.geometry.clear();
        let result = classifier.classify(&poi(Some(c(0.0, 0.0)), "50", "Main St"), Some(&l));
        assert_eq!(result.scenario, Scenario::Unprocessable);
        assert_eq!(result.reason, REASON_NO_INTERPOLATION);
    }

    #[test]
    fn test_interpolation_failure_is_scenario_one() {
        let classifier = PositionalClassifier::new(BrokenGeometry);
        let l = link("4", "N", "Main St");
        let result = classifier.classify(&poi(Some(c(0.0, 0.0)), "50", "Main St"), Some(&l));
        assert_eq!(result.reason, REASON_NO_INTERPOLATION);
    }

    #[test]
    fn test_malformed_poi_coordinates() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "N", "Main St");
        let result = classifier.classify(&poi(None, "50", "Main St"), Some(&l));
        assert_eq!(result.scenario, Scenario::Unprocessable);
        assert_eq!(result.reason, REASON_BAD_POI_COORDINATES);
        assert_eq!(result.debug.expected, Some(c(0.0, 500.0)));
    }

    #[test]
    fn test_distance_failure_becomes_processing_error() {
        // BrokenGeometry still interpolates at the endpoints
        let classifier = PositionalClassifier::new(BrokenGeometry);
        let l = link("4", "N", "Main St");
        let result = classifier.classify(&poi(Some(c(0.0, 0.0)), "0", "Main St"), Some(&l));
        assert_eq!(result.scenario, Scenario::Unprocessable);
        assert!(result.reason.starts_with("Processing error: "));
        assert_eq!(result.debug.expected, Some(c(0.0, 0.0)));
    }

    #[test]
    fn test_highway_offset_exceeds_threshold() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("1", "N", "Main St");
        // expected (0, 500); POI 71 m east
        let result = classifier.classify(&poi(Some(c(71.0, 500.0)), "50", "Main St"), Some(&l));
        assert_eq!(result.scenario, Scenario::OffsetExceeded);
        assert_eq!(result.reason, "Offset 71.0m > 70m threshold");
        assert_eq!(result.debug.threshold_m, Some(70.0));
        assert_eq!(result.debug.distance_m, Some(71.0));
        assert!(result.debug.is_highway);
    }

    #[test]
    fn test_offset_takes_precedence_over_name() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "Y", "Main St");
        let result = classifier.classify(&poi(Some(c(11.0, 500.0)), "50", "Elm St"), Some(&l));
        assert_eq!(result.scenario, Scenario::OffsetExceeded);
        assert_eq!(result.reason, "Offset 11.0m > 10m threshold");
        assert!(result.debug.is_urban);
    }

    #[test]
    fn test_name_mismatch_within_threshold() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "N", "Main St");
        let result = classifier.classify(&poi(Some(c(5.0, 500.0)), "50", "Main Street"), Some(&l));
        assert_eq!(result.scenario, Scenario::NameMismatch);
        assert_eq!(
            result.reason,
            "Name mismatch (link: \"Main St\", POI: \"Main Street\")"
        );
        assert_eq!(result.debug.threshold_m, Some(40.0));
    }

    #[test]
    fn test_valid_position_and_attributes() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "N", "Main St");
        let result = classifier.classify(&poi(Some(c(0.0, 502.0)), "50", "Main St"), Some(&l));
        assert_eq!(result.scenario, Scenario::Valid);
        assert_eq!(result.reason, REASON_VALID);
        assert_eq!(result.debug.distance_m, Some(2.0));
        assert_eq!(result.debug.multi_digit_mismatch, Some(false));
    }

    #[test]
    fn test_multi_digit_mismatch_does_not_change_scenario() {
        let classifier = PositionalClassifier::new(PlanarGeometry);
        let l = link("4", "N", "Main St");
        let mut p = poi(Some(c(0.0, 502.0)), "50", "Main St");
        p.multi_digit = Some("Y".to_string());
        let result = classifier.classify(&p, Some(&l));
        assert_eq!(result.scenario, Scenario::Valid);
        assert_eq!(result.debug.multi_digit_mismatch, Some(true));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = PositionalClassifier::new(crate::geometry::HaversineGeometry);
        let l = Link {
            geometry: vec![c(-99.163, 19.430), c(-99.170, 19.420), c(-99.166, 19.427)],
            ..link("3", "Y", "Insurgentes")
        };
        let p = Poi {
            position: Some(c(-99.1665, 19.4262)),
            ..poi(None, "62.5", "INSURGENTES")
        };

        let first = classifier.classify(&p, Some(&l));
        let second = classifier.classify(&p, Some(&l));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.annotated_properties()).unwrap(),
            serde_json::to_string(&second.annotated_properties()).unwrap()
        );
    }
}
