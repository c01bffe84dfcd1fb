use geo_types::Point;
use serde::{Serialize, Serializer};

/// A (longitude, latitude) position with an optional elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
    pub z: Option<f64>,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat, z: None }
    }

    pub fn with_z(lon: f64, lat: f64, z: f64) -> Self {
        Self {
            lon,
            lat,
            z: Some(z),
        }
    }

    /// Reads a GeoJSON-style position `[lon, lat, z?]`.
    ///
    /// Anything shorter than two components, or holding a non-finite number,
    /// is rejected. Components past the third are ignored.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        if position.len() < 2 {
            return None;
        }

        if position.iter().take(3).any(|v| !v.is_finite()) {
            return None;
        }

        Some(Self {
            lon: position[0],
            lat: position[1],
            z: position.get(2).copied(),
        })
    }

    pub fn to_position(&self) -> Vec<f64> {
        match self.z {
            Some(z) => vec![self.lon, self.lat, z],
            None => vec![self.lon, self.lat],
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Elevation for tie-breaking; a missing value sorts below any present one.
    pub fn z_or_neg_infinity(&self) -> f64 {
        self.z.unwrap_or(f64::NEG_INFINITY)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(point: Point<f64>) -> Self {
        Coordinate::new(point.x(), point.y())
    }
}

/// Planar squared distance in degree space. Only used for ordering, never as metres.
pub fn squared_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let dx = a.lon - b.lon;
    let dy = a.lat - b.lat;
    dx * dx + dy * dy
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_position().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_rejects_short_input() {
        assert_eq!(Coordinate::from_position(&[]), None);
        assert_eq!(Coordinate::from_position(&[1.0]), None);
    }

    #[test]
    fn test_from_position_rejects_non_finite() {
        assert_eq!(Coordinate::from_position(&[f64::NAN, 1.0]), None);
        assert_eq!(Coordinate::from_position(&[1.0, 2.0, f64::INFINITY]), None);
    }

    #[test]
    fn test_from_position_keeps_elevation() {
        let c = Coordinate::from_position(&[-99.1, 19.4, 2240.0]).unwrap();
        assert_eq!(c, Coordinate::with_z(-99.1, 19.4, 2240.0));
        assert_eq!(c.to_position(), vec![-99.1, 19.4, 2240.0]);
    }

    #[test]
    fn test_squared_distance_ignores_z() {
        let a = Coordinate::with_z(0.0, 0.0, 100.0);
        let b = Coordinate::new(3.0, 4.0);
        assert_eq!(squared_distance(&a, &b), 25.0);
    }

    #[test]
    fn test_serializes_as_position_array() {
        let c = Coordinate::new(1.5, -2.5);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "[1.5,-2.5]");
        let c = Coordinate::with_z(1.5, -2.5, 30.0);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[1.5,-2.5,30.0]");
    }
}
