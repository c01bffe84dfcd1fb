//! Geodesic primitives consumed by the positional engine.
//!
//! The engine only talks to [`GeometryService`]; [`HaversineGeometry`] is the
//! production implementation on top of `geo`.

use crate::coordinate::Coordinate;
use geo::{Distance, Haversine, InterpolatePoint, Length, LineString};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("path has no vertices")]
    EmptyPath,
    #[error("distance along path is not finite: {0}")]
    NonFiniteDistance(f64),
    #[error("geometry service produced a non-finite result")]
    NonFiniteResult,
}

pub trait GeometryService: Send + Sync {
    /// Great-circle distance in metres.
    fn geodesic_distance(&self, a: &Coordinate, b: &Coordinate) -> Result<f64, GeometryError>;

    /// Length in metres of the path in the given vertex order.
    fn path_length(&self, path: &[Coordinate]) -> Result<f64, GeometryError>;

    /// The point `distance_m` metres along the path from its first vertex.
    fn point_at_distance(
        &self,
        path: &[Coordinate],
        distance_m: f64,
    ) -> Result<Coordinate, GeometryError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineGeometry;

impl GeometryService for HaversineGeometry {
    fn geodesic_distance(&self, a: &Coordinate, b: &Coordinate) -> Result<f64, GeometryError> {
        let d = Haversine.distance(a.point(), b.point());
        if d.is_finite() {
            Ok(d)
        } else {
            Err(GeometryError::NonFiniteResult)
        }
    }

    fn path_length(&self, path: &[Coordinate]) -> Result<f64, GeometryError> {
        if path.is_empty() {
            return Err(GeometryError::EmptyPath);
        }

        let line: LineString<f64> = path.iter().map(|c| (c.lon, c.lat)).collect();
        let total = Haversine.length(&line);
        if total.is_finite() {
            Ok(total)
        } else {
            Err(GeometryError::NonFiniteResult)
        }
    }

    fn point_at_distance(
        &self,
        path: &[Coordinate],
        distance_m: f64,
    ) -> Result<Coordinate, GeometryError> {
        let first = path.first().ok_or(GeometryError::EmptyPath)?;

        if !distance_m.is_finite() {
            return Err(GeometryError::NonFiniteDistance(distance_m));
        }

        if distance_m <= 0.0 {
            return Ok(*first);
        }

        let mut travelled = 0.0;
        for pair in path.windows(2) {
            let (start, end) = (&pair[0], &pair[1]);
            let segment = self.geodesic_distance(start, end)?;

            if travelled + segment >= distance_m {
                let remaining = distance_m - travelled;
                if remaining <= 0.0 {
                    return Ok(*start);
                }
                if remaining >= segment {
                    return Ok(*end);
                }

                let p = Haversine.point_at_distance_between(start.point(), end.point(), remaining);
                if !(p.x().is_finite() && p.y().is_finite()) {
                    return Err(GeometryError::NonFiniteResult);
                }
                return Ok(Coordinate::from(p));
            }

            travelled += segment;
        }

        // past the end of the path
        Ok(*path.last().unwrap_or(first))
    }
}
