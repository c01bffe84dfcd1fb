use crate::coordinate::Coordinate;
use crate::geometry::GeometryService;
use crate::path_order::{GreedyNearestNeighbour, PathOrderer};
use crate::reference_node::{DEFAULT_SPREAD_TOLERANCE, select_anchor_with_tolerance};
use tracing::warn;

/// Finds the expected position at a fraction of a link's length.
///
/// The caller's vertex order is never trusted: the path is always rebuilt
/// from the anchor before measuring.
pub struct PositionInterpolator<G, O = GreedyNearestNeighbour> {
    geometry: G,
    orderer: O,
    spread_tolerance: f64,
}

impl<G: GeometryService> PositionInterpolator<G, GreedyNearestNeighbour> {
    pub fn new(geometry: G) -> Self {
        Self::with_orderer(geometry, GreedyNearestNeighbour)
    }
}

impl<G: GeometryService, O: PathOrderer> PositionInterpolator<G, O> {
    pub fn with_orderer(geometry: G, orderer: O) -> Self {
        Self {
            geometry,
            orderer,
            spread_tolerance: DEFAULT_SPREAD_TOLERANCE,
        }
    }

    pub fn spread_tolerance(mut self, tolerance: f64) -> Self {
        self.spread_tolerance = tolerance;
        self
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn ordered_path(&self, vertices: &[Coordinate]) -> Vec<Coordinate> {
        let anchor = select_anchor_with_tolerance(vertices, self.spread_tolerance);
        self.orderer.order(vertices, anchor)
    }

    /// `None` means the position could not be computed; callers map it to an
    /// unprocessable POI.
    pub fn interpolate(&self, vertices: &[Coordinate], fraction: f64) -> Option<Coordinate> {
        match vertices {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }

        let path = self.ordered_path(vertices);
        let (first, last) = match (path.first(), path.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return None,
        };

        if fraction <= 0.0 {
            return Some(first);
        }
        if fraction >= 1.0 {
            return Some(last);
        }

        let length = match self.geometry.path_length(&path) {
            Ok(length) => length,
            Err(e) => {
                warn!("could not measure path of {} vertices: {}", path.len(), e);
                return None;
            }
        };

        // duplicate points only
        if length <= 0.0 {
            return Some(first);
        }

        match self.geometry.point_at_distance(&path, length * fraction) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!(
                    "could not interpolate {:.3} along path of {:.1}m: {}",
                    fraction, length, e
                );
                None
            }
        }
    }
}
