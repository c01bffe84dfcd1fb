//! Picks the vertex a link's path is rebuilt from.
//!
//! Anchoring at a geometric extreme instead of the first stored vertex keeps
//! the rebuilt path independent of how the streets dataset ordered the vertices.

use crate::coordinate::Coordinate;

pub const DEFAULT_SPREAD_TOLERANCE: f64 = 1e-9;

/// Index of the anchor vertex, or `None` for an empty slice.
pub fn select_anchor(vertices: &[Coordinate]) -> Option<usize> {
    select_anchor_with_tolerance(vertices, DEFAULT_SPREAD_TOLERANCE)
}

pub fn anchor_vertex(vertices: &[Coordinate]) -> Option<&Coordinate> {
    select_anchor(vertices).map(|i| &vertices[i])
}

pub fn select_anchor_with_tolerance(vertices: &[Coordinate], tolerance: f64) -> Option<usize> {
    match vertices.len() {
        0 => None,
        1 => Some(0),
        _ => {
            let (a, b) = candidate_pair(vertices, tolerance);
            Some(lowest_of_pair(vertices, a, b))
        }
    }
}

/// Indices of the extreme vertices along each axis, first occurrence wins.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extremes {
    min_lat: usize,
    max_lat: usize,
    min_lon: usize,
    max_lon: usize,
}

impl Extremes {
    fn scan(vertices: &[Coordinate]) -> Self {
        let mut e = Extremes {
            min_lat: 0,
            max_lat: 0,
            min_lon: 0,
            max_lon: 0,
        };

        for (i, v) in vertices.iter().enumerate().skip(1) {
            if v.lat < vertices[e.min_lat].lat {
                e.min_lat = i;
            }
            if v.lat > vertices[e.max_lat].lat {
                e.max_lat = i;
            }
            if v.lon < vertices[e.min_lon].lon {
                e.min_lon = i;
            }
            if v.lon > vertices[e.max_lon].lon {
                e.max_lon = i;
            }
        }

        e
    }
}

/// The two vertices spanning the dominant axis. When neither axis dominates
/// by more than `tolerance`, falls back to the first and last vertex.
fn candidate_pair(vertices: &[Coordinate], tolerance: f64) -> (usize, usize) {
    let e = Extremes::scan(vertices);

    let lat_spread = (vertices[e.max_lat].lat - vertices[e.min_lat].lat).abs();
    let lon_spread = (vertices[e.max_lon].lon - vertices[e.min_lon].lon).abs();

    if lat_spread > lon_spread + tolerance {
        (e.min_lat, e.max_lat)
    } else if lon_spread > lat_spread + tolerance {
        (e.min_lon, e.max_lon)
    } else {
        (0, vertices.len() - 1)
    }
}

/// Lexicographic (lat, lon, z) minimum of the pair; a full tie keeps `a`.
fn lowest_of_pair(vertices: &[Coordinate], a: usize, b: usize) -> usize {
    let (na, nb) = (&vertices[a], &vertices[b]);

    if na.lat != nb.lat {
        return if na.lat < nb.lat { a } else { b };
    }
    if na.lon != nb.lon {
        return if na.lon < nb.lon { a } else { b };
    }
    if nb.z_or_neg_infinity() < na.z_or_neg_infinity() {
        b
    } else {
        a
    }
}
