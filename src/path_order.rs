use crate::coordinate::{Coordinate, squared_distance};

/// Rebuilds a vertex order for a link whose geometry arrived unordered.
///
/// `anchor` is an index into `vertices`. Implementations must return every
/// input vertex exactly once.
pub trait PathOrderer: Send + Sync {
    fn order(&self, vertices: &[Coordinate], anchor: Option<usize>) -> Vec<Coordinate>;
}

/// Nearest-neighbour chaining from the anchor.
///
/// Not globally optimal: branching or self-overlapping geometry can come out
/// in a non-physical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyNearestNeighbour;

impl PathOrderer for GreedyNearestNeighbour {
    fn order(&self, vertices: &[Coordinate], anchor: Option<usize>) -> Vec<Coordinate> {
        if vertices.len() <= 2 {
            return passthrough(vertices);
        }

        let anchor = match anchor {
            Some(i) if i < vertices.len() => i,
            Some(i) => {
                tracing::debug!(
                    "anchor index {} out of range for {} vertices, keeping input order",
                    i,
                    vertices.len()
                );
                return passthrough(vertices);
            }
            None => return passthrough(vertices),
        };

        chain_from(vertices, anchor)
    }
}

/// Short or unanchored input comes back in the order it was given.
fn passthrough(vertices: &[Coordinate]) -> Vec<Coordinate> {
    vertices.to_vec()
}

fn chain_from(vertices: &[Coordinate], anchor: usize) -> Vec<Coordinate> {
    let mut remaining: Vec<usize> = (0..vertices.len()).filter(|&i| i != anchor).collect();
    let mut ordered = Vec::with_capacity(vertices.len());
    ordered.push(vertices[anchor]);
    let mut current = vertices[anchor];

    while !remaining.is_empty() {
        let mut closest_pos = 0;
        let mut closest_dist = f64::INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let dist = squared_distance(&current, &vertices[idx]);
            // strict comparison keeps the first vertex seen on ties
            if dist < closest_dist {
                closest_dist = dist;
                closest_pos = pos;
            }
        }

        let next = remaining.remove(closest_pos);
        current = vertices[next];
        ordered.push(current);
    }

    ordered
}

/// Orders `vertices` starting at the vertex picked by [`crate::reference_node`].
pub fn order_path(vertices: &[Coordinate]) -> Vec<Coordinate> {
    let anchor = crate::reference_node::select_anchor(vertices);
    GreedyNearestNeighbour.order(vertices, anchor)
}
