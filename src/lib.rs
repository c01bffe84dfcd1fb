// Copyright Catenary Transit Initiatives
// POI positional consistency checks against the road network

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

pub mod batch;
pub mod classifier;
pub mod config;
pub mod coordinate;
pub mod duplicates;
pub mod geojson_io;
pub mod geometry;
pub mod interpolate;
pub mod model;
pub mod path_order;
pub mod reference_node;

pub use batch::{BatchClassifier, LinkIndex, ScenarioSummary};
pub use classifier::PositionalClassifier;
pub use config::AuditConfig;
pub use coordinate::Coordinate;
pub use geometry::{GeometryService, HaversineGeometry};
pub use model::{ClassificationResult, DebugInfo, Link, Poi, Scenario};

/// A batch classifier on the production geometry, configured from `config`.
pub fn default_batch(
    config: &AuditConfig,
) -> BatchClassifier<HaversineGeometry, path_order::GreedyNearestNeighbour> {
    BatchClassifier::new(
        PositionalClassifier::from_config(HaversineGeometry, config),
        config.parallel,
    )
}
