use crate::classifier::PositionalClassifier;
use crate::geometry::GeometryService;
use crate::model::{ClassificationResult, DebugInfo, Link, Poi, Scenario};
use crate::path_order::PathOrderer;
use ahash::AHashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::collections::hash_map::Entry;
use tracing::{debug, error, info};

pub const REASON_NO_LINKS: &str = "Links data not provided";

/// Link lookup by id. The first link seen for an id wins; later duplicates
/// are ignored.
pub struct LinkIndex<'a> {
    links: &'a [Link],
    by_id: AHashMap<&'a str, usize>,
}

impl<'a> LinkIndex<'a> {
    pub fn new(links: &'a [Link]) -> Self {
        let mut by_id = AHashMap::with_capacity(links.len());
        let mut duplicates = 0usize;

        for (i, link) in links.iter().enumerate() {
            match by_id.entry(link.id.as_str()) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }

        if duplicates > 0 {
            debug!(
                "{} duplicate link ids ignored, first occurrence kept",
                duplicates
            );
        }

        Self { links, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a Link> {
        self.by_id.get(id).map(|&i| &self.links[i])
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub struct BatchClassifier<G, O> {
    classifier: PositionalClassifier<G, O>,
    parallel: bool,
}

impl<G: GeometryService, O: PathOrderer> BatchClassifier<G, O> {
    pub fn new(classifier: PositionalClassifier<G, O>, parallel: bool) -> Self {
        Self {
            classifier,
            parallel,
        }
    }

    /// One result per POI, in input order.
    ///
    /// `links: None` means the links dataset was unusable; every POI is then
    /// unprocessable instead of the batch failing.
    pub fn classify_all(&self, pois: &[Poi], links: Option<&[Link]>) -> Vec<ClassificationResult> {
        let Some(links) = links else {
            error!("links data not provided, marking {} POIs unprocessable", pois.len());
            return pois
                .iter()
                .map(|poi| {
                    ClassificationResult::unprocessable(poi, REASON_NO_LINKS, DebugInfo::default())
                })
                .collect();
        };

        let index = LinkIndex::new(links);
        let classify_one = |poi: &Poi| {
            let link = poi.link_id.as_deref().and_then(|id| index.get(id));
            self.classifier.classify(poi, link)
        };

        let results: Vec<ClassificationResult> = if self.parallel {
            pois.par_iter().map(classify_one).collect()
        } else {
            pois.iter().map(classify_one).collect()
        };

        info!(
            "classified {} POIs against {} links",
            results.len(),
            index.len()
        );

        results
    }
}

/// Results grouped by scenario, the shape downstream per-scenario reports use.
#[derive(Debug, Default)]
pub struct ScenarioSummary<'a> {
    groups: BTreeMap<Scenario, Vec<&'a ClassificationResult>>,
}

impl<'a> ScenarioSummary<'a> {
    pub fn from_results(results: &'a [ClassificationResult]) -> Self {
        let mut groups: BTreeMap<Scenario, Vec<&ClassificationResult>> = BTreeMap::new();
        for result in results {
            groups.entry(result.scenario).or_default().push(result);
        }
        Self { groups }
    }

    pub fn count(&self, scenario: Scenario) -> usize {
        self.groups.get(&scenario).map_or(0, Vec::len)
    }

    /// Non-empty groups in scenario order, each in input order.
    pub fn groups(&self) -> impl Iterator<Item = (Scenario, &[&'a ClassificationResult])> {
        self.groups.iter().map(|(s, group)| (*s, group.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn log(&self) {
        for scenario in Scenario::ALL {
            info!("{}: {} POIs", scenario, self.count(scenario));
        }
    }
}
