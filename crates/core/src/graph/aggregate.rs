//! Edge aggregation.
//!
//! A single algorithm turns capability records into weighted, deduplicated
//! edges. What a "node" is depends on the [`Attribution`] strategy: a logical
//! region, a compartment id, or one side of a library pair. What an edge is
//! labelled with depends on [`EdgeLabel`].
//!
//! Repeated (src, dest, label) triples are folded with
//! `w <- log10(10^w + 1)` starting from `w = 1`, so after `n` occurrences the
//! weight is `log10(10 + n - 1)`: a count squashed into a usable pen width.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::graph::identity::{canonical_path, identity_equivalent, RegionId};
use crate::graph::resolver::{ContainmentResolver, OverlapPolicy};
use crate::model::Capability;

/// Weight of an edge seen once.
pub const INITIAL_WEIGHT: f64 = 1.0;

/// Fold one more occurrence into an edge weight.
pub fn accumulate_weight(weight: f64) -> f64 {
    (10f64.powf(weight) + 1.0).log10()
}

/// Weight after `occurrences` applications of the accumulation rule.
pub fn weight_after(occurrences: usize) -> Option<f64> {
    if occurrences == 0 {
        return None;
    }
    Some((1..occurrences).fold(INITIAL_WEIGHT, |w, _| accumulate_weight(w)))
}

/// What text an aggregated edge carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeLabel {
    /// The capability's permission string; distinct permissions give distinct edges.
    #[default]
    Permissions,
    /// No label; all permissions between two nodes fold into one edge.
    Unlabeled,
}

impl EdgeLabel {
    pub fn label_for(self, cap: &Capability) -> String {
        match self {
            EdgeLabel::Permissions => cap.perms.clone(),
            EdgeLabel::Unlabeled => String::new(),
        }
    }
}

/// Maps capabilities onto graph keys.
pub trait Attribution {
    type Key: Ord + Clone;

    /// Key of the node holding the capability; `None` drops the capability.
    fn source(&self, cap: &Capability) -> Option<Self::Key>;

    /// Keys of the nodes the capability points into.
    fn destinations(&self, cap: &Capability) -> Vec<Self::Key>;

    /// Extra self-reference rule on top of `src == dest`.
    fn suppress(&self, _cap: &Capability, _src: &Self::Key, _dest: &Self::Key) -> bool {
        false
    }
}

/// One aggregated edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<K> {
    pub src: K,
    pub dest: K,
    pub label: String,
    pub weight: f64,
}

/// Key-indexed accumulator of edges for one aggregation run.
#[derive(Debug, Clone)]
pub struct EdgeAggregator<K: Ord> {
    edges: BTreeMap<(K, K, String), f64>,
    unattributed: usize,
}

impl<K: Ord + Clone> Default for EdgeAggregator<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> EdgeAggregator<K> {
    pub fn new() -> Self {
        Self { edges: BTreeMap::new(), unattributed: 0 }
    }

    /// Record one occurrence of `(src, dest, label)`.
    pub fn record(&mut self, src: K, dest: K, label: String) {
        self.edges
            .entry((src, dest, label))
            .and_modify(|w| *w = accumulate_weight(*w))
            .or_insert(INITIAL_WEIGHT);
    }

    /// Fold a batch of capabilities into the accumulator.
    pub fn ingest<'c, A, I>(&mut self, attribution: &A, label: EdgeLabel, caps: I)
    where
        A: Attribution<Key = K>,
        I: IntoIterator<Item = &'c Capability>,
    {
        for cap in caps {
            let Some(src) = attribution.source(cap) else {
                self.unattributed += 1;
                continue;
            };

            let mut seen: Vec<K> = Vec::new();
            for dest in attribution.destinations(cap) {
                if dest == src || seen.contains(&dest) || attribution.suppress(cap, &src, &dest) {
                    continue;
                }
                seen.push(dest.clone());
                self.record(src.clone(), dest, label.label_for(cap));
            }
        }
    }

    pub fn weight(&self, src: &K, dest: &K, label: &str) -> Option<f64> {
        self.edges.get(&(src.clone(), dest.clone(), label.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Capabilities dropped because their source could not be attributed.
    pub fn unattributed(&self) -> usize {
        self.unattributed
    }

    /// Drain into edges ordered by (src, dest, label).
    pub fn into_edges(self) -> Vec<Edge<K>> {
        self.edges
            .into_iter()
            .map(|((src, dest, label), weight)| Edge { src, dest, label, weight })
            .collect()
    }
}

/// Run one aggregation pass and return the resulting edges.
pub fn aggregate<'c, A, I>(attribution: &A, label: EdgeLabel, caps: I) -> Vec<Edge<A::Key>>
where
    A: Attribution,
    I: IntoIterator<Item = &'c Capability>,
{
    let mut aggregator = EdgeAggregator::new();
    aggregator.ingest(attribution, label, caps);
    debug!(
        "aggregated {} edges ({} capabilities without a source)",
        aggregator.len(),
        aggregator.unattributed()
    );
    aggregator.into_edges()
}

/// Nodes are logical regions.
pub struct RegionAttribution<'r, 'c> {
    resolver: &'r ContainmentResolver<'c>,
    policy: OverlapPolicy,
}

impl<'r, 'c> RegionAttribution<'r, 'c> {
    pub fn new(resolver: &'r ContainmentResolver<'c>, policy: OverlapPolicy) -> Self {
        Self { resolver, policy }
    }
}

impl Attribution for RegionAttribution<'_, '_> {
    type Key = RegionId;

    fn source(&self, cap: &Capability) -> Option<RegionId> {
        self.resolver.region_for_location(&cap.location_path, cap.location_addr)
    }

    fn destinations(&self, cap: &Capability) -> Vec<RegionId> {
        self.resolver
            .resolve_with(cap.target_addr, self.policy)
            .into_iter()
            .map(|hit| hit.region.id.clone())
            .collect()
    }
}

/// Nodes are compartment ids.
pub struct CompartmentAttribution<'r, 'c> {
    resolver: &'r ContainmentResolver<'c>,
    policy: OverlapPolicy,
}

impl<'r, 'c> CompartmentAttribution<'r, 'c> {
    pub fn new(resolver: &'r ContainmentResolver<'c>, policy: OverlapPolicy) -> Self {
        Self { resolver, policy }
    }
}

impl Attribution for CompartmentAttribution<'_, '_> {
    type Key = i64;

    fn source(&self, cap: &Capability) -> Option<i64> {
        self.resolver.resolve_compartment(&cap.location_path)
    }

    fn destinations(&self, cap: &Capability) -> Vec<i64> {
        self.resolver
            .resolve_with(cap.target_addr, self.policy)
            .into_iter()
            .filter_map(|hit| hit.interval.compartment_id.or(hit.region.compartment_id))
            .collect()
    }

    fn suppress(&self, cap: &Capability, _src: &i64, dest: &i64) -> bool {
        self.resolver
            .catalog()
            .compartment_paths(*dest)
            .map(|paths| paths.iter().any(|p| identity_equivalent(p, &cap.location_path)))
            .unwrap_or(false)
    }
}

/// Nodes are two path patterns; everything else is ignored.
///
/// A path belongs to a side when its canonical form contains the pattern,
/// the first pattern winning when both match.
pub struct PairAttribution<'r, 'c> {
    resolver: &'r ContainmentResolver<'c>,
    first: String,
    second: String,
    policy: OverlapPolicy,
}

impl<'r, 'c> PairAttribution<'r, 'c> {
    pub fn new(
        resolver: &'r ContainmentResolver<'c>,
        first: impl Into<String>,
        second: impl Into<String>,
        policy: OverlapPolicy,
    ) -> Self {
        Self { resolver, first: first.into(), second: second.into(), policy }
    }

    fn side_of(&self, path: &str) -> Option<String> {
        let canonical = canonical_path(path);
        if canonical.contains(self.first.as_str()) {
            Some(self.first.clone())
        } else if canonical.contains(self.second.as_str()) {
            Some(self.second.clone())
        } else {
            None
        }
    }
}

impl Attribution for PairAttribution<'_, '_> {
    type Key = String;

    fn source(&self, cap: &Capability) -> Option<String> {
        self.side_of(&cap.location_path)
    }

    fn destinations(&self, cap: &Capability) -> Vec<String> {
        self.resolver
            .resolve_with(cap.target_addr, self.policy)
            .into_iter()
            .filter_map(|hit| hit.region.raw_paths.iter().find_map(|p| self.side_of(p)))
            .collect()
    }
}
