//! Region catalog: memory-map rows grouped into logical regions.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::graph::identity::{canonical_path, PseudoKind, RegionId};
use crate::model::{Address, MemoryMapEntry};

/// Closed address interval `[start, end]` contributed by one memory-map row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Address,
    pub end: Address,
    /// Compartment recorded on the row this interval came from.
    pub compartment_id: Option<i64>,
}

impl Interval {
    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Number of addresses covered, saturating for inverted rows.
    pub fn span(&self) -> u128 {
        self.end.value().saturating_sub(self.start.value())
    }
}

/// A logical region: one binary (all of its section mappings) or one pseudo mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub intervals: Vec<Interval>,
    /// First compartment id recorded for this region, if any.
    pub compartment_id: Option<i64>,
    /// Distinct raw paths folded into this region, first-seen order.
    pub raw_paths: Vec<String>,
}

impl Region {
    pub fn contains(&self, addr: Address) -> bool {
        self.intervals.iter().any(|iv| iv.contains(addr))
    }
}

/// Index of all regions derived from a memory map.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    by_id: HashMap<RegionId, usize>,
    path_compartments: HashMap<String, i64>,
    compartments: BTreeMap<i64, Vec<String>>,
}

impl RegionCatalog {
    /// Build the catalog from memory-map rows, preserving row order as load order.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a MemoryMapEntry>,
    {
        let mut catalog = RegionCatalog::default();
        let mut warned: HashSet<String> = HashSet::new();

        for entry in entries {
            catalog.insert(entry, &mut warned);
        }

        debug!(
            "region catalog: {} regions, {} compartments",
            catalog.regions.len(),
            catalog.compartments.len()
        );
        catalog
    }

    fn insert(&mut self, entry: &MemoryMapEntry, warned: &mut HashSet<String>) {
        let id = match PseudoKind::from_path(&entry.path) {
            Some(kind) => RegionId::pseudo(kind, entry.start_addr),
            None => RegionId::mapped(&entry.path),
        };
        let interval = Interval {
            start: entry.start_addr,
            end: entry.end_addr,
            compartment_id: entry.compartment_id,
        };

        let idx = match self.by_id.get(&id) {
            Some(&idx) => idx,
            None => {
                self.regions.push(Region {
                    id: id.clone(),
                    intervals: Vec::new(),
                    compartment_id: None,
                    raw_paths: Vec::new(),
                });
                self.by_id.insert(id, self.regions.len() - 1);
                self.regions.len() - 1
            }
        };

        let region = &mut self.regions[idx];
        region.intervals.push(interval);
        if !region.raw_paths.iter().any(|p| p == &entry.path) {
            region.raw_paths.push(entry.path.clone());
        }
        if region.compartment_id.is_none() {
            region.compartment_id = entry.compartment_id;
        }

        let Some(compartment_id) = entry.compartment_id else {
            return;
        };

        let canonical = canonical_path(&entry.path).to_string();
        match self.path_compartments.get(&canonical) {
            None => {
                self.path_compartments.insert(canonical, compartment_id);
            }
            Some(&first) if first != compartment_id => {
                if warned.insert(canonical.clone()) {
                    warn!(
                        "path {} is mapped under compartments {} and {}; using {}",
                        canonical, first, compartment_id, first
                    );
                }
            }
            Some(_) => {}
        }

        let paths = self.compartments.entry(compartment_id).or_default();
        if !paths.iter().any(|p| p == &entry.path) {
            paths.push(entry.path.clone());
        }
    }

    /// All regions in first-loaded order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.by_id.get(id).map(|&idx| &self.regions[idx])
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Compartment id first recorded for `path` (compared by canonical identity).
    pub fn compartment_of(&self, path: &str) -> Option<i64> {
        self.path_compartments.get(canonical_path(path)).copied()
    }

    /// Compartment id → raw paths mapped under it, ascending by id.
    pub fn compartments(&self) -> &BTreeMap<i64, Vec<String>> {
        &self.compartments
    }

    pub fn compartment_paths(&self, compartment_id: i64) -> Option<&[String]> {
        self.compartments.get(&compartment_id).map(|v| v.as_slice())
    }

    /// Instances of one pseudo category, first-loaded order.
    pub fn pseudo_instances(&self, kind: PseudoKind) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(
            move |r| matches!(r.id, RegionId::Pseudo { kind: k, .. } if k == kind),
        )
    }
}
