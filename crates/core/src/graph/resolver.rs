//! Containment resolution: which regions own a given address.
//!
//! Intervals from every region are sorted by start address once, with a
//! running maximum of end addresses alongside. A lookup binary-searches the
//! last interval starting at or before the address and walks backwards until
//! the running maximum drops below it, so overlapping maps are still answered
//! exactly.

use serde::{Deserialize, Serialize};

use crate::graph::catalog::{Interval, Region, RegionCatalog};
use crate::graph::identity::{PseudoKind, RegionId};
use crate::model::Address;

/// How to attribute an address that falls inside more than one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Every containing region is a destination.
    #[default]
    All,
    /// Only the containing region loaded first.
    FirstLoaded,
    /// Only the region owning the narrowest containing interval (ties: first loaded).
    Smallest,
}

impl OverlapPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlapPolicy::All => "all",
            OverlapPolicy::FirstLoaded => "first-loaded",
            OverlapPolicy::Smallest => "smallest",
        }
    }
}

impl std::str::FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(OverlapPolicy::All),
            "first-loaded" => Ok(OverlapPolicy::FirstLoaded),
            "smallest" => Ok(OverlapPolicy::Smallest),
            other => Err(format!(
                "Invalid overlap policy '{}'. Allowed: all, first-loaded, smallest",
                other
            )),
        }
    }
}

/// One containing interval and the region that owns it.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub region: &'a Region,
    pub interval: &'a Interval,
    region_idx: usize,
    interval_idx: usize,
}

#[derive(Debug, Clone, Copy)]
struct IndexedInterval {
    start: Address,
    end: Address,
    region_idx: usize,
    interval_idx: usize,
}

/// Address → region lookups over a materialized catalog.
#[derive(Debug)]
pub struct ContainmentResolver<'a> {
    catalog: &'a RegionCatalog,
    index: Vec<IndexedInterval>,
    max_end: Vec<Address>,
}

impl<'a> ContainmentResolver<'a> {
    pub fn new(catalog: &'a RegionCatalog) -> Self {
        let mut index: Vec<IndexedInterval> = catalog
            .regions()
            .iter()
            .enumerate()
            .flat_map(|(region_idx, region)| {
                region.intervals.iter().enumerate().map(move |(interval_idx, iv)| {
                    IndexedInterval { start: iv.start, end: iv.end, region_idx, interval_idx }
                })
            })
            .collect();
        index.sort_by_key(|iv| (iv.start, iv.region_idx, iv.interval_idx));

        let mut max_end = Vec::with_capacity(index.len());
        let mut running: Option<Address> = None;
        for iv in &index {
            let next = running.map_or(iv.end, |m| m.max(iv.end));
            running = Some(next);
            max_end.push(next);
        }

        Self { catalog, index, max_end }
    }

    pub fn catalog(&self) -> &'a RegionCatalog {
        self.catalog
    }

    /// Every interval containing `addr`, ordered by region load order.
    pub fn hits(&self, addr: Address) -> Vec<Hit<'a>> {
        let upper = self.index.partition_point(|iv| iv.start <= addr);
        let mut out = Vec::new();
        for i in (0..upper).rev() {
            if self.max_end[i] < addr {
                break;
            }
            let iv = &self.index[i];
            if iv.end >= addr {
                let region = &self.catalog.regions()[iv.region_idx];
                out.push(Hit {
                    region,
                    interval: &region.intervals[iv.interval_idx],
                    region_idx: iv.region_idx,
                    interval_idx: iv.interval_idx,
                });
            }
        }
        out.sort_by_key(|h| (h.region_idx, h.interval_idx));
        out
    }

    /// Every region owning an interval that contains `addr`, first-loaded order.
    pub fn resolve(&self, addr: Address) -> Vec<&'a Region> {
        let mut regions: Vec<&'a Region> = Vec::new();
        let mut last: Option<usize> = None;
        for hit in self.hits(addr) {
            if last != Some(hit.region_idx) {
                regions.push(hit.region);
                last = Some(hit.region_idx);
            }
        }
        regions
    }

    /// Containing hits reduced to at most one per region and filtered by `policy`.
    pub fn resolve_with(&self, addr: Address, policy: OverlapPolicy) -> Vec<Hit<'a>> {
        let mut per_region: Vec<Hit<'a>> = Vec::new();
        for hit in self.hits(addr) {
            match per_region.last() {
                Some(prev) if prev.region_idx == hit.region_idx => {}
                _ => per_region.push(hit),
            }
        }

        match policy {
            OverlapPolicy::All => per_region,
            OverlapPolicy::FirstLoaded => per_region.into_iter().take(1).collect(),
            OverlapPolicy::Smallest => per_region
                .into_iter()
                .min_by_key(|h| (h.interval.span(), h.region_idx))
                .into_iter()
                .collect(),
        }
    }

    /// Compartment owning `path`'s region, if one was recorded.
    pub fn resolve_compartment(&self, path: &str) -> Option<i64> {
        self.catalog.compartment_of(path)
    }

    /// Identity of the region a capability is stored in.
    ///
    /// File-backed paths map straight to their canonical identity. Pseudo paths
    /// pick the instance containing `addr`, else the first instance loaded.
    pub fn region_for_location(&self, path: &str, addr: Address) -> Option<RegionId> {
        match PseudoKind::from_path(path) {
            Some(kind) => {
                let mut first = None;
                for region in self.catalog.pseudo_instances(kind) {
                    if region.contains(addr) {
                        return Some(region.id.clone());
                    }
                    if first.is_none() {
                        first = Some(region.id.clone());
                    }
                }
                first
            }
            None => Some(RegionId::mapped(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryMapEntry;

    fn catalog(rows: &[(&str, u64, u64)]) -> RegionCatalog {
        let entries: Vec<MemoryMapEntry> = rows
            .iter()
            .map(|(p, s, e)| MemoryMapEntry::new(*p, (*s).into(), (*e).into()))
            .collect();
        RegionCatalog::from_entries(&entries)
    }

    fn labels(regions: &[&Region]) -> Vec<String> {
        regions.iter().map(|r| r.id.display_label()).collect()
    }

    #[test]
    fn resolves_inclusive_bounds() {
        let cat = catalog(&[("libA", 0x1000, 0x1fff), ("libB", 0x2000, 0x2fff)]);
        let resolver = ContainmentResolver::new(&cat);
        assert_eq!(labels(&resolver.resolve(Address(0x1000))), vec!["libA"]);
        assert_eq!(labels(&resolver.resolve(Address(0x1fff))), vec!["libA"]);
        assert_eq!(labels(&resolver.resolve(Address(0x2000))), vec!["libB"]);
        assert!(resolver.resolve(Address(0x0fff)).is_empty());
        assert!(resolver.resolve(Address(0x3000)).is_empty());
    }

    #[test]
    fn matches_brute_force_on_a_grid() {
        let rows = [
            ("a", 0x100, 0x1ff),
            ("b", 0x180, 0x2ff),
            ("c", 0x400, 0x4ff),
            ("a", 0x600, 0x6ff),
            ("d", 0x050, 0x900),
            ("e", 0x700, 0x6ff), // inverted row never matches
        ];
        let cat = catalog(&rows);
        let resolver = ContainmentResolver::new(&cat);
        for addr in (0u64..0xa00).step_by(0x10) {
            let addr = Address::from(addr);
            let expected: Vec<String> = cat
                .regions()
                .iter()
                .filter(|r| r.intervals.iter().any(|iv| iv.start <= addr && addr <= iv.end))
                .map(|r| r.id.display_label())
                .collect();
            assert_eq!(labels(&resolver.resolve(addr)), expected, "addr {addr}");
        }
    }

    #[test]
    fn overlap_policies_pick_explicitly() {
        let cat = catalog(&[("wide", 0x0, 0xffff), ("narrow", 0x1000, 0x10ff)]);
        let resolver = ContainmentResolver::new(&cat);
        let addr = Address(0x1010);

        let all: Vec<_> = resolver
            .resolve_with(addr, OverlapPolicy::All)
            .iter()
            .map(|h| h.region.id.display_label())
            .collect();
        assert_eq!(all, vec!["wide", "narrow"]);

        let first = resolver.resolve_with(addr, OverlapPolicy::FirstLoaded);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].region.id.display_label(), "wide");

        let smallest = resolver.resolve_with(addr, OverlapPolicy::Smallest);
        assert_eq!(smallest.len(), 1);
        assert_eq!(smallest[0].region.id.display_label(), "narrow");
    }

    #[test]
    fn pseudo_location_prefers_containing_instance() {
        let cat = catalog(&[("Stack", 0x7000, 0x7fff), ("Stack", 0x9000, 0x9fff)]);
        let resolver = ContainmentResolver::new(&cat);
        assert_eq!(
            resolver.region_for_location("Stack", Address(0x9100)),
            Some(RegionId::pseudo(PseudoKind::Stack, Address(0x9000)))
        );
        assert_eq!(
            resolver.region_for_location("Stack", Address(0x1)),
            Some(RegionId::pseudo(PseudoKind::Stack, Address(0x7000)))
        );
        assert_eq!(resolver.region_for_location("Guard", Address(0x1)), None);
        assert_eq!(
            resolver.region_for_location("/lib/libc.so.got", Address(0x1)),
            Some(RegionId::mapped("/lib/libc.so"))
        );
    }

    #[test]
    fn overlap_policy_parses_from_cli_strings() {
        assert_eq!("smallest".parse::<OverlapPolicy>(), Ok(OverlapPolicy::Smallest));
        assert_eq!("first-loaded".parse::<OverlapPolicy>(), Ok(OverlapPolicy::FirstLoaded));
        assert!("largest".parse::<OverlapPolicy>().is_err());
        assert_eq!(OverlapPolicy::default().as_str(), "all");
    }
}
