use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::graph::{ContainmentResolver, OverlapPolicy, RegionCatalog};
use crate::model::attrs::{flags_label, protection_label, vnode_type_label};
use crate::model::{Address, Capability, MemoryMapEntry, PermClass};

/// Capability counts split by coarse permission class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermCounts {
    pub ro: usize,
    pub rw: usize,
    pub rx: usize,
    pub rwx: usize,
    /// Every capability counted, including ones without read permission.
    pub total: usize,
}

impl PermCounts {
    pub fn add(&mut self, perms: &str) {
        match PermClass::classify(perms) {
            Some(PermClass::Ro) => self.ro += 1,
            Some(PermClass::Rw) => self.rw += 1,
            Some(PermClass::Rx) => self.rx += 1,
            Some(PermClass::Rwx) => self.rwx += 1,
            None => {}
        }
        self.total += 1;
    }
}

/// Capabilities stored inside one memory-map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSummary {
    pub path: String,
    pub start_addr: Address,
    pub end_addr: Address,
    pub counts: PermCounts,
    /// Share of all capabilities in the trace, as a percentage.
    pub density: f64,
    /// Mapping protection as `rwxRW` columns, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    /// Two-letter backing object type, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnode_type: Option<String>,
}

/// Per-entry capability counts, in memory-map row order.
///
/// A capability is counted for every entry whose interval holds its location.
pub fn mapping_summary(entries: &[MemoryMapEntry], caps: &[Capability]) -> Vec<MappingSummary> {
    let all = caps.len();
    entries
        .iter()
        .map(|entry| {
            let mut counts = PermCounts::default();
            for cap in caps.iter().filter(|c| entry.contains(c.location_addr)) {
                counts.add(&cap.perms);
            }
            let density =
                if all == 0 { 0.0 } else { counts.total as f64 / all as f64 * 100.0 };
            MappingSummary {
                path: entry.path.clone(),
                start_addr: entry.start_addr,
                end_addr: entry.end_addr,
                counts,
                density,
                protection: entry.protection.map(protection_label),
                flags: entry.flags.map(flags_label),
                vnode_type: entry.vnode_type.map(|t| vnode_type_label(t).to_string()),
            }
        })
        .collect()
}

/// Capabilities stored in one compartment and pointing into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompartmentPairSummary {
    pub src: i64,
    pub dest: i64,
    pub counts: PermCounts,
}

/// Counts per (location compartment, target compartment), ordered by id pair.
///
/// Compartments are taken from the intervals containing each address. Pairs
/// with no capability are omitted; a capability counts once per pair.
pub fn compartment_summary(
    catalog: &RegionCatalog,
    caps: &[Capability],
) -> Vec<CompartmentPairSummary> {
    let resolver = ContainmentResolver::new(catalog);
    let mut pairs: BTreeMap<(i64, i64), PermCounts> = BTreeMap::new();

    for cap in caps {
        let srcs = compartments_at(&resolver, cap.location_addr);
        if srcs.is_empty() {
            continue;
        }
        let dests = compartments_at(&resolver, cap.target_addr);
        for src in &srcs {
            for dest in &dests {
                pairs.entry((*src, *dest)).or_default().add(&cap.perms);
            }
        }
    }

    pairs
        .into_iter()
        .map(|((src, dest), counts)| CompartmentPairSummary { src, dest, counts })
        .collect()
}

fn compartments_at(resolver: &ContainmentResolver<'_>, addr: Address) -> Vec<i64> {
    let mut out: Vec<i64> = resolver
        .resolve_with(addr, OverlapPolicy::All)
        .iter()
        .filter_map(|hit| hit.interval.compartment_id.or(hit.region.compartment_id))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Occurrences of one exact permission string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermCount {
    pub perms: String,
    pub count: usize,
}

/// Count per distinct permission string, most frequent first.
pub fn permission_histogram(caps: &[Capability]) -> Vec<PermCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for cap in caps {
        *counts.entry(cap.perms.as_str()).or_default() += 1;
    }
    let mut out: Vec<PermCount> = counts
        .into_iter()
        .map(|(perms, count)| PermCount { perms: perms.to_string(), count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.perms.cmp(&b.perms)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(loc: u64, target: u64, perms: &str) -> Capability {
        Capability::new("x", Address::from(loc), Address::from(target), perms)
    }

    #[test]
    fn mapping_summary_counts_by_location() {
        let entries = vec![
            MemoryMapEntry::new("libA", Address(0x1000), Address(0x1fff)),
            MemoryMapEntry::new("libB", Address(0x2000), Address(0x2fff)),
        ];
        let caps = vec![
            cap(0x1010, 0x2000, "rwRW"),
            cap(0x1020, 0x2000, "rR"),
            cap(0x1030, 0x2000, "rxR"),
            cap(0x9000, 0x1000, "rwx"),
        ];
        let summary = mapping_summary(&entries, &caps);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].path, "libA");
        assert_eq!(
            summary[0].counts,
            PermCounts { ro: 1, rw: 1, rx: 1, rwx: 0, total: 3 }
        );
        assert!((summary[0].density - 75.0).abs() < 1e-9);
        assert_eq!(summary[1].counts.total, 0);
        assert_eq!(summary[1].density, 0.0);
    }

    #[test]
    fn mapping_summary_decodes_recorded_attributes() {
        let mut entry = MemoryMapEntry::new("libA", Address(0x1000), Address(0x1fff));
        entry.protection = Some(0x1b);
        entry.flags = Some(0x21);
        entry.vnode_type = Some(2);
        let bare = MemoryMapEntry::new("libB", Address(0x2000), Address(0x2fff));

        let summary = mapping_summary(&[entry, bare], &[]);
        assert_eq!(summary[0].protection.as_deref(), Some("rw-RW"));
        assert_eq!(summary[0].flags.as_deref(), Some("C--D-"));
        assert_eq!(summary[0].vnode_type.as_deref(), Some("vn"));
        assert_eq!(summary[1].protection, None);
        assert_eq!(summary[1].vnode_type, None);
    }

    #[test]
    fn mapping_summary_without_caps_has_zero_density() {
        let entries = vec![MemoryMapEntry::new("libA", Address(0x1000), Address(0x1fff))];
        let summary = mapping_summary(&entries, &[]);
        assert_eq!(summary[0].density, 0.0);
    }

    #[test]
    fn compartment_summary_pairs_location_and_target() {
        let entries = vec![
            MemoryMapEntry::new("Stack", Address(0x7000), Address(0x7fff)).with_compartment(Some(-1)),
            MemoryMapEntry::new("libA", Address(0x1000), Address(0x1fff)).with_compartment(Some(1)),
            MemoryMapEntry::new("libB", Address(0x2000), Address(0x2fff)).with_compartment(Some(2)),
        ];
        let catalog = RegionCatalog::from_entries(&entries);
        let caps = vec![
            cap(0x7010, 0x2010, "rwRW"),
            cap(0x7020, 0x2020, "rwRW"),
            cap(0x1010, 0x2010, "rR"),
            cap(0x9000, 0x2010, "rR"),
        ];
        let summary = compartment_summary(&catalog, &caps);
        assert_eq!(summary.len(), 2);
        assert_eq!((summary[0].src, summary[0].dest), (-1, 2));
        assert_eq!(summary[0].counts.rw, 2);
        assert_eq!((summary[1].src, summary[1].dest), (1, 2));
        assert_eq!(summary[1].counts.ro, 1);
    }

    #[test]
    fn histogram_orders_by_count_then_perms() {
        let caps = vec![
            cap(0, 0, "rR"),
            cap(0, 0, "rwRW"),
            cap(0, 0, "rwRW"),
            cap(0, 0, "rxR"),
        ];
        let hist = permission_histogram(&caps);
        let flat: Vec<(&str, usize)> = hist.iter().map(|p| (p.perms.as_str(), p.count)).collect();
        assert_eq!(flat, vec![("rwRW", 2), ("rR", 1), ("rxR", 1)]);
    }
}
