//! Raw records read from a capability trace.
//!
//! - `MemoryMapEntry`: one row of the `vm` table (a mapping in the traced address space).
//! - `Capability`: one row of the `cap_info` table (a capability found in memory).
//! - `ElfSymbol`: one row of the `elf_sym` table (a symbol of a loaded binary).
//! - `Address`: numeric address decoded from the text cells the capture tool writes.

mod address;
pub mod attrs;

pub use address::{Address, AddressError};

use serde::{Deserialize, Serialize};

/// A single mapping in the traced address space.
///
/// Several entries may share a path (a binary's text, data and relro mappings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMapEntry {
    pub path: String,
    pub start_addr: Address,
    pub end_addr: Address,
    /// Isolation compartment owning this mapping, if the capture recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<i64>,
    /// Raw `kve_protection` bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<i64>,
    /// Raw `mmap_flags` bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnode_type: Option<i64>,
}

impl MemoryMapEntry {
    pub fn new(path: impl Into<String>, start_addr: Address, end_addr: Address) -> Self {
        Self {
            path: path.into(),
            start_addr,
            end_addr,
            compartment_id: None,
            protection: None,
            flags: None,
            vnode_type: None,
        }
    }

    /// Builder-style helper to attach a compartment id.
    pub fn with_compartment(mut self, compartment_id: Option<i64>) -> Self {
        self.compartment_id = compartment_id;
        self
    }

    /// Closed-interval containment test.
    pub fn contains(&self, addr: Address) -> bool {
        self.start_addr <= addr && addr <= self.end_addr
    }
}

/// A capability observed in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Path of the mapping holding the capability.
    pub location_path: String,
    /// Address the capability was found at.
    pub location_addr: Address,
    /// Address the capability points to.
    pub target_addr: Address,
    /// Permission set label, e.g. `rwRW`.
    pub perms: String,
    pub base: Address,
    pub top: Address,
}

impl Capability {
    /// Convenience constructor for a capability whose bounds equal its target.
    pub fn new(
        location_path: impl Into<String>,
        location_addr: Address,
        target_addr: Address,
        perms: impl Into<String>,
    ) -> Self {
        Self {
            location_path: location_path.into(),
            location_addr,
            target_addr,
            perms: perms.into(),
            base: target_addr,
            top: target_addr,
        }
    }
}

/// A symbol of a loaded binary, placed at its runtime address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElfSymbol {
    /// Binary the symbol was read from.
    pub source_path: String,
    pub name: String,
    /// ELF symbol type, e.g. `FUNC` or `OBJECT`.
    pub kind: String,
    pub addr: Address,
}

/// Coarse permission class used by the capability summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermClass {
    Ro,
    Rw,
    Rx,
    Rwx,
}

impl PermClass {
    /// Classify a permission string by its `r`, `w` and `x` bits.
    ///
    /// Returns `None` for sets without read permission (e.g. seal-only caps).
    pub fn classify(perms: &str) -> Option<Self> {
        let r = perms.contains('r');
        let w = perms.contains('w');
        let x = perms.contains('x');
        match (r, w, x) {
            (true, false, false) => Some(PermClass::Ro),
            (true, true, false) => Some(PermClass::Rw),
            (true, false, true) => Some(PermClass::Rx),
            (true, true, true) => Some(PermClass::Rwx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_containment_is_inclusive() {
        let entry = MemoryMapEntry::new("/lib/libc.so.7", Address(0x1000), Address(0x1fff));
        assert!(entry.contains(Address(0x1000)));
        assert!(entry.contains(Address(0x1fff)));
        assert!(!entry.contains(Address(0x0fff)));
        assert!(!entry.contains(Address(0x2000)));
    }

    #[test]
    fn perm_classes_follow_rwx_bits() {
        assert_eq!(PermClass::classify("r"), Some(PermClass::Ro));
        assert_eq!(PermClass::classify("rR"), Some(PermClass::Ro));
        assert_eq!(PermClass::classify("rwRW"), Some(PermClass::Rw));
        assert_eq!(PermClass::classify("rxR"), Some(PermClass::Rx));
        assert_eq!(PermClass::classify("rwxRW"), Some(PermClass::Rwx));
        assert_eq!(PermClass::classify("w"), None);
        assert_eq!(PermClass::classify(""), None);
    }
}
