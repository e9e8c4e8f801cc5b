//! Region identity normalization.
//!
//! The capture tool records a binary's `.bss`, `.got` and `.plt` mappings under
//! the binary's path with the section name appended. Those mappings belong to
//! the same logical region as the binary itself, so identity is computed on the
//! path with any such suffix removed.
//!
//! The pseudo mappings `unknown`, `Stack` and `Guard` can appear many times at
//! unrelated addresses; each instance is its own region, told apart by its
//! start address.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Address;

/// Section suffixes that collapse into their owning binary.
pub const SECTION_SUFFIXES: [&str; 3] = [".bss", ".got", ".plt"];

/// Category of a mapping that has no backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PseudoKind {
    Unknown,
    Stack,
    Guard,
}

impl PseudoKind {
    /// Recognize a pseudo mapping by its exact recorded path.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "unknown" => Some(PseudoKind::Unknown),
            "Stack" => Some(PseudoKind::Stack),
            "Guard" => Some(PseudoKind::Guard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PseudoKind::Unknown => "unknown",
            PseudoKind::Stack => "Stack",
            PseudoKind::Guard => "Guard",
        }
    }
}

/// Strip every trailing known section suffix from `raw`.
///
/// A suffix is only removed when something remains in front of it, so a path
/// that is literally `.bss` stays as-is.
pub fn canonical_path(raw: &str) -> &str {
    let mut current = raw;
    loop {
        let stripped = SECTION_SUFFIXES
            .iter()
            .find_map(|suffix| current.strip_suffix(suffix).filter(|rest| !rest.is_empty()));
        match stripped {
            Some(rest) => current = rest,
            None => return current,
        }
    }
}

/// Whether two raw paths name the same logical region.
pub fn identity_equivalent(a: &str, b: &str) -> bool {
    canonical_path(a) == canonical_path(b)
}

/// Identity of a logical region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "region", rename_all = "snake_case")]
pub enum RegionId {
    /// A file-backed region, keyed by its canonical path.
    Mapped { path: String },
    /// One instance of a pseudo mapping.
    Pseudo { kind: PseudoKind, start: Address },
}

impl RegionId {
    /// Identity for a file-backed path (suffixes stripped).
    pub fn mapped(raw_path: &str) -> Self {
        RegionId::Mapped { path: canonical_path(raw_path).to_string() }
    }

    pub fn pseudo(kind: PseudoKind, start: Address) -> Self {
        RegionId::Pseudo { kind, start }
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self, RegionId::Pseudo { .. })
    }

    /// Label used both as the rendered node id and its text.
    pub fn display_label(&self) -> String {
        match self {
            RegionId::Mapped { path } => path.clone(),
            RegionId::Pseudo { kind, start } => format!("{} ({})", kind.as_str(), start),
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label())
    }
}
