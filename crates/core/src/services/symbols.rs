//! Capabilities of one library annotated with the symbols at their addresses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Address, Capability, ElfSymbol};

/// Symbol name and ELF type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    pub name: String,
    pub kind: String,
}

impl SymbolRef {
    /// `name (TYPE)`
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

/// One capability with the symbols found at its location and target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySymbols {
    pub location_addr: Address,
    pub target_addr: Address,
    pub perms: String,
    pub base: Address,
    pub top: Address,
    /// Every symbol placed exactly at the location address.
    pub location_symbols: Vec<SymbolRef>,
    /// First symbol placed exactly at the target address.
    pub target_symbol: Option<SymbolRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub library: String,
    pub capabilities: Vec<CapabilitySymbols>,
}

impl SymbolReport {
    pub fn total(&self) -> usize {
        self.capabilities.len()
    }
}

/// Join capabilities stored in `library` (path substring match) with `symbols`.
///
/// Addresses are compared numerically. Capabilities keep trace order.
pub fn capability_symbols(
    caps: &[Capability],
    symbols: &[ElfSymbol],
    library: &str,
) -> SymbolReport {
    let mut by_addr: BTreeMap<Address, Vec<&ElfSymbol>> = BTreeMap::new();
    for sym in symbols {
        by_addr.entry(sym.addr).or_default().push(sym);
    }
    let refs_at = |addr: &Address| -> Vec<SymbolRef> {
        by_addr
            .get(addr)
            .map(|syms| {
                syms.iter()
                    .map(|s| SymbolRef { name: s.name.clone(), kind: s.kind.clone() })
                    .collect()
            })
            .unwrap_or_default()
    };

    let capabilities = caps
        .iter()
        .filter(|cap| cap.location_path.contains(library))
        .map(|cap| CapabilitySymbols {
            location_addr: cap.location_addr,
            target_addr: cap.target_addr,
            perms: cap.perms.clone(),
            base: cap.base,
            top: cap.top,
            location_symbols: refs_at(&cap.location_addr),
            target_symbol: refs_at(&cap.target_addr).into_iter().next(),
        })
        .collect();

    SymbolReport { library: library.to_string(), capabilities }
}
