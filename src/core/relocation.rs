//! Relocation type for link-time relocation entries.
//!
//! Relocation represents link-time relocation entries that need to be resolved
//! when loading or linking executable files. Relocations are ordered by their
//! virtual address inside [`crate::object::RelocIndex`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::impl_rebase;

/// Relocation types for different executable formats and architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RelocationType {
    /// Absolute relocation (direct address)
    Absolute,
    /// Relative to program counter (PC-relative)
    PcRelative,
    /// Global Offset Table entry
    Got,
    /// Procedure Linkage Table entry
    Plt,
    /// Jump slot for dynamic linking
    JumpSlot,
    /// Relative relocation
    Relative,
    /// Copy relocation for dynamic linking
    Copy,
    /// Thread-Local Storage
    Tls,
    /// Unknown or format-specific relocation type
    #[default]
    Unknown,
}

impl fmt::Display for RelocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationType::Absolute => write!(f, "Absolute"),
            RelocationType::PcRelative => write!(f, "PcRelative"),
            RelocationType::Got => write!(f, "Got"),
            RelocationType::Plt => write!(f, "Plt"),
            RelocationType::JumpSlot => write!(f, "JumpSlot"),
            RelocationType::Relative => write!(f, "Relative"),
            RelocationType::Copy => write!(f, "Copy"),
            RelocationType::Tls => write!(f, "Tls"),
            RelocationType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Link-time relocation entry that specifies how an address should be adjusted
/// during loading or linking of executable files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Relocation {
    /// Where the patch is applied, in the file
    pub paddr: Option<u64>,
    /// Where the patch is applied, once mapped (ordering key)
    pub vaddr: Option<u64>,
    pub kind: RelocationType,
    /// Additional offset to add to the resolved address
    pub addend: i64,
    /// Symbol reference if this relocation references a symbol
    pub symbol: Option<String>,
    /// Size of the patched field in bytes
    pub size: u8,
}

impl_rebase!(Relocation);

impl Relocation {
    pub fn new(paddr: u64, kind: RelocationType) -> Self {
        Self {
            paddr: Some(paddr),
            kind,
            size: 4,
            ..Default::default()
        }
    }

    pub fn with_vaddr(mut self, vaddr: u64) -> Self {
        self.vaddr = Some(vaddr);
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, addend: i64) -> Self {
        self.symbol = Some(symbol.into());
        self.addend = addend;
        self
    }

    /// Ordering key inside the relocation index; unmapped entries sort first.
    pub fn key(&self) -> u64 {
        self.vaddr.unwrap_or(0)
    }

    pub fn has_symbol(&self) -> bool {
        self.symbol.is_some()
    }

    pub fn is_plt_related(&self) -> bool {
        matches!(self.kind, RelocationType::Plt | RelocationType::JumpSlot)
    }

    /// Get a human-readable description of the relocation
    pub fn description(&self) -> String {
        let symbol_str = self
            .symbol
            .as_ref()
            .map(|s| format!(" -> {}", s))
            .unwrap_or_default();
        let addend_str = if self.addend != 0 {
            format!(" (addend: {})", self.addend)
        } else {
            String::new()
        };
        format!(
            "Relocation at {:#x}: {}{}{}",
            self.key(),
            self.kind,
            symbol_str,
            addend_str
        )
    }
}

impl fmt::Display for Relocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
