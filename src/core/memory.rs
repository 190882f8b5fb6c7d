//! Process-state and memory records.
//!
//! Register state and memory maps only exist for core dumps. Memory regions
//! describe the address space a format expects (e.g. embedded firmware
//! layouts) and may alias each other through mirrors.

use serde::{Deserialize, Serialize};

use crate::core::section::SectionPerms;

/// Raw register file captured in a core dump.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterState {
    pub arch: String,
    pub bits: u32,
    /// Register bytes as laid out by the format
    pub bytes: Vec<u8>,
}

impl RegisterState {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A mapping of the dumped process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryMap {
    pub name: String,
    pub addr: u64,
    pub size: u64,
    pub perms: SectionPerms,
}

impl MemoryMap {
    pub fn end(&self) -> u64 {
        self.addr.saturating_add(self.size)
    }
}

/// A memory region the format declares.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemRegion {
    pub name: String,
    pub addr: u64,
    pub size: u64,
    pub perms: SectionPerms,
    /// Regions that alias this one
    pub mirrors: Vec<MemRegion>,
}

impl MemRegion {
    /// Total number of regions including nested mirrors.
    pub fn count(&self) -> usize {
        1 + self.mirrors.iter().map(MemRegion::count).sum::<usize>()
    }
}

/// Source-line mapping from debug information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineRecord {
    pub addr: u64,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_count() {
        let region = MemRegion {
            name: "ram".into(),
            addr: 0,
            size: 0x800,
            mirrors: vec![
                MemRegion {
                    name: "ram.m1".into(),
                    addr: 0x800,
                    size: 0x800,
                    ..Default::default()
                },
                MemRegion {
                    name: "ram.m2".into(),
                    addr: 0x1000,
                    size: 0x800,
                    mirrors: vec![MemRegion::default()],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(region.count(), 4);
    }

    #[test]
    fn test_map_end_saturates() {
        let map = MemoryMap {
            addr: u64::MAX - 1,
            size: 10,
            ..Default::default()
        };
        assert_eq!(map.end(), u64::MAX);
    }
}
