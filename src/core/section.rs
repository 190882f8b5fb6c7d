//! Section type for file-format organizational units.
//!
//! Sections map a physical range of the buffer onto a virtual range. The
//! virtual range is what [`crate::context::Bin::file_at`] scans when looking
//! for the file that covers an address.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::impl_rebase;

bitflags! {
    /// Permission flags for sections.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SectionPerms: u8 {
        const READ = 1;
        const WRITE = 2;
        const EXECUTE = 4;
    }
}

impl fmt::Display for SectionPerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut perms = String::with_capacity(3);
        perms.push(if self.contains(SectionPerms::READ) { 'r' } else { '-' });
        perms.push(if self.contains(SectionPerms::WRITE) { 'w' } else { '-' });
        perms.push(if self.contains(SectionPerms::EXECUTE) { 'x' } else { '-' });
        write!(f, "{}", perms)
    }
}

/// A file-format section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub paddr: Option<u64>,
    /// Size in the file
    pub size: u64,
    pub vaddr: Option<u64>,
    /// Size once mapped
    pub vsize: u64,
    pub perms: SectionPerms,
    pub is_data: bool,
    /// Whether the section should be mapped into the address space
    pub add: bool,
}

impl_rebase!(Section);

impl Section {
    pub fn new(name: impl Into<String>, paddr: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            paddr: Some(paddr),
            size,
            vsize: size,
            add: true,
            ..Default::default()
        }
    }

    pub fn with_vaddr(mut self, vaddr: u64, vsize: u64) -> Self {
        self.vaddr = Some(vaddr);
        self.vsize = vsize;
        self
    }

    pub fn with_perms(mut self, perms: SectionPerms) -> Self {
        self.perms = perms;
        self
    }

    /// Whether `vaddr` falls inside the mapped range `[vaddr, vaddr + vsize)`.
    pub fn contains_vaddr(&self, vaddr: u64) -> bool {
        match self.vaddr {
            Some(start) => vaddr >= start && vaddr - start < self.vsize,
            None => false,
        }
    }

    /// Whether `paddr` falls inside the file range `[paddr, paddr + size)`.
    pub fn contains_paddr(&self, paddr: u64) -> bool {
        match self.paddr {
            Some(start) => paddr >= start && paddr - start < self.size,
            None => false,
        }
    }

    pub fn is_executable(&self) -> bool {
        self.perms.contains(SectionPerms::EXECUTE)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} vaddr={:#x} vsize={:#x}",
            self.name,
            self.perms,
            self.vaddr.unwrap_or(0),
            self.vsize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perms_display() {
        assert_eq!(SectionPerms::empty().to_string(), "---");
        assert_eq!((SectionPerms::READ | SectionPerms::EXECUTE).to_string(), "r-x");
        assert_eq!(SectionPerms::all().to_string(), "rwx");
    }

    #[test]
    fn test_contains_vaddr_is_half_open() {
        let s = Section::new(".text", 0x100, 0x50).with_vaddr(0x1000, 0x100);
        assert!(s.contains_vaddr(0x1000));
        assert!(s.contains_vaddr(0x10ff));
        assert!(!s.contains_vaddr(0x1100));
        assert!(!s.contains_vaddr(0xfff));
        assert!(s.contains_paddr(0x14f));
        assert!(!s.contains_paddr(0x150));
    }

    #[test]
    fn test_unmapped_section_contains_nothing() {
        let s = Section {
            name: "none".into(),
            vsize: 0x10,
            ..Default::default()
        };
        assert!(!s.contains_vaddr(0));
    }
}
