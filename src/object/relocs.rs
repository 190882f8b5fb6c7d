//! Relocation index keyed by virtual address.
//!
//! Records sharing an address are kept in insertion order; the index never
//! deduplicates. In-order traversal is always non-decreasing by address.

use std::collections::BTreeMap;
use std::ops::RangeBounds;

use crate::core::Relocation;

/// Ordered multimap of relocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocIndex {
    tree: BTreeMap<u64, Vec<Relocation>>,
    len: usize,
}

impl RelocIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered, already rebased extraction result.
    pub fn build(relocs: Vec<Relocation>) -> Self {
        relocs.into_iter().collect()
    }

    pub fn insert(&mut self, reloc: Relocation) {
        self.tree.entry(reloc.key()).or_default().push(reloc);
        self.len += 1;
    }

    /// First relocation inserted at exactly `vaddr`.
    pub fn get(&self, vaddr: u64) -> Option<&Relocation> {
        self.tree.get(&vaddr).and_then(|v| v.first())
    }

    /// Every relocation at exactly `vaddr`, in insertion order.
    pub fn get_all(&self, vaddr: u64) -> &[Relocation] {
        self.tree.get(&vaddr).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relocations whose address falls in `range`, in address order.
    pub fn range<R>(&self, range: R) -> impl Iterator<Item = &Relocation>
    where
        R: RangeBounds<u64>,
    {
        self.tree.range(range).flat_map(|(_, v)| v.iter())
    }

    /// The relocation whose patched bytes cover `vaddr`, if any.
    pub fn covers(&self, vaddr: u64) -> Option<&Relocation> {
        let lo = vaddr.saturating_sub(u64::from(u8::MAX));
        self.tree
            .range(lo..=vaddr)
            .rev()
            .flat_map(|(k, v)| v.iter().map(move |r| (*k, r)))
            .find(|(k, r)| vaddr < k.saturating_add(u64::from(r.size.max(1))))
            .map(|(_, r)| r)
    }

    /// In-order traversal.
    pub fn iter(&self) -> impl Iterator<Item = &Relocation> {
        self.tree.values().flat_map(|v| v.iter())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<Relocation> for RelocIndex {
    fn from_iter<I: IntoIterator<Item = Relocation>>(iter: I) -> Self {
        let mut index = RelocIndex::new();
        for r in iter {
            index.insert(r);
        }
        index
    }
}

impl<'a> IntoIterator for &'a RelocIndex {
    type Item = &'a Relocation;
    type IntoIter = Box<dyn Iterator<Item = &'a Relocation> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
