//! Address translation for binary objects.
//!
//! A plugin reports a base address for the format; the caller may request a
//! different one and may also ask for the whole image to be loaded at an
//! offset. This module holds the pure arithmetic that turns those inputs into
//! a base shift and rebases extracted records.
//!
//! Physical addresses (file offsets) receive the load address. Virtual
//! addresses receive the base shift. A record without a format-reported
//! virtual address derives it from its rebased physical address, so every
//! derived virtual address equals `paddr + load_address + shift`.

use serde::{Deserialize, Serialize};

/// Sentinel for "no address requested" (the caller left the base or load
/// address to the plugin).
pub const UNSPECIFIED: u64 = u64::MAX;

/// Compute the base shift between the requested and the format-reported base.
///
/// Returns 0 when no base was requested.
pub fn base_shift(requested_base: u64, reported_base: u64) -> i64 {
    if requested_base == UNSPECIFIED {
        return 0;
    }
    requested_base.wrapping_sub(reported_base) as i64
}

/// The base address callers observe for an object.
pub fn effective_base(reported_base: u64, shift: i64) -> u64 {
    reported_base.wrapping_add_signed(shift)
}

/// Normalise a caller-supplied load address (`UNSPECIFIED` loads at 0).
pub fn normalize_load_address(load_address: u64) -> u64 {
    if load_address == UNSPECIFIED {
        0
    } else {
        load_address
    }
}

/// Physical-to-virtual translation parameters of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Translation {
    /// Added to every physical address
    pub load_address: u64,
    /// Added to every virtual address
    pub shift: i64,
}

impl Translation {
    pub fn new(load_address: u64, shift: i64) -> Self {
        Self {
            load_address,
            shift,
        }
    }

    /// Rebase a physical address.
    pub fn paddr(&self, paddr: Option<u64>) -> Option<u64> {
        paddr.map(|p| p.wrapping_add(self.load_address))
    }

    /// Rebase a virtual address, deriving it from the already rebased
    /// physical address when the format did not report one.
    pub fn vaddr(&self, vaddr: Option<u64>, rebased_paddr: Option<u64>) -> Option<u64> {
        vaddr
            .or(rebased_paddr)
            .map(|v| v.wrapping_add_signed(self.shift))
    }

    /// Inverse of [`Translation::vaddr`] for a derived address.
    pub fn vaddr_to_paddr(&self, vaddr: u64) -> u64 {
        vaddr
            .wrapping_add_signed(self.shift.wrapping_neg())
            .wrapping_sub(self.load_address)
    }
}

/// Records that carry a physical and a virtual address.
pub trait Rebase {
    fn rebase(&mut self, t: &Translation);
}

/// Rebase every record of an extracted list.
pub fn rebase_all<T: Rebase>(items: &mut [T], t: &Translation) {
    for item in items.iter_mut() {
        item.rebase(t);
    }
}

/// Implement [`Rebase`] for structs with `paddr`/`vaddr: Option<u64>` fields.
macro_rules! impl_rebase {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::core::address::Rebase for $ty {
                fn rebase(&mut self, t: &$crate::core::address::Translation) {
                    self.paddr = t.paddr(self.paddr);
                    self.vaddr = t.vaddr(self.vaddr, self.paddr);
                }
            }
        )+
    };
}
pub(crate) use impl_rebase;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Rec {
        paddr: Option<u64>,
        vaddr: Option<u64>,
    }
    impl_rebase!(Rec);

    #[test]
    fn test_base_shift_and_effective_base() {
        let shift = base_shift(0x5000, 0x1000);
        assert_eq!(shift, 0x4000);
        assert_eq!(effective_base(0x1000, shift), 0x5000);
        assert_eq!(base_shift(UNSPECIFIED, 0x1000), 0);
        assert_eq!(effective_base(0x1000, 0), 0x1000);
    }

    #[test]
    fn test_negative_shift() {
        let shift = base_shift(0x1000, 0x400000);
        assert!(shift < 0);
        assert_eq!(effective_base(0x400000, shift), 0x1000);
    }

    #[test]
    fn test_effective_base_law_over_pairs() {
        let pairs = [
            (0u64, 0u64),
            (0x5000, 0x1000),
            (0x1000, 0x5000),
            (0xffff_ffff_0000, 0x10),
            (0x10, u64::MAX - 1),
        ];
        for (requested, reported) in pairs {
            let shift = base_shift(requested, reported);
            assert_eq!(effective_base(reported, shift), requested);
        }
    }

    #[test]
    fn test_rebase_derived_vaddr() {
        let t = Translation::new(0x400000, 0x4000);
        let mut rec = Rec {
            paddr: Some(0x20),
            vaddr: None,
        };
        rec.rebase(&t);
        assert_eq!(rec.paddr, Some(0x400020));
        assert_eq!(rec.vaddr, Some(0x20 + 0x400000 + 0x4000));
        assert_eq!(t.vaddr_to_paddr(rec.vaddr.unwrap()), 0x20);
    }

    #[test]
    fn test_rebase_reported_vaddr_only_shifts() {
        let t = Translation::new(0x400000, 0x4000);
        let mut rec = Rec {
            paddr: Some(0x20),
            vaddr: Some(0x1020),
        };
        rec.rebase(&t);
        assert_eq!(rec.paddr, Some(0x400020));
        assert_eq!(rec.vaddr, Some(0x5020));
    }

    #[test]
    fn test_rebase_without_addresses() {
        let t = Translation::new(0x1000, 0x10);
        let mut recs = vec![Rec::default(), Rec::default()];
        rebase_all(&mut recs, &t);
        assert!(recs.iter().all(|r| r.paddr.is_none() && r.vaddr.is_none()));
    }

    #[test]
    fn test_normalize_load_address() {
        assert_eq!(normalize_load_address(UNSPECIFIED), 0);
        assert_eq!(normalize_load_address(0x400000), 0x400000);
    }
}
