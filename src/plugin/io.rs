//! IoView: bounded reads and writes against a live address space.
//!
//! Relocation patching needs somewhere to write the resolved targets. The
//! view is handed to [`super::BinFormat::patch_relocations`] once per object.

use crate::core::binary::Endianness;

/// Errors raised by bounded I/O.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum IoError {
    #[error("address out of range: {addr:#x}+{len}")]
    OutOfRange { addr: u64, len: usize },
    #[error("view is read-only")]
    ReadOnly,
}

/// Random access to a mapped address space.
pub trait IoView {
    /// Read `len` bytes starting at `addr`.
    fn read_at(&self, addr: u64, len: usize) -> Result<Vec<u8>, IoError>;

    /// Write `bytes` at `addr`.
    fn write_at(&mut self, addr: u64, bytes: &[u8]) -> Result<(), IoError>;

    /// Size of the addressable range.
    fn size(&self) -> u64;

    fn read_u32(&self, addr: u64, endian: Endianness) -> Result<u32, IoError> {
        let b = self.read_at(addr, 4)?;
        Ok(match endian {
            Endianness::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Endianness::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        })
    }

    fn write_u32(&mut self, addr: u64, value: u32, endian: Endianness) -> Result<(), IoError> {
        let bytes = match endian {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        self.write_at(addr, &bytes)
    }
}

/// In-memory address space starting at `base`.
#[derive(Debug, Clone, Default)]
pub struct VecIo {
    base: u64,
    data: Vec<u8>,
}

impl VecIo {
    pub fn new(base: u64, data: Vec<u8>) -> Self {
        Self { base, data }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>, IoError> {
        let oob = || IoError::OutOfRange { addr, len };
        let start = addr.checked_sub(self.base).ok_or_else(oob)?;
        let start = usize::try_from(start).map_err(|_| oob())?;
        let end = start.checked_add(len).ok_or_else(oob)?;
        if end > self.data.len() {
            return Err(oob());
        }
        Ok(start..end)
    }
}

impl IoView for VecIo {
    fn read_at(&self, addr: u64, len: usize) -> Result<Vec<u8>, IoError> {
        let r = self.range(addr, len)?;
        Ok(self.data[r].to_vec())
    }

    fn write_at(&mut self, addr: u64, bytes: &[u8]) -> Result<(), IoError> {
        let r = self.range(addr, bytes.len())?;
        self.data[r].copy_from_slice(bytes);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_access() {
        let mut io = VecIo::new(0x1000, vec![0; 16]);
        io.write_u32(0x1004, 0xdeadbeef, Endianness::Little).unwrap();
        assert_eq!(io.read_u32(0x1004, Endianness::Little).unwrap(), 0xdeadbeef);
        assert_eq!(io.read_at(0x1004, 1).unwrap(), vec![0xef]);

        assert!(io.read_at(0xfff, 1).is_err());
        assert!(io.read_at(0x100e, 4).is_err());
        assert!(io.write_at(0x1010, &[1]).is_err());
        assert_eq!(io.size(), 16);
    }

    #[test]
    fn test_out_of_range_reports_request() {
        let mut io = VecIo::new(0x1000, vec![0; 8]);
        assert_eq!(
            io.read_at(0x800, 2),
            Err(IoError::OutOfRange { addr: 0x800, len: 2 })
        );
        assert_eq!(
            io.read_at(u64::MAX, usize::MAX),
            Err(IoError::OutOfRange {
                addr: u64::MAX,
                len: usize::MAX
            })
        );
        assert_eq!(
            io.write_u32(0x1006, 1, Endianness::Big),
            Err(IoError::OutOfRange { addr: 0x1006, len: 4 })
        );
        assert_eq!(io.into_inner(), vec![0; 8]);
    }
}
