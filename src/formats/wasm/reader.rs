//! Bounds-checked cursor over module bytes

use super::types::{Result, WasmError};

#[derive(Debug, Clone)]
pub struct Reader<'data> {
    data: &'data [u8],
    pos: usize,
}

impl<'data> Reader<'data> {
    pub fn new(data: &'data [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(WasmError::Truncated {
            offset: self.pos,
            needed: 1,
        })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'data [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(WasmError::Truncated {
                offset: self.pos,
                needed: len,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Unsigned LEB128, at most 32 bits.
    pub fn read_uleb32(&mut self) -> Result<u32> {
        let start = self.pos;
        let mut result: u32 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            let low = u32::from(byte & 0x7f);
            if shift == 28 && low > 0x0f {
                return Err(WasmError::Overflow { offset: start });
            }
            result |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 28 {
                return Err(WasmError::Overflow { offset: start });
            }
        }
    }

    /// Length-prefixed UTF-8 name.
    pub fn read_name(&mut self) -> Result<&'data str> {
        let len = self.read_uleb32()? as usize;
        let at = self.pos;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|_| WasmError::InvalidString { offset: at })
    }

    /// Table and memory limits.
    pub fn skip_limits(&mut self) -> Result<()> {
        let flags = self.read_uleb32()?;
        self.read_uleb32()?;
        if flags & 1 != 0 {
            self.read_uleb32()?;
        }
        Ok(())
    }
}

/// Encode an unsigned LEB128 value.
pub fn write_uleb32(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leb128() {
        let mut r = Reader::new(&[0xe5, 0x8e, 0x26, 0x7f], 0);
        assert_eq!(r.read_uleb32().unwrap(), 624485);
        assert_eq!(r.read_uleb32().unwrap(), 127);
        assert!(r.is_empty());

        let mut out = Vec::new();
        write_uleb32(&mut out, 624485);
        assert_eq!(out, vec![0xe5, 0x8e, 0x26]);
    }

    #[test]
    fn test_leb128_overflow_and_truncation() {
        let mut r = Reader::new(&[0xff, 0xff, 0xff, 0xff, 0x7f], 0);
        assert!(matches!(r.read_uleb32(), Err(WasmError::Overflow { .. })));
        let mut r = Reader::new(&[0x80, 0x80], 0);
        assert!(matches!(r.read_uleb32(), Err(WasmError::Truncated { .. })));
        let mut r = Reader::new(&[0x05, b'a'], 0);
        assert!(matches!(r.read_name(), Err(WasmError::Truncated { .. })));
    }
}
