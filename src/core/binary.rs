//! Plugin-level description of a binary.
//!
//! `BinInfo` is the descriptor a plugin reports for a loaded buffer:
//! architecture, bit width, endianness, OS and file type. Lookups such as
//! [`crate::file::BinFile::find_by_arch_bits`] match against it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The endianness of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Endianness {
    /// Little-endian byte order
    #[default]
    Little,
    /// Big-endian byte order
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}

/// Coarse category of a file as reported by its plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FileType {
    #[default]
    Unknown,
    Executable,
    SharedLibrary,
    Relocatable,
    /// Process memory dump; register state and memory maps are available
    Core,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Unknown => write!(f, "unknown"),
            FileType::Executable => write!(f, "exec"),
            FileType::SharedLibrary => write!(f, "dyn"),
            FileType::Relocatable => write!(f, "rel"),
            FileType::Core => write!(f, "core"),
        }
    }
}

/// Descriptor of a loaded binary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinInfo {
    /// File name the info was produced for
    pub file: String,
    pub arch: String,
    pub machine: String,
    pub bits: u32,
    pub endian: Endianness,
    pub os: String,
    /// Free-form type string ("EXEC", "DYN", ...)
    pub bin_type: String,
    /// Binary class ("ELF64", "module", ...)
    pub bclass: String,
    /// Plugin family ("elf", "wasm", ...)
    pub rclass: String,
    pub subsystem: String,
    /// Whether the format uses virtual addressing
    pub has_va: bool,
    pub has_debug_info: bool,
}

impl BinInfo {
    /// Exact match on architecture, bit width and file name.
    pub fn matches(&self, arch: &str, bits: u32, file: &str) -> bool {
        self.bits == bits && self.arch == arch && self.file == file
    }
}

impl fmt::Display for BinInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-bit {} ({}, {})",
            self.arch, self.bits, self.endian, self.os, self.bin_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BinInfo {
        BinInfo {
            file: "a.wasm".into(),
            arch: "wasm".into(),
            bits: 32,
            os: "WebAssembly".into(),
            bin_type: "EXEC".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_matches_is_exact() {
        let i = info();
        assert!(i.matches("wasm", 32, "a.wasm"));
        assert!(!i.matches("wasm", 64, "a.wasm"));
        assert!(!i.matches("was", 32, "a.wasm"));
        assert!(!i.matches("wasm", 32, "a.was"));
    }

    #[test]
    fn test_display() {
        assert_eq!(info().to_string(), "wasm 32-bit little (WebAssembly, EXEC)");
        assert_eq!(FileType::Core.to_string(), "core");
    }
}
