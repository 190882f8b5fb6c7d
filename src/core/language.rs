//! Source-language tag of a binary object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language a binary was most likely compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    Unknown,
    C,
    Cxx,
    ObjC,
    /// Structure is encoded in mangled symbol names rather than class tables
    Swift,
    Rust,
    Go,
    Dlang,
    Dotnet,
    Java,
}

impl Language {
    /// Whether class structure must be reconstructed from symbol names.
    pub fn encodes_structure_in_symbols(self) -> bool {
        matches!(self, Language::Swift)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::Unknown => "unknown",
            Language::C => "c",
            Language::Cxx => "c++",
            Language::ObjC => "objc",
            Language::Swift => "swift",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Dlang => "dlang",
            Language::Dotnet => "dotnet",
            Language::Java => "java",
        };
        write!(f, "{}", s)
    }
}
