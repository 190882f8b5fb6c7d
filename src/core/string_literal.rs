//! StringLiteral type for extracted strings.
//!
//! A string record keeps its text, where it was found, and the encoding tag
//! assigned by the scanner or the normaliser.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::impl_rebase;

/// String encoding tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StringEncoding {
    #[default]
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
    /// Text recovered by unwrapping one or more base64 layers
    Base64,
}

impl fmt::Display for StringEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringEncoding::Ascii => write!(f, "ascii"),
            StringEncoding::Utf8 => write!(f, "utf8"),
            StringEncoding::Utf16Le => write!(f, "utf16le"),
            StringEncoding::Utf16Be => write!(f, "utf16be"),
            StringEncoding::Base64 => write!(f, "base64"),
        }
    }
}

/// An extracted string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    pub paddr: Option<u64>,
    pub vaddr: Option<u64>,
    /// Length in characters
    pub length: u32,
    /// Size in bytes in the buffer
    pub size: u32,
    pub ordinal: u32,
    pub encoding: StringEncoding,
}

impl_rebase!(StringLiteral);

impl StringLiteral {
    pub fn new(value: impl Into<String>, paddr: u64, size: u32, encoding: StringEncoding) -> Self {
        let value = value.into();
        Self {
            length: value.chars().count() as u32,
            value,
            paddr: Some(paddr),
            size,
            encoding,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x} {} {:?}",
            self.vaddr.or(self.paddr).unwrap_or(0),
            self.encoding,
            self.value
        )
    }
}
