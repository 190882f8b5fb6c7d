//! Class and field records.
//!
//! Classes either come straight from a plugin (formats with a class table)
//! or are reconstructed from symbol names by
//! [`crate::object::classes::classes_from_symbols`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::impl_rebase;
use crate::core::symbol::Symbol;

/// A field of a class or a format-level field record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub paddr: Option<u64>,
    pub vaddr: Option<u64>,
    pub size: u64,
    /// Type or format descriptor, when known
    pub kind: Option<String>,
    pub comment: Option<String>,
}

impl_rebase!(Field);

impl Field {
    pub fn new(name: impl Into<String>, paddr: Option<u64>, vaddr: Option<u64>, size: u64) -> Self {
        Self {
            name: name.into(),
            paddr,
            vaddr,
            size,
            ..Default::default()
        }
    }
}

/// A class with its methods and fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub super_name: Option<String>,
    pub index: u32,
    pub addr: u64,
    pub fields: Vec<Field>,
    pub methods: Vec<Symbol>,
}

impl Class {
    pub fn new(name: impl Into<String>, super_name: Option<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            super_name,
            index,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.methods.is_empty()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.super_name {
            Some(sup) => write!(f, "class {} : {}", self.name, sup)?,
            None => write!(f, "class {}", self.name)?,
        }
        write!(
            f,
            " ({} methods, {} fields)",
            self.methods.len(),
            self.fields.len()
        )
    }
}
