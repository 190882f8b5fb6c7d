//! Symbol, import and entry-point records.
//!
//! These are the normalized records every format plugin produces. Addresses
//! are optional: imports resolved at runtime, for instance, carry neither a
//! physical nor a virtual address.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::impl_rebase;

/// Classification of symbols by what they represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SymbolKind {
    /// Executable code (function, method, procedure)
    Function,
    /// Data object (variable, array, structure)
    Object,
    /// Section or segment symbol
    Section,
    /// Imported from external library
    Import,
    /// Table (e.g. WebAssembly function table)
    Table,
    /// Linear memory
    Memory,
    /// Global variable
    Global,
    /// Other or unknown symbol type
    #[default]
    Other,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "FUNC"),
            SymbolKind::Object => write!(f, "OBJ"),
            SymbolKind::Section => write!(f, "SECT"),
            SymbolKind::Import => write!(f, "IMPORT"),
            SymbolKind::Table => write!(f, "TABLE"),
            SymbolKind::Memory => write!(f, "MEMORY"),
            SymbolKind::Global => write!(f, "GLOBAL"),
            SymbolKind::Other => write!(f, "NOTYPE"),
        }
    }
}

/// Symbol binding/linkage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SymbolBinding {
    /// Local to the compilation unit
    Local,
    /// Globally visible
    Global,
    /// Weak binding (can be overridden)
    Weak,
    /// Binding not reported by the format
    #[default]
    None,
}

impl fmt::Display for SymbolBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolBinding::Local => write!(f, "LOCAL"),
            SymbolBinding::Global => write!(f, "GLOBAL"),
            SymbolBinding::Weak => write!(f, "WEAK"),
            SymbolBinding::None => write!(f, "NONE"),
        }
    }
}

/// A named program entity from a symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Symbol {
    /// Raw (possibly mangled) name
    pub name: String,
    /// Demangled name, when known
    pub dname: Option<String>,
    /// Owning class name, when the format or demangler reports one
    pub classname: Option<String>,
    /// Library the symbol is imported from
    pub libname: Option<String>,
    /// Forwarder target name
    pub forwarder: Option<String>,
    pub kind: SymbolKind,
    pub bind: SymbolBinding,
    /// File offset
    pub paddr: Option<u64>,
    /// Mapped address
    pub vaddr: Option<u64>,
    pub size: u64,
    pub ordinal: u32,
    pub is_imported: bool,
    /// How many other symbols share this name and address (set by filtering)
    pub dup_count: u32,
}

impl_rebase!(Symbol);

impl Symbol {
    /// Create a symbol with just a name and a physical address.
    pub fn new(name: impl Into<String>, paddr: Option<u64>) -> Self {
        Self {
            name: name.into(),
            paddr,
            ..Default::default()
        }
    }

    pub fn with_vaddr(mut self, vaddr: u64) -> Self {
        self.vaddr = Some(vaddr);
        self
    }

    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_class(mut self, classname: impl Into<String>) -> Self {
        self.classname = Some(classname.into());
        self
    }

    pub fn with_dname(mut self, dname: impl Into<String>) -> Self {
        self.dname = Some(dname.into());
        self
    }

    /// The demangled name if available, otherwise the raw name.
    pub fn display_name(&self) -> &str {
        self.dname.as_deref().unwrap_or(&self.name)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vaddr {
            Some(va) => write!(f, "{} {} {} @ {:#x}", self.kind, self.bind, self.name, va),
            None => write!(f, "{} {} {}", self.kind, self.bind, self.name),
        }
    }
}

/// An imported symbol that must be resolved at load time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Import {
    pub name: String,
    /// Module or library namespace of the import
    pub classname: Option<String>,
    pub kind: SymbolKind,
    pub bind: SymbolBinding,
    pub ordinal: u32,
}

impl Import {
    pub fn new(name: impl Into<String>, classname: Option<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            classname,
            kind,
            ..Default::default()
        }
    }
}

/// Role of an address record (entry points and special symbols).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntryKind {
    #[default]
    Program,
    Main,
    Init,
    Fini,
    Tls,
}

/// An address of interest reported by the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinAddr {
    pub paddr: Option<u64>,
    pub vaddr: Option<u64>,
    pub kind: EntryKind,
}

impl_rebase!(BinAddr);

impl BinAddr {
    pub fn new(paddr: u64, vaddr: Option<u64>, kind: EntryKind) -> Self {
        Self {
            paddr: Some(paddr),
            vaddr,
            kind,
        }
    }
}

/// Slots of the fixed-size special symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialSymbol {
    Entry,
    Init,
    Main,
    Fini,
}

impl SpecialSymbol {
    /// Number of slots in the table.
    pub const COUNT: usize = 4;

    pub const ALL: [SpecialSymbol; SpecialSymbol::COUNT] = [
        SpecialSymbol::Entry,
        SpecialSymbol::Init,
        SpecialSymbol::Main,
        SpecialSymbol::Fini,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SpecialSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialSymbol::Entry => write!(f, "entry"),
            SpecialSymbol::Init => write!(f, "init"),
            SpecialSymbol::Main => write!(f, "main"),
            SpecialSymbol::Fini => write!(f, "fini"),
        }
    }
}
