//! Core data types for binmodel.
//!
//! The normalized records every plugin produces, plus the address
//! arithmetic and identifier pools the object model is built on.

pub mod address;
pub mod binary;
pub mod class;
pub mod id;
pub mod language;
pub mod memory;
pub mod relocation;
pub mod section;
pub mod string_literal;
pub mod symbol;

pub use address::{Rebase, Translation, UNSPECIFIED};
pub use binary::{BinInfo, Endianness, FileType};
pub use class::{Class, Field};
pub use id::IdPool;
pub use language::Language;
pub use memory::{LineRecord, MemRegion, MemoryMap, RegisterState};
pub use relocation::{Relocation, RelocationType};
pub use section::{Section, SectionPerms};
pub use string_literal::{StringEncoding, StringLiteral};
pub use symbol::{BinAddr, EntryKind, Import, SpecialSymbol, Symbol, SymbolBinding, SymbolKind};
