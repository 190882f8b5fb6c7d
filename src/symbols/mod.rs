//! # Symbols Module
//!
//! Post-extraction processing of symbol lists: name filtering and
//! deduplication, and source-language inference.

pub mod filter;
pub mod lang;

pub use filter::{filter_classes, filter_name, filter_sections, filter_symbols};
pub use lang::{infer_language, is_swift, LanguageEvidence};
