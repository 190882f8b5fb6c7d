//! Demangler helpers for Rust, C++ (Itanium) and MSVC symbols.
//!
//! The pipeline uses [`fill_demangled`] to give every symbol without a
//! plugin-supplied demangled name one from the matching demangler.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::Symbol;

static RE_ITA_MANGLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_{1,2}Z[A-Za-z0-9_]+").expect("valid itanium regex"));
static RE_MSVC_MANGLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\?[A-Za-z0-9_@?$]+").expect("valid msvc regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFlavor {
    Rust,
    Itanium,
    Msvc,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemangleResult {
    pub original: String,
    pub demangled: String,
    pub flavor: SymbolFlavor,
}

/// Strip one import-table decoration (`imp.`, `sym.imp.`) before demangling.
fn strip_decoration(s: &str) -> &str {
    let s = s.strip_prefix("sym.").unwrap_or(s);
    s.strip_prefix("imp.").unwrap_or(s)
}

pub fn detect_flavor(s: &str) -> SymbolFlavor {
    let s = strip_decoration(s);
    if rustc_demangle::try_demangle(s).is_ok() {
        return SymbolFlavor::Rust;
    }
    if RE_ITA_MANGLED.is_match(s) {
        return SymbolFlavor::Itanium;
    }
    if RE_MSVC_MANGLED.is_match(s) {
        return SymbolFlavor::Msvc;
    }
    SymbolFlavor::Unknown
}

/// Attempt to demangle a single symbol. Returns None when not recognized.
pub fn demangle_one(s: &str) -> Option<DemangleResult> {
    let name = strip_decoration(s);
    let result = |demangled: String, flavor| {
        Some(DemangleResult {
            original: s.to_string(),
            demangled,
            flavor,
        })
    };
    // Rust (v0 + legacy) demangler; {:#} drops the hash suffix
    if let Ok(dm) = rustc_demangle::try_demangle(name) {
        return result(format!("{:#}", dm), SymbolFlavor::Rust);
    }
    if RE_ITA_MANGLED.is_match(name) {
        // Mach-O adds one extra leading underscore
        let candidate = if name.starts_with("__Z") {
            &name[1..]
        } else {
            name
        };
        if let Ok(sym) = cpp_demangle::Symbol::new(candidate) {
            return result(sym.to_string(), SymbolFlavor::Itanium);
        }
    }
    if RE_MSVC_MANGLED.is_match(name) {
        if let Ok(out) = msvc_demangler::demangle(name, msvc_demangler::DemangleFlags::COMPLETE) {
            return result(out, SymbolFlavor::Msvc);
        }
    }
    None
}

/// Fill `dname` for symbols that lack one. Returns how many were filled.
pub fn fill_demangled(symbols: &mut [Symbol]) -> usize {
    let mut filled = 0;
    for sym in symbols.iter_mut().filter(|s| s.dname.is_none()) {
        if let Some(r) = demangle_one(&sym.name) {
            if r.demangled != sym.name {
                sym.dname = Some(r.demangled);
                filled += 1;
            }
        }
    }
    filled
}
