//! Source-language inference from symbol, import and library names.
//!
//! Evidence is counted per language and the strongest signal wins. Runtime
//! libraries are decisive on their own; mangling schemes are counted.

use crate::core::{BinInfo, Import, Language, Symbol};

/// Per-language evidence counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LanguageEvidence {
    pub rust: u32,
    pub cxx: u32,
    pub swift: u32,
    pub objc: u32,
    pub go: u32,
    pub dlang: u32,
    pub plain_c: u32,
}

fn strip_import_prefix(name: &str) -> &str {
    name.strip_prefix("imp.").unwrap_or(name)
}

/// Swift mangling prefixes, with and without the Mach-O underscore.
pub fn is_swift_symbol(name: &str) -> bool {
    let name = name.strip_prefix('_').unwrap_or(name);
    name.starts_with("$s")
        || name.starts_with("$S")
        || name.starts_with("T0")
        || name.starts_with("swift_")
}

fn is_dlang_symbol(name: &str) -> bool {
    let name = name.strip_prefix('_').unwrap_or(name);
    name.len() > 2
        && name.starts_with('D')
        && name[1..].chars().next().map_or(false, |c| c.is_ascii_digit())
}

fn classify(name: &str, ev: &mut LanguageEvidence) {
    let name = strip_import_prefix(name);
    if is_swift_symbol(name) {
        ev.swift += 1;
    } else if name.starts_with("_R")
        || (name.starts_with("_ZN") && name.contains("17h"))
        || name.contains("$LT$")
        || name.contains("$u20$")
        || name.starts_with("rust_")
    {
        ev.rust += 1;
    } else if name.starts_with("_Z") || name.starts_with("__Z") || name.starts_with('?') {
        ev.cxx += 1;
    } else if name.starts_with("+[")
        || name.starts_with("-[")
        || name.starts_with("objc_")
        || name.starts_with("_OBJC_")
    {
        ev.objc += 1;
    } else if name.starts_with("runtime.") || name.starts_with("main.") || name.contains('\u{b7}')
    {
        ev.go += 1;
    } else if is_dlang_symbol(name) {
        ev.dlang += 1;
    } else if matches!(
        name,
        "malloc" | "free" | "printf" | "puts" | "memcpy" | "strlen" | "main" | "exit" | "abort"
    ) {
        ev.plain_c += 1;
    }
}

/// Count evidence over every symbol and import name.
pub fn collect_evidence(symbols: &[Symbol], imports: &[Import]) -> LanguageEvidence {
    let mut ev = LanguageEvidence::default();
    for name in symbols
        .iter()
        .map(|s| s.name.as_str())
        .chain(imports.iter().map(|i| i.name.as_str()))
    {
        classify(name, &mut ev);
    }
    ev
}

fn from_libraries(libs: &[String]) -> Option<Language> {
    for lib in libs {
        let lower = lib.to_lowercase();
        if lower.contains("libswiftcore") {
            return Some(Language::Swift);
        }
        if lower.starts_with("mscoree") {
            return Some(Language::Dotnet);
        }
        if lower.contains("libobjc") {
            return Some(Language::ObjC);
        }
    }
    None
}

/// Whether names alone identify the object as Swift.
pub fn is_swift(symbols: &[Symbol], imports: &[Import], libs: &[String]) -> bool {
    if from_libraries(libs) == Some(Language::Swift) {
        return true;
    }
    symbols.iter().any(|s| is_swift_symbol(&s.name))
        || imports.iter().any(|i| is_swift_symbol(strip_import_prefix(&i.name)))
}

/// Infer the source language of an object.
pub fn infer_language(
    info: Option<&BinInfo>,
    symbols: &[Symbol],
    imports: &[Import],
    libs: &[String],
) -> Language {
    if let Some(info) = info {
        if info.rclass == "class" || info.rclass == "dex" {
            return Language::Java;
        }
    }
    if let Some(lang) = from_libraries(libs) {
        return lang;
    }

    let ev = collect_evidence(symbols, imports);
    // ordered by priority when counts tie
    let ranked = [
        (ev.swift, Language::Swift),
        (ev.rust, Language::Rust),
        (ev.objc, Language::ObjC),
        (ev.go, Language::Go),
        (ev.dlang, Language::Dlang),
        (ev.cxx, Language::Cxx),
        (ev.plain_c, Language::C),
    ];
    let mut best = (0u32, Language::Unknown);
    for (count, lang) in ranked {
        if count > best.0 {
            best = (count, lang);
        }
    }
    if best.1 == Language::Unknown && libs.iter().any(|l| {
        let l = l.to_lowercase();
        l.contains("stdc++") || l.contains("libc++")
    }) {
        return Language::Cxx;
    }
    best.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SymbolKind;

    fn syms(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|n| Symbol::new(*n, Some(0))).collect()
    }

    #[test]
    fn test_swift_by_symbols() {
        let s = syms(&["_$s4main3FooC3baryyF", "_$s4main3FooCMa", "_main"]);
        assert!(is_swift(&s, &[], &[]));
        assert_eq!(infer_language(None, &s, &[], &[]), Language::Swift);
    }

    #[test]
    fn test_swift_by_library() {
        let libs = vec!["/usr/lib/swift/libswiftCore.dylib".to_string()];
        assert!(is_swift(&[], &[], &libs));
        assert_eq!(infer_language(None, &[], &[], &libs), Language::Swift);
    }

    #[test]
    fn test_rust_and_cxx() {
        let s = syms(&["_ZN4core3fmt5write17h0123456789abcdefE", "_RNvCs123_4main4main"]);
        assert_eq!(infer_language(None, &s, &[], &[]), Language::Rust);
        let s = syms(&["_Z3foov", "_ZN3foo3barEv", "main"]);
        assert_eq!(infer_language(None, &s, &[], &[]), Language::Cxx);
    }

    #[test]
    fn test_imports_count() {
        let imports = vec![
            Import::new("printf", None, SymbolKind::Function),
            Import::new("imp.malloc", None, SymbolKind::Function),
        ];
        assert_eq!(infer_language(None, &[], &imports, &[]), Language::C);
    }

    #[test]
    fn test_java_and_unknown() {
        let info = BinInfo {
            rclass: "class".into(),
            ..Default::default()
        };
        assert_eq!(infer_language(Some(&info), &[], &[], &[]), Language::Java);
        assert_eq!(infer_language(None, &syms(&["fcn.0"]), &[], &[]), Language::Unknown);
    }

    #[test]
    fn test_dlang() {
        let s = syms(&["_D4main4mainFZv"]);
        assert_eq!(infer_language(None, &s, &[], &[]), Language::Dlang);
    }
}
