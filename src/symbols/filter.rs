//! Name filtering and deduplication for symbols, sections and classes.
//!
//! Symbols: a repeated name at the same address counts as a duplicate
//! (`dup_count`), a repeated name at another address is renamed `name_N`.
//! Sections and classes are renamed `name_N` on any repeat.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::core::{Class, Section, Symbol};

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_.:$@?<>~-".contains(c)
}

/// Replace characters that cannot appear in a flag name with `_`.
///
/// If the output buffer cannot be allocated the original name is returned
/// unchanged.
pub fn filter_name(name: &str) -> String {
    let mut out = String::new();
    if out.try_reserve(name.len()).is_err() {
        warn!(len = name.len(), "cannot allocate filtered name, keeping original");
        return name.to_string();
    }
    out.extend(name.chars().map(|c| if is_name_char(c) { c } else { '_' }));
    out
}

/// Pick the first `base_N` (N >= 1) not yet in `taken` and reserve it.
fn unique_suffixed(base: &str, mut n: usize, taken: &mut HashSet<String>) -> String {
    loop {
        let candidate = format!("{}_{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Deduplicate symbol names in place. Returns how many were renamed.
pub fn filter_symbols(symbols: &mut [Symbol]) -> usize {
    // name -> (first vaddr, same-address repeats, renames so far)
    let mut seen: HashMap<String, (Option<u64>, u32, usize)> = HashMap::new();
    let mut taken: HashSet<String> = symbols.iter().map(|s| s.name.clone()).collect();
    let mut renamed = 0;

    for sym in symbols.iter_mut() {
        match seen.get_mut(&sym.name) {
            None => {
                seen.insert(sym.name.clone(), (sym.vaddr, 0, 0));
                sym.dup_count = 0;
            }
            Some((vaddr, dups, _)) if *vaddr == sym.vaddr => {
                *dups += 1;
                sym.dup_count = *dups;
            }
            Some((_, _, renames)) => {
                *renames += 1;
                sym.name = unique_suffixed(&sym.name, *renames, &mut taken);
                sym.dup_count = 0;
                renamed += 1;
            }
        }
    }
    renamed
}

/// Sanitise and deduplicate section names. Returns how many were renamed.
pub fn filter_sections(sections: &mut [Section]) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut renamed = 0;
    for sec in sections.iter_mut() {
        let name = filter_name(&sec.name);
        let n = counts.entry(name.clone()).or_insert(0);
        if *n == 0 && taken.insert(name.clone()) {
            sec.name = name;
        } else {
            sec.name = unique_suffixed(&name, (*n).max(1), &mut taken);
            renamed += 1;
        }
        *n += 1;
    }
    renamed
}

/// Sanitise and deduplicate class names, then deduplicate each class's
/// method names.
pub fn filter_classes(classes: &mut [Class]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    for class in classes.iter_mut() {
        let name = filter_name(&class.name);
        let n = counts.entry(name.clone()).or_insert(0);
        if *n == 0 && taken.insert(name.clone()) {
            class.name = name;
        } else {
            class.name = unique_suffixed(&name, (*n).max(1), &mut taken);
        }
        *n += 1;
        filter_symbols(&mut class.methods);
    }
}
