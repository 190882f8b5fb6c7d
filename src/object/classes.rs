//! Class reconstruction from symbol names, and the method-address cache.
//!
//! Languages such as Swift carry no class table a plugin could read; their
//! structure lives in mangled names. Candidates are symbols whose raw name
//! starts with `_` and which carry a class name. For each candidate:
//!
//! - a demangled name containing `.getter_`, `.setter_` or `.method_` and the
//!   class name followed by `.` yields a field, named by the text after
//!   `Class.` up to the next `.`;
//! - otherwise, a demangled name without `..` containing `Class.` adds the
//!   symbol to the class's methods.
//!
//! Every candidate produces its own class record. Classes sharing a name are
//! not merged.

use std::collections::BTreeMap;

use tracing::trace;

use crate::core::{Class, Field, Symbol};

const FIELD_MARKERS: [&str; 3] = [".getter_", ".setter_", ".method_"];
const CANDIDATE_PREFIX: char = '_';
const INTERNAL_MARKER: &str = "..";

/// Text after the first `classname.` in `dname`.
fn after_class<'a>(dname: &'a str, classname: &str) -> Option<&'a str> {
    let at = dname.find(classname)?;
    dname[at + classname.len()..].strip_prefix('.')
}

/// Field name encoded in an accessor's demangled name.
pub fn swift_field(dname: &str, classname: &str) -> Option<String> {
    if !FIELD_MARKERS.iter().any(|m| dname.contains(m)) {
        return None;
    }
    let rest = after_class(dname, classname)?;
    let name = rest.split('.').next().unwrap_or(rest);
    Some(name.to_string())
}

/// Reconstruct classes from symbols. `None` when nothing matched.
pub fn classes_from_symbols(symbols: &[Symbol]) -> Option<Vec<Class>> {
    let mut classes: Vec<Class> = Vec::new();
    for sym in symbols {
        if !sym.name.starts_with(CANDIDATE_PREFIX) {
            continue;
        }
        let Some(cn) = sym.classname.as_deref() else {
            continue;
        };

        let mut class = Class::new(cn, None, classes.len() as u32);
        class.addr = sym.vaddr.unwrap_or(0);

        let dname = sym.display_name();
        if let Some(field) = swift_field(dname, cn) {
            trace!(class = cn, field = %field, "field from symbol");
            class
                .fields
                .push(Field::new(field, sym.paddr, sym.vaddr, sym.size));
        } else if !dname.contains(INTERNAL_MARKER) && after_class(dname, cn).is_some() {
            trace!(class = cn, method = %sym.name, "method from symbol");
            class.methods.push(sym.clone());
        }
        classes.push(class);
    }
    if classes.is_empty() {
        None
    } else {
        Some(classes)
    }
}

/// Cache key of a method address.
pub fn method_cache_key(vaddr: u64) -> String {
    format!("0x{:08x}", vaddr)
}

/// Map every method address to `"class.method"`.
pub fn build_class_method_cache(classes: &[Class]) -> BTreeMap<String, String> {
    let mut cache = BTreeMap::new();
    for class in classes {
        for method in &class.methods {
            let Some(vaddr) = method.vaddr else {
                continue;
            };
            cache.insert(
                method_cache_key(vaddr),
                format!("{}.{}", class.name, method.name),
            );
        }
    }
    cache
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swift_sym(name: &str, dname: &str, class: &str, vaddr: u64) -> Symbol {
        Symbol::new(name, Some(vaddr))
            .with_vaddr(vaddr)
            .with_class(class)
            .with_dname(dname)
    }

    #[test]
    fn test_swift_field() {
        assert_eq!(
            swift_field("main.Foo.count.getter_Swift.Int", "Foo").as_deref(),
            Some("count")
        );
        assert_eq!(
            swift_field("main.Foo.name.setter_Swift.String", "Foo").as_deref(),
            Some("name")
        );
        assert!(swift_field("main.Foo.run() -> ()", "Foo").is_none());
        // class name not followed by a separator
        assert!(swift_field("main.FooBar.getter_x", "Foo").is_none());
    }

    #[test]
    fn test_fields_and_methods() {
        let syms = vec![
            swift_sym("_$s4main3FooC5countSivg", "main.Foo.count.getter_Swift.Int", "Foo", 0x100),
            swift_sym("_$s4main3FooC3runyyF", "main.Foo.run() -> ()", "Foo", 0x200),
            swift_sym("_$s4main3FooC..internal", "main.Foo..internal", "Foo", 0x300),
            // not a candidate: no leading underscore
            swift_sym("$s4main3FooC3runyyF", "main.Foo.run() -> ()", "Foo", 0x400),
            // not a candidate: no class name
            Symbol::new("_main", Some(0x500)),
        ];
        let classes = classes_from_symbols(&syms).unwrap();
        assert_eq!(classes.len(), 3);
        assert_eq!(classes[0].fields.len(), 1);
        assert_eq!(classes[0].fields[0].name, "count");
        assert_eq!(classes[0].fields[0].vaddr, Some(0x100));
        assert_eq!(classes[1].methods.len(), 1);
        assert_eq!(classes[1].methods[0].vaddr, Some(0x200));
        assert!(classes[2].is_empty());
    }

    #[test]
    fn test_duplicate_classes_are_not_merged() {
        // one record per matching symbol, even for the same class name
        let syms = vec![
            swift_sym("_a", "main.Foo.a() -> ()", "Foo", 0x10),
            swift_sym("_b", "main.Foo.b() -> ()", "Foo", 0x20),
        ];
        let classes = classes_from_symbols(&syms).unwrap();
        assert_eq!(classes.len(), 2);
        assert!(classes.iter().all(|c| c.name == "Foo"));
        assert_eq!(classes[0].index, 0);
        assert_eq!(classes[1].index, 1);
    }

    #[test]
    fn test_no_candidates() {
        let syms = vec![Symbol::new("main", Some(0)).with_class("Foo")];
        assert!(classes_from_symbols(&syms).is_none());
        assert!(classes_from_symbols(&[]).is_none());
    }

    #[test]
    fn test_method_cache() {
        let syms = vec![
            swift_sym("_run", "main.Foo.run() -> ()", "Foo", 0x1234),
            swift_sym("_stop", "main.Foo.stop() -> ()", "Foo", 0x2000),
        ];
        let classes = classes_from_symbols(&syms).unwrap();
        let cache = build_class_method_cache(&classes);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("0x00001234").map(String::as_str), Some("Foo._run"));
        assert_eq!(cache.get("0x00002000").map(String::as_str), Some("Foo._stop"));
    }
}
