//! Nested key-value namespaces.
//!
//! Every object owns a private namespace at creation. Namespaces are shared
//! handles: grafting one under another stores a second handle, so a node
//! reachable through several graft points lives until the last of them is
//! removed. Grafts that would make a namespace reachable from itself are
//! refused, which keeps the reference graph acyclic.

pub mod bridge;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default)]
struct NsInner {
    name: String,
    kv: BTreeMap<String, String>,
    children: BTreeMap<String, Namespace>,
}

/// A shared, thread-safe key-value namespace.
#[derive(Clone, Default)]
pub struct Namespace {
    inner: Arc<RwLock<NsInner>>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(NsInner {
                name: name.into(),
                ..Default::default()
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    /// Set a key. Returns `true` when the stored value changed.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        let mut inner = self.inner.write();
        match inner.kv.insert(key.into(), value.clone()) {
            Some(old) => old != value,
            None => true,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().kv.get(key).cloned()
    }

    pub fn unset(&self, key: &str) -> bool {
        self.inner.write().kv.remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().kv.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().kv.len()
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.kv.is_empty() && inner.children.is_empty()
    }

    /// Graft `child` under `name`, replacing any previous graft there.
    ///
    /// Returns `false` (and changes nothing) if the graft would make this
    /// namespace reachable from itself.
    pub fn ns_set(&self, name: impl Into<String>, child: &Namespace) -> bool {
        if child.reaches(self) {
            return false;
        }
        self.inner
            .write()
            .children
            .insert(name.into(), child.clone());
        true
    }

    /// Look up a grafted namespace.
    pub fn ns(&self, name: &str) -> Option<Namespace> {
        self.inner.read().children.get(name).cloned()
    }

    /// Look up a child namespace, creating an empty one when absent.
    pub fn ns_or_create(&self, name: &str) -> Namespace {
        let mut inner = self.inner.write();
        inner
            .children
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name))
            .clone()
    }

    /// Remove a graft point, returning the handle that was stored there.
    pub fn ns_unset(&self, name: &str) -> Option<Namespace> {
        self.inner.write().children.remove(name)
    }

    pub fn ns_names(&self) -> Vec<String> {
        self.inner.read().children.keys().cloned().collect()
    }

    /// Whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this node (graft points plus owners).
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether `target` is this node or reachable from it.
    pub fn reaches(&self, target: &Namespace) -> bool {
        let mut stack = vec![self.clone()];
        let mut seen: HashSet<*const RwLock<NsInner>> = HashSet::new();
        while let Some(ns) = stack.pop() {
            if ns.ptr_eq(target) {
                return true;
            }
            if !seen.insert(Arc::as_ptr(&ns.inner)) {
                continue;
            }
            stack.extend(ns.inner.read().children.values().cloned());
        }
        false
    }

    /// Snapshot the tree as JSON: keys as strings, children as objects.
    pub fn to_json(&self) -> Value {
        let inner = self.inner.read();
        let mut map = Map::new();
        for (k, v) in &inner.kv {
            map.insert(k.clone(), Value::String(v.clone()));
        }
        for (name, child) in &inner.children {
            map.insert(name.clone(), child.to_json());
        }
        Value::Object(map)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Namespace")
            .field("name", &inner.name)
            .field("keys", &inner.kv.len())
            .field("children", &inner.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_unset() {
        let ns = Namespace::new("info");
        assert!(ns.set("arch", "wasm"));
        assert!(!ns.set("arch", "wasm"));
        assert!(ns.set("arch", "x86"));
        assert_eq!(ns.get("arch").as_deref(), Some("x86"));
        assert!(ns.unset("arch"));
        assert!(ns.get("arch").is_none());
        assert!(ns.is_empty());
    }

    #[test]
    fn test_graft_shares_node() {
        let root = Namespace::new("bin");
        let child = Namespace::new("info");
        assert!(root.ns_set("a", &child));
        assert!(root.ns_set("b", &child));
        assert_eq!(child.ref_count(), 3);

        root.ns("a").unwrap().set("k", "v");
        assert_eq!(root.ns("b").unwrap().get("k").as_deref(), Some("v"));

        drop(root.ns_unset("a"));
        assert_eq!(child.ref_count(), 2);
        assert_eq!(root.ns("b").unwrap().get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_cycles_are_refused() {
        let a = Namespace::new("a");
        let b = Namespace::new("b");
        assert!(a.ns_set("b", &b));
        assert!(!b.ns_set("a", &a));
        assert!(!a.ns_set("self", &a));
        assert!(a.reaches(&b));
        assert!(!b.reaches(&a));
    }

    #[test]
    fn test_ns_or_create() {
        let root = Namespace::new("root");
        let x = root.ns_or_create("x");
        x.set("k", "1");
        assert!(root.ns_or_create("x").ptr_eq(&x));
        assert_eq!(root.ns_names(), vec!["x".to_string()]);
    }

    #[test]
    fn test_to_json() {
        let root = Namespace::new("root");
        root.set("version", "1");
        let info = Namespace::new("info");
        info.set("arch", "wasm");
        root.ns_set("info", &info);
        let json = root.to_json();
        assert_eq!(json["version"], "1");
        assert_eq!(json["info"]["arch"], "wasm");
    }
}
