//! Grafting object namespaces into the shared tree.
//!
//! Layout after a successful construction:
//!
//! ```text
//! root
//! ├── cur   ──┐
//! └── fd.N  ──┴─> file namespace
//!                 ├── info     -> object namespace
//!                 └── addrinfo -> file address-info namespace
//! ```
//!
//! `cur` and `fd.N` hold two handles to the same file namespace; removing
//! one leaves the other intact.

use tracing::{debug, warn};

use super::Namespace;

/// Root key of the currently selected file.
pub const CUR_KEY: &str = "cur";
/// File-namespace key of the object namespace.
pub const INFO_KEY: &str = "info";
/// File-namespace key of the address-info namespace.
pub const ADDRINFO_KEY: &str = "addrinfo";

/// Root key of a file's namespace, by descriptor.
pub fn fd_key(fd: i32) -> String {
    format!("fd.{}", fd)
}

/// Graft an object's namespace under its file, and the file under the root.
///
/// Returns `false` if any graft was refused because it would create a cycle.
pub fn graft(
    root: &Namespace,
    file_ns: &Namespace,
    object_ns: &Namespace,
    addrinfo: &Namespace,
    fd: i32,
) -> bool {
    let ok = file_ns.ns_set(INFO_KEY, object_ns)
        && file_ns.ns_set(ADDRINFO_KEY, addrinfo)
        && root.ns_set(CUR_KEY, file_ns)
        && root.ns_set(fd_key(fd), file_ns);
    if ok {
        debug!(fd, refs = file_ns.ref_count(), "grafted file namespace");
    } else {
        warn!(fd, "refused namespace graft that would create a cycle");
    }
    ok
}

/// Remove a file's graft points from the root.
///
/// `cur` is only removed if it still points at this file's namespace.
pub fn ungraft(root: &Namespace, file_ns: &Namespace, fd: i32) {
    root.ns_unset(&fd_key(fd));
    if root
        .ns(CUR_KEY)
        .map(|cur| cur.ptr_eq(file_ns))
        .unwrap_or(false)
    {
        root.ns_unset(CUR_KEY);
    }
    debug!(fd, refs = file_ns.ref_count(), "ungrafted file namespace");
}

/// Point `cur` at a file namespace.
pub fn select(root: &Namespace, file_ns: &Namespace) -> bool {
    root.ns_set(CUR_KEY, file_ns)
}
