//! binmodel: a format-independent model of loaded binaries.
//!
//! A [`Bin`] context owns a registry of format plugins and the set of open
//! files. Opening a buffer picks a plugin, builds a [`BinaryObject`] from it
//! and runs the extraction pipeline, which rebases every record into one
//! address space, indexes relocations, recovers strings and classes, and
//! grafts the object's metadata into the shared namespace tree.
//!
//! ```no_run
//! use binmodel::{Bin, BinConfig, LoadOptions};
//!
//! let mut bin = Bin::with_default_plugins(BinConfig::default());
//! let file = bin.open_path("module.wasm", &LoadOptions::default())?;
//! let obj = bin.current_object().expect("object loaded");
//! for sym in obj.symbols().unwrap_or(&[]) {
//!     println!("{sym}");
//! }
//! # let _ = file;
//! # Ok::<(), binmodel::BinError>(())
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod demangle;
pub mod error;
pub mod file;
pub mod formats;
pub mod hashing;
pub mod logging;
pub mod metadata;
pub mod object;
pub mod plugin;
pub mod strings;
pub mod symbols;

pub use config::{BinConfig, RequestFilter};
pub use context::{Bin, LoadOptions};
pub use error::{BinError, PluginError, Result};
pub use file::BinFile;
pub use metadata::Namespace;
pub use object::{BinaryObject, CreateParams, RelocIndex};
pub use plugin::{BinFormat, BinPlugin, CreateOptions, IoView, LoadContext};
