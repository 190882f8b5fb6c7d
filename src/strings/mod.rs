//! String extraction fallback and normalisation.
//!
//! Plugins usually know where their strings live. When one does not, the
//! pipeline runs the bounded scanner here over the data sections (or the
//! whole buffer). Extracted strings may then be unwrapped from base64.

pub mod base64;
mod config;
pub mod normalize;
mod scan;

pub use config::ScanConfig;
pub use normalize::{decode_nested, is_printable, normalize_string, normalize_strings};
pub use scan::{scan_ranges, scan_strings};
