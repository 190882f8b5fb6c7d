//! Global extraction policy.
//!
//! Mirrors the knobs a caller sets once on the [`crate::context::Bin`]
//! context: which expensive item lists to extract, whether names are
//! filtered, and how strings are scanned and normalised.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Item lists the caller actually needs.
    ///
    /// Relocations, imports, strings and classes are only extracted when
    /// requested, since some formats make them very expensive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RequestFilter: u32 {
        const ENTRIES = 1 << 0;
        const SECTIONS = 1 << 1;
        const SYMBOLS = 1 << 2;
        const IMPORTS = 1 << 3;
        const RELOCS = 1 << 4;
        const STRINGS = 1 << 5;
        const CLASSES = 1 << 6;
    }
}

impl Default for RequestFilter {
    fn default() -> Self {
        RequestFilter::all()
    }
}

/// Fallback minimum string length when neither config nor plugin sets one.
pub const DEFAULT_MIN_STR_LEN: usize = 4;

/// Configuration shared by every object built through a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinConfig {
    /// Filter and deduplicate symbol, section and class names
    pub filter: bool,
    /// Which optional item lists to extract
    pub filter_rules: RequestFilter,
    /// Unwrap base64-encoded strings after extraction
    pub debase64: bool,
    /// Minimum string length; 0 defers to the plugin
    pub min_str_len: usize,
    /// Maximum string length; 0 means unlimited
    pub max_str_len: usize,
    /// Scan the whole buffer instead of data sections only
    pub raw_strings: bool,
    /// Upper bound on bytes scanned by the generic string scanner
    pub max_string_scan_bytes: usize,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            filter: true,
            filter_rules: RequestFilter::default(),
            debase64: false,
            min_str_len: 0,
            max_str_len: 0,
            raw_strings: false,
            max_string_scan_bytes: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl BinConfig {
    /// Resolve the minimum string length against a plugin preference.
    pub fn effective_min_str_len(&self, plugin_min: Option<usize>) -> usize {
        if self.min_str_len > 0 {
            return self.min_str_len;
        }
        match plugin_min {
            Some(n) if n > 0 => n,
            _ => DEFAULT_MIN_STR_LEN,
        }
    }

    /// Whether any of the given item lists were requested.
    pub fn wants(&self, rules: RequestFilter) -> bool {
        self.filter_rules.intersects(rules)
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| e.to_string())
    }

    pub fn from_json(json_str: &str) -> Result<Self, String> {
        serde_json::from_str(json_str).map_err(|e| e.to_string())
    }
}
