//! Configuration for the fallback string scanner.

use crate::config::BinConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Minimum length for a string candidate (in characters)
    pub min_length: usize,
    /// Maximum length in characters; 0 is unlimited
    pub max_length: usize,
    /// Maximum number of bytes scanned from input
    pub max_scan_bytes: usize,
}

impl ScanConfig {
    /// Derive scanner limits from the global policy and a plugin preference.
    pub fn from_bin_config(cfg: &BinConfig, plugin_min: Option<usize>) -> Self {
        Self {
            min_length: cfg.effective_min_str_len(plugin_min),
            max_length: cfg.max_str_len,
            max_scan_bytes: cfg.max_string_scan_bytes,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_bin_config(&BinConfig::default(), None)
    }
}
