//! Error types for binmodel.
//!
//! Object construction is atomic: every variant here is returned only after
//! all partially allocated state has been released.

use thiserror::Error;

/// Main error type for binary object operations.
#[derive(Debug, Error)]
pub enum BinError {
    /// A required input (file, plugin) was missing or does not exist
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The plugin does not implement a mandatory capability
    #[error("Plugin '{plugin}' does not implement mandatory capability '{capability}'")]
    PluginContractViolation {
        plugin: String,
        capability: &'static str,
    },

    /// The plugin rejected the buffer
    #[error("Plugin '{plugin}' failed to load buffer: {reason}")]
    LoadFailure { plugin: String, reason: String },

    /// The identifier pool has no ids left
    #[error("Identifier pool exhausted")]
    IdExhaustion,

    /// Out of memory while building part of an object
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// Lookup by id or name found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for binmodel operations
pub type Result<T> = std::result::Result<T, BinError>;

/// Errors reported by format plugins through the capability contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The capability is not implemented by this plugin
    #[error("capability not supported")]
    NotSupported,

    /// The plugin does not recognise the buffer
    #[error("buffer rejected: {0}")]
    Rejected(String),

    /// The buffer was recognised but is malformed
    #[error("malformed input at offset {offset:#x}: {message}")]
    Malformed { offset: u64, message: String },
}

impl BinError {
    /// Map a failed `load_buffer` call onto the construction taxonomy.
    pub(crate) fn from_load(plugin: &str, err: PluginError) -> Self {
        match err {
            PluginError::NotSupported => BinError::PluginContractViolation {
                plugin: plugin.to_string(),
                capability: "load_buffer",
            },
            other => BinError::LoadFailure {
                plugin: plugin.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
