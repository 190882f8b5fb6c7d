//! Format plugins shipped with the crate.

#[cfg(feature = "wasm")]
pub mod wasm;
