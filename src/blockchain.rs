// Thin re-export module: implementation is in `blockchain/core.rs` so that
// chain structure, integrity validation and search stay in separate files.

pub mod core;
pub use core::*;
