//! Data layer
//!
//! In-memory only; nothing survives a restart.

mod values;

pub use values::UserValues;
