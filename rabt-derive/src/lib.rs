//! Attribute macros for Rabt, re-exported for the facade crate.

pub use rabt_macros::injectable;
