//! # Rabt Support
//!
//! Shared utilities for the Rabt binder crates.
//!
//! This crate provides:
//! - Rendering of resolution chains and type names for error messages
//! - "Did you mean?" suggestions for unbound keys

pub mod rendering;
