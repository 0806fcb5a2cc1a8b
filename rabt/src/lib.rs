//! # Rabt: binding registry and injector for Rust
//!
//! Declare what each request type resolves to, then let the binder
//! construct the object graph:
//!
//! ```rust,ignore
//! use rabt::prelude::*;
//! use std::sync::Arc;
//!
//! struct Engine {
//!     power: i32,
//! }
//!
//! #[rabt::injectable]
//! impl Engine {
//!     pub fn new(power: i32) -> Self {
//!         Engine { power }
//!     }
//! }
//!
//! let binder = InjectionBinder::new();
//! binder.bind::<i32>().as_value(42)?;
//! binder.bind::<Engine>().to::<Engine>()?;
//!
//! let engine: Arc<Engine> = binder.get_instance()?;
//! assert_eq!(engine.power, 42);
//! ```

pub use rabt_container::*;
pub use rabt_derive::*;
pub use rabt_support::*;
