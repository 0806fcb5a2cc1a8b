//! Procedural macros for Rabt.
//!
//! * `#[injectable]` - derives `Injectable` from an inherent impl block

use proc_macro::TokenStream;

mod injectable;

/// Derives `rabt::Injectable` from the constructors and tagged methods of
/// an inherent impl block.
///
/// ```ignore
/// #[injectable]
/// impl Engine {
///     pub fn new(#[named("power")] power: i32) -> Self { ... }
///
///     #[construct]
///     pub fn with_fuel(power: i32, fuel: Arc<Fuel>) -> Self { ... }
///
///     #[inject(name = "driver")]
///     pub fn set_driver(&mut self, driver: Arc<String>) { ... }
///
///     #[post_construct(priority = 1)]
///     fn ignite(&mut self) { ... }
/// }
/// ```
///
/// # Recognized items
///
/// - Constructors: `pub` associated functions returning `Self` or
///   `Result<Self, E>`, and any function tagged `#[construct]`. The tag also
///   designates the constructor when there are several.
/// - `#[named("q")]` on a constructor parameter - resolve it under `q`
/// - `#[inject]` / `#[inject(name = "q")]` - setter taking `&mut self` and
///   one value. A setter that is not `pub` fails reflection.
/// - `#[post_construct]` / `#[post_construct(priority = N)]` - hook run
///   after injection, lowest priority first
///
/// # Attributes
///
/// - `crate = "path"` - Optional: path to the rabt crate (default `::rabt`)
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    injectable::expand(attr.into(), item.into())
        .unwrap_or_else(|e| e.write_errors())
        .into()
}
