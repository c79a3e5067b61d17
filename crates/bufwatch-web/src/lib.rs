#![forbid(unsafe_code)]

//! WASM frontend for bufwatch.
//!
//! Host-specific glue around `bufwatch-core`:
//! - parsing the relation listing JSON,
//! - a millisecond-addressed session driver for JS hosts,
//! - a canvas 2D [`Surface`](bufwatch_core::Surface) and the `wasm-bindgen`
//!   facade (wasm32 only).

pub mod css;
pub mod driver;
pub mod listing;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{BufWatchWeb, CanvasSurface};

pub use driver::HostDriver;
pub use listing::{JsonListing, ListingError, RelationRecord, parse_listing};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct BufWatchWeb;

#[cfg(not(target_arch = "wasm32"))]
impl BufWatchWeb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
