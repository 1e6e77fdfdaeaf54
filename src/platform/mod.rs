//! Host engine implementations
//!
//! The gameplay only sees the [`Host`](crate::sim::Host) trait. `headless`
//! is the in-memory reference host used by the binary and the tests.

pub mod headless;

pub use headless::{HeadlessHost, Request, TileLayout};
