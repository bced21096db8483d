// src/fetch/mod.rs

//! Resource retrieval.
//!
//! - [`backend`] provides the `FetchBackend` trait the runtime dispatches
//!   units to, and `FileFetchBackend`, which reads resources from disk.
//! - [`preload`] fetches the non-gated resources (styles, head scripts)
//!   before a session starts.

pub mod backend;
pub mod preload;

pub use backend::{FetchBackend, FileFetchBackend};
pub use preload::preload;
