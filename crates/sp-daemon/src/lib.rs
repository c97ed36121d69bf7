//! sp-daemon library surface.
//!
//! `main.rs` stays thin; the router, handlers, shared state, and wire types
//! live here so the scenario tests in `tests/` can compose the bare router
//! in-process.

pub mod api_types;
pub mod routes;
pub mod state;
