//! Integration tests for the simulation core.
//!
//! Each submodule drives one layer through the public API.

mod frame;
mod quadtree;
mod store;
