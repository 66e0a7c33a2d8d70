//! Endpoint module - the device's introspected interface.
//!
//! Provides:
//! - [`Endpoint`] - a named, typed, addressable node owning its members
//! - [`build_tree`] - turns the interface document into an endpoint tree
//!
//! The tree is built once from a complete document and never changes shape;
//! only the device-side values behind each endpoint id change.

mod builder;
mod tree;

pub use builder::{build_tree, build_tree_from_value};
pub use tree::{Endpoint, Walk, CONTAINER_TYPE, DEFAULT_ACCESS};
