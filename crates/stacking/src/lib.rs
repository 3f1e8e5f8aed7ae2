//! Pyramid stacks of items along straight lines or curves
//!
//! This crate lays out triangular stacks (every row one item shorter than the
//! row below, shifted by half a spacing) and turns them into scene nodes:
//! - [`random`] - Seeded jitter source, reproducible per seed
//! - [`curve`] - Curve sampling interface and a polyline implementation
//! - [`arc_length`] - Arc-length tables for evenly spaced curve items
//! - [`builder`] - Layout builder producing per-item transforms
//! - [`assembly`] - Output nodes with duplicates or instances of a template
//! - [`cache`] - Host-side generator that rebuilds only on change
//! - [`types`] - Configuration, layout and GPU instance types
//! - [`validation`] - Error type and count helpers

pub mod arc_length;
pub mod assembly;
pub mod builder;
pub mod cache;
pub mod constants;
pub mod curve;
pub mod random;
pub mod types;
pub mod validation;

pub use arc_length::*;
pub use assembly::*;
pub use builder::*;
pub use cache::*;
pub use constants::*;
pub use curve::*;
pub use random::*;
pub use types::*;
pub use validation::*;

pub use stack_config::StackSettings;
