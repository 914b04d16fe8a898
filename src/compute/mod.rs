//! Compute module - Genome operators, rendering and evolutionary search.

mod chromosome;
mod render;
mod shape;

pub mod evolution;

pub use chromosome::*;
pub use render::*;
pub use shape::*;
