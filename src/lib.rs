//! Shape Painter - evolve images of simple shapes toward a black-box score.
//!
//! This crate implements a steady-state genetic algorithm whose individuals
//! are fixed-length sequences of ellipses, quads and triangles, and whose
//! fitness comes from an external oracle that scores rendered images (for
//! example, how face-like an image looks to a detector).
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types, validation and run statistics
//! - `compute`: Shapes, chromosomes, rendering and the evolution engine
//!
//! # Example
//!
//! ```rust,no_run
//! use shape_painter::{
//!     compute::{Raster, evolution::EvolutionEngine},
//!     schema::EvolutionConfig,
//! };
//!
//! // Any `Fn(&Raster) -> f64 + Sync` is an oracle.
//! let oracle = |image: &Raster| image.luma(50, 50).map_or(0.0, f64::from);
//!
//! let mut engine = EvolutionEngine::new(EvolutionConfig::default(), oracle).unwrap();
//! let result = engine.run(50).unwrap();
//!
//! println!("Best score: {:?}", result.stats.best_fitness);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, FitnessOracle};
pub use compute::{Chromosome, Raster, Shape, ShapeKind};
pub use schema::{EvolutionConfig, ImageConfig, Palette};
