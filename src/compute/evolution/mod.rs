//! Steady-state genetic search over shape-composed images.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Random stream** (`genome`): the seeded generator behind every draw
//! - **Selection** (`selection`): roulette selection and least/most-fit scans
//! - **Fitness oracle** (`fitness`): the black-box scoring contract
//! - **Search engine** (`search`): population lifecycle and termination
//!
//! # Example
//!
//! ```rust,no_run
//! use shape_painter::compute::evolution::{EvolutionEngine, SymmetryOracle};
//! use shape_painter::schema::EvolutionConfig;
//!
//! let config = EvolutionConfig::default();
//! let population = config.population.size;
//!
//! let mut engine = EvolutionEngine::new(config, SymmetryOracle).unwrap();
//! let result = engine
//!     .run_with_callback(population, |progress| {
//!         if let Some(best) = progress.best_fitness {
//!             println!("Generation {}: best score = {:.2}", progress.generation, best);
//!         }
//!     })
//!     .unwrap();
//!
//! println!("Stopped: {:?}", result.stats.stop_reason);
//! engine.export_best("fittest.png").unwrap();
//! ```
//!
//! # Termination
//!
//! - `Converged`: best and worst fitness in the population are equal
//! - `MaxGenerations`: the generation cap was reached
//! - `Cancelled`: the cancellation handle was set

mod fitness;
mod genome;
mod search;
mod selection;

pub use fitness::{FitnessOracle, OracleError, SymmetryOracle, checked_score};
pub use genome::GenomeRng;
pub use search::{EngineError, EvolutionEngine, EvolutionProgress, EvolutionResult};
pub use selection::{SelectionError, least_fit_index, most_fit_index, roulette_index};
