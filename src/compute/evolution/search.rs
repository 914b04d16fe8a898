//! Steady-state evolution engine.
//!
//! One birth and one death per generation: two parents are drawn by
//! roulette selection, their fused crossover/mutation child is scored by the
//! oracle, and the least fit member of the population is replaced by it.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::compute::chromosome::Chromosome;
use crate::compute::render::{ExportError, Raster};
use crate::schema::{
    EvolutionConfig, EvolutionConfigError, EvolutionPhase, EvolutionStats, ImageConfig,
    StopReason,
};

use super::fitness::{FitnessOracle, OracleError, checked_score};
use super::genome::GenomeRng;
use super::selection::{SelectionError, least_fit_index, most_fit_index, roulette_index};

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone)]
pub struct EvolutionProgress {
    /// Engine phase when the snapshot was taken.
    pub phase: EvolutionPhase,
    /// Steady-state generations completed.
    pub generation: u64,
    /// Population members admitted so far.
    pub admitted: usize,
    /// Target population size.
    pub population_size: usize,
    /// Best fitness in the population.
    pub best_fitness: Option<f64>,
    /// Rendering of the best member (absent during initialization).
    pub best_image: Option<Raster>,
}

/// Final result of a run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Fittest member of the final population.
    pub best: Option<Chromosome>,
    /// Statistics from the run.
    pub stats: EvolutionStats,
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] EvolutionConfigError),
    #[error("Population size must be at least 1")]
    InvalidPopulationSize,
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("Selection invariant violated: {0}")]
    Selection(#[from] SelectionError),
    #[error("Rendering failed: {0}")]
    Render(#[from] ExportError),
    #[error("No viable individuals after {attempts} attempts ({admitted}/{required} admitted)")]
    NoViableIndividuals {
        attempts: u64,
        admitted: usize,
        required: usize,
    },
    #[error("Engine is {0:?}; a populated, evolving engine is required")]
    NotEvolving(EvolutionPhase),
    #[error("Population member {index} has no valid fitness")]
    UnscoredMember { index: usize },
    #[error("Population member {index} has {len} shapes, expected {expected}")]
    ChromosomeLength {
        index: usize,
        len: usize,
        expected: usize,
    },
    #[error("Population is empty")]
    EmptyPopulation,
}

/// Evolution engine that owns the population and the random stream.
pub struct EvolutionEngine<O> {
    config: EvolutionConfig,
    oracle: O,
    rng: GenomeRng,
    population: Vec<Chromosome>,
    population_size: usize,
    phase: EvolutionPhase,
    generation: u64,
    evaluations: u64,
    init_attempts: u64,
    cancelled: Arc<AtomicBool>,
}

impl<O: FitnessOracle> EvolutionEngine<O> {
    /// Create a new engine, rejecting invalid configuration up front.
    pub fn new(config: EvolutionConfig, oracle: O) -> Result<Self, EvolutionConfigError> {
        config.validate()?;
        let rng = config
            .random_seed
            .map_or_else(GenomeRng::random, GenomeRng::new);

        Ok(Self {
            population_size: config.population.size,
            config,
            oracle,
            rng,
            population: Vec::new(),
            phase: EvolutionPhase::Uninitialized,
            generation: 0,
            evaluations: 0,
            init_attempts: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_handle(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn fitness_values(&self) -> Vec<f64> {
        self.population
            .iter()
            .map(|c| c.fitness().unwrap_or(0.0))
            .collect()
    }

    /// Fittest member; ties go to the earliest.
    pub fn best(&self) -> Option<&Chromosome> {
        most_fit_index(&self.fitness_values()).map(|i| &self.population[i])
    }

    /// Least fit member; ties go to the earliest.
    pub fn worst(&self) -> Option<&Chromosome> {
        least_fit_index(&self.fitness_values()).map(|i| &self.population[i])
    }

    /// Render the fittest member.
    pub fn best_image(&self) -> Result<Option<Raster>, EngineError> {
        self.best()
            .map(|c| c.render(&self.config.image))
            .transpose()
            .map_err(EngineError::from)
    }

    /// Write the fittest member as a PNG file.
    pub fn export_best<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        let image = self.best_image()?.ok_or(EngineError::EmptyPopulation)?;
        image.save_png(path)?;
        Ok(())
    }

    /// Build the initial population.
    ///
    /// Random individuals are constructed and scored until `population_size`
    /// of them score above zero; the rest are discarded. Returns `false` if
    /// the run was cancelled first.
    pub fn initialize<F>(&mut self, population_size: usize, callback: &mut F) -> Result<bool, EngineError>
    where
        F: FnMut(&EvolutionProgress),
    {
        if population_size == 0 {
            return Err(EngineError::InvalidPopulationSize);
        }

        self.population.clear();
        self.population_size = population_size;
        self.generation = 0;
        self.init_attempts = 0;
        self.phase = EvolutionPhase::Initializing;

        while self.population.len() < population_size {
            if self.is_cancelled() {
                self.phase = EvolutionPhase::Cancelled;
                return Ok(false);
            }

            let retry = self.config.init_retry;
            if !retry.allows(self.init_attempts) {
                warn!(
                    "Initialization gave up after {} attempts with {}/{} admitted",
                    self.init_attempts,
                    self.population.len(),
                    population_size
                );
                return Err(EngineError::NoViableIndividuals {
                    attempts: self.init_attempts,
                    admitted: self.population.len(),
                    required: population_size,
                });
            }
            let missing = (population_size - self.population.len()) as u64;
            let batch = retry
                .remaining(self.init_attempts)
                .map_or(missing, |left| missing.min(left));

            let candidates: Vec<Chromosome> = (0..batch)
                .map(|_| Chromosome::random(&self.config.image, &mut self.rng))
                .collect();
            self.init_attempts += batch;

            for candidate in self.evaluate_batch(candidates)? {
                if candidate.fitness().is_some_and(|f| f > 0.0) {
                    self.population.push(candidate);
                    callback(&self.progress(false));
                }
            }
        }

        self.phase = EvolutionPhase::Evolving;
        info!(
            "Population of {} initialized after {} attempts",
            population_size, self.init_attempts
        );
        Ok(true)
    }

    /// Score candidates in parallel, preserving their order.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_batch(&mut self, candidates: Vec<Chromosome>) -> Result<Vec<Chromosome>, EngineError> {
        let image = &self.config.image;
        let oracle = &self.oracle;
        let count = candidates.len() as u64;

        let scored = candidates
            .into_par_iter()
            .map(|mut candidate| -> Result<Chromosome, EngineError> {
                let score = score_candidate(oracle, image, &candidate)?;
                candidate.set_fitness(score);
                Ok(candidate)
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.evaluations += count;
        Ok(scored)
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_batch(&mut self, candidates: Vec<Chromosome>) -> Result<Vec<Chromosome>, EngineError> {
        let mut scored = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            let score = score_candidate(&self.oracle, &self.config.image, &candidate)?;
            candidate.set_fitness(score);
            self.evaluations += 1;
            scored.push(candidate);
        }
        Ok(scored)
    }

    /// Install an already scored population and start evolving from it.
    pub fn seed_population(&mut self, population: Vec<Chromosome>) -> Result<(), EngineError> {
        if population.is_empty() {
            return Err(EngineError::EmptyPopulation);
        }
        let expected = self.config.image.shape_count;
        for (index, member) in population.iter().enumerate() {
            if !member.fitness().is_some_and(|f| f.is_finite() && f >= 0.0) {
                return Err(EngineError::UnscoredMember { index });
            }
            if member.len() != expected {
                return Err(EngineError::ChromosomeLength {
                    index,
                    len: member.len(),
                    expected,
                });
            }
        }

        self.population_size = population.len();
        self.population = population;
        self.generation = 0;
        self.phase = EvolutionPhase::Evolving;
        Ok(())
    }

    /// Roulette pick over the current population.
    fn select_index(&mut self, fitness: &[f64]) -> Result<usize, SelectionError> {
        roulette_index(fitness, self.rng.unit())
    }

    /// Select two parents and produce a scored child.
    fn breed(&mut self) -> Result<Chromosome, EngineError> {
        let fitness = self.fitness_values();
        let first = self.select_index(&fitness)?;
        let mut second = self.select_index(&fitness)?;

        let limit = self.config.population.max_parent_resamples;
        let mut resamples = 0;
        while second == first && resamples < limit {
            second = self.select_index(&fitness)?;
            resamples += 1;
        }
        if second == first && self.population.len() > 1 {
            warn!(
                "Generation {}: no distinct second parent after {} resamples",
                self.generation, limit
            );
        }

        let mut child = Chromosome::crossover(
            &self.population[first],
            &self.population[second],
            &self.config.image,
            &mut self.rng,
        );
        let score = score_candidate(&self.oracle, &self.config.image, &child)?;
        self.evaluations += 1;
        child.set_fitness(score);
        Ok(child)
    }

    /// Run one steady-state generation.
    ///
    /// Returns the stop reason if this generation ended the run.
    pub fn step(&mut self) -> Result<Option<StopReason>, EngineError> {
        if self.phase != EvolutionPhase::Evolving || self.population.is_empty() {
            return Err(EngineError::NotEvolving(self.phase));
        }

        let child = self.breed()?;
        let victim =
            least_fit_index(&self.fitness_values()).ok_or(EngineError::EmptyPopulation)?;
        trace!(
            "Generation {}: replacing member {} ({:?}) with child scoring {:?}",
            self.generation,
            victim,
            self.population[victim].fitness(),
            child.fitness()
        );
        self.population[victim] = child;
        self.generation += 1;

        let reason = self.should_stop();
        if let Some(reason) = reason {
            self.phase = reason.into();
        }
        Ok(reason)
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        let best = self.best().and_then(Chromosome::fitness);
        let worst = self.worst().and_then(Chromosome::fitness);
        if best.is_some() && best == worst {
            return Some(StopReason::Converged);
        }

        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if self.is_cancelled() {
            return Some(StopReason::Cancelled);
        }

        None
    }

    /// Get current progress.
    pub fn progress(&self, with_image: bool) -> EvolutionProgress {
        let best_image = if with_image {
            match self.best_image() {
                Ok(image) => image,
                Err(e) => {
                    warn!(
                        "Generation {}: snapshot without image, render failed: {}",
                        self.generation, e
                    );
                    None
                }
            }
        } else {
            None
        };

        EvolutionProgress {
            phase: self.phase,
            generation: self.generation,
            admitted: self.population.len(),
            population_size: self.population_size,
            best_fitness: self.best().and_then(Chromosome::fitness),
            best_image,
        }
    }

    /// Run evolution with progress callback.
    ///
    /// Blocks until the population converges, the generation cap is hit or
    /// the run is cancelled. Oracle failures end the run with an error.
    pub fn run_with_callback<F>(
        &mut self,
        population_size: usize,
        mut callback: F,
    ) -> Result<EvolutionResult, EngineError>
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = Instant::now();
        let image = &self.config.image;
        info!(
            "Starting run: population {}, {} shapes, {}x{} canvas",
            population_size, image.shape_count, image.canvas_size, image.canvas_size
        );

        let interval = self.config.snapshot_interval;
        let stop_reason = if !self.initialize(population_size, &mut callback)? {
            StopReason::Cancelled
        } else if self.is_cancelled() {
            self.phase = EvolutionPhase::Cancelled;
            StopReason::Cancelled
        } else {
            loop {
                let generation = self.generation;
                if let Some(reason) = self.step()? {
                    break reason;
                }

                if interval > 0 && generation % interval == 0 {
                    let snapshot = self.progress(true);
                    debug!(
                        "Generation {}: best score {:.2}",
                        generation,
                        snapshot.best_fitness.unwrap_or(0.0)
                    );
                    callback(&snapshot);
                }
            }
        };

        info!(
            "Run finished after {} generations: {:?}, best score {:?}",
            self.generation,
            stop_reason,
            self.best().and_then(Chromosome::fitness)
        );
        callback(&self.progress(true));

        Ok(self.result(stop_reason, start_time.elapsed()))
    }

    /// Run evolution (blocking).
    pub fn run(&mut self, population_size: usize) -> Result<EvolutionResult, EngineError> {
        self.run_with_callback(population_size, |_| {})
    }

    fn result(&self, stop_reason: StopReason, elapsed: Duration) -> EvolutionResult {
        let fitness = self.fitness_values();
        let mean_fitness = if fitness.is_empty() {
            None
        } else {
            Some(fitness.iter().sum::<f64>() / fitness.len() as f64)
        };

        EvolutionResult {
            best: self.best().cloned(),
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                init_attempts: self.init_attempts,
                best_fitness: self.best().and_then(Chromosome::fitness),
                worst_fitness: self.worst().and_then(Chromosome::fitness),
                mean_fitness,
                elapsed_seconds: elapsed.as_secs_f64(),
                stop_reason,
            },
        }
    }
}

fn score_candidate<O: FitnessOracle + ?Sized>(
    oracle: &O,
    image: &ImageConfig,
    candidate: &Chromosome,
) -> Result<f64, EngineError> {
    let raster = candidate.render(image)?;
    Ok(checked_score(oracle, &raster)?)
}
