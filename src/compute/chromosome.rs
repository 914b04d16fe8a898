//! Chromosomes: fixed-length, ordered shape sequences.

use serde::{Deserialize, Serialize};

use crate::compute::evolution::GenomeRng;
use crate::compute::render::{ExportError, Raster};
use crate::compute::shape::{Shape, ShapeKind};
use crate::schema::ImageConfig;

/// One candidate image. Shape order is paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    shapes: Vec<Shape>,
    /// Oracle score; `None` until scored.
    #[serde(default)]
    fitness: Option<f64>,
}

impl Chromosome {
    /// Wrap an existing shape sequence.
    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        Self {
            shapes,
            fitness: None,
        }
    }

    /// Fully random individual with `shape_count` genes.
    pub fn random(config: &ImageConfig, rng: &mut GenomeRng) -> Self {
        let shapes = (0..config.shape_count)
            .map(|_| {
                let kind = ShapeKind::from_draw(rng.unit(), config);
                Shape::random(kind, config, rng)
            })
            .collect();
        Self::from_shapes(shapes)
    }

    /// Uniform crossover fused with mutation.
    ///
    /// Each gene comes from `parent1` when an independent draw exceeds the
    /// crossover rate, otherwise from `parent2`, and is always passed through
    /// [`Shape::clone_mutated`].
    pub fn crossover(
        parent1: &Self,
        parent2: &Self,
        config: &ImageConfig,
        rng: &mut GenomeRng,
    ) -> Self {
        debug_assert_eq!(parent1.len(), parent2.len());
        let shapes = parent1
            .shapes
            .iter()
            .zip(&parent2.shapes)
            .map(|(a, b)| {
                let source = if rng.unit() > config.crossover_rate {
                    a
                } else {
                    b
                };
                source.clone_mutated(config, rng)
            })
            .collect();
        Self::from_shapes(shapes)
    }

    /// Render onto a fresh background in chromosome order.
    pub fn render(&self, config: &ImageConfig) -> Result<Raster, ExportError> {
        Raster::from_shapes(&self.shapes, config)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn set_fitness(&mut self, score: f64) {
        self.fitness = Some(score);
    }

    /// Builder form of [`Chromosome::set_fitness`].
    pub fn with_fitness(mut self, score: f64) -> Self {
        self.set_fitness(score);
        self
    }

    /// Count of each shape variant.
    pub fn kind_counts(&self) -> [(ShapeKind, usize); 3] {
        [ShapeKind::Ellipse, ShapeKind::Triangle, ShapeKind::Quad]
            .map(|kind| (kind, self.shapes.iter().filter(|s| s.kind() == kind).count()))
    }
}
