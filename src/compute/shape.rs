//! Shape genes: the three drawable variants, their geometry encoding and
//! their randomize / mutate rules.
//!
//! Geometry is integer pixels. Colour components are reals in `[0, 1]`,
//! one component for grey palettes and three for RGB.
//!
//! | Variant  | genes                   | meaning                                   |
//! |----------|-------------------------|-------------------------------------------|
//! | Ellipse  | `x, y, w, h`            | bounding box top-left and extents          |
//! | Quad     | `x, y, w, h`            | rectangle top-left and extents            |
//! | Triangle | `x0, y0, d1, d2, d3, d4`| anchor vertex and offsets to two vertices |
//!
//! Triangle offsets are magnitudes; each carries a fixed ±1 polarity drawn at
//! randomization time.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::compute::evolution::GenomeRng;
use crate::schema::{ImageConfig, Palette};

/// Standard deviation of colour noise.
const COLOR_SIGMA: f64 = 0.03;
/// Standard deviation of geometry noise, in pixels.
const GEOMETRY_SIGMA: f64 = 3.0;
/// Catastrophic re-randomization fires at `mutation_rate / CATASTROPHE_DIVISOR`.
const CATASTROPHE_DIVISOR: f64 = 20.0;
/// Triangle genes before this index form the anchor vertex.
const TRIANGLE_ANCHOR_GENES: usize = 2;

/// Variant tag consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Ellipse,
    Quad,
    Triangle,
}

impl ShapeKind {
    /// Pick a variant from a uniform draw in `[0, 1)` using the cumulative
    /// ellipse / triangle / quad thresholds.
    pub fn from_draw(draw: f64, config: &ImageConfig) -> Self {
        if draw < config.circle_fraction {
            Self::Ellipse
        } else if draw < config.circle_fraction + config.triangle_fraction {
            Self::Triangle
        } else {
            Self::Quad
        }
    }

    /// Number of mutable geometry genes.
    pub fn gene_count(self) -> usize {
        match self {
            Self::Ellipse | Self::Quad => 4,
            Self::Triangle => 6,
        }
    }

    /// Range a gene is drawn from at randomization and clamped to after mutation.
    pub fn gene_range(self, index: usize, config: &ImageConfig) -> GeneRange {
        let spread = config.size_spread();
        let canvas = config.canvas_extent();
        let (min, max) = (config.min_shape_size, config.max_shape_size);
        let is_position = index < 2;

        match self {
            // An ellipse covers less of its box than a quad, so its extents use half the scale.
            Self::Ellipse if is_position => GeneRange::new(-(spread / 4), canvas - spread / 4),
            Self::Ellipse => GeneRange::new(min, min + (max / 2 - min / 2)),
            Self::Quad if is_position => GeneRange::new(-(spread / 2), canvas - spread / 2),
            Self::Quad => GeneRange::new(min, max),
            Self::Triangle if is_position => GeneRange::new(0, canvas),
            Self::Triangle => GeneRange::new(min, max),
        }
    }
}

/// Half-open integer range `[lo, hi)`, never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneRange {
    pub lo: i32,
    pub hi: i32,
}

impl GeneRange {
    pub fn new(lo: i32, hi: i32) -> Self {
        Self {
            lo,
            hi: hi.max(lo + 1),
        }
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.lo && value < self.hi
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.lo, self.hi - 1)
    }

    fn sample(&self, rng: &mut GenomeRng) -> i32 {
        rng.int_in(self.lo, self.hi)
    }
}

/// Shape colour, one component per palette channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Gray(f32),
    Rgb([f32; 3]),
}

impl Color {
    /// Draw every component uniformly from its palette range.
    pub fn random(palette: &Palette, rng: &mut GenomeRng) -> Self {
        let mut draw = |channel| {
            let (min, max) = palette.range(channel);
            rng.uniform(min, max)
        };
        match palette {
            Palette::Grayscale { .. } => Self::Gray(draw(0)),
            Palette::Rgb { .. } => Self::Rgb([draw(0), draw(1), draw(2)]),
        }
    }

    pub fn components(&self) -> &[f32] {
        match self {
            Self::Gray(v) => std::slice::from_ref(v),
            Self::Rgb(c) => c,
        }
    }

    fn components_mut(&mut self) -> &mut [f32] {
        match self {
            Self::Gray(v) => std::slice::from_mut(v),
            Self::Rgb(c) => c,
        }
    }

    /// Expand to RGB; grey repeats its single component.
    pub fn to_rgb(&self) -> [f32; 3] {
        match *self {
            Self::Gray(v) => [v; 3],
            Self::Rgb(c) => c,
        }
    }

    /// Perturb each component with probability `rate`, clamped to `[0, 1]`.
    ///
    /// The palette range only applies at randomization; a mutated colour may
    /// drift outside it.
    fn mutate(&mut self, rate: f64, rng: &mut GenomeRng) {
        for component in self.components_mut() {
            if rng.chance(rate) {
                let moved = f64::from(*component) + rng.gaussian(COLOR_SIGMA);
                *component = moved.clamp(0.0, 1.0) as f32;
            }
        }
    }
}

/// One gene of a chromosome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Shape {
    Ellipse {
        bounds: [i32; 4],
        color: Color,
    },
    Quad {
        bounds: [i32; 4],
        color: Color,
    },
    Triangle {
        genes: [i32; 6],
        polarity: [i32; 4],
        color: Color,
    },
}

impl Shape {
    /// Build a shape of the given variant with fresh geometry and colour.
    pub fn random(kind: ShapeKind, config: &ImageConfig, rng: &mut GenomeRng) -> Self {
        let color = Color::random(&config.palette, rng);
        match kind {
            ShapeKind::Ellipse => Self::Ellipse {
                bounds: random_genes(kind, config, rng),
                color,
            },
            ShapeKind::Quad => Self::Quad {
                bounds: random_genes(kind, config, rng),
                color,
            },
            ShapeKind::Triangle => Self::Triangle {
                genes: random_genes(kind, config, rng),
                polarity: random_polarity(config.prevent_thin_shapes, rng),
                color,
            },
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Quad { .. } => ShapeKind::Quad,
            Self::Triangle { .. } => ShapeKind::Triangle,
        }
    }

    pub fn color(&self) -> &Color {
        match self {
            Self::Ellipse { color, .. } | Self::Quad { color, .. } | Self::Triangle { color, .. } => {
                color
            }
        }
    }

    fn color_mut(&mut self) -> &mut Color {
        match self {
            Self::Ellipse { color, .. } | Self::Quad { color, .. } | Self::Triangle { color, .. } => {
                color
            }
        }
    }

    /// Mutable geometry genes. Triangle polarities are not part of it.
    pub fn genes(&self) -> &[i32] {
        match self {
            Self::Ellipse { bounds, .. } | Self::Quad { bounds, .. } => bounds,
            Self::Triangle { genes, .. } => genes,
        }
    }

    fn genes_mut(&mut self) -> &mut [i32] {
        match self {
            Self::Ellipse { bounds, .. } | Self::Quad { bounds, .. } => bounds,
            Self::Triangle { genes, .. } => genes,
        }
    }

    /// Discard geometry and colour and draw them again, keeping the variant.
    pub fn randomize(&mut self, config: &ImageConfig, rng: &mut GenomeRng) {
        *self = Self::random(self.kind(), config, rng);
    }

    /// Perturb geometry and colour in place.
    pub fn mutate(&mut self, config: &ImageConfig, rng: &mut GenomeRng) {
        let rate = config.mutation_rate;
        let kind = self.kind();

        if rng.chance(rate / CATASTROPHE_DIVISOR) {
            self.randomize(config, rng);
        } else {
            self.color_mut().mutate(rate, rng);

            // The triangle anchor is handled unconditionally below.
            let first = match kind {
                ShapeKind::Triangle => TRIANGLE_ANCHOR_GENES,
                _ => 0,
            };
            for (index, gene) in self.genes_mut().iter_mut().enumerate().skip(first) {
                if rng.chance(rate) {
                    *gene = kind.gene_range(index, config).clamp(perturb(*gene, rng));
                }
            }
        }

        if let Self::Triangle { genes, .. } = self {
            for (index, gene) in genes.iter_mut().enumerate().take(TRIANGLE_ANCHOR_GENES) {
                *gene = kind.gene_range(index, config).clamp(perturb(*gene, rng));
            }
        }
    }

    /// Independent copy with mutation applied.
    pub fn clone_mutated(&self, config: &ImageConfig, rng: &mut GenomeRng) -> Self {
        let mut copy = self.clone();
        copy.mutate(config, rng);
        copy
    }

    /// Drawable coordinates: `x, y, w, h` for ellipses and quads, three
    /// `(x, y)` vertices for triangles.
    pub fn absolute_points(&self) -> AbsolutePoints {
        match self {
            Self::Ellipse { bounds, .. } | Self::Quad { bounds, .. } => {
                AbsolutePoints::new(&[bounds[0], bounds[1], bounds[2], bounds[3]])
            }
            Self::Triangle {
                genes, polarity, ..
            } => {
                let [x0, y0, d1, d2, d3, d4] = *genes;
                let offset = |anchor: i32, delta: i32, sign: i32| {
                    anchor.saturating_add(delta.saturating_mul(sign))
                };
                AbsolutePoints::new(&[
                    x0,
                    y0,
                    offset(x0, d1, polarity[0]),
                    offset(y0, d2, polarity[1]),
                    offset(x0, d3, polarity[2]),
                    offset(y0, d4, polarity[3]),
                ])
            }
        }
    }
}

/// Resolved coordinates of a shape, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsolutePoints {
    coords: [i32; 6],
    len: usize,
}

impl AbsolutePoints {
    fn new(values: &[i32]) -> Self {
        let mut coords = [0; 6];
        let len = values.len().min(coords.len());
        coords[..len].copy_from_slice(&values[..len]);
        Self { coords, len }
    }
}

impl Deref for AbsolutePoints {
    type Target = [i32];

    fn deref(&self) -> &[i32] {
        &self.coords[..self.len]
    }
}

fn random_genes<const N: usize>(
    kind: ShapeKind,
    config: &ImageConfig,
    rng: &mut GenomeRng,
) -> [i32; N] {
    std::array::from_fn(|index| kind.gene_range(index, config).sample(rng))
}

fn random_polarity(prevent_thin: bool, rng: &mut GenomeRng) -> [i32; 4] {
    if prevent_thin {
        let mut polarity = [1; 4];
        polarity[rng.index(4)] = -1;
        polarity
    } else {
        std::array::from_fn(|_| if rng.coin() { 1 } else { -1 })
    }
}

/// Gaussian step, truncated toward zero.
fn perturb(gene: i32, rng: &mut GenomeRng) -> i32 {
    (f64::from(gene) + rng.gaussian(GEOMETRY_SIGMA)) as i32
}
