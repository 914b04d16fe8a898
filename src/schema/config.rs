//! Configuration types for image genomes: canvas, shape geometry and colour limits.

use serde::{Deserialize, Serialize};

/// Derive the per-gene mutation probability from a user-facing rate.
///
/// Each shape carries roughly eight mutable values, so a raw rate of `1.0`
/// means about one mutated value per reproduced image.
pub fn scaled_mutation_rate(raw_rate: f64, shape_count: usize) -> f64 {
    if shape_count == 0 {
        return 0.0;
    }
    raw_rate / (shape_count as f64 * 8.0)
}

fn default_canvas_size() -> u32 {
    100
}
fn default_shape_count() -> usize {
    200
}
fn default_min_shape_size() -> i32 {
    1
}
fn default_max_shape_size() -> i32 {
    100
}
fn default_mutation_rate() -> f64 {
    scaled_mutation_rate(1.0, default_shape_count())
}
fn default_crossover_rate() -> f64 {
    0.5
}
fn default_opacity() -> f32 {
    0.2
}
fn default_circle_fraction() -> f64 {
    0.4
}
fn default_triangle_fraction() -> f64 {
    0.3
}

/// Parameters shared by every shape and image of a run.
///
/// Immutable once a run starts; passed by reference into shape construction,
/// mutation and rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    /// Side length of the square canvas, in pixels.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,
    /// Number of shapes in every image.
    #[serde(default = "default_shape_count")]
    pub shape_count: usize,
    /// Lower geometry bound, in pixels.
    #[serde(default = "default_min_shape_size")]
    pub min_shape_size: i32,
    /// Upper geometry bound, in pixels. Must exceed `min_shape_size`.
    #[serde(default = "default_max_shape_size")]
    pub max_shape_size: i32,
    /// Per-gene mutation probability (see [`scaled_mutation_rate`]).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Probability of taking a gene from the second parent.
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Alpha used when compositing every shape.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Grey level of the background (0 = black, 1 = white).
    #[serde(default)]
    pub background_tone: f32,
    /// Share of shapes that are ellipses.
    #[serde(default = "default_circle_fraction")]
    pub circle_fraction: f64,
    /// Share of shapes that are triangles. The remainder are quads.
    #[serde(default = "default_triangle_fraction")]
    pub triangle_fraction: f64,
    /// Colour limits used when a shape is (re)randomized.
    #[serde(default)]
    pub palette: Palette,
    /// Force exactly one mirrored triangle vertex to avoid slivers.
    #[serde(default)]
    pub prevent_thin_shapes: bool,
    /// Smooth shape edges when compositing.
    #[serde(default)]
    pub anti_alias: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            canvas_size: default_canvas_size(),
            shape_count: default_shape_count(),
            min_shape_size: default_min_shape_size(),
            max_shape_size: default_max_shape_size(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            opacity: default_opacity(),
            background_tone: 0.0,
            circle_fraction: default_circle_fraction(),
            triangle_fraction: default_triangle_fraction(),
            palette: Palette::default(),
            prevent_thin_shapes: false,
            anti_alias: false,
        }
    }
}

/// Colour limits for freshly randomized shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode")]
pub enum Palette {
    /// Single grey component.
    Grayscale { min: f32, max: f32 },
    /// Independent red, green and blue ranges.
    Rgb { min: [f32; 3], max: [f32; 3] },
}

impl Default for Palette {
    fn default() -> Self {
        Self::Rgb {
            min: [0.0; 3],
            max: [1.0; 3],
        }
    }
}

impl Palette {
    /// Full-range grey palette.
    pub fn grayscale() -> Self {
        Self::Grayscale { min: 0.0, max: 1.0 }
    }

    /// Number of colour components per shape.
    pub fn channels(&self) -> usize {
        match self {
            Self::Grayscale { .. } => 1,
            Self::Rgb { .. } => 3,
        }
    }

    /// `(min, max)` range of one component.
    pub fn range(&self, channel: usize) -> (f32, f32) {
        match self {
            Self::Grayscale { min, max } => (*min, *max),
            Self::Rgb { min, max } => (min[channel], max[channel]),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for channel in 0..self.channels() {
            let (min, max) = self.range(channel);
            if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
                return Err(ConfigError::PaletteOutOfRange { channel });
            }
            if min > max {
                return Err(ConfigError::PaletteInverted { channel, min, max });
            }
        }
        Ok(())
    }
}

impl ImageConfig {
    /// Difference between the geometry bounds.
    #[inline]
    pub fn size_spread(&self) -> i32 {
        self.max_shape_size - self.min_shape_size
    }

    /// Canvas side as a signed coordinate.
    #[inline]
    pub fn canvas_extent(&self) -> i32 {
        i32::try_from(self.canvas_size).unwrap_or(i32::MAX)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_size == 0 {
            return Err(ConfigError::InvalidCanvas);
        }
        if self.shape_count == 0 {
            return Err(ConfigError::InvalidShapeCount);
        }
        if self.min_shape_size < 1 || self.min_shape_size >= self.max_shape_size {
            return Err(ConfigError::InvalidShapeSize {
                min: self.min_shape_size,
                max: self.max_shape_size,
            });
        }

        let check_unit = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::OutOfUnitRange { name, value })
            }
        };
        check_unit(self.mutation_rate, "mutation_rate")?;
        check_unit(self.crossover_rate, "crossover_rate")?;
        check_unit(f64::from(self.opacity), "opacity")?;
        check_unit(f64::from(self.background_tone), "background_tone")?;
        check_unit(self.circle_fraction, "circle_fraction")?;
        check_unit(self.triangle_fraction, "triangle_fraction")?;

        if self.circle_fraction + self.triangle_fraction > 1.0 {
            return Err(ConfigError::FractionsExceedOne {
                circles: self.circle_fraction,
                triangles: self.triangle_fraction,
            });
        }

        self.palette.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Canvas size must be non-zero")]
    InvalidCanvas,
    #[error("Shape count must be non-zero")]
    InvalidShapeCount,
    #[error("Shape size bounds must satisfy 1 <= min < max (got min {min}, max {max})")]
    InvalidShapeSize { min: i32, max: i32 },
    #[error("{name} must lie in [0, 1] (got {value})")]
    OutOfUnitRange { name: &'static str, value: f64 },
    #[error("Circle ({circles}) and triangle ({triangles}) fractions sum above 1")]
    FractionsExceedOne { circles: f64, triangles: f64 },
    #[error("Palette channel {channel}: minimum {min} exceeds maximum {max}")]
    PaletteInverted { channel: usize, min: f32, max: f32 },
    #[error("Palette channel {channel} lies outside [0, 1]")]
    PaletteOutOfRange { channel: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ImageConfig::default().validate().is_ok());
    }

    #[test]
    fn test_scaled_mutation_rate() {
        assert!((scaled_mutation_rate(1.0, 200) - 1.0 / 1600.0).abs() < 1e-12);
        assert_eq!(scaled_mutation_rate(1.0, 0), 0.0);
    }

    #[test]
    fn test_rejects_inverted_shape_sizes() {
        let config = ImageConfig {
            min_shape_size: 50,
            max_shape_size: 50,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidShapeSize { min: 50, max: 50 })
        );
    }

    #[test]
    fn test_rejects_inverted_palette() {
        let config = ImageConfig {
            palette: Palette::Rgb {
                min: [0.0, 0.8, 0.0],
                max: [1.0, 0.2, 1.0],
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PaletteInverted { channel: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_fraction_overflow() {
        let config = ImageConfig {
            circle_fraction: 0.7,
            triangle_fraction: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FractionsExceedOne { .. })
        ));
    }

    #[test]
    fn test_rejects_opacity_above_one() {
        let config = ImageConfig {
            opacity: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { name: "opacity", .. })
        ));
    }

    #[test]
    fn test_serialization() {
        let config = ImageConfig {
            palette: Palette::grayscale(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ImageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: ImageConfig = serde_json::from_str(r#"{"shape_count": 10}"#).unwrap();
        assert_eq!(parsed.shape_count, 10);
        assert_eq!(parsed.canvas_size, 100);
        assert_eq!(parsed.palette.channels(), 3);
    }
}
