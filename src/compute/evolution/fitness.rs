//! Fitness oracle contract.
//!
//! The engine treats scoring as a black box: a rendered [`Raster`] goes in, a
//! non-negative real comes out. Higher is better. Calls are synchronous and
//! may be slow; the engine never retries a failed call.

use crate::compute::render::Raster;

/// Oracle failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// The scorer itself failed.
    #[error("Oracle failed: {0}")]
    Failed(String),
    /// The scorer returned a negative or NaN score.
    #[error("Oracle returned invalid score {0}")]
    InvalidScore(f64),
}

/// Scores how well an image matches the target concept.
///
/// `Sync` so that a batch of candidates can be scored in parallel.
pub trait FitnessOracle: Sync {
    fn score(&self, image: &Raster) -> Result<f64, OracleError>;
}

impl<F> FitnessOracle for F
where
    F: Fn(&Raster) -> f64 + Sync,
{
    fn score(&self, image: &Raster) -> Result<f64, OracleError> {
        Ok(self(image))
    }
}

/// Score an image and enforce the `score >= 0` contract.
pub fn checked_score<O: FitnessOracle + ?Sized>(
    oracle: &O,
    image: &Raster,
) -> Result<f64, OracleError> {
    let score = oracle.score(image)?;
    if score.is_nan() || score < 0.0 {
        return Err(OracleError::InvalidScore(score));
    }
    Ok(score)
}

/// Stand-in oracle rewarding left/right mirror symmetry of luminance.
///
/// Faces are roughly bilaterally symmetric, so this gives the binary a
/// usable selective pressure without an external classifier. The score is
/// `1 - mean |L(x, y) - L(w - 1 - x, y)|` scaled by the luminance contrast of
/// the image, so flat images score zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetryOracle;

impl FitnessOracle for SymmetryOracle {
    fn score(&self, image: &Raster) -> Result<f64, OracleError> {
        let (w, h) = (image.width(), image.height());
        if w < 2 || h == 0 {
            return Ok(0.0);
        }

        let mut mismatch = 0.0f64;
        let mut pairs = 0u64;
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for y in 0..h {
            for x in 0..w {
                let left = image
                    .luma(x, y)
                    .ok_or_else(|| OracleError::Failed(format!("pixel ({x}, {y}) missing")))?;
                lo = lo.min(left);
                hi = hi.max(left);
                if x < w / 2 {
                    let right = image.luma(w - 1 - x, y).unwrap_or(left);
                    mismatch += f64::from((left - right).abs());
                    pairs += 1;
                }
            }
        }

        let symmetry = 1.0 - mismatch / pairs.max(1) as f64;
        let contrast = f64::from(hi - lo).max(0.0);
        Ok((symmetry * contrast * 100.0).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::shape::{Color, Shape};
    use crate::schema::ImageConfig;

    struct Failing;

    impl FitnessOracle for Failing {
        fn score(&self, _image: &Raster) -> Result<f64, OracleError> {
            Err(OracleError::Failed("detector unavailable".into()))
        }
    }

    fn quad(x: i32, w: i32) -> Shape {
        Shape::Quad {
            bounds: [x, 4, w, 8],
            color: Color::Gray(1.0),
        }
    }

    fn config() -> ImageConfig {
        ImageConfig {
            canvas_size: 16,
            opacity: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_closures_are_oracles() {
        let oracle = |_: &Raster| 1.5;
        let image = Raster::filled(4, 0.0).unwrap();
        assert_eq!(checked_score(&oracle, &image), Ok(1.5));
    }

    #[test]
    fn test_checked_score_rejects_contract_violations() {
        let image = Raster::filled(4, 0.0).unwrap();
        assert_eq!(
            checked_score(&|_: &Raster| -1.0, &image),
            Err(OracleError::InvalidScore(-1.0))
        );
        assert!(matches!(
            checked_score(&|_: &Raster| f64::NAN, &image),
            Err(OracleError::InvalidScore(_))
        ));
        assert!(matches!(
            checked_score(&Failing, &image),
            Err(OracleError::Failed(_))
        ));
    }

    #[test]
    fn test_symmetry_oracle_prefers_mirrored_images() {
        let config = config();
        let centred = Raster::from_shapes([&quad(4, 8)], &config).unwrap();
        let offset = Raster::from_shapes([&quad(0, 6)], &config).unwrap();
        let blank = Raster::filled(16, 0.3).unwrap();

        let centred = SymmetryOracle.score(&centred).unwrap();
        let offset = SymmetryOracle.score(&offset).unwrap();
        assert!(centred > offset, "{centred} <= {offset}");
        assert!(offset > 0.0);
        assert_eq!(SymmetryOracle.score(&blank), Ok(0.0));
    }
}
