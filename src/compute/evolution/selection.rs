//! Fitness-proportionate selection and population scans.

/// Selection errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Cannot select from an empty population")]
    EmptyPopulation,
    #[error("Total fitness is {0}; roulette selection needs a positive finite sum")]
    ZeroTotalFitness(f64),
}

/// Roulette-wheel pick for a uniform draw in `[0, 1)`.
///
/// Fitness values are normalized by their sum and the cumulative
/// distribution is walked in population order; the first index whose
/// cumulative probability meets or exceeds `draw` is returned.
pub fn roulette_index(fitness: &[f64], draw: f64) -> Result<usize, SelectionError> {
    if fitness.is_empty() {
        return Err(SelectionError::EmptyPopulation);
    }
    let total: f64 = fitness.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(SelectionError::ZeroTotalFitness(total));
    }

    let mut cumulative = 0.0;
    for (i, f) in fitness.iter().enumerate() {
        cumulative += f / total;
        if cumulative >= draw {
            return Ok(i);
        }
    }
    // Rounding can leave the final cumulative just below the draw.
    Ok(fitness.len() - 1)
}

/// Index of the strictly lowest value; ties go to the first encountered.
pub fn least_fit_index(fitness: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &f) in fitness.iter().enumerate() {
        if best.is_none_or(|(_, lowest)| f < lowest) {
            best = Some((i, f));
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the strictly highest value; ties go to the first encountered.
pub fn most_fit_index(fitness: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &f) in fitness.iter().enumerate() {
        if best.is_none_or(|(_, highest)| f > highest) {
            best = Some((i, f));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roulette_walks_cumulative_distribution() {
        // Cumulative probabilities are 0.1, 0.3, 0.6, 1.0.
        let fitness = [1.0, 2.0, 3.0, 4.0];
        let pick = |draws: [f64; 4]| -> Vec<usize> {
            draws
                .iter()
                .map(|&d| roulette_index(&fitness, d).unwrap())
                .collect()
        };
        assert_eq!(pick([0.05, 0.25, 0.55, 0.95]), vec![0, 1, 2, 3]);
        assert_eq!(pick([0.05, 0.35, 0.65, 0.95]), vec![0, 2, 3, 3]);
    }

    #[test]
    fn test_roulette_boundaries() {
        let fitness = [1.0, 1.0];
        assert_eq!(roulette_index(&fitness, 0.0), Ok(0));
        assert_eq!(roulette_index(&fitness, 0.5), Ok(0));
        assert_eq!(roulette_index(&fitness, 0.500001), Ok(1));
        assert_eq!(roulette_index(&fitness, 0.999999), Ok(1));
    }

    #[test]
    fn test_roulette_skips_zero_members() {
        let fitness = [0.0, 5.0, 0.0];
        for draw in [1e-9, 0.3, 0.99, 1.0] {
            assert_eq!(roulette_index(&fitness, draw), Ok(1));
        }
        // A zero cumulative already meets a zero draw.
        assert_eq!(roulette_index(&fitness, 0.0), Ok(0));
    }

    #[test]
    fn test_roulette_rejects_zero_total() {
        assert_eq!(
            roulette_index(&[0.0, 0.0, 0.0], 0.5),
            Err(SelectionError::ZeroTotalFitness(0.0))
        );
        assert_eq!(
            roulette_index(&[], 0.5),
            Err(SelectionError::EmptyPopulation)
        );
        assert!(matches!(
            roulette_index(&[1.0, f64::NAN], 0.5),
            Err(SelectionError::ZeroTotalFitness(_))
        ));
    }

    #[test]
    fn test_least_fit_prefers_first_tie() {
        assert_eq!(least_fit_index(&[3.0, 1.0, 2.0, 1.0]), Some(1));
        assert_eq!(least_fit_index(&[2.0, 2.0, 2.0]), Some(0));
        assert_eq!(least_fit_index(&[]), None);
    }

    #[test]
    fn test_most_fit_prefers_first_tie() {
        assert_eq!(most_fit_index(&[3.0, 5.0, 2.0, 5.0]), Some(1));
        assert_eq!(most_fit_index(&[0.0]), Some(0));
        assert_eq!(most_fit_index(&[]), None);
    }
}
