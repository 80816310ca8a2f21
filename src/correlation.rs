//! Pairwise attribute correlation over a record set.
//!
//! Backs the rooftop matrix: only the upper triangle (`i < j`) is filled and
//! every pair involving a missing-data sentinel is skipped.

use crate::record::{Attribute, Record};

/// Default |r| above which a cell is marked strong.
pub const STRONG_CORRELATION: f64 = 0.7;

/// Pearson correlation coefficient result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationResult {
    /// Correlation coefficient (-1.0 to 1.0).
    pub coefficient: f64,
    /// Number of (x, y) pairs used.
    pub sample_count: usize,
}

impl CorrelationResult {
    /// Returns the correlation strength category.
    #[must_use]
    pub fn strength(&self) -> CorrelationStrength {
        CorrelationStrength::of(self.coefficient)
    }

    /// True if |r| exceeds `threshold`.
    #[must_use]
    pub fn is_strong(&self, threshold: f64) -> bool {
        self.coefficient.abs() > threshold
    }
}

/// Correlation strength categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationStrength {
    /// |r| >= 0.9
    VeryStrong,
    /// 0.7 <= |r| < 0.9
    Strong,
    /// 0.5 <= |r| < 0.7
    Moderate,
    /// 0.3 <= |r| < 0.5
    Weak,
    /// |r| < 0.3
    Negligible,
}

impl CorrelationStrength {
    /// Buckets a coefficient.
    #[must_use]
    pub fn of(coefficient: f64) -> Self {
        let abs = coefficient.abs();
        if abs >= 0.9 {
            CorrelationStrength::VeryStrong
        } else if abs >= 0.7 {
            CorrelationStrength::Strong
        } else if abs >= 0.5 {
            CorrelationStrength::Moderate
        } else if abs >= 0.3 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::Negligible
        }
    }
}

/// Pearson correlation of two attributes across `records`.
///
/// Records where either value is missing are skipped. Fewer than two usable
/// pairs, or zero variance on either side, yields `None`.
///
/// # Formula
///
/// r = Σ((xi - x̄)(yi - ȳ)) / √(Σ(xi - x̄)² × Σ(yi - ȳ)²)
#[must_use]
pub fn pearson(records: &[Record], a: Attribute, b: Attribute) -> Option<CorrelationResult> {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.known(a)?, r.known(b)?)))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n_f;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n_f;

    let (mut sum_xy, mut sum_xx, mut sum_yy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    let denominator = (sum_xx * sum_yy).sqrt();
    if denominator <= 1e-12 {
        return None;
    }

    Some(CorrelationResult {
        coefficient: (sum_xy / denominator).clamp(-1.0, 1.0),
        sample_count: n,
    })
}

/// One upper-triangle cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationCell {
    /// Row index into [`CorrelationMatrix::attributes`].
    pub row: usize,
    /// Column index, always greater than `row`.
    pub col: usize,
    /// `None` renders as "no data".
    pub result: Option<CorrelationResult>,
}

/// Upper-triangle correlation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    attributes: Vec<Attribute>,
    cells: Vec<CorrelationCell>,
}

impl CorrelationMatrix {
    /// Computes every `i < j` pair of `attributes` over `records`.
    #[must_use]
    pub fn compute(records: &[Record], attributes: &[Attribute]) -> Self {
        crate::time_scope!("correlation", "matrix");
        let n = attributes.len();
        let mut cells = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for (row, &a) in attributes.iter().enumerate() {
            for (col, &b) in attributes.iter().enumerate().skip(row + 1) {
                cells.push(CorrelationCell {
                    row,
                    col,
                    result: pearson(records, a, b),
                });
            }
        }
        Self {
            attributes: attributes.to_vec(),
            cells,
        }
    }

    /// Row/column attributes.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Filled cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CorrelationCell] {
        &self.cells
    }

    /// Cell for attributes `a` and `b`, in either order.
    #[must_use]
    pub fn get(&self, a: Attribute, b: Attribute) -> Option<CorrelationResult> {
        let i = self.attributes.iter().position(|&x| x == a)?;
        let j = self.attributes.iter().position(|&x| x == b)?;
        let (row, col) = if i < j { (i, j) } else { (j, i) };
        self.cells
            .iter()
            .find(|c| c.row == row && c.col == col)
            .and_then(|c| c.result)
    }

    /// Cells whose |r| exceeds `threshold`.
    pub fn strong(&self, threshold: f64) -> impl Iterator<Item = &CorrelationCell> + '_ {
        self.cells
            .iter()
            .filter(move |c| c.result.is_some_and(|r| r.is_strong(threshold)))
    }

    /// The `top_n` pairs with the largest |r|, strongest first.
    #[must_use]
    pub fn top(&self, top_n: usize) -> Vec<(Attribute, Attribute, f64)> {
        let mut pairs: Vec<(Attribute, Attribute, f64)> = self
            .cells
            .iter()
            .filter_map(|c| {
                let r = c.result?;
                Some((self.attributes[c.row], self.attributes[c.col], r.coefficient))
            })
            .collect();
        pairs.sort_by(|a, b| {
            b.2.abs()
                .partial_cmp(&a.2.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs.truncate(top_n);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MISSING;
    use approx::assert_relative_eq;

    fn series(xs: &[f64], ys: &[f64]) -> Vec<Record> {
        xs.iter()
            .zip(ys)
            .enumerate()
            .map(|(i, (&x, &y))| {
                Record::new(format!("C{i}"), "R", 2020)
                    .with(Attribute::GdpPerCapita, x)
                    .with(Attribute::HappinessScore, y)
            })
            .collect()
    }

    #[test]
    fn test_pearson_perfect_positive() {
        let recs = series(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]);
        let r = pearson(&recs, Attribute::GdpPerCapita, Attribute::HappinessScore).unwrap();
        assert_relative_eq!(r.coefficient, 1.0, epsilon = 1e-9);
        assert_eq!(r.sample_count, 5);
        assert_eq!(r.strength(), CorrelationStrength::VeryStrong);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let recs = series(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0, 8.0, 6.0, 4.0, 2.0]);
        let r = pearson(&recs, Attribute::GdpPerCapita, Attribute::HappinessScore).unwrap();
        assert_relative_eq!(r.coefficient, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pearson_skips_sentinel_pairs() {
        let recs = series(&[1.0, MISSING, 3.0, 4.0], &[2.0, 100.0, 6.0, 8.0]);
        let r = pearson(&recs, Attribute::GdpPerCapita, Attribute::HappinessScore).unwrap();
        assert_eq!(r.sample_count, 3);
        assert_relative_eq!(r.coefficient, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pearson_insufficient_data() {
        let recs = series(&[1.0], &[2.0]);
        assert!(pearson(&recs, Attribute::GdpPerCapita, Attribute::HappinessScore).is_none());
        assert!(pearson(&[], Attribute::GdpPerCapita, Attribute::HappinessScore).is_none());
    }

    #[test]
    fn test_pearson_zero_variance() {
        let recs = series(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!(pearson(&recs, Attribute::GdpPerCapita, Attribute::HappinessScore).is_none());
    }

    #[test]
    fn test_strength_buckets() {
        assert_eq!(CorrelationStrength::of(0.95), CorrelationStrength::VeryStrong);
        assert_eq!(CorrelationStrength::of(-0.75), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::of(0.6), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::of(0.35), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::of(0.1), CorrelationStrength::Negligible);
    }

    #[test]
    fn test_matrix_upper_triangle() {
        let recs = series(&[1.0, 2.0, 3.0], &[3.0, 1.0, 2.0]);
        let m = CorrelationMatrix::compute(&recs, &Attribute::CORRELATED);
        assert_eq!(m.cells().len(), 9 * 8 / 2);
        assert!(m.cells().iter().all(|c| c.row < c.col));
        assert!(m.get(Attribute::GdpPerCapita, Attribute::HappinessScore).is_some());
        assert_eq!(
            m.get(Attribute::GdpPerCapita, Attribute::HappinessScore),
            m.get(Attribute::HappinessScore, Attribute::GdpPerCapita)
        );
        // Temperature is missing everywhere.
        assert!(m.get(Attribute::Temperature, Attribute::HappinessScore).is_none());
    }

    #[test]
    fn test_matrix_strong_and_top() {
        let recs = series(&[1.0, 2.0, 3.0, 4.0], &[1.1, 2.0, 2.9, 4.2]);
        let m = CorrelationMatrix::compute(
            &recs,
            &[Attribute::HappinessScore, Attribute::GdpPerCapita],
        );
        assert_eq!(m.strong(STRONG_CORRELATION).count(), 1);
        let top = m.top(5);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, Attribute::HappinessScore);
        assert!(top[0].2 > 0.9);
    }
}
