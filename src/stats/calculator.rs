//! Statistics Calculator Module
//! Handles Pearson correlation matrices and least-squares line fits.

use crate::data::column_as_f64;
use polars::prelude::*;
use statrs::statistics::Statistics;
use std::fmt;

/// Fewest paired observations a trend line is fitted to.
pub const MIN_FIT_POINTS: usize = 3;

/// Square correlation table over a set of named columns.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    /// Finite min/max of all entries, widened when degenerate.
    pub fn value_range(&self) -> (f64, f64) {
        let (min, max) = self
            .values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        if min.is_infinite() {
            (-1.0, 1.0)
        } else if max - min < 1e-12 {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        }
    }
}

/// Prints the matrix rounded to 3 decimals, one row per column.
impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_w = self.columns.iter().fold(0usize, |w, c| w.max(c.len()));
        let cell_w = label_w.max(6);

        write!(f, "{:label_w$}", "")?;
        for name in &self.columns {
            write!(f, "  {:>cell_w$}", name)?;
        }
        for (name, row) in self.columns.iter().zip(&self.values) {
            writeln!(f)?;
            write!(f, "{:<label_w$}", name)?;
            for v in row {
                if v.is_nan() {
                    write!(f, "  {:>cell_w$}", "NaN")?;
                } else {
                    write!(f, "  {:>cell_w$.3}", v)?;
                }
            }
        }
        Ok(())
    }
}

/// Degree-1 least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Pearson correlation over positions where both values are present.
    ///
    /// NaN when fewer than two complete pairs remain or either side is
    /// constant. Clamped to [-1, 1] against rounding drift.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .unzip();

        if xs.len() < 2 {
            return f64::NAN;
        }

        let mean_x = xs.iter().mean();
        let mean_y = ys.iter().mean();

        let mut sxy = 0.0;
        let mut sxx = 0.0;
        let mut syy = 0.0;
        for (a, b) in xs.iter().zip(&ys) {
            let dx = a - mean_x;
            let dy = b - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }

        if sxx == 0.0 || syy == 0.0 {
            return f64::NAN;
        }

        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }

    /// Pairwise-complete Pearson matrix over `columns`.
    ///
    /// Names absent from `df` are dropped silently; the rest keep the
    /// requested order.
    pub fn correlation_matrix(
        df: &DataFrame,
        columns: &[&str],
    ) -> PolarsResult<CorrelationMatrix> {
        let kept: Vec<String> = columns
            .iter()
            .filter(|name| df.column(name).is_ok())
            .map(|name| name.to_string())
            .collect();

        let data = kept
            .iter()
            .map(|name| column_as_f64(df, name))
            .collect::<PolarsResult<Vec<_>>>()?;

        let n = kept.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            let self_corr = Self::pearson(&data[i], &data[i]);
            values[i][i] = if self_corr.is_nan() { f64::NAN } else { 1.0 };

            for j in (i + 1)..n {
                let r = Self::pearson(&data[i], &data[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            columns: kept,
            values,
        })
    }

    /// Least-squares line through `(x, y)`.
    ///
    /// `None` below `MIN_FIT_POINTS` pairs or when `x` is constant.
    pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
        let n = x.len().min(y.len());
        if n < MIN_FIT_POINTS {
            return None;
        }
        let (x, y) = (&x[..n], &y[..n]);

        let mean_x = x.iter().mean();
        let mean_y = y.iter().mean();

        let sxx: f64 = x.iter().map(|v| (v - mean_x).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - mean_x) * (b - mean_y))
            .sum();

        let slope = sxy / sxx;
        Some(LinearFit {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// `n` evenly spaced samples from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (end - start) / (n - 1) as f64;
                (0..n).map(|i| start + step * i as f64).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    const EPS: f64 = 1e-9;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = some(&[1.0, 2.0, 3.0, 4.0]);
        let y = some(&[2.0, 4.0, 6.0, 8.0]);
        let z = some(&[8.0, 6.0, 4.0, 2.0]);
        assert!((StatsCalculator::pearson(&x, &y) - 1.0).abs() < EPS);
        assert!((StatsCalculator::pearson(&x, &z) + 1.0).abs() < EPS);
    }

    #[test]
    fn pearson_uses_pairwise_complete_cases() {
        let x = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)];
        let y = vec![Some(1.0), Some(2.0), Some(100.0), Some(4.0), None];
        // Only rows 0, 1 and 3 are complete, and they lie on a line.
        assert!((StatsCalculator::pearson(&x, &y) - 1.0).abs() < EPS);
    }

    #[test]
    fn pearson_undefined_cases_are_nan() {
        assert!(StatsCalculator::pearson(&some(&[1.0]), &some(&[2.0])).is_nan());
        assert!(StatsCalculator::pearson(&some(&[1.0, 1.0, 1.0]), &some(&[1.0, 2.0, 3.0])).is_nan());
        assert!(StatsCalculator::pearson(&[None, None], &some(&[1.0, 2.0])).is_nan());
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let df = df! {
            "Year" => [2000i64, 2001, 2002, 2003, 2004],
            "A" => [Some(1.0), Some(3.0), Some(2.0), Some(5.0), None],
            "B" => [Some(2.0), Some(1.0), Some(4.0), Some(3.0), Some(6.0)],
            "C" => [Some(9.0), None, Some(7.0), Some(1.0), Some(0.5)],
        }
        .unwrap();

        let m = StatsCalculator::correlation_matrix(&df, &["A", "B", "C"]).unwrap();
        assert_eq!(m.size(), 3);
        for i in 0..3 {
            assert_eq!(m.get(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!((-1.0..=1.0).contains(&m.get(i, j)));
            }
        }
    }

    #[test]
    fn correlation_matrix_drops_absent_columns_in_order() {
        let df = df! {
            "Emigration" => [1.0, 2.0, 3.0],
            "GDP" => [3.0, 1.0, 2.0],
        }
        .unwrap();

        let m = StatsCalculator::correlation_matrix(&df, &["GDP", "Missing", "Emigration"]).unwrap();
        assert_eq!(m.columns, vec!["GDP", "Emigration"]);
        assert_eq!(m.size(), 2);
        assert_eq!(m.get(0, 1), -0.5);
    }

    #[test]
    fn display_rounds_to_three_decimals() {
        let m = CorrelationMatrix {
            columns: vec!["A".into(), "B".into()],
            values: vec![vec![1.0, 0.123456], vec![0.123456, 1.0]],
        };
        let text = m.to_string();
        assert!(text.contains("0.123"));
        assert!(!text.contains("0.1234"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn value_range_ignores_nan_and_widens_constant() {
        let m = CorrelationMatrix {
            columns: vec!["A".into(), "B".into()],
            values: vec![vec![1.0, f64::NAN], vec![f64::NAN, -0.25]],
        };
        assert_eq!(m.value_range(), (-0.25, 1.0));

        let single = CorrelationMatrix {
            columns: vec!["A".into()],
            values: vec![vec![1.0]],
        };
        assert_eq!(single.value_range(), (0.5, 1.5));
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let fit = StatsCalculator::linear_fit(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!(fit.intercept.abs() < EPS);
        assert!((fit.predict(10.0) - 20.0).abs() < EPS);
    }

    #[test]
    fn linear_fit_needs_three_points_and_spread() {
        assert!(StatsCalculator::linear_fit(&[1.0, 2.0], &[1.0, 2.0]).is_none());
        assert!(StatsCalculator::linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn linspace_includes_both_ends() {
        let xs = StatsCalculator::linspace(0.0, 1.0, 5);
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(StatsCalculator::linspace(0.0, 1.0, 0).is_empty());
    }
}
