//! L1-regularised linear regression
//!
//! Minimises `1/(2n) * ||y - b0 - X b||^2 + alpha * ||b||_1` by cyclic
//! coordinate descent. The intercept is never penalised. [`fit_aic`] walks a
//! geometric grid of `alpha` values from the smallest value that zeroes every
//! coefficient downwards, warm-starting each fit from the previous one, and
//! keeps the fit with the lowest Akaike information criterion.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Solver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LassoSettings {
    /// Maximum number of full passes over the coefficients
    pub max_iterations: usize,
    /// Stop once no coefficient moves by more than this in a pass
    pub tolerance: f64,
    /// Number of alpha values tried by [`fit_aic`]
    pub alpha_grid_size: usize,
    /// Smallest alpha of the grid as a fraction of the largest
    pub alpha_min_ratio: f64,
}

impl Default for LassoSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            alpha_grid_size: 25,
            alpha_min_ratio: 1e-3,
        }
    }
}

impl LassoSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(MathError::InvalidInput(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(MathError::InvalidInput(
                "tolerance must be positive".to_string(),
            ));
        }
        if self.alpha_grid_size == 0 {
            return Err(MathError::InvalidInput(
                "alpha_grid_size must be positive".to_string(),
            ));
        }
        if !(self.alpha_min_ratio > 0.0 && self.alpha_min_ratio < 1.0) {
            return Err(MathError::InvalidInput(
                "alpha_min_ratio must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fitted lasso model
#[derive(Debug, Clone, PartialEq)]
pub struct LassoFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub alpha: f64,
    pub aic: f64,
}

impl LassoFit {
    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        Ok(self.intercept
            + features
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, b)| x * b)
                .sum::<f64>())
    }

    /// Number of non-zero coefficients
    pub fn active_features(&self) -> usize {
        self.coefficients.iter().filter(|b| **b != 0.0).count()
    }
}

/// Centred design matrix stored column by column
struct Design {
    n: usize,
    columns: Vec<Vec<f64>>,
    means: Vec<f64>,
    /// `sum(x_ij^2) / n` per centred column
    norms: Vec<f64>,
    y_mean: f64,
    y: Vec<f64>,
}

impl Design {
    fn new(rows: &[Vec<f64>], target: &[f64]) -> Result<Self> {
        if rows.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a regression without observations".to_string(),
            ));
        }
        if rows.len() != target.len() {
            return Err(MathError::InvalidInput(format!(
                "Feature rows ({}) don't match targets ({})",
                rows.len(),
                target.len()
            )));
        }

        let n = rows.len();
        let p = rows[0].len();
        if let Some(bad) = rows.iter().position(|r| r.len() != p) {
            return Err(MathError::InvalidInput(format!(
                "Row {} has {} features, expected {}",
                bad,
                rows[bad].len(),
                p
            )));
        }
        if rows.iter().flatten().chain(target.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Regression inputs must be finite".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(p);
        let mut means = Vec::with_capacity(p);
        let mut norms = Vec::with_capacity(p);
        for j in 0..p {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n as f64;
            let column: Vec<f64> = rows.iter().map(|r| r[j] - mean).collect();
            norms.push(column.iter().map(|x| x * x).sum::<f64>() / n as f64);
            columns.push(column);
            means.push(mean);
        }

        let y_mean = target.iter().sum::<f64>() / n as f64;
        let y = target.iter().map(|t| t - y_mean).collect();

        Ok(Self {
            n,
            columns,
            means,
            norms,
            y_mean,
            y,
        })
    }

    /// Smallest alpha for which every coefficient is zero
    fn alpha_max(&self) -> f64 {
        self.columns
            .iter()
            .map(|c| (dot(c, &self.y) / self.n as f64).abs())
            .fold(0.0, f64::max)
    }

    fn solve(&self, alpha: f64, mut beta: Vec<f64>, settings: &LassoSettings) -> LassoFit {
        let mut residual = self.y.clone();
        for (column, b) in self.columns.iter().zip(beta.iter()) {
            if *b != 0.0 {
                for (r, x) in residual.iter_mut().zip(column.iter()) {
                    *r -= b * x;
                }
            }
        }

        for _ in 0..settings.max_iterations {
            let mut max_delta: f64 = 0.0;

            for j in 0..beta.len() {
                if self.norms[j] == 0.0 {
                    beta[j] = 0.0;
                    continue;
                }

                let column = &self.columns[j];
                let rho = dot(column, &residual) / self.n as f64 + self.norms[j] * beta[j];
                let updated = soft_threshold(rho, alpha) / self.norms[j];
                let delta = updated - beta[j];

                if delta != 0.0 {
                    for (r, x) in residual.iter_mut().zip(column.iter()) {
                        *r -= delta * x;
                    }
                    beta[j] = updated;
                    max_delta = max_delta.max(delta.abs());
                }
            }

            if max_delta < settings.tolerance {
                break;
            }
        }

        let rss: f64 = residual.iter().map(|r| r * r).sum();
        let active = beta.iter().filter(|b| **b != 0.0).count();
        let n = self.n as f64;
        let aic = n * (rss / n).max(f64::MIN_POSITIVE).ln() + 2.0 * active as f64;
        let intercept = self.y_mean
            - self
                .means
                .iter()
                .zip(beta.iter())
                .map(|(m, b)| m * b)
                .sum::<f64>();

        LassoFit {
            intercept,
            coefficients: beta,
            alpha,
            aic,
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Fit a lasso with a fixed regularisation strength
pub fn fit(
    rows: &[Vec<f64>],
    target: &[f64],
    alpha: f64,
    settings: &LassoSettings,
) -> Result<LassoFit> {
    settings.validate()?;
    if !(alpha >= 0.0) || !alpha.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "alpha must be a non-negative finite number, got {}",
            alpha
        )));
    }

    let design = Design::new(rows, target)?;
    let p = design.columns.len();
    Ok(design.solve(alpha, vec![0.0; p], settings))
}

/// Fit a lasso choosing alpha on a geometric grid by AIC
pub fn fit_aic(rows: &[Vec<f64>], target: &[f64], settings: &LassoSettings) -> Result<LassoFit> {
    settings.validate()?;

    let design = Design::new(rows, target)?;
    let p = design.columns.len();
    let alpha_max = design.alpha_max();

    if alpha_max == 0.0 {
        return Ok(design.solve(0.0, vec![0.0; p], settings));
    }

    let steps = settings.alpha_grid_size;
    let mut best: Option<LassoFit> = None;
    let mut warm = vec![0.0; p];

    for k in 0..steps {
        let exponent = if steps > 1 {
            k as f64 / (steps - 1) as f64
        } else {
            0.0
        };
        let alpha = alpha_max * settings.alpha_min_ratio.powf(exponent);
        let candidate = design.solve(alpha, warm, settings);
        warm = candidate.coefficients.clone();

        let better = match &best {
            Some(current) => candidate.aic < current.aic,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    best.ok_or_else(|| MathError::CalculationError("Empty alpha grid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_sample() -> (Vec<Vec<f64>>, Vec<f64>) {
        // y = 3 + 2 x0, x1 is unrelated
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let x0 = i as f64 / 4.0;
                let x1 = ((i * 7) % 11) as f64;
                vec![x0, x1]
            })
            .collect();
        let target = rows.iter().map(|r| 3.0 + 2.0 * r[0]).collect();
        (rows, target)
    }

    #[test]
    fn test_unpenalised_fit_recovers_coefficients() {
        let (rows, target) = linear_sample();
        let settings = LassoSettings {
            tolerance: 1e-10,
            max_iterations: 10_000,
            ..LassoSettings::default()
        };
        let fit = fit(&rows, &target, 0.0, &settings).unwrap();

        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-5);
        assert_relative_eq!(fit.predict(&[10.0, 4.0]).unwrap(), 23.0, epsilon = 1e-4);
    }

    #[test]
    fn test_large_alpha_zeroes_everything() {
        let (rows, target) = linear_sample();
        let fit = fit(&rows, &target, 1e6, &LassoSettings::default()).unwrap();

        assert_eq!(fit.active_features(), 0);
        let mean = target.iter().sum::<f64>() / target.len() as f64;
        assert_relative_eq!(fit.intercept, mean, epsilon = 1e-12);
    }

    #[test]
    fn test_aic_selection_keeps_the_informative_feature() {
        let (rows, target) = linear_sample();
        let fit = fit_aic(&rows, &target, &LassoSettings::default()).unwrap();

        assert!(fit.coefficients[0] > 1.5);
        assert!(fit.coefficients[1].abs() < 0.1);
    }

    #[test]
    fn test_constant_target() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let target = vec![5.0; 10];
        let fit = fit_aic(&rows, &target, &LassoSettings::default()).unwrap();

        assert_eq!(fit.active_features(), 0);
        assert_relative_eq!(fit.predict(&[100.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_shape_errors() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(fit(&rows, &[1.0, 2.0], 0.1, &LassoSettings::default()).is_err());
        assert!(fit(&[], &[], 0.1, &LassoSettings::default()).is_err());
        let fit_ok = fit(&[vec![1.0], vec![2.0]], &[1.0, 2.0], 0.0, &LassoSettings::default())
            .unwrap();
        assert!(fit_ok.predict(&[1.0, 2.0]).is_err());
    }
}
