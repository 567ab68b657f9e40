//! Statistics primitives used for return estimation and confidence bounds.
use crate::error::GridSimError;
use anyhow::Result;
use statrs::function::{
    beta::{beta_reg, ln_beta},
    erf::erfc_inv,
};
use std::f64::consts::SQRT_2;

// Above this, the quantile is expanded around the normal quantile.
const LARGE_NU: f64 = 1000.0;

// exp(MIN_LN_X) is still a normal f64.
const MIN_LN_X: f64 = -700.0;

const MAX_BISECTION: usize = 2000;

/// Arithmetic mean of `values`.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(GridSimError::EmptyInput.into());
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation with Bessel's correction.
///
/// The sum of squared deviations is divided by `n - 1`, so at least two samples are required.
pub fn sample_stddev(values: &[f64]) -> Result<f64> {
    let n = values.len();
    if n <= 1 {
        return Err(GridSimError::TooFewSamples(n).into());
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    Ok((ss / (n - 1) as f64).sqrt())
}

/// Inverse of the CDF of Student's t distribution with `nu` degrees of freedom.
///
/// `p` must be in the open interval `(0, 1)`; the quantiles at the bounds are infinite.
pub fn student_t_inverse(p: f64, nu: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(GridSimError::InvalidProbability(p).into());
    }
    if !(nu > 0.0 && nu.is_finite()) {
        return Err(GridSimError::InvalidDegreesOfFreedom(nu).into());
    }

    // The distribution is symmetric about zero.
    if p == 0.5 {
        return Ok(0.0);
    }

    let tail = if p < 0.5 { p } else { 1.0 - p };
    let t = if nu > LARGE_NU {
        upper_quantile_expansion(tail, nu)
    } else {
        upper_quantile_bisection(tail, nu)
    };
    Ok(if p < 0.5 { -t } else { t })
}

/// Solves `P(T > t) = tail`, i.e., `I_x(nu / 2, 1 / 2) = 2 tail` with `x = nu / (nu + t^2)`.
///
/// The bisection runs on `ln x`, so heavy tails with tiny `x` keep their relative precision.
fn upper_quantile_bisection(tail: f64, nu: f64) -> f64 {
    let a = 0.5 * nu;
    let target = 2.0 * tail;

    // I_x(a, 1/2) ~ x^a / (a B(a, 1/2)) as x -> 0
    let ln_x_small = (target.ln() + a.ln() + ln_beta(a, 0.5)) / a;
    if ln_x_small < MIN_LN_X {
        return (0.5 * (nu.ln() - ln_x_small)).exp();
    }

    let (mut lo, mut hi) = (MIN_LN_X, 0.0f64);
    for _ in 0..MAX_BISECTION {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if beta_reg(a, 0.5, mid.exp()) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let u = 0.5 * (lo + hi);
    (nu * -u.exp_m1() / u.exp()).sqrt()
}

/// Cornish-Fisher expansion of the upper quantile in powers of `1 / nu`.
fn upper_quantile_expansion(tail: f64, nu: f64) -> f64 {
    let z = SQRT_2 * erfc_inv(2.0 * tail);
    let z2 = z * z;
    let g1 = z * (z2 + 1.0) / 4.0;
    let g2 = z * ((5.0 * z2 + 16.0) * z2 + 3.0) / 96.0;
    let g3 = z * (((3.0 * z2 + 19.0) * z2 + 17.0) * z2 - 15.0) / 384.0;
    let g4 = z * ((((79.0 * z2 + 776.0) * z2 + 1482.0) * z2 - 1920.0) * z2 - 945.0) / 92160.0;
    z + g1 / nu + g2 / nu.powi(2) + g3 / nu.powi(3) + g4 / nu.powi(4)
}

/// Weighted sum of `values`, where the weight of the `i`-th element is `gamma^i`.
///
/// This is the discounted return of a sequence of rewards.
pub fn discounted_weighted_sum(values: &[f64], gamma: f64) -> f64 {
    let mut w = 1.0;
    let mut sum = 0.0;
    for v in values.iter() {
        sum += w * v;
        w *= gamma;
    }
    sum
}

/// Softmax of `values`.
///
/// The maximum is subtracted before exponentiation, which leaves the result unchanged.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps = values.iter().map(|v| (v - max).exp()).collect::<Vec<_>>();
    let denom = exps.iter().sum::<f64>();
    exps.into_iter().map(|e| e / denom).collect()
}
