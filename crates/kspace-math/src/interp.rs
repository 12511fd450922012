//! Natural cubic spline on a strictly increasing abscissa, with a
//! last-interval cursor for monotone access patterns.
//!
//! Boundary condition: zero second derivative at both ends. Evaluation
//! outside `[x[0], x[n-1]]` returns `None`; callers decide how to clamp.

use kspace_types::error::{KspaceError, KspaceResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Minimum number of knots for a cubic spline.
pub const MIN_SPLINE_POINTS: usize = 3;

/// Remembers the interval of the previous lookup.
///
/// A hint only: any stale value is corrected by a binary search, so one
/// cursor may be shared between threads without affecting results.
#[derive(Debug, Default)]
pub struct SplineCursor {
    last: AtomicUsize,
}

impl SplineCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.last.load(Ordering::Relaxed)
    }

    fn store(&self, i: usize) {
        self.last.store(i, Ordering::Relaxed);
    }
}

impl Clone for SplineCursor {
    fn clone(&self) -> Self {
        SplineCursor {
            last: AtomicUsize::new(self.position()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> KspaceResult<Self> {
        let n = x.len();
        if n != y.len() {
            return Err(KspaceError::InvalidInput(format!(
                "Spline abscissa/ordinate length mismatch: {} vs {}",
                n,
                y.len()
            )));
        }
        if n < MIN_SPLINE_POINTS {
            return Err(KspaceError::InvalidInput(format!(
                "Cubic spline needs at least {MIN_SPLINE_POINTS} points, got {n}"
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(KspaceError::InvalidInput(
                "Spline abscissa contains non-finite values".to_string(),
            ));
        }
        if let Some(i) = (1..n).find(|&i| x[i] <= x[i - 1]) {
            return Err(KspaceError::InvalidInput(format!(
                "Spline abscissa not strictly increasing at {i}: {} <= {}",
                x[i],
                x[i - 1]
            )));
        }
        let m = natural_second_derivatives(&x, &y);
        Ok(CubicSpline { x, y, m })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Interpolated value at `xq`, or `None` outside the knot range.
    pub fn eval(&self, xq: f64, cursor: &SplineCursor) -> Option<f64> {
        if !(xq >= self.x_min() && xq <= self.x_max()) {
            return None;
        }
        let i = self.find(xq, cursor);
        let h = self.x[i + 1] - self.x[i];
        let t = xq - self.x[i];
        let (mi, mi1) = (self.m[i], self.m[i + 1]);
        let b = (self.y[i + 1] - self.y[i]) / h - h * (2.0 * mi + mi1) / 6.0;
        Some(self.y[i] + t * (b + t * (0.5 * mi + t * (mi1 - mi) / (6.0 * h))))
    }

    /// Interval `i` with `x[i] <= xq < x[i+1]` (last interval for `xq == x[n-1]`).
    fn find(&self, xq: f64, cursor: &SplineCursor) -> usize {
        let n = self.x.len();
        let i = cursor.position().min(n - 2);
        let found = if xq < self.x[i] {
            self.bsearch(xq, 0, i)
        } else if xq >= self.x[i + 1] {
            self.bsearch(xq, i, n - 1)
        } else {
            i
        };
        cursor.store(found);
        found
    }

    fn bsearch(&self, xq: f64, mut lo: usize, mut hi: usize) -> usize {
        while hi > lo + 1 {
            let mid = (lo + hi) / 2;
            if self.x[mid] > xq {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        lo.min(self.x.len() - 2)
    }
}

/// Solve the natural-spline tridiagonal system for the knot second
/// derivatives with the Thomas algorithm.
fn natural_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    let ni = n - 2;
    let mut c_prime = vec![0.0; ni];
    let mut d_prime = vec![0.0; ni];

    for k in 0..ni {
        let i = k + 1;
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];
        let diag = 2.0 * (h0 + h1);
        let rhs = 6.0 * ((y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0);
        if k == 0 {
            c_prime[k] = h1 / diag;
            d_prime[k] = rhs / diag;
        } else {
            let den = diag - h0 * c_prime[k - 1];
            c_prime[k] = h1 / den;
            d_prime[k] = (rhs - h0 * d_prime[k - 1]) / den;
        }
    }

    // Back substitution; m[0] = m[n-1] = 0.
    for k in (0..ni).rev() {
        let next = if k + 1 < ni { m[k + 2] } else { 0.0 };
        m[k + 1] = d_prime[k] - c_prime[k] * next;
    }
    m
}
