//! In-place primal simplex over an exact tableau
//!
//! Column 0 and the last column are the objective marker and the right-hand
//! side. Pivot selection is deterministic: the first column with a negative
//! objective coefficient, then the first row attaining the minimum ratio.

use tracing::trace;

use crate::rational::Rational;

/// Pivots until the objective row has no negative coefficient.
///
/// Returns `false` when a pivot column has no positive entry, i.e. the
/// program is unbounded.
pub fn simplex(a: &mut [Vec<Rational>]) -> bool {
    let Some(width) = a.first().map(Vec::len) else {
        return true;
    };

    loop {
        let Some(col) = (0..width.saturating_sub(1)).find(|&j| a[0][j].is_negative()) else {
            return true;
        };
        if !pivot_col(a, col) {
            return false;
        }
    }
}

/// Runs the ratio test on `col` and pivots on the winning row.
pub fn pivot_col(a: &mut [Vec<Rational>], col: usize) -> bool {
    let mut best: Option<(usize, _)> = None;

    for (r, row) in a.iter().enumerate().skip(1) {
        let coef = &row[col];
        if !coef.is_positive() {
            continue;
        }
        let ratio = &row[row.len() - 1] / coef;
        if best.as_ref().is_none_or(|(_, min)| ratio < *min) {
            best = Some((r, ratio));
        }
    }

    match best {
        Some((row, _)) => {
            pivot(a, col, row);
            true
        }
        None => false,
    }
}

/// Makes `col` the unit vector of `row`.
pub fn pivot(a: &mut [Vec<Rational>], col: usize, row: usize) {
    trace!(col, row, "pivot");

    let divisor = a[row][col].clone();
    for value in a[row].iter_mut() {
        *value = &*value / &divisor;
    }

    let pivot_row = a[row].clone();
    for (r, current) in a.iter_mut().enumerate() {
        if r == row {
            continue;
        }
        let factor = current[col].clone();
        if factor.is_zero() {
            continue;
        }
        for (value, p) in current.iter_mut().zip(&pivot_row) {
            *value -= &(&factor * p);
        }
    }
}
