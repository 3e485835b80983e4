//! Utilities for ITM.
//!
//! These are miscellaneous functions that are functionally pure but also
//! implement well-known algorithms and formulae. They might be reusable
//! elsewhere and/or they might benefit from optimisation or being replaced by
//! calls to more efficient or correct versions.

/// Least-squares linear fit over evenly-spaced data between two points.
///
/// `points` are distances from the first sample (in the same unit as
/// `interval`) delimiting the window of samples that takes part in the fit.
/// The window edges move out to whole samples, so fitting the reversed data
/// over the mirrored window gives the same line. The window is widened to at
/// least one interval, so a collapsed window fits the nearest pair of samples.
///
/// Returns _Z₀_ and _Zn_, the fitted line evaluated at the first and at the
/// last sample of `data`, i.e. extrapolated to both ends of the profile.
///
/// See ITM section `<53>`.
pub fn least_squares_linear_fit(interval: f64, data: &[f64], points: (f64, f64)) -> (f64, f64) {
    match data.len() {
        0 => return (0.0, 0.0),
        1 => return (data[0], data[0]),
        _ => {}
    }

    let xn = (data.len() - 1) as f64;
    let mut xa = fortran_dim(points.0 / interval, 0.0).trunc();
    let mut xb = xn - fortran_dim(xn, points.1 / interval).trunc();

    if xb <= xa {
        xa = fortran_dim(xa, 1.0);
        xb = xn - fortran_dim(xn, xb + 1.0);
    }

    let mut ja = xa as usize;
    let jb = xb as usize;

    let n = jb - ja;
    xa = xb - xa;

    let mut xx = -0.5 * xa;
    xb += xx;

    let mut a = 0.5 * (data[ja] + data[jb]);
    let mut b = 0.5 * (data[ja] - data[jb]) * xx;

    for _ in 2..=n {
        ja += 1;
        xx += 1.0;
        a += data[ja];
        b += data[ja] * xx;
    }

    a /= xa;
    b = b * 12.0 / ((xa * xa + 2.0) * xa);

    (a - b * xb, a + b * (xn - xb))
}

/// Selects the value of a given rank, counting from the largest.
///
/// Rank 0 is the maximum; ranks past the end are clamped to the minimum. The
/// slice is partially reordered in place. This stands in for the `qtile`
/// partition routine of ITM section `<52>`.
pub fn quantile(data: &mut [f64], rank: usize) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let rank = rank.min(data.len() - 1);
    let (_, value, _) = data.select_nth_unstable_by(rank, |a, b| b.total_cmp(a));
    *value
}

/// Free-space basic transmission loss (dB).
///
/// With `distance` in metres and `frequency` in MHz. Degenerate inputs, or
/// distances so short that the formula would predict a gain, give zero.
pub fn free_space_loss(distance: f64, frequency: f64) -> f64 {
    if distance <= 0.0 || frequency <= 0.0 {
        return 0.0;
    }

    fortran_dim(
        32.45 + 20.0 * frequency.log10() + 20.0 * (distance / 1000.0).log10(),
        0.0,
    )
}

/// Fortran-style DIM operation.
pub fn fortran_dim(x: f64, y: f64) -> f64 {
    (x - y).max(0.0)
}
