//! Newton's method over a box, with a logarithmic barrier on the bounds.

use std::time::{Duration, Instant};

use super::{Status, cholesky::Envelope, merit::Merit, presolve::Bounds};

/// Largest share of the gap to a bound that one step may close.
const FRACTION_TO_BOUNDARY: f64 = 0.995;
const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;

/// Relative slack on the sufficient decrease test, for rounding in large sums.
const ROUNDOFF: f64 = 10.0 * f64::EPSILON;

/// Smallest diagonal shift tried on an indefinite Newton matrix.
const MIN_SHIFT: f64 = 1e-8;
const MAX_SHIFT: f64 = 1e20;

/// Shared iteration and wall-clock budget of a solve.
#[derive(Debug)]
pub(super) struct Budget {
    start: Instant,
    timeout: Option<Duration>,
    max_iters: usize,
    iters: usize,
}

impl Budget {
    pub(super) fn new(max_iters: usize, timeout: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            timeout,
            max_iters,
            iters: 0,
        }
    }

    pub(super) fn iters(&self) -> usize {
        self.iters
    }

    pub(super) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the stopping status if the budget is used up.
    pub(super) fn exhausted(&self) -> Option<Status> {
        if self.timeout.is_some_and(|limit| self.elapsed() >= limit) {
            Some(Status::Timeout)
        } else if self.iters >= self.max_iters {
            Some(Status::MaxIters)
        } else {
            None
        }
    }

    fn tick(&mut self) {
        self.iters += 1;
    }
}

/// How an inner solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Outcome {
    /// Barrier gradient norm within the inner tolerance.
    Stationary,

    /// The line search could not make progress.
    Stalled,

    /// The shared budget ran out.
    Exhausted(Status),
}

/// Minimizes `merit − weight · Σ ln(gap to bound)`, starting from and
/// updating `x`.
///
/// Free components of `x` must lie strictly inside their bounds and fixed
/// components on them. Each iteration solves the Newton system with the
/// exact Hessian, shifting its diagonal when it is not positive definite,
/// then backtracks from the longest step that stays inside the box.
pub(super) fn minimize(
    merit: &mut Merit,
    bounds: &Bounds,
    x: &mut [f64],
    weight: f64,
    tolerance: f64,
    budget: &mut Budget,
) -> Outcome {
    let n = x.len();
    let free: Vec<usize> = (0..n).filter(|&i| !bounds.is_fixed(i)).collect();
    let mut slot = vec![None; n];
    for (k, &i) in free.iter().enumerate() {
        slot[i] = Some(k);
    }

    let mut gradient = vec![0.0; n];
    let mut direction = vec![0.0; n];
    let mut trial = x.to_vec();
    let mut shift = 0.0;

    loop {
        let value = merit.gradient(x, &mut gradient) + bounds.barrier(x, weight);
        if !value.is_finite() {
            return Outcome::Stalled;
        }

        let mut diagonal = vec![0.0; free.len()];
        let mut norm: f64 = 0.0;
        for (k, &i) in free.iter().enumerate() {
            let (slope, curvature) = bounds.barrier_terms(i, x[i], weight);
            gradient[i] += slope;
            diagonal[k] = curvature;
            norm = norm.max(gradient[i].abs());
        }

        if norm <= tolerance {
            return Outcome::Stationary;
        }
        if let Some(status) = budget.exhausted() {
            return Outcome::Exhausted(status);
        }
        budget.tick();

        let mut lower = Vec::new();
        for (r, c, v) in merit.hessian(x) {
            let (Some(r), Some(c)) = (slot[r], slot[c]) else {
                continue;
            };
            if r == c {
                diagonal[r] += v;
            } else {
                lower.push((r, c, v));
            }
        }

        let rhs: Vec<f64> = free.iter().map(|&i| -gradient[i]).collect();
        let step = match factor(&diagonal, &lower, &mut shift) {
            Some(factor) => factor.solve(&rhs),
            None => rhs,
        };
        direction.fill(0.0);
        for (&i, d) in free.iter().zip(step) {
            direction[i] = d;
        }

        let slope = dot(&gradient, &direction);
        if slope.is_nan() || slope >= 0.0 {
            return Outcome::Stalled;
        }

        let longest = bounds.max_step(x, &direction, FRACTION_TO_BOUNDARY);
        let Some(length) = line_search(
            merit, bounds, weight, x, &direction, value, slope, longest, &mut trial,
        ) else {
            return Outcome::Stalled;
        };

        let moved = x
            .iter()
            .zip(&direction)
            .any(|(xi, di)| (length * di).abs() > f64::EPSILON * xi.abs().max(1.0));
        x.copy_from_slice(&trial);
        if !moved {
            return Outcome::Stalled;
        }
    }
}

/// Factors the Newton matrix, shifting its diagonal if needed.
///
/// Shifts grow tenfold from a quarter of the previous one, so a run of
/// indefinite iterations does not restart the search from the bottom.
fn factor(diagonal: &[f64], lower: &[(usize, usize, f64)], shift: &mut f64) -> Option<Envelope> {
    if let Some(factor) = Envelope::factor(diagonal, lower, 0.0) {
        return Some(factor);
    }

    let mut trial = (*shift / 4.0).max(MIN_SHIFT);
    while trial <= MAX_SHIFT {
        if let Some(factor) = Envelope::factor(diagonal, lower, trial) {
            *shift = trial;
            return Some(factor);
        }
        trial *= 10.0;
    }
    None
}

/// Armijo backtracking along `direction`, starting from `longest`.
///
/// On success `trial` holds the accepted point and the step length is
/// returned.
#[allow(clippy::too_many_arguments)]
fn line_search(
    merit: &mut Merit,
    bounds: &Bounds,
    weight: f64,
    x: &[f64],
    direction: &[f64],
    value: f64,
    slope: f64,
    longest: f64,
    trial: &mut [f64],
) -> Option<f64> {
    let mut step = longest;
    let slack = ROUNDOFF * value.abs();

    for _ in 0..MAX_BACKTRACKS {
        for i in 0..x.len() {
            trial[i] = x[i] + step * direction[i];
        }

        let trial_value = merit.value(trial) + bounds.barrier(trial, weight);
        if trial_value <= value + ARMIJO * step * slope + slack {
            return Some(step);
        }

        // Safeguarded quadratic interpolation.
        let curvature = trial_value - value - step * slope;
        let quadratic = -0.5 * step * step * slope / curvature;
        step = if curvature > 0.0 && quadratic >= 0.1 * step && quadratic <= 0.9 * step {
            quadratic
        } else {
            step / 2.0
        };
    }

    None
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
