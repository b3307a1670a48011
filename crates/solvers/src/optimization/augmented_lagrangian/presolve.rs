use std::collections::HashMap;

use tether_core::{Constraint, NodeId, Problem, Relation, Variable};

use super::Error;

/// Box bounds on the decision variables, indexed in creation order.
#[derive(Debug, Clone)]
pub(super) struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// Clamps `value` into the bounds of variable `i`.
    pub(super) fn clamp(&self, i: usize, value: f64) -> f64 {
        value.max(self.lower[i]).min(self.upper[i])
    }

    /// Projects every component of `x` onto its bounds.
    pub(super) fn project(&self, x: &mut [f64]) {
        for (i, xi) in x.iter_mut().enumerate() {
            *xi = self.clamp(i, *xi);
        }
    }

    /// Returns `‖P(x − g) − x‖∞`, zero exactly at a stationary point.
    pub(super) fn projected_gradient_norm(&self, x: &[f64], gradient: &[f64]) -> f64 {
        x.iter()
            .zip(gradient)
            .enumerate()
            .map(|(i, (&xi, &gi))| (self.clamp(i, xi - gi) - xi).abs())
            .fold(0.0, f64::max)
    }

    /// Returns `true` if variable `i` can take a single value only.
    pub(super) fn is_fixed(&self, i: usize) -> bool {
        self.lower[i] >= self.upper[i]
    }

    /// Moves every free component of `x` strictly inside its bounds.
    ///
    /// The gap left to a finite bound `b` is `fraction · max(1, |b|)`, but
    /// never more than `fraction` of the interval width.
    pub(super) fn push_inside(&self, x: &mut [f64], fraction: f64) {
        for (i, xi) in x.iter_mut().enumerate() {
            let (lower, upper) = (self.lower[i], self.upper[i]);
            if self.is_fixed(i) {
                *xi = lower;
                continue;
            }
            let width = upper - lower;
            let gap = |bound: f64| (fraction * bound.abs().max(1.0)).min(fraction * width);
            if lower.is_finite() {
                *xi = xi.max(lower + gap(lower));
            }
            if upper.is_finite() {
                *xi = xi.min(upper - gap(upper));
            }
        }
    }

    /// Returns `−weight · Σ [ln(x − l) + ln(u − x)]` over the finite bounds
    /// of free variables.
    pub(super) fn barrier(&self, x: &[f64], weight: f64) -> f64 {
        let mut sum = 0.0;
        for (i, &xi) in x.iter().enumerate() {
            if self.is_fixed(i) {
                continue;
            }
            if self.lower[i].is_finite() {
                sum += (xi - self.lower[i]).ln();
            }
            if self.upper[i].is_finite() {
                sum += (self.upper[i] - xi).ln();
            }
        }
        -weight * sum
    }

    /// Returns the first and second derivative of variable `i`'s barrier
    /// terms at `xi`.
    pub(super) fn barrier_terms(&self, i: usize, xi: f64, weight: f64) -> (f64, f64) {
        let (mut slope, mut curvature) = (0.0, 0.0);
        if self.lower[i].is_finite() {
            let gap = xi - self.lower[i];
            slope -= weight / gap;
            curvature += weight / (gap * gap);
        }
        if self.upper[i].is_finite() {
            let gap = self.upper[i] - xi;
            slope += weight / gap;
            curvature += weight / (gap * gap);
        }
        (slope, curvature)
    }

    /// Returns the largest step `α <= 1` along `direction` that closes at most
    /// `fraction` of the gap to any finite bound.
    pub(super) fn max_step(&self, x: &[f64], direction: &[f64], fraction: f64) -> f64 {
        let mut step: f64 = 1.0;
        for (i, (&xi, &di)) in x.iter().zip(direction).enumerate() {
            if di < 0.0 && self.lower[i].is_finite() {
                step = step.min(fraction * (self.lower[i] - xi) / di);
            } else if di > 0.0 && self.upper[i].is_finite() {
                step = step.min(fraction * (self.upper[i] - xi) / di);
            }
        }
        step
    }

    /// Moves components within `tolerance` of a finite bound onto it.
    pub(super) fn snap(&self, x: &mut [f64], tolerance: f64) {
        for (i, xi) in x.iter_mut().enumerate() {
            if *xi - self.lower[i] <= tolerance {
                *xi = self.lower[i];
            } else if self.upper[i] - *xi <= tolerance {
                *xi = self.upper[i];
            }
        }
    }

    fn tighten(&mut self, i: usize, relation: Relation, value: f64) {
        match relation {
            Relation::Equal => {
                self.lower[i] = self.lower[i].max(value);
                self.upper[i] = self.upper[i].min(value);
            }
            Relation::LessEqual => self.upper[i] = self.upper[i].min(value),
            Relation::GreaterEqual => self.lower[i] = self.lower[i].max(value),
        }
    }
}

/// The problem split into bounds and general constraint residuals.
#[derive(Debug)]
pub(super) struct Presolved {
    pub(super) bounds: Bounds,

    /// Residuals `c(x)` of equalities `c(x) = 0`.
    pub(super) equalities: Vec<Variable>,

    /// Residuals `g(x)` of inequalities `g(x) <= 0`.
    pub(super) inequalities: Vec<Variable>,
}

/// Sorts the problem's constraints into bounds and general residuals.
///
/// Constraints without decision variables are checked against `tolerance`.
pub(super) fn presolve(problem: &Problem, tolerance: f64) -> Result<Presolved, Error> {
    let index: HashMap<NodeId, usize> = problem
        .variables()
        .iter()
        .enumerate()
        .map(|(i, v)| (v.id(), i))
        .collect();

    let mut bounds = Bounds::unbounded(index.len());
    let mut equalities = Vec::new();
    let mut inequalities = Vec::new();

    for (i, constraint) in problem.constraints().iter().enumerate() {
        if let Some((var, relation, value)) = as_bound(constraint, &index) {
            bounds.tighten(var, relation, value);
            continue;
        }

        let residual = constraint.residual();
        if !residual.contains_decision() {
            let g = residual.value();
            let violation = if constraint.is_equality() {
                g.abs()
            } else {
                g.max(0.0)
            };
            if g.is_nan() || violation > tolerance {
                return Err(Error::InfeasibleConstant {
                    index: i,
                    violation,
                });
            }
            continue;
        }

        if constraint.is_equality() {
            equalities.push(residual);
        } else {
            inequalities.push(residual);
        }
    }

    for (i, (&lower, &upper)) in bounds.lower.iter().zip(&bounds.upper).enumerate() {
        if lower > upper {
            return Err(Error::CrossedBounds {
                index: i,
                lower,
                upper,
            });
        }
    }

    Ok(Presolved {
        bounds,
        equalities,
        inequalities,
    })
}

/// Recognizes `x ⋈ c` and `c ⋈ x` for a decision variable `x` of this problem.
///
/// Returns the variable index and the relation oriented as `x ⋈ c`.
fn as_bound(
    constraint: &Constraint,
    index: &HashMap<NodeId, usize>,
) -> Option<(usize, Relation, f64)> {
    let (lhs, rhs) = (constraint.lhs(), constraint.rhs());

    let (var, value, relation) = if lhs.is_decision() && rhs.is_constant() {
        (lhs, rhs.as_constant()?, constraint.relation())
    } else if rhs.is_decision() && lhs.is_constant() {
        let flipped = match constraint.relation() {
            Relation::Equal => Relation::Equal,
            Relation::LessEqual => Relation::GreaterEqual,
            Relation::GreaterEqual => Relation::LessEqual,
        };
        (rhs, lhs.as_constant()?, flipped)
    } else {
        return None;
    };

    if value.is_nan() {
        return None;
    }

    index.get(&var.id()).map(|&i| (i, relation, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn lone_variable_constraints_become_bounds() {
        let mut problem = Problem::new();
        let x = problem.decision_variable(3, 1);
        problem.subject_to(x.get(0, 0).equals(0.0));
        problem.subject_to(x.get(1, 0).leq(5.0));
        problem.subject_to(Variable::constant(-2.0).leq(x.get(1, 0)));
        problem.subject_to(x.get(2, 0).geq(x.get(0, 0)));

        let presolved = presolve(&problem, 1e-9).unwrap();

        assert_eq!(presolved.bounds.lower[0], 0.0);
        assert_eq!(presolved.bounds.upper[0], 0.0);
        assert_eq!(presolved.bounds.lower[1], -2.0);
        assert_eq!(presolved.bounds.upper[1], 5.0);
        assert!(presolved.bounds.lower[2].is_infinite());
        assert!(presolved.equalities.is_empty());
        assert_eq!(presolved.inequalities.len(), 1);
    }

    #[test]
    fn satisfied_constant_constraints_are_dropped() {
        let mut problem = Problem::new();
        let p = Variable::parameter(3.0);
        problem.subject_to(p.equals(3.0));
        problem.subject_to((&p * 2.0).leq(7.0));

        let presolved = presolve(&problem, 1e-9).unwrap();

        assert!(presolved.equalities.is_empty());
        assert!(presolved.inequalities.is_empty());
    }

    #[test]
    fn projection_and_stationarity() {
        let bounds = Bounds {
            lower: vec![0.0, f64::NEG_INFINITY],
            upper: vec![1.0, f64::INFINITY],
        };

        let mut x = [1.5, -7.0];
        bounds.project(&mut x);
        assert_eq!(x, [1.0, -7.0]);

        // Gradient pushes against the active upper bound: stationary.
        assert_eq!(bounds.projected_gradient_norm(&[1.0, 0.0], &[-3.0, 0.0]), 0.0);
        assert_eq!(bounds.projected_gradient_norm(&[1.0, 0.0], &[0.5, -2.0]), 2.0);
    }

    #[test]
    fn interior_helpers_respect_bounds() {
        let bounds = Bounds {
            lower: vec![0.0, -12.0, 3.0, f64::NEG_INFINITY],
            upper: vec![1.0, 12.0, 3.0, f64::INFINITY],
        };

        let mut x = [0.0, 20.0, 7.0, 5.0];
        bounds.push_inside(&mut x, 1e-2);
        assert_eq!(x[0], 1e-2);
        assert_relative_eq!(x[1], 11.88);
        assert_eq!(&x[2..], &[3.0, 5.0]);

        // Only the unit interval and the ±12 box contribute.
        let expected = -(0.5_f64.ln() * 2.0 + 12.0_f64.ln() * 2.0);
        assert_relative_eq!(bounds.barrier(&[0.5, 0.0, 3.0, 9.0], 1.0), expected);

        let (slope, curvature) = bounds.barrier_terms(0, 0.25, 2.0);
        assert_relative_eq!(slope, -2.0 / 0.25 + 2.0 / 0.75);
        assert_relative_eq!(curvature, 2.0 / 0.0625 + 2.0 / 0.5625);

        let step = bounds.max_step(&[0.5, 0.0, 3.0, 0.0], &[1.0, -24.0, 0.0, 1e9], 0.5);
        assert_relative_eq!(step, 0.25);

        let mut x = [1e-9, 11.9, 3.0, 1e-12];
        bounds.snap(&mut x, 1e-6);
        assert_eq!(x, [0.0, 11.9, 3.0, 1e-12]);
    }
}
