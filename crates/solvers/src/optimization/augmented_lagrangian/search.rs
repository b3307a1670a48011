use tether_core::{Observer, Problem};

use super::{
    Action, Config, Error, Event, Solution, Status, diagnostics,
    merit::Merit,
    newton::{self, Budget, Outcome},
    presolve::presolve,
};

/// Inner tolerance of the first outer iteration.
const INITIAL_INNER_TOLERANCE: f64 = 1e-1;

/// Barrier weight of the first outer iteration.
const INITIAL_BARRIER: f64 = 1e-2;

/// Smallest barrier weight, relative to the tolerance.
const MIN_BARRIER: f64 = 1e-3;

/// Relative gap kept from finite bounds when entering the interior.
const INTERIOR_PUSH: f64 = 1e-2;

/// Core augmented Lagrangian loop.
pub(super) fn search<Obs>(
    problem: &Problem,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    Obs: Observer<Event, Action>,
{
    let mut budget = Budget::new(config.max_iters(), config.timeout());
    let tolerance = config.tolerance();

    let presolved = presolve(problem, tolerance)?;
    let bounds = presolved.bounds;
    let mut merit = Merit::new(problem, &presolved.equalities, &presolved.inequalities);

    if config.diagnostics() {
        diagnostics::print_header(
            problem.decision_variable_count(),
            presolved.equalities.len(),
            presolved.inequalities.len(),
        );
    }

    let mut x: Vec<f64> = problem.variables().iter().map(|v| v.value()).collect();
    bounds.project(&mut x);
    bounds.push_inside(&mut x, INTERIOR_PUSH);

    let mut gradient = vec![0.0; x.len()];
    let mut inner_tolerance = INITIAL_INNER_TOLERANCE.max(tolerance);
    let mut barrier = INITIAL_BARRIER;
    let mut previous_violation = f64::INFINITY;
    let mut outer_iter = 0;

    let status = loop {
        if let Some(status) = budget.exhausted() {
            break status;
        }
        // Each outer iteration either spends inner iterations or tightens the
        // inner tolerance, so this cap is only reached on degenerate problems.
        if outer_iter >= config.max_iters().max(1) {
            break Status::MaxIters;
        }
        outer_iter += 1;

        let penalty = merit.penalty();
        let outcome = newton::minimize(
            &mut merit,
            &bounds,
            &mut x,
            barrier,
            inner_tolerance,
            &mut budget,
        );
        merit.gradient(&x, &mut gradient);
        let stationarity = bounds.projected_gradient_norm(&x, &gradient);
        let (objective, violation) = merit.measure(&x);

        let event = Event {
            outer_iter,
            iters: budget.iters(),
            objective,
            infeasibility: violation,
            stationarity,
            penalty,
        };
        if config.diagnostics() {
            diagnostics::print_row(&event);
        }
        if let Some(Action::StopEarly) = observer.observe(&event) {
            break Status::StoppedByObserver;
        }

        if violation <= tolerance && stationarity <= tolerance {
            break Status::Converged;
        }
        if let Outcome::Exhausted(status) = outcome {
            break status;
        }

        let stagnant = violation > tolerance && violation > 0.25 * previous_violation;
        merit.update(&x, stagnant);
        previous_violation = violation;
        inner_tolerance = (inner_tolerance * 0.1).max(tolerance);
        barrier = (barrier * 0.1).max(MIN_BARRIER * tolerance);
    };

    // Iterates never touch the bounds, so land those that are active on them.
    bounds.snap(&mut x, tolerance);
    problem.set_variable_values(&x);
    let (objective, infeasibility) = merit.measure(&x);

    Ok(Solution {
        status,
        objective,
        infeasibility,
        iters: budget.iters(),
        outer_iters: outer_iter,
        elapsed: budget.elapsed(),
    })
}
