use super::Event;

/// Prints the iteration table header to stderr.
pub(super) fn print_header(variables: usize, equalities: usize, inequalities: usize) {
    eprintln!(
        "augmented Lagrangian: {variables} variables, {equalities} equalities, {inequalities} inequalities"
    );
    eprintln!(
        "{:>5} {:>7} {:>14} {:>11} {:>11} {:>9}",
        "outer", "iters", "objective", "infeas", "stationary", "penalty"
    );
}

/// Prints one row of the iteration table to stderr.
pub(super) fn print_row(event: &Event) {
    eprintln!(
        "{:>5} {:>7} {:>14.6e} {:>11.3e} {:>11.3e} {:>9.1e}",
        event.outer_iter,
        event.iters,
        event.objective,
        event.infeasibility,
        event.stationarity,
        event.penalty
    );
}
