use tether_core::{Problem, Sense, Tape, Variable};

const INITIAL_PENALTY: f64 = 10.0;
const PENALTY_GROWTH: f64 = 10.0;
const MAX_PENALTY: f64 = 1e8;

/// The augmented Lagrangian of a presolved problem.
///
/// Tape roots are laid out as `[objective, equalities..., inequalities...]`.
/// The objective root holds the problem's own expression; `sign` turns it
/// into a minimand.
#[derive(Debug)]
pub(super) struct Merit {
    tape: Tape,
    sign: f64,
    equalities: usize,
    lambda: Vec<f64>,
    mu: Vec<f64>,
    penalty: f64,
    values: Vec<f64>,
    adjoints: Vec<f64>,
    seeds: Vec<f64>,
}

impl Merit {
    pub(super) fn new(problem: &Problem, equalities: &[Variable], inequalities: &[Variable]) -> Self {
        let (objective, sign) = match problem.objective() {
            Some(objective) => {
                let sign = match objective.sense() {
                    Sense::Minimize => 1.0,
                    Sense::Maximize => -1.0,
                };
                (objective.expr().clone(), sign)
            }
            None => (Variable::constant(0.0), 1.0),
        };

        let mut roots = Vec::with_capacity(1 + equalities.len() + inequalities.len());
        roots.push(objective);
        roots.extend_from_slice(equalities);
        roots.extend_from_slice(inequalities);

        Self {
            tape: Tape::new(&roots, problem.variables()),
            sign,
            equalities: equalities.len(),
            lambda: vec![0.0; equalities.len()],
            mu: vec![0.0; inequalities.len()],
            penalty: INITIAL_PENALTY,
            values: Vec::new(),
            adjoints: Vec::new(),
            seeds: vec![0.0; roots.len()],
        }
    }

    pub(super) fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Evaluates the merit function at `x`.
    pub(super) fn value(&mut self, x: &[f64]) -> f64 {
        self.tape.forward(x, &mut self.values);
        self.current_value()
    }

    /// Evaluates the merit function and writes its gradient into `gradient`.
    pub(super) fn gradient(&mut self, x: &[f64], gradient: &mut [f64]) -> f64 {
        self.tape.forward(x, &mut self.values);
        self.fill_seeds();
        self.tape
            .reverse(&self.values, &self.seeds, &mut self.adjoints, gradient);
        self.current_value()
    }

    /// Returns the lower triangle of the merit Hessian at `x`.
    ///
    /// Entries are `(row, col, value)` over decision variable indices with
    /// `row >= col`; repeated positions add. Inequalities contribute
    /// curvature only while their shifted multiplier is positive.
    pub(super) fn hessian(&mut self, x: &[f64]) -> Vec<(usize, usize, f64)> {
        self.tape.forward(x, &mut self.values);
        self.fill_seeds();

        let rho = self.penalty;
        let mut curvature = vec![0.0; self.seeds.len()];
        for (k, seed) in self.seeds.iter().enumerate().skip(1) {
            if k <= self.equalities || *seed > 0.0 {
                curvature[k] = rho;
            }
        }

        self.tape.hessian(&self.values, &self.seeds, &curvature)
    }

    /// Returns the objective (in the problem's own sense) and the largest
    /// constraint violation at `x`.
    pub(super) fn measure(&mut self, x: &[f64]) -> (f64, f64) {
        self.tape.forward(x, &mut self.values);
        (self.root(0), self.current_violation())
    }

    /// Takes a first-order multiplier step at `x`, then grows the penalty if
    /// `grow_penalty` is set.
    pub(super) fn update(&mut self, x: &[f64], grow_penalty: bool) {
        self.tape.forward(x, &mut self.values);

        for i in 0..self.lambda.len() {
            self.lambda[i] += self.penalty * self.root(1 + i);
        }
        for j in 0..self.mu.len() {
            let g = self.root(1 + self.equalities + j);
            self.mu[j] = (self.mu[j] + self.penalty * g).max(0.0);
        }

        if grow_penalty {
            self.penalty = (self.penalty * PENALTY_GROWTH).min(MAX_PENALTY);
        }
    }

    /// Sets the first derivative of the merit with respect to each root.
    fn fill_seeds(&mut self) {
        self.seeds[0] = self.sign;
        for (i, &lambda) in self.lambda.iter().enumerate() {
            let c = self.root(1 + i);
            self.seeds[1 + i] = lambda + self.penalty * c;
        }
        for (j, &mu) in self.mu.iter().enumerate() {
            let g = self.root(1 + self.equalities + j);
            self.seeds[1 + self.equalities + j] = (mu + self.penalty * g).max(0.0);
        }
    }

    fn root(&self, i: usize) -> f64 {
        self.tape.root_value(&self.values, i)
    }

    fn current_value(&self) -> f64 {
        let rho = self.penalty;
        let mut value = self.sign * self.root(0);

        for (i, &lambda) in self.lambda.iter().enumerate() {
            let c = self.root(1 + i);
            value += lambda * c + 0.5 * rho * c * c;
        }
        for (j, &mu) in self.mu.iter().enumerate() {
            let g = self.root(1 + self.equalities + j);
            let shifted = (mu + rho * g).max(0.0);
            value += (shifted * shifted - mu * mu) / (2.0 * rho);
        }

        value
    }

    fn current_violation(&self) -> f64 {
        let equalities = (0..self.lambda.len()).map(|i| self.root(1 + i).abs());
        let inequalities =
            (0..self.mu.len()).map(|j| self.root(1 + self.equalities + j).max(0.0));
        equalities.chain(inequalities).fold(0.0, f64::max)
    }
}
