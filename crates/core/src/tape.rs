//! Flattened expression graphs.

use std::collections::HashMap;

use crate::variable::{BinaryOp, Node, Op, UnaryOp, Variable};

#[derive(Debug, Clone, Copy)]
enum Entry {
    /// A leaf whose value was captured when the tape was built.
    Value(f64),

    /// A leaf read from the input slice at the given position.
    Input(usize),

    Unary(UnaryOp, usize),

    Binary(BinaryOp, usize, usize),
}

/// A set of expressions flattened into topological order.
///
/// Building a tape walks the graph once. Afterwards the expressions can be
/// evaluated repeatedly for different values of the `inputs` variables, and a
/// single reverse sweep produces the gradient of any weighted sum of the roots
/// with respect to those inputs.
///
/// Leaves that are not listed as inputs (constants, parameters, or decision
/// variables of another problem) are captured at their current value.
/// Shared subexpressions appear once.
#[derive(Debug, Clone)]
pub struct Tape {
    entries: Vec<Entry>,
    /// Whether each entry depends on at least one input.
    active: Vec<bool>,
    roots: Vec<usize>,
    inputs: usize,
}

impl Tape {
    /// Flattens `roots`, treating each variable in `inputs` as a free slot.
    #[must_use]
    pub fn new(roots: &[Variable], inputs: &[Variable]) -> Self {
        let slots: HashMap<*const Node, usize> = inputs
            .iter()
            .enumerate()
            .map(|(i, v)| (v.key(), i))
            .collect();

        let mut index: HashMap<*const Node, usize> = HashMap::new();
        let mut entries = Vec::new();
        let mut root_ids = Vec::with_capacity(roots.len());
        let mut stack: Vec<(Variable, bool)> = Vec::new();

        for root in roots {
            stack.push((root.clone(), false));

            while let Some((var, expanded)) = stack.pop() {
                let key = var.key();
                if index.contains_key(&key) {
                    continue;
                }

                let node = &var.0;
                if !expanded && !node.args.is_empty() {
                    stack.push((var.clone(), true));
                    for arg in node.args.iter().rev() {
                        if !index.contains_key(&arg.key()) {
                            stack.push((arg.clone(), false));
                        }
                    }
                    continue;
                }

                let arg = |i: usize| index[&node.args[i].key()];
                let entry = match node.op {
                    Op::Leaf(_) => match slots.get(&key) {
                        Some(&slot) => Entry::Input(slot),
                        None => Entry::Value(node.value.get()),
                    },
                    Op::Unary(op) => Entry::Unary(op, arg(0)),
                    Op::Binary(op) => Entry::Binary(op, arg(0), arg(1)),
                };

                index.insert(key, entries.len());
                entries.push(entry);
            }

            root_ids.push(index[&root.key()]);
        }

        let mut active = Vec::with_capacity(entries.len());
        for entry in &entries {
            let depends = match *entry {
                Entry::Value(_) => false,
                Entry::Input(_) => true,
                Entry::Unary(_, a) => active[a],
                Entry::Binary(_, a, b) => active[a] || active[b],
            };
            active.push(depends);
        }

        Self {
            entries,
            active,
            roots: root_ids,
            inputs: inputs.len(),
        }
    }

    /// Returns the number of distinct nodes on the tape.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tape has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of root expressions.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Returns the number of input slots.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs
    }

    /// Computes every node value for the given inputs.
    ///
    /// `values` is resized to the tape length and overwritten.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` is shorter than [`input_count`](Self::input_count).
    pub fn forward(&self, inputs: &[f64], values: &mut Vec<f64>) {
        values.clear();
        values.reserve(self.entries.len());
        for entry in &self.entries {
            let v = match *entry {
                Entry::Value(v) => v,
                Entry::Input(slot) => inputs[slot],
                Entry::Unary(op, a) => op.apply(values[a]),
                Entry::Binary(op, a, b) => op.apply(values[a], values[b]),
            };
            values.push(v);
        }
    }

    /// Returns the value of root `i` from a completed forward pass.
    #[must_use]
    pub fn root_value(&self, values: &[f64], i: usize) -> f64 {
        values[self.roots[i]]
    }

    /// Evaluates all roots for the given inputs.
    #[must_use]
    pub fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        let mut values = Vec::new();
        self.forward(inputs, &mut values);
        self.roots.iter().map(|&r| values[r]).collect()
    }

    /// Accumulates `Σ seeds[i] · ∇root_i` into `gradient`.
    ///
    /// `values` must come from [`forward`](Self::forward) on the same tape.
    /// `adjoints` is scratch space, resized and overwritten. `gradient` is
    /// zeroed before accumulation and must have one entry per input slot.
    ///
    /// # Panics
    ///
    /// Panics if `seeds` does not have one entry per root.
    pub fn reverse(
        &self,
        values: &[f64],
        seeds: &[f64],
        adjoints: &mut Vec<f64>,
        gradient: &mut [f64],
    ) {
        assert_eq!(seeds.len(), self.roots.len(), "one seed per root");

        adjoints.clear();
        adjoints.resize(self.entries.len(), 0.0);
        gradient.iter_mut().for_each(|g| *g = 0.0);

        for (&root, &seed) in self.roots.iter().zip(seeds) {
            adjoints[root] += seed;
        }

        for (i, entry) in self.entries.iter().enumerate().rev() {
            let adj = adjoints[i];
            if adj == 0.0 {
                continue;
            }
            match *entry {
                Entry::Value(_) => {}
                Entry::Input(slot) => gradient[slot] += adj,
                Entry::Unary(op, a) => {
                    adjoints[a] += adj * op.derivative(values[a], values[i]);
                }
                Entry::Binary(op, a, b) => {
                    let (da, db) = op.derivatives(values[a], values[b]);
                    adjoints[a] += adj * da;
                    adjoints[b] += adj * db;
                }
            }
        }
    }

    /// Computes the Hessian of `F(root_0, root_1, ...)` with respect to the inputs.
    ///
    /// `first[i]` is `∂F/∂root_i` and `second[i]` is `∂²F/∂root_i²`. Mixed
    /// second derivatives between distinct roots are taken to be zero, so
    ///
    /// ```text
    /// ∇²F = Σ first[i] · ∇²root_i + Σ second[i] · ∇root_i ∇root_iᵀ
    /// ```
    ///
    /// `values` must come from [`forward`](Self::forward) on the same tape.
    /// The result lists the lower triangle as `(row, col, value)` input-slot
    /// triples with `row >= col`. A position may appear more than once, in
    /// which case the values add.
    ///
    /// # Panics
    ///
    /// Panics if `first` or `second` does not have one entry per root.
    #[must_use]
    pub fn hessian(&self, values: &[f64], first: &[f64], second: &[f64]) -> Vec<(usize, usize, f64)> {
        assert_eq!(first.len(), self.roots.len(), "one first derivative per root");
        assert_eq!(second.len(), self.roots.len(), "one second derivative per root");

        let mut triples = self.push_edges(values, first);

        let mut marks = vec![false; self.entries.len()];
        let mut adjoints = vec![0.0; self.entries.len()];
        for (&root, &curvature) in self.roots.iter().zip(second) {
            if curvature == 0.0 {
                continue;
            }
            let gradient = self.sparse_gradient(values, root, &mut marks, &mut adjoints);
            for (p, &(row, a)) in gradient.iter().enumerate() {
                for &(col, b) in &gradient[..=p] {
                    let (row, col) = if row >= col { (row, col) } else { (col, row) };
                    triples.push((row, col, curvature * a * b));
                }
            }
        }

        triples
    }

    /// Second-order reverse sweep for `Σ first[i] · ∇²root_i`.
    ///
    /// Each node carries a sparse row of its nonlinear interactions with
    /// other nodes. Visiting nodes from last to first, a node's row is pushed
    /// onto its operands through the chain rule and the node's own curvature
    /// is created from its adjoint. Rows left on input leaves form the result.
    fn push_edges(&self, values: &[f64], first: &[f64]) -> Vec<(usize, usize, f64)> {
        let n = self.entries.len();
        let mut adjoints = vec![0.0; n];
        let mut pairs: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];

        for (&root, &seed) in self.roots.iter().zip(first) {
            adjoints[root] += seed;
        }

        for i in (0..n).rev() {
            if !self.active[i] {
                continue;
            }
            let Some(local) = self.local(values, i) else {
                continue;
            };
            let adj = adjoints[i];
            let row = std::mem::take(&mut pairs[i]);
            if adj == 0.0 && row.is_empty() {
                continue;
            }

            let mut diagonal = 0.0;
            for (&p, &w) in &row {
                if p == i {
                    diagonal = w;
                    continue;
                }
                pairs[p].remove(&i);
                for &(j, dj) in local.args() {
                    if j == p {
                        accumulate(&mut pairs, p, p, 2.0 * dj * w);
                    } else {
                        accumulate(&mut pairs, j, p, dj * w);
                    }
                }
            }

            let args = local.args();
            for s in 0..args.len() {
                for t in s..args.len() {
                    let (j, dj) = args[s];
                    let (k, dk) = args[t];
                    let w = dj * dk * diagonal + adj * local.second(s, t);
                    accumulate(&mut pairs, j, k, w);
                }
            }

            for &(j, dj) in args {
                adjoints[j] += adj * dj;
            }
        }

        let mut triples = Vec::new();
        for (i, row) in pairs.iter().enumerate() {
            let Entry::Input(slot) = self.entries[i] else {
                continue;
            };
            for (&p, &w) in row {
                if let Entry::Input(other) = self.entries[p] {
                    if slot >= other {
                        triples.push((slot, other, w));
                    }
                }
            }
        }
        triples
    }

    /// Gradient of a single root as `(slot, value)` pairs.
    ///
    /// Only the subgraph under `root` is visited. `marks` and `adjoints` must
    /// be all `false` and zero on entry and are left that way.
    fn sparse_gradient(
        &self,
        values: &[f64],
        root: usize,
        marks: &mut [bool],
        adjoints: &mut [f64],
    ) -> Vec<(usize, f64)> {
        let mut nodes = Vec::new();
        let mut stack = vec![root];
        marks[root] = true;
        while let Some(i) = stack.pop() {
            nodes.push(i);
            let operands = match self.entries[i] {
                Entry::Value(_) | Entry::Input(_) => [None, None],
                Entry::Unary(_, a) => [Some(a), None],
                Entry::Binary(_, a, b) => [Some(a), Some(b)],
            };
            for a in operands.into_iter().flatten() {
                if self.active[a] && !marks[a] {
                    marks[a] = true;
                    stack.push(a);
                }
            }
        }
        nodes.sort_unstable_by(|a, b| b.cmp(a));

        let mut gradient = Vec::new();
        adjoints[root] = 1.0;
        for &i in &nodes {
            marks[i] = false;
            let adj = std::mem::take(&mut adjoints[i]);
            match self.entries[i] {
                Entry::Value(_) => {}
                Entry::Input(slot) => gradient.push((slot, adj)),
                Entry::Unary(op, a) => {
                    adjoints[a] += adj * op.derivative(values[a], values[i]);
                }
                Entry::Binary(op, a, b) => {
                    let (da, db) = op.derivatives(values[a], values[b]);
                    adjoints[a] += adj * da;
                    adjoints[b] += adj * db;
                }
            }
        }
        gradient
    }

    /// First and second local derivatives of entry `i` with respect to its
    /// active operands, or `None` for leaves.
    fn local(&self, values: &[f64], i: usize) -> Option<Local> {
        match self.entries[i] {
            Entry::Value(_) | Entry::Input(_) => None,
            Entry::Unary(op, a) => {
                let d = op.derivative(values[a], values[i]);
                let dd = op.second_derivative(values[a], values[i]);
                Some(Local::one(a, d, dd))
            }
            Entry::Binary(op, a, b) => {
                let (da, db) = op.derivatives(values[a], values[b]);
                let (daa, dab, dbb) = op.second_derivatives(values[a], values[b]);
                Some(match (self.active[a], self.active[b]) {
                    _ if a == b => Local::one(a, da + db, daa + 2.0 * dab + dbb),
                    (true, true) => Local {
                        args: [(a, da), (b, db)],
                        len: 2,
                        second: [daa, dab, dbb],
                    },
                    (true, false) => Local::one(a, da, daa),
                    (false, true) => Local::one(b, db, dbb),
                    (false, false) => Local::none(),
                })
            }
        }
    }
}

/// Local derivatives of one node with respect to at most two distinct operands.
struct Local {
    args: [(usize, f64); 2],
    len: usize,
    /// Second derivatives ordered `(0, 0)`, `(0, 1)`, `(1, 1)`.
    second: [f64; 3],
}

impl Local {
    fn one(arg: usize, d: f64, dd: f64) -> Self {
        Self {
            args: [(arg, d), (0, 0.0)],
            len: 1,
            second: [dd, 0.0, 0.0],
        }
    }

    fn none() -> Self {
        Self {
            args: [(0, 0.0); 2],
            len: 0,
            second: [0.0; 3],
        }
    }

    fn args(&self) -> &[(usize, f64)] {
        &self.args[..self.len]
    }

    fn second(&self, s: usize, t: usize) -> f64 {
        self.second[s + t]
    }
}

/// Adds `value` to the symmetric pair `{j, k}`.
fn accumulate(pairs: &mut [HashMap<usize, f64>], j: usize, k: usize, value: f64) {
    if value == 0.0 {
        return;
    }
    *pairs[j].entry(k).or_insert(0.0) += value;
    if j != k {
        *pairs[k].entry(j).or_insert(0.0) += value;
    }
}
