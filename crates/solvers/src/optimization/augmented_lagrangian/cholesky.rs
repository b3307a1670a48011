//! Envelope Cholesky factorization of sparse symmetric matrices.
//!
//! Rows are reordered with reverse Cuthill-McKee so that nonzeros cluster
//! near the diagonal. Row `i` of the factor then stores every column from
//! the first nonzero of that row through the diagonal, which is kept last.
//! For the banded systems produced by time-stepped trajectories the work is
//! linear in the number of rows.

/// Smallest acceptable pivot relative to the original diagonal entry.
const PIVOT_TOLERANCE: f64 = 1e-14;

/// Lower Cholesky factor `L` with `P·A·Pᵀ = L·Lᵀ`.
#[derive(Debug)]
pub(super) struct Envelope {
    /// `order[new] = old`.
    order: Vec<usize>,
    first: Vec<usize>,
    rowadr: Vec<usize>,
    data: Vec<f64>,
}

impl Envelope {
    /// Factors `A + shift·I`.
    ///
    /// `A` is given by its `diagonal` and strictly lower `(row, col, value)`
    /// entries; repeated positions add. Returns `None` if the shifted matrix
    /// is not numerically positive definite.
    pub(super) fn factor(diagonal: &[f64], lower: &[(usize, usize, f64)], shift: f64) -> Option<Self> {
        let n = diagonal.len();
        let order = reverse_cuthill_mckee(n, lower);
        let mut position = vec![0; n];
        for (new, &old) in order.iter().enumerate() {
            position[old] = new;
        }
        let permuted = |r: usize, c: usize| {
            let (a, b) = (position[r], position[c]);
            if a >= b { (a, b) } else { (b, a) }
        };

        let mut first: Vec<usize> = (0..n).collect();
        for &(r, c, _) in lower {
            let (row, col) = permuted(r, c);
            first[row] = first[row].min(col);
        }
        let mut rowadr = Vec::with_capacity(n);
        let mut len = 0;
        for (i, &f) in first.iter().enumerate() {
            rowadr.push(len);
            len += i - f + 1;
        }

        let mut factor = Self {
            order,
            first,
            rowadr,
            data: vec![0.0; len],
        };
        for i in 0..n {
            let value = diagonal[factor.order[i]] + shift;
            *factor.at_mut(i, i) = value;
        }
        for &(r, c, v) in lower {
            let (row, col) = permuted(r, c);
            *factor.at_mut(row, col) += v;
        }

        for i in 0..n {
            for j in factor.first[i]..i {
                let start = factor.first[i].max(factor.first[j]);
                let mut sum = factor.at(i, j);
                for k in start..j {
                    sum -= factor.at(i, k) * factor.at(j, k);
                }
                let value = sum / factor.at(j, j);
                *factor.at_mut(i, j) = value;
            }

            let scale = factor.at(i, i).abs();
            let mut pivot = factor.at(i, i);
            for k in factor.first[i]..i {
                let l = factor.at(i, k);
                pivot -= l * l;
            }
            if pivot.is_nan() || pivot <= PIVOT_TOLERANCE * scale {
                return None;
            }
            *factor.at_mut(i, i) = pivot.sqrt();
        }

        Some(factor)
    }

    /// Solves `(A + shift·I)·x = rhs`.
    pub(super) fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        let n = self.order.len();
        let mut y: Vec<f64> = self.order.iter().map(|&old| rhs[old]).collect();

        for i in 0..n {
            let mut sum = y[i];
            for k in self.first[i]..i {
                sum -= self.at(i, k) * y[k];
            }
            y[i] = sum / self.at(i, i);
        }
        for i in (0..n).rev() {
            y[i] /= self.at(i, i);
            let yi = y[i];
            for k in self.first[i]..i {
                y[k] -= self.at(i, k) * yi;
            }
        }

        let mut x = vec![0.0; n];
        for (new, &old) in self.order.iter().enumerate() {
            x[old] = y[new];
        }
        x
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        self.data[self.rowadr[i] + j - self.first[i]]
    }

    fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        &mut self.data[self.rowadr[i] + j - self.first[i]]
    }
}

/// Returns a bandwidth-reducing ordering as `order[new] = old`.
///
/// Each connected component is walked breadth first from a lowest-degree
/// vertex, visiting neighbors in order of increasing degree.
fn reverse_cuthill_mckee(n: usize, lower: &[(usize, usize, f64)]) -> Vec<usize> {
    let mut neighbors = vec![Vec::new(); n];
    for &(r, c, _) in lower {
        if r != c {
            neighbors[r].push(c);
            neighbors[c].push(r);
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }

    let mut seeds: Vec<usize> = (0..n).collect();
    seeds.sort_by_key(|&i| neighbors[i].len());

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for seed in seeds {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut head = order.len();
        order.push(seed);
        while head < order.len() {
            let node = order[head];
            head += 1;
            let mut next: Vec<usize> = neighbors[node]
                .iter()
                .copied()
                .filter(|&m| !visited[m])
                .collect();
            next.sort_by_key(|&m| neighbors[m].len());
            for m in next {
                visited[m] = true;
                order.push(m);
            }
        }
    }

    order.reverse();
    order
}
