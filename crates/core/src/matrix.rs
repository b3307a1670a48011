//! Dense matrices of expression nodes.

use std::ops::{Add, Div, Mul, Neg, Sub};

use ndarray::Array2;

use crate::{AssignError, Tape, Variable};

/// A dense matrix of [`Variable`]s.
///
/// Trajectories are stored column-major in meaning: column `k` is the state
/// (or input) at node `k`. Arithmetic is element-wise except for
/// [`matmul`](Self::matmul).
///
/// Shape mismatches in arithmetic are programming errors and panic, matching
/// the behavior of `ndarray`.
#[derive(Debug, Clone)]
pub struct VariableMatrix {
    data: Array2<Variable>,
}

impl VariableMatrix {
    /// Creates a matrix by calling `f(row, col)` for every element.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> Variable,
    {
        Self {
            data: Array2::from_shape_fn((rows, cols), |(i, j)| f(i, j)),
        }
    }

    /// Creates a matrix of constant zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| Variable::constant(0.0))
    }

    /// Creates a matrix of distinct parameters, each initialized to zero.
    #[must_use]
    pub fn parameters(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| Variable::parameter(0.0))
    }

    /// Creates a column vector of constants.
    #[must_use]
    pub fn from_column(values: &[f64]) -> Self {
        Self::from_fn(values.len(), 1, |i, _| Variable::constant(values[i]))
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Returns `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Returns the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> &Variable {
        &self.data[[row, col]]
    }

    /// Replaces the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: Variable) {
        self.data[[row, col]] = value;
    }

    /// Returns column `col` as a `rows × 1` matrix sharing the same nodes.
    ///
    /// # Panics
    ///
    /// Panics if `col` is out of bounds.
    #[must_use]
    pub fn column(&self, col: usize) -> Self {
        let column = self.data.column(col);
        Self::from_fn(self.rows(), 1, |i, _| column[i].clone())
    }

    /// Replaces column `col` with the elements of a `rows × 1` matrix.
    ///
    /// # Panics
    ///
    /// Panics if `col` is out of bounds or `value` is not `rows × 1`.
    pub fn set_column(&mut self, col: usize, value: &Self) {
        assert_eq!(
            value.shape(),
            (self.rows(), 1),
            "column assignment shape mismatch"
        );
        for (dst, src) in self.data.column_mut(col).iter_mut().zip(value.data.iter()) {
            *dst = src.clone();
        }
    }

    /// Iterates over all elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.data.iter()
    }

    /// Applies `f` to every element.
    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(&Variable) -> Variable,
    {
        Self {
            data: self.data.map(f),
        }
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols(), self.rows(), |i, j| self.data[[j, i]].clone())
    }

    /// Matrix product `self · rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the inner dimensions differ.
    #[must_use]
    pub fn matmul(&self, rhs: &Self) -> Self {
        assert_eq!(
            self.cols(),
            rhs.rows(),
            "matrix product inner dimension mismatch"
        );
        Self::from_fn(self.rows(), rhs.cols(), |i, j| {
            (0..self.cols()).fold(Variable::constant(0.0), |acc, k| {
                acc + &self.data[[i, k]] * &rhs.data[[k, j]]
            })
        })
    }

    /// Multiplies every element by a scalar expression.
    #[must_use]
    pub fn scale(&self, factor: &Variable) -> Self {
        self.map(|v| v * factor)
    }

    /// Sums every element.
    #[must_use]
    pub fn sum(&self) -> Variable {
        self.data
            .iter()
            .fold(Variable::constant(0.0), |acc, v| acc + v)
    }

    /// Returns `true` if every element is a constant.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.data.iter().all(Variable::is_constant)
    }

    /// Counts the elements that are decision variables.
    #[must_use]
    pub fn decision_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_decision()).count()
    }

    /// Evaluates the element at `(row, col)`.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]].value()
    }

    /// Evaluates every element using the current values of all leaves.
    ///
    /// All elements are evaluated on one shared tape, so trajectories whose
    /// columns build on each other are evaluated in a single pass.
    #[must_use]
    pub fn values(&self) -> Array2<f64> {
        let roots: Vec<Variable> = self.data.iter().cloned().collect();
        let values = Tape::new(&roots, &[]).evaluate(&[]);
        let cols = self.cols();
        Array2::from_shape_fn(self.shape(), |(i, j)| values[i * cols + j])
    }

    /// Assigns the values of parameter or decision elements.
    ///
    /// # Errors
    ///
    /// Returns an [`AssignError`] at the first element that cannot hold a
    /// value. Elements before it have already been assigned.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not match the matrix shape.
    pub fn set_values(&self, values: &Array2<f64>) -> Result<(), AssignError> {
        assert_eq!(values.dim(), self.shape(), "value assignment shape mismatch");
        for (var, &value) in self.data.iter().zip(values.iter()) {
            var.set_value(value)?;
        }
        Ok(())
    }

    fn zip_with<F>(&self, rhs: &Self, what: &str, f: F) -> Self
    where
        F: Fn(&Variable, &Variable) -> Variable,
    {
        assert_eq!(self.shape(), rhs.shape(), "matrix {what} shape mismatch");
        Self::from_fn(self.rows(), self.cols(), |i, j| {
            f(&self.data[[i, j]], &rhs.data[[i, j]])
        })
    }
}

impl From<Array2<f64>> for VariableMatrix {
    fn from(values: Array2<f64>) -> Self {
        Self {
            data: values.mapv(Variable::constant),
        }
    }
}

impl From<Variable> for VariableMatrix {
    fn from(value: Variable) -> Self {
        Self {
            data: Array2::from_elem((1, 1), value),
        }
    }
}

impl From<f64> for VariableMatrix {
    fn from(value: f64) -> Self {
        Variable::constant(value).into()
    }
}

macro_rules! elementwise_ops {
    ($Trait:ident, $method:ident, $what:literal) => {
        impl $Trait<&VariableMatrix> for &VariableMatrix {
            type Output = VariableMatrix;

            fn $method(self, rhs: &VariableMatrix) -> VariableMatrix {
                self.zip_with(rhs, $what, |a, b| a.$method(b))
            }
        }

        impl $Trait<VariableMatrix> for VariableMatrix {
            type Output = VariableMatrix;

            fn $method(self, rhs: VariableMatrix) -> VariableMatrix {
                (&self).$method(&rhs)
            }
        }

        impl $Trait<&VariableMatrix> for VariableMatrix {
            type Output = VariableMatrix;

            fn $method(self, rhs: &VariableMatrix) -> VariableMatrix {
                (&self).$method(rhs)
            }
        }

        impl $Trait<VariableMatrix> for &VariableMatrix {
            type Output = VariableMatrix;

            fn $method(self, rhs: VariableMatrix) -> VariableMatrix {
                self.$method(&rhs)
            }
        }
    };
}

elementwise_ops!(Add, add, "addition");
elementwise_ops!(Sub, sub, "subtraction");

impl Neg for &VariableMatrix {
    type Output = VariableMatrix;

    fn neg(self) -> VariableMatrix {
        self.map(|v| -v)
    }
}

impl Neg for VariableMatrix {
    type Output = VariableMatrix;

    fn neg(self) -> VariableMatrix {
        -&self
    }
}

impl Mul<f64> for &VariableMatrix {
    type Output = VariableMatrix;

    fn mul(self, rhs: f64) -> VariableMatrix {
        self.map(|v| v * rhs)
    }
}

impl Mul<f64> for VariableMatrix {
    type Output = VariableMatrix;

    fn mul(self, rhs: f64) -> VariableMatrix {
        &self * rhs
    }
}

impl Mul<&VariableMatrix> for f64 {
    type Output = VariableMatrix;

    fn mul(self, rhs: &VariableMatrix) -> VariableMatrix {
        rhs * self
    }
}

impl Mul<VariableMatrix> for f64 {
    type Output = VariableMatrix;

    fn mul(self, rhs: VariableMatrix) -> VariableMatrix {
        &rhs * self
    }
}

impl Div<f64> for &VariableMatrix {
    type Output = VariableMatrix;

    fn div(self, rhs: f64) -> VariableMatrix {
        self.map(|v| v / rhs)
    }
}

impl Div<f64> for VariableMatrix {
    type Output = VariableMatrix;

    fn div(self, rhs: f64) -> VariableMatrix {
        &self / rhs
    }
}
