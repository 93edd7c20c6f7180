use std::error::Error;
use std::fmt;

use ndarray::{Array1, Array2};
use ordered_float::OrderedFloat;

use crate::automata::automaton::Automaton;

/// Failure of the reachability-probability solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The transition system led to a singular matrix.
    Singular,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveError::Singular => write!(f, "singular transition matrix"),
        }
    }
}

impl Error for SolveError {}

/// The probability of reaching a terminal state from the initial
/// distribution of `a`.
///
/// Every state's escape probability is an implicit equation: the diagonal
/// starts at -1, each transition `(i, l, j)` adds its probability (1.0 for
/// non-probabilistic labels) to entry `(i, j)`, and the right-hand side is
/// -1 at terminal rows. The whole system is solved at once; the result is
/// the sum of the solution over the initial states.
pub fn reach_probability(a: &Automaton) -> Result<f64, SolveError> {
    let n = a.state_count();
    if n == 0 {
        return Ok(0.0);
    }

    let mut m = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        m[[i, i]] = -1.0;
    }
    for t in a.delta_all() {
        let i = t.start().index();
        let j = t.end().index();
        m[[i, j]] += t.label().probability();
    }

    let mut rhs = Array1::<f64>::zeros(n);
    for s in a.terminals().iter() {
        rhs[s.index()] = -1.0;
    }

    let x = solve(m, rhs)?;
    Ok(a.initials().iter().map(|s| x[s.index()]).sum())
}

// Gaussian elimination with partial pivoting. A vanishing pivot is reported
// as-is; no regularization is applied.
fn solve(mut m: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, SolveError> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by_key(|&r| OrderedFloat(m[[r, col]].abs()))
            .unwrap_or(col);
        if m[[pivot_row, col]] == 0.0 {
            return Err(SolveError::Singular);
        }
        if pivot_row != col {
            for c in 0..n {
                m.swap([pivot_row, c], [col, c]);
            }
            b.swap(pivot_row, col);
        }
        for row in col + 1..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                m[[row, c]] -= factor * m[[col, c]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for c in row + 1..n {
            acc -= m[[row, c]] * x[c];
        }
        x[row] = acc / m[[row, row]];
    }
    Ok(x)
}
