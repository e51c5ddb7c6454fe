//! Hand-off of a formulated problem to the HiGHS solver.
//!
//! HiGHS is used as an LP solver here, so problems whose objective has quadratic terms (i.e. models
//! with marginal-cost plants) are rejected before anything is passed to it.
use crate::problem::{Problem, VariableID};
use highs::{HighsModelStatus, HighsStatus, RowProblem, Sense};
use log::{debug, info};
use std::fmt;

/// Reasons a problem could not be solved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverError {
    /// HiGHS rejected the problem or failed while solving it
    Incoherent(HighsStatus),
    /// The solver finished without finding an optimum
    NonOptimal(HighsModelStatus),
    /// The objective has quadratic terms
    QuadraticObjective,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoherent(status) => write!(f, "Incoherent model: {status:?}"),
            Self::NonOptimal(status) => write!(f, "Could not solve: {status:?}"),
            Self::QuadraticObjective => write!(
                f,
                "The objective has quadratic terms, which the LP solver does not support"
            ),
        }
    }
}

impl std::error::Error for SolverError {}

/// The optimal point found by the solver
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Value of every variable, in order of declaration
    pub values: Vec<f64>,
    /// Value of the objective, including any constant part
    pub objective_value: f64,
}

impl Solution {
    /// Get the value of a variable
    pub fn value(&self, var: VariableID) -> f64 {
        self.values[var.index()]
    }
}

/// Solve the problem with HiGHS, minimising the objective
pub fn solve(problem: &Problem) -> Result<Solution, SolverError> {
    let objective = problem.objective();
    if !objective.is_linear() {
        return Err(SolverError::QuadraticObjective);
    }

    let mut highs_problem = RowProblem::default();
    let coefficients = objective.linear.coefficients();
    let columns: Vec<_> = problem
        .iter_variables()
        .map(|(var, def)| {
            let coeff = coefficients.get(&var).copied().unwrap_or(0.0);
            highs_problem.add_column(coeff, def.lower..=def.upper)
        })
        .collect();

    for family in problem.iter_families() {
        for constraint in family.instances.values() {
            let (lower, upper) = constraint.row_bounds();
            let terms = constraint
                .expr
                .coefficients()
                .into_iter()
                .map(|(var, coeff)| (columns[var.index()], coeff));
            highs_problem.add_row(lower..=upper, terms);
        }
    }
    debug!(
        "Passing {} columns and {} rows to HiGHS",
        columns.len(),
        problem.num_constraints()
    );

    let mut highs_model = highs_problem
        .try_optimise(Sense::Minimise)
        .map_err(SolverError::Incoherent)?;
    highs_model.set_option("output_flag", false);

    let solved = highs_model.try_solve().map_err(SolverError::Incoherent)?;
    match solved.status() {
        HighsModelStatus::Optimal => {
            let values = solved.get_solution().columns().to_vec();
            let objective_value = objective.evaluate(&values);
            info!("Found optimal solution with objective {objective_value}");

            Ok(Solution {
                values,
                objective_value,
            })
        }
        status => Err(SolverError::NonOptimal(status)),
    }
}
