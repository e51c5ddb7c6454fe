//! The modelling layer: decision variables, linear and quadratic expressions and named families of
//! constraints.
//!
//! A [`Problem`] is built append-only. Each constraint family is generated by invoking a rule once
//! per index tuple; the rule either yields a constraint or explicitly asks for the instance to be
//! skipped (see [`RuleOutcome`]).
use crate::index::IndexKey;
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use log::{debug, info};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// The index of a decision variable within a [`Problem`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableID(usize);

impl VariableID {
    /// Position of the variable in the problem's variable list
    pub fn index(self) -> usize {
        self.0
    }
}

/// A decision variable with its bounds
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    /// The name of the family the variable belongs to (e.g. `pwr`)
    pub family: &'static str,
    /// The index tuple of the variable, as described by [`IndexKey::describe`]
    pub key: String,
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
}

/// A linear expression: a weighted sum of variables plus a constant
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VariableID, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// An expression consisting of a single constant
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// An expression consisting of a single weighted variable
    pub fn term(var: VariableID, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    /// Add a weighted variable to the expression
    pub fn add_term(&mut self, var: VariableID, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Add a constant to the expression
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// The constant part of the expression
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// The variable terms, with coefficients of repeated variables combined and zero coefficients
    /// dropped
    pub fn coefficients(&self) -> IndexMap<VariableID, f64> {
        let mut coeffs = IndexMap::new();
        for (var, coeff) in &self.terms {
            *coeffs.entry(*var).or_insert(0.0) += coeff;
        }
        coeffs.retain(|_, coeff| *coeff != 0.0);

        coeffs
    }

    /// Coefficient of the given variable
    pub fn coefficient(&self, var: VariableID) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, coeff)| coeff)
            .sum()
    }

    /// Whether the expression contains no variables
    pub fn is_constant(&self) -> bool {
        self.coefficients().is_empty()
    }

    /// Evaluate the expression at the given point, indexed by [`VariableID`]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.0])
            .sum::<f64>()
            + self.constant
    }
}

impl From<VariableID> for LinearExpr {
    fn from(var: VariableID) -> Self {
        Self::term(var, 1.0)
    }
}

impl From<f64> for LinearExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl SubAssign for LinearExpr {
    fn sub_assign(&mut self, rhs: LinearExpr) {
        *self += -rhs;
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        self += rhs.into();
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: T) -> LinearExpr {
        self -= rhs.into();
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(self, rhs: f64) -> LinearExpr {
        LinearExpr {
            terms: self
                .terms
                .into_iter()
                .map(|(var, coeff)| (var, coeff * rhs))
                .collect(),
            constant: self.constant * rhs,
        }
    }
}

impl std::iter::Sum for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> Self {
        iter.fold(LinearExpr::default(), |total, expr| total + expr)
    }
}

/// The sense of a constraint, comparing its expression against zero
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum ConstraintSense {
    /// `expr == 0`
    #[display("==")]
    Equal,
    /// `expr <= 0`
    #[display("<=")]
    LessEqual,
    /// `expr >= 0`
    #[display(">=")]
    GreaterEqual,
}

/// A linear constraint, stored as `expr (sense) 0`
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Left-hand side minus right-hand side
    pub expr: LinearExpr,
    /// How the expression compares against zero
    pub sense: ConstraintSense,
}

impl Constraint {
    fn new(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>, sense: ConstraintSense) -> Self {
        Self {
            expr: lhs.into() - rhs.into(),
            sense,
        }
    }

    /// `lhs == rhs`
    pub fn equal(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) -> Self {
        Self::new(lhs, rhs, ConstraintSense::Equal)
    }

    /// `lhs <= rhs`
    pub fn at_most(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) -> Self {
        Self::new(lhs, rhs, ConstraintSense::LessEqual)
    }

    /// `lhs >= rhs`
    pub fn at_least(lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) -> Self {
        Self::new(lhs, rhs, ConstraintSense::GreaterEqual)
    }

    /// The value of `lhs - rhs` at the given point
    pub fn residual(&self, values: &[f64]) -> f64 {
        self.expr.evaluate(values)
    }

    /// Whether the constraint holds at the given point, within an absolute tolerance
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let residual = self.residual(values);
        match self.sense {
            ConstraintSense::Equal => residual.abs() <= tolerance,
            ConstraintSense::LessEqual => residual <= tolerance,
            ConstraintSense::GreaterEqual => residual >= -tolerance,
        }
    }

    /// The range of values the variable part of the expression may take
    pub fn row_bounds(&self) -> (f64, f64) {
        let rhs = -self.expr.constant_value();
        match self.sense {
            ConstraintSense::Equal => (rhs, rhs),
            ConstraintSense::LessEqual => (f64::NEG_INFINITY, rhs),
            ConstraintSense::GreaterEqual => (rhs, f64::INFINITY),
        }
    }
}

/// The result of applying a rule to one index tuple
#[derive(Clone, Debug, PartialEq)]
pub enum RuleOutcome {
    /// Add this constraint
    Constraint(Constraint),
    /// The constraint does not apply to this index tuple
    Skip,
}

impl From<Constraint> for RuleOutcome {
    fn from(constraint: Constraint) -> Self {
        Self::Constraint(constraint)
    }
}

/// A named family of constraints with one instance per index tuple
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintFamily {
    /// Name of the family
    pub name: &'static str,
    /// Constraint instances keyed by their index tuple
    pub instances: IndexMap<String, Constraint>,
    /// Number of index tuples for which the rule asked to skip
    pub skipped: usize,
}

impl ConstraintFamily {
    /// Get the constraint instance for the given index tuple
    pub fn get<K: IndexKey>(&self, key: &K) -> Option<&Constraint> {
        self.instances.get(&key.describe())
    }

    /// Number of constraint instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the family has no constraint instances
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// A single term of a quadratic expression: `coeff * first * second`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticTerm {
    /// First variable
    pub first: VariableID,
    /// Second variable
    pub second: VariableID,
    /// Coefficient
    pub coeff: f64,
}

/// A linear expression plus quadratic terms
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadraticExpr {
    /// The linear part
    pub linear: LinearExpr,
    /// The quadratic part
    pub quadratic: Vec<QuadraticTerm>,
}

impl QuadraticExpr {
    /// Add `coeff * first * second`
    pub fn add_quadratic_term(&mut self, first: VariableID, second: VariableID, coeff: f64) {
        self.quadratic.push(QuadraticTerm {
            first,
            second,
            coeff,
        });
    }

    /// Whether there are no non-zero quadratic terms
    pub fn is_linear(&self) -> bool {
        self.quadratic.iter().all(|term| term.coeff == 0.0)
    }

    /// Evaluate the expression at the given point
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.linear.evaluate(values)
            + self
                .quadratic
                .iter()
                .map(|term| term.coeff * values[term.first.0] * values[term.second.0])
                .sum::<f64>()
    }
}

impl From<LinearExpr> for QuadraticExpr {
    fn from(linear: LinearExpr) -> Self {
        Self {
            linear,
            quadratic: Vec::new(),
        }
    }
}

/// A mathematical program: variables, constraint families and an objective to minimise
#[derive(Debug, Default)]
pub struct Problem {
    variables: Vec<VariableDefinition>,
    families: IndexMap<&'static str, ConstraintFamily>,
    objective: QuadraticExpr,
}

impl Problem {
    /// Create a new, empty problem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new variable with the given bounds
    pub fn add_variable(
        &mut self,
        family: &'static str,
        key: String,
        lower: f64,
        upper: f64,
    ) -> VariableID {
        self.variables.push(VariableDefinition {
            family,
            key,
            lower,
            upper,
        });

        VariableID(self.variables.len() - 1)
    }

    /// Get a variable's definition
    pub fn variable(&self, var: VariableID) -> &VariableDefinition {
        &self.variables[var.0]
    }

    /// Iterate over all variables in order of declaration
    pub fn iter_variables(&self) -> impl Iterator<Item = (VariableID, &VariableDefinition)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(index, def)| (VariableID(index), def))
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Replace the bounds of an existing variable
    pub fn set_bounds(&mut self, var: VariableID, lower: f64, upper: f64) -> Result<()> {
        let def = &mut self.variables[var.0];
        ensure!(
            lower <= upper,
            "Invalid bounds [{lower}, {upper}] for variable {}{}",
            def.family,
            def.key
        );
        def.lower = lower;
        def.upper = upper;

        Ok(())
    }

    /// Generate a constraint family by applying `rule` to every tuple in `index`.
    ///
    /// Every tuple yields exactly one instance, unless the rule returns [`RuleOutcome::Skip`].
    /// Fails if a family of the same name already exists, if two tuples describe the same instance
    /// or if the rule fails.
    pub fn add_family<K, I, F>(&mut self, name: &'static str, index: I, mut rule: F) -> Result<()>
    where
        K: IndexKey,
        I: IntoIterator<Item = K>,
        F: FnMut(&K) -> Result<RuleOutcome>,
    {
        info!("Adding {name} rule");
        ensure!(
            !self.families.contains_key(name),
            "Constraint family '{name}' defined more than once"
        );

        let mut family = ConstraintFamily {
            name,
            instances: IndexMap::new(),
            skipped: 0,
        };
        for key in index {
            match rule(&key)? {
                RuleOutcome::Constraint(constraint) => {
                    let description = key.describe();
                    if family.instances.contains_key(&description) {
                        bail!("Duplicate instance {description} in constraint family '{name}'");
                    }
                    family.instances.insert(description, constraint);
                }
                RuleOutcome::Skip => family.skipped += 1,
            }
        }

        debug!(
            "Constraint family '{name}': {} instances added, {} skipped",
            family.instances.len(),
            family.skipped
        );
        self.families.insert(name, family);

        Ok(())
    }

    /// Get a constraint family by name
    pub fn family(&self, name: &str) -> Option<&ConstraintFamily> {
        self.families.get(name)
    }

    /// Iterate over constraint families in order of generation
    pub fn iter_families(&self) -> impl Iterator<Item = &ConstraintFamily> {
        self.families.values()
    }

    /// Total number of constraint instances
    pub fn num_constraints(&self) -> usize {
        self.families.values().map(ConstraintFamily::len).sum()
    }

    /// Set the expression to be minimised
    pub fn set_objective(&mut self, objective: QuadraticExpr) {
        self.objective = objective;
    }

    /// The expression to be minimised
    pub fn objective(&self) -> &QuadraticExpr {
        &self.objective
    }

    /// Iterate over constraint instances which do not hold at the given point, along with their
    /// family name, index and residual
    pub fn iter_violations<'a>(
        &'a self,
        values: &'a [f64],
        tolerance: f64,
    ) -> impl Iterator<Item = (&'static str, &'a str, f64)> {
        self.families.values().flat_map(move |family| {
            family
                .instances
                .iter()
                .filter(move |(_, constraint)| !constraint.is_satisfied(values, tolerance))
                .map(move |(key, constraint)| {
                    (family.name, key.as_str(), constraint.residual(values))
                })
        })
    }
}
