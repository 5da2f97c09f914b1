use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Handle of a variable inside one [`LinearModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle of a row inside one [`LinearModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(usize);

impl RowId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Anything usable as a row key.
pub trait RowKey: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> RowKey for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    /// `f64::INFINITY` when unbounded
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Sparse affine expression `Σ coef · var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
        self
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate at the given variable values (indexed by [`VarId::index`])
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.0])
            .sum::<f64>()
            + self.constant
    }

    pub fn negated(&self) -> Self {
        Self {
            terms: self.terms.iter().map(|&(v, c)| (v, -c)).collect(),
            constant: -self.constant,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Row<K> {
    pub key: K,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("row {0} already exists")]
    DuplicateRow(String),

    #[error("row {0} does not exist")]
    UnknownRow(String),

    #[error("variable {0} does not belong to this model")]
    UnknownVariable(usize),
}

/// A mutable LP/MILP description with typed row keys.
///
/// Rows are addressed either by their [`RowId`] (position, stable for the
/// lifetime of the model) or by their key. Right-hand sides, row
/// coefficients and the objective can be changed in place between solves.
#[derive(Debug, Clone)]
pub struct LinearModel<K: RowKey> {
    name: String,
    sense: ObjectiveSense,
    vars: Vec<VarDef>,
    rows: Vec<Row<K>>,
    index: HashMap<K, RowId>,
    objective: LinearExpr,
}

impl<K: RowKey> LinearModel<K> {
    pub fn new(name: impl Into<String>, sense: ObjectiveSense) -> Self {
        Self {
            name: name.into(),
            sense,
            vars: Vec::new(),
            rows: Vec::new(),
            index: HashMap::new(),
            objective: LinearExpr::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        lower: f64,
        upper: f64,
    ) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            kind,
            lower,
            upper,
        });
        id
    }

    /// Continuous variable bounded below by zero
    pub fn add_nonneg(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, VarKind::Continuous, 0.0, f64::INFINITY)
    }

    /// Add a row; its key must not be in use yet.
    ///
    /// A constant inside `expr` is moved to the right-hand side.
    pub fn add_row(
        &mut self,
        key: K,
        mut expr: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) -> Result<RowId, ModelError> {
        if self.index.contains_key(&key) {
            return Err(ModelError::DuplicateRow(format!("{:?}", key)));
        }
        if let Some(&(var, _)) = expr.terms.iter().find(|(v, _)| v.0 >= self.vars.len()) {
            return Err(ModelError::UnknownVariable(var.0));
        }
        let rhs = rhs - expr.constant;
        expr.constant = 0.0;

        let id = RowId(self.rows.len());
        self.index.insert(key.clone(), id);
        self.rows.push(Row {
            key,
            expr,
            relation,
            rhs,
        });
        Ok(id)
    }

    pub fn row_id(&self, key: &K) -> Option<RowId> {
        self.index.get(key).copied()
    }

    pub fn row(&self, id: RowId) -> &Row<K> {
        &self.rows[id.0]
    }

    fn row_mut(&mut self, key: &K) -> Result<&mut Row<K>, ModelError> {
        let id = self
            .index
            .get(key)
            .copied()
            .ok_or_else(|| ModelError::UnknownRow(format!("{:?}", key)))?;
        Ok(&mut self.rows[id.0])
    }

    /// Replace the right-hand side of an existing row
    pub fn set_rhs(&mut self, key: &K, rhs: f64) -> Result<(), ModelError> {
        self.row_mut(key)?.rhs = rhs;
        Ok(())
    }

    /// Append `coef · var` to the left-hand side of an existing row
    pub fn add_to_row(&mut self, key: &K, var: VarId, coef: f64) -> Result<(), ModelError> {
        if var.0 >= self.vars.len() {
            return Err(ModelError::UnknownVariable(var.0));
        }
        self.row_mut(key)?.expr.add_term(var, coef);
        Ok(())
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn rows(&self) -> &[Row<K>] {
        &self.rows
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_integer_vars(&self) -> bool {
        self.vars.iter().any(|v| v.kind == VarKind::Integer)
    }

    /// Objective value at the given point
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Key {
        Cap,
        Demand(usize),
    }

    #[test]
    fn rows_are_addressable_by_key() {
        let mut model: LinearModel<Key> = LinearModel::new("test", ObjectiveSense::Minimize);
        let x = model.add_nonneg("x");
        let y = model.add_var("y", VarKind::Integer, 0.0, 5.0);

        let cap = model
            .add_row(
                Key::Cap,
                LinearExpr::new().with_term(x, 1.0).with_term(y, 2.0),
                Relation::LessEq,
                10.0,
            )
            .unwrap();
        model
            .add_row(Key::Demand(0), LinearExpr::new(), Relation::GreaterEq, 0.0)
            .unwrap();

        assert_eq!(model.row_id(&Key::Cap), Some(cap));
        assert_eq!(model.num_rows(), 2);
        assert!(model.has_integer_vars());

        model.set_rhs(&Key::Demand(0), 4.0).unwrap();
        model.add_to_row(&Key::Demand(0), x, 1.0).unwrap();
        let demand = model.row(model.row_id(&Key::Demand(0)).unwrap());
        assert_eq!(demand.rhs, 4.0);
        assert_eq!(demand.expr.terms, vec![(x, 1.0)]);
    }

    #[test]
    fn duplicate_and_unknown_rows_are_rejected() {
        let mut model: LinearModel<Key> = LinearModel::new("test", ObjectiveSense::Minimize);
        model
            .add_row(Key::Cap, LinearExpr::new(), Relation::LessEq, 1.0)
            .unwrap();
        assert!(matches!(
            model.add_row(Key::Cap, LinearExpr::new(), Relation::LessEq, 1.0),
            Err(ModelError::DuplicateRow(_))
        ));
        assert!(matches!(
            model.set_rhs(&Key::Demand(3), 1.0),
            Err(ModelError::UnknownRow(_))
        ));
    }

    #[test]
    fn expression_constant_moves_to_rhs() {
        let mut model: LinearModel<Key> = LinearModel::new("test", ObjectiveSense::Minimize);
        let x = model.add_nonneg("x");
        let mut expr = LinearExpr::constant(3.0);
        expr.add_term(x, 2.0);
        let id = model.add_row(Key::Cap, expr, Relation::LessEq, 5.0).unwrap();
        assert_eq!(model.row(id).rhs, 2.0);
        assert_eq!(model.row(id).expr.constant, 0.0);
    }

    #[test]
    fn objective_evaluation() {
        let mut model: LinearModel<Key> = LinearModel::new("test", ObjectiveSense::Minimize);
        let x = model.add_nonneg("x");
        let y = model.add_nonneg("y");
        model.set_objective(LinearExpr::constant(1.0).with_term(x, 2.0).with_term(y, 3.0));
        assert_eq!(model.objective_value(&[1.0, 2.0]), 9.0);
        assert_eq!(model.objective().negated().evaluate(&[1.0, 2.0]), -9.0);
    }

    #[test]
    fn zero_coefficients_are_dropped() {
        let mut model: LinearModel<Key> = LinearModel::new("test", ObjectiveSense::Minimize);
        let x = model.add_nonneg("x");
        let expr = LinearExpr::new().with_term(x, 0.0);
        assert!(expr.is_empty());
    }
}
