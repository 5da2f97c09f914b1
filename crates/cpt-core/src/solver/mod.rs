//! Solver-agnostic linear model layer.
//!
//! Optimization code in this workspace never talks to an LP/MILP library
//! directly. It builds a [`LinearModel`] whose rows carry a typed key, hands
//! it to an [`LpBackend`], and reads back primal values and dual prices by
//! [`VarId`] / [`RowId`]. Keeping the model here means it can be mutated
//! between solves (right-hand sides, objective, extra rows) without being
//! rebuilt, which is what decomposition methods need.
//!
//! ## Dual sign convention
//!
//! Every backend reports the dual of a row as the derivative of the optimal
//! objective with respect to that row's right-hand side, for the row exactly
//! as it was stated:
//!
//! | Sense    | `<=` row | `>=` row | `==` row |
//! |----------|----------|----------|----------|
//! | minimize | `<= 0`   | `>= 0`   | free     |
//!
//! With this convention the dual objective of an LP whose variables are only
//! bounded below by zero is simply `Σ dual[row] · rhs[row]`.

pub mod backend;
pub mod model;

pub use backend::{EngineError, LpBackend, LpSolution};
pub use model::{
    LinearExpr, LinearModel, ModelError, ObjectiveSense, Relation, Row, RowId, RowKey, VarDef,
    VarId, VarKind,
};
