// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The high-level intermediate representation.
//!
//! HIR expressions are what the frontend produces: in addition to the flat
//! algebra shared by all levels they admit `if-zero` conditionals (with
//! either branch optional) and lists, which sequence several constraints
//! inside one expression. Evaluation is therefore *list-valued*, and an
//! evaluation may be undefined (⊥) when a shifted access escapes the trace
//! or the taken branch of a conditional is absent.

mod expr;
pub use expr::{Expr, UnitExpr, ZeroArrayTest};

mod schema;
pub use self::schema::Schema;

mod lower;
pub use lower::lower_expr;

#[cfg(test)]
mod tests;
