// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! This crate contains the tracery constraint compiler and trace validator.
//!
//! A user supplies a *schema* — named columns, algebraic row constraints,
//! sorting assertions, and bitwidth declarations — and a *trace* of concrete
//! column values over the scalar field of BLS12-377. Tracery then:
//!
//! 1. lowers the schema through two intermediate representations down to a
//!    residual *arithmetic intermediate representation* (AIR) whose
//!    constraints are pure vanishing polynomial identities and range checks
//!    ([compile]);
//! 2. *expands* the trace by synthesizing every computed column the lowering
//!    introduced — byte decompositions, deltas, sorted permutations,
//!    selector bits;
//! 3. accepts or rejects the expanded trace by evaluating every constraint
//!    on every row, in concurrent batches when the `concurrent` feature is
//!    enabled ([check]).
//!
//! High-level schemas are built directly through [hir::Schema] or ingested
//! from the JSON binary-file format via the [binfile] module.

pub use ir::{air, hir, mir, SortedPermutationDecl};
pub use schema::{
    assignment, constraint, CheckOptions, ColumnDecl, ColumnType, Error, Failure, StructuralError,
};
pub use trace::{felt, Bounds, Column, Context, RawColumn, Trace, TraceError};

pub mod binfile;

#[cfg(test)]
mod tests;

// PIPELINE
// ================================================================================================

/// Compiles a high-level schema down to its residual AIR form.
pub fn compile(schema: &hir::Schema, options: &CheckOptions) -> Result<air::Schema, StructuralError> {
    schema.lower_to_mir()?.lower_to_air(options)
}

/// Expands a trace against a compiled schema and checks every constraint,
/// returning the first structural defect or constraint failure.
pub fn check(schema: &air::Schema, trace: &mut Trace, options: &CheckOptions) -> Result<(), Error> {
    schema.expand_trace(trace)?;
    schema.accepts(options, trace)
}
