// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Assignments and trace expansion.
//!
//! An *assignment* declares one or more computed columns together with the
//! procedure which fills them from a trace. Assignments form a DAG through
//! their declared dependencies; declaration order is the topological order,
//! so [expand_trace] simply executes them front to back.

use core::fmt;

use tracing::info_span;

use trace::{Column, Trace};

use crate::{ColumnDecl, StructuralError};

mod computed;
pub use computed::ComputedColumn;

mod byte_decomposition;
pub use byte_decomposition::ByteDecomposition;

mod lexicographic;
pub use lexicographic::LexicographicSort;

mod sorted;
pub use sorted::SortedPermutation;

#[cfg(test)]
mod tests;

// ASSIGNMENT
// ================================================================================================

/// A declaration of one or more computed columns.
pub trait Assignment: fmt::Display + Send + Sync {
    /// Returns the columns declared by this assignment.
    fn columns(&self) -> &[ColumnDecl];

    /// Returns the names of the columns this assignment reads from.
    fn dependencies(&self) -> Vec<String>;

    /// Returns the minimum number of extra front rows needed so that the row
    /// shifts of this assignment's expressions never escape the trace.
    fn required_spillage(&self) -> usize;

    /// Computes the values of this assignment's columns from the trace.
    fn compute_columns(&self, trace: &Trace) -> Result<Vec<Column>, StructuralError>;

    /// Returns a boxed copy of this assignment.
    fn clone_box(&self) -> Box<dyn Assignment>;
}

impl Clone for Box<dyn Assignment> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// TRACE EXPANSION
// ================================================================================================

/// Expands a trace by executing the specified assignments in declaration
/// order.
///
/// Before any assignment runs, every column of the trace is front-padded by
/// the overall spillage (at least one row). Expansion is idempotent: padding
/// is skipped when the trace already records the required spillage, and an
/// assignment whose target columns are all present is skipped as well. A
/// partially-present target set, or a target clashing with an existing
/// column, is a structural error.
pub fn expand_trace(
    assignments: &[Box<dyn Assignment>],
    trace: &mut Trace,
) -> Result<(), StructuralError> {
    let spillage = required_spillage(assignments);
    let _span = info_span!("expand_trace", num_assignments = assignments.len(), spillage).entered();
    if trace.spillage() < spillage {
        trace.pad(spillage - trace.spillage());
    }
    for assignment in assignments {
        let present = assignment
            .columns()
            .iter()
            .filter(|decl| trace.has_column(decl.name()))
            .count();
        if present == assignment.columns().len() {
            // already expanded
            continue;
        } else if present > 0 {
            let name = assignment.columns()[0].name().to_string();
            return Err(StructuralError::DuplicateColumn(name));
        }
        for dep in assignment.dependencies() {
            if !trace.has_column(&dep) {
                let name = assignment.columns()[0].name().to_string();
                return Err(StructuralError::MissingDependency(name, dep));
            }
        }
        for column in assignment.compute_columns(trace)? {
            trace.add_column(column)?;
        }
    }
    Ok(())
}

/// Returns the overall spillage of a set of assignments: the maximum of the
/// individual requirements and one (the initial padding row).
pub fn required_spillage(assignments: &[Box<dyn Assignment>]) -> usize {
    assignments
        .iter()
        .map(|a| a.required_spillage())
        .fold(1, usize::max)
}
