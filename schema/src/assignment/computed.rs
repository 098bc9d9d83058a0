// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{Column, Trace};

use super::Assignment;
use crate::{ColumnDecl, Evaluable, StructuralError};

// COMPUTED COLUMN
// ================================================================================================

/// A column whose values are computed by evaluating an expression on every
/// row during trace expansion.
///
/// The column's front-padding value is obtained by evaluating the expression
/// at row -1, where every access resolves to the padding of the accessed
/// column.
#[derive(Clone, Debug)]
pub struct ComputedColumn<E: Evaluable> {
    column: [ColumnDecl; 1],
    expr: E,
}

impl<E: Evaluable + Clone + 'static> ComputedColumn<E> {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new computed column filled by the specified expression.
    pub fn new(column: ColumnDecl, expr: E) -> Self {
        ComputedColumn { column: [column], expr }
    }

    /// Returns the expression which fills this column.
    pub fn expr(&self) -> &E {
        &self.expr
    }
}

impl<E: Evaluable + Clone + 'static> Assignment for ComputedColumn<E> {
    fn columns(&self) -> &[ColumnDecl] {
        &self.column
    }

    fn dependencies(&self) -> Vec<String> {
        let mut deps = Vec::new();
        self.expr.collect_dependencies(&mut deps);
        deps.sort();
        deps.dedup();
        deps
    }

    fn required_spillage(&self) -> usize {
        // padding is only ever inserted at the front of a trace, so the
        // forward shift determines how much spillage the computation needs
        self.expr.bounds().end
    }

    fn compute_columns(&self, trace: &Trace) -> Result<Vec<Column>, StructuralError> {
        let decl = &self.column[0];
        let height = trace.height(decl.context());
        let data = (0..height).map(|row| self.expr.eval_at(row as isize, trace)).collect();
        let padding = self.expr.eval_at(-1, trace);
        Ok(vec![Column::new(decl.context(), decl.name(), data, padding)])
    }

    fn clone_box(&self) -> Box<dyn Assignment> {
        Box::new(self.clone())
    }
}

impl<E: Evaluable> fmt::Display for ComputedColumn<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(compute {} {})", self.column[0].name(), self.expr)
    }
}
