// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{felt::Felt, Context, Trace};

use super::Constraint;
use crate::{Evaluable, Failure};

// RANGE CONSTRAINT
// ================================================================================================

/// A constraint requiring an expression's value, read as an unsigned integer
/// in its canonical representation, to lie strictly below a bound on every
/// row.
///
/// Any bound is supported; lowering chooses the realization (binarity, byte
/// decomposition, or a residual range check) based on the bound's shape.
#[derive(Clone, Debug)]
pub struct RangeConstraint<E: Evaluable> {
    handle: String,
    context: Context,
    expr: E,
    bound: Felt,
}

impl<E: Evaluable> RangeConstraint<E> {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new range constraint.
    pub fn new(handle: impl Into<String>, context: Context, expr: E, bound: Felt) -> Self {
        RangeConstraint {
            handle: handle.into(),
            context,
            expr,
            bound,
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the handle of this constraint.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns the evaluation context of this constraint.
    pub fn context(&self) -> Context {
        self.context
    }

    /// Returns the constrained expression.
    pub fn expr(&self) -> &E {
        &self.expr
    }

    /// Returns the exclusive upper bound of this constraint.
    pub fn bound(&self) -> Felt {
        self.bound
    }

    /// Returns true if the bound of this constraint is at most the specified
    /// value.
    pub fn bounded_at_most(&self, bound: u64) -> bool {
        self.bound <= Felt::from(bound)
    }
}

impl<E: Evaluable> Constraint for RangeConstraint<E> {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        let height = trace.height(self.context);
        for row in 0..height {
            let value = self.expr.eval_at(row as isize, trace);
            if value >= self.bound {
                return Err(Failure::Range {
                    handle: self.handle.clone(),
                    row,
                    value,
                    bound: self.bound,
                });
            }
        }
        Ok(())
    }
}

impl<E: Evaluable> fmt::Display for RangeConstraint<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(definrange {} {})", self.expr, self.bound)
    }
}
