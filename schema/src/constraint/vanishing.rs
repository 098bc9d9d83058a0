// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{Context, Trace};

use super::Constraint;
use crate::{Failure, Testable};

// VANISHING CONSTRAINT
// ================================================================================================

/// A constraint requiring an expression to evaluate to zero on a set of rows.
///
/// With no domain the expression must vanish on every row of the constraint's
/// context; with a domain it must vanish on a single row, where a negative
/// row counts from the end of the trace (so a domain of -1 selects the last
/// row).
#[derive(Clone, Debug)]
pub struct VanishingConstraint<T: Testable> {
    handle: String,
    context: Context,
    domain: Option<isize>,
    expr: T,
}

impl<T: Testable> VanishingConstraint<T> {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new vanishing constraint.
    pub fn new(handle: impl Into<String>, context: Context, domain: Option<isize>, expr: T) -> Self {
        VanishingConstraint {
            handle: handle.into(),
            context,
            domain,
            expr,
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

    /// Returns the row domain of this constraint.
    pub fn domain(&self) -> Option<isize> {
        self.domain
    }

    /// Returns the constrained expression.
    pub fn expr(&self) -> &T {
        &self.expr
    }
}

impl<T: Testable> Constraint for VanishingConstraint<T> {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        let height = trace.height(self.context);
        let fail = |row: usize| Failure::Vanishing {
            handle: self.handle.clone(),
            row,
        };
        match self.domain {
            None => {
                for row in 0..height {
                    if !self.expr.test_at(row as isize, trace) {
                        return Err(fail(row));
                    }
                }
            },
            Some(domain) => {
                let row = if domain < 0 {
                    let offset = domain.unsigned_abs();
                    if offset > height {
                        return Ok(());
                    }
                    height - offset
                } else {
                    domain as usize
                };
                if row < height && !self.expr.test_at(row as isize, trace) {
                    return Err(fail(row));
                }
            },
        }
        Ok(())
    }
}

impl<T: Testable> fmt::Display for VanishingConstraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.domain {
            None => write!(f, "(vanish {} {})", self.handle, self.expr),
            Some(d) => write!(f, "(vanish:{d} {} {})", self.handle, self.expr),
        }
    }
}
