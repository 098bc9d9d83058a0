// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{Context, Trace};

use super::Constraint;
use crate::{Failure, Testable};

// PROPERTY ASSERTION
// ================================================================================================

/// An arbitrary property which should hold on every acceptable trace.
///
/// An assertion has the same shape as a vanishing constraint but is advisory:
/// it is checked by the acceptor yet it is not part of the constraint system
/// a prover would have to satisfy, and it is therefore never lowered.
#[derive(Clone, Debug)]
pub struct PropertyAssertion<T: Testable> {
    handle: String,
    context: Context,
    property: T,
}

impl<T: Testable> PropertyAssertion<T> {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new property assertion.
    pub fn new(handle: impl Into<String>, context: Context, property: T) -> Self {
        PropertyAssertion {
            handle: handle.into(),
            context,
            property,
        }
    }

    /// Returns the handle of this assertion.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns the evaluation context of this assertion.
    pub fn context(&self) -> Context {
        self.context
    }

    /// Returns the asserted property.
    pub fn property(&self) -> &T {
        &self.property
    }
}

impl<T: Testable> Constraint for PropertyAssertion<T> {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        let height = trace.height(self.context);
        for row in 0..height {
            if !self.property.test_at(row as isize, trace) {
                return Err(Failure::Assertion {
                    handle: self.handle.clone(),
                    row,
                });
            }
        }
        Ok(())
    }
}

impl<T: Testable> fmt::Display for PropertyAssertion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(assert {} {})", self.handle, self.property)
    }
}
