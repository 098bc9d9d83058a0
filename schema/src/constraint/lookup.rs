// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;
use std::collections::HashSet;

use trace::{felt::Felt, Context, Trace};

use super::Constraint;
use crate::{Evaluable, Failure};

// LOOKUP CONSTRAINT
// ================================================================================================

/// A constraint requiring every source row tuple to occur among the target
/// row tuples.
///
/// Sources and targets may live in different modules; each side is evaluated
/// over the height of its own context.
#[derive(Clone, Debug)]
pub struct LookupConstraint<E: Evaluable> {
    handle: String,
    source_context: Context,
    target_context: Context,
    sources: Vec<E>,
    targets: Vec<E>,
}

impl<E: Evaluable> LookupConstraint<E> {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new lookup constraint.
    ///
    /// # Panics
    /// Panics if the number of sources differs from the number of targets.
    pub fn new(
        handle: impl Into<String>,
        source_context: Context,
        target_context: Context,
        sources: Vec<E>,
        targets: Vec<E>,
    ) -> Self {
        assert_eq!(
            sources.len(),
            targets.len(),
            "a lookup must relate as many sources as targets"
        );
        LookupConstraint {
            handle: handle.into(),
            source_context,
            target_context,
            sources,
            targets,
        }
    }

    /// Returns the handle of this constraint.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns the source expressions of this constraint.
    pub fn sources(&self) -> &[E] {
        &self.sources
    }

    /// Returns the target expressions of this constraint.
    pub fn targets(&self) -> &[E] {
        &self.targets
    }

    /// Returns the source and target contexts of this constraint.
    pub fn contexts(&self) -> (Context, Context) {
        (self.source_context, self.target_context)
    }
}

impl<E: Evaluable> Constraint for LookupConstraint<E> {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        let eval_row = |exprs: &[E], row: usize| -> Vec<Felt> {
            exprs.iter().map(|e| e.eval_at(row as isize, trace)).collect()
        };
        let targets: HashSet<Vec<Felt>> = (0..trace.height(self.target_context))
            .map(|row| eval_row(&self.targets, row))
            .collect();
        for row in 0..trace.height(self.source_context) {
            if !targets.contains(&eval_row(&self.sources, row)) {
                return Err(Failure::Lookup {
                    handle: self.handle.clone(),
                    row,
                });
            }
        }
        Ok(())
    }
}

impl<E: Evaluable> fmt::Display for LookupConstraint<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |exprs: &[E]| {
            exprs.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(" ")
        };
        write!(f, "(lookup {} ({}) ({}))", self.handle, join(&self.sources), join(&self.targets))
    }
}
