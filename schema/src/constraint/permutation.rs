// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::Trace;

use super::Constraint;
use crate::{util, Failure};

// PERMUTATION CONSTRAINT
// ================================================================================================

/// A constraint declaring that the rows of the target columns are a
/// permutation of the rows of the source columns.
///
/// The check is per column pair: each target column must be a multiset
/// permutation of its source column.
#[derive(Clone, Debug)]
pub struct PermutationConstraint {
    handle: String,
    targets: Vec<String>,
    sources: Vec<String>,
}

impl PermutationConstraint {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new permutation constraint.
    ///
    /// # Panics
    /// Panics if the number of targets differs from the number of sources.
    pub fn new(handle: impl Into<String>, targets: Vec<String>, sources: Vec<String>) -> Self {
        assert_eq!(
            targets.len(),
            sources.len(),
            "a permutation must relate as many targets as sources"
        );
        PermutationConstraint {
            handle: handle.into(),
            targets,
            sources,
        }
    }

    /// Returns the handle of this constraint.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    fn check_permutation(&self, trace: &Trace) -> Result<(), Failure> {
        for (target, source) in self.targets.iter().zip(self.sources.iter()) {
            let dst = trace.column_by_name(target);
            let src = trace.column_by_name(source);
            let (dst, src) = match (dst, src) {
                (Some(dst), Some(src)) => (dst, src),
                // missing columns surface as structural errors upstream
                _ => continue,
            };
            if !util::is_permutation_of(dst.data(), src.data()) {
                return Err(Failure::Permutation {
                    handle: self.handle.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Constraint for PermutationConstraint {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        self.check_permutation(trace)
    }
}

impl fmt::Display for PermutationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(permute ({}) ({}))", self.targets.join(" "), self.sources.join(" "))
    }
}

// SORTED PERMUTATION CONSTRAINT
// ================================================================================================

/// A permutation constraint whose target columns must additionally be sorted
/// lexicographically, honoring a per-column sign (true for ascending).
#[derive(Clone, Debug)]
pub struct SortedConstraint {
    permutation: PermutationConstraint,
    signs: Vec<bool>,
}

impl SortedConstraint {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new sorted permutation constraint.
    ///
    /// # Panics
    /// Panics if the numbers of targets, signs, and sources do not agree.
    pub fn new(
        handle: impl Into<String>,
        targets: Vec<String>,
        signs: Vec<bool>,
        sources: Vec<String>,
    ) -> Self {
        assert_eq!(
            targets.len(),
            signs.len(),
            "a sorted permutation must carry one sign per target"
        );
        SortedConstraint {
            permutation: PermutationConstraint::new(handle, targets, sources),
            signs,
        }
    }

    /// Returns the handle of this constraint.
    pub fn handle(&self) -> &str {
        self.permutation.handle()
    }
}

impl Constraint for SortedConstraint {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        self.permutation.check_permutation(trace)?;
        let cols: Vec<&[trace::felt::Felt]> = self
            .permutation
            .targets
            .iter()
            .filter_map(|name| trace.column_by_name(name).map(|col| col.data()))
            .collect();
        if cols.len() != self.permutation.targets.len() {
            return Ok(());
        }
        if let Some(row) = util::first_unsorted_row(&cols, &self.signs) {
            return Err(Failure::Sorting {
                handle: self.handle().to_string(),
                row,
            });
        }
        Ok(())
    }
}

impl fmt::Display for SortedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self
            .permutation
            .sources
            .iter()
            .zip(self.signs.iter())
            .map(|(name, &sign)| if sign { format!("+{name}") } else { format!("-{name}") })
            .collect();
        write!(
            f,
            "(permute ({}) ({}))",
            self.permutation.targets.join(" "),
            sources.join(" ")
        )
    }
}
