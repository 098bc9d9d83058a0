// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

// CONSTANTS
// ================================================================================================

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_MAX_DEGREE: usize = 8;

const MAX_BATCH_SIZE: usize = 1024;
const MIN_MAX_DEGREE: usize = 2;

// CHECK OPTIONS
// ================================================================================================

/// Parameters controlling schema lowering and trace acceptance.
///
/// * `batch_size` is the number of constraints checked together by the
///   acceptor; within a batch constraints are checked in parallel when the
///   `concurrent` feature is enabled.
/// * `max_degree` is the maximum polynomial degree of any residual vanishing
///   constraint; lowering splits larger expressions into intermediate
///   columns.
/// * `type_checks` enables enforcement of declared column types during
///   acceptance. This is off by default as a column's type is frequently
///   implied by other constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckOptions {
    batch_size: usize,
    max_degree: usize,
    type_checks: bool,
}

impl CheckOptions {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new set of options.
    ///
    /// # Panics
    /// Panics if:
    /// * `batch_size` is zero or greater than 1024.
    /// * `max_degree` is smaller than 2.
    pub fn new(batch_size: usize, max_degree: usize, type_checks: bool) -> Self {
        assert!(
            batch_size > 0 && batch_size <= MAX_BATCH_SIZE,
            "batch size must be in the range [1, {MAX_BATCH_SIZE}], but was {batch_size}"
        );
        assert!(
            max_degree >= MIN_MAX_DEGREE,
            "maximum degree must be at least {MIN_MAX_DEGREE}, but was {max_degree}"
        );
        CheckOptions {
            batch_size,
            max_degree,
            type_checks,
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the number of constraints checked per acceptor batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the maximum residual constraint degree.
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Returns true if declared column types are enforced during acceptance.
    pub fn type_checks(&self) -> bool {
        self.type_checks
    }

    /// Returns a copy of these options with type checking enabled.
    pub fn with_type_checks(mut self) -> Self {
        self.type_checks = true;
        self
    }
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions::new(DEFAULT_BATCH_SIZE, DEFAULT_MAX_DEGREE, false)
    }
}
