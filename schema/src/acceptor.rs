// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The batched constraint acceptor.
//!
//! Constraints are independent predicates over a shared immutable trace, so
//! they can be checked in any order and in parallel. The acceptor partitions
//! them into batches; all constraints of a batch are checked before the next
//! batch begins, and the first failing batch stops the run. Within a batch
//! the failure with the smallest declaration index wins, which keeps the
//! result deterministic regardless of scheduling.

#[cfg(feature = "concurrent")]
use rayon::prelude::*;
use tracing::{event, info_span, Level};

use trace::Trace;

use crate::{constraint::Constraint, CheckOptions, Failure};

// ACCEPTOR
// ================================================================================================

/// Checks whether a trace satisfies all of the specified constraints,
/// returning the first failure if it does not.
///
/// When the `concurrent` feature is enabled, the constraints of each batch
/// are checked on the rayon thread pool; every launched check runs to
/// completion even when another check of the same batch has already failed.
pub fn accepts(
    options: &CheckOptions,
    constraints: &[&dyn Constraint],
    trace: &Trace,
) -> Result<(), Failure> {
    for (batch_idx, batch) in constraints.chunks(options.batch_size()).enumerate() {
        let span = info_span!("check_batch", batch = batch_idx, size = batch.len()).entered();
        let failure = check_batch(batch, trace);
        drop(span);
        if let Some(failure) = failure {
            event!(Level::DEBUG, "constraint batch {batch_idx} failed: {failure}");
            return Err(failure);
        }
    }
    Ok(())
}

// HELPER FUNCTIONS
// ================================================================================================

/// Checks a single batch of constraints, returning the failure with the
/// smallest declaration index, if any.
#[cfg(feature = "concurrent")]
fn check_batch(batch: &[&dyn Constraint], trace: &Trace) -> Option<Failure> {
    batch
        .par_iter()
        .enumerate()
        .filter_map(|(idx, constraint)| constraint.accepts(trace).err().map(|f| (idx, f)))
        .min_by_key(|(idx, _)| *idx)
        .map(|(_, failure)| failure)
}

/// Checks a single batch of constraints, returning the failure with the
/// smallest declaration index, if any.
#[cfg(not(feature = "concurrent"))]
fn check_batch(batch: &[&dyn Constraint], trace: &Trace) -> Option<Failure> {
    batch
        .iter()
        .find_map(|constraint| constraint.accepts(trace).err())
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use core::fmt;

    use super::accepts;
    use crate::{constraint::Constraint, CheckOptions, Failure};
    use trace::Trace;

    /// A constraint which either holds everywhere or fails at row zero.
    struct Fails(Option<&'static str>);

    impl Constraint for Fails {
        fn accepts(&self, _trace: &Trace) -> Result<(), Failure> {
            match self.0 {
                None => Ok(()),
                Some(handle) => Err(Failure::Vanishing { handle: handle.to_string(), row: 0 }),
            }
        }
    }

    impl fmt::Display for Fails {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "(fails {:?})", self.0)
        }
    }

    #[test]
    fn first_failure_by_declaration_index_wins() {
        let trace = Trace::new(1);
        let a = Fails(None);
        let b = Fails(Some("b"));
        let c = Fails(Some("c"));
        let constraints: Vec<&dyn Constraint> = vec![&a, &b, &c];
        let options = CheckOptions::default();
        assert_eq!(
            Err(Failure::Vanishing { handle: "b".to_string(), row: 0 }),
            accepts(&options, &constraints, &trace)
        );
    }

    #[test]
    fn empty_constraint_set_accepts() {
        let trace = Trace::new(1);
        assert_eq!(Ok(()), accepts(&CheckOptions::default(), &[], &trace));
    }
}
