// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Constraint containers.
//!
//! Every container is generic over the expression language it constrains, so
//! the same types serve all three IR levels. The object-safe [Constraint]
//! trait erases the containers for the batched acceptor.

use core::fmt;

use trace::Trace;

use crate::Failure;

mod vanishing;
pub use vanishing::VanishingConstraint;

mod range;
pub use range::RangeConstraint;

mod permutation;
pub use permutation::{PermutationConstraint, SortedConstraint};

mod lookup;
pub use lookup::LookupConstraint;

mod property;
pub use property::PropertyAssertion;

#[cfg(test)]
mod tests;

// CONSTRAINT
// ================================================================================================

/// A predicate over an entire trace.
///
/// Constraints are independent of one another; the acceptor checks them in
/// concurrent batches over a shared immutable borrow of the trace.
pub trait Constraint: fmt::Display + Send + Sync {
    /// Checks whether this constraint holds on every row of the trace,
    /// returning the first failure if it does not.
    fn accepts(&self, trace: &Trace) -> Result<(), Failure>;
}
