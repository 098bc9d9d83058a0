// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! This crate contains the schema layer of the tracery constraint checker.
//!
//! A *schema* declares the columns of a trace together with the constraints
//! those columns must satisfy and the *assignments* which synthesize computed
//! columns during trace expansion. The expression languages themselves live
//! in the `ir` crate; this crate is parameterized over them through the
//! [Evaluable] and [Testable] traits, mirroring how the containers here are
//! shared by all three IR levels.
//!
//! The two entry points are [expand_trace](assignment::expand_trace), which
//! materializes computed columns in dependency order, and
//! [accepts](acceptor::accepts), which evaluates a set of constraints against
//! a trace in concurrent batches.

use core::fmt;

use trace::{felt::Felt, Bounds, Context, Trace};

pub mod acceptor;
pub mod assignment;
pub mod constraint;

mod column;
pub use column::{ColumnDecl, ColumnType, TypedColumn};

mod errors;
pub use errors::{Error, Failure, StructuralError};

mod options;
pub use options::CheckOptions;

pub mod util;

// TRAITS
// ================================================================================================

/// Resolves column names to the contexts in which they were declared.
///
/// Implemented by every IR schema; used to compute the context of an
/// expression as the join of the contexts of its column accesses.
pub trait ContextResolver {
    /// Returns the context of the named column, or `None` if the column is
    /// not declared.
    fn context_of(&self, name: &str) -> Option<Context>;
}

/// A single-valued expression which can be evaluated at any row of a trace.
///
/// Evaluation is total: out-of-bounds accesses are satisfied by column
/// padding, so evaluation never fails.
pub trait Evaluable: fmt::Display + Send + Sync {
    /// Evaluates this expression at the specified row of the trace.
    fn eval_at(&self, row: isize, trace: &Trace) -> Felt;

    /// Returns the maximum backward and forward row shifts reachable from
    /// this expression.
    fn bounds(&self) -> Bounds;

    /// Returns the evaluation context of this expression.
    fn context(&self, resolver: &dyn ContextResolver) -> Context;

    /// Collects the names of all columns accessed by this expression.
    fn collect_dependencies(&self, deps: &mut Vec<String>);
}

/// A (possibly multi-valued) expression which can be tested for vanishing at
/// any row of a trace.
///
/// This is the shape required by vanishing constraints: at the high level an
/// expression may evaluate to several values (lists), every one of which must
/// be zero; undefined values are taken to hold.
pub trait Testable: fmt::Display + Send + Sync {
    /// Returns true if every value of this expression vanishes at the
    /// specified row of the trace.
    fn test_at(&self, row: isize, trace: &Trace) -> bool;

    /// Returns the maximum backward and forward row shifts reachable from
    /// this expression.
    fn bounds(&self) -> Bounds;

    /// Returns the evaluation context of this expression.
    fn context(&self, resolver: &dyn ContextResolver) -> Context;
}
