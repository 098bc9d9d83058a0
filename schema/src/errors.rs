// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{felt::Felt, TraceError};

// STRUCTURAL ERROR
// ================================================================================================
/// Represents an error returned when a schema is malformed or a trace does
/// not have the shape a schema requires.
///
/// Structural errors abort the containing phase immediately; they are never
/// recovered internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// This error occurs when two columns with the same name are declared.
    DuplicateColumn(String),
    /// This error occurs when a trace does not contain a column required by
    /// the schema.
    MissingColumn(String),
    /// This error occurs when an assignment is executed before one of the
    /// columns it depends on has been computed.
    MissingDependency(String, String),
    /// This error occurs when a constraint mixes columns from distinct
    /// modules.
    ConflictingContext(String),
    /// This error occurs when a bitwidth gadget is applied with a width which
    /// is not a multiple of eight.
    NonAlignedBitwidth(u32),
    /// This error occurs when a bitwidth gadget is applied with a width of
    /// zero.
    ZeroBitwidth(String),
    /// This error occurs when an expression does not have the shape required
    /// by a lowering rule, such as an `if` condition containing a list, or a
    /// lookup argument which does not lower to a single expression.
    MalformedExpression(String),
    /// This error occurs when a constraint's polynomial degree exceeds the
    /// configured maximum and no subterm can be split out to reduce it.
    DegreeOverflow(String, usize, usize),
    /// A structural defect reported by the trace storage layer.
    Trace(TraceError),
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateColumn(name) => {
                write!(f, "column {name} is declared more than once")
            },
            Self::MissingColumn(name) => {
                write!(f, "trace missing column {name}")
            },
            Self::MissingDependency(name, dep) => {
                write!(f, "column {name} depends on column {dep} which has not been computed")
            },
            Self::ConflictingContext(handle) => {
                write!(f, "constraint {handle} mixes columns from distinct modules")
            },
            Self::NonAlignedBitwidth(nbits) => {
                write!(f, "bitwidth must be a multiple of 8, but was {nbits}")
            },
            Self::ZeroBitwidth(name) => {
                write!(f, "column {name} has a bitwidth of zero")
            },
            Self::MalformedExpression(what) => {
                write!(f, "malformed expression: {what}")
            },
            Self::DegreeOverflow(handle, degree, max) => {
                write!(f, "constraint {handle} has degree {degree} which exceeds the maximum of {max} and cannot be reduced")
            },
            Self::Trace(err) => {
                write!(f, "{err}")
            },
        }
    }
}

impl core::error::Error for StructuralError {}

impl From<TraceError> for StructuralError {
    fn from(err: TraceError) -> Self {
        StructuralError::Trace(err)
    }
}

// CONSTRAINT FAILURE
// ================================================================================================
/// Represents a constraint which does not hold on a trace.
///
/// Unlike structural errors, constraint failures are about values: every
/// expression evaluation is total, so a failure always points at a concrete
/// constraint and (where meaningful) a concrete row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A vanishing constraint evaluated to a non-zero value at the given row.
    Vanishing { handle: String, row: usize },
    /// A range constraint evaluated to a value at or above its bound.
    Range {
        handle: String,
        row: usize,
        value: Felt,
        bound: Felt,
    },
    /// The target columns of a permutation are not a permutation of its
    /// source columns.
    Permutation { handle: String },
    /// The target columns of a sorted permutation are not lexicographically
    /// sorted; `row` is the first out-of-order row.
    Sorting { handle: String, row: usize },
    /// A column value lies outside the column's declared type.
    Type {
        column: String,
        row: usize,
        value: Felt,
    },
    /// A property assertion evaluated to a non-zero value at the given row.
    Assertion { handle: String, row: usize },
    /// A source row of a lookup does not occur among the target rows.
    Lookup { handle: String, row: usize },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vanishing { handle, row } => {
                write!(f, "constraint {handle} does not vanish at row {row}")
            },
            Self::Range { handle, row, value, bound } => {
                write!(f, "expression {handle} is out of range at row {row} ({value} >= {bound})")
            },
            Self::Permutation { handle } => {
                write!(f, "columns {handle} are not a permutation of their sources")
            },
            Self::Sorting { handle, row } => {
                write!(f, "columns {handle} are out of order at row {row}")
            },
            Self::Type { column, row, value } => {
                write!(f, "column {column} value {value} is out of bounds at row {row}")
            },
            Self::Assertion { handle, row } => {
                write!(f, "property {handle} does not hold at row {row}")
            },
            Self::Lookup { handle, row } => {
                write!(f, "lookup {handle} has no matching target for source row {row}")
            },
        }
    }
}

impl core::error::Error for Failure {}

// CHECK ERROR
// ================================================================================================
/// The error type of the public checking entry points, distinguishing
/// structural defects from constraint failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The schema or trace is malformed.
    Structural(StructuralError),
    /// A constraint does not hold on the trace.
    Constraint(Failure),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(err) => write!(f, "{err}"),
            Self::Constraint(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<StructuralError> for Error {
    fn from(err: StructuralError) -> Self {
        Error::Structural(err)
    }
}

impl From<Failure> for Error {
    fn from(err: Failure) -> Self {
        Error::Constraint(err)
    }
}
