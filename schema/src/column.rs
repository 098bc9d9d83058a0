// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{felt, felt::Felt, Context, Trace};

use crate::{constraint::Constraint, Failure};

// COLUMN TYPE
// ================================================================================================

/// The logical type of a column.
///
/// A `uint(n)` column is expected to hold values in `[0, 2^n)`; the
/// expectation is enforced only when type checking is enabled, as the bound
/// is frequently implied by other constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// An unconstrained field element.
    Field,
    /// An unsigned integer of the specified bitwidth.
    Uint(u32),
}

impl ColumnType {
    /// Returns the exclusive upper bound of this type, or `None` for field
    /// columns.
    pub fn bound(&self) -> Option<Felt> {
        match self {
            Self::Field => None,
            Self::Uint(nbits) => Some(felt::two_pow(*nbits)),
        }
    }

    /// Returns the bitwidth of this type, or `None` for field columns.
    pub fn bitwidth(&self) -> Option<u32> {
        match self {
            Self::Field => None,
            Self::Uint(nbits) => Some(*nbits),
        }
    }

    /// Returns true if the specified value inhabits this type.
    pub fn accepts(&self, value: &Felt) -> bool {
        match self.bound() {
            None => true,
            Some(bound) => *value < bound,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::Uint(nbits) => write!(f, "u{nbits}"),
        }
    }
}

// COLUMN DECLARATION
// ================================================================================================

/// A schema-level column declaration.
///
/// `synthetic` columns are created by the compiler (byte decompositions,
/// deltas, selectors, witness columns); all other columns are supplied by the
/// user. A `must_prove` column requests an explicit range constraint for its
/// type during lowering, rather than relying on the optional type check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDecl {
    context: Context,
    name: String,
    ty: ColumnType,
    must_prove: bool,
    synthetic: bool,
}

impl ColumnDecl {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Returns a declaration of a user-supplied column.
    pub fn new(context: Context, name: impl Into<String>, ty: ColumnType) -> Self {
        ColumnDecl {
            context,
            name: name.into(),
            ty,
            must_prove: false,
            synthetic: false,
        }
    }

    /// Returns a declaration of a compiler-created column.
    pub fn synthetic(context: Context, name: impl Into<String>, ty: ColumnType) -> Self {
        ColumnDecl {
            context,
            name: name.into(),
            ty,
            must_prove: false,
            synthetic: true,
        }
    }

    /// Marks this column as requiring an explicit range constraint for its
    /// type.
    pub fn with_proof(mut self) -> Self {
        self.must_prove = true;
        self
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the evaluation context of this column.
    pub fn context(&self) -> Context {
        self.context
    }

    /// Returns the name of this column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the logical type of this column.
    pub fn ty(&self) -> ColumnType {
        self.ty
    }

    /// Returns true if this column's type must be proven with an explicit
    /// constraint.
    pub fn must_prove(&self) -> bool {
        self.must_prove
    }

    /// Returns true if this column was created by the compiler.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

impl fmt::Display for ColumnDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            ColumnType::Field => write!(f, "(column {})", self.name),
            ty => write!(f, "(column {} :{ty})", self.name),
        }
    }
}

// TYPED COLUMN CONSTRAINT
// ================================================================================================

/// Enforces a column's declared type over an entire trace.
///
/// Instances of this constraint are produced on demand when type checking is
/// enabled; the declaration itself carries no enforcement.
#[derive(Clone, Debug)]
pub struct TypedColumn(pub ColumnDecl);

impl Constraint for TypedColumn {
    fn accepts(&self, trace: &Trace) -> Result<(), Failure> {
        let decl = &self.0;
        let column = match trace.column_by_name(decl.name()) {
            Some(column) => column,
            None => return Ok(()),
        };
        for (row, value) in column.data().iter().enumerate() {
            if !decl.ty().accepts(value) {
                return Err(Failure::Type {
                    column: decl.name().to_string(),
                    row,
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for TypedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::{ColumnDecl, ColumnType, TypedColumn};
    use crate::{constraint::Constraint, Failure};
    use trace::{felt::Felt, Context, RawColumn, Trace};

    #[test]
    fn uint_bounds() {
        let ty = ColumnType::Uint(8);
        assert!(ty.accepts(&Felt::from(255u64)));
        assert!(!ty.accepts(&Felt::from(256u64)));
        assert!(ColumnType::Field.accepts(&-Felt::from(1u64)));
    }

    #[test]
    fn typed_column_reports_first_bad_row() {
        let trace = Trace::from_columns(
            1,
            vec![RawColumn::new(
                0,
                "X",
                vec![Felt::from(1u64), Felt::from(300u64)],
                Felt::from(0u64),
            )],
        )
        .unwrap();
        let decl = ColumnDecl::new(Context::new(0, 1), "X", ColumnType::Uint(8));
        let failure = TypedColumn(decl).accepts(&trace).unwrap_err();
        assert_eq!(
            Failure::Type {
                column: "X".to_string(),
                row: 1,
                value: Felt::from(300u64)
            },
            failure
        );
    }
}
