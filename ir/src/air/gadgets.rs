// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Schema-rewrite gadgets.
//!
//! A gadget is a pure schema transform which installs the synthetic columns,
//! assignments, and low-level constraints implementing a high-level
//! predicate: binarity, bitwidth (via byte decomposition), single-column
//! sortedness, and lexicographic sortedness across several columns.

use schema::{
    assignment::{Assignment, ByteDecomposition, ComputedColumn, LexicographicSort},
    ColumnDecl, ColumnType, StructuralError,
};
use trace::{felt, Context};

use super::{Expr, Schema};
use crate::mir;

// BINARITY GADGET
// ================================================================================================

/// Constrains all values of the given column to be zero or one by emitting
/// the vanishing constraint `X·(X−1) = 0`.
pub fn apply_binarity_gadget(schema: &mut Schema, col: &str) -> Result<(), StructuralError> {
    let x = Expr::column(col);
    let x_m1 = Expr::Sub(vec![x.clone(), Expr::constant(1)]);
    schema.add_vanishing_constraint(col, None, Expr::Mul(vec![x, x_m1]))
}

// BITWIDTH GADGET
// ================================================================================================

/// Constrains all values of the given column to fit within `nbits` bits.
///
/// This is implemented as a byte decomposition: `n = nbits/8` synthetic
/// columns `X:0 … X:n−1` are added, each range-constrained to `[0, 256)`,
/// together with the vanishing constraint `X = Σᵢ X:i · 256ⁱ` and the
/// assignment which fills the byte columns during trace expansion. Widths
/// which are not a multiple of eight are rejected.
pub fn apply_bitwidth_gadget(
    schema: &mut Schema,
    col: &str,
    nbits: u32,
) -> Result<(), StructuralError> {
    if nbits == 0 {
        return Err(StructuralError::ZeroBitwidth(col.to_string()));
    } else if nbits % 8 != 0 {
        return Err(StructuralError::NonAlignedBitwidth(nbits));
    }
    let context = context_of(schema, col)?;
    let n = nbits / 8;
    let fr256 = felt::two_pow(8);
    let mut coefficient = trace::felt::Felt::from(1u64);
    let mut terms = Vec::with_capacity(n as usize);
    for i in 0..n {
        let name = format!("{col}:{i}");
        schema.add_column(ColumnDecl::synthetic(context, &name, ColumnType::Uint(8)))?;
        schema.add_range_constraint(&name, Expr::column(&name), fr256)?;
        terms.push(Expr::Mul(vec![Expr::column(&name), Expr::Const(coefficient)]));
        coefficient *= fr256;
    }
    // X == (X:0 * 1) + ... + (X:n-1 * 256^(n-1))
    let sum = Expr::Add(terms);
    schema.add_vanishing_constraint(col, None, Expr::column(col).equate(sum))?;
    schema.add_assignment(Box::new(ByteDecomposition::new(context, col, n as usize)));
    Ok(())
}

// COLUMN SORTING GADGET
// ================================================================================================

/// Constrains the given column to be sorted, in the direction given by
/// `sign` (true for ascending).
///
/// A delta column named `+X` (ascending) or `−X` (descending) is added and
/// computed as `Δ = ±(X − X[−1])`; the bitwidth gadget then constrains the
/// delta to `bitwidth` bits, which rules out wrap-around as long as the
/// source column itself fits the same width.
pub fn apply_column_sorting_gadget(
    schema: &mut Schema,
    col: &str,
    sign: bool,
    bitwidth: u32,
) -> Result<(), StructuralError> {
    let context = context_of(schema, col)?;
    let xk = Expr::column(col);
    let xk_m1 = Expr::shifted(col, -1);
    let (delta_name, diff) = if sign {
        (format!("+{col}"), xk.equate(xk_m1))
    } else {
        (format!("-{col}"), xk_m1.equate(xk))
    };
    let decl = ColumnDecl::synthetic(context, &delta_name, ColumnType::Uint(bitwidth));
    schema.add_column(decl.clone())?;
    schema.add_assignment(Box::new(ComputedColumn::new(decl, diff.to_mir())));
    apply_bitwidth_gadget(schema, &delta_name, bitwidth)?;
    // Delta[k] == X[k] - X[k-1]
    schema.add_vanishing_constraint(&delta_name, None, Expr::column(&delta_name).equate(diff))
}

// LEXICOGRAPHIC SORTING GADGET
// ================================================================================================

/// Constrains the given columns to be sorted lexicographically, honoring a
/// per-column sign.
///
/// One binary selector column per source marks the first column which
/// differs from the previous row, and a delta column holds that column's
/// signed difference. The delta is constrained to `bitwidth` bits, and the
/// vanishing constraint `Δ = Σⱼ selⱼ · ±(Cⱼ − Cⱼ[−1])` ties everything
/// together.
pub fn apply_lexicographic_sorting_gadget(
    schema: &mut Schema,
    cols: &[String],
    signs: &[bool],
    bitwidth: u32,
) -> Result<(), StructuralError> {
    let context = context_of(schema, &cols[0])?;
    let prefix = cols.join("_");
    let sort = LexicographicSort::new(&prefix, context, cols.to_vec(), signs.to_vec(), bitwidth);
    for decl in sort.columns() {
        schema.add_column(decl.clone())?;
    }
    let delta_name = sort.delta_name().to_string();
    let selectors: Vec<String> = sort.selector_names().map(String::from).collect();
    schema.add_assignment(Box::new(sort));

    let mut terms = Vec::with_capacity(cols.len());
    for ((col, selector), &sign) in cols.iter().zip(&selectors).zip(signs) {
        apply_binarity_gadget(schema, selector)?;
        let diff = if sign {
            Expr::column(col).equate(Expr::shifted(col, -1))
        } else {
            Expr::shifted(col, -1).equate(Expr::column(col))
        };
        terms.push(Expr::Mul(vec![Expr::column(selector), diff]));
    }
    apply_bitwidth_gadget(schema, &delta_name, bitwidth)?;
    schema.add_vanishing_constraint(
        &prefix,
        None,
        Expr::column(&delta_name).equate(Expr::Add(terms)),
    )
}

// HELPER FUNCTIONS
// ================================================================================================

fn context_of(schema: &Schema, col: &str) -> Result<Context, StructuralError> {
    schema
        .column(col)
        .map(|decl| decl.context())
        .ok_or_else(|| StructuralError::MissingColumn(col.to_string()))
}
