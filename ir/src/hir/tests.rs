// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use schema::{CheckOptions, ColumnType, Error, Failure, StructuralError};
use trace::{felt::Felt, Bounds, RawColumn, Trace};

use super::{lower::lower_expr, Expr, Schema};
use crate::mir;

// HELPERS
// ================================================================================================

fn trace_of(cols: &[(&str, &[u64])]) -> Trace {
    let raw = cols
        .iter()
        .map(|(name, values)| {
            let values = values.iter().map(|&v| Felt::from(v)).collect();
            RawColumn::new(0, *name, values, Felt::from(0u64))
        })
        .collect();
    Trace::from_columns(1, raw).unwrap()
}

fn felts(values: &[u64]) -> Vec<Option<Felt>> {
    values.iter().map(|&v| Some(Felt::from(v))).collect()
}

// EVALUATION TESTS
// ================================================================================================

#[test]
fn arithmetic_folds_left_to_right() {
    let trace = trace_of(&[("X", &[7])]);
    let e = Expr::Sub(vec![Expr::constant(10), Expr::constant(2), Expr::constant(3)]);
    assert_eq!(felts(&[5]), e.eval_all_at(0, &trace));
    let e = Expr::Mul(vec![Expr::column("X"), Expr::constant(3)]);
    assert_eq!(felts(&[21]), e.eval_all_at(0, &trace));
}

#[test]
fn out_of_bounds_access_is_undefined() {
    let trace = trace_of(&[("X", &[1, 2])]);
    let e = Expr::shifted("X", -1);
    assert_eq!(vec![None], e.eval_all_at(0, &trace));
    assert_eq!(felts(&[1]), e.eval_all_at(1, &trace));
    assert_eq!(vec![None], e.eval_all_at(2, &trace));
}

#[test]
fn if_zero_selects_branch_by_condition() {
    let trace = trace_of(&[("C", &[0, 5]), ("X", &[10, 20])]);
    let e = Expr::if_zero(Expr::column("C"), Expr::column("X"), Expr::constant(1));
    assert_eq!(felts(&[10]), e.eval_all_at(0, &trace));
    assert_eq!(felts(&[1]), e.eval_all_at(1, &trace));

    // a missing taken branch is undefined
    let e = Expr::when_nonzero(Expr::column("C"), Expr::column("X"));
    assert_eq!(vec![None], e.eval_all_at(0, &trace));
    assert_eq!(felts(&[20]), e.eval_all_at(1, &trace));
}

#[test]
fn lists_concatenate_values() {
    let trace = trace_of(&[("X", &[3])]);
    let e = Expr::List(vec![Expr::column("X"), Expr::constant(4)]);
    assert_eq!(felts(&[3, 4]), e.eval_all_at(0, &trace));
}

#[test]
fn norm_and_exp_map_over_values() {
    let trace = trace_of(&[("X", &[0, 5])]);
    let e = Expr::Norm(Box::new(Expr::column("X")));
    assert_eq!(felts(&[0]), e.eval_all_at(0, &trace));
    assert_eq!(felts(&[1]), e.eval_all_at(1, &trace));
    let e = Expr::Exp(Box::new(Expr::column("X")), 3);
    assert_eq!(felts(&[125]), e.eval_all_at(1, &trace));
}

#[test]
fn bounds_cover_all_branches() {
    let e = Expr::if_zero(Expr::shifted("C", -2), Expr::shifted("X", 1), Expr::column("Y"));
    assert_eq!(Bounds { start: 2, end: 1 }, e.bounds());
}

// EXPANSION AND EXTRACTION TESTS
// ================================================================================================

#[test]
fn plain_expressions_lower_to_themselves() {
    let e = Expr::Sub(vec![Expr::column("X"), Expr::column("Y")]);
    let lowered = lower_expr(&e).unwrap();
    assert_eq!(
        vec![mir::Expr::Sub(vec![mir::Expr::column("X"), mir::Expr::column("Y")])],
        lowered
    );
}

#[test]
fn list_lowers_to_one_expression_per_element() {
    let e = Expr::List(vec![
        Expr::Sub(vec![Expr::column("X"), Expr::column("Y")]),
        Expr::Sub(vec![Expr::column("Y"), Expr::column("Z")]),
    ]);
    assert_eq!(2, lower_expr(&e).unwrap().len());
}

#[test]
fn if_zero_lowers_to_guarded_bodies() {
    let e = Expr::if_zero(Expr::column("C"), Expr::column("T"), Expr::column("E"));
    let lowered = lower_expr(&e).unwrap();
    // (1 - ~C) * T for the zero branch, C * E for the other
    let guard_zero = mir::Expr::Sub(vec![
        mir::Expr::constant(1),
        mir::Expr::Norm(Box::new(mir::Expr::column("C"))),
    ]);
    assert_eq!(
        vec![
            mir::Expr::Mul(vec![guard_zero, mir::Expr::column("T")]),
            mir::Expr::Mul(vec![mir::Expr::column("C"), mir::Expr::column("E")]),
        ],
        lowered
    );
}

#[test]
fn nested_conditionals_cross_multiply() {
    // (if X Y Z) + (if A B C) expands into four expressions
    let e = Expr::Add(vec![
        Expr::if_zero(Expr::column("X"), Expr::column("Y"), Expr::column("Z")),
        Expr::if_zero(Expr::column("A"), Expr::column("B"), Expr::column("C")),
    ]);
    assert_eq!(4, lower_expr(&e).unwrap().len());
}

#[test]
fn nested_sums_flatten_during_expansion() {
    let e = Expr::Add(vec![
        Expr::Add(vec![Expr::column("X"), Expr::column("Y")]),
        Expr::column("Z"),
    ]);
    let lowered = lower_expr(&e).unwrap();
    assert_eq!(
        vec![mir::Expr::Add(vec![
            mir::Expr::column("X"),
            mir::Expr::column("Y"),
            mir::Expr::column("Z"),
        ])],
        lowered
    );
}

#[test]
fn list_conditions_are_rejected() {
    let e = Expr::when_zero(
        Expr::List(vec![Expr::column("X")]),
        Expr::column("Y"),
    );
    assert!(matches!(
        lower_expr(&e),
        Err(StructuralError::MalformedExpression(_))
    ));
}

#[test]
fn lowering_preserves_vanishing() {
    // for every expansion-free row value, the lowered expressions vanish
    // exactly when the original does
    let trace = trace_of(&[("C", &[0, 3, 0, 7]), ("T", &[0, 9, 4, 2]), ("E", &[5, 0, 1, 0])]);
    let e = Expr::if_zero(Expr::column("C"), Expr::column("T"), Expr::column("E"));
    let lowered = lower_expr(&e).unwrap();
    for row in 0..4 {
        let original_holds = e
            .eval_all_at(row, &trace)
            .into_iter()
            .all(|v| v.is_none_or(|v| v == Felt::from(0u64)));
        let lowered_holds = lowered
            .iter()
            .all(|m| m.eval_at(row, &trace) == Felt::from(0u64));
        assert_eq!(original_holds, lowered_holds, "disagreement at row {row}");
    }
}

// SCHEMA TESTS
// ================================================================================================

#[test]
fn duplicate_columns_are_rejected() {
    let mut schema = Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "X", ColumnType::Field, false).unwrap();
    assert_eq!(
        Err(StructuralError::DuplicateColumn("X".to_string())),
        schema.add_data_column(ctx, "X", ColumnType::Field, false)
    );
}

#[test]
fn constraints_over_unknown_columns_are_rejected() {
    let mut schema = Schema::new();
    schema.add_module("m");
    assert_eq!(
        Err(StructuralError::MissingColumn("X".to_string())),
        schema.add_vanishing_constraint("c", None, Expr::column("X"))
    );
}

#[test]
fn cross_module_constraints_are_rejected() {
    let mut schema = Schema::new();
    let m0 = schema.add_module("m0");
    let m1 = schema.add_module("m1");
    schema.add_data_column(m0, "X", ColumnType::Field, false).unwrap();
    schema.add_data_column(m1, "Y", ColumnType::Field, false).unwrap();
    assert_eq!(
        Err(StructuralError::ConflictingContext("c".to_string())),
        schema.add_vanishing_constraint(
            "c",
            None,
            Expr::Sub(vec![Expr::column("X"), Expr::column("Y")])
        )
    );
}

#[test]
fn schema_accepts_and_rejects_traces() {
    let mut schema = Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "X", ColumnType::Field, false).unwrap();
    schema.add_data_column(ctx, "Y", ColumnType::Field, false).unwrap();
    schema
        .add_vanishing_constraint(
            "eq",
            None,
            Expr::Sub(vec![Expr::column("X"), Expr::column("Y")]),
        )
        .unwrap();

    let options = CheckOptions::default();
    let good = trace_of(&[("X", &[1, 2]), ("Y", &[1, 2])]);
    assert_eq!(Ok(()), schema.accepts(&options, &good));

    let bad = trace_of(&[("X", &[1, 2]), ("Y", &[1, 3])]);
    assert_eq!(
        Err(Error::Constraint(Failure::Vanishing { handle: "eq".to_string(), row: 1 })),
        schema.accepts(&options, &bad)
    );
}
