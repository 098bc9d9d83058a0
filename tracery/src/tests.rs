// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use proptest::prelude::*;

use crate::{
    check, compile, felt::Felt, hir, CheckOptions, ColumnType, Error, Failure, RawColumn,
    StructuralError, Trace,
};

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

fn column_values(trace: &Trace, name: &str) -> Vec<Felt> {
    trace.column_by_name(name).unwrap().data().to_vec()
}

// SCENARIO TESTS
// ================================================================================================

#[test]
fn binarity_accepts_bits_and_rejects_others() {
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "X", ColumnType::Field, false).unwrap();
    schema.add_range_constraint("X", hir::Expr::column("X"), Felt::from(2u64)).unwrap();
    let options = CheckOptions::default();
    let air = compile(&schema, &options).unwrap();

    let mut good = trace_of(&[("X", &[0, 1, 0, 1])]);
    assert_eq!(Ok(()), check(&air, &mut good, &options));

    let mut bad = trace_of(&[("X", &[0, 2])]);
    // raw row 1, shifted by one row of spillage
    assert_eq!(
        Err(Error::Constraint(Failure::Vanishing { handle: "X".to_string(), row: 2 })),
        check(&air, &mut bad, &options)
    );
}

#[test]
fn bitwidth_schema_requires_expansion() {
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "X", ColumnType::Uint(8), true).unwrap();
    let options = CheckOptions::default();
    let air = compile(&schema, &options).unwrap();

    let mut trace = trace_of(&[("X", &[0, 255, 42])]);
    // the byte column only exists after expansion
    assert_eq!(
        Err(Error::Structural(StructuralError::MissingColumn("X:0".to_string()))),
        air.accepts(&options, &trace)
    );
    assert_eq!(Ok(()), check(&air, &mut trace, &options));
    assert_eq!(
        vec![0u64, 0, 255, 42].iter().map(|&v| Felt::from(v)).collect::<Vec<_>>(),
        column_values(&trace, "X:0")
    );
}

#[test]
fn conditional_constraints_guard_their_branch() {
    // (if C T E): on rows where C == 0 only T is enforced, elsewhere only E
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    for name in ["C", "T", "E"] {
        schema.add_data_column(ctx, name, ColumnType::Field, false).unwrap();
    }
    schema
        .add_vanishing_constraint(
            "cond",
            None,
            hir::Expr::if_zero(
                hir::Expr::column("C"),
                hir::Expr::column("T"),
                hir::Expr::column("E"),
            ),
        )
        .unwrap();
    let mir = schema.lower_to_mir().unwrap();
    assert_eq!(2, mir.vanishing_constraints().len());

    let options = CheckOptions::default();
    let air = compile(&schema, &options).unwrap();

    // C == 0 everywhere: E is unconstrained
    let mut trace = trace_of(&[("C", &[0, 0]), ("T", &[0, 0]), ("E", &[7, 9])]);
    assert_eq!(Ok(()), check(&air, &mut trace, &options));

    // C != 0 everywhere: T is unconstrained
    let mut trace = trace_of(&[("C", &[5, 5]), ("T", &[7, 9]), ("E", &[0, 0])]);
    assert_eq!(Ok(()), check(&air, &mut trace, &options));

    // C != 0 with a non-vanishing E fails
    let mut trace = trace_of(&[("C", &[5]), ("T", &[0]), ("E", &[3])]);
    assert!(check(&air, &mut trace, &options).is_err());
}

#[test]
fn sorted_permutation_sorts_and_verifies() {
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "A", ColumnType::Uint(8), false).unwrap();
    schema.add_data_column(ctx, "B", ColumnType::Uint(8), false).unwrap();
    schema
        .add_sorted_permutation(
            ctx,
            vec!["A'".to_string(), "B'".to_string()],
            vec![true, true],
            vec!["A".to_string(), "B".to_string()],
        )
        .unwrap();
    let options = CheckOptions::default();
    let air = compile(&schema, &options).unwrap();

    let mut trace = trace_of(&[("A", &[2, 1, 1]), ("B", &[0, 7, 5])]);
    assert_eq!(Ok(()), check(&air, &mut trace, &options));

    // targets are sorted lexicographically (padding row first)
    let expected: Vec<Felt> = [0u64, 1, 1, 2].iter().map(|&v| Felt::from(v)).collect();
    assert_eq!(expected, column_values(&trace, "A'"));
    let expected: Vec<Felt> = [0u64, 5, 7, 0].iter().map(|&v| Felt::from(v)).collect();
    assert_eq!(expected, column_values(&trace, "B'"));
}

#[test]
fn permutation_failures_are_reported() {
    // a sorted permutation whose "sorted" targets are tampered with
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "S", ColumnType::Uint(8), false).unwrap();
    schema
        .add_sorted_permutation(ctx, vec!["T".to_string()], vec![true], vec!["S".to_string()])
        .unwrap();
    let options = CheckOptions::default();
    let air = compile(&schema, &options).unwrap();

    // T was supplied rather than computed, and is not a permutation of S
    let mut trace = trace_of(&[("S", &[3, 1, 2]), ("T", &[1, 2, 2])]);
    assert_eq!(
        Err(Error::Constraint(Failure::Permutation { handle: "T".to_string() })),
        check(&air, &mut trace, &options)
    );
}

// PROPERTY TESTS
// ================================================================================================

proptest! {
    // P1: lowering a conditional-free expression preserves its value on
    // every in-bounds row
    #[test]
    fn lowering_preserves_evaluation(
        expr in arb_flat_expr(),
        xs in proptest::collection::vec(0u64..100, 6),
        ys in proptest::collection::vec(0u64..100, 6),
    ) {
        let trace = trace_of(&[("X", &xs), ("Y", &ys)]);
        let mir = hir::lower_expr(&expr).unwrap();
        prop_assert_eq!(1, mir.len());
        for row in 1..5isize {
            let original = expr.eval_all_at(row, &trace);
            prop_assert_eq!(1, original.len());
            prop_assert_eq!(original[0].unwrap(), mir[0].eval_at(row, &trace));
        }
    }

    // P2: a schema and its lowering accept exactly the same traces
    #[test]
    fn lowering_preserves_acceptance(
        cs in proptest::collection::vec(0u64..3, 4),
        ts in proptest::collection::vec(0u64..3, 4),
        es in proptest::collection::vec(0u64..3, 4),
    ) {
        let mut schema = hir::Schema::new();
        let ctx = schema.add_module("m");
        for name in ["C", "T", "E"] {
            schema.add_data_column(ctx, name, ColumnType::Field, false).unwrap();
        }
        schema
            .add_vanishing_constraint(
                "cond",
                None,
                hir::Expr::if_zero(
                    hir::Expr::column("C"),
                    hir::Expr::column("T"),
                    hir::Expr::column("E"),
                ),
            )
            .unwrap();
        let options = CheckOptions::default();
        let air = compile(&schema, &options).unwrap();

        let mut trace = trace_of(&[("C", &cs), ("T", &ts), ("E", &es)]);
        air.expand_trace(&mut trace).unwrap();
        let lowered = air.accepts(&options, &trace).is_ok();
        let original = schema.accepts(&options, &trace).is_ok();
        prop_assert_eq!(original, lowered);
    }

    // P3: byte decompositions recompose to their source and stay in range
    #[test]
    fn byte_decomposition_recomposes(values in proptest::collection::vec(0u64..65536, 1..8)) {
        let mut schema = hir::Schema::new();
        let ctx = schema.add_module("m");
        schema.add_data_column(ctx, "X", ColumnType::Uint(16), true).unwrap();
        let options = CheckOptions::default();
        let air = compile(&schema, &options).unwrap();

        let mut trace = trace_of(&[("X", &values)]);
        prop_assert_eq!(Ok(()), check(&air, &mut trace, &options));
        let lo = column_values(&trace, "X:0");
        let hi = column_values(&trace, "X:1");
        let xs = column_values(&trace, "X");
        for ((lo, hi), x) in lo.into_iter().zip(hi).zip(xs) {
            prop_assert!(lo < Felt::from(256u64));
            prop_assert!(hi < Felt::from(256u64));
            prop_assert_eq!(x, lo + hi * Felt::from(256u64));
        }
    }

    // P4: sorted permutations produce a sorted multiset copy
    #[test]
    fn sorted_permutation_is_sorted(values in proptest::collection::vec(0u64..256, 1..10)) {
        let mut schema = hir::Schema::new();
        let ctx = schema.add_module("m");
        schema.add_data_column(ctx, "S", ColumnType::Uint(8), false).unwrap();
        schema
            .add_sorted_permutation(ctx, vec!["T".to_string()], vec![true], vec!["S".to_string()])
            .unwrap();
        let options = CheckOptions::default();
        let air = compile(&schema, &options).unwrap();

        let mut trace = trace_of(&[("S", &values)]);
        prop_assert_eq!(Ok(()), check(&air, &mut trace, &options));
        let sorted = column_values(&trace, "T");
        prop_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    // P6: expansion is idempotent
    #[test]
    fn expansion_is_idempotent(values in proptest::collection::vec(0u64..256, 1..8)) {
        let mut schema = hir::Schema::new();
        let ctx = schema.add_module("m");
        schema.add_data_column(ctx, "X", ColumnType::Uint(8), true).unwrap();
        let air = compile(&schema, &CheckOptions::default()).unwrap();

        let mut trace = trace_of(&[("X", &values)]);
        air.expand_trace(&mut trace).unwrap();
        let expanded = trace.clone();
        air.expand_trace(&mut trace).unwrap();
        prop_assert_eq!(expanded.width(), trace.width());
        for (before, after) in expanded.columns().iter().zip(trace.columns()) {
            prop_assert_eq!(before, after);
        }
    }
}

// P5: the normalise identities hold exactly for the computed witness
#[test]
fn normalise_witness_is_forced() {
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "X", ColumnType::Field, false).unwrap();
    schema.add_data_column(ctx, "Y", ColumnType::Field, false).unwrap();
    // Y == ~X
    schema
        .add_vanishing_constraint(
            "norm",
            None,
            hir::Expr::Sub(vec![
                hir::Expr::column("Y"),
                hir::Expr::Norm(Box::new(hir::Expr::column("X"))),
            ]),
        )
        .unwrap();
    let options = CheckOptions::default();
    let air = compile(&schema, &options).unwrap();

    let mut good = trace_of(&[("X", &[0, 7, 0, 1]), ("Y", &[0, 1, 0, 1])]);
    assert_eq!(Ok(()), check(&air, &mut good, &options));

    // any other claimed normalisation is rejected
    for (x, y) in [(0u64, 1u64), (7, 0), (7, 7)] {
        let mut bad = trace_of(&[("X", &[x]), ("Y", &[y])]);
        assert!(check(&air, &mut bad, &options).is_err(), "accepted Y={y} as ~{x}");
    }
}

// OUTPUT TESTS
// ================================================================================================

#[test]
fn compiled_schemas_print_their_machinery() {
    let mut schema = hir::Schema::new();
    let ctx = schema.add_module("m");
    schema.add_data_column(ctx, "S", ColumnType::Uint(8), false).unwrap();
    schema
        .add_sorted_permutation(ctx, vec!["T".to_string()], vec![true], vec!["S".to_string()])
        .unwrap();
    let air = compile(&schema, &CheckOptions::default()).unwrap();
    let printed = air.to_string();
    assert!(printed.contains("(permute (T) (+S))"));
    assert!(printed.contains("(lexicographic-order (T:delta T:0) (+T))"));
    assert!(printed.contains("(decompose T:delta 1)"));
    assert!(printed.contains("(definrange T:delta:0 256)"));
}

// STRATEGIES
// ================================================================================================

/// A conditional-free HIR expression over the columns X and Y with row
/// shifts of at most one.
fn arb_flat_expr() -> impl Strategy<Value = hir::Expr> {
    let leaf = prop_oneof![
        (0u64..10).prop_map(hir::Expr::constant),
        ("X|Y", -1isize..=1).prop_map(|(name, shift)| hir::Expr::shifted(name, shift)),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 2..4).prop_map(hir::Expr::Add),
            proptest::collection::vec(inner.clone(), 2..4).prop_map(hir::Expr::Sub),
            proptest::collection::vec(inner.clone(), 2..4).prop_map(hir::Expr::Mul),
            (inner.clone(), 0u64..4).prop_map(|(e, p)| hir::Expr::Exp(Box::new(e), p)),
            inner.prop_map(|e| hir::Expr::Norm(Box::new(e))),
        ]
    })
}
