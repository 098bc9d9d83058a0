// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use trace::{felt::Felt, Context, RawColumn, Trace};

use super::{expand_trace, Assignment, ByteDecomposition, LexicographicSort, SortedPermutation};
use crate::{ColumnDecl, ColumnType, StructuralError};

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

fn values(trace: &Trace, name: &str) -> Vec<u64> {
    // test fixtures only ever hold small values, so the first limb is enough
    trace
        .column_by_name(name)
        .unwrap()
        .data()
        .iter()
        .map(|v| trace::felt::to_le_bytes(*v)[..8].try_into().map(u64::from_le_bytes).unwrap())
        .collect()
}

// BYTE DECOMPOSITION TESTS
// ================================================================================================

#[test]
fn byte_decomposition_fills_little_endian_bytes() {
    let trace = trace_of(&[("X", &[0, 255, 258])]);
    let assignment = ByteDecomposition::new(Context::new(0, 1), "X", 2);
    let columns = assignment.compute_columns(&trace).unwrap();
    assert_eq!(2, columns.len());
    assert_eq!(
        vec![Felt::from(0u64), Felt::from(255u64), Felt::from(2u64)],
        columns[0].data()
    );
    assert_eq!(
        vec![Felt::from(0u64), Felt::from(0u64), Felt::from(1u64)],
        columns[1].data()
    );
}

// LEXICOGRAPHIC SORT TESTS
// ================================================================================================

#[test]
fn lexicographic_sort_selects_first_differing_column() {
    let trace = trace_of(&[("A", &[1, 1, 2]), ("B", &[5, 7, 1])]);
    let assignment = LexicographicSort::new(
        "st",
        Context::new(0, 1),
        vec!["A".to_string(), "B".to_string()],
        vec![true, true],
        8,
    );
    let columns = assignment.compute_columns(&trace).unwrap();
    // row 0 differs from the padding row on A (1 vs 0)
    assert_eq!(vec![Felt::from(1u64), Felt::from(2u64), Felt::from(1u64)], columns[0].data());
    assert_eq!(vec![Felt::from(1u64), Felt::from(0u64), Felt::from(1u64)], columns[1].data());
    assert_eq!(vec![Felt::from(0u64), Felt::from(1u64), Felt::from(0u64)], columns[2].data());
}

// SORTED PERMUTATION TESTS
// ================================================================================================

#[test]
fn sorted_permutation_sorts_rows_jointly() {
    let trace = trace_of(&[("A", &[2, 1, 1]), ("B", &[0, 7, 5])]);
    let ctx = Context::new(0, 1);
    let targets = vec![
        ColumnDecl::synthetic(ctx, "A'", ColumnType::Field),
        ColumnDecl::synthetic(ctx, "B'", ColumnType::Field),
    ];
    let assignment =
        SortedPermutation::new(ctx, targets, vec![true, true], vec!["A".to_string(), "B".to_string()]);
    let columns = assignment.compute_columns(&trace).unwrap();
    assert_eq!(vec![Felt::from(1u64), Felt::from(1u64), Felt::from(2u64)], columns[0].data());
    assert_eq!(vec![Felt::from(5u64), Felt::from(7u64), Felt::from(0u64)], columns[1].data());
}

// TRACE EXPANSION TESTS
// ================================================================================================

#[test]
fn expansion_pads_and_appends_in_order() {
    let mut trace = trace_of(&[("X", &[1, 2])]);
    let assignments: Vec<Box<dyn Assignment>> =
        vec![Box::new(ByteDecomposition::new(Context::new(0, 1), "X", 1))];
    expand_trace(&assignments, &mut trace).unwrap();
    assert_eq!(1, trace.spillage());
    assert_eq!(vec![0, 1, 2], values(&trace, "X"));
    assert_eq!(vec![0, 1, 2], values(&trace, "X:0"));
}

#[test]
fn expansion_is_idempotent() {
    let mut trace = trace_of(&[("X", &[1, 2])]);
    let assignments: Vec<Box<dyn Assignment>> =
        vec![Box::new(ByteDecomposition::new(Context::new(0, 1), "X", 1))];
    expand_trace(&assignments, &mut trace).unwrap();
    let expanded = trace.clone();
    expand_trace(&assignments, &mut trace).unwrap();
    assert_eq!(expanded.spillage(), trace.spillage());
    for (before, after) in expanded.columns().iter().zip(trace.columns()) {
        assert_eq!(before, after);
    }
}

#[test]
fn expansion_rejects_missing_dependencies() {
    let mut trace = trace_of(&[("Y", &[1, 2])]);
    let assignments: Vec<Box<dyn Assignment>> =
        vec![Box::new(ByteDecomposition::new(Context::new(0, 1), "X", 1))];
    let err = expand_trace(&assignments, &mut trace).unwrap_err();
    assert_eq!(
        StructuralError::MissingDependency("X:0".to_string(), "X".to_string()),
        err
    );
}
