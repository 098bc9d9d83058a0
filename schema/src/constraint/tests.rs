// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{
    felt::{Felt, Zero},
    Bounds, Context, RawColumn, Trace,
};

use super::{
    Constraint, LookupConstraint, PermutationConstraint, RangeConstraint, SortedConstraint,
    VanishingConstraint,
};
use crate::{ContextResolver, Evaluable, Failure, Testable};

// TEST EXPRESSIONS
// ================================================================================================

/// A minimal expression: a single column access with a row shift.
#[derive(Clone, Debug)]
struct ColRef {
    name: String,
    shift: isize,
}

impl ColRef {
    fn new(name: &str, shift: isize) -> Self {
        ColRef { name: name.to_string(), shift }
    }
}

impl Evaluable for ColRef {
    fn eval_at(&self, row: isize, trace: &Trace) -> Felt {
        trace.get_by_name(&self.name, row + self.shift).unwrap_or_else(Felt::zero)
    }

    fn bounds(&self) -> Bounds {
        Bounds::for_shift(self.shift)
    }

    fn context(&self, resolver: &dyn ContextResolver) -> Context {
        resolver.context_of(&self.name).unwrap_or_else(Context::void)
    }

    fn collect_dependencies(&self, deps: &mut Vec<String>) {
        deps.push(self.name.clone());
    }
}

impl fmt::Display for ColRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Tests that a column access minus a constant vanishes.
#[derive(Clone, Debug)]
struct IsValue(ColRef, Felt);

impl Testable for IsValue {
    fn test_at(&self, row: isize, trace: &Trace) -> bool {
        self.0.eval_at(row, trace) == self.1
    }

    fn bounds(&self) -> Bounds {
        self.0.bounds()
    }

    fn context(&self, resolver: &dyn ContextResolver) -> Context {
        self.0.context(resolver)
    }
}

impl fmt::Display for IsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(- {} {})", self.0, self.1)
    }
}

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

// VANISHING CONSTRAINT TESTS
// ================================================================================================

#[test]
fn vanishing_over_all_rows_reports_first_failure() {
    let trace = trace_of(&[("X", &[7, 7, 8, 7])]);
    let ctx = Context::new(0, 1);
    let c = VanishingConstraint::new("X", ctx, None, IsValue(ColRef::new("X", 0), Felt::from(7u64)));
    assert_eq!(
        Err(Failure::Vanishing { handle: "X".to_string(), row: 2 }),
        c.accepts(&trace)
    );
}

#[test]
fn vanishing_with_domain_checks_a_single_row() {
    let trace = trace_of(&[("X", &[1, 2, 3])]);
    let ctx = Context::new(0, 1);
    // row 0 only
    let first = VanishingConstraint::new("f", ctx, Some(0), IsValue(ColRef::new("X", 0), Felt::from(1u64)));
    assert_eq!(Ok(()), first.accepts(&trace));
    // last row via a negative domain
    let last = VanishingConstraint::new("l", ctx, Some(-1), IsValue(ColRef::new("X", 0), Felt::from(3u64)));
    assert_eq!(Ok(()), last.accepts(&trace));
    let bad = VanishingConstraint::new("b", ctx, Some(-1), IsValue(ColRef::new("X", 0), Felt::from(9u64)));
    assert_eq!(
        Err(Failure::Vanishing { handle: "b".to_string(), row: 2 }),
        bad.accepts(&trace)
    );
}

// RANGE CONSTRAINT TESTS
// ================================================================================================

#[test]
fn range_reports_value_and_bound() {
    let trace = trace_of(&[("X", &[0, 255, 256])]);
    let ctx = Context::new(0, 1);
    let c = RangeConstraint::new("X", ctx, ColRef::new("X", 0), Felt::from(256u64));
    assert_eq!(
        Err(Failure::Range {
            handle: "X".to_string(),
            row: 2,
            value: Felt::from(256u64),
            bound: Felt::from(256u64)
        }),
        c.accepts(&trace)
    );
}

// PERMUTATION CONSTRAINT TESTS
// ================================================================================================

#[test]
fn permutation_is_a_multiset_check() {
    let trace = trace_of(&[("S", &[3, 1, 2]), ("T", &[1, 2, 3]), ("U", &[1, 2, 2])]);
    let ok = PermutationConstraint::new("T", vec!["T".to_string()], vec!["S".to_string()]);
    assert_eq!(Ok(()), ok.accepts(&trace));
    let bad = PermutationConstraint::new("U", vec!["U".to_string()], vec!["S".to_string()]);
    assert_eq!(Err(Failure::Permutation { handle: "U".to_string() }), bad.accepts(&trace));
}

#[test]
fn sorted_permutation_checks_order() {
    let trace = trace_of(&[("S", &[3, 1, 2]), ("T", &[3, 2, 1])]);
    let c = SortedConstraint::new("T", vec!["T".to_string()], vec![true], vec!["S".to_string()]);
    assert_eq!(
        Err(Failure::Sorting { handle: "T".to_string(), row: 1 }),
        c.accepts(&trace)
    );
}

// LOOKUP CONSTRAINT TESTS
// ================================================================================================

#[test]
fn lookup_requires_source_rows_among_targets() {
    let trace = trace_of(&[("S", &[1, 2, 1]), ("T", &[2, 1, 9])]);
    let ctx = Context::new(0, 1);
    let ok = LookupConstraint::new("l", ctx, ctx, vec![ColRef::new("S", 0)], vec![ColRef::new("T", 0)]);
    assert_eq!(Ok(()), ok.accepts(&trace));
    let bad = LookupConstraint::new("m", ctx, ctx, vec![ColRef::new("T", 0)], vec![ColRef::new("S", 0)]);
    assert_eq!(Err(Failure::Lookup { handle: "m".to_string(), row: 2 }), bad.accepts(&trace));
}
