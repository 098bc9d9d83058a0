// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Multiset and lexicographic-order helpers shared by the permutation
//! constraints and the sorting assignments.

use core::cmp::Ordering;

use trace::felt::Felt;

// MULTISET EQUALITY
// ================================================================================================

/// Returns true if `lhs` and `rhs` contain the same values, regardless of
/// order.
pub fn is_permutation_of(lhs: &[Felt], rhs: &[Felt]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    let mut lhs = lhs.to_vec();
    let mut rhs = rhs.to_vec();
    lhs.sort_unstable();
    rhs.sort_unstable();
    lhs == rhs
}

// LEXICOGRAPHIC ORDER
// ================================================================================================

/// Compares two rows of the specified columns lexicographically, honoring the
/// per-column sign (true for ascending).
pub fn compare_rows(cols: &[&[Felt]], signs: &[bool], lhs: usize, rhs: usize) -> Ordering {
    for (col, &sign) in cols.iter().zip(signs) {
        let ord = col[lhs].cmp(&col[rhs]);
        let ord = if sign { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Returns the first row at which the specified columns are out of
/// lexicographic order, or `None` if they are sorted.
pub fn first_unsorted_row(cols: &[&[Felt]], signs: &[bool]) -> Option<usize> {
    let height = cols.first().map_or(0, |col| col.len());
    (1..height).find(|&row| compare_rows(cols, signs, row - 1, row) == Ordering::Greater)
}

/// Returns a permutation of row indexes which sorts the specified columns
/// lexicographically. The sort is stable, so equal rows keep their original
/// order.
pub fn sorted_row_order(cols: &[&[Felt]], signs: &[bool]) -> Vec<usize> {
    let height = cols.first().map_or(0, |col| col.len());
    let mut order: Vec<usize> = (0..height).collect();
    order.sort_by(|&lhs, &rhs| compare_rows(cols, signs, lhs, rhs));
    order
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn felts(values: &[u64]) -> Vec<Felt> {
        values.iter().map(|&v| Felt::from(v)).collect()
    }

    #[test]
    fn multiset_equality() {
        assert!(is_permutation_of(&felts(&[3, 1, 2]), &felts(&[1, 2, 3])));
        assert!(!is_permutation_of(&felts(&[3, 1, 2]), &felts(&[1, 2, 2])));
        assert!(!is_permutation_of(&felts(&[1]), &felts(&[1, 1])));
    }

    #[test]
    fn unsorted_row_detection() {
        let a = felts(&[1, 1, 2]);
        let b = felts(&[5, 7, 1]);
        assert_eq!(None, first_unsorted_row(&[&a, &b], &[true, true]));
        assert_eq!(Some(1), first_unsorted_row(&[&a, &b], &[true, false]));
    }

    #[test]
    fn sorting_respects_signs() {
        let a = felts(&[2, 1, 1]);
        let b = felts(&[0, 5, 7]);
        let order = sorted_row_order(&[&a, &b], &[true, false]);
        assert_eq!(vec![2, 1, 0], order);
    }
}
