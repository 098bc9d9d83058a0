// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{Column, Context, Trace};

use super::Assignment;
use crate::{util, ColumnDecl, StructuralError};

// SORTED PERMUTATION
// ================================================================================================

/// Fills the target columns of a sorted permutation: a copy of the source
/// columns with their rows sorted lexicographically according to the
/// per-column signs.
///
/// Each target column inherits the padding value of its source.
#[derive(Clone, Debug)]
pub struct SortedPermutation {
    context: Context,
    targets: Vec<ColumnDecl>,
    signs: Vec<bool>,
    sources: Vec<String>,
}

impl SortedPermutation {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new sorted permutation assignment.
    ///
    /// # Panics
    /// Panics if the numbers of targets, signs, and sources do not agree.
    pub fn new(
        context: Context,
        targets: Vec<ColumnDecl>,
        signs: Vec<bool>,
        sources: Vec<String>,
    ) -> Self {
        assert!(
            targets.len() == signs.len() && signs.len() == sources.len(),
            "target and source column counts must match"
        );
        SortedPermutation {
            context,
            targets,
            signs,
            sources,
        }
    }
}

impl Assignment for SortedPermutation {
    fn columns(&self) -> &[ColumnDecl] {
        &self.targets
    }

    fn dependencies(&self) -> Vec<String> {
        self.sources.clone()
    }

    fn required_spillage(&self) -> usize {
        0
    }

    fn compute_columns(&self, trace: &Trace) -> Result<Vec<Column>, StructuralError> {
        let sources: Vec<&Column> = self
            .sources
            .iter()
            .map(|name| {
                trace
                    .column_by_name(name)
                    .ok_or_else(|| StructuralError::MissingColumn(name.clone()))
            })
            .collect::<Result<_, _>>()?;

        let data: Vec<&[trace::felt::Felt]> = sources.iter().map(|col| col.data()).collect();
        let order = util::sorted_row_order(&data, &self.signs);

        Ok(self
            .targets
            .iter()
            .zip(sources)
            .map(|(decl, source)| {
                let sorted = order.iter().map(|&row| source.data()[row]).collect();
                Column::new(decl.context(), decl.name(), sorted, source.padding())
            })
            .collect())
    }

    fn clone_box(&self) -> Box<dyn Assignment> {
        Box::new(self.clone())
    }
}

impl fmt::Display for SortedPermutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<&str> = self.targets.iter().map(|decl| decl.name()).collect();
        let sources: Vec<String> = self
            .sources
            .iter()
            .zip(self.signs.iter())
            .map(|(name, &sign)| if sign { format!("+{name}") } else { format!("-{name}") })
            .collect();
        write!(f, "(permute ({}) ({}))", targets.join(" "), sources.join(" "))
    }
}
