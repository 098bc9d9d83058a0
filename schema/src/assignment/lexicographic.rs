// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{
    felt::{Felt, One, Zero},
    Column, Context, Trace,
};

use super::Assignment;
use crate::{ColumnDecl, ColumnType, StructuralError};

// LEXICOGRAPHIC SORT
// ================================================================================================

/// Fills the columns which witness a lexicographic ordering between one or
/// more source columns: a delta column and one binary selector column per
/// source.
///
/// For every row, the selector of the first source column whose value differs
/// from the previous row is set to one (all others to zero), and the delta
/// column holds the signed difference of that source. When no source differs,
/// the delta and all selectors are zero.
#[derive(Clone, Debug)]
pub struct LexicographicSort {
    context: Context,
    targets: Vec<ColumnDecl>,
    sources: Vec<String>,
    signs: Vec<bool>,
}

impl LexicographicSort {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new lexicographic sort witness for the specified source
    /// columns. The first target is the delta column `prefix:delta`, followed
    /// by one selector column `prefix:i` per source.
    ///
    /// # Panics
    /// Panics if no sources are specified, or if the number of signs differs
    /// from the number of sources.
    pub fn new(
        prefix: &str,
        context: Context,
        sources: Vec<String>,
        signs: Vec<bool>,
        bitwidth: u32,
    ) -> Self {
        assert!(!sources.is_empty(), "a lexicographic sort requires at least one column");
        assert_eq!(sources.len(), signs.len(), "one sign is required per sorted column");
        let mut targets = Vec::with_capacity(sources.len() + 1);
        targets.push(ColumnDecl::synthetic(
            context,
            format!("{prefix}:delta"),
            ColumnType::Uint(bitwidth),
        ));
        for i in 0..sources.len() {
            targets.push(ColumnDecl::synthetic(context, format!("{prefix}:{i}"), ColumnType::Uint(1)));
        }
        LexicographicSort {
            context,
            targets,
            sources,
            signs,
        }
    }

    /// Returns the name of the delta column.
    pub fn delta_name(&self) -> &str {
        self.targets[0].name()
    }

    /// Returns the names of the selector columns.
    pub fn selector_names(&self) -> impl Iterator<Item = &str> {
        self.targets[1..].iter().map(|decl| decl.name())
    }
}

impl Assignment for LexicographicSort {
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
        let height = trace.height(self.context);
        let sources: Vec<&Column> = self
            .sources
            .iter()
            .map(|name| {
                trace
                    .column_by_name(name)
                    .ok_or_else(|| StructuralError::MissingColumn(name.clone()))
            })
            .collect::<Result<_, _>>()?;

        let mut delta = vec![Felt::zero(); height];
        let mut selectors = vec![vec![Felt::zero(); height]; sources.len()];
        for row in 0..height {
            // the first source which differs from the previous row wins
            for (j, source) in sources.iter().enumerate() {
                let prev = source.get(row as isize - 1);
                let curr = source.get(row as isize);
                if prev != curr {
                    selectors[j][row] = Felt::one();
                    delta[row] = if self.signs[j] { curr - prev } else { prev - curr };
                    break;
                }
            }
        }

        let mut columns = Vec::with_capacity(self.targets.len());
        columns.push(Column::new(self.context, self.delta_name(), delta, Felt::zero()));
        for (decl, data) in self.targets[1..].iter().zip(selectors) {
            columns.push(Column::new(self.context, decl.name(), data, Felt::zero()));
        }
        Ok(columns)
    }

    fn clone_box(&self) -> Box<dyn Assignment> {
        Box::new(self.clone())
    }
}

impl fmt::Display for LexicographicSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<&str> = self.targets.iter().map(|decl| decl.name()).collect();
        let sources: Vec<String> = self
            .sources
            .iter()
            .zip(self.signs.iter())
            .map(|(name, &sign)| if sign { format!("+{name}") } else { format!("-{name}") })
            .collect();
        write!(f, "(lexicographic-order ({}) ({}))", targets.join(" "), sources.join(" "))
    }
}
