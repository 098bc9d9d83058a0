// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use trace::{felt, felt::Felt, Column, Context, Trace};

use super::Assignment;
use crate::{ColumnDecl, ColumnType, StructuralError};

// BYTE DECOMPOSITION
// ================================================================================================

/// Fills the byte columns of a bitwidth gadget.
///
/// For a source column `X` of width `n` bytes, the target column `X:i` holds
/// the i-th byte of `X`'s canonical little-endian representation, i.e.
/// `(X >> 8i) & 0xFF`. Each target's padding is decomposed from the source's
/// padding value.
#[derive(Clone, Debug)]
pub struct ByteDecomposition {
    source: String,
    targets: Vec<ColumnDecl>,
}

impl ByteDecomposition {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a byte decomposition of the specified column into `n` bytes.
    ///
    /// # Panics
    /// Panics if `n` is zero.
    pub fn new(context: Context, source: impl Into<String>, n: usize) -> Self {
        assert!(n > 0, "a byte decomposition must produce at least one byte");
        let source = source.into();
        let targets = (0..n)
            .map(|i| ColumnDecl::synthetic(context, format!("{source}:{i}"), ColumnType::Uint(8)))
            .collect();
        ByteDecomposition { source, targets }
    }

    fn decompose(&self, value: Felt) -> Vec<Felt> {
        let bytes = felt::to_le_bytes(value);
        self.targets
            .iter()
            .enumerate()
            .map(|(i, _)| Felt::from(bytes[i] as u64))
            .collect()
    }
}

impl Assignment for ByteDecomposition {
    fn columns(&self) -> &[ColumnDecl] {
        &self.targets
    }

    fn dependencies(&self) -> Vec<String> {
        vec![self.source.clone()]
    }

    fn required_spillage(&self) -> usize {
        0
    }

    fn compute_columns(&self, trace: &Trace) -> Result<Vec<Column>, StructuralError> {
        let source = trace
            .column_by_name(&self.source)
            .ok_or_else(|| StructuralError::MissingColumn(self.source.clone()))?;
        let n = self.targets.len();
        let mut data = vec![Vec::with_capacity(source.len()); n];
        for value in source.data() {
            for (i, byte) in self.decompose(*value).into_iter().enumerate() {
                data[i].push(byte);
            }
        }
        let padding = self.decompose(source.padding());
        Ok(self
            .targets
            .iter()
            .zip(data.into_iter().zip(padding))
            .map(|(decl, (data, padding))| Column::new(decl.context(), decl.name(), data, padding))
            .collect())
    }

    fn clone_box(&self) -> Box<dyn Assignment> {
        Box::new(self.clone())
    }
}

impl fmt::Display for ByteDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(decompose {} {})", self.source, self.targets.len())
    }
}
