// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::{felt::Felt, Context};

// TRACE COLUMN
// ================================================================================================

/// A single named column of field elements together with its padding value.
///
/// The padding value is returned for every access outside the stored data:
/// negative row indexes model the (conceptually infinite) front padding of
/// the trace, and indexes past the end of the column are padded as well. This
/// makes all shifted accesses total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    context: Context,
    name: String,
    data: Vec<Felt>,
    padding: Felt,
}

impl Column {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns a new column with the specified context, name, data, and
    /// padding value.
    pub fn new(context: Context, name: impl Into<String>, data: Vec<Felt>, padding: Felt) -> Self {
        Column {
            context,
            name: name.into(),
            data,
            padding,
        }
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

    /// Returns the number of rows stored in this column.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this column stores no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the padding value of this column.
    pub fn padding(&self) -> Felt {
        self.padding
    }

    /// Returns the raw data of this column.
    pub fn data(&self) -> &[Felt] {
        &self.data
    }

    /// Returns the value of this column at the specified row.
    ///
    /// The access is total: any row outside the stored data returns the
    /// column's padding value.
    pub fn get(&self, row: isize) -> Felt {
        if row < 0 || row as usize >= self.data.len() {
            self.padding
        } else {
            self.data[row as usize]
        }
    }

    /// Returns the value of this column at the specified row, or `None` if
    /// the row is outside the stored data.
    pub fn try_get(&self, row: isize) -> Option<Felt> {
        if row < 0 || row as usize >= self.data.len() {
            None
        } else {
            Some(self.data[row as usize])
        }
    }

    // DATA MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Prepends `n` copies of the padding value to this column.
    pub fn pad_front(&mut self, n: usize) {
        self.data.splice(0..0, core::iter::repeat(self.padding).take(n));
    }
}

// TESTS
// ================================================================================================
