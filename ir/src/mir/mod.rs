// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The mid-level intermediate representation.
//!
//! MIR expressions are flat algebra extended with `normalise` and integer
//! exponentiation; conditionals and lists no longer exist at this level.
//! Every MIR expression produced by lowering has the shape `C · B`, where the
//! condition `C` is a product of guards lifted out of the high-level
//! conditionals and `B` is the translated body.
//!
//! Evaluation at this level is total: out-of-bounds accesses are satisfied
//! by column padding. The `inv` constructor is the witness-computation
//! language of the normalise lowering and never appears in constraints.

mod expr;
pub use expr::Expr;

mod schema;
pub use self::schema::Schema;

mod lower;
