// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The JSON binary-file frontend.
//!
//! High-level expressions arrive as tagged records: intrinsic function calls
//! (`Add`, `Mul`, `Sub`, `Normalize`, `IfZero`, `IfNotZero`, and their
//! `Vector*` synonyms), column accesses carrying a handle, a row shift, and
//! a `must_prove` flag, big-integer constants encoded as a sign and
//! little-endian 32-bit words, and lists. This module parses those records
//! into HIR expressions; malformed input is reported as a [BinfileError],
//! never a panic.

use core::fmt;

use serde::Deserialize;

use ir::hir;
use trace::felt;

// JSON DATA MODEL
// ================================================================================================

/// An optionally typed expression record.
#[derive(Clone, Debug, Deserialize)]
pub struct JsonTypedExpr {
    #[serde(rename = "_e")]
    pub expr: JsonExpr,
}

/// An expression record; exactly one of the fields must be present.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JsonExpr {
    #[serde(rename = "Funcall")]
    pub funcall: Option<JsonExprFuncall>,
    #[serde(rename = "Const")]
    pub constant: Option<JsonExprConst>,
    #[serde(rename = "Column")]
    pub column: Option<JsonExprColumn>,
    #[serde(rename = "List")]
    pub list: Option<Vec<JsonTypedExpr>>,
}

/// An intrinsic function call with zero or more arguments.
#[derive(Clone, Debug, Deserialize)]
pub struct JsonExprFuncall {
    pub func: String,
    pub args: Vec<JsonTypedExpr>,
}

/// A big-integer constant: a sign in `{-1, 0, 1}` and little-endian 32-bit
/// words.
#[derive(Clone, Debug, Deserialize)]
pub struct JsonExprConst {
    #[serde(rename = "BigInt")]
    pub bigint: (i8, Vec<u32>),
}

/// A column access.
#[derive(Clone, Debug, Deserialize)]
pub struct JsonExprColumn {
    pub handle: Handle,
    pub shift: isize,
    #[serde(default)]
    pub must_prove: bool,
}

/// A column handle: a qualified name and a numeric identifier.
#[derive(Clone, Debug, Deserialize)]
pub struct Handle {
    pub h: String,
    #[serde(default)]
    pub id: usize,
}

// BINFILE ERROR
// ================================================================================================
/// Represents an error returned while translating a binary file into HIR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinfileError {
    /// This error occurs when an expression record has none (or more than
    /// one) of its variant fields set.
    AmbiguousExpression,
    /// This error occurs when a constant carries a sign outside `{-1, 0, 1}`.
    InvalidSign(i8),
    /// This error occurs when an intrinsic is called with the wrong number
    /// of arguments.
    BadArity(String, usize),
    /// This error occurs when an unknown intrinsic is encountered.
    UnknownIntrinsic(String),
}

impl fmt::Display for BinfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousExpression => {
                write!(f, "expression record must have exactly one variant")
            },
            Self::InvalidSign(sign) => {
                write!(f, "constant sign must be -1, 0, or 1, but was {sign}")
            },
            Self::BadArity(func, arity) => {
                write!(f, "incorrect number of arguments for {func} ({arity})")
            },
            Self::UnknownIntrinsic(func) => {
                write!(f, "unknown intrinsic {func}")
            },
        }
    }
}

impl core::error::Error for BinfileError {}

// TRANSLATION
// ================================================================================================

impl JsonTypedExpr {
    /// Translates this record into an HIR expression.
    pub fn to_hir(&self) -> Result<hir::Expr, BinfileError> {
        self.expr.to_hir()
    }
}

impl JsonExpr {
    /// Translates this record into an HIR expression.
    pub fn to_hir(&self) -> Result<hir::Expr, BinfileError> {
        match (&self.funcall, &self.constant, &self.column, &self.list) {
            (Some(funcall), None, None, None) => funcall.to_hir(),
            (None, Some(constant), None, None) => constant.to_hir(),
            (None, None, Some(column), None) => Ok(column.to_hir()),
            (None, None, None, Some(list)) => {
                let args = list.iter().map(JsonTypedExpr::to_hir).collect::<Result<_, _>>()?;
                Ok(hir::Expr::List(args))
            },
            _ => Err(BinfileError::AmbiguousExpression),
        }
    }
}

impl JsonExprConst {
    /// Translates this constant into an HIR expression. All bytes flow
    /// through the field element's canonical little-endian representation.
    pub fn to_hir(&self) -> Result<hir::Expr, BinfileError> {
        let (sign, words) = &self.bigint;
        if !(-1..=1).contains(sign) {
            return Err(BinfileError::InvalidSign(*sign));
        }
        Ok(hir::Expr::Const(felt::from_words(*sign, words)))
    }
}

impl JsonExprColumn {
    /// Translates this column access into an HIR expression.
    pub fn to_hir(&self) -> hir::Expr {
        hir::Expr::shifted(&self.handle.h, self.shift)
    }
}

impl JsonExprFuncall {
    /// Translates this function call into an HIR expression. The `Vector*`
    /// heads are synonyms for their scalar counterparts, and
    /// `IfNotZero(c, b)` is `IfZero(c, None, b)`.
    pub fn to_hir(&self) -> Result<hir::Expr, BinfileError> {
        let mut args: Vec<hir::Expr> =
            self.args.iter().map(JsonTypedExpr::to_hir).collect::<Result<_, _>>()?;
        let arity = args.len();
        let bad_arity = || BinfileError::BadArity(self.func.clone(), arity);
        match self.func.as_str() {
            "Normalize" => {
                let arg = args.pop().filter(|_| arity == 1).ok_or_else(bad_arity)?;
                Ok(hir::Expr::Norm(Box::new(arg)))
            },
            "VectorAdd" | "Add" => Ok(hir::Expr::Add(args)),
            "VectorMul" | "Mul" => Ok(hir::Expr::Mul(args)),
            "VectorSub" | "Sub" => Ok(hir::Expr::Sub(args)),
            "IfZero" => match arity {
                2 => {
                    let on_zero = args.pop().expect("arity checked");
                    let cond = args.pop().expect("arity checked");
                    Ok(hir::Expr::when_zero(cond, on_zero))
                },
                3 => {
                    let on_nonzero = args.pop().expect("arity checked");
                    let on_zero = args.pop().expect("arity checked");
                    let cond = args.pop().expect("arity checked");
                    Ok(hir::Expr::if_zero(cond, on_zero, on_nonzero))
                },
                _ => Err(bad_arity()),
            },
            "IfNotZero" => match arity {
                2 => {
                    let body = args.pop().expect("arity checked");
                    let cond = args.pop().expect("arity checked");
                    Ok(hir::Expr::when_nonzero(cond, body))
                },
                _ => Err(bad_arity()),
            },
            _ => Err(BinfileError::UnknownIntrinsic(self.func.clone())),
        }
    }
}

// TESTS
// ================================================================================================
