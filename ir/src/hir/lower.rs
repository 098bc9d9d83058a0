// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lowering from HIR to MIR.
//!
//! Lowering works in two phases per expression. *Expansion* rewrites one
//! high-level expression into one or more conditional expressions, each with
//! at most one live branch per `if-zero`: lists are flattened away, an
//! `if-zero` with both branches splits into two expressions, and n-ary
//! operators take the cross product of their arguments' expansions.
//! *Extraction* then lifts conditions to the top of each expansion, turning
//! it into the product `C · B` of a guard and a translated body, using the
//! pivotal rewrite `if-zero(c, t) ≡ (1 − norm(c)) · t`.

use schema::StructuralError;
use trace::felt::Felt;
use tracing::info_span;

use super::{Expr, Schema};
use crate::mir;

impl Schema {
    /// Lowers this schema to the MIR level: columns and sorted permutations
    /// pass through, while every constraint expression is expanded and its
    /// conditionals are compiled into multiplicative guards.
    pub fn lower_to_mir(&self) -> Result<mir::Schema, StructuralError> {
        let _span = info_span!("lower_to_mir", columns = self.columns().len()).entered();
        let mut mir = mir::Schema::new(self.modules().to_vec());
        for decl in self.columns() {
            mir.add_column(decl.clone())?;
        }
        for decl in self.sorted_permutations() {
            mir.add_sorted_permutation(decl.clone());
        }
        for constraint in self.vanishing_constraints() {
            for expr in lower_expr(&constraint.expr().0)? {
                mir.add_vanishing_constraint(constraint.handle(), constraint.domain(), expr)?;
            }
        }
        for constraint in self.range_constraints() {
            for expr in lower_expr(&constraint.expr().0)? {
                mir.add_range_constraint(constraint.handle(), expr, constraint.bound())?;
            }
        }
        for constraint in self.lookup_constraints() {
            let handle = constraint.handle();
            let sources = constraint
                .sources()
                .iter()
                .map(|unit| lower_unit(&unit.0, handle))
                .collect::<Result<Vec<_>, _>>()?;
            let targets = constraint
                .targets()
                .iter()
                .map(|unit| lower_unit(&unit.0, handle))
                .collect::<Result<Vec<_>, _>>()?;
            mir.add_lookup_constraint(handle, sources, targets)?;
        }
        for assertion in self.property_assertions() {
            for expr in lower_expr(&assertion.property().0)? {
                mir.add_property_assertion(assertion.handle(), expr)?;
            }
        }
        Ok(mir)
    }
}

// LOWERING
// ================================================================================================

/// Lowers an HIR expression into one or more MIR expressions: one per
/// expansion, each of the shape `C · B`.
pub fn lower_expr(expr: &Expr) -> Result<Vec<mir::Expr>, StructuralError> {
    expand(expr)?
        .iter()
        .map(|expansion| {
            let condition = extract_condition(expansion)?;
            let body = extract_body(expansion)?;
            Ok(mul2(condition, Some(body)).expect("a body is always present"))
        })
        .collect()
}

/// Lowers an HIR expression which must produce exactly one MIR expression,
/// as required by lookup arguments.
fn lower_unit(expr: &Expr, handle: &str) -> Result<mir::Expr, StructuralError> {
    let mut exprs = lower_expr(expr)?;
    if exprs.len() != 1 {
        return Err(StructuralError::MalformedExpression(format!(
            "argument of {handle} does not lower to a single expression"
        )));
    }
    Ok(exprs.pop().expect("just checked for length one"))
}

// EXPANSION
// ================================================================================================

/// Expands an expression into one or more expressions by flattening lists
/// and splitting conditionals.
///
/// A list such as `(begin (- X Y) (- Y Z))` becomes the two expressions
/// `(- X Y)` and `(- Y Z)`; a conditional with both branches becomes one
/// expression per branch; and an n-ary operator produces the cross product
/// of its arguments' expansions, flattening nested sums and products of the
/// same kind.
fn expand(expr: &Expr) -> Result<Vec<Expr>, StructuralError> {
    match expr {
        Expr::Const(_) | Expr::Column { .. } => Ok(vec![expr.clone()]),
        Expr::Add(args) => expand_nary(args, |nargs| {
            let mut flat = Vec::with_capacity(nargs.len());
            for arg in nargs {
                match arg {
                    Expr::Add(inner) => flat.extend(inner),
                    arg => flat.push(arg),
                }
            }
            Expr::Add(flat)
        }),
        Expr::Sub(args) => expand_nary(args, Expr::Sub),
        Expr::Mul(args) => expand_nary(args, |nargs| {
            let mut flat = Vec::with_capacity(nargs.len());
            for arg in nargs {
                match arg {
                    Expr::Mul(inner) => flat.extend(inner),
                    arg => flat.push(arg),
                }
            }
            Expr::Mul(flat)
        }),
        Expr::List(args) => {
            let mut expansions = Vec::new();
            for arg in args {
                expansions.extend(expand(arg)?);
            }
            Ok(expansions)
        },
        Expr::Exp(arg, pow) => Ok(expand(arg)?
            .into_iter()
            .map(|e| Expr::Exp(Box::new(e), *pow))
            .collect()),
        Expr::Norm(arg) => Ok(expand(arg)?
            .into_iter()
            .map(|e| Expr::Norm(Box::new(e)))
            .collect()),
        Expr::IfZero { cond, on_zero, on_nonzero } => {
            // a list-valued condition has no single value to branch on
            if cond.contains_list() {
                return Err(StructuralError::MalformedExpression(
                    "if-zero condition contains a list".to_string(),
                ));
            }
            let conds = expand(cond)?;
            let mut expansions = Vec::new();
            if let Some(branch) = on_zero {
                let bodies = expand(branch)?;
                for cond in &conds {
                    for body in &bodies {
                        expansions.push(Expr::IfZero {
                            cond: Box::new(cond.clone()),
                            on_zero: Some(Box::new(body.clone())),
                            on_nonzero: None,
                        });
                    }
                }
            }
            if let Some(branch) = on_nonzero {
                let bodies = expand(branch)?;
                for cond in &conds {
                    for body in &bodies {
                        expansions.push(Expr::IfZero {
                            cond: Box::new(cond.clone()),
                            on_zero: None,
                            on_nonzero: Some(Box::new(body.clone())),
                        });
                    }
                }
            }
            Ok(expansions)
        },
    }
}

/// Expands the arguments of an n-ary expression and rebuilds one expression
/// per combination.
///
/// This cross product is what makes expansion multiplicative: an expression
/// such as `(if X Y Z) + (if A B C)` produces four MIR expressions.
fn expand_nary(
    args: &[Expr],
    rebuild: impl Fn(Vec<Expr>) -> Expr,
) -> Result<Vec<Expr>, StructuralError> {
    let mut combinations: Vec<Vec<Expr>> = vec![Vec::new()];
    for arg in args {
        let expansions = expand(arg)?;
        let mut next = Vec::with_capacity(combinations.len() * expansions.len());
        for prefix in &combinations {
            for expansion in &expansions {
                let mut combination = prefix.clone();
                combination.push(expansion.clone());
                next.push(combination);
            }
        }
        combinations = next;
    }
    Ok(combinations.into_iter().map(rebuild).collect())
}

// EXTRACTION
// ================================================================================================

/// Extracts the condition of an expanded expression: every expression can be
/// viewed as the conditional constraint `if C then B`, and this returns `C`
/// (or `None` when the body is unconditional).
fn extract_condition(expr: &Expr) -> Result<Option<mir::Expr>, StructuralError> {
    match expr {
        Expr::Const(_) | Expr::Column { .. } => Ok(None),
        Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) => extract_conditions(args),
        Expr::Exp(arg, _) | Expr::Norm(arg) => extract_condition(arg),
        Expr::IfZero { cond, on_zero, on_nonzero } => {
            let outer = extract_condition(cond)?;
            let cond_body = extract_body(cond)?;
            let (guard, inner) = match (on_zero, on_nonzero) {
                (Some(branch), None) => {
                    // (1 - norm(c)) guards the zero branch
                    let guard = mir::Expr::Sub(vec![
                        mir::Expr::Const(Felt::from(1u64)),
                        mir::Expr::Norm(Box::new(cond_body)),
                    ]);
                    (guard, extract_condition(branch)?)
                },
                (None, Some(branch)) => (cond_body, extract_condition(branch)?),
                // expansion guarantees exactly one live branch
                _ => {
                    return Err(StructuralError::MalformedExpression(
                        "unexpanded if-zero".to_string(),
                    ))
                },
            };
            Ok(mul2(mul2(outer, Some(guard)), inner))
        },
        Expr::List(_) => Err(StructuralError::MalformedExpression(
            "unexpanded list".to_string(),
        )),
    }
}

fn extract_conditions(args: &[Expr]) -> Result<Option<mir::Expr>, StructuralError> {
    let mut condition = None;
    for arg in args {
        condition = mul2(condition, extract_condition(arg)?);
    }
    Ok(condition)
}

/// Extracts the body of an expanded expression: the structural translation
/// into MIR, dropping the dead branch of every conditional.
fn extract_body(expr: &Expr) -> Result<mir::Expr, StructuralError> {
    match expr {
        Expr::Const(value) => Ok(mir::Expr::Const(*value)),
        Expr::Column { name, shift } => {
            Ok(mir::Expr::Column { name: name.clone(), shift: *shift })
        },
        Expr::Add(args) => Ok(mir::Expr::Add(extract_bodies(args)?)),
        Expr::Sub(args) => Ok(mir::Expr::Sub(extract_bodies(args)?)),
        Expr::Mul(args) => Ok(mir::Expr::Mul(extract_bodies(args)?)),
        Expr::Exp(arg, pow) => Ok(mir::Expr::Exp(Box::new(extract_body(arg)?), *pow)),
        Expr::Norm(arg) => Ok(mir::Expr::Norm(Box::new(extract_body(arg)?))),
        Expr::IfZero { on_zero, on_nonzero, .. } => match (on_zero, on_nonzero) {
            (Some(branch), None) | (None, Some(branch)) => extract_body(branch),
            // expansion guarantees exactly one live branch
            _ => Err(StructuralError::MalformedExpression(
                "unexpanded if-zero".to_string(),
            )),
        },
        Expr::List(_) => Err(StructuralError::MalformedExpression(
            "unexpanded list".to_string(),
        )),
    }
}

fn extract_bodies(args: &[Expr]) -> Result<Vec<mir::Expr>, StructuralError> {
    args.iter().map(extract_body).collect()
}

// HELPER FUNCTIONS
// ================================================================================================

/// Multiplies two optional expressions, fusing adjacent products so that
/// chained guards collapse into a single `mul` node.
fn mul2(lhs: Option<mir::Expr>, rhs: Option<mir::Expr>) -> Option<mir::Expr> {
    match (lhs, rhs) {
        (None, rhs) => rhs,
        (lhs, None) => lhs,
        (Some(mir::Expr::Mul(mut lhs)), Some(mir::Expr::Mul(rhs))) => {
            lhs.extend(rhs);
            Some(mir::Expr::Mul(lhs))
        },
        (Some(mir::Expr::Mul(mut lhs)), Some(rhs)) => {
            lhs.push(rhs);
            Some(mir::Expr::Mul(lhs))
        },
        (Some(lhs), Some(mir::Expr::Mul(mut rhs))) => {
            rhs.push(lhs);
            Some(mir::Expr::Mul(rhs))
        },
        (Some(lhs), Some(rhs)) => Some(mir::Expr::Mul(vec![lhs, rhs])),
    }
}
