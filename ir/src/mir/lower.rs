// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lowering from MIR to AIR.
//!
//! AIR forbids `norm`, `exp`, and broad ranges, so this pass compiles them
//! out:
//!
//! * `norm(E)` becomes a synthetic binary column `norm#i` together with an
//!   inverse witness column `inv#i` and the residual constraints
//!   `Y·(Y−1) = 0`, `E·(1−Y) = 0`, and `Y − E·I = 0`.
//! * `exp(E, n)` becomes an n-fold product chain.
//! * range constraints are realized as binarity or bitwidth gadgets when
//!   their bound allows it, and as residual range checks otherwise.
//! * sorted permutations are realized as a sorting assignment plus the
//!   lexicographic sorting gadget.
//!
//! The pass also enforces the schema's maximum constraint degree: whenever a
//! residual expression would exceed it, a subterm is split out into a
//! synthetic column `tmp#i` with its own defining constraint. Subterms are
//! chosen deterministically: within a product, the longest prefix of factors
//! fitting the budget is extracted first.

use schema::{
    assignment::{ComputedColumn, SortedPermutation},
    constraint::LookupConstraint,
    CheckOptions, ColumnDecl, ColumnType, Evaluable, StructuralError,
};
use trace::{felt, felt::Felt, Trace};
use tracing::info_span;

use super::{Expr, Schema};
use crate::air;

impl Schema {
    /// Lowers this schema to the AIR level, compiling out every construct
    /// the residual representation does not admit.
    pub fn lower_to_air(&self, options: &CheckOptions) -> Result<air::Schema, StructuralError> {
        let _span = info_span!("lower_to_air", columns = self.columns().len()).entered();
        let mut air = air::Schema::new(self.modules().to_vec(), options.max_degree());

        // first, lower columns; uint columns whose type must be proven get
        // explicit range machinery
        for decl in self.columns() {
            air.add_column(decl.clone())?;
        }
        for decl in self.columns() {
            if decl.must_prove() {
                lower_column_type(&mut air, decl)?;
            }
        }

        // second, realize sorted permutations
        for decl in self.sorted_permutations() {
            let targets = decl
                .targets
                .iter()
                .map(|name| {
                    air.column(name)
                        .cloned()
                        .ok_or_else(|| StructuralError::MissingColumn(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let bitwidth = sort_bitwidth(&air, &decl.sources)?;
            air.add_assignment(Box::new(SortedPermutation::new(
                decl.context,
                targets,
                decl.signs.clone(),
                decl.sources.clone(),
            )));
            air.add_sorted_constraint(schema::constraint::SortedConstraint::new(
                decl.handle(),
                decl.targets.clone(),
                decl.signs.clone(),
                decl.sources.clone(),
            ));
            air::gadgets::apply_lexicographic_sorting_gadget(
                &mut air,
                &decl.targets,
                &decl.signs,
                bitwidth,
            )?;
        }

        // third, lower constraints
        for constraint in self.vanishing_constraints() {
            let expr = lower_expr(&mut air, constraint.handle(), constraint.expr())?;
            let expr = reduce_expr(&mut air, constraint.handle(), expr, options.max_degree())?;
            air.add_vanishing_constraint(constraint.handle(), constraint.domain(), expr)?;
        }
        for constraint in self.range_constraints() {
            lower_range(&mut air, constraint.handle(), constraint.expr(), constraint.bound())?;
        }
        for constraint in self.lookup_constraints() {
            lower_lookup(&mut air, constraint)?;
        }

        // finally, copy property assertions; these are advisory and keep
        // their mid-level expressions
        for assertion in self.property_assertions() {
            air.add_property_assertion(assertion.clone());
        }

        Ok(air)
    }
}

// EXPRESSION LOWERING
// ================================================================================================

/// Lowers a MIR expression to an AIR expression, synthesizing witness
/// columns and residual constraints for every `norm` encountered.
fn lower_expr(
    air: &mut air::Schema,
    handle: &str,
    expr: &Expr,
) -> Result<air::Expr, StructuralError> {
    match expr {
        Expr::Const(value) => Ok(air::Expr::Const(*value)),
        Expr::Column { name, shift } => Ok(air::Expr::Column { name: name.clone(), shift: *shift }),
        Expr::Add(args) => Ok(air::Expr::Add(lower_exprs(air, handle, args)?)),
        Expr::Sub(args) => Ok(air::Expr::Sub(lower_exprs(air, handle, args)?)),
        Expr::Mul(args) => Ok(air::Expr::Mul(lower_exprs(air, handle, args)?)),
        Expr::Exp(arg, pow) => {
            let arg = lower_expr(air, handle, arg)?;
            match *pow {
                0 => Ok(air::Expr::constant(1)),
                1 => Ok(arg),
                pow => Ok(air::Expr::Mul(vec![arg; pow as usize])),
            }
        },
        Expr::Norm(arg) => lower_norm(air, handle, arg),
        Expr::Inv(_) => Err(StructuralError::MalformedExpression(format!(
            "inverse outside a computation in {handle}"
        ))),
    }
}

fn lower_exprs(
    air: &mut air::Schema,
    handle: &str,
    exprs: &[Expr],
) -> Result<Vec<air::Expr>, StructuralError> {
    exprs.iter().map(|e| lower_expr(air, handle, e)).collect()
}

/// Compiles `norm(E)` into a binary value column backed by an inverse
/// witness, and returns an access of the value column.
fn lower_norm(
    air: &mut air::Schema,
    handle: &str,
    arg: &Expr,
) -> Result<air::Expr, StructuralError> {
    let lowered = lower_expr(air, handle, arg)?;

    // a normalise with no column accesses is a constant; fold it
    let context = Evaluable::context(&lowered, air);
    if context.is_void() {
        let value = Expr::Norm(Box::new(arg.clone())).eval_at(0, &Trace::default());
        return Ok(air::Expr::Const(value));
    }

    // the value column appears in degree-2 products below, so its defining
    // expression must leave room for one extra factor
    let max = air.max_degree();
    let lowered = reduce_expr(air, handle, lowered, max)?;
    let lowered = reduce_expr(air, handle, lowered, max.saturating_sub(1).max(1))?;

    let id = air.fresh_id();
    let norm_decl = ColumnDecl::synthetic(context, format!("norm#{id}"), ColumnType::Uint(1));
    let inv_decl = ColumnDecl::synthetic(context, format!("inv#{id}"), ColumnType::Field);
    let y = air::Expr::column(norm_decl.name());
    let i = air::Expr::column(inv_decl.name());
    air.add_column(norm_decl.clone())?;
    air.add_column(inv_decl.clone())?;
    air.add_assignment(Box::new(ComputedColumn::new(inv_decl, Expr::Inv(Box::new(arg.clone())))));
    air.add_assignment(Box::new(ComputedColumn::new(
        norm_decl.clone(),
        Expr::Norm(Box::new(arg.clone())),
    )));

    let one = air::Expr::constant(1);
    // Y * (Y - 1) == 0
    air.add_vanishing_constraint(
        norm_decl.name(),
        None,
        air::Expr::Mul(vec![y.clone(), y.clone().equate(one.clone())]),
    )?;
    // E * (1 - Y) == 0
    air.add_vanishing_constraint(
        norm_decl.name(),
        None,
        air::Expr::Mul(vec![lowered.clone(), one.equate(y.clone())]),
    )?;
    // Y == E * I
    air.add_vanishing_constraint(
        norm_decl.name(),
        None,
        y.clone().equate(air::Expr::Mul(vec![lowered, i])),
    )?;
    Ok(y)
}

// DEGREE REDUCTION
// ================================================================================================

/// Reduces an AIR expression to at most `budget` degrees by splitting
/// subterms out into synthetic columns.
///
/// The choice of subterm is deterministic: sums and differences reduce their
/// arguments; a product extracts the longest prefix of factors whose degrees
/// fit the budget, leftmost first. The defining constraint of every split
/// column has degree at most the schema's maximum.
fn reduce_expr(
    air: &mut air::Schema,
    handle: &str,
    expr: air::Expr,
    budget: usize,
) -> Result<air::Expr, StructuralError> {
    let degree = expr.degree();
    if degree <= budget {
        return Ok(expr);
    }
    if budget <= 1 {
        // nothing of degree one can hold this expression; split it whole
        return extract_subterm(air, handle, expr);
    }
    match expr {
        air::Expr::Add(args) => Ok(air::Expr::Add(reduce_exprs(air, handle, args, budget)?)),
        air::Expr::Sub(args) => Ok(air::Expr::Sub(reduce_exprs(air, handle, args, budget)?)),
        air::Expr::Mul(args) => {
            let mut args = reduce_exprs(air, handle, args, budget)?;
            loop {
                let total: usize = args.iter().map(air::Expr::degree).sum();
                if total <= budget {
                    break;
                }
                // longest prefix of factors fitting the budget
                let mut sum = 0;
                let mut k = 0;
                for arg in &args {
                    let d = arg.degree();
                    if k > 0 && sum + d > budget {
                        break;
                    }
                    sum += d;
                    k += 1;
                }
                let (start, len) = if k >= 2 && sum >= 2 {
                    (0, k)
                } else if args[0].degree() >= 2 {
                    (0, 1)
                } else {
                    // the factor blocking the prefix is itself composite
                    (k, 1)
                };
                let sub = if len == 1 {
                    args[start].clone()
                } else {
                    air::Expr::Mul(args[start..start + len].to_vec())
                };
                if sub.degree() < 2 || sub.degree() > air.max_degree() {
                    return Err(StructuralError::DegreeOverflow(
                        handle.to_string(),
                        total,
                        budget,
                    ));
                }
                let column = extract_subterm(air, handle, sub)?;
                args.splice(start..start + len, [column]);
            }
            Ok(air::Expr::Mul(args))
        },
        // constants and column accesses never exceed the budget
        expr => Ok(expr),
    }
}

fn reduce_exprs(
    air: &mut air::Schema,
    handle: &str,
    exprs: Vec<air::Expr>,
    budget: usize,
) -> Result<Vec<air::Expr>, StructuralError> {
    exprs.into_iter().map(|e| reduce_expr(air, handle, e, budget)).collect()
}

/// Splits a subterm out into a synthetic column `tmp#i` defined by the
/// vanishing constraint `tmp#i − subterm = 0`, and returns an access of the
/// new column.
fn extract_subterm(
    air: &mut air::Schema,
    handle: &str,
    sub: air::Expr,
) -> Result<air::Expr, StructuralError> {
    let context = Evaluable::context(&sub, air);
    if context.is_void() || context.is_conflicted() {
        return Err(StructuralError::ConflictingContext(handle.to_string()));
    }
    let id = air.fresh_id();
    let decl = ColumnDecl::synthetic(context, format!("tmp#{id}"), ColumnType::Field);
    let column = air::Expr::column(decl.name());
    air.add_column(decl.clone())?;
    air.add_assignment(Box::new(ComputedColumn::new(decl.clone(), sub.to_mir())));
    air.add_vanishing_constraint(decl.name(), None, column.clone().equate(sub))?;
    Ok(column)
}

// RANGE LOWERING
// ================================================================================================

/// Lowers a range constraint, choosing its realization from the shape of the
/// bound: a binarity gadget for a bound of two, a bitwidth gadget for a
/// power of 256, and a residual range check otherwise.
fn lower_range(
    air: &mut air::Schema,
    handle: &str,
    expr: &Expr,
    bound: Felt,
) -> Result<(), StructuralError> {
    let lowered = lower_expr(air, handle, expr)?;
    let lowered = reduce_expr(air, handle, lowered, air.max_degree())?;
    if bound == Felt::from(2u64) {
        let column = ensure_column(air, handle, lowered)?;
        air::gadgets::apply_binarity_gadget(air, &column)
    } else if let Some(nbytes) = log256(bound) {
        let column = ensure_column(air, handle, lowered)?;
        air::gadgets::apply_bitwidth_gadget(air, &column, nbytes * 8)
    } else {
        air.add_range_constraint(handle, lowered, bound)
    }
}

/// Lowers the type of a `must_prove` uint column into explicit range
/// machinery.
fn lower_column_type(air: &mut air::Schema, decl: &ColumnDecl) -> Result<(), StructuralError> {
    match decl.ty().bitwidth() {
        None => Ok(()),
        Some(1) => air::gadgets::apply_binarity_gadget(air, decl.name()),
        Some(nbits) if nbits % 8 == 0 => {
            air::gadgets::apply_bitwidth_gadget(air, decl.name(), nbits)
        },
        Some(nbits) => {
            air.add_range_constraint(decl.name(), air::Expr::column(decl.name()), felt::two_pow(nbits))
        },
    }
}

/// Returns the name of a column holding the value of the given expression,
/// synthesizing a computed column when the expression is not already a plain
/// column access.
fn ensure_column(
    air: &mut air::Schema,
    handle: &str,
    expr: air::Expr,
) -> Result<String, StructuralError> {
    if let air::Expr::Column { name, shift: 0 } = &expr {
        return Ok(name.clone());
    }
    let context = Evaluable::context(&expr, air);
    if context.is_void() || context.is_conflicted() {
        return Err(StructuralError::MalformedExpression(format!(
            "range constraint {handle} over an expression with no columns"
        )));
    }
    let id = air.fresh_id();
    let decl = ColumnDecl::synthetic(context, format!("rng#{id}"), ColumnType::Field);
    let column = air::Expr::column(decl.name());
    air.add_column(decl.clone())?;
    air.add_assignment(Box::new(ComputedColumn::new(decl.clone(), expr.to_mir())));
    air.add_vanishing_constraint(decl.name(), None, column.equate(expr))?;
    Ok(decl.name().to_string())
}

/// Returns `k` when `bound == 256^k`, and `None` otherwise.
fn log256(bound: Felt) -> Option<u32> {
    let fr256 = felt::two_pow(8);
    let mut acc = fr256;
    for k in 1..=31 {
        if acc == bound {
            return Some(k);
        }
        acc *= fr256;
    }
    None
}

// LOOKUP AND SORT SUPPORT
// ================================================================================================

fn lower_lookup(
    air: &mut air::Schema,
    constraint: &LookupConstraint<Expr>,
) -> Result<(), StructuralError> {
    let handle = constraint.handle();
    let sources = constraint
        .sources()
        .iter()
        .map(|e| lower_expr(air, handle, e))
        .collect::<Result<Vec<_>, _>>()?;
    let targets = constraint
        .targets()
        .iter()
        .map(|e| lower_expr(air, handle, e))
        .collect::<Result<Vec<_>, _>>()?;
    let (source_context, target_context) = constraint.contexts();
    air.add_lookup_constraint(LookupConstraint::new(
        handle,
        source_context,
        target_context,
        sources,
        targets,
    ));
    Ok(())
}

/// Returns the delta bitwidth of a sorted permutation: the widest declared
/// bitwidth among its source columns.
fn sort_bitwidth(air: &air::Schema, sources: &[String]) -> Result<u32, StructuralError> {
    let mut bitwidth = 0;
    for name in sources {
        let decl = air
            .column(name)
            .ok_or_else(|| StructuralError::MissingColumn(name.clone()))?;
        match decl.ty().bitwidth() {
            Some(nbits) => bitwidth = bitwidth.max(nbits),
            None => {
                return Err(StructuralError::MalformedExpression(format!(
                    "sorted column {name} has no declared bitwidth"
                )))
            },
        }
    }
    Ok(bitwidth)
}
