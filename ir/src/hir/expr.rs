// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use schema::{ContextResolver, Evaluable, Testable};
use trace::{
    felt::{Felt, One, Zero},
    Bounds, Context, Trace,
};

// HIR EXPRESSION
// ================================================================================================

/// A high-level expression.
///
/// `Add`, `Sub`, and `Mul` are n-ary and fold left to right. An `IfZero`
/// selects its first branch when the condition evaluates to zero and its
/// second branch otherwise; a missing branch makes the expression undefined
/// for the rows which would take it. A `List` stands for several constraints
/// at once and disappears during lowering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Const(Felt),
    Column { name: String, shift: isize },
    Add(Vec<Expr>),
    Sub(Vec<Expr>),
    Mul(Vec<Expr>),
    Exp(Box<Expr>, u64),
    Norm(Box<Expr>),
    IfZero {
        cond: Box<Expr>,
        on_zero: Option<Box<Expr>>,
        on_nonzero: Option<Box<Expr>>,
    },
    List(Vec<Expr>),
}

impl Expr {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    /// Returns a constant expression.
    pub fn constant(value: u64) -> Self {
        Expr::Const(Felt::from(value))
    }

    /// Returns an access of the named column on the current row.
    pub fn column(name: impl Into<String>) -> Self {
        Expr::shifted(name, 0)
    }

    /// Returns an access of the named column shifted by `shift` rows.
    pub fn shifted(name: impl Into<String>, shift: isize) -> Self {
        Expr::Column { name: name.into(), shift }
    }

    /// Returns an `if-zero` with both branches present.
    pub fn if_zero(cond: Expr, on_zero: Expr, on_nonzero: Expr) -> Self {
        Expr::IfZero {
            cond: Box::new(cond),
            on_zero: Some(Box::new(on_zero)),
            on_nonzero: Some(Box::new(on_nonzero)),
        }
    }

    /// Returns an `if-zero` enforcing its body only on rows where the
    /// condition vanishes.
    pub fn when_zero(cond: Expr, body: Expr) -> Self {
        Expr::IfZero {
            cond: Box::new(cond),
            on_zero: Some(Box::new(body)),
            on_nonzero: None,
        }
    }

    /// Returns an `if-zero` enforcing its body only on rows where the
    /// condition does not vanish. This is the `IfNotZero` form of the
    /// frontend.
    pub fn when_nonzero(cond: Expr, body: Expr) -> Self {
        Expr::IfZero {
            cond: Box::new(cond),
            on_zero: None,
            on_nonzero: Some(Box::new(body)),
        }
    }

    // EVALUATION
    // --------------------------------------------------------------------------------------------

    /// Evaluates this expression at the specified row, yielding zero or more
    /// values.
    ///
    /// A value is `None` (⊥) when a shifted access escapes the trace or the
    /// branch an `if-zero` would take is absent. Lists concatenate the values
    /// of their elements; every other n-ary constructor combines the values
    /// of its arguments as a cross product.
    pub fn eval_all_at(&self, row: isize, trace: &Trace) -> Vec<Option<Felt>> {
        match self {
            Expr::Const(value) => vec![Some(*value)],
            Expr::Column { name, shift } => {
                let value = trace
                    .column_by_name(name)
                    .and_then(|col| col.try_get(row + shift));
                vec![value]
            },
            Expr::Add(args) => eval_nary(args, row, trace, |l, r| l + r),
            Expr::Sub(args) => eval_nary(args, row, trace, |l, r| l - r),
            Expr::Mul(args) => eval_nary(args, row, trace, |l, r| l * r),
            Expr::Exp(arg, pow) => arg
                .eval_all_at(row, trace)
                .into_iter()
                .map(|v| v.map(|v| trace::felt::pow(v, *pow)))
                .collect(),
            Expr::Norm(arg) => arg
                .eval_all_at(row, trace)
                .into_iter()
                .map(|v| v.map(normalise))
                .collect(),
            Expr::IfZero { cond, on_zero, on_nonzero } => {
                let mut values = Vec::new();
                for cond_value in cond.eval_all_at(row, trace) {
                    let branch = match cond_value {
                        None => {
                            values.push(None);
                            continue;
                        },
                        Some(c) if c.is_zero() => on_zero,
                        Some(_) => on_nonzero,
                    };
                    match branch {
                        Some(branch) => values.extend(branch.eval_all_at(row, trace)),
                        None => values.push(None),
                    }
                }
                values
            },
            Expr::List(args) => args.iter().flat_map(|arg| arg.eval_all_at(row, trace)).collect(),
        }
    }

    // ANALYSIS
    // --------------------------------------------------------------------------------------------

    /// Returns the maximum backward and forward row shifts reachable from
    /// this expression.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::ZERO;
        match self {
            Expr::Const(_) => {},
            Expr::Column { shift, .. } => bounds = Bounds::for_shift(*shift),
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) | Expr::List(args) => {
                for arg in args {
                    bounds.union(arg.bounds());
                }
            },
            Expr::Exp(arg, _) | Expr::Norm(arg) => bounds = arg.bounds(),
            Expr::IfZero { cond, on_zero, on_nonzero } => {
                bounds = cond.bounds();
                if let Some(branch) = on_zero {
                    bounds.union(branch.bounds());
                }
                if let Some(branch) = on_nonzero {
                    bounds.union(branch.bounds());
                }
            },
        }
        bounds
    }

    /// Collects the names of all columns accessed by this expression.
    pub fn collect_dependencies(&self, deps: &mut Vec<String>) {
        match self {
            Expr::Const(_) => {},
            Expr::Column { name, .. } => deps.push(name.clone()),
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) | Expr::List(args) => {
                for arg in args {
                    arg.collect_dependencies(deps);
                }
            },
            Expr::Exp(arg, _) | Expr::Norm(arg) => arg.collect_dependencies(deps),
            Expr::IfZero { cond, on_zero, on_nonzero } => {
                cond.collect_dependencies(deps);
                if let Some(branch) = on_zero {
                    branch.collect_dependencies(deps);
                }
                if let Some(branch) = on_nonzero {
                    branch.collect_dependencies(deps);
                }
            },
        }
    }

    /// Returns the evaluation context of this expression: the join of the
    /// contexts of its column accesses.
    pub fn context(&self, resolver: &dyn ContextResolver) -> Context {
        let mut deps = Vec::new();
        self.collect_dependencies(&mut deps);
        let mut ctx = Context::void();
        for name in deps {
            match resolver.context_of(&name) {
                Some(col_ctx) => ctx = ctx.join(col_ctx),
                None => return Context::conflicted(),
            }
        }
        ctx
    }

    /// Returns true if this expression contains a list anywhere in its tree.
    pub fn contains_list(&self) -> bool {
        match self {
            Expr::Const(_) | Expr::Column { .. } => false,
            Expr::List(_) => true,
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) => {
                args.iter().any(Expr::contains_list)
            },
            Expr::Exp(arg, _) | Expr::Norm(arg) => arg.contains_list(),
            Expr::IfZero { cond, on_zero, on_nonzero } => {
                cond.contains_list()
                    || on_zero.as_ref().is_some_and(|b| b.contains_list())
                    || on_nonzero.as_ref().is_some_and(|b| b.contains_list())
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{value}"),
            Expr::Column { name, shift: 0 } => write!(f, "{name}"),
            Expr::Column { name, shift } => write!(f, "(shift {name} {shift})"),
            Expr::Add(args) => write_nary(f, "+", args),
            Expr::Sub(args) => write_nary(f, "-", args),
            Expr::Mul(args) => write_nary(f, "*", args),
            Expr::Exp(arg, pow) => write!(f, "(^ {arg} {pow})"),
            Expr::Norm(arg) => write!(f, "(~ {arg})"),
            Expr::IfZero { cond, on_zero, on_nonzero } => {
                write!(f, "(if {cond}")?;
                if let Some(branch) = on_zero {
                    write!(f, " {branch}")?;
                }
                if let Some(branch) = on_nonzero {
                    write!(f, " {branch}")?;
                }
                write!(f, ")")
            },
            Expr::List(args) => write_nary(f, "begin", args),
        }
    }
}

// HELPER FUNCTIONS
// ================================================================================================

/// Evaluates all arguments of an n-ary expression at a row and folds every
/// combination of their values left to right.
fn eval_nary(
    args: &[Expr],
    row: isize,
    trace: &Trace,
    f: impl Fn(Felt, Felt) -> Felt + Copy,
) -> Vec<Option<Felt>> {
    let mut acc = args[0].eval_all_at(row, trace);
    for arg in &args[1..] {
        let values = arg.eval_all_at(row, trace);
        let mut next = Vec::with_capacity(acc.len() * values.len());
        for lhs in &acc {
            for rhs in &values {
                next.push(match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => Some(f(*lhs, *rhs)),
                    _ => None,
                });
            }
        }
        acc = next;
    }
    acc
}

fn normalise(value: Felt) -> Felt {
    if value.is_zero() {
        value
    } else {
        Felt::one()
    }
}

fn write_nary(f: &mut fmt::Formatter<'_>, op: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "({op}")?;
    for arg in args {
        write!(f, " {arg}")?;
    }
    write!(f, ")")
}

// ZERO ARRAY TEST
// ================================================================================================

/// Wraps an HIR expression as a vanishing test: every value of the
/// expression must be zero, and undefined values are taken to hold.
#[derive(Clone, Debug)]
pub struct ZeroArrayTest(pub Expr);

impl Testable for ZeroArrayTest {
    fn test_at(&self, row: isize, trace: &Trace) -> bool {
        self.0
            .eval_all_at(row, trace)
            .into_iter()
            .all(|value| value.is_none_or(|v| v.is_zero()))
    }

    fn bounds(&self) -> Bounds {
        self.0.bounds()
    }

    fn context(&self, resolver: &dyn ContextResolver) -> Context {
        self.0.context(resolver)
    }
}

impl fmt::Display for ZeroArrayTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// UNIT EXPRESSION
// ================================================================================================

/// Wraps an HIR expression which is expected to evaluate to exactly one
/// value, as required by range and lookup constraints.
///
/// Evaluation takes the first value and substitutes zero for ⊥, which keeps
/// it total.
#[derive(Clone, Debug)]
pub struct UnitExpr(pub Expr);

impl Evaluable for UnitExpr {
    fn eval_at(&self, row: isize, trace: &Trace) -> Felt {
        self.0
            .eval_all_at(row, trace)
            .into_iter()
            .next()
            .flatten()
            .unwrap_or_else(Felt::zero)
    }

    fn bounds(&self) -> Bounds {
        self.0.bounds()
    }

    fn context(&self, resolver: &dyn ContextResolver) -> Context {
        self.0.context(resolver)
    }

    fn collect_dependencies(&self, deps: &mut Vec<String>) {
        self.0.collect_dependencies(deps);
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
