// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use core::fmt;

use schema::{ContextResolver, Evaluable, Testable};
use trace::{
    felt::{Felt, Zero},
    Bounds, Context, Trace,
};

use crate::mir;

// AIR EXPRESSION
// ================================================================================================

/// A residual arithmetic expression: a polynomial over shifted column
/// accesses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Const(Felt),
    Column { name: String, shift: isize },
    Add(Vec<Expr>),
    Sub(Vec<Expr>),
    Mul(Vec<Expr>),
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

    /// Returns the difference of this expression and another one.
    pub fn equate(self, other: Expr) -> Self {
        Expr::Sub(vec![self, other])
    }

    // EVALUATION
    // --------------------------------------------------------------------------------------------

    /// Evaluates this expression at the specified row of the trace.
    ///
    /// Evaluation is total: rows outside a column resolve to the column's
    /// padding value.
    pub fn eval_at(&self, row: isize, trace: &Trace) -> Felt {
        match self {
            Expr::Const(value) => *value,
            Expr::Column { name, shift } => {
                trace.get_by_name(name, row + shift).unwrap_or_else(Felt::zero)
            },
            Expr::Add(args) => fold_args(args, row, trace, |l, r| l + r),
            Expr::Sub(args) => fold_args(args, row, trace, |l, r| l - r),
            Expr::Mul(args) => fold_args(args, row, trace, |l, r| l * r),
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
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) => {
                for arg in args {
                    bounds.union(arg.bounds());
                }
            },
        }
        bounds
    }

    /// Returns the polynomial degree of this expression.
    pub fn degree(&self) -> usize {
        match self {
            Expr::Const(_) => 0,
            Expr::Column { .. } => 1,
            Expr::Add(args) | Expr::Sub(args) => {
                args.iter().map(Expr::degree).max().unwrap_or(0)
            },
            Expr::Mul(args) => args.iter().map(Expr::degree).sum(),
        }
    }

    /// Embeds this expression into the MIR expression language, which is the
    /// computation language of synthetic columns.
    pub fn to_mir(&self) -> mir::Expr {
        match self {
            Expr::Const(value) => mir::Expr::Const(*value),
            Expr::Column { name, shift } => mir::Expr::Column { name: name.clone(), shift: *shift },
            Expr::Add(args) => mir::Expr::Add(args.iter().map(Expr::to_mir).collect()),
            Expr::Sub(args) => mir::Expr::Sub(args.iter().map(Expr::to_mir).collect()),
            Expr::Mul(args) => mir::Expr::Mul(args.iter().map(Expr::to_mir).collect()),
        }
    }
}

impl Evaluable for Expr {
    fn eval_at(&self, row: isize, trace: &Trace) -> Felt {
        Expr::eval_at(self, row, trace)
    }

    fn bounds(&self) -> Bounds {
        Expr::bounds(self)
    }

    fn context(&self, resolver: &dyn ContextResolver) -> Context {
        let mut deps = Vec::new();
        Evaluable::collect_dependencies(self, &mut deps);
        let mut ctx = Context::void();
        for name in deps {
            match resolver.context_of(&name) {
                Some(col_ctx) => ctx = ctx.join(col_ctx),
                None => return Context::conflicted(),
            }
        }
        ctx
    }

    fn collect_dependencies(&self, deps: &mut Vec<String>) {
        match self {
            Expr::Const(_) => {},
            Expr::Column { name, .. } => deps.push(name.clone()),
            Expr::Add(args) | Expr::Sub(args) | Expr::Mul(args) => {
                for arg in args {
                    Evaluable::collect_dependencies(arg, deps);
                }
            },
        }
    }
}

impl Testable for Expr {
    fn test_at(&self, row: isize, trace: &Trace) -> bool {
        self.eval_at(row, trace).is_zero()
    }

    fn bounds(&self) -> Bounds {
        Expr::bounds(self)
    }

    fn context(&self, resolver: &dyn ContextResolver) -> Context {
        Evaluable::context(self, resolver)
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
        }
    }
}

// HELPER FUNCTIONS
// ================================================================================================

fn fold_args(args: &[Expr], row: isize, trace: &Trace, f: impl Fn(Felt, Felt) -> Felt) -> Felt {
    let mut value = args[0].eval_at(row, trace);
    for arg in &args[1..] {
        value = f(value, arg.eval_at(row, trace));
    }
    value
}

fn write_nary(f: &mut fmt::Formatter<'_>, op: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "({op}")?;
    for arg in args {
        write!(f, " {arg}")?;
    }
    write!(f, ")")
}
