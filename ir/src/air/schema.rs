// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use schema::{
    acceptor,
    assignment::{self, Assignment},
    constraint::{
        Constraint, LookupConstraint, PermutationConstraint, PropertyAssertion, RangeConstraint,
        SortedConstraint, VanishingConstraint,
    },
    CheckOptions, ColumnDecl, ContextResolver, Error, Evaluable, StructuralError, TypedColumn,
};
use trace::{felt::Felt, Context, Trace};

use super::Expr;
use crate::mir;

// AIR SCHEMA
// ================================================================================================

/// A fully lowered schema: residual vanishing and range constraints over a
/// set of declared columns, plus the assignments which materialize computed
/// columns during trace expansion.
#[derive(Clone, Default)]
pub struct Schema {
    modules: Vec<String>,
    columns: Vec<ColumnDecl>,
    index: HashMap<String, usize>,
    assignments: Vec<Box<dyn Assignment>>,
    vanishing: Vec<VanishingConstraint<Expr>>,
    ranges: Vec<RangeConstraint<Expr>>,
    permutations: Vec<PermutationConstraint>,
    sorted: Vec<SortedConstraint>,
    lookups: Vec<LookupConstraint<Expr>>,
    assertions: Vec<PropertyAssertion<mir::Expr>>,
    max_degree: usize,
    counter: usize,
}

impl Schema {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns an empty schema with the specified modules and maximum
    /// residual constraint degree.
    pub fn new(modules: Vec<String>, max_degree: usize) -> Self {
        Schema {
            modules,
            max_degree,
            ..Self::default()
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the names of the modules of this schema.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Returns the columns declared in this schema, inputs and synthetic
    /// columns alike.
    pub fn columns(&self) -> &[ColumnDecl] {
        &self.columns
    }

    /// Returns the assignments of this schema in declaration (and therefore
    /// topological) order.
    pub fn assignments(&self) -> &[Box<dyn Assignment>] {
        &self.assignments
    }

    /// Returns the vanishing constraints of this schema.
    pub fn vanishing_constraints(&self) -> &[VanishingConstraint<Expr>] {
        &self.vanishing
    }

    /// Returns the range constraints of this schema.
    pub fn range_constraints(&self) -> &[RangeConstraint<Expr>] {
        &self.ranges
    }

    /// Returns the maximum residual constraint degree of this schema.
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Returns true if this schema declares a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the declaration of the named column, if any.
    pub fn column(&self, name: &str) -> Option<&ColumnDecl> {
        self.index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Returns a fresh identifier for naming synthetic columns. Identifiers
    /// are handed out in declaration order, which keeps lowering
    /// deterministic.
    pub fn fresh_id(&mut self) -> usize {
        let id = self.counter;
        self.counter += 1;
        id
    }

    // SCHEMA CONSTRUCTION
    // --------------------------------------------------------------------------------------------

    /// Declares a column.
    pub fn add_column(&mut self, decl: ColumnDecl) -> Result<(), StructuralError> {
        if self.has_column(decl.name()) {
            return Err(StructuralError::DuplicateColumn(decl.name().to_string()));
        }
        self.index.insert(decl.name().to_string(), self.columns.len());
        self.columns.push(decl);
        Ok(())
    }

    /// Registers an assignment. Assignments must be registered after the
    /// assignments computing their dependencies.
    pub fn add_assignment(&mut self, assignment: Box<dyn Assignment>) {
        self.assignments.push(assignment);
    }

    /// Appends a vanishing constraint over the specified row domain.
    pub fn add_vanishing_constraint(
        &mut self,
        handle: impl Into<String>,
        domain: Option<isize>,
        expr: Expr,
    ) -> Result<(), StructuralError> {
        let handle = handle.into();
        let context = self.context_of_expr(&expr, &handle)?;
        debug_assert!(
            self.max_degree == 0 || expr.degree() <= self.max_degree,
            "constraint {handle} exceeds the maximum degree of {}",
            self.max_degree
        );
        self.vanishing.push(VanishingConstraint::new(handle, context, domain, expr));
        Ok(())
    }

    /// Appends a range constraint.
    pub fn add_range_constraint(
        &mut self,
        handle: impl Into<String>,
        expr: Expr,
        bound: Felt,
    ) -> Result<(), StructuralError> {
        let handle = handle.into();
        let context = self.context_of_expr(&expr, &handle)?;
        self.ranges.push(RangeConstraint::new(handle, context, expr, bound));
        Ok(())
    }

    /// Appends a permutation constraint.
    pub fn add_permutation_constraint(&mut self, constraint: PermutationConstraint) {
        self.permutations.push(constraint);
    }

    /// Appends a sorted permutation constraint.
    pub fn add_sorted_constraint(&mut self, constraint: SortedConstraint) {
        self.sorted.push(constraint);
    }

    /// Appends a lookup constraint.
    pub fn add_lookup_constraint(&mut self, constraint: LookupConstraint<Expr>) {
        self.lookups.push(constraint);
    }

    /// Appends a property assertion. Assertions keep their mid-level
    /// expressions: they are advisory and are never lowered.
    pub fn add_property_assertion(&mut self, assertion: PropertyAssertion<mir::Expr>) {
        self.assertions.push(assertion);
    }

    /// Computes the context of a constraint expression, verifying that every
    /// accessed column is declared and that no two accesses cross modules.
    fn context_of_expr(&self, expr: &Expr, handle: &str) -> Result<Context, StructuralError> {
        let mut deps = Vec::new();
        Evaluable::collect_dependencies(expr, &mut deps);
        for dep in &deps {
            if !self.has_column(dep) {
                return Err(StructuralError::MissingColumn(dep.clone()));
            }
        }
        let context = Evaluable::context(expr, self);
        if context.is_conflicted() {
            return Err(StructuralError::ConflictingContext(handle.to_string()));
        }
        Ok(context)
    }

    // TRACE EXPANSION
    // --------------------------------------------------------------------------------------------

    /// Expands a trace by front-padding it with the schema's spillage and
    /// executing every assignment in declaration order.
    pub fn expand_trace(&self, trace: &mut Trace) -> Result<(), StructuralError> {
        assignment::expand_trace(&self.assignments, trace)
    }

    /// Returns the minimum amount of front padding required so that computed
    /// columns never read past the start of the trace.
    pub fn required_spillage(&self) -> usize {
        assignment::required_spillage(&self.assignments)
    }

    // ACCEPTANCE
    // --------------------------------------------------------------------------------------------

    /// Checks whether an (expanded) trace satisfies this schema.
    ///
    /// Structural defects — above all, columns which the trace does not
    /// contain — are reported before any constraint is evaluated; constraint
    /// failures are reported with the first failing constraint in
    /// declaration order.
    pub fn accepts(&self, options: &CheckOptions, trace: &Trace) -> Result<(), Error> {
        for decl in &self.columns {
            if !trace.has_column(decl.name()) {
                return Err(StructuralError::MissingColumn(decl.name().to_string()).into());
            }
        }
        let typed: Vec<TypedColumn> = if options.type_checks() {
            self.columns.iter().map(|decl| TypedColumn(decl.clone())).collect()
        } else {
            Vec::new()
        };
        let mut constraints: Vec<&dyn Constraint> = Vec::new();
        constraints.extend(typed.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.vanishing.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.ranges.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.permutations.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.sorted.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.lookups.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.assertions.iter().map(|c| c as &dyn Constraint));
        acceptor::accepts(options, &constraints, trace)?;
        Ok(())
    }
}

impl ContextResolver for Schema {
    fn context_of(&self, name: &str) -> Option<Context> {
        self.column(name).map(|decl| decl.context())
    }
}

impl core::fmt::Display for Schema {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for column in &self.columns {
            writeln!(f, "{column}")?;
        }
        for assignment in &self.assignments {
            writeln!(f, "{assignment}")?;
        }
        for constraint in &self.vanishing {
            writeln!(f, "{constraint}")?;
        }
        for constraint in &self.ranges {
            writeln!(f, "{constraint}")?;
        }
        for constraint in &self.permutations {
            writeln!(f, "{constraint}")?;
        }
        for constraint in &self.sorted {
            writeln!(f, "{constraint}")?;
        }
        for constraint in &self.lookups {
            writeln!(f, "{constraint}")?;
        }
        for assertion in &self.assertions {
            writeln!(f, "{assertion}")?;
        }
        Ok(())
    }
}
