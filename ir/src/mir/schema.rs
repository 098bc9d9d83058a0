// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use schema::{
    acceptor,
    assignment::{self, Assignment, SortedPermutation},
    constraint::{
        Constraint, LookupConstraint, PropertyAssertion, RangeConstraint, SortedConstraint,
        VanishingConstraint,
    },
    CheckOptions, ColumnDecl, ContextResolver, Error, Evaluable, StructuralError, TypedColumn,
};
use trace::{felt::Felt, Context, Trace};

use super::Expr;
use crate::SortedPermutationDecl;

// MIR SCHEMA
// ================================================================================================

/// A mid-level schema: flat algebraic constraints over declared columns,
/// together with the sorted permutations which will be realized during the
/// final lowering.
#[derive(Clone, Default)]
pub struct Schema {
    modules: Vec<String>,
    columns: Vec<ColumnDecl>,
    index: HashMap<String, usize>,
    sorted: Vec<SortedPermutationDecl>,
    vanishing: Vec<VanishingConstraint<Expr>>,
    ranges: Vec<RangeConstraint<Expr>>,
    lookups: Vec<LookupConstraint<Expr>>,
    assertions: Vec<PropertyAssertion<Expr>>,
}

impl Schema {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Returns an empty schema with the specified modules.
    pub fn new(modules: Vec<String>) -> Self {
        Schema {
            modules,
            ..Self::default()
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the names of the modules of this schema.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Returns the columns declared in this schema.
    pub fn columns(&self) -> &[ColumnDecl] {
        &self.columns
    }

    /// Returns the sorted permutations declared in this schema.
    pub fn sorted_permutations(&self) -> &[SortedPermutationDecl] {
        &self.sorted
    }

    /// Returns the vanishing constraints of this schema.
    pub fn vanishing_constraints(&self) -> &[VanishingConstraint<Expr>] {
        &self.vanishing
    }

    /// Returns the range constraints of this schema.
    pub fn range_constraints(&self) -> &[RangeConstraint<Expr>] {
        &self.ranges
    }

    /// Returns the lookup constraints of this schema.
    pub fn lookup_constraints(&self) -> &[LookupConstraint<Expr>] {
        &self.lookups
    }

    /// Returns the property assertions of this schema.
    pub fn property_assertions(&self) -> &[PropertyAssertion<Expr>] {
        &self.assertions
    }

    /// Returns true if this schema declares a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the declaration of the named column, if any.
    pub fn column(&self, name: &str) -> Option<&ColumnDecl> {
        self.index.get(name).map(|&idx| &self.columns[idx])
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

    /// Declares a sorted permutation.
    pub fn add_sorted_permutation(&mut self, decl: SortedPermutationDecl) {
        self.sorted.push(decl);
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

    /// Appends a lookup constraint.
    pub fn add_lookup_constraint(
        &mut self,
        handle: impl Into<String>,
        sources: Vec<Expr>,
        targets: Vec<Expr>,
    ) -> Result<(), StructuralError> {
        let handle = handle.into();
        let source_context = self.context_of_exprs(&sources, &handle)?;
        let target_context = self.context_of_exprs(&targets, &handle)?;
        self.lookups.push(LookupConstraint::new(
            handle,
            source_context,
            target_context,
            sources,
            targets,
        ));
        Ok(())
    }

    /// Appends a property assertion.
    pub fn add_property_assertion(
        &mut self,
        handle: impl Into<String>,
        property: Expr,
    ) -> Result<(), StructuralError> {
        let handle = handle.into();
        let context = self.context_of_expr(&property, &handle)?;
        self.assertions.push(PropertyAssertion::new(handle, context, property));
        Ok(())
    }

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

    fn context_of_exprs(&self, exprs: &[Expr], handle: &str) -> Result<Context, StructuralError> {
        let mut context = Context::void();
        for expr in exprs {
            context = context.join(self.context_of_expr(expr, handle)?);
        }
        if context.is_conflicted() {
            return Err(StructuralError::ConflictingContext(handle.to_string()));
        }
        Ok(context)
    }

    // TRACE EXPANSION
    // --------------------------------------------------------------------------------------------

    /// Expands a trace by filling the target columns of the schema's sorted
    /// permutations; all other computed columns only arise after the final
    /// lowering.
    pub fn expand_trace(&self, trace: &mut Trace) -> Result<(), StructuralError> {
        let assignments = self.sorted_assignments()?;
        assignment::expand_trace(&assignments, trace)
    }

    /// Builds the sorted permutation assignments for this schema's
    /// declarations.
    pub(crate) fn sorted_assignments(&self) -> Result<Vec<Box<dyn Assignment>>, StructuralError> {
        self.sorted
            .iter()
            .map(|decl| {
                let targets = decl
                    .targets
                    .iter()
                    .map(|name| {
                        self.column(name)
                            .cloned()
                            .ok_or_else(|| StructuralError::MissingColumn(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(SortedPermutation::new(
                    decl.context,
                    targets,
                    decl.signs.clone(),
                    decl.sources.clone(),
                )) as Box<dyn Assignment>)
            })
            .collect()
    }

    // ACCEPTANCE
    // --------------------------------------------------------------------------------------------

    /// Checks whether an (expanded) trace satisfies this schema.
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
        let sorted: Vec<SortedConstraint> = self
            .sorted
            .iter()
            .map(|decl| {
                SortedConstraint::new(
                    decl.handle(),
                    decl.targets.clone(),
                    decl.signs.clone(),
                    decl.sources.clone(),
                )
            })
            .collect();
        let mut constraints: Vec<&dyn Constraint> = Vec::new();
        constraints.extend(typed.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.vanishing.iter().map(|c| c as &dyn Constraint));
        constraints.extend(self.ranges.iter().map(|c| c as &dyn Constraint));
        constraints.extend(sorted.iter().map(|c| c as &dyn Constraint));
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
