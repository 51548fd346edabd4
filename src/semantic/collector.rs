//! Declaration collection (first pass)
//!
//! Walks the statement sequences of the program in order, registering
//! struct and function types and binding every declared name, so that
//! duplicate definitions are found before any expression is typed. A bare
//! identifier or call used as a statement before its name is declared is
//! reported here.

use log::debug;

use crate::ast::{Expr, ExprKind, FunDecl, Program, Stmt, StmtKind, StructDecl};
use crate::error::{SemaError, SemaResult};
use crate::semantic::context::AnalysisContext;

pub struct DeclarationCollector<'a> {
    ctx: &'a mut AnalysisContext,
}

impl<'a> DeclarationCollector<'a> {
    pub fn new(ctx: &'a mut AnalysisContext) -> Self {
        Self { ctx }
    }

    pub fn collect(&mut self, program: &mut Program) -> SemaResult<()> {
        self.collect_seq(&mut program.statements)
    }

    fn collect_seq(&mut self, stmts: &mut [Stmt]) -> SemaResult<()> {
        for stmt in stmts.iter_mut() {
            self.collect_stmt(stmt)?;
        }
        Ok(())
    }

    /// Collect a nested block inside its own scope
    fn collect_block(&mut self, stmts: &mut [Stmt]) -> SemaResult<()> {
        self.ctx.enter_block();
        let result = self.collect_seq(stmts);
        self.ctx.exit_scope();
        result
    }

    fn collect_stmt(&mut self, stmt: &mut Stmt) -> SemaResult<()> {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Function(fun) => {
                if self.ctx.depth() != 0 {
                    return Err(SemaError::internal_error(format!(
                        "nested function '{}' at line {} is not supported",
                        fun.name, line
                    )));
                }
                self.collect_function(fun, line)
            }

            StmtKind::StructDefine(def) => {
                if self.ctx.depth() != 0 {
                    return Err(SemaError::internal_error(format!(
                        "nested struct '{}' at line {} is not supported",
                        def.name, line
                    )));
                }
                self.collect_struct(def, line);
                Ok(())
            }

            StmtKind::Declare(decl) => {
                self.ctx.declare_var(decl);
                Ok(())
            }

            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.collect_block(then_branch)?;
                self.collect_block(else_branch)
            }

            StmtKind::Repeat { body, .. } => self.collect_block(body),

            StmtKind::Expr(expr) => {
                self.check_reference(expr);
                Ok(())
            }

            StmtKind::Return(_) | StmtKind::Write(_) | StmtKind::Read(_) | StmtKind::Break => {
                Ok(())
            }
        }
    }

    fn collect_function(&mut self, fun: &mut FunDecl, line: usize) -> SemaResult<()> {
        debug!("collecting function '{}'", fun.name);
        self.ctx.declare_function_name(fun, line);
        let registered = self.ctx.register_function(fun, line);

        self.ctx.begin_frame();
        self.ctx.enter_scope();
        self.ctx.declare_params(&mut fun.params);
        let result = self.collect_seq(&mut fun.body);
        self.ctx.exit_scope();

        // The type is registered again while the body is checked
        if registered {
            self.ctx.unregister_function(&fun.name)?;
        }
        result
    }

    fn collect_struct(&mut self, def: &mut StructDecl, line: usize) {
        debug!("collecting struct '{}'", def.name);
        self.ctx.register_struct(&def.name, &def.members, line);

        // Members get a throwaway scope only to catch duplicate names
        self.ctx.enter_scope();
        let scope = self.ctx.depth();
        for member in &def.members {
            if self.ctx.symbols.is_declared_in(&member.name, scope) {
                self.ctx.define_error(
                    format!("duplicate member '{}' in struct '{}'", member.name, def.name),
                    member.line,
                );
                continue;
            }
            self.ctx
                .symbols
                .insert(&member.name, member.line, 0, 0, scope, member.ty.clone());
        }
        self.ctx.exit_scope();
    }

    /// A statement-level identifier or call must name something declared earlier
    fn check_reference(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Id(name) if self.ctx.symbols.lookup(name).is_none() => {
                self.ctx
                    .define_error(format!("undefined variable '{}'", name), expr.line);
            }
            ExprKind::Call { name, .. } if self.ctx.resolve_function(name).is_none() => {
                self.ctx
                    .define_error(format!("undefined function '{}'", name), expr.line);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::types::TypeInfo;
    use pretty_assertions::assert_eq;

    fn collect(mut tree: Program) -> (AnalysisContext, Program) {
        let mut ctx = AnalysisContext::default();
        DeclarationCollector::new(&mut ctx).collect(&mut tree).unwrap();
        (ctx, tree)
    }

    #[test]
    fn test_globals_and_function_names_are_bound() {
        let (ctx, _) = collect(program(vec![
            declare("total", TypeInfo::Integer, 1),
            function(
                "bump",
                vec![param("by", TypeInfo::Integer, 2)],
                TypeInfo::Void,
                vec![declare("tmp", TypeInfo::Integer, 3)],
                2,
            ),
        ]));

        assert_eq!(ctx.symbols.lookup("total").unwrap().offset, 0);
        let bump = ctx.symbols.lookup("bump").unwrap();
        assert_eq!(bump.offset, -1);
        assert!(matches!(bump.ty, TypeInfo::Func(_)));

        // Parameters, locals and the function type are gone again
        assert!(ctx.symbols.lookup("by").is_none());
        assert!(ctx.symbols.lookup("tmp").is_none());
        assert!(ctx.registry.is_empty());
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_local_is_reported_at_second_line() {
        let (ctx, _) = collect(program(vec![function(
            "f",
            vec![param("a", TypeInfo::Integer, 1)],
            TypeInfo::Void,
            vec![declare("a", TypeInfo::Float, 2)],
            1,
        )]));

        let errors = ctx.diagnostics.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "duplicate definition of 'a'");
        assert_eq!(errors[0].location().unwrap().line, 2);
    }

    #[test]
    fn test_struct_stays_registered_and_members_are_checked() {
        let (ctx, tree) = collect(program(vec![
            struct_define(
                "point",
                vec![
                    param("x", TypeInfo::Integer, 2),
                    param("x", TypeInfo::Integer, 3),
                ],
                1,
            ),
            declare("origin", TypeInfo::Struct("point".into()), 5),
        ]));

        assert!(ctx.registry.lookup_struct("point").is_ok());
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(
            ctx.diagnostics.errors()[0].message(),
            "duplicate member 'x' in struct 'point'"
        );
        match &tree.statements[1].kind {
            StmtKind::Declare(decl) => assert_eq!(decl.storage.unwrap().size, 2),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_statement_level_use_before_declaration() {
        let (ctx, _) = collect(program(vec![function(
            "main",
            vec![],
            TypeInfo::Void,
            vec![expr(id("late", 2)), declare("late", TypeInfo::Integer, 3)],
            1,
        )]));

        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics.errors()[0].message(), "undefined variable 'late'");
    }

    #[test]
    fn test_struct_function_name_clash() {
        let (ctx, _) = collect(program(vec![
            struct_define("shape", vec![param("w", TypeInfo::Integer, 2)], 1),
            function("shape", vec![], TypeInfo::Void, vec![], 4),
        ]));

        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(
            ctx.diagnostics.errors()[0].message(),
            "duplicate definition of type 'shape'"
        );
        // The struct survives the failed function registration
        assert!(ctx.registry.lookup_struct("shape").is_ok());
    }

    #[test]
    fn test_nested_function_is_internal_error() {
        let mut ctx = AnalysisContext::default();
        let mut tree = program(vec![function(
            "outer",
            vec![],
            TypeInfo::Void,
            vec![function("inner", vec![], TypeInfo::Void, vec![], 2)],
            1,
        )]);

        let result = DeclarationCollector::new(&mut ctx).collect(&mut tree);
        assert!(matches!(result, Err(SemaError::InternalError { .. })));
    }

    #[test]
    fn test_nested_struct_is_internal_error() {
        let nested = struct_define("inner", vec![param("v", TypeInfo::Integer, 3)], 3);

        let mut ctx = AnalysisContext::default();
        let mut in_function = program(vec![function(
            "outer",
            vec![],
            TypeInfo::Void,
            vec![nested.clone()],
            1,
        )]);
        let result = DeclarationCollector::new(&mut ctx).collect(&mut in_function);
        assert_eq!(
            result,
            Err(SemaError::internal_error(
                "nested struct 'inner' at line 3 is not supported"
            ))
        );

        let mut ctx = AnalysisContext::default();
        let mut in_block = program(vec![if_then(boolean(true, 2), vec![nested], 2)]);
        let result = DeclarationCollector::new(&mut ctx).collect(&mut in_block);
        assert!(matches!(result, Err(SemaError::InternalError { .. })));
        assert!(ctx.registry.lookup_struct("inner").is_err());
    }
}
