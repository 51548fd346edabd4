//! Type checker implementation
//!
//! The second analysis pass. It re-establishes each function's scope the
//! way the collector did, resolves identifiers and calls, computes the type
//! of every expression and records it on the node, and reports ill-typed
//! constructs. Only broken tree invariants stop the walk.

use log::{debug, trace};

use super::type_def::{can_convert, TypeInfo};
use super::registry::FuncType;
use crate::ast::{BinaryOp, Expr, ExprKind, FunDecl, Program, Stmt, StmtKind, UnaryOp};
use crate::error::{SemaError, SemaResult};
use crate::semantic::context::AnalysisContext;

/// Type checker
pub struct TypeChecker<'a> {
    ctx: &'a mut AnalysisContext,
    current_function: Option<FuncType>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(ctx: &'a mut AnalysisContext) -> Self {
        Self {
            ctx,
            current_function: None,
        }
    }

    /// Type check an entire program
    pub fn check(&mut self, program: &mut Program) -> SemaResult<()> {
        for stmt in program.statements.iter_mut() {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    /// Bind the declarations of a statement sequence before checking it
    fn declare_block(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts.iter_mut() {
            if let StmtKind::Declare(decl) = &mut stmt.kind {
                self.ctx.declare_var(decl);
            }
        }
    }

    /// Check a nested block in its own scope
    fn check_block(&mut self, stmts: &mut [Stmt]) -> SemaResult<()> {
        self.ctx.enter_block();
        self.declare_block(stmts);
        let result = stmts.iter_mut().try_for_each(|stmt| self.check_stmt(stmt));
        self.ctx.exit_scope();
        result
    }

    fn check_function(&mut self, fun: &mut FunDecl, line: usize) -> SemaResult<()> {
        debug!("checking function '{}'", fun.name);
        self.ctx.begin_frame();
        let registered = self.ctx.register_function(fun, line);

        self.ctx.enter_scope();
        self.ctx.declare_params(&mut fun.params);
        self.declare_block(&mut fun.body);

        let previous = self.current_function.replace(fun.func_type());
        let result = fun
            .body
            .iter_mut()
            .try_for_each(|stmt| self.check_stmt(stmt));
        self.current_function = previous;

        self.ctx.exit_scope();
        if registered {
            self.ctx.unregister_function(&fun.name)?;
        }
        result
    }

    /// Check a statement
    fn check_stmt(&mut self, stmt: &mut Stmt) -> SemaResult<()> {
        let line = stmt.line;
        match &mut stmt.kind {
            StmtKind::Function(fun) => {
                if self.ctx.depth() != 0 {
                    return Err(SemaError::internal_error(format!(
                        "nested function '{}' at line {} is not supported",
                        fun.name, line
                    )));
                }
                self.check_function(fun, line)
            }

            // Bound by the collector (globals, struct types) or by the
            // enclosing block before its statements are checked
            StmtKind::Declare(_) | StmtKind::StructDefine(_) | StmtKind::Break => Ok(()),

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expr(condition)?;
                self.require_boolean(condition, "if");
                self.check_block(then_branch)?;
                self.check_block(else_branch)
            }

            StmtKind::Repeat { body, condition } => {
                // The test sees the body's locals
                self.ctx.enter_block();
                self.declare_block(body);
                let result = body
                    .iter_mut()
                    .try_for_each(|stmt| self.check_stmt(stmt))
                    .and_then(|_| self.check_expr(condition));
                if result.is_ok() {
                    self.require_boolean(condition, "repeat");
                }
                self.ctx.exit_scope();
                result
            }

            StmtKind::Return(value) => {
                let expected = match &self.current_function {
                    Some(ftype) => ftype.return_type.clone(),
                    None => {
                        return Err(SemaError::internal_error(format!(
                            "return outside of a function at line {}",
                            line
                        )))
                    }
                };

                let actual = match value {
                    Some(expr) => {
                        self.check_expr(expr)?;
                        expr.ty.clone()
                    }
                    None => TypeInfo::Void,
                };

                if !can_convert(&expected, &actual)? {
                    self.ctx.type_error(
                        format!(
                            "return type {} does not convert to function return type {}",
                            actual, expected
                        ),
                        line,
                    );
                }
                Ok(())
            }

            StmtKind::Write(value) => {
                self.check_expr(value)?;
                let ty = &value.converted_type;
                if !(ty.is_integer_convertible() || ty.is_pointer()) {
                    let message = format!(
                        "can only write bool, integer, float or pointer values, found {}",
                        ty
                    );
                    self.ctx.type_error(message, line);
                }
                Ok(())
            }

            StmtKind::Read(target) => {
                self.check_expr(target)?;
                if !target.is_id() {
                    self.ctx.type_error("read target must be a variable", line);
                } else if !matches!(
                    target.ty,
                    TypeInfo::Integer | TypeInfo::Float | TypeInfo::Error
                ) {
                    let message = format!("cannot read into a variable of type {}", target.ty);
                    self.ctx.type_error(message, line);
                }
                Ok(())
            }

            StmtKind::Expr(expr) => self.check_expr(expr),
        }
    }

    fn require_boolean(&mut self, condition: &Expr, statement: &str) {
        if !matches!(condition.ty, TypeInfo::Boolean | TypeInfo::Error) {
            self.ctx.type_error(
                format!("{} test is not Boolean", statement),
                condition.line,
            );
        }
    }

    /// Check an expression and record its type on the node
    fn check_expr(&mut self, expr: &mut Expr) -> SemaResult<()> {
        let line = expr.line;
        let mut symbol = None;

        let (ty, converted) = match &mut expr.kind {
            ExprKind::Id(name) => match self.ctx.symbols.lookup(name) {
                Some(entry) => {
                    symbol = Some(entry.clone());
                    (entry.ty.clone(), entry.ty.clone())
                }
                None => {
                    self.ctx
                        .define_error(format!("undefined variable '{}'", name), line);
                    (TypeInfo::Error, TypeInfo::Error)
                }
            },

            ExprKind::Const(literal) => {
                let ty = literal.type_info();
                (ty.clone(), ty)
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.check_unary(*op, operand, line)?;
                (ty.clone(), ty)
            }

            ExprKind::Op { op, left, right } => self.check_binary(*op, left, right, line)?,

            ExprKind::Assign { target, value } => {
                let ty = self.check_assign(target, value, line)?;
                (ty.clone(), ty)
            }

            ExprKind::Index { base, index } => {
                self.check_expr(base)?;
                self.check_expr(index)?;

                if !index.converted_type.is_integer_convertible() {
                    self.ctx.type_error(
                        format!("array index must be an integer, found {}", index.converted_type),
                        line,
                    );
                }

                let ty = match &base.ty {
                    TypeInfo::Array { element, .. } => (**element).clone(),
                    TypeInfo::Error => TypeInfo::Error,
                    other => {
                        let message = format!("indexed expression of type {} is not an array", other);
                        self.ctx.type_error(message, line);
                        TypeInfo::Error
                    }
                };
                (ty.clone(), ty)
            }

            ExprKind::Call { name, args } => {
                let ty = self.check_call(name, args, line)?;
                (ty.clone(), ty)
            }
        };

        trace!("line {}: expression typed {} (as {})", line, ty, converted);
        expr.ty = ty;
        expr.converted_type = converted;
        expr.symbol = symbol;
        Ok(())
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &mut Expr, line: usize) -> SemaResult<TypeInfo> {
        self.check_expr(operand)?;

        match op {
            UnaryOp::Negate => {
                if operand.converted_type.is_integer_convertible() {
                    Ok(operand.ty.clone())
                } else {
                    self.ctx
                        .type_error(format!("cannot negate a value of type {}", operand.ty), line);
                    Ok(TypeInfo::Error)
                }
            }

            UnaryOp::AddressOf => {
                if !operand.is_id() {
                    return Err(SemaError::internal_error(format!(
                        "address-of applied to a non-variable at line {}",
                        line
                    )));
                }
                if operand.ty.is_error() {
                    return Ok(TypeInfo::Error);
                }
                Ok(TypeInfo::pointer_to(operand.ty.clone()))
            }

            UnaryOp::Dereference => {
                if operand.ty.is_error() {
                    return Ok(TypeInfo::Error);
                }
                operand.ty.pointee().ok_or_else(|| {
                    SemaError::internal_error(format!(
                        "dereference of non-pointer type {} at line {}",
                        operand.ty, line
                    ))
                })
            }
        }
    }

    /// Returns the operation's type and the type its value is used as
    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        line: usize,
    ) -> SemaResult<(TypeInfo, TypeInfo)> {
        self.check_expr(left)?;
        self.check_expr(right)?;

        if !left.ty.is_arithmetic_or_pointer() || !right.ty.is_arithmetic_or_pointer() {
            self.ctx.type_error(
                format!(
                    "operator applied to {} and {}, expected bool, integer, float or pointer operands",
                    left.ty, right.ty
                ),
                line,
            );
            return Ok((TypeInfo::Error, TypeInfo::Error));
        }

        let operand_type = if left.ty.is_float() || right.ty.is_float() {
            TypeInfo::Float
        } else {
            TypeInfo::Integer
        };
        promote(left, &operand_type);
        promote(right, &operand_type);

        if op.is_relational() {
            Ok((TypeInfo::Boolean, TypeInfo::Boolean))
        } else {
            Ok((operand_type.clone(), operand_type))
        }
    }

    fn check_assign(&mut self, target: &mut Expr, value: &mut Expr, line: usize) -> SemaResult<TypeInfo> {
        self.check_expr(target)?;
        self.check_expr(value)?;

        if target.ty.is_array() {
            self.ctx.type_error("array cannot be assigned as a whole", line);
            return Ok(TypeInfo::Error);
        }

        let source = value.converted_type.clone();
        let message = match &target.kind {
            ExprKind::Id(name) => format!("cannot convert {} to {} in assignment to '{}'", source, target.ty, name),
            ExprKind::Index { .. }
            | ExprKind::Unary {
                op: UnaryOp::Dereference,
                ..
            } => format!("cannot store {} into a slot of type {}", source, target.ty),
            _ => {
                return Err(SemaError::internal_error(format!(
                    "left side of assignment at line {} is not assignable",
                    line
                )))
            }
        };

        if !can_convert(&target.ty, &source)? {
            self.ctx.type_error(message, line);
            return Ok(target.ty.clone());
        }

        // A literal takes on the type of the slot it is stored into
        if matches!(value.kind, ExprKind::Const(_))
            && matches!(target.ty, TypeInfo::Integer | TypeInfo::Float | TypeInfo::Boolean)
        {
            value.converted_type = target.ty.clone();
        }
        Ok(target.ty.clone())
    }

    fn check_call(&mut self, name: &str, args: &mut [Expr], line: usize) -> SemaResult<TypeInfo> {
        for arg in args.iter_mut() {
            self.check_expr(arg)?;
        }

        let Some(ftype) = self.ctx.resolve_function(name) else {
            self.ctx
                .define_error(format!("undefined function '{}'", name), line);
            return Ok(TypeInfo::Error);
        };

        if args.len() != ftype.params.len() {
            self.ctx.type_error(
                format!(
                    "function '{}' expects {} arguments, got {}",
                    name,
                    ftype.params.len(),
                    args.len()
                ),
                line,
            );
            return Ok(ftype.return_type);
        }

        // Stop at the first argument that does not match
        for (i, (arg, expected)) in args.iter().zip(ftype.params.iter()).enumerate() {
            if !can_convert(expected, &arg.converted_type)? {
                self.ctx.type_error(
                    format!(
                        "argument {} of '{}': cannot convert {} to {}",
                        i + 1,
                        name,
                        arg.converted_type,
                        expected
                    ),
                    line,
                );
                break;
            }
        }

        Ok(ftype.return_type)
    }
}

/// Push an operation's unified operand type down into an operand
///
/// Arithmetic operands pass it on to their own operands; comparisons keep
/// the operand types they unified themselves.
fn promote(expr: &mut Expr, ty: &TypeInfo) {
    expr.converted_type = ty.clone();
    if let ExprKind::Op { op, left, right } = &mut expr.kind {
        if !op.is_relational() {
            promote(left, ty);
            promote(right, ty);
        }
    }
}
