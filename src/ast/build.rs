//! Tree construction helpers
//!
//! Free functions for assembling syntax trees, used by the parser front end
//! and by tests. Every helper takes the source line last.

use super::nodes::*;
use crate::types::TypeInfo;

pub fn id(name: &str, line: usize) -> Expr {
    Expr::new(ExprKind::Id(name.to_string()), line)
}

pub fn int(value: i64, line: usize) -> Expr {
    Expr::new(ExprKind::Const(Literal::Integer(value)), line)
}

pub fn float(value: f64, line: usize) -> Expr {
    Expr::new(ExprKind::Const(Literal::Float(value)), line)
}

pub fn boolean(value: bool, line: usize) -> Expr {
    Expr::new(ExprKind::Const(Literal::Boolean(value)), line)
}

pub fn op(op: BinaryOp, left: Expr, right: Expr, line: usize) -> Expr {
    Expr::new(
        ExprKind::Op {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    )
}

fn unary(op: UnaryOp, operand: Expr, line: usize) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        line,
    )
}

pub fn neg(operand: Expr, line: usize) -> Expr {
    unary(UnaryOp::Negate, operand, line)
}

pub fn address_of(operand: Expr, line: usize) -> Expr {
    unary(UnaryOp::AddressOf, operand, line)
}

pub fn deref(operand: Expr, line: usize) -> Expr {
    unary(UnaryOp::Dereference, operand, line)
}

pub fn assign(target: Expr, value: Expr, line: usize) -> Expr {
    Expr::new(
        ExprKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        },
        line,
    )
}

pub fn index(base: Expr, index: Expr, line: usize) -> Expr {
    Expr::new(
        ExprKind::Index {
            base: Box::new(base),
            index: Box::new(index),
        },
        line,
    )
}

pub fn call(name: &str, args: Vec<Expr>, line: usize) -> Expr {
    Expr::new(
        ExprKind::Call {
            name: name.to_string(),
            args,
        },
        line,
    )
}

/// Expression statement on the expression's own line
pub fn expr(expr: Expr) -> Stmt {
    let line = expr.line;
    Stmt::new(StmtKind::Expr(expr), line)
}

pub fn declare(name: &str, ty: TypeInfo, line: usize) -> Stmt {
    Stmt::new(StmtKind::Declare(VarDecl::new(name, ty, line)), line)
}

/// Parameter or struct member
pub fn param(name: &str, ty: TypeInfo, line: usize) -> VarDecl {
    VarDecl::new(name, ty, line)
}

pub fn function(
    name: &str,
    params: Vec<VarDecl>,
    return_type: TypeInfo,
    body: Vec<Stmt>,
    line: usize,
) -> Stmt {
    Stmt::new(
        StmtKind::Function(FunDecl {
            name: name.to_string(),
            params,
            return_type,
            body,
            storage: None,
        }),
        line,
    )
}

pub fn struct_define(name: &str, members: Vec<VarDecl>, line: usize) -> Stmt {
    Stmt::new(
        StmtKind::StructDefine(StructDecl {
            name: name.to_string(),
            members,
        }),
        line,
    )
}

pub fn if_then(condition: Expr, then_branch: Vec<Stmt>, line: usize) -> Stmt {
    if_else(condition, then_branch, Vec::new(), line)
}

pub fn if_else(condition: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>, line: usize) -> Stmt {
    Stmt::new(
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        },
        line,
    )
}

pub fn repeat(body: Vec<Stmt>, condition: Expr, line: usize) -> Stmt {
    Stmt::new(StmtKind::Repeat { body, condition }, line)
}

pub fn ret(value: Option<Expr>, line: usize) -> Stmt {
    Stmt::new(StmtKind::Return(value), line)
}

pub fn write(value: Expr, line: usize) -> Stmt {
    Stmt::new(StmtKind::Write(value), line)
}

pub fn read(target: Expr, line: usize) -> Stmt {
    Stmt::new(StmtKind::Read(target), line)
}

pub fn brk(line: usize) -> Stmt {
    Stmt::new(StmtKind::Break, line)
}

pub fn program(statements: Vec<Stmt>) -> Program {
    Program::new(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expressions_in_source_order() {
        let tree = program(vec![
            declare("x", TypeInfo::Integer, 1),
            expr(assign(id("x", 2), op(BinaryOp::Plus, int(1, 2), float(2.0, 2), 2), 2)),
            write(id("x", 3), 3),
        ]);

        let kinds: Vec<String> = tree
            .expressions()
            .iter()
            .map(|e| match &e.kind {
                ExprKind::Id(name) => name.clone(),
                ExprKind::Const(Literal::Integer(v)) => v.to_string(),
                ExprKind::Const(_) => "const".to_string(),
                ExprKind::Op { .. } => "op".to_string(),
                ExprKind::Assign { .. } => "=".to_string(),
                _ => "other".to_string(),
            })
            .collect();

        assert_eq!(kinds, vec!["=", "x", "op", "1", "const", "x"]);
    }

    #[test]
    fn test_new_expressions_are_undecorated() {
        let e = call("f", vec![int(3, 7)], 7);
        assert_eq!(e.line, 7);
        assert_eq!(e.ty, TypeInfo::Error);
        assert_eq!(e.converted_type, TypeInfo::Error);
        assert!(e.symbol.is_none());
    }
}
