//! Abstract Syntax Tree definitions
//!
//! The parser hands the analyzer a `Program` with every `line` set and all
//! type decorations at their defaults. Analysis fills in `ty`,
//! `converted_type`, `symbol` and `storage` in place.

use crate::semantic::symtab::SymbolEntry;
use crate::types::{FuncType, TypeInfo};

/// Root node: the top-level statement sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Every expression in the tree, in source order
    pub fn expressions(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            stmt.collect_exprs(&mut out);
        }
        out
    }
}

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Variable declaration: int x; float a[10]
    Declare(VarDecl),

    /// Function definition with parameters and body
    Function(FunDecl),

    /// Struct definition: struct point { int x; int y; }
    StructDefine(StructDecl),

    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },

    /// repeat body until condition
    Repeat {
        body: Vec<Stmt>,
        condition: Expr,
    },

    Return(Option<Expr>),

    Write(Expr),

    Read(Expr),

    Break,

    /// Expression evaluated for its effect
    Expr(Expr),
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize) -> Self {
        Self { kind, line }
    }

    fn collect_exprs<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match &self.kind {
            StmtKind::Function(fun) => {
                for stmt in &fun.body {
                    stmt.collect_exprs(out);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect(out);
                for stmt in then_branch.iter().chain(else_branch) {
                    stmt.collect_exprs(out);
                }
            }
            StmtKind::Repeat { body, condition } => {
                for stmt in body {
                    stmt.collect_exprs(out);
                }
                condition.collect(out);
            }
            StmtKind::Return(Some(expr))
            | StmtKind::Write(expr)
            | StmtKind::Read(expr)
            | StmtKind::Expr(expr) => expr.collect(out),
            StmtKind::Declare(_)
            | StmtKind::StructDefine(_)
            | StmtKind::Return(None)
            | StmtKind::Break => {}
        }
    }
}

/// Storage assigned to a declared name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Storage {
    pub offset: i64,
    pub size: usize,
    pub scope: usize,
}

/// A variable, parameter or struct member declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeInfo,
    pub line: usize,
    pub storage: Option<Storage>,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: TypeInfo, line: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            line,
            storage: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub params: Vec<VarDecl>,
    pub return_type: TypeInfo,
    pub body: Vec<Stmt>,
    pub storage: Option<Storage>,
}

impl FunDecl {
    /// The signature registered for this function
    pub fn func_type(&self) -> FuncType {
        FuncType::new(
            self.name.clone(),
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.return_type.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub members: Vec<VarDecl>,
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    /// Static type of the expression
    pub ty: TypeInfo,
    /// Type the value takes after implicit conversion in its context
    pub converted_type: TypeInfo,
    /// Declaration an identifier resolved to
    pub symbol: Option<SymbolEntry>,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Self {
            kind,
            line,
            ty: TypeInfo::Error,
            converted_type: TypeInfo::Error,
            symbol: None,
        }
    }

    pub fn is_id(&self) -> bool {
        matches!(self.kind, ExprKind::Id(_))
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        out.push(self);
        match &self.kind {
            ExprKind::Id(_) | ExprKind::Const(_) => {}
            ExprKind::Op { left, right, .. } => {
                left.collect(out);
                right.collect(out);
            }
            ExprKind::Unary { operand, .. } => operand.collect(out),
            ExprKind::Assign { target, value } => {
                target.collect(out);
                value.collect(out);
            }
            ExprKind::Index { base, index } => {
                base.collect(out);
                index.collect(out);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.collect(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Id(String),

    Const(Literal),

    /// Binary arithmetic or relational operation
    Op {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// Array element: base[index]
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },

    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Over,
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    /// Comparison operators yield Boolean
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    AddressOf,
    Dereference,
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Literal {
    pub fn type_info(&self) -> TypeInfo {
        match self {
            Literal::Integer(_) => TypeInfo::Integer,
            Literal::Float(_) => TypeInfo::Float,
            Literal::Boolean(_) => TypeInfo::Boolean,
        }
    }
}
