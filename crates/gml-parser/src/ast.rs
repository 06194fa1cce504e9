//! Syntax tree produced by [`crate::compile`].
//!
//! Every node records the byte offset where it starts so runtime diagnostics
//! can point back into the source text.

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    pub source: Arc<str>,
    pub root: Root,
}

impl SyntaxTree {
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Root {
    Code(Vec<Stmt>),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Repeat {
        count: Expr,
        body: Box<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoUntil {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Box<Stmt>,
        condition: Expr,
        step: Box<Stmt>,
        body: Box<Stmt>,
    },
    Switch {
        value: Expr,
        body: Vec<SwitchItem>,
    },
    With {
        target: Expr,
        body: Box<Stmt>,
    },
    Exit,
    Return(Expr),
    Break,
    Continue,
    Call(Call),
    VarDecl(Vec<String>),
    GlobalVarDecl(Vec<String>),
    Assign {
        target: VarRef,
        op: AssignOp,
        value: Expr,
    },
}

/// Entries of a switch body. Labels only exist here.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchItem {
    Case(Expr),
    Default,
    Stmt(Stmt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Str(String),
    Var(VarRef),
    Call(Call),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        op_offset: usize,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// `[object.]name[index1[, index2]]`
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub object: Option<Box<Expr>>,
    pub name: String,
    pub indexes: Vec<Expr>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Less,
    LessEq,
    Equal,
    NotEqual,
    Greater,
    GreaterEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Xor => "^^",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IntDiv => "div",
            Self::Mod => "mod",
        }
    }
}
