//! Jsonnet abstract syntax tree.
//!
//! Nodes are reference counted so closures, object fields and lazy thunks in
//! the evaluator can hold onto the sub-tree they will evaluate later without
//! copying it. Syntactic sugar is removed by the parser where it is purely
//! local: method fields and `local f(x) = ...` become [`ExprKind::Function`],
//! `e { ... }` becomes `e + { ... }`, and a missing `else` is a `null` branch.

use crate::Span;
use std::fmt;
use std::rc::Rc;

/// Identifier text.
pub type Ident = Rc<str>;

/// Shared pointer to an expression node.
pub type ExprRef = Rc<Expr>;

/// Expression node.
#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> ExprRef {
        Rc::new(Expr { kind, span })
    }
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Null,
    True,
    False,
    /// `self`
    SelfRef,
    /// `$`
    Dollar,
    Str(Rc<str>),
    Number(f64),
    Var(Ident),
    Array(Vec<ExprRef>),
    ArrayComp {
        body: ExprRef,
        specs: Vec<CompSpec>,
    },
    Object(ObjectBody),
    ObjectComp(Box<ObjectComp>),
    Local {
        binds: Rc<[Bind]>,
        body: ExprRef,
    },
    If {
        cond: ExprRef,
        then_branch: ExprRef,
        else_branch: ExprRef,
    },
    Function(Rc<FunctionDef>),
    Apply {
        target: ExprRef,
        args: Vec<Arg>,
        tailstrict: bool,
    },
    Index {
        target: ExprRef,
        index: ExprRef,
    },
    /// `super.f` / `super[e]`
    SuperIndex {
        index: ExprRef,
    },
    /// `e in super`
    InSuper {
        field: ExprRef,
    },
    Slice {
        target: ExprRef,
        start: Option<ExprRef>,
        end: Option<ExprRef>,
        step: Option<ExprRef>,
    },
    Binary {
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    },
    Unary {
        op: UnaryOp,
        operand: ExprRef,
    },
    Error(ExprRef),
    Assert {
        assertion: AssertDef,
        rest: ExprRef,
    },
    Import {
        kind: ImportKind,
        path: Rc<str>,
    },
}

/// `function(params) body`
#[derive(Debug, PartialEq)]
pub struct FunctionDef {
    pub params: Rc<[Param]>,
    pub body: ExprRef,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub default: Option<ExprRef>,
}

/// Call argument, positional when `name` is `None`.
#[derive(Debug, PartialEq)]
pub struct Arg {
    pub name: Option<Ident>,
    pub value: ExprRef,
}

/// `name = value` inside `local` or an object body.
#[derive(Debug, PartialEq)]
pub struct Bind {
    pub name: Ident,
    pub value: ExprRef,
}

/// One clause of a comprehension.
#[derive(Debug, PartialEq)]
pub enum CompSpec {
    For { var: Ident, iter: ExprRef },
    If(ExprRef),
}

/// Body of an object literal.
///
/// Object locals are visible to every field and assert regardless of where
/// they appear between the braces, so they are collected into one list.
#[derive(Debug, PartialEq)]
pub struct ObjectBody {
    pub locals: Rc<[Bind]>,
    pub fields: Vec<FieldDef>,
    pub asserts: Rc<[AssertDef]>,
}

#[derive(Debug, PartialEq)]
pub struct FieldDef {
    pub name: FieldName,
    /// `+:` merges with the inherited value.
    pub plus: bool,
    pub visibility: Visibility,
    pub value: ExprRef,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum FieldName {
    Fixed(Ident),
    Computed(ExprRef),
}

/// Field visibility marker: `:`, `::` or `:::`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visibility {
    Inherit,
    Hidden,
    Forced,
}

#[derive(Debug, PartialEq)]
pub struct AssertDef {
    pub cond: ExprRef,
    pub message: Option<ExprRef>,
    pub span: Span,
}

/// `{ [key]: value for x in xs }`
#[derive(Debug, PartialEq)]
pub struct ObjectComp {
    pub locals: Rc<[Bind]>,
    pub key: ExprRef,
    pub plus: bool,
    pub visibility: Visibility,
    pub value: ExprRef,
    pub specs: Vec<CompSpec>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// `import` - evaluate as Jsonnet.
    Code,
    /// `importstr` - raw text.
    Str,
    /// `importbin` - raw bytes.
    Bin,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    Eq,
    NotEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::In => "in",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq | BinaryOp::In => 7,
            BinaryOp::Eq | BinaryOp::NotEq => 6,
            BinaryOp::BitAnd => 5,
            BinaryOp::BitXor => 4,
            BinaryOp::BitOr => 3,
            BinaryOp::And => 2,
            BinaryOp::Or => 1,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Shl.precedence());
        assert!(BinaryOp::In.precedence() == BinaryOp::Lt.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::BitAnd.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
    }

    #[test]
    fn test_symbols() {
        assert_eq!(BinaryOp::NotEq.to_string(), "!=");
        assert_eq!(UnaryOp::BitNot.to_string(), "~");
    }
}
