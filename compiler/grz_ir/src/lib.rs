//! Grizzly IR - shared types for the Jsonnet front end and VM.
//!
//! - [`Span`] / [`FileId`] for source locations
//! - [`SourceFile`] for line/column rendering in diagnostics
//! - [`Token`] / [`TokenKind`] for lexer output
//! - the AST in [`ast`]

pub mod ast;
mod source;
mod span;
mod token;

pub use ast::{
    Arg, AssertDef, BinaryOp, Bind, CompSpec, Expr, ExprKind, ExprRef, FieldDef, FieldName,
    FunctionDef, Ident, ImportKind, ObjectBody, ObjectComp, Param, UnaryOp, Visibility,
};
pub use source::{LineCol, SourceFile};
pub use span::{FileId, Span};
pub use token::{Token, TokenKind};
