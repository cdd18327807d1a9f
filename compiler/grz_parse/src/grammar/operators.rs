//! Operator matching helpers.

use crate::Parser;
use grz_ir::{BinaryOp, TokenKind, UnaryOp, Visibility};

impl Parser<'_> {
    pub(crate) fn match_binary_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Shl => Some(BinaryOp::Shl),
            TokenKind::Shr => Some(BinaryOp::Shr),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            TokenKind::In => Some(BinaryOp::In),
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Amp => Some(BinaryOp::BitAnd),
            TokenKind::Caret => Some(BinaryOp::BitXor),
            TokenKind::Pipe => Some(BinaryOp::BitOr),
            TokenKind::AmpAmp => Some(BinaryOp::And),
            TokenKind::PipePipe => Some(BinaryOp::Or),
            _ => None,
        }
    }

    pub(crate) fn match_unary_op(&self) -> Option<UnaryOp> {
        match self.cursor.current_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        }
    }

    /// Match a field separator, returning `(plus, visibility)`.
    pub(crate) fn match_field_separator(&self) -> Option<(bool, Visibility)> {
        match self.cursor.current_kind() {
            TokenKind::Colon => Some((false, Visibility::Inherit)),
            TokenKind::DoubleColon => Some((false, Visibility::Hidden)),
            TokenKind::TripleColon => Some((false, Visibility::Forced)),
            TokenKind::PlusColon => Some((true, Visibility::Inherit)),
            TokenKind::PlusDoubleColon => Some((true, Visibility::Hidden)),
            TokenKind::PlusTripleColon => Some((true, Visibility::Forced)),
            _ => None,
        }
    }
}
