//! Grammar productions, split by construct.
//!
//! - `expr`: keyword-led expressions, binary/unary operators, postfix chains
//! - `object`: object literals and object comprehensions
//! - `operators`: token-to-operator mapping

mod expr;
mod object;
mod operators;
