//! Expression parsing.
//!
//! Precedence climbing over [`BinaryOp::precedence`] for binary operators,
//! all left-associative. `local`, `if`, `function`, `error`, `assert` and
//! `import` are parsed in primary position and extend as far right as
//! possible, so `1 + local x = 2; x * 3` is `1 + (local x = 2; (x * 3))`.

use crate::{ParseError, Parser};
use grz_ir::{
    Arg, AssertDef, BinaryOp, Bind, CompSpec, Expr, ExprKind, ExprRef, FunctionDef, ImportKind,
    Param, Span, TokenKind,
};
use std::collections::HashSet;
use std::rc::Rc;

impl Parser<'_> {
    /// Parse a full expression.
    pub(crate) fn parse_expr(&mut self) -> Result<ExprRef, ParseError> {
        grz_stack::grow_if_needed(|| self.parse_binary(0))
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<ExprRef, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.match_binary_op() {
            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }
            self.cursor.advance();

            if op == BinaryOp::In && self.cursor.check(&TokenKind::Super) {
                let end = self.cursor.advance().span;
                let span = left.span.merge(end);
                left = Expr::new(ExprKind::InSuper { field: left }, span);
                continue;
            }

            let right = self.parse_binary(prec)?;
            let span = left.span.merge(right.span);
            left = Expr::new(ExprKind::Binary { op, left, right }, span);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ExprRef, ParseError> {
        if let Some(op) = self.match_unary_op() {
            let start = self.cursor.advance().span;
            let operand = grz_stack::grow_if_needed(|| self.parse_unary())?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(ExprKind::Unary { op, operand }, span));
        }
        self.parse_postfix()
    }

    /// Primary expression followed by `.f`, `[e]`, `[a:b:c]`, `(args)` and
    /// `{ ... }` suffixes.
    fn parse_postfix(&mut self) -> Result<ExprRef, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            expr = match self.cursor.current_kind() {
                TokenKind::Dot => {
                    self.cursor.advance();
                    let (name, span) = self.cursor.expect_ident()?;
                    let index = Expr::new(ExprKind::Str(name.into()), span);
                    let span = expr.span.merge(span);
                    Expr::new(ExprKind::Index { target: expr, index }, span)
                }
                TokenKind::LBracket => self.parse_index_or_slice(expr)?,
                TokenKind::LParen => self.parse_call(expr)?,
                TokenKind::LBrace => {
                    let object = self.parse_object()?;
                    let span = expr.span.merge(object.span);
                    Expr::new(
                        ExprKind::Binary {
                            op: BinaryOp::Add,
                            left: expr,
                            right: object,
                        },
                        span,
                    )
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ExprRef, ParseError> {
        let token = self.cursor.current();
        let span = token.span;
        let kind = match &token.kind {
            TokenKind::Null => ExprKind::Null,
            TokenKind::True => ExprKind::True,
            TokenKind::False => ExprKind::False,
            TokenKind::SelfKw => ExprKind::SelfRef,
            TokenKind::Dollar => ExprKind::Dollar,
            TokenKind::Str(text) => ExprKind::Str(text.as_str().into()),
            TokenKind::Number(n) => ExprKind::Number(*n),
            TokenKind::Ident(name) => ExprKind::Var(name.as_str().into()),
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_array(),
            TokenKind::LBrace => return self.parse_object(),
            TokenKind::Super => return self.parse_super(),
            TokenKind::Local => return self.parse_local(),
            TokenKind::If => return self.parse_if(),
            TokenKind::Function => return self.parse_function(),
            TokenKind::Error => {
                self.cursor.advance();
                let message = self.parse_expr()?;
                let span = span.merge(message.span);
                return Ok(Expr::new(ExprKind::Error(message), span));
            }
            TokenKind::Assert => return self.parse_assert_expr(),
            TokenKind::Import | TokenKind::ImportStr | TokenKind::ImportBin => {
                return self.parse_import();
            }
            other => return Err(ParseError::expected("an expression", other, span)),
        };
        self.cursor.advance();
        Ok(Expr::new(kind, span))
    }

    fn parse_super(&mut self) -> Result<ExprRef, ParseError> {
        let start = self.cursor.advance().span;
        let index = match self.cursor.current_kind() {
            TokenKind::Dot => {
                self.cursor.advance();
                let (name, span) = self.cursor.expect_ident()?;
                Expr::new(ExprKind::Str(name.into()), span)
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                let index = self.parse_expr()?;
                self.cursor.expect(&TokenKind::RBracket)?;
                index
            }
            other => {
                return Err(ParseError::expected(
                    "\".\" or \"[\" after super",
                    other,
                    self.cursor.current_span(),
                ));
            }
        };
        let span = start.merge(self.cursor.previous_span());
        Ok(Expr::new(ExprKind::SuperIndex { index }, span))
    }

    fn parse_local(&mut self) -> Result<ExprRef, ParseError> {
        let start = self.cursor.advance().span;
        let mut binds = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let (bind, span) = self.parse_bind()?;
            if !seen.insert(Rc::clone(&bind.name)) {
                return Err(ParseError::new(
                    format!("duplicate local var: {}", bind.name),
                    span,
                ));
            }
            binds.push(bind);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(&TokenKind::Semicolon)?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Local {
                binds: binds.into(),
                body,
            },
            span,
        ))
    }

    /// `name = expr` or the function sugar `name(params) = expr`.
    pub(crate) fn parse_bind(&mut self) -> Result<(Bind, Span), ParseError> {
        let (name, span) = self.cursor.expect_ident()?;
        let value = if self.cursor.check(&TokenKind::LParen) {
            let params = self.parse_params()?;
            self.cursor.expect(&TokenKind::Eq)?;
            let body = self.parse_expr()?;
            let fn_span = span.merge(body.span);
            Expr::new(
                ExprKind::Function(Rc::new(FunctionDef { params, body })),
                fn_span,
            )
        } else {
            self.cursor.expect(&TokenKind::Eq)?;
            self.parse_expr()?
        };
        Ok((
            Bind {
                name: name.into(),
                value,
            },
            span,
        ))
    }

    /// `(a, b = default, ...)`
    pub(crate) fn parse_params(&mut self) -> Result<Rc<[Param]>, ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        let mut params: Vec<Param> = Vec::new();
        while !self.cursor.check(&TokenKind::RParen) {
            let (name, span) = self.cursor.expect_ident()?;
            if params.iter().any(|p| *p.name == *name) {
                return Err(ParseError::new(format!("duplicate parameter: {name}"), span));
            }
            let default = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name: name.into(),
                default,
            });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(&TokenKind::RParen)?;
        Ok(params.into())
    }

    fn parse_if(&mut self) -> Result<ExprRef, ParseError> {
        let start = self.cursor.advance().span;
        let cond = self.parse_expr()?;
        self.cursor.expect(&TokenKind::Then)?;
        let then_branch = self.parse_expr()?;
        let else_branch = if self.cursor.eat(&TokenKind::Else) {
            self.parse_expr()?
        } else {
            Expr::new(ExprKind::Null, then_branch.span)
        };
        let span = start.merge(else_branch.span);
        Ok(Expr::new(
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_function(&mut self) -> Result<ExprRef, ParseError> {
        let start = self.cursor.advance().span;
        let params = self.parse_params()?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Function(Rc::new(FunctionDef { params, body })),
            span,
        ))
    }

    /// `assert cond [: message]` without the trailing `; rest`.
    pub(crate) fn parse_assertion(&mut self) -> Result<AssertDef, ParseError> {
        let start = self.cursor.expect(&TokenKind::Assert)?;
        let cond = self.parse_expr()?;
        let message = if self.cursor.eat(&TokenKind::Colon) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = start.merge(self.cursor.previous_span());
        Ok(AssertDef {
            cond,
            message,
            span,
        })
    }

    fn parse_assert_expr(&mut self) -> Result<ExprRef, ParseError> {
        let assertion = self.parse_assertion()?;
        self.cursor.expect(&TokenKind::Semicolon)?;
        let rest = self.parse_expr()?;
        let span = assertion.span.merge(rest.span);
        Ok(Expr::new(ExprKind::Assert { assertion, rest }, span))
    }

    fn parse_import(&mut self) -> Result<ExprRef, ParseError> {
        let token = self.cursor.advance();
        let kind = match token.kind {
            TokenKind::ImportStr => ImportKind::Str,
            TokenKind::ImportBin => ImportKind::Bin,
            _ => ImportKind::Code,
        };
        let keyword = token.kind.symbol();
        match self.cursor.current_kind() {
            TokenKind::Str(path) => {
                let end = self.cursor.advance().span;
                Ok(Expr::new(
                    ExprKind::Import {
                        kind,
                        path: path.as_str().into(),
                    },
                    token.span.merge(end),
                ))
            }
            _ => Err(ParseError::new(
                format!("computed imports are not allowed: {keyword} must be followed by a string literal"),
                self.cursor.current_span(),
            )),
        }
    }

    /// `target[index]` or `target[start:end:step]` with every slice part optional.
    fn parse_index_or_slice(&mut self, target: ExprRef) -> Result<ExprRef, ParseError> {
        self.cursor.expect(&TokenKind::LBracket)?;

        let start = if self.at_slice_colon() {
            None
        } else {
            let index = self.parse_expr()?;
            if self.cursor.check(&TokenKind::RBracket) {
                let end = self.cursor.advance().span;
                let span = target.span.merge(end);
                return Ok(Expr::new(ExprKind::Index { target, index }, span));
            }
            Some(index)
        };

        let (end, step) = if self.cursor.eat(&TokenKind::DoubleColon) {
            (None, self.parse_optional_slice_part()?)
        } else {
            self.cursor.expect(&TokenKind::Colon)?;
            let end = if self.at_slice_colon() {
                None
            } else {
                self.parse_optional_slice_part()?
            };
            let step = if self.cursor.eat(&TokenKind::Colon) {
                self.parse_optional_slice_part()?
            } else {
                None
            };
            (end, step)
        };

        let close = self.cursor.expect(&TokenKind::RBracket)?;
        let span = target.span.merge(close);
        Ok(Expr::new(
            ExprKind::Slice {
                target,
                start,
                end,
                step,
            },
            span,
        ))
    }

    fn at_slice_colon(&self) -> bool {
        self.cursor.check(&TokenKind::Colon) || self.cursor.check(&TokenKind::DoubleColon)
    }

    fn parse_optional_slice_part(&mut self) -> Result<Option<ExprRef>, ParseError> {
        if self.cursor.check(&TokenKind::RBracket) {
            Ok(None)
        } else {
            self.parse_expr().map(Some)
        }
    }

    fn parse_call(&mut self, target: ExprRef) -> Result<ExprRef, ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        let mut seen_named = false;
        while !self.cursor.check(&TokenKind::RParen) {
            let named = matches!(self.cursor.current_kind(), TokenKind::Ident(_))
                && matches!(self.cursor.peek_next_kind(), TokenKind::Eq);
            if named {
                let (name, _) = self.cursor.expect_ident()?;
                self.cursor.expect(&TokenKind::Eq)?;
                let value = self.parse_expr()?;
                seen_named = true;
                args.push(Arg {
                    name: Some(name.into()),
                    value,
                });
            } else {
                let value = self.parse_expr()?;
                if seen_named {
                    return Err(ParseError::new(
                        "positional argument after a named argument is not allowed",
                        value.span,
                    ));
                }
                args.push(Arg { name: None, value });
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.cursor.expect(&TokenKind::RParen)?;
        let tailstrict = self.cursor.eat(&TokenKind::TailStrict);
        let span = target.span.merge(close);
        Ok(Expr::new(
            ExprKind::Apply {
                target,
                args,
                tailstrict,
            },
            span,
        ))
    }

    fn parse_array(&mut self) -> Result<ExprRef, ParseError> {
        let start = self.cursor.expect(&TokenKind::LBracket)?;
        if self.cursor.check(&TokenKind::RBracket) {
            let end = self.cursor.advance().span;
            return Ok(Expr::new(ExprKind::Array(Vec::new()), start.merge(end)));
        }

        let first = self.parse_expr()?;
        if self.cursor.check(&TokenKind::For) {
            let specs = self.parse_comp_specs()?;
            let end = self.cursor.expect(&TokenKind::RBracket)?;
            return Ok(Expr::new(
                ExprKind::ArrayComp { body: first, specs },
                start.merge(end),
            ));
        }

        let mut elements = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expr()?);
        }
        let end = self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::Array(elements), start.merge(end)))
    }

    /// `for x in e` followed by any mix of `for` and `if` clauses.
    pub(crate) fn parse_comp_specs(&mut self) -> Result<Vec<CompSpec>, ParseError> {
        let mut specs = Vec::new();
        self.cursor.expect(&TokenKind::For)?;
        loop {
            let (var, _) = self.cursor.expect_ident()?;
            self.cursor.expect(&TokenKind::In)?;
            let iter = self.parse_expr()?;
            specs.push(CompSpec::For {
                var: var.into(),
                iter,
            });
            while self.cursor.eat(&TokenKind::If) {
                specs.push(CompSpec::If(self.parse_expr()?));
            }
            if !self.cursor.eat(&TokenKind::For) {
                break;
            }
        }
        Ok(specs)
    }
}
