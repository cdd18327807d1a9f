//! Object literals and object comprehensions.

use crate::{ParseError, Parser};
use grz_ir::{
    Bind, Expr, ExprKind, ExprRef, FieldDef, FieldName, FunctionDef, ObjectBody, ObjectComp, Span,
    TokenKind,
};
use std::collections::HashSet;
use std::rc::Rc;

impl Parser<'_> {
    /// `{ members }` or `{ [k]: v for x in xs }`.
    pub(crate) fn parse_object(&mut self) -> Result<ExprRef, ParseError> {
        let start = self.cursor.expect(&TokenKind::LBrace)?;
        let mut locals = Vec::new();
        let mut fields = Vec::new();
        let mut asserts = Vec::new();

        while !self.cursor.check(&TokenKind::RBrace) {
            match self.cursor.current_kind() {
                TokenKind::Local => {
                    self.cursor.advance();
                    let (bind, span) = self.parse_bind()?;
                    if locals.iter().any(|b: &Bind| b.name == bind.name) {
                        return Err(ParseError::new(
                            format!("duplicate local var: {}", bind.name),
                            span,
                        ));
                    }
                    locals.push(bind);
                }
                TokenKind::Assert => asserts.push(self.parse_assertion()?),
                _ => fields.push(self.parse_field()?),
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }

        if self.cursor.check(&TokenKind::For) {
            return self.finish_object_comp(start, locals, fields, asserts.is_empty());
        }

        let end = self.cursor.expect(&TokenKind::RBrace)?;

        let mut names = HashSet::new();
        for field in &fields {
            if let FieldName::Fixed(name) = &field.name {
                if !names.insert(Rc::clone(name)) {
                    return Err(ParseError::new(
                        format!("duplicate field: {name}"),
                        field.span,
                    ));
                }
            }
        }

        Ok(Expr::new(
            ExprKind::Object(ObjectBody {
                locals: locals.into(),
                fields,
                asserts: asserts.into(),
            }),
            start.merge(end),
        ))
    }

    fn finish_object_comp(
        &mut self,
        start: Span,
        locals: Vec<Bind>,
        mut fields: Vec<FieldDef>,
        no_asserts: bool,
    ) -> Result<ExprRef, ParseError> {
        let here = self.cursor.current_span();
        if !no_asserts {
            return Err(ParseError::new(
                "object comprehension cannot have asserts",
                here,
            ));
        }
        if fields.len() != 1 {
            return Err(ParseError::new(
                "object comprehension must have exactly one field",
                here,
            ));
        }
        let Some(field) = fields.pop() else {
            return Err(ParseError::new("object comprehension has no field", here));
        };
        let FieldName::Computed(key) = field.name else {
            return Err(ParseError::new(
                "object comprehension field name must be computed with [...]",
                field.span,
            ));
        };

        let specs = self.parse_comp_specs()?;
        let end = self.cursor.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(
            ExprKind::ObjectComp(Box::new(ObjectComp {
                locals: locals.into(),
                key,
                plus: field.plus,
                visibility: field.visibility,
                value: field.value,
                specs,
            })),
            start.merge(end),
        ))
    }

    /// `name[(params)] [+](:|::|:::) value`
    fn parse_field(&mut self) -> Result<FieldDef, ParseError> {
        let start = self.cursor.current_span();
        let name = match self.cursor.current_kind() {
            TokenKind::Ident(name) => {
                self.cursor.advance();
                FieldName::Fixed(name.as_str().into())
            }
            TokenKind::Str(text) => {
                self.cursor.advance();
                FieldName::Fixed(text.as_str().into())
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                let key = self.parse_expr()?;
                self.cursor.expect(&TokenKind::RBracket)?;
                FieldName::Computed(key)
            }
            other => return Err(ParseError::expected("a field name", other, start)),
        };

        let params = if self.cursor.check(&TokenKind::LParen) {
            Some(self.parse_params()?)
        } else {
            None
        };

        let Some((plus, visibility)) = self.match_field_separator() else {
            return Err(ParseError::expected(
                "\":\", \"::\" or \":::\"",
                self.cursor.current_kind(),
                self.cursor.current_span(),
            ));
        };
        if plus && params.is_some() {
            return Err(ParseError::new(
                "cannot use +: syntax sugar in a method definition",
                self.cursor.current_span(),
            ));
        }
        self.cursor.advance();

        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        let value = match params {
            Some(params) => Expr::new(
                ExprKind::Function(Rc::new(FunctionDef { params, body })),
                span,
            ),
            None => body,
        };

        Ok(FieldDef {
            name,
            plus,
            visibility,
            value,
            span,
        })
    }
}
