//! Parsing of `__attribute__` lists.

use crate::doc::DocId;
use crate::lexer::TokenKind;
use crate::simple::{attributes, Pass};

use super::expr::{ExprArg, ExprFlags};
use super::{Parser, Ret};

#[derive(Debug, Clone, Copy)]
pub(crate) enum AttrLine {
    Line,
    Hardline,
}

impl<'a> Parser<'a> {
    /// Parse one or many attributes, optionally indented. The out document
    /// refers to the last attribute allowing trailing tokens to hang off
    /// it.
    pub(crate) fn parse_attributes(
        &mut self,
        dc: DocId,
        out: Option<&mut DocId>,
        indent: i32,
        linetype: AttrLine,
    ) -> Ret {
        if self.lx.peek_if(TokenKind::Attribute).is_none() {
            return Ret::None;
        }

        let dc = if indent > 0 {
            self.arena.indent(indent, Some(dc))
        } else {
            dc
        };
        let mut concat = None;
        while let Some(tk) = self.lx.if_kind(TokenKind::Attribute) {
            let dest = self.arena.group_concat(Some(dc));
            match linetype {
                AttrLine::Line => {
                    self.arena.line(Some(dest));
                }
                AttrLine::Hardline => {
                    self.arena.hardline(Some(dest));
                }
            }
            self.doc_token(tk, dest);
            if let Some(lparen) = self.lx.expect(TokenKind::LParen) {
                self.doc_token(lparen, dest);
            }

            if self.passes.is_enabled(Pass::Attributes) {
                self.simplify_attribute_idents();
            }

            let r = self.parse_expr(
                None,
                ExprArg {
                    dc: dest,
                    stop: None,
                    indent: 0,
                    flags: ExprFlags::default(),
                },
            );
            if r.halted() {
                return self.fail();
            }
            if let Some(rparen) = self.lx.expect(TokenKind::RParen) {
                self.doc_token(rparen, dest);
            }
            concat = Some(dest);
        }

        if let (Some(out), Some(concat)) = (out, concat) {
            *out = concat;
        }
        self.good()
    }

    /// Rewrite `__name__` attribute identifiers up to the closing
    /// parenthesis.
    fn simplify_attribute_idents(&mut self) {
        let Some(rparen) = self.lx.peek_if_pair(TokenKind::LParen, TokenKind::RParen) else {
            return;
        };
        let mut tk = self.lx.peek();
        while let Some(id) = tk {
            if id == rparen {
                break;
            }
            if self.lx.store()[id].kind == TokenKind::Ident {
                attributes::exec(&mut self.lx, id);
            }
            tk = self.lx.store().next(id);
        }
    }
}
