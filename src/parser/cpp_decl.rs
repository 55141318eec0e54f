//! Declarations hidden behind preprocessor macros.

use crate::doc::DocId;
use crate::lexer::{TokenFlags, TokenId, TokenKind};
use crate::ruler::Ruler;

use super::expr::{ExprArg, ExprFlags};
use super::types::ParsedType;
use super::{Parser, Ret};

impl<'a> Parser<'a> {
    /// Detect a declaration making use of preprocessor directives such as
    /// the ones provided by queue(3):
    ///
    /// ```text
    /// TAILQ_HEAD(x, y);
    /// TAILQ_HEAD(x, y) z;
    /// TAILQ_HEAD(x, y) *z;
    /// TAILQ_HEAD(x, y) z = TAILQ_HEAD_INITIALIZER(z);
    /// ```
    pub(crate) fn peek_cpp_decl(&mut self) -> Option<ParsedType> {
        let beg = self.lx.peek()?;
        let st = self.lx.peek_enter();
        let mut end = None;

        'done: {
            while self
                .lx
                .if_flags(TokenFlags::QUALIFIER | TokenFlags::STORAGE)
                .is_some()
            {}
            if self.lx.if_kind(TokenKind::Ident).is_none() {
                break 'done;
            }
            let Some(rparen) = self.lx.if_pair(TokenKind::LParen, TokenKind::RParen) else {
                break 'done;
            };

            if self.lx.peek_if(TokenKind::Semi).is_some() {
                end = Some(rparen);
                break 'done;
            }

            let mut last = rparen;
            while let Some(star) = self.lx.if_kind(TokenKind::Star) {
                last = star;
            }

            let ss = self.lx.peek_enter();
            let decl = (self.lx.if_kind(TokenKind::Ident).is_some()
                && (self.lx.if_kind(TokenKind::LSquare).is_some()
                    || self.lx.if_kind(TokenKind::Semi).is_some()
                    || self.lx.if_kind(TokenKind::Equal).is_some()
                    || self.lx.if_kind(TokenKind::Comma).is_some()))
                || (self.lx.if_kind(TokenKind::Equal).is_some()
                    && self.lx.if_kind(TokenKind::LBrace).is_some());
            self.lx.peek_leave(ss);
            if decl {
                end = Some(last);
            }
        }

        self.lx.peek_leave(st);
        end.map(|end| ParsedType {
            beg,
            end,
            align: None,
        })
    }

    /// Detect an X macro, a construct that looks like a function call
    /// lacking a trailing semicolon such as `RBT_PROTOTYPE(x, y)`. Returns
    /// the closing parenthesis.
    pub(crate) fn peek_cpp_x(&mut self) -> Option<TokenId> {
        let pv = self.lx.back();
        let st = self.lx.peek_enter();
        let mut out = None;

        'done: {
            while self.lx.if_flags(TokenFlags::STORAGE).is_some() {}
            let Some(ident) = self.lx.if_kind(TokenKind::Ident) else {
                break 'done;
            };
            let Some(rparen) = self.lx.if_pair(TokenKind::LParen, TokenKind::RParen) else {
                break 'done;
            };

            // The previous token must not reside on the same line as the
            // identifier while the next token must begin a new line with
            // the same or less indentation, ruling out loop constructs
            // hidden behind cpp.
            let store = self.lx.store();
            let prev_ok = pv
                .map(|pv| store[pv].lno < store[ident].lno)
                .unwrap_or(true);
            let next_ok = match store.next(rparen) {
                Some(nx) => {
                    store[nx].kind == TokenKind::Eof
                        || (store[nx].lno > store[rparen].lno
                            && store[nx].cno <= store[ident].cno)
                }
                None => true,
            };
            if prev_ok && next_ok {
                out = Some(rparen);
            }
        }

        self.lx.peek_leave(st);
        out
    }

    /// Parse an X macro, emitting the arguments with column alignment.
    pub(crate) fn parse_cpp_x(&mut self, dc: DocId, rl: &mut Ruler) -> Ret {
        let Some(rparen) = self.peek_cpp_x() else {
            return Ret::None;
        };

        let concat = self.arena.group_concat(Some(dc));
        if let Some(tk) = self.lx.expect(TokenKind::Ident) {
            self.doc_token(tk, concat);
        }
        if let Some(tk) = self.lx.expect(TokenKind::LParen) {
            self.doc_token(tk, concat);
        }

        // Take note of the width up to the first argument, must be
        // accounted for while performing alignment.
        let mut w = self.width(concat);
        let mut col = rl.column_count();

        loop {
            if self.lx.peek_if(TokenKind::RParen).is_some() {
                break;
            }
            if self.lx.peek_if(TokenKind::Eof).is_some() {
                return self.fail();
            }

            let arg = self.arena.group_concat(Some(dc));
            let stop = self
                .lx
                .peek_until_loose(TokenKind::Comma, Some(rparen))
                .or(Some(rparen));
            let mut expr = arg;
            let r = self.parse_expr(
                Some(&mut expr),
                ExprArg {
                    dc: arg,
                    stop,
                    indent: 0,
                    flags: ExprFlags::default(),
                },
            );
            if r.halted() || r == Ret::None {
                return self.fail();
            }
            if let Some(comma) = self.lx.if_kind(TokenKind::Comma) {
                self.doc_token(comma, expr);
                col += 1;
                let width = self.width(arg) + w;
                rl.insert(
                    self.lx.store(),
                    Some(comma),
                    &mut self.arena,
                    expr,
                    col,
                    width,
                    0,
                );
                w = 0;
            }
        }

        if let Some(tk) = self.lx.expect(TokenKind::RParen) {
            self.doc_token(tk, dc);
        }

        self.good()
    }
}
