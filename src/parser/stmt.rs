//! Parsing of statements.

use crate::doc::{DocId, Indent};
use crate::lexer::{TokenId, TokenKind};
use crate::simple::{stmt_empty_loop, stmt_switch, Pass};

use super::decl::DeclFlags;
use super::expr::{ExprArg, ExprFlags};
use super::{Parser, Ret};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BlockFlags {
    /// Statements are nested under a switch, suppressing indentation of
    /// the case labels.
    pub switch: bool,
    /// The block is the body of a control flow statement, making it a
    /// candidate for brace removal.
    pub simple: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_stmt(&mut self, dc: DocId) -> Ret {
        self.parse_stmt1(dc, None)
    }

    fn parse_stmt1(&mut self, dc: DocId, stop: Option<TokenId>) -> Ret {
        let r = self.parse_stmt_block(dc, dc, BlockFlags::default());
        if r != Ret::None {
            return r;
        }

        if let Some(tk) = self.lx.peek_if(TokenKind::If) {
            return self.parse_stmt_if(dc, tk, stop);
        }

        if let Some(tk) = self
            .lx
            .peek_if(TokenKind::While)
            .or_else(|| self.lx.peek_if(TokenKind::Switch))
        {
            return self.parse_stmt_expr(dc, tk, false);
        }
        if let Some(tk) = self.lx.peek_if(TokenKind::Foreach) {
            return self.parse_stmt_expr(dc, tk, false);
        }

        if self.lx.peek_if(TokenKind::For).is_some() {
            return self.parse_stmt_for(dc, stop);
        }

        let r = self.parse_stmt_case(dc, stop);
        if r != Ret::None {
            return r;
        }

        if let Some(tk) = self.lx.if_kind(TokenKind::Do) {
            return self.parse_stmt_dowhile(dc, tk, stop);
        }

        if let Some(tk) = self
            .lx
            .if_kind(TokenKind::Break)
            .or_else(|| self.lx.if_kind(TokenKind::Continue))
        {
            self.doc_token(tk, dc);
            if let Some(semi) = self.lx.expect(TokenKind::Semi) {
                self.doc_token(semi, dc);
            }
            return self.good();
        }

        if let Some(tk) = self.lx.if_kind(TokenKind::Return) {
            let concat = self.arena.group_concat(Some(dc));
            self.doc_token(tk, concat);
            let mut expr = concat;
            if self.lx.peek_if(TokenKind::Semi).is_none() {
                self.arena.literal(" ", Some(concat));
                let r = self.parse_expr(
                    Some(&mut expr),
                    ExprArg {
                        dc: concat,
                        stop: None,
                        indent: self.continuation_indent(),
                        flags: ExprFlags::default(),
                    },
                );
                if r.halted() || r == Ret::None {
                    return self.fail();
                }
            }
            if let Some(semi) = self.lx.expect(TokenKind::Semi) {
                self.doc_token(semi, expr);
            }
            return self.good();
        }

        if let Some(tk) = self.lx.if_kind(TokenKind::Goto) {
            let concat = self.arena.group_concat(Some(dc));
            self.doc_token(tk, concat);
            self.arena.line(Some(concat));
            if let Some(ident) = self.lx.expect(TokenKind::Ident) {
                self.doc_token(ident, concat);
            }
            if let Some(semi) = self.lx.expect(TokenKind::Semi) {
                self.doc_token(semi, concat);
            }
            return self.good();
        }

        let r = self.parse_stmt_label(dc);
        if r == Ret::Good {
            // A label is not necessarily followed by a hard line, there
            // could be another statement on the same line.
            if let (Some(t1), Some(t2)) = (self.lx.back(), self.lx.peek()) {
                if Some(t2) != stop
                    && self.lx.store()[t2].kind != TokenKind::Eof
                    && self.lx.store()[t1].lno == self.lx.store()[t2].lno
                {
                    let indent = self.arena.indent_with(Indent::Force, Some(dc));
                    return self.parse_stmt1(indent, stop);
                }
            }
            return self.good();
        } else if r.halted() {
            return r;
        }

        if let Some(semi) = self.lx.if_kind(TokenKind::Semi) {
            self.doc_token(semi, dc);
            return self.good();
        }

        if let Some(tk) = self.lx.if_kind(TokenKind::Assembly) {
            return self.parse_stmt_asm(dc, tk);
        }

        // Note, the ordering of operations is of importance here. Interpret
        // the following tokens as an expression if the same expression
        // spans to the first semicolon. Doing the opposite has the side
        // effect of treating function calls as declarations.
        if self.peek_type(super::types::TypeFlags::default()).is_none() {
            let peek = {
                let st = self.lx.peek_enter();
                let peek = self.peek_expr_stmt(stop);
                self.lx.peek_leave(st);
                peek
            };
            if peek {
                let mut expr = dc;
                let r = self.parse_expr(
                    Some(&mut expr),
                    ExprArg {
                        dc,
                        stop: None,
                        indent: self.continuation_indent(),
                        flags: ExprFlags::default(),
                    },
                );
                if r.halted() || r == Ret::None {
                    return self.fail();
                }
                if let Some(semi) = self.lx.expect(TokenKind::Semi) {
                    self.doc_token(semi, expr);
                }
                if self.lx.is_branch() {
                    self.arena.hardline(Some(dc));
                }
                return self.good();
            }
        }

        let r = self.parse_decl(
            dc,
            DeclFlags {
                break_on_line: true,
                ..DeclFlags::default()
            },
        );
        if r == Ret::Good {
            return self.good();
        }

        // Last resort, see if this is a loop construct hidden behind cpp
        // such as the ones provided by queue(3).
        if let Some(tk) = self.lx.peek_if(TokenKind::Ident) {
            return self.parse_stmt_expr(dc, tk, false);
        }

        Ret::None
    }

    fn peek_expr_stmt(&mut self, stop: Option<TokenId>) -> bool {
        let Some(end) = self.peek_expr(stop) else {
            return false;
        };
        match self.lx.store().next(end) {
            Some(nx) => self.lx.store()[nx].kind == TokenKind::Semi,
            None => false,
        }
    }

    /// Parse a block statement wrapped in braces.
    pub(crate) fn parse_stmt_block(
        &mut self,
        head: DocId,
        tail: DocId,
        flags: BlockFlags,
    ) -> Ret {
        let Some(rbrace) = self.lx.peek_if_pair(TokenKind::LBrace, TokenKind::RBrace) else {
            return Ret::None;
        };
        let Some(lbrace_peek) = self.lx.peek() else {
            return Ret::None;
        };

        // Do not honor empty lines before the closing right brace.
        self.trim_before(rbrace);

        // Register the block with the statement simplification pass, its
        // body is built into a scratch document so the width can be
        // measured.
        let simple_body = if flags.simple && !flags.switch && self.passes.is_enabled(Pass::Stmt) {
            let mut ss = self.simple_stmt.take();
            let indent_width = self.indent_width();
            let body = ss.as_mut().map(|ss| {
                ss.block(
                    &self.lx,
                    &mut self.arena,
                    self.options,
                    lbrace_peek,
                    rbrace,
                    indent_width,
                )
            });
            self.simple_stmt = ss;
            body
        } else {
            None
        };

        let Some(lbrace) = self.lx.expect(TokenKind::LBrace) else {
            return self.fail();
        };
        self.doc_token(lbrace, head);

        let indent = if flags.switch {
            tail
        } else {
            self.arena.indent(self.indent_width(), Some(tail))
        };
        let line = self.arena.hardline(Some(indent));
        let mut nstmt = 0;

        loop {
            let target = simple_body.unwrap_or(indent);
            if self.parse_stmt1(target, Some(rbrace)) != Ret::Good {
                break;
            }
            nstmt += 1;

            // Take the next branch if available.
            self.lx.branch();

            if self.lx.peek() == Some(rbrace) {
                break;
            }
            if self.lx.peek_if(TokenKind::Eof).is_some() {
                break;
            }

            let back_rbrace = self
                .lx
                .back()
                .map(|tk| self.lx.store()[tk].kind == TokenKind::RBrace)
                .unwrap_or(false);
            if back_rbrace && self.lx.peek_if(TokenKind::Else).is_some() {
                self.arena.literal(" ", Some(indent));
            } else {
                self.arena.hardline(Some(indent));
            }
        }
        // Do not keep the hard line if the statement block is empty.
        if nstmt == 0 {
            self.arena.remove(indent, line);
        }

        self.arena.hardline(Some(tail));
        if let Some(tk) = self.lx.expect(TokenKind::RBrace) {
            self.doc_token(tk, tail);
        }
        if let Some(tk) = self.lx.if_kind(TokenKind::Semi) {
            self.doc_token(tk, tail);
        }

        self.good()
    }

    fn parse_stmt_if(&mut self, dc: DocId, tk: TokenId, stop: Option<TokenId>) -> Ret {
        let r = self.parse_stmt_expr(dc, tk, false);
        if r.halted() || r == Ret::None {
            return r;
        }

        let back_rbrace = self
            .lx
            .back()
            .map(|tk| self.lx.store()[tk].kind == TokenKind::RBrace)
            .unwrap_or(false);

        if let Some(kw) = self.lx.if_kind(TokenKind::Else) {
            let mut dc = dc;
            if back_rbrace {
                self.arena.literal(" ", Some(dc));
            } else {
                self.arena.hardline(Some(dc));
            }
            self.doc_token(kw, dc);
            if let Some(nx) = self.lx.peek_if(TokenKind::If) {
                if self.lx.store()[kw].lno == self.lx.store()[nx].lno {
                    self.arena.literal(" ", Some(dc));
                } else {
                    dc = self.arena.indent(self.indent_width(), Some(dc));
                    self.arena.hardline(Some(dc));
                }
                return self.parse_stmt1(dc, stop);
            }

            if self.lx.peek_if(TokenKind::LBrace).is_some() {
                self.arena.literal(" ", Some(dc));
                return self.parse_stmt_block(
                    dc,
                    dc,
                    BlockFlags {
                        simple: true,
                        ..BlockFlags::default()
                    },
                );
            }

            // A sole statement, candidate for brace insertion.
            let cookie = self.simple_stmt_ifelse_enter();
            let indent = self.arena.indent(self.indent_width(), Some(dc));
            self.arena.hardline(Some(indent));
            let r = self.parse_stmt1(indent, stop);
            self.simple_stmt_ifelse_leave(cookie);
            return r;
        }

        self.good()
    }

    fn parse_stmt_for(&mut self, dc: DocId, stop: Option<TokenId>) -> Ret {
        let Some(tk) = self.lx.if_kind(TokenKind::For) else {
            return Ret::None;
        };

        let loop_ = self.arena.group_concat(Some(dc));
        self.doc_token(tk, loop_);
        self.arena.literal(" ", Some(loop_));
        if let Some(lparen) = self.lx.expect(TokenKind::LParen) {
            self.doc_token(lparen, loop_);
        }

        let mut expr: DocId;

        // Declarations are allowed in the first expression.
        if self.parse_decl(loop_, DeclFlags::default()) == Ret::Good {
            expr = loop_;
        } else {
            expr = loop_;
            let r = self.parse_expr(
                Some(&mut expr),
                ExprArg {
                    dc: loop_,
                    stop: None,
                    indent: 0,
                    flags: ExprFlags::default(),
                },
            );
            if r.halted() {
                return self.fail();
            }
            if r == Ret::None {
                expr = loop_;
            }
            if let Some(semi) = self.lx.expect(TokenKind::Semi) {
                self.doc_token(semi, expr);
            }
        }
        let mut space = self.arena.literal(" ", Some(expr));
        let mut space_parent = expr;

        // If the expression does not fit, break after the semicolon if the
        // previous expression was not empty.
        let softline = expr != loop_;
        let r = self.parse_expr(
            Some(&mut expr),
            ExprArg {
                dc: loop_,
                stop: None,
                indent: 0,
                flags: ExprFlags {
                    softline,
                    ..ExprFlags::default()
                },
            },
        );
        if r.halted() {
            return self.fail();
        }
        if r == Ret::None {
            // Expression empty, remove the space.
            self.arena.remove(space_parent, space);
            expr = loop_;
        }
        if let Some(semi) = self.lx.expect(TokenKind::Semi) {
            self.doc_token(semi, expr);
        }
        space = self.arena.literal(" ", Some(expr));
        space_parent = expr;

        if self.lx.is_branch() {
            self.arena.hardline(Some(loop_));
            return self.good();
        }

        let softline = expr != loop_;
        let r = self.parse_expr(
            Some(&mut expr),
            ExprArg {
                dc: loop_,
                stop: None,
                indent: 0,
                flags: ExprFlags {
                    softline,
                    ..ExprFlags::default()
                },
            },
        );
        if r.halted() {
            return self.fail();
        }
        if r == Ret::None {
            self.arena.remove(space_parent, space);
            expr = loop_;
        }
        if let Some(rparen) = self.lx.expect(TokenKind::RParen) {
            self.doc_token(rparen, expr);
        }

        if self.lx.peek_if(TokenKind::LBrace).is_some() {
            if self.passes.is_enabled(Pass::StmtEmptyLoop) {
                stmt_empty_loop::braces(&mut self.lx);
            }
            self.arena.literal(" ", Some(expr));
            return self.parse_stmt1(dc, stop);
        }

        if self.passes.is_enabled(Pass::StmtEmptyLoop) {
            stmt_empty_loop::no_braces(&mut self.lx);
        }
        let indent = self.arena.indent(self.indent_width(), Some(dc));
        self.arena.hardline(Some(indent));
        self.parse_stmt1(indent, stop)
    }

    fn parse_stmt_dowhile(&mut self, dc: DocId, tk: TokenId, stop: Option<TokenId>) -> Ret {
        self.doc_token(tk, dc);
        let r = if self.lx.peek_if(TokenKind::LBrace).is_some() {
            self.arena.literal(" ", Some(dc));
            let r = self.parse_stmt_block(dc, dc, BlockFlags::default());
            self.arena.literal(" ", Some(dc));
            r
        } else {
            let indent = self.arena.indent(self.indent_width(), Some(dc));
            self.arena.hardline(Some(indent));
            let r = self.parse_stmt1(indent, stop);
            self.arena.hardline(Some(dc));
            r
        };
        if r.halted() || r == Ret::None {
            return self.fail();
        }

        if let Some(tk) = self.lx.peek_if(TokenKind::While) {
            return self.parse_stmt_expr(dc, tk, true);
        }
        self.fail()
    }

    /// Parse a statement consisting of a keyword, an expression wrapped in
    /// parenthesis and the following statement(s).
    fn parse_stmt_expr(&mut self, dc: DocId, kw: TokenId, dowhile: bool) -> Ret {
        let kind = self.lx.store()[kw].kind;
        if self.lx.expect(kind).is_none() {
            return self.fail();
        }
        let Some(rparen) = self.lx.peek_if_pair(TokenKind::LParen, TokenKind::RParen) else {
            return self.fail();
        };

        let stmt = self.arena.group_concat(Some(dc));
        self.doc_token(kw, stmt);
        if !matches!(kind, TokenKind::Ident | TokenKind::Foreach) {
            self.arena.literal(" ", Some(stmt));
        }

        // The tokens after the expression must be nested underneath the
        // same expression in order to fit everything until the following
        // statement on a single line.
        let stop = self.lx.store().next(rparen);
        let mut expr = stmt;
        let r = self.parse_expr(
            Some(&mut expr),
            ExprArg {
                dc: stmt,
                stop,
                indent: self.continuation_indent(),
                flags: ExprFlags::default(),
            },
        );
        if r.halted() || r == Ret::None {
            return self.fail();
        }

        if self.lx.is_branch() {
            return self.good();
        }

        if dowhile {
            if let Some(semi) = self.lx.expect(TokenKind::Semi) {
                self.doc_token(semi, expr);
            }
            return self.good();
        }

        if kind == TokenKind::Switch && self.passes.is_enabled(Pass::StmtSwitch) {
            self.simplify_switch(rparen);
        }

        if self.lx.peek_if(TokenKind::LBrace).is_some() {
            if matches!(kind, TokenKind::While | TokenKind::Foreach)
                && self.passes.is_enabled(Pass::StmtEmptyLoop)
            {
                stmt_empty_loop::braces(&mut self.lx);
            }
            self.arena.literal(" ", Some(expr));
            return self.parse_stmt_block(
                expr,
                dc,
                BlockFlags {
                    switch: kind == TokenKind::Switch,
                    simple: true,
                },
            );
        }

        if matches!(kind, TokenKind::While | TokenKind::Foreach)
            && self.passes.is_enabled(Pass::StmtEmptyLoop)
        {
            stmt_empty_loop::no_braces(&mut self.lx);
        }

        // A sole statement, candidate for brace insertion.
        let cookie = self.simple_stmt_ifelse_enter();
        let indent = self.arena.indent(self.indent_width(), Some(dc));
        self.arena.hardline(Some(indent));
        let r = self.parse_stmt(indent);
        self.simple_stmt_ifelse_leave(cookie);
        r
    }

    /// Apply the switch simplification to every case within the body.
    fn simplify_switch(&mut self, rparen: TokenId) {
        let Some(rbrace) = self.lx.peek_if_pair(TokenKind::LBrace, TokenKind::RBrace) else {
            return;
        };
        let _ = rparen;
        let mut tk = self.lx.peek();
        while let Some(id) = tk {
            if id == rbrace {
                break;
            }
            if self.lx.store()[id].kind == TokenKind::Default {
                stmt_switch::exec(&mut self.lx, id);
            }
            tk = self.lx.store().next(id);
        }
    }

    fn parse_stmt_label(&mut self, dc: DocId) -> Ret {
        let peek = {
            let st = self.lx.peek_enter();
            let peek = self.lx.if_kind(TokenKind::Ident).is_some()
                && self.lx.if_kind(TokenKind::Colon).is_some();
            self.lx.peek_leave(st);
            peek
        };
        if !peek {
            return Ret::None;
        }

        let dedent = self.arena.dedent(Some(dc));
        if let Some(tk) = self.lx.expect(TokenKind::Ident) {
            self.doc_token(tk, dedent);
        }
        if let Some(tk) = self.lx.expect(TokenKind::Colon) {
            self.doc_token(tk, dedent);
        }
        self.good()
    }

    fn parse_stmt_case(&mut self, dc: DocId, stop: Option<TokenId>) -> Ret {
        let Some(kw) = self
            .lx
            .if_kind(TokenKind::Case)
            .or_else(|| self.lx.if_kind(TokenKind::Default))
        else {
            return Ret::None;
        };

        let lhs = self.arena.group_concat(Some(dc));
        self.doc_token(kw, lhs);
        if self.lx.peek_until(TokenKind::Colon).is_none() {
            return self.fail();
        }
        if self.lx.store()[kw].kind == TokenKind::Case {
            self.arena.line(Some(lhs));
            let r = self.parse_expr(
                None,
                ExprArg {
                    dc: lhs,
                    stop: None,
                    indent: 0,
                    flags: ExprFlags::default(),
                },
            );
            if r != Ret::Good {
                return self.fail();
            }
        }
        if let Some(colon) = self.lx.expect(TokenKind::Colon) {
            self.doc_token(colon, lhs);
        }

        if self.lx.peek_if(TokenKind::LBrace).is_some() {
            self.arena.line(Some(lhs));
            return self.parse_stmt1(dc, stop);
        }

        let indent = self.arena.indent(self.indent_width(), Some(dc));
        loop {
            if self.lx.peek_if(TokenKind::Case).is_some()
                || self.lx.peek_if(TokenKind::Default).is_some()
            {
                break;
            }
            let Some(nx) = self.lx.peek() else {
                return self.fail();
            };
            if Some(nx) == stop || self.lx.store()[nx].kind == TokenKind::Eof {
                break;
            }

            // Allow the following statement(s) to reside on the same line
            // as the case keyword.
            let sameline = self.lx.store()[kw].lno == self.lx.store()[nx].lno;
            let (parent, line) = if sameline {
                (indent, self.arena.literal(" ", Some(indent)))
            } else {
                (indent, self.arena.hardline(Some(indent)))
            };

            let breaks = self.lx.store()[nx].kind == TokenKind::Break;
            if self.parse_stmt1(indent, stop) != Ret::Good {
                // No statement, remove the line.
                self.arena.remove(parent, line);
                break;
            }
            if breaks {
                break;
            }
        }

        self.good()
    }

    /// Inline assembler is emitted verbatim up to the trailing semicolon,
    /// no attempt is made at formatting it.
    fn parse_stmt_asm(&mut self, dc: DocId, tk: TokenId) -> Ret {
        let concat = self.arena.group_concat(Some(dc));
        self.doc_token(tk, concat);
        loop {
            let Some(nx) = self.lx.pop() else {
                return self.fail();
            };
            match self.lx.store()[nx].kind {
                TokenKind::Eof => return self.fail(),
                TokenKind::Semi => {
                    self.doc_token(nx, concat);
                    break;
                }
                TokenKind::Volatile => {
                    self.arena.literal(" ", Some(concat));
                    self.doc_token(nx, concat);
                }
                _ => {
                    self.doc_token(nx, concat);
                }
            }
        }
        self.good()
    }

    fn simple_stmt_ifelse_enter(&mut self) -> Option<(usize, TokenId)> {
        if !self.passes.is_enabled(Pass::Stmt) {
            return None;
        }
        let anchor = self.lx.peek()?;
        let mut ss = self.simple_stmt.take();
        let indent_width = self.indent_width();
        let cookie = ss
            .as_mut()
            .map(|ss| ss.ifelse_enter(&mut self.arena, anchor, indent_width));
        self.simple_stmt = ss;
        cookie.map(|cookie| (cookie, anchor))
    }

    fn simple_stmt_ifelse_leave(&mut self, cookie: Option<(usize, TokenId)>) {
        let Some((cookie, _)) = cookie else {
            return;
        };
        let Some(anchor) = self.lx.peek() else {
            return;
        };
        let mut ss = self.simple_stmt.take();
        if let Some(ss) = ss.as_mut() {
            ss.ifelse_leave(cookie, anchor);
        }
        self.simple_stmt = ss;
    }
}
