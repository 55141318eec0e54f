//! Parsing of function declarations and implementations.

use crate::doc::DocId;
use crate::lexer::{TokenFlags, TokenId, TokenKind};
use crate::ruler::Ruler;
use crate::simple::decl_proto::SimpleDeclProto;
use crate::simple::stmt::SimpleStmt;
use crate::simple::Pass;
use crate::style::{Keyword, StyleKey};

use super::attributes::AttrLine;
use super::decl::DeclFlags;
use super::types::{ParsedType, TypeFlags};
use super::{Parser, Ret};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FuncPeek {
    None,
    Decl,
    Impl,
}

struct FuncProtoArg {
    dc: DocId,
    ty: ParsedType,
    /// Separator between the return type and the identifier.
    hardline: bool,
    out: DocId,
}

impl<'a> Parser<'a> {
    /// Returns what kind of function the next tokens denote, if any.
    pub(crate) fn peek_func(&mut self) -> FuncPeek {
        let st = self.lx.peek_enter();
        let mut peek = FuncPeek::None;

        'done: {
            let Some(ty) = self.peek_type(TypeFlags::default()) else {
                break 'done;
            };
            self.lx.seek(ty.end);
            self.lx.pop();

            if self.lx.if_kind(TokenKind::Ident).is_some() {
                // nothing
            } else if self.lx.if_kind(TokenKind::LParen).is_some()
                && self.lx.if_kind(TokenKind::Star).is_some()
                && self.lx.if_kind(TokenKind::Ident).is_some()
                && self.lx.if_pair(TokenKind::LParen, TokenKind::RParen).is_some()
                && self.lx.if_kind(TokenKind::RParen).is_some()
            {
                // A function returning a function pointer.
                self.lx.store_mut()[ty.end].flags.insert(TokenFlags::TYPE_FUNC);
            } else {
                break 'done;
            }

            if self
                .lx
                .if_pair(TokenKind::LParen, TokenKind::RParen)
                .is_none()
            {
                break 'done;
            }

            loop {
                if self.lx.if_kind(TokenKind::Attribute).is_none()
                    || self
                        .lx
                        .if_pair(TokenKind::LParen, TokenKind::RParen)
                        .is_none()
                {
                    break;
                }
            }

            if self.lx.if_kind(TokenKind::Semi).is_some() {
                peek = FuncPeek::Decl;
            } else if self.lx.if_kind(TokenKind::LBrace).is_some() {
                peek = FuncPeek::Impl;
            } else if self.peek_type(TypeFlags::default()).is_some() {
                // K&R style argument declarations.
                peek = FuncPeek::Impl;
            }
        }

        self.lx.peek_leave(st);
        peek
    }

    /// Parse a function declaration, i.e. a prototype.
    pub(crate) fn parse_func_decl(&mut self, dc: DocId, rl: &mut Ruler) -> Ret {
        let Some(ty) = self.peek_type(TypeFlags::default()) else {
            return Ret::None;
        };

        let mut proto = if self.passes.is_enabled(Pass::DeclProto) {
            Some(SimpleDeclProto::new())
        } else {
            None
        };

        let hardline = matches!(
            self.style.keyword(StyleKey::AlwaysBreakAfterReturnType),
            Keyword::All | Keyword::TopLevel
        );
        // The whole prototype is intended to fit on a single line.
        let group = self.arena.group_concat(Some(dc));
        let mut arg = FuncProtoArg {
            dc: group,
            ty,
            hardline,
            out: group,
        };
        let r = self.parse_func_proto(&mut arg, rl, proto.as_mut());
        if r.halted() {
            return self.fail();
        }

        if let Some(proto) = proto {
            proto.leave(&mut self.lx);
        }

        if let Some(tk) = self.lx.expect(TokenKind::Semi) {
            self.doc_token(tk, arg.out);
        }
        self.good()
    }

    /// Parse a function implementation.
    pub(crate) fn parse_func_impl(&mut self, dc: DocId) -> Ret {
        if self.peek_func() != FuncPeek::Impl {
            return Ret::None;
        }
        let Some(ty) = self.peek_type(TypeFlags::default()) else {
            return Ret::None;
        };

        let hardline = matches!(
            self.style.keyword(StyleKey::AlwaysBreakAfterReturnType),
            Keyword::All | Keyword::AllDefinitions | Keyword::TopLevel
                | Keyword::TopLevelDefinitions
        );
        // The whole prototype is intended to fit on a single line.
        let group = self.arena.group_concat(Some(dc));
        let mut arg = FuncProtoArg {
            dc: group,
            ty,
            hardline,
            out: group,
        };
        let mut rl = Ruler::new(0, crate::ruler::ALIGN_SENSE);
        let r = self.parse_func_proto(&mut arg, &mut rl, None);
        rl.exec(&mut self.arena);
        if r.halted() {
            return self.fail();
        }

        if self.lx.peek_if(TokenKind::LBrace).is_none() {
            return self.fail();
        }

        if self.style.brace_wrapping(StyleKey::AfterFunction) {
            self.arena.hardline(Some(dc));
        } else {
            self.arena.literal(" ", Some(dc));
        }

        // Track statement brace normalization over the whole body.
        let prev_stmt = self.simple_stmt.take();
        if self.passes.is_enabled(Pass::Stmt) {
            self.simple_stmt = Some(SimpleStmt::new());
        }

        let r = self.parse_stmt_block(dc, dc, super::stmt::BlockFlags::default());

        if let Some(ss) = self.simple_stmt.take() {
            ss.leave(&mut self.lx, &self.arena, self.style, self.options);
        }
        self.simple_stmt = prev_stmt;

        if r.halted() || r == Ret::None {
            return self.fail();
        }
        if self.lx.peek_if(TokenKind::Eof).is_none() {
            self.arena.hardline(Some(dc));
        }
        self.good()
    }

    /// Parse a function prototype, i.e. return type, identifier, arguments
    /// and optional attributes.
    fn parse_func_proto(
        &mut self,
        arg: &mut FuncProtoArg,
        rl: &mut Ruler,
        mut proto: Option<&mut SimpleDeclProto>,
    ) -> Ret {
        let dc = arg.dc;

        if self.parse_type(dc, arg.ty, Some(rl)).halted() {
            return self.fail();
        }

        // A hard line implies a function implementation in which the
        // identifier must never be indented.
        let indent = if arg.hardline {
            self.arena.hardline(Some(dc));
            dc
        } else {
            let indent = self.arena.indent(self.continuation_indent(), Some(dc));
            self.arena.softline(Some(indent));
            indent
        };

        if self.lx.store()[arg.ty.end]
            .flags
            .intersects(TokenFlags::TYPE_FUNC)
        {
            // A function returning a function pointer.
            if let Some(tk) = self.lx.expect(TokenKind::LParen) {
                self.doc_token(tk, indent);
            }
            if let Some(tk) = self.lx.expect(TokenKind::Star) {
                self.doc_token(tk, indent);
            }
            if let Some(tk) = self.lx.expect(TokenKind::Ident) {
                self.doc_token(tk, indent);
            }
            let Some(rparen) = self.lx.peek_if_pair(TokenKind::LParen, TokenKind::RParen)
            else {
                return self.fail();
            };
            if let Some(tk) = self.lx.expect(TokenKind::LParen) {
                self.doc_token(tk, indent);
            }
            while self.parse_func_arg1(indent, None, rparen, proto.as_deref_mut()) == Ret::Good
            {
            }
            if let Some(tk) = self.lx.expect(TokenKind::RParen) {
                self.doc_token(tk, indent);
            }
        } else if let Some(tk) = self.lx.expect(TokenKind::Ident) {
            self.doc_token(tk, indent);
        }

        let Some(rparen) = self.lx.peek_if_pair(TokenKind::LParen, TokenKind::RParen) else {
            return self.fail();
        };
        if let Some(tk) = self.lx.expect(TokenKind::LParen) {
            self.doc_token(tk, indent);
        }

        // Spell out the absence of arguments.
        if self.lx.peek_if(TokenKind::RParen).is_some() {
            self.arena.literal("void", Some(indent));
        }

        let args_indent = self.arena.indent(self.continuation_indent(), Some(dc));
        arg.out = args_indent;
        while self.parse_func_arg1(args_indent, Some(&mut arg.out), rparen, proto.as_deref_mut())
            == Ret::Good
        {}
        if let Some(tk) = self.lx.expect(TokenKind::RParen) {
            self.doc_token(tk, arg.out);
        }

        // Recognize K&R argument declarations.
        let kr = self.arena.group(Some(dc));
        let indent = self.arena.indent(self.indent_width(), Some(kr));
        self.arena.hardline(Some(indent));
        let mut any = false;
        while self.parse_decl(indent, DeclFlags::default()) == Ret::Good {
            any = true;
        }
        if !any {
            self.arena.remove(dc, kr);
        }

        let mut out = arg.out;
        let r = self.parse_attributes(dc, Some(&mut out), self.indent_width(), AttrLine::Hardline);
        if r.halted() {
            return self.fail();
        }
        if r == Ret::Good {
            arg.out = out;
        }

        self.good()
    }

    /// Parse one function argument as part of either a declaration or an
    /// implementation.
    pub(crate) fn parse_func_arg(
        &mut self,
        dc: DocId,
        out: Option<&mut DocId>,
        rparen: TokenId,
    ) -> Ret {
        self.parse_func_arg1(dc, out, rparen, None)
    }

    fn parse_func_arg1(
        &mut self,
        dc: DocId,
        out: Option<&mut DocId>,
        rparen: TokenId,
        proto: Option<&mut SimpleDeclProto>,
    ) -> Ret {
        let Some(ty) = self.peek_type(TypeFlags {
            arg: true,
            ..TypeFlags::default()
        }) else {
            return Ret::None;
        };

        // Let each argument begin with a soft line, causing a line to be
        // emitted immediately if the argument does not fit instead of
        // breaking the argument.
        let concat = self.arena.group_concat(Some(dc));
        self.arena.softline(Some(concat));
        let concat = self.arena.optional(Some(concat));

        let mut proto = proto;
        if let Some(proto) = proto.as_deref_mut() {
            proto.arg();
        }

        if self.parse_type(concat, ty, None).halted() {
            return self.fail();
        }

        // Put the argument identifier in its own group to trigger a refit.
        let concat = self.arena.group_concat(Some(concat));
        if let Some(out) = out {
            *out = concat;
        }

        // Put a line between the type and identifier when wanted.
        if self.lx.store()[ty.end].kind != TokenKind::Star
            && self.lx.peek_if(TokenKind::Comma).is_none()
            && self.lx.peek_if(TokenKind::RParen).is_none()
            && self.lx.peek_if(TokenKind::Attribute).is_none()
        {
            self.arena.line(Some(concat));
        }

        let mut pv: Option<TokenId> = None;
        loop {
            if self.lx.peek_if(TokenKind::Eof).is_some() {
                return self.fail();
            }

            if self.parse_attributes(concat, None, 0, AttrLine::Line) == Ret::Good {
                break;
            }

            if let Some(comma) = self.lx.if_kind(TokenKind::Comma) {
                self.doc_token(comma, concat);
                self.arena.line(Some(concat));
                break;
            }
            if self.lx.peek() == Some(rparen) {
                break;
            }

            let Some(tk) = self.lx.pop() else {
                return self.fail();
            };
            // Identifiers must be separated.
            if let Some(pv) = pv {
                if self.lx.store()[pv].kind == TokenKind::Ident
                    && self.lx.store()[tk].kind == TokenKind::Ident
                {
                    self.arena.line(Some(concat));
                }
            }
            if self.lx.store()[tk].kind == TokenKind::Ident {
                if let Some(proto) = proto.as_deref_mut() {
                    proto.arg_ident(&self.lx, tk);
                }
            }
            self.doc_token(tk, concat);
            pv = Some(tk);
        }

        // Take the next branch if available.
        self.lx.branch();
        self.good()
    }
}
