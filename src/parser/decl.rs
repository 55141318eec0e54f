//! Parsing of declarations.

use crate::clang;
use crate::doc::{DocId, MinimizeVariant};
use crate::lexer::{TokenFlags, TokenId, TokenKind};
use crate::ruler::{Ruler, ALIGN_SENSE};
use crate::simple::decl::SimpleDecl;
use crate::simple::decl_forward::SimpleDeclForward;
use crate::simple::Pass;
use crate::style::StyleKey;

use super::attributes::AttrLine;
use super::expr::{ExprArg, ExprFlags};
use super::func::FuncPeek;
use super::{Parser, Ret};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DeclFlags {
    /// Honor blank lines denoting the end of a block of declarations.
    pub break_on_line: bool,
    /// Parsing at the root of the translation unit.
    pub root: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BracesFlags {
    /// Parsing an enum body.
    pub enum_: bool,
    /// Trim hard lines after the opening brace.
    pub trim: bool,
}

struct DeclInitArg {
    dc: DocId,
    semi: TokenId,
    indent: i32,
    space_before_equal: bool,
}

impl<'a> Parser<'a> {
    /// Parse a block of declarations.
    pub(crate) fn parse_decl(&mut self, dc: DocId, flags: DeclFlags) -> Ret {
        let prev_decl = self.simple_decl.take();
        if self.passes.is_enabled(Pass::Decl) {
            self.simple_decl = Some(SimpleDecl::new());
        }
        let prev_forward = self.simple_decl_forward.take();
        if self.passes.is_enabled(Pass::DeclForward) {
            self.simple_decl_forward = Some(SimpleDeclForward::new());
        }

        let r = self.parse_decl1(dc, flags);

        if let Some(sd) = self.simple_decl.take() {
            sd.leave(&mut self.lx);
        }
        if let Some(mut sdf) = self.simple_decl_forward.take() {
            sdf.leave(&mut self.lx);
        }
        self.simple_decl = prev_decl;
        self.simple_decl_forward = prev_forward;
        r
    }

    fn parse_decl1(&mut self, dc: DocId, flags: DeclFlags) -> Ret {
        let decl = self.arena.concat(Some(dc));
        let mut rl = Ruler::new(0, ALIGN_SENSE);
        let mut ndecl = 0;
        let mut line: Option<DocId> = None;
        let mut error = Ret::None;

        loop {
            if ndecl > 0 {
                line = Some(self.arena.hardline(Some(decl)));
            }
            error = self.parse_decl2(decl, &mut rl, flags);
            if matches!(error, Ret::Fail | Ret::None) {
                if let Some(line) = line {
                    self.arena.remove(decl, line);
                }
                break;
            }
            ndecl += 1;

            if flags.break_on_line {
                // Honor blank line(s) denoting the end of this block of
                // declarations.
                if let Some(tk) = self.lx.back() {
                    if self.lx.store().has_line(tk, 2) {
                        break;
                    }
                }
                // Any cpp directive also denotes the end of this block.
                if let Some(nx) = self.lx.peek() {
                    if self.lx.store().has_prefix_flags(nx, TokenFlags::CPP) {
                        break;
                    }
                }
            }

            if self.lx.is_branch_end() {
                break;
            }
            // Take the next branch if available.
            self.lx.branch();
        }

        if ndecl == 0 {
            self.arena.remove(dc, decl);
            return Ret::None;
        }
        if !error.halted() {
            rl.exec(&mut self.arena);
        }
        self.good()
    }

    fn parse_decl2(&mut self, dc: DocId, rl: &mut Ruler, flags: DeclFlags) -> Ret {
        let Some(beg) = self.lx.peek() else {
            return Ret::None;
        };

        let mut iscpp = false;
        let ty = match self.peek_type(super::types::TypeFlags::default()) {
            Some(ty) => ty,
            None => match self.peek_cpp_decl() {
                Some(ty) => {
                    iscpp = true;
                    ty
                }
                None => {
                    if flags.root {
                        return self.parse_cpp_x(dc, rl);
                    }
                    return Ret::None;
                }
            },
        };

        // Presence of a type does not necessarily imply that this is a
        // declaration since it could be a function declaration or
        // implementation.
        if !iscpp {
            match self.peek_func() {
                FuncPeek::Decl => return self.parse_func_decl(dc, rl),
                FuncPeek::Impl => return Ret::None,
                FuncPeek::None => {}
            }
        }

        let concat = self.arena.group_concat(Some(dc));

        if !iscpp && self.passes.is_enabled(Pass::Decl) {
            if let Some(sd) = self.simple_decl.as_mut() {
                sd.decl_type(&self.lx, beg, ty.end);
            }
        }

        if self.parse_type(concat, ty, Some(rl)).halted() {
            return self.fail();
        }

        let mut concat = concat;
        if self.lx.peek_if(TokenKind::Semi).is_none() {
            let end = ty.end;
            if self.lx.store().is_decl(end, TokenKind::Struct)
                || self.lx.store().is_decl(end, TokenKind::Union)
            {
                let r = self.parse_decl_record(concat, end);
                if r.halted() {
                    return r;
                }
            } else if self.lx.store().is_decl(end, TokenKind::Enum) {
                let Some(rbrace) = self.lx.peek_if_pair(TokenKind::LBrace, TokenKind::RBrace)
                else {
                    return self.fail();
                };
                self.trim_before(rbrace);
                if self.style.brace_wrapping(StyleKey::AfterEnum) {
                    self.arena.hardline(Some(concat));
                }
                let r = self.parse_braces(
                    concat,
                    self.indent_width(),
                    BracesFlags {
                        enum_: true,
                        trim: true,
                    },
                );
                if r.halted() || r == Ret::None {
                    return self.fail();
                }
                if self.lx.peek_if(TokenKind::Semi).is_none() {
                    self.arena.literal(" ", Some(concat));
                }
            }

            let Some(semi) = self.lx.peek_until(TokenKind::Semi) else {
                return self.fail();
            };
            let space_before_equal =
                !(iscpp && self.lx.peek_if(TokenKind::Equal).is_some());
            let mut out = None;
            let r = self.parse_decl_init(
                &mut out,
                DeclInitArg {
                    dc: concat,
                    semi,
                    indent: self.indent_width(),
                    space_before_equal,
                },
                rl,
            );
            if r.halted() {
                return self.fail();
            }
            if let Some(out) = out {
                concat = out;
            }

            let r = self.parse_attributes(concat, None, self.indent_width(), AttrLine::Line);
            if r.halted() {
                return self.fail();
            }
        }

        if let Some(semi) = self.lx.expect(TokenKind::Semi) {
            self.doc_token(semi, concat);

            if self.passes.is_enabled(Pass::Decl) {
                if let Some(sd) = self.simple_decl.as_mut() {
                    sd.decl_semi(&self.lx, semi);
                }
            }
            if self.passes.is_enabled(Pass::DeclForward) {
                let mut sdf = self.simple_decl_forward.take();
                if let Some(sdf) = sdf.as_mut() {
                    sdf.decl(&mut self.lx, beg, semi);
                }
                self.simple_decl_forward = sdf;
            }
        }

        self.good()
    }

    /// Parse the body of a struct or union declaration.
    fn parse_decl_record(&mut self, concat: DocId, end: TokenId) -> Ret {
        let Some(rbrace) = self.lx.peek_if_pair(TokenKind::LBrace, TokenKind::RBrace) else {
            return self.fail();
        };
        self.trim_before(rbrace);

        if let Some(lbrace) = self.lx.expect(TokenKind::LBrace) {
            self.lx.store_mut().trim(lbrace);
            let wrap = (self.style.brace_wrapping(StyleKey::AfterStruct)
                && self.lx.store().is_decl(end, TokenKind::Struct))
                || (self.style.brace_wrapping(StyleKey::AfterUnion)
                    && self.lx.store().is_decl(end, TokenKind::Union));
            if wrap {
                self.arena.hardline(Some(concat));
            }
            self.doc_token(lbrace, concat);
        }

        let indent = self.arena.indent(self.indent_width(), Some(concat));
        self.arena.hardline(Some(indent));
        if self
            .parse_decl(indent, DeclFlags::default())
            .halted()
        {
            return self.fail();
        }
        self.arena.hardline(Some(concat));

        if let Some(tk) = self.lx.expect(TokenKind::RBrace) {
            self.doc_token(tk, concat);
        }
        if self.lx.peek_if(TokenKind::Semi).is_none()
            && self.lx.peek_if(TokenKind::Attribute).is_none()
        {
            self.arena.literal(" ", Some(concat));
        }
        self.good()
    }

    /// Parse any initialization as part of a declaration.
    fn parse_decl_init(
        &mut self,
        out: &mut Option<DocId>,
        arg: DeclInitArg,
        rl: &mut Ruler,
    ) -> Ret {
        let (indent, cookie) = rl.indent(&mut self.arena, arg.dc);
        let dc = self.arena.concat(Some(indent));
        let mut concat = self.arena.group_concat(Some(dc));

        let mut ninit = 0;
        let mut niter = 0;
        let mut error = Ret::Good;
        loop {
            match self.lx.peek() {
                Some(tk) if tk == arg.semi => break,
                None => break,
                _ => {}
            }

            if let Some(comma) = self.lx.if_kind(TokenKind::Comma) {
                self.doc_token(comma, concat);
                if self.lx.store().has_line(comma, 1) {
                    self.arena.hardline(Some(concat));
                } else {
                    self.arena.line(Some(concat));
                }
                if self.passes.is_enabled(Pass::Decl) {
                    if let Some(sd) = self.simple_decl.as_mut() {
                        sd.decl_comma(&self.lx, comma);
                    }
                }
                // Break before the next declarator.
                concat = self.arena.group_concat(Some(dc));
                self.arena.softline(Some(concat));
                concat = self.arena.group_concat(Some(concat));
                // Any preceding declarator cannot be the last one.
                *out = Some(concat);
            }
            niter += 1;

            let mut r = self.parse_decl_init1(concat, out);
            if r == Ret::None {
                r = self.parse_decl_init_assign(concat, out, &arg, rl);
            }
            match r {
                Ret::Good => ninit += 1,
                Ret::None | Ret::Fail => {
                    error = r;
                    break;
                }
            }
        }

        if ninit == 0 {
            rl.indent_remove(cookie);
        }
        if error.halted() || niter > ninit {
            return self.fail();
        }
        self.good()
    }

    fn parse_decl_init1(&mut self, dc: DocId, out: &mut Option<DocId>) -> Ret {
        if let Some(tk) = self.lx.if_kind(TokenKind::Ident) {
            self.doc_token(tk, dc);
            if self.lx.peek_if(TokenKind::Ident).is_some() {
                self.arena.literal(" ", Some(dc));
            }
            return self.good();
        }

        if let Some(tk) = self
            .lx
            .if_kind(TokenKind::LSquare)
            .or_else(|| self.lx.if_kind(TokenKind::LParen))
        {
            let rhs = if self.lx.store()[tk].kind == TokenKind::LSquare {
                TokenKind::RSquare
            } else {
                TokenKind::RParen
            };
            self.doc_token(tk, dc);
            // Let the remaining tokens hang off the expression.
            let mut expr = dc;
            let r = self.parse_expr(
                Some(&mut expr),
                ExprArg {
                    dc,
                    stop: None,
                    indent: 0,
                    flags: ExprFlags::default(),
                },
            );
            if r.halted() {
                return self.fail();
            }
            if let Some(tk) = self.lx.expect(rhs) {
                self.doc_token(tk, expr);
            }
            if self.lx.peek_if(TokenKind::Ident).is_some() {
                self.arena.literal(" ", Some(dc));
            }
            return self.good();
        }

        if self.parse_decl_bitfield(dc) == Ret::Good {
            return self.good();
        }

        if let Some(tk) = self
            .lx
            .if_flags(TokenFlags::QUALIFIER | TokenFlags::STORAGE)
        {
            self.doc_token(tk, dc);
            self.arena.literal(" ", Some(dc));
            return self.good();
        }

        if let Some(tk) = self.lx.if_kind(TokenKind::Star) {
            self.doc_token(tk, dc);
            return self.good();
        }

        if self
            .parse_attributes(dc, out.as_mut(), 0, AttrLine::Line)
            == Ret::Good
        {
            if self.lx.peek_if(TokenKind::Semi).is_none() {
                self.arena.literal(" ", Some(dc));
                *out = None;
            }
            return self.good();
        }

        Ret::None
    }

    fn parse_decl_init_assign(
        &mut self,
        dc: DocId,
        out: &mut Option<DocId>,
        arg: &DeclInitArg,
        rl: &mut Ruler,
    ) -> Ret {
        let Some(equal) = self.lx.if_kind(TokenKind::Equal) else {
            return Ret::None;
        };

        if arg.space_before_equal {
            self.arena.literal(" ", Some(dc));
        }
        self.doc_token(equal, dc);
        self.arena.literal(" ", Some(dc));

        let (dedent, _) = rl.dedent(&mut self.arena, dc);
        if self.lx.peek_if(TokenKind::LBrace).is_some() {
            let r = self.parse_decl_braces(dedent);
            if r.halted() || r == Ret::None {
                return self.fail();
            }
        } else {
            // Honor a hard line after the assignment operator, emitted
            // inside the expression document to get indentation right.
            let hardline = self.lx.store().has_line(equal, 1);
            let stop = self.lx.peek_until_comma(Some(arg.semi)).or(Some(arg.semi));

            // When the initializer must break, favor the layout causing
            // the fewest overlong lines.
            let minimize = self.arena.minimize(
                &[
                    MinimizeVariant {
                        indent: self.continuation_indent(),
                        force: false,
                    },
                    MinimizeVariant {
                        indent: arg.indent,
                        force: false,
                    },
                ],
                Some(dedent),
            );
            let mut expr = minimize;
            let r = self.parse_expr(
                Some(&mut expr),
                ExprArg {
                    dc: minimize,
                    stop,
                    indent: 0,
                    flags: ExprFlags {
                        hardline,
                        ..ExprFlags::default()
                    },
                },
            );
            if r.halted() || r == Ret::None {
                return self.fail();
            }
            *out = Some(expr);
        }

        self.good()
    }

    fn parse_decl_bitfield(&mut self, dc: DocId) -> Ret {
        use crate::style::Keyword;

        let Some(colon) = self.lx.if_kind(TokenKind::Colon) else {
            return Ret::None;
        };

        let spacing = self.style.keyword(StyleKey::BitFieldColonSpacing);
        if matches!(spacing, Keyword::Both | Keyword::Before) {
            self.arena.literal(" ", Some(dc));
        }
        self.doc_token(colon, dc);
        if matches!(spacing, Keyword::Both | Keyword::After) {
            self.arena.literal(" ", Some(dc));
        }
        if let Some(size) = self.lx.expect(TokenKind::Literal) {
            self.doc_token(size, dc);
        }
        self.good()
    }

    /// Parse brace initializers with a fresh ruler, suitable as an entry
    /// point from expressions and assignments.
    pub(crate) fn parse_decl_braces(&mut self, dc: DocId) -> Ret {
        let concat = self.arena.concat(Some(dc));
        let optional = self.arena.optional(Some(concat));
        self.parse_braces(optional, self.indent_width(), BracesFlags::default())
    }

    /// Parse brace initializers, aligning the columns across rows.
    pub(crate) fn parse_braces(
        &mut self,
        dc: DocId,
        indent_width: i32,
        flags: BracesFlags,
    ) -> Ret {
        let mut rl = Ruler::new(0, ALIGN_SENSE);
        let r = self.parse_braces_with_ruler(dc, &mut rl, indent_width, flags);
        rl.exec(&mut self.arena);
        r
    }

    fn parse_braces_with_ruler(
        &mut self,
        dc: DocId,
        rl: &mut Ruler,
        indent_width: i32,
        flags: BracesFlags,
    ) -> Ret {
        let Some(rbrace) = self.lx.peek_if_pair(TokenKind::LBrace, TokenKind::RBrace) else {
            return self.fail();
        };
        let Some(lbrace) = self.lx.peek() else {
            return self.fail();
        };

        if flags.enum_
            || self.peek_braces_fields()
        {
            return self.parse_braces_fields(dc, rl, rbrace, flags);
        }

        // If any column is followed by a hard line, do not align but
        // instead respect the existing hard line(s).
        let align = !self.peek_line(rbrace);

        let braces = self.arena.concat(Some(dc));
        let Some(lbrace) = self.lx.expect(TokenKind::LBrace) else {
            return self.fail();
        };
        if flags.trim {
            self.lx.store_mut().trim(lbrace);
        }
        self.doc_token(lbrace, braces);

        if self.lx.peek_if(TokenKind::RBrace).is_some() {
            // Honor spaces in empty braces.
            if self.lx.store().has_spaces(lbrace) {
                self.arena.literal(" ", Some(braces));
            }
            return self.parse_braces_end(braces, flags);
        }

        let mut w = 0;
        let indent;
        if self.lx.store().has_line(lbrace, 1) {
            indent = self.arena.indent(indent_width, Some(braces));
            self.arena.hardline(Some(indent));
        } else {
            self.arena.literal(" ", Some(braces));
            // Take note of the width of the document, must be accounted
            // for while performing alignment.
            w = self.width(braces);
            indent = self.arena.indent(w as i32, Some(braces));
        }

        let mut col = 0;
        let mut line: Option<(DocId, DocId)> = None;
        loop {
            if self.lx.is_branch() {
                break;
            }
            let Some(tk) = self.lx.peek() else {
                return self.fail();
            };
            if tk == rbrace {
                break;
            }
            if self.lx.store()[tk].kind == TokenKind::Eof {
                return self.fail();
            }

            let concat = self.arena.group_concat(Some(indent));
            let mut expr = concat;

            if self.lx.peek_if(TokenKind::LBrace).is_some() {
                let r = self.parse_braces_with_ruler(concat, rl, indent_width, flags);
                if r.halted() {
                    return self.fail();
                }
                col = rl.column_count();
            } else {
                let stop = self
                    .lx
                    .peek_until_loose(TokenKind::Comma, Some(rbrace))
                    .or(Some(rbrace));
                let r = self.parse_expr(
                    Some(&mut expr),
                    ExprArg {
                        dc: concat,
                        stop,
                        indent: 0,
                        flags: ExprFlags {
                            nosoft: true,
                            ..ExprFlags::default()
                        },
                    },
                );
                if r.halted() || r == Ret::None {
                    return self.fail();
                }
            }

            line = None;
            if let Some(comma) = self.lx.if_kind(TokenKind::Comma) {
                if let Some(nx) = self.lx.peek_if(TokenKind::RBrace) {
                    if nx == rbrace && self.lx.store().is_moveable(nx) {
                        self.lx.store_mut().trim(comma);
                    }
                }
                self.doc_token(comma, expr);

                if self.lx.peek() == Some(rbrace) {
                    break;
                }

                if align {
                    col += 1;
                    w += self.width(concat);
                    rl.insert(
                        self.lx.store(),
                        Some(comma),
                        &mut self.arena,
                        concat,
                        col,
                        w,
                        0,
                    );
                    w = 0;
                } else if !self.lx.store().has_line(comma, 1) {
                    self.arena.literal(" ", Some(concat));
                } else {
                    self.arena.hardline(Some(concat));
                }
                if self.lx.store().has_line(comma, 2) {
                    rl.exec(&mut self.arena);
                }
            } else {
                line = Some((concat, self.arena.hardline(Some(concat))));
            }
        }
        if let Some((parent, line)) = line {
            self.arena.remove(parent, line);
        }

        self.insert_trailing_comma(rbrace);

        self.arena.literal(" ", Some(braces));
        self.parse_braces_end(braces, flags)
    }

    fn parse_braces_end(&mut self, braces: DocId, _flags: BracesFlags) -> Ret {
        if let Some(rbrace) = self.lx.expect(TokenKind::RBrace) {
            self.lx.store_mut().trim(rbrace);
            self.doc_token(rbrace, braces);
        }
        if self.lx.peek_if(TokenKind::Semi).is_none()
            && self.lx.peek_if(TokenKind::Comma).is_none()
            && self.lx.peek_if(TokenKind::RBrace).is_none()
            && self.lx.peek_if(TokenKind::RParen).is_none()
            && self.lx.peek_if(TokenKind::Period).is_none()
            && self.lx.peek_if(TokenKind::Attribute).is_none()
        {
            self.arena.literal(" ", Some(braces));
        }
        self.good()
    }

    fn peek_braces_fields(&mut self) -> bool {
        let st = self.lx.peek_enter();
        let peek = self.lx.if_kind(TokenKind::LBrace).is_some()
            && (self.lx.if_kind(TokenKind::LSquare).is_some()
                || self.lx.if_kind(TokenKind::Period).is_some());
        self.lx.peek_leave(st);
        peek
    }

    /// Parse designated initializers or enum fields, one per row with the
    /// initializer values aligned.
    fn parse_braces_fields(
        &mut self,
        dc: DocId,
        rl: &mut Ruler,
        rbrace: TokenId,
        flags: BracesFlags,
    ) -> Ret {
        if let Some(lbrace) = self.lx.expect(TokenKind::LBrace) {
            if flags.trim {
                self.lx.store_mut().trim(lbrace);
            }
            self.doc_token(lbrace, dc);
        }

        let indent = self.arena.indent(self.indent_width(), Some(dc));
        let mut line = self.arena.hardline(Some(indent));

        loop {
            let Some(tk) = self.lx.peek() else {
                return self.fail();
            };
            if tk == rbrace {
                rl.exec(&mut self.arena);
                break;
            }
            if self.lx.store()[tk].kind == TokenKind::Eof {
                return self.fail();
            }

            let concat = self.arena.group_concat(Some(indent));
            if self
                .parse_braces_field(concat, rl, rbrace, flags)
                .halted()
            {
                return self.fail();
            }
            line = self.arena.hardline(Some(indent));
        }
        self.arena.remove(indent, line);

        self.insert_trailing_comma(rbrace);

        self.arena.hardline(Some(dc));
        if let Some(tk) = self.lx.expect(TokenKind::RBrace) {
            self.doc_token(tk, dc);
        }
        self.good()
    }

    fn parse_braces_field(
        &mut self,
        dc: DocId,
        rl: &mut Ruler,
        rbrace: TokenId,
        flags: BracesFlags,
    ) -> Ret {
        let mut align_after: Option<TokenId> = None;
        let mut skip_init = false;

        loop {
            if let Some(tk) = self.lx.if_kind(TokenKind::LSquare) {
                self.doc_token(tk, dc);
                let mut expr = dc;
                let r = self.parse_expr(
                    Some(&mut expr),
                    ExprArg {
                        dc,
                        stop: None,
                        indent: 0,
                        flags: ExprFlags::default(),
                    },
                );
                if r.halted() {
                    return self.fail();
                }
                if let Some(tk) = self.lx.expect(TokenKind::RSquare) {
                    self.doc_token(tk, expr);
                    align_after = Some(tk);
                }
            } else if let Some(tk) = self.lx.if_kind(TokenKind::Period) {
                self.doc_token(tk, dc);
                if let Some(ident) = self.lx.expect(TokenKind::Ident) {
                    self.doc_token(ident, dc);
                    align_after = Some(ident);

                    // Correct alignment, must occur after the identifier.
                    if let Some(equal) = self.lx.peek_if(TokenKind::Equal) {
                        if self.lx.store().has_tabs(equal) {
                            self.lx
                                .store_mut()
                                .move_suffixes_if(equal, ident, TokenKind::Space);
                        }
                    }
                }
            } else if let Some(tk) = self.lx.if_kind(TokenKind::Ident) {
                self.doc_token(tk, dc);
                align_after = Some(tk);

                // Enum fields making use of preprocessor directives.
                if flags.enum_ {
                    if let Some(lparen) = self.lx.if_kind(TokenKind::LParen) {
                        self.doc_token(lparen, dc);
                        let mut expr = dc;
                        let r = self.parse_expr(
                            Some(&mut expr),
                            ExprArg {
                                dc,
                                stop: None,
                                indent: 0,
                                flags: ExprFlags::default(),
                            },
                        );
                        if r.halted() {
                            return self.fail();
                        }
                        if let Some(tk) = self.lx.expect(TokenKind::RParen) {
                            self.doc_token(tk, expr);
                            align_after = Some(tk);
                        }
                    }
                }

                // Enum fields are allowed to omit any initialization,
                // alignment is not desired then.
                if self.lx.peek_if(TokenKind::Comma).is_some() {
                    skip_init = true;
                    break;
                }
            } else {
                break;
            }
        }

        if !skip_init {
            if let Some(align) = align_after {
                let width = self.width(dc);
                rl.insert(self.lx.store(), Some(align), &mut self.arena, dc, 1, width, 0);
            }

            let stop = self
                .lx
                .peek_until_loose(TokenKind::Comma, Some(rbrace))
                .unwrap_or(rbrace);
            if let Some(equal) = self.lx.if_kind(TokenKind::Equal) {
                self.doc_token(equal, dc);
                self.arena.literal(" ", Some(dc));
                if self.lx.peek_if(TokenKind::LBrace).is_some() {
                    let r = self.parse_braces(dc, self.indent_width(), flags);
                    if r.halted() || r == Ret::None {
                        return self.fail();
                    }
                } else {
                    let r = self.parse_expr(
                        None,
                        ExprArg {
                            dc,
                            stop: Some(stop),
                            indent: self.indent_width(),
                            flags: ExprFlags::default(),
                        },
                    );
                    if r.halted() || r == Ret::None {
                        return self.fail();
                    }
                }
            }
        }

        if let Some(comma) = self.lx.if_kind(TokenKind::Comma) {
            self.doc_token(comma, dc);
            if self.lx.store().has_line(comma, 2) {
                rl.exec(&mut self.arena);
            }
        }

        self.good()
    }

    /// Insert a trailing comma after the last initializer residing on its
    /// own line.
    fn insert_trailing_comma(&mut self, rbrace: TokenId) {
        if !self.passes.is_enabled(Pass::Braces) {
            return;
        }
        let Some(pv) = self.lx.store().prev(rbrace) else {
            return;
        };
        let kind = self.lx.store()[pv].kind;
        if kind == TokenKind::Comma
            || kind == TokenKind::RParen
            || kind == TokenKind::LBrace
            || !self.lx.store().has_line(pv, 1)
        {
            return;
        }
        let comma = self.lx.insert_after(pv, clang::keyword_token(TokenKind::Comma));
        self.lx
            .store_mut()
            .move_suffixes_if(pv, comma, TokenKind::Space);
    }

    /// Remove hard line suffixes of the token preceding the given one,
    /// blank lines right before a closing brace are never kept.
    pub(crate) fn trim_before(&mut self, tk: TokenId) {
        if let Some(pv) = self.lx.store().prev(tk) {
            self.lx.store_mut().trim(pv);
        }
    }
}
