//! Recognition and emission of types.

use crate::doc::DocId;
use crate::lexer::{TokenFlags, TokenId, TokenKind};
use crate::ruler::Ruler;
use crate::simple::{implicit_int, static_kw, Pass};

use super::{Parser, Ret};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TypeFlags {
    /// The type is part of a cast expression.
    pub cast: bool,
    /// The type is part of a function argument.
    pub arg: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ParsedType {
    pub beg: TokenId,
    pub end: TokenId,
    /// Token to align the declarator against, annotated for function
    /// pointer types.
    pub align: Option<TokenId>,
}

impl<'a> Parser<'a> {
    /// Returns the span of the next tokens if they denote a type. The
    /// cursor is left untouched.
    pub(crate) fn peek_type(&mut self, flags: TypeFlags) -> Option<ParsedType> {
        let Some(beg) = self.lx.peek() else {
            return None;
        };

        let st = self.lx.peek_enter();
        let mut peek = false;
        let mut unknown = false;
        let mut ntokens = 0;
        let mut nkeywords = 0;
        let mut end: Option<TokenId> = None;
        let mut align = None;

        loop {
            if self.lx.peek_if(TokenKind::Eof).is_some() {
                break;
            }

            if let Some(tk) = self
                .lx
                .if_flags(TokenFlags::QUALIFIER | TokenFlags::STORAGE)
            {
                nkeywords += 1;
                end = Some(tk);
                peek = true;
            } else if let Some(tk) = self.lx.if_flags(TokenFlags::TYPE) {
                let mut tk = tk;
                if matches!(
                    self.lx.store()[tk].kind,
                    TokenKind::Enum | TokenKind::Struct | TokenKind::Union
                ) {
                    if let Some(ident) = self.lx.if_kind(TokenKind::Ident) {
                        tk = ident;
                    }
                }
                // Recognize constructs like `struct s[]`.
                if let Some(rsquare) = self.lx.if_pair(TokenKind::LSquare, TokenKind::RSquare)
                {
                    tk = rsquare;
                }
                end = Some(tk);
                peek = true;
            } else if let Some(tk) = self.lx.if_kind(TokenKind::Star) {
                // A pointer is expected to only be followed by another
                // pointer or a known type. Otherwise, the following
                // identifier cannot be part of the type.
                if self.lx.peek_if(TokenKind::Ident).is_some() {
                    break;
                }
                // A type cannot start with a pointer.
                if ntokens == 0 {
                    break;
                }
                end = Some(tk);
                peek = true;
            } else if self.peek_type_cpp() {
                self.lx.if_kind(TokenKind::Ident);
                if let Some(tk) = self.lx.if_pair(TokenKind::LParen, TokenKind::RParen) {
                    end = Some(tk);
                }
            } else if self.lx.peek_if(TokenKind::Ident).is_some() {
                // Recognize function arguments consisting of a single type
                // lacking a variable name.
                let sole = {
                    let ss = self.lx.peek_enter();
                    let sole = (flags.cast || flags.arg)
                        && ntokens == 0
                        && self.lx.if_kind(TokenKind::Ident).is_some()
                        && (self.lx.if_kind(TokenKind::RParen).is_some()
                            || self.lx.if_kind(TokenKind::Comma).is_some());
                    self.lx.peek_leave(ss);
                    sole
                };
                if sole {
                    end = self.lx.pop();
                    peek = true;
                    break;
                }

                // Ensure this is not the identifier after the type.
                if !flags.cast && self.peek_type_ident() {
                    break;
                }

                // The identifier is part of the type, i.e. a preprocessor
                // macro, consume it.
                if let Some(tk) = self.lx.if_kind(TokenKind::Ident) {
                    end = Some(tk);
                }
            } else if ntokens > 0 {
                if let Some((rparen, lparen)) = self.peek_type_func_ptr() {
                    // Take note of where to perform ruler alignment.
                    align = self.lx.back();
                    if let Some(lparen) = lparen {
                        self.lx.store_mut()[lparen].flags.insert(TokenFlags::TYPE_ARGS);
                    }
                    end = Some(rparen);
                    peek = true;
                    break;
                } else if self.peek_type_array_ptr() {
                    peek = true;
                    break;
                } else {
                    unknown = true;
                    break;
                }
            } else {
                unknown = true;
                break;
            }

            ntokens += 1;
        }
        self.lx.peek_leave(st);

        if ntokens > 0 && ntokens == nkeywords && !flags.arg {
            // Only qualifier or storage token(s) cannot denote a type.
            peek = false;
        } else if !peek && !unknown && ntokens > 0 {
            // Nothing was found. However, this is a sequence of identifiers
            // i.e. unknown types, therefore treat it as a type.
            peek = true;
        }

        match (peek, end) {
            (true, Some(end)) => Some(ParsedType { beg, end, align }),
            _ => None,
        }
    }

    /// Detect function pointers such as `(*fn)(int)`, returning the
    /// closing parenthesis of the arguments and the one opening them.
    fn peek_type_func_ptr(&mut self) -> Option<(TokenId, Option<TokenId>)> {
        let st = self.lx.peek_enter();
        let mut out = None;

        'done: {
            if self.lx.if_kind(TokenKind::LParen).is_none()
                || self.lx.if_kind(TokenKind::Star).is_none()
            {
                break 'done;
            }
            while self.lx.if_kind(TokenKind::Star).is_some() {}
            self.lx.if_flags(TokenFlags::QUALIFIER);
            let ident = self.lx.if_kind(TokenKind::Ident);
            if self.lx.if_kind(TokenKind::LSquare).is_some() {
                self.lx.if_kind(TokenKind::Literal);
                self.lx.if_kind(TokenKind::RSquare);
            }
            let Some(rparen) = self.lx.if_kind(TokenKind::RParen) else {
                break 'done;
            };
            if let Some(lparen) = self.lx.peek_if(TokenKind::LParen) {
                if let Some(end) = self.lx.if_pair(TokenKind::LParen, TokenKind::RParen) {
                    out = Some((end, Some(lparen)));
                    break 'done;
                }
            }
            // A function pointer lacking arguments wrapped in parenthesis,
            // careful not to confuse a function call.
            if ident.is_none()
                && (self.lx.peek_if(TokenKind::RParen).is_some()
                    || self.lx.peek_if(TokenKind::Eof).is_some())
            {
                out = Some((rparen, None));
            }
        }

        self.lx.peek_leave(st);
        out
    }

    /// Detect pointer arrays such as `(*fn[])`.
    fn peek_type_array_ptr(&mut self) -> bool {
        let st = self.lx.peek_enter();
        let peek = self.lx.if_kind(TokenKind::LParen).is_some()
            && self.lx.if_kind(TokenKind::Star).is_some()
            && self.lx.if_kind(TokenKind::Ident).is_some()
            && self.lx.if_kind(TokenKind::RParen).is_some()
            && self.lx.if_kind(TokenKind::LSquare).is_some();
        self.lx.peek_leave(st);
        peek
    }

    /// Returns true if the next identifier is the one following the type.
    fn peek_type_ident(&mut self) -> bool {
        let st = self.lx.peek_enter();
        let peek = self.lx.if_kind(TokenKind::Ident).is_some()
            && (self.lx.if_flags(TokenFlags::ASSIGN).is_some()
                || self.lx.if_kind(TokenKind::LSquare).is_some()
                || (self.lx.if_kind(TokenKind::LParen).is_some()
                    && self.lx.peek_if(TokenKind::Star).is_none())
                || self.lx.if_kind(TokenKind::RParen).is_some()
                || self.lx.if_kind(TokenKind::Semi).is_some()
                || self.lx.if_kind(TokenKind::Comma).is_some()
                || self.lx.if_kind(TokenKind::Colon).is_some()
                || self.lx.if_kind(TokenKind::Attribute).is_some());
        self.lx.peek_leave(st);
        peek
    }

    /// Detect usage of types hidden behind cpp such as `STACK_OF(X509)`.
    fn peek_type_cpp(&mut self) -> bool {
        let st = self.lx.peek_enter();
        let mut peek = false;
        if let Some(ident) = self.lx.if_kind(TokenKind::Ident) {
            if self.lx.if_kind(TokenKind::LParen).is_some()
                && self.lx.if_kind(TokenKind::Ident).is_some()
                && self.lx.if_kind(TokenKind::RParen).is_some()
            {
                if let Some(nx) = self.lx.if_kind(TokenKind::Ident) {
                    // Ugly, do not confuse an X macro.
                    if self.lx.peek_if(TokenKind::LParen).is_none()
                        && self.lx.store()[ident].text != self.lx.store()[nx].text
                    {
                        peek = true;
                    }
                } else if self.lx.if_kind(TokenKind::Star).is_some() {
                    peek = true;
                }
            }
        }
        self.lx.peek_leave(st);
        peek
    }

    /// Emit the tokens of a type, the span is expected to have been
    /// discovered by [`Parser::peek_type`] beforehand.
    pub(crate) fn parse_type(
        &mut self,
        dc: DocId,
        ty: ParsedType,
        mut rl: Option<&mut Ruler>,
    ) -> Ret {
        let mut ty = ty;

        // Simplifications limited to the beginning of a declaration.
        if self.passes.is_enabled(Pass::ImplicitInt) {
            ty.end = implicit_int::exec(&mut self.lx, ty.beg, ty.end);
        }

        let mut align = None;
        let mut nspaces = 0;
        if rl.is_some() {
            // Find the first non pointer token starting from the end, this
            // is where the ruler alignment must be performed.
            let mut tk = ty.align.unwrap_or(ty.end);
            loop {
                if self.lx.store()[tk].kind != TokenKind::Star {
                    break;
                }
                nspaces += 1;
                if tk == ty.beg {
                    break;
                }
                match self.lx.store().prev(tk) {
                    Some(pv) => tk = pv,
                    None => break,
                }
            }
            align = Some(tk);
        }

        loop {
            let Some(tk) = self.lx.pop() else {
                return self.fail();
            };

            // Hoist a misplaced storage class to the front of the type.
            if self.passes.is_enabled(Pass::Static)
                && self.lx.store()[tk].kind == TokenKind::Static
                && tk != ty.beg
            {
                ty.end = static_kw::exec(&mut self.lx, ty.beg, ty.end, tk);
                if tk == ty.end {
                    break;
                }
                continue;
            }

            if self.lx.store()[tk].flags.intersects(TokenFlags::TYPE_ARGS) {
                // Arguments of a function pointer type.
                self.doc_token(tk, dc);
                let indent = self.arena.indent(self.continuation_indent(), Some(dc));
                while self.parse_func_arg(indent, None, ty.end) == Ret::Good {}
                break;
            }

            let concat = self.arena.group_concat(Some(dc));
            self.doc_token(tk, concat);

            let mut didalign = false;
            if align == Some(tk) {
                if let Some(rl) = rl.as_deref_mut() {
                    let width = self.width(dc);
                    rl.insert(
                        self.lx.store(),
                        Some(tk),
                        &mut self.arena,
                        concat,
                        1,
                        width,
                        nspaces,
                    );
                    didalign = true;
                }
            }

            if tk == ty.end {
                break;
            }

            if !didalign {
                let st = self.lx.peek_enter();
                let kind = self.lx.store()[tk].kind;
                let space = !matches!(
                    kind,
                    TokenKind::Star | TokenKind::LParen | TokenKind::LSquare
                ) && match self.lx.pop() {
                    Some(nx) => {
                        let nxkind = self.lx.store()[nx].kind;
                        (nxkind != TokenKind::LParen
                            || self.lx.if_kind(TokenKind::Star).is_some())
                            && !matches!(
                                nxkind,
                                TokenKind::LSquare
                                    | TokenKind::RSquare
                                    | TokenKind::RParen
                                    | TokenKind::Comma
                            )
                    }
                    None => false,
                };
                self.lx.peek_leave(st);
                if space {
                    self.arena.line(Some(concat));
                }
            }
        }

        self.good()
    }
}
