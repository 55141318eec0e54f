//! Parsing of expressions into documents.
//!
//! A precedence climbing parser producing an expression tree which in turn
//! is translated into documents. The translation is where the line break
//! policy of expressions lives, soft lines are placed such that breaking
//! happens at the outermost sensible spot.

use crate::doc::DocId;
use crate::lexer::{TokenFlags, TokenId, TokenKind};
use crate::simple::{expr_printf, Pass};

use super::{Parser, Ret};

/// Precedence, from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Pc {
    Pc0,
    Pc1,
    Pc2,
    Pc3,
    Pc4,
    Pc5,
    Pc6,
    Pc7,
    Pc8,
    Pc9,
    Pc10,
    Pc11,
    Pc12,
    Pc13,
    Pc14,
    Pc15,
}

impl Pc {
    fn pred(self) -> Pc {
        use Pc::*;
        match self {
            Pc0 | Pc1 => Pc0,
            Pc2 => Pc1,
            Pc3 => Pc2,
            Pc4 => Pc3,
            Pc5 => Pc4,
            Pc6 => Pc5,
            Pc7 => Pc6,
            Pc8 => Pc7,
            Pc9 => Pc8,
            Pc10 => Pc9,
            Pc11 => Pc10,
            Pc12 => Pc11,
            Pc13 => Pc12,
            Pc14 => Pc13,
            Pc15 => Pc14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Binary,
    Concat,
    Field,
    Literal,
    Parens,
    PrePost,
    Sizeof,
    Squares,
    Ternary,
    Unary,
}

struct Rule {
    pc: Pc,
    unary: bool,
    rassoc: bool,
    kind: RuleKind,
}

fn rule_find(kind: TokenKind, flags: TokenFlags, unary: bool) -> Option<Rule> {
    use Pc::*;
    use RuleKind::{Binary, Concat, Field, Parens, PrePost, Squares, Ternary, Unary};
    use TokenKind::*;

    if matches!(kind, Ident | TokenKind::Literal | TokenKind::String)
        || flags.intersects(TokenFlags::TYPE)
    {
        return Some(if unary {
            Rule {
                pc: Pc0,
                unary: true,
                rassoc: false,
                kind: RuleKind::Literal,
            }
        } else {
            Rule {
                pc: Pc1,
                unary: false,
                rassoc: false,
                kind: Concat,
            }
        });
    }

    let rule = match (kind, unary) {
        (Comma, _) => Rule { pc: Pc1, unary, rassoc: false, kind: Binary },
        (Equal, false)
        | (PlusEqual, false)
        | (MinusEqual, false)
        | (StarEqual, false)
        | (SlashEqual, false)
        | (PercentEqual, false)
        | (LessLessEqual, false)
        | (GreaterGreaterEqual, false)
        | (AmpEqual, false)
        | (CaretEqual, false)
        | (PipeEqual, false) => Rule { pc: Pc2, unary: false, rassoc: true, kind: Binary },
        (Question, false) => Rule { pc: Pc3, unary: false, rassoc: true, kind: Ternary },
        (PipePipe, false) => Rule { pc: Pc4, unary: false, rassoc: false, kind: Binary },
        (AmpAmp, false) => Rule { pc: Pc5, unary: false, rassoc: false, kind: Binary },
        (Pipe, false) => Rule { pc: Pc6, unary: false, rassoc: false, kind: Binary },
        (Caret, false) => Rule { pc: Pc7, unary: false, rassoc: false, kind: Binary },
        (Amp, false) => Rule { pc: Pc8, unary: false, rassoc: false, kind: Binary },
        (EqualEqual, false) | (ExclaimEqual, false) => {
            Rule { pc: Pc9, unary: false, rassoc: false, kind: Binary }
        }
        (Less, false) | (LessEqual, false) | (Greater, false) | (GreaterEqual, false) => {
            Rule { pc: Pc10, unary: false, rassoc: false, kind: Binary }
        }
        (LessLess, false) | (GreaterGreater, false) => {
            Rule { pc: Pc11, unary: false, rassoc: false, kind: Binary }
        }
        (Plus, false) | (Minus, false) => {
            Rule { pc: Pc12, unary: false, rassoc: false, kind: Binary }
        }
        (Star, false) | (Slash, false) | (Percent, false) => {
            Rule { pc: Pc13, unary: false, rassoc: false, kind: Binary }
        }
        (Exclaim, true) | (Tilde, true) | (Plus, true) | (Minus, true) | (Star, true)
        | (Amp, true) => Rule { pc: Pc14, unary: true, rassoc: true, kind: Unary },
        (PlusPlus, _) | (MinusMinus, _) => {
            Rule { pc: Pc14, unary, rassoc: true, kind: PrePost }
        }
        (TokenKind::Sizeof, true) => {
            Rule { pc: Pc14, unary: true, rassoc: true, kind: RuleKind::Sizeof }
        }
        (LParen, _) => Rule { pc: Pc15, unary, rassoc: false, kind: Parens },
        (LSquare, false) => Rule { pc: Pc15, unary: false, rassoc: false, kind: Squares },
        (Arrow, false) | (Period, false) => {
            Rule { pc: Pc15, unary: false, rassoc: false, kind: Field }
        }
        _ => return Option::None,
    };
    Some(rule)
}

#[derive(Debug)]
enum Expr {
    Unary {
        tk: TokenId,
        lhs: Box<Expr>,
    },
    Binary {
        tk: TokenId,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        question: TokenId,
        colon: Option<TokenId>,
        cond: Box<Expr>,
        /// The true expression can be empty, GNU extension.
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },
    Prefix {
        tk: TokenId,
        lhs: Box<Expr>,
    },
    Postfix {
        tk: TokenId,
        lhs: Box<Expr>,
    },
    Parens {
        lparen: TokenId,
        rparen: Option<TokenId>,
        inner: Option<Box<Expr>>,
    },
    Squares {
        lsquare: TokenId,
        rsquare: Option<TokenId>,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Field {
        tk: TokenId,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        lparen: TokenId,
        rparen: Option<TokenId>,
        lhs: Box<Expr>,
        args: Option<Box<Expr>>,
    },
    Arg {
        comma: TokenId,
        lhs: Option<Box<Expr>>,
        rhs: Box<Expr>,
    },
    Cast {
        lparen: TokenId,
        rparen: Option<TokenId>,
        ty: (TokenId, TokenId),
        expr: Box<Expr>,
    },
    Sizeof {
        tk: TokenId,
        parens: Option<(TokenId, Option<TokenId>)>,
        expr: Option<Box<Expr>>,
        ty: Option<(TokenId, TokenId)>,
    },
    Concat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Literal {
        tk: TokenId,
    },
    /// Document produced by the recovery machinery, e.g. a type argument.
    Recover {
        dc: DocId,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExprFlags {
    /// Begin with a soft line.
    pub softline: bool,
    /// Begin with a hard line.
    pub hardline: bool,
    /// Suppress soft lines within the expression.
    pub nosoft: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ExprArg {
    pub dc: DocId,
    pub stop: Option<TokenId>,
    /// Indentation applied to the expression, zero leaves it alone.
    pub indent: i32,
    pub flags: ExprFlags,
}

#[derive(Default)]
struct DocState {
    depth: u32,
    parens: u32,
    soft: u32,
    assign: u32,
}

impl<'a> Parser<'a> {
    /// Parse an expression, returning the document trailing tokens may be
    /// appended to.
    pub(crate) fn parse_expr(&mut self, out: Option<&mut DocId>, arg: ExprArg) -> Ret {
        let Some(ex) = self.expr_exec1(Pc::Pc0, arg.stop) else {
            return Ret::None;
        };
        if self.lx.get_error() {
            return Ret::None;
        }

        let parent = if arg.indent > 0 {
            self.arena.indent(arg.indent, Some(arg.dc))
        } else {
            arg.dc
        };
        if arg.flags.hardline {
            self.arena.hardline(Some(parent));
        } else if arg.flags.softline {
            self.arena.softline(Some(parent));
        }

        let mut st = DocState {
            soft: if arg.flags.nosoft { 1 } else { 0 },
            ..DocState::default()
        };
        let dc = self.expr_doc(&ex, &mut st, parent);
        if let Some(out) = out {
            *out = dc;
        }
        self.good()
    }

    /// Returns the last token of the expression if one begins at the
    /// cursor.
    pub(crate) fn peek_expr(&mut self, stop: Option<TokenId>) -> Option<TokenId> {
        let st = self.lx.peek_enter();
        let ex = self.expr_exec1(Pc::Pc0, stop);
        let end = if ex.is_some() { self.lx.back() } else { None };
        self.lx.peek_leave(st);
        end
    }

    fn expr_exec1(&mut self, pc: Pc, stop: Option<TokenId>) -> Option<Expr> {
        if self.lx.get_error() {
            return None;
        }
        if self.lx.back().is_some() && self.lx.back() == stop {
            return None;
        }
        let tk = self.lx.peek()?;
        if Some(tk) == stop {
            return None;
        }

        let mut ex = self.expr_primary(stop)?;

        loop {
            if self.lx.back() == stop && stop.is_some() {
                break;
            }
            let Some(tk) = self.lx.peek() else {
                break;
            };
            if Some(tk) == stop {
                break;
            }

            let tok = &self.lx.store()[tk];
            let Some(rule) = rule_find(tok.kind, tok.flags, false) else {
                break;
            };
            if pc >= rule.pc {
                break;
            }
            self.lx.pop();

            ex = self.expr_infix(rule, tk, ex, stop)?;
            if self.lx.get_error() {
                return None;
            }
        }

        Some(ex)
    }

    fn expr_primary(&mut self, stop: Option<TokenId>) -> Option<Expr> {
        if let Some(dc) = self.expr_recover(stop) {
            return Some(Expr::Recover { dc });
        }

        let tk = self.lx.peek()?;
        let tok = &self.lx.store()[tk];
        let rule = rule_find(tok.kind, tok.flags, true)?;
        self.lx.pop();

        match rule.kind {
            RuleKind::Literal => {
                if self.passes.is_enabled(Pass::ExprPrintf) {
                    expr_printf::exec(&mut self.lx, tk);
                }
                Some(Expr::Literal { tk })
            }
            RuleKind::Unary => {
                let lhs = self.expr_exec1(rule.pc, stop)?;
                Some(Expr::Unary {
                    tk,
                    lhs: Box::new(lhs),
                })
            }
            RuleKind::PrePost => {
                let lhs = self.expr_exec1(rule.pc, stop)?;
                Some(Expr::Prefix {
                    tk,
                    lhs: Box::new(lhs),
                })
            }
            RuleKind::Sizeof => self.expr_sizeof(tk, stop),
            RuleKind::Parens => self.expr_parens(tk, stop),
            _ => None,
        }
    }

    fn expr_infix(&mut self, rule: Rule, tk: TokenId, lhs: Expr, stop: Option<TokenId>) -> Option<Expr> {
        match rule.kind {
            RuleKind::Binary => {
                let pc = if rule.rassoc {
                    rule.pc.pred()
                } else {
                    rule.pc
                };
                let rhs = self.expr_exec1(pc, stop)?;
                if self.lx.store()[tk].kind == TokenKind::Comma {
                    Some(Expr::Arg {
                        comma: tk,
                        lhs: Some(Box::new(lhs)),
                        rhs: Box::new(rhs),
                    })
                } else {
                    Some(Expr::Binary {
                        tk,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    })
                }
            }
            RuleKind::Concat => {
                let rhs = Expr::Literal { tk };
                Some(Expr::Concat {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            RuleKind::Ternary => {
                let cond = lhs;
                // The true expression can be empty, GNU extension.
                let then = self.expr_exec1(Pc::Pc0, stop).map(Box::new);
                let colon = self.lx.expect(TokenKind::Colon);
                let otherwise = self.expr_exec1(Pc::Pc0, stop)?;
                Some(Expr::Ternary {
                    question: tk,
                    colon,
                    cond: Box::new(cond),
                    then,
                    otherwise: Box::new(otherwise),
                })
            }
            RuleKind::PrePost => Some(Expr::Postfix {
                tk,
                lhs: Box::new(lhs),
            }),
            RuleKind::Parens => {
                let args = self.expr_exec1(Pc::Pc0, stop).map(Box::new);
                let rparen = self.lx.expect(TokenKind::RParen);
                Some(Expr::Call {
                    lparen: tk,
                    rparen,
                    lhs: Box::new(lhs),
                    args,
                })
            }
            RuleKind::Squares => {
                let rhs = self.expr_exec1(Pc::Pc0, stop)?;
                let rsquare = self.lx.expect(TokenKind::RSquare);
                Some(Expr::Squares {
                    lsquare: tk,
                    rsquare,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            RuleKind::Field => {
                let rhs = self.expr_exec1(rule.pc, stop)?;
                Some(Expr::Field {
                    tk,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            _ => None,
        }
    }

    fn expr_parens(&mut self, lparen: TokenId, stop: Option<TokenId>) -> Option<Expr> {
        if let Some(cast) = self.expr_cast(lparen, stop) {
            return Some(cast);
        }

        let inner = self.expr_exec1(Pc::Pc0, stop).map(Box::new);
        let rparen = self.lx.expect(TokenKind::RParen);
        Some(Expr::Parens {
            lparen,
            rparen,
            inner,
        })
    }

    /// Returns a cast if the lexer is positioned right after the opening
    /// parenthesis of one.
    fn expr_cast(&mut self, lparen: TokenId, stop: Option<TokenId>) -> Option<Expr> {
        let iscast = {
            let st = self.lx.peek_enter();
            let iscast = match self.peek_type(super::types::TypeFlags {
                cast: true,
                ..super::types::TypeFlags::default()
            }) {
                Some(ty) => {
                    // Consume the type.
                    self.lx.seek(ty.end);
                    self.lx.pop();
                    self.lx.if_kind(TokenKind::RParen).is_some() && self.expr_peek_quiet(stop)
                }
                None => false,
            };
            self.lx.peek_leave(st);
            iscast
        };
        if !iscast {
            return None;
        }

        let ty = self.peek_type(super::types::TypeFlags {
            cast: true,
            ..super::types::TypeFlags::default()
        })?;
        self.lx.seek(ty.end);
        self.lx.pop();
        let rparen = self.lx.expect(TokenKind::RParen);
        let expr = self.expr_exec1(Pc::Pc0, stop)?;
        Some(Expr::Cast {
            lparen,
            rparen,
            ty: (ty.beg, ty.end),
            expr: Box::new(expr),
        })
    }

    fn expr_peek_quiet(&mut self, stop: Option<TokenId>) -> bool {
        let st = self.lx.peek_enter();
        let peek = self.expr_exec1(Pc::Pc0, stop).is_some();
        self.lx.peek_leave(st);
        peek
    }

    fn expr_sizeof(&mut self, tk: TokenId, stop: Option<TokenId>) -> Option<Expr> {
        let lparen = self.lx.if_kind(TokenKind::LParen);

        let mut expr = None;
        let mut ty = None;
        if self.expr_peek_quiet(stop) {
            expr = self.expr_exec1(Pc::Pc0, stop).map(Box::new);
        } else if let Some(parsed) = self.peek_type(super::types::TypeFlags::default()) {
            ty = Some((parsed.beg, parsed.end));
            self.lx.seek(parsed.end);
            self.lx.pop();
        }

        let parens = match lparen {
            Some(lparen) => {
                let rparen = self.lx.expect(TokenKind::RParen);
                Some((lparen, rparen))
            }
            None => None,
        };
        Some(Expr::Sizeof {
            tk,
            parens,
            expr,
            ty,
        })
    }

    /// Handle constructs the expression grammar cannot express: a type
    /// argument, a binary operator passed as an argument such as the one
    /// given to timercmp(3) and brace initializers.
    fn expr_recover(&mut self, _stop: Option<TokenId>) -> Option<DocId> {
        let tk = self.lx.peek()?;
        let store = self.lx.store();
        let pv = store.prev(tk);
        let pv_kind = pv.map(|pv| store[pv].kind);

        // A binary operator as an argument.
        if store[tk].flags.intersects(TokenFlags::BINARY)
            && !store[tk].flags.intersects(TokenFlags::TYPE)
            && matches!(pv_kind, Some(TokenKind::LParen) | Some(TokenKind::Comma))
        {
            let nx = store.next(tk);
            if matches!(
                nx.map(|nx| store[nx].kind),
                Some(TokenKind::RParen) | Some(TokenKind::Comma)
            ) {
                self.lx.pop();
                let dc = self.arena.concat(None);
                self.doc_token(tk, dc);
                return Some(dc);
            }
        }

        // A type argument, i.e. sizeof or va_arg.
        if matches!(
            pv_kind,
            Some(TokenKind::LParen) | Some(TokenKind::Comma) | Some(TokenKind::Sizeof)
        ) {
            if let Some(ty) = self.peek_type(super::types::TypeFlags {
                cast: true,
                ..super::types::TypeFlags::default()
            }) {
                // Only recover if this cannot be mistaken for the
                // beginning of an ordinary expression.
                let nx = self.lx.store().next(ty.end);
                let nx_kind = nx.map(|nx| self.lx.store()[nx].kind);
                let sole_ident = ty.beg == ty.end
                    && self.lx.store()[ty.beg].kind == TokenKind::Ident;
                if !sole_ident
                    && matches!(
                        nx_kind,
                        Some(TokenKind::RParen) | Some(TokenKind::Comma) | Some(TokenKind::Eof)
                    )
                {
                    let dc = self.arena.concat(None);
                    if self.parse_type(dc, ty, None).halted() {
                        return None;
                    }
                    return Some(dc);
                }
            }
        }

        // A brace initializer, i.e. a compound literal.
        if self.lx.store()[tk].kind == TokenKind::LBrace
            && matches!(pv_kind, Some(TokenKind::RParen) | Some(TokenKind::Equal))
        {
            let group = self.arena.group(None);
            let indent = self.arena.indent(-self.continuation_indent(), Some(group));
            if self.parse_decl_braces(indent).halted() {
                return None;
            }
            return Some(group);
        }

        None
    }

    /*
     * Document emission -------------------------------------------------
     */

    fn expr_doc(&mut self, ex: &Expr, st: &mut DocState, parent: DocId) -> DocId {
        st.depth += 1;

        let group = self.arena.group(Some(parent));
        let mut concat = self.arena.concat(Some(group));

        // Testing backdoor wrapping each expression in parenthesis, used
        // for validation of operator precedence.
        let test = self.options.test && !matches!(ex, Expr::Parens { .. });
        if test {
            self.arena.literal("(", Some(concat));
        }

        match ex {
            Expr::Unary { tk, lhs } => {
                // Never emit a soft line if this is the first unary
                // expression after one or many parenthesis expressions,
                // nested expressions emit more suitable ones.
                if (st.assign == 0 || st.parens > 0) && st.depth - 1 > st.parens {
                    concat = self.expr_doc_soft(st, concat);
                }
                self.doc_token(*tk, concat);
                self.expr_doc(lhs, st, concat);
            }

            Expr::Binary { tk, lhs, rhs } => {
                let lhs_doc = self.expr_doc(lhs, st, concat);

                let op = self.arena.group_concat(Some(lhs_doc));
                self.arena.line(Some(op));
                self.doc_token(*tk, op);

                let assign = self.lx.store()[*tk].flags.intersects(TokenFlags::ASSIGN);
                if assign {
                    st.assign += 1;
                    self.arena.literal(" ", Some(op));
                } else {
                    concat = self.arena.group_concat(Some(concat));
                    self.arena.line(Some(concat));
                    st.soft += 1;
                }
                concat = self.expr_doc(rhs, st, concat);
                if assign {
                    st.assign -= 1;
                } else {
                    st.soft -= 1;
                }
            }

            Expr::Ternary {
                question,
                colon,
                cond,
                then,
                otherwise,
            } => {
                let ternary = self.expr_doc(cond, st, concat);
                self.arena.line(Some(ternary));
                self.doc_token(*question, ternary);
                if then.is_some() {
                    self.arena.line(Some(ternary));
                }

                let mut ternary = self.expr_doc_soft(st, concat);
                if let Some(then) = then {
                    ternary = self.expr_doc(then, st, ternary);
                    self.arena.line(Some(ternary));
                }
                if let Some(colon) = colon {
                    self.doc_token(*colon, ternary);
                }
                self.arena.line(Some(ternary));

                let ternary = self.expr_doc_soft(st, concat);
                concat = self.expr_doc(otherwise, st, ternary);
            }

            Expr::Prefix { tk, lhs } => {
                self.doc_token(*tk, concat);
                self.expr_doc(lhs, st, concat);
            }

            Expr::Postfix { tk, lhs } => {
                self.expr_doc(lhs, st, concat);
                self.doc_token(*tk, concat);
            }

            Expr::Parens {
                lparen,
                rparen,
                inner,
            } => {
                self.doc_token(*lparen, concat);
                if let Some(inner) = inner {
                    st.parens += 1;
                    let mut dc = self
                        .arena
                        .indent_with(crate::doc::Indent::Parens, Some(concat));
                    dc = self.expr_doc_indent(st, dc, self.continuation_indent(), true);
                    concat = self.expr_doc(inner, st, dc);
                    st.parens -= 1;
                }
                if let Some(rparen) = rparen {
                    self.doc_token(*rparen, concat);
                }
            }

            Expr::Squares {
                lsquare,
                rsquare,
                lhs,
                rhs,
            } => {
                // Do not break the left expression.
                st.soft += 1;
                concat = self.expr_doc(lhs, st, concat);
                st.soft -= 1;
                self.doc_token(*lsquare, concat);
                concat = self.expr_doc_soft(st, concat);
                concat = self.expr_doc(rhs, st, concat);
                if let Some(rsquare) = rsquare {
                    self.doc_token(*rsquare, concat);
                }
            }

            Expr::Field { tk, lhs, rhs } => {
                concat = self.expr_doc_soft(st, concat);
                concat = self.expr_doc(lhs, st, concat);
                self.doc_token(*tk, concat);
                concat = self.expr_doc(rhs, st, concat);
            }

            Expr::Call {
                lparen,
                rparen,
                lhs,
                args,
            } => {
                // Do not break the left expression.
                st.soft += 1;
                concat = self.expr_doc(lhs, st, concat);
                st.soft -= 1;
                self.doc_token(*lparen, concat);
                if let Some(args) = args {
                    st.parens += 1;
                    let dc = self.expr_doc_indent(st, concat, self.indent_width(), false);
                    concat = self.expr_doc(args, st, dc);
                    st.parens -= 1;
                }
                if let Some(rparen) = rparen {
                    self.doc_token(*rparen, concat);
                }
            }

            Expr::Arg { comma, lhs, rhs } => {
                let mut lhs_doc = concat;
                if let Some(lhs) = lhs {
                    lhs_doc = self.expr_doc(lhs, st, concat);
                }
                self.doc_token(*comma, lhs_doc);
                self.arena.line(Some(lhs_doc));
                concat = self.arena.group_concat(Some(concat));
                self.arena.softline(Some(concat));
                st.soft += 1;
                concat = self.expr_doc(rhs, st, concat);
                st.soft -= 1;
            }

            Expr::Cast {
                lparen,
                rparen,
                ty,
                expr,
            } => {
                self.doc_token(*lparen, concat);
                self.expr_doc_tokens(ty.0, ty.1, concat);
                if let Some(rparen) = rparen {
                    self.doc_token(*rparen, concat);
                }
                self.expr_doc(expr, st, concat);
            }

            Expr::Sizeof {
                tk,
                parens,
                expr,
                ty,
            } => {
                self.doc_token(*tk, concat);
                if let Some((lparen, _)) = parens {
                    self.doc_token(*lparen, concat);
                } else {
                    self.arena.literal(" ", Some(concat));
                }
                if let Some(expr) = expr {
                    concat = self.expr_doc(expr, st, concat);
                } else if let Some((beg, end)) = ty {
                    self.expr_doc_tokens(*beg, *end, concat);
                }
                if let Some((_, Some(rparen))) = parens {
                    self.doc_token(*rparen, concat);
                }
            }

            Expr::Concat { lhs, rhs } => {
                concat = self.expr_doc(lhs, st, concat);
                self.arena.line(Some(concat));
                concat = self.expr_doc(rhs, st, concat);
            }

            Expr::Literal { tk } => {
                self.doc_token(*tk, concat);
            }

            Expr::Recover { dc } => {
                self.arena.append(concat, *dc);
            }
        }

        if test {
            self.arena.literal(")", Some(concat));
        }

        st.depth -= 1;
        concat
    }

    fn expr_doc_indent(&mut self, st: &DocState, dc: DocId, indent: i32, parens: bool) -> DocId {
        if st.parens < 2 {
            return dc;
        }
        // When applying the first level of indentation for nested
        // parenthesis, account for the compensation performed by the
        // expression entry point.
        let indent = if parens && st.parens == 2 {
            indent * 2
        } else {
            indent
        };
        self.arena.indent(indent, Some(dc))
    }

    /// Emit the tokens of a type operand verbatim, each in its own group.
    fn expr_doc_tokens(&mut self, beg: TokenId, end: TokenId, dc: DocId) -> DocId {
        let mut concat = dc;
        let mut line = true;
        let mut i = 0;
        let mut tk = Some(beg);
        while let Some(id) = tk {
            concat = self.arena.group_concat(Some(dc));
            if i > 0 {
                if line {
                    self.arena.line(Some(concat));
                }
                line = self.lx.store()[id].kind != TokenKind::Star;
            }
            i += 1;
            self.doc_token(id, concat);
            if id == end {
                break;
            }
            tk = self.lx.store().next(id);
        }

        // Nest any following tokens under the last group in order to cause
        // a refit.
        self.arena.group_concat(Some(concat))
    }

    /// Emit a soft line unless an expression above us has signalled that a
    /// more suitable one has already been emitted.
    fn expr_doc_soft(&mut self, st: &DocState, dc: DocId) -> DocId {
        if st.soft > 0 {
            return dc;
        }
        let concat = self.arena.group_concat(Some(dc));
        self.arena.softline(Some(concat));
        concat
    }
}

