//! Parsing of C translation units into documents.
//!
//! The parsers perform no semantic analysis, the sole purpose is to carve
//! the token stream into documents describing the wanted layout. Material
//! mistakes are tolerated, anything that cannot be recognized is emitted
//! verbatim up to the next synchronization point.

pub(crate) mod attributes;
pub(crate) mod cpp_decl;
pub(crate) mod decl;
pub(crate) mod expr;
pub(crate) mod func;
pub(crate) mod stmt;
pub(crate) mod types;

use crate::clang;
use crate::cpp;
use crate::diff::DiffChunk;
use crate::doc::{self, DocArena, DocId, ExecArgs, ExecFlags};
use crate::error::Diagnostics;
use crate::lexer::{LexError, Lexer, TokenId, TokenKind};
use crate::options::Options;
use crate::simple::decl::SimpleDecl;
use crate::simple::decl_forward::SimpleDeclForward;
use crate::simple::stmt::SimpleStmt;
use crate::simple::{EnterFlags, Pass, Passes};
use crate::style::{Keyword, Style, StyleKey};

/// Outcome of a parser routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ret {
    /// Something was consumed.
    Good,
    /// Nothing was found, the cursor is untouched.
    None,
    /// An error occurred, formatting of the file is doomed.
    Fail,
}

impl Ret {
    pub(crate) fn halted(self) -> bool {
        self == Ret::Fail
    }
}

pub struct Parser<'a> {
    pub(crate) lx: Lexer,
    pub(crate) style: &'a Style,
    pub(crate) options: &'a Options,
    pub(crate) passes: Passes,
    pub(crate) arena: DocArena,
    pub(crate) error: bool,
    pub(crate) simple_decl: Option<SimpleDecl>,
    pub(crate) simple_decl_forward: Option<SimpleDeclForward>,
    pub(crate) simple_stmt: Option<SimpleStmt>,
}

/// Format one translation unit. The returned diagnostics are non-fatal,
/// a hard error aborts the file.
pub fn format(
    src: &str,
    path: &str,
    style: &Style,
    options: &Options,
    chunks: Vec<DiffChunk>,
) -> Result<(String, Diagnostics), LexError> {
    let lx = Lexer::new(src, path, chunks, options)?;
    let mut pr = Parser {
        lx,
        style,
        options,
        passes: Passes::new(options.simple),
        arena: DocArena::new(),
        error: false,
        simple_decl: None,
        simple_decl_forward: None,
        simple_stmt: None,
    };

    clang::exec(&mut pr.lx);
    cpp::include_guard::exec(&mut pr.lx, style);

    if style.keyword(StyleKey::SortIncludes) != Keyword::Never {
        let (enabled, cookie) = pr.passes.enter(
            Pass::SortIncludes,
            EnterFlags {
                force: true,
                ..EnterFlags::default()
            },
        );
        if enabled {
            cpp::include::sort(&mut pr.lx, style, options);
        }
        pr.passes.leave(cookie);
    }

    if options.simple {
        for pass in [
            Pass::Decl,
            Pass::DeclForward,
            Pass::DeclProto,
            Pass::ExprPrintf,
            Pass::ImplicitInt,
            Pass::StmtEmptyLoop,
            Pass::StmtSwitch,
            Pass::Attributes,
            Pass::Braces,
            Pass::Stmt,
        ] {
            pr.simplify(pass);
        }
    }

    let root = pr.exec_root();
    let out = doc::exec(
        ExecArgs {
            arena: &pr.arena,
            store: pr.lx.store(),
            lx: Some(&pr.lx),
            style,
            options,
            flags: ExecFlags {
                diff: options.diff_parse,
                width: false,
            },
        },
        root,
    );

    let mut diags = Diagnostics::new();
    diags.append(&mut pr.lx.diags);
    Ok((out, diags))
}

impl<'a> Parser<'a> {
    /// Dry run the translation unit with a single simplification pass
    /// active, materializing its token stream edits. The produced document
    /// is discarded, the edits are picked up by the final run.
    fn simplify(&mut self, pass: Pass) {
        let (enabled, cookie) = self.passes.enter(pass, EnterFlags::default());
        if enabled {
            // The static pass runs as part of the decl pass.
            let static_cookie = if pass == Pass::Decl {
                Some(self.passes.enter(Pass::Static, EnterFlags::default()).1)
            } else {
                None
            };

            log::debug!("parser: simplify {pass:?}");
            let st = self.lx.peek_enter();
            let _ = self.exec_root();
            self.lx.peek_leave(st);
            self.reset();
            self.arena = DocArena::new();

            if let Some(static_cookie) = static_cookie {
                self.passes.leave(static_cookie);
            }
        }
        self.passes.leave(cookie);
    }

    /// Drive the parse of the whole translation unit.
    pub(crate) fn exec_root(&mut self) -> DocId {
        let root = self.arena.concat(None);

        loop {
            let concat = self.arena.concat(Some(root));

            // Always emit the EOF token as it could have dangling trivia.
            if let Some(tk) = self.lx.if_kind(TokenKind::Eof) {
                self.doc_token(tk, concat);
                break;
            }

            let r = self.exec_top_level(concat);
            match r {
                Ret::Good => {
                    self.arena.hardline(Some(concat));
                    // Take the next branch if available.
                    self.lx.branch();
                }
                Ret::None | Ret::Fail => {
                    if self.lx.branch() {
                        self.reset();
                        continue;
                    }
                    if !self.recover(concat) {
                        break;
                    }
                    self.reset();
                }
            }
        }

        root
    }

    fn exec_top_level(&mut self, dc: DocId) -> Ret {
        let r = self.parse_extern(dc);
        if r != Ret::None {
            return r;
        }
        let r = self.parse_decl(
            dc,
            decl::DeclFlags {
                break_on_line: true,
                root: true,
            },
        );
        if r != Ret::None {
            return r;
        }
        let r = self.parse_func_impl(dc);
        if r != Ret::None {
            return r;
        }
        // Tolerate statements at the root, the input could be a fragment.
        self.parse_stmt(dc)
    }

    /// Parse an extern block such as `extern "C" { ... }`.
    fn parse_extern(&mut self, dc: DocId) -> Ret {
        let st = self.lx.peek_enter();
        let peek = self.lx.if_kind(TokenKind::Extern).is_some()
            && self.lx.if_kind(TokenKind::String).is_some()
            && self
                .lx
                .if_pair(TokenKind::LBrace, TokenKind::RBrace)
                .is_some();
        self.lx.peek_leave(st);
        if !peek {
            return Ret::None;
        }

        if let Some(tk) = self.lx.expect(TokenKind::Extern) {
            self.doc_token(tk, dc);
        }
        self.arena.literal(" ", Some(dc));
        if let Some(tk) = self.lx.expect(TokenKind::String) {
            self.doc_token(tk, dc);
        }
        self.arena.literal(" ", Some(dc));
        if let Some(tk) = self.lx.expect(TokenKind::LBrace) {
            self.doc_token(tk, dc);
        }
        self.arena.hardline(Some(dc));
        loop {
            if self.lx.peek_if(TokenKind::RBrace).is_some()
                || self.lx.peek_if(TokenKind::Eof).is_some()
            {
                break;
            }
            let r = self.exec_top_level(dc);
            if r == Ret::None {
                break;
            }
            if r.halted() {
                return r;
            }
            self.arena.hardline(Some(dc));
        }
        if let Some(tk) = self.lx.expect(TokenKind::RBrace) {
            self.doc_token(tk, dc);
        }
        if let Some(tk) = self.lx.if_kind(TokenKind::Semi) {
            self.doc_token(tk, dc);
        }
        self.good()
    }

    /// Skip ahead to the next synchronization point, emitting everything
    /// in between keeping the output complete. Returns false once the end
    /// of the stream is reached.
    pub(crate) fn recover(&mut self, dc: DocId) -> bool {
        self.reset();
        let mut any = false;
        while let Some(tk) = self.lx.pop() {
            let kind = self.lx.store()[tk].kind;
            if kind == TokenKind::Eof {
                self.lx.seek(tk);
                return any;
            }
            self.doc_token(tk, dc);
            any = true;
            match kind {
                TokenKind::Semi | TokenKind::RBrace => break,
                _ => {}
            }
        }
        self.arena.hardline(Some(dc));
        any
    }

    pub(crate) fn reset(&mut self) {
        self.error = false;
        self.lx.clear_error();
    }

    pub(crate) fn halted(&self) -> bool {
        self.error || self.lx.get_error()
    }

    pub(crate) fn good(&mut self) -> Ret {
        if self.lx.get_error() {
            Ret::None
        } else {
            Ret::Good
        }
    }

    pub(crate) fn fail(&mut self) -> Ret {
        if self.halted() {
            return Ret::Fail;
        }
        self.error = true;
        // Be quiet while peeking or dry running a simplification pass.
        if !self.lx.is_peeking() {
            let at = self
                .lx
                .back()
                .map(|tk| self.lx.store().serialize(tk))
                .unwrap_or_else(|| "(null)".to_string());
            let path = self.lx.path().to_string();
            self.lx.diags.push(&path, 0, 0, &format!("error at {at}"));
        }
        Ret::Fail
    }

    pub(crate) fn doc_token(&mut self, tk: TokenId, parent: DocId) -> DocId {
        self.arena.token(self.lx.store(), tk, parent)
    }

    /// Returns the width of the given document.
    pub(crate) fn width(&self, dc: DocId) -> u32 {
        doc::width(&self.arena, self.lx.store(), self.style, self.options, dc)
    }

    /// Returns true if any token in between the cursor and the stop token
    /// resides on a different line than its predecessor.
    pub(crate) fn peek_line(&mut self, stop: TokenId) -> bool {
        let st = self.lx.peek_enter();
        let mut pv: Option<TokenId> = None;
        let mut peek = false;
        while let Some(tk) = self.lx.pop() {
            if tk == stop || self.lx.store()[tk].kind == TokenKind::Eof {
                break;
            }
            if let Some(pv) = pv {
                if self.lx.store()[tk].lno > self.lx.store()[pv].lno {
                    peek = true;
                    break;
                }
            }
            pv = Some(tk);
        }
        self.lx.peek_leave(st);
        peek
    }

    pub(crate) fn indent_width(&self) -> i32 {
        self.style.indent_width() as i32
    }

    pub(crate) fn continuation_indent(&self) -> i32 {
        self.style.continuation_indent_width() as i32
    }
}
