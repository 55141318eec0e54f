//! Lexical analysis of C translation units.
//!
//! The lexer eagerly turns a source buffer into a doubly linked stream of
//! tokens. Comments and preprocessor directives never show up on the main
//! stream, instead they dangle off the closest main token as prefix and
//! suffix trivia, preserving enough information to reproduce the source.
//! The cursor operates on the materialized stream which makes unbounded
//! lookahead cheap, see [`Lexer::peek_enter`].

mod keywords;
pub mod token;

use std::error::Error;
use std::fmt::{self, Display};

use crate::diff::DiffChunk;
use crate::error::Diagnostics;
use crate::options::Options;

use self::keywords::{KEYWORDS, PUNCTUATORS};
pub use self::token::{Branch, Token, TokenFlags, TokenId, TokenKind, TokenStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError(pub String);

impl Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// Cursor state, saved and restored while peeking.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerState {
    cur: Option<TokenId>,
}

pub struct Lexer {
    path: String,
    src: String,
    line_offsets: Vec<usize>,
    store: TokenStore,
    state: LexerState,
    peeks: Vec<LexerState>,
    error: bool,
    chunks: Vec<DiffChunk>,
    pub diags: Diagnostics,
}

impl Lexer {
    pub fn new(
        src: &str,
        path: &str,
        chunks: Vec<DiffChunk>,
        _options: &Options,
    ) -> LexResult<Lexer> {
        let mut store = TokenStore::new();
        let mut scanner = Scanner::new(src);
        let error = scanner.tokenize(&mut store);

        let mut line_offsets = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_offsets.push(i + 1);
            }
        }

        let mut lx = Lexer {
            path: path.to_string(),
            src: src.to_string(),
            line_offsets,
            store,
            state: LexerState::default(),
            peeks: vec![],
            error: false,
            chunks,
            diags: Diagnostics::new(),
        };
        if let Some(err) = error {
            return Err(err);
        }
        lx.stamp_diff();
        Ok(lx)
    }

    fn stamp_diff(&mut self) {
        if self.chunks.is_empty() {
            return;
        }
        let mut cur = self.store.first();
        while let Some(id) = cur {
            let covered = self.diff_covers(self.store[id].lno);
            if covered {
                self.store[id].flags.insert(TokenFlags::DIFF);
                let trivia: Vec<TokenId> = self.store[id]
                    .prefixes
                    .iter()
                    .chain(self.store[id].suffixes.iter())
                    .copied()
                    .collect();
                for t in trivia {
                    self.store[t].flags.insert(TokenFlags::DIFF);
                }
            }
            cur = self.store.next(id);
        }
    }

    pub fn diff_covers(&self, lno: u32) -> bool {
        self.chunks.iter().any(|du| du.covers(lno))
    }

    pub fn diff_chunk(&self, lno: u32) -> Option<&DiffChunk> {
        self.chunks.iter().find(|du| du.covers(lno))
    }

    pub fn has_diff(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.src
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TokenStore {
        &mut self.store
    }

    pub fn get_error(&self) -> bool {
        self.error
    }

    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn clear_error(&mut self) {
        self.error = false;
    }

    /// Return the source text covering the half open line range, 1-based.
    /// An end of zero extends the range until the end of the buffer.
    pub fn get_lines(&self, beg: u32, end: u32) -> &str {
        let lo = self
            .line_offsets
            .get(beg.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(self.src.len());
        let hi = if end == 0 {
            self.src.len()
        } else {
            self.line_offsets
                .get(end.saturating_sub(1) as usize)
                .copied()
                .unwrap_or(self.src.len())
        };
        &self.src[lo..hi.max(lo)]
    }

    /*
     * Cursor ------------------------------------------------------------
     */

    pub fn pop(&mut self) -> Option<TokenId> {
        let next = match self.state.cur {
            None => self.store.first(),
            Some(cur) if self.store[cur].kind != TokenKind::Eof => self.store.next(cur),
            Some(cur) => Some(cur),
        };
        self.state.cur = next;
        next
    }

    /// The last consumed token.
    pub fn back(&self) -> Option<TokenId> {
        self.state.cur
    }

    pub fn peek(&mut self) -> Option<TokenId> {
        let saved = self.state;
        let tk = self.pop();
        self.state = saved;
        tk
    }

    pub fn peek_enter(&mut self) -> LexerState {
        self.peeks.push(self.state);
        self.state
    }

    pub fn peek_leave(&mut self, st: LexerState) {
        assert!(self.peeks.pop().is_some());
        self.state = st;
    }

    pub fn is_peeking(&self) -> bool {
        !self.peeks.is_empty()
    }

    /// Position the cursor such that the next pop returns the given token.
    pub fn seek(&mut self, id: TokenId) {
        self.state.cur = self.store.prev(id);
    }

    pub fn peek_if(&mut self, kind: TokenKind) -> Option<TokenId> {
        let tk = self.peek()?;
        (self.store[tk].kind == kind).then_some(tk)
    }

    pub fn if_kind(&mut self, kind: TokenKind) -> Option<TokenId> {
        let tk = self.peek_if(kind)?;
        self.pop();
        Some(tk)
    }

    pub fn peek_if_flags(&mut self, flags: TokenFlags) -> Option<TokenId> {
        let tk = self.peek()?;
        self.store[tk].flags.intersects(flags).then_some(tk)
    }

    pub fn if_flags(&mut self, flags: TokenFlags) -> Option<TokenId> {
        let tk = self.peek_if_flags(flags)?;
        self.pop();
        Some(tk)
    }

    /// Peek at the next balanced pair of tokens, returning the closing one.
    pub fn peek_if_pair(&mut self, lhs: TokenKind, rhs: TokenKind) -> Option<TokenId> {
        self.peek_if(lhs)?;

        let st = self.peek_enter();
        let mut pair = 0;
        let mut close = None;
        while let Some(tk) = self.pop() {
            let kind = self.store[tk].kind;
            if kind == TokenKind::Eof {
                break;
            }
            if kind == lhs {
                pair += 1;
            } else if kind == rhs {
                pair -= 1;
            }
            if pair == 0 {
                close = Some(tk);
                break;
            }
        }
        self.peek_leave(st);
        close
    }

    pub fn if_pair(&mut self, lhs: TokenKind, rhs: TokenKind) -> Option<TokenId> {
        let end = self.peek_if_pair(lhs, rhs)?;
        self.state.cur = Some(end);
        Some(end)
    }

    /// Peek until a token of the given kind, without consuming anything.
    pub fn peek_until(&mut self, kind: TokenKind) -> Option<TokenId> {
        let st = self.peek_enter();
        let found = self.until(kind);
        self.peek_leave(st);
        found
    }

    /// Peek until a token of the given kind which is not nested under
    /// parenthesis, squares nor braces, halting at the stop token.
    pub fn peek_until_loose(&mut self, kind: TokenKind, stop: Option<TokenId>) -> Option<TokenId> {
        let st = self.peek_enter();
        let mut nest = 0;
        let mut found = None;
        while let Some(tk) = self.pop() {
            if Some(tk) == stop || self.store[tk].kind == TokenKind::Eof {
                break;
            }
            let k = self.store[tk].kind;
            if k == kind && nest == 0 {
                found = Some(tk);
                break;
            }
            match k {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LSquare => nest += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RSquare => nest -= 1,
                _ => {}
            }
        }
        self.peek_leave(st);
        found
    }

    /// Shorthand for finding the next comma before the stop token.
    pub fn peek_until_comma(&mut self, stop: Option<TokenId>) -> Option<TokenId> {
        self.peek_until_loose(TokenKind::Comma, stop)
    }

    pub fn until(&mut self, kind: TokenKind) -> Option<TokenId> {
        while let Some(tk) = self.pop() {
            if self.store[tk].kind == kind {
                return Some(tk);
            }
            if self.store[tk].kind == TokenKind::Eof {
                break;
            }
        }
        None
    }

    pub fn expect(&mut self, kind: TokenKind) -> Option<TokenId> {
        let tk = self.pop();
        match tk {
            Some(tk) if self.store[tk].kind == kind => Some(tk),
            _ => {
                self.emit_error(kind, tk);
                None
            }
        }
    }

    fn emit_error(&mut self, kind: TokenKind, tk: Option<TokenId>) {
        // Be quiet while peeking.
        if self.is_peeking() {
            return;
        }
        if self.error {
            return;
        }
        self.error = true;
        let got = match tk {
            Some(tk) => self.store.serialize(tk),
            None => "nothing".to_string(),
        };
        let (lno, cno) = tk
            .map(|tk| (self.store[tk].lno, self.store[tk].cno))
            .unwrap_or((0, 0));
        self.diags
            .push(&self.path, lno, cno, &format!("expected {kind} got {got}"));
    }

    /*
     * Branches ----------------------------------------------------------
     */

    /// Returns true if the next token starts an alternative cpp branch.
    pub fn is_branch(&mut self) -> bool {
        match self.peek() {
            Some(tk) => self.store.is_branch(tk),
            None => false,
        }
    }

    /// Returns true if the next token closes a cpp branch.
    pub fn is_branch_end(&mut self) -> bool {
        match self.peek() {
            Some(tk) => self.store.find_prefix(tk, TokenKind::CppEndif).is_some(),
            None => false,
        }
    }

    /// Take the pending branch continuation if the next token carries one.
    /// The branch link is severed and emission is restored at the anchor.
    pub fn branch(&mut self) -> bool {
        let Some(tk) = self.peek() else {
            return false;
        };
        let Some(els) = self.store.find_prefix(tk, TokenKind::CppElse) else {
            return false;
        };
        if self.store[els].branch.prev.is_none() {
            return false;
        }
        self.store.branch_unlink(els);
        self.store[tk].flags.insert(TokenFlags::UNMUTE);
        log::trace!("lexer: branch taken at {}", self.store.serialize(tk));
        true
    }

    /*
     * Stream edits ------------------------------------------------------
     */

    /// Synthesize a token positioned after the anchor.
    pub fn emit_synthetic(&mut self, anchor: Option<TokenId>, proto: Token) -> TokenId {
        let mut tok = proto;
        if let Some(anchor) = anchor {
            tok.lno = self.store[anchor].lno;
            tok.cno = self.store[anchor].cno;
            tok.off = self.store[anchor].off;
        }
        self.store.alloc(tok)
    }

    pub fn insert_after(&mut self, anchor: TokenId, proto: Token) -> TokenId {
        let id = self.emit_synthetic(Some(anchor), proto);
        self.store.insert_after(anchor, id);
        id
    }

    pub fn insert_before(&mut self, anchor: TokenId, proto: Token) -> TokenId {
        let id = self.emit_synthetic(Some(anchor), proto);
        self.store.insert_before(anchor, id);
        id
    }

    /// Duplicate a token after the anchor, used when merging declarations.
    pub fn copy_after(&mut self, anchor: TokenId, src: TokenId) -> TokenId {
        let mut copy = self.store[src].clone();
        copy.prefixes = vec![];
        copy.suffixes = vec![];
        copy.branch = Branch::default();
        copy.next = None;
        copy.prev = None;
        let id = self.store.alloc(copy);
        self.store.insert_after(anchor, id);
        id
    }

    pub fn move_after(&mut self, anchor: TokenId, tk: TokenId) -> TokenId {
        self.store.unlink(tk);
        self.store.insert_after(anchor, tk);
        tk
    }

    pub fn move_before(&mut self, anchor: TokenId, tk: TokenId) -> TokenId {
        self.store.unlink(tk);
        self.store.insert_before(anchor, tk);
        tk
    }

    /// Remove a token from the main stream. Dangling trivia is handed over
    /// to the surrounding tokens.
    pub fn remove(&mut self, tk: TokenId) {
        if let Some(nx) = self.store.next(tk) {
            let prefixes = std::mem::take(&mut self.store[tk].prefixes);
            if !prefixes.is_empty() {
                let mut all = prefixes;
                all.append(&mut self.store[nx].prefixes);
                self.store[nx].prefixes = all;
            }
        }
        if let Some(pv) = self.store.prev(tk) {
            self.store.move_suffixes(tk, pv);
        }
        if self.state.cur == Some(tk) {
            self.state.cur = self.store.prev(tk);
        }
        self.store.unlink(tk);
    }

    pub fn dump(&self) {
        let mut cur = self.store.first();
        while let Some(id) = cur {
            log::debug!("lexer: {}", self.store.serialize(id));
            cur = self.store.next(id);
        }
    }
}

/*
 * Scanner ---------------------------------------------------------------
 */

#[derive(Debug, Clone, Copy)]
struct ScanState {
    off: usize,
    lno: u32,
    cno: u32,
}

struct Scanner<'a> {
    src: &'a [u8],
    st: ScanState,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Scanner<'a> {
        Scanner {
            src: src.as_bytes(),
            st: ScanState {
                off: 0,
                lno: 1,
                cno: 1,
            },
        }
    }

    fn save(&self) -> ScanState {
        self.st
    }

    fn restore(&mut self, st: ScanState) {
        self.st = st;
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.st.off).copied()
    }

    fn peek_byte_at(&self, n: usize) -> Option<u8> {
        self.src.get(self.st.off + n).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.st.off += 1;
        if b == b'\n' {
            self.st.lno += 1;
            self.st.cno = 1;
        } else {
            self.st.cno += 1;
        }
        Some(b)
    }

    fn text_from(&self, st: &ScanState) -> &'a [u8] {
        &self.src[st.off..self.st.off]
    }

    fn emit(&self, store: &mut TokenStore, st: &ScanState, kind: TokenKind, flags: TokenFlags) -> TokenId {
        let text = String::from_utf8_lossy(self.text_from(st)).into_owned();
        let mut tok = Token::new(kind, text).with_flags(flags);
        tok.lno = st.lno;
        tok.cno = st.cno;
        tok.off = st.off;
        store.alloc(tok)
    }

    fn eat_spaces(&mut self) -> bool {
        let mut any = false;
        while matches!(self.peek_byte(), Some(b' ') | Some(b'\t')) {
            self.bump();
            any = true;
        }
        any
    }

    fn eat_space_and_lines(&mut self) {
        while matches!(self.peek_byte(), Some(b' ') | Some(b'\t') | Some(b'\n')) {
            self.bump();
        }
    }

    /// Consume a run of new lines including the indentation of interior
    /// blank lines, returning the number of new lines seen. Indentation of
    /// the final line is left untouched, it belongs to whatever follows.
    fn eat_lines(&mut self) -> usize {
        let mut nlines = 0;
        loop {
            match self.peek_byte() {
                Some(b'\n') => {
                    nlines += 1;
                    self.bump();
                }
                Some(b' ') | Some(b'\t') => {
                    let mut ahead = 0;
                    while matches!(self.peek_byte_at(ahead), Some(b' ') | Some(b'\t')) {
                        ahead += 1;
                    }
                    if self.peek_byte_at(ahead) != Some(b'\n') {
                        break;
                    }
                    for _ in 0..=ahead {
                        self.bump();
                    }
                    nlines += 1;
                }
                _ => break,
            }
        }
        nlines
    }

    /// Main tokenization loop. Returns the first unrecoverable error.
    fn tokenize(&mut self, store: &mut TokenStore) -> Option<LexError> {
        let mut error = None;
        loop {
            let mut prefixes = vec![];

            // Leading comments and preprocessor directives.
            loop {
                if let Some(tk) = self.scan_comment(store, true) {
                    prefixes.push(tk);
                } else {
                    let cpp = self.scan_cpp(store);
                    if cpp.is_empty() {
                        break;
                    }
                    prefixes.extend(cpp);
                }
            }

            self.eat_space_and_lines();

            let tk = match self.scan_token(store) {
                Ok(tk) => tk,
                Err((tk, err)) => {
                    error.get_or_insert(err);
                    tk
                }
            };
            store[tk].prefixes = prefixes;
            store.append(tk);

            if matches!(store[tk].kind, TokenKind::Eof | TokenKind::Error) {
                if store[tk].kind == TokenKind::Error {
                    // Terminate the stream, the caller gives up anyway.
                    let st = self.save();
                    let eof = self.emit(store, &st, TokenKind::Eof, TokenFlags::empty());
                    store.append(eof);
                }
                break;
            }

            self.scan_suffixes(store, tk);
        }
        error
    }

    /// Trailing spaces, comments and hard lines dangling off a main token.
    fn scan_suffixes(&mut self, store: &mut TokenStore, tk: TokenId) {
        loop {
            let ws = self.save();
            let has_ws = self.eat_spaces();

            match self.peek_byte() {
                Some(b'/') if matches!(self.peek_byte_at(1), Some(b'/') | Some(b'*')) => {
                    // The leading spaces belong to the comment, keeping it
                    // separated from the token once emitted verbatim.
                    self.restore(ws);
                    if let Some(comment) = self.scan_suffix_comment(store) {
                        store[tk].suffixes.push(comment);
                        continue;
                    }
                    break;
                }
                Some(b'\n') => {
                    self.restore(ws);
                    let st = self.save();
                    let nlines = self.eat_lines();
                    let flags = if nlines == 1 {
                        TokenFlags::OPTLINE
                    } else {
                        TokenFlags::empty()
                    };
                    let suffix = self.emit(store, &st, TokenKind::Space, flags);
                    store[tk].suffixes.push(suffix);
                    break;
                }
                _ => {
                    if has_ws {
                        let suffix =
                            self.emit(store, &ws, TokenKind::Space, TokenFlags::OPTSPACE);
                        store[tk].suffixes.push(suffix);
                    }
                    break;
                }
            }
        }
    }

    /// One or many adjacent comments merged into a single trivia token.
    /// Block mode is used for leading comments which may cross lines and
    /// absorb their trailing whitespace.
    fn scan_comment(&mut self, store: &mut TokenStore, block: bool) -> Option<TokenId> {
        let begin = self.save();
        let mut ncomments = 0;
        let mut c99 = false;

        loop {
            let oldst = self.save();
            if block {
                self.eat_space_and_lines();
            } else {
                self.eat_spaces();
            }
            if self.peek_byte() != Some(b'/')
                || !matches!(self.peek_byte_at(1), Some(b'/') | Some(b'*'))
            {
                self.restore(oldst);
                break;
            }
            self.bump();
            let cstyle = self.bump() == Some(b'*');
            if !cstyle {
                c99 = true;
            }

            let mut pv = 0u8;
            loop {
                let Some(b) = self.peek_byte() else {
                    break;
                };
                if cstyle {
                    self.bump();
                    if pv == b'*' && b == b'/' {
                        break;
                    }
                    pv = b;
                } else {
                    if b == b'\n' {
                        break;
                    }
                    self.bump();
                }
            }

            ncomments += 1;
            if !block {
                break;
            }
        }
        if ncomments == 0 {
            return None;
        }

        // Trailing whitespace and hard lines belong to leading comments.
        if block {
            self.eat_spaces();
            self.eat_lines();
        }

        let flags = if c99 {
            TokenFlags::COMMENT_C99
        } else {
            TokenFlags::empty()
        };
        Some(self.emit(store, &begin, TokenKind::Comment, flags))
    }

    fn scan_suffix_comment(&mut self, store: &mut TokenStore) -> Option<TokenId> {
        self.scan_comment(store, false)
    }

    /// A run of preprocessor directives, one token per directive. Disabled
    /// blocks are absorbed verbatim into a single token preventing any
    /// attempt of formatting code known to be discarded.
    fn scan_cpp(&mut self, store: &mut TokenStore) -> Vec<TokenId> {
        let mut out = vec![];

        loop {
            let oldst = self.save();
            self.eat_space_and_lines();
            let dirst = self.save();
            if self.peek_byte() != Some(b'#') {
                self.restore(oldst);
                break;
            }

            let begin = oldst;
            self.scan_cpp_line();

            let text = self.text_from(&dirst);
            let kind = cpp_classify(text);
            let disabled = cpp_is_disabled(text);

            if disabled {
                let mut depth = 1;
                while depth > 0 {
                    let linest = self.save();
                    if self.peek_byte().is_none() {
                        break;
                    }
                    self.eat_spaces();
                    if self.peek_byte() == Some(b'#') {
                        self.scan_cpp_line();
                        let line = self.text_from(&linest);
                        let mut trimmed = line;
                        while let Some((&b, rest)) = trimmed.split_first() {
                            if b != b' ' && b != b'\t' {
                                break;
                            }
                            trimmed = rest;
                        }
                        if trimmed.starts_with(b"#if") {
                            depth += 1;
                        } else if trimmed.starts_with(b"#endif") {
                            depth -= 1;
                        }
                    } else {
                        while let Some(b) = self.bump() {
                            if b == b'\n' {
                                break;
                            }
                        }
                    }
                }
            }

            self.eat_lines();

            let kind = if disabled { TokenKind::Cpp } else { kind };
            out.push(self.emit(store, &begin, kind, TokenFlags::CPP));
        }

        out
    }

    /// Consume one directive line, honoring continuation backslashes and
    /// block comments spanning lines.
    fn scan_cpp_line(&mut self) {
        let mut pv = 0u8;
        let mut comment = false;
        while let Some(b) = self.peek_byte() {
            if pv == b'/' && b == b'*' {
                comment = true;
            } else if comment && pv == b'*' && b == b'/' {
                comment = false;
            } else if !comment && pv != b'\\' && b == b'\n' {
                self.bump();
                return;
            }
            self.bump();
            pv = b;
        }
    }

    fn scan_token(&mut self, store: &mut TokenStore) -> Result<TokenId, (TokenId, LexError)> {
        let st = self.save();

        let Some(mut ch) = self.peek_byte() else {
            return Ok(self.emit(store, &st, TokenKind::Eof, TokenFlags::empty()));
        };

        // Wide string and character literals.
        if ch == b'L' && matches!(self.peek_byte_at(1), Some(b'"') | Some(b'\'')) {
            self.bump();
            ch = self.peek_byte().unwrap();
        }

        if ch == b'"' || ch == b'\'' {
            let delim = ch;
            self.bump();
            let mut pch = ch;
            loop {
                let Some(b) = self.bump() else {
                    let tk = self.emit(store, &st, TokenKind::Error, TokenFlags::empty());
                    return Err((
                        tk,
                        LexError(format!(
                            "unterminated {} literal at line {}",
                            if delim == b'"' { "string" } else { "character" },
                            st.lno
                        )),
                    ));
                };
                if pch == b'\\' && b == b'\\' {
                    pch = 0;
                    continue;
                }
                if pch != b'\\' && b == delim {
                    break;
                }
                pch = b;
            }
            let kind = if delim == b'"' {
                TokenKind::String
            } else {
                TokenKind::Literal
            };
            return Ok(self.emit(store, &st, kind, TokenFlags::empty()));
        }

        if ch.is_ascii_digit() {
            self.bump();
            while let Some(b) = self.peek_byte() {
                if b.is_ascii_hexdigit() || matches!(b, b'l' | b'L' | b'x' | b'X' | b'u' | b'U') {
                    self.bump();
                } else {
                    break;
                }
            }
            return Ok(self.emit(store, &st, TokenKind::Literal, TokenFlags::empty()));
        }

        if ch.is_ascii_alphabetic() || ch == b'_' || ch == b'L' {
            while let Some(b) = self.peek_byte() {
                if b.is_ascii_alphanumeric() || b == b'_' {
                    self.bump();
                } else {
                    break;
                }
            }
            let text = self.text_from(&st);
            let text = std::str::from_utf8(text).unwrap_or("");
            if let Some(&(kind, flags)) = KEYWORDS.get(text) {
                return Ok(self.emit(store, &st, kind, flags));
            }
            let tk = self.emit(store, &st, TokenKind::Ident, TokenFlags::empty());
            self.detect_foreach(store, tk);
            return Ok(tk);
        }

        // Greedy longest match on punctuators.
        for &(pat, kind, flags) in PUNCTUATORS.iter() {
            let bytes = pat.as_bytes();
            if self.src[self.st.off..].starts_with(bytes) {
                for _ in 0..bytes.len() {
                    self.bump();
                }
                return Ok(self.emit(store, &st, kind, flags));
            }
        }

        // Fallback, treat the byte as an identifier.
        self.bump();
        Ok(self.emit(store, &st, TokenKind::Ident, TokenFlags::empty()))
    }

    /// Detect foreach like constructs such as the ones provided by queue(3).
    fn detect_foreach(&mut self, store: &mut TokenStore, tk: TokenId) {
        let text = &store[tk].text;
        if !text.contains("FOREACH") && !text.contains("_for_each") && !text.contains("for_each_")
        {
            return;
        }
        if self.peek_byte() == Some(b'(') {
            store[tk].kind = TokenKind::Foreach;
        }
    }
}

fn cpp_classify(text: &[u8]) -> TokenKind {
    let mut it = text.iter().copied().peekable();
    if it.next() != Some(b'#') {
        return TokenKind::Cpp;
    }
    let word: Vec<u8> = it
        .skip_while(|b| *b == b' ' || *b == b'\t')
        .take_while(|b| b.is_ascii_alphabetic() || *b == b'_')
        .collect();
    match word.as_slice() {
        b"if" | b"ifdef" => TokenKind::CppIf,
        b"ifndef" => TokenKind::CppIfndef,
        b"else" | b"elif" => TokenKind::CppElse,
        b"endif" => TokenKind::CppEndif,
        b"define" => TokenKind::CppDefine,
        b"include" | b"include_next" => TokenKind::CppInclude,
        _ => TokenKind::Cpp,
    }
}

fn cpp_is_disabled(text: &[u8]) -> bool {
    text.starts_with(b"#if 0") || text.starts_with(b"#ifdef notyet")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Lexer {
        Lexer::new(src, "test.c", vec![], &Options::default()).expect("lexing failed")
    }

    fn kinds(lx: &mut Lexer) -> Vec<TokenKind> {
        let mut out = vec![];
        while let Some(tk) = lx.pop() {
            let kind = lx.store()[tk].kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                break;
            }
        }
        out
    }

    #[test]
    fn test_keywords_and_idents() {
        let mut lx = lex("int foo;");
        assert_eq!(
            kinds(&mut lx),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_greedy_punctuators() {
        let mut lx = lex("a <<= b >> c;");
        assert_eq!(
            kinds(&mut lx),
            vec![
                TokenKind::Ident,
                TokenKind::LessLessEqual,
                TokenKind::Ident,
                TokenKind::GreaterGreater,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        let mut lx = lex("s = L\"a \\\"b\\\"\";");
        let ks = kinds(&mut lx);
        assert!(ks.contains(&TokenKind::String));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"oops", "test.c", vec![], &Options::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_comment_prefix() {
        let mut lx = lex("/* c */\nint x;");
        let tk = lx.pop().unwrap();
        assert_eq!(lx.store()[tk].kind, TokenKind::Int);
        assert_eq!(lx.store()[tk].prefixes.len(), 1);
        let comment = lx.store()[tk].prefixes[0];
        assert_eq!(lx.store()[comment].kind, TokenKind::Comment);
        assert!(lx.store()[comment].text.starts_with("/* c */"));
    }

    #[test]
    fn test_comment_suffix() {
        let mut lx = lex("int x; /* c */\n");
        let semi = {
            lx.pop();
            lx.pop();
            lx.pop().unwrap()
        };
        assert_eq!(lx.store()[semi].kind, TokenKind::Semi);
        assert!(lx
            .store()[semi]
            .suffixes
            .iter()
            .any(|&s| lx.store()[s].kind == TokenKind::Comment));
    }

    #[test]
    fn test_cpp_classify() {
        let mut lx = lex("#include <stdio.h>\nint x;");
        let tk = lx.pop().unwrap();
        let cpp = lx.store()[tk].prefixes[0];
        assert_eq!(lx.store()[cpp].kind, TokenKind::CppInclude);
    }

    #[test]
    fn test_cpp_disabled_block() {
        let mut lx = lex("#if 0\nbroken {{{\n#endif\nint x;");
        let tk = lx.pop().unwrap();
        assert_eq!(lx.store()[tk].kind, TokenKind::Int);
        let cpp = lx.store()[tk].prefixes[0];
        assert_eq!(lx.store()[cpp].kind, TokenKind::Cpp);
        assert!(lx.store()[cpp].text.contains("broken {{{"));
        assert!(lx.store()[cpp].text.contains("#endif"));
    }

    #[test]
    fn test_optline_suffix() {
        let mut lx = lex("int x;\nint y;\n\nint z;\n");
        let mut semis = vec![];
        while let Some(tk) = lx.pop() {
            if lx.store()[tk].kind == TokenKind::Semi {
                semis.push(tk);
            }
            if lx.store()[tk].kind == TokenKind::Eof {
                break;
            }
        }
        let store = lx.store();
        assert!(store.has_line(semis[0], 1));
        assert!(!store.has_line(semis[0], 2));
        assert!(store.has_line(semis[1], 2));
    }

    #[test]
    fn test_foreach_heuristic() {
        let mut lx = lex("TAILQ_FOREACH(a, b, c)");
        let tk = lx.pop().unwrap();
        assert_eq!(lx.store()[tk].kind, TokenKind::Foreach);
    }

    #[test]
    fn test_positions() {
        let src = "int x;\nchar y;\n";
        let mut lx = lex(src);
        while let Some(tk) = lx.pop() {
            let tok = &lx.store()[tk];
            if tok.kind == TokenKind::Eof {
                break;
            }
            let expected = 1 + src[..tok.off].matches('\n').count() as u32;
            assert_eq!(tok.lno, expected, "line of {}", tok.text);
            assert_eq!(&src[tok.off..tok.off + tok.text.len()], tok.text);
        }
    }

    #[test]
    fn test_get_lines() {
        let src = "one\ntwo\nthree\n";
        let lx = lex(src);
        assert_eq!(lx.get_lines(1, 2), "one\n");
        assert_eq!(lx.get_lines(2, 4), "two\nthree\n");
        assert_eq!(lx.get_lines(1, 0), src);
    }
}
