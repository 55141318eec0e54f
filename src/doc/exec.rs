//! The document evaluator.

use crate::comment;
use crate::cpp;
use crate::lexer::{Lexer, TokenFlags, TokenId, TokenKind, TokenStore};
use crate::options::Options;
use crate::style::Style;

use super::{DocArena, DocId, DocKind, Indent, MinimizeVariant};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecFlags {
    /// Honor diff chunks, replaying untouched lines verbatim.
    pub diff: bool,
    /// Measure the width of the document, everything rendered flat.
    pub width: bool,
}

#[derive(Clone, Copy)]
pub struct ExecArgs<'a> {
    pub arena: &'a DocArena,
    pub store: &'a TokenStore,
    pub lx: Option<&'a Lexer>,
    pub style: &'a Style,
    pub options: &'a Options,
    pub flags: ExecFlags,
}

/// Render a document tree into its formatted representation.
pub fn exec(args: ExecArgs<'_>, root: DocId) -> String {
    let mut e = Exec::new(args);
    e.exec1(root);
    e.diff_exit();
    e.p.buf
}

/// Measure the width of a document assuming everything fits on one line.
pub fn width(
    arena: &DocArena,
    store: &TokenStore,
    style: &Style,
    options: &Options,
    root: DocId,
) -> u32 {
    let args = ExecArgs {
        arena,
        store,
        lx: None,
        style,
        options,
        flags: ExecFlags {
            diff: false,
            width: true,
        },
    };
    let mut e = Exec::new(args);
    e.p.mode = Mode::Munge;
    e.exec1(root);
    e.p.pos
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Break,
    Munge,
}

#[derive(Debug, Clone, Copy, Default)]
struct IndentState {
    /// Current indentation.
    cur: i32,
    /// Last emitted indentation.
    pre: i32,
    /// Last emitted indentation before going mute.
    mute: i32,
}

#[derive(Debug, Clone, Copy, Default)]
struct DiffState {
    /// Last verbatim token not covered by the current chunk, must be
    /// crossed before emission resumes.
    verbatim: Option<TokenId>,
    /// Within the first group covering the chunk.
    group: bool,
    /// Mute counter stashed while replaying a chunk.
    mute: i32,
    /// First line not yet replayed.
    beg: u32,
    /// Last line of the current chunk, zero when outside every chunk.
    end: u32,
}

#[derive(Debug, Clone)]
struct Printer {
    buf: String,
    mode: Mode,
    diff: DiffState,
    indent: IndentState,
    pos: u32,
    refit: u32,
    parens: u32,
    nlines: u32,
    newline: bool,
    optline: i32,
    mute: i32,
    scope_hardline: bool,
}

impl Printer {
    fn new() -> Printer {
        Printer {
            buf: String::new(),
            mode: Mode::Break,
            diff: DiffState {
                beg: 1,
                ..DiffState::default()
            },
            indent: IndentState::default(),
            pos: 0,
            refit: 0,
            parens: 0,
            nlines: 0,
            newline: false,
            optline: 0,
            mute: 0,
            scope_hardline: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PrintFlags {
    indent: bool,
    newline: bool,
    force: bool,
}

const INDENT: PrintFlags = PrintFlags {
    indent: true,
    newline: false,
    force: false,
};
const FORCE: PrintFlags = PrintFlags {
    indent: false,
    newline: false,
    force: true,
};
const NONE: PrintFlags = PrintFlags {
    indent: false,
    newline: false,
    force: false,
};

/// Result of probing a group for diff chunk coverage.
#[derive(Debug, Default)]
struct DiffCover {
    /// Last verbatim token not covered by any chunk.
    verbatim: Option<TokenId>,
    /// First line covered by the group.
    first: u32,
    /// First line covered by a chunk.
    chunk: u32,
    /// -1 spans multiple lines, 0 not covered, 1 covered.
    covers: i32,
}

struct Exec<'a> {
    args: ExecArgs<'a>,
    p: Printer,
}

impl<'a> Exec<'a> {
    fn new(args: ExecArgs<'a>) -> Exec<'a> {
        Exec {
            args,
            p: Printer::new(),
        }
    }

    fn diff_enabled(&self) -> bool {
        self.args.flags.diff && self.args.lx.map(Lexer::has_diff).unwrap_or(false)
    }

    fn is_mute(&self) -> bool {
        self.p.mute > 0 || self.diff_is_mute()
    }

    fn diff_is_mute(&self) -> bool {
        self.diff_enabled() && (self.p.diff.end == 0 || self.p.diff.verbatim.is_some())
    }

    fn exec1(&mut self, dc: DocId) {
        let arena = self.args.arena;

        match &arena[dc].kind {
            DocKind::Concat(children) => {
                for i in 0..children.len() {
                    let child = match &arena[dc].kind {
                        DocKind::Concat(children) => children[i],
                        _ => unreachable!(),
                    };
                    self.exec1(child);
                }
            }

            DocKind::Group(child) => {
                let diff = self.diff_group_enter(dc);
                if let Some(child) = *child {
                    match self.p.mode {
                        Mode::Munge if self.p.refit == 0 => self.exec1(child),
                        _ => {
                            self.p.refit = 0;
                            let oldmode = self.p.mode;
                            self.p.mode = if self.fits(dc) {
                                Mode::Munge
                            } else {
                                Mode::Break
                            };
                            self.exec1(child);
                            self.p.mode = oldmode;
                        }
                    }
                }
                self.diff_group_leave(diff);
            }

            DocKind::Indent { amount, child } => {
                let child = *child;
                match *amount {
                    Indent::Parens => {
                        let oldparens = self.p.parens;
                        if self.parens_align() {
                            self.p.parens += 1;
                        }
                        if let Some(child) = child {
                            self.exec1(child);
                        }
                        self.p.parens = oldparens;
                    }
                    Indent::Force => {
                        let cur = self.p.indent.cur;
                        self.indent(cur);
                        if let Some(child) = child {
                            self.exec1(child);
                        }
                    }
                    Indent::Width => {
                        let old = self.p.indent.cur;
                        self.p.indent.cur = self.p.pos as i32;
                        if let Some(child) = child {
                            self.exec1(child);
                        }
                        self.p.indent.cur = old;
                    }
                    Indent::Newline(n) => {
                        let apply = self.p.scope_hardline;
                        if apply {
                            self.p.indent.cur += n;
                        }
                        if let Some(child) = child {
                            self.exec1(child);
                        }
                        if apply {
                            self.p.indent.cur -= n;
                        }
                    }
                    Indent::Amount(n) => {
                        self.p.indent.cur += n;
                        if let Some(child) = child {
                            self.exec1(child);
                        }
                        self.p.indent.cur -= n;
                    }
                }
                // While reaching the first column, there's no longer any
                // previous indentation to consider.
                if self.p.indent.cur == 0 {
                    self.p.indent.pre = 0;
                }
            }

            DocKind::Dedent(child) => {
                let child = *child;
                self.trim();
                let oldindent = self.p.indent.cur;
                self.p.indent.cur = 0;
                self.p.indent.pre = 0;
                if let Some(child) = child {
                    self.exec1(child);
                }
                self.p.indent.cur = oldindent;
            }

            DocKind::Align {
                indent,
                spaces,
                tabalign,
            } => self.align(*indent, *spaces, *tabalign),

            DocKind::Literal { text, token } => {
                self.diff_literal(*token);
                let text = text.clone();
                self.print(&text, INDENT);
            }

            DocKind::Verbatim(tk) => self.verbatim(*tk),

            DocKind::Line => match self.p.mode {
                Mode::Break => self.print("\n", INDENT),
                Mode::Munge => {
                    // Redundant if we're about to emit a hard line.
                    if !self.p.newline {
                        self.print(" ", INDENT);
                        self.p.refit = 1;
                    }
                }
            },

            DocKind::Softline => match self.p.mode {
                Mode::Break => self.print("\n", INDENT),
                Mode::Munge => {}
            },

            DocKind::Hardline => {
                // Take note of the new line, later emitted by print.
                if self.is_mute() {
                    self.p.newline = true;
                }
                self.p.scope_hardline = true;
                self.print("\n", INDENT);
            }

            DocKind::Optline => {
                // Instruct print to emit a new line upon the next
                // invocation, necessary to get indentation right.
                if self.p.optline > 0 {
                    self.p.newline = true;
                }
            }

            DocKind::Mute(delta) => {
                let delta = *delta;
                if !self.args.flags.width {
                    // Take note of the previously emitted indentation
                    // before going mute.
                    if self.p.mute == 0 && delta > 0 {
                        self.p.indent.mute = self.p.indent.pre;
                    }
                    if delta > 0 || self.p.mute >= -delta {
                        self.p.mute += delta;
                    }
                }
            }

            DocKind::Optional(child) => {
                let child = *child;
                let oldoptline = self.p.optline;
                self.p.optline += 1;
                if let Some(child) = child {
                    self.exec1(child);
                }
                // Note, could already be cleared by print.
                if oldoptline <= self.p.optline {
                    self.p.optline = oldoptline;
                }
            }

            DocKind::Minimize { variants, child } => {
                let variants = variants.clone();
                let child = *child;
                self.minimize(&variants, child);
            }

            DocKind::Scope(child) => {
                let child = *child;
                let old = self.p.scope_hardline;
                self.p.scope_hardline = false;
                if let Some(child) = child {
                    self.exec1(child);
                }
                self.p.scope_hardline |= old;
            }
        }
    }

    /*
     * Fits --------------------------------------------------------------
     */

    fn fits(&mut self, dc: DocId) -> bool {
        // When measuring the document width, everything is expected to fit
        // on a single line.
        if self.args.flags.width {
            return true;
        }
        // Nothing fits while being outside of a diff chunk, keeping break
        // mode until entering one.
        if self.diff_is_mute() {
            return false;
        }
        // Pending hard line(s), assume that everything fits.
        if self.p.newline {
            return true;
        }

        let arena = self.args.arena;
        let limit = self.args.style.column_limit();
        let mut pos = self.p.pos;
        let mut stack = vec![dc];
        while let Some(id) = stack.pop() {
            match &arena[id].kind {
                DocKind::Concat(children) => stack.extend(children.iter().rev().copied()),
                DocKind::Group(child)
                | DocKind::Indent { child, .. }
                | DocKind::Dedent(child)
                | DocKind::Optional(child)
                | DocKind::Minimize { child, .. }
                | DocKind::Scope(child) => {
                    if let Some(child) = child {
                        stack.push(*child);
                    }
                }
                DocKind::Literal { text, .. } => {
                    pos = advance(pos, text);
                    if pos > limit {
                        return false;
                    }
                }
                DocKind::Line => {
                    pos += 1;
                    if pos > limit {
                        return false;
                    }
                }
                DocKind::Hardline => return true,
                DocKind::Optline => {
                    if self.p.optline > 0 {
                        return true;
                    }
                }
                DocKind::Verbatim(_)
                | DocKind::Softline
                | DocKind::Align { .. }
                | DocKind::Mute(_) => {}
            }
        }
        true
    }

    /*
     * Printing ----------------------------------------------------------
     */

    fn print(&mut self, text: &str, flags: PrintFlags) {
        let newline = text == "\n";

        if self.is_mute() && !flags.force {
            return;
        }

        // Emit pending new line.
        if self.p.newline {
            let space = text == " ";
            self.p.refit = 1;
            self.p.newline = false;
            self.print(
                "\n",
                PrintFlags {
                    newline: true,
                    ..flags
                },
            );
            if newline || space {
                return;
            }
        }

        if newline {
            // Never emit more than two consecutive lines.
            if self.p.nlines >= 2 {
                return;
            }
            self.p.nlines += 1;

            // Suppress optional line(s) while emitting a line, mixing the
            // two results in odd formatting.
            if !flags.newline && self.p.optline != 0 {
                self.p.optline = 0;
            }
        } else if !text.is_empty() {
            self.p.nlines = 0;
        }

        if newline {
            self.trim();
        }

        self.p.buf.push_str(text);
        self.p.pos = advance(self.p.pos, text);

        if newline {
            self.p.pos = 0;
            if flags.indent {
                let cur = self.p.indent.cur;
                self.indent(cur);
            }
        }
    }

    /// Emit raw bytes, only adjusting the position and consecutive line
    /// accounting.
    fn print_raw(&mut self, text: &str, flags: PrintFlags) {
        if self.is_mute() && !flags.force {
            return;
        }
        if self.p.newline {
            self.p.refit = 1;
            self.p.newline = false;
            self.print(
                "\n",
                PrintFlags {
                    newline: true,
                    ..flags
                },
            );
        }
        if !text.is_empty() {
            self.p.buf.push_str(text);
            self.p.pos = advance(self.p.pos, text);
            let trailing = text.bytes().rev().take_while(|&b| b == b'\n').count();
            self.p.nlines = (trailing as u32).min(2);
        }
    }

    fn indent(&mut self, indent: i32) {
        let indent = if self.p.parens > 0 {
            // Align with the left parenthesis on the previous line.
            self.p.indent.pre + self.p.parens as i32
        } else {
            self.p.indent.pre = indent;
            indent
        };
        self.pad(indent, self.args.style.use_tabs());
    }

    fn pad(&mut self, indent: i32, tabs: bool) {
        if self.is_mute() {
            return;
        }
        let mut indent = indent;
        if tabs {
            while indent >= 8 {
                self.p.buf.push('\t');
                self.p.pos += 8 - (self.p.pos % 8);
                indent -= 8;
            }
        }
        while indent > 0 {
            self.p.buf.push(' ');
            self.p.pos += 1;
            indent -= 1;
        }
    }

    fn align(&mut self, indent: u32, spaces: u32, tabalign: bool) {
        if self.is_mute() {
            return;
        }
        self.pad(indent as i32, tabalign && self.args.style.use_tabs());
        for _ in 0..spaces {
            self.p.buf.push(' ');
            self.p.pos += 1;
        }
    }

    /// Remove any trailing spaces or tabs from the current line.
    fn trim(&mut self) {
        while let Some(ch) = self.p.buf.chars().last() {
            if ch != ' ' && ch != '\t' {
                break;
            }
            self.p.buf.pop();
            self.p.pos = self.p.pos.saturating_sub(if ch == '\t' {
                8 - (self.p.pos % 8).min(7)
            } else {
                1
            });
        }
    }

    /// Returns true if the current line is suitable for parenthesis
    /// alignment, i.e. a line consisting of whitespace followed by one or
    /// many left parenthesis.
    fn parens_align(&self) -> bool {
        let bytes = self.p.buf.as_bytes();
        let mut i = bytes.len();
        let mut nparens = 0;
        while i > 0 && bytes[i - 1] == b'(' {
            nparens += 1;
            i -= 1;
        }
        if nparens == 0 || i == 0 {
            return false;
        }
        while i > 0 {
            i -= 1;
            match bytes[i] {
                b'\n' => break,
                b' ' | b'\t' => {}
                _ => return false,
            }
        }
        true
    }

    /*
     * Verbatim ----------------------------------------------------------
     */

    fn verbatim(&mut self, tk: TokenId) {
        let store = self.args.store;
        let mut unmute = false;

        if self.is_mute() {
            if self.diff_enabled() && self.p.diff.verbatim == Some(tk) {
                unmute = true;
            } else {
                return;
            }
        }

        let diff = self.diff_verbatim(tk);

        // Blank line markers collapse into a single hard line.
        if store[tk].kind == TokenKind::Space {
            self.print("\n", NONE);
            if unmute {
                self.p.diff.verbatim = None;
            }
            self.diff_leave(diff);
            return;
        }

        let mut text = store[tk].text.clone();
        cap_trailing_lines(&mut text);
        let isblock = text.ends_with('\n');

        // Verbatims must never be indented.
        self.trim();
        let oldpos = self.p.pos;

        // Verbatim blocks must always start on a new line.
        if isblock && self.p.pos > 0 && !text.starts_with('\n') {
            self.print("\n", NONE);
        }

        let body = if store[tk].kind.is_cpp() {
            cpp::align(&text, self.args.style, self.args.options).unwrap_or(text)
        } else if store[tk].kind == TokenKind::Comment {
            comment::reindent(&text).unwrap_or(text)
        } else {
            text
        };
        self.print_raw(&body, NONE);

        if unmute {
            self.p.diff.verbatim = None;
        }

        // Restore the indentation after emitting a verbatim block.
        if isblock {
            let indent = if self.p.indent.mute > 0 {
                // Honor the last emitted indentation before going mute,
                // unless the current indentation is smaller which implies
                // that we're in a different scope by now.
                let i = self.p.indent.cur.min(self.p.indent.mute);
                self.p.indent.mute = 0;
                i
            } else if oldpos > 0 {
                // The line is not empty after trimming, assume this is a
                // continuation using the current indentation.
                self.p.indent.cur
            } else {
                // The line is empty after trimming, assume this is not a
                // continuation using the previously emitted indentation.
                self.p.indent.pre
            };
            self.p.pos = 0;
            self.indent(indent);
        }

        self.diff_leave(diff);
    }

    /*
     * Minimize ----------------------------------------------------------
     */

    fn minimize(&mut self, variants: &[MinimizeVariant], child: Option<DocId>) {
        let Some(child) = child else {
            return;
        };
        if variants.is_empty() {
            self.exec1(child);
            return;
        }

        let best = match variants.iter().position(|v| v.force) {
            Some(force) => force,
            None if variants.len() == 1 => 0,
            None => self.minimize_best(variants, child),
        };

        let indent = variants[best].indent;
        self.p.indent.cur += indent;
        self.exec1(child);
        self.p.indent.cur -= indent;
    }

    fn minimize_best(&mut self, variants: &[MinimizeVariant], child: DocId) -> usize {
        let limit = self.args.style.column_limit();
        let mut best = 0;
        let mut best_penalty: Option<(u32, u32, u64)> = None;

        for (i, variant) in variants.iter().enumerate() {
            let mut shadow = Exec {
                args: self.args,
                p: self.p.clone(),
            };
            let start = shadow.p.buf.len();
            shadow.p.indent.cur += variant.indent;
            shadow.exec1(child);

            let penalty = penalty(&shadow.p.buf[start..], shadow.p.pos, limit);
            if best_penalty.map(|b| penalty < b).unwrap_or(true) {
                best_penalty = Some(penalty);
                best = i;
            }
        }
        best
    }

    /*
     * Diff --------------------------------------------------------------
     */

    fn diff_group_enter(&mut self, dc: DocId) -> bool {
        if !self.diff_enabled() {
            return false;
        }
        // Only applicable while entering the first group, unless the group
        // above us was ignored.
        if self.p.diff.group {
            return false;
        }

        let dd = self.diff_covers(dc);
        match dd.covers {
            -1 => {
                // The group spans multiple lines. Ignore it and keep
                // evaluating nested groups.
                return false;
            }
            0 => {
                // Not covered by any diff chunk. If the previous group
                // touched lines after its chunk due to reformatting, make
                // sure to reset the state.
                if self.p.diff.end > 0 {
                    self.diff_leave(1);
                }
                self.p.diff.group = true;
                return true;
            }
            _ => {
                // Covered by a diff chunk, leave any previous chunk if
                // we're entering a new one.
                if self.p.diff.end > 0 && dd.first > self.p.diff.end {
                    self.diff_leave(1);
                }
            }
        }

        self.p.diff.group = true;
        if self.p.diff.end > 0 {
            // The chunk spans more than one group, preceding verbatim
            // lines are already emitted.
            return true;
        }

        let Some(du) = self.args.lx.and_then(|lx| lx.diff_chunk(dd.chunk)) else {
            return true;
        };
        log::trace!("doc: diff chunk [{}-{}]", du.beg, du.end);

        // Take a tentative note on which line the chunk ends, adjusted
        // later if the group spans beyond the chunk.
        self.p.diff.end = du.end;

        // We could still be in a muted section, restored by diff_leave.
        self.p.diff.mute = self.p.mute;
        self.p.mute = 0;

        let store = self.args.store;
        let end = match dd.verbatim {
            Some(vt) => {
                // The chunk is preceded by verbatim token(s) inside the
                // same group which must not be formatted. Stay mute until
                // moving past the last one not covered by the chunk.
                self.p.diff.verbatim = Some(vt);
                store[vt].lno + count_lines(&store[vt].text)
            }
            None => dd.first,
        };

        // Emit any preceding line(s) not covered by the chunk, beginning
        // at the first line covered by this group.
        let beg = self.p.diff.beg;
        self.diff_emit(beg, end);
        self.p.pos = 0;
        let cur = self.p.indent.cur;
        self.indent(cur);
        true
    }

    fn diff_group_leave(&mut self, enter: bool) {
        if enter && self.diff_enabled() {
            debug_assert!(self.p.diff.group);
            self.p.diff.group = false;
        }
    }

    fn diff_literal(&mut self, token: Option<TokenId>) {
        if !self.diff_enabled() {
            return;
        }
        let Some(tk) = token else {
            return;
        };
        if self.p.diff.end == 0 {
            return;
        }

        let lno = self.args.store[tk].lno;
        if self.p.diff.group {
            if lno > self.p.diff.end {
                // The group spans beyond the chunk, reformatting caused
                // lines to be merged.
                self.p.diff.end = lno;
            }
        } else if lno > self.p.diff.end {
            self.diff_leave(1);
        }
    }

    fn diff_verbatim(&mut self, tk: TokenId) -> u32 {
        if !self.diff_enabled() {
            return 0;
        }
        let lno = self.args.store[tk].lno;
        if lno == 0 || self.p.diff.end == 0 {
            return 0;
        }
        if lno > self.p.diff.end {
            self.diff_leave(1);
            return 0;
        }

        // A verbatim document could contain hard line(s) taking us beyond
        // the chunk, signal that the chunk must be left afterwards.
        let n = count_lines(&self.args.store[tk].text);
        if n > 0 && lno + n > self.p.diff.end {
            return (lno + n) - self.p.diff.end;
        }
        0
    }

    fn diff_exit(&mut self) {
        if !self.diff_enabled() {
            return;
        }
        let beg = self.p.diff.beg;
        self.diff_emit(beg, 0);
    }

    /// Emit everything between the given lines as is.
    fn diff_emit(&mut self, beg: u32, end: u32) {
        let Some(lx) = self.args.lx else {
            return;
        };
        if end != 0 && beg >= end {
            return;
        }
        let text = lx.get_lines(beg, end).to_string();
        if text.is_empty() {
            return;
        }
        log::trace!("doc: diff verbatim [{beg}, {end})");

        self.p.newline = false;
        self.trim();
        if self.p.pos > 0 {
            self.print("\n", FORCE);
        }
        self.print_raw(&text, FORCE);
    }

    fn diff_leave(&mut self, end: u32) {
        if end == 0 {
            return;
        }
        debug_assert!(self.p.diff.end > 0);
        self.p.diff.beg = self.p.diff.end + end;
        self.p.diff.end = 0;
        self.p.mute = self.p.diff.mute;
        self.p.diff.mute = 0;
        log::trace!("doc: diff leave: beg {}", self.p.diff.beg);
    }

    /// Probe whether any token within the group is covered by a chunk.
    fn diff_covers(&self, dc: DocId) -> DiffCover {
        let arena = self.args.arena;
        let store = self.args.store;
        let mut dd = DiffCover::default();
        let threshold = self.p.diff.beg;

        let mut stack = vec![dc];
        while let Some(id) = stack.pop() {
            match &arena[id].kind {
                DocKind::Concat(children) => stack.extend(children.iter().rev().copied()),
                DocKind::Group(child)
                | DocKind::Indent { child, .. }
                | DocKind::Dedent(child)
                | DocKind::Optional(child)
                | DocKind::Minimize { child, .. }
                | DocKind::Scope(child) => {
                    if let Some(child) = child {
                        stack.push(*child);
                    }
                }
                DocKind::Hardline => {
                    dd.covers = -1;
                    return dd;
                }
                DocKind::Verbatim(tk) => {
                    if !store[*tk].flags.intersects(TokenFlags::DIFF) {
                        dd.verbatim = Some(*tk);
                    }
                    if self.diff_covers_token(&mut dd, *tk, threshold) {
                        return dd;
                    }
                }
                DocKind::Literal {
                    token: Some(tk), ..
                } => {
                    if self.diff_covers_token(&mut dd, *tk, threshold) {
                        return dd;
                    }
                }
                _ => {}
            }
        }
        dd
    }

    fn diff_covers_token(&self, dd: &mut DiffCover, tk: TokenId, threshold: u32) -> bool {
        let tok = &self.args.store[tk];
        // A line number behind the previous chunk means the document has
        // been seen before, happens while traversing a branch again.
        if tok.lno < threshold {
            return false;
        }
        if dd.first == 0 {
            dd.first = tok.lno;
        }
        if tok.flags.intersects(TokenFlags::DIFF) {
            dd.chunk = tok.lno;
            dd.covers = 1;
            return true;
        }
        false
    }
}

/// Advance the column with respect to tabs and new lines.
fn advance(pos: u32, text: &str) -> u32 {
    let mut pos = pos;
    for ch in text.chars() {
        match ch {
            '\t' => pos += 8 - (pos % 8),
            '\n' => pos = 0,
            _ => pos += 1,
        }
    }
    pos
}

/// Cap trailing new lines keeping at most one blank line.
fn cap_trailing_lines(text: &mut String) {
    let trailing = text.bytes().rev().take_while(|&b| b == b'\n').count();
    if trailing > 2 {
        text.truncate(text.len() - (trailing - 2));
    }
}

fn count_lines(text: &str) -> u32 {
    text.bytes().filter(|&b| b == b'\n').count() as u32
}

/// Penalty of a rendered variant, favoring fewer lines exceeding the column
/// limit, then fewer lines, then less total width.
fn penalty(text: &str, endpos: u32, limit: u32) -> (u32, u32, u64) {
    let mut nlines = 0;
    let mut nexceeds = 0;
    let mut sum: u64 = 0;
    let mut width: u32 = 0;
    for ch in text.chars() {
        match ch {
            '\n' => {
                nlines += 1;
                sum += u64::from(width);
                if width > limit {
                    nexceeds += 1;
                }
                width = 0;
            }
            '\t' => width += 8 - (width % 8),
            _ => width += 1,
        }
    }
    sum += u64::from(width.max(endpos));
    if width.max(endpos) > limit {
        nexceeds += 1;
    }
    (nexceeds, nlines, sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tabs() {
        assert_eq!(advance(0, "\t"), 8);
        assert_eq!(advance(3, "\t"), 8);
        assert_eq!(advance(8, "\t"), 16);
        assert_eq!(advance(0, "abc"), 3);
        assert_eq!(advance(5, "a\nbc"), 2);
    }

    #[test]
    fn test_penalty_ordering() {
        // Fewer exceeding lines always wins.
        assert!(penalty("aaaa\nbb", 0, 3) > penalty("aa\nbb\ncc", 0, 3));
        // Fewer lines wins on equal exceeds.
        assert!(penalty("aa\nbb", 0, 80) > penalty("aabb", 0, 80));
    }

    #[test]
    fn test_cap_trailing_lines() {
        let mut text = "x\n\n\n\n".to_string();
        cap_trailing_lines(&mut text);
        assert_eq!(text, "x\n\n");
    }
}
