//! Normalization of braces around control flow statement bodies.
//!
//! All branches of an if/else chain either fit on single lines in which
//! case braces are dropped, or at least one spans multiple lines in which
//! case every branch gets braces.

use crate::clang;
use crate::doc::{self, DocArena, DocId, ExecArgs, ExecFlags};
use crate::lexer::{Lexer, TokenFlags, TokenId, TokenKind};
use crate::options::Options;
use crate::style::Style;

#[derive(Debug)]
struct Block {
    root: DocId,
    body: DocId,
    lbrace: TokenId,
    rbrace: Option<TokenId>,
    braces: bool,
}

#[derive(Debug, Default)]
pub struct SimpleStmt {
    blocks: Vec<Block>,
}

impl SimpleStmt {
    pub fn new() -> SimpleStmt {
        SimpleStmt::default()
    }

    /// Register a braced block, returning the document the caller must
    /// build the body into so its width can be measured.
    pub fn block(
        &mut self,
        lx: &Lexer,
        arena: &mut DocArena,
        options: &Options,
        lbrace: TokenId,
        rbrace: TokenId,
        indent: i32,
    ) -> DocId {
        // Make sure both braces are covered by a diff chunk.
        let store = lx.store();
        let braces = !options.diff_parse
            || (store[lbrace].flags.intersects(TokenFlags::DIFF)
                && store[rbrace].flags.intersects(TokenFlags::DIFF));

        let root = arena.concat(None);
        let body = arena.indent(indent, Some(root));
        self.blocks.push(Block {
            root,
            body,
            lbrace,
            rbrace: Some(rbrace),
            braces,
        });
        body
    }

    /// Register a body lacking braces, the anchors delimit where braces
    /// would be inserted.
    pub fn ifelse_enter(
        &mut self,
        arena: &mut DocArena,
        anchor: TokenId,
        indent: i32,
    ) -> usize {
        let root = arena.concat(None);
        let body = arena.indent(indent, Some(root));
        self.blocks.push(Block {
            root,
            body,
            lbrace: anchor,
            rbrace: None,
            braces: false,
        });
        self.blocks.len() - 1
    }

    pub fn ifelse_leave(&mut self, cookie: usize, anchor: TokenId) {
        self.blocks[cookie].rbrace = Some(anchor);
    }

    pub fn body(&self, cookie: usize) -> DocId {
        self.blocks[cookie].body
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Decide on the brace style and rewrite the token stream accordingly.
    pub fn leave(self, lx: &mut Lexer, arena: &DocArena, style: &Style, options: &Options) {
        if self.blocks.is_empty() {
            return;
        }

        let mut oneline = true;
        for block in self.blocks.iter().filter(|block| block.braces) {
            let out = doc::exec(
                ExecArgs {
                    arena,
                    store: lx.store(),
                    lx: None,
                    style,
                    options,
                    flags: ExecFlags::default(),
                },
                block.root,
            );
            let nlines = out.matches('\n').count();
            let multiline = nlines > 1 || (nlines == 1 && !out.ends_with('\n'));
            let comment = block
                .rbrace
                .map(|rbrace| {
                    lx.store()
                        .find_prefix(rbrace, TokenKind::Comment)
                        .is_some()
                })
                .unwrap_or(false);
            if multiline || comment {
                // No point in continuing, at least one statement spans
                // multiple lines.
                oneline = false;
                break;
            }
        }

        if oneline {
            for block in self.blocks.iter().filter(|block| block.braces) {
                let lbrace = block.lbrace;
                let rbrace = block.rbrace.unwrap();
                if !lx.store().is_moveable(lbrace) || !lx.store().is_moveable(rbrace) {
                    continue;
                }
                lx.remove(lbrace);
                lx.remove(rbrace);
            }
        } else {
            for block in self.blocks.iter().filter(|block| block.rbrace.is_some()) {
                if block.braces {
                    continue;
                }
                let open_anchor = block.lbrace;
                let close_anchor = block.rbrace.unwrap();

                let lbrace =
                    lx.insert_before(open_anchor, clang::keyword_token(TokenKind::LBrace));
                if let Some(pv) = lx.store().prev(lbrace) {
                    lx.store_mut().move_suffixes(pv, lbrace);
                }
                let rbrace =
                    lx.insert_before(close_anchor, clang::keyword_token(TokenKind::RBrace));
                if let Some(pv) = lx.store().prev(rbrace) {
                    lx.store_mut().move_suffixes(pv, rbrace);
                }
            }
        }
    }
}
