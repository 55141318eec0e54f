//! The document intermediate representation.
//!
//! Formatting happens in two stages. The parsers translate the token stream
//! into a tree of document nodes describing the preferred layout together
//! with the permitted line break points. The evaluator in [`exec`] then
//! renders the tree against the column limit, switching between a flat and
//! a broken layout per group.

mod exec;

pub use exec::{exec, width, ExecArgs, ExecFlags};

use std::ops::{Index, IndexMut};

use crate::lexer::{TokenFlags, TokenId, TokenStore};

/// Stable handle into a [`DocArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocId(u32);

impl DocId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Indentation behavior of an [`DocKind::Indent`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    /// Fixed amount of columns.
    Amount(i32),
    /// Align with the left parenthesis on the previous line.
    Parens,
    /// Emit the current indentation right away.
    Force,
    /// Apply the amount only if a hard line was emitted in the enclosing
    /// scope.
    Newline(i32),
    /// Indent subsequent lines using the width of the current line.
    Width,
}

/// One candidate layout of a [`DocKind::Minimize`] node.
#[derive(Debug, Clone, Copy)]
pub struct MinimizeVariant {
    pub indent: i32,
    /// Unconditionally favor this variant.
    pub force: bool,
}

#[derive(Debug)]
pub enum DocKind {
    Concat(Vec<DocId>),
    Group(Option<DocId>),
    Indent { amount: Indent, child: Option<DocId> },
    Dedent(Option<DocId>),
    /// Raw padding emitted right away, inserted by the ruler.
    Align { indent: u32, spaces: u32, tabalign: bool },
    Literal { text: String, token: Option<TokenId> },
    /// A trivia token emitted as is, cooperating with the diff machinery.
    Verbatim(TokenId),
    /// Space in flat mode, line break plus indentation otherwise.
    Line,
    /// Nothing in flat mode, line break otherwise.
    Softline,
    /// Unconditional line break.
    Hardline,
    /// Line break only honored inside an optional scope.
    Optline,
    Mute(i32),
    Optional(Option<DocId>),
    Minimize { variants: Vec<MinimizeVariant>, child: Option<DocId> },
    /// Delimits the lifetime of conditional indentation.
    Scope(Option<DocId>),
}

#[derive(Debug)]
pub struct DocNode {
    pub kind: DocKind,
}

#[derive(Debug, Default)]
pub struct DocArena {
    nodes: Vec<DocNode>,
}

impl Index<DocId> for DocArena {
    type Output = DocNode;

    fn index(&self, id: DocId) -> &DocNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<DocId> for DocArena {
    fn index_mut(&mut self, id: DocId) -> &mut DocNode {
        &mut self.nodes[id.index()]
    }
}

impl DocArena {
    pub fn new() -> DocArena {
        DocArena::default()
    }

    pub fn alloc(&mut self, kind: DocKind, parent: Option<DocId>) -> DocId {
        let id = DocId(self.nodes.len() as u32);
        self.nodes.push(DocNode { kind });
        if let Some(parent) = parent {
            self.append(parent, id);
        }
        id
    }

    /// Attach a child to its parent, concats grow a list while the other
    /// container nodes hold exactly one child.
    pub fn append(&mut self, parent: DocId, child: DocId) {
        match &mut self[parent].kind {
            DocKind::Concat(children) => children.push(child),
            DocKind::Group(slot)
            | DocKind::Indent { child: slot, .. }
            | DocKind::Dedent(slot)
            | DocKind::Optional(slot)
            | DocKind::Minimize { child: slot, .. }
            | DocKind::Scope(slot) => {
                debug_assert!(slot.is_none());
                *slot = Some(child);
            }
            _ => panic!("doc: append to leaf document"),
        }
    }

    pub fn remove(&mut self, parent: DocId, child: DocId) {
        match &mut self[parent].kind {
            DocKind::Concat(children) => children.retain(|&c| c != child),
            _ => panic!("doc: remove from non concat document"),
        }
    }

    pub fn remove_tail(&mut self, parent: DocId) {
        match &mut self[parent].kind {
            DocKind::Concat(children) => {
                children.pop();
            }
            _ => panic!("doc: remove from non concat document"),
        }
    }

    pub fn concat(&mut self, parent: Option<DocId>) -> DocId {
        self.alloc(DocKind::Concat(vec![]), parent)
    }

    pub fn group(&mut self, parent: Option<DocId>) -> DocId {
        self.alloc(DocKind::Group(None), parent)
    }

    /// A group wrapping a fresh concat, the common building block.
    pub fn group_concat(&mut self, parent: Option<DocId>) -> DocId {
        let group = self.group(parent);
        self.concat(Some(group))
    }

    /// An indent node wrapping a fresh concat.
    pub fn indent(&mut self, amount: i32, parent: Option<DocId>) -> DocId {
        let indent = self.alloc(
            DocKind::Indent {
                amount: Indent::Amount(amount),
                child: None,
            },
            parent,
        );
        self.concat(Some(indent))
    }

    pub fn indent_with(&mut self, amount: Indent, parent: Option<DocId>) -> DocId {
        let indent = self.alloc(
            DocKind::Indent {
                amount,
                child: None,
            },
            parent,
        );
        self.concat(Some(indent))
    }

    pub fn dedent(&mut self, parent: Option<DocId>) -> DocId {
        let dedent = self.alloc(DocKind::Dedent(None), parent);
        self.concat(Some(dedent))
    }

    pub fn literal(&mut self, text: &str, parent: Option<DocId>) -> DocId {
        self.alloc(
            DocKind::Literal {
                text: text.to_string(),
                token: None,
            },
            parent,
        )
    }

    pub fn line(&mut self, parent: Option<DocId>) -> DocId {
        self.alloc(DocKind::Line, parent)
    }

    pub fn softline(&mut self, parent: Option<DocId>) -> DocId {
        self.alloc(DocKind::Softline, parent)
    }

    pub fn hardline(&mut self, parent: Option<DocId>) -> DocId {
        self.alloc(DocKind::Hardline, parent)
    }

    pub fn optional(&mut self, parent: Option<DocId>) -> DocId {
        let optional = self.alloc(DocKind::Optional(None), parent);
        self.concat(Some(optional))
    }

    pub fn scope(&mut self, parent: Option<DocId>) -> DocId {
        let scope = self.alloc(DocKind::Scope(None), parent);
        self.concat(Some(scope))
    }

    pub fn minimize(&mut self, variants: &[MinimizeVariant], parent: Option<DocId>) -> DocId {
        let minimize = self.alloc(
            DocKind::Minimize {
                variants: variants.to_vec(),
                child: None,
            },
            parent,
        );
        self.concat(Some(minimize))
    }

    /// Emit a token, expanding its trivia. Prefixes land in front of the
    /// token, suffixes after it. Muting is toggled when crossing into an
    /// alternative cpp branch.
    pub fn token(&mut self, store: &TokenStore, tk: TokenId, parent: DocId) -> DocId {
        if store[tk].flags.intersects(TokenFlags::UNMUTE) {
            self.alloc(DocKind::Mute(-1), Some(parent));
        }

        for i in 0..store[tk].prefixes.len() {
            let prefix = store[tk].prefixes[i];
            self.alloc(DocKind::Verbatim(prefix), Some(parent));
        }

        let token = self.alloc(
            DocKind::Literal {
                text: store[tk].text.clone(),
                token: Some(tk),
            },
            Some(parent),
        );

        for i in 0..store[tk].suffixes.len() {
            let suffix = store[tk].suffixes[i];
            if store[suffix].flags.intersects(TokenFlags::OPTLINE) {
                self.alloc(DocKind::Optline, Some(parent));
            } else if !store[suffix].flags.intersects(TokenFlags::OPTSPACE) {
                self.alloc(DocKind::Verbatim(suffix), Some(parent));
            }
        }

        // Mute if we're about to branch.
        if let Some(nx) = store.next(tk) {
            if store.is_branch(nx) {
                self.alloc(DocKind::Mute(1), Some(parent));
            }
        }

        token
    }

    /// Emit a dangling trivia token verbatim, bypassing any formatting.
    pub fn verbatim(&mut self, tk: TokenId, parent: DocId) -> DocId {
        self.alloc(DocKind::Verbatim(tk), Some(parent))
    }

    pub fn is_concat_empty(&self, id: DocId) -> bool {
        match &self[id].kind {
            DocKind::Concat(children) => children.is_empty(),
            _ => false,
        }
    }

    pub fn set_align(&mut self, id: DocId, indent: u32, spaces: u32, tabalign: bool) {
        if let DocKind::Align {
            indent: i,
            spaces: s,
            tabalign: t,
        } = &mut self[id].kind
        {
            *i = indent;
            *s = spaces;
            *t = tabalign;
        }
    }

    pub fn set_indent(&mut self, id: DocId, value: i32) {
        if let DocKind::Indent { amount, .. } = &mut self[id].kind {
            *amount = Indent::Amount(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_children() {
        let mut arena = DocArena::new();
        let root = arena.concat(None);
        let a = arena.literal("a", Some(root));
        let b = arena.literal("b", Some(root));
        match &arena[root].kind {
            DocKind::Concat(children) => assert_eq!(children, &vec![a, b]),
            _ => unreachable!(),
        }
        arena.remove(root, a);
        match &arena[root].kind {
            DocKind::Concat(children) => assert_eq!(children, &vec![b]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_group_child() {
        let mut arena = DocArena::new();
        let group = arena.group(None);
        let concat = arena.concat(Some(group));
        match arena[group].kind {
            DocKind::Group(child) => assert_eq!(child, Some(concat)),
            _ => unreachable!(),
        }
    }
}
