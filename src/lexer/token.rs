use std::fmt::{self, Display};
use std::ops::{BitOr, BitOrAssign, Index, IndexMut};

/// Stable handle into a [`TokenStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(u32);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // keywords
    Assembly,
    Attribute,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Do,
    Double,
    Else,
    Enum,
    Extern,
    Float,
    For,
    Goto,
    If,
    Inline,
    Int,
    Long,
    Register,
    Restrict,
    Return,
    Short,
    Signed,
    Sizeof,
    Static,
    Struct,
    Switch,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
    // punctuators
    LSquare,
    RSquare,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Period,
    Ellipsis,
    Amp,
    AmpAmp,
    AmpEqual,
    Star,
    StarEqual,
    Plus,
    PlusPlus,
    PlusEqual,
    Minus,
    Arrow,
    MinusMinus,
    MinusEqual,
    Tilde,
    Exclaim,
    ExclaimEqual,
    Slash,
    SlashEqual,
    Percent,
    PercentEqual,
    Less,
    LessLess,
    LessEqual,
    LessLessEqual,
    Greater,
    GreaterGreater,
    GreaterEqual,
    GreaterGreaterEqual,
    Caret,
    CaretEqual,
    Pipe,
    PipePipe,
    PipeEqual,
    Question,
    Colon,
    Semi,
    Equal,
    EqualEqual,
    Comma,
    Backslash,
    // fixed width and compatibility types
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    VaList,
    // loop constructs hidden behind cpp, see queue(3)
    Foreach,
    // sentinels
    Comment,
    Cpp,
    CppIf,
    CppIfndef,
    CppElse,
    CppEndif,
    CppDefine,
    CppInclude,
    Ident,
    Literal,
    String,
    Space,
    Eof,
    Error,
    None,
}

impl TokenKind {
    /// Collapse cpp conditional variants into their base directive, easing
    /// comparisons of branch links.
    pub fn normalize(self) -> TokenKind {
        match self {
            TokenKind::CppIfndef => TokenKind::CppIf,
            kind => kind,
        }
    }

    pub fn is_cpp(self) -> bool {
        matches!(
            self,
            TokenKind::Cpp
                | TokenKind::CppIf
                | TokenKind::CppIfndef
                | TokenKind::CppElse
                | TokenKind::CppEndif
                | TokenKind::CppDefine
                | TokenKind::CppInclude
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenFlags(u32);

impl TokenFlags {
    pub const TYPE: TokenFlags = TokenFlags(1 << 0);
    pub const QUALIFIER: TokenFlags = TokenFlags(1 << 1);
    pub const STORAGE: TokenFlags = TokenFlags(1 << 2);
    pub const ASSIGN: TokenFlags = TokenFlags(1 << 3);
    pub const AMBIGUOUS: TokenFlags = TokenFlags(1 << 4);
    pub const BINARY: TokenFlags = TokenFlags(1 << 5);
    /// Binary operator which may be surrounded by spaces.
    pub const SPACE: TokenFlags = TokenFlags(1 << 6);
    pub const DISCARD: TokenFlags = TokenFlags(1 << 7);
    /// Suffix denoting exactly one trailing new line, only emitted in certain
    /// contexts.
    pub const OPTLINE: TokenFlags = TokenFlags(1 << 8);
    /// Suffix denoting trailing spaces or tabs, never emitted.
    pub const OPTSPACE: TokenFlags = TokenFlags(1 << 9);
    pub const COMMENT_C99: TokenFlags = TokenFlags(1 << 10);
    pub const CPP: TokenFlags = TokenFlags(1 << 11);
    /// Token covered by a diff chunk.
    pub const DIFF: TokenFlags = TokenFlags(1 << 12);
    /// Type denoting a function returning a function pointer.
    pub const TYPE_FUNC: TokenFlags = TokenFlags(1 << 13);
    /// Start of arguments to a function pointer type.
    pub const TYPE_ARGS: TokenFlags = TokenFlags(1 << 14);
    /// Stop muting upon emitting this token, set while taking a cpp branch.
    pub const UNMUTE: TokenFlags = TokenFlags(1 << 15);
    /// Trailing hard lines removed, still reported by line queries.
    pub const TRIMMED: TokenFlags = TokenFlags(1 << 16);

    pub const fn empty() -> TokenFlags {
        TokenFlags(0)
    }

    /// Returns true if any of the given flags is present.
    pub fn intersects(self, other: TokenFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: TokenFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: TokenFlags) {
        self.0 &= !other.0;
    }
}

impl BitOr for TokenFlags {
    type Output = TokenFlags;

    fn bitor(self, rhs: TokenFlags) -> TokenFlags {
        TokenFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TokenFlags {
    fn bitor_assign(&mut self, rhs: TokenFlags) {
        self.0 |= rhs.0;
    }
}

/// Links between the sibling cpp conditionals forming a branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Branch {
    /// Main token the directive hangs off.
    pub parent: Option<TokenId>,
    pub prev: Option<TokenId>,
    pub next: Option<TokenId>,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub flags: TokenFlags,
    pub lno: u32,
    pub cno: u32,
    pub off: usize,
    pub text: String,
    pub prefixes: Vec<TokenId>,
    pub suffixes: Vec<TokenId>,
    pub branch: Branch,
    pub(crate) next: Option<TokenId>,
    pub(crate) prev: Option<TokenId>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Token {
        Token {
            kind,
            flags: TokenFlags::empty(),
            lno: 0,
            cno: 0,
            off: 0,
            text: text.into(),
            prefixes: vec![],
            suffixes: vec![],
            branch: Branch::default(),
            next: None,
            prev: None,
        }
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Token {
        self.flags |= flags;
        self
    }

    /// Number of trailing new lines in the token text.
    pub fn trailing_lines(&self) -> usize {
        self.text.bytes().rev().take_while(|&b| b == b'\n').count()
    }

    /// Ordering based on the line number, columns are intentionally not
    /// compared.
    pub fn cmp_line(&self, other: &Token) -> std::cmp::Ordering {
        self.lno.cmp(&other.lno)
    }
}

/// Slab holding every token of one translation unit. Tokens are never freed
/// individually, removal only detaches them from the main stream.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: Vec<Token>,
    head: Option<TokenId>,
    tail: Option<TokenId>,
}

impl Index<TokenId> for TokenStore {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }
}

impl IndexMut<TokenId> for TokenStore {
    fn index_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.tokens[id.index()]
    }
}

impl TokenStore {
    pub fn new() -> TokenStore {
        TokenStore::default()
    }

    pub fn alloc(&mut self, tok: Token) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(tok);
        id
    }

    pub fn first(&self) -> Option<TokenId> {
        self.head
    }

    pub fn last(&self) -> Option<TokenId> {
        self.tail
    }

    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self[id].next
    }

    pub fn prev(&self, id: TokenId) -> Option<TokenId> {
        self[id].prev
    }

    /// Append a token to the tail of the main stream.
    pub fn append(&mut self, id: TokenId) {
        match self.tail {
            Some(tail) => {
                self[tail].next = Some(id);
                self[id].prev = Some(tail);
            }
            None => self.head = Some(id),
        }
        self[id].next = None;
        self.tail = Some(id);
    }

    pub fn insert_after(&mut self, anchor: TokenId, id: TokenId) {
        let nx = self[anchor].next;
        self[anchor].next = Some(id);
        self[id].prev = Some(anchor);
        self[id].next = nx;
        match nx {
            Some(nx) => self[nx].prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    pub fn insert_before(&mut self, anchor: TokenId, id: TokenId) {
        let pv = self[anchor].prev;
        self[anchor].prev = Some(id);
        self[id].next = Some(anchor);
        self[id].prev = pv;
        match pv {
            Some(pv) => self[pv].next = Some(id),
            None => self.head = Some(id),
        }
    }

    /// Detach a token from the main stream.
    pub fn unlink(&mut self, id: TokenId) {
        let Token { prev, next, .. } = self[id];
        if prev.is_none() && next.is_none() && self.head != Some(id) {
            // Already detached.
            return;
        }
        match prev {
            Some(pv) => self[pv].next = next,
            None => self.head = next,
        }
        match next {
            Some(nx) => self[nx].prev = prev,
            None => self.tail = prev,
        }
        self[id].prev = None;
        self[id].next = None;
    }

    pub fn find_prefix(&self, id: TokenId, kind: TokenKind) -> Option<TokenId> {
        self[id]
            .prefixes
            .iter()
            .copied()
            .find(|&p| self[p].kind.normalize() == kind.normalize())
    }

    pub fn find_suffix(&self, id: TokenId, kind: TokenKind) -> Option<TokenId> {
        self[id]
            .suffixes
            .iter()
            .copied()
            .find(|&s| self[s].kind == kind)
    }

    pub fn has_prefix_flags(&self, id: TokenId, flags: TokenFlags) -> bool {
        self[id]
            .prefixes
            .iter()
            .any(|&p| self[p].flags.intersects(flags))
    }

    /// Returns true if the token has at least the given number of trailing
    /// hard lines. One trailing line covers both ordinary and optional line
    /// suffixes while two lines require a blank line in the source.
    pub fn has_line(&self, id: TokenId, nlines: u32) -> bool {
        debug_assert!(nlines > 0 && nlines <= 2);
        if nlines == 1 && self[id].flags.intersects(TokenFlags::TRIMMED) {
            return true;
        }
        let mut skip = TokenFlags::OPTSPACE;
        if nlines > 1 {
            skip |= TokenFlags::OPTLINE;
        }
        self[id].suffixes.iter().any(|&s| {
            let suffix = &self[s];
            suffix.kind == TokenKind::Space && !suffix.flags.intersects(skip)
        })
    }

    /// Returns true if the token text carries at least the given number of
    /// trailing new lines, only relevant for verbatim cpp and comments.
    pub fn has_verbatim_line(&self, id: TokenId, nlines: usize) -> bool {
        self[id].trailing_lines() >= nlines
    }

    pub fn has_tabs(&self, id: TokenId) -> bool {
        self[id].suffixes.iter().any(|&s| {
            let suffix = &self[s];
            suffix.kind == TokenKind::Space
                && suffix.flags.intersects(TokenFlags::OPTSPACE)
                && suffix.text.starts_with('\t')
        })
    }

    pub fn has_spaces(&self, id: TokenId) -> bool {
        self[id].suffixes.iter().any(|&s| {
            let suffix = &self[s];
            suffix.kind == TokenKind::Space && suffix.flags.intersects(TokenFlags::OPTSPACE)
        })
    }

    pub fn find_suffix_spaces(&self, id: TokenId) -> Option<TokenId> {
        self[id].suffixes.iter().copied().find(|&s| {
            self[s].kind == TokenKind::Space && self[s].flags.intersects(TokenFlags::OPTSPACE)
        })
    }

    pub fn has_c99_comment(&self, id: TokenId) -> bool {
        self[id].suffixes.iter().any(|&s| {
            self[s].kind == TokenKind::Comment
                && self[s].flags.intersects(TokenFlags::COMMENT_C99)
        })
    }

    /// Returns true if the token represents a record or enum declaration of
    /// the given kind, i.e. the introducer right before the left brace.
    pub fn is_decl(&self, id: TokenId, kind: TokenKind) -> bool {
        let Some(nx) = self.next(id) else {
            return false;
        };
        if self[nx].kind != TokenKind::LBrace {
            return false;
        }
        let mut tk = id;
        if self[tk].kind == TokenKind::Ident {
            match self.prev(tk) {
                Some(pv) => tk = pv,
                None => return false,
            }
        }
        self[tk].kind == kind
    }

    /// A token may be moved by the simplification passes as long as no
    /// comment or cpp trivia would be dragged along.
    pub fn is_moveable(&self, id: TokenId) -> bool {
        let tok = &self[id];
        for &p in &tok.prefixes {
            if self[p].kind == TokenKind::Comment || self[p].flags.intersects(TokenFlags::CPP) {
                return false;
            }
        }
        for &s in &tok.suffixes {
            if self[s].kind == TokenKind::Comment {
                return false;
            }
        }
        true
    }

    /// Returns the branch continuation hanging off the token, if any.
    pub fn get_branch(&self, id: TokenId) -> Option<TokenId> {
        let br = self.find_prefix(id, TokenKind::CppElse)?;
        self[br].branch.prev
    }

    pub fn is_branch(&self, id: TokenId) -> bool {
        self.get_branch(id).is_some()
    }

    /// Sever the chain links of a cpp conditional, detaching it from its
    /// siblings. The parent anchor is left intact.
    pub fn branch_unlink(&mut self, id: TokenId) {
        let Branch { prev, next, .. } = self[id].branch;
        if let Some(pv) = prev {
            self[pv].branch.next = None;
        }
        if let Some(nx) = next {
            self[nx].branch.prev = None;
        }
        self[id].branch.prev = None;
        self[id].branch.next = None;
    }

    /// Remove all plain space suffixes, pulling trailing lines tight against
    /// the token. Returns the number of removed suffixes.
    pub fn trim(&mut self, id: TokenId) -> usize {
        let suffixes = std::mem::take(&mut self[id].suffixes);
        let mut kept = Vec::with_capacity(suffixes.len());
        let mut ntrim = 0;
        for s in suffixes {
            let suffix = &self[s];
            if suffix.kind == TokenKind::Space
                && !suffix.flags.intersects(TokenFlags::OPTSPACE)
            {
                ntrim += 1;
            } else {
                kept.push(s);
            }
        }
        self[id].suffixes = kept;
        if ntrim > 0 {
            self[id].flags.insert(TokenFlags::TRIMMED);
        }
        ntrim
    }

    pub fn move_prefixes(&mut self, src: TokenId, dst: TokenId) {
        let prefixes = std::mem::take(&mut self[src].prefixes);
        let mut moved = prefixes;
        for &p in &moved {
            if self[p].branch.parent == Some(src) {
                self[p].branch.parent = Some(dst);
            }
        }
        moved.append(&mut self[dst].prefixes);
        self[dst].prefixes = moved;
    }

    pub fn move_suffixes(&mut self, src: TokenId, dst: TokenId) {
        let mut suffixes = std::mem::take(&mut self[src].suffixes);
        self[dst].suffixes.append(&mut suffixes);
    }

    pub fn move_suffixes_if(&mut self, src: TokenId, dst: TokenId, kind: TokenKind) {
        let suffixes = std::mem::take(&mut self[src].suffixes);
        let mut kept = Vec::with_capacity(suffixes.len());
        for s in suffixes {
            if self[s].kind == kind {
                self[dst].suffixes.push(s);
            } else {
                kept.push(s);
            }
        }
        self[src].suffixes = kept;
    }

    /// Copy the suffixes of one token onto another, used when duplicating
    /// declarations.
    pub fn copy_suffixes(&mut self, src: TokenId, dst: TokenId) {
        let suffixes = self[src].suffixes.clone();
        for s in suffixes {
            let copy = self[s].clone();
            let id = self.alloc(copy);
            self[dst].suffixes.push(id);
        }
    }

    pub fn serialize(&self, id: TokenId) -> String {
        let tok = &self[id];
        format!(
            "{}<{}:{}>(\"{}\")",
            tok.kind,
            tok.lno,
            tok.cno,
            tok.text.escape_debug()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(tokens: &[(TokenKind, &str)]) -> (TokenStore, Vec<TokenId>) {
        let mut store = TokenStore::new();
        let ids = tokens
            .iter()
            .map(|&(kind, text)| {
                let id = store.alloc(Token::new(kind, text));
                store.append(id);
                id
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_stream_links() {
        let (store, ids) = store_with(&[
            (TokenKind::Int, "int"),
            (TokenKind::Ident, "x"),
            (TokenKind::Semi, ";"),
        ]);

        assert_eq!(store.first(), Some(ids[0]));
        assert_eq!(store.last(), Some(ids[2]));
        assert_eq!(store.next(ids[0]), Some(ids[1]));
        assert_eq!(store.prev(ids[2]), Some(ids[1]));
    }

    #[test]
    fn test_unlink() {
        let (mut store, ids) = store_with(&[
            (TokenKind::Int, "int"),
            (TokenKind::Ident, "x"),
            (TokenKind::Semi, ";"),
        ]);

        store.unlink(ids[1]);
        assert_eq!(store.next(ids[0]), Some(ids[2]));
        assert_eq!(store.prev(ids[2]), Some(ids[0]));
    }

    #[test]
    fn test_insert_after() {
        let (mut store, ids) = store_with(&[(TokenKind::Int, "int"), (TokenKind::Semi, ";")]);

        let id = store.alloc(Token::new(TokenKind::Ident, "x"));
        store.insert_after(ids[0], id);
        assert_eq!(store.next(ids[0]), Some(id));
        assert_eq!(store.next(id), Some(ids[1]));
    }

    #[test]
    fn test_is_decl() {
        let (store, ids) = store_with(&[
            (TokenKind::Struct, "struct"),
            (TokenKind::Ident, "s"),
            (TokenKind::LBrace, "{"),
        ]);

        assert!(store.is_decl(ids[1], TokenKind::Struct));
        assert!(!store.is_decl(ids[1], TokenKind::Enum));
        assert!(!store.is_decl(ids[0], TokenKind::Struct));
    }

    #[test]
    fn test_trailing_lines() {
        assert_eq!(Token::new(TokenKind::Cpp, "#else\n").trailing_lines(), 1);
        assert_eq!(Token::new(TokenKind::Cpp, "#else\n\n").trailing_lines(), 2);
        assert_eq!(Token::new(TokenKind::Ident, "x").trailing_lines(), 0);
    }
}
