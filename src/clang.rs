//! Linking of preprocessor conditionals into branches.
//!
//! Walks the freshly lexed token stream and connects every `#else` and
//! `#endif` trivia token with its previous sibling, forming a chain rooted
//! at the opening `#if`. The printer consults these links when deciding
//! which tokens to mute while emitting alternative branches.

use crate::lexer::{Lexer, Token, TokenFlags, TokenId, TokenKind};

/// Prototype for a synthesized keyword token, handed to the lexer by the
/// simplification passes.
pub fn keyword_token(kind: TokenKind) -> Token {
    let text = match kind {
        TokenKind::Break => "break",
        TokenKind::Continue => "continue",
        TokenKind::Int => "int",
        TokenKind::Semi => ";",
        TokenKind::Comma => ",",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        _ => panic!("keyword_token: unsupported token {kind}"),
    };
    let flags = match kind {
        TokenKind::Int => TokenFlags::TYPE,
        _ => TokenFlags::empty(),
    };
    Token::new(kind, text).with_flags(flags)
}

/// Establish links between cpp branches over the whole token stream.
pub fn exec(lx: &mut Lexer) {
    let mut branches: Vec<TokenId> = vec![];

    let mut cur = lx.store().first();
    while let Some(tk) = cur {
        let prefixes = lx.store()[tk].prefixes.clone();
        for prefix in prefixes {
            match lx.store()[prefix].kind.normalize() {
                TokenKind::CppIf => branch_enter(lx, &mut branches, prefix, tk),
                TokenKind::CppElse => branch_link(lx, &mut branches, prefix, tk),
                TokenKind::CppEndif => branch_leave(lx, &mut branches, prefix, tk),
                _ => {}
            }
        }
        cur = lx.store().next(tk);
    }

    branch_purge(lx, &mut branches);
}

fn branch_enter(lx: &mut Lexer, branches: &mut Vec<TokenId>, cpp: TokenId, tk: TokenId) {
    log::trace!("clang: {}", lx.store().serialize(cpp));
    lx.store_mut()[cpp].branch.parent = Some(tk);
    branches.push(cpp);
}

fn branch_link(lx: &mut Lexer, branches: &mut Vec<TokenId>, cpp: TokenId, tk: TokenId) {
    // Silently ignore broken branches.
    let Some(&br) = branches.last() else {
        lx.store_mut().branch_unlink(cpp);
        return;
    };

    // Discard branches hanging off the same token, such a branch cannot
    // cause removal of any tokens.
    if lx.store()[br].branch.parent == Some(tk) {
        lx.store_mut().branch_unlink(cpp);
        return;
    }

    log::trace!(
        "clang: {} -> {}",
        lx.store().serialize(br),
        lx.store().serialize(cpp)
    );

    lx.store_mut()[cpp].branch.parent = Some(tk);
    link(lx, br, cpp);
    *branches.last_mut().unwrap() = cpp;
}

fn branch_leave(lx: &mut Lexer, branches: &mut Vec<TokenId>, cpp: TokenId, tk: TokenId) {
    let Some(&top) = branches.last() else {
        lx.store_mut().branch_unlink(cpp);
        return;
    };

    let mut br = Some(top);
    if lx.store()[top].branch.parent == Some(tk) {
        // An empty branch, discard it. If this is an empty else branch, try
        // to link with the previous sibling instead.
        log::trace!(
            "clang: {} -> {}, discard empty branch",
            lx.store().serialize(top),
            lx.store().serialize(cpp)
        );
        let pv = lx.store()[top].branch.prev;
        if let Some(pv) = pv {
            lx.store_mut()[top].branch.prev = None;
            lx.store_mut()[pv].branch.next = None;
        }
        lx.store_mut().branch_unlink(top);
        remove_prefix(lx, top, tk);
        br = pv;
    }

    match br {
        Some(br) => {
            lx.store_mut()[cpp].branch.parent = Some(tk);
            link(lx, br, cpp);
            log::trace!(
                "clang: {} -> {}",
                lx.store().serialize(br),
                lx.store().serialize(cpp)
            );
        }
        None => lx.store_mut().branch_unlink(cpp),
    }

    branches.pop();
}

/// Purge pending broken branches at end of file.
fn branch_purge(lx: &mut Lexer, branches: &mut Vec<TokenId>) {
    while let Some(tk) = branches.pop() {
        let mut cur = Some(tk);
        while let Some(id) = cur {
            let pv = lx.store()[id].branch.prev;
            log::trace!("clang: broken branch: {}", lx.store().serialize(id));
            lx.store_mut().branch_unlink(id);
            cur = pv;
        }
    }
}

fn link(lx: &mut Lexer, src: TokenId, dst: TokenId) {
    lx.store_mut()[src].branch.next = Some(dst);
    lx.store_mut()[dst].branch.prev = Some(src);
}

/// Drop an empty else branch from the output altogether. Opening
/// conditionals are kept, removing them would alter the meaning.
fn remove_prefix(lx: &mut Lexer, cpp: TokenId, anchor: TokenId) {
    if lx.store()[cpp].kind.normalize() != TokenKind::CppElse {
        return;
    }
    lx.store_mut()[anchor].prefixes.retain(|&p| p != cpp);
}

/// Follow the sibling chain starting at the given conditional.
pub fn branch_next(lx: &Lexer, cpp: TokenId) -> Option<TokenId> {
    lx.store()[cpp].branch.next
}

pub fn branch_parent(lx: &Lexer, cpp: TokenId) -> Option<TokenId> {
    lx.store()[cpp].branch.parent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn lex_and_link(src: &str) -> Lexer {
        let mut lx = Lexer::new(src, "test.c", vec![], &Options::default()).unwrap();
        exec(&mut lx);
        lx
    }

    fn find_prefix_of_kind(lx: &Lexer, kind: TokenKind) -> Option<TokenId> {
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            if let Some(p) = lx.store().find_prefix(tk, kind) {
                return Some(p);
            }
            cur = lx.store().next(tk);
        }
        None
    }

    #[test]
    fn test_if_else_endif_chain() {
        let lx = lex_and_link("#if A\nint a;\n#else\nint b;\n#endif\nint c;\n");
        let cpp_if = find_prefix_of_kind(&lx, TokenKind::CppIf).unwrap();
        let cpp_else = find_prefix_of_kind(&lx, TokenKind::CppElse).unwrap();
        let cpp_endif = find_prefix_of_kind(&lx, TokenKind::CppEndif).unwrap();

        assert_eq!(lx.store()[cpp_if].branch.next, Some(cpp_else));
        assert_eq!(lx.store()[cpp_else].branch.prev, Some(cpp_if));
        assert_eq!(lx.store()[cpp_else].branch.next, Some(cpp_endif));
        assert_eq!(lx.store()[cpp_endif].branch.prev, Some(cpp_else));
        assert_eq!(lx.store()[cpp_if].branch.prev, None);
        assert_eq!(lx.store()[cpp_endif].branch.next, None);
    }

    #[test]
    fn test_empty_branch_discarded() {
        // Both #else and #endif anchor the same token, the else branch is
        // empty and must not take part in the topology.
        let lx = lex_and_link("#if A\nint a;\n#else\n#endif\nint c;\n");
        let cpp_if = find_prefix_of_kind(&lx, TokenKind::CppIf).unwrap();
        let cpp_endif = find_prefix_of_kind(&lx, TokenKind::CppEndif).unwrap();
        assert_eq!(lx.store()[cpp_if].branch.next, Some(cpp_endif));
        assert_eq!(lx.store()[cpp_endif].branch.prev, Some(cpp_if));
    }

    #[test]
    fn test_unbalanced_purged() {
        let lx = lex_and_link("#if A\nint a;\n");
        let cpp_if = find_prefix_of_kind(&lx, TokenKind::CppIf).unwrap();
        assert_eq!(lx.store()[cpp_if].branch.next, None);
    }
}
