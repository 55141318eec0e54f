//! Insertion of continue statements in empty loop bodies.

use crate::clang;
use crate::lexer::{Lexer, TokenKind};

/// Synthesize `continue;` inside empty loop braces, the lexer is expected
/// to be positioned at the left brace.
pub fn braces(lx: &mut Lexer) {
    let Some(rbrace) = lx.peek_if_pair(TokenKind::LBrace, TokenKind::RBrace) else {
        return;
    };
    let Some(lbrace) = lx.peek() else {
        return;
    };
    if !sense_empty_loop_braces(lx, lbrace, rbrace) {
        return;
    }

    let after = lx.insert_after(lbrace, clang::keyword_token(TokenKind::Continue));
    let nx = lx.store().next(after);
    if nx.map(|nx| lx.store()[nx].kind) != Some(TokenKind::Semi) {
        lx.insert_after(after, clang::keyword_token(TokenKind::Semi));
    }
}

/// Synthesize `continue` in front of a sole semicolon loop body.
pub fn no_braces(lx: &mut Lexer) {
    if lx.peek_if(TokenKind::Semi).is_none() {
        return;
    }
    let Some(after) = lx.back() else {
        return;
    };
    lx.insert_after(after, clang::keyword_token(TokenKind::Continue));
}

fn sense_empty_loop_braces(
    lx: &Lexer,
    lbrace: crate::lexer::TokenId,
    rbrace: crate::lexer::TokenId,
) -> bool {
    let store = lx.store();
    if !store.is_moveable(lbrace) || !store.is_moveable(rbrace) {
        return false;
    }
    let Some(nx) = store.next(lbrace) else {
        return false;
    };
    if nx == rbrace {
        return true;
    }
    store[nx].kind == TokenKind::Semi
        && store.is_moveable(nx)
        && store.next(nx) == Some(rbrace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn kinds(lx: &Lexer) -> Vec<TokenKind> {
        let mut out = vec![];
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            out.push(lx.store()[tk].kind);
            cur = lx.store().next(tk);
        }
        out
    }

    #[test]
    fn test_empty_braces() {
        let mut lx = Lexer::new("{}", "test.c", vec![], &Options::default()).unwrap();
        braces(&mut lx);
        assert_eq!(
            kinds(&lx),
            vec![
                TokenKind::LBrace,
                TokenKind::Continue,
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_sole_semi_in_braces() {
        let mut lx = Lexer::new("{;}", "test.c", vec![], &Options::default()).unwrap();
        braces(&mut lx);
        assert_eq!(
            kinds(&lx),
            vec![
                TokenKind::LBrace,
                TokenKind::Continue,
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }
}
