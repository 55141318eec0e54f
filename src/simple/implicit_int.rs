//! Expansion of implicit int declarations.

use crate::clang;
use crate::lexer::{Lexer, TokenId, TokenKind};

/// Insert an `int` keyword after a lone `signed` or `unsigned` type token.
/// Returns the new end of the type.
pub fn exec(lx: &mut Lexer, beg: TokenId, end: TokenId) -> TokenId {
    if beg != end {
        return end;
    }
    let kind = lx.store()[beg].kind;
    if !matches!(kind, TokenKind::Signed | TokenKind::Unsigned) {
        return end;
    }
    if !lx.store().is_moveable(beg) {
        return end;
    }

    lx.insert_after(end, clang::keyword_token(TokenKind::Int))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_insert_int() {
        let mut lx =
            Lexer::new("unsigned x;\n", "test.c", vec![], &Options::default()).unwrap();
        let beg = lx.store().first().unwrap();
        let end = exec(&mut lx, beg, beg);
        assert_eq!(lx.store()[end].kind, TokenKind::Int);
        assert_eq!(lx.store().next(beg), Some(end));
    }

    #[test]
    fn test_untouched() {
        let mut lx =
            Lexer::new("unsigned long x;\n", "test.c", vec![], &Options::default()).unwrap();
        let beg = lx.store().first().unwrap();
        let end = lx.store().next(beg).unwrap();
        assert_eq!(exec(&mut lx, beg, end), end);
    }
}
