//! Hoisting of the static storage class to the head of a declaration.

use crate::lexer::{Lexer, TokenId};

/// Move a misplaced `static` token to the beginning of the type. Returns
/// the end of the type, adjusted when the moved token used to be the end.
pub fn exec(lx: &mut Lexer, beg: TokenId, end: TokenId, tk: TokenId) -> TokenId {
    if !lx.store().is_moveable(tk) {
        return end;
    }
    let end = if tk == end {
        lx.store().prev(end).unwrap_or(end)
    } else {
        end
    };
    lx.move_before(beg, tk);
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;
    use crate::options::Options;

    #[test]
    fn test_hoist_static() {
        let mut lx =
            Lexer::new("int static x;\n", "test.c", vec![], &Options::default()).unwrap();
        let beg = lx.store().first().unwrap();
        let st = lx.store().next(beg).unwrap();
        assert_eq!(lx.store()[st].kind, TokenKind::Static);

        exec(&mut lx, beg, st, st);

        let first = lx.store().first().unwrap();
        assert_eq!(lx.store()[first].kind, TokenKind::Static);
        assert_eq!(
            lx.store()[lx.store().next(first).unwrap()].kind,
            TokenKind::Int
        );
    }
}
