//! Insertion of break statements in empty default switch cases.

use crate::clang;
use crate::lexer::{Lexer, TokenId, TokenKind};

/// Insert `break;` after `default:` when the case body is a sole
/// semicolon.
pub fn exec(lx: &mut Lexer, tkcase: TokenId) {
    if lx.store()[tkcase].kind != TokenKind::Default {
        return;
    }

    let st = lx.peek_enter();
    lx.seek(tkcase);
    let colon = (|lx: &mut Lexer| {
        lx.if_kind(TokenKind::Default)?;
        let colon = lx.if_kind(TokenKind::Colon)?;
        lx.if_kind(TokenKind::Semi)?;
        Some(colon)
    })(lx);
    lx.peek_leave(st);

    let Some(colon) = colon else {
        return;
    };
    let tkbreak = lx.insert_after(colon, clang::keyword_token(TokenKind::Break));
    // Ensure the break statement ends up on a new line.
    lx.store_mut()[tkbreak].lno += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_insert_break() {
        let mut lx =
            Lexer::new("switch (x) { default:; }", "test.c", vec![], &Options::default())
                .unwrap();
        let mut cur = lx.store().first();
        let mut default = None;
        while let Some(tk) = cur {
            if lx.store()[tk].kind == TokenKind::Default {
                default = Some(tk);
            }
            cur = lx.store().next(tk);
        }
        exec(&mut lx, default.unwrap());

        let mut kinds = vec![];
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            kinds.push(lx.store()[tk].kind);
            cur = lx.store().next(tk);
        }
        assert!(kinds
            .windows(3)
            .any(|w| w == [TokenKind::Colon, TokenKind::Break, TokenKind::Semi]));
    }
}
