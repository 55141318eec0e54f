//! Normalization of attribute names.

use crate::lexer::{Lexer, TokenId, TokenKind};

/// Rewrite `__name__` into `name` inside `__attribute__((...))` when the
/// underscores are symmetric.
pub fn exec(lx: &mut Lexer, ident: TokenId) {
    if lx.store()[ident].kind != TokenKind::Ident {
        return;
    }
    let text = &lx.store()[ident].text;
    if text.len() <= 4 || !text.starts_with("__") || !text.ends_with("__") {
        return;
    }
    let sanitized = text[2..text.len() - 2].to_string();
    lx.store_mut()[ident].text = sanitized;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_remove_underscores() {
        let mut lx = Lexer::new("__unused__", "test.c", vec![], &Options::default()).unwrap();
        let tk = lx.store().first().unwrap();
        exec(&mut lx, tk);
        assert_eq!(lx.store()[tk].text, "unused");
    }

    #[test]
    fn test_asymmetric_untouched() {
        let mut lx = Lexer::new("__unused", "test.c", vec![], &Options::default()).unwrap();
        let tk = lx.store().first().unwrap();
        exec(&mut lx, tk);
        assert_eq!(lx.store()[tk].text, "__unused");
    }
}
