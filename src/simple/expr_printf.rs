//! Removal of redundant trailing new lines in err(3) and warn(3) format
//! strings.

use crate::lexer::{Lexer, TokenId, TokenKind};

fn format_argno(name: &str) -> Option<usize> {
    match name {
        "warn" | "warnx" | "vwarn" | "vwarnx" | "perror" => Some(0),
        "err" | "errx" | "verr" | "verrx" | "warnc" | "vwarnc" => Some(1),
        "errc" | "verrc" => Some(2),
        _ => None,
    }
}

/// Strip the trailing `\n` from the format argument of the known printf
/// like functions, they imply their own line break.
pub fn exec(lx: &mut Lexer, tk: TokenId) {
    let Some(argno) = format_argno(&lx.store()[tk].text) else {
        return;
    };
    let Some(format) = find_format_argument(lx, tk, argno) else {
        return;
    };

    let text = &lx.store()[format].text;
    if !text.ends_with("\\n\"") {
        return;
    }
    let sanitized = format!("{}\"", &text[..text.len() - 3]);
    lx.store_mut()[format].text = sanitized;
}

fn find_format_argument(lx: &mut Lexer, seek: TokenId, argno: usize) -> Option<TokenId> {
    let st = lx.peek_enter();
    lx.seek(seek);
    let format = find_format_argument_inner(lx, argno);
    lx.peek_leave(st);
    format
}

fn find_format_argument_inner(lx: &mut Lexer, argno: usize) -> Option<TokenId> {
    lx.if_kind(TokenKind::Ident)?;
    lx.if_kind(TokenKind::LParen)?;

    for _ in 0..argno {
        lx.pop()?;
        lx.if_kind(TokenKind::Comma)?;
    }
    let mut format = None;
    while let Some(tk) = lx.if_kind(TokenKind::String) {
        format = Some(tk);
    }
    format
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn strings(src: &str) -> Vec<String> {
        let mut lx = Lexer::new(src, "test.c", vec![], &Options::default()).unwrap();
        let idents: Vec<TokenId> = {
            let mut out = vec![];
            let mut cur = lx.store().first();
            while let Some(tk) = cur {
                if lx.store()[tk].kind == TokenKind::Ident {
                    out.push(tk);
                }
                cur = lx.store().next(tk);
            }
            out
        };
        for tk in idents {
            exec(&mut lx, tk);
        }

        let mut out = vec![];
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            if lx.store()[tk].kind == TokenKind::String {
                out.push(lx.store()[tk].text.clone());
            }
            cur = lx.store().next(tk);
        }
        out
    }

    #[test]
    fn test_strip_trailing_line() {
        assert_eq!(strings("warn(\"oops\\n\");"), vec!["\"oops\""]);
        assert_eq!(strings("errx(1, \"oops\\n\");"), vec!["\"oops\""]);
    }

    #[test]
    fn test_untouched() {
        assert_eq!(strings("warn(\"oops\");"), vec!["\"oops\""]);
        assert_eq!(strings("printf(\"oops\\n\");"), vec!["\"oops\\n\""]);
    }
}
