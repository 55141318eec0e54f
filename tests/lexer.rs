use cfmt::lexer::{Lexer, TokenId, TokenKind};
use cfmt::options::Options;

fn lex(src: &str) -> Lexer {
    Lexer::new(src, "t.c", vec![], &Options::default()).expect("lexing failed")
}

fn all_tokens(lx: &Lexer) -> Vec<TokenId> {
    let mut out = vec![];
    let mut cur = lx.store().first();
    while let Some(tk) = cur {
        for &p in &lx.store()[tk].prefixes {
            out.push(p);
        }
        out.push(tk);
        for &s in &lx.store()[tk].suffixes {
            out.push(s);
        }
        cur = lx.store().next(tk);
    }
    out
}

/// Every token must mirror the source bytes at its offset and anything not
/// covered by a token may only be whitespace.
fn assert_round_trip(src: &str) {
    let lx = lex(src);
    let mut covered = vec![false; src.len()];

    for tk in all_tokens(&lx) {
        let tok = &lx.store()[tk];
        if tok.text.is_empty() {
            continue;
        }
        let end = tok.off + tok.text.len();
        assert!(
            end <= src.len() && &src[tok.off..end] == tok.text,
            "token {} does not mirror the source at {}",
            lx.store().serialize(tk),
            tok.off,
        );
        for slot in covered.iter_mut().take(end).skip(tok.off) {
            *slot = true;
        }
    }

    for (i, covered) in covered.iter().enumerate() {
        if !covered {
            let b = src.as_bytes()[i];
            assert!(
                b == b' ' || b == b'\t' || b == b'\n',
                "byte {i} ({:?}) not covered by any token",
                b as char
            );
        }
    }
}

#[test]
fn round_trip() {
    assert_round_trip("int main(void)\n{\n\treturn 0;\n}\n");
    assert_round_trip("/* comment */\nint x; /* trailing */\n\nchar *p;\n");
    assert_round_trip("#include <stdio.h>\n#define FOO 1\n\nint x;\n");
    assert_round_trip("#if A\nint a;\n#else\nint b;\n#endif\n");
    assert_round_trip("const char *s = \"str \\\"quoted\\\"\";\n");
}

#[test]
fn line_numbers() {
    let src = "int x;\nchar y;\n\nlong z;\n";
    let lx = lex(src);
    for tk in all_tokens(&lx) {
        let tok = &lx.store()[tk];
        if tok.text.is_empty() {
            continue;
        }
        let expected = 1 + src[..tok.off].matches('\n').count() as u32;
        assert_eq!(tok.lno, expected, "line of {}", lx.store().serialize(tk));
    }
}

#[test]
fn branch_topology_closure() {
    let src = "#if A\nint a;\n#elif B\nint b;\n#else\nint c;\n#endif\nint d;\n";
    let mut lx = lex(src);
    cfmt::clang::exec(&mut lx);

    // Locate the chain root.
    let mut cpp_if = None;
    for tk in all_tokens(&lx) {
        if lx.store()[tk].kind == TokenKind::CppIf {
            cpp_if = Some(tk);
        }
    }
    let cpp_if = cpp_if.expect("missing #if");

    // Following the next links from the #if must reach the #endif.
    let mut cur = cpp_if;
    let mut kinds = vec![lx.store()[cur].kind.normalize()];
    while let Some(nx) = lx.store()[cur].branch.next {
        kinds.push(lx.store()[nx].kind.normalize());
        cur = nx;
    }
    assert_eq!(
        kinds,
        vec![
            TokenKind::CppIf,
            TokenKind::CppElse,
            TokenKind::CppElse,
            TokenKind::CppEndif
        ]
    );

    // And the other way around.
    let endif = cur;
    let mut cur = endif;
    while let Some(pv) = lx.store()[cur].branch.prev {
        cur = pv;
    }
    assert_eq!(cur, cpp_if);
}

#[test]
fn peek_restores_cursor() {
    let mut lx = lex("int x;\n");
    let st = lx.peek_enter();
    lx.pop();
    lx.pop();
    lx.peek_leave(st);
    let tk = lx.pop().unwrap();
    assert_eq!(lx.store()[tk].kind, TokenKind::Int);
}

#[test]
fn balanced_pair_lookahead() {
    let mut lx = lex("foo(bar(1, 2), 3);\n");
    lx.pop();
    let close = lx.peek_if_pair(TokenKind::LParen, TokenKind::RParen).unwrap();
    // The matching close is the outer one.
    let next = lx.store().next(close).unwrap();
    assert_eq!(lx.store()[next].kind, TokenKind::Semi);
}
