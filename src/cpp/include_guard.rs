//! Synthesis of include guards in header files.

use crate::clang;
use crate::lexer::{Lexer, Token, TokenFlags, TokenId, TokenKind};
use crate::style::{Style, StyleKey};

/// Ensure the translation unit is surrounded by an include guard derived
/// from the file path. Existing guards matching the expected shape are left
/// alone, anything else is rewritten.
pub fn exec(lx: &mut Lexer, style: &Style) {
    let ncomponents = style.integer(StyleKey::IncludeGuards);
    if ncomponents == 0 || !is_header(lx.path()) {
        return;
    }

    let Some(guard) = path_to_guard(lx.path(), ncomponents) else {
        return;
    };
    let cpp_ifndef = format!("#ifndef {guard}\n");
    let cpp_define = format!("#define {guard}\n\n");
    let cpp_endif = format!("#endif /* !{guard} */\n");

    let Some(first) = lx.store().first() else {
        return;
    };
    let Some(eof) = lx.store().last() else {
        return;
    };

    let sensed = sense_guards(lx, first, eof);
    if let Some(sensed) = &sensed {
        let matches = |tk: TokenId, expected: &str| {
            lx.store()[tk].text.trim_start_matches(['\n', ' ', '\t']) == expected
        };
        if matches(sensed.ifndef, &cpp_ifndef)
            && matches(sensed.define, &cpp_define)
            && matches(sensed.endif, &cpp_endif)
        {
            return;
        }
    }

    // Intentionally not creating a cpp branch, recovering from it won't
    // make a difference.
    if let Some(sensed) = sensed {
        lx.store_mut().branch_unlink(sensed.ifndef);
        lx.store_mut().branch_unlink(sensed.endif);
        lx.store_mut()[first]
            .prefixes
            .retain(|&p| p != sensed.ifndef && p != sensed.define);
        lx.store_mut()[eof].prefixes.retain(|&p| p != sensed.endif);
    }

    let ifndef = lx.emit_synthetic(
        None,
        Token::new(TokenKind::CppIfndef, cpp_ifndef).with_flags(TokenFlags::CPP),
    );
    let define = lx.emit_synthetic(
        None,
        Token::new(TokenKind::CppDefine, cpp_define).with_flags(TokenFlags::CPP),
    );
    let endif = lx.emit_synthetic(
        None,
        Token::new(TokenKind::CppEndif, cpp_endif).with_flags(TokenFlags::CPP),
    );

    // Allow one or many comments, i.e. a license blurb, before the guard.
    let ncomments = lx.store()[first]
        .prefixes
        .iter()
        .take_while(|&&p| lx.store()[p].kind == TokenKind::Comment)
        .count();
    lx.store_mut()[first].prefixes.insert(ncomments, ifndef);
    lx.store_mut()[first].prefixes.insert(ncomments + 1, define);

    ensure_line(lx, eof);
    lx.store_mut()[eof].prefixes.push(endif);
}

struct SensedGuard {
    ifndef: TokenId,
    define: TokenId,
    endif: TokenId,
}

fn sense_guards(lx: &Lexer, first: TokenId, eof: TokenId) -> Option<SensedGuard> {
    let store = lx.store();
    let ifndef = store.find_prefix(first, TokenKind::CppIfndef)?;
    if store[ifndef].kind != TokenKind::CppIfndef {
        return None;
    }

    let prefixes = &store[first].prefixes;
    let pos = prefixes.iter().position(|&p| p == ifndef)?;
    let define = *prefixes.get(pos + 1)?;
    if store[define].kind != TokenKind::CppDefine || !is_guard_define(&store[define].text) {
        return None;
    }

    // An empty header carries the whole guard on the EOF token in which
    // case the branch is considered empty and lacks links.
    let endif = clang::branch_next(lx, ifndef).or_else(|| {
        let prefixes = &store[eof].prefixes;
        let pos = prefixes.iter().position(|&p| p == define)?;
        prefixes[pos + 1..]
            .iter()
            .copied()
            .find(|&p| store[p].kind == TokenKind::CppEndif)
    })?;
    if store[endif].kind != TokenKind::CppEndif {
        return None;
    }
    let anchored = clang::branch_parent(lx, endif) == Some(eof)
        || store[eof].prefixes.contains(&endif);
    if !anchored {
        return None;
    }

    Some(SensedGuard {
        ifndef,
        define,
        endif,
    })
}

/// Make sure the guard closing directive ends up on its own line.
fn ensure_line(lx: &mut Lexer, eof: TokenId) {
    if let Some(&last) = lx.store()[eof].prefixes.last() {
        if !lx.store().has_verbatim_line(last, 1) {
            lx.store_mut()[last].text.push('\n');
        }
        return;
    }
    if let Some(pv) = lx.store().prev(eof) {
        lx.store_mut().trim(pv);
        let line = lx.emit_synthetic(
            Some(pv),
            Token::new(TokenKind::Space, "\n"),
        );
        lx.store_mut()[pv].suffixes.push(line);
    }
}

fn is_header(path: &str) -> bool {
    path.ends_with(".h")
}

/// A guard define consists of exactly the directive and the guard name.
fn is_guard_define(text: &str) -> bool {
    text.split_whitespace().count() == 2
}

/// Derive the guard from the real path, using the given number of trailing
/// path components.
fn path_to_guard(path: &str, ncomponents: u32) -> Option<String> {
    let resolved = std::fs::canonicalize(path)
        .ok()
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| path.to_string());

    let components: Vec<&str> = resolved
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();
    if components.is_empty() {
        return None;
    }
    let n = (ncomponents as usize).min(components.len());
    let sliced = components[components.len() - n..].join("/");

    let mut guard = String::with_capacity(sliced.len());
    for c in sliced.chars() {
        match c {
            '.' | '/' | '-' => guard.push('_'),
            _ => guard.extend(c.to_uppercase()),
        }
    }
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_guard() {
        assert_eq!(path_to_guard("foo.h", 1), Some("FOO_H".to_string()));
        assert_eq!(
            path_to_guard("/does/not/exist/a-b.h", 2),
            Some("EXIST_A_B_H".to_string())
        );
    }

    #[test]
    fn test_is_guard_define() {
        assert!(is_guard_define("#define FOO_H\n"));
        assert!(is_guard_define("#define FOO_H\n\n"));
        assert!(!is_guard_define("#define FOO_H 1\n"));
    }
}
