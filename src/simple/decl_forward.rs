//! Sorting of consecutive forward declarations.

use crate::lexer::{Lexer, TokenId, TokenKind};

#[derive(Debug)]
struct Forward {
    tokens: Vec<TokenId>,
    ident: TokenId,
}

/// Gathers runs of `struct x;` forward declarations, sorting each run
/// alphabetically on leave.
#[derive(Debug, Default)]
pub struct SimpleDeclForward {
    decls: Vec<Forward>,
    after: Option<TokenId>,
}

impl SimpleDeclForward {
    pub fn new() -> SimpleDeclForward {
        SimpleDeclForward::default()
    }

    /// Consider the declaration delimited by the given tokens. Anything but
    /// a forward declaration ends the current run.
    pub fn decl(&mut self, lx: &mut Lexer, beg: TokenId, semi: TokenId) {
        let Some((tokens, ident)) = as_forward_decl(lx, beg, semi) else {
            self.leave(lx);
            return;
        };

        if self.after.is_none() {
            self.after = Some(semi);
        }
        self.decls.push(Forward { tokens, ident });
    }

    pub fn leave(&mut self, lx: &mut Lexer) {
        if self.decls.len() >= 2 {
            // Preserve prefixes and suffixes tied to the block.
            let first_unsorted = self.decls.first().unwrap().tokens[0];
            let last_unsorted = *self.decls.last().unwrap().tokens.last().unwrap();
            self.decls.sort_by(|a, b| {
                lx.store()[a.ident].text.cmp(&lx.store()[b.ident].text)
            });
            let first_sorted = self.decls.first().unwrap().tokens[0];
            let last_sorted = *self.decls.last().unwrap().tokens.last().unwrap();

            if first_unsorted != first_sorted {
                lx.store_mut().move_prefixes(first_unsorted, first_sorted);
            }
            if last_unsorted != last_sorted {
                lx.store_mut().move_suffixes(last_unsorted, last_sorted);
            }

            let mut after = self.after.unwrap();
            for decl in &self.decls {
                for &tk in &decl.tokens {
                    after = lx.move_after(after, tk);
                }
            }
        }

        self.decls.clear();
        self.after = None;
    }
}

/// Returns the tokens of a `struct x;` declaration, or nothing if the
/// range denotes something else.
fn as_forward_decl(lx: &Lexer, beg: TokenId, semi: TokenId) -> Option<(Vec<TokenId>, TokenId)> {
    let store = lx.store();

    if store[beg].kind != TokenKind::Struct {
        return None;
    }
    let ident = store.next(beg)?;
    if store[ident].kind != TokenKind::Ident {
        return None;
    }
    if store.next(ident)? != semi {
        return None;
    }
    Some((vec![beg, ident, semi], ident))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_sort_forward_decls() {
        let mut lx = Lexer::new(
            "struct b;\nstruct a;\nint x;\n",
            "test.c",
            vec![],
            &Options::default(),
        )
        .unwrap();

        // Emulate the parser walk.
        let mut sd = SimpleDeclForward::new();
        let mut decls = vec![];
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            if lx.store()[tk].kind == TokenKind::Struct {
                let semi = {
                    let ident = lx.store().next(tk).unwrap();
                    lx.store().next(ident).unwrap()
                };
                decls.push((tk, semi));
            }
            cur = lx.store().next(tk);
        }
        for (beg, semi) in decls {
            sd.decl(&mut lx, beg, semi);
        }
        sd.leave(&mut lx);

        let mut order = vec![];
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            if lx.store()[tk].kind == TokenKind::Ident {
                order.push(lx.store()[tk].text.clone());
            }
            cur = lx.store().next(tk);
        }
        assert_eq!(order, vec!["a", "b", "x"]);
    }
}
