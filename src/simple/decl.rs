//! Merging of variable declarations sharing the same type.
//!
//! Within one block of declarations, variables of identical types are
//! coalesced into a single declaration with the variables sorted in
//! alphabetical order:
//!
//! ```text
//! int x;           int x, y;
//! int y;       =>
//! ```

use std::collections::HashMap;

use crate::clang;
use crate::lexer::{Lexer, TokenId, TokenKind};

#[derive(Debug, Default)]
struct DeclVar {
    ident: Vec<TokenId>,
    sort: Option<TokenId>,
    delim: Option<TokenId>,
}

#[derive(Debug)]
struct TypeGroup {
    /// Tokens spelling out the type, copied in front of the merged
    /// declaration.
    ty: Vec<TokenId>,
    /// Insertion point for the merged declaration.
    semi: Option<TokenId>,
    vars: Vec<DeclVar>,
}

#[derive(Debug)]
struct DeclRange {
    tokens: Vec<TokenId>,
    nrejects: u32,
}

/// State of one declaration block, dropped at the closing brace.
#[derive(Debug, Default)]
pub struct SimpleDecl {
    groups: Vec<TypeGroup>,
    group_index: HashMap<String, usize>,
    decls: Vec<DeclRange>,
    cur_group: Option<usize>,
    cur_decl: Option<usize>,
    cur_var_beg: Option<TokenId>,
    active: bool,
}

impl SimpleDecl {
    pub fn new() -> SimpleDecl {
        SimpleDecl::default()
    }

    /// Take note of the type of a declaration, spanning the given inclusive
    /// token range.
    pub fn decl_type(&mut self, lx: &Lexer, beg: TokenId, end: TokenId) {
        let store = lx.store();

        let mut tokens = vec![];
        let mut tk = Some(beg);
        while let Some(id) = tk {
            if !store.is_moveable(id) {
                return;
            }
            tokens.push(id);
            if id == end {
                break;
            }
            tk = store.next(id);
        }

        // Any pointer(s) must be part of the identifier and not the type.
        let mut end = end;
        while store[end].kind == TokenKind::Star {
            tokens.pop();
            match store.prev(end) {
                Some(pv) => end = pv,
                None => return,
            }
        }
        if tokens.is_empty() {
            return;
        }

        let key = tokens
            .iter()
            .map(|&t| store[t].text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let group = match self.group_index.get(&key) {
            Some(&i) => i,
            None => {
                log::trace!("simple-decl: new type \"{key}\"");
                self.groups.push(TypeGroup {
                    ty: tokens.clone(),
                    semi: None,
                    vars: vec![],
                });
                self.group_index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.cur_group = Some(group);

        self.decls.push(DeclRange {
            tokens,
            nrejects: 0,
        });
        self.cur_decl = Some(self.decls.len() - 1);

        self.groups[group].vars.push(DeclVar::default());
        self.cur_var_beg = store.next(end);
        self.active = true;
    }

    pub fn decl_semi(&mut self, lx: &Lexer, semi: TokenId) {
        if !self.active {
            return;
        }
        let Some(group) = self.cur_group else {
            return;
        };
        let Some(decl) = self.cur_decl else {
            return;
        };

        self.var_end(lx, semi);

        // If the declaration is empty, ensure deletion of everything
        // including the semicolon.
        if self.decls[decl].nrejects == 0 {
            self.decls[decl].tokens = extend_range(lx, &self.decls[decl].tokens, semi);
        }

        // Favor insertion of the merged declaration after the last kept
        // declaration.
        if self.groups[group].semi.is_none() || self.decls[decl].nrejects > 0 {
            self.groups[group].semi = Some(semi);
        }

        self.cur_group = None;
        self.cur_decl = None;
        self.cur_var_beg = None;
        self.active = false;
    }

    pub fn decl_comma(&mut self, lx: &Lexer, comma: TokenId) {
        if !self.active {
            return;
        }
        let Some(group) = self.cur_group else {
            return;
        };

        let mut delim = None;
        let kept = self.var_end(lx, comma);
        if kept {
            let var = self.groups[group].vars.last_mut().unwrap();
            if var.delim.is_none() {
                var.delim = Some(comma);
            } else if lx.store().is_moveable(comma) {
                delim = Some(comma);
            }
        } else if lx.store().is_moveable(comma) {
            // If the next variable ends up being moved, the preceding
            // comma must be removed.
            delim = Some(comma);
        }

        // Another variable after the comma is expected.
        self.groups[group].vars.push(DeclVar {
            delim,
            ..DeclVar::default()
        });
        self.cur_var_beg = lx.store().next(comma);
    }

    /// Close the current variable at the given delimiter. Returns true if
    /// the variable was kept.
    fn var_end(&mut self, lx: &Lexer, end: TokenId) -> bool {
        let store = lx.store();
        let Some(group) = self.cur_group else {
            return false;
        };
        let Some(beg) = self.cur_var_beg else {
            return false;
        };

        let mut ident = vec![];
        let mut ok = store.is_moveable(end);
        let mut tk = Some(beg);
        while let Some(id) = tk {
            if id == end {
                break;
            }
            match store[id].kind {
                TokenKind::Star => {}
                TokenKind::Ident => {}
                _ => ok = false,
            }
            if !store.is_moveable(id) {
                ok = false;
            }
            ident.push(id);
            tk = store.next(id);
        }
        let sort = ident.iter().copied().find(|&t| store[t].kind == TokenKind::Ident);
        if !ok || sort.is_none() {
            // Reject the variable, the enclosing declaration is kept.
            self.groups[group].vars.pop();
            if let Some(decl) = self.cur_decl {
                self.decls[decl].nrejects += 1;
            }
            self.cur_var_beg = None;
            return false;
        }

        let var = self.groups[group].vars.last_mut().unwrap();
        var.ident = ident;
        var.sort = sort;
        self.cur_var_beg = None;
        true
    }

    /// Materialize the merged declarations and drop the ones they replace.
    pub fn leave(mut self, lx: &mut Lexer) {
        let mut moved: std::collections::HashSet<TokenId> = std::collections::HashSet::new();
        for group in &self.groups {
            for var in &group.vars {
                moved.extend(var.ident.iter().copied());
            }
        }

        for group in &mut self.groups {
            if group.vars.is_empty() {
                continue;
            }
            let Some(semi) = group.semi else {
                continue;
            };

            // Create the new type declaration.
            let mut after = semi;
            for i in 0..group.ty.len() {
                let ty = group.ty[i];
                after = lx.copy_after(after, ty);
                // Intentionally ignore prefixes.
                lx.store_mut().copy_suffixes(ty, after);
            }

            // Sort the variables in alphabetical order.
            group.vars.sort_by(|a, b| {
                let a = a.sort.map(|t| lx.store()[t].text.clone()).unwrap_or_default();
                let b = b.sort.map(|t| lx.store()[t].text.clone()).unwrap_or_default();
                a.cmp(&b)
            });

            // Move the variables to the new declaration.
            for (i, var) in group.vars.iter().enumerate() {
                if let Some(delim) = var.delim {
                    lx.remove(delim);
                }
                if i > 0 {
                    after = lx.insert_after(after, clang::keyword_token(TokenKind::Comma));
                }
                for &ident in &var.ident {
                    after = lx.move_after(after, ident);
                }
            }

            let cp = lx.insert_after(after, clang::keyword_token(TokenKind::Semi));
            if lx.store().is_moveable(semi) {
                // Move line break(s) to the new semicolon.
                lx.store_mut().move_prefixes(semi, cp);
                lx.store_mut().move_suffixes(semi, cp);
            }
        }

        // Remove the now empty declarations, leaving relocated variables
        // alone.
        for decl in &self.decls {
            if decl.nrejects > 0 {
                continue;
            }
            for &tk in &decl.tokens {
                if !moved.contains(&tk) {
                    lx.remove(tk);
                }
            }
        }
    }
}

fn extend_range(lx: &Lexer, tokens: &[TokenId], until: TokenId) -> Vec<TokenId> {
    let store = lx.store();
    let mut out = tokens.to_vec();
    let mut tk = out.last().copied().and_then(|t| store.next(t));
    while let Some(id) = tk {
        out.push(id);
        if id == until {
            break;
        }
        tk = store.next(id);
    }
    out
}
