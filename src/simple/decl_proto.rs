//! Removal of argument names in forward declared prototypes.
//!
//! Only prototypes where some argument names are missing are touched,
//! fully named and fully unnamed prototypes are left alone.

use crate::lexer::{Lexer, TokenFlags, TokenId, TokenKind};

#[derive(Debug, Default)]
pub struct SimpleDeclProto {
    arguments: Vec<Option<TokenId>>,
    ignore: bool,
}

impl SimpleDeclProto {
    pub fn new() -> SimpleDeclProto {
        SimpleDeclProto::default()
    }

    /// A new prototype argument was encountered.
    pub fn arg(&mut self) {
        self.arguments.push(None);
    }

    /// The identifier trailing the current argument.
    pub fn arg_ident(&mut self, lx: &Lexer, tk: TokenId) {
        let store = lx.store();
        let Some(arg) = self.arguments.last_mut() else {
            return;
        };
        let Some(pv) = store.prev(tk) else {
            self.ignore = true;
            return;
        };
        let named = store[pv].kind == TokenKind::Star
            || store[pv].flags.intersects(TokenFlags::TYPE)
            || is_qualifier(lx, pv);
        if named {
            *arg = Some(tk);
        } else {
            self.ignore = true;
        }
    }

    pub fn leave(self, lx: &mut Lexer) {
        if self.ignore {
            return;
        }
        let nargs = self.arguments.len();
        let nunnamed = self.arguments.iter().filter(|a| a.is_none()).count();
        if nunnamed == 0 || nargs == nunnamed {
            return;
        }
        for arg in self.arguments.into_iter().flatten() {
            lx.remove(arg);
        }
    }
}

fn is_qualifier(lx: &Lexer, tk: TokenId) -> bool {
    let store = lx.store();
    if !store[tk].flags.intersects(TokenFlags::QUALIFIER) {
        return false;
    }
    // Ensure this is not the first token of the argument.
    let Some(pv) = store.prev(tk) else {
        return false;
    };
    !(store[pv].kind == TokenKind::LParen
        || store[pv].kind == TokenKind::Comma
        || store[pv].flags.intersects(TokenFlags::QUALIFIER))
}
