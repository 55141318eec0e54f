//! Gating of the simplification passes.
//!
//! Each pass rewrites the token stream ahead of the final document walk.
//! Passes are mutually exclusive, at most one may be active at a time with
//! the exception of the static pass which runs as part of the declaration
//! pass.

pub mod attributes;
pub mod decl;
pub mod decl_forward;
pub mod decl_proto;
pub mod expr_printf;
pub mod implicit_int;
pub mod static_kw;
pub mod stmt;
pub mod stmt_empty_loop;
pub mod stmt_switch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Attributes,
    Braces,
    Decl,
    DeclForward,
    DeclProto,
    ExprPrintf,
    ImplicitInt,
    SortIncludes,
    Static,
    Stmt,
    StmtEmptyLoop,
    StmtSwitch,
}

const NPASSES: usize = 12;

impl Pass {
    fn index(self) -> usize {
        match self {
            Pass::Attributes => 0,
            Pass::Braces => 1,
            Pass::Decl => 2,
            Pass::DeclForward => 3,
            Pass::DeclProto => 4,
            Pass::ExprPrintf => 5,
            Pass::ImplicitInt => 6,
            Pass::SortIncludes => 7,
            Pass::Static => 8,
            Pass::Stmt => 9,
            Pass::StmtEmptyLoop => 10,
            Pass::StmtSwitch => 11,
        }
    }

    /// The static pass runs as part of the decl pass.
    fn is_mutually_exclusive(self) -> bool {
        self != Pass::Static
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Disable,
    Enable,
    Ignore,
}

/// Restores the previous pass state on leave.
#[derive(Debug, Clone, Copy)]
pub struct Cookie {
    pass: Pass,
    restore: State,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnterFlags {
    /// Enable the pass even if simplifications are globally disabled.
    pub force: bool,
    /// Keep the pass state, only signalling presence.
    pub ignore: bool,
}

#[derive(Debug)]
pub struct Passes {
    states: [State; NPASSES],
    enable: bool,
}

impl Passes {
    pub fn new(enable: bool) -> Passes {
        Passes {
            states: [State::Disable; NPASSES],
            enable,
        }
    }

    /// Try to activate a pass. Returns true if the pass was enabled by this
    /// call, the cookie must be handed back to [`Passes::leave`].
    pub fn enter(&mut self, pass: Pass, flags: EnterFlags) -> (bool, Cookie) {
        let cookie = Cookie {
            pass,
            restore: self.states[pass.index()],
        };

        if !self.enable && !flags.force {
            self.states[pass.index()] = State::Disable;
            return (false, cookie);
        }

        if pass.is_mutually_exclusive() {
            let other_active = self
                .states
                .iter()
                .enumerate()
                .any(|(i, &state)| i != pass.index() && state != State::Disable);
            if other_active {
                self.states[pass.index()] = State::Disable;
                return (false, cookie);
            }
        }

        if flags.ignore || self.states[pass.index()] != State::Disable {
            self.states[pass.index()] = State::Ignore;
            return (false, cookie);
        }

        self.states[pass.index()] = State::Enable;
        (true, cookie)
    }

    pub fn leave(&mut self, cookie: Cookie) {
        self.states[cookie.pass.index()] = cookie.restore;
    }

    pub fn is_enabled(&self, pass: Pass) -> bool {
        self.states[pass.index()] == State::Enable
    }

    pub fn disable(&mut self) -> bool {
        std::mem::replace(&mut self.enable, false)
    }

    pub fn restore(&mut self, enable: bool) {
        self.enable = enable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_leave() {
        let mut passes = Passes::new(true);
        let (enabled, cookie) = passes.enter(Pass::Decl, EnterFlags::default());
        assert!(enabled);
        assert!(passes.is_enabled(Pass::Decl));
        passes.leave(cookie);
        assert!(!passes.is_enabled(Pass::Decl));
    }

    #[test]
    fn test_disabled_without_flag() {
        let mut passes = Passes::new(false);
        let (enabled, _) = passes.enter(Pass::Decl, EnterFlags::default());
        assert!(!enabled);
        let (enabled, _) = passes.enter(
            Pass::SortIncludes,
            EnterFlags {
                force: true,
                ..EnterFlags::default()
            },
        );
        assert!(enabled);
    }

    #[test]
    fn test_mutual_exclusion() {
        let mut passes = Passes::new(true);
        let (enabled, _decl) = passes.enter(Pass::Decl, EnterFlags::default());
        assert!(enabled);
        let (enabled, _stmt) = passes.enter(Pass::Stmt, EnterFlags::default());
        assert!(!enabled);
        // The static pass is allowed to nest within the decl pass.
        let (enabled, _static) = passes.enter(Pass::Static, EnterFlags::default());
        assert!(enabled);
    }

    #[test]
    fn test_reentry_ignored() {
        let mut passes = Passes::new(true);
        let (enabled, _outer) = passes.enter(Pass::Decl, EnterFlags::default());
        assert!(enabled);
        let (enabled, inner) = passes.enter(Pass::Decl, EnterFlags::default());
        assert!(!enabled);
        passes.leave(inner);
        assert!(passes.is_enabled(Pass::Decl));
    }
}
