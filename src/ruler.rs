//! Alignment of columns across rows.
//!
//! Documents are constructed row by row while the final width of each
//! column is unknown. The ruler buffers the spots where alignment is
//! wanted and back patches the padding once every row has been seen.

use crate::doc::{DocArena, DocId, DocKind};
use crate::lexer::{TokenId, TokenKind, TokenStore};

/// Use the smallest possible alignment covering all columns.
pub const ALIGN_MIN: u32 = 0x01;
/// The alignment for all columns will be less or equal to the alignment
/// given to [`Ruler::new`].
pub const ALIGN_MAX: u32 = 0x02;
/// Unconditionally align all columns to the alignment given to
/// [`Ruler::new`].
pub const ALIGN_FIXED: u32 = 0x04;
/// Smallest possible alignment ceiled to a multiple of 8.
pub const ALIGN_TABS: u32 = 0x08;
/// Sense and honor existing alignment.
pub const ALIGN_SENSE: u32 = 0x10;

#[derive(Debug, Default)]
struct RulerDatum {
    dc: Option<DocId>,
    len: u32,
    nspaces: u32,
}

#[derive(Debug, Default)]
struct RulerColumn {
    len: u32,
    nspaces: u32,
    ntabs: u32,
    datums: Vec<RulerDatum>,
}

#[derive(Debug)]
struct RulerIndent {
    dc: DocId,
    direction: i32,
    removed: bool,
}

/// Cookie handed out by [`Ruler::indent`], allowing the caller to withdraw
/// the indentation before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulerCookie(usize);

#[derive(Debug, Default)]
pub struct Ruler {
    columns: Vec<RulerColumn>,
    indents: Vec<RulerIndent>,
    align: u32,
    flags: u32,
}

impl Ruler {
    pub fn new(align: u32, flags: u32) -> Ruler {
        Ruler {
            columns: vec![],
            indents: vec![],
            align,
            flags,
        }
    }

    pub fn column_count(&self) -> u32 {
        self.columns.len() as u32
    }

    /// Insert a new datum, indicating that this row must be aligned after
    /// the given token with any preceding or following row. The alignment
    /// is materialized by [`Ruler::exec`] once all rows have been seen.
    pub fn insert(
        &mut self,
        store: &TokenStore,
        tk: Option<TokenId>,
        arena: &mut DocArena,
        dc: DocId,
        col: u32,
        len: u32,
        nspaces: u32,
    ) {
        let col = col.max(1) as usize;
        while self.columns.len() < col {
            self.columns.push(RulerColumn::default());
        }
        let column = &mut self.columns[col - 1];

        if let Some(tk) = tk {
            // No space wanted at all if the following token is a semicolon,
            // i.e. a declaration without an initializer.
            if store
                .next(tk)
                .map(|nx| store[nx].kind == TokenKind::Semi)
                .unwrap_or(false)
            {
                column.datums.push(RulerDatum::default());
                return;
            }

            // Only a space is wanted for enum/struct/union declarations.
            if store.is_decl(tk, TokenKind::Enum)
                || store.is_decl(tk, TokenKind::Struct)
                || store.is_decl(tk, TokenKind::Union)
            {
                let align = arena.alloc(
                    DocKind::Align {
                        indent: 1,
                        spaces: 0,
                        tabalign: false,
                    },
                    Some(dc),
                );
                column.datums.push(RulerDatum {
                    dc: Some(align),
                    len: 0,
                    nspaces: 0,
                });
                return;
            }

            if store.has_tabs(tk) {
                column.ntabs += 1;
            }
        }

        column.len = column.len.max(len);
        column.nspaces = column.nspaces.max(nspaces);

        let align = arena.alloc(
            DocKind::Align {
                indent: 1,
                spaces: 0,
                tabalign: false,
            },
            Some(dc),
        );
        column.datums.push(RulerDatum {
            dc: Some(align),
            len,
            nspaces,
        });
    }

    /// Conditional indentation tied to the first column, applied once the
    /// column widths are known. The returned cookie may be used to
    /// withdraw the request.
    pub fn indent(&mut self, arena: &mut DocArena, parent: DocId) -> (DocId, RulerCookie) {
        self.indent_impl(arena, parent, 1)
    }

    pub fn dedent(&mut self, arena: &mut DocArena, parent: DocId) -> (DocId, RulerCookie) {
        self.indent_impl(arena, parent, -1)
    }

    fn indent_impl(
        &mut self,
        arena: &mut DocArena,
        parent: DocId,
        direction: i32,
    ) -> (DocId, RulerCookie) {
        let indent = arena.alloc(
            DocKind::Indent {
                amount: crate::doc::Indent::Amount(0),
                child: None,
            },
            Some(parent),
        );
        let concat = arena.concat(Some(indent));
        self.indents.push(RulerIndent {
            dc: indent,
            direction,
            removed: false,
        });
        (concat, RulerCookie(self.indents.len() - 1))
    }

    pub fn indent_remove(&mut self, cookie: RulerCookie) {
        self.indents[cookie.0].removed = true;
    }

    /// Compute the final alignment of every column and back patch the
    /// corresponding documents. The ruler is reset, paving the way for
    /// reuse.
    pub fn exec(&mut self, arena: &mut DocArena) {
        let mut first_width = 0;

        for column in &self.columns {
            if self.flags & ALIGN_FIXED != 0 {
                for rd in &column.datums {
                    if let Some(dc) = rd.dc {
                        arena.set_align(dc, self.align, 0, false);
                    }
                }
                continue;
            }

            // Without any existing tabs there is nothing to sense, leave
            // the single space separator in place.
            if self.flags & ALIGN_SENSE != 0 && column.ntabs == 0 {
                continue;
            }

            let tabalign = self.flags & (ALIGN_SENSE | ALIGN_TABS) != 0;
            let mut maxlen = column.len;
            if tabalign {
                // Round up the longest column to a multiple of 8.
                maxlen += 8 - (maxlen % 8);
            }
            if self.flags & ALIGN_MAX != 0 && self.align > 0 {
                maxlen = maxlen.min(self.align);
            }
            if first_width == 0 {
                first_width = maxlen;
            }

            for rd in &column.datums {
                let Some(dc) = rd.dc else {
                    continue;
                };
                if rd.len == 0 {
                    continue;
                }

                let mut indent = maxlen.saturating_sub(rd.len);
                if tabalign {
                    if indent % 8 > 0 {
                        indent += 8 - (indent % 8);
                    }
                } else if self.flags & ALIGN_MIN != 0 {
                    indent += 1;
                }
                if indent == 0 {
                    indent = 1;
                }
                indent += column.nspaces.saturating_sub(rd.nspaces);
                arena.set_align(dc, indent, 0, tabalign);
            }
        }

        for ri in &self.indents {
            let amount = if ri.removed {
                0
            } else {
                ri.direction * first_width as i32
            };
            arena.set_indent(ri.dc, amount);
        }

        self.columns.clear();
        self.indents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{exec, DocArena, ExecArgs, ExecFlags};
    use crate::lexer::TokenStore;
    use crate::options::Options;
    use crate::style::Style;

    fn render(arena: &DocArena, root: crate::doc::DocId) -> String {
        let store = TokenStore::new();
        let style = Style::defaults();
        let options = Options::default();
        exec(
            ExecArgs {
                arena,
                store: &store,
                lx: None,
                style: &style,
                options: &options,
                flags: ExecFlags::default(),
            },
            root,
        )
    }

    #[test]
    fn test_fixed_alignment() {
        let mut arena = DocArena::new();
        let store = TokenStore::new();
        let mut rl = Ruler::new(1, ALIGN_FIXED);

        let root = arena.concat(None);
        arena.literal("a", Some(root));
        rl.insert(&store, None, &mut arena, root, 1, 1, 0);
        arena.literal("\\", Some(root));
        rl.exec(&mut arena);

        assert_eq!(render(&arena, root), "a \\");
    }

    #[test]
    fn test_min_alignment() {
        let mut arena = DocArena::new();
        let store = TokenStore::new();
        let mut rl = Ruler::new(0, ALIGN_MIN);

        let root = arena.concat(None);
        let row1 = arena.concat(Some(root));
        arena.literal("short", Some(row1));
        rl.insert(&store, None, &mut arena, row1, 1, 5, 0);
        arena.literal("\\", Some(row1));
        arena.hardline(Some(root));
        let row2 = arena.concat(Some(root));
        arena.literal("longest", Some(row2));
        rl.insert(&store, None, &mut arena, row2, 1, 7, 0);
        arena.literal("\\", Some(row2));
        rl.exec(&mut arena);

        // Both backslashes end up at the same column.
        let out = render(&arena, root);
        let cols: Vec<usize> = out.lines().map(|l| l.find('\\').unwrap()).collect();
        assert_eq!(cols[0], cols[1]);
        assert_eq!(cols[1], 8);
    }
}
