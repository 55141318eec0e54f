//! Formatting of preprocessor directives, limited to alignment of line
//! continuations.

pub mod include;
pub mod include_guard;

use crate::doc::{self, DocArena, ExecArgs, ExecFlags};
use crate::lexer::TokenStore;
use crate::options::Options;
use crate::ruler::{Ruler, ALIGN_FIXED, ALIGN_MAX, ALIGN_MIN, ALIGN_TABS};
use crate::style::{Keyword, Style, StyleKey};

#[derive(Debug, Clone, Copy)]
struct Alignment {
    mode: Keyword,
    width: u32,
    tabs: bool,
    skip_first_line: bool,
}

/// Align the continuation backslashes of a preprocessor directive. Returns
/// nothing if the directive spans a single line in which case it is emitted
/// as is.
pub fn align(text: &str, style: &Style, options: &Options) -> Option<String> {
    let mut alignment = Alignment {
        mode: style.keyword(StyleKey::AlignEscapedNewlines),
        width: style
            .column_limit()
            .saturating_sub(style.indent_width())
            .min(style.column_limit()),
        tabs: style.use_tabs(),
        skip_first_line: false,
    };

    let lines = continuation_lines(text);
    if lines.len() <= 1 {
        return None;
    }

    if let Some(sensed) = sense_alignment(&lines, style) {
        alignment = sensed;
    }

    let mut rl = match alignment.mode {
        Keyword::DontAlign => Ruler::new(1, ALIGN_FIXED),
        Keyword::Left => Ruler::new(0, if alignment.tabs { ALIGN_TABS } else { ALIGN_MIN }),
        Keyword::Right => Ruler::new(
            alignment.width,
            ALIGN_MAX | if alignment.tabs { ALIGN_TABS } else { 0 },
        ),
        _ => return None,
    };

    let store = TokenStore::new();
    let mut arena = DocArena::new();
    let root = arena.concat(None);

    for (i, line) in lines.iter().enumerate() {
        let concat = arena.concat(Some(root));
        if !line.content.is_empty() {
            arena.literal(line.content, Some(concat));
        }
        if i == 0 && alignment.skip_first_line {
            arena.literal(" ", Some(concat));
        } else {
            rl.insert(&store, None, &mut arena, concat, 1, line.width, 0);
        }
        arena.literal("\\", Some(concat));
        arena.hardline(Some(concat));
    }
    if let Some(tail) = tail(text) {
        arena.literal(tail, Some(root));
    }

    rl.exec(&mut arena);
    let out = doc::exec(
        ExecArgs {
            arena: &arena,
            store: &store,
            lx: None,
            style,
            options,
            flags: ExecFlags::default(),
        },
        root,
    );
    Some(out)
}

struct ContinuationLine<'a> {
    /// Line content up to the continuation, trailing whitespace excluded.
    content: &'a str,
    /// Column width of the content.
    width: u32,
    /// Whitespace between the content and the backslash.
    gap: &'a str,
}

fn continuation_lines(text: &str) -> Vec<ContinuationLine<'_>> {
    let mut lines = vec![];
    for line in text.split_inclusive('\n') {
        let Some(stripped) = line.strip_suffix("\\\n") else {
            break;
        };
        let content = stripped.trim_end_matches([' ', '\t']);
        let gap = &stripped[content.len()..];
        lines.push(ContinuationLine {
            content,
            width: colwidth(content),
            gap,
        });
    }
    lines
}

/// Everything after the last continuation.
fn tail(text: &str) -> Option<&str> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if !line.ends_with("\\\n") {
            break;
        }
        offset += line.len();
    }
    let tail = &text[offset..];
    (!tail.is_empty()).then_some(tail)
}

fn colwidth(text: &str) -> u32 {
    let mut w = 0;
    for ch in text.chars() {
        match ch {
            '\t' => w += 8 - (w % 8),
            '\n' => w = 0,
            _ => w += 1,
        }
    }
    w
}

/// Examine the existing alignment of the first few lines and honor it when
/// consistent.
fn sense_alignment(lines: &[ContinuationLine<'_>], style: &Style) -> Option<Alignment> {
    let maxcol = style.column_limit();
    let sample: Vec<&ContinuationLine<'_>> = lines.iter().take(3).collect();

    let backslash_col = |line: &ContinuationLine<'_>| -> u32 { colwidth(line.content) + colwidth(line.gap) };
    let not_aligned = |line: &ContinuationLine<'_>| line.gap == " ";

    if sample.iter().any(|l| backslash_col(l) > maxcol) {
        return None;
    }

    if sample.iter().all(|l| not_aligned(l)) {
        return Some(Alignment {
            mode: Keyword::DontAlign,
            width: 0,
            tabs: false,
            skip_first_line: false,
        });
    }

    // The first line is allowed to not be aligned.
    if sample.len() >= 3 {
        let rest = &sample[1..];
        let identical = rest
            .windows(2)
            .all(|w| backslash_col(w[0]) == backslash_col(w[1]));
        if identical {
            let last = rest[rest.len() - 1];
            return Some(Alignment {
                mode: Keyword::Right,
                width: backslash_col(last),
                tabs: last.gap.contains('\t'),
                skip_first_line: not_aligned(sample[0]),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;

    #[test]
    fn test_single_line_untouched() {
        let style = Style::defaults();
        assert!(align("#define FOO 1\n", &style, &Options::default()).is_none());
    }

    #[test]
    fn test_dont_align() {
        let mut diags = Diagnostics::new();
        let style = Style::from_config(
            Some("AlignEscapedNewlines: DontAlign\n"),
            ".clang-format",
            &mut diags,
        );
        let out = align(
            "#define FOO \\\n\tbar() \\\n\tbaz()\n",
            &style,
            &Options::default(),
        )
        .unwrap();
        assert_eq!(out, "#define FOO \\\n\tbar() \\\n\tbaz()\n");
    }

    #[test]
    fn test_left_align() {
        let mut diags = Diagnostics::new();
        let style = Style::from_config(
            Some("AlignEscapedNewlines: Left\nUseTab: Never\n"),
            ".clang-format",
            &mut diags,
        );
        let out = align(
            "#define FOO \\\n\tlong_line() \\\n\tx()\n",
            &style,
            &Options::default(),
        )
        .unwrap();
        for line in out.lines().take(2) {
            assert!(line.ends_with('\\'));
        }
        let cols: Vec<usize> = out
            .lines()
            .filter(|l| l.ends_with('\\'))
            .map(|l| colwidth(&l[..l.len() - 1]) as usize)
            .collect();
        assert!(cols.windows(2).all(|w| w[0] == w[1]));
    }
}
