//! Sorting and regrouping of include directives.

use std::collections::BTreeMap;

use crate::lexer::{Lexer, TokenFlags, TokenId, TokenKind};
use crate::options::Options;
use crate::style::{IncludePriority, Keyword, Style, StyleKey};

struct Include {
    tk: TokenId,
    path: String,
    priority: IncludePriority,
}

/// Sort runs of include directives according to the configured style. Runs
/// live inside the prefix trivia of main tokens, separated by blank lines
/// unless merging or regrouping is requested.
pub fn sort(lx: &mut Lexer, style: &Style, options: &Options) {
    if style.keyword(StyleKey::SortIncludes) == Keyword::Never {
        return;
    }

    let mut cur = lx.store().first();
    while let Some(tk) = cur {
        sort_prefixes(lx, style, options, tk);
        cur = lx.store().next(tk);
    }
}

fn sort_prefixes(lx: &mut Lexer, style: &Style, options: &Options, tk: TokenId) {
    let blocks = style.keyword(StyleKey::IncludeBlocks);
    let regroup = blocks == Keyword::Regroup;
    let merge = blocks == Keyword::Merge;
    let prefixes = lx.store()[tk].prefixes.clone();

    let mut out: Vec<TokenId> = Vec::with_capacity(prefixes.len());
    let mut run: Vec<TokenId> = vec![];

    for prefix in prefixes {
        if lx.store()[prefix].kind == TokenKind::CppInclude {
            run.push(prefix);
            // A blank line ends the run unless blocks are merged.
            if !regroup && !merge && lx.store().has_verbatim_line(prefix, 2) {
                exec_run(lx, style, options, &mut run, &mut out, regroup);
            }
        } else {
            exec_run(lx, style, options, &mut run, &mut out, regroup);
            out.push(prefix);
        }
    }
    exec_run(lx, style, options, &mut run, &mut out, regroup);

    lx.store_mut()[tk].prefixes = out;
}

/// Emit one run of includes in sorted order into the prefix list.
fn exec_run(
    lx: &mut Lexer,
    style: &Style,
    options: &Options,
    run: &mut Vec<TokenId>,
    out: &mut Vec<TokenId>,
    regroup: bool,
) {
    if run.len() < 2 {
        out.append(run);
        return;
    }

    // Leave diff untouched regions alone.
    if options.diff_parse
        && run
            .iter()
            .any(|&tk| !lx.store()[tk].flags.intersects(TokenFlags::DIFF))
    {
        out.append(run);
        return;
    }

    let path = lx.path().to_string();
    let case_sensitive = style.keyword(StyleKey::SortIncludes) != Keyword::CaseInsensitive;
    let had_line = lx.store().has_verbatim_line(*run.last().unwrap(), 2);

    let mut includes = Vec::with_capacity(run.len());
    let mut nbrackets = 0;
    let mut nquotes = 0;
    let mut nslashes = 0;
    for (i, &tk) in run.iter().enumerate() {
        let Some(include_path) = find_path(&lx.store()[tk].text) else {
            out.append(run);
            return;
        };

        let mut priority = IncludePriority::default();
        if regroup {
            if !crate::style::is_main_include(&include_path, &path) {
                priority = style.include_priority(&include_path, &path);
            }
        } else {
            if include_path.starts_with('<') {
                nbrackets += 1;
            }
            if include_path.starts_with('"') {
                nquotes += 1;
            }
            if include_path.contains('/') {
                nslashes += 1;
            }
            // Mixing styles, not safe to reorder.
            if (nbrackets > 0 && nquotes > 0) || (nbrackets > 0 && nslashes > 0) {
                out.append(run);
                return;
            }

            // Allow the main include to come first.
            if i == 0 && crate::style::is_main_include(&include_path, &path) {
                priority.sort = -1;
            }
        }

        includes.push(Include {
            tk,
            path: include_path,
            priority,
        });
    }
    run.clear();

    let mut groups: BTreeMap<i32, Vec<Include>> = BTreeMap::new();
    for include in includes {
        groups.entry(include.priority.group).or_default().push(include);
    }

    let ngroups = groups.len();
    for (i, (_, mut group)) in groups.into_iter().enumerate() {
        group.sort_by(|a, b| {
            a.priority.sort.cmp(&b.priority.sort).then_with(|| {
                if case_sensitive {
                    a.path.cmp(&b.path)
                } else {
                    a.path.to_lowercase().cmp(&b.path.to_lowercase())
                }
            })
        });

        let len = group.len();
        for (j, include) in group.into_iter().enumerate() {
            let last_of_group = j + 1 == len;
            let last = i + 1 == ngroups && last_of_group;
            let doline = if regroup {
                // A blank line between every group, the trailing blank
                // only when present before.
                (last_of_group && !last) || (last && had_line)
            } else {
                last && had_line
            };
            set_trailing_lines(lx, include.tk, if doline { 2 } else { 1 });
            out.push(include.tk);
        }
    }
}

/// Extract the path of an include directive, delimiters included.
fn find_path(text: &str) -> Option<String> {
    let start = text.find(['"', '<'])?;
    let open = text.as_bytes()[start];
    let close = if open == b'"' { '"' } else { '>' };
    let end = text[start + 1..].find(close)?;
    Some(text[start..start + 2 + end].to_string())
}

/// Normalize the number of trailing new lines of a directive.
fn set_trailing_lines(lx: &mut Lexer, tk: TokenId, nlines: usize) {
    let text = &mut lx.store_mut()[tk].text;
    while text.ends_with('\n') {
        text.pop();
    }
    for _ in 0..nlines {
        text.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;

    fn includes_of(src: &str, config: &str, path: &str) -> Vec<String> {
        let mut diags = Diagnostics::new();
        let style = Style::from_config(Some(config), ".clang-format", &mut diags);
        let mut lx = Lexer::new(src, path, vec![], &Options::default()).unwrap();
        sort(&mut lx, &style, &Options::default());

        let mut out = vec![];
        let mut cur = lx.store().first();
        while let Some(tk) = cur {
            for &p in &lx.store()[tk].prefixes {
                if lx.store()[p].kind == TokenKind::CppInclude {
                    out.push(lx.store()[p].text.clone());
                }
            }
            cur = lx.store().next(tk);
        }
        out
    }

    #[test]
    fn test_sort_case_sensitive() {
        let out = includes_of(
            "#include \"b.h\"\n#include \"a.h\"\nint x;\n",
            "SortIncludes: CaseSensitive\n",
            "x.c",
        );
        assert_eq!(out, vec!["#include \"a.h\"\n", "#include \"b.h\"\n"]);
    }

    #[test]
    fn test_blank_line_preserves_runs() {
        let out = includes_of(
            "#include \"d.h\"\n#include \"c.h\"\n\n#include \"b.h\"\n#include \"a.h\"\nint x;\n",
            "SortIncludes: CaseSensitive\n",
            "x.c",
        );
        assert_eq!(
            out,
            vec![
                "#include \"c.h\"\n",
                "#include \"d.h\"\n\n",
                "#include \"a.h\"\n",
                "#include \"b.h\"\n"
            ]
        );
    }

    #[test]
    fn test_main_include_first() {
        let out = includes_of(
            "#include \"x.h\"\n#include \"a.h\"\nint x;\n",
            "SortIncludes: CaseSensitive\n",
            "x.c",
        );
        assert_eq!(out, vec!["#include \"x.h\"\n", "#include \"a.h\"\n"]);
    }

    #[test]
    fn test_regroup() {
        let out = includes_of(
            "#include \"z.h\"\n#include <sys/types.h>\n#include <stdio.h>\nint x;\n",
            "SortIncludes: CaseSensitive\nIncludeBlocks: Regroup\nIncludeCategories:\n  - Regex: '^<sys/'\n    Priority: 1\n  - Regex: '^<'\n    Priority: 2\n",
            "x.c",
        );
        assert_eq!(
            out,
            vec![
                "#include <sys/types.h>\n\n",
                "#include <stdio.h>\n\n",
                "#include \"z.h\"\n"
            ]
        );
    }

    #[test]
    fn test_mixed_styles_untouched() {
        let out = includes_of(
            "#include <z.h>\n#include \"a.h\"\nint x;\n",
            "SortIncludes: CaseSensitive\n",
            "x.c",
        );
        assert_eq!(out, vec!["#include <z.h>\n", "#include \"a.h\"\n"]);
    }
}
