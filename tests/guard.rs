mod common;

use common::fmt_with;

#[test]
fn guard_empty_header() {
    let out = fmt_with("", "foo.h", "IncludeGuards: 1\n", false);
    assert_eq!(out, "#ifndef FOO_H\n#define FOO_H\n\n#endif /* !FOO_H */\n");
}

#[test]
fn guard_header_with_content() {
    let out = fmt_with("struct s;\n", "foo.h", "IncludeGuards: 1\n", false);
    assert!(out.starts_with("#ifndef FOO_H\n#define FOO_H\n"), "got {out:?}");
    assert!(out.contains("struct s;"), "got {out:?}");
    assert!(out.ends_with("#endif /* !FOO_H */\n"), "got {out:?}");
}

#[test]
fn guard_matching_left_alone() {
    let src = "#ifndef FOO_H\n#define FOO_H\n\n#endif /* !FOO_H */\n";
    let out = fmt_with(src, "foo.h", "IncludeGuards: 1\n", false);
    assert_eq!(out, src);
}

#[test]
fn guard_only_headers() {
    let out = fmt_with("int x;\n", "foo.c", "IncludeGuards: 1\n", false);
    assert_eq!(out, "int x;\n");
}

#[test]
fn guard_disabled_by_default() {
    let out = fmt_with("int x;\n", "foo.h", "", false);
    assert_eq!(out, "int x;\n");
}

#[test]
fn guard_dashes_become_underscores() {
    let out = fmt_with("", "a-b.h", "IncludeGuards: 1\n", false);
    assert!(out.starts_with("#ifndef A_B_H\n"), "got {out:?}");
}
