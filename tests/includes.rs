mod common;

use common::fmt_with;

#[test]
fn sort_includes() {
    let out = fmt_with(
        "#include \"b.h\"\n#include \"a.h\"\n",
        "t.c",
        "SortIncludes: CaseSensitive\n",
        false,
    );
    assert_eq!(out, "#include \"a.h\"\n#include \"b.h\"\n");
}

#[test]
fn sort_includes_within_blocks_only() {
    let out = fmt_with(
        "#include \"d.h\"\n#include \"c.h\"\n\n#include \"b.h\"\n#include \"a.h\"\n",
        "t.c",
        "SortIncludes: CaseSensitive\n",
        false,
    );
    assert_eq!(
        out,
        "#include \"c.h\"\n#include \"d.h\"\n\n#include \"a.h\"\n#include \"b.h\"\n"
    );
}

#[test]
fn sort_includes_case_insensitive() {
    let out = fmt_with(
        "#include \"B.h\"\n#include \"a.h\"\n",
        "t.c",
        "SortIncludes: CaseInsensitive\n",
        false,
    );
    assert_eq!(out, "#include \"a.h\"\n#include \"B.h\"\n");
}

#[test]
fn sort_includes_never_by_default() {
    let out = fmt_with("#include \"b.h\"\n#include \"a.h\"\n", "t.c", "", false);
    assert_eq!(out, "#include \"b.h\"\n#include \"a.h\"\n");
}

#[test]
fn main_include_stays_first() {
    let out = fmt_with(
        "#include \"t.h\"\n#include \"a.h\"\n",
        "sub/t.c",
        "SortIncludes: CaseSensitive\n",
        false,
    );
    assert_eq!(out, "#include \"t.h\"\n#include \"a.h\"\n");
}

#[test]
fn regroup_includes() {
    let config = "SortIncludes: CaseSensitive\nIncludeBlocks: Regroup\nIncludeCategories:\n  - Regex: '^<sys/'\n    Priority: 1\n  - Regex: '^<'\n    Priority: 2\n";
    let out = fmt_with(
        "#include \"z.h\"\n#include <stdio.h>\n#include <sys/types.h>\nint x;\n",
        "t.c",
        config,
        false,
    );
    assert_eq!(
        out,
        "#include <sys/types.h>\n\n#include <stdio.h>\n\n#include \"z.h\"\nint x;\n"
    );
}

#[test]
fn regroup_puts_main_include_first() {
    let config = "SortIncludes: CaseSensitive\nIncludeBlocks: Regroup\n";
    let out = fmt_with(
        "#include <stdio.h>\n#include \"t.h\"\n",
        "t.c",
        config,
        false,
    );
    assert!(
        out.starts_with("#include \"t.h\"\n"),
        "main include not first: {out:?}"
    );
}
