mod common;

use common::{fmt, fmt_simple};

#[test]
fn format_function_implementation() {
    assert_eq!(fmt("int main(){return 0;}"), "int\nmain(void)\n{\n\treturn 0;\n}\n");
}

#[test]
fn format_plain_declarations() {
    assert_eq!(fmt("int x;\n"), "int x;\n");
    assert_eq!(fmt("int   x ;\n"), "int x;\n");
    assert_eq!(fmt("char *p;\n"), "char *p;\n");
}

#[test]
fn format_preserves_blank_line_between_declarations() {
    assert_eq!(fmt("int x;\n\nint y;\n"), "int x;\n\nint y;\n");
}

#[test]
fn format_collapses_excess_blank_lines() {
    let out = fmt("int x;\n\n\n\nint y;\n");
    assert!(!out.contains("\n\n\n"), "got {out:?}");
}

#[test]
fn format_struct_declaration() {
    assert_eq!(
        fmt("struct s { int a; int b; };"),
        "struct s {\n\tint a;\n\tint b;\n};\n"
    );
}

#[test]
fn format_enum_declaration() {
    assert_eq!(fmt("enum e { A, B };"), "enum e {\n\tA,\n\tB\n};\n");
}

#[test]
fn format_if_else() {
    assert_eq!(
        fmt("int main(){if(x)return 1;else return 0;}"),
        "int\nmain(void)\n{\n\tif (x)\n\t\treturn 1;\n\telse\n\t\treturn 0;\n}\n"
    );
}

#[test]
fn format_while_loop() {
    assert_eq!(
        fmt("int main(){while(x){y();}}"),
        "int\nmain(void)\n{\n\twhile (x) {\n\t\ty();\n\t}\n}\n"
    );
}

#[test]
fn format_function_with_arguments() {
    assert_eq!(
        fmt("void foo(int a,int b){}"),
        "void\nfoo(int a, int b)\n{\n}\n"
    );
}

#[test]
fn format_prototype() {
    assert_eq!(fmt("void foo(int a);\n"), "void foo(int a);\n");
}

#[test]
fn format_empty_argument_list_spells_void() {
    assert_eq!(fmt("void foo();\n"), "void foo(void);\n");
}

#[test]
fn format_comment_preserved() {
    let out = fmt("/* hello */\nint x;\n");
    assert!(out.starts_with("/* hello */\n"), "got {out:?}");
    assert!(out.contains("int x;"));
}

#[test]
fn format_trailing_comment_preserved() {
    let out = fmt("int x; /* c */\n");
    assert_eq!(out, "int x; /* c */\n");
}

#[test]
fn format_simplify_merges_declarations() {
    assert_eq!(
        fmt_simple("struct s { int a; int b; };"),
        "struct s {\n\tint a, b;\n};\n"
    );
}

#[test]
fn format_simplify_sorts_merged_variables() {
    assert_eq!(
        fmt_simple("struct s { int b; int a; };"),
        "struct s {\n\tint a, b;\n};\n"
    );
}

#[test]
fn format_simplify_switch_default() {
    assert_eq!(
        fmt_simple("switch(x){default:;}"),
        "switch (x) {\ndefault:\n\tbreak;\n}\n"
    );
}

#[test]
fn format_simplify_implicit_int() {
    assert_eq!(fmt_simple("unsigned x;\n"), "unsigned int x;\n");
}

#[test]
fn format_simplify_forward_declarations() {
    assert_eq!(
        fmt_simple("struct b;\nstruct a;\n"),
        "struct a;\nstruct b;\n"
    );
}

#[test]
fn format_goto_and_label() {
    let out = fmt("int main(){goto out;out: return 0;}");
    assert!(out.contains("goto out;"), "got {out:?}");
    assert!(out.contains("out:"), "got {out:?}");
}

#[test]
fn format_switch_cases_not_indented() {
    let out = fmt("int main(){\nswitch (x) {\ncase 1:\ny();\nbreak;\n}\n}");
    assert!(out.contains("\tswitch (x) {\n\tcase 1:\n\t\ty();"), "got {out:?}");
}

#[test]
fn format_no_more_than_two_consecutive_newlines() {
    let out = fmt("int a;\n\n\n\nint b;\n\n\nint c;\n");
    assert!(!out.contains("\n\n\n"), "got {out:?}");
}

#[test]
fn format_long_condition_breaks() {
    let src = "int main(){if (aaaaaaaaaaaaaaaaaaaa && bbbbbbbbbbbbbbbbbbbb && cccccccccccccccccccc && dddddddddddddddddddd)\nreturn 1;}";
    let out = fmt(src);
    for line in out.lines() {
        let width: usize = line
            .chars()
            .map(|c| if c == '\t' { 8 } else { 1 })
            .sum();
        assert!(width <= 80, "line exceeds limit: {line:?}");
    }
}

#[test]
fn format_idempotent() {
    let sources = [
        "int main(){return 0;}",
        "struct s { int a; int b; };",
        "int x;\n\nint y;\n",
        "void foo(int a,int b){if(a)bar();}",
        "enum e { A, B };",
    ];
    for src in sources {
        let once = fmt(src);
        let twice = fmt(&once);
        assert_eq!(once, twice, "not idempotent for {src:?}");
    }
}
