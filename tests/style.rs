mod common;

use common::{fmt, fmt_config};

#[test]
fn indent_width_and_spaces() {
    let out = fmt_config("int main(){return 0;}", "IndentWidth: 4\nUseTab: Never\n");
    assert_eq!(out, "int\nmain(void)\n{\n    return 0;\n}\n");
}

#[test]
fn tabs_by_default() {
    let out = fmt("int main(){return 0;}");
    assert!(out.contains("\treturn 0;"), "got {out:?}");
}

#[test]
fn brace_after_function_attached() {
    let out = fmt_config(
        "int main(){return 0;}",
        "BreakBeforeBraces: Custom\nBraceWrapping:\n  AfterFunction: false\n",
    );
    assert_eq!(out, "int\nmain(void) {\n\treturn 0;\n}\n");
}

#[test]
fn brace_after_struct() {
    let out = fmt_config(
        "struct s { int a; };",
        "BreakBeforeBraces: Custom\nBraceWrapping:\n  AfterStruct: true\n",
    );
    assert_eq!(out, "struct s\n{\n\tint a;\n};\n");
}

#[test]
fn return_type_break_none() {
    let out = fmt_config("int main(){return 0;}", "AlwaysBreakAfterReturnType: None\n");
    assert!(out.starts_with("int main(void)"), "got {out:?}");
}

#[test]
fn column_limit_zero_is_unlimited() {
    let long = "int main(){foo(aaaaaaaaaaaaaaaaaaaaaaaa, bbbbbbbbbbbbbbbbbbbbbbbb, cccccccccccccccccccccccc, dddddddddddddddddddddddd);}";
    let out = fmt_config(long, "ColumnLimit: 0\n");
    assert!(
        out.contains("foo(aaaaaaaaaaaaaaaaaaaaaaaa, bbbbbbbbbbbbbbbbbbbbbbbb"),
        "got {out:?}"
    );
}
