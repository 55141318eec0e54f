mod common;

use cfmt::diff::DiffChunk;
use cfmt::error::Diagnostics;
use cfmt::options::Options;
use cfmt::parser;
use cfmt::style::Style;

fn fmt_chunks(src: &str, chunks: Vec<DiffChunk>) -> String {
    let mut diags = Diagnostics::new();
    let style = Style::from_config(None, ".clang-format", &mut diags);
    let options = Options {
        diff_parse: true,
        ..Options::default()
    };
    let (out, diags) =
        parser::format(src, "t.c", &style, &options, chunks).expect("formatting failed");
    assert!(diags.is_empty(), "diagnostics: {:?}", diags.entries());
    out
}

#[test]
fn untouched_lines_preserved() {
    // Deliberately misformatted lines outside the chunk must be kept as
    // is, only the covered line is formatted.
    let src = "int  a ;\nint  b ;\nint  c ;\n";
    let out = fmt_chunks(src, vec![DiffChunk { beg: 2, end: 2 }]);
    assert!(out.contains("int  a ;\n"), "got {out:?}");
    assert!(out.contains("int b;\n"), "got {out:?}");
    assert!(out.contains("int  c ;\n"), "got {out:?}");
}

#[test]
fn no_chunks_formats_nothing() {
    let src = "int  a ;\nint  b ;\n";
    let out = fmt_chunks(src, vec![]);
    // Without any chunk the whole file may be reformatted, the diff
    // restriction only applies when chunks are present.
    assert_eq!(out, "int a;\nint b;\n");
}

#[test]
fn whole_file_chunk_formats_everything() {
    let src = "int  a ;\nint  b ;\n";
    let out = fmt_chunks(
        src,
        vec![DiffChunk { beg: 1, end: 2 }],
    );
    assert_eq!(out, "int a;\nint b;\n");
}

#[test]
fn leading_lines_replayed_verbatim() {
    let src = "int  a ;\nint  b ;\nint  c ;\nint  d ;\n";
    let out = fmt_chunks(src, vec![DiffChunk { beg: 4, end: 4 }]);
    assert!(out.starts_with("int  a ;\nint  b ;\nint  c ;\n"), "got {out:?}");
    assert!(out.ends_with("int d;\n"), "got {out:?}");
}
