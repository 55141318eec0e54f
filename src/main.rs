use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as CliParser;
use log::LevelFilter;

use cfmt::diff::{self, DiffChunk};
use cfmt::error::Diagnostics;
use cfmt::options::Options;
use cfmt::parser;
use cfmt::style::Style;

/// An opinionated formatter for C source code following the BSD kernel
/// normal form, driven by a subset of the clang-format configuration.
#[derive(CliParser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Emit a unified diff instead of the formatted source.
    #[arg(short = 'd')]
    diff: bool,

    /// Read a unified diff from stdin and only format the touched lines.
    #[arg(short = 'D', conflicts_with = "files")]
    diff_parse: bool,

    /// Write the result back to the given file(s).
    #[arg(short = 'i')]
    in_place: bool,

    /// Enable the simplification passes.
    #[arg(short = 's')]
    simple: bool,

    /// Increase verbosity, can be repeated.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .is_err()
    {
        eprintln!("cfmt: failed to initialize logging");
    }

    let options = Options {
        diff: cli.diff,
        diff_parse: cli.diff_parse,
        in_place: cli.in_place,
        simple: cli.simple,
        verbose: cli.verbose,
        test: false,
    };

    match run(&cli, &options) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("cfmt: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, options: &Options) -> anyhow::Result<bool> {
    let mut diags = Diagnostics::new();
    let style = load_style(&mut diags);
    diags.flush();

    let mut error = false;

    if options.diff_parse {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading diff from stdin")?;
        let files = diff::parse(&input);
        let mut paths: Vec<&String> = files.keys().collect();
        paths.sort();
        for path in paths {
            let chunks = files.get(path).cloned().unwrap_or_default();
            if chunks.is_empty() {
                continue;
            }
            if format_file(Path::new(path), &style, options, chunks)? {
                error = true;
            }
        }
        return Ok(error);
    }

    if cli.files.is_empty() {
        let mut src = String::new();
        std::io::stdin()
            .read_to_string(&mut src)
            .context("reading source from stdin")?;
        return format_source(&src, "/dev/stdin", None, &style, options, vec![]);
    }

    for path in &cli.files {
        if format_file(path, &style, options, vec![])? {
            error = true;
        }
    }
    Ok(error)
}

fn format_file(
    path: &Path,
    style: &Style,
    options: &Options,
    chunks: Vec<DiffChunk>,
) -> anyhow::Result<bool> {
    let src = match fs::read_to_string(path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("cfmt: {}: {err}", path.display());
            return Ok(true);
        }
    };
    let name = path.display().to_string();
    format_source(&src, &name, Some(path), style, options, chunks)
}

fn format_source(
    src: &str,
    name: &str,
    path: Option<&Path>,
    style: &Style,
    options: &Options,
    chunks: Vec<DiffChunk>,
) -> anyhow::Result<bool> {
    let (out, mut diags) = match parser::format(src, name, style, options, chunks) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("cfmt: {name}: {err}");
            return Ok(true);
        }
    };
    let failed = !diags.is_empty();
    diags.flush();

    if options.diff {
        if src == out {
            return Ok(failed);
        }
        print!("{}", unified_diff(src, &out, name));
        return Ok(true);
    }

    if options.in_place {
        if src == out {
            return Ok(failed);
        }
        let path = path.context("in place replacement requires a file")?;
        write_in_place(path, &out)?;
        return Ok(failed);
    }

    print!("{out}");
    Ok(failed)
}

/// Atomically replace the file, matching what clang-format does.
fn write_in_place(path: &Path, out: &str) -> anyhow::Result<()> {
    let tmp = path.with_extension("cfmt.tmp");
    fs::write(&tmp, out).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming over {}", path.display()))?;
    Ok(())
}

/// Locate the closest clang-format configuration, searching the current
/// directory and its ancestors.
fn load_style(diags: &mut Diagnostics) -> Style {
    let mut dir = std::env::current_dir().ok();
    while let Some(cur) = dir {
        let candidate = cur.join(".clang-format");
        if let Ok(config) = fs::read_to_string(&candidate) {
            return Style::from_config(Some(&config), &candidate.display().to_string(), diags);
        }
        dir = cur.parent().map(Path::to_path_buf);
    }
    Style::from_config(None, ".clang-format", diags)
}

/// A minimal unified diff, collapsing the changed region into one hunk.
fn unified_diff(src: &str, dst: &str, path: &str) -> String {
    let a: Vec<&str> = src.lines().collect();
    let b: Vec<&str> = dst.lines().collect();

    let mut prefix = 0;
    while prefix < a.len() && prefix < b.len() && a[prefix] == b[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < a.len() - prefix
        && suffix < b.len() - prefix
        && a[a.len() - 1 - suffix] == b[b.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let mut out = String::new();
    out.push_str(&format!("--- {path}.orig\n+++ {path}\n"));
    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        prefix + 1,
        a.len() - prefix - suffix,
        prefix + 1,
        b.len() - prefix - suffix
    ));
    for line in &a[prefix..a.len() - suffix] {
        out.push_str(&format!("-{line}\n"));
    }
    for line in &b[prefix..b.len() - suffix] {
        out.push_str(&format!("+{line}\n"));
    }
    out
}
