//! Parser for the YAML subset used by clang-format configuration files.
//!
//! Only a small slice of YAML is understood: scalar mappings, one level of
//! nesting, sequences of mappings and multiple documents. Indentation is
//! not significant, nested scopes end at the first key belonging to the
//! outer scope, which matches how clang-format configurations are laid
//! out in practice.

use regex::Regex;

use crate::error::Diagnostics;

use super::{IncludeCategory, Keyword, Style, StyleKey};

#[derive(Debug, Clone, PartialEq, Eq)]
enum YamlToken {
    Word(String),
    Int(i64),
    Str(String),
    Colon,
    Dash,
    DocumentBegin,
    DocumentEnd,
}

struct YamlParser<'a> {
    tokens: Vec<YamlToken>,
    pos: usize,
    path: &'a str,
    diags: &'a mut Diagnostics,
}

pub(super) fn parse(st: &mut Style, config: &str, path: &str, diags: &mut Diagnostics) {
    let tokens = scan(config, path, diags);
    let mut pr = YamlParser {
        tokens,
        pos: 0,
        path,
        diags,
    };

    while !pr.done() {
        if pr.eat(&YamlToken::DocumentBegin) || pr.eat(&YamlToken::DocumentEnd) {
            continue;
        }

        // Only honor documents applicable to all languages or C++ which
        // covers C as well.
        if let Some(language) = pr.document_language() {
            if language != "Cpp" {
                pr.skip_document();
                continue;
            }
        }

        if !pr.parse_option(st) {
            pr.recover();
        }
    }
}

fn scan(config: &str, path: &str, diags: &mut Diagnostics) -> Vec<YamlToken> {
    let mut tokens = vec![];

    for line in config.lines() {
        let mut rest = line;
        while !rest.is_empty() {
            rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with('#') {
                break;
            }

            if let Some(stripped) = rest.strip_prefix("---") {
                tokens.push(YamlToken::DocumentBegin);
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("...") {
                tokens.push(YamlToken::DocumentEnd);
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix(':') {
                tokens.push(YamlToken::Colon);
                rest = stripped;
            } else if rest.starts_with('\'') {
                let inner = &rest[1..];
                match inner.find('\'') {
                    Some(end) => {
                        tokens.push(scalar(&inner[..end]));
                        rest = &inner[end + 1..];
                    }
                    None => {
                        diags.push(path, 0, 0, "unterminated string in configuration");
                        rest = "";
                    }
                }
            } else if rest.starts_with('-')
                && !rest[1..].starts_with(|c: char| c.is_ascii_digit())
            {
                tokens.push(YamlToken::Dash);
                rest = &rest[1..];
            } else {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == ':')
                    .unwrap_or(rest.len());
                let (word, stripped) = rest.split_at(end.max(1));
                match parse_integer(word) {
                    Some(Ok(n)) => tokens.push(YamlToken::Int(n)),
                    Some(Err(())) => {
                        diags.push(path, 0, 0, &format!("integer {word} too large"));
                        tokens.push(YamlToken::Word(word.to_string()));
                    }
                    None => tokens.push(YamlToken::Word(word.to_string())),
                }
                rest = stripped;
            }
        }
    }

    tokens
}

/// Quoted scalars are either regular expressions or quoted integers.
fn scalar(text: &str) -> YamlToken {
    match parse_integer(text) {
        Some(Ok(n)) => YamlToken::Int(n),
        _ => YamlToken::Str(text.to_string()),
    }
}

fn parse_integer(word: &str) -> Option<Result<i64, ()>> {
    let digits = word.strip_prefix('-').unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match word.parse::<i64>() {
        Ok(n) if i32::try_from(n).is_ok() => Some(Ok(n)),
        _ => Some(Err(())),
    }
}

impl YamlParser<'_> {
    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&YamlToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<YamlToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &YamlToken) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(YamlToken::Word(w)) if w == word => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(YamlToken::Word(w)) => Some(w.as_str()),
            _ => None,
        }
    }

    /// Scan ahead for a `Language` directive within the current document.
    fn document_language(&self) -> Option<String> {
        let mut pos = self.pos;
        while let Some(tok) = self.tokens.get(pos) {
            match tok {
                YamlToken::DocumentBegin | YamlToken::DocumentEnd => break,
                YamlToken::Word(w) if w == "Language" => {
                    if let (Some(YamlToken::Colon), Some(YamlToken::Word(value))) =
                        (self.tokens.get(pos + 1), self.tokens.get(pos + 2))
                    {
                        return Some(value.clone());
                    }
                    break;
                }
                _ => {}
            }
            pos += 1;
        }
        None
    }

    fn skip_document(&mut self) {
        while let Some(tok) = self.peek() {
            if matches!(tok, YamlToken::DocumentBegin | YamlToken::DocumentEnd) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skip the value of an unknown option, covering both scalars and
    /// sequences. Best effort, trying to continue parsing.
    fn recover(&mut self) {
        let key = self.next();
        if let Some(YamlToken::Word(key)) = key {
            self.diags
                .push(self.path, 0, 0, &format!("unknown option {key}"));
        }
        self.eat(&YamlToken::Colon);
        if self.peek() == Some(&YamlToken::Dash) {
            while self.eat(&YamlToken::Dash) {
                while let Some(tok) = self.peek() {
                    if matches!(tok, YamlToken::Dash | YamlToken::DocumentBegin) {
                        break;
                    }
                    self.pos += 1;
                }
            }
        } else {
            self.next();
        }
    }

    fn parse_option(&mut self, st: &mut Style) -> bool {
        let Some(key) = self.peek_word().map(str::to_string) else {
            return false;
        };

        match key.as_str() {
            "BasedOnStyle" => {
                self.pos += 1;
                if !self.eat(&YamlToken::Colon) {
                    return false;
                }
                let Some(base) = self.keyword() else {
                    return false;
                };
                st.reset_to_base(base, self.path, self.diags);
                true
            }
            "Language" => {
                self.pos += 1;
                self.eat(&YamlToken::Colon);
                self.next();
                true
            }
            "AlignAfterOpenBracket" => self.parse_enum(
                st,
                StyleKey::AlignAfterOpenBracket,
                &[
                    Keyword::Align,
                    Keyword::DontAlign,
                    Keyword::AlwaysBreak,
                    Keyword::BlockIndent,
                ],
            ),
            "AlignEscapedNewlines" => self.parse_enum(
                st,
                StyleKey::AlignEscapedNewlines,
                &[Keyword::DontAlign, Keyword::Left, Keyword::Right],
            ),
            "AlignOperands" => self.parse_enum(
                st,
                StyleKey::AlignOperands,
                &[
                    Keyword::Align,
                    Keyword::DontAlign,
                    Keyword::AlignAfterOperator,
                    Keyword::True,
                    Keyword::False,
                ],
            ),
            "AlwaysBreakAfterReturnType" => self.parse_enum(
                st,
                StyleKey::AlwaysBreakAfterReturnType,
                &[
                    Keyword::None,
                    Keyword::All,
                    Keyword::TopLevel,
                    Keyword::AllDefinitions,
                    Keyword::TopLevelDefinitions,
                ],
            ),
            "BitFieldColonSpacing" => self.parse_enum(
                st,
                StyleKey::BitFieldColonSpacing,
                &[
                    Keyword::Both,
                    Keyword::None,
                    Keyword::Before,
                    Keyword::After,
                ],
            ),
            "BreakBeforeBinaryOperators" => self.parse_enum(
                st,
                StyleKey::BreakBeforeBinaryOperators,
                &[Keyword::None, Keyword::NonAssignment, Keyword::All],
            ),
            "BreakBeforeBraces" => self.parse_enum(
                st,
                StyleKey::BreakBeforeBraces,
                &[
                    Keyword::Attach,
                    Keyword::Linux,
                    Keyword::Mozilla,
                    Keyword::Stroustrup,
                    Keyword::Allman,
                    Keyword::Whitesmiths,
                    Keyword::Gnu,
                    Keyword::WebKit,
                    Keyword::Custom,
                ],
            ),
            "BreakBeforeTernaryOperators" => {
                self.parse_bool(st, StyleKey::BreakBeforeTernaryOperators)
            }
            "ColumnLimit" => self.parse_integer_option(st, StyleKey::ColumnLimit, 0),
            "ContinuationIndentWidth" => {
                self.parse_integer_option(st, StyleKey::ContinuationIndentWidth, 0)
            }
            "IncludeBlocks" => self.parse_enum(
                st,
                StyleKey::IncludeBlocks,
                &[Keyword::Merge, Keyword::Preserve, Keyword::Regroup],
            ),
            "IncludeCategories" => self.parse_include_categories(st),
            "IncludeGuards" => self.parse_integer_option(st, StyleKey::IncludeGuards, 1),
            "IndentWidth" => self.parse_integer_option(st, StyleKey::IndentWidth, 0),
            "SortIncludes" => self.parse_enum(
                st,
                StyleKey::SortIncludes,
                &[
                    Keyword::Never,
                    Keyword::CaseSensitive,
                    Keyword::CaseInsensitive,
                ],
            ),
            "UseTab" => self.parse_enum(
                st,
                StyleKey::UseTab,
                &[
                    Keyword::Never,
                    Keyword::ForIndentation,
                    Keyword::ForContinuationAndIndentation,
                    Keyword::AlignWithSpaces,
                    Keyword::Always,
                ],
            ),
            "BraceWrapping" => self.parse_brace_wrapping(st),
            _ => false,
        }
    }

    fn parse_brace_wrapping(&mut self, st: &mut Style) -> bool {
        self.pos += 1;
        if !self.eat(&YamlToken::Colon) {
            return false;
        }
        while let Some(word) = self.peek_word() {
            let Some(key) = brace_wrapping_key(word) else {
                break;
            };
            let parsed = if key == StyleKey::AfterControlStatement {
                self.parse_enum(
                    st,
                    key,
                    &[
                        Keyword::Never,
                        Keyword::MultiLine,
                        Keyword::Always,
                        Keyword::True,
                        Keyword::False,
                    ],
                )
            } else {
                self.parse_bool(st, key)
            };
            if !parsed {
                return false;
            }
        }
        true
    }

    fn parse_include_categories(&mut self, st: &mut Style) -> bool {
        self.pos += 1;
        if !self.eat(&YamlToken::Colon) {
            return false;
        }

        while self.eat(&YamlToken::Dash) {
            let mut pattern: Option<String> = None;
            let mut priority = 0;
            let mut sort_priority: Option<i32> = None;
            let mut case_sensitive = false;

            loop {
                if self.eat_word("Regex") {
                    if !self.eat(&YamlToken::Colon) {
                        return false;
                    }
                    match self.next() {
                        Some(YamlToken::Str(p)) | Some(YamlToken::Word(p)) => pattern = Some(p),
                        _ => return false,
                    }
                } else if self.eat_word("Priority") {
                    if !self.eat(&YamlToken::Colon) {
                        return false;
                    }
                    let Some(YamlToken::Int(n)) = self.next() else {
                        return false;
                    };
                    priority = n as i32;
                } else if self.eat_word("SortPriority") {
                    if !self.eat(&YamlToken::Colon) {
                        return false;
                    }
                    let Some(YamlToken::Int(n)) = self.next() else {
                        return false;
                    };
                    sort_priority = Some(n as i32);
                } else if self.eat_word("CaseSensitive") {
                    if !self.eat(&YamlToken::Colon) {
                        return false;
                    }
                    match self.keyword() {
                        Some(Keyword::True) => case_sensitive = true,
                        Some(Keyword::False) => case_sensitive = false,
                        _ => return false,
                    }
                } else {
                    break;
                }
            }

            let Some(pattern) = pattern else {
                self.diags
                    .push(self.path, 0, 0, "include category missing Regex");
                continue;
            };
            match Regex::new(&pattern) {
                Ok(regex) => st.push_include_category(IncludeCategory {
                    pattern,
                    regex,
                    priority,
                    sort_priority: sort_priority.unwrap_or(priority),
                    case_sensitive,
                }),
                Err(err) => {
                    self.diags
                        .push(self.path, 0, 0, &format!("invalid regex {pattern}: {err}"));
                }
            }
        }
        true
    }

    fn parse_enum(&mut self, st: &mut Style, key: StyleKey, allowed: &[Keyword]) -> bool {
        self.pos += 1;
        if !self.eat(&YamlToken::Colon) {
            return false;
        }
        let Some(kw) = self.keyword() else {
            self.diags
                .push(self.path, 0, 0, &format!("unknown value for option {key:?}"));
            self.next();
            return true;
        };
        if !allowed.contains(&kw) {
            self.diags.push(
                self.path,
                0,
                0,
                &format!("unknown value {kw:?} for option {key:?}"),
            );
            return true;
        }
        st.set_keyword(key, kw);
        true
    }

    fn parse_bool(&mut self, st: &mut Style, key: StyleKey) -> bool {
        self.parse_enum(st, key, &[Keyword::True, Keyword::False])
    }

    fn parse_integer_option(&mut self, st: &mut Style, key: StyleKey, min: i64) -> bool {
        self.pos += 1;
        if !self.eat(&YamlToken::Colon) {
            return false;
        }
        match self.next() {
            Some(YamlToken::Int(n)) if n >= min => {
                st.set_int(key, n as u32);
                true
            }
            _ => {
                self.diags
                    .push(self.path, 0, 0, &format!("unknown value for option {key:?}"));
                true
            }
        }
    }

    fn keyword(&mut self) -> Option<Keyword> {
        let word = self.peek_word()?;
        let kw = keyword_from_str(word)?;
        self.pos += 1;
        Some(kw)
    }
}

fn brace_wrapping_key(word: &str) -> Option<StyleKey> {
    use StyleKey::*;

    let key = match word {
        "AfterCaseLabel" => AfterCaseLabel,
        "AfterClass" => AfterClass,
        "AfterControlStatement" => AfterControlStatement,
        "AfterEnum" => AfterEnum,
        "AfterExternBlock" => AfterExternBlock,
        "AfterFunction" => AfterFunction,
        "AfterNamespace" => AfterNamespace,
        "AfterObjCDeclaration" => AfterObjCDeclaration,
        "AfterStruct" => AfterStruct,
        "AfterUnion" => AfterUnion,
        "BeforeCatch" => BeforeCatch,
        "BeforeElse" => BeforeElse,
        "BeforeLambdaBody" => BeforeLambdaBody,
        "BeforeWhile" => BeforeWhile,
        "IndentBraces" => IndentBraces,
        "SplitEmptyFunction" => SplitEmptyFunction,
        "SplitEmptyNamespace" => SplitEmptyNamespace,
        "SplitEmptyRecord" => SplitEmptyRecord,
        _ => return None,
    };
    Some(key)
}

fn keyword_from_str(word: &str) -> Option<Keyword> {
    use Keyword::*;

    let kw = match word {
        "After" => After,
        "Align" => Align,
        "AlignAfterOperator" => AlignAfterOperator,
        "AlignWithSpaces" => AlignWithSpaces,
        "All" => All,
        "AllDefinitions" => AllDefinitions,
        "Allman" => Allman,
        "Always" => Always,
        "AlwaysBreak" => AlwaysBreak,
        "Attach" => Attach,
        "Before" => Before,
        "BlockIndent" => BlockIndent,
        "Both" => Both,
        "CaseInsensitive" => CaseInsensitive,
        "CaseSensitive" => CaseSensitive,
        "Chromium" => Chromium,
        "Cpp" => Cpp,
        "Custom" => Custom,
        "DontAlign" => DontAlign,
        "false" | "False" => False,
        "ForContinuationAndIndentation" => ForContinuationAndIndentation,
        "ForIndentation" => ForIndentation,
        "GNU" => Gnu,
        "Google" => Google,
        "InheritParentConfig" => InheritParentConfig,
        "LLVM" => Llvm,
        "Left" => Left,
        "Linux" => Linux,
        "Merge" => Merge,
        "Microsoft" => Microsoft,
        "Mozilla" => Mozilla,
        "MultiLine" => MultiLine,
        "Never" => Never,
        "NonAssignment" => NonAssignment,
        "None" => None,
        "OpenBSD" => OpenBsd,
        "Preserve" => Preserve,
        "Regroup" => Regroup,
        "Right" => Right,
        "Stroustrup" => Stroustrup,
        "TopLevel" => TopLevel,
        "TopLevelDefinitions" => TopLevelDefinitions,
        "true" | "True" => True,
        "WebKit" => WebKit,
        "Whitesmiths" => Whitesmiths,
        _ => return Option::None,
    };
    Some(kw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_config(config: &str) -> (Style, Diagnostics) {
        let mut diags = Diagnostics::new();
        let st = Style::from_config(Some(config), ".clang-format", &mut diags);
        (st, diags)
    }

    #[test]
    fn test_scalar_options() {
        let (st, diags) = parse_config("IndentWidth: 4\nUseTab: Never\nColumnLimit: 100\n");
        assert!(diags.is_empty());
        assert_eq!(st.indent_width(), 4);
        assert_eq!(st.column_limit(), 100);
        assert!(!st.use_tabs());
    }

    #[test]
    fn test_sort_includes() {
        let (st, _) = parse_config("SortIncludes: CaseSensitive\n");
        assert_eq!(st.keyword(StyleKey::SortIncludes), Keyword::CaseSensitive);
    }

    #[test]
    fn test_unknown_option_skipped() {
        let (st, diags) = parse_config("NoSuchOption: 42\nIndentWidth: 2\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(st.indent_width(), 2);
    }

    #[test]
    fn test_unknown_value_skipped() {
        let (st, diags) = parse_config("UseTab: Sometimes\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(st.keyword(StyleKey::UseTab), Keyword::Always);
    }

    #[test]
    fn test_brace_wrapping() {
        let (st, _) = parse_config(
            "BreakBeforeBraces: Custom\nBraceWrapping:\n  AfterStruct: true\n  AfterEnum: false\nIndentWidth: 3\n",
        );
        assert!(st.brace_wrapping(StyleKey::AfterStruct));
        assert!(!st.brace_wrapping(StyleKey::AfterEnum));
        assert_eq!(st.indent_width(), 3);
    }

    #[test]
    fn test_include_categories() {
        let (st, _) = parse_config(
            "IncludeCategories:\n  - Regex: '^<sys/'\n    Priority: 1\n  - Regex: '^<'\n    Priority: 2\n    SortPriority: 3\n",
        );
        assert_eq!(st.include_categories().len(), 2);
        assert_eq!(st.include_priority("<sys/queue.h>", "a.c").group, 1);
        assert_eq!(st.include_priority("<stdio.h>", "a.c").sort, 3);
    }

    #[test]
    fn test_non_cpp_document_skipped() {
        let (st, _) = parse_config(
            "---\nLanguage: Json\nIndentWidth: 2\n---\nLanguage: Cpp\nIndentWidth: 4\n",
        );
        assert_eq!(st.indent_width(), 4);
    }

    #[test]
    fn test_based_on_style_external() {
        let (_, diags) = parse_config("BasedOnStyle: LLVM\n");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_integer_overflow() {
        let (st, diags) = parse_config("ColumnLimit: 99999999999\n");
        assert!(!diags.is_empty());
        assert_eq!(st.column_limit(), 80);
    }
}
