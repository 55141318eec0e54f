//! Style options, a subset of the clang-format vocabulary resolved against
//! the BSD kernel normal form defaults.

mod parse;

use std::collections::HashMap;

use regex::Regex;

use crate::error::Diagnostics;

/// Recognized configuration keys, including the nested `BraceWrapping`
/// members which share the flat key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKey {
    AlignAfterOpenBracket,
    AlignEscapedNewlines,
    AlignOperands,
    AlwaysBreakAfterReturnType,
    BasedOnStyle,
    BitFieldColonSpacing,
    BreakBeforeBinaryOperators,
    BreakBeforeBraces,
    BreakBeforeTernaryOperators,
    ColumnLimit,
    ContinuationIndentWidth,
    IncludeBlocks,
    IncludeGuards,
    IndentWidth,
    SortIncludes,
    UseTab,
    // BraceWrapping
    AfterCaseLabel,
    AfterClass,
    AfterControlStatement,
    AfterEnum,
    AfterExternBlock,
    AfterFunction,
    AfterNamespace,
    AfterObjCDeclaration,
    AfterStruct,
    AfterUnion,
    BeforeCatch,
    BeforeElse,
    BeforeLambdaBody,
    BeforeWhile,
    IndentBraces,
    SplitEmptyFunction,
    SplitEmptyNamespace,
    SplitEmptyRecord,
}

/// Enumerated option values, shared across every option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    After,
    Align,
    AlignAfterOperator,
    AlignWithSpaces,
    All,
    AllDefinitions,
    Allman,
    Always,
    AlwaysBreak,
    Attach,
    Before,
    BlockIndent,
    Both,
    CaseInsensitive,
    CaseSensitive,
    Chromium,
    Cpp,
    Custom,
    DontAlign,
    False,
    ForContinuationAndIndentation,
    ForIndentation,
    Gnu,
    Google,
    InheritParentConfig,
    Left,
    Linux,
    Llvm,
    Merge,
    Microsoft,
    Mozilla,
    MultiLine,
    Never,
    NonAssignment,
    None,
    OpenBsd,
    Preserve,
    Regroup,
    Right,
    Stroustrup,
    TopLevel,
    TopLevelDefinitions,
    True,
    WebKit,
    Whitesmiths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleValue {
    Keyword(Keyword),
    Int(u32),
}

#[derive(Debug)]
pub struct IncludeCategory {
    pub pattern: String,
    pub regex: Regex,
    pub priority: i32,
    pub sort_priority: i32,
    pub case_sensitive: bool,
}

/// Priority assigned to an include directive, the group dictates the block
/// and the sort priority the order within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IncludePriority {
    pub group: i32,
    pub sort: i32,
}

#[derive(Debug, Default)]
pub struct Style {
    options: HashMap<StyleKey, StyleValue>,
    include_categories: Vec<IncludeCategory>,
}

impl Style {
    /// The BSD kernel normal form defaults, applied when no configuration
    /// is present.
    pub fn defaults() -> Style {
        let mut st = Style::default();
        st.reset_defaults();
        st
    }

    fn reset_defaults(&mut self) {
        use Keyword::*;
        use StyleKey::*;

        self.options.clear();
        self.set_keyword(AlignAfterOpenBracket, DontAlign);
        self.set_keyword(AlignEscapedNewlines, Right);
        self.set_keyword(AlignOperands, DontAlign);
        self.set_keyword(AlwaysBreakAfterReturnType, AllDefinitions);
        self.set_keyword(BitFieldColonSpacing, None);
        self.set_keyword(BreakBeforeBinaryOperators, None);
        self.set_keyword(BreakBeforeBraces, Linux);
        self.set_keyword(BreakBeforeTernaryOperators, False);
        self.set_int(ColumnLimit, 80);
        self.set_int(ContinuationIndentWidth, 4);
        self.set_keyword(IncludeBlocks, Preserve);
        self.set_int(IncludeGuards, 0);
        self.set_int(IndentWidth, 8);
        self.set_keyword(SortIncludes, Never);
        self.set_keyword(UseTab, Always);
    }

    /// Resolve the effective style from an optional configuration buffer.
    /// Configuration errors are diagnosed but never fatal, the offending
    /// directive is skipped.
    pub fn from_config(config: Option<&str>, path: &str, diags: &mut Diagnostics) -> Style {
        let mut st = Style::defaults();
        if let Some(config) = config {
            parse::parse(&mut st, config, path, diags);
        }
        st
    }

    pub(crate) fn set_keyword(&mut self, key: StyleKey, value: Keyword) {
        self.options.insert(key, StyleValue::Keyword(value));
    }

    pub(crate) fn set_int(&mut self, key: StyleKey, value: u32) {
        self.options.insert(key, StyleValue::Int(value));
    }

    pub(crate) fn push_include_category(&mut self, ic: IncludeCategory) {
        self.include_categories.push(ic);
    }

    pub(crate) fn reset_to_base(&mut self, base: Keyword, path: &str, diags: &mut Diagnostics) {
        match base {
            Keyword::OpenBsd => self.reset_defaults(),
            Keyword::InheritParentConfig => {}
            _ => diags.push(
                path,
                0,
                0,
                &format!("BasedOnStyle: {base:?} requires an external style provider, ignored"),
            ),
        }
    }

    pub fn keyword(&self, key: StyleKey) -> Keyword {
        match self.options.get(&key) {
            Some(StyleValue::Keyword(kw)) => *kw,
            _ => Keyword::None,
        }
    }

    pub fn integer(&self, key: StyleKey) -> u32 {
        match self.options.get(&key) {
            Some(StyleValue::Int(n)) => *n,
            _ => 0,
        }
    }

    pub fn indent_width(&self) -> u32 {
        self.integer(StyleKey::IndentWidth)
    }

    pub fn continuation_indent_width(&self) -> u32 {
        self.integer(StyleKey::ContinuationIndentWidth)
    }

    /// The column limit, zero meaning unlimited which is mapped to a large
    /// sentinel keeping width comparisons trivial.
    pub fn column_limit(&self) -> u32 {
        match self.integer(StyleKey::ColumnLimit) {
            0 => u32::MAX / 2,
            n => n,
        }
    }

    pub fn use_tabs(&self) -> bool {
        !matches!(
            self.keyword(StyleKey::UseTab),
            Keyword::Never | Keyword::AlignWithSpaces
        )
    }

    /// Brace wrapping options, the Linux preset implies breaking before
    /// function braces.
    pub fn brace_wrapping(&self, key: StyleKey) -> bool {
        if self.keyword(StyleKey::BreakBeforeBraces) == Keyword::Linux
            && key == StyleKey::AfterFunction
        {
            return true;
        }
        self.keyword(key) == Keyword::True
    }

    pub fn include_categories(&self) -> &[IncludeCategory] {
        &self.include_categories
    }

    /// All distinct include group priorities in ascending order, always
    /// containing the main include group and the catch all group.
    pub fn include_priorities(&self) -> Vec<i32> {
        let mut priorities = vec![0, i32::MAX];
        for ic in &self.include_categories {
            priorities.push(ic.priority);
        }
        priorities.sort_unstable();
        priorities.dedup();
        priorities
    }

    /// Resolve the priority of an include directive. The main include,
    /// pairing `a/b.c` with `"a/b.h"` or `"b.h"`, always comes first.
    pub fn include_priority(&self, include_path: &str, path: &str) -> IncludePriority {
        if is_main_include(include_path, path) {
            return IncludePriority { group: 0, sort: 0 };
        }
        for ic in &self.include_categories {
            if ic.regex.is_match(include_path) {
                return IncludePriority {
                    group: ic.priority,
                    sort: ic.sort_priority,
                };
            }
        }
        IncludePriority {
            group: i32::MAX,
            sort: i32::MAX,
        }
    }
}

/// Returns true if the include denotes the header paired with the given
/// source file.
pub fn is_main_include(include_path: &str, path: &str) -> bool {
    let Some(without_extension) = path.rsplit_once('.').map(|(stem, _)| stem) else {
        return false;
    };
    if include_path == format!("\"{without_extension}.h\"") {
        return true;
    }

    let filename = path.rsplit('/').next().unwrap_or(path);
    let Some(basename) = filename.rsplit_once('.').map(|(stem, _)| stem) else {
        return false;
    };
    include_path == format!("\"{basename}.h\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let st = Style::defaults();
        assert_eq!(st.indent_width(), 8);
        assert_eq!(st.column_limit(), 80);
        assert_eq!(st.keyword(StyleKey::BreakBeforeBraces), Keyword::Linux);
        assert!(st.use_tabs());
        assert!(st.brace_wrapping(StyleKey::AfterFunction));
        assert!(!st.brace_wrapping(StyleKey::AfterStruct));
    }

    #[test]
    fn test_unlimited_column_limit() {
        let mut st = Style::defaults();
        st.set_int(StyleKey::ColumnLimit, 0);
        assert!(st.column_limit() > 1_000_000);
    }

    #[test]
    fn test_main_include() {
        assert!(is_main_include("\"a/b.h\"", "a/b.c"));
        assert!(is_main_include("\"b.h\"", "a/b.c"));
        assert!(!is_main_include("\"c.h\"", "a/b.c"));
        assert!(!is_main_include("<b.h>", "a/b.c"));
    }

    #[test]
    fn test_include_priorities() {
        let mut st = Style::defaults();
        st.push_include_category(IncludeCategory {
            pattern: "^<sys/".to_string(),
            regex: Regex::new("^<sys/").unwrap(),
            priority: 1,
            sort_priority: 1,
            case_sensitive: true,
        });
        assert_eq!(st.include_priorities(), vec![0, 1, i32::MAX]);
        let p = st.include_priority("<sys/types.h>", "a.c");
        assert_eq!(p.group, 1);
        let p = st.include_priority("<stdio.h>", "a.c");
        assert_eq!(p.group, i32::MAX);
    }
}
