use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::token::{TokenFlags, TokenKind};

macro_rules! keyword {
    ($map:ident, $kind:ident, $value:expr) => {
        $map.insert($value, (TokenKind::$kind, TokenFlags::empty()));
    };
    ($map:ident, $kind:ident, $value:expr, $flags:expr) => {
        $map.insert($value, (TokenKind::$kind, $flags));
    };
}

/// Every keyword recognized by the lexer, including the BSD and Linux
/// compatibility aliases which normalize to the same token kind.
pub static KEYWORDS: Lazy<HashMap<&'static str, (TokenKind, TokenFlags)>> = Lazy::new(|| {
    let mut m = HashMap::new();

    keyword!(m, Assembly, "asm");
    keyword!(m, Assembly, "__asm");
    keyword!(m, Assembly, "__asm__");
    keyword!(m, Attribute, "__attribute__");
    keyword!(m, Break, "break");
    keyword!(m, Case, "case");
    keyword!(m, Char, "char", TokenFlags::TYPE);
    keyword!(m, Const, "const", TokenFlags::QUALIFIER);
    keyword!(m, Continue, "continue");
    keyword!(m, Default, "default");
    keyword!(m, Do, "do");
    keyword!(m, Double, "double", TokenFlags::TYPE);
    keyword!(m, Else, "else");
    keyword!(m, Enum, "enum", TokenFlags::TYPE);
    keyword!(m, Extern, "extern", TokenFlags::STORAGE);
    keyword!(m, Float, "float", TokenFlags::TYPE);
    keyword!(m, For, "for");
    keyword!(m, Goto, "goto");
    keyword!(m, If, "if");
    keyword!(m, Inline, "inline", TokenFlags::STORAGE);
    keyword!(m, Int, "int", TokenFlags::TYPE);
    keyword!(m, Long, "long", TokenFlags::TYPE);
    keyword!(m, Register, "register", TokenFlags::STORAGE);
    keyword!(m, Restrict, "restrict", TokenFlags::QUALIFIER);
    keyword!(m, Return, "return");
    keyword!(m, Short, "short", TokenFlags::TYPE);
    keyword!(m, Signed, "signed", TokenFlags::TYPE);
    keyword!(m, Sizeof, "sizeof");
    keyword!(m, Static, "static", TokenFlags::STORAGE);
    keyword!(m, Struct, "struct", TokenFlags::TYPE);
    keyword!(m, Switch, "switch");
    keyword!(m, Typedef, "typedef", TokenFlags::TYPE);
    keyword!(m, Union, "union", TokenFlags::TYPE);
    keyword!(m, Unsigned, "unsigned", TokenFlags::TYPE);
    keyword!(m, Void, "void", TokenFlags::TYPE);
    keyword!(m, Volatile, "volatile", TokenFlags::QUALIFIER);
    keyword!(m, While, "while");

    keyword!(m, Bool, "_Bool", TokenFlags::TYPE);
    keyword!(m, Int8, "int8_t", TokenFlags::TYPE);
    keyword!(m, Int16, "int16_t", TokenFlags::TYPE);
    keyword!(m, Int32, "int32_t", TokenFlags::TYPE);
    keyword!(m, Int64, "int64_t", TokenFlags::TYPE);
    keyword!(m, Uint8, "uint8_t", TokenFlags::TYPE);
    keyword!(m, Uint16, "uint16_t", TokenFlags::TYPE);
    keyword!(m, Uint32, "uint32_t", TokenFlags::TYPE);
    keyword!(m, Uint64, "uint64_t", TokenFlags::TYPE);
    keyword!(m, VaList, "va_list", TokenFlags::TYPE);

    // BSD
    keyword!(m, Uint8, "u_int8_t", TokenFlags::TYPE);
    keyword!(m, Uint16, "u_int16_t", TokenFlags::TYPE);
    keyword!(m, Uint32, "u_int32_t", TokenFlags::TYPE);
    keyword!(m, Uint64, "u_int64_t", TokenFlags::TYPE);
    // Linux
    keyword!(m, Assembly, "asm_inline");
    keyword!(m, Assembly, "asm_volatile_goto");

    m
});

/// Punctuators ordered for greedy longest match, the longest ones first.
pub static PUNCTUATORS: Lazy<Vec<(&'static str, TokenKind, TokenFlags)>> = Lazy::new(|| {
    let mut v: Vec<(&'static str, TokenKind, TokenFlags)> = vec![
        ("...", TokenKind::Ellipsis, TokenFlags::TYPE),
        ("<<=", TokenKind::LessLessEqual, TokenFlags::ASSIGN),
        (">>=", TokenKind::GreaterGreaterEqual, TokenFlags::ASSIGN),
        ("&&", TokenKind::AmpAmp, TokenFlags::BINARY),
        ("&=", TokenKind::AmpEqual, TokenFlags::ASSIGN),
        ("*=", TokenKind::StarEqual, TokenFlags::ASSIGN),
        ("++", TokenKind::PlusPlus, TokenFlags::empty()),
        ("+=", TokenKind::PlusEqual, TokenFlags::ASSIGN),
        ("->", TokenKind::Arrow, TokenFlags::empty()),
        ("--", TokenKind::MinusMinus, TokenFlags::empty()),
        ("-=", TokenKind::MinusEqual, TokenFlags::ASSIGN),
        ("!=", TokenKind::ExclaimEqual, TokenFlags::BINARY),
        ("/=", TokenKind::SlashEqual, TokenFlags::ASSIGN),
        ("%=", TokenKind::PercentEqual, TokenFlags::ASSIGN),
        ("<<", TokenKind::LessLess, TokenFlags::BINARY),
        ("<=", TokenKind::LessEqual, TokenFlags::BINARY),
        (">>", TokenKind::GreaterGreater, TokenFlags::BINARY),
        (">=", TokenKind::GreaterEqual, TokenFlags::BINARY),
        ("^=", TokenKind::CaretEqual, TokenFlags::ASSIGN),
        ("||", TokenKind::PipePipe, TokenFlags::BINARY),
        ("|=", TokenKind::PipeEqual, TokenFlags::ASSIGN),
        ("==", TokenKind::EqualEqual, TokenFlags::BINARY),
        ("[", TokenKind::LSquare, TokenFlags::empty()),
        ("]", TokenKind::RSquare, TokenFlags::empty()),
        ("(", TokenKind::LParen, TokenFlags::empty()),
        (")", TokenKind::RParen, TokenFlags::empty()),
        ("{", TokenKind::LBrace, TokenFlags::empty()),
        ("}", TokenKind::RBrace, TokenFlags::empty()),
        (".", TokenKind::Period, TokenFlags::AMBIGUOUS),
        (
            "&",
            TokenKind::Amp,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY,
        ),
        (
            "*",
            TokenKind::Star,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY | TokenFlags::SPACE,
        ),
        (
            "+",
            TokenKind::Plus,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY,
        ),
        (
            "-",
            TokenKind::Minus,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY,
        ),
        ("~", TokenKind::Tilde, TokenFlags::empty()),
        ("!", TokenKind::Exclaim, TokenFlags::AMBIGUOUS),
        (
            "/",
            TokenKind::Slash,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY | TokenFlags::SPACE,
        ),
        (
            "%",
            TokenKind::Percent,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY,
        ),
        (
            "<",
            TokenKind::Less,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY,
        ),
        (
            ">",
            TokenKind::Greater,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY,
        ),
        ("^", TokenKind::Caret, TokenFlags::AMBIGUOUS),
        (
            "|",
            TokenKind::Pipe,
            TokenFlags::AMBIGUOUS | TokenFlags::BINARY | TokenFlags::SPACE,
        ),
        ("?", TokenKind::Question, TokenFlags::empty()),
        (":", TokenKind::Colon, TokenFlags::empty()),
        (";", TokenKind::Semi, TokenFlags::empty()),
        (
            "=",
            TokenKind::Equal,
            TokenFlags::AMBIGUOUS | TokenFlags::ASSIGN,
        ),
        (",", TokenKind::Comma, TokenFlags::empty()),
        ("\\", TokenKind::Backslash, TokenFlags::DISCARD),
    ];
    v.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    v
});
