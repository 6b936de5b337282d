use std::fmt;
use std::ops::Range;

use logos::Logos;
use smol_str::SmolStr;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Aux Tokens ===
    /// Spaces, tabs and carriage returns are insignificant
    #[regex(r"[ \t\r]+", logos::skip)]
    #[error]
    Error,
    #[token("\n")]
    Newline,
    /// Never produced by logos; the lexer wrapper emits it once input runs out
    Eof,

    // === Keywords ===
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("end")]
    End,

    // === Identifiers and literals ===
    #[regex(r"[a-zA-Z_?][0-9a-zA-Z_?]*")]
    Identifier,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    /// A double-quoted string, possibly spanning several lines
    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    String,

    // === Operators ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token("<=")]
    Lte,
    #[token(">")]
    Gt,
    #[token(">=")]
    Gte,
    #[token("==")]
    Eq,
    #[token("!=")]
    Neq,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
}

impl TokenKind {
    /// Whether this is one of `= += -= *= /= %=`.
    pub fn is_assign(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign | PercentAssign
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Error => "invalid token",
            Newline => "newline",
            Eof => "end of input",
            And => "'and'",
            Or => "'or'",
            Not => "'not'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            For => "'for'",
            Fn => "'fn'",
            Return => "'return'",
            Break => "'break'",
            Continue => "'continue'",
            True => "'true'",
            False => "'false'",
            Nil => "'nil'",
            End => "'end'",
            Identifier => "identifier",
            Number => "number",
            String => "string",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            Comma => "','",
            Minus => "'-'",
            Plus => "'+'",
            Slash => "'/'",
            Star => "'*'",
            Percent => "'%'",
            Lt => "'<'",
            Lte => "'<='",
            Gt => "'>'",
            Gte => "'>='",
            Eq => "'=='",
            Neq => "'!='",
            Assign => "'='",
            PlusAssign => "'+='",
            MinusAssign => "'-='",
            StarAssign => "'*='",
            SlashAssign => "'/='",
            PercentAssign => "'%='",
            Colon => "':'",
            Arrow => "'->'",
        };
        f.write_str(s)
    }
}

/// The value carried by a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    /// String contents with escapes already applied
    String(SmolStr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text of this token
    pub lexeme: SmolStr,
    pub literal: Option<Literal>,
    /// 1-based line the token starts on
    pub line: u32,
    /// Byte range in the source
    pub span: Range<usize>,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Apply the escape sequences of a string literal. `body` excludes the quotes.
///
/// Unknown escapes stand for the escaped character itself.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('a') => out.push('\u{7}'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
