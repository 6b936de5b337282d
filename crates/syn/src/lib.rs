mod token;


use smol_str::SmolStr;
use tracing::trace;

pub use token::{unescape, Literal, Token, TokenKind};

/// The main lexer used in Aurora.
///
/// Pull-based: the compiler asks for one token at a time with
/// [`Lexer::next_token`]. Once the input is exhausted every further call
/// returns an [`TokenKind::Eof`] token.
pub struct Lexer<'src> {
    /// The actual lexer that does the job.
    inner: logos::Lexer<'src, TokenKind>,
    /// Line of the start of the next token
    line: u32,
    /// Whether to skip newline tokens.
    ignore_newline: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer from string.
    pub fn new(s: &'src str) -> Lexer<'src> {
        Lexer {
            inner: logos::Lexer::new(s),
            line: 1,
            ignore_newline: false,
        }
    }

    /// The underlying source code
    pub fn source(&self) -> &'src str {
        self.inner.source()
    }

    /// Whether to skip newline tokens from now on.
    ///
    /// Inside parentheses, argument lists and list literals a newline never
    /// ends a statement, so the compiler turns this on while it is there.
    /// Returns the previous setting so that it can be restored.
    pub fn ignore_newline(&mut self, value: bool) -> bool {
        std::mem::replace(&mut self.ignore_newline, value)
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let kind = match self.inner.next() {
                Some(kind) => kind,
                None => {
                    let end = self.source().len();
                    return Token {
                        kind: TokenKind::Eof,
                        lexeme: SmolStr::default(),
                        literal: None,
                        line: self.line,
                        span: end..end,
                    };
                }
            };

            let slice = self.inner.slice();
            let line = self.line;
            self.line += slice.matches('\n').count() as u32;

            if kind == TokenKind::Newline && self.ignore_newline {
                continue;
            }

            let literal = match kind {
                TokenKind::Number => slice.parse().ok().map(Literal::Number),
                TokenKind::String => Some(Literal::String(
                    unescape(&slice[1..slice.len() - 1]).into(),
                )),
                _ => None,
            };

            trace!(?kind, line, "token {:?}", slice);
            return Token {
                kind,
                lexeme: slice.into(),
                literal,
                line,
                span: self.inner.span(),
            };
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Same as [`Lexer::next_token`], but stops at the end of input.
    fn next(&mut self) -> Option<Self::Item> {
        let tok = self.next_token();
        (tok.kind != TokenKind::Eof).then(|| tok)
    }
}
