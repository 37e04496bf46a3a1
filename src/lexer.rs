use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    /// The lexeme exactly as written
    pub text: String,
    pub span: Span,
}

/// Raw text taken from the cursor to the end of the current line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestOfLine {
    pub text: String,
    pub span: Span,
}

/// Forward-only tokenizer over assembly source.
///
/// Two read modes share one cursor: `next_token` yields the next
/// whitespace-delimited lexeme, and `rest_of_line` takes the remainder of the
/// current line verbatim (string payloads and `@` comments). The lexer is
/// consumed once, start to finish.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Position of the cursor, for diagnostics raised between tokens.
    pub fn position(&self) -> Span {
        self.span()
    }

    /// Returns the next whitespace-delimited token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Spanned> {
        self.skip_whitespace();
        let span = self.span();

        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                break;
            }
            text.push(ch);
            self.advance();
        }

        if text.is_empty() {
            return None;
        }

        Some(Spanned {
            token: Token::classify(&text),
            text,
            span,
        })
    }

    /// Consumes everything up to and including the next line break and
    /// returns it without the break. A trailing `\r` is dropped.
    pub fn rest_of_line(&mut self) -> RestOfLine {
        let span = self.span();
        let mut text = String::new();

        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
        }

        if text.ends_with('\r') {
            text.pop();
        }

        RestOfLine { text, span }
    }
}

impl Iterator for Lexer {
    type Item = Spanned;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
