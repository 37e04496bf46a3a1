/// A single whitespace-delimited lexeme, classified by shape.
///
/// Classification is purely lexical. Whether a `Word` is a mnemonic, a type
/// tag or a method signature is decided by whoever consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Decimal integer that fits an `i32` (`42`, `-7`, `+3`)
    Integer(i32),

    /// Text starting with a double quote (`"run"`), kept verbatim
    Quoted(String),

    /// Anything ending in `:`, quoted or not; holds the name without the colon
    Label(String),

    /// Everything else: mnemonics, type tags, keywords, signatures
    Word(String),
}

impl Token {
    /// Classify a raw lexeme.
    pub fn classify(text: &str) -> Self {
        if let Some(name) = text.strip_suffix(':') {
            return Token::Label(name.to_string());
        }

        if text.starts_with('"') {
            return Token::Quoted(text.to_string());
        }

        match text.parse::<i32>() {
            Ok(n) => Token::Integer(n),
            Err(_) => Token::Word(text.to_string()),
        }
    }

    /// Returns true if this token is an integer literal
    pub fn is_integer(&self) -> bool {
        matches!(self, Token::Integer(_))
    }
}

impl std::fmt::Display for Token {
    /// Prints the token the way it appeared in the source.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Quoted(s) => write!(f, "{}", s),
            Token::Label(s) => write!(f, "{}:", s),
            Token::Word(s) => write!(f, "{}", s),
        }
    }
}
