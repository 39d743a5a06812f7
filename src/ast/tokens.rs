use crate::ast::{Datetime, Number};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Numeric literal, including the missing values `.` and `.a` to `.z`
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -3.25
    /// 1e-5
    /// .
    /// .b
    /// ```
    Number(Number),

    /// String literal, plain or compound quoted
    ///
    /// Also produced for the raw filename that follows `using`.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// `"say "hi""'
    /// ```
    String(String),

    /// Date/time literal
    ///
    /// # Examples
    /// ```text
    /// td(15mar2020)
    /// tc(15mar2020 13:45:00)
    /// ```
    Datetime(Datetime),

    /// Verb, variable name, function name or option name
    ///
    /// Factor-variable notation, trailing wildcards and merge match types
    /// stay inside one identifier.
    ///
    /// # Examples
    /// ```text
    /// regress
    /// i.foreign
    /// inc*
    /// m:1
    /// ```
    Identifier(String),

    // Keywords
    /// `if` condition
    If,

    /// `in` observation range
    In,

    /// `using` filename
    Using,

    // Operators
    /// Addition
    Plus,

    /// Subtraction or negation
    Minus,

    /// Multiplication
    Star,

    /// Division, also the range separator in `in 1/10`
    Slash,

    /// Power
    Caret,

    /// Equality (`==`)
    EqEq,

    /// Inequality (`!=` or `~=`)
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    /// Logical and
    Ampersand,

    /// Logical or
    Pipe,

    /// Logical not (`!`)
    Exclamation,

    /// Logical not (`~`)
    Tilde,

    /// Assignment and weight binding (`=`)
    ///
    /// # Examples
    /// ```text
    /// generate y = x^2
    /// summarize x [aw=pop]
    /// ```
    Equals,

    // Delimiters
    /// Left parenthesis for grouping, calls and option arguments
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket for subscripts and weights
    LBracket,

    /// Right bracket
    RBracket,

    /// Left brace opening a block
    LBrace,

    /// Right brace closing a block
    RBrace,

    /// Comma introducing options, or separating call arguments
    Comma,

    /// Colon ending a modifier prefix
    ///
    /// # Examples
    /// ```text
    /// by region: summarize income
    /// ```
    Colon,

    /// Verbatim foreign source between the embedded-block delimiters
    Embedded(String),

    /// End of one command: a newline, or `;` under `#delimit ;`
    EndOfCommand,

    /// End of file
    Eof,
}

impl Token {
    /// Whether a binary operator may follow this token.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::String(_)
                | Token::Datetime(_)
                | Token::Identifier(_)
                | Token::RParen
                | Token::RBracket
        )
    }

    /// Whether this token ends a command.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Token::EndOfCommand | Token::Eof)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Datetime(dt) => write!(f, "{}", dt),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::If => write!(f, "if"),
            Token::In => write!(f, "in"),
            Token::Using => write!(f, "using"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Exclamation => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Equals => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Embedded(_) => write!(f, "embedded block"),
            Token::EndOfCommand => write!(f, "end of command"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
