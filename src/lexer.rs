use std::{fmt, sync::LazyLock};

use regex::Regex;
use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{Datetime, Number, Token},
    options::{EmbeddedDelimiters, MacroPolicy, ParseOptions},
};

/// Upper bound on substitutions made inside text that an earlier
/// substitution produced. A macro whose value refers to itself would
/// otherwise never stop expanding.
const MAX_NESTED_EXPANSIONS: usize = 1_000;

static MATCH_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1mM]:[1mM](?:[^A-Za-z0-9_]|$)").expect("match-type pattern is valid")
});

/// Location in the (macro-expanded) input. Lines and columns start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A token with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    /// Whitespace or a comment came right before this token.
    pub spaced: bool,
}

/// Malformed input found while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{0}: unterminated string")]
    UnterminatedString(Position),

    #[error("{0}: unterminated /* comment")]
    UnterminatedComment(Position),

    #[error("{0}: `///` continuation at end of input")]
    UnterminatedContinuation(Position),

    #[error("{position}: embedded block is missing its closing `{close}`")]
    UnterminatedEmbedded { position: Position, close: String },

    #[error("{0}: unterminated macro reference")]
    UnterminatedMacro(Position),

    #[error("{position}: macro `{name}' is not defined")]
    UnresolvedMacro { position: Position, name: String },

    #[error("{0}: macro expansion limit exceeded")]
    MacroExpansionLimit(Position),

    #[error("{position}: invalid date/time literal `{text}`")]
    InvalidDatetime { position: Position, text: String },

    #[error("{position}: invalid number `{text}`")]
    InvalidNumber { position: Position, text: String },

    #[error("{position}: unknown #delimit setting `{text}`")]
    InvalidDelimit { position: Position, text: String },

    #[error("{position}: unexpected character '{ch}'")]
    UnexpectedChar { position: Position, ch: char },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedString(position)
            | LexError::UnterminatedComment(position)
            | LexError::UnterminatedContinuation(position)
            | LexError::UnterminatedMacro(position)
            | LexError::MacroExpansionLimit(position) => *position,
            LexError::UnterminatedEmbedded { position, .. }
            | LexError::UnresolvedMacro { position, .. }
            | LexError::InvalidDatetime { position, .. }
            | LexError::InvalidNumber { position, .. }
            | LexError::InvalidDelimit { position, .. }
            | LexError::UnexpectedChar { position, .. } => *position,
        }
    }
}

/// Resolves macro references while lexing.
///
/// Locals (`` `name' ``) are looked up by name; globals (`$name`, `${name}`)
/// are looked up with the `$` kept, so `$S_DATE` asks for `"$S_DATE"`.
pub trait MacroLookup {
    fn lookup(&mut self, name: &str) -> Option<String>;
}

impl<F> MacroLookup for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn lookup(&mut self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Lookup that knows no macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMacros;

impl MacroLookup for NoMacros {
    fn lookup(&mut self, _name: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Newline,
    Semicolon,
}

pub struct Lexer<'m> {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    macros: Option<&'m mut dyn MacroLookup>,
    macro_policy: MacroPolicy,
    embedded: EmbeddedDelimiters,
    delimiter: Delimiter,
    at_command_start: bool,
    verb_next: bool,
    after_using: bool,
    previous_operand: bool,
    after_operator: bool,
    in_expression: bool,
    nesting: usize,
    expansions: usize,
    expanded_until: usize,
}

impl Lexer<'static> {
    pub fn new(input: &str) -> Self {
        Lexer::build(input, None)
    }
}

impl<'m> Lexer<'m> {
    pub fn with_macros(input: &str, macros: &'m mut dyn MacroLookup) -> Self {
        Lexer::build(input, Some(macros))
    }

    fn build(input: &str, macros: Option<&'m mut dyn MacroLookup>) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            macros,
            macro_policy: MacroPolicy::default(),
            embedded: EmbeddedDelimiters::default(),
            delimiter: Delimiter::Newline,
            at_command_start: true,
            verb_next: true,
            after_using: false,
            previous_operand: false,
            after_operator: false,
            in_expression: false,
            nesting: 0,
            expansions: 0,
            expanded_until: 0,
        }
    }

    /// Applies the lexer-relevant parts of `options`.
    pub fn configure(mut self, options: &ParseOptions) -> Self {
        self.macro_policy = options.unresolved_macros;
        self.embedded = options.embedded.clone();
        self
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_char(i) == Some(c))
    }

    fn at_name_start(&self, offset: usize) -> bool {
        self.peek_char(offset)
            .is_some_and(|c| c.is_alphabetic() || c == '_')
    }

    fn at_local_macro(&self) -> bool {
        self.current_char() == Some('`') && self.peek_char(1) != Some('"')
    }

    fn at_global_macro(&self) -> bool {
        self.current_char() == Some('$') && (self.at_name_start(1) || self.peek_char(1) == Some('{'))
    }

    /// Next token, without location.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.next_spanned().map(|spanned| spanned.token)
    }

    /// Every token up to, not including, the end of input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token()? {
                Token::Eof => return Ok(tokens),
                token => tokens.push(token),
            }
        }
    }

    pub fn next_spanned(&mut self) -> Result<SpannedToken, LexError> {
        let spaced = self.skip_trivia()?;
        let start = self.position();
        let token = self.scan()?;

        // The verb starts a command or follows a modifier's colon; it is
        // never a left operand.
        self.previous_operand = token.ends_operand() && !self.verb_next;
        self.verb_next = matches!(token, Token::EndOfCommand | Token::Colon);
        self.at_command_start = token == Token::EndOfCommand;
        self.after_using = token == Token::Using;
        self.track_context(&token);

        Ok(SpannedToken {
            token,
            span: Span {
                start,
                end: self.position(),
            },
            spaced,
        })
    }

    /// Follows whether the cursor is inside an expression (after `=` or
    /// `if`, or right after an operator), where a trailing `*` multiplies
    /// instead of ending a wildcard name.
    fn track_context(&mut self, token: &Token) {
        self.after_operator = matches!(
            token,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Caret
                | Token::EqEq
                | Token::NotEq
                | Token::Lt
                | Token::Gt
                | Token::LtEq
                | Token::GtEq
                | Token::Ampersand
                | Token::Pipe
                | Token::Exclamation
                | Token::Tilde
        );
        match token {
            Token::EndOfCommand | Token::Colon | Token::LBrace => {
                self.in_expression = false;
                self.nesting = 0;
            }
            Token::LParen | Token::LBracket => self.nesting += 1,
            Token::RParen | Token::RBracket => self.nesting = self.nesting.saturating_sub(1),
            Token::Equals | Token::If if self.nesting == 0 => self.in_expression = true,
            Token::Comma | Token::In | Token::Using if self.nesting == 0 => {
                self.in_expression = false
            }
            _ => {}
        }
    }

    /// Skips whitespace, comments, continuations and `#delimit` directives,
    /// and substitutes macro references that begin a token. Returns whether
    /// anything was skipped.
    fn skip_trivia(&mut self) -> Result<bool, LexError> {
        let mut skipped = false;

        loop {
            match self.current_char() {
                Some(' ' | '\t' | '\r') => self.advance(),
                Some('\n') if self.delimiter == Delimiter::Semicolon || self.at_command_start => {
                    self.advance()
                }
                Some('/') if self.starts_with("///") => self.skip_continuation()?,
                Some('/') if self.peek_char(1) == Some('/') => self.skip_line(),
                Some('/') if self.peek_char(1) == Some('*') => self.skip_block_comment()?,
                Some('*') if self.at_command_start => self.skip_comment_command(),
                Some('#') if self.at_command_start && self.starts_with("#d") => {
                    self.read_delimit()?
                }
                _ if self.at_local_macro() => {
                    self.expand_local()?;
                    continue;
                }
                _ if self.at_global_macro() => {
                    self.expand_global()?;
                    continue;
                }
                _ => return Ok(skipped),
            }
            skipped = true;
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_continuation(&mut self) -> Result<(), LexError> {
        let start = self.position();
        self.skip_line();
        if self.current_char().is_none() {
            return Err(LexError::UnterminatedContinuation(start));
        }
        self.advance(); // newline joins the next line
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.position();
        let mut depth = 0usize;

        loop {
            if self.starts_with("/*") {
                depth += 1;
                self.advance_by(2);
            } else if self.starts_with("*/") {
                depth -= 1;
                self.advance_by(2);
                if depth == 0 {
                    return Ok(());
                }
            } else if self.current_char().is_some() {
                self.advance();
            } else {
                return Err(LexError::UnterminatedComment(start));
            }
        }
    }

    /// `* comment` as a whole command.
    fn skip_comment_command(&mut self) {
        match self.delimiter {
            Delimiter::Newline => self.skip_line(),
            Delimiter::Semicolon => {
                while let Some(ch) = self.current_char() {
                    self.advance();
                    if ch == ';' {
                        break;
                    }
                }
            }
        }
    }

    fn read_delimit(&mut self) -> Result<(), LexError> {
        let start = self.position();
        let mut directive = String::new();
        self.advance(); // '#'
        while let Some(ch) = self.current_char().filter(|c| c.is_ascii_alphabetic()) {
            directive.push(ch);
            self.advance();
        }
        if !"delimit".starts_with(directive.as_str()) {
            return Err(LexError::UnexpectedChar {
                position: start,
                ch: '#',
            });
        }

        while matches!(self.current_char(), Some(' ' | '\t')) {
            self.advance();
        }
        let mut setting = String::new();
        while let Some(ch) = self.current_char().filter(|c| !c.is_whitespace()) {
            setting.push(ch);
            self.advance();
        }

        self.delimiter = match setting.trim_end_matches(';') {
            "" if setting == ";" => Delimiter::Semicolon,
            "cr" => Delimiter::Newline,
            _ => {
                return Err(LexError::InvalidDelimit {
                    position: start,
                    text: setting,
                });
            }
        };
        trace!(delimiter = ?self.delimiter, "#delimit");

        self.skip_line();
        self.advance();
        Ok(())
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        let start = self.position();

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        if ch == '\n' && self.delimiter == Delimiter::Newline {
            self.advance();
            return Ok(Token::EndOfCommand);
        }
        if ch == ';' && self.delimiter == Delimiter::Semicolon {
            self.advance();
            return Ok(Token::EndOfCommand);
        }
        if self.at_command_start && self.starts_with(&self.embedded.open) {
            return self.read_embedded(start);
        }
        if self.after_using && ch != '"' && ch != ',' && !self.starts_with("`\"") {
            return self.read_raw_word();
        }
        if self.is_match_type() {
            let word: String = self.input[self.position..self.position + 3].iter().collect();
            self.advance_by(3);
            return Ok(Token::Identifier(word));
        }

        match ch {
            '"' => self.read_string(start),
            '`' if self.peek_char(1) == Some('"') => self.read_compound_string(start),
            c if c.is_ascii_digit() => self.read_number(start, String::new()),
            '.' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start, String::new())
            }
            '.' => Ok(self.read_missing()),
            '+' | '-' if !self.previous_operand && self.at_unsigned_number(1) => {
                self.advance();
                self.read_number(start, ch.to_string())
            }
            c if c.is_alphabetic() || c == '_' => self.read_word(start),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '^' => self.single(Token::Caret),
            '&' => self.single(Token::Ampersand),
            '|' => self.single(Token::Pipe),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            ',' => self.single(Token::Comma),
            ':' => self.single(Token::Colon),
            '=' => Ok(self.with_equals(Token::EqEq, Token::Equals)),
            '!' => Ok(self.with_equals(Token::NotEq, Token::Exclamation)),
            '~' => Ok(self.with_equals(Token::NotEq, Token::Tilde)),
            '<' => Ok(self.with_equals(Token::LtEq, Token::Lt)),
            '>' => Ok(self.with_equals(Token::GtEq, Token::Gt)),
            ch => Err(LexError::UnexpectedChar {
                position: start,
                ch,
            }),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    /// `with` when the next character is `=`, otherwise `without`.
    fn with_equals(&mut self, with: Token, without: Token) -> Token {
        self.advance();
        if self.current_char() == Some('=') {
            self.advance();
            with
        } else {
            without
        }
    }

    fn at_unsigned_number(&self, offset: usize) -> bool {
        match self.peek_char(offset) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_char(offset + 1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    /// `1:1`, `1:m`, `m:1`, `m:m`
    fn is_match_type(&self) -> bool {
        let end = (self.position + 4).min(self.input.len());
        let window: String = self.input[self.position..end].iter().collect();
        MATCH_TYPE.is_match(&window)
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            self.advance();
        }
    }

    fn read_number(&mut self, start: Position, mut text: String) -> Result<Token, LexError> {
        self.read_digits(&mut text);

        // Factor-variable level: `2.region`
        if !text.is_empty()
            && text.chars().all(|c| c.is_ascii_digit())
            && self.current_char() == Some('.')
            && self.at_name_start(1)
        {
            return self.read_word_from(start, text);
        }

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let exponent_digits = match self.peek_char(1) {
                Some('+' | '-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_digits {
                text.push('e');
                self.advance();
                if let Some(sign) = self.current_char().filter(|c| matches!(c, '+' | '-')) {
                    text.push(sign);
                    self.advance();
                }
                self.read_digits(&mut text);
            }
        }

        Number::parse(&text)
            .map(Token::Number)
            .ok_or(LexError::InvalidNumber {
                position: start,
                text,
            })
    }

    fn read_missing(&mut self) -> Token {
        self.advance(); // '.'
        match self.current_char() {
            Some(c)
                if c.is_ascii_lowercase()
                    && !self
                        .peek_char(1)
                        .is_some_and(|n| n.is_alphanumeric() || n == '_') =>
            {
                self.advance();
                Token::Number(Number::Missing(Some(c)))
            }
            _ => Token::Number(Number::Missing(None)),
        }
    }

    fn read_word(&mut self, start: Position) -> Result<Token, LexError> {
        self.read_word_from(start, String::new())
    }

    /// Identifier, keyword or date/time literal, continuing `word`.
    fn read_word_from(&mut self, start: Position, mut word: String) -> Result<Token, LexError> {
        loop {
            match self.current_char() {
                Some(c) if c.is_alphanumeric() || c == '_' => {
                    word.push(c);
                    self.advance();
                }
                Some('.') if self.at_name_start(1) => {
                    word.push('.');
                    self.advance();
                }
                Some('#') if self.at_name_start(1) || self.peek_char(1) == Some('#') => {
                    word.push('#');
                    self.advance();
                }
                Some('*' | '?' | '~')
                    if self.wildcard_ends_word() && !self.in_operand_context() =>
                {
                    word.extend(self.current_char());
                    self.advance();
                    break;
                }
                _ if self.at_local_macro() => self.expand_local()?,
                _ if self.at_global_macro() => self.expand_global()?,
                _ => break,
            }
        }

        if matches!(word.as_str(), "td" | "tc" | "tC") && self.current_char() == Some('(') {
            return self.read_datetime(start);
        }

        Ok(match word.as_str() {
            "if" => Token::If,
            "in" => Token::In,
            "using" => Token::Using,
            _ => Token::Identifier(word),
        })
    }

    fn in_operand_context(&self) -> bool {
        self.in_expression || self.after_operator
    }

    fn wildcard_ends_word(&self) -> bool {
        match self.peek_char(1) {
            None => true,
            Some(c) => c.is_whitespace() || matches!(c, ',' | ')' | ';'),
        }
    }

    fn read_datetime(&mut self, start: Position) -> Result<Token, LexError> {
        self.advance(); // '('
        let mut text = String::new();
        loop {
            match self.current_char() {
                Some(')') => {
                    self.advance();
                    break;
                }
                Some('\n') | None => {
                    return Err(LexError::InvalidDatetime {
                        position: start,
                        text,
                    });
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        Datetime::parse(&text)
            .map(Token::Datetime)
            .ok_or(LexError::InvalidDatetime {
                position: start,
                text,
            })
    }

    fn read_string(&mut self, start: Position) -> Result<Token, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        loop {
            match self.current_char() {
                None | Some('\n') => return Err(LexError::UnterminatedString(start)),
                Some('"') => {
                    self.advance();
                    return Ok(Token::String(result));
                }
                Some('\\') => match self.peek_char(1) {
                    Some(c @ ('"' | '\\' | '`' | '$')) => {
                        result.push(c);
                        self.advance_by(2);
                    }
                    _ => {
                        result.push('\\');
                        self.advance();
                    }
                },
                _ if self.at_local_macro() => self.expand_local()?,
                _ if self.at_global_macro() => self.expand_global()?,
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    /// `` `"..."' ``, which may nest and may hold plain double quotes.
    fn read_compound_string(&mut self, start: Position) -> Result<Token, LexError> {
        let mut result = String::new();
        let mut depth = 1usize;
        self.advance_by(2);

        loop {
            if self.starts_with("`\"") {
                depth += 1;
                result.push_str("`\"");
                self.advance_by(2);
                continue;
            }
            if self.starts_with("\"'") {
                depth -= 1;
                self.advance_by(2);
                if depth == 0 {
                    return Ok(Token::String(result));
                }
                result.push_str("\"'");
                continue;
            }

            match self.current_char() {
                None | Some('\n') => return Err(LexError::UnterminatedString(start)),
                Some('\\') if matches!(self.peek_char(1), Some('`' | '$')) => {
                    result.extend(self.peek_char(1));
                    self.advance_by(2);
                }
                _ if self.at_local_macro() => self.expand_local()?,
                _ if self.at_global_macro() => self.expand_global()?,
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Unquoted filename after `using`.
    fn read_raw_word(&mut self) -> Result<Token, LexError> {
        let mut word = String::new();
        loop {
            match self.current_char() {
                None => break,
                Some(c) if c.is_whitespace() || c == ',' => break,
                Some(';') if self.delimiter == Delimiter::Semicolon => break,
                _ if self.at_local_macro() => self.expand_local()?,
                _ if self.at_global_macro() => self.expand_global()?,
                Some(c) => {
                    word.push(c);
                    self.advance();
                }
            }
        }
        Ok(Token::String(word))
    }

    fn read_embedded(&mut self, start: Position) -> Result<Token, LexError> {
        let open_len = self.embedded.open.chars().count();
        let close = self.embedded.close.clone();
        self.advance_by(open_len);

        let mut text = String::new();
        while !self.starts_with(&close) {
            match self.current_char() {
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
                None => {
                    return Err(LexError::UnterminatedEmbedded {
                        position: start,
                        close,
                    });
                }
            }
        }
        self.advance_by(close.chars().count());
        trace!(bytes = text.len(), "embedded block captured");
        Ok(Token::Embedded(text))
    }

    /// Replaces the `` `name' `` starting at the cursor with its value and
    /// leaves the cursor at the start of the substituted text. Nested
    /// references inside the name are expanded first.
    fn expand_local(&mut self) -> Result<(), LexError> {
        let start = self.position();
        let open = self.position;
        self.position += 1;

        let mut name = String::new();
        loop {
            match self.current_char() {
                Some('\'') => break,
                None | Some('\n') => return Err(LexError::UnterminatedMacro(start)),
                _ if self.at_local_macro() => self.expand_local()?,
                _ if self.at_global_macro() => self.expand_global()?,
                Some(c) => {
                    name.push(c);
                    self.position += 1;
                }
            }
        }

        let end = self.position;
        self.substitute(open, end, &name, start)
    }

    /// Replaces `$name` or `${name}` at the cursor with its value.
    fn expand_global(&mut self) -> Result<(), LexError> {
        let start = self.position();
        let open = self.position;
        self.position += 1;

        let mut name = String::from("$");
        let end = if self.current_char() == Some('{') {
            self.position += 1;
            loop {
                match self.current_char() {
                    Some('}') => break self.position,
                    None | Some('\n') => return Err(LexError::UnterminatedMacro(start)),
                    _ if self.at_local_macro() => self.expand_local()?,
                    Some(c) => {
                        name.push(c);
                        self.position += 1;
                    }
                }
            }
        } else {
            while let Some(c) = self
                .current_char()
                .filter(|c| c.is_alphanumeric() || *c == '_')
            {
                name.push(c);
                self.position += 1;
            }
            self.position - 1
        };

        self.substitute(open, end, &name, start)
    }

    /// Splices the value of `name` over `input[open..=end]` and rewinds the
    /// cursor to `open`. Substitutions are only counted while the cursor is
    /// still inside text produced by earlier ones.
    fn substitute(
        &mut self,
        open: usize,
        end: usize,
        name: &str,
        start: Position,
    ) -> Result<(), LexError> {
        if open >= self.expanded_until {
            self.expansions = 0;
        }
        self.expansions += 1;
        if self.expansions > MAX_NESTED_EXPANSIONS {
            return Err(LexError::MacroExpansionLimit(start));
        }

        let value = self.resolve(name, start)?;
        let inserted = value.chars().count();
        let removed = end + 1 - open;
        self.input.splice(open..=end, value.chars());

        self.expanded_until = if open < self.expanded_until {
            self.expanded_until.max(end + 1) - removed + inserted
        } else {
            open + inserted
        };
        self.position = open;
        Ok(())
    }

    fn resolve(&mut self, name: &str, position: Position) -> Result<String, LexError> {

        let value = self.macros.as_mut().and_then(|macros| macros.lookup(name));
        match (value, self.macro_policy) {
            (Some(value), _) => {
                trace!(name, value = %value, "macro substituted");
                Ok(value)
            }
            (None, MacroPolicy::Empty) => Ok(String::new()),
            (None, MacroPolicy::Error) => Err(LexError::UnresolvedMacro {
                position,
                name: name.to_string(),
            }),
        }
    }
}
