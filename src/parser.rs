use std::collections::VecDeque;

use thiserror::Error;
use tracing::{trace, warn};

use crate::{
    ast::{
        BinOp, Block, Branch, Command, CommandOption, EmbeddedCode, Expr, Modifier, Number, Op,
        RangeBound, Script, Token, UnaryOp,
    },
    builder::{BuilderError, CommandBuilder},
    lexer::{LexError, Lexer, Position, SpannedToken},
    options::{ParseOptions, RecoveryPolicy},
};

/// Anything that stops a command from being recognized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(LexError),

    #[error("{position}: syntax error: {message}")]
    Syntax { position: Position, message: String },

    #[error("{position}: macro `{name}' could not be resolved")]
    MacroResolution { position: Position, name: String },

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error("command callback failed: {0}")]
    Callback(String),
}

impl ParseError {
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::Lex(err) => Some(err.position()),
            ParseError::Syntax { position, .. } | ParseError::MacroResolution { position, .. } => {
                Some(*position)
            }
            ParseError::Builder(_) | ParseError::Callback(_) => None,
        }
    }

    fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Syntax { .. })
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        match err {
            LexError::UnresolvedMacro { position, name } => {
                ParseError::MacroResolution { position, name }
            }
            other => ParseError::Lex(other),
        }
    }
}

/// One step of the shift/reduce trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Shift { token: Token },
    Reduce { rule: &'static str },
}

/// Mutable state of one parse, owned by the caller and handed to the engine.
#[derive(Debug, Default)]
pub struct ParseState {
    pub debug_level: u8,
    pub recovery: RecoveryPolicy,
    pub errors: Vec<ParseError>,
    pub trace: Vec<TraceEvent>,
    /// Top-level commands handed to the sink.
    pub delivered: usize,
    /// The parse stopped before the end of input.
    pub aborted: bool,
}

impl ParseState {
    pub fn new(options: &ParseOptions) -> Self {
        ParseState {
            debug_level: options.debug_level,
            recovery: options.recovery,
            ..Self::default()
        }
    }

    pub fn error_seen(&self) -> bool {
        !self.errors.is_empty()
    }

    fn shift(&mut self, token: &Token) {
        trace!(%token, "shift");
        if self.debug_level >= 2 {
            self.trace.push(TraceEvent::Shift {
                token: token.clone(),
            });
        }
    }

    fn reduce(&mut self, rule: &'static str) {
        trace!(rule, "reduce");
        if self.debug_level >= 1 {
            self.trace.push(TraceEvent::Reduce { rule });
        }
    }
}

/// Receives each top-level command as soon as it is recognized.
pub trait CommandSink {
    fn accept(&mut self, command: Command) -> Result<(), String>;
}

impl CommandSink for Vec<Command> {
    fn accept(&mut self, command: Command) -> Result<(), String> {
        self.push(command);
        Ok(())
    }
}

/// Operator waiting on the stack for its right operand.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Unary(UnaryOp),
    Binary(BinOp),
}

impl Pending {
    fn precedence(self) -> u8 {
        match self {
            Pending::Unary(_) => UnaryOp::PRECEDENCE,
            Pending::Binary(op) => op.precedence(),
        }
    }
}

pub struct Parser<'m> {
    lexer: Lexer<'m>,
    lookahead: VecDeque<SpannedToken>,
}

impl<'m> Parser<'m> {
    pub fn new(mut lexer: Lexer<'m>) -> Result<Self, ParseError> {
        let first = lexer.next_spanned()?;
        Ok(Parser {
            lexer,
            lookahead: VecDeque::from([first]),
        })
    }

    fn peek(&mut self, n: usize) -> Result<&SpannedToken, ParseError> {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_spanned()?;
            self.lookahead.push_back(token);
        }
        Ok(&self.lookahead[n])
    }

    fn peek_token(&mut self, n: usize) -> Result<Token, ParseError> {
        Ok(self.peek(n)?.token.clone())
    }

    /// The token at `n` touches the one before it.
    fn adjacent(&mut self, n: usize) -> Result<bool, ParseError> {
        Ok(!self.peek(n)?.spaced)
    }

    fn check(&mut self, token: &Token) -> Result<bool, ParseError> {
        Ok(&self.peek(0)?.token == token)
    }

    fn bump(&mut self, state: &mut ParseState) -> Result<SpannedToken, ParseError> {
        let token = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.lexer.next_spanned()?,
        };
        state.shift(&token.token);
        Ok(token)
    }

    fn expect(&mut self, expected: Token, state: &mut ParseState) -> Result<(), ParseError> {
        if self.check(&expected)? {
            self.bump(state)?;
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", expected)))
        }
    }

    fn unexpected(&mut self, expected: &str) -> ParseError {
        match self.peek(0) {
            Ok(found) => ParseError::Syntax {
                position: found.span.start,
                message: format!("expected {}, found {}", expected, found.token),
            },
            Err(err) => err,
        }
    }

    fn skip_terminators(&mut self, state: &mut ParseState) -> Result<(), ParseError> {
        while self.check(&Token::EndOfCommand)? {
            self.bump(state)?;
        }
        Ok(())
    }

    /// Parses a single expression spanning the whole input.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let mut state = ParseState::default();
        let expr = self.parse_expression(&mut state)?;
        self.skip_terminators(&mut state)?;
        self.expect(Token::Eof, &mut state)?;
        Ok(expr)
    }

    /// Parses the whole input, stopping at the first error.
    pub fn parse_script(&mut self) -> Result<Script, ParseError> {
        let mut state = ParseState::default();
        let mut commands = Vec::new();
        self.run(&mut state, &mut commands);
        match state.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(Script::new(commands)),
        }
    }

    /// Recognizes commands until the end of input, handing each completed
    /// top-level command to `sink`. Errors are recorded in `state`; whether a
    /// syntax error stops the run depends on `state.recovery`.
    pub fn run(&mut self, state: &mut ParseState, sink: &mut dyn CommandSink) {
        loop {
            let command = match self.next_command(state) {
                Ok(Some(command)) => command,
                Ok(None) => break,
                Err(err) => match self.recover(state, err) {
                    Ok(()) => continue,
                    Err(fatal) => {
                        warn!(error = %fatal, "parse aborted");
                        state.errors.push(fatal);
                        state.aborted = true;
                        break;
                    }
                },
            };

            if let Err(message) = sink.accept(command) {
                warn!(%message, "command callback failed");
                state.errors.push(ParseError::Callback(message));
                state.aborted = true;
                break;
            }
            state.delivered += 1;
        }
    }

    fn next_command(&mut self, state: &mut ParseState) -> Result<Option<Command>, ParseError> {
        self.skip_terminators(state)?;
        if self.check(&Token::Eof)? {
            return Ok(None);
        }
        self.parse_command(state, false).map(Some)
    }

    /// Records a recoverable error and skips to the next command boundary,
    /// or hands the error back when it must stop the parse.
    fn recover(&mut self, state: &mut ParseState, err: ParseError) -> Result<(), ParseError> {
        if !err.is_syntax() || state.recovery == RecoveryPolicy::Abort {
            return Err(err);
        }

        warn!(error = %err, "skipping command");
        state.errors.push(err);
        while !self.peek(0)?.token.is_terminator() {
            self.bump(state)?;
        }
        self.skip_terminators(state)
    }

    fn parse_command(&mut self, state: &mut ParseState, nested: bool) -> Result<Command, ParseError> {
        if let Token::Embedded(text) = self.peek_token(0)? {
            self.bump(state)?;
            state.reduce("embedded");
            return Ok(Command::Embedded(EmbeddedCode { text }));
        }

        let mut builder = CommandBuilder::new();

        let mut modifiers = Vec::new();
        while self.at_modifier()? {
            modifiers.push(self.parse_modifier(state)?);
        }
        if !modifiers.is_empty() {
            builder.modifiers(modifiers);
        }

        match self.peek_token(0)? {
            Token::Identifier(verb) => {
                self.bump(state)?;
                builder.verb(verb);
                self.parse_arguments(&mut builder, state)?;
            }
            // `if exp {` is a command of its own
            Token::If => {
                self.bump(state)?;
                builder.verb("if");
                let condition = self.parse_expression(state)?;
                builder.if_exp(condition);
            }
            _ => return Err(self.unexpected("a command")),
        }

        self.parse_clauses(&mut builder, state)?;
        let header = builder.build()?;

        if self.check(&Token::LBrace)? {
            self.bump(state)?;
            let body = self.parse_block_body(state)?;
            state.reduce("block");
            return Ok(Command::Block(Block { header, body }));
        }

        match self.peek_token(0)? {
            Token::EndOfCommand => {
                self.bump(state)?;
            }
            Token::Eof => {}
            Token::RBrace if nested => {}
            _ => return Err(self.unexpected("end of command")),
        }

        state.reduce("command");
        Ok(Command::General(header))
    }

    fn parse_block_body(&mut self, state: &mut ParseState) -> Result<Vec<Command>, ParseError> {
        let mut body = Vec::new();
        loop {
            self.skip_terminators(state)?;
            match self.peek_token(0)? {
                Token::RBrace => {
                    self.bump(state)?;
                    return Ok(body);
                }
                Token::Eof => return Err(self.unexpected("`}`")),
                _ => match self.parse_command(state, true) {
                    Ok(command) => body.push(command),
                    Err(err) => self.recover(state, err)?,
                },
            }
        }
    }

    /// A modifier prefix ends in a colon that touches the token before it,
    /// with only names, numbers, commas and parentheses in between.
    fn at_modifier(&mut self) -> Result<bool, ParseError> {
        if !matches!(self.peek(0)?.token, Token::Identifier(_)) {
            return Ok(false);
        }

        let mut n = 1;
        loop {
            let next = self.peek(n)?;
            match next.token {
                Token::Colon => return Ok(!next.spaced),
                Token::Identifier(_)
                | Token::Number(_)
                | Token::Comma
                | Token::LParen
                | Token::RParen => n += 1,
                _ => return Ok(false),
            }
        }
    }

    fn parse_modifier(&mut self, state: &mut ParseState) -> Result<Modifier, ParseError> {
        let Token::Identifier(name) = self.bump(state)?.token else {
            return Err(self.unexpected("a modifier name"));
        };

        let mut args = Vec::new();
        let mut options = None;
        loop {
            match self.peek_token(0)? {
                Token::Identifier(arg) => {
                    self.bump(state)?;
                    args.push(Expr::Ident(arg));
                }
                Token::Number(n) => {
                    self.bump(state)?;
                    args.push(Expr::Number(n));
                }
                Token::LParen => args.push(self.parse_name_group(state)?),
                Token::Comma => {
                    self.bump(state)?;
                    options = Some(self.parse_options(state)?);
                }
                _ => break,
            }
        }

        self.expect(Token::Colon, state)?;
        state.reduce("modifier");
        Ok(Modifier {
            name,
            args,
            options,
        })
    }

    /// `(year)` in `bysort id (year):`
    fn parse_name_group(&mut self, state: &mut ParseState) -> Result<Expr, ParseError> {
        self.bump(state)?; // consume (
        let mut names = Vec::new();
        loop {
            match self.peek_token(0)? {
                Token::Identifier(name) => {
                    self.bump(state)?;
                    names.push(Expr::Ident(name));
                }
                Token::Number(n) => {
                    self.bump(state)?;
                    names.push(Expr::Number(n));
                }
                Token::RParen => {
                    self.bump(state)?;
                    break;
                }
                _ => return Err(self.unexpected("a name or `)`")),
            }
        }
        state.reduce("group");
        Ok(Expr::Branch(Branch::new(Op::Group, names)))
    }

    /// Varlist items and an optional `target = exp`.
    fn parse_arguments(
        &mut self,
        builder: &mut CommandBuilder,
        state: &mut ParseState,
    ) -> Result<(), ParseError> {
        let mut items = Vec::new();

        loop {
            let token = self.peek_token(0)?;
            if token == Token::In && self.at_range()? {
                break;
            }
            if token == Token::LBracket && self.at_weight()? {
                break;
            }

            if Self::starts_item(&token) {
                items.push(self.parse_item(state)?);
            } else if token == Token::Equals {
                // `generate double y = ...`: the last name is the target
                let Some(Expr::Ident(target)) = items.pop() else {
                    return Err(self.unexpected("a command argument"));
                };
                self.bump(state)?;
                let value = self.parse_expression(state)?;
                builder.assignment(target, value);
                state.reduce("assignment");
                break;
            } else {
                break;
            }
        }

        if !items.is_empty() {
            builder.varlist(items);
            state.reduce("varlist");
        }
        Ok(())
    }

    /// `if`, `in`, weight, `using` and options, in that order except that
    /// `if` and `in` may be swapped.
    fn parse_clauses(
        &mut self,
        builder: &mut CommandBuilder,
        state: &mut ParseState,
    ) -> Result<(), ParseError> {
        loop {
            match self.peek_token(0)? {
                Token::If if !builder.has_if() => {
                    self.bump(state)?;
                    let condition = self.parse_expression(state)?;
                    builder.if_exp(condition);
                    state.reduce("if_clause");
                }
                Token::In if !builder.has_range() && self.at_range()? => {
                    self.parse_range(builder, state)?;
                }
                _ => break,
            }
        }

        if self.check(&Token::LBracket)? && self.at_weight()? {
            self.bump(state)?; // consume [
            let kind = self.expect_name("a weight type", state)?;
            self.expect(Token::Equals, state)?;
            let column = self.expect_name("a weight variable", state)?;
            self.expect(Token::RBracket, state)?;
            builder.weight(kind, column);
            state.reduce("weight_clause");
        }

        if self.check(&Token::Using)? {
            self.bump(state)?;
            match self.peek_token(0)? {
                Token::String(filename) => {
                    self.bump(state)?;
                    builder.using(filename);
                    state.reduce("using_clause");
                }
                _ => return Err(self.unexpected("a filename")),
            }
        }

        if self.check(&Token::Comma)? {
            self.bump(state)?;
            let options = self.parse_options(state)?;
            builder.options(options);
            state.reduce("option_clause");
        }

        Ok(())
    }

    fn expect_name(&mut self, what: &str, state: &mut ParseState) -> Result<String, ParseError> {
        match self.peek_token(0)? {
            Token::Identifier(name) => {
                self.bump(state)?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn bound_at(&mut self, n: usize) -> Result<Option<RangeBound>, ParseError> {
        Ok(match &self.peek(n)?.token {
            Token::Number(Number::Missing(None)) => Some(RangeBound::Unbounded),
            Token::Number(number) => number.as_integer().map(RangeBound::Index),
            Token::Identifier(name) => match name.as_str() {
                "f" | "F" => Some(RangeBound::First),
                "l" | "L" => Some(RangeBound::Last),
                _ => None,
            },
            _ => None,
        })
    }

    /// `in` followed by `bound[/bound]` and then something that may follow a
    /// range. Anything else makes `in` an ordinary word, as in `foreach v in a b`.
    fn at_range(&mut self) -> Result<bool, ParseError> {
        if self.bound_at(1)?.is_none() {
            return Ok(false);
        }
        let mut n = 2;
        if self.peek(2)?.token == Token::Slash {
            if self.bound_at(3)?.is_none() {
                return Ok(false);
            }
            n = 4;
        }
        Ok(matches!(
            self.peek(n)?.token,
            Token::EndOfCommand
                | Token::Eof
                | Token::If
                | Token::Using
                | Token::Comma
                | Token::LBracket
        ))
    }

    fn parse_range(
        &mut self,
        builder: &mut CommandBuilder,
        state: &mut ParseState,
    ) -> Result<(), ParseError> {
        self.bump(state)?; // consume in
        let lower = self.parse_bound(state)?;
        let upper = if self.check(&Token::Slash)? {
            self.bump(state)?;
            self.parse_bound(state)?
        } else {
            lower
        };
        builder.range(lower, upper);
        state.reduce("range_clause");
        Ok(())
    }

    fn parse_bound(&mut self, state: &mut ParseState) -> Result<RangeBound, ParseError> {
        match self.bound_at(0)? {
            Some(bound) => {
                self.bump(state)?;
                Ok(bound)
            }
            None => Err(self.unexpected("a range bound")),
        }
    }

    /// `[kind=...` as opposed to a subscript.
    fn at_weight(&mut self) -> Result<bool, ParseError> {
        Ok(self.peek(0)?.token == Token::LBracket
            && matches!(self.peek(1)?.token, Token::Identifier(_))
            && self.peek(2)?.token == Token::Equals)
    }

    /// Options after a comma: `name` or `name(args [, suboptions])`,
    /// separated by whitespace.
    fn parse_options(&mut self, state: &mut ParseState) -> Result<Vec<CommandOption>, ParseError> {
        let mut options = Vec::new();

        while let Token::Identifier(name) = self.peek_token(0)? {
            self.bump(state)?;
            let option = if self.check(&Token::LParen)? && self.adjacent(0)? {
                self.parse_option_arguments(name, state)?
            } else {
                CommandOption::flag(name)
            };
            state.reduce("option");
            options.push(option);
        }

        Ok(options)
    }

    fn parse_option_arguments(
        &mut self,
        name: String,
        state: &mut ParseState,
    ) -> Result<CommandOption, ParseError> {
        self.bump(state)?; // consume (
        let mut args = Vec::new();
        let mut suboptions = None;

        loop {
            let token = self.peek_token(0)?;
            match token {
                Token::RParen => {
                    self.bump(state)?;
                    break;
                }
                Token::Comma => {
                    self.bump(state)?;
                    suboptions = Some(self.parse_options(state)?);
                    self.expect(Token::RParen, state)?;
                    break;
                }
                _ if Self::starts_item(&token) => args.push(self.parse_item(state)?),
                _ => return Err(self.unexpected("an option argument or `)`")),
            }
        }

        Ok(CommandOption {
            name,
            args: Some(args),
            suboptions,
        })
    }

    fn starts_item(token: &Token) -> bool {
        matches!(
            token,
            Token::Number(_)
                | Token::String(_)
                | Token::Datetime(_)
                | Token::Identifier(_)
                | Token::LParen
                | Token::Minus
                | Token::Exclamation
                | Token::Tilde
                | Token::In
        )
    }

    /// One list item; a stray `in` is taken as a plain word.
    fn parse_item(&mut self, state: &mut ParseState) -> Result<Expr, ParseError> {
        if self.check(&Token::In)? {
            self.bump(state)?;
            return Ok(Expr::ident("in"));
        }
        self.parse_expression(state)
    }

    /// Items up to a `,` or `)`: one item stands for itself, several form a group.
    fn parse_item_sequence(&mut self, state: &mut ParseState) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        while Self::starts_item(&self.peek_token(0)?) {
            items.push(self.parse_item(state)?);
        }

        match items.len() {
            0 => Err(self.unexpected("an expression")),
            1 => Ok(items.remove(0)),
            _ => {
                state.reduce("group");
                Ok(Expr::Branch(Branch::new(Op::Group, items)))
            }
        }
    }

    fn prefix_operator(&mut self) -> Result<Option<UnaryOp>, ParseError> {
        Ok(match self.peek(0)?.token {
            Token::Minus => Some(UnaryOp::Negate),
            Token::Exclamation | Token::Tilde => Some(UnaryOp::Not),
            _ => None,
        })
    }

    fn binary_operator(&mut self) -> Result<Option<BinOp>, ParseError> {
        Ok(match self.peek(0)?.token {
            Token::Pipe => Some(BinOp::Or),
            Token::Ampersand => Some(BinOp::And),
            Token::EqEq => Some(BinOp::Equal),
            Token::NotEq => Some(BinOp::NotEqual),
            Token::Lt => Some(BinOp::LessThan),
            Token::LtEq => Some(BinOp::LessEqual),
            Token::Gt => Some(BinOp::GreaterThan),
            Token::GtEq => Some(BinOp::GreaterEqual),
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Subtract),
            Token::Star => Some(BinOp::Multiply),
            Token::Slash => Some(BinOp::Divide),
            Token::Caret => Some(BinOp::Power),
            _ => None,
        })
    }

    /// Operator-precedence shift/reduce over an operand stack and an
    /// operator stack. An incoming binary operator first reduces every
    /// stacked operator that binds at least as tightly, which makes all
    /// binaries left-associative.
    pub fn parse_expression(&mut self, state: &mut ParseState) -> Result<Expr, ParseError> {
        let mut operands: Vec<Expr> = Vec::new();
        let mut operators: Vec<Pending> = Vec::new();

        loop {
            while let Some(op) = self.prefix_operator()? {
                self.bump(state)?;
                operators.push(Pending::Unary(op));
            }
            operands.push(self.parse_primary(state)?);

            let Some(op) = self.binary_operator()? else {
                break;
            };
            while operators
                .last()
                .is_some_and(|top| top.precedence() >= op.precedence())
            {
                self.reduce(&mut operands, &mut operators, state)?;
            }
            self.bump(state)?;
            operators.push(Pending::Binary(op));
        }

        while !operators.is_empty() {
            self.reduce(&mut operands, &mut operators, state)?;
        }

        match (operands.pop(), operands.is_empty()) {
            (Some(expr), true) => Ok(expr),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn reduce(
        &mut self,
        operands: &mut Vec<Expr>,
        operators: &mut Vec<Pending>,
        state: &mut ParseState,
    ) -> Result<(), ParseError> {
        let reduced = match operators.pop() {
            Some(Pending::Unary(op)) => operands.pop().map(|operand| {
                state.reduce("unary_expr");
                Expr::unary(op, operand)
            }),
            Some(Pending::Binary(op)) => match (operands.pop(), operands.pop()) {
                (Some(right), Some(left)) => {
                    state.reduce("binary_expr");
                    Some(Expr::binary(op, left, right))
                }
                _ => None,
            },
            None => None,
        };

        match reduced {
            Some(expr) => {
                operands.push(expr);
                Ok(())
            }
            None => Err(self.unexpected("an operand")),
        }
    }

    fn parse_primary(&mut self, state: &mut ParseState) -> Result<Expr, ParseError> {
        let token = self.peek_token(0)?;
        let expr = match token {
            Token::Number(n) => {
                self.bump(state)?;
                Expr::Number(n)
            }
            Token::String(s) => {
                self.bump(state)?;
                Expr::String(s)
            }
            Token::Datetime(dt) => {
                self.bump(state)?;
                Expr::Datetime(dt)
            }
            Token::Identifier(name) => {
                self.bump(state)?;
                if self.check(&Token::LParen)? && self.adjacent(0)? {
                    return self.parse_call(name, state);
                }
                if self.check(&Token::LBracket)? && self.adjacent(0)? && !self.at_weight()? {
                    return self.parse_subscript(name, state);
                }
                Expr::Ident(name)
            }
            Token::LParen => {
                self.bump(state)?;
                let inner = self.parse_item_sequence(state)?;
                self.expect(Token::RParen, state)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("an expression")),
        };

        state.reduce("primary");
        Ok(expr)
    }

    fn parse_call(&mut self, name: String, state: &mut ParseState) -> Result<Expr, ParseError> {
        self.bump(state)?; // consume (
        let mut args = Vec::new();

        if self.check(&Token::RParen)? {
            self.bump(state)?;
        } else {
            loop {
                args.push(self.parse_item_sequence(state)?);
                match self.peek_token(0)? {
                    Token::Comma => {
                        self.bump(state)?;
                    }
                    Token::RParen => {
                        self.bump(state)?;
                        break;
                    }
                    _ => return Err(self.unexpected("`,` or `)`")),
                }
            }
        }

        state.reduce("call");
        Ok(Expr::call(name, args))
    }

    fn parse_subscript(&mut self, name: String, state: &mut ParseState) -> Result<Expr, ParseError> {
        self.bump(state)?; // consume [
        let index = self.parse_expression(state)?;
        self.expect(Token::RBracket, state)?;
        state.reduce("subscript");
        Ok(Expr::Branch(Branch::new(
            Op::Subscript,
            vec![Expr::Ident(name), index],
        )))
    }
}
