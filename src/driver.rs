//! Runs the lexer and grammar engine over whole scripts.
//!
//! Batch parsing collects every command into a [`Script`]; streaming hands
//! each top-level command to a callback and drops it. Both go through the
//! same engine and differ only in the [`CommandSink`] they supply.

use std::fmt::Display;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Command, Script},
    lexer::{Lexer, MacroLookup, NoMacros},
    options::ParseOptions,
    parser::{CommandSink, ParseError, ParseState, Parser, TraceEvent},
};

/// Batch parse failure. No partial tree is returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse failed with {} error(s)", .errors.len())]
pub struct ParseFailure {
    pub errors: Vec<ParseError>,
}

impl ParseFailure {
    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }
}

/// How a streaming parse ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// Every command was recognized and delivered.
    Complete { delivered: usize },
    /// Reached the end of input after skipping commands with syntax errors.
    Recovered { delivered: usize, errors: usize },
    /// Stopped early on a fatal error or a failing callback.
    Aborted { delivered: usize },
}

impl ParseStatus {
    pub fn delivered(&self) -> usize {
        match *self {
            ParseStatus::Complete { delivered }
            | ParseStatus::Recovered { delivered, .. }
            | ParseStatus::Aborted { delivered } => delivered,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ParseStatus::Complete { .. })
    }
}

struct CallbackSink<'f> {
    on_command: &'f mut dyn FnMut(&Command) -> Result<(), String>,
}

impl CommandSink for CallbackSink<'_> {
    fn accept(&mut self, command: Command) -> Result<(), String> {
        (self.on_command)(&command)
    }
}

/// Summary of one engine run.
struct Run {
    delivered: usize,
    aborted: bool,
}

pub struct Driver {
    options: ParseOptions,
    errors: Vec<ParseError>,
    trace: Vec<TraceEvent>,
}

impl Driver {
    pub fn new(options: ParseOptions) -> Self {
        Driver {
            options,
            errors: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Errors recorded by the most recent parse.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Shift/reduce trace of the most recent parse; empty at debug level 0.
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    pub fn parse(&mut self, text: &str) -> Result<Script, ParseFailure> {
        self.parse_with_macros(text, &mut NoMacros)
    }

    /// Parses `text`, resolving macro references through `macros`.
    pub fn parse_with_macros(
        &mut self,
        text: &str,
        macros: &mut dyn MacroLookup,
    ) -> Result<Script, ParseFailure> {
        let mut commands: Vec<Command> = Vec::new();
        self.execute(text, macros, &mut commands);

        if self.errors.is_empty() {
            Ok(Script::new(commands))
        } else {
            Err(ParseFailure {
                errors: self.errors.clone(),
            })
        }
    }

    /// Hands each top-level command to `on_command` as soon as it is
    /// recognized. An error from the callback stops the parse.
    pub fn parse_streaming<F, E>(
        &mut self,
        text: &str,
        mut on_command: F,
        macros: &mut dyn MacroLookup,
    ) -> ParseStatus
    where
        F: FnMut(&Command) -> Result<(), E>,
        E: Display,
    {
        let mut forward = |command: &Command| on_command(command).map_err(|err| err.to_string());
        let mut sink = CallbackSink {
            on_command: &mut forward,
        };
        let run = self.execute(text, macros, &mut sink);

        if run.aborted {
            ParseStatus::Aborted {
                delivered: run.delivered,
            }
        } else if self.errors.is_empty() {
            ParseStatus::Complete {
                delivered: run.delivered,
            }
        } else {
            ParseStatus::Recovered {
                delivered: run.delivered,
                errors: self.errors.len(),
            }
        }
    }

    fn execute(&mut self, text: &str, macros: &mut dyn MacroLookup, sink: &mut dyn CommandSink) -> Run {
        let mut state = ParseState::new(&self.options);
        let lexer = Lexer::with_macros(text, macros).configure(&self.options);

        match Parser::new(lexer) {
            Ok(mut parser) => parser.run(&mut state, sink),
            Err(err) => {
                state.errors.push(err);
                state.aborted = true;
            }
        }

        debug!(
            commands = state.delivered,
            errors = state.errors.len(),
            aborted = state.aborted,
            "parse finished"
        );

        self.errors = state.errors;
        self.trace = state.trace;
        Run {
            delivered: state.delivered,
            aborted: state.aborted,
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new(ParseOptions::default())
    }
}

/// Parses `text` with default options.
pub fn parse(text: &str) -> Result<Script, ParseFailure> {
    Driver::default().parse(text)
}

pub fn parse_with_options(text: &str, options: ParseOptions) -> Result<Script, ParseFailure> {
    Driver::new(options).parse(text)
}
