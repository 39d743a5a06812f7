pub mod ast;
pub mod builder;
#[cfg(feature = "cli")]
pub mod cli;
pub mod driver;
pub mod lexer;
pub mod options;
pub mod output;
pub mod parser;
pub mod printer;

pub use ast::{BinOp, Command, Expr, GeneralCommand, NodeKind, NodeRef, Script, Token};
pub use builder::{BuilderError, CommandBuilder};
pub use driver::{Driver, ParseFailure, ParseStatus, parse, parse_with_options};
pub use lexer::{LexError, Lexer, MacroLookup, NoMacros, Position, Span};
pub use options::{MacroPolicy, ParseOptions, RecoveryPolicy};
pub use output::{to_host, to_json, to_json_pretty};
pub use parser::{CommandSink, ParseError, ParseState, Parser, TraceEvent};
