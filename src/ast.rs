//! # Abstract Syntax Tree for Stata-style command scripts
//!
//! This module defines the tree the parser builds from a `.do` or `.ado`
//! script. The tree is a complete, order-preserving structural picture of the
//! source; it does not interpret anything.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals and branches)
//! - **[operators]** - Operator and branch tags
//! - **[commands]** - Command nodes (general, embedded, block)
//! - **[script]** - The ordered command sequence
//! - **[node]** - Borrowed view over every node kind
//!
//! ## Command Shape
//!
//! Each non-compound command follows one pattern:
//!
//! ```text
//! [modifier [args]:] verb [varlist | var = exp] [if exp] [in range] [weight] [using filename] [, options]
//! ```
//!
//! For example:
//!
//! ```text
//! bysort id (year): generate growth = gdp / gdp[_n-1] - 1 if year > 1990,
//! regress y x1 x2 in 1/500 [aw=pop], robust level(90)
//! merge m:1 id using "data/regions.dta", nogenerate
//! ```
//!
//! ## Ownership
//!
//! Every node owns its children outright. Dropping a [`Script`] drops the
//! whole tree; nothing is shared.
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod commands;
pub mod script;
pub mod node;

pub use tokens::Token;
pub use expressions::{Branch, Datetime, Expr, Number};
pub use operators::{BinOp, Op, UnaryOp};
pub use commands::{
    Assignment, Block, Command, CommandOption, EmbeddedCode, GeneralCommand, Modifier, Range,
    RangeBound, Weight,
};
pub use script::Script;
pub use node::{NodeKind, NodeRef};
