use crate::ast::Expr;

/// One script command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ordinary command following the general syntax
    ///
    /// # Example
    /// ```text
    /// by region: regress income age if year > 2000 in 1/500 [aw=pop], robust
    /// ```
    General(GeneralCommand),

    /// Foreign source captured verbatim between the embedded-block delimiters
    Embedded(EmbeddedCode),

    /// Command whose line opens a `{ ... }` block
    ///
    /// # Example
    /// ```text
    /// foreach v of varlist x y {
    ///     summarize `v'
    /// }
    /// ```
    Block(Block),
}

impl Command {
    /// Verb of the command; embedded blocks have none.
    pub fn verb(&self) -> Option<&str> {
        match self {
            Command::General(cmd) => Some(&cmd.verb),
            Command::Block(block) => Some(&block.header.verb),
            Command::Embedded(_) => None,
        }
    }

    pub fn as_general(&self) -> Option<&GeneralCommand> {
        match self {
            Command::General(cmd) => Some(cmd),
            _ => None,
        }
    }
}

/// The general command:
///
/// ```text
/// [modifier [args] [, opts]:]... verb [varlist | var = exp] [if exp] [in range] [weight] [using filename] [, options]
/// ```
///
/// Every optional part is `None` when the source omits it. Build one with
/// [`CommandBuilder`](crate::builder::CommandBuilder).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralCommand {
    pub verb: String,
    pub modifiers: Option<Vec<Modifier>>,
    /// Arguments after the verb, in source order
    pub varlist: Option<Vec<Expr>>,
    pub assignment: Option<Assignment>,
    pub if_exp: Option<Expr>,
    pub range: Option<Range>,
    pub weight: Option<Weight>,
    pub using: Option<String>,
    /// `Some(vec![])` for a trailing comma with no options after it
    pub options: Option<Vec<CommandOption>>,
}

/// Prefix such as `by region:` or `bysort id (year):`.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub name: String,
    pub args: Vec<Expr>,
    pub options: Option<Vec<CommandOption>>,
}

/// One option after the comma.
///
/// # Examples
/// ```text
/// robust                  // args: None
/// level(90)               // args: Some([90])
/// saving(results, replace) // args: Some([results]), suboptions: Some([replace])
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub args: Option<Vec<Expr>>,
    pub suboptions: Option<Vec<CommandOption>>,
}

impl CommandOption {
    pub fn flag(name: impl Into<String>) -> Self {
        CommandOption {
            name: name.into(),
            args: None,
            suboptions: None,
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Expr>) -> Self {
        CommandOption {
            name: name.into(),
            args: Some(args),
            suboptions: None,
        }
    }
}

/// `var = exp`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub value: Expr,
}

/// Inclusive observation range from `in lower/upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub lower: RangeBound,
    pub upper: RangeBound,
}

/// One end of an observation range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// Observation number; negative counts back from the last
    Index(i64),
    /// `f`
    First,
    /// `l`
    Last,
    /// `.`
    Unbounded,
}

/// `[kind=column]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weight {
    pub kind: String,
    pub column: String,
}

/// Foreign source text, byte-for-byte as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedCode {
    pub text: String,
}

/// A block header and the commands inside its braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub header: GeneralCommand,
    pub body: Vec<Command>,
}
