//! Source-form rendering of the tree through `Display`.
//!
//! Printing uses as few parentheses as the operator precedences allow and
//! quotes every string, so the output parses back to an equal tree.
//!
//! ```text
//! by region: regress income age if year > 2000 in 1/500 [aw=pop], robust
//! generate z = (x + y) * 2
//! ```

use std::fmt::{self, Display, Write};

use crate::{
    ast::{
        Block, Branch, Command, CommandOption, EmbeddedCode, Expr, GeneralCommand, Modifier, Op,
        Range, RangeBound, Script, UnaryOp,
    },
    options::EmbeddedDelimiters,
};

const INDENT: &str = "    ";

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Branch(Branch {
            op: Op::Binary(op), ..
        }) => op.precedence(),
        Expr::Branch(Branch {
            op: Op::Unary(_), ..
        }) => UnaryOp::PRECEDENCE,
        _ => u8::MAX,
    }
}

fn write_quoted(f: &mut impl Write, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        if matches!(c, '"' | '\\' | '`' | '$') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

fn write_wrapped(f: &mut fmt::Formatter<'_>, expr: &Expr, wrap: bool) -> fmt::Result {
    if wrap {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// Space-separated list items. An item starting with a minus sign is
/// parenthesized when it follows another item, so it cannot read as a
/// subtraction. Negative literals are always parenthesized: whether `-1`
/// folds into one number depends on what precedes the list.
fn write_items(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        let text = item.to_string();
        if text.starts_with('-') && (i > 0 || matches!(item, Expr::Number(_))) {
            write!(f, "({})", text)?;
        } else {
            f.write_str(&text)?;
        }
    }
    Ok(())
}

fn write_options(f: &mut fmt::Formatter<'_>, options: &[CommandOption]) -> fmt::Result {
    for (i, option) in options.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        write!(f, "{}", option)?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Ident(name) => f.write_str(name),
            Expr::String(s) => write_quoted(f, s),
            Expr::Datetime(dt) => write!(f, "{}", dt),
            Expr::Branch(branch) => write!(f, "{}", branch),
        }
    }
}

impl Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.op, self.children.as_slice()) {
            (Op::Binary(op), [left, right]) => {
                write_wrapped(f, left, precedence(left) < op.precedence())?;
                write!(f, " {} ", op.symbol())?;
                write_wrapped(f, right, precedence(right) <= op.precedence())
            }
            (Op::Unary(op), [operand]) => {
                f.write_str(op.symbol())?;
                let wrap = match operand {
                    Expr::Number(n) => !n.is_missing(),
                    Expr::Branch(Branch {
                        op: Op::Binary(_), ..
                    }) => true,
                    _ => false,
                };
                write_wrapped(f, operand, wrap)
            }
            (Op::Call(name), args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match arg {
                        Expr::Branch(Branch {
                            op: Op::Group,
                            children,
                        }) if children.len() > 1 => write_items(f, children)?,
                        _ => write!(f, "{}", arg)?,
                    }
                }
                f.write_char(')')
            }
            (Op::Subscript, [target, index]) => write!(f, "{}[{}]", target, index),
            (Op::Group, items) => {
                f.write_char('(')?;
                write_items(f, items)?;
                f.write_char(')')
            }
            // Malformed arity; print what is there.
            (op, children) => {
                write!(f, "{}(", op.tag())?;
                write_items(f, children)?;
                f.write_char(')')
            }
        }
    }
}

impl Display for CommandOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_none() && self.suboptions.is_none() {
            return Ok(());
        }

        f.write_char('(')?;
        if let Some(args) = &self.args {
            write_items(f, args)?;
        }
        if let Some(suboptions) = &self.suboptions {
            f.write_char(',')?;
            if !suboptions.is_empty() {
                f.write_char(' ')?;
                write_options(f, suboptions)?;
            }
        }
        f.write_char(')')
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(options) = &self.options {
            f.write_char(',')?;
            if !options.is_empty() {
                f.write_char(' ')?;
                write_options(f, options)?;
            }
        }
        f.write_char(':')
    }
}

impl Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Index(i) => write!(f, "{}", i),
            RangeBound::First => f.write_char('f'),
            RangeBound::Last => f.write_char('l'),
            RangeBound::Unbounded => f.write_char('.'),
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}/{}", self.lower, self.upper)
    }
}

impl Display for GeneralCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.iter().flatten() {
            write!(f, "{} ", modifier)?;
        }
        f.write_str(&self.verb)?;

        // `if exp {` carries its condition in the if slot
        let condition_is_verb = self.verb == "if" && self.varlist.is_none();
        if condition_is_verb {
            if let Some(condition) = &self.if_exp {
                write!(f, " {}", condition)?;
            }
        }

        if let Some(items) = &self.varlist {
            f.write_char(' ')?;
            write_items(f, items)?;
        }
        if let Some(assignment) = &self.assignment {
            write!(f, " {} = {}", assignment.target, assignment.value)?;
        }
        if !condition_is_verb {
            if let Some(condition) = &self.if_exp {
                write!(f, " if {}", condition)?;
            }
        }
        if let Some(range) = &self.range {
            write!(f, " {}", range)?;
        }
        if let Some(weight) = &self.weight {
            write!(f, " [{}={}]", weight.kind, weight.column)?;
        }
        if let Some(filename) = &self.using {
            f.write_str(" using ")?;
            write_quoted(f, filename)?;
        }
        if let Some(options) = &self.options {
            f.write_char(',')?;
            if !options.is_empty() {
                f.write_char(' ')?;
                write_options(f, options)?;
            }
        }
        Ok(())
    }
}

/// Printed with the default `{{{` / `}}}` delimiters; see
/// [`Script::source_with`] for others.
impl Display for EmbeddedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_embedded(f, self, &EmbeddedDelimiters::default())
    }
}

fn write_embedded(
    f: &mut fmt::Formatter<'_>,
    code: &EmbeddedCode,
    delimiters: &EmbeddedDelimiters,
) -> fmt::Result {
    write!(f, "{}{}{}", delimiters.open, code.text, delimiters.close)
}

fn write_command(
    f: &mut fmt::Formatter<'_>,
    command: &Command,
    depth: usize,
    delimiters: &EmbeddedDelimiters,
) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    match command {
        Command::General(general) => write!(f, "{}{}", indent, general),
        // Embedded text is reproduced as is; only the opening line is indented.
        Command::Embedded(code) => {
            f.write_str(&indent)?;
            write_embedded(f, code, delimiters)
        }
        Command::Block(block) => write_block(f, block, depth, delimiters),
    }
}

fn write_block(
    f: &mut fmt::Formatter<'_>,
    block: &Block,
    depth: usize,
    delimiters: &EmbeddedDelimiters,
) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    writeln!(f, "{}{} {{", indent, block.header)?;
    for command in &block.body {
        write_command(f, command, depth + 1, delimiters)?;
        f.write_char('\n')?;
    }
    write!(f, "{}}}", indent)
}

fn write_script(
    f: &mut fmt::Formatter<'_>,
    script: &Script,
    delimiters: &EmbeddedDelimiters,
) -> fmt::Result {
    for command in &script.commands {
        write_command(f, command, 0, delimiters)?;
        f.write_char('\n')?;
    }
    Ok(())
}

impl Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0, &EmbeddedDelimiters::default())
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_command(f, self, 0, &EmbeddedDelimiters::default())
    }
}

/// One command per line.
impl Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_script(f, self, &EmbeddedDelimiters::default())
    }
}

/// Source form of a script whose embedded blocks use custom delimiters.
pub struct SourceWith<'a> {
    script: &'a Script,
    delimiters: &'a EmbeddedDelimiters,
}

impl Display for SourceWith<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_script(f, self.script, self.delimiters)
    }
}

impl Script {
    /// Prints like `Display`, but wraps embedded blocks in `delimiters`, so
    /// the text parses back under the same [`crate::ParseOptions`].
    ///
    /// ```
    /// use ado_parser::{ParseOptions, parse_with_options};
    ///
    /// let options = ParseOptions::new().with_embedded_delimiters("<<R", "R>>");
    /// let script = parse_with_options("<<R\nx <- 1\nR>>\n", options.clone()).unwrap();
    /// assert_eq!(script.source_with(&options.embedded).to_string(), "<<R\nx <- 1\nR>>\n");
    /// ```
    pub fn source_with<'a>(&'a self, delimiters: &'a EmbeddedDelimiters) -> SourceWith<'a> {
        SourceWith {
            script: self,
            delimiters,
        }
    }
}
