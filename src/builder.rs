use thiserror::Error;

use crate::ast::{
    Assignment, CommandOption, Expr, GeneralCommand, Modifier, Range, RangeBound, Weight,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("command has no verb")]
    MissingVerb,
}

/// Accumulates the optional parts of a [`GeneralCommand`] as the grammar
/// recognizes them.
///
/// # Example
/// ```
/// use ado_parser::{ast::{Expr, RangeBound}, builder::CommandBuilder};
///
/// let command = CommandBuilder::new()
///     .verb("list")
///     .varlist(vec![Expr::ident("make")])
///     .range(RangeBound::Index(1), RangeBound::Index(10))
///     .build()
///     .unwrap();
/// assert_eq!(command.verb, "list");
/// assert!(command.if_exp.is_none());
/// ```
#[derive(Debug, Default)]
pub struct CommandBuilder {
    verb: Option<String>,
    modifiers: Option<Vec<Modifier>>,
    varlist: Option<Vec<Expr>>,
    assignment: Option<Assignment>,
    if_exp: Option<Expr>,
    range: Option<Range>,
    weight: Option<Weight>,
    using: Option<String>,
    options: Option<Vec<CommandOption>>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verb(&mut self, verb: impl Into<String>) -> &mut Self {
        self.verb = Some(verb.into());
        self
    }

    pub fn modifiers(&mut self, modifiers: Vec<Modifier>) -> &mut Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn varlist(&mut self, items: Vec<Expr>) -> &mut Self {
        self.varlist = Some(items);
        self
    }

    pub fn assignment(&mut self, target: impl Into<String>, value: Expr) -> &mut Self {
        self.assignment = Some(Assignment {
            target: target.into(),
            value,
        });
        self
    }

    pub fn if_exp(&mut self, condition: Expr) -> &mut Self {
        self.if_exp = Some(condition);
        self
    }

    pub fn range(&mut self, lower: RangeBound, upper: RangeBound) -> &mut Self {
        self.range = Some(Range { lower, upper });
        self
    }

    pub fn weight(&mut self, kind: impl Into<String>, column: impl Into<String>) -> &mut Self {
        self.weight = Some(Weight {
            kind: kind.into(),
            column: column.into(),
        });
        self
    }

    pub fn using(&mut self, filename: impl Into<String>) -> &mut Self {
        self.using = Some(filename.into());
        self
    }

    pub fn options(&mut self, options: Vec<CommandOption>) -> &mut Self {
        self.options = Some(options);
        self
    }

    pub fn has_if(&self) -> bool {
        self.if_exp.is_some()
    }

    pub fn has_range(&self) -> bool {
        self.range.is_some()
    }

    /// Materializes the command and resets the builder.
    pub fn build(&mut self) -> Result<GeneralCommand, BuilderError> {
        let verb = self.verb.take().ok_or(BuilderError::MissingVerb)?;
        let built = std::mem::take(self);

        Ok(GeneralCommand {
            verb,
            modifiers: built.modifiers,
            varlist: built.varlist,
            assignment: built.assignment,
            if_exp: built.if_exp,
            range: built.range,
            weight: built.weight,
            using: built.using,
            options: built.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_verb() {
        let mut builder = CommandBuilder::new();
        builder.if_exp(Expr::ident("x"));
        assert_eq!(builder.build(), Err(BuilderError::MissingVerb));
    }

    #[test]
    fn test_absent_fields_stay_none() {
        let command = CommandBuilder::new().verb("clear").build().unwrap();
        assert_eq!(command.verb, "clear");
        assert!(command.modifiers.is_none());
        assert!(command.varlist.is_none());
        assert!(command.assignment.is_none());
        assert!(command.range.is_none());
        assert!(command.weight.is_none());
        assert!(command.using.is_none());
        assert!(command.options.is_none());
    }

    #[test]
    fn test_build_resets() {
        let mut builder = CommandBuilder::new();
        builder.verb("use").using("auto.dta").options(vec![]);
        let first = builder.build().unwrap();
        assert_eq!(first.using.as_deref(), Some("auto.dta"));
        assert_eq!(first.options, Some(vec![]));
        assert_eq!(builder.build(), Err(BuilderError::MissingVerb));
    }
}
