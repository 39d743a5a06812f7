//! Parse configuration shared by the lexer, the grammar engine and the driver.

/// What the driver does after a syntax error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Stop at the first error.
    #[default]
    Abort,
    /// Record the error, skip to the next command boundary and keep going.
    SkipCommand,
}

/// What the lexer does with a macro reference the lookup cannot resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MacroPolicy {
    /// Substitute the empty string, as Stata itself does.
    #[default]
    Empty,
    /// Report a macro resolution error.
    Error,
}

/// Delimiters around a block of foreign source captured verbatim.
///
/// # Example
/// ```text
/// {{{
/// fit <- lm(y ~ x, data = df)
/// }}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDelimiters {
    pub open: String,
    pub close: String,
}

impl Default for EmbeddedDelimiters {
    fn default() -> Self {
        EmbeddedDelimiters {
            open: "{{{".to_string(),
            close: "}}}".to_string(),
        }
    }
}

/// Options for one parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// 0 records nothing, 1 records reductions, 2 and above also records shifts.
    pub debug_level: u8,
    pub recovery: RecoveryPolicy,
    pub unresolved_macros: MacroPolicy,
    pub embedded: EmbeddedDelimiters,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_unresolved_macros(mut self, policy: MacroPolicy) -> Self {
        self.unresolved_macros = policy;
        self
    }

    pub fn with_embedded_delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.embedded = EmbeddedDelimiters {
            open: open.into(),
            close: close.into(),
        };
        self
    }
}
