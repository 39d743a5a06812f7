//! Check, parse and print scripts for the command line

use std::{collections::HashMap, convert::Infallible};

use super::CliError;
use crate::{
    driver::Driver,
    options::{MacroPolicy, ParseOptions, RecoveryPolicy},
    output::{to_host, to_json, to_json_pretty},
    parser::ParseError,
};

/// Options shared by the `check`, `parse` and `print` commands
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Script text
    pub source: String,
    /// Macro values given as `NAME=VALUE`; globals keep their `$`
    pub macros: HashMap<String, String>,
    /// Fail on macros with no value instead of substituting nothing
    pub strict_macros: bool,
    /// Skip commands with syntax errors instead of stopping
    pub recover: bool,
    pub debug_level: u8,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Emit one JSON document per command as it is recognized
    pub stream: bool,
}

impl CheckOptions {
    pub fn parse_options(&self) -> ParseOptions {
        let recovery = if self.recover {
            RecoveryPolicy::SkipCommand
        } else {
            RecoveryPolicy::Abort
        };
        let macros = if self.strict_macros {
            MacroPolicy::Error
        } else {
            MacroPolicy::Empty
        };

        ParseOptions::new()
            .with_debug_level(self.debug_level)
            .with_recovery(recovery)
            .with_unresolved_macros(macros)
    }

    fn driver(&self) -> Driver {
        Driver::new(self.parse_options())
    }

    fn lookup(&self) -> impl FnMut(&str) -> Option<String> + '_ {
        |name: &str| self.macros.get(name).cloned()
    }
}

/// JSON documents from `parse`, plus any errors a recovering parse skipped past
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub documents: Vec<String>,
    pub errors: Vec<ParseError>,
}

/// Splits a `-D NAME=VALUE` argument.
pub fn parse_define(text: &str) -> Result<(String, String), CliError> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(CliError::InvalidDefine(text.to_string())),
    }
}

/// Validates syntax; returns the number of top-level commands.
pub fn execute_check(options: &CheckOptions) -> Result<usize, CliError> {
    let mut lookup = options.lookup();
    let script = options
        .driver()
        .parse_with_macros(&options.source, &mut lookup)?;
    Ok(script.len())
}

pub fn execute_parse(options: &CheckOptions) -> Result<ParseOutput, CliError> {
    let mut driver = options.driver();
    let mut lookup = options.lookup();

    if !options.stream {
        let script = driver.parse_with_macros(&options.source, &mut lookup)?;
        let document = if options.pretty {
            to_json_pretty(&script)
        } else {
            to_json(&script)
        };
        return Ok(ParseOutput {
            documents: vec![document],
            errors: Vec::new(),
        });
    }

    let mut documents = Vec::new();
    let status = driver.parse_streaming(
        &options.source,
        |command| {
            let value = to_host(command.as_node());
            documents.push(if options.pretty {
                format!("{:#}", value)
            } else {
                value.to_string()
            });
            Ok::<(), Infallible>(())
        },
        &mut lookup,
    );

    // Commands already streamed are kept even when the parse stopped early.
    debug_assert_eq!(status.delivered(), documents.len());
    Ok(ParseOutput {
        documents,
        errors: driver.errors().to_vec(),
    })
}

/// Re-prints the script in canonical source form.
pub fn execute_print(options: &CheckOptions) -> Result<String, CliError> {
    let parse_options = options.parse_options();
    let mut lookup = options.lookup();
    let script =
        Driver::new(parse_options.clone()).parse_with_macros(&options.source, &mut lookup)?;
    Ok(script.source_with(&parse_options.embedded).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(source: &str) -> CheckOptions {
        CheckOptions {
            source: source.to_string(),
            ..CheckOptions::default()
        }
    }

    #[test]
    fn test_parse_define() {
        assert_eq!(
            parse_define("$S_DATE=2020").unwrap(),
            ("$S_DATE".to_string(), "2020".to_string())
        );
        assert_eq!(
            parse_define("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(matches!(parse_define("=x"), Err(CliError::InvalidDefine(_))));
        assert!(matches!(parse_define("novalue"), Err(CliError::InvalidDefine(_))));
    }

    #[test]
    fn test_check_uses_defined_macros() {
        let mut opts = options("regress `y' x\nlist\n");
        opts.macros.insert("y".to_string(), "price".to_string());
        assert_eq!(execute_check(&opts).unwrap(), 2);
        assert_eq!(execute_print(&opts).unwrap(), "regress price x\nlist\n");

        opts.macros.clear();
        opts.strict_macros = true;
        assert!(matches!(execute_check(&opts), Err(CliError::Parse(_))));
    }

    #[test]
    fn test_stream_keeps_documents_before_error() {
        let opts = CheckOptions {
            stream: true,
            ..options("display 1\nregress )\ndisplay 2\n")
        };
        let output = execute_parse(&opts).unwrap();
        assert_eq!(output.documents.len(), 1);
        assert_eq!(output.errors.len(), 1);

        let recovering = CheckOptions {
            recover: true,
            ..opts
        };
        let output = execute_parse(&recovering).unwrap();
        assert_eq!(output.documents.len(), 2);
        assert_eq!(output.errors.len(), 1);
    }

    #[test]
    fn test_batch_parse_is_one_document() {
        let output = execute_parse(&options("summarize x\nlist\n")).unwrap();
        assert_eq!(output.documents.len(), 1);
        assert!(output.documents[0].starts_with('['));
        assert!(output.errors.is_empty());
    }
}
