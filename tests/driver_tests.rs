// tests/driver_tests.rs

use ado_parser::ast::{Command, Token};
use ado_parser::driver::{Driver, ParseStatus};
use ado_parser::lexer::{LexError, NoMacros};
use ado_parser::options::{MacroPolicy, ParseOptions, RecoveryPolicy};
use ado_parser::parser::{ParseError, TraceEvent};

const BROKEN: &str = "display 1\nregress )\ndisplay 2\n";

fn recovering() -> Driver {
    Driver::new(ParseOptions::new().with_recovery(RecoveryPolicy::SkipCommand))
}

fn verbs(commands: &[Command]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|c| c.verb().map(str::to_string))
        .collect()
}

// ============================================================================
// Batch parsing
// ============================================================================

#[test]
fn test_batch_parse() {
    let script = ado_parser::parse("use auto\nsummarize price\nlist in 1/5\n").unwrap();
    assert_eq!(script.len(), 3);
    assert_eq!(verbs(&script.commands), vec!["use", "summarize", "list"]);
}

#[test]
fn test_empty_script() {
    let script = ado_parser::parse("\n\n// nothing here\n").unwrap();
    assert!(script.is_empty());
}

#[test]
fn test_batch_failure_returns_no_tree() {
    let failure = ado_parser::parse(BROKEN).unwrap_err();
    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(failure.first(), Some(ParseError::Syntax { .. })));
}

#[test]
fn test_batch_recovery_still_fails() {
    let mut driver = recovering();
    let failure = driver.parse(BROKEN).unwrap_err();
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(driver.errors().len(), 1);
}

#[test]
fn test_errors_reset_between_parses() {
    let mut driver = Driver::default();
    assert!(driver.parse(BROKEN).is_err());
    assert!(driver.parse("display 1").is_ok());
    assert!(driver.errors().is_empty());
}

// ============================================================================
// Streaming
// ============================================================================

#[test]
fn test_streaming_delivers_in_order() {
    let mut seen = Vec::new();
    let status = Driver::default().parse_streaming(
        "sort id\nby id: generate n = _n\nlist\n",
        |command| {
            seen.extend(command.verb().map(str::to_string));
            Ok::<(), String>(())
        },
        &mut NoMacros,
    );

    assert_eq!(status, ParseStatus::Complete { delivered: 3 });
    assert!(status.is_complete());
    assert_eq!(seen, vec!["sort", "generate", "list"]);
}

#[test]
fn test_streaming_block_is_one_command() {
    let mut count = 0;
    let status = Driver::default().parse_streaming(
        "foreach v in a b {\n    display 1\n    display 2\n}\n",
        |_| {
            count += 1;
            Ok::<(), String>(())
        },
        &mut NoMacros,
    );
    assert_eq!(status.delivered(), 1);
    assert_eq!(count, 1);
}

#[test]
fn test_callback_error_stops_parse() {
    let mut calls = 0;
    let mut driver = Driver::default();
    let status = driver.parse_streaming(
        "display 1\ndisplay 2\ndisplay 3\n",
        |_| {
            calls += 1;
            if calls == 2 { Err("stop here") } else { Ok(()) }
        },
        &mut NoMacros,
    );

    assert_eq!(status, ParseStatus::Aborted { delivered: 1 });
    assert_eq!(calls, 2);
    assert_eq!(
        driver.errors(),
        &[ParseError::Callback("stop here".to_string())]
    );
}

#[test]
fn test_streaming_recovery() {
    let mut driver = recovering();
    let mut seen = Vec::new();
    let status = driver.parse_streaming(
        BROKEN,
        |command| {
            seen.extend(command.verb().map(str::to_string));
            Ok::<(), String>(())
        },
        &mut NoMacros,
    );

    assert_eq!(
        status,
        ParseStatus::Recovered {
            delivered: 2,
            errors: 1,
        }
    );
    assert_eq!(seen, vec!["display", "display"]);
    match &driver.errors()[0] {
        ParseError::Syntax { position, .. } => assert_eq!(position.line, 2),
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_streaming_abort_policy() {
    let status = Driver::default().parse_streaming(
        BROKEN,
        |_| Ok::<(), String>(()),
        &mut NoMacros,
    );
    assert_eq!(status, ParseStatus::Aborted { delivered: 1 });
}

#[test]
fn test_recovery_inside_block() {
    let mut driver = recovering();
    let status = driver.parse_streaming(
        "if x {\n    regress )\n    display 1\n}\ndisplay 2\n",
        |_| Ok::<(), String>(()),
        &mut NoMacros,
    );
    assert_eq!(
        status,
        ParseStatus::Recovered {
            delivered: 2,
            errors: 1,
        }
    );
}

#[test]
fn test_lex_error_is_fatal_even_when_recovering() {
    let mut driver = recovering();
    let status = driver.parse_streaming(
        "display 1\ndisplay \"abc\ndisplay 2\n",
        |_| Ok::<(), String>(()),
        &mut NoMacros,
    );

    assert_eq!(status, ParseStatus::Aborted { delivered: 1 });
    assert!(matches!(
        driver.errors(),
        [ParseError::Lex(LexError::UnterminatedString(_))]
    ));
}

// ============================================================================
// Macros
// ============================================================================

#[test]
fn test_parse_with_macros() {
    let mut lookup = |name: &str| match name {
        "controls" => Some("age educ".to_string()),
        "$outcome" => Some("wage".to_string()),
        _ => None,
    };
    let script = Driver::default()
        .parse_with_macros("regress $outcome `controls', robust", &mut lookup)
        .unwrap();

    assert_eq!(
        script,
        ado_parser::parse("regress wage age educ, robust").unwrap()
    );
}

#[test]
fn test_unresolved_macro_policy() {
    let lenient = ado_parser::parse("summarize `vars'").unwrap();
    assert!(lenient.commands[0].as_general().unwrap().varlist.is_none());

    let options = ParseOptions::new().with_unresolved_macros(MacroPolicy::Error);
    let failure = ado_parser::parse_with_options("summarize `vars'", options).unwrap_err();
    match failure.first() {
        Some(ParseError::MacroResolution { name, .. }) => assert_eq!(name, "vars"),
        other => panic!("Expected macro resolution error, got {:?}", other),
    }
}

#[test]
fn test_macro_error_is_fatal_even_when_recovering() {
    let options = ParseOptions::new()
        .with_unresolved_macros(MacroPolicy::Error)
        .with_recovery(RecoveryPolicy::SkipCommand);
    let status = Driver::new(options).parse_streaming(
        "display 1\ndisplay `x'\ndisplay 2\n",
        |_| Ok::<(), String>(()),
        &mut NoMacros,
    );
    assert_eq!(status, ParseStatus::Aborted { delivered: 1 });
}

// ============================================================================
// Debug trace
// ============================================================================

fn traced(level: u8) -> (Driver, ado_parser::Script) {
    let mut driver = Driver::new(ParseOptions::new().with_debug_level(level));
    let script = driver.parse("display 1\n").unwrap();
    (driver, script)
}

#[test]
fn test_trace_off_by_default() {
    let (driver, _) = traced(0);
    assert!(driver.trace().is_empty());
}

#[test]
fn test_trace_level_one_records_reductions() {
    let (driver, _) = traced(1);
    assert!(!driver.trace().is_empty());
    assert!(
        driver
            .trace()
            .iter()
            .all(|event| matches!(event, TraceEvent::Reduce { .. }))
    );
    assert_eq!(
        driver.trace().last(),
        Some(&TraceEvent::Reduce { rule: "command" })
    );
}

#[test]
fn test_trace_level_two_records_shifts() {
    let (driver, _) = traced(2);
    assert_eq!(
        driver.trace().first(),
        Some(&TraceEvent::Shift {
            token: Token::Identifier("display".to_string()),
        })
    );
    assert!(
        driver
            .trace()
            .iter()
            .any(|event| matches!(event, TraceEvent::Reduce { .. }))
    );
}

#[test]
fn test_trace_does_not_change_result() {
    let (_, quiet) = traced(0);
    let (_, verbose) = traced(2);
    assert_eq!(quiet, verbose);
}

// ============================================================================
// Independent drivers
// ============================================================================

#[test]
fn test_drivers_on_separate_threads() {
    let inputs = ["summarize x\nlist\n", "regress y x, robust\n", "display 1\n"];
    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|text| scope.spawn(move || Driver::default().parse(text).map(|s| s.len())))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect()
    });
    assert_eq!(counts, vec![2, 1, 1]);
}
