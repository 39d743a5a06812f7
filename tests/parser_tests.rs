// tests/parser_tests.rs

use ado_parser::ast::{
    BinOp, Branch, Command, CommandOption, Expr, GeneralCommand, Modifier, Number, Op, Range,
    RangeBound, UnaryOp, Weight,
};
use ado_parser::lexer::Lexer;
use ado_parser::parser::{ParseError, Parser};

fn expr(input: &str) -> Expr {
    Parser::new(Lexer::new(input)).unwrap().parse().unwrap()
}

fn num(text: &str) -> Expr {
    Expr::Number(Number::parse(text).unwrap())
}

fn id(name: &str) -> Expr {
    Expr::ident(name)
}

fn bin(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

fn group(children: Vec<Expr>) -> Expr {
    Expr::Branch(Branch::new(Op::Group, children))
}

fn commands(input: &str) -> Vec<Command> {
    Parser::new(Lexer::new(input))
        .unwrap()
        .parse_script()
        .unwrap()
        .commands
}

fn command(input: &str) -> GeneralCommand {
    match commands(input).into_iter().next() {
        Some(Command::General(cmd)) => cmd,
        other => panic!("Expected a general command, got {:?}", other),
    }
}

fn syntax_error(input: &str) -> ParseError {
    match Parser::new(Lexer::new(input)).unwrap().parse_script() {
        Err(err @ ParseError::Syntax { .. }) => err,
        other => panic!("Expected a syntax error, got {:?}", other),
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_precedence() {
    assert_eq!(
        expr("1 + 2 * 3"),
        bin(BinOp::Add, num("1"), bin(BinOp::Multiply, num("2"), num("3")))
    );
    assert_eq!(
        expr("(1 + 2) * 3"),
        bin(BinOp::Multiply, bin(BinOp::Add, num("1"), num("2")), num("3"))
    );
}

#[test]
fn test_left_associative() {
    assert_eq!(
        expr("10 - 4 - 3"),
        bin(BinOp::Subtract, bin(BinOp::Subtract, num("10"), num("4")), num("3"))
    );
    assert_eq!(
        expr("2 ^ 3 ^ 2"),
        bin(BinOp::Power, bin(BinOp::Power, num("2"), num("3")), num("2"))
    );
}

#[test]
fn test_unary_binds_tightest() {
    assert_eq!(
        expr("-x ^ 2"),
        bin(BinOp::Power, Expr::unary(UnaryOp::Negate, id("x")), num("2"))
    );
    assert_eq!(
        expr("!a & b | c"),
        bin(
            BinOp::Or,
            bin(BinOp::And, Expr::unary(UnaryOp::Not, id("a")), id("b")),
            id("c")
        )
    );
    assert_eq!(expr("~a"), Expr::unary(UnaryOp::Not, id("a")));
}

#[test]
fn test_logical_and_comparison_levels() {
    assert_eq!(
        expr("a == 1 | b ~= 2 & c < 3"),
        bin(
            BinOp::Or,
            bin(BinOp::Equal, id("a"), num("1")),
            bin(
                BinOp::And,
                bin(BinOp::NotEqual, id("b"), num("2")),
                bin(BinOp::LessThan, id("c"), num("3"))
            )
        )
    );
    assert_eq!(
        expr("a < b == c"),
        bin(BinOp::Equal, bin(BinOp::LessThan, id("a"), id("b")), id("c"))
    );
    assert_eq!(
        expr("x > 1 + 2"),
        bin(BinOp::GreaterThan, id("x"), bin(BinOp::Add, num("1"), num("2")))
    );
}

#[test]
fn test_function_calls() {
    assert_eq!(
        expr("inlist(x, 1, 2)"),
        Expr::call("inlist", vec![id("x"), num("1"), num("2")])
    );
    assert_eq!(expr("runiform()"), Expr::call("runiform", vec![]));
    assert_eq!(
        expr("max(a, b) + 1"),
        bin(BinOp::Add, Expr::call("max", vec![id("a"), id("b")]), num("1"))
    );
}

#[test]
fn test_spaced_paren_is_not_a_call() {
    assert!(Parser::new(Lexer::new("f (x)")).unwrap().parse().is_err());
}

#[test]
fn test_subscript() {
    assert_eq!(
        expr("x[_n - 1]"),
        Expr::Branch(Branch::new(
            Op::Subscript,
            vec![id("x"), bin(BinOp::Subtract, id("_n"), num("1"))]
        ))
    );
}

#[test]
fn test_literals() {
    assert_eq!(expr(r#""text""#), Expr::String("text".to_string()));
    assert_eq!(expr("."), Expr::Number(Number::Missing(None)));
    assert_eq!(expr(".b"), Expr::Number(Number::Missing(Some('b'))));
    match expr("td(01jan2020)") {
        Expr::Datetime(dt) => assert_eq!(dt.date.unwrap().to_string(), "2020-01-01"),
        other => panic!("Expected datetime, got {:?}", other),
    }
}

#[test]
fn test_incomplete_expressions() {
    for input in ["1 +", "(1 + 2", "* 2", "f(1,"] {
        assert!(
            Parser::new(Lexer::new(input)).unwrap().parse().is_err(),
            "input: {}",
            input
        );
    }
}

// ============================================================================
// General commands
// ============================================================================

#[test]
fn test_full_command() {
    let cmd = command("regress y x1 x2 if age > 30 in 1/100 [aw=pop], robust level(90)");

    assert_eq!(cmd.verb, "regress");
    assert_eq!(cmd.modifiers, None);
    assert_eq!(cmd.varlist, Some(vec![id("y"), id("x1"), id("x2")]));
    assert_eq!(cmd.assignment, None);
    assert_eq!(
        cmd.if_exp,
        Some(bin(BinOp::GreaterThan, id("age"), num("30")))
    );
    assert_eq!(
        cmd.range,
        Some(Range {
            lower: RangeBound::Index(1),
            upper: RangeBound::Index(100),
        })
    );
    assert_eq!(
        cmd.weight,
        Some(Weight {
            kind: "aw".to_string(),
            column: "pop".to_string(),
        })
    );
    assert_eq!(cmd.using, None);
    assert_eq!(
        cmd.options,
        Some(vec![
            CommandOption::flag("robust"),
            CommandOption::with_args("level", vec![num("90")]),
        ])
    );
}

#[test]
fn test_absent_parts_are_none() {
    let cmd = command("summarize price");
    assert_eq!(cmd.varlist, Some(vec![id("price")]));
    assert!(cmd.if_exp.is_none());
    assert!(cmd.range.is_none());
    assert!(cmd.weight.is_none());
    assert!(cmd.using.is_none());
    assert!(cmd.options.is_none());

    let bare = command("clear");
    assert_eq!(bare.verb, "clear");
    assert!(bare.varlist.is_none());
}

#[test]
fn test_trailing_comma_gives_empty_options() {
    assert_eq!(command("regress y x,").options, Some(vec![]));
}

#[test]
fn test_ranges() {
    let test_cases = vec![
        ("list in 5/10", RangeBound::Index(5), RangeBound::Index(10)),
        ("list in 5/.", RangeBound::Index(5), RangeBound::Unbounded),
        ("list in f/l", RangeBound::First, RangeBound::Last),
        ("list in -5/l", RangeBound::Index(-5), RangeBound::Last),
        ("list in 7", RangeBound::Index(7), RangeBound::Index(7)),
    ];

    for (input, lower, upper) in test_cases {
        assert_eq!(
            command(input).range,
            Some(Range { lower, upper }),
            "input: {}",
            input
        );
    }
}

#[test]
fn test_in_before_if() {
    let cmd = command("list x in 1/10 if y > 0");
    assert!(cmd.range.is_some());
    assert_eq!(cmd.if_exp, Some(bin(BinOp::GreaterThan, id("y"), num("0"))));
}

#[test]
fn test_options_with_suboptions() {
    let cmd = command(r#"twoway scatter y x, saving(g1, replace) title("A, B")"#);
    assert_eq!(cmd.varlist, Some(vec![id("scatter"), id("y"), id("x")]));
    assert_eq!(
        cmd.options,
        Some(vec![
            CommandOption {
                name: "saving".to_string(),
                args: Some(vec![id("g1")]),
                suboptions: Some(vec![CommandOption::flag("replace")]),
            },
            CommandOption::with_args("title", vec![Expr::String("A, B".to_string())]),
        ])
    );
}

#[test]
fn test_option_with_several_arguments() {
    let cmd = command("merge 1:1 id using other.dta, keep(match master)");
    assert_eq!(
        cmd.options,
        Some(vec![CommandOption::with_args(
            "keep",
            vec![id("match"), id("master")]
        )])
    );
}

#[test]
fn test_using_clause() {
    let cmd = command("merge 1:1 id using data/auto.dta, nogenerate");
    assert_eq!(cmd.varlist, Some(vec![id("1:1"), id("id")]));
    assert_eq!(cmd.using.as_deref(), Some("data/auto.dta"));
    assert_eq!(cmd.options, Some(vec![CommandOption::flag("nogenerate")]));

    let quoted = command(r#"append using "my data.dta""#);
    assert_eq!(quoted.using.as_deref(), Some("my data.dta"));
    assert!(quoted.varlist.is_none());
}

#[test]
fn test_weight_versus_subscript() {
    let weighted = command("summarize x [fw=n]");
    assert_eq!(weighted.varlist, Some(vec![id("x")]));
    assert_eq!(
        weighted.weight,
        Some(Weight {
            kind: "fw".to_string(),
            column: "n".to_string(),
        })
    );

    let lagged = command("display x[2]");
    assert!(lagged.weight.is_none());
    assert_eq!(
        lagged.varlist,
        Some(vec![Expr::Branch(Branch::new(
            Op::Subscript,
            vec![id("x"), num("2")]
        ))])
    );
}

#[test]
fn test_list_items() {
    assert_eq!(
        command(r#"display "x = " x"#).varlist,
        Some(vec![Expr::String("x = ".to_string()), id("x")])
    );
    assert_eq!(
        command("display 1 - 2").varlist,
        Some(vec![bin(BinOp::Subtract, num("1"), num("2"))])
    );
    assert_eq!(
        command("display -1").varlist,
        Some(vec![num("-1")])
    );
}

// ============================================================================
// Assignments
// ============================================================================

#[test]
fn test_assignment() {
    let cmd = command("local n = 5");
    assert_eq!(cmd.verb, "local");
    assert!(cmd.varlist.is_none());
    let assignment = cmd.assignment.unwrap();
    assert_eq!(assignment.target, "n");
    assert_eq!(assignment.value, num("5"));
}

#[test]
fn test_assignment_with_storage_type() {
    let cmd = command("generate double y = x^2 if x < .");
    assert_eq!(cmd.varlist, Some(vec![id("double")]));
    let assignment = cmd.assignment.unwrap();
    assert_eq!(assignment.target, "y");
    assert_eq!(assignment.value, bin(BinOp::Power, id("x"), num("2")));
    assert_eq!(
        cmd.if_exp,
        Some(bin(
            BinOp::LessThan,
            id("x"),
            Expr::Number(Number::Missing(None))
        ))
    );
}

#[test]
fn test_assignment_with_spaced_multiplication() {
    let cmd = command("generate z = x* 2");
    assert_eq!(cmd.varlist, None);
    let assignment = cmd.assignment.unwrap();
    assert_eq!(assignment.target, "z");
    assert_eq!(assignment.value, bin(BinOp::Multiply, id("x"), num("2")));
}

#[test]
fn test_assignment_needs_a_name() {
    assert!(matches!(
        syntax_error("display 1 = 2"),
        ParseError::Syntax { .. }
    ));
}

// ============================================================================
// Modifiers
// ============================================================================

#[test]
fn test_by_modifier() {
    let cmd = command("by foreign: summarize mpg");
    assert_eq!(
        cmd.modifiers,
        Some(vec![Modifier {
            name: "by".to_string(),
            args: vec![id("foreign")],
            options: None,
        }])
    );
    assert_eq!(cmd.verb, "summarize");
}

#[test]
fn test_bysort_with_sort_group() {
    let cmd = command("bysort id (year): generate g = x - x[_n-1]");
    let modifiers = cmd.modifiers.unwrap();
    assert_eq!(modifiers[0].name, "bysort");
    assert_eq!(modifiers[0].args, vec![id("id"), group(vec![id("year")])]);

    let assignment = cmd.assignment.unwrap();
    assert_eq!(assignment.target, "g");
    assert_eq!(
        assignment.value,
        bin(
            BinOp::Subtract,
            id("x"),
            Expr::Branch(Branch::new(
                Op::Subscript,
                vec![id("x"), bin(BinOp::Subtract, id("_n"), num("1"))]
            ))
        )
    );
}

#[test]
fn test_modifier_options_and_chains() {
    let cmd = command("by x, sort: gen y = 1");
    assert_eq!(
        cmd.modifiers.unwrap()[0].options,
        Some(vec![CommandOption::flag("sort")])
    );

    let chained = command("xi: by x: regress y");
    let names: Vec<_> = chained
        .modifiers
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["xi", "by"]);
    assert_eq!(chained.verb, "regress");
}

#[test]
fn test_modifier_does_not_change_arguments() {
    let plain = command("display -1");
    let modified = command("by g: display -1");
    assert_eq!(plain.varlist, Some(vec![num("-1")]));
    assert_eq!(modified.varlist, plain.varlist);
}

#[test]
fn test_spaced_colon_is_not_a_modifier() {
    // `: ` set apart from the name is not a prefix, so nothing else may follow
    assert!(matches!(
        syntax_error("by foreign : summarize mpg"),
        ParseError::Syntax { .. }
    ));
}

// ============================================================================
// Blocks and embedded code
// ============================================================================

#[test]
fn test_foreach_block() {
    let parsed = commands("foreach v in a b {\n    display \"`v'\"\n}\n");
    assert_eq!(parsed.len(), 1);
    match &parsed[0] {
        Command::Block(block) => {
            assert_eq!(block.header.verb, "foreach");
            assert_eq!(
                block.header.varlist,
                Some(vec![id("v"), id("in"), id("a"), id("b")])
            );
            assert_eq!(block.body.len(), 1);
            assert_eq!(block.body[0].verb(), Some("display"));
        }
        other => panic!("Expected block, got {:?}", other),
    }
}

#[test]
fn test_if_else_blocks() {
    let separate = commands("if x > 1 {\n    display 1\n}\nelse {\n    display 2\n}\n");
    let same_line = commands("if x > 1 {\n    display 1\n} else {\n    display 2\n}\n");
    assert_eq!(separate, same_line);
    assert_eq!(separate.len(), 2);

    match &separate[0] {
        Command::Block(block) => {
            assert_eq!(block.header.verb, "if");
            assert_eq!(
                block.header.if_exp,
                Some(bin(BinOp::GreaterThan, id("x"), num("1")))
            );
        }
        other => panic!("Expected block, got {:?}", other),
    }
    assert_eq!(separate[1].verb(), Some("else"));
}

#[test]
fn test_nested_blocks() {
    let parsed = commands("forvalues i = 1/3 {\n    if x > 1 {\n        display 1\n    }\n}\n");
    match &parsed[0] {
        Command::Block(outer) => {
            assert_eq!(outer.header.assignment.as_ref().unwrap().target, "i");
            assert!(matches!(outer.body[0], Command::Block(_)));
        }
        other => panic!("Expected block, got {:?}", other),
    }
}

#[test]
fn test_embedded_block_between_commands() {
    let parsed = commands("display 1\n{{{\nlibrary(x)\n  y <- \"}}\"\n}}}\ndisplay 2\n");
    assert_eq!(parsed.len(), 3);
    match &parsed[1] {
        Command::Embedded(code) => assert_eq!(code.text, "\nlibrary(x)\n  y <- \"}}\"\n"),
        other => panic!("Expected embedded code, got {:?}", other),
    }
    assert_eq!(parsed[1].verb(), None);
}

// ============================================================================
// Scripts and errors
// ============================================================================

#[test]
fn test_comments_and_blank_lines_are_not_commands() {
    let parsed = commands("display 1\n\n* note\ndisplay 2\n// note\n/* note */\ndisplay 3");
    assert_eq!(parsed.len(), 3);
}

#[test]
fn test_semicolon_delimited_script() {
    let parsed = commands("#delimit ;\nregress y\n    x1 x2,\n    robust;\n#delimit cr\nlist\n");
    assert_eq!(parsed.len(), 2);
    let cmd = parsed[0].as_general().unwrap();
    assert_eq!(cmd.varlist, Some(vec![id("y"), id("x1"), id("x2")]));
    assert_eq!(cmd.options, Some(vec![CommandOption::flag("robust")]));
}

#[test]
fn test_syntax_error_position() {
    match syntax_error("display 1\nregress y x )") {
        ParseError::Syntax { position, message } => {
            assert_eq!(position.line, 2);
            assert_eq!(position.column, 13);
            assert!(message.contains("end of command"));
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_unclosed_block() {
    syntax_error("foreach v in a {\n    display 1\n");
}

#[test]
fn test_missing_weight_bracket() {
    syntax_error("summarize x [fw=n");
}
