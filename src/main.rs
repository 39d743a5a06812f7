use ado_parser::cli::{self, CheckOptions, CliError};
use clap::{Args, Parser as ClapParser, Subcommand};
use std::{
    io::{self, Read},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "adoparse")]
#[command(about = "adoparse - Parse Stata-style .do/.ado scripts into a syntax tree")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Script file ('-' or omitted reads stdin)
    file: Option<PathBuf>,

    /// Define a macro value (repeatable); prefix globals with '$'
    #[arg(short = 'D', value_name = "NAME=VALUE")]
    define: Vec<String>,

    /// Treat undefined macros as errors
    #[arg(long)]
    strict_macros: bool,

    /// Skip commands with syntax errors and keep going
    #[arg(long)]
    recover: bool,

    /// Record the shift/reduce trace (1 = reductions, 2 = shifts too)
    #[arg(long, value_name = "N", default_value_t = 0)]
    debug: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate script syntax
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the syntax tree as JSON
    Parse {
        #[command(flatten)]
        source: SourceArgs,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// One JSON document per command, emitted as each is recognized
        #[arg(long)]
        stream: bool,
    },

    /// Re-print the script in canonical source form
    Print {
        #[command(flatten)]
        source: SourceArgs,
    },
}

impl Commands {
    fn source(&self) -> &SourceArgs {
        match self {
            Commands::Check { source } | Commands::Print { source } => source,
            Commands::Parse { source, .. } => source,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.command.source().debug);

    let result = match &cli.command {
        Commands::Check { source } => run_check(source),
        Commands::Parse {
            source,
            pretty,
            stream,
        } => run_parse(source, *pretty, *stream),
        Commands::Print { source } => run_print(source),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(debug: u8) {
    let default = if debug > 0 { "ado_parser=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn read_source(file: Option<&PathBuf>) -> Result<String, CliError> {
    match file {
        Some(path) if path.as_os_str() != "-" => Ok(std::fs::read_to_string(path)?),
        _ if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
        _ => Err(CliError::NoInput),
    }
}

fn load(source: &SourceArgs) -> Result<CheckOptions, CliError> {
    let macros = source
        .define
        .iter()
        .map(|d| cli::parse_define(d))
        .collect::<Result<_, _>>()?;

    Ok(CheckOptions {
        source: read_source(source.file.as_ref())?,
        macros,
        strict_macros: source.strict_macros,
        recover: source.recover,
        debug_level: source.debug,
        ..CheckOptions::default()
    })
}

fn run_check(source: &SourceArgs) -> Result<(), CliError> {
    let options = load(source)?;
    let commands = cli::execute_check(&options)?;
    println!("Syntax is valid ({} commands)", commands);
    Ok(())
}

fn run_parse(source: &SourceArgs, pretty: bool, stream: bool) -> Result<(), CliError> {
    let options = CheckOptions {
        pretty,
        stream,
        ..load(source)?
    };

    let output = cli::execute_parse(&options)?;
    for document in &output.documents {
        println!("{}", document);
    }
    if output.errors.is_empty() {
        return Ok(());
    }

    for error in &output.errors {
        eprintln!("error: {}", error);
    }
    std::process::exit(1);
}

fn run_print(source: &SourceArgs) -> Result<(), CliError> {
    let options = load(source)?;
    print!("{}", cli::execute_print(&options)?);
    Ok(())
}
