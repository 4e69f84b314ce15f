use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cmdshell_core::{CommandRegistry, CommandValues, SchemaPackage, validate_registry};
use cmdshell_parser::{ParseMode, parse_line, populate};
use cmdshell_shell::{
    CommandError, CommandInvocation, CommandResult, Console, ConsoleConfig, FnCommand,
};
use serde::Serialize;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(name = "cmdshell")]
#[command(about = "Parse and complete command lines against declarative command schemas")]
struct Cli {
    /// Log parse and completion decisions to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate schema files (JSON or YAML, single schema or package).
    Validate(ValidateArgs),
    /// Parse one line strictly and print the populated values as JSON.
    Parse(ParseArgs),
    /// Print the completion target and candidates for a line as JSON.
    Complete(CompleteArgs),
    /// Execute lines read from stdin; each command prints its values.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Schema file.
    #[arg(long)]
    schema: PathBuf,
    /// Command line to parse; its first word selects the schema.
    #[arg(long, allow_hyphen_values = true)]
    line: String,
    /// Skip value type checks and validators.
    #[arg(long)]
    no_validate: bool,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    /// Schema file.
    #[arg(long)]
    schema: PathBuf,
    /// Command line to complete.
    #[arg(long, allow_hyphen_values = true)]
    line: String,
    /// Cursor byte offset (default: end of line).
    #[arg(long)]
    cursor: Option<usize>,
    /// Console configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Schema file.
    #[arg(long)]
    schema: PathBuf,
    /// Console configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Parse(args) => run_parse(args),
        Command::Complete(args) => run_complete(args),
        Command::Run(args) => run_lines(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) -> Result<(), String> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|err| err.to_string())
}

fn load_registry(path: &Path) -> Result<CommandRegistry, String> {
    let package = SchemaPackage::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
    info!(path = %path.display(), schemas = package.schema_count(), "Loaded schemas");
    Ok(CommandRegistry::from_package(package))
}

fn load_config(path: Option<&Path>) -> Result<ConsoleConfig, String> {
    match path {
        Some(path) => ConsoleConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display())),
        None => Ok(ConsoleConfig::default()),
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut registry = CommandRegistry::new();
    for path in &args.inputs {
        let package = SchemaPackage::load(path)
            .map_err(|err| format!("{}: {err}", path.display()))?;
        for schema in package.schemas {
            if registry.insert(schema).is_some() {
                debug!(path = %path.display(), "Schema replaced an earlier one");
            }
        }
    }

    let errors = validate_registry(&registry);
    if let Some(first) = errors.first() {
        for error in &errors {
            eprintln!("invalid: {error}");
        }
        return Err(format!("{} schema error(s), first: {first}", errors.len()));
    }

    println!(
        "Validated {} schema file(s) for {} command(s).",
        args.inputs.len(),
        registry.len()
    );
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let registry = load_registry(&args.schema)?;
    let schema = registry
        .find_for_line(&args.line)
        .ok_or_else(|| format!("No schema for line '{}'", args.line))?;

    let parsed = parse_line(&schema, &args.line, ParseMode::strict());
    let mut values = CommandValues::default();
    populate(&mut values, &parsed, !args.no_validate).map_err(|err| err.to_string())?;

    print_json(&values)
}

fn run_complete(args: CompleteArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let mut console = console_for(load_registry(&args.schema)?, config)?;
    let cursor = args.cursor.unwrap_or(args.line.len());
    if cursor > args.line.len() {
        return Err(format!(
            "Cursor {cursor} is past the end of the line ({} bytes)",
            args.line.len()
        ));
    }
    let completion = console.complete(&args.line, cursor);
    print_json(&completion)
}

fn run_lines(args: RunArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let mut console = console_for(load_registry(&args.schema)?, config)?;
    let interactive = std::io::stdin().is_terminal();

    let stdin = std::io::stdin();
    let mut failures = 0usize;
    loop {
        if interactive {
            print!("{}", console.prompt());
            std::io::stdout().flush().map_err(|err| err.to_string())?;
        }
        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|err| format!("Failed to read stdin: {err}"))?;
        if read == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        match console.execute(line) {
            Ok(CommandResult::Success) => {}
            Ok(CommandResult::Failure(code)) => debug!(code, "Line finished with failure"),
            Err(err) => {
                failures += 1;
                eprintln!("error: {err}");
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} line(s) failed"));
    }
    Ok(())
}

/// A console where every schema's command prints its populated values.
fn console_for(registry: CommandRegistry, config: ConsoleConfig) -> Result<Console, String> {
    let mut console = Console::new(config);
    for schema in registry.schemas() {
        let schema = schema.as_ref().clone();
        let command = FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
            let json = serde_json::to_string(invocation.values())
                .map_err(|err| CommandError::new(err.to_string()))?;
            invocation.println(&json);
            Ok(CommandResult::Success)
        });
        console.register(schema, command).map_err(|err| err.to_string())?;
    }
    Ok(console)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}
