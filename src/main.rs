use clap::{Parser as ClapParser, Subcommand};
use mosaic_lang::cli::{self, CheckOptions, CheckResult, CliError};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(ClapParser)]
#[command(name = "mosaic")]
#[command(about = "Mosaic - parse polyglot scripts that mix native control flow with guest-language calls")]
#[command(version)]
struct Cli {
    /// Log parser decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and print its syntax tree as JSON
    Check {
        /// Script file (reads stdin if neither FILE nor --source is given)
        file: Option<PathBuf>,

        /// Script text
        #[arg(short, long, conflicts_with = "file")]
        source: Option<String>,

        /// Configuration file (.json or .toml); may be repeated
        #[arg(short, long = "config")]
        config: Vec<PathBuf>,

        /// Maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't print the tree
        #[arg(long)]
        syntax_only: bool,
    },

    /// List construct handlers in dispatch order
    Handlers {
        /// Configuration file (.json or .toml); may be repeated
        #[arg(short, long = "config")]
        config: Vec<PathBuf>,
    },

    /// List guest languages and their aliases
    Languages {
        /// Configuration file (.json or .toml); may be repeated
        #[arg(short, long = "config")]
        config: Vec<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            file,
            source,
            config,
            max_depth,
            pretty,
            syntax_only,
        } => run_check(file, source, config, max_depth, pretty, syntax_only),
        Commands::Handlers { config } => cli::load_config(&config, None).map(|config| {
            print!("{}", cli::handler_table(&config));
        }),
        Commands::Languages { config } => cli::load_config(&config, None).map(|config| {
            print!("{}", cli::language_table(&config));
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    file: Option<PathBuf>,
    source: Option<String>,
    config_paths: Vec<PathBuf>,
    max_depth: Option<usize>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let source = match (file, source) {
        (Some(path), _) => std::fs::read_to_string(path)?,
        (None, Some(s)) => s,
        (None, None) if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (None, None) => return Err(CliError::NoInput),
    };

    let options = CheckOptions {
        source,
        config_paths,
        max_depth,
        pretty,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
