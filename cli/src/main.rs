//! `config-dump`: parse a configuration document, resolve its includes
//! and references, and print the materialized parameter set.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use config_schema_core::{ParameterSet, PrintMode};
use config_schema_parser::{parse_document_file, PathPolicy};
use tracing::debug;

const EXIT_SUCCESS: i32 = 0;
const EXIT_HELP: i32 = 1;
const EXIT_PROCESSING: i32 = 2;
const EXIT_CONFIG: i32 = 3;
const EXIT_PARSE: i32 = 4;
const EXIT_UNKNOWN: i32 = 5;

/// Default environment variable consulted for the search path.
const PATH_ENV_VAR: &str = "CONFIG_FILE_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The document language itself.
    Native,
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "config-dump")]
#[command(about = "Parse, resolve, and dump configuration documents")]
struct Cli {
    /// Input document.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input document (positional alternative to --config).
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (default is stdout).
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Append source location annotations to each assignment.
    #[arg(short = 'a', long = "annotate")]
    annotate: bool,

    /// Put source location annotations on the line preceding each
    /// assignment (mutually exclusive with --annotate).
    #[arg(long = "prefix-annotate")]
    prefix_annotate: bool,

    /// Parse and resolve only; suppress output.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Lookup policy code: 0 paths as given, 1 everything through the
    /// search path, 2 relative paths only, 3 includes only.
    #[arg(short = 'l', long = "lookup-policy", default_value_t = 1, value_name = "CODE")]
    lookup_policy: u8,

    /// Environment variable or ':'-separated directory list used by the
    /// lookup policy.
    #[arg(short = 'p', long = "path", default_value = PATH_ENV_VAR, value_name = "ENV-OR-PATH")]
    path: String,

    /// Output format.
    #[arg(short = 'F', long = "format", value_enum, default_value_t = OutputFormat::Native)]
    format: OutputFormat,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CONFIG_DUMP_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_HELP,
                _ => EXIT_PROCESSING,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let Some(input) = cli.config.clone().or_else(|| cli.input.clone()) else {
        eprintln!("Missing input configuration file; pass one with -c or positionally.");
        return EXIT_CONFIG;
    };
    if cli.annotate && cli.prefix_annotate {
        eprintln!("Cannot specify both '--annotate' and '--prefix-annotate'.");
        return EXIT_CONFIG;
    }
    if cli.quiet && (cli.annotate || cli.prefix_annotate) {
        eprintln!("Cannot specify both '--quiet' and an annotation option.");
        return EXIT_CONFIG;
    }
    if cli.format != OutputFormat::Native && (cli.annotate || cli.prefix_annotate) {
        eprintln!("Annotations are only available with the native output format.");
        return EXIT_CONFIG;
    }

    let policy = match PathPolicy::from_code(cli.lookup_policy, &cli.path) {
        Ok(policy) => policy,
        Err(err) => {
            eprintln!("{err}");
            return EXIT_CONFIG;
        }
    };
    debug!(input = %input.display(), policy = policy.name(), "processing document");

    let pset = match parse_document_file(&input, &policy) {
        Ok(pset) => pset,
        Err(err) => {
            eprintln!("{err}");
            return EXIT_PARSE;
        }
    };

    if cli.quiet {
        return EXIT_SUCCESS;
    }

    let rendered = match render(&cli, &input, &policy, &pset) {
        Ok(rendered) => rendered,
        Err(message) => {
            eprintln!("{message}");
            return EXIT_UNKNOWN;
        }
    };

    match &cli.output {
        None => {
            print!("{rendered}");
            EXIT_SUCCESS
        }
        Some(path) => match std::fs::write(path, rendered) {
            Ok(()) => EXIT_SUCCESS,
            Err(err) => {
                eprintln!("Cannot write '{}': {err}", path.display());
                EXIT_PROCESSING
            }
        },
    }
}

fn render(
    cli: &Cli,
    input: &std::path::Path,
    policy: &PathPolicy,
    pset: &ParameterSet,
) -> Result<String, String> {
    match cli.format {
        OutputFormat::Native => {
            let mode = if cli.annotate {
                PrintMode::Annotated
            } else if cli.prefix_annotate {
                PrintMode::PrefixAnnotated
            } else {
                PrintMode::Raw
            };
            let mut out = String::new();
            out.push_str("# Produced by 'config-dump' using:\n");
            out.push_str(&format!("#   Input  : {}\n", input.display()));
            out.push_str(&format!("#   Policy : {}\n", policy.name()));
            out.push_str(&format!("#   Path   : \"{}\"\n\n", cli.path));
            out.push_str(&pset.to_indented_string(0, mode));
            Ok(out)
        }
        OutputFormat::Json => serde_json::to_string_pretty(pset)
            .map(|text| text + "\n")
            .map_err(|err| format!("JSON serialization failed: {err}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(pset).map_err(|err| format!("YAML serialization failed: {err}"))
        }
    }
}
