//! `nlsql` — parse or translate a tokenized Russian question against a
//! catalog fixture, printing `{status, result|message}` JSON to stdout.
//!
//! This is the closest in-repo stand-in for "one POST route accepts
//! `{query}`": the morphological analyzer and the live database are external
//! collaborators this binary does not have, so a fixture file stands in for
//! both — it carries pre-tokenized, pre-lemmatized input plus the catalog
//! rows the core would otherwise fetch through a database driver.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use nlsql_core::{Catalog, DomainError, StaticCatalog, Token};
use nlsql_planner::{parse_traced, translate, PrintTracer, QueryIntent};

#[derive(Parser)]
#[command(name = "nlsql", version, about = "Russian natural-language-to-SQL core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match the grammar against a fixture's tokens and print the resolved intent tree.
    Parse {
        /// Path to a JSON fixture: `{"tokens": [...], "catalog": {...}}`.
        fixture: PathBuf,
        /// Print every match-engine transition/accept event to stderr.
        #[arg(long)]
        trace: bool,
    },
    /// Parse a fixture and render the SQL the join planner and emitter produce.
    Translate {
        /// Path to a JSON fixture: `{"tokens": [...], "catalog": {...}}`.
        fixture: PathBuf,
        /// Print every match-engine transition/accept event to stderr.
        #[arg(long)]
        trace: bool,
    },
}

/// The fixture shape this binary reads in place of a live lemmatizer +
/// catalog-provider database round trip.
#[derive(Debug, Deserialize)]
struct Fixture {
    tokens: Vec<Token>,
    catalog: StaticCatalog,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome<T: Serialize> {
    Success { result: T },
    Error { message: String },
}

fn load_fixture(path: &PathBuf) -> Result<Fixture, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    parse_fixture(&text).map_err(|e| format!("parsing {}: {e}", path.display()))
}

fn parse_fixture(text: &str) -> Result<Fixture, serde_json::Error> {
    serde_json::from_str(text)
}

fn print_outcome<T: Serialize>(outcome: Outcome<T>) {
    let json = serde_json::to_string_pretty(&outcome).expect("Outcome serializes infallibly");
    println!("{json}");
}

fn run_parse(fixture: &PathBuf, trace: bool) -> Result<QueryIntent, String> {
    let fixture = load_fixture(fixture)?;
    parse_loaded(&fixture, trace).map_err(|e| e.to_string())
}

fn parse_loaded(fixture: &Fixture, trace: bool) -> Result<QueryIntent, DomainError> {
    let catalog = Catalog::build(&fixture.catalog);
    if trace {
        let mut tracer = PrintTracer::new();
        let intent = parse_traced(&fixture.tokens, &catalog, &mut tracer);
        print_trace(&tracer);
        intent
    } else {
        nlsql_planner::parse(&fixture.tokens, &catalog)
    }
}

fn translate_loaded(fixture: &Fixture, trace: bool) -> Result<String, DomainError> {
    let catalog = Catalog::build(&fixture.catalog);
    let intent = parse_loaded(fixture, trace)?;
    translate(&intent, &catalog)
}

fn print_trace(tracer: &PrintTracer) {
    for line in tracer.lines() {
        eprintln!("{line}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { fixture, trace } => match run_parse(&fixture, trace) {
            Ok(intent) => {
                print_outcome(Outcome::Success { result: intent });
                ExitCode::SUCCESS
            }
            Err(message) => {
                print_outcome::<()>(Outcome::Error { message });
                ExitCode::FAILURE
            }
        },
        Command::Translate { fixture, trace } => {
            let outcome = load_fixture(&fixture).and_then(|loaded| translate_loaded(&loaded, trace).map_err(|e| e.to_string()));
            match outcome {
                Ok(sql) => {
                    print_outcome(Outcome::Success { result: sql });
                    ExitCode::SUCCESS
                }
                Err(message) => {
                    print_outcome::<()>(Outcome::Error { message });
                    ExitCode::FAILURE
                }
            }
        }
    }
}
