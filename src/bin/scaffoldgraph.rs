//! Thin CLI collaborator: argument parsing and process exit codes only.
//! All behaviour lives in the library; this binary owns no state beyond
//! what `clap` parses and the `tracing_subscriber` it installs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use scaffoldgraph::config::ConfigDocument;
use scaffoldgraph::orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "scaffoldgraph", about = "Metadata-driven code generation engine")]
struct Cli {
    /// Project root to operate on.
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Path to the YAML configuration file, relative to the project root.
    #[arg(long, default_value = "scaffoldgraph.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs discovery only and prints the registry as JSON.
    Discover,
    /// Runs discovery, graph build, and validation; prints diagnostics.
    Validate,
    /// Runs the full pipeline and writes artifacts.
    Build,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.project_root.join(&cli.config);
    let config = match ConfigDocument::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(3);
        }
    };

    let orchestrator = Orchestrator::new(cli.project_root, config);

    match cli.command {
        Command::Discover => match orchestrator.discover() {
            Ok(()) => {
                let document = serde_json::json!({
                    "entities": orchestrator.registry().list_entities(),
                    "operations": orchestrator.registry().list_operations(),
                });
                match serde_json::to_string_pretty(&document) {
                    Ok(text) => {
                        println!("{text}");
                        ExitCode::SUCCESS
                    }
                    Err(err) => {
                        eprintln!("{err}");
                        ExitCode::from(3)
                    }
                }
            }
            Err(err) => {
                eprintln!("{err}");
                ExitCode::from(3)
            }
        },
        Command::Validate => match orchestrator.validate() {
            Ok((_, diagnostics)) => {
                for diagnostic in &diagnostics {
                    println!(
                        "[{:?}] {} {}: {}",
                        diagnostic.severity, diagnostic.code, diagnostic.subject, diagnostic.message
                    );
                }
                let has_errors = diagnostics
                    .iter()
                    .any(|d| d.severity == scaffoldgraph::model::Severity::Error);
                if has_errors {
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(err) => {
                eprintln!("{err}");
                ExitCode::from(3)
            }
        },
        Command::Build => match orchestrator.build(None) {
            Ok(report) => {
                for diagnostic in &report.diagnostics {
                    println!(
                        "[{:?}] {} {}: {}",
                        diagnostic.severity, diagnostic.code, diagnostic.subject, diagnostic.message
                    );
                }
                println!(
                    "wrote {} artifact(s) ({} entities, {} operations)",
                    report.artifacts_written.len(),
                    report.entity_count,
                    report.operation_count
                );
                if report.has_errors() {
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(err) => {
                eprintln!("{err}");
                ExitCode::from(3)
            }
        },
    }
}
