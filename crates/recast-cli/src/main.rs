//! recast CLI: run, validate, and explain transform pipelines.

mod logging;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use recast_core::config::EngineConfig;
use recast_exec::Engine;
use recast_planner::{parse_document, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "recast")]
#[command(about = "Declarative record-transform pipelines over JSON data", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline over a JSON input file
    Run {
        /// Path to the pipeline document (YAML or JSON)
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Input JSON file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,

        /// Write the run manifest to this file
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Separator for the `list` aggregate (overrides config)
        #[arg(long)]
        list_separator: Option<String>,

        /// Default `format` date pattern (overrides config)
        #[arg(long)]
        date_format: Option<String>,
    },

    /// Validate a pipeline document (every step is built, nothing runs)
    Validate {
        /// Path to the pipeline document
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the compiled step list
    Explain {
        /// Path to the pipeline document
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            output,
            pretty,
            manifest,
            list_separator,
            date_format,
        } => {
            let overrides = PipelineConfig {
                list_separator,
                default_date_format: date_format,
                ..Default::default()
            };
            let args = RunArgs {
                pipeline: &pipeline,
                input: input.as_deref(),
                output: output.as_deref(),
                manifest: manifest.as_deref(),
                pretty,
            };
            if let Err(e) = run_pipeline(&args, &overrides) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => match load_pipeline(&pipeline, &EngineConfig::from_env()) {
            Ok(p) => println!("✓ Pipeline is valid ({} steps)", p.len()),
            Err(e) => {
                eprintln!("Validation failed: {e}");
                std::process::exit(1);
            }
        },
        Commands::Explain { pipeline } => {
            if let Err(e) = explain_pipeline(&pipeline) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}

struct RunArgs<'a> {
    pipeline: &'a Path,
    input: Option<&'a Path>,
    output: Option<&'a Path>,
    manifest: Option<&'a Path>,
    pretty: bool,
}

fn load_pipeline(
    path: &Path,
    base: &EngineConfig,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let src = fs::read_to_string(path)?;
    Ok(Pipeline::compile(parse_document(&src)?, base)?)
}

fn read_input(path: Option<&Path>) -> Result<Value, Box<dyn std::error::Error>> {
    let text = match path {
        Some(p) => fs::read_to_string(p)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn render(value: &Value, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Layer CLI flags over the document's `config` block.
fn apply_cli_overrides(doc: &mut PipelineConfig, cli: &PipelineConfig) {
    if let Some(sep) = &cli.list_separator {
        doc.list_separator = Some(sep.clone());
    }
    if let Some(pattern) = &cli.default_date_format {
        doc.default_date_format = Some(pattern.clone());
    }
}

fn run_pipeline(
    args: &RunArgs<'_>,
    overrides: &PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new(EngineConfig::from_env());
    let mut pipeline = load_pipeline(args.pipeline, engine.config())?;
    apply_cli_overrides(&mut pipeline.config, overrides);

    let input = read_input(args.input)?;
    let result = engine.run(&pipeline, &input)?;

    let rendered = render(&result.output, args.pretty)?;
    match args.output {
        Some(path) => fs::write(path, rendered + "\n")?,
        None => println!("{rendered}"),
    }
    if let Some(path) = args.manifest {
        fs::write(path, serde_json::to_string_pretty(&result.manifest)?)?;
    }

    tracing::info!(
        steps = result.manifest.steps.len(),
        duration_ms = result.manifest.finished_ms.saturating_sub(result.manifest.started_ms),
        pipeline_hash = %result.manifest.pipeline_hash,
        "pipeline executed"
    );
    Ok(())
}

fn explain_pipeline(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let base = EngineConfig::from_env();
    let pipeline = load_pipeline(path, &base)?;
    let cfg = pipeline.engine_config(&base);

    println!("Pipeline");
    println!("========");
    println!("Fingerprint: {}", pipeline.fingerprint());
    println!("List separator: {:?}", cfg.list_separator);
    println!("Flatten separator: {:?}", cfg.flatten_separator);
    println!("Date format: {}", cfg.default_date_format);
    println!();
    if pipeline.is_empty() {
        println!("(no steps; input is returned unchanged)");
    }
    for line in pipeline.describe() {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_win_over_document_config() {
        let mut doc = PipelineConfig {
            list_separator: Some(";".into()),
            flatten_separator: Some("_".into()),
            ..Default::default()
        };
        let cli = PipelineConfig {
            list_separator: Some("|".into()),
            ..Default::default()
        };
        apply_cli_overrides(&mut doc, &cli);
        assert_eq!(doc.list_separator.as_deref(), Some("|"));
        assert_eq!(doc.flatten_separator.as_deref(), Some("_"));
    }

    #[test]
    fn document_config_overrides_env_defaults() {
        let mut cfg = EngineConfig::default();
        let doc = PipelineConfig {
            default_date_format: Some("DD.MM.YYYY".into()),
            ..Default::default()
        };
        doc.apply_to(&mut cfg);
        assert_eq!(cfg.default_date_format, "DD.MM.YYYY");
        assert_eq!(cfg.list_separator, ", ");
    }

    #[test]
    fn render_respects_pretty_flag() {
        let v = serde_json::json!({"a": 1});
        assert_eq!(render(&v, false).unwrap(), r#"{"a":1}"#);
        assert!(render(&v, true).unwrap().contains('\n'));
    }
}
