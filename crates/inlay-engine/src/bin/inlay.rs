/// Inlay CLI: evaluate the expression spans of a document in one shot.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use inlay_engine::{render_summary, Editor, RenderSummary};
use inlay_eval::{display_value, EvalOutcome, MapScope, Value};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "inlay")]
#[command(about = "Evaluates {{ ... }} expression spans embedded in a text document")]
#[command(version)]
struct Args {
    /// Input document (reads stdin when omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// JSON file of scope values available to expressions
    #[arg(short, long, value_name = "FILE")]
    scope: Option<PathBuf>,

    /// Emit machine-readable JSON instead of text
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct SpanReport {
    source: String,
    #[serde(flatten)]
    outcome: EvalOutcome,
}

#[derive(Serialize)]
struct Report {
    spans: Vec<SpanReport>,
    summary: Option<RenderSummary>,
}

fn main() {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(any_fault) => {
            if any_fault {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let scope = match &args.scope {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            load_scope(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => MapScope::new(),
    };

    // A batch tool has no keystrokes to debounce; evaluate immediately.
    let mut editor = Editor::from_text(&text);
    editor.run_eval_cycle(&scope);
    let doc = editor.document();

    let spans: Vec<SpanReport> = doc
        .top_level_spans()
        .into_iter()
        .map(|span| SpanReport {
            source: doc.span_source(span),
            outcome: doc
                .span_outcome(span)
                .cloned()
                .unwrap_or(EvalOutcome::NotRun),
        })
        .collect();
    let any_fault = spans.iter().any(|s| !s.outcome.is_valid());
    let summary = render_summary(doc);

    if args.json {
        let report = Report { spans, summary };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for span in &spans {
            match &span.outcome {
                EvalOutcome::Success { value } => {
                    println!("{{{{ {} }}}} => {}", span.source, display_value(value));
                }
                EvalOutcome::Error { kind, message } => {
                    println!("{{{{ {} }}}} => {}: {}", span.source, kind, message);
                }
                EvalOutcome::NotRun => {
                    println!("{{{{ {} }}}} => (not evaluated)", span.source);
                }
            }
        }
        if let Some(summary) = &summary {
            if !spans.is_empty() {
                println!();
            }
            match &summary.error {
                Some(error) => println!("result: {}: {}", error.kind, error.message),
                None => println!("result: {}", display_value(&summary.result)),
            }
        }
    }

    Ok(any_fault)
}

/// Parse a JSON object file into a scope, key by key in file order.
fn load_scope(raw: &str) -> Result<MapScope> {
    let parsed: serde_json::Value = serde_json::from_str(raw)?;
    let serde_json::Value::Object(entries) = parsed else {
        anyhow::bail!("scope file must be a JSON object");
    };
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect())
}
