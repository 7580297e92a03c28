//! qalabel: documents, answers and labels for question-answering evaluation.
//!
//! qalabel models the data that flows through a question-answering system:
//! documents with deterministic content-based ids, answers pointing into
//! them, and human or system labels judging those answers. Labels for one
//! question are aggregated into a deduplicated view for evaluation.
//!
//! # Modules
//!
//! - [`schema`]: Document, Answer, Label, MultiLabel and offset types
//! - [`aggregate`]: Grouping flat label collections into MultiLabels
//! - [`convert`]: FAQ CSV and JSON/JSONL document converters
//! - [`validation`]: Label set validation and error reporting
//! - [`error`]: Error types for qalabel operations

pub mod aggregate;
pub mod convert;
pub mod error;
pub mod schema;
pub mod validation;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;

pub use error::{QaLabelError, SchemaError};

use schema::{Label, MultiLabel};

/// The qalabel CLI application.
#[derive(Parser)]
#[command(name = "qalabel")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format ('text' or 'json').
    #[arg(long, global = true, default_value = "text", env = "QALABEL_LOG_FORMAT")]
    log_format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an FAQ CSV or JSON/JSONL file into a document file.
    Convert(ConvertArgs),
    /// Group labels into MultiLabels.
    Aggregate(AggregateArgs),
    /// Validate a label file for errors and warnings.
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input files to convert, concatenated in order.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Input format ('csv-faq', 'json' or 'jsonl'). Guessed from the file
    /// extensions when omitted; all inputs must then agree.
    #[arg(long)]
    from: Option<String>,

    /// Output format ('json' or 'jsonl').
    #[arg(long, default_value = "json")]
    to: String,

    /// Output file.
    #[arg(short, long)]
    output: PathBuf,

    /// Field to hash document ids from (repeatable).
    #[arg(long = "id-hash-key")]
    id_hash_keys: Vec<String>,

    /// Metadata attached to every document, as KEY=VALUE (repeatable).
    /// VALUE is parsed as JSON when possible and kept as a string otherwise.
    #[arg(long = "meta")]
    meta: Vec<String>,
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// JSON file holding an array of labels.
    input: PathBuf,

    /// Group by document as well as by query and filters.
    #[arg(long)]
    closed_domain: bool,

    /// Keep only labels with a correct answer and a correct document.
    #[arg(long)]
    drop_negative_labels: bool,

    /// Drop labels without an answer.
    #[arg(long)]
    drop_no_answers: bool,

    /// Write the MultiLabels here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// JSON file holding an array of labels.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Also check that content-hashed document ids match their content.
    #[arg(long)]
    check_document_ids: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the qalabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), QaLabelError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, &cli.log_format)?;

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Aggregate(args)) => run_aggregate(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("qalabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Documents, answers and labels for question-answering evaluation.");
            println!();
            println!("Run 'qalabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8, log_format: &str) -> Result<(), QaLabelError> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "qalabel=info",
        1 => "qalabel=debug",
        _ => "qalabel=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // logs go to stderr so stdout stays clean for command output
    match log_format {
        "text" => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        "json" => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        other => {
            return Err(QaLabelError::InvalidArgument(format!(
                "unknown log format '{}' (expected 'text' or 'json')",
                other
            )))
        }
    }
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<(), QaLabelError> {
    let from = match &args.from {
        Some(name) => name.parse()?,
        None => guess_common_format(&args.inputs)?,
    };
    let to: convert::Format = args.to.parse()?;
    if !to.is_writable() {
        return Err(QaLabelError::UnsupportedFormat(format!(
            "'{}' cannot be written (supported: json, jsonl)",
            to
        )));
    }

    let opts = convert::ConvertOptions {
        meta: parse_meta(&args.meta)?,
        id_hash_keys: (!args.id_hash_keys.is_empty()).then_some(args.id_hash_keys),
    };

    let inputs: Vec<&Path> = args.inputs.iter().map(PathBuf::as_path).collect();
    let documents = convert::converter_for(from).convert_all(&inputs, &opts)?;
    convert::write_documents(&args.output, to, &documents)?;

    info!(
        documents = documents.len(),
        inputs = inputs.len(),
        from = %from,
        to = %to,
        "converted"
    );
    let sources = match inputs.as_slice() {
        [single] => single.display().to_string(),
        many => format!("{} files", many.len()),
    };
    println!(
        "Converted {} document(s) from {} to {}",
        documents.len(),
        sources,
        args.output.display()
    );
    Ok(())
}

fn run_aggregate(args: AggregateArgs) -> Result<(), QaLabelError> {
    let labels = read_labels(&args.input)?;
    let label_count = labels.len();

    let opts = aggregate::AggregateOptions {
        open_domain: !args.closed_domain,
        drop_negative_labels: args.drop_negative_labels,
        drop_no_answers: args.drop_no_answers,
    };
    let multilabels = aggregate::aggregate_labels(labels, &opts)?;

    match &args.output {
        Some(path) => {
            write_multilabels(path, &multilabels)?;
            println!(
                "Aggregated {} label(s) into {} MultiLabel(s) in {}",
                label_count,
                multilabels.len(),
                path.display()
            );
        }
        None => {
            let json = serde_json::to_string_pretty(&multilabels).map_err(|source| {
                QaLabelError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), QaLabelError> {
    let labels = read_labels(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
        check_document_ids: args.check_document_ids,
    };
    let report = validation::validate_labels(&labels, &opts);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report.to_json_value()).map_err(|source| {
                QaLabelError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        _ => {
            print!("{}", report);
        }
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(QaLabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Guesses one input format for all of `paths`, failing when they disagree.
fn guess_common_format(paths: &[PathBuf]) -> Result<convert::Format, QaLabelError> {
    let mut guessed: Option<convert::Format> = None;
    for path in paths {
        let format = guess_format(path)?;
        match guessed {
            Some(first) if first != format => {
                return Err(QaLabelError::UnsupportedFormat(format!(
                    "inputs mix '{}' and '{}' files; pass --from",
                    first, format
                )));
            }
            _ => guessed = Some(format),
        }
    }
    guessed.ok_or_else(|| QaLabelError::InvalidArgument("no input files".to_string()))
}

fn guess_format(path: &Path) -> Result<convert::Format, QaLabelError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Ok(convert::Format::CsvFaq),
        "json" => Ok(convert::Format::Json),
        "jsonl" | "ndjson" => Ok(convert::Format::Jsonl),
        _ => Err(QaLabelError::UnsupportedFormat(format!(
            "cannot guess the format of {}; pass --from",
            path.display()
        ))),
    }
}

/// Parses repeated `KEY=VALUE` pairs into a metadata mapping.
fn parse_meta(pairs: &[String]) -> Result<Option<Map<String, Value>>, QaLabelError> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut meta = Map::new();
    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            QaLabelError::InvalidArgument(format!("--meta expects KEY=VALUE, got '{}'", pair))
        })?;
        if key.is_empty() {
            return Err(QaLabelError::InvalidArgument(format!(
                "--meta key is empty in '{}'",
                pair
            )));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        meta.insert(key.to_string(), value);
    }
    Ok(Some(meta))
}

fn read_labels(path: &Path) -> Result<Vec<Label>, QaLabelError> {
    let file = File::open(path).map_err(QaLabelError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| QaLabelError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_multilabels(path: &Path, multilabels: &[MultiLabel]) -> Result<(), QaLabelError> {
    let file = File::create(path).map_err(QaLabelError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, multilabels).map_err(|source| {
        QaLabelError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(QaLabelError::Io)
}
