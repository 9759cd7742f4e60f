use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use docx_comments::report::{CsvSink, JsonSink, RecordSink, columns};
use docx_comments::{Config, Error, extract_batch};

const DEFAULT_CONFIG: &str = "config.toml";

/// Extract reviewer comments from DOCX files
#[derive(Parser, Debug)]
#[command(name = "docx-comments", version)]
struct Args {
    /// DOCX files or directories containing them (defaults to `folder_path`)
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Report replies as top-level comments
    #[arg(long)]
    include_replies: bool,

    #[arg(long)]
    filename_delimiter: Option<String>,

    #[arg(long)]
    bubble_delimiter: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    /// One JSON record per line
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some documents failed.
fn run(args: Args) -> Result<bool, Error> {
    let mut config = Config::load_from_path(&args.config)?.unwrap_or_default();
    if args.include_replies {
        config.include_replies = true;
    }
    if let Some(d) = args.filename_delimiter {
        config.filename_delimiter = d;
    }
    if let Some(d) = args.bubble_delimiter {
        config.comment_bubble_delimiter = d;
    }
    if args.output.is_some() {
        config.output = args.output;
    }

    let inputs = if args.inputs.is_empty() {
        let folder = config.folder_path.clone().ok_or_else(|| {
            Error::Config("no input given and no folder_path configured".into())
        })?;
        vec![folder]
    } else {
        args.inputs
    };
    let files = collect_docx_files(&inputs)?;
    log::info!("Processing {} files", files.len());

    let t0 = Instant::now();
    let batch = extract_batch(&files, &config);

    for (path, e) in &batch.failures {
        if e.is_structural() {
            log::error!("{}: skipped, {e}", path.display());
        } else {
            log::error!("{}: {e}", path.display());
        }
    }

    let out: Box<dyn Write> = match config.output.as_deref() {
        None => Box::new(io::stdout().lock()),
        Some(p) if p == Path::new("-") => Box::new(io::stdout().lock()),
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            Box::new(fs::File::create(p)?)
        }
    };
    let out = BufWriter::new(out);
    match args.format {
        OutputFormat::Csv => {
            CsvSink::new(out, columns(config.response.add_columns))?.write_all(&batch.records)?
        }
        OutputFormat::Json => JsonSink::new(out).write_all(&batch.records)?,
    }

    log::info!(
        "Total of {} comments from {} files in {:.1}ms",
        batch.records.len(),
        batch.documents,
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    if !batch.failures.is_empty() {
        eprintln!("Failed to process {} files:", batch.failures.len());
        for (path, _) in &batch.failures {
            eprintln!("  {}", path.display());
        }
    }
    Ok(batch.failures.is_empty())
}

/// Expands directories (non-recursively) into their `.docx` files, skipping
/// Word lock files. Explicit file arguments are kept as given.
fn collect_docx_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_docx(p))
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn is_docx(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    !name.starts_with("~$")
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}
