use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use psd_decompose::{
    AbortPolicy, BatchOrchestrator, BatchReport, DecomposeOpts, MetadataStore, PngAssetWriter,
    TracingObserver,
};

#[derive(Parser, Debug)]
#[command(name = "psd-decompose", version)]
/// Decompose layered documents into per-layer PNG assets indexed in SQLite.
struct Cli {
    /// Directory scanned for documents.
    #[arg(long)]
    input_dir: PathBuf,

    /// Root directory for `{stem}/{order_index}.png` assets.
    #[arg(long)]
    output_dir: PathBuf,

    /// SQLite database file.
    #[arg(long, default_value = "decomposed_psd.db")]
    db: PathBuf,

    /// Create the documents and layers tables if missing.
    #[arg(long)]
    create_schema: bool,

    /// Extension of input documents.
    #[arg(long, default_value = "psd")]
    extension: String,

    /// What an aborted document leaves behind.
    #[arg(long, value_enum, default_value_t = AbortPolicyArg::Retain)]
    abort_policy: AbortPolicyArg,

    /// Write 3-channel RGB PNGs, discarding layer alpha.
    #[arg(long)]
    no_alpha: bool,

    /// Also append logs (without colors) to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the batch report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AbortPolicyArg {
    /// Keep the document row and written assets.
    Retain,
    /// Remove the document row and written assets.
    Rollback,
}

impl From<AbortPolicyArg> for AbortPolicy {
    fn from(arg: AbortPolicyArg) -> Self {
        match arg {
            AbortPolicyArg::Retain => Self::Retain,
            AbortPolicyArg::Rollback => Self::Rollback,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let store = MetadataStore::open(&cli.db)
        .with_context(|| format!("open metadata store '{}'", cli.db.display()))?
        .with_abort_policy(cli.abort_policy.into());
    if cli.create_schema {
        store.ensure_schema().context("create schema")?;
    }

    let opts = DecomposeOpts {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        extension: cli.extension.trim_start_matches('.').to_string(),
    };
    let writer = PngAssetWriter::new().with_alpha(!cli.no_alpha);
    let mut orchestrator = BatchOrchestrator::new(store, writer, opts);
    let report = orchestrator
        .run(&mut TracingObserver)
        .context("batch stopped")?;

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }
    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    use tracing_subscriber::{field::MakeExt as _, filter::LevelFilter, fmt, prelude::*};

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file '{}'", path.display()))?;
            // Span fields are cached per formatter type, so the file layer needs its own to stay
            // free of the stderr layer's colors.
            let plain_fields = fmt::format::debug_fn(|w, field, value| {
                if field.name() == "message" {
                    write!(w, "{value:?}")
                } else {
                    write!(w, "{field}={value:?}")
                }
            })
            .delimited(" ");
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .fmt_fields(plain_fields)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(level)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();
    Ok(())
}

fn write_report(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report dir '{}'", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create report '{}'", path.display()))?;
    serde_json::to_writer_pretty(f, report)
        .with_context(|| format!("write report '{}'", path.display()))?;
    Ok(())
}
