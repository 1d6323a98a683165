//! # CLI Module
//!
//! Command-line interface for Manage Digital Ingest.
//!
//! ## Usage
//! ```bash
//! # Match spreadsheet filenames to files on disk
//! mdi match --root /Volumes/scans photo1.jpg photo2.jpg
//!
//! # Targets from a CSV column, stricter threshold, CSV output
//! mdi match --root /Volumes/scans --csv objects.csv --column OBJ --threshold 95 --output csv
//!
//! # Write the matched names back into a timestamped copy of the CSV
//! mdi match --root /Volumes/scans --csv objects.csv --column OBJ --update-csv
//!
//! # Make file names safe, then create Alma thumbnails
//! mdi sanitize "OBJS/letter 01.tif"
//! mdi derive OBJS/*.tif --mode alma --sanitize
//!
//! # The whole workflow
//! mdi ingest --root /Volumes/scans --csv objects.csv --column OBJ --mode collection-builder --blob-root /srv/blobs
//! ```

mod input;

use digital_ingest::config::IngestConfig;
use digital_ingest::core::batch::{BatchMatcher, BatchResults};
use digital_ingest::core::derivative::{
    sanitize_path, DerivativeGenerator, DerivativeReport, ImageResizer, MagickResizer,
    NativeResizer, ProcessingMode,
};
use digital_ingest::core::matcher::WalkConfig;
use digital_ingest::core::pipeline::{IngestPipeline, PipelineResult};
use digital_ingest::core::reporter::{
    export_derivatives_csv, export_matches_csv, export_uploads_csv, MatchReport,
};
use digital_ingest::core::upload::{
    blob_url, Container, FsBlobStore, UploadGate, UploadOutcome, UploadReport,
};
use digital_ingest::error::{IngestError, MatchError, Result};
use digital_ingest::events::{
    DerivativeEvent, Event, EventChannel, EventReceiver, MatchEvent, PipelineEvent, UploadEvent,
};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

/// Manage Digital Ingest - match, derive and upload collection objects
#[derive(Parser, Debug)]
#[command(name = "mdi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Filenames to look for
    targets: Vec<String>,

    /// File with one filename per line
    #[arg(long)]
    targets_file: Option<PathBuf>,

    /// CSV file holding the filenames
    #[arg(long, requires = "column")]
    csv: Option<PathBuf>,

    /// CSV column holding the filenames
    #[arg(long)]
    column: Option<String>,

    /// Minimum match score, 0-100 (default from config, else 90)
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Write matched file names back into a copy of the CSV
    #[arg(long, requires = "csv")]
    update_csv: bool,

    /// Where the updated CSV goes (default: timestamped copy beside it)
    #[arg(long, requires = "update_csv")]
    csv_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find the best-matching file for each target name
    Match {
        /// Directory to search (default from config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        #[command(flatten)]
        targets: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Create derivatives for files
    Derive {
        /// Source files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Derivative mode (default from config)
        #[arg(short, long)]
        mode: Option<ModeArg>,

        /// Resize backend
        #[arg(long, default_value = "magick")]
        resizer: ResizerArg,

        /// Rename files to safe names before deriving
        #[arg(long)]
        sanitize: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Rename files so their names hold no spaces or special characters
    Sanitize {
        /// Files to rename
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Upload files to the blob store, skipping blobs that exist
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Blob store directory (default from config)
        #[arg(long)]
        blob_root: Option<PathBuf>,

        /// Container for every file (default: inferred from each name)
        #[arg(long)]
        container: Option<ContainerArg>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Match, derive and upload in one go
    Ingest {
        /// Directory to search (default from config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        #[command(flatten)]
        targets: TargetArgs,

        /// Derivative mode (default from config)
        #[arg(short, long)]
        mode: Option<ModeArg>,

        /// Resize backend
        #[arg(long, default_value = "magick")]
        resizer: ResizerArg,

        /// Blob store directory; uploads are skipped without one
        #[arg(long)]
        blob_root: Option<PathBuf>,

        /// Rename matched files to safe names before deriving
        #[arg(long)]
        sanitize: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Set the default derivative mode
    SetMode { mode: ModeArg },
    /// Set the default match threshold
    SetThreshold { value: u32 },
    /// Set the default search root
    SetSearchRoot { path: PathBuf },
    /// Set the blob store directory
    SetBlobRoot { path: PathBuf },
    /// Set the public base URL of the blob store
    SetBaseUrl { url: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Alma: 200px .jpg.clientThumb thumbnails
    Alma,
    /// CollectionBuilder: 400px _TN and 800px _SMALL
    CollectionBuilder,
}

impl From<ModeArg> for ProcessingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Alma => ProcessingMode::Alma,
            ModeArg::CollectionBuilder => ProcessingMode::CollectionBuilder,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResizerArg {
    /// ImageMagick `magick` (images and PDFs)
    Magick,
    /// Built-in resizer (images only)
    Native,
}

impl ResizerArg {
    fn build(self) -> Box<dyn ImageResizer> {
        match self {
            ResizerArg::Magick => Box::new(MagickResizer::new()),
            ResizerArg::Native => Box::new(NativeResizer::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContainerArg {
    Objs,
    Thumbs,
    Smalls,
    Transcripts,
}

impl From<ContainerArg> for Container {
    fn from(container: ContainerArg) -> Self {
        match container {
            ContainerArg::Objs => Container::Objs,
            ContainerArg::Thumbs => Container::Thumbs,
            ContainerArg::Smalls => Container::Smalls,
            ContainerArg::Transcripts => Container::Transcripts,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// CSV for spreadsheets
    Csv,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = IngestConfig::load(cli.config.as_deref())?;

    let directive = if cli.verbose { "info" } else { "warn" };
    match &config.log_file {
        Some(log_file) => digital_ingest::init_tracing_with_log_file(directive, log_file)
            .map_err(|e| {
                IngestError::Input(format!("Cannot open log file {}: {}", log_file.display(), e))
            })?,
        None => digital_ingest::init_tracing(directive),
    }

    match cli.command {
        Commands::Match {
            root,
            targets,
            output,
        } => run_match(&config, root, targets, output),
        Commands::Derive {
            files,
            mode,
            resizer,
            sanitize,
            output,
        } => run_derive(&config, files, mode, resizer, sanitize, output),
        Commands::Sanitize { files } => run_sanitize(files),
        Commands::Upload {
            files,
            blob_root,
            container,
            output,
        } => run_upload(&config, files, blob_root, container, output),
        Commands::Ingest {
            root,
            targets,
            mode,
            resizer,
            blob_root,
            sanitize,
            output,
        } => run_ingest(
            &config,
            root,
            targets,
            IngestOptions {
                mode,
                resizer,
                blob_root,
                sanitize,
            },
            output,
        ),
        Commands::Config { action } => run_config(config, cli.config.as_deref(), action),
    }
}

fn resolve_root(config: &IngestConfig, root: Option<PathBuf>) -> Result<PathBuf> {
    let root = root.or_else(|| config.search_root.clone()).ok_or_else(|| {
        IngestError::Input(
            "No search root. Pass --root or run `mdi config set-search-root`.".to_string(),
        )
    })?;

    if !root.is_dir() {
        return Err(MatchError::RootNotFound { path: root }.into());
    }
    Ok(root)
}

fn resolve_threshold(config: &IngestConfig, threshold: Option<u32>) -> Result<u8> {
    match threshold {
        None => Ok(config.threshold),
        Some(value) if value <= 100 => Ok(value as u8),
        Some(value) => Err(MatchError::InvalidThreshold { value }.into()),
    }
}

fn resolve_mode(config: &IngestConfig, mode: Option<ModeArg>) -> Result<ProcessingMode> {
    mode.map(ProcessingMode::from)
        .or(config.mode)
        .ok_or_else(|| {
            IngestError::Input(
                "No derivative mode. Pass --mode or run `mdi config set-mode`.".to_string(),
            )
        })
}

fn resolve_targets(args: &TargetArgs) -> Result<Vec<String>> {
    input::collect_targets(
        args.targets.clone(),
        args.targets_file.as_deref(),
        args.csv.as_deref(),
        args.column.as_deref(),
    )
}

fn walk_config(args: &TargetArgs) -> WalkConfig {
    WalkConfig {
        include_hidden: !args.skip_hidden,
        ..WalkConfig::default()
    }
}

fn progress_bar(len: usize, output: OutputFormat) -> Option<ProgressBar> {
    if !matches!(output, OutputFormat::Pretty) {
        return None;
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    Some(pb)
}

/// Feed event messages to the progress bar until the sender is dropped
fn spawn_event_thread(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Match(MatchEvent::Progress(p)) => {
                    pb.set_message(p.target);
                }
                Event::Derivative(DerivativeEvent::Started { total })
                | Event::Upload(UploadEvent::Started { total }) => {
                    pb.set_position(0);
                    pb.set_length(total as u64);
                }
                Event::Derivative(DerivativeEvent::Created { source, .. })
                | Event::Derivative(DerivativeEvent::Failed { source, .. }) => {
                    pb.set_message(file_name(&source));
                    pb.inc(1);
                }
                Event::Upload(UploadEvent::Copied { key, .. })
                | Event::Upload(UploadEvent::Exists { key, .. })
                | Event::Upload(UploadEvent::Failed { key, .. }) => {
                    pb.set_message(key);
                    pb.inc(1);
                }
                _ => {}
            }
        }
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_header(term: &Term, output: OutputFormat) {
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Manage Digital Ingest").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn run_match(
    config: &IngestConfig,
    root: Option<PathBuf>,
    args: TargetArgs,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    let root = resolve_root(config, root)?;
    let threshold = resolve_threshold(config, args.threshold)?;
    let targets = resolve_targets(&args)?;

    print_header(&term, output);

    let matcher = BatchMatcher::builder()
        .root(root.clone())
        .threshold(threshold)
        .walk_config(walk_config(&args))
        .build();

    let (sender, receiver) = EventChannel::new();
    let progress = progress_bar(targets.len(), output);
    let event_thread = spawn_event_thread(receiver, progress.clone());

    let total = targets.len();
    let bar = progress.clone();
    let results = matcher.run_with_events(
        &targets,
        |fraction| {
            if let Some(ref pb) = bar {
                pb.set_position((fraction * total as f64).round() as u64);
            }
        },
        || false,
        &sender,
    );

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let Some(results) = results else {
        term.write_line(&format!("{} Search cancelled", style("!").yellow().bold()))
            .ok();
        return Ok(());
    };

    let report = MatchReport::new(root, threshold, &results);
    match output {
        OutputFormat::Pretty => print_pretty_matches(&term, &results, &report),
        OutputFormat::Json => print_json(&report),
        OutputFormat::Csv => write_csv(|out| export_matches_csv(results.iter(), out))?,
    }

    let replacements = csv_replacements(&results, |path| path.to_path_buf());
    write_back_csv(&term, &args, &replacements)
}

/// Target name to the file name of its match
fn csv_replacements<F>(results: &BatchResults, current_path: F) -> HashMap<String, String>
where
    F: Fn(&Path) -> PathBuf,
{
    results
        .iter()
        .filter_map(|candidate| {
            let path = candidate.best_path.as_deref()?;
            Some((candidate.target_name.clone(), file_name(&current_path(path))))
        })
        .collect()
}

fn write_back_csv(
    term: &Term,
    args: &TargetArgs,
    replacements: &HashMap<String, String>,
) -> Result<()> {
    let (true, Some(csv), Some(column)) = (args.update_csv, &args.csv, &args.column) else {
        return Ok(());
    };

    let dest = args
        .csv_out
        .clone()
        .unwrap_or_else(|| input::working_copy_path(csv));
    let updated = input::update_csv(csv, column, replacements, &dest)?;

    let line = if updated == 0 {
        format!("{} No matching rows found to update", style("!").yellow().bold())
    } else {
        format!(
            "{} Updated {} filename(s) in {}",
            style("✓").green().bold(),
            updated,
            dest.display()
        )
    };
    term.write_line(&line).ok();
    Ok(())
}

fn write_csv<F>(export: F) -> Result<()>
where
    F: FnOnce(&mut std::io::StdoutLock<'static>) -> std::io::Result<()>,
{
    let mut out = std::io::stdout().lock();
    export(&mut out).map_err(|e| IngestError::Input(format!("Failed to write CSV: {}", e)))
}

fn print_pretty_matches(term: &Term, results: &BatchResults, report: &MatchReport) {
    for candidate in results.iter() {
        let line = match &candidate.best_path {
            Some(path) => format!(
                "  {} {} {} {}",
                style("✓").green(),
                candidate.target_name,
                style(format!("({}%)", candidate.score)).dim(),
                path.display()
            ),
            None => format!(
                "  {} {} {}",
                style("✗").red(),
                candidate.target_name,
                style(format!("(best {}%)", candidate.score)).dim()
            ),
        };
        term.write_line(&line).ok();
    }

    term.write_line("").ok();
    term.write_line(&format!("  {}", style(report.summary()).cyan())).ok();
}

fn run_derive(
    config: &IngestConfig,
    files: Vec<PathBuf>,
    mode: Option<ModeArg>,
    resizer: ResizerArg,
    sanitize: bool,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    let mode = resolve_mode(config, mode)?;
    print_header(&term, output);

    let files = if sanitize {
        sanitize_all(&term, files)
    } else {
        files
    };

    let generator = DerivativeGenerator::new(resizer.build());
    let (sender, receiver) = EventChannel::new();
    let progress = progress_bar(files.len(), output);
    let event_thread = spawn_event_thread(receiver, progress.clone());

    let report = generator.run_with_events(&files, mode, &sender);

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match output {
        OutputFormat::Pretty => print_pretty_derivatives(&term, &report),
        OutputFormat::Json => print_json(&report.results),
        OutputFormat::Csv => write_csv(|out| export_derivatives_csv(&report.results, out))?,
    }

    Ok(())
}

/// Rename every file to its safe name. A file that cannot be renamed keeps
/// its path; the whitespace check reports it later.
fn sanitize_all(term: &Term, files: Vec<PathBuf>) -> Vec<PathBuf> {
    files
        .into_iter()
        .map(|path| match sanitize_path(&path) {
            Ok(renamed) => renamed,
            Err(e) => {
                term.write_line(&format!("  {} {}", style("!").yellow(), e)).ok();
                path
            }
        })
        .collect()
}

fn run_sanitize(files: Vec<PathBuf>) -> Result<()> {
    let term = Term::stderr();
    let mut failed = 0;

    for path in &files {
        let line = match sanitize_path(path) {
            Ok(renamed) if renamed == *path => {
                format!("  {} {}", style("=").dim(), path.display())
            }
            Ok(renamed) => format!(
                "  {} {} -> {}",
                style("✓").green(),
                path.display(),
                file_name(&renamed)
            ),
            Err(e) => {
                failed += 1;
                format!("  {} {}", style("✗").red(), e)
            }
        };
        term.write_line(&line).ok();
    }

    if failed > 0 {
        return Err(IngestError::Input(format!(
            "{} of {} file(s) could not be renamed",
            failed,
            files.len()
        )));
    }
    Ok(())
}

fn print_pretty_derivatives(term: &Term, report: &DerivativeReport) {
    for result in &report.results {
        let line = match &result.output_path {
            Some(path) => format!(
                "  {} {} {}",
                style("✓").green(),
                style(result.kind).dim(),
                path.display()
            ),
            None => format!(
                "  {} {} {}: {}",
                style("✗").red(),
                style(result.kind).dim(),
                result.source_path.display(),
                result.error.as_deref().unwrap_or("failed")
            ),
        };
        term.write_line(&line).ok();
    }
    for error in &report.errors {
        term.write_line(&format!("  {} {}", style("!").yellow(), error)).ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "  {} created, {} failed in {:.1}s",
        style(report.created_count()).cyan(),
        style(report.failed_count()).red(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
}

fn run_upload(
    config: &IngestConfig,
    files: Vec<PathBuf>,
    blob_root: Option<PathBuf>,
    container: Option<ContainerArg>,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    let blob_root = blob_root.or_else(|| config.blob_root.clone()).ok_or_else(|| {
        IngestError::Input(
            "No blob store. Pass --blob-root or run `mdi config set-blob-root`.".to_string(),
        )
    })?;
    print_header(&term, output);

    let items: Vec<(PathBuf, Container)> = files
        .into_iter()
        .map(|path| {
            let container = container
                .map(Container::from)
                .unwrap_or_else(|| Container::infer_from_name(&file_name(&path)));
            (path, container)
        })
        .collect();

    let gate = UploadGate::new(FsBlobStore::new(blob_root));
    let (sender, receiver) = EventChannel::new();
    let progress = progress_bar(items.len(), output);
    let event_thread = spawn_event_thread(receiver, progress.clone());

    let report = gate.upload_batch_with_events(&items, &sender);

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match output {
        OutputFormat::Pretty => print_pretty_uploads(&term, &report, config.blob_base_url.as_deref()),
        OutputFormat::Json => print_json(&report),
        OutputFormat::Csv => write_csv(|out| export_uploads_csv(&report.records, out))?,
    }

    Ok(())
}

fn print_pretty_uploads(term: &Term, report: &UploadReport, base_url: Option<&str>) {
    for record in &report.records {
        let marker = match record.outcome {
            UploadOutcome::Copied => style("↑").green(),
            UploadOutcome::Exists => style("=").dim(),
            UploadOutcome::Failed => style("✗").red(),
        };
        let location = match base_url {
            Some(base) => blob_url(base, record.container, &record.key),
            None => format!("{}/{}", record.container, record.key),
        };
        term.write_line(&format!("  {} {} {}", marker, record.outcome, location))
            .ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "  {} copied, {} already present, {} failed",
        style(report.copied).cyan(),
        style(report.exists).dim(),
        style(report.failed).red()
    ))
    .ok();
}

/// Derive and upload settings of `mdi ingest`
struct IngestOptions {
    mode: Option<ModeArg>,
    resizer: ResizerArg,
    blob_root: Option<PathBuf>,
    sanitize: bool,
}

fn run_ingest(
    config: &IngestConfig,
    root: Option<PathBuf>,
    args: TargetArgs,
    options: IngestOptions,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    let root = resolve_root(config, root)?;
    let threshold = resolve_threshold(config, args.threshold)?;
    let mode = resolve_mode(config, options.mode)?;
    let targets = resolve_targets(&args)?;
    print_header(&term, output);

    let mut builder = IngestPipeline::builder()
        .root(root.clone())
        .threshold(threshold)
        .mode(mode)
        .walk_config(walk_config(&args))
        .sanitize(options.sanitize)
        .resizer(options.resizer.build());
    if let Some(blob_root) = options.blob_root.or_else(|| config.blob_root.clone()) {
        builder = builder.store(Box::new(FsBlobStore::new(blob_root)));
    }
    let pipeline = builder.build();

    let (sender, receiver) = EventChannel::new();
    let progress = progress_bar(targets.len(), output);
    let event_thread = spawn_event_thread(receiver, progress.clone());

    let total = targets.len();
    let bar = progress.clone();
    let result = pipeline.run_with_events(
        &targets,
        |fraction| {
            if let Some(ref pb) = bar {
                pb.set_position((fraction * total as f64).round() as u64);
            }
        },
        || false,
        &sender,
    );

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let Some(result) = result else {
        term.write_line(&format!("{} Ingest cancelled", style("!").yellow().bold()))
            .ok();
        return Ok(());
    };

    let report = MatchReport::new(root, threshold, &result.matches);
    match output {
        OutputFormat::Pretty => print_pretty_ingest(&term, &result, &report, config),
        OutputFormat::Json => print_json(&serde_json::json!({
            "summary": result.summary(),
            "matches": result.matches.iter().collect::<Vec<_>>(),
            "sanitized": result.sanitized,
            "derivatives": result.derivatives.results,
            "uploads": result.uploads,
        })),
        OutputFormat::Csv => write_csv(|out| export_matches_csv(result.matches.iter(), out))?,
    }

    let replacements =
        csv_replacements(&result.matches, |path| result.current_path(path).to_path_buf());
    write_back_csv(&term, &args, &replacements)
}

fn print_pretty_ingest(
    term: &Term,
    result: &PipelineResult,
    report: &MatchReport,
    config: &IngestConfig,
) {
    term.write_line(&format!("{}", style("Matches").bold().underlined())).ok();
    print_pretty_matches(term, &result.matches, report);
    term.write_line("").ok();

    for (from, to) in &result.sanitized {
        term.write_line(&format!(
            "  {} {} -> {}",
            style("renamed").dim(),
            from.display(),
            file_name(to)
        ))
        .ok();
    }

    term.write_line(&format!("{}", style("Derivatives").bold().underlined())).ok();
    print_pretty_derivatives(term, &result.derivatives);
    term.write_line("").ok();

    if let Some(ref uploads) = result.uploads {
        term.write_line(&format!("{}", style("Uploads").bold().underlined())).ok();
        print_pretty_uploads(term, uploads, config.blob_base_url.as_deref());
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{} Ingest complete in {:.1}s",
        style("✓").green().bold(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
}

fn run_config(mut config: IngestConfig, path: Option<&Path>, action: ConfigAction) -> Result<()> {
    let term = Term::stdout();

    match action {
        ConfigAction::Show => {
            let location = path
                .map(Path::to_path_buf)
                .or_else(IngestConfig::default_path)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no config directory)".to_string());
            term.write_line(&format!("{} {}", style("Config:").bold(), style(location).dim()))
                .ok();
            print_json(&config);
            return Ok(());
        }
        ConfigAction::SetMode { mode } => config.mode = Some(mode.into()),
        ConfigAction::SetThreshold { value } => {
            config.threshold = resolve_threshold(&config, Some(value))?;
        }
        ConfigAction::SetSearchRoot { path } => config.search_root = Some(path),
        ConfigAction::SetBlobRoot { path } => config.blob_root = Some(path),
        ConfigAction::SetBaseUrl { url } => config.blob_base_url = Some(url),
    }

    let saved = config.save(path)?;
    term.write_line(&format!(
        "{} Saved {}",
        style("✓").green().bold(),
        saved.display()
    ))
    .ok();
    Ok(())
}
