//! chunk-monkey CLI - PDF to structured JSON, Markdown and HTML

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use chunk_monkey::loader::{DoclingCommandLoader, DoclingJsonLoader, DocumentLoader};
use chunk_monkey::pipeline::{BatchReport, Pipeline, PipelineOptions};
use chunk_monkey::{filter_by_section, load_structured_json, section_summary, JsonFormat};

/// Exit code when some files in a batch failed.
const EXIT_PARTIAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "chunk-monkey")]
#[command(version)]
#[command(about = "Convert PDFs into section-aware JSON, Markdown and HTML", long_about = None)]
struct Cli {
    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output directory
    #[arg(short, long, global = true, value_name = "DIR", env = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Raster scale for table and picture images (0.5-5.0)
    #[arg(long, global = true, value_name = "SCALE", env = "PDF_IMAGE_SCALE")]
    image_scale: Option<f32>,

    /// Python interpreter with Docling installed
    #[arg(long, global = true, value_name = "PATH", env = "DOCLING_PYTHON")]
    docling_python: Option<PathBuf>,

    /// Read `<stem>.json` Docling exports from this directory instead of running Docling
    #[arg(long, global = true, value_name = "DIR")]
    docling_export: Option<PathBuf>,

    /// Also append log lines to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline: images, JSON, Markdown variants and HTML
    Process {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
    },

    /// Extract images and write structured JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Generate the styled HTML page from a structured JSON file
    Html {
        /// Structured JSON file
        #[arg(value_name = "JSON")]
        json: PathBuf,
    },

    /// Process every PDF in a directory
    Batch {
        /// Directory containing PDF files
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Summarise sections of a structured JSON file
    Sections {
        /// Structured JSON file
        #[arg(value_name = "JSON")]
        json: PathBuf,

        /// Print records whose section matches this name
        #[arg(long, value_name = "NAME")]
        filter: Option<String>,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("{}: cannot open log file: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            let mut source = e.source();
            while let Some(cause) = source {
                debug!("caused by: {}", cause);
                source = cause.source();
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    match &cli.command {
        Commands::Process { pdf } => {
            let pipeline = build_pipeline(&cli, JsonFormat::Pretty)?;
            let output = pipeline.process_full_pipeline(pdf)?;
            print_files("Output files:", &output.files);
            Ok(0)
        }
        Commands::Json { pdf, compact } => {
            let format = if *compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let pipeline = build_pipeline(&cli, format)?;
            let output = pipeline.process_pdf_to_json(pdf)?;
            print_files("Output files:", &output.files);
            println!(
                "{} {} records, {} tables, {} images, {} references",
                "Extracted".green(),
                output.document.content.len(),
                output.document.tables.len(),
                output.document.images.len(),
                output.document.references.len()
            );
            Ok(0)
        }
        Commands::Html { json } => {
            let pipeline = build_pipeline(&cli, JsonFormat::Pretty)?;
            let path = pipeline.generate_html_from_json(json)?;
            println!("{} {}", "Saved to".green(), path.display());
            Ok(0)
        }
        Commands::Batch { dir } => {
            let pipeline = build_pipeline(&cli, JsonFormat::Pretty)?;
            let report = cmd_batch(&pipeline, dir)?;
            Ok(if report.is_partial_failure() {
                EXIT_PARTIAL
            } else {
                0
            })
        }
        Commands::Sections { json, filter } => {
            cmd_sections(json, filter.as_deref())?;
            Ok(0)
        }
    }
}

fn build_pipeline(cli: &Cli, format: JsonFormat) -> CliResult<Pipeline> {
    let mut options = PipelineOptions::from_env()?.with_json_format(format);
    if let Some(dir) = &cli.output {
        options = options.with_output_dir(dir);
    }
    if let Some(scale) = cli.image_scale {
        options = options.with_image_scale(scale);
    }

    let loader: Box<dyn DocumentLoader> = match (&cli.docling_export, &cli.docling_python) {
        (Some(dir), _) => Box::new(DoclingJsonLoader::with_export_dir(dir)),
        (None, Some(python)) => Box::new(DoclingCommandLoader::with_python(python)),
        (None, None) => Box::new(DoclingCommandLoader::new()),
    };
    debug!("Using loader {}", loader.name());

    Ok(Pipeline::with_loader(options, loader)?)
}

fn cmd_batch(pipeline: &Pipeline, dir: &Path) -> CliResult<BatchReport> {
    let total = chunk_monkey::fs::list_pdfs(dir)?.len() as u64;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = pipeline.batch_process_with(dir, |pdf, ok| {
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(if ok { name } else { format!("{} (failed)", name) });
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    println!(
        "\n{} {} succeeded, {} failed",
        "Batch complete:".green().bold(),
        report.succeeded.len(),
        report.failed.len()
    );
    for path in &report.succeeded {
        println!("  {} {}", "✓".green(), path.display());
    }
    for failure in &report.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.path.display(),
            failure.error.dimmed()
        );
    }
    Ok(report)
}

fn cmd_sections(json: &Path, filter: Option<&str>) -> CliResult<()> {
    let doc = load_structured_json(json)?;

    if let Some(name) = filter {
        let matched = filter_by_section(&doc, name);
        println!("{}", serde_json::to_string_pretty(&matched)?);
        eprintln!("{} {} records match {:?}", "Found".green(), matched.len(), name);
        return Ok(());
    }

    println!("{}", "Section Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (section, summary) in section_summary(&doc) {
        println!("{}", section.bold());
        println!(
            "  content: {}, tables: {}, images: {}, references: {}",
            summary.content_count,
            summary.table_count,
            summary.image_count,
            summary.reference_count
        );
        if !summary.subsections.is_empty() {
            println!("  subsections: {}", summary.subsections.join(", ").dimmed());
        }
    }
    Ok(())
}

fn print_files(title: &str, files: &[PathBuf]) {
    println!("\n{}", title.green().bold());
    for (i, file) in files.iter().enumerate() {
        let branch = if i + 1 == files.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), file.display());
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> io::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    builder.format_timestamp_secs();

    if let Some(path) = log_file {
        let file = File::options().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
    }
    builder.init();
    Ok(())
}

/// Writes log output to stderr and a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}
