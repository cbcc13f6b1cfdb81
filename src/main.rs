//! Academic paper anonymization CLI.
//!
//! Masks author names, email addresses and institutions in a PDF while
//! leaving protected sections (references, acknowledgments, ...) readable.
//! By default, performs anonymization. Subcommands report detections,
//! dump text, or print the installed backend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use paper_anonymizer::config::{self, RuntimeConfig, DEFAULT_MAX_INPUT_BYTES};
use paper_anonymizer::document::{extract_plain_text, read_file, write_file};
use paper_anonymizer::{AnonymizationService, AnonymizeOptions, Backend, FailureMode, MaskPolicy};

/// Academic paper anonymizer
///
/// Hides authorship in a PDF for double-blind review.
#[derive(Parser)]
#[command(name = "paper-anonymizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input PDF file path
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Leave author names untouched
    #[arg(long)]
    no_names: bool,

    /// Leave email addresses untouched
    #[arg(long)]
    no_emails: bool,

    /// Leave institutions untouched
    #[arg(long)]
    no_institutions: bool,

    /// Redaction backend
    #[arg(long, value_enum, default_value_t = BackendArg::Overlay, global = true)]
    backend: BackendArg,

    /// Mask style (defaults to reference codes for content-stream, stars for overlay)
    #[arg(long, value_enum)]
    mask: Option<MaskArg>,

    /// Reject the document instead of returning it partially redacted
    #[arg(long)]
    fail_closed: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Maximum input size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INPUT_BYTES, global = true)]
    max_size: usize,

    /// Print a redaction summary
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report detected entities, metadata and protected regions as JSON
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output JSON file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Dump the document's plain text (for debugging and verification)
    Text {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the active backend and exit
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    ContentStream,
    Overlay,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::ContentStream => Backend::ContentStream,
            BackendArg::Overlay => Backend::Overlay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MaskArg {
    Reference,
    Stars,
}

impl From<MaskArg> for MaskPolicy {
    fn from(arg: MaskArg) -> Self {
        match arg {
            MaskArg::Reference => MaskPolicy::ReferenceCode,
            MaskArg::Stars => MaskPolicy::FixedLength,
        }
    }
}

/// The requested input file is absent (reported with exit code 2).
#[derive(Debug, thiserror::Error)]
#[error("input file does not exist: {}", .0.display())]
struct MissingInput(PathBuf);

/// Command handler wrapping the anonymization service.
struct AnonymizeHandler {
    service: AnonymizationService,
    verbose: bool,
}

impl AnonymizeHandler {
    fn new(backend: Backend, verbose: bool) -> Self {
        Self {
            service: AnonymizationService::new(backend),
            verbose,
        }
    }

    fn anonymize(&self, input: &Path, output: &Path, options: &AnonymizeOptions) -> Result<()> {
        let bytes = read_input(input)?;

        let anonymized = self
            .service
            .anonymize(&bytes, options)
            .with_context(|| format!("Anonymization failed for {}", input.display()))?;

        write_file(output, &anonymized.bytes)?;

        let result = &anonymized.result;
        if self.verbose {
            println!("Anonymization Summary:");
            println!("  Backend:            {}", anonymized.backend);
            println!("  Pages processed:    {}", result.pages_processed);
            println!("  Pages modified:     {}", result.pages_modified);
            println!("  Instances redacted: {}", result.instances_redacted);
            println!("  Skipped (protected): {}", result.skipped_excluded);
            println!("  Not found in content: {}", result.missed);
            println!("  Pages failed:       {}", result.pages_failed);
            println!("  Author masked:      {}", result.metadata_masked);
        }

        if result.fell_back {
            println!("⚠ Document could not be rewritten; original copied → {}", output.display());
        } else if result.has_redactions() {
            println!(
                "✓ Anonymized {} instance(s) → {}",
                result.instances_redacted,
                output.display()
            );
        } else {
            println!("⚠ No identifying information found to anonymize");
        }

        Ok(())
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        let bytes = read_input(input)?;
        let report = self
            .service
            .extract(&bytes)
            .with_context(|| "Extraction failed")?;
        tracing::info!(entities = report.entity_count(), "extraction report ready");
        let json = report.to_json_pretty()?;
        write_or_print(output, &json)
    }

    fn text(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        let bytes = read_input(input)?;
        let text = extract_plain_text(&bytes).with_context(|| "Text extraction failed")?;
        write_or_print(output, &text)
    }

    fn info(&self) {
        let backend = self.service.backend();
        println!("status: ok");
        println!("backend: {}", backend);
        println!("library: {}", backend.library());
        println!("version: {}", env!("CARGO_PKG_VERSION"));
    }
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if !input.exists() {
        return Err(MissingInput(input.to_path_buf()).into());
    }
    Ok(read_file(input)?)
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_file(path, content.as_bytes())?;
            println!("✓ Wrote {} characters → {}", content.len(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn build_options(cli: &Cli) -> AnonymizeOptions {
    AnonymizeOptions {
        anonymize_names: !cli.no_names,
        anonymize_emails: !cli.no_emails,
        anonymize_institutions: !cli.no_institutions,
        mask_policy: cli.mask.map(MaskPolicy::from),
        failure_mode: if cli.fail_closed {
            FailureMode::FailClosed
        } else {
            FailureMode::FailOpen
        },
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: tracing subscriber already installed");
    }
}

fn run(cli: &Cli) -> Result<()> {
    config::init(
        RuntimeConfig::default()
            .with_log_level(cli.log_level.clone())
            .with_max_input_bytes(cli.max_size),
    )
    .with_context(|| "Invalid configuration")?;

    let handler = AnonymizeHandler::new(cli.backend.into(), cli.verbose);

    match &cli.command {
        Some(Commands::Extract { input, output }) => handler.extract(input, output.as_deref()),
        Some(Commands::Text { input, output }) => handler.text(input, output.as_deref()),
        Some(Commands::Info) => {
            handler.info();
            Ok(())
        }
        None => {
            // Default: anonymization mode
            let input = cli
                .input
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            let output = cli
                .output
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--output is required"))?;

            handler.anonymize(input, output, &build_options(cli))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if e.downcast_ref::<MissingInput>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
