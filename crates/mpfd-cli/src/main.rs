/// mpfd command-line tool: inspect, validate, extract and build
/// `multipart/form-data` bodies.
///
/// # Command overview
///
/// ```text
/// mpfd <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print a per-part summary of a multipart body
///   validate   Decode a body completely and report problems
///   extract    Write the bytes of one part to a file or stdout
///   encode     Build a multipart body from a JSON manifest
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decoder events to stderr (-v debug, -vv trace)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// The boundary is given either directly (`--boundary`) or as the request's
/// `Content-Type` value (`--content-type`), which is how it usually arrives.
///
/// # Exit codes
///
/// | Code | Meaning                                  |
/// |------|------------------------------------------|
/// | 0    | Success                                  |
/// | 1    | Error (I/O failure, malformed body, etc.) |
///
/// All error details are written to stderr so stdout can be piped cleanly.
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mpfd_decoder::{PartDecoder, boundary_from_content_type};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cmd_encode;
mod cmd_extract;
mod cmd_inspect;
mod cmd_validate;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// The mpfd command-line tool.
#[derive(Parser)]
#[command(name = "mpfd", version, about = "Streaming multipart/form-data toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder events to stderr; repeat for more detail.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print a per-part summary of a multipart body.
    Inspect(InspectArgs),
    /// Decode a body completely and report problems.
    Validate(ValidateArgs),
    /// Write the bytes of one part to a file or stdout.
    Extract(ExtractArgs),
    /// Build a multipart body from a JSON manifest.
    Encode(EncodeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Where the body lives and how it is delimited. Shared by every reading
/// command.
#[derive(clap::Args)]
pub struct BodyArgs {
    /// Path to the raw multipart body (request body only, no HTTP head).
    pub file: PathBuf,

    /// Boundary token, without the leading `--`.
    #[arg(short, long, conflicts_with = "content_type")]
    pub boundary: Option<String>,

    /// Request `Content-Type` value to take the boundary from.
    #[arg(short = 't', long)]
    pub content_type: Option<String>,

    /// Ring buffer floor in bytes (rounded up to a power of two).
    #[arg(long)]
    pub buffer: Option<usize>,
}

impl BodyArgs {
    pub fn boundary(&self) -> Result<String> {
        match (&self.boundary, &self.content_type) {
            (Some(boundary), _) => Ok(boundary.clone()),
            (None, Some(content_type)) => boundary_from_content_type(content_type)
                .with_context(|| format!("cannot take a boundary from {content_type:?}")),
            (None, None) => bail!("either --boundary or --content-type is required"),
        }
    }

    /// Open the body file and wrap it in a decoder.
    pub fn open(&self) -> Result<PartDecoder<BufReader<File>>> {
        let boundary = self.boundary()?;
        let file = File::open(&self.file)
            .with_context(|| format!("cannot read {}", self.file.display()))?;
        let mut config = mpfd_decoder::DecoderConfig::default();
        if let Some(floor) = self.buffer {
            config = config.min_capacity(floor);
        }
        PartDecoder::with_config(BufReader::new(file), &boundary, config)
            .with_context(|| format!("cannot open multipart body {}", self.file.display()))
    }
}

/// Arguments for `mpfd inspect`.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────────┐
/// │ Flag         │ Effect                                               │
/// ├──────────────┼──────────────────────────────────────────────────────┤
/// │ --show-body  │ Include the first 80 chars of each body (lossy text) │
/// │ --headers    │ List every header of each part                       │
/// │ --part N     │ Show only the part at index N                        │
/// └──────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub body: BodyArgs,

    /// Show the start of each part body.
    #[arg(long)]
    pub show_body: bool,

    /// List all headers of each part.
    #[arg(long)]
    pub headers: bool,

    /// Inspect only the part at this zero-based index.
    #[arg(long)]
    pub part: Option<usize>,
}

/// Arguments for `mpfd validate`.
#[derive(clap::Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub body: BodyArgs,
}

/// Arguments for `mpfd extract`.
///
/// The part is chosen by index (`--part`) or by field name (`--name`, first
/// match).
#[derive(clap::Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub body: BodyArgs,

    /// Zero-based index of the part to extract.
    #[arg(long, conflicts_with = "name", required_unless_present = "name")]
    pub part: Option<usize>,

    /// Field name of the part to extract.
    #[arg(long)]
    pub name: Option<String>,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `mpfd encode`. See `cmd_encode` for the manifest format.
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Path to the JSON manifest describing the parts.
    pub input: PathBuf,

    /// Output body file path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Boundary to use; overrides the manifest's `boundary`.
    #[arg(short, long)]
    pub boundary: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => return,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: cannot install log subscriber: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Extract(args) => cmd_extract::run(&args),
        Commands::Encode(args) => cmd_encode::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
