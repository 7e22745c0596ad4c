//! CLI binary for edgequake-pdftext.
//!
//! A thin shim over the library crate: `serve` exposes the pipeline over
//! HTTP, `extract` runs it once and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgequake_pdftext::{
    ensure_pdfium_library, start_server, AppState, DocumentRequest, PdfTextError, PdfiumBlockSource,
    Pipeline, PipelineConfig, DEFAULT_CHUNK_SIZE,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve POST /procesar_pdf on port 8080
  pdftext serve

  # Serve on a different port (PORT is also honoured)
  PORT=9000 pdftext serve

  # Extract once and print the text
  pdftext extract https://arxiv.org/pdf/1706.03762

  # Full output with per-run statistics, as JSON
  pdftext extract https://arxiv.org/pdf/1706.03762 --json

  # Smaller chunks restricted to Latin-1
  pdftext --chunk-size 2000 --encoding windows-1252 extract https://example.com/a.pdf

PDFIUM:
  The pdfium shared library is loaded at runtime from PDFIUM_LIB_PATH, the
  working directory, or the system library path, in that order. If none of
  these work, a prebuilt library is downloaded once into the user cache
  (override the location with PDFTEXT_PDFIUM_CACHE). Pass
  --no-pdfium-download to disable this.
"#;

/// Extract ordered, chunked text from PDFs on the web.
#[derive(Parser, Debug)]
#[command(
    name = "pdftext",
    version,
    about = "Extract ordered, chunked text from PDFs on the web",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum chunk length in characters.
    #[arg(long, global = true, env = "PDFTEXT_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "PDFTEXT_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Target encoding label (utf-8, windows-1252, shift_jis, ...).
    #[arg(long, global = true, env = "PDFTEXT_ENCODING", default_value = "utf-8")]
    encoding: String,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "PDFTEXT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to the pdfium shared library file.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Never download pdfium; fail requests if it cannot be found.
    #[arg(long, global = true, env = "PDFTEXT_NO_PDFIUM_DOWNLOAD")]
    no_pdfium_download: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFTEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFTEXT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind.
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },

    /// Process one URL and print its text.
    Extract {
        /// HTTP/HTTPS URL of the PDF.
        url: String,

        /// Print chunks and statistics as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .chunk_size(cli.chunk_size)
        .download_timeout_secs(cli.download_timeout)
        .encoding(cli.encoding.as_str());
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_library_path(path.clone());
    }
    builder.build().context("Invalid configuration")
}

fn check_pdfium(path: Option<&Path>) -> std::result::Result<(), PdfTextError> {
    tokio::task::block_in_place(|| PdfiumBlockSource::check_binding(path))
}

/// Make sure `config` points at a bindable pdfium, downloading one into the
/// cache when allowed. A missing library only fails requests, so this warns
/// instead of exiting.
async fn resolve_pdfium(config: &mut PipelineConfig, allow_download: bool) {
    let Err(e) = check_pdfium(config.pdfium_library_path.as_deref()) else {
        return;
    };
    if !allow_download {
        warn!("pdfium is not available, extraction will fail: {}", e);
        return;
    }

    info!("pdfium not found ({}), fetching a prebuilt copy", e);
    match ensure_pdfium_library().await {
        Ok(path) => match check_pdfium(Some(&path)) {
            Ok(()) => {
                info!("Using pdfium from {}", path.display());
                config.pdfium_library_path = Some(path);
            }
            Err(e) => warn!("Downloaded pdfium could not be loaded: {}", e),
        },
        Err(e) => warn!("pdfium is not available, extraction will fail: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = build_config(&cli)?;
    resolve_pdfium(&mut config, !cli.no_pdfium_download).await;

    let pipeline = Pipeline::new(config).context("Failed to initialise pipeline")?;

    match cli.command {
        Command::Serve { ref host, port } => {
            let addr = format!("{host}:{port}");
            info!("Starting PDF text extraction server");
            start_server(&addr, AppState::new(pipeline))
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
        }
        Command::Extract { ref url, json } => {
            let output = pipeline
                .process(&DocumentRequest::new(url.as_str()))
                .await
                .with_context(|| format!("Failed to extract text from {url}"))?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            if json {
                let rendered = serde_json::to_string_pretty(&output)
                    .context("Failed to serialize output")?;
                writeln!(out, "{rendered}")?;
            } else {
                for chunk in &output.chunks {
                    out.write_all(chunk.as_bytes())?;
                }
                out.flush()?;
                if !cli.quiet {
                    eprintln!(
                        "{} pages, {} chars, {} chunks in {:.1}s",
                        output.stats.page_count,
                        output.stats.text_chars,
                        output.stats.chunk_count,
                        output.stats.total_duration_ms as f64 / 1000.0
                    );
                }
            }
        }
    }

    Ok(())
}
