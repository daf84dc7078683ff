//! CLI binary for plate-extract.
//!
//! Two modes over the same [`FormSession`]:
//!
//! * one-shot: `plate-extract car.jpg` selects, submits, prints the number;
//! * `--interactive`: a line-oriented form where `select`, `submit` and
//!   `view` can be typed while an upload is still in flight.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use plate_extract::form::{EXTRACTION_FAILED_MESSAGE, SUBMITTING_LABEL};
use plate_extract::{
    resolve_image, Completion, Extraction, FormSession, HttpTransport, ImagePreview, Outcome,
    PlateReading, SelectedImage, SubmissionObserver, SubmitRefused, UploadConfig,
    DEFAULT_ENDPOINT,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows a spinner while the upload is outstanding and clears it once the
/// request settles.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Extracting...");
        Arc::new(Self { bar })
    }
}

impl SubmissionObserver for SpinnerObserver {
    fn on_submit_start(&self, file_name: &str, byte_len: usize) {
        self.bar.set_message(format!("{file_name} ({byte_len} bytes)"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_success(&self, _number: &str, _elapsed_ms: u64) {
        self.bar.finish_and_clear();
    }

    fn on_failure(&self, _detail: &str, _elapsed_ms: u64) {
        self.bar.finish_and_clear();
    }

    fn on_discarded(&self, _generation: u64) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract the plate from one photo (prints the number on stdout)
  plate-extract car.jpg

  # Talk to a service somewhere else
  plate-extract --endpoint http://10.0.0.5:5000/upload car.jpg

  # Structured output, with the preview summary
  plate-extract --json --preview car.jpg

  # Interactive form: select / submit / view / quit
  plate-extract --interactive

ENVIRONMENT VARIABLES:
  PLATE_EXTRACT_ENDPOINT  Upload URL (default http://localhost:5000/upload)
  PLATE_EXTRACT_TIMEOUT   Whole-request timeout in seconds (default: none)
  RUST_LOG                tracing filter, overrides -v / -q
"#;

/// Upload an image to a license-plate extraction service.
#[derive(Parser, Debug)]
#[command(
    name = "plate-extract",
    version,
    about = "Upload an image to a license-plate extraction service and print the number",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file to upload.
    #[arg(required_unless_present = "interactive")]
    image: Option<PathBuf>,

    /// Upload endpoint of the extraction service.
    #[arg(long, env = "PLATE_EXTRACT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Whole-request timeout in seconds. Unset means no override.
    #[arg(long, env = "PLATE_EXTRACT_TIMEOUT")]
    timeout: Option<u64>,

    /// Output JSON instead of the bare number.
    #[arg(long, env = "PLATE_EXTRACT_JSON")]
    json: bool,

    /// Print the preview line for the selected image.
    #[arg(long)]
    preview: bool,

    /// Disable the spinner.
    #[arg(long, env = "PLATE_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Run the line-oriented form instead of a single upload.
    #[arg(short, long)]
    interactive: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PLATE_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long, env = "PLATE_EXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already says what is happening; keep library INFO lines
    // out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.interactive;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    let config = build_config(&cli)?;
    let transport = Arc::new(HttpTransport::new(&config).context("Failed to set up HTTP client")?);
    let mut session = FormSession::new(transport);

    if cli.interactive {
        return run_interactive(session).await;
    }

    if show_progress {
        session = session.with_observer(SpinnerObserver::new());
    }
    let Some(path) = cli.image.as_ref() else {
        anyhow::bail!("an IMAGE argument is required outside --interactive");
    };
    run_once(&cli, &session, path).await
}

/// Map CLI args to `UploadConfig`.
fn build_config(cli: &Cli) -> Result<UploadConfig> {
    let mut builder = UploadConfig::builder().endpoint(&cli.endpoint);
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

async fn run_once(cli: &Cli, session: &FormSession, path: &Path) -> Result<()> {
    let image = resolve_image(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if !cli.quiet {
        if let Some(warning) = accept_hint_warning(&image) {
            eprintln!("{warning}");
        }
    }
    session.select_image(image.clone());

    let view = session.view();
    if cli.preview && !cli.json {
        if let Some(ref p) = view.preview {
            eprintln!("{} {}", dim("preview:"), p);
        }
    }

    let start = Instant::now();
    let completion = session.submit().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match completion {
        Completion::Applied(Outcome::Success(number)) => {
            if cli.json {
                let out = Extraction::new(number, image.file_name(), session.endpoint(), duration_ms);
                let preview = if cli.preview {
                    view.preview.as_ref().map(|p| (p, &image))
                } else {
                    None
                };
                let json = json_report(&out, preview)?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json).context("Failed to serialise output")?
                );
            } else {
                println!("{number}");
                if !cli.quiet {
                    eprintln!("{}", describe_reading(&PlateReading::classify(&number), duration_ms));
                }
            }
            Ok(())
        }
        Completion::Applied(_) => {
            eprintln!("{} {}", red("✘"), EXTRACTION_FAILED_MESSAGE);
            anyhow::bail!("extraction failed against {}", session.endpoint())
        }
        Completion::Refused(refused) => anyhow::bail!("{refused}"),
        Completion::Discarded { generation } => {
            anyhow::bail!("request {generation} was discarded")
        }
    }
}

/// The `--json` document. With a preview, the extraction is nested next to
/// the preview summary and its `data:` URI.
fn json_report(
    out: &Extraction,
    preview: Option<(&ImagePreview, &SelectedImage)>,
) -> Result<serde_json::Value> {
    let extraction = serde_json::to_value(out).context("Failed to serialise output")?;
    let Some((p, image)) = preview else {
        return Ok(extraction);
    };
    let mut preview = serde_json::to_value(p).context("Failed to serialise preview")?;
    preview["data_uri"] = serde_json::Value::String(p.data_uri(image));
    Ok(serde_json::json!({ "extraction": extraction, "preview": preview }))
}

fn describe_reading(reading: &PlateReading, duration_ms: u64) -> String {
    let took = dim(&format!("{:.1}s", duration_ms as f64 / 1000.0));
    match reading {
        PlateReading::Plate(_) => format!("{} plate recognised  {took}", green("✔")),
        PlateReading::NotDetected => format!("{} no plate detected  {took}", yellow("⚠")),
        PlateReading::Unrecognized => format!("{} plate found but unreadable  {took}", yellow("⚠")),
        PlateReading::Empty => format!("{} service returned no number  {took}", yellow("⚠")),
        PlateReading::Other(_) => format!("{} unusual reading  {took}", yellow("⚠")),
    }
}

/// The picker only hints at `image/*`; anything else is sent with a warning.
fn accept_hint_warning(image: &SelectedImage) -> Option<String> {
    if image.matches_accept_hint() {
        return None;
    }
    Some(format!(
        "{} {} is not an image/* file ({}); sending it anyway",
        yellow("⚠"),
        image.file_name(),
        image.mime_type()
    ))
}

// ── Interactive form ─────────────────────────────────────────────────────────

const INTERACTIVE_HELP: &str = "commands: select <path> | submit | view | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Select(PathBuf),
    /// `select` with no path.
    SelectUsage,
    Submit,
    View,
    Help,
    Quit,
    Blank,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    match cmd {
        "" => Command::Blank,
        "select" | "s" if arg.is_empty() => Command::SelectUsage,
        "select" | "s" => Command::Select(PathBuf::from(arg)),
        "submit" | "u" => Command::Submit,
        "view" | "v" => Command::View,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Apply one command. Never waits on the network: `submit` runs on its own
/// task and reports through stdout when it settles.
async fn handle(session: &FormSession, cmd: Command, out: &mut impl Write) -> io::Result<Flow> {
    match cmd {
        Command::Blank => {}
        Command::SelectUsage => writeln!(out, "usage: select <path>")?,
        Command::Select(path) => match resolve_image(&path).await {
            Ok(image) => {
                if let Some(warning) = accept_hint_warning(&image) {
                    writeln!(out, "{warning}")?;
                }
                session.select_image(image);
                write!(out, "{}", session.view())?;
            }
            Err(e) => writeln!(out, "{} {e}", red("✘"))?,
        },
        Command::Submit => {
            if session.is_loading() {
                writeln!(
                    out,
                    "{}",
                    dim(&format!("[ {SUBMITTING_LABEL} ] (disabled until the request settles)"))
                )?;
                return Ok(Flow::Continue);
            }
            let pending = session.spawn_submit();
            let printer = session.clone();
            tokio::spawn(async move {
                let settled = pending.await;
                if let Err(e) = report_completion(&printer, settled, &mut io::stdout()) {
                    tracing::warn!("Could not print submit result: {e}");
                }
            });
        }
        Command::View => write!(out, "{}", session.view())?,
        Command::Help => writeln!(out, "{INTERACTIVE_HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
        Command::Unknown(other) => writeln!(out, "unknown command '{other}'. {INTERACTIVE_HELP}")?,
    }
    Ok(Flow::Continue)
}

fn report_completion(
    session: &FormSession,
    settled: Result<Completion, tokio::task::JoinError>,
    out: &mut impl Write,
) -> io::Result<()> {
    match settled {
        Ok(Completion::Applied(_)) | Ok(Completion::Refused(SubmitRefused::NoImage)) => {
            write!(out, "{}", session.view())
        }
        Ok(Completion::Refused(SubmitRefused::InFlight)) => {
            writeln!(out, "{}", dim("submit is disabled while a request is in flight"))
        }
        Ok(Completion::Discarded { generation }) => {
            writeln!(out, "{}", dim(&format!("(result of request {generation} discarded)")))
        }
        Err(e) => writeln!(out, "{} submit task failed: {e}", red("✘")),
    }
}

async fn run_interactive(session: FormSession) -> Result<()> {
    eprintln!("{}", bold(plate_extract::form::TITLE));
    eprintln!("{}", dim(INTERACTIVE_HELP));
    eprintln!("{}", dim(&format!("endpoint: {}", session.endpoint())));

    let mut stdout = io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let flow = handle(&session, parse_command(&line), &mut stdout)
            .await
            .context("Failed to write to stdout")?;
        stdout.flush().ok();
        if flow == Flow::Quit {
            break;
        }
    }

    session.teardown();
    Ok(())
}
