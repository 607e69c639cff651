//! gaiatest: destructive UI test runner CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use gaiatest::capture::{self, CaptureMode};
use gaiatest::client::CommandClient;
use gaiatest::config::{load_testvars, starter_testvars, TESTVARS_FILENAME};
use gaiatest::gate::RiskGate;
use gaiatest::reporter::json::load_runs;
use gaiatest::reporter::{ConsoleReporter, HtmlReporter, JsonReporter, ReportDocument, ReportEncoding};
use gaiatest::runner::{load_manifest, TestRunner};
use gaiatest::RunResult;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status when the run finished with failures, errors or unexpected passes
const EXIT_RUN_FAILED: u8 = 10;
/// Exit status when the risk gate refused or was aborted
const EXIT_GATE: u8 = 1;
/// Exit status for configuration, manifest and report I/O errors
const EXIT_USAGE: u8 = 2;

/// gaiatest: run destructive UI test cases and report the results
#[derive(Parser, Debug)]
#[command(name = "gaiatest")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Case manifest to run (omit when using a subcommand)
    #[arg(required = true)]
    manifest: Option<PathBuf>,

    /// Restart the target between cases (forwarded to every case)
    #[arg(long)]
    restart: bool,

    /// Write the HTML report here
    #[arg(long, value_name = "PATH")]
    html_output: Option<PathBuf>,

    /// Write the serialized run here, for merging with `gaiatest report`
    #[arg(long, value_name = "PATH")]
    json_output: Option<PathBuf>,

    /// Test variables file (JSON)
    #[arg(long, value_name = "PATH")]
    testvars: Option<PathBuf>,

    /// How debug artifacts for failing cases are collected
    #[arg(long, value_enum, default_value_t = CaptureArg::Inline)]
    capture: CaptureArg,

    /// Directory holding by-reference debug artifacts
    #[arg(long, value_name = "DIR", default_value = "debug")]
    debug_root: PathBuf,

    /// Seconds to wait for the settings snapshot (overrides testvars)
    #[arg(long, value_name = "SECS")]
    settings_timeout: Option<u64>,

    /// Character encoding of the HTML report
    #[arg(long, value_enum, default_value_t = EncodingArg::Utf8)]
    report_encoding: EncodingArg,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one HTML report from serialized runs
    Report {
        /// Runs written with --json-output
        #[arg(required = true)]
        runs: Vec<PathBuf>,

        /// Destination of the merged report
        #[arg(long, value_name = "PATH")]
        html_output: PathBuf,

        /// Character encoding of the HTML report
        #[arg(long, value_enum, default_value_t = EncodingArg::Utf8)]
        report_encoding: EncodingArg,
    },

    /// Create testvars.json with every risk flag off
    Init {
        /// Directory in which to create the file (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CaptureArg {
    /// Screenshot, page source and settings from the live target
    Inline,
    /// Link files an external harness wrote under --debug-root
    Reference,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EncodingArg {
    Utf8,
    Ascii,
}

impl From<EncodingArg> for ReportEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => ReportEncoding::Utf8,
            EncodingArg::Ascii => ReportEncoding::Ascii,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    gaiatest::logging::init(args.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: Failed to start runtime: {}", "Error".red().bold(), e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(mut args: Args) -> Result<ExitCode> {
    if let Some(cmd) = args.command.take() {
        return match cmd {
            Commands::Report {
                runs,
                html_output,
                report_encoding,
            } => run_report(&runs, &html_output, report_encoding.into()),
            Commands::Init { dir } => run_init(dir.as_deref()),
        };
    }

    let manifest_path = args
        .manifest
        .clone()
        .context("A case manifest is required when not using a subcommand")?;

    // CLI flags override the testvars file
    let testvars = load_testvars(args.testvars.as_deref())?.merge_with_cli(args.settings_timeout);

    let gate = RiskGate::new(testvars.acknowledgement());
    let decision = gate
        .check(&mut std::io::stdout(), interrupted())
        .await
        .context("Failed to print risk warning")?;
    if !decision.should_run() {
        return Ok(ExitCode::from(EXIT_GATE));
    }
    tokio::spawn(abort_on_interrupt());

    let manifest = load_manifest(&manifest_path)?;
    let debug_root = std::path::absolute(&args.debug_root)
        .with_context(|| format!("Invalid debug root: {}", args.debug_root.display()))?;

    let mut client = CommandClient::new(&manifest.base_dir)
        .restart(args.restart)
        .with_debug_root(&debug_root)
        .with_testvars(testvars.to_json());

    let mode = match args.capture {
        CaptureArg::Inline => CaptureMode::Inline {
            settings_timeout: testvars.settings_timeout(),
        },
        CaptureArg::Reference => CaptureMode::Reference {
            debug_root: debug_root.clone(),
        },
    };
    let gatherer = capture::gatherer(mode);

    let mut console = ConsoleReporter::new();
    if !std::io::stdout().is_terminal() {
        console = console.without_colors();
    }
    if args.verbose {
        console = console.verbose();
    }

    let result = TestRunner::new(&mut client, gatherer.as_ref())
        .with_console(console)
        .run(&manifest.cases)
        .await;
    console.summary(&result);

    write_reports(&args, &result)?;

    if result.was_successful() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_RUN_FAILED))
    }
}

fn write_reports(args: &Args, result: &RunResult) -> Result<()> {
    if let Some(ref path) = args.json_output {
        JsonReporter::new().pretty().write(result, path)?;
        eprintln!("{}: Run written to {}", "Info".blue(), path.display());
    }
    if let Some(ref path) = args.html_output {
        let doc = ReportDocument::build(std::slice::from_ref(result));
        HtmlReporter::new()
            .with_encoding(args.report_encoding.into())
            .write(&doc, path)?;
        eprintln!("{}: Report written to {}", "Info".blue(), path.display());
    }
    Ok(())
}

fn run_report(runs: &[PathBuf], html_output: &Path, encoding: ReportEncoding) -> Result<ExitCode> {
    let loaded = load_runs(runs)?;
    let doc = ReportDocument::build(&loaded);
    HtmlReporter::new()
        .with_encoding(encoding)
        .write(&doc, html_output)?;
    eprintln!(
        "{}: Report for {} run(s), {} tests written to {}",
        "Done".green().bold(),
        loaded.len(),
        doc.summary.tests,
        html_output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_init(dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let path = dir.join(TESTVARS_FILENAME);

    if path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    std::fs::write(&path, starter_testvars())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!(
        "{}: Created {} (set acknowledged_risks to true once you have read the risks)",
        "Done".green().bold(),
        path.display()
    );
    Ok(ExitCode::SUCCESS)
}

/// Resolves on the first Ctrl+C
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// After the gate, an interrupt stops the whole run
async fn abort_on_interrupt() {
    interrupted().await;
    println!("\nTest run aborted by user.");
    std::process::exit(i32::from(EXIT_GATE));
}
