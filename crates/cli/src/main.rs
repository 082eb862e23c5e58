//! ldd2bh command-line converter.
//!
//! Reads the JSON files written by ldapdomaindump from an input directory
//! and writes BloodHound `users.json`, `computers.json`, `groups.json` and
//! `domains.json` to an output directory.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use tracing::{debug, Subscriber};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ldd2bh_core::config::ConvertConfig;
use ldd2bh_core::converter::{ConversionReport, Converter, Selection};

use style::Tone;

/// Default for the directory arguments. Leaving either one at this value
/// refuses the run.
const UNSET_DIR: &str = ".";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Convert ldapdomaindump output to BloodHound JSON.
#[derive(Parser, Debug)]
#[command(
    name = "ldd2bh",
    version,
    about = "Convert ldapdomaindump output to BloodHound JSON",
    after_help = "Examples:\n  ldd2bh -i ldd -o bh\n  ldd2bh -i ldd -o bh -g"
)]
struct Cli {
    /// Input directory holding the ldapdomaindump JSON files.
    #[arg(short, long, default_value = UNSET_DIR)]
    input: PathBuf,

    /// Output directory for the BloodHound JSON files.
    #[arg(short, long, default_value = UNSET_DIR)]
    output: PathBuf,

    /// Convert every collection (the default when nothing is selected).
    #[arg(short, long)]
    all: bool,

    /// Convert users.
    #[arg(short, long)]
    users: bool,

    /// Convert computers.
    #[arg(short, long)]
    computers: bool,

    /// Convert groups.
    #[arg(short, long)]
    groups: bool,

    /// Convert domains (from the trusts dump).
    #[arg(short, long)]
    domains: bool,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the output documents.
    #[arg(long)]
    pretty: bool,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn directories_given(&self) -> bool {
        self.input != Path::new(UNSET_DIR) && self.output != Path::new(UNSET_DIR)
    }

    fn selection(&self) -> Selection {
        if self.all {
            return Selection::all();
        }
        Selection {
            users: self.users,
            computers: self.computers,
            groups: self.groups,
            domains: self.domains,
        }
        .or_all()
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.directories_given() {
        let _ = Cli::command().print_help();
        return ExitCode::from(2);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::line(Tone::Fail, &format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let bootstrap = fmt_subscriber(log_filter(cli.log_level.as_deref(), None));
            tracing::subscriber::with_default(bootstrap, || ConvertConfig::load_from_file(path))
                .context("failed to load configuration file")?
        }
        None => ConvertConfig::default(),
    };
    if cli.pretty {
        config.output.pretty = true;
    }
    config
        .validate()
        .context("configuration validation failed")?;

    fmt_subscriber(log_filter(
        cli.log_level.as_deref(),
        Some(&config.logging.level),
    ))
    .init();

    let selection = cli.selection();
    debug!(?selection, config = ?cli.config, "resolved command line");
    let converter = Converter::new(config, &cli.input, &cli.output);

    println!(
        "{}",
        style::header(&format!(
            "Converting {} -> {}",
            converter.input_dir().display(),
            converter.output_dir().display()
        ))
    );

    let report = converter.run(selection).context("conversion failed")?;
    print_summary(&report);
    Ok(())
}

/// Log level precedence: `--log-level`, then `RUST_LOG`, then the config
/// file, then `info`. The configuration file is loaded before its own level
/// is known, so that load logs under `configured = None`.
fn log_filter(flag: Option<&str>, configured: Option<&str>) -> EnvFilter {
    match flag {
        Some(level) => EnvFilter::try_new(level),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or("info"))),
    }
    .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish()
}

fn print_summary(report: &ConversionReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Collection",
        "Written",
        "Skipped",
        "Unresolved members",
        "Output",
    ]);

    for c in &report.collections {
        table.add_row(vec![
            c.kind.label().to_string(),
            c.count.to_string(),
            c.skipped.to_string(),
            c.unresolved_members.to_string(),
            c.path.display().to_string(),
        ]);
    }

    println!("{table}");

    let unresolved = report.total_unresolved_members();
    if unresolved > 0 {
        println!(
            "{}",
            style::line(
                Tone::Warn,
                &format!("{} group member reference(s) could not be resolved", unresolved)
            )
        );
        println!("{}", style::dim("  re-run with --log-level debug to list them"));
    }
    println!("{}", style::line(Tone::Ok, "Done!"));
}
