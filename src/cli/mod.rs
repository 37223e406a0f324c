//! Command-line front end: argument parsing, the interactive menu and the
//! terminal rendering of download events.

pub mod args;
pub mod console;
pub mod menu;
pub mod session;

use std::io::BufRead;
use std::path::Path;
use std::process::ExitCode;

use ::console::style;
use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use socialgrab_core::core::batch::BatchRunner;
use socialgrab_core::core::engine::ExtractionEngine;
use socialgrab_core::core::orchestrator::DownloadOrchestrator;
use socialgrab_core::models::media::{DownloadOutcome, DownloadRequest, MediaKind, QualityHint};
use socialgrab_core::DownloadError;

use crate::core::tools;
use crate::core::ytdlp::YtDlpEngine;

pub use args::{is_verbose, Cli, Command};
use self::console::{ConsoleEvents, Terminal};
use session::Session;

/// Parses `std::env::args`. Help and version exit 0, every other argument
/// error exits 1.
pub fn parse_args() -> Result<Cli, ExitCode> {
    Cli::try_parse().map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        }
    })
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.about {
        let session = Session::load(None)?;
        print_about(&session).await;
        return Ok(());
    }

    match cli.command {
        None => menu::run(Session::load(None)?).await,
        Some(Command::Download {
            url,
            audio,
            subtitles,
            quality,
            output_dir,
        }) => {
            let session = Session::load(output_dir.as_deref())?;
            let engine = locate_engine(&session).await?;
            let request = DownloadRequest::new(url, args::media_kind(audio, subtitles), quality);
            let mut terminal = Terminal::stdio();
            download_one(&session, &engine, &request, &mut terminal).await;
            Ok(())
        }
        Some(Command::Batch {
            file,
            audio,
            quality,
            output_dir,
        }) => {
            let session = Session::load(output_dir.as_deref())?;
            let engine = locate_engine(&session).await?;
            let urls = match &file {
                Some(path) => read_url_file(path)?,
                None => read_urls(std::io::stdin().lock())?,
            };
            let kind = if audio { MediaKind::Audio } else { MediaKind::Video };
            let requests: Vec<DownloadRequest> = urls
                .into_iter()
                .map(|url| DownloadRequest::new(url, kind, quality.clone()))
                .collect();
            // With URLs on stdin there is no terminal left to ask on.
            if file.is_some() && ::console::user_attended() {
                let mut terminal = Terminal::stdio();
                run_batch(&session, &engine, &requests, Some(&mut terminal)).await;
            } else {
                run_batch(&session, &engine, &requests, None).await;
            }
            Ok(())
        }
        Some(Command::Probe { url }) => {
            let session = Session::load(None)?;
            let engine = locate_engine(&session).await?;
            probe(&session, &engine, &url).await
        }
    }
}

pub(crate) async fn locate_engine(session: &Session) -> anyhow::Result<YtDlpEngine> {
    YtDlpEngine::locate(session.settings.download.ytdlp_path.as_deref()).await
}

/// Runs one request. A failed download is reported, not returned as an error.
pub(crate) async fn download_one(
    session: &Session,
    engine: &dyn ExtractionEngine,
    request: &DownloadRequest,
    terminal: &mut Terminal<std::io::BufReader<std::io::Stdin>, std::io::Stdout>,
) -> DownloadOutcome {
    let events = ConsoleEvents::new();
    let orchestrator = DownloadOrchestrator::new(session.context(engine, &events));
    if request.quality == QualityHint::Interactive && ::console::user_attended() {
        orchestrator.run(request, Some(terminal)).await
    } else {
        orchestrator.run(request, None).await
    }
}

pub(crate) async fn run_batch(
    session: &Session,
    engine: &dyn ExtractionEngine,
    requests: &[DownloadRequest],
    terminal: Option<&mut Terminal<std::io::BufReader<std::io::Stdin>, std::io::Stdout>>,
) {
    let events = ConsoleEvents::new();
    let runner = BatchRunner::new(session.context(engine, &events));
    match terminal {
        Some(terminal) => runner.run(requests, Some(terminal)).await,
        None => runner.run(requests, None).await,
    };
}

async fn probe(session: &Session, engine: &dyn ExtractionEngine, url: &str) -> anyhow::Result<()> {
    let platform = session
        .registry
        .detect(url)
        .ok_or_else(|| DownloadError::UnsupportedPlatform(url.trim().to_string()))?;
    let options = session.negotiator.probe(engine, url.trim()).await?;

    println!("{} ({})", style(url.trim()).bold(), platform);
    if options.is_empty() {
        println!("  {} No video qualities reported", style("!").yellow());
    }
    for option in &options {
        println!("  {:>8}  {}", option.format_id, option.label());
    }
    Ok(())
}

fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Could not open URL list {}", path.display()))?;
    read_urls(std::io::BufReader::new(file))
}

/// One URL per line. Blank lines are kept; the batch runner skips them.
pub fn read_urls(reader: impl BufRead) -> anyhow::Result<Vec<String>> {
    reader
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()).map_err(anyhow::Error::from))
        .collect()
}

pub async fn print_about(session: &Session) {
    println!(
        "{} {}",
        style(env!("CARGO_PKG_NAME")).bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));

    println!("{}", style("Supported platforms").bold());
    for entry in session.registry.entries() {
        let marker = if session.registry.is_primary(&entry.id) {
            style(" (titles kept, subtitles available)").dim().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} ({}){}",
            style("•").cyan(),
            entry.id,
            entry.domain_markers.join(", "),
            marker
        );
    }

    println!("\n{}", style("Engine").bold());
    let configured = session.settings.download.ytdlp_path.as_deref();
    for (tool, path) in [
        (tools::YTDLP, tools::resolve_tool(tools::YTDLP, configured).await),
        (tools::FFMPEG, tools::find_tool(tools::FFMPEG).await),
    ] {
        let version = match &path {
            Some(path) => tools::check_version(tool, path).await,
            None => None,
        };
        match (path, version) {
            (Some(_), Some(v)) => println!("  {} {} {}", style("✓").green(), tool, v),
            (Some(path), None) => {
                println!("  {} {} at {}", style("!").yellow(), tool, path.display())
            }
            (None, _) => println!("  {} {} not found", style("✗").red(), tool),
        }
    }

    println!("\n{} {}", style("Saving to").bold(), session.output_dir());
}
