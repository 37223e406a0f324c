use std::io::{BufRead, Write};
use std::sync::Mutex;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use socialgrab_core::core::events::DownloadEvents;
use socialgrab_core::core::format::{QualityPrompt, QualitySelection};
use socialgrab_core::core::progress::ProgressReceiver;
use socialgrab_core::models::media::{BatchTally, DownloadOutcome, QualityOption};

const BAR_TEMPLATE: &str = concat!(
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
    "{bytes}/{total_bytes} ({bytes_per_sec}) {msg}"
);

/// Terminal rendering of download events: one progress bar per in-flight
/// download, a line per outcome.
#[derive(Default)]
pub struct ConsoleEvents {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut slot| slot.take())
    }
}

fn failure_text(outcome: &DownloadOutcome) -> &str {
    outcome.error_message.as_deref().unwrap_or("Download failed")
}

impl DownloadEvents for ConsoleEvents {
    fn engaged(&self, _url: &str, mut progress: ProgressReceiver) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("starting");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        let bar = pb.clone();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let Some(sample) = *progress.borrow_and_update() else {
                    continue;
                };
                if let Some(total) = sample.total_bytes {
                    bar.set_length(total);
                }
                bar.set_position(sample.downloaded_bytes);
                bar.set_message("");
            }
        });

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn finished(&self, url: &str, outcome: &DownloadOutcome) {
        if let Some(pb) = self.take_bar() {
            pb.finish_and_clear();
        }
        match (&outcome.final_path, &outcome.error_message) {
            (Some(path), _) => {
                tracing::info!("Download complete: {}", path.display());
                println!("{} Saved {}", style("✓").green(), path.display());
            }
            (None, _) => {
                tracing::info!("Download failed for {}: {}", url, failure_text(outcome));
                println!("{} {}", style("✗").red(), failure_text(outcome));
            }
        }
    }

    fn item_started(&self, index: usize, total: usize, url: &str) {
        println!("\n{} [{}/{}] {}", style("→").cyan(), index, total, url);
    }

    fn batch_finished(&self, tally: &BatchTally) {
        let summary = format!(
            "Batch complete: {} of {} succeeded, {} failed",
            tally.succeeded,
            tally.total,
            tally.failed()
        );
        if tally.failed() == 0 {
            println!("\n{} {}", style("✓").green(), style(summary).bold());
        } else {
            println!("\n{} {}", style("!").yellow(), style(summary).bold());
        }
    }
}

/// Line-oriented terminal I/O shared by the menu and the quality picker, so
/// a single buffer sits over stdin.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl Terminal<std::io::BufReader<std::io::Stdin>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Trimmed next line; `None` at end of input.
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    pub fn ask(&mut self, prompt: &str) -> Option<String> {
        let _ = write!(self.output, "{}", prompt);
        let _ = self.output.flush();
        self.read_line()
    }

    fn render(&mut self, options: &[QualityOption]) -> std::io::Result<()> {
        writeln!(self.output, "\nAvailable qualities:")?;
        writeln!(self.output, "  0. Best available")?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, option.label())?;
        }
        writeln!(self.output, "  m. Enter a format id manually")?;
        write!(self.output, "Choice [0]: ")?;
        self.output.flush()
    }
}

impl<R: BufRead + Send, W: Write + Send> QualityPrompt for Terminal<R, W> {
    fn choose(&mut self, options: &[QualityOption]) -> QualitySelection {
        if let Err(e) = self.render(options) {
            tracing::debug!("Could not render quality menu: {}", e);
        }
        let Some(answer) = self.read_line() else {
            return QualitySelection::Best;
        };

        if answer.eq_ignore_ascii_case("m") {
            return QualitySelection::Manual(self.ask("Format id: ").unwrap_or_default());
        }
        match answer.parse::<usize>() {
            Ok(0) => QualitySelection::Best,
            Ok(n) => QualitySelection::Option(n - 1),
            Err(_) if answer.is_empty() => QualitySelection::Best,
            Err(_) => {
                let _ = writeln!(self.output, "Invalid choice, using best quality");
                QualitySelection::Best
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use socialgrab_core::DownloadError;

    use super::*;

    fn options() -> Vec<QualityOption> {
        vec![
            QualityOption {
                height_px: 1080,
                container: "mp4".into(),
                format_id: "137".into(),
                note: "1080p".into(),
            },
            QualityOption {
                height_px: 720,
                container: "mp4".into(),
                format_id: "136".into(),
                note: "720p".into(),
            },
        ]
    }

    fn answer(input: &str) -> (QualitySelection, String) {
        let mut out = Vec::new();
        let selection =
            Terminal::new(Cursor::new(input.as_bytes().to_vec()), &mut out).choose(&options());
        (selection, String::from_utf8(out).unwrap())
    }

    #[test]
    fn numbered_choice_is_zero_based() {
        let (selection, out) = answer("2\n");
        assert_eq!(selection, QualitySelection::Option(1));
        assert!(out.contains("  1. "));
        assert!(out.contains("  2. "));
    }

    #[test]
    fn empty_or_zero_is_best() {
        assert_eq!(answer("\n").0, QualitySelection::Best);
        assert_eq!(answer("0\n").0, QualitySelection::Best);
        assert_eq!(answer("").0, QualitySelection::Best);
    }

    #[test]
    fn manual_entry_reads_second_line() {
        assert_eq!(
            answer("m\n137+140\n").0,
            QualitySelection::Manual("137+140".into())
        );
    }

    #[test]
    fn garbage_is_best() {
        let (selection, out) = answer("lots\n");
        assert_eq!(selection, QualitySelection::Best);
        assert!(out.contains("Invalid choice"));
    }

    #[test]
    fn ask_returns_none_at_eof() {
        let mut out = Vec::new();
        let mut term = Terminal::new(Cursor::new(b"  hello \n".to_vec()), &mut out);
        assert_eq!(term.ask("> ").as_deref(), Some("hello"));
        assert_eq!(term.ask("> "), None);
        drop(term);
        assert_eq!(String::from_utf8(out).unwrap(), "> > ");
    }

    #[test]
    fn failure_text_is_the_bare_message() {
        let outcome = DownloadOutcome::failed(&DownloadError::EngineFailure(
            "ERROR: HTTP Error 403: Forbidden".into(),
        ));
        assert_eq!(failure_text(&outcome), "ERROR: HTTP Error 403: Forbidden");

        let mut silent = outcome.clone();
        silent.error_message = None;
        assert_eq!(failure_text(&silent), "Download failed");
    }

    #[test]
    fn batch_summary_does_not_panic_without_runtime() {
        let events = ConsoleEvents::new();
        events.batch_finished(&BatchTally { total: 2, succeeded: 1 });
        events.finished("u", &DownloadOutcome::completed("/tmp/x.mp4".into()));
    }
}
