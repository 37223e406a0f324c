use std::path::PathBuf;

use console::style;

use socialgrab_core::models::media::{DownloadRequest, MediaKind, QualityHint};

use super::console::Terminal;
use super::session::Session;
use crate::core::ytdlp::YtDlpEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Video,
    Audio,
    Batch,
    Subtitles,
    ChangeDirectory,
    About,
    Exit,
}

impl MenuAction {
    const ALL: [(MenuAction, &'static str); 7] = [
        (MenuAction::Video, "Download video"),
        (MenuAction::Audio, "Download audio (MP3)"),
        (MenuAction::Batch, "Batch download"),
        (MenuAction::Subtitles, "Download subtitles"),
        (MenuAction::ChangeDirectory, "Change download directory"),
        (MenuAction::About, "About"),
        (MenuAction::Exit, "Exit"),
    ];

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(Self::Exit),
            other => {
                let n: usize = other.parse().ok()?;
                Self::ALL.get(n.checked_sub(1)?).map(|(action, _)| *action)
            }
        }
    }
}

/// Answer to "(1) Video or (2) Audio". Anything but `2` means video.
fn batch_kind(answer: &str) -> MediaKind {
    match answer.trim() {
        "2" => MediaKind::Audio,
        _ => MediaKind::Video,
    }
}

fn batch_quality(kind: MediaKind) -> QualityHint {
    match kind {
        MediaKind::Video => QualityHint::Interactive,
        MediaKind::Audio | MediaKind::Subtitles => QualityHint::Best,
    }
}

/// The engine is only located when a download is first requested, so the
/// about screen and directory change work without it.
struct Menu {
    session: Session,
    engine: Option<YtDlpEngine>,
    terminal: Terminal<std::io::BufReader<std::io::Stdin>, std::io::Stdout>,
}

pub async fn run(session: Session) -> anyhow::Result<()> {
    let mut menu = Menu {
        session,
        engine: None,
        terminal: Terminal::stdio(),
    };

    loop {
        menu.render();
        let question = format!("Choose an option [1-{}]: ", MenuAction::ALL.len());
        let Some(input) = menu.terminal.ask(&question) else {
            break;
        };
        let Some(action) = MenuAction::parse(&input) else {
            println!("{} Invalid option: {}", style("!").yellow(), input);
            continue;
        };

        match action {
            MenuAction::Video => menu.single(MediaKind::Video, QualityHint::Interactive).await,
            MenuAction::Audio => menu.single(MediaKind::Audio, QualityHint::Best).await,
            MenuAction::Subtitles => menu.single(MediaKind::Subtitles, QualityHint::Best).await,
            MenuAction::Batch => menu.batch().await,
            MenuAction::ChangeDirectory => menu.change_directory(),
            MenuAction::About => super::print_about(&menu.session).await,
            MenuAction::Exit => break,
        }
    }

    println!("Bye!");
    Ok(())
}

impl Menu {
    fn render(&self) {
        println!("\n{}", style("SocialGrab").bold().cyan());
        println!("{} {}", style("Saving to").dim(), self.session.output_dir());
        for (i, (_, label)) in MenuAction::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, label);
        }
    }

    async fn ensure_engine(&mut self) -> bool {
        if self.engine.is_none() {
            match super::locate_engine(&self.session).await {
                Ok(engine) => self.engine = Some(engine),
                Err(e) => println!("{} {:#}", style("✗").red(), e),
            }
        }
        self.engine.is_some()
    }

    async fn single(&mut self, kind: MediaKind, quality: QualityHint) {
        let Some(url) = self.terminal.ask("URL: ").filter(|u| !u.is_empty()) else {
            return;
        };
        if !self.ensure_engine().await {
            return;
        }
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let request = DownloadRequest::new(url, kind, quality);
        super::download_one(&self.session, engine, &request, &mut self.terminal).await;
    }

    async fn batch(&mut self) {
        let Some(answer) = self.terminal.ask("Download as (1) Video or (2) Audio? [1]: ") else {
            return;
        };
        let kind = batch_kind(&answer);

        println!("Enter one URL per line, empty line to start:");
        let mut requests = Vec::new();
        while let Some(line) = self.terminal.read_line() {
            if line.is_empty() {
                break;
            }
            requests.push(DownloadRequest::new(line, kind, batch_quality(kind)));
        }
        if requests.is_empty() {
            return;
        }
        if !self.ensure_engine().await {
            return;
        }
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        super::run_batch(&self.session, engine, &requests, Some(&mut self.terminal)).await;
    }

    fn change_directory(&mut self) {
        let Some(input) = self
            .terminal
            .ask("New download directory: ")
            .filter(|p| !p.is_empty())
        else {
            return;
        };
        match self.session.change_output_dir(&PathBuf::from(input)) {
            Ok(dir) => println!("{} Downloads will be saved to {}", style("✓").green(), dir),
            Err(e) => println!("{} {}", style("✗").red(), e),
        }
    }
}
