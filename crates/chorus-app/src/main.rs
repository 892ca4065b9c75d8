//! # Chorus
//!
//! Console front end: one playback queue driven from the terminal, with
//! audio fetched by yt-dlp and played through an external player.

mod commands;
mod config;
mod status;
mod transport;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chorus_core::{Downloaders, PlayableItem, Sound};
use chorus_extractor::YtDlp;
use chorus_player::{SessionHandle, SessionRegistry, Transport};
use commands::{Command, HELP};
use config::AppConfig;
use status::ConsoleStatusSink;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::ProcessTransport;

struct Console {
    session: SessionHandle,
    transport: Arc<ProcessTransport>,
    extractor: Arc<YtDlp>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with status lines
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus=info,chorus_player=debug".into()),
        )
        .init();

    info!("Starting Chorus v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    let extractor = Arc::new(YtDlp::new(config.extractor.clone()));
    let registry = SessionRegistry::new(
        Downloaders::new().with(extractor.clone()),
        config.session.clone(),
    );

    let transport = Arc::new(ProcessTransport::new(config.owner.clone(), config.player.clone()));
    let session = registry.get_or_create(transport.clone(), Arc::new(ConsoleStatusSink::stdout()));
    if let Err(e) = session.connect().await {
        warn!("Could not connect the player: {e}");
    }

    let console = Console {
        session,
        transport,
        extractor,
    };
    console.run().await;

    registry.evict_where(|_| true);
    info!("Goodbye");
    Ok(())
}

impl Console {
    async fn run(&self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = tokio::signal::ctrl_c() => break,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            };

            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command).await {
                        println!("error: {e}");
                    }
                }
                Err(e) => println!("{e}"),
            }
        }

        if let Err(e) = self.transport.stop().await {
            warn!("Failed to stop the player: {e}");
        }
    }

    async fn execute(&self, command: Command) -> chorus_core::Result<()> {
        match command {
            Command::Add { url, position } => {
                let item = self.extractor.resolve(&url).await?;
                self.session.add_item(item, position).await?;
            }
            Command::Sound { path, name } => {
                let name = name.unwrap_or_else(|| file_stem(&path));
                self.session
                    .add_item(PlayableItem::Sound(Sound::new(name, path)), None)
                    .await?;
            }
            Command::Play(index) => self.session.play(index).await?,
            Command::Next => self.session.next().await?,
            Command::Previous => self.session.previous().await?,
            Command::Stop => self.session.stop().await?,
            Command::Clear => self.session.clear().await?,
            Command::Remove(index) => {
                self.session.remove_item(index).await?;
            }
            Command::Swap(a, b) => self.session.swap(a, b).await?,
            Command::Shuffle { exclude_playlists } => self.session.shuffle(exclude_playlists).await?,
            Command::Queue => self.print_queue().await?,
            Command::Connect => self.session.connect().await?,
            Command::Disconnect => self.transport.disconnect(),
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
        Ok(())
    }

    async fn print_queue(&self) -> chorus_core::Result<()> {
        let snapshot = self.session.snapshot().await?;
        if snapshot.entries.is_empty() {
            println!("The queue is empty");
            return Ok(());
        }

        for (i, entry) in snapshot.entries.iter().enumerate() {
            let marker = if i == snapshot.cursor.top { ">" } else { " " };
            println!("{marker} {:>2}. {} ({}, {})", i + 1, entry.title, entry.kind, entry.duration);
        }
        if let Some(sub) = snapshot.cursor.sub {
            println!("  in playlist at track {}", sub + 1);
        }
        println!("{:?}, total {}", snapshot.state, snapshot.total_duration);
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned())
}
