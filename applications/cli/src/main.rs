/// Encore - terminal playback session
use clap::{Parser, Subcommand};
use encore_cli::app::{Player, Start};
use encore_cli::config::PlayerConfig;
use encore_core::TrackId;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore playback session", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a track
    Play {
        /// Track id
        id: String,
        /// Track to advance to when this one ends
        #[arg(long)]
        next: Option<String>,
        /// Bind the track without starting playback
        #[arg(long)]
        paused: bool,
    },
    /// Continue the last session
    Resume,
    /// Show the saved session
    Status,
    /// Forget the saved session
    Clear,
    /// Like or unlike a track
    Like {
        /// Track id
        id: String,
    },
    /// Print the lyrics of a track
    Lyrics {
        /// Track id
        id: String,
    },
    /// Save a track's best stream as <title>.mp4
    Download {
        /// Track id
        id: String,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore=info,encore_cli=info,encore_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    config.validate()?;
    let player = Player::open(config)?;

    match cli.command {
        Commands::Play { id, next, paused } => {
            let start = Start::Track {
                id: TrackId::parse(id)?,
                next: next.map(TrackId::parse).transpose()?,
                paused,
            };
            player.run(start).await?;
        }
        Commands::Resume => {
            player.run(Start::Resume).await?;
        }
        Commands::Status => {
            println!("{}", player.status()?);
        }
        Commands::Clear => {
            player.clear()?;
            println!("Session cleared");
        }
        Commands::Like { id } => {
            let id = TrackId::parse(id)?;
            let liked = player.toggle_like(&id)?;
            println!("{} {}", id, if liked { "liked" } else { "unliked" });
        }
        Commands::Lyrics { id } => {
            let id = TrackId::parse(id)?;
            match player.lyrics(&id).await? {
                Some(lyrics) => {
                    println!("{}", lyrics.text);
                    if let Some(copyright) = lyrics.copyright {
                        println!("\n{}", copyright);
                    }
                }
                None => println!("No lyrics for {}", id),
            }
        }
        Commands::Download { id, out } => {
            let id = TrackId::parse(id)?;
            let dest = player.download(&id, &out).await?;
            println!("Saved {}", dest.display());
        }
    }

    Ok(())
}
