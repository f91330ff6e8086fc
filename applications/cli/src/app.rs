//! Player wiring and the interactive session loop

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::navigator::ChannelNavigator;
use crate::prompt::{self, Flow};
use encore_client::{Lyrics, MetadataClient};
use encore_core::{MetadataProvider, TrackId};
use encore_playback::{
    format_time, HeadlessFactory, MiniBar, ResourceFactory, SessionController, SessionHandle,
    SessionParts, StreamResolver, ViewAdapter,
};
use encore_storage::{RedbStore, SessionStore};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// How a playing session starts
#[derive(Debug, Clone, PartialEq)]
pub enum Start {
    /// Bind a specific track
    Track {
        id: TrackId,
        next: Option<TrackId>,
        paused: bool,
    },
    /// Rebind the last played track
    Resume,
}

pub struct Player {
    client: Arc<MetadataClient>,
    store: SessionStore,
    config: PlayerConfig,
}

impl Player {
    /// Open the metadata client and the session store
    pub fn open(config: PlayerConfig) -> Result<Self> {
        let client = MetadataClient::new(config.api_config())?;
        let store = SessionStore::new(Arc::new(RedbStore::open(&config.storage.path)?));
        info!(
            api = %client.url(),
            store = %config.storage.path.display(),
            "Player opened"
        );
        Ok(Self::with_parts(client, store, config))
    }

    pub fn with_parts(client: MetadataClient, store: SessionStore, config: PlayerConfig) -> Self {
        Self {
            client: Arc::new(client),
            store,
            config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Describe the persisted session
    pub fn status(&self) -> Result<String> {
        let Some(session) = self.store.load()? else {
            return Ok("No saved session".to_string());
        };
        let liked = self.store.is_liked(&session.last_played)?;
        Ok(format!(
            "last played: {}\nposition:    {}\nintent:      {}\nloop:        {}\nvolume:      {:.0}%\nliked:       {}",
            session.last_played,
            format_time(session.position_seconds),
            if session.play_intent { "playing" } else { "paused" },
            if session.looping { "on" } else { "off" },
            session.volume * 100.0,
            if liked { "yes" } else { "no" },
        ))
    }

    /// Flip the liked flag of a track, returning the new value
    pub fn toggle_like(&self, track_id: &TrackId) -> Result<bool> {
        Ok(self.store.toggle_liked(track_id)?)
    }

    /// Forget the persisted session
    pub fn clear(&self) -> Result<()> {
        Ok(self.store.clear()?)
    }

    pub async fn lyrics(&self, track_id: &TrackId) -> Result<Option<Lyrics>> {
        Ok(self.client.songs().get_lyrics(track_id).await?)
    }

    /// Save the best available stream of a track as `<title>.mp4` in `out_dir`
    pub async fn download(&self, track_id: &TrackId, out_dir: &Path) -> Result<PathBuf> {
        let provider: Arc<dyn MetadataProvider> = self.client.clone();
        let resolution = StreamResolver::new(provider).resolve(track_id).await?;

        let dest = out_dir.join(download_file_name(
            &resolution.metadata.title,
            track_id,
        ));
        let mut last_percent = None;
        self.client
            .downloads()
            .download_to(&resolution.stream.url, &dest, |progress| {
                let percent = (progress.progress * 100.0) as u32;
                if progress.bytes_total.is_some() && last_percent != Some(percent) {
                    last_percent = Some(percent);
                    eprint!("\r{:>3}%", percent);
                }
            })
            .await?;
        if last_percent.is_some() {
            eprintln!();
        }

        info!(track_id = %track_id, dest = %dest.display(), "Download finished");
        Ok(dest)
    }

    /// Run an interactive session until the listener quits
    pub async fn run(&self, start: Start) -> Result<()> {
        let first = match start {
            Start::Track { id, next, paused } => (id, next, paused),
            Start::Resume => match self.store.load()? {
                Some(session) => (session.last_played, None, !session.play_intent),
                None => {
                    println!("Nothing to resume");
                    return Ok(());
                }
            },
        };

        let (navigator, mut navigations) = ChannelNavigator::new();
        let factory: Arc<dyn ResourceFactory> =
            Arc::new(HeadlessFactory::new(self.config.headless.clone()));
        let provider: Arc<dyn MetadataProvider> = self.client.clone();
        let (session, task) = SessionController::spawn(SessionParts {
            factory,
            provider,
            store: self.store.clone(),
            navigator: Arc::new(navigator),
            config: self.config.session.clone(),
        });

        let (track_id, next, paused) = first;
        self.bind(&session, track_id, next)?;
        if paused {
            session.pause()?;
        }

        println!("{}", prompt::HELP);
        let bar = MiniBar::new(session.clone());
        let mut views = session.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut last_line = String::new();

        loop {
            tokio::select! {
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    let line = bar.render_view(&view);
                    if line != last_line {
                        print!("\r{}\x1b[K", line);
                        std::io::stdout().flush()?;
                        last_line = line;
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match prompt::parse(&line) {
                        Ok(Some(command)) => match prompt::apply(&session, &command)? {
                            Flow::Continue => {}
                            Flow::Advance(track_id) => {
                                info!(track_id = %track_id, "Skipping to next track");
                                self.bind(&session, track_id, None)?;
                            }
                            Flow::Quit => break,
                        },
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    }
                }
                Some(track_id) = navigations.recv() => {
                    info!(track_id = %track_id, "Advancing to next track");
                    self.bind(&session, track_id, None)?;
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        println!();
        session.shutdown()?;
        if let Err(e) = task.await {
            warn!(error = %e, "Session task ended abnormally");
        }
        Ok(())
    }

    /// Bind a track and fill in its next pointer
    ///
    /// Without an explicit next track the first suggestion is used once it
    /// arrives, provided the same track is still bound.
    fn bind(&self, session: &SessionHandle, track_id: TrackId, next: Option<TrackId>) -> Result<()> {
        session.set_current_track(track_id.clone())?;
        if let Some(next) = next {
            session.set_next_track(Some(next))?;
            return Ok(());
        }

        let client = Arc::clone(&self.client);
        let session = session.clone();
        tokio::spawn(async move {
            let suggestions = match client.songs().get_suggestions(&track_id, 1).await {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    warn!(track_id = %track_id, error = %e, "Suggestions unavailable");
                    return;
                }
            };
            let Some(next) = suggestions.into_iter().next() else {
                debug!(track_id = %track_id, "No suggestions");
                return;
            };
            if session.current().track_id.as_ref() == Some(&track_id) {
                let _ = session.set_next_track(Some(next.id));
            }
        });
        Ok(())
    }
}

/// File name for a downloaded track
///
/// Path separators and control characters are replaced; an empty title falls
/// back to the track id.
pub fn download_file_name(title: &str, track_id: &TrackId) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.');
    if cleaned.is_empty() {
        format!("{}.mp4", track_id)
    } else {
        format!("{}.mp4", cleaned)
    }
}
