//! View model and view adapters
//!
//! [`SessionViewModel`] is the read-only projection every surface renders.
//! The controller publishes one `Arc` per processed message, so all adapters
//! mounted at the same time look at the very same instance.
//!
//! The adapters hold no state of their own beyond what the view model
//! carries; they render it and forward commands to the session.

use crate::controller::SessionHandle;
use crate::error::Result;
use crate::types::{Notice, PlaybackStatus};
use encore_core::{TrackId, TrackMetadata};
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of the session as observers see it
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionViewModel {
    pub track_id: Option<TrackId>,
    pub metadata: Option<TrackMetadata>,
    pub status: PlaybackStatus,
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
    pub looping: bool,
    /// Volume level (0.0-1.0), kept while muted
    pub volume: f32,
    pub muted: bool,
    pub liked: bool,
    /// Whether the full-screen view is open
    pub expanded: bool,
    pub next_track: Option<TrackId>,
    pub notice: Option<Notice>,
}

impl SessionViewModel {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Whether a track is bound
    pub fn is_active(&self) -> bool {
        self.track_id.is_some()
    }

    /// Title, falling back to the track id while loading
    pub fn title(&self) -> &str {
        match (&self.metadata, &self.track_id) {
            (Some(metadata), _) => metadata.title.as_str(),
            (None, Some(id)) => id.as_str(),
            (None, None) => "",
        }
    }

    pub fn artist(&self) -> &str {
        self.metadata
            .as_ref()
            .map_or("", TrackMetadata::primary_artist)
    }

    /// Position as a fraction of the duration (0.0 when unknown)
    pub fn progress(&self) -> f64 {
        match self.duration_seconds {
            Some(duration) if duration > 0.0 => (self.position_seconds / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Format seconds as `m:ss`
///
/// Negative and non-finite values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

fn status_glyph(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => ">",
        PlaybackStatus::Paused | PlaybackStatus::Ready => "||",
        PlaybackStatus::Loading => "..",
        PlaybackStatus::Ended => "[]",
        PlaybackStatus::Errored => "!",
        PlaybackStatus::Idle => "-",
    }
}

fn render_notice(notice: &Notice) -> String {
    if notice.is_tap_to_play() {
        "tap to play".to_string()
    } else {
        format!("error: {}", notice.message)
    }
}

/// A surface observing the session
///
/// Every adapter renders the shared view model and sends commands through
/// the same handle; none of them touch the store directly.
pub trait ViewAdapter {
    fn session(&self) -> &SessionHandle;

    /// Render the given view model
    fn render_view(&self, view: &SessionViewModel) -> String;

    /// View model currently shown
    fn current(&self) -> Arc<SessionViewModel> {
        self.session().current()
    }

    fn render(&self) -> String {
        self.render_view(&self.current())
    }

    fn toggle_play_pause(&self) -> Result<()> {
        self.session().toggle_play_pause()
    }

    fn seek(&self, position_seconds: f64) -> Result<()> {
        self.session().seek(position_seconds)
    }

    fn dismiss_notice(&self) -> Result<()> {
        self.session().dismiss_notice()
    }
}

/// Persistent bar shown on every page while a track is bound
#[derive(Debug, Clone)]
pub struct MiniBar {
    session: SessionHandle,
}

impl MiniBar {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn expand(&self) -> Result<()> {
        self.session.expand()
    }

    /// Close the session entirely
    pub fn close(&self) -> Result<()> {
        self.session.clear()
    }
}

impl ViewAdapter for MiniBar {
    fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn render_view(&self, view: &SessionViewModel) -> String {
        if !view.is_active() {
            return String::new();
        }

        let mut line = format!(
            "{} {} - {}  {} / {}",
            status_glyph(view.status),
            view.title(),
            view.artist(),
            format_time(view.position_seconds),
            format_time(view.duration_seconds.unwrap_or(0.0)),
        );
        if let Some(ref notice) = view.notice {
            line.push_str("  [");
            line.push_str(&render_notice(notice));
            line.push(']');
        }
        line
    }
}

/// Full-screen player
#[derive(Debug, Clone)]
pub struct ExpandedView {
    session: SessionHandle,
}

impl ExpandedView {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn is_open(&self) -> bool {
        self.current().expanded
    }

    pub fn collapse(&self) -> Result<()> {
        self.session.collapse()
    }

    pub fn toggle_loop(&self) -> Result<()> {
        self.session.toggle_loop()
    }

    pub fn set_volume(&self, level: f32) -> Result<()> {
        self.session.set_volume(level)
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.session.toggle_mute()
    }

    pub fn toggle_like(&self) -> Result<()> {
        self.session.toggle_like()
    }
}

impl ViewAdapter for ExpandedView {
    fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn render_view(&self, view: &SessionViewModel) -> String {
        if !view.is_active() {
            return "Nothing playing".to_string();
        }

        let mut lines = vec![view.title().to_string()];
        if let Some(ref metadata) = view.metadata {
            lines.push(metadata.artists.join(", "));
            if let Some(ref album) = metadata.album {
                lines.push(album.clone());
            }
        }
        lines.push(format!(
            "{} {} / {} ({:.0}%)",
            status_glyph(view.status),
            format_time(view.position_seconds),
            format_time(view.duration_seconds.unwrap_or(0.0)),
            view.progress() * 100.0
        ));

        let volume = if view.muted {
            "muted".to_string()
        } else {
            format!("{:.0}%", view.volume * 100.0)
        };
        lines.push(format!(
            "loop: {}  volume: {}  liked: {}",
            if view.looping { "on" } else { "off" },
            volume,
            if view.liked { "yes" } else { "no" }
        ));

        if let Some(ref next) = view.next_track {
            lines.push(format!("next: {}", next));
        }
        if let Some(ref notice) = view.notice {
            lines.push(render_notice(notice));
        }
        lines.join("\n")
    }
}

/// Per-track page view
///
/// Shows live state only while its track is the bound one.
#[derive(Debug, Clone)]
pub struct InlineView {
    session: SessionHandle,
    track_id: TrackId,
}

impl InlineView {
    pub fn new(session: SessionHandle, track_id: TrackId) -> Self {
        Self { session, track_id }
    }

    /// Create the view and bind its track to the session
    pub fn mount(session: SessionHandle, track_id: TrackId) -> Result<Self> {
        session.set_current_track(track_id.clone())?;
        Ok(Self::new(session, track_id))
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    /// Whether this page's track is the one the session is playing
    pub fn is_current(&self) -> bool {
        self.current().track_id.as_ref() == Some(&self.track_id)
    }

    /// Play this page's track, binding it first if needed
    pub fn play(&self) -> Result<()> {
        if !self.is_current() {
            self.session.set_current_track(self.track_id.clone())?;
        }
        self.session.play()
    }
}

impl ViewAdapter for InlineView {
    fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn render_view(&self, view: &SessionViewModel) -> String {
        if view.track_id.as_ref() != Some(&self.track_id) {
            return format!("{} (not playing)", self.track_id);
        }
        format!(
            "{} {}  {} / {}",
            status_glyph(view.status),
            view.title(),
            format_time(view.position_seconds),
            format_time(view.duration_seconds.unwrap_or(0.0)),
        )
    }
}
