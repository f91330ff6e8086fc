//! Interactive transport prompt
//!
//! One command per line, read from stdin while a session is running.

use encore_core::TrackId;
use encore_playback::{Result, SessionHandle};
use thiserror::Error;

pub const HELP: &str = "\
p          play / pause
s <secs>   seek
l          toggle loop
v <0-1>    set volume
m          toggle mute
e          expand / collapse
k          like / unlike
n          skip to the next track
d          dismiss notice
c          close the session
q          quit";

#[derive(Debug, Clone, PartialEq)]
pub enum PromptCommand {
    TogglePlayPause,
    Seek(f64),
    ToggleLoop,
    Volume(f32),
    ToggleMute,
    ToggleExpanded,
    ToggleLike,
    Next,
    DismissNotice,
    Close,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseError(String);

/// What the input loop does after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Bind this track through the player so its next pointer is refilled
    Advance(TrackId),
    Quit,
}

/// Parse one prompt line
///
/// Blank lines parse to `None`.
pub fn parse(line: &str) -> std::result::Result<Option<PromptCommand>, ParseError> {
    let mut parts = line.split_whitespace();
    let Some(key) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let command = match key {
        "p" => PromptCommand::TogglePlayPause,
        "s" => PromptCommand::Seek(number(arg, "s <seconds>")?),
        "l" => PromptCommand::ToggleLoop,
        "v" => PromptCommand::Volume(number(arg, "v <0-1>")?),
        "m" => PromptCommand::ToggleMute,
        "e" => PromptCommand::ToggleExpanded,
        "k" => PromptCommand::ToggleLike,
        "n" => PromptCommand::Next,
        "d" => PromptCommand::DismissNotice,
        "c" => PromptCommand::Close,
        "h" | "?" => PromptCommand::Help,
        "q" => PromptCommand::Quit,
        other => return Err(ParseError(format!("unknown command '{}' (h for help)", other))),
    };
    Ok(Some(command))
}

fn number<T: std::str::FromStr>(
    arg: Option<&str>,
    usage: &str,
) -> std::result::Result<T, ParseError> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| ParseError(format!("usage: {}", usage)))
}

/// Forward a command to the session
pub fn apply(session: &SessionHandle, command: &PromptCommand) -> Result<Flow> {
    match command {
        PromptCommand::TogglePlayPause => session.toggle_play_pause()?,
        PromptCommand::Seek(position) => session.seek(*position)?,
        PromptCommand::ToggleLoop => session.toggle_loop()?,
        PromptCommand::Volume(level) => session.set_volume(*level)?,
        PromptCommand::ToggleMute => session.toggle_mute()?,
        PromptCommand::ToggleExpanded => {
            if session.current().expanded {
                session.collapse()?;
            } else {
                session.expand()?;
            }
        }
        PromptCommand::ToggleLike => session.toggle_like()?,
        PromptCommand::Next => {
            if let Some(next) = session.current().next_track.clone() {
                return Ok(Flow::Advance(next));
            }
        }
        PromptCommand::DismissNotice => session.dismiss_notice()?,
        PromptCommand::Close => {
            session.clear()?;
            return Ok(Flow::Quit);
        }
        PromptCommand::Help => println!("{}", HELP),
        PromptCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}
