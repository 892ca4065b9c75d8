//! Console command parsing.

use std::path::PathBuf;

use thiserror::Error;

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve a URL and queue the result, optionally at a 1-based position.
    Add { url: String, position: Option<usize> },
    /// Queue a local sound file.
    Sound { path: PathBuf, name: Option<String> },
    Play(Option<usize>),
    Next,
    Previous,
    Stop,
    Clear,
    Remove(usize),
    Swap(usize, usize),
    Shuffle { exclude_playlists: bool },
    Queue,
    Connect,
    Disconnect,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a queue position (positions start at 1)")]
    Position(String),
}

pub const HELP: &str = "\
add <url> [position]    queue a video or playlist
sound <path> [name]     queue a local audio file
play [position]         play the current item, or jump to a position
next | prev             move through the queue
stop | clear            halt playback / empty the queue
remove <position>       drop an item
swap <a> <b>            exchange two items
shuffle [--keep-playlists]
queue                   show the queue
connect | disconnect    manage the output
quit";

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("add", [url]) => Self::Add {
                url: (*url).to_string(),
                position: None,
            },
            ("add", [url, position]) => Self::Add {
                url: (*url).to_string(),
                position: Some(index(position)?),
            },
            ("add", _) => return Err(ParseError::Usage("add <url> [position]")),
            ("sound", [path, name @ ..]) => Self::Sound {
                path: PathBuf::from(*path),
                name: (!name.is_empty()).then(|| name.join(" ")),
            },
            ("sound", []) => return Err(ParseError::Usage("sound <path> [name]")),
            ("play", []) => Self::Play(None),
            ("play", [position]) => Self::Play(Some(index(position)?)),
            ("play", _) => return Err(ParseError::Usage("play [position]")),
            ("next" | "skip", []) => Self::Next,
            ("prev" | "previous" | "back", []) => Self::Previous,
            ("stop", []) => Self::Stop,
            ("clear", []) => Self::Clear,
            ("remove" | "rm", [position]) => Self::Remove(index(position)?),
            ("remove" | "rm", _) => return Err(ParseError::Usage("remove <position>")),
            ("swap", [a, b]) => Self::Swap(index(a)?, index(b)?),
            ("swap", _) => return Err(ParseError::Usage("swap <a> <b>")),
            ("shuffle", []) => Self::Shuffle {
                exclude_playlists: false,
            },
            ("shuffle", ["--keep-playlists"]) => Self::Shuffle {
                exclude_playlists: true,
            },
            ("shuffle", _) => return Err(ParseError::Usage("shuffle [--keep-playlists]")),
            ("queue" | "q" | "list", []) => Self::Queue,
            ("connect", []) => Self::Connect,
            ("disconnect", []) => Self::Disconnect,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => return Err(ParseError::Unknown(line.trim().to_string())),
        };
        Ok(Some(command))
    }
}

/// 1-based position on the console, 0-based index in the queue.
fn index(word: &str) -> Result<usize, ParseError> {
    word.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| ParseError::Position(word.to_string()))
}
