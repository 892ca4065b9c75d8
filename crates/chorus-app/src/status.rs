//! Status sink that writes notifications to the terminal.

use std::io::Write;

use async_trait::async_trait;
use chorus_core::Result;
use chorus_player::{StatusHandle, StatusSink};
use parking_lot::Mutex;

/// Prints each notification on its own line. Edits of the most recent
/// notification rewrite that line in place.
pub struct ConsoleStatusSink<W> {
    out: Mutex<Output<W>>,
}

struct Output<W> {
    writer: W,
    last: Option<StatusHandle>,
}

impl ConsoleStatusSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleStatusSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: Mutex::new(Output { writer, last: None }),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().writer
    }
}

#[async_trait]
impl<W: Write + Send> StatusSink for ConsoleStatusSink<W> {
    async fn send(&self, text: &str) -> Result<StatusHandle> {
        let handle = StatusHandle::generate();
        let mut out = self.out.lock();
        if out.last.is_some() {
            writeln!(out.writer)?;
        }
        write!(out.writer, "{text}")?;
        out.writer.flush()?;
        out.last = Some(handle.clone());
        Ok(handle)
    }

    async fn edit(&self, handle: &StatusHandle, text: &str) -> Result<()> {
        let mut out = self.out.lock();
        if out.last.as_ref() == Some(handle) {
            write!(out.writer, "\r\x1b[2K{text}")?;
        } else {
            writeln!(out.writer)?;
            write!(out.writer, "{text}")?;
            out.last = Some(handle.clone());
        }
        out.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_edit_rewrites_last_line() {
        let sink = ConsoleStatusSink::new(Vec::new());
        let first = sink.send("Downloading A...").await.unwrap();
        sink.edit(&first, "Now playing: A").await.unwrap();
        sink.send("Added B").await.unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Downloading A...\r\x1b[2KNow playing: A\nAdded B");
    }

    #[tokio::test]
    async fn test_edit_of_older_handle_starts_new_line() {
        let sink = ConsoleStatusSink::new(Vec::new());
        let first = sink.send("Now playing: A").await.unwrap();
        sink.send("Added B").await.unwrap();
        sink.edit(&first, "Now playing: A [1:05]").await.unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Now playing: A\nAdded B\nNow playing: A [1:05]");
    }
}
