//! JSON-lines output of pipeline messages for the `generate` command.

use std::io::Write;

use async_trait::async_trait;
use storygen_error::{BackendError, StorygenResult};
use storygen_story::{MessageSink, ServerMessage};

/// Writes each message as one line of JSON.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    async fn send(&mut self, message: ServerMessage) -> StorygenResult<()> {
        let line = message.to_json()?;
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| BackendError::new(format!("Failed to write message: {}", e)))?;
        Ok(())
    }
}
