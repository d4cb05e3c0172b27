//! Line input shared by the shell and interactive prompts

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

type BoxedLines = Lines<Box<dyn AsyncBufRead + Unpin + Send>>;

/// One buffered reader over the process input.
///
/// Clones share the buffer, so a line read by a prompt is never also
/// handed to the shell and the reverse.
#[derive(Clone)]
pub struct LineInput {
    lines: Arc<Mutex<BoxedLines>>,
}

impl LineInput {
    pub fn new(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(reader);
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
        }
    }

    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }

    /// Next line without its terminator; `None` at end of input.
    /// Cancel-safe.
    pub async fn next_line(&self) -> io::Result<Option<String>> {
        self.lines.lock().await.next_line().await
    }
}
