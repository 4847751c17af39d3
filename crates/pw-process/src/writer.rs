//! Guarded writes to the backend's input stream.
//!
//! Once a quit has been sent or the end of the file has been seen the pipe
//! may be closing, so further commands are dropped instead of written.

use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug)]
pub struct CommandWriter<W> {
    inner: W,
    writes: u64,
    quit_sent: bool,
    end_of_file: bool,
}

impl<W: AsyncWrite + Unpin> CommandWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            writes: 0,
            quit_sent: false,
            end_of_file: false,
        }
    }

    /// Number of lines actually written.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn mark_end_of_file(&mut self) {
        self.end_of_file = true;
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Write one command line. Returns `false` if the command was dropped.
    pub async fn write_line(&mut self, text: &str) -> pw_core::Result<bool> {
        if self.quit_sent || self.end_of_file {
            tracing::debug!(
                quit_sent = self.quit_sent,
                end_of_file = self.end_of_file,
                "Dropping command for closing backend: {text}"
            );
            return Ok(false);
        }
        self.send(text).await?;
        Ok(true)
    }

    /// Send the quit command once. Later calls are no-ops returning `false`.
    ///
    /// A quit still goes out after the end of the file was seen, since a
    /// forced quit is exactly how a faked end of file is delivered.
    pub async fn quit(&mut self, command: &str) -> pw_core::Result<bool> {
        if self.quit_sent {
            tracing::debug!("Quit already sent; ignoring");
            return Ok(false);
        }
        self.quit_sent = true;
        self.send(command).await?;
        Ok(true)
    }

    async fn send(&mut self, text: &str) -> pw_core::Result<()> {
        tracing::trace!("-> {text}");
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.inner
            .write_all(line.as_bytes())
            .await
            .map_err(pw_core::Error::write)?;
        self.inner.flush().await.map_err(pw_core::Error::write)?;
        self.writes += 1;
        Ok(())
    }
}
