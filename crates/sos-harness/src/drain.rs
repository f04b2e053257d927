//! Output drain.
//!
//! The drain is a background task that reads the process's merged output
//! and forwards every non-empty chunk, in order, over an unbounded channel.
//! A pipe that nobody reads eventually fills and stalls the writer, so the
//! drain keeps reading whether or not anyone is currently waiting.
//!
//! The task ends on end-of-file, on a read error, or when the receiving
//! side goes away. Once told that the process has exited it keeps reading
//! until the stream goes quiet for a short window, so output written just
//! before exit still reaches the queue.

use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Sender half of the output queue.
pub type ChunkSender = mpsc::UnboundedSender<Bytes>;

/// Receiver half of the output queue.
pub type ChunkReceiver = mpsc::UnboundedReceiver<Bytes>;

/// Diagnostic stream raw output is echoed to.
pub type EchoSink = Box<dyn Write + Send>;

/// Create the output queue.
#[must_use]
pub fn output_queue() -> (ChunkSender, ChunkReceiver) {
    mpsc::unbounded_channel()
}

/// Drain settings.
pub struct DrainOptions {
    /// Maximum bytes per read.
    pub chunk_size: usize,
    /// Read window after the exit signal.
    pub final_read_window: Duration,
    /// Echo destination, if echo is enabled.
    pub echo: Option<EchoSink>,
}

impl std::fmt::Debug for DrainOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainOptions")
            .field("chunk_size", &self.chunk_size)
            .field("final_read_window", &self.final_read_window)
            .field("echo", &self.echo.is_some())
            .finish()
    }
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            chunk_size: crate::config::DEFAULT_READ_CHUNK_SIZE,
            final_read_window: crate::config::DEFAULT_FINAL_READ_WINDOW,
            echo: None,
        }
    }
}

/// Why the drain loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// The stream reached end-of-file.
    Eof,
    /// The process exited and the stream went quiet.
    Quiet,
    /// A read failed (typically a closed pipe).
    ReadError,
    /// The output queue's receiver was dropped.
    ReceiverGone,
    /// The task was aborted after missing its join deadline.
    Aborted,
}

/// Counters reported when the drain finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    /// Chunks forwarded.
    pub chunks: u64,
    /// Bytes forwarded.
    pub bytes: u64,
    /// Why the loop ended.
    pub end: DrainEnd,
}

/// Handle to a running drain task.
#[derive(Debug)]
pub struct Drain {
    handle: JoinHandle<DrainStats>,
    exited: watch::Sender<bool>,
}

struct DrainLoop<R> {
    reader: R,
    sender: ChunkSender,
    echo: Option<EchoSink>,
    buf: Vec<u8>,
    chunks: u64,
    bytes: u64,
}

enum Step {
    Continue,
    End(DrainEnd),
}

impl<R: AsyncRead + Unpin> DrainLoop<R> {
    fn forward(&mut self, n: usize) -> Step {
        let chunk = Bytes::copy_from_slice(&self.buf[..n]);
        tracing::trace!(bytes = n, "output chunk");

        if let Some(echo) = self.echo.as_mut() {
            // Echo is best effort.
            let _ = echo.write_all(&chunk).and_then(|()| echo.flush());
        }

        self.chunks += 1;
        self.bytes += n as u64;
        if self.sender.send(chunk).is_err() {
            return Step::End(DrainEnd::ReceiverGone);
        }
        Step::Continue
    }

    fn handle_read(&mut self, read: std::io::Result<usize>) -> Step {
        match read {
            Ok(0) => Step::End(DrainEnd::Eof),
            Ok(n) => self.forward(n),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Step::Continue,
            Err(e) => {
                tracing::debug!(error = %e, "output read failed");
                Step::End(DrainEnd::ReadError)
            }
        }
    }

    async fn run(mut self, mut exited: watch::Receiver<bool>, window: Duration) -> DrainStats {
        let end = loop {
            tokio::select! {
                biased;
                read = self.reader.read(&mut self.buf) => {
                    if let Step::End(end) = self.handle_read(read) {
                        break Some(end);
                    }
                }
                changed = exited.changed() => {
                    // A dropped sender counts as an exit signal too.
                    if changed.is_err() || *exited.borrow() {
                        break None;
                    }
                }
            }
        };

        let end = match end {
            Some(end) => end,
            None => self.final_reads(window).await,
        };

        tracing::debug!(chunks = self.chunks, bytes = self.bytes, ?end, "output drain finished");
        DrainStats {
            chunks: self.chunks,
            bytes: self.bytes,
            end,
        }
    }

    /// Read until end-of-file or until `window` passes without data. At
    /// least one read is always attempted.
    async fn final_reads(&mut self, window: Duration) -> DrainEnd {
        loop {
            match tokio::time::timeout(window, self.reader.read(&mut self.buf)).await {
                Ok(read) => {
                    if let Step::End(end) = self.handle_read(read) {
                        return end;
                    }
                }
                Err(_) => return DrainEnd::Quiet,
            }
        }
    }
}

impl Drain {
    /// Start draining `reader` into `sender`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<R>(reader: R, sender: ChunkSender, options: DrainOptions) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (exited, exited_rx) = watch::channel(false);
        let drain = DrainLoop {
            reader,
            sender,
            echo: options.echo,
            buf: vec![0; options.chunk_size.max(1)],
            chunks: 0,
            bytes: 0,
        };
        let handle = tokio::spawn(drain.run(exited_rx, options.final_read_window));
        Self { handle, exited }
    }

    /// Check if the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Tell the task the process has exited and join it.
    ///
    /// If the task has not finished within `join_timeout` it is aborted.
    pub async fn finish(self, join_timeout: Duration) -> DrainStats {
        let _ = self.exited.send(true);
        let mut handle = self.handle;

        match tokio::time::timeout(join_timeout, &mut handle).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "output drain task failed");
                DrainStats {
                    chunks: 0,
                    bytes: 0,
                    end: DrainEnd::Aborted,
                }
            }
            Err(_) => {
                tracing::warn!(?join_timeout, "output drain did not finish in time; aborting");
                handle.abort();
                DrainStats {
                    chunks: 0,
                    bytes: 0,
                    end: DrainEnd::Aborted,
                }
            }
        }
    }

    /// Abort the task without waiting.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncWriteExt;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn forwards_chunks_in_order_until_eof() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = output_queue();
        let drain = Drain::spawn(reader, tx, DrainOptions::default());

        for part in ["ab", "cd", "ef"] {
            writer.write_all(part.as_bytes()).await.unwrap();
            writer.flush().await.unwrap();
            tokio::task::yield_now().await;
        }
        drop(writer);

        let mut seen = Vec::new();
        while let Some(chunk) = rx.recv().await {
            seen.extend_from_slice(&chunk);
        }
        assert_eq!(seen, b"abcdef");

        let stats = drain.finish(Duration::from_secs(1)).await;
        assert_eq!(stats.end, DrainEnd::Eof);
        assert_eq!(stats.bytes, 6);
    }

    #[tokio::test]
    async fn chunk_size_bounds_each_read() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = output_queue();
        let options = DrainOptions {
            chunk_size: 4,
            ..DrainOptions::default()
        };
        let _drain = Drain::spawn(reader, tx, options);

        writer.write_all(b"0123456789").await.unwrap();
        drop(writer);

        let mut total = 0;
        while let Some(chunk) = rx.recv().await {
            assert!(!chunk.is_empty() && chunk.len() <= 4);
            total += chunk.len();
        }
        assert_eq!(total, 10);
    }

    #[tokio::test]
    async fn exit_signal_ends_silent_stream() {
        // The writer stays open, as when a grandchild inherits the pipe.
        let (_writer, reader) = tokio::io::duplex(64);
        let (tx, _rx) = output_queue();
        let options = DrainOptions {
            final_read_window: Duration::from_millis(20),
            ..DrainOptions::default()
        };
        let drain = Drain::spawn(reader, tx, options);

        let started = std::time::Instant::now();
        let stats = drain.finish(Duration::from_secs(2)).await;
        assert_eq!(stats.end, DrainEnd::Quiet);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn trailing_output_after_exit_is_kept() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = output_queue();
        let drain = Drain::spawn(reader, tx, DrainOptions::default());

        writer.write_all(b"last words").await.unwrap();
        let stats = drain.finish(Duration::from_secs(1)).await;
        assert_eq!(stats.bytes, 10);
        assert_eq!(&rx.recv().await.unwrap()[..], b"last words");
    }

    #[tokio::test]
    async fn echo_copies_raw_bytes() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, _rx) = output_queue();
        let sink = SharedSink::default();
        let options = DrainOptions {
            echo: Some(Box::new(sink.clone())),
            ..DrainOptions::default()
        };
        let drain = Drain::spawn(reader, tx, options);

        writer.write_all(b"boot...\n").await.unwrap();
        drop(writer);
        drain.finish(Duration::from_secs(1)).await;

        assert_eq!(&sink.0.lock().unwrap()[..], b"boot...\n");
    }

    #[tokio::test]
    async fn dropped_receiver_ends_drain() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, rx) = output_queue();
        drop(rx);
        let drain = Drain::spawn(reader, tx, DrainOptions::default());

        writer.write_all(b"x").await.unwrap();
        let stats = drain.finish(Duration::from_secs(1)).await;
        assert_eq!(stats.end, DrainEnd::ReceiverGone);
    }
}
