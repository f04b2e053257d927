//! Merged output pipe.
//!
//! The child's stdout and stderr are both attached to the write end of one
//! pipe, so the harness sees a single byte stream in the order the child
//! wrote it.

use std::io;
use std::os::fd::OwnedFd;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::net::unix::pipe::Receiver;

/// Read half of the merged output pipe.
#[derive(Debug)]
pub struct OutputReader {
    inner: Receiver,
}

impl OutputReader {
    fn from_fd(fd: OwnedFd) -> io::Result<Self> {
        Ok(Self {
            inner: Receiver::from_owned_fd(fd)?,
        })
    }
}

impl AsyncRead for OutputReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Write ends to hand to the child, one per stream.
#[derive(Debug)]
pub struct ChildOutput {
    /// Installed as the child's stdout.
    pub stdout: Stdio,
    /// Installed as the child's stderr.
    pub stderr: Stdio,
}

/// Create the merged pipe.
///
/// Both fds are close-on-exec; the child gets its own copies through
/// `dup2`, which clears the flag. The caller must drop [`ChildOutput`]
/// (normally by dropping the `Command` it was given to) once the child is
/// spawned, otherwise the reader never sees end-of-file.
///
/// Must be called from within a Tokio runtime.
pub fn merged_output() -> io::Result<(OutputReader, ChildOutput)> {
    let (read_fd, write_fd) = cloexec_pipe()?;
    let stderr_fd = write_fd.try_clone()?;
    let reader = OutputReader::from_fd(read_fd)?;
    Ok((
        reader,
        ChildOutput {
            stdout: Stdio::from(write_fd),
            stderr: Stdio::from(stderr_fd),
        },
    ))
}

#[cfg(not(target_vendor = "apple"))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    use rustix::pipe::{PipeFlags, pipe_with};
    Ok(pipe_with(PipeFlags::CLOEXEC)?)
}

// No pipe2 on Apple targets.
#[cfg(target_vendor = "apple")]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    use rustix::io::{FdFlags, fcntl_setfd};
    let (read_fd, write_fd) = rustix::pipe::pipe()?;
    fcntl_setfd(&read_fd, FdFlags::CLOEXEC)?;
    fcntl_setfd(&write_fd, FdFlags::CLOEXEC)?;
    Ok((read_fd, write_fd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn reader_sees_eof_once_writers_drop() {
        let (mut reader, output) = merged_output().unwrap();
        drop(output);

        let mut buf = [0u8; 16];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }
}
