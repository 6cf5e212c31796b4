//! Forwarder tasks — copy one readable stream to N sinks.
//!
//! The runner attaches one forwarder to the child's stdout and one to its
//! stderr. Each runs as its own tokio task, so a child that fills the OS
//! pipe buffer on the stream nobody is currently reading can never deadlock
//! the caller — the classic sequential-read pipe deadlock.
//!
//! ```text
//!   child stdout ──▶ forwarder task ──┬──▶ capture file
//!                                     ├──▶ process stdout (tee)
//!                                     └──▶ caller sink(s)
//! ```
//!
//! A forwarder ends when its source reaches EOF. It keeps reading to EOF
//! even if every sink has failed, so the child is always drained.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

/// Boxed sink accepted by a forwarder.
pub type BoxSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Read chunk size. Matches typical pipe buffer granularity.
const CHUNK_SIZE: usize = 8192;

/// Spawn a task that copies `reader` to every sink in `sinks` until EOF.
///
/// A sink that fails to accept a write is dropped (with a warning) and the
/// remaining sinks keep receiving data — one broken destination must not
/// starve the others or stall the child. All surviving sinks are flushed
/// before the task completes.
pub fn forward<R>(mut reader: R, mut sinks: Vec<BoxSink>) -> JoinHandle<io::Result<()>>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break; // EOF
            }

            let mut failed = Vec::new();
            for (idx, sink) in sinks.iter_mut().enumerate() {
                if let Err(e) = sink.write_all(&buf[..n]).await {
                    tracing::warn!(error = %e, "dropping broken forwarder sink");
                    failed.push(idx);
                }
            }
            // Remove in reverse so indices stay valid.
            for idx in failed.into_iter().rev() {
                sinks.remove(idx);
            }
        }

        for sink in sinks.iter_mut() {
            sink.flush().await?;
        }
        Ok(())
    })
}
