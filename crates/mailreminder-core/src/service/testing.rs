//! Scripted in-memory stream for protocol adapter tests.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Everything the client wrote.
#[derive(Debug, Clone, Default)]
pub struct SentLog(Arc<Mutex<Vec<u8>>>);

impl SentLog {
    /// Returns the written bytes as text.
    pub fn text(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Replays canned server output and records client writes. Reads hit EOF
/// once the script is exhausted.
#[derive(Debug)]
pub struct ScriptedStream {
    script: Cursor<Vec<u8>>,
    sent: SentLog,
}

impl ScriptedStream {
    pub fn new(script: &[u8]) -> (Self, SentLog) {
        let sent = SentLog::default();
        let stream = Self {
            script: Cursor::new(script.to_vec()),
            sent: sent.clone(),
        };
        (stream, sent)
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.script.position()).unwrap_or(usize::MAX);
        let data = self.script.get_ref();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let n = (data.len() - pos).min(buf.remaining());
        buf.put_slice(&data[pos..pos + n]);
        self.script.set_position((pos + n) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
