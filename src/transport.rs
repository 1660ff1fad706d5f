//! The transport boundary: byte-stream I/O the session drives, supplied by
//! the caller. TLS and raw socket management live outside this crate —
//! this trait is the seam.

use async_trait::async_trait;
use std::io;

/// An already-connected, ordered, reliable byte stream. A `TcpStream`, a
/// TLS-wrapped stream, or a test double all satisfy this.
#[async_trait]
pub trait Transport: Send {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    async fn shutdown(&mut self) -> io::Result<()>;
}

#[async_trait]
impl Transport for tokio::net::TcpStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        tokio::io::AsyncReadExt::read(self, buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        tokio::io::AsyncWriteExt::write_all(self, buf).await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        tokio::io::AsyncWriteExt::shutdown(self).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;

    /// An in-memory transport double: bytes written are captured, and bytes
    /// queued via `push_inbound` are returned from `read`.
    #[derive(Default)]
    pub struct MockTransport {
        pub inbound: VecDeque<u8>,
        pub outbound: Vec<u8>,
        pub shutdown_called: bool,
    }

    impl MockTransport {
        pub fn push_inbound(&mut self, bytes: &[u8]) {
            self.inbound.extend(bytes.iter().copied());
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.inbound.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.inbound.pop_front().unwrap();
            }
            Ok(n)
        }

        async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
            self.outbound.extend_from_slice(buf);
            Ok(())
        }

        async fn shutdown(&mut self) -> io::Result<()> {
            self.shutdown_called = true;
            Ok(())
        }
    }
}
