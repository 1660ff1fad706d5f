//! A synchronous façade over [`Session`](super::Session) for callers that
//! don't want to drive a tokio runtime themselves — grounded on the
//! relationship between the teacher's synchronous `Session` and its
//! `AsyncTerminalController`: a dedicated runtime drives the async core,
//! and the façade blocks on it.

use super::{Session, SessionState};
use crate::config::SessionConfig;
use crate::error::Tn3270Result;
use crate::screen::ScreenBuffer;
use crate::transport::Transport;
use tokio::runtime::Runtime;

pub struct BlockingSession<T: Transport> {
    inner: Session<T>,
    runtime: Runtime,
}

impl<T: Transport> BlockingSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> Tn3270Result<Self> {
        let runtime = Runtime::new().expect("failed to start tokio runtime for blocking session");
        let inner = Session::new(transport, config)?;
        Ok(BlockingSession { inner, runtime })
    }

    pub fn connect(&mut self) -> Tn3270Result<()> {
        self.runtime.block_on(self.inner.connect())
    }

    pub fn poll(&mut self) -> Tn3270Result<()> {
        self.runtime.block_on(self.inner.poll())
    }

    pub fn send_aid(&mut self, aid: crate::datastream::codes::AidKey) -> Tn3270Result<()> {
        self.runtime.block_on(self.inner.send_aid(aid))
    }

    pub fn close(&mut self) -> Tn3270Result<()> {
        self.runtime.block_on(self.inner.close())
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    pub fn screen(&self) -> &ScreenBuffer {
        self.inner.screen()
    }
}
