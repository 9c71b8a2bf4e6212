use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, info};

use crate::error::StreamError;

/// Message-oriented duplex channel to the feed.
pub trait StreamConnection {
    /// Wait up to `timeout` for the next text message.
    ///
    /// Returns `StreamError::Timeout` when nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<String, StreamError>;

    /// Close the connection. Calling it more than once is harmless.
    fn close(&mut self);
}

/// Opens [`StreamConnection`]s.
pub trait Connector {
    type Conn: StreamConnection;

    fn connect(&mut self, url: &str) -> Result<Self::Conn, StreamError>;
}

/// What a callback-driven client reports to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Connected,
    Text(String),
    Closed(String),
}

/// Receiving side of a client whose own task pushes [`StreamEvent`]s.
pub struct EventQueue {
    rx: Receiver<StreamEvent>,
    pending: Option<String>,
}

impl EventQueue {
    pub fn new(rx: Receiver<StreamEvent>) -> Self {
        Self { rx, pending: None }
    }

    /// Wait for the handshake.
    ///
    /// A payload that overtakes the connect event also proves the link is up;
    /// it is kept and handed out first by [`EventQueue::next`].
    pub fn wait_connected(&mut self, timeout: Duration) -> Result<(), StreamError> {
        match self.rx.recv_timeout(timeout) {
            Ok(StreamEvent::Connected) => Ok(()),
            Ok(StreamEvent::Text(text)) => {
                debug!("stream: payload ahead of connect event");
                self.pending = Some(text);
                Ok(())
            }
            Ok(StreamEvent::Closed(reason)) => Err(StreamError::Connect(reason)),
            Err(RecvTimeoutError::Timeout) => Err(StreamError::Connect(format!(
                "no answer within {:?}",
                timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(StreamError::Connect("event channel closed".into()))
            }
        }
    }

    /// Next text message, waiting up to `timeout`.
    pub fn next(&mut self, timeout: Duration) -> Result<String, StreamError> {
        if let Some(text) = self.pending.take() {
            return Ok(text);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(StreamEvent::Text(text)) => {
                debug!("stream: {} bytes", text.len());
                Ok(text)
            }
            Ok(StreamEvent::Connected) => Err(StreamError::Timeout),
            Ok(StreamEvent::Closed(reason)) => Err(StreamError::ConnectionLost(reason)),
            Err(RecvTimeoutError::Timeout) => Err(StreamError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(StreamError::ConnectionLost("event channel closed".into()))
            }
        }
    }
}

/// The connection held by one run attempt.
///
/// Holders call [`Lease::release`] on every way out of the attempt; dropping
/// a lease that still holds a connection releases it too.
pub struct Lease<C: StreamConnection> {
    conn: Option<C>,
}

impl<C: StreamConnection> Lease<C> {
    pub fn empty() -> Self {
        Self { conn: None }
    }

    pub fn acquire(&mut self, conn: C) {
        self.release();
        self.conn = Some(conn);
    }

    pub fn get_mut(&mut self) -> Option<&mut C> {
        self.conn.as_mut()
    }

    pub fn is_held(&self) -> bool {
        self.conn.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
            info!("stream: connection released");
        }
    }
}

impl<C: StreamConnection> Drop for Lease<C> {
    fn drop(&mut self) {
        self.release();
    }
}
