// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP client connections.

use std::{io, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
    time::{self, Instant},
};

use crate::{
    codec,
    device::Transport,
    error::{Error, Result},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const DRAIN_BUF_LEN: usize = 1024;

/// The future a framing-aware read closure returns while it borrows the
/// socket. It receives the raw request so framings without a length field
/// can predict how many response bytes to expect.
pub(crate) type ReadResponse<'a> = BoxFuture<'a, Result<Bytes>>;

/// A pooled TCP connection with exclusive single-flight semantics.
///
/// Modbus has no multiplexing on a single connection: one request must be
/// answered before the next may be written. Every [`send`](Self::send)
/// therefore holds the connection lock for the whole exchange and hands
/// the socket to a framing-aware read closure; the raw socket is never
/// exposed. The connection is dialed lazily, torn down by an idle
/// watchdog and re-dialed transparently on the next call.
#[derive(Debug, Clone)]
pub struct TcpClient {
    address: String,
    connect_timeout: Duration,
    timeout: Duration,
    idle_timeout: Duration,
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    conn: Option<TcpStream>,
    last_activity: Instant,
    // Incremented on every dial so a stale watchdog can tell that the
    // connection it was armed for is gone.
    generation: u64,
}

impl TcpClient {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            state: Arc::new(Mutex::new(State {
                conn: None,
                last_activity: Instant::now(),
                generation: 0,
            })),
        }
    }

    /// Deadline for one request/response round trip.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deadline for dialing the remote address.
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Idle period after which the pooled connection is closed.
    ///
    /// A zero duration disables the watchdog.
    #[must_use]
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Dials eagerly instead of waiting for the first `send`.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state).await
    }

    /// Closes the pooled connection if one is open.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.conn = None;
    }

    /// Writes `request` and lets `read_response` read exactly one framed
    /// response, all under the connection lock and a combined read/write
    /// deadline. On a read failure the connection is drained so the next
    /// call starts clean.
    pub(crate) async fn send<F>(&self, request: &[u8], read_response: F) -> Result<Bytes>
    where
        F: for<'a> FnOnce(&'a [u8], &'a mut TcpStream) -> ReadResponse<'a> + Send,
    {
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state).await?;
        state.last_activity = Instant::now();
        let deadline = state.last_activity + self.timeout;
        let Some(conn) = state.conn.as_mut() else {
            unreachable!("connected above");
        };

        match time::timeout_at(deadline, conn.write_all(request)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(timed_out("write timed out")),
        }
        match time::timeout_at(deadline, read_response(request, conn)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                drain(conn).await;
                Err(err)
            }
            Err(_) => {
                drain(conn).await;
                Err(timed_out("read timed out"))
            }
        }
    }

    async fn ensure_connected(&self, state: &mut State) -> Result<()> {
        if state.conn.is_some() {
            return Ok(());
        }
        let conn = match time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
        {
            Ok(conn) => conn?,
            Err(_) => return Err(timed_out("connect timed out")),
        };
        state.conn = Some(conn);
        state.generation += 1;
        self.arm_idle_watchdog(state.generation);
        Ok(())
    }

    fn arm_idle_watchdog(&self, generation: u64) {
        if self.idle_timeout.is_zero() {
            return;
        }
        let state = Arc::clone(&self.state);
        let idle_timeout = self.idle_timeout;
        let address = self.address.clone();
        tokio::spawn(async move {
            loop {
                let deadline = {
                    let state = state.lock().await;
                    if state.generation != generation || state.conn.is_none() {
                        return;
                    }
                    state.last_activity + idle_timeout
                };
                time::sleep_until(deadline).await;
                let mut state = state.lock().await;
                if state.generation != generation || state.conn.is_none() {
                    return;
                }
                let idle_for = state.last_activity.elapsed();
                if idle_for >= idle_timeout {
                    log::info!("closing connection to {address} after {idle_for:?} idle");
                    state.conn = None;
                    return;
                }
                // A send slipped in while we slept; re-arm.
            }
        });
    }
}

/// Discards whatever may still be buffered on the socket so the next
/// exchange starts clean. Timeouts are expected and ignored.
async fn drain(conn: &mut TcpStream) {
    let mut buf = [0u8; DRAIN_BUF_LEN];
    let _ = time::timeout(Duration::ZERO, conn.read(&mut buf)).await;
}

fn timed_out(message: &str) -> Error {
    Error::Transport(io::Error::new(io::ErrorKind::TimedOut, message.to_owned()))
}

/// MBAP transport over a pooled TCP connection.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    client: TcpClient,
}

impl TcpTransport {
    #[must_use]
    pub fn new(client: TcpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        self.client
            .send(request, |_request, conn| {
                Box::pin(codec::mbap::read_frame(conn))
            })
            .await
    }
}
