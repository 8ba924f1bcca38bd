// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU-over-TCP client transport.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{client::tcp::TcpClient, codec, device::Transport, error::Result};

/// RTU transport over a pooled TCP connection.
///
/// The read side is driven by the request bytes: RTU frames are not
/// self-delimiting, so the reader predicts the response length from the
/// request's function code.
#[derive(Debug, Clone)]
pub struct RtuOverTcpTransport {
    client: TcpClient,
}

impl RtuOverTcpTransport {
    #[must_use]
    pub fn new(client: TcpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for RtuOverTcpTransport {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        self.client
            .send(request, |request, conn| {
                Box::pin(codec::rtu::read_frame(request, conn))
            })
            .await
    }
}
