// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device composition shared by the client and the server side.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::Result, frame::Framing, slave::SlaveId};

/// Byte-level request/response exchange.
///
/// Client-side implementations write one framed request to a socket and
/// read exactly one framed response. Server-side implementations parse the
/// framed request, dispatch it and return the framed response directly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one framed request and returns one framed response.
    async fn send(&self, request: &[u8]) -> Result<Bytes>;
}

/// A responder endpoint: one slave id answering on one framing.
#[derive(Clone)]
pub struct Device {
    pub slave_id: SlaveId,
    pub framing: Framing,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Device {
    /// Composes a device from its address, framing and transport.
    #[must_use]
    pub fn new(slave_id: SlaveId, framing: Framing, transport: Arc<dyn Transport>) -> Self {
        Self {
            slave_id,
            framing,
            transport,
        }
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("slave_id", &self.slave_id)
            .field("framing", &self.framing)
            .finish_non_exhaustive()
    }
}
