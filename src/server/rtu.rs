// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU-over-TCP slave transport.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    codec::rtu,
    device::{Device, Transport},
    error::Result,
    frame::{rtu::RtuFrame, Framing},
    server::handler::RequestHandler,
    slave::SlaveId,
};

/// Builds an RTU-over-TCP responder device around `handler`.
#[must_use]
pub fn rtu_over_tcp_slave(slave_id: SlaveId, handler: RequestHandler) -> Device {
    Device::new(
        slave_id,
        Framing::Rtu,
        Arc::new(RtuOverTcpSlaveTransport::new(handler)),
    )
}

/// Answers RTU request frames by dispatching their PDU.
#[derive(Debug, Clone)]
pub struct RtuOverTcpSlaveTransport {
    handler: RequestHandler,
}

impl RtuOverTcpSlaveTransport {
    #[must_use]
    pub fn new(handler: RequestHandler) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Transport for RtuOverTcpSlaveTransport {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        let frame = rtu::decode_frame(request)?;
        let response = self.handler.handle(&frame.pdu);
        // Re-encoding computes a fresh CRC over the response PDU; the
        // request CRC is never carried over.
        rtu::encode_frame(&RtuFrame {
            slave_id: frame.slave_id,
            pdu: response,
        })
    }
}
