// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MBAP slave transport.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    codec::mbap,
    device::{Device, Transport},
    error::Result,
    frame::{mbap::MbapFrame, Framing},
    server::handler::RequestHandler,
    slave::SlaveId,
};

/// Builds an MBAP responder device around `handler`.
#[must_use]
pub fn tcp_slave(slave_id: SlaveId, handler: RequestHandler) -> Device {
    Device::new(
        slave_id,
        Framing::Mbap,
        Arc::new(TcpSlaveTransport::new(handler)),
    )
}

/// Answers MBAP request frames by dispatching their PDU.
#[derive(Debug, Clone)]
pub struct TcpSlaveTransport {
    handler: RequestHandler,
}

impl TcpSlaveTransport {
    #[must_use]
    pub fn new(handler: RequestHandler) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Transport for TcpSlaveTransport {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        let frame = mbap::decode_frame(request)?;
        let response = self.handler.handle(&frame.pdu);
        // The response reuses the request header; the length field is
        // recomputed from the new PDU.
        Ok(mbap::encode_frame(&MbapFrame {
            pdu: response,
            ..frame
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::MemoryDataStore;

    #[tokio::test]
    async fn scenario_read_coils() {
        let store = Arc::new(MemoryDataStore::new());
        for address in 0..5 {
            store.write(crate::server::store::PointKind::Coil, address, 1);
        }
        let transport = TcpSlaveTransport::new(RequestHandler::new(store));

        let request = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x0A,
        ];
        let response = transport.send(&request).await.unwrap();
        assert_eq!(
            &response[..],
            &[0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x01, 0x01, 0x02, 0x1F, 0x00]
        );
    }

    #[tokio::test]
    async fn malformed_frame_is_an_error() {
        let transport =
            TcpSlaveTransport::new(RequestHandler::new(Arc::new(MemoryDataStore::new())));
        assert!(transport.send(&[0x00, 0x01, 0x00]).await.is_err());
    }
}
