// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus slave (server) side.

pub mod handler;
pub mod rtu;
pub mod store;
pub mod tcp;

use std::{future::Future, io, sync::Arc};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::{
    codec::{mbap, rtu as rtu_codec},
    device::Device,
    frame::Framing,
    slave::SlaveId,
};

pub use self::{
    handler::RequestHandler,
    rtu::rtu_over_tcp_slave,
    store::{CallbackId, MemoryDataStore, Point, PointKind},
    tcp::tcp_slave,
};

/// Largest datagram the server accepts: one maximum-size MBAP frame.
const MAX_DATAGRAM_LEN: usize = 260;

/// A TCP server hosting registered responder devices.
///
/// A single listening socket can serve both framings: each accepted
/// connection is bound to a `(slave id, framing)` pair by its first
/// decodable datagram and keeps that binding for its lifetime.
///
/// The device registry is written during setup and read-only while
/// serving; enroll every device before calling [`serve`](Self::serve).
#[derive(Debug, Default)]
pub struct Server {
    devices: Vec<Device>,
}

impl Server {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a responder device.
    ///
    /// # Panics
    ///
    /// Panics if a device with the same `(slave id, framing)` pair is
    /// already enrolled.
    pub fn enroll(&mut self, device: Device) -> &mut Self {
        assert!(
            !self
                .devices
                .iter()
                .any(|dev| dev.slave_id == device.slave_id && dev.framing == device.framing),
            "device {} ({}) is already enrolled",
            device.slave_id,
            device.framing
        );
        self.devices.push(device);
        self
    }

    /// Accepts and serves connections on `listener` until an accept fails.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        let devices = Arc::new(self.devices);
        loop {
            let (stream, peer) = listener.accept().await?;
            log::info!("connection opened from {peer}");
            let devices = Arc::clone(&devices);
            tokio::spawn(async move {
                match process(&devices, stream).await {
                    Ok(()) => log::info!("connection from {peer} closed"),
                    Err(err) => log::warn!("connection from {peer} closed: {err}"),
                }
            });
        }
    }

    /// Serves until `shutdown` resolves.
    pub async fn serve_until<S>(self, listener: TcpListener, shutdown: S) -> io::Result<()>
    where
        S: Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.serve(listener) => result,
            () = shutdown => {
                log::debug!("shutdown signal received");
                Ok(())
            }
        }
    }
}

/// Per-connection loop: one datagram in, one response out.
async fn process(devices: &[Device], mut stream: TcpStream) -> io::Result<()> {
    let mut bound: Option<(SlaveId, Framing)> = None;
    let mut buf = [0u8; MAX_DATAGRAM_LEN];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        let datagram = &buf[..n];
        if bound.is_none() {
            bound = detect_framing(datagram);
            if let Some((slave_id, framing)) = bound {
                log::debug!("connection bound to slave {slave_id} ({framing})");
            }
        }
        // Datagrams that never bound a device are dropped silently; the
        // server does not synthesise exceptions for unknown units.
        let Some((slave_id, framing)) = bound else {
            continue;
        };
        let Some(device) = devices
            .iter()
            .find(|dev| dev.slave_id == slave_id && dev.framing == framing)
        else {
            continue;
        };
        match device.transport.send(datagram).await {
            Ok(response) => stream.write_all(&response).await?,
            Err(err) => log::warn!("failed to handle request for slave {slave_id}: {err}"),
        }
    }
}

/// Tries to parse the first datagram as MBAP, then as RTU; whichever
/// decodes cleanly determines the connection's framing and slave id.
///
/// A short RTU frame can double as a structurally valid MBAP frame (its
/// address and function code read as a transaction id, and zero bytes in
/// the right spots mimic the protocol id and length). A valid CRC is the
/// stronger signal, so an RTU decode outranks an MBAP one.
fn detect_framing(datagram: &[u8]) -> Option<(SlaveId, Framing)> {
    let mut bound = mbap::decode_frame(datagram)
        .ok()
        .map(|frame| (frame.unit_id, Framing::Mbap));
    if let Ok(frame) = rtu_codec::decode_frame(datagram) {
        bound = Some((frame.slave_id, Framing::Rtu));
    }
    bound
}
