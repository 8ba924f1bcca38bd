// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serves an RTU-over-TCP slave on 127.0.0.1:5021.

use std::sync::Arc;

use modbus_kit::{
    prelude::*,
    server::{rtu_over_tcp_slave, PointKind},
};
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = Arc::new(MemoryDataStore::new());
    store.write(PointKind::HoldingRegister, 0x082B, 0x1234);
    store.subscribe(|point| {
        println!(
            "write: {} {} = {}",
            point.kind, point.address, point.value
        );
    });

    let mut server = Server::new();
    server.enroll(rtu_over_tcp_slave(1, RequestHandler::new(store)));

    let listener = TcpListener::bind("127.0.0.1:5021").await?;
    println!("serving RTU-over-TCP slave 1 on {}", listener.local_addr()?);
    server.serve(listener).await?;
    Ok(())
}
