// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serves an MBAP slave on 127.0.0.1:5020.

use std::sync::Arc;

use modbus_kit::{
    prelude::*,
    server::{tcp_slave, PointKind},
};
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = Arc::new(MemoryDataStore::new());
    for address in 0..5 {
        store.write(PointKind::Coil, address, 1);
        store.write(PointKind::HoldingRegister, address, 100 + address);
        store.write(PointKind::InputRegister, address, 200 + address);
    }
    store.subscribe(|point| {
        println!(
            "write: {} {} = {}",
            point.kind, point.address, point.value
        );
    });

    let identification = DeviceIdentification {
        vendor_name: Some("modbus-kit".into()),
        product_code: Some("MK-TCP-1".into()),
        product_version: Some(env!("CARGO_PKG_VERSION").into()),
        product_name: Some("demo slave".into()),
        ..Default::default()
    };

    let mut server = Server::new();
    server.enroll(tcp_slave(
        1,
        RequestHandler::new(store).with_identification(identification),
    ));

    let listener = TcpListener::bind("127.0.0.1:5020").await?;
    println!("serving MBAP slave 1 on {}", listener.local_addr()?);
    server.serve(listener).await?;
    Ok(())
}
