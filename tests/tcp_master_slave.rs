// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end MBAP exchanges between a master and a served slave.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use modbus_kit::{
    prelude::*,
    server::{tcp_slave, MemoryDataStore, PointKind, RequestHandler},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

async fn spawn_server(store: Arc<MemoryDataStore>) -> anyhow::Result<SocketAddr> {
    let identification = DeviceIdentification {
        vendor_name: Some("acme".into()),
        product_version: Some("1.2.0".into()),
        product_name: Some("widget".into()),
        ..Default::default()
    };

    let mut server = Server::new();
    server.enroll(tcp_slave(1, RequestHandler::new(Arc::clone(&store))));
    server.enroll(tcp_slave(
        2,
        RequestHandler::new(store).with_identification(identification),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let server_addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = server.serve(listener).await {
            eprintln!("server stopped: {err}");
        }
    });
    Ok(server_addr)
}

#[tokio::test]
async fn read_coils_on_the_wire() -> anyhow::Result<()> {
    let store = Arc::new(MemoryDataStore::new());
    for address in 0..5 {
        store.write(PointKind::Coil, address, 1);
    }
    let server_addr = spawn_server(store).await?;

    // Drive the socket directly to pin the exact wire bytes.
    let mut stream = TcpStream::connect(server_addr).await?;
    stream
        .write_all(&[
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x0A,
        ])
        .await?;
    let mut response = [0u8; 11];
    stream.read_exact(&mut response).await?;
    assert_eq!(
        response,
        [0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x01, 0x01, 0x02, 0x1F, 0x00]
    );

    // The same exchange through the master API.
    let master = Master::tcp(server_addr.to_string());
    let bits = master.read_coils(1, 0, 10).await?;
    assert_eq!(
        bits.to_vec(),
        vec![true, true, true, true, true, false, false, false, false, false]
    );
    Ok(())
}

#[tokio::test]
async fn write_multiple_coils_round_trip() -> anyhow::Result<()> {
    let server_addr = spawn_server(Arc::new(MemoryDataStore::new())).await?;
    let master = Master::tcp(server_addr.to_string());

    let values = [true, false, true, false, true, false, true, false];
    master.write_multiple_coils(1, 0, &values).await?;
    let bits = master.read_coils(1, 0, 8).await?;
    assert_eq!(bits.to_vec(), values);
    Ok(())
}

#[tokio::test]
async fn exception_propagation() -> anyhow::Result<()> {
    let server_addr = spawn_server(Arc::new(MemoryDataStore::new())).await?;
    let master = Master::tcp(server_addr.to_string());

    // Slave 1 has no identification configured.
    let err = master.read_device_identification(1).await.unwrap_err();
    match err {
        Error::Exception(response) => {
            assert_eq!(response.function, 0xAB);
            assert_eq!(response.exception, Exception::ServerDeviceFailure);
        }
        other => panic!("expected an exception response, got {other:?}"),
    }

    // A responder with zero registered coils still answers a read.
    let bits = master.read_coils(1, 0, 1).await?;
    assert_eq!(bits.to_vec(), vec![false]);
    Ok(())
}

#[tokio::test]
async fn device_identification() -> anyhow::Result<()> {
    let server_addr = spawn_server(Arc::new(MemoryDataStore::new())).await?;
    let master = Master::tcp(server_addr.to_string());

    let identification = master.read_device_identification(2).await?;
    assert_eq!(identification.vendor_name.as_deref(), Some("acme"));
    assert_eq!(identification.product_version.as_deref(), Some("1.2.0"));
    assert_eq!(identification.product_name.as_deref(), Some("widget"));
    assert_eq!(identification.model_name, None);
    Ok(())
}

#[tokio::test]
async fn unknown_unit_is_dropped_silently() -> anyhow::Result<()> {
    let server_addr = spawn_server(Arc::new(MemoryDataStore::new())).await?;

    let mut stream = TcpStream::connect(server_addr).await?;
    stream
        .write_all(&[
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x63, 0x01, 0x00, 0x00, 0x00, 0x0A,
        ])
        .await?;
    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_millis(200), stream.read(&mut buf)).await;
    assert!(read.is_err(), "no response expected for unit 0x63");
    Ok(())
}
