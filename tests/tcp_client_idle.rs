// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idle-timeout lifecycle of the pooled TCP client.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use modbus_kit::{
    prelude::*,
    server::{tcp::TcpSlaveTransport, MemoryDataStore, RequestHandler},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    time::sleep,
};

/// A slave endpoint that counts how often it was dialed.
async fn spawn_counting_server(connects: Arc<AtomicUsize>) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let server_addr = listener.local_addr()?;
    let transport = TcpSlaveTransport::new(RequestHandler::new(Arc::new(MemoryDataStore::new())));

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            connects.fetch_add(1, Ordering::SeqCst);
            let transport = transport.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 260];
                loop {
                    let n = match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    let Ok(response) = transport.send(&buf[..n]).await else {
                        return;
                    };
                    if stream.write_all(&response).await.is_err() {
                        return;
                    }
                }
            });
        }
    });
    Ok(server_addr)
}

#[tokio::test]
async fn idle_connection_is_redialed() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let server_addr = spawn_counting_server(Arc::clone(&connects)).await?;

    let client = TcpClient::new(server_addr.to_string()).idle_timeout(Duration::from_millis(50));
    let master = Master::tcp_with_client(client);

    master.read_coils(1, 0, 1).await?;
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    // Let the idle watchdog tear the connection down, then send again.
    sleep(Duration::from_millis(150)).await;
    master.read_coils(1, 0, 1).await?;
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn active_connection_is_pooled() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let server_addr = spawn_counting_server(Arc::clone(&connects)).await?;

    let client = TcpClient::new(server_addr.to_string()).idle_timeout(Duration::from_secs(60));
    let master = Master::tcp_with_client(client);

    for _ in 0..5 {
        master.read_coils(1, 0, 1).await?;
    }
    assert_eq!(connects.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn explicit_close_forces_redial() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let server_addr = spawn_counting_server(Arc::clone(&connects)).await?;

    let client = TcpClient::new(server_addr.to_string());
    let master = Master::tcp_with_client(client.clone());

    master.read_coils(1, 0, 1).await?;
    client.close().await;
    master.read_coils(1, 0, 1).await?;
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    Ok(())
}
