// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A pure [Rust](https://www.rust-lang.org)
//! [Modbus](https://en.wikipedia.org/wiki/Modbus) toolkit
//! based on [tokio](https://tokio.rs).
//!
//! The crate implements the Modbus application protocol over two wire
//! framings, MBAP (Modbus-over-TCP) and RTU encapsulated over TCP, for both
//! the master (client) and the slave (server) role.
//!
//! ## Features
//!
//! - Modbus TCP (MBAP framing)
//! - Modbus RTU over TCP
//! - Master: the common read/write function codes plus device identification
//! - Slave: request dispatcher backed by a concurrent in-memory data store
//!   with write-event subscriptions
//! - A single server socket serving MBAP and RTU connections side by side,
//!   with per-connection framing auto-detection
//!
//! Serial transports (RS-485 UARTs) are not implemented; RTU frames travel
//! over TCP.
//!
//! # Examples
//!
//! ## Master
//!
//! ```rust,no_run
//! use modbus_kit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let master = Master::tcp("192.168.0.222:502");
//!     let registers = master.read_holding_registers(1, 0x1000, 7).await?;
//!     println!("Response is '{registers:?}'");
//!     Ok(())
//! }
//! ```
//!
//! ## Slave
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use modbus_kit::{prelude::*, server::tcp_slave};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let store = Arc::new(MemoryDataStore::new());
//!     store.write(PointKind::HoldingRegister, 0x1000, 42);
//!
//!     let mut server = Server::new();
//!     server.enroll(tcp_slave(1, RequestHandler::new(Arc::clone(&store))));
//!
//!     let listener = TcpListener::bind("0.0.0.0:502").await?;
//!     server.serve(listener).await
//! }
//! ```
//!
//! More examples can be found in the `demos` folder.
//!
//! # Protocol specification
//!
//! - [MODBUS Application Protocol Specification v1.1b3 (PDF)](http://modbus.org/docs/Modbus_Application_Protocol_V1_1b3.pdf)
//! - [MODBUS over serial line specification and implementation guide v1.02 (PDF)](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf)
//! - [MODBUS Messaging on TCP/IP Implementation Guide v1.0b (PDF)](http://modbus.org/docs/Modbus_Messaging_Implementation_Guide_V1_0b.pdf)

pub mod prelude;

pub mod client;
pub mod codec;
pub mod frame;
pub mod server;

mod device;
mod error;
mod slave;

pub use self::{
    device::{Device, Transport},
    error::{Error, FrameError, Result},
    frame::{Exception, ExceptionResponse, Framing},
    slave::{Slave, SlaveId},
};
