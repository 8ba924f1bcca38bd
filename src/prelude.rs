// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common imports, re-exported for convenience.
//!
//! ```
//! use modbus_kit::prelude::*;
//! ```

pub use crate::{
    client::{Master, TcpClient},
    frame::{bits::BitVector, register::Register, DeviceIdentification, Pdu},
    server::{MemoryDataStore, Point, PointKind, RequestHandler, Server},
    Device, Error, Exception, ExceptionResponse, Framing, Result, Slave, SlaveId, Transport,
};
