// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-framing message codecs.

pub mod crc;
pub mod mbap;
pub mod rtu;

use bytes::Bytes;

use crate::{error::Result, frame::Pdu, slave::SlaveId};

/// Encoding, decoding and verification of one wire framing.
///
/// `encode` wraps a PDU into a framed message, `decode` unwraps a framed
/// message, and `verify` cross-checks a framed response against the framed
/// request it answers. Implementations are stateless except for whatever
/// the framing itself requires (e.g. MBAP transaction identifiers).
pub trait Message: Send + Sync {
    /// Frames a PDU addressed to `slave_id`.
    fn encode(&self, slave_id: SlaveId, pdu: &Pdu) -> Result<Bytes>;

    /// Unwraps the PDU of a complete framed message.
    fn decode(&self, data: &[u8]) -> Result<Pdu>;

    /// Cross-checks a framed response against its framed request.
    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()>;
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn u16_len(len: usize) -> u16 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u16::MAX.into());
    len as u16
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn u8_len(len: usize) -> u8 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u8::MAX.into());
    len as u8
}
