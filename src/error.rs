// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::io;

use thiserror::Error;

use crate::frame::ExceptionResponse;

/// Result type for all fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for _Modbus_ exchanges.
///
/// The three wire-level variants are disjoint: `Transport` means the bytes
/// never made it across intact, `Frame` means they arrived but did not form
/// a valid or matching frame, and `Exception` means the server explicitly
/// answered with a _Modbus_ exception.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying transport failed (connect, read, write or deadline).
    #[error(transparent)]
    Transport(#[from] io::Error),

    /// The received bytes did not form a valid or matching frame.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The server responded with a _Modbus_ exception.
    #[error(transparent)]
    Exception(#[from] ExceptionResponse),

    /// A request argument was rejected before anything was sent.
    #[error("quantity {quantity} is out of range [{min}, {max}]")]
    InvalidRange {
        quantity: usize,
        min: u16,
        max: u16,
    },
}

/// Errors raised while encoding, decoding or verifying frames.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// A frame or length field is outside the limits of its framing.
    #[error("frame length {len} is out of range")]
    BadLength { len: usize },

    /// The MBAP length field disagrees with the actual payload length.
    #[error("length field {length} does not match payload length {payload_len}")]
    LengthMismatch { length: u16, payload_len: usize },

    /// The PDU payload exceeds the 252 bytes the protocol allows.
    #[error("PDU data length {len} exceeds 252 bytes")]
    PduTooLarge { len: usize },

    /// The MBAP protocol identifier is not zero.
    #[error("invalid protocol identifier {0:#06X}")]
    InvalidProtocolId(u16),

    /// The CRC computed over the frame does not match its trailing bytes.
    #[error("CRC {actual:#06X} does not match expected {expected:#06X}")]
    CrcMismatch { expected: u16, actual: u16 },

    /// The response carries a function code unrelated to the request.
    #[error("response function code {actual:#04X} does not match request {expected:#04X}")]
    FunctionMismatch { expected: u8, actual: u8 },

    /// A response header field disagrees with the request header.
    #[error("response {field} does not match request")]
    HeaderMismatch { field: &'static str },

    /// An echoed request field came back altered.
    #[error("echoed {field} {actual:#06X} does not match request {expected:#06X}")]
    EchoMismatch {
        field: &'static str,
        expected: u16,
        actual: u16,
    },

    /// The leading byte count disagrees with the actual payload length.
    #[error("byte count {count} does not match data length {len}")]
    ByteCountMismatch { count: usize, len: usize },

    /// An exception response carries a code outside the standard set.
    #[error("invalid exception code {0:#04X}")]
    InvalidExceptionCode(u8),

    /// The response payload carries no data at all.
    #[error("response data is empty")]
    EmptyResponse,

    /// The response payload is truncated or structurally invalid.
    #[error("response payload is truncated or malformed")]
    Malformed,
}
