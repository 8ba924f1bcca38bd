// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MBAP message codec.

use std::sync::atomic::{AtomicU16, Ordering};

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    codec::Message,
    error::{FrameError, Result},
    frame::{
        mbap::{MbapFrame, HEADER_LEN, MAX_FRAME_LEN, PROTOCOL_ID},
        Pdu, MAX_PDU_DATA_LEN,
    },
    slave::SlaveId,
};

/// Encodes and decodes MBAP (Modbus-over-TCP) messages.
///
/// Transaction identifiers are drawn from a per-instance atomic counter.
/// Wrap-around at 2^16 is acceptable because exchanges on a connection are
/// single-flight.
#[derive(Debug, Default)]
pub struct MbapMessage {
    transaction_id: AtomicU16,
}

impl MbapMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_transaction_id(&self) -> u16 {
        self.transaction_id
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }
}

impl Message for MbapMessage {
    fn encode(&self, slave_id: SlaveId, pdu: &Pdu) -> Result<Bytes> {
        if pdu.data.len() > MAX_PDU_DATA_LEN {
            return Err(FrameError::PduTooLarge {
                len: pdu.data.len(),
            }
            .into());
        }
        let frame = MbapFrame {
            transaction_id: self.next_transaction_id(),
            protocol_id: PROTOCOL_ID,
            unit_id: slave_id,
            pdu: pdu.clone(),
        };
        Ok(encode_frame(&frame))
    }

    fn decode(&self, data: &[u8]) -> Result<Pdu> {
        decode_frame(data).map(|frame| frame.pdu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()> {
        if request.len() < HEADER_LEN || response.len() < HEADER_LEN {
            return Err(FrameError::BadLength {
                len: response.len().min(request.len()),
            }
            .into());
        }
        if BigEndian::read_u16(&response[0..2]) != BigEndian::read_u16(&request[0..2]) {
            return Err(FrameError::HeaderMismatch {
                field: "transaction id",
            }
            .into());
        }
        if BigEndian::read_u16(&response[2..4]) != BigEndian::read_u16(&request[2..4]) {
            return Err(FrameError::HeaderMismatch {
                field: "protocol id",
            }
            .into());
        }
        if response[6] != request[6] {
            return Err(FrameError::HeaderMismatch { field: "unit id" }.into());
        }
        Ok(())
    }
}

/// Serialises a frame: 7-byte big-endian header followed by the PDU.
pub(crate) fn encode_frame(frame: &MbapFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + 1 + frame.pdu.data.len());
    buf.put_u16(frame.transaction_id);
    buf.put_u16(frame.protocol_id);
    buf.put_u16(frame.length());
    buf.put_u8(frame.unit_id);
    buf.put_u8(frame.pdu.function_code);
    buf.put_slice(&frame.pdu.data);
    buf.freeze()
}

/// Parses a complete frame held in memory.
pub(crate) fn decode_frame(data: &[u8]) -> Result<MbapFrame> {
    if data.len() < HEADER_LEN + 1 {
        return Err(FrameError::BadLength { len: data.len() }.into());
    }
    let protocol_id = BigEndian::read_u16(&data[2..4]);
    if protocol_id != PROTOCOL_ID {
        return Err(FrameError::InvalidProtocolId(protocol_id).into());
    }
    let length = BigEndian::read_u16(&data[4..6]);
    let payload_len = data.len() - HEADER_LEN;
    if usize::from(length) != payload_len + 1 {
        return Err(FrameError::LengthMismatch {
            length,
            payload_len,
        }
        .into());
    }
    Ok(MbapFrame {
        transaction_id: BigEndian::read_u16(&data[0..2]),
        protocol_id,
        unit_id: data[6],
        pdu: Pdu::with_data(data[HEADER_LEN], Bytes::copy_from_slice(&data[HEADER_LEN + 1..])),
    })
}

/// Reads exactly one frame from `reader` and returns its raw bytes.
///
/// First reads the 7 header bytes, validates `0 < length <= 254`, then
/// reads the remaining `length - 1` bytes. A stream that closes early
/// surfaces as a transport error (`UnexpectedEof`); an out-of-range
/// length as a frame error.
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; MAX_FRAME_LEN];
    reader.read_exact(&mut buf[..HEADER_LEN]).await?;
    let length = usize::from(BigEndian::read_u16(&buf[4..6]));
    if length == 0 || length > MAX_FRAME_LEN - (HEADER_LEN - 1) {
        return Err(FrameError::BadLength { len: length }.into());
    }
    let end = HEADER_LEN + length - 1;
    reader.read_exact(&mut buf[HEADER_LEN..end]).await?;
    Ok(Bytes::copy_from_slice(&buf[..end]))
}
