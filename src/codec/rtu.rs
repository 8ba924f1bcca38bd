// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU message codec.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    codec::{crc::Crc16, Message},
    error::{FrameError, Result},
    frame::{
        function,
        rtu::{RtuFrame, EXCEPTION_FRAME_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN},
        Pdu,
    },
    slave::SlaveId,
};

/// Encodes and decodes RTU-framed messages carried over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtuMessage;

impl RtuMessage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Message for RtuMessage {
    fn encode(&self, slave_id: SlaveId, pdu: &Pdu) -> Result<Bytes> {
        encode_frame(&RtuFrame {
            slave_id,
            pdu: pdu.clone(),
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Pdu> {
        decode_frame(data).map(|frame| frame.pdu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()> {
        if response.len() < MIN_FRAME_LEN {
            return Err(FrameError::BadLength {
                len: response.len(),
            }
            .into());
        }
        if request.is_empty() || response[0] != request[0] {
            return Err(FrameError::HeaderMismatch { field: "slave id" }.into());
        }
        Ok(())
    }
}

/// Serialises a frame: `[slave id, function code, data..., crc lo, crc hi]`.
pub(crate) fn encode_frame(frame: &RtuFrame) -> Result<Bytes> {
    let len = MIN_FRAME_LEN + frame.pdu.data.len();
    if len > MAX_FRAME_LEN {
        return Err(FrameError::BadLength { len }.into());
    }
    let mut buf = BytesMut::with_capacity(len);
    buf.put_u8(frame.slave_id);
    buf.put_u8(frame.pdu.function_code);
    buf.put_slice(&frame.pdu.data);
    let mut crc = Crc16::new();
    crc.push(&buf);
    buf.put_slice(&crc.sum_bytes());
    Ok(buf.freeze())
}

/// Parses a complete frame held in memory, verifying its CRC tail.
pub(crate) fn decode_frame(data: &[u8]) -> Result<RtuFrame> {
    if data.len() < MIN_FRAME_LEN || data.len() > MAX_FRAME_LEN {
        return Err(FrameError::BadLength { len: data.len() }.into());
    }
    let split = data.len() - 2;
    let mut crc = Crc16::new();
    crc.push(&data[..split]);
    if !crc.matches(&data[split..]) {
        return Err(FrameError::CrcMismatch {
            expected: crc.value(),
            actual: u16::from_le_bytes([data[split], data[split + 1]]),
        }
        .into());
    }
    Ok(RtuFrame {
        slave_id: data[0],
        pdu: Pdu::with_data(data[1], Bytes::copy_from_slice(&data[2..split])),
    })
}

/// Predicts the wire length of the response to `request`.
///
/// RTU frames carry no length field, so the reader derives the byte count
/// from the request's function code. Codes outside the table predict the
/// 4-byte minimum.
pub(crate) fn expected_response_len(request: &[u8]) -> Result<usize> {
    if request.len() < 2 {
        return Err(FrameError::BadLength {
            len: request.len(),
        }
        .into());
    }
    let mut len = MIN_FRAME_LEN;
    match request[1] {
        function::READ_COILS | function::READ_DISCRETE_INPUTS => {
            let count = usize::from(read_count(request)?);
            len += 1 + count.div_ceil(8);
        }
        function::READ_HOLDING_REGISTERS
        | function::READ_INPUT_REGISTERS
        | function::READ_WRITE_MULTIPLE_REGISTERS => {
            let count = usize::from(read_count(request)?);
            len += 1 + count * 2;
        }
        function::WRITE_SINGLE_COIL
        | function::WRITE_SINGLE_REGISTER
        | function::WRITE_MULTIPLE_COILS
        | function::WRITE_MULTIPLE_REGISTERS => {
            len += 4;
        }
        function::MASK_WRITE_REGISTER => {
            len += 6;
        }
        // READ_FIFO_QUEUE responses have no predictable length.
        _ => {}
    }
    Ok(len)
}

/// The item count at request bytes 4..6.
fn read_count(request: &[u8]) -> Result<u16> {
    if request.len() < 6 {
        return Err(FrameError::BadLength {
            len: request.len(),
        }
        .into());
    }
    Ok(BigEndian::read_u16(&request[4..6]))
}

/// Reads one response frame, driven by the request that elicited it.
///
/// Reads the slave id and function code first. A function code equal to
/// the request's means a normal response of the predicted length; the
/// request's code with its high bit set means a 5-byte exception frame.
/// Both paths verify the CRC. Anything else is a function mismatch.
pub(crate) async fn read_frame<R>(request: &[u8], reader: &mut R) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let expected = expected_response_len(request)?;
    if expected > MAX_FRAME_LEN {
        return Err(FrameError::BadLength { len: expected }.into());
    }
    let mut buf = [0u8; MAX_FRAME_LEN];
    reader.read_exact(&mut buf[..2]).await?;
    if buf[0] != request[0] {
        return Err(FrameError::HeaderMismatch { field: "slave id" }.into());
    }
    let total = if buf[1] == request[1] {
        reader.read_exact(&mut buf[2..expected]).await?;
        expected
    } else if buf[1] == request[1] | 0x80 {
        reader.read_exact(&mut buf[2..EXCEPTION_FRAME_LEN]).await?;
        EXCEPTION_FRAME_LEN
    } else {
        return Err(FrameError::FunctionMismatch {
            expected: request[1],
            actual: buf[1],
        }
        .into());
    };
    let mut crc = Crc16::new();
    crc.push(&buf[..total - 2]);
    if !crc.matches(&buf[total - 2..total]) {
        return Err(FrameError::CrcMismatch {
            expected: crc.value(),
            actual: u16::from_le_bytes([buf[total - 2], buf[total - 1]]),
        }
        .into());
    }
    Ok(Bytes::copy_from_slice(&buf[..total]))
}
