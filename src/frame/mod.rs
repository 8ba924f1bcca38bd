// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol data types shared by both framings.

pub mod bits;
pub mod mbap;
pub mod register;
pub mod rtu;

use std::{error, fmt};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// A Modbus function code is represented by an unsigned 8 bit integer.
pub type FunctionCode = u8;

/// A Modbus protocol address is represented by 16 bit (from `0` to `65535`).
pub type Address = u16;

/// Modbus uses 16 bit for its data items (big-endian representation).
pub type Word = u16;

/// Number of items to process.
pub type Quantity = u16;

/// Function codes understood by this crate.
pub mod function {
    pub const READ_COILS: u8 = 0x01;
    pub const READ_DISCRETE_INPUTS: u8 = 0x02;
    pub const READ_HOLDING_REGISTERS: u8 = 0x03;
    pub const READ_INPUT_REGISTERS: u8 = 0x04;
    pub const WRITE_SINGLE_COIL: u8 = 0x05;
    pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
    pub const WRITE_MULTIPLE_COILS: u8 = 0x0F;
    pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
    pub const MASK_WRITE_REGISTER: u8 = 0x16;
    pub const READ_WRITE_MULTIPLE_REGISTERS: u8 = 0x17;
    pub const READ_FIFO_QUEUE: u8 = 0x18;
    pub const READ_DEVICE_IDENTIFICATION: u8 = 0x2B;
}

/// The maximum number of PDU payload bytes.
///
/// A PDU is limited to 253 bytes, one of which is the function code.
pub const MAX_PDU_DATA_LEN: usize = 252;

/// A protocol data unit: function code plus payload, independent of the
/// wire framing.
///
/// All multi-byte integers in the payload are big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub function_code: FunctionCode,
    pub data: Bytes,
}

impl Pdu {
    /// A PDU with an empty payload.
    #[must_use]
    pub fn new(function_code: FunctionCode) -> Self {
        Self {
            function_code,
            data: Bytes::new(),
        }
    }

    /// A PDU carrying the given payload bytes.
    pub fn with_data(function_code: FunctionCode, data: impl Into<Bytes>) -> Self {
        Self {
            function_code,
            data: data.into(),
        }
    }

    /// A PDU whose payload is the given words in big-endian order.
    #[must_use]
    pub fn with_words(function_code: FunctionCode, words: &[Word]) -> Self {
        let mut data = BytesMut::with_capacity(words.len() * 2);
        for word in words {
            data.put_u16(*word);
        }
        Self {
            function_code,
            data: data.freeze(),
        }
    }

    /// An exception PDU answering `function_code`: the code with its high
    /// bit set, followed by a single exception-code byte.
    #[must_use]
    pub fn exception(function_code: FunctionCode, exception: Exception) -> Self {
        Self {
            function_code: function_code | 0x80,
            data: Bytes::copy_from_slice(&[exception.into()]),
        }
    }

    /// Whether the function code has its high (exception) bit set.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.function_code & 0x80 != 0
    }

    /// Serialises the PDU as `[function code, data...]`.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + self.data.len());
        buf.put_u8(self.function_code);
        buf.put_slice(&self.data);
        buf.freeze()
    }
}

/// Wire framing of a Modbus connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// The 7-byte MBAP header used by Modbus TCP.
    Mbap,
    /// Slave id + PDU + CRC-16, originally serial, here carried over TCP.
    Rtu,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Mbap => write!(f, "MBAP"),
            Framing::Rtu => write!(f, "RTU"),
        }
    }
}

/// A server (slave) exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exception {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
    Acknowledge = 0x05,
    ServerDeviceBusy = 0x06,
    MemoryParityError = 0x08,
    GatewayPathUnavailable = 0x0A,
    GatewayTargetDevice = 0x0B,
}

impl From<Exception> for u8 {
    fn from(from: Exception) -> Self {
        from as u8
    }
}

impl TryFrom<u8> for Exception {
    type Error = FrameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        use Exception::*;

        let ex = match code {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            0x04 => ServerDeviceFailure,
            0x05 => Acknowledge,
            0x06 => ServerDeviceBusy,
            0x08 => MemoryParityError,
            0x0A => GatewayPathUnavailable,
            0x0B => GatewayTargetDevice,
            _ => return Err(FrameError::InvalidExceptionCode(code)),
        };
        Ok(ex)
    }
}

impl Exception {
    pub(crate) fn description(&self) -> &str {
        use Exception::*;

        match *self {
            IllegalFunction => "Illegal function",
            IllegalDataAddress => "Illegal data address",
            IllegalDataValue => "Illegal data value",
            ServerDeviceFailure => "Server device failure",
            Acknowledge => "Acknowledge",
            ServerDeviceBusy => "Server device busy",
            MemoryParityError => "Memory parity error",
            GatewayPathUnavailable => "Gateway path unavailable",
            GatewayTargetDevice => "Gateway target device failed to respond",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl error::Error for Exception {}

/// A server (slave) exception response.
///
/// `function` is the on-wire function code, i.e. the request's code with
/// its high bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function: FunctionCode,
    pub exception: Exception,
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Modbus function {:#04X}: {}",
            self.function, self.exception
        )
    }
}

impl error::Error for ExceptionResponse {}

/// Device identification objects (function 0x2B, MEI type 0x0E).
///
/// Each field corresponds to one object id in the basic category; unset
/// fields are not transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentification {
    /// Object 0x00
    pub vendor_name: Option<String>,
    /// Object 0x01
    pub product_code: Option<String>,
    /// Object 0x02
    pub product_version: Option<String>,
    /// Object 0x03
    pub vendor_url: Option<String>,
    /// Object 0x04
    pub product_name: Option<String>,
    /// Object 0x05
    pub model_name: Option<String>,
    /// Object 0x06
    pub user_application_name: Option<String>,
}

impl DeviceIdentification {
    /// All objects in ascending id order.
    pub(crate) fn objects(&self) -> [(u8, Option<&str>); 7] {
        [
            (0x00, self.vendor_name.as_deref()),
            (0x01, self.product_code.as_deref()),
            (0x02, self.product_version.as_deref()),
            (0x03, self.vendor_url.as_deref()),
            (0x04, self.product_name.as_deref()),
            (0x05, self.model_name.as_deref()),
            (0x06, self.user_application_name.as_deref()),
        ]
    }

    /// Stores `value` under the given object id; unknown ids are ignored.
    pub(crate) fn set_object(&mut self, object_id: u8, value: String) {
        match object_id {
            0x00 => self.vendor_name = Some(value),
            0x01 => self.product_code = Some(value),
            0x02 => self.product_version = Some(value),
            0x03 => self.vendor_url = Some(value),
            0x04 => self.product_name = Some(value),
            0x05 => self.model_name = Some(value),
            0x06 => self.user_application_name = Some(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu_with_words_is_big_endian() {
        let pdu = Pdu::with_words(function::READ_COILS, &[0x0102, 0x0304]);
        assert_eq!(&pdu.data[..], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            &pdu.to_bytes()[..],
            &[0x01, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn exception_pdu() {
        let pdu = Pdu::exception(function::READ_COILS, Exception::IllegalDataAddress);
        assert_eq!(pdu.function_code, 0x81);
        assert_eq!(&pdu.data[..], &[0x02]);
        assert!(pdu.is_exception());
    }

    #[test]
    fn exception_codes_round_trip() {
        for code in [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x08, 0x0A, 0x0B] {
            let ex = Exception::try_from(code).unwrap();
            assert_eq!(u8::from(ex), code);
        }
        assert!(Exception::try_from(0x07).is_err());
        assert!(Exception::try_from(0x0C).is_err());
    }

    #[test]
    fn identification_objects_in_id_order() {
        let ident = DeviceIdentification {
            vendor_name: Some("acme".into()),
            product_version: Some("1.2".into()),
            ..Default::default()
        };
        let configured: Vec<_> = ident
            .objects()
            .into_iter()
            .filter_map(|(id, value)| value.map(|value| (id, value.to_owned())))
            .collect();
        assert_eq!(
            configured,
            vec![(0x00, "acme".to_owned()), (0x02, "1.2".to_owned())]
        );
    }
}
