// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus master (client) side.

pub mod rtu;
pub mod tcp;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};

use crate::{
    codec::{mbap::MbapMessage, rtu::RtuMessage, u8_len, u16_len, Message},
    device::Transport,
    error::{Error, FrameError, Result},
    frame::{
        bits::BitVector,
        function,
        register::{registers_from_bytes, registers_to_bytes, Register},
        Address, DeviceIdentification, Exception, ExceptionResponse, Pdu, Quantity, Word,
    },
    slave::SlaveId,
};

pub use self::{
    rtu::RtuOverTcpTransport,
    tcp::{TcpClient, TcpTransport},
};

/// A Modbus master: builds request PDUs, drives a transport and validates
/// the responses.
///
/// Every operation follows the same pipeline: validate arguments, encode,
/// send, verify the response frame against the request frame, decode, and
/// surface exception responses as [`Error::Exception`].
pub struct Master {
    message: Box<dyn Message>,
    transport: Box<dyn Transport>,
}

impl Master {
    /// Composes a master from a message codec and a transport.
    #[must_use]
    pub fn new(message: Box<dyn Message>, transport: Box<dyn Transport>) -> Self {
        Self { message, transport }
    }

    /// A master speaking MBAP over TCP.
    #[must_use]
    pub fn tcp(address: impl Into<String>) -> Self {
        Self::tcp_with_client(TcpClient::new(address))
    }

    /// A master speaking MBAP over a pre-configured [`TcpClient`].
    #[must_use]
    pub fn tcp_with_client(client: TcpClient) -> Self {
        Self::new(
            Box::new(MbapMessage::new()),
            Box::new(TcpTransport::new(client)),
        )
    }

    /// A master speaking RTU framing over TCP.
    #[must_use]
    pub fn rtu_over_tcp(address: impl Into<String>) -> Self {
        Self::rtu_over_tcp_with_client(TcpClient::new(address))
    }

    /// A master speaking RTU framing over a pre-configured [`TcpClient`].
    #[must_use]
    pub fn rtu_over_tcp_with_client(client: TcpClient) -> Self {
        Self::new(
            Box::new(RtuMessage::new()),
            Box::new(RtuOverTcpTransport::new(client)),
        )
    }

    /// Read multiple coils (0x01).
    pub async fn read_coils(
        &self,
        slave_id: SlaveId,
        address: Address,
        quantity: Quantity,
    ) -> Result<BitVector> {
        check_quantity(quantity, 2000)?;
        let request = Pdu::with_words(function::READ_COILS, &[address, quantity]);
        let response = self.send_request(slave_id, &request).await?;
        unpack_bits(&response, quantity)
    }

    /// Read multiple discrete inputs (0x02).
    pub async fn read_discrete_inputs(
        &self,
        slave_id: SlaveId,
        address: Address,
        quantity: Quantity,
    ) -> Result<BitVector> {
        check_quantity(quantity, 2000)?;
        let request = Pdu::with_words(function::READ_DISCRETE_INPUTS, &[address, quantity]);
        let response = self.send_request(slave_id, &request).await?;
        unpack_bits(&response, quantity)
    }

    /// Read multiple holding registers (0x03).
    pub async fn read_holding_registers(
        &self,
        slave_id: SlaveId,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Register>> {
        check_quantity(quantity, 125)?;
        let request = Pdu::with_words(function::READ_HOLDING_REGISTERS, &[address, quantity]);
        let response = self.send_request(slave_id, &request).await?;
        unpack_registers(&response)
    }

    /// Read multiple input registers (0x04).
    pub async fn read_input_registers(
        &self,
        slave_id: SlaveId,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Register>> {
        check_quantity(quantity, 125)?;
        let request = Pdu::with_words(function::READ_INPUT_REGISTERS, &[address, quantity]);
        let response = self.send_request(slave_id, &request).await?;
        unpack_registers(&response)
    }

    /// Write a single coil (0x05).
    pub async fn write_single_coil(
        &self,
        slave_id: SlaveId,
        address: Address,
        state: bool,
    ) -> Result<()> {
        // The requested ON/OFF state can only be 0xFF00 or 0x0000.
        let value = if state { 0xFF00 } else { 0x0000 };
        let request = Pdu::with_words(function::WRITE_SINGLE_COIL, &[address, value]);
        let response = self.send_request(slave_id, &request).await?;
        verify_echo(&response, [("address", address), ("value", value)])
    }

    /// Write a single holding register (0x06).
    pub async fn write_single_register(
        &self,
        slave_id: SlaveId,
        address: Address,
        value: Word,
    ) -> Result<()> {
        let request = Pdu::with_words(function::WRITE_SINGLE_REGISTER, &[address, value]);
        let response = self.send_request(slave_id, &request).await?;
        verify_echo(&response, [("address", address), ("value", value)])
    }

    /// Write multiple coils (0x0F).
    pub async fn write_multiple_coils(
        &self,
        slave_id: SlaveId,
        address: Address,
        values: &[bool],
    ) -> Result<()> {
        check_count(values.len(), 1968)?;
        let quantity = u16_len(values.len());
        let packed = BitVector::from_bools(values).to_bytes();
        let mut data = BytesMut::with_capacity(5 + packed.len());
        data.put_u16(address);
        data.put_u16(quantity);
        data.put_u8(u8_len(packed.len()));
        data.put_slice(&packed);
        let request = Pdu::with_data(function::WRITE_MULTIPLE_COILS, data.freeze());
        let response = self.send_request(slave_id, &request).await?;
        verify_echo(&response, [("address", address), ("quantity", quantity)])
    }

    /// Write multiple holding registers (0x10).
    pub async fn write_multiple_registers(
        &self,
        slave_id: SlaveId,
        address: Address,
        registers: &[Register],
    ) -> Result<()> {
        check_count(registers.len(), 123)?;
        let quantity = u16_len(registers.len());
        let values = registers_to_bytes(registers);
        let mut data = BytesMut::with_capacity(5 + values.len());
        data.put_u16(address);
        data.put_u16(quantity);
        data.put_u8(u8_len(values.len()));
        data.put_slice(&values);
        let request = Pdu::with_data(function::WRITE_MULTIPLE_REGISTERS, data.freeze());
        let response = self.send_request(slave_id, &request).await?;
        verify_echo(&response, [("address", address), ("quantity", quantity)])
    }

    /// Read the basic device identification objects (0x2B / MEI 0x0E).
    pub async fn read_device_identification(
        &self,
        slave_id: SlaveId,
    ) -> Result<DeviceIdentification> {
        let request = Pdu::with_data(
            function::READ_DEVICE_IDENTIFICATION,
            vec![0x0E, 0x01, 0x00],
        );
        let response = self.send_request(slave_id, &request).await?;
        parse_device_identification(&response.data)
    }

    /// Runs one encode → send → verify → decode exchange.
    async fn send_request(&self, slave_id: SlaveId, request: &Pdu) -> Result<Pdu> {
        let request_data = self.message.encode(slave_id, request)?;
        let response_data = self.transport.send(&request_data).await?;
        self.message.verify(&request_data, &response_data)?;
        let response = self.message.decode(&response_data)?;
        if response.function_code != request.function_code {
            return Err(exception_error(&response));
        }
        if response.data.is_empty() {
            return Err(FrameError::EmptyResponse.into());
        }
        Ok(response)
    }
}

/// Builds the error for a response whose function code does not match the
/// request, normally an exception response.
fn exception_error(response: &Pdu) -> Error {
    let Some(&code) = response.data.first() else {
        return FrameError::EmptyResponse.into();
    };
    match Exception::try_from(code) {
        Ok(exception) => ExceptionResponse {
            function: response.function_code,
            exception,
        }
        .into(),
        Err(err) => err.into(),
    }
}

fn check_quantity(quantity: Quantity, max: u16) -> Result<()> {
    check_count(usize::from(quantity), max)
}

fn check_count(quantity: usize, max: u16) -> Result<()> {
    if quantity < 1 || quantity > usize::from(max) {
        return Err(Error::InvalidRange {
            quantity,
            min: 1,
            max,
        });
    }
    Ok(())
}

/// Checks the leading byte count and unpacks the packed bits that follow.
fn unpack_bits(response: &Pdu, quantity: Quantity) -> Result<BitVector> {
    let count = usize::from(response.data[0]);
    let len = response.data.len() - 1;
    if count != len {
        return Err(FrameError::ByteCountMismatch { count, len }.into());
    }
    Ok(BitVector::from_bytes(
        &response.data[1..],
        usize::from(quantity),
    ))
}

/// Checks the leading byte count and splits the registers that follow.
fn unpack_registers(response: &Pdu) -> Result<Vec<Register>> {
    let count = usize::from(response.data[0]);
    let len = response.data.len() - 1;
    if count != len {
        return Err(FrameError::ByteCountMismatch { count, len }.into());
    }
    Ok(registers_from_bytes(&response.data[1..]))
}

/// Verifies a fixed four-byte echo response field by field.
fn verify_echo(response: &Pdu, fields: [(&'static str, u16); 2]) -> Result<()> {
    if response.data.len() != 4 {
        return Err(FrameError::BadLength {
            len: response.data.len(),
        }
        .into());
    }
    for (i, (field, expected)) in fields.into_iter().enumerate() {
        let actual = BigEndian::read_u16(&response.data[i * 2..]);
        if actual != expected {
            return Err(FrameError::EchoMismatch {
                field,
                expected,
                actual,
            }
            .into());
        }
    }
    Ok(())
}

/// Parses a device-identification response body.
///
/// Expects the fixed prefix `{MEI, read code, conformity 0x01, more
/// follows 0x00, next object id 0x00, object count}` followed by
/// `{id, length, bytes}` records. Unknown object ids are skipped.
fn parse_device_identification(data: &[u8]) -> Result<DeviceIdentification> {
    if data.len() < 6 || data[2] != 0x01 || data[3] != 0x00 || data[4] != 0x00 {
        return Err(FrameError::Malformed.into());
    }
    let mut identification = DeviceIdentification::default();
    let mut offset = 6;
    while offset < data.len() {
        if offset + 2 > data.len() {
            return Err(FrameError::Malformed.into());
        }
        let object_id = data[offset];
        let end = offset + 2 + usize::from(data[offset + 1]);
        if end > data.len() {
            return Err(FrameError::Malformed.into());
        }
        let text = String::from_utf8_lossy(&data[offset + 2..end]).into_owned();
        identification.set_object(object_id, text);
        offset = end;
    }
    Ok(identification)
}
