// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Responder request dispatcher.

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};

use crate::{
    codec::{u8_len, u16_len},
    frame::{
        bits::BitVector,
        function,
        register::{registers_from_bytes, registers_to_bytes, Register},
        DeviceIdentification, Exception, Pdu, Quantity,
    },
    server::store::{MemoryDataStore, PointKind},
};

/// Validates request PDUs, applies them to the data store and synthesises
/// response PDUs.
///
/// Dispatch never fails: every rejected request becomes an exception PDU
/// (the request's function code with its high bit set).
#[derive(Debug, Clone)]
pub struct RequestHandler {
    store: Arc<MemoryDataStore>,
    identification: Option<DeviceIdentification>,
}

impl RequestHandler {
    #[must_use]
    pub fn new(store: Arc<MemoryDataStore>) -> Self {
        Self {
            store,
            identification: None,
        }
    }

    /// Enables answering device-identification requests (0x2B).
    #[must_use]
    pub fn with_identification(mut self, identification: DeviceIdentification) -> Self {
        self.identification = Some(identification);
        self
    }

    /// Dispatches one request PDU to its function-code handler.
    #[must_use]
    pub fn handle(&self, request: &Pdu) -> Pdu {
        match request.function_code {
            function::READ_COILS => self.read_bits(request, PointKind::Coil),
            function::READ_DISCRETE_INPUTS => self.read_bits(request, PointKind::DiscreteInput),
            function::READ_HOLDING_REGISTERS => {
                self.read_registers(request, PointKind::HoldingRegister)
            }
            function::READ_INPUT_REGISTERS => {
                self.read_registers(request, PointKind::InputRegister)
            }
            function::WRITE_SINGLE_COIL => self.write_single_coil(request),
            function::WRITE_SINGLE_REGISTER => self.write_single_register(request),
            function::WRITE_MULTIPLE_COILS => self.write_multiple_coils(request),
            function::WRITE_MULTIPLE_REGISTERS => self.write_multiple_registers(request),
            function::READ_DEVICE_IDENTIFICATION => self.read_device_identification(request),
            _ => Pdu::exception(request.function_code, Exception::IllegalFunction),
        }
    }

    /// 0x01 / 0x02: byte count followed by the packed bits.
    fn read_bits(&self, request: &Pdu, kind: PointKind) -> Pdu {
        let Some((address, quantity)) = parse_range(request) else {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        };
        if !(1..=2000).contains(&quantity) {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        let mut bits = BitVector::new(usize::from(quantity));
        for i in 0..quantity {
            let value = self.store.read(kind, address.wrapping_add(i));
            bits.set(usize::from(i), value != 0);
        }
        let packed = bits.to_bytes();
        let mut data = BytesMut::with_capacity(1 + packed.len());
        data.put_u8(u8_len(packed.len()));
        data.put_slice(&packed);
        Pdu::with_data(request.function_code, data.freeze())
    }

    /// 0x03 / 0x04: byte count followed by the register values.
    fn read_registers(&self, request: &Pdu, kind: PointKind) -> Pdu {
        let Some((address, quantity)) = parse_range(request) else {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        };
        if !(1..=125).contains(&quantity) {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        let registers: Vec<Register> = (0..quantity)
            .map(|i| Register::from(self.store.read(kind, address.wrapping_add(i))))
            .collect();
        let values = registers_to_bytes(&registers);
        let mut data = BytesMut::with_capacity(1 + values.len());
        data.put_u8(u8_len(values.len()));
        data.put_slice(&values);
        Pdu::with_data(request.function_code, data.freeze())
    }

    /// 0x05: write one coil, echo the request body.
    fn write_single_coil(&self, request: &Pdu) -> Pdu {
        let Some((address, value)) = parse_range(request) else {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        };
        if value != 0x0000 && value != 0xFF00 {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        self.store.write(PointKind::Coil, address, value);
        Pdu::with_data(request.function_code, request.data.clone())
    }

    /// 0x06: write one holding register, echo the request body.
    fn write_single_register(&self, request: &Pdu) -> Pdu {
        let Some((address, value)) = parse_range(request) else {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        };
        self.store.write(PointKind::HoldingRegister, address, value);
        Pdu::with_data(request.function_code, request.data.clone())
    }

    /// 0x0F: write packed coils, respond with address and quantity.
    fn write_multiple_coils(&self, request: &Pdu) -> Pdu {
        let Some((address, quantity, payload)) = parse_write_payload(request) else {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        };
        if !(1..=1968).contains(&quantity) {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        if payload.len() != usize::from(quantity).div_ceil(8) {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        let bits = BitVector::from_bytes(payload, usize::from(quantity));
        for i in 0..quantity {
            let value = u16::from(bits.get(usize::from(i)));
            self.store
                .write(PointKind::Coil, address.wrapping_add(i), value);
        }
        Pdu::with_words(request.function_code, &[address, quantity])
    }

    /// 0x10: write holding registers, respond with address and quantity.
    fn write_multiple_registers(&self, request: &Pdu) -> Pdu {
        let Some((address, quantity, payload)) = parse_write_payload(request) else {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        };
        if !(1..=123).contains(&quantity) {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        if payload.len() != usize::from(quantity) * 2 {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }
        for (i, register) in registers_from_bytes(payload).into_iter().enumerate() {
            self.store.write(
                PointKind::HoldingRegister,
                address.wrapping_add(u16_len(i)),
                register.value(),
            );
        }
        Pdu::with_words(request.function_code, &[address, quantity])
    }

    /// 0x2B / MEI 0x0E: stream the configured identification objects.
    fn read_device_identification(&self, request: &Pdu) -> Pdu {
        if request.data.len() < 2 {
            return Pdu::exception(request.function_code, Exception::IllegalDataAddress);
        }
        let Some(identification) = &self.identification else {
            return Pdu::exception(request.function_code, Exception::ServerDeviceFailure);
        };
        let mei_type = request.data[0];
        let read_code = request.data[1];
        if mei_type != 0x0E || read_code != 0x01 {
            return Pdu::exception(request.function_code, Exception::IllegalDataValue);
        }

        // MEI type, read code, conformity level, more follows,
        // next object id, object count (patched below).
        let mut data = BytesMut::new();
        data.put_slice(&[0x0E, 0x01, 0x01, 0x00, 0x00, 0x00]);
        let mut count = 0u8;
        for (object_id, value) in identification.objects() {
            let Some(value) = value else {
                continue;
            };
            data.put_u8(object_id);
            data.put_u8(u8_len(value.len()));
            data.put_slice(value.as_bytes());
            count += 1;
        }
        data[5] = count;
        Pdu::with_data(request.function_code, data.freeze())
    }
}

/// The `{address, quantity-or-value}` pair every fixed-body request starts
/// with.
fn parse_range(request: &Pdu) -> Option<(u16, Quantity)> {
    if request.data.len() < 4 {
        return None;
    }
    Some((
        BigEndian::read_u16(&request.data[0..2]),
        BigEndian::read_u16(&request.data[2..4]),
    ))
}

/// The `{address, quantity, byte count, bytes}` body of the multi-write
/// requests. Returns exactly `byte count` payload bytes.
fn parse_write_payload(request: &Pdu) -> Option<(u16, Quantity, &[u8])> {
    if request.data.len() < 5 {
        return None;
    }
    let (address, quantity) = parse_range(request)?;
    let byte_count = usize::from(request.data[4]);
    if request.data.len() < 5 + byte_count {
        return None;
    }
    Some((address, quantity, &request.data[5..5 + byte_count]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> (Arc<MemoryDataStore>, RequestHandler) {
        let store = Arc::new(MemoryDataStore::new());
        (Arc::clone(&store), RequestHandler::new(store))
    }

    fn exception_of(response: &Pdu) -> Option<(u8, u8)> {
        response
            .is_exception()
            .then(|| (response.function_code, response.data[0]))
    }

    #[test]
    fn read_coils_packs_bits() {
        let (store, handler) = handler();
        for address in 0..5 {
            store.write(PointKind::Coil, address, 1);
        }
        let response = handler.handle(&Pdu::with_words(0x01, &[0x0000, 0x000A]));
        assert_eq!(response.function_code, 0x01);
        assert_eq!(&response.data[..], &[0x02, 0x1F, 0x00]);
    }

    #[test]
    fn read_coils_from_empty_store() {
        let (_, handler) = handler();
        let response = handler.handle(&Pdu::with_words(0x01, &[0x0000, 0x0001]));
        assert_eq!(response.function_code, 0x01);
        assert_eq!(&response.data[..], &[0x01, 0x00]);
    }

    #[test]
    fn truncated_read_is_illegal_address() {
        let (_, handler) = handler();
        let response = handler.handle(&Pdu::with_data(0x01, vec![0x00, 0x00, 0x00]));
        assert_eq!(exception_of(&response), Some((0x81, 0x02)));
    }

    #[test]
    fn read_quantity_bounds() {
        let (_, handler) = handler();
        for (code, max) in [(0x01u8, 2000u16), (0x02, 2000), (0x03, 125), (0x04, 125)] {
            let response = handler.handle(&Pdu::with_words(code, &[0, 0]));
            assert_eq!(exception_of(&response), Some((code | 0x80, 0x03)));

            let response = handler.handle(&Pdu::with_words(code, &[0, max + 1]));
            assert_eq!(exception_of(&response), Some((code | 0x80, 0x03)));

            let response = handler.handle(&Pdu::with_words(code, &[0, max]));
            assert!(!response.is_exception());
        }
    }

    #[test]
    fn read_registers_round_trip() {
        let (store, handler) = handler();
        store.write(PointKind::InputRegister, 0x10, 0x8902);
        store.write(PointKind::InputRegister, 0x11, 0x42C7);
        let response = handler.handle(&Pdu::with_words(0x04, &[0x0010, 0x0002]));
        assert_eq!(&response.data[..], &[0x04, 0x89, 0x02, 0x42, 0xC7]);
    }

    #[test]
    fn write_single_coil_validates_sentinel() {
        let (store, handler) = handler();

        let request = Pdu::with_words(0x05, &[0x0002, 0xFF00]);
        let response = handler.handle(&request);
        assert_eq!(response, request);
        assert_eq!(store.read(PointKind::Coil, 2), 1);

        let response = handler.handle(&Pdu::with_words(0x05, &[0x0002, 0x1234]));
        assert_eq!(exception_of(&response), Some((0x85, 0x03)));
        // The rejected write must not touch the store.
        assert_eq!(store.read(PointKind::Coil, 2), 1);
    }

    #[test]
    fn write_single_register_echoes() {
        let (store, handler) = handler();
        let request = Pdu::with_words(0x06, &[0x0000, 0x1234]);
        let response = handler.handle(&request);
        assert_eq!(response, request);
        assert_eq!(store.read(PointKind::HoldingRegister, 0), 0x1234);
    }

    #[test]
    fn write_multiple_coils_checks_byte_count() {
        let (store, handler) = handler();

        // 10 coils need 2 payload bytes; claim 1.
        let response =
            handler.handle(&Pdu::with_data(0x0F, vec![0x00, 0x00, 0x00, 0x0A, 0x01, 0xFF]));
        assert_eq!(exception_of(&response), Some((0x8F, 0x03)));

        let response = handler.handle(&Pdu::with_data(
            0x0F,
            vec![0x00, 0x00, 0x00, 0x0A, 0x02, 0xFF, 0x03],
        ));
        assert_eq!(&response.data[..], &[0x00, 0x00, 0x00, 0x0A]);
        assert_eq!(store.read(PointKind::Coil, 9), 1);
        assert_eq!(store.read(PointKind::Coil, 10), 0);
    }

    #[test]
    fn write_multiple_registers_applies_all() {
        let (store, handler) = handler();
        let response = handler.handle(&Pdu::with_data(
            0x10,
            vec![0x00, 0x10, 0x00, 0x02, 0x04, 0xAB, 0xCD, 0x00, 0x01],
        ));
        assert_eq!(&response.data[..], &[0x00, 0x10, 0x00, 0x02]);
        assert_eq!(store.read(PointKind::HoldingRegister, 0x10), 0xABCD);
        assert_eq!(store.read(PointKind::HoldingRegister, 0x11), 0x0001);
    }

    #[test]
    fn truncated_multi_write_is_illegal_address() {
        let (_, handler) = handler();
        // Byte count promises more payload than the request carries.
        let response =
            handler.handle(&Pdu::with_data(0x10, vec![0x00, 0x00, 0x00, 0x02, 0x04, 0xAB]));
        assert_eq!(exception_of(&response), Some((0x90, 0x02)));
    }

    #[test]
    fn unknown_function_code() {
        let (_, handler) = handler();
        let response = handler.handle(&Pdu::with_words(0x42, &[0, 1]));
        assert_eq!(exception_of(&response), Some((0xC2, 0x01)));
    }

    #[test]
    fn device_identification_requires_configuration() {
        let (_, handler) = handler();
        let response = handler.handle(&Pdu::with_data(0x2B, vec![0x0E, 0x01, 0x00]));
        assert_eq!(exception_of(&response), Some((0xAB, 0x04)));
    }

    #[test]
    fn device_identification_validates_mei_and_read_code() {
        let (store, _) = handler();
        let handler = RequestHandler::new(store).with_identification(DeviceIdentification {
            vendor_name: Some("acme".into()),
            ..Default::default()
        });

        let response = handler.handle(&Pdu::with_data(0x2B, vec![0x0D, 0x01, 0x00]));
        assert_eq!(exception_of(&response), Some((0xAB, 0x03)));

        let response = handler.handle(&Pdu::with_data(0x2B, vec![0x0E, 0x02, 0x00]));
        assert_eq!(exception_of(&response), Some((0xAB, 0x03)));

        let response = handler.handle(&Pdu::with_data(0x2B, vec![0x0E]));
        assert_eq!(exception_of(&response), Some((0xAB, 0x02)));
    }

    #[test]
    fn device_identification_streams_objects() {
        let (store, _) = handler();
        let handler = RequestHandler::new(store).with_identification(DeviceIdentification {
            vendor_name: Some("acme".into()),
            product_version: Some("2.0".into()),
            ..Default::default()
        });
        let response = handler.handle(&Pdu::with_data(0x2B, vec![0x0E, 0x01, 0x00]));
        assert_eq!(response.function_code, 0x2B);
        assert_eq!(
            &response.data[..],
            &[
                0x0E, 0x01, 0x01, 0x00, 0x00, 0x02, // prefix, two objects
                0x00, 0x04, b'a', b'c', b'm', b'e', // vendor name
                0x02, 0x03, b'2', b'.', b'0', // product version
            ]
        );
    }
}
